//! Demand analysis: free text in, a merged `DemandProfile` out.
//!
//! Two tiers feed each turn. The rule tier (budget patterns and keyword
//! families) is deterministic and always runs. The model tier is asked for a
//! structured JSON extraction and may fail or time out at any point, in which
//! case the rule result stands alone.

pub mod budget;
mod demand;
pub mod keywords;
pub mod llm;
pub mod profile;

pub use budget::parse_budget;
pub use demand::{Analysis, DemandAnalyzer};
pub use llm::ConversationContext;
pub use profile::{
    merge, Budget, DemandProfile, DimensionWeights, PreferenceTag, Strictness, Tracked, DEFAULT_WEIGHT_FLOOR,
};
