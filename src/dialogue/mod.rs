//! Conversation flow: intent, the pure state transition, and the controller that executes it.

mod controller;
pub mod intent;
pub mod state;
mod store;
pub mod templates;
pub mod transition;

pub use controller::{ActionKind, DialogueController, SessionSummary, TurnResponse};
pub use intent::{classify, UserIntent};
pub use state::{DialogueState, QuestionKind, Session, Speaker, Turn};
pub use store::{InMemorySessionStore, SessionStore};
pub use transition::{next_question, transition, Action, DialoguePolicy, TurnEvent};
