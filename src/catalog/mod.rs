pub mod types;
pub mod provider;
pub mod sample;

pub use types::*;
pub use provider::*;
pub use sample::{sample_catalog, PhoneSpec};
