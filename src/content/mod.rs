//! Static quiz content: scenarios, categories, and their load-time
//! validation.

pub mod model;
pub mod registry;

pub use model::{
    Attachment, Category, DecisionOption, IconTag, Message, Outcome, RiskLevel, Scenario, Sender,
};
pub use registry::{ContentError, ContentRegistry};
