pub mod aggregate;
pub mod assessment;
pub mod session;
pub mod steps;

pub use aggregate::{Action, ApplyError, FetchField, FetchGuard, WizardAggregate};
pub use assessment::{EloAssessment, GenerationStatus};
pub use session::{OptionLists, WizardSession};
pub use steps::{compute_active_step, completed_steps, derived_completion, NavState, Step};
