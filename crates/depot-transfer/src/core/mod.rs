//! Pure decisions: retry timing, task state, strategy selection and part layout.

mod parts;
mod retry;
mod state;
mod strategy;

pub use parts::{Part, part_size_mb, plan_parts};
pub use retry::retry_delay;
pub use state::TaskState;
pub use strategy::{UploadPlan, is_cached, plan_upload};
