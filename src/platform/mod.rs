//! Browser-facing glue that can be tested natively

pub mod input;
pub mod query;

pub use input::{Action, InputState};
pub use query::query_param;
