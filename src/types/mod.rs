pub mod api;

pub use api::{ApiMessage, ServerEvent};
