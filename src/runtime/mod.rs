pub mod bridge;
pub mod frontend;
pub mod r#loop;
pub mod update;

pub use bridge::Bridge;
pub use frontend::{FrontendAdapter, UserInputEvent};
pub use r#loop::Runtime;
pub use update::StreamEvent;
