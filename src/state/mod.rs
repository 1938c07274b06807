pub mod session;
pub mod transcript;

pub use session::{Session, SessionCommand, SessionInput, SessionState, TurnId};
pub use transcript::{Message, Role, Transcript};
