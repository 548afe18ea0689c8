// Public modules
pub mod ask;
pub mod model;
pub mod turn;

// Re-exports
pub use ask::{AskRequest, AskResponse};
pub use model::Model;
pub use turn::{Sender, Turn, TurnId, TurnLog};
