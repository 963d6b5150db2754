mod progress;
mod service;
mod session;

// Public API of the quest subsystem.
pub use crate::error::QuestError;
pub use progress::{QuestProgress, percent_of};
pub use service::{QuestLoopService, TurnOutcome};
pub use session::{QuestSession, TurnTicket};
