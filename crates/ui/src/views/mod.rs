mod intake;
mod panels;
mod quest;
mod state;
mod store;

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod view_smoke;

pub use intake::IntakeView;
pub use panels::{ErrorPanel, LoadingPanel};
pub use quest::QuestView;
pub use state::{ViewError, ViewState, view_state_from_resource};
pub use store::{QuestStore, use_quest_store, use_quest_store_provider};
