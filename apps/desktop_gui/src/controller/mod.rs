//! View controller: uploader UI state, bridge outcomes, and the commands they trigger.

pub mod events;
pub mod orchestration;
pub mod reducer;
pub mod state;
