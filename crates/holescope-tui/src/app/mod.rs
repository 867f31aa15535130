//! Application state and actions

mod action;
mod state;

pub use action::Action;
pub use state::{AppState, DetailState, Focus, PAGE_SIZE, UiState, ViewCache};
