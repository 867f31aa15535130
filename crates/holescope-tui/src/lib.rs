//! Terminal UI for holescope
//!
//! State management, keybindings, event handling and widgets for browsing
//! a parsed Pi-hole log.

pub mod app;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{Action, AppState, DetailState, Focus, UiState, ViewCache};
pub use config::{KeyBinding, KeyBindings, KeyContext};
pub use tui::{Event, EventHandler, Tui};
pub use ui::components::{DetailPane, FilterBar, HelpOverlay, StatsBar, StatusBar};
pub use ui::screens::LogViewerScreen;
pub use ui::{Layout, Theme, ViewerAreas};
