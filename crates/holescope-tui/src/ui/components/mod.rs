mod detail_pane;
mod filter_bar;
mod help_overlay;
mod stats_bar;
mod status_bar;

pub use detail_pane::DetailPane;
pub use filter_bar::FilterBar;
pub use help_overlay::HelpOverlay;
pub use stats_bar::StatsBar;
pub use status_bar::{StatusBar, detail_hints, search_hints, table_hints};
