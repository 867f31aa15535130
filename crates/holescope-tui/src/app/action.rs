/// All possible actions in the application (command pattern)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,

    // Overlays
    ToggleHelp,
    ToggleStats,

    // Source
    Reload,

    // Text search input
    OpenSearch,
    SearchInput(char),
    SearchBackspace,
    SearchClear,
    ApplySearch,
    CancelSearch,

    // Active filter
    ClearFilter,

    // Table navigation
    RowUp,
    RowDown,
    PageUp,
    PageDown,
    RowTop,
    RowBottom,
    OpenDetail,

    // Detail pane
    DetailUp,
    DetailDown,
    ApplyDetailFilter,
    CloseDetail,

    // Status messages
    DismissMessage,
}
