use broom_core::SortField;

/// User actions that can be performed in the app
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Move cursor up
    MoveUp,
    /// Move cursor down
    MoveDown,
    /// Move cursor up by a page
    PageUp,
    /// Move cursor down by a page
    PageDown,
    /// Go to first row
    GoToFirst,
    /// Go to last row
    GoToLast,
    /// Toggle selection of the row under the cursor
    ToggleSelect,
    /// Select every visible row, or deselect them if all are selected
    ToggleSelectAll,
    /// Sort by a column (same column again flips direction)
    SortBy(SortField),
    /// Next status filter
    NextFilter,
    /// Previous status filter
    PrevFilter,
    /// Raise the inactivity threshold by a day
    IncreaseThreshold,
    /// Lower the inactivity threshold by a day
    DecreaseThreshold,
    /// Reload candidates
    Refresh,
    /// Start deleting the selection
    Delete,
    /// Answer yes to the open prompt
    Yes,
    /// Answer no to the open prompt
    No,
    /// Abort the deletion at a prompt
    CancelPrompt,
    /// Close the notice on top
    DismissNotice,
    /// Show help overlay
    ShowHelp,
    /// Hide help overlay
    HideHelp,
    /// Quit the application
    Quit,
    /// No action (for tick events)
    Tick,
}
