use crate::list::Filter;

/// All possible semantic actions in the checklist UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // Navigation
    SelectPrev,
    SelectNext,
    JumpFirst,
    JumpLast,

    // Task actions
    NewTask,
    EditTask,
    ToggleDone,
    DeleteTask,

    // View
    CycleFilter,
    SetFilter(Filter),
    CycleSort,
    StartSearch,
    ClearFilters,

    // App
    Reload,
    ShowHelp,
    Quit,

    // Text input
    InputChar(char),
    InputBackspace,
    InputLeft,
    InputRight,
    InputHome,
    InputEnd,
    InputDeleteWord,
    InputConfirm,
    InputCancel,

    // Confirmation
    Confirm,
    Deny,

    // No-op
    None,
}
