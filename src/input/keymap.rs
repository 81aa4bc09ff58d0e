use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::action::Action;
use crate::app::Mode;
use crate::list::Filter;

/// Map a key event to a semantic action based on current mode.
pub fn map_key(key: KeyEvent, mode: &Mode) -> Action {
    match mode {
        Mode::Normal => map_normal(key),
        Mode::Input { .. } | Mode::Edit { .. } | Mode::Search { .. } => map_input(key),
        Mode::Confirm { .. } => map_confirm(key),
        Mode::Help => match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => Action::Quit,
            _ => Action::None,
        },
    }
}

fn map_normal(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => Action::SelectNext,
        KeyCode::Char('k') | KeyCode::Up => Action::SelectPrev,
        KeyCode::Char('g') | KeyCode::Home => Action::JumpFirst,
        KeyCode::Char('G') | KeyCode::End => Action::JumpLast,
        KeyCode::Char('a') => Action::NewTask,
        KeyCode::Char('e') | KeyCode::Enter => Action::EditTask,
        KeyCode::Char('x') | KeyCode::Char(' ') => Action::ToggleDone,
        KeyCode::Char('d') => Action::DeleteTask,
        KeyCode::Char('f') => Action::CycleFilter,
        KeyCode::Char('1') => Action::SetFilter(Filter::All),
        KeyCode::Char('2') => Action::SetFilter(Filter::Active),
        KeyCode::Char('3') => Action::SetFilter(Filter::Completed),
        KeyCode::Char('s') => Action::CycleSort,
        KeyCode::Char('/') => Action::StartSearch,
        KeyCode::Char('r') => Action::Reload,
        KeyCode::Char('?') => Action::ShowHelp,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Esc => Action::ClearFilters,
        _ => Action::None,
    }
}

fn map_input(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Enter => Action::InputConfirm,
        KeyCode::Esc => Action::InputCancel,
        KeyCode::Char('a') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::InputHome,
        KeyCode::Char('e') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::InputEnd,
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Action::InputDeleteWord
        }
        KeyCode::Char(c) => Action::InputChar(c),
        KeyCode::Backspace => Action::InputBackspace,
        KeyCode::Left => Action::InputLeft,
        KeyCode::Right => Action::InputRight,
        KeyCode::Home => Action::InputHome,
        KeyCode::End => Action::InputEnd,
        _ => Action::None,
    }
}

fn map_confirm(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => Action::Confirm,
        KeyCode::Char('n') | KeyCode::Esc => Action::Deny,
        _ => Action::None,
    }
}

// ---------------------------------------------------------------------------
// Binding registry — single source of truth for keybinding documentation.
// Used by the help overlay.
// ---------------------------------------------------------------------------

/// A documented keybinding for display in help.
pub struct Binding {
    pub key: &'static str,
    pub description: &'static str,
}

/// A group of related bindings (one section in help).
pub struct BindingGroup {
    pub name: &'static str,
    pub bindings: &'static [Binding],
}

pub const NAVIGATION_BINDINGS: &[Binding] = &[
    Binding { key: "j / k", description: "Move between tasks" },
    Binding { key: "g / G", description: "First / last task" },
];

pub const TASK_BINDINGS: &[Binding] = &[
    Binding { key: "a", description: "Add task" },
    Binding { key: "e / Enter", description: "Edit task inline" },
    Binding { key: "x / Space", description: "Toggle done" },
    Binding { key: "d", description: "Delete task" },
];

pub const VIEW_BINDINGS: &[Binding] = &[
    Binding { key: "f", description: "Cycle filter (all/active/completed)" },
    Binding { key: "1 / 2 / 3", description: "Filter: all / active / completed" },
    Binding { key: "s", description: "Cycle sort (off/A-Z/Z-A)" },
    Binding { key: "/", description: "Search tasks" },
    Binding { key: "Esc", description: "Clear filters" },
];

pub const APP_BINDINGS: &[Binding] = &[
    Binding { key: "r", description: "Reload from disk" },
    Binding { key: "?", description: "Help" },
    Binding { key: "q", description: "Quit" },
];

/// All binding groups for the help overlay.
pub const HELP_GROUPS: &[BindingGroup] = &[
    BindingGroup { name: "Navigation", bindings: NAVIGATION_BINDINGS },
    BindingGroup { name: "Tasks", bindings: TASK_BINDINGS },
    BindingGroup { name: "View", bindings: VIEW_BINDINGS },
    BindingGroup { name: "App", bindings: APP_BINDINGS },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::TextBuffer;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn normal_mode_core_bindings() {
        assert_eq!(map_key(key(KeyCode::Char('j')), &Mode::Normal), Action::SelectNext);
        assert_eq!(map_key(key(KeyCode::Char('k')), &Mode::Normal), Action::SelectPrev);
        assert_eq!(map_key(key(KeyCode::Char('a')), &Mode::Normal), Action::NewTask);
        assert_eq!(map_key(key(KeyCode::Enter), &Mode::Normal), Action::EditTask);
        assert_eq!(map_key(key(KeyCode::Char(' ')), &Mode::Normal), Action::ToggleDone);
        assert_eq!(map_key(key(KeyCode::Char('d')), &Mode::Normal), Action::DeleteTask);
        assert_eq!(map_key(key(KeyCode::Char('q')), &Mode::Normal), Action::Quit);
        assert_eq!(map_key(ctrl('c'), &Mode::Normal), Action::Quit);
    }

    #[test]
    fn normal_mode_filter_and_sort_bindings() {
        assert_eq!(map_key(key(KeyCode::Char('f')), &Mode::Normal), Action::CycleFilter);
        assert_eq!(
            map_key(key(KeyCode::Char('2')), &Mode::Normal),
            Action::SetFilter(Filter::Active)
        );
        assert_eq!(map_key(key(KeyCode::Char('s')), &Mode::Normal), Action::CycleSort);
        assert_eq!(map_key(key(KeyCode::Esc), &Mode::Normal), Action::ClearFilters);
    }

    #[test]
    fn input_mode_maps_chars_and_control_keys() {
        let mode = Mode::Input { prompt: "New task", buf: TextBuffer::empty() };
        assert_eq!(map_key(key(KeyCode::Char('h')), &mode), Action::InputChar('h'));
        assert_eq!(map_key(key(KeyCode::Enter), &mode), Action::InputConfirm);
        assert_eq!(map_key(key(KeyCode::Esc), &mode), Action::InputCancel);
        assert_eq!(map_key(ctrl('w'), &mode), Action::InputDeleteWord);
        assert_eq!(map_key(ctrl('a'), &mode), Action::InputHome);
    }

    #[test]
    fn edit_mode_uses_input_map() {
        let mode = Mode::Edit { id: 1, buf: TextBuffer::new("x".into()) };
        // 'q' must type a character, not quit
        assert_eq!(map_key(key(KeyCode::Char('q')), &mode), Action::InputChar('q'));
    }

    #[test]
    fn confirm_mode_bindings() {
        let mode = Mode::Confirm {
            prompt: "Delete task?",
            on_confirm: crate::app::ConfirmTarget::DeleteTask(1),
        };
        assert_eq!(map_key(key(KeyCode::Char('y')), &mode), Action::Confirm);
        assert_eq!(map_key(key(KeyCode::Enter), &mode), Action::Confirm);
        assert_eq!(map_key(key(KeyCode::Char('n')), &mode), Action::Deny);
        assert_eq!(map_key(key(KeyCode::Esc), &mode), Action::Deny);
        assert_eq!(map_key(key(KeyCode::Char('z')), &mode), Action::None);
    }

    #[test]
    fn help_mode_closes_on_q_or_esc() {
        assert_eq!(map_key(key(KeyCode::Char('q')), &Mode::Help), Action::Quit);
        assert_eq!(map_key(key(KeyCode::Esc), &Mode::Help), Action::Quit);
        assert_eq!(map_key(key(KeyCode::Char('j')), &Mode::Help), Action::None);
    }
}
