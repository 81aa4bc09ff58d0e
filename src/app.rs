use std::time::{Duration, Instant};

use crossterm::event::{self, Event};
use fuzzy_matcher::skim::SkimMatcherV2;
use ratatui::DefaultTerminal;

use crate::config::LocalConfig;
use crate::input::action::Action;
use crate::input::keymap::map_key;
use crate::list::storage::{load_checklist, record_activity, save_checklist, Store};
use crate::list::{Checklist, Task};

/// Reusable text editing buffer with cursor.
///
/// `cursor` is a **char index** (not byte index), always in `0..=char_count`.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    pub input: String,
    pub cursor: usize,
}

impl TextBuffer {
    pub fn new(input: String) -> Self {
        let cursor = input.chars().count();
        Self { input, cursor }
    }

    pub fn empty() -> Self {
        Self { input: String::new(), cursor: 0 }
    }

    /// Convert a char index to a byte index.
    fn byte_offset(&self, char_idx: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    pub fn insert(&mut self, c: char) {
        let byte_idx = self.byte_offset(self.cursor);
        self.input.insert(byte_idx, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let byte_idx = self.byte_offset(self.cursor - 1);
            self.input.remove(byte_idx);
            self.cursor -= 1;
        }
    }

    pub fn delete_word(&mut self) {
        let byte_pos = self.byte_offset(self.cursor);
        let before = &self.input[..byte_pos];
        let trimmed = before.trim_end();
        let start_byte = trimmed
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        let start_char = self.input[..start_byte].chars().count();
        self.input.drain(start_byte..byte_pos);
        self.cursor = start_char;
    }

    pub fn move_left(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.input.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.input.chars().count();
    }
}

/// Current interaction mode.
///
/// `Edit` is the per-row viewing/editing toggle: it carries the id of the
/// task being edited and a draft buffer initialized from its current text.
#[derive(Debug, Clone)]
pub enum Mode {
    Normal,
    Input {
        prompt: &'static str,
        buf: TextBuffer,
    },
    Edit {
        id: u64,
        buf: TextBuffer,
    },
    Confirm {
        prompt: &'static str,
        on_confirm: ConfirmTarget,
    },
    Search {
        buf: TextBuffer,
    },
    Help,
}

#[derive(Debug, Clone)]
pub enum ConfirmTarget {
    DeleteTask(u64),
}

/// Notification severity for statusbar coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Global application state. Owns everything except the checklist itself,
/// which is threaded through the handlers so tests can drive them directly.
pub struct AppState {
    pub mode: Mode,
    /// Index into the visible projection, not into `Checklist::tasks`.
    pub selected: usize,
    pub filter: crate::list::Filter,
    pub sort: crate::list::SortMode,
    pub search: Option<String>,
    pub config: LocalConfig,
    pub notification: Option<String>,
    pub notification_level: NotificationLevel,
    pub notification_expires: Option<Instant>,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(config: LocalConfig) -> Self {
        Self {
            mode: Mode::Normal,
            selected: 0,
            filter: crate::list::Filter::All,
            sort: crate::list::SortMode::None,
            search: None,
            config,
            notification: None,
            notification_level: NotificationLevel::Info,
            notification_expires: None,
            should_quit: false,
        }
    }

    /// The filtered-then-sorted projection currently shown to the user.
    pub fn visible<'a>(&self, checklist: &'a Checklist) -> Vec<&'a Task> {
        let matcher = SkimMatcherV2::default();
        checklist.visible(self.filter, self.sort, self.search.as_deref(), &matcher)
    }

    /// Resolve the selected row to a task id.
    pub fn selected_task_id(&self, checklist: &Checklist) -> Option<u64> {
        self.visible(checklist).get(self.selected).map(|t| t.id)
    }

    /// Show a transient notification.
    pub fn notify(&mut self, msg: impl Into<String>) {
        self.notification = Some(msg.into());
        self.notification_level = NotificationLevel::Info;
        self.notification_expires = Some(Instant::now() + Duration::from_secs(3));
    }

    /// Show a transient error notification (rendered in red).
    pub fn notify_error(&mut self, msg: impl Into<String>) {
        self.notification = Some(msg.into());
        self.notification_level = NotificationLevel::Error;
        self.notification_expires = Some(Instant::now() + Duration::from_secs(3));
    }

    /// Clear expired notifications.
    pub fn tick_notification(&mut self) {
        if let Some(expires) = self.notification_expires {
            if Instant::now() >= expires {
                self.notification = None;
                self.notification_level = NotificationLevel::Info;
                self.notification_expires = None;
            }
        }
    }

    /// Clamp the selected row to the visible projection.
    pub fn clamp_selection(&mut self, checklist: &Checklist) {
        let len = self.visible(checklist).len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }
}

/// Sync the active search query from the search buffer.
fn sync_search(state: &mut AppState) {
    if let Mode::Search { buf } = &state.mode {
        state.search = if buf.input.is_empty() {
            None
        } else {
            Some(buf.input.clone())
        };
    }
}

/// Main TUI application loop.
pub fn run(
    terminal: &mut DefaultTerminal,
    store: &dyn Store,
    config: LocalConfig,
) -> color_eyre::Result<()> {
    let mut checklist = load_checklist(store);
    let mut state = AppState::new(config);
    state.clamp_selection(&checklist);

    loop {
        state.tick_notification();

        terminal.draw(|f| crate::ui::render(f, &checklist, &state))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                let action = map_key(key, &state.mode);
                process_action(&mut checklist, &mut state, action, store)?;

                if state.should_quit {
                    break;
                }
            }
        }
    }

    Ok(())
}

pub fn process_action(
    checklist: &mut Checklist,
    state: &mut AppState,
    action: Action,
    store: &dyn Store,
) -> color_eyre::Result<()> {
    match action {
        Action::None => {}

        // Navigation
        Action::SelectPrev | Action::SelectNext | Action::JumpFirst | Action::JumpLast => {
            handle_navigation(checklist, state, action);
        }

        // Task actions
        Action::NewTask | Action::EditTask | Action::ToggleDone | Action::DeleteTask => {
            handle_task_action(checklist, state, action, store)?;
        }

        // View
        Action::CycleFilter
        | Action::SetFilter(_)
        | Action::CycleSort
        | Action::StartSearch
        | Action::ClearFilters => {
            handle_view(checklist, state, action);
        }

        // Text input delegation
        Action::InputChar(_)
        | Action::InputBackspace
        | Action::InputLeft
        | Action::InputRight
        | Action::InputHome
        | Action::InputEnd
        | Action::InputDeleteWord
        | Action::InputConfirm
        | Action::InputCancel => {
            handle_input(checklist, state, action, store)?;
        }

        // Confirmation
        Action::Confirm | Action::Deny => {
            handle_confirm(checklist, state, action, store)?;
        }

        Action::Reload => {
            state.mode = Mode::Normal;
            *checklist = load_checklist(store);
            state.clamp_selection(checklist);
            state.notify("Checklist reloaded");
        }
        Action::ShowHelp => state.mode = Mode::Help,
        Action::Quit => match &state.mode {
            Mode::Normal => state.should_quit = true,
            _ => state.mode = Mode::Normal,
        },
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Handler: Navigation (row selection over the visible projection)
// ---------------------------------------------------------------------------

fn handle_navigation(checklist: &Checklist, state: &mut AppState, action: Action) {
    let len = state.visible(checklist).len();
    match action {
        Action::SelectPrev => {
            if state.selected > 0 {
                state.selected -= 1;
            }
        }
        Action::SelectNext => {
            if state.selected + 1 < len {
                state.selected += 1;
            }
        }
        Action::JumpFirst => {
            state.selected = 0;
        }
        Action::JumpLast => {
            state.selected = len.saturating_sub(1);
        }
        _ => unreachable!(),
    }
}

// ---------------------------------------------------------------------------
// Handler: Task actions (add, inline edit, toggle, delete)
// ---------------------------------------------------------------------------

fn handle_task_action(
    checklist: &mut Checklist,
    state: &mut AppState,
    action: Action,
    store: &dyn Store,
) -> color_eyre::Result<()> {
    match action {
        Action::NewTask => {
            state.mode = Mode::Input {
                prompt: "New task",
                buf: TextBuffer::empty(),
            };
        }
        Action::EditTask => {
            if let Some(id) = state.selected_task_id(checklist) {
                if let Some(task) = checklist.find(id) {
                    state.mode = Mode::Edit {
                        id,
                        buf: TextBuffer::new(task.text.clone()),
                    };
                }
            }
        }
        Action::ToggleDone => {
            if let Some(id) = state.selected_task_id(checklist) {
                if checklist.toggle(id) {
                    save_checklist(store, checklist)?;
                    let (done, text) = checklist
                        .find(id)
                        .map(|t| (t.done, t.text.clone()))
                        .unwrap_or_default();
                    record_activity(store, "toggle", id, &text);
                    state.clamp_selection(checklist);
                    state.notify(if done { "Task completed" } else { "Task reopened" });
                }
            }
        }
        Action::DeleteTask => {
            if let Some(id) = state.selected_task_id(checklist) {
                if state.config.confirm_delete {
                    state.mode = Mode::Confirm {
                        prompt: "Delete task?",
                        on_confirm: ConfirmTarget::DeleteTask(id),
                    };
                } else {
                    delete_task(checklist, state, id, store)?;
                }
            }
        }
        _ => unreachable!(),
    }

    Ok(())
}

/// Remove a task, persist, and notify.
fn delete_task(
    checklist: &mut Checklist,
    state: &mut AppState,
    id: u64,
    store: &dyn Store,
) -> color_eyre::Result<()> {
    if let Some(task) = checklist.remove(id) {
        save_checklist(store, checklist)?;
        record_activity(store, "delete", id, &task.text);
        state.clamp_selection(checklist);
        state.notify("Task deleted");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Handler: View (filter, sort, search)
// ---------------------------------------------------------------------------

fn handle_view(checklist: &Checklist, state: &mut AppState, action: Action) {
    match action {
        Action::CycleFilter => {
            state.filter = state.filter.cycle();
            state.clamp_selection(checklist);
            state.notify(format!("Filter: {}", state.filter));
        }
        Action::SetFilter(filter) => {
            state.filter = filter;
            state.clamp_selection(checklist);
            state.notify(format!("Filter: {filter}"));
        }
        Action::CycleSort => {
            state.sort = state.sort.cycle();
            state.clamp_selection(checklist);
            state.notify(match state.sort {
                crate::list::SortMode::None => "Sort: off",
                crate::list::SortMode::Ascending => "Sort: A-Z",
                crate::list::SortMode::Descending => "Sort: Z-A",
            });
        }
        Action::StartSearch => {
            state.search = None;
            state.mode = Mode::Search {
                buf: TextBuffer::empty(),
            };
            state.clamp_selection(checklist);
        }
        Action::ClearFilters => {
            if state.filter != crate::list::Filter::All || state.search.is_some() {
                state.filter = crate::list::Filter::All;
                state.search = None;
                state.clamp_selection(checklist);
                state.notify("Filters cleared");
            }
        }
        _ => unreachable!(),
    }
}

// ---------------------------------------------------------------------------
// Handler: Text input (char entry, cursor movement, confirm, cancel)
// ---------------------------------------------------------------------------

fn handle_input(
    checklist: &mut Checklist,
    state: &mut AppState,
    action: Action,
    store: &dyn Store,
) -> color_eyre::Result<()> {
    let is_search = matches!(state.mode, Mode::Search { .. });

    match action {
        Action::InputChar(c) => {
            if let Mode::Input { buf, .. } | Mode::Edit { buf, .. } | Mode::Search { buf } =
                &mut state.mode
            {
                buf.insert(c);
            }
        }
        Action::InputBackspace => {
            if let Mode::Input { buf, .. } | Mode::Edit { buf, .. } | Mode::Search { buf } =
                &mut state.mode
            {
                buf.backspace();
            }
        }
        Action::InputDeleteWord => {
            if let Mode::Input { buf, .. } | Mode::Edit { buf, .. } | Mode::Search { buf } =
                &mut state.mode
            {
                buf.delete_word();
            }
        }
        Action::InputLeft => {
            if let Mode::Input { buf, .. } | Mode::Edit { buf, .. } | Mode::Search { buf } =
                &mut state.mode
            {
                buf.move_left();
            }
        }
        Action::InputRight => {
            if let Mode::Input { buf, .. } | Mode::Edit { buf, .. } | Mode::Search { buf } =
                &mut state.mode
            {
                buf.move_right();
            }
        }
        Action::InputHome => {
            if let Mode::Input { buf, .. } | Mode::Edit { buf, .. } | Mode::Search { buf } =
                &mut state.mode
            {
                buf.home();
            }
        }
        Action::InputEnd => {
            if let Mode::Input { buf, .. } | Mode::Edit { buf, .. } | Mode::Search { buf } =
                &mut state.mode
            {
                buf.end();
            }
        }
        Action::InputConfirm => {
            handle_input_confirm(checklist, state, store)?;
            return Ok(());
        }
        Action::InputCancel => {
            if is_search {
                state.search = None;
                state.clamp_selection(checklist);
            }
            state.mode = Mode::Normal;
            return Ok(());
        }
        _ => unreachable!(),
    }

    // Search narrows the list live, keystroke by keystroke
    if is_search {
        sync_search(state);
        state.clamp_selection(checklist);
    }

    Ok(())
}

/// Process InputConfirm for Input, Edit, and Search modes.
fn handle_input_confirm(
    checklist: &mut Checklist,
    state: &mut AppState,
    store: &dyn Store,
) -> color_eyre::Result<()> {
    let old_mode = std::mem::replace(&mut state.mode, Mode::Normal);

    match old_mode {
        Mode::Input { buf, .. } => {
            // Whitespace-only drafts are dropped silently; the draft is
            // cleared either way because the mode is gone.
            if let Some(id) = checklist.add(&buf.input) {
                save_checklist(store, checklist)?;
                let text = checklist.find(id).map(|t| t.text.clone()).unwrap_or_default();
                record_activity(store, "add", id, &text);
                state.clamp_selection(checklist);
                state.notify("Task added");
            }
        }
        Mode::Edit { id, buf } => {
            // An empty or unchanged draft commits nothing, but edit mode
            // always exits.
            if checklist.rename(id, &buf.input) {
                save_checklist(store, checklist)?;
                let text = checklist.find(id).map(|t| t.text.clone()).unwrap_or_default();
                record_activity(store, "edit", id, &text);
                state.notify("Task updated");
            }
            state.clamp_selection(checklist);
        }
        Mode::Search { buf } => {
            state.search = if buf.input.trim().is_empty() {
                None
            } else {
                Some(buf.input)
            };
            state.clamp_selection(checklist);
        }
        other => state.mode = other,
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Handler: Confirmation (delete)
// ---------------------------------------------------------------------------

fn handle_confirm(
    checklist: &mut Checklist,
    state: &mut AppState,
    action: Action,
    store: &dyn Store,
) -> color_eyre::Result<()> {
    match action {
        Action::Confirm => {
            if let Mode::Confirm {
                on_confirm: ConfirmTarget::DeleteTask(id),
                ..
            } = &state.mode
            {
                let id = *id;
                state.mode = Mode::Normal;
                delete_task(checklist, state, id, store)?;
            } else {
                state.mode = Mode::Normal;
            }
        }
        Action::Deny => {
            state.mode = Mode::Normal;
        }
        _ => unreachable!(),
    }

    Ok(())
}
