use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Padding, Paragraph};
use ratatui::Frame;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use super::theme::Theme;
use crate::app::{AppState, Mode};
use crate::list::Checklist;

/// First visible row so that `selected` stays on screen.
pub(crate) fn scroll_offset(selected: usize, rows: usize) -> usize {
    if rows == 0 {
        return 0;
    }
    if selected >= rows {
        selected + 1 - rows
    } else {
        0
    }
}

/// Truncate to `max_width` display columns on a grapheme boundary,
/// appending an ellipsis when anything was cut.
pub(crate) fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let budget = max_width.saturating_sub(1);
    let mut out = String::new();
    let mut used = 0;
    for grapheme in text.graphemes(true) {
        let w = grapheme.width();
        if used + w > budget {
            break;
        }
        out.push_str(grapheme);
        used += w;
    }
    out.push('…');
    out
}

pub fn render_list(f: &mut Frame, area: Rect, checklist: &Checklist, state: &AppState) {
    let visible = state.visible(checklist);

    let title = format!(" Tasks {}/{} ", visible.len(), checklist.tasks.len());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Theme::LIST_BORDER))
        .title(Span::styled(
            title,
            Style::default().fg(Theme::FG).add_modifier(Modifier::BOLD),
        ))
        .padding(Padding::horizontal(1));

    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.height == 0 {
        return;
    }

    if visible.is_empty() {
        let hint = if checklist.tasks.is_empty() {
            "No tasks yet. Press a to add one."
        } else {
            "No tasks match the current view. Press Esc to clear filters."
        };
        f.render_widget(Paragraph::new(hint).style(Theme::dim_style()), inner);
        return;
    }

    let rows = inner.height as usize;
    let offset = scroll_offset(state.selected, rows);

    let lines: Vec<Line> = visible
        .iter()
        .enumerate()
        .skip(offset)
        .take(rows)
        .map(|(row, task)| {
            let is_selected = row == state.selected;
            let mut spans = Vec::new();

            let marker = if task.done { "[x] " } else { "[ ] " };
            let marker_color = if task.done { Theme::DONE_MARKER } else { Theme::FG };
            spans.push(Span::styled(marker, Style::default().fg(marker_color)));

            if state.config.show_ids {
                spans.push(Span::styled(
                    format!("#{} ", task.id),
                    Theme::dim_style(),
                ));
            }

            // Inline edit replaces the row's text with the draft buffer
            if let Mode::Edit { id, buf } = &state.mode {
                if *id == task.id {
                    spans.push(Span::styled(
                        buf.input.clone(),
                        Style::default().fg(Theme::FG),
                    ));
                    spans.push(Span::raw("_"));
                    return Line::from(spans);
                }
            }

            let used: usize = spans.iter().map(|s| s.content.width()).sum();
            let avail = (inner.width as usize).saturating_sub(used);
            let text = truncate_to_width(&task.text, avail);

            let mut style = Style::default().fg(Theme::FG);
            if task.done {
                style = Theme::dim_style().add_modifier(Modifier::CROSSED_OUT);
            }
            if is_selected {
                style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
            }
            spans.push(Span::styled(text, style));

            Line::from(spans)
        })
        .collect();

    f.render_widget(Paragraph::new(lines), inner);
}
