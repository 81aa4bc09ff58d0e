use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use super::theme::Theme;
use crate::app::{AppState, Mode, NotificationLevel};
use crate::list::{Checklist, SortMode};

pub fn render_status_bar(f: &mut Frame, area: Rect, state: &AppState, checklist: &Checklist) {
    // Full-line modes: Input, Confirm, Search — take over the entire bar
    if let Some(line) = render_full_line_mode(state) {
        let paragraph = Paragraph::new(line).style(Theme::status_style());
        f.render_widget(paragraph, area);
        return;
    }

    // Three-zone layout for all other modes
    let left = build_left_zone(state);
    let right = build_right_zone(state, checklist);

    let left_width: usize = left.iter().map(|s| s.content.width()).sum();
    let right_width: usize = right.iter().map(|s| s.content.width()).sum();
    let total_width = area.width as usize;

    // Center zone: notification (fills remaining space)
    let center_avail = total_width.saturating_sub(left_width + right_width);
    let center = build_center_zone(state, center_avail);

    let mut spans = left;
    spans.extend(center);
    spans.extend(right);

    let line = Line::from(spans);
    let paragraph = Paragraph::new(line).style(Theme::status_style());
    f.render_widget(paragraph, area);
}

/// Build the left zone: mode badge + active filter, sort, and search.
fn build_left_zone(state: &AppState) -> Vec<Span<'_>> {
    let mode_str = match &state.mode {
        Mode::Normal => "NORMAL",
        Mode::Edit { .. } => "EDIT",
        Mode::Help => "HELP",
        // Full-line modes handled separately
        Mode::Input { .. } | Mode::Confirm { .. } | Mode::Search { .. } => "",
    };

    let mut spans = vec![
        Span::styled(
            format!(" {mode_str} "),
            Style::default()
                .fg(Theme::FG)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED),
        ),
        Span::raw(" "),
        Span::styled(
            format!("[{}] ", state.filter),
            Style::default().fg(Theme::DIM),
        ),
    ];

    if state.sort != SortMode::None {
        spans.push(Span::styled(
            format!("sort{} ", state.sort.indicator()),
            Style::default().fg(Theme::FG),
        ));
    }

    // Show active search query
    if let Some(ref query) = state.search {
        spans.push(Span::styled(
            format!("/{query} "),
            Style::default().fg(Theme::FG),
        ));
    }

    spans
}

/// Build the right zone: row position + active/total counts.
fn build_right_zone<'a>(state: &AppState, checklist: &'a Checklist) -> Vec<Span<'a>> {
    let visible = state.visible(checklist).len();
    let pos = if visible > 0 {
        format!(" {}/{}", state.selected + 1, visible)
    } else {
        " 0".to_string()
    };

    vec![
        Span::styled(
            format!("{} open, {} done", checklist.active_count(), checklist.completed_count()),
            Style::default().fg(Theme::DIM),
        ),
        Span::styled(pos, Style::default().fg(Theme::FG)),
        Span::raw(" "),
    ]
}

/// Build the center zone: notification text padded to fill available width.
fn build_center_zone(state: &AppState, avail_width: usize) -> Vec<Span<'_>> {
    if let Some(ref notif) = state.notification {
        let notif_width = notif.width();
        let color = match state.notification_level {
            NotificationLevel::Info => Theme::FG,
            NotificationLevel::Error => Theme::STATUS_ERROR,
        };

        if notif_width >= avail_width {
            // Notification wider than available — just show it truncated
            let truncated: String = notif.chars().take(avail_width).collect();
            return vec![Span::styled(truncated, Style::default().fg(color))];
        }

        // Center the notification in the available space
        let pad_total = avail_width - notif_width;
        let pad_left = pad_total / 2;
        let pad_right = pad_total - pad_left;

        vec![
            Span::raw(" ".repeat(pad_left)),
            Span::styled(notif.as_str(), Style::default().fg(color)),
            Span::raw(" ".repeat(pad_right)),
        ]
    } else {
        // No notification — just fill with spaces
        vec![Span::raw(" ".repeat(avail_width))]
    }
}

/// Render full-line modes (Input, Confirm, Search).
fn render_full_line_mode(state: &AppState) -> Option<Line<'_>> {
    match &state.mode {
        Mode::Input { prompt, buf } => {
            let spans = vec![
                Span::styled(
                    format!(" {prompt} "),
                    Style::default()
                        .fg(Theme::FG)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED),
                ),
                Span::raw(format!(" {}", buf.input)),
                Span::raw("_"),
            ];
            Some(Line::from(spans))
        }
        Mode::Search { buf } => {
            let spans = vec![
                Span::styled(
                    " / ",
                    Style::default()
                        .fg(Theme::FG)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED),
                ),
                Span::raw(format!(" {}", buf.input)),
                Span::raw("_"),
            ];
            Some(Line::from(spans))
        }
        Mode::Confirm { prompt, .. } => {
            let spans = vec![Span::styled(
                format!(" {prompt} (y/n) "),
                Style::default()
                    .fg(Theme::FG)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED),
            )];
            Some(Line::from(spans))
        }
        _ => None,
    }
}
