//! UI rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use quotebook_core::{CatalogState, ViewMode};

use super::app::{App, Focus};
use crate::output::truncate;

/// Main UI rendering function
pub fn draw(frame: &mut Frame, app: &App, state: &CatalogState) {
    let outer_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let pane_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(outer_chunks[1]);

    draw_search_bar(frame, app, state, outer_chunks[0]);
    draw_quotes_pane(frame, app, state, pane_chunks[0]);
    draw_side_pane(frame, app, state, pane_chunks[1]);
    draw_status_bar(frame, app, state, outer_chunks[2]);
    draw_loading_indicator(frame, state);

    if app.show_help {
        draw_help_overlay(frame);
    }
}

fn border_style(active: bool) -> Style {
    if active {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

/// Draw the search bar (top)
fn draw_search_bar(frame: &mut Frame, app: &App, state: &CatalogState, area: Rect) {
    let is_active = app.focus == Focus::Search;
    let block = Block::default()
        .title(format!(" Quotebook · {} ", app.api_url))
        .borders(Borders::ALL)
        .border_style(border_style(is_active));

    let line = if is_active {
        Line::from(vec![
            Span::styled("/", Style::default().fg(Color::Cyan)),
            Span::raw(app.search_input.as_str()),
        ])
    } else if state.mode == ViewMode::Searching {
        Line::from(vec![
            Span::styled("Search: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(state.search_term.as_str()),
            Span::styled(
                "  (Esc to clear)",
                Style::default().add_modifier(Modifier::DIM),
            ),
        ])
    } else {
        Line::from(Span::styled(
            "Press / to search",
            Style::default().add_modifier(Modifier::DIM),
        ))
    };

    frame.render_widget(Paragraph::new(line).block(block), area);

    if is_active {
        let cursor_x = area.x + 2 + app.search_input.chars().count() as u16;
        frame.set_cursor_position((cursor_x, area.y + 1));
    }
}

/// Draw the quote list (left)
fn draw_quotes_pane(frame: &mut Frame, app: &App, state: &CatalogState, area: Rect) {
    let is_active = app.focus == Focus::List;
    let max_len = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = state
        .quotes
        .iter()
        .map(|quote| {
            let text = Line::from(Span::raw(truncate(&quote.text, max_len)));
            let author = Line::from(Span::styled(
                truncate(&format!("  - {}", quote.author), max_len),
                Style::default().add_modifier(Modifier::DIM),
            ));
            ListItem::new(vec![text, author])
        })
        .collect();

    let title = match state.mode {
        ViewMode::Browsing => format!(" Quotes ({}) ", state.quotes.len()),
        ViewMode::Searching => format!(" Results ({}) ", state.quotes.len()),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(is_active));

    let highlight_style = if is_active {
        Style::default()
            .add_modifier(Modifier::BOLD)
            .add_modifier(Modifier::REVERSED)
    } else {
        Style::default().add_modifier(Modifier::REVERSED)
    };

    if items.is_empty() {
        let empty = if state.is_loading() {
            "Loading..."
        } else {
            "No quotes found."
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(
            empty,
            Style::default().add_modifier(Modifier::DIM),
        )))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(highlight_style);

    let mut list_state = ListState::default();
    list_state.select(Some(app.list_index));

    frame.render_stateful_widget(list, area, &mut list_state);
}

/// Draw random quote, form and suggestion (right)
fn draw_side_pane(frame: &mut Frame, app: &App, state: &CatalogState, area: Rect) {
    let mut constraints = vec![Constraint::Min(6)];
    if state.form_open {
        constraints.push(Constraint::Length(8));
    }
    if state.suggestion.is_some() {
        constraints.push(Constraint::Length(6));
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    draw_random_pane(frame, state, chunks[0]);

    let mut next = 1;
    if state.form_open {
        draw_form_pane(frame, app, state, chunks[next]);
        next += 1;
    }
    if state.suggestion.is_some() {
        draw_suggestion_pane(frame, state, chunks[next]);
    }
}

fn draw_random_pane(frame: &mut Frame, state: &CatalogState, area: Rect) {
    let block = Block::default().title(" Random quote ").borders(Borders::ALL);

    let lines = match (&state.random, &state.random_failure) {
        (Some(quote), _) => {
            let mut lines = vec![
                Line::from(Span::styled(
                    format!("\"{}\"", quote.text),
                    Style::default().add_modifier(Modifier::ITALIC),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    format!("- {}", quote.author),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
            ];
            if let Some(created) = quote.created_at {
                lines.push(Line::from(Span::styled(
                    format!("added {}", created.format("%Y-%m-%d")),
                    Style::default().add_modifier(Modifier::DIM),
                )));
            }
            lines
        }
        (None, Some(failure)) => vec![Line::from(Span::styled(
            failure.user_message(),
            Style::default().add_modifier(Modifier::DIM),
        ))],
        (None, None) => vec![Line::from(Span::styled(
            "Press r for a random quote",
            Style::default().add_modifier(Modifier::DIM),
        ))],
    };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn draw_form_pane(frame: &mut Frame, app: &App, state: &CatalogState, area: Rect) {
    let title = match state.edit_target {
        Some(id) => format!(" Edit quote {} ", id),
        None => " New quote ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(app.focus.is_form()));

    let label = |name: &'static str, focused: bool| {
        let style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        Span::styled(name, style)
    };

    let lines = vec![
        Line::from(vec![
            label("Text:   ", app.focus == Focus::FormText),
            Span::raw(state.draft.text.as_str()),
        ]),
        Line::from(""),
        Line::from(vec![
            label("Author: ", app.focus == Focus::FormAuthor),
            Span::raw(state.draft.author.as_str()),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Enter:save  Tab:next field  Esc:close",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn draw_suggestion_pane(frame: &mut Frame, state: &CatalogState, area: Rect) {
    let Some(suggestion) = &state.suggestion else {
        return;
    };

    let block = Block::default()
        .title(" Suggestion ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let lines = vec![
        Line::from(format!("\"{}\"", suggestion.text)),
        Line::from(Span::styled(
            format!("- {}", suggestion.author),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "u:use in form  A:add to catalog",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

/// Draw the status bar at the bottom
fn draw_status_bar(frame: &mut Frame, app: &App, state: &CatalogState, area: Rect) {
    let (content, style) = if let Some(id) = app.pending_delete {
        (
            format!("Delete quote {}? [y/N]", id),
            Style::default().fg(Color::Yellow),
        )
    } else if let Some(failure) = &state.last_error {
        (failure.user_message(), Style::default().fg(Color::Red))
    } else if let Some(notice) = &state.notice {
        (notice.clone(), Style::default().fg(Color::Green))
    } else if let Some(msg) = &app.status_message {
        (msg.clone(), Style::default().add_modifier(Modifier::DIM))
    } else {
        (
            "a:add  e:edit  d:del  r:random  x:external  /:search  ?:help  q:quit".to_string(),
            Style::default().add_modifier(Modifier::DIM),
        )
    };

    frame.render_widget(Paragraph::new(content).style(style), area);
}

/// Draw a spinner in the top-right corner while requests are running
fn draw_loading_indicator(frame: &mut Frame, state: &CatalogState) {
    let area = frame.area();
    if area.width < 5 || !state.is_loading() {
        return;
    }

    let indicator = Paragraph::new(Span::styled("↻", Style::default().fg(Color::Yellow)));
    let indicator_area = Rect::new(area.width - 3, 0, 1, 1);
    frame.render_widget(indicator, indicator_area);
}

/// Draw help overlay
fn draw_help_overlay(frame: &mut Frame) {
    let area = frame.area();

    // Calculate centered popup area
    let popup_width = 52.min(area.width.saturating_sub(4));
    let popup_height = 24.min(area.height.saturating_sub(4));
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from("Navigation:"),
        Line::from("  j/k, ↑/↓    Move up/down"),
        Line::from("  g/G         Jump to first/last quote"),
        Line::from("  /           Search (Esc clears)"),
        Line::from(""),
        Line::from("Quotes:"),
        Line::from("  a           New quote form"),
        Line::from("  e, Enter    Edit selected quote"),
        Line::from("  d           Delete selected quote"),
        Line::from("  r           New random quote"),
        Line::from("  R           Reload catalog"),
        Line::from(""),
        Line::from("External source:"),
        Line::from("  x           Fetch any quote"),
        Line::from("  u / A       Use suggestion / Add it"),
        Line::from("  Tab         Next field (looks up suggestions)"),
        Line::from(""),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD));

    let paragraph = Paragraph::new(help_text).block(block);
    frame.render_widget(paragraph, popup_area);
}
