use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::Frame;
use regex::Regex;
use strum::IntoEnumIterator;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::state::{Confirmation, NoticeLevel, Tab, ViewState};
use crate::config::CollectionConfig;
use crate::dream::DreamRecord;
use crate::highlight::{build_highlight_regex, split_matches};
use crate::timefmt;

pub fn draw_app(
    frame: &mut Frame,
    state: &ViewState,
    list_state: &mut ListState,
    options: &CollectionConfig,
) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(frame.size());

    render_tabs(frame, state, vertical[0]);
    match state.current_tab {
        Tab::Collection => render_collection(frame, state, list_state, options, vertical[1]),
        _ => render_catalog(frame, state, vertical[1]),
    }
    let status = Paragraph::new(build_status_line(state)).style(Style::default().fg(Color::Gray));
    frame.render_widget(status, vertical[2]);

    if state.show_dream_detail {
        render_detail(frame, state);
    }
    if let Some(confirmation) = state.confirmation.as_ref() {
        render_confirmation(frame, state, confirmation);
    }
}

fn render_tabs(frame: &mut Frame, state: &ViewState, area: Rect) {
    let titles: Vec<Line> = Tab::iter()
        .enumerate()
        .map(|(idx, tab)| Line::from(format!("{} {}", idx + 1, tab.title())))
        .collect();
    let tabs = Tabs::new(titles)
        .select(state.current_tab.index())
        .block(Block::default().borders(Borders::ALL).title("Dreamshelf"))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, area);
}

fn render_collection(
    frame: &mut Frame,
    state: &ViewState,
    list_state: &mut ListState,
    options: &CollectionConfig,
    area: Rect,
) {
    let highlight_regex = build_highlight_regex(&state.search_keyword);
    let highlight_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let items: Vec<ListItem> = state
        .collection()
        .iter()
        .map(|record| {
            let header = Line::from(vec![
                Span::raw(format!("{} ", record.type_icon())),
                Span::styled(
                    record.type_name(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::styled(record.display_time(), Style::default().fg(Color::Gray)),
            ]);
            let preview = preview_text(&record.content, options.preview_chars);
            let body = Line::from(highlight_spans(
                &preview,
                highlight_regex.as_ref(),
                highlight_style,
                Style::default(),
            ));
            ListItem::new(vec![header, body, Line::from("")])
        })
        .collect();

    let title = format!(
        "Collection ({}) · {} {}",
        state.collection().len(),
        state.sort.field.label(),
        state.sort.direction.arrow()
    );
    let block = Block::default().borders(Borders::ALL).title(title);

    if items.is_empty() {
        let message = if state.search_keyword.trim().is_empty() {
            "No collected dreams yet. Collect one from your history to see it here."
        } else {
            "No collected dreams match your search."
        };
        let empty = Paragraph::new(message)
            .block(block)
            .style(Style::default().fg(Color::Gray))
            .wrap(Wrap { trim: true });
        frame.render_widget(empty, area);
        return;
    }

    list_state.select(Some(state.selected));
    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    );
    frame.render_stateful_widget(list, area, list_state);
}

fn render_catalog(frame: &mut Frame, state: &ViewState, area: Rect) {
    let items: Vec<ListItem> = state
        .catalog_items()
        .iter()
        .map(|item| {
            ListItem::new(vec![
                Line::from(Span::styled(
                    item.title,
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(item.desc, Style::default().fg(Color::Gray))),
            ])
        })
        .collect();
    let mut catalog_state = ListState::default();
    catalog_state.select(Some(state.catalog_selected));
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(state.current_tab.title()),
        )
        .highlight_style(Style::default().fg(Color::Cyan))
        .highlight_symbol("› ");
    frame.render_stateful_widget(list, area, &mut catalog_state);
}

fn render_detail(frame: &mut Frame, state: &ViewState) {
    let Some(record) = state.selected_dream.as_ref() else {
        return;
    };
    let area = centered_rect(70, 60, frame.size());
    frame.render_widget(Clear, area);
    let paragraph = Paragraph::new(detail_text(record, &state.search_keyword))
        .block(
            Block::default()
                .title(format!("{} {}", record.type_icon(), record.type_name()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn detail_text(record: &DreamRecord, keyword: &str) -> Text<'static> {
    let regex = build_highlight_regex(keyword);
    let highlight_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(Span::styled(
            format!(
                "Created {}",
                timefmt::format_display_absolute(&record.create_time)
            ),
            Style::default().fg(Color::Gray),
        )),
    ];
    if let Some(collected) = record.collect_time.as_deref() {
        lines.push(Line::from(Span::styled(
            format!("Collected {}", timefmt::format_display_absolute(collected)),
            Style::default().fg(Color::Gray),
        )));
    }
    lines.push(Line::from(""));
    for line in record.content.lines() {
        lines.push(Line::from(highlight_spans(
            line,
            regex.as_ref(),
            highlight_style,
            Style::default(),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "c uncollect • d delete • y copy • Esc close",
        Style::default().fg(Color::DarkGray),
    )));
    Text::from(lines)
}

fn render_confirmation(frame: &mut Frame, state: &ViewState, confirmation: &Confirmation) {
    let (title, accent) = match confirmation {
        Confirmation::Collect { collect: true, .. } => ("Collect", Color::Green),
        Confirmation::Collect { collect: false, .. } => ("Uncollect", Color::Yellow),
        Confirmation::Delete { .. } => ("Delete", Color::Red),
    };
    let preview = state
        .history()
        .iter()
        .find(|record| record.id == confirmation.id())
        .map(|record| preview_text(&record.content, 40))
        .unwrap_or_default();
    let area = centered_rect(50, 30, frame.size());
    frame.render_widget(Clear, area);
    let paragraph = Paragraph::new(vec![
        Line::from(Span::styled(
            confirmation.prompt(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(preview, Style::default().fg(Color::Gray))),
        Line::from(""),
        Line::from(Span::styled(
            "Enter or y confirm • Esc cancel",
            Style::default().fg(accent),
        )),
    ])
    .block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent)),
    )
    .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn build_status_line(state: &ViewState) -> Text<'static> {
    let mut spans = Vec::new();
    let label_style = if state.search_active {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    spans.push(Span::styled("Search /", label_style));
    spans.push(Span::raw(" "));
    if state.search_input.is_empty() && !state.search_active {
        spans.push(Span::styled(
            "type to filter",
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        spans.push(Span::styled(
            state.search_input.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
    }
    if state.search_active {
        spans.push(Span::styled("▌", Style::default().fg(Color::Cyan)));
    }
    if state.is_search_pending() {
        spans.push(Span::styled(" …", Style::default().fg(Color::DarkGray)));
    }
    spans.push(Span::raw(format!(
        " | Sort: {} {}",
        state.sort.field.label(),
        state.sort.direction.arrow()
    )));

    if let Some(notice) = state.notice.as_ref() {
        let color = match notice.level {
            NoticeLevel::Info => Color::Cyan,
            NoticeLevel::Success => Color::Green,
            NoticeLevel::Error => Color::Red,
        };
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            notice.message.clone(),
            Style::default().fg(color),
        ));
    }

    let keys = match state.current_tab {
        Tab::Collection => {
            "Tab/1-5 switch • j/k move • Enter detail • / search • s sort • o order • c collect • d delete • y copy • q quit"
        }
        _ => "Tab/1-5 switch • j/k move • Enter open • q quit",
    };
    Text::from(vec![
        Line::from(spans),
        Line::from(Span::styled(keys, Style::default().fg(Color::DarkGray))),
    ])
}

/// First `limit` display columns of the text's first non-empty line, with an
/// ellipsis when cut.
pub(crate) fn preview_text(content: &str, limit: usize) -> String {
    let line = content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");
    let mut width = 0usize;
    let mut preview = String::new();
    for grapheme in line.graphemes(true) {
        let glyph_width = UnicodeWidthStr::width(grapheme);
        if width + glyph_width > limit {
            preview.push('…');
            return preview;
        }
        width += glyph_width;
        preview.push_str(grapheme);
    }
    if content.trim().lines().nth(1).is_some() {
        preview.push('…');
    }
    preview
}

fn highlight_spans(
    text: &str,
    regex: Option<&Regex>,
    highlight_style: Style,
    base_style: Style,
) -> Vec<Span<'static>> {
    split_matches(text, regex)
        .into_iter()
        .map(|(segment, matched)| {
            let style = if matched { highlight_style } else { base_style };
            Span::styled(segment.to_string(), style)
        })
        .collect()
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
