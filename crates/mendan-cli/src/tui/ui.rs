//! UI rendering

use chrono::{Datelike, Weekday};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, Tabs, Wrap,
    },
    Frame,
};

use mendan_core::calendar::WEEKDAY_HEADERS;
use mendan_core::search::preview;
use mendan_core::templates::TEMPLATE_SLOTS;
use mendan_core::{CalendarCell, EntryField, MonthGrid, RecordStore};

use super::app::{ActivePane, App, EditorState, InputMode, TemplateState};

/// Characters of content shown in list previews
const LIST_PREVIEW_CHARS: usize = 40;

/// Main UI rendering function
pub fn draw(frame: &mut Frame, app: &App, store: &RecordStore) {
    // Create vertical layout for status bar at the bottom
    let outer_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    let pane_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(outer_chunks[0]);

    draw_calendar_pane(frame, app, store, pane_chunks[0]);
    if app.search_query.is_empty() {
        draw_day_pane(frame, app, store, pane_chunks[1]);
    } else {
        draw_results_pane(frame, app, pane_chunks[1]);
    }

    match app.input_mode {
        InputMode::Search => draw_search_input(frame, app, outer_chunks[1]),
        InputMode::Command => draw_command_input(frame, app, outer_chunks[1]),
        _ => draw_status_bar(frame, app, outer_chunks[1]),
    }

    if let Some(state) = &app.editor {
        draw_editor_modal(frame, state);
    }
    if let Some(state) = &app.template_state {
        draw_templates_modal(frame, state);
    }
    if let Some(pending) = &app.pending_confirm {
        draw_confirm_dialog(frame, &pending.prompt);
    }
    if let Some(message) = &app.error {
        draw_error_modal(frame, message);
    }
    if app.show_help {
        draw_help_overlay(frame);
    }
}

fn pane_block(title: String, is_active: bool) -> Block<'static> {
    let border_style = if is_active {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style)
}

/// Draw the month calendar (left)
fn draw_calendar_pane(frame: &mut Frame, app: &App, store: &RecordStore, area: Rect) {
    let grid = MonthGrid::build(app.cursor, app.today, app.visible_days(store));
    let selected = grid.index_of(app.selected);

    let mut title = format!(" {} ", grid.cursor.label());
    if !app.search_query.is_empty() {
        title.push_str(&format!("(検索: {}) ", app.search_query));
    }
    let block = pane_block(title, app.active_pane == ActivePane::Calendar);

    let inner_height = area.height.saturating_sub(3);
    let row_height = (inner_height / 6).max(1);

    let header = Row::new(WEEKDAY_HEADERS.iter().enumerate().map(|(i, d)| {
        Cell::from(*d).style(weekday_style(i).add_modifier(Modifier::BOLD))
    }));

    let rows: Vec<Row> = grid
        .weeks()
        .enumerate()
        .map(|(week, cells)| {
            let cells = cells.iter().enumerate().map(|(i, cell)| {
                let is_selected = selected == Some(week * 7 + i);
                calendar_cell(cell, is_selected, row_height)
            });
            Row::new(cells).height(row_height)
        })
        .collect();

    let table = Table::new(rows, [Constraint::Ratio(1, 7); 7])
        .header(header)
        .column_spacing(0)
        .block(block);

    frame.render_widget(table, area);
}

fn calendar_cell(cell: &CalendarCell, is_selected: bool, height: u16) -> Cell<'static> {
    let weekday = cell.date.weekday().num_days_from_sunday() as usize;

    let mut day_style = weekday_style(weekday);
    if !cell.in_current_month {
        day_style = day_style.add_modifier(Modifier::DIM);
    }
    if cell.is_today {
        day_style = day_style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    }

    let mut first = vec![Span::styled(format!("{:>2}", cell.day), day_style)];
    if cell.entry_count > 0 {
        first.push(Span::styled(
            format!(" ●{}", cell.entry_count),
            Style::default().fg(Color::Cyan),
        ));
    }

    let mut lines = vec![Line::from(first)];
    if let Some(summary) = &cell.summary {
        let available = usize::from(height.saturating_sub(1));
        let names: Vec<&str> = summary.split(", ").collect();
        for (i, name) in names.iter().enumerate().take(available) {
            let more = names.len() - i - 1;
            if i + 1 == available && more > 0 {
                lines.push(Line::from(Span::styled(
                    format!("+{}", more + 1),
                    Style::default().add_modifier(Modifier::DIM),
                )));
            } else {
                lines.push(Line::from(name.to_string()));
            }
        }
    }

    let style = if is_selected {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };

    Cell::from(Text::from(lines)).style(style)
}

fn weekday_style(index: usize) -> Style {
    match index {
        i if i == Weekday::Sun.num_days_from_sunday() as usize => Style::default().fg(Color::Red),
        i if i == Weekday::Sat.num_days_from_sunday() as usize => Style::default().fg(Color::Blue),
        _ => Style::default(),
    }
}

/// Draw the selected date's records (right)
fn draw_day_pane(frame: &mut Frame, app: &App, store: &RecordStore, area: Rect) {
    let is_active = app.active_pane == ActivePane::Day;
    let key = app.selected_key();
    let records = store.records_for(&key);

    let block = pane_block(format!(" {} ({}) ", key, records.len()), is_active);

    if records.is_empty() {
        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(
                "記録はありません",
                Style::default().add_modifier(Modifier::DIM),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Enter で記録を追加",
                Style::default().add_modifier(Modifier::DIM),
            )),
        ])
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = records
        .iter()
        .map(|entry| {
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(entry.student_name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(
                        format!("  {}年 {} / {}", entry.student_grade, entry.student_department, entry.category),
                        Style::default().add_modifier(Modifier::DIM),
                    ),
                ]),
                Line::from(format!(
                    "  {}",
                    preview(&entry.content, LIST_PREVIEW_CHARS).replace('\n', " ")
                )),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(highlight_style(is_active));

    let mut state = ListState::default();
    state.select(Some(app.day_index));

    frame.render_stateful_widget(list, area, &mut state);
}

/// Draw search results (right, while a query is active)
fn draw_results_pane(frame: &mut Frame, app: &App, area: Rect) {
    let is_active = app.active_pane == ActivePane::Day;
    let block = pane_block(format!(" 検索結果 ({}) ", app.hits.len()), is_active);

    if app.hits.is_empty() {
        let paragraph = Paragraph::new(Span::styled(
            "一致する記録はありません",
            Style::default().add_modifier(Modifier::DIM),
        ))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = app
        .hits
        .iter()
        .map(|hit| {
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(hit.date.clone(), Style::default().add_modifier(Modifier::DIM)),
                    Span::raw("  "),
                    Span::styled(
                        hit.entry.student_name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("  {}", hit.entry.category),
                        Style::default().add_modifier(Modifier::DIM),
                    ),
                ]),
                Line::from(format!(
                    "  {}",
                    preview(&hit.entry.content, LIST_PREVIEW_CHARS).replace('\n', " ")
                )),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(highlight_style(is_active));

    let mut state = ListState::default();
    state.select(Some(app.hit_index));

    frame.render_stateful_widget(list, area, &mut state);
}

fn highlight_style(is_active: bool) -> Style {
    if is_active {
        Style::default()
            .add_modifier(Modifier::BOLD)
            .add_modifier(Modifier::REVERSED)
    } else {
        Style::default().add_modifier(Modifier::REVERSED)
    }
}

/// Draw the status bar at the bottom
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let content = if let Some(msg) = &app.status_message {
        msg.clone()
    } else {
        match app.input_mode {
            InputMode::Editor => {
                "Tab:項目  ←/→:選択  C-s:保存  C-n:追加  C-d:記録削除  C-x:日付削除  C-e:$EDITOR  M-1..3:テンプレート  Esc:閉じる"
                    .to_string()
            }
            InputMode::Templates => {
                "Tab:切替  C-s:保存  C-d:削除  C-e:$EDITOR  Esc:閉じる".to_string()
            }
            InputMode::Confirm => "y:はい  n:いいえ".to_string(),
            _ => "Enter:編集  [/]:月  t:今日  d:削除  T:テンプレート  E:CSV  B:バックアップ  /:検索  ?:help  q:quit"
                .to_string(),
        }
    };

    let paragraph = Paragraph::new(content).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Draw command input at the bottom
fn draw_command_input(frame: &mut Frame, app: &App, area: Rect) {
    let prefix = ":";

    let line = Line::from(vec![
        Span::styled(prefix, Style::default().fg(Color::Yellow)),
        Span::raw(app.command_input.as_str()),
    ]);

    frame.render_widget(Paragraph::new(line), area);

    let cursor_x = area.x + line_width(prefix) + line_width(&app.command_input);
    frame.set_cursor_position((cursor_x, area.y));
}

/// Draw search input at the bottom
fn draw_search_input(frame: &mut Frame, app: &App, area: Rect) {
    let prefix = "/";

    let line = Line::from(vec![
        Span::styled(prefix, Style::default().fg(Color::Cyan)),
        Span::raw(app.search_query.as_str()),
        Span::styled(
            format!("  ({} matches)", app.hits.len()),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ]);

    frame.render_widget(Paragraph::new(line), area);

    let cursor_x = area.x + line_width(prefix) + line_width(&app.search_query);
    frame.set_cursor_position((cursor_x, area.y));
}

/// Display width of single-line text
fn line_width(text: &str) -> u16 {
    Line::from(text).width() as u16
}

/// Draw the entry editor for one date
fn draw_editor_modal(frame: &mut Frame, state: &EditorState) {
    let popup_area = centered_rect(frame.area(), 80, 85);
    frame.render_widget(Clear, popup_area);

    let editor = &state.editor;
    let mut lines: Vec<Line> = Vec::new();
    let mut focus_line = 0;

    for (index, entry) in editor.entries().iter().enumerate() {
        if index > 0 {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            format!("── 記録 {} ──", index + 1),
            Style::default().add_modifier(Modifier::BOLD),
        )));

        for field in EntryField::ALL {
            let focused = index == state.entry_index && field == state.field;
            if focused {
                focus_line = lines.len();
            }

            let value = entry.field(field);
            let is_choice = editor.options().choices(field).is_some();
            let shown = match (focused, is_choice) {
                (true, true) => format!("◀ {} ▶", value),
                (true, false) => format!("{}▏", value),
                (false, _) => value.to_string(),
            };

            let label_style = if focused {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            let required = if field.is_required() { "*" } else { "" };
            let label = Span::styled(format!("{}{}: ", field.label(), required), label_style);

            let value_style = if focused {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };

            if field == EntryField::Content {
                lines.push(Line::from(label));
                for text in shown.split('\n') {
                    lines.push(Line::from(Span::styled(format!("  {}", text), value_style)));
                }
            } else {
                lines.push(Line::from(vec![label, Span::styled(shown, value_style)]));
            }

            if let Some(message) = editor.error_for(&entry.id, field) {
                lines.push(Line::from(Span::styled(
                    format!("  {}", message),
                    Style::default().fg(Color::Red),
                )));
            }
        }
    }

    if editor.entries().is_empty() {
        lines.push(Line::from(Span::styled(
            "記録がありません (C-n で追加, C-s で保存すると日付ごと削除)",
            Style::default().add_modifier(Modifier::DIM),
        )));
    }

    let visible = popup_area.height.saturating_sub(2) as usize;
    let scroll = (focus_line + 3).saturating_sub(visible) as u16;

    let block = Block::default()
        .title(format!(" {} の面談記録 ", editor.date()))
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));

    frame.render_widget(paragraph, popup_area);
}

/// Draw the template editor
fn draw_templates_modal(frame: &mut Frame, state: &TemplateState) {
    let popup_area = centered_rect(frame.area(), 70, 70);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" テンプレート ")
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(inner);

    let titles: Vec<String> = (1..=TEMPLATE_SLOTS)
        .map(|i| format!("テンプレート{}", i))
        .collect();
    let tabs = Tabs::new(titles)
        .select(state.tab)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED));
    frame.render_widget(tabs, chunks[0]);

    let text = format!("{}▏", state.current());
    let paragraph = Paragraph::new(text).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, chunks[1]);
}

/// Draw a yes/no question
fn draw_confirm_dialog(frame: &mut Frame, prompt: &str) {
    let popup_area = centered_rect(frame.area(), 50, 30);
    frame.render_widget(Clear, popup_area);

    let text = vec![
        Line::from(prompt.to_string()),
        Line::from(""),
        Line::from(vec![
            Span::styled("[y]", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::raw(" はい   "),
            Span::styled("[n]", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" いいえ"),
        ]),
    ];

    let block = Block::default()
        .title(" 確認 ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, popup_area);
}

/// Draw an error message that waits for a key press
fn draw_error_modal(frame: &mut Frame, message: &str) {
    let popup_area = centered_rect(frame.area(), 60, 30);
    frame.render_widget(Clear, popup_area);

    let mut text: Vec<Line> = message.lines().map(|l| Line::from(l.to_string())).collect();
    text.push(Line::from(""));
    text.push(Line::from(Span::styled(
        "Press any key to close",
        Style::default().add_modifier(Modifier::DIM),
    )));

    let block = Block::default()
        .title(" Error ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, popup_area);
}

/// Draw help overlay
fn draw_help_overlay(frame: &mut Frame) {
    let area = frame.area();

    let popup_width = 56.min(area.width.saturating_sub(4));
    let popup_height = 28.min(area.height.saturating_sub(4));
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
        Line::from("Calendar:"),
        Line::from("  h/l, ←/→    Previous / next day"),
        Line::from("  k/j, ↑/↓    Previous / next week"),
        Line::from("  [ ] or p n  Previous / next month"),
        Line::from("  { }         Previous / next year"),
        Line::from("  t           Today"),
        Line::from("  Tab         Switch calendar / record list"),
        Line::from("  Enter       Edit the selected date"),
        Line::from(""),
        Line::from("Records:"),
        Line::from("  d           Delete the selected date"),
        Line::from("  D           Delete all records"),
        Line::from("  T           Templates"),
        Line::from("  E / B       Export CSV / write backup"),
        Line::from("  /           Search"),
        Line::from(""),
        Line::from("Commands (:)"),
        Line::from("  export csv|backup [path]   restore <file>"),
        Line::from("  goto YYYY-MM   today   clear   templates   q"),
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

/// Rectangle of the given percentage size centered in `area`
fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 40);
        let rect = centered_rect(area, 50, 50);
        assert_eq!(rect, Rect::new(25, 10, 50, 20));
    }

    #[test]
    fn test_line_width_counts_wide_characters() {
        assert_eq!(line_width("abc"), 3);
        assert_eq!(line_width("面談"), 4);
    }
}
