use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};
use taskger_core::{Notice, PageView, Severity, Task, TaskStatus};
use unicode_width::UnicodeWidthStr;

use crate::tui::app::{App, FormField, FormState};

pub fn draw(f: &mut Frame, app: &mut App) {
    let size = f.area();
    let view = app.vm.page_view();

    // Header, controls, content, status, help
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(size);

    let header = Paragraph::new("TASKGER")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded),
        );
    f.render_widget(header, main_chunks[0]);

    draw_controls(f, app, &view, main_chunks[1]);

    // Split content into list and detail
    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(main_chunks[2]);

    draw_task_table(f, app, &view, content_chunks[0]);
    draw_detail_view(f, app, &view, content_chunks[1]);

    draw_status_line(f, app, &view, main_chunks[3]);

    let footer = Paragraph::new(
        "j/k: Navigate | a: Add | e: Edit | d: Delete | s: Status | /: Search | f: Filter | o: Sort | h/l: Page | r: Reload | q: Quit",
    )
    .style(Style::default().fg(Color::DarkGray))
    .alignment(Alignment::Center);
    f.render_widget(footer, main_chunks[4]);

    if let Some(form) = &app.form {
        let engine_error = if form.editing {
            app.vm.edit_error()
        } else {
            app.vm.form_error()
        };
        draw_form_modal(f, form, engine_error, app.vm.is_submitting(), size);
    }
    if let Some(task) = app.vm.confirming_delete() {
        draw_confirm_modal(f, task, size);
    }
    if let Some(notice) = app.vm.notice() {
        draw_notice(f, notice, size);
    }
}

fn draw_controls(f: &mut Frame, app: &App, view: &PageView, area: Rect) {
    let search_style = if app.searching {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let line = Line::from(vec![
        Span::styled(format!("Search: {}", app.vm.search()), search_style),
        Span::raw("  |  "),
        Span::raw(format!("Status: {}", app.vm.filter().label())),
        Span::raw("  |  "),
        Span::raw(format!("Sort: {}", app.vm.sort().label())),
        Span::raw("  |  "),
        Span::raw(format!("Page {} of {}", view.page, view.total_pages)),
    ]);
    let controls = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    f.render_widget(controls, area);

    if app.searching {
        let x = area.x + 1 + "Search: ".len() as u16 + app.vm.search().width() as u16;
        f.set_cursor_position(Position::new(x, area.y + 1));
    }
}

fn status_style(status: TaskStatus) -> Style {
    match status {
        TaskStatus::Todo => Style::default().fg(Color::Blue),
        TaskStatus::InProgress => Style::default().fg(Color::Yellow),
        TaskStatus::Done => Style::default().fg(Color::Green),
    }
}

fn draw_task_table(f: &mut Frame, app: &mut App, view: &PageView, area: Rect) {
    let block = Block::default()
        .title(" Tasks ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);

    if view.tasks.is_empty() {
        let message = if app.vm.total_tasks() == 0 {
            "No tasks yet. Press 'a' to get started!"
        } else {
            "No tasks match the current search and filter."
        };
        let empty = Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(block)
            .wrap(Wrap { trim: true });
        f.render_widget(empty, area);
        return;
    }

    let rows: Vec<Row> = view
        .tasks
        .iter()
        .map(|task| {
            let due_str = task
                .due_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string());

            let row = Row::new(vec![
                Span::styled(task.status.label(), status_style(task.status)),
                Span::raw(due_str),
                Span::styled(
                    task.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]);
            if app.vm.has_pending(task.id) {
                // a remote call for this row is still outstanding
                row.style(
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                )
            } else {
                row
            }
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(11), // Status
            Constraint::Length(10), // Due
            Constraint::Min(10),    // Title
        ],
    )
    .header(Row::new(vec!["Status", "Due", "Task"]).style(Style::default().fg(Color::Yellow)))
    .block(block)
    .row_highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.table);
}

fn draw_detail_view(f: &mut Frame, app: &App, view: &PageView, area: Rect) {
    let block = Block::default()
        .title(" Detail ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);

    let selected = app.table.selected().and_then(|i| view.tasks.get(i));
    let Some(task) = selected else {
        f.render_widget(block, area);
        return;
    };

    let mut detail_text = vec![
        Line::from(vec![
            Span::styled("Title: ", Style::default().fg(Color::Blue)),
            Span::styled(
                task.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("ID: ", Style::default().fg(Color::DarkGray)),
            Span::raw(task.id.to_string()),
        ]),
        Line::from(vec![
            Span::styled("Status: ", Style::default().fg(Color::Blue)),
            Span::styled(task.status.label(), status_style(task.status)),
        ]),
        Line::from(vec![
            Span::styled("Due: ", Style::default().fg(Color::Blue)),
            Span::raw(
                task.due_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "None".to_string()),
            ),
        ]),
        Line::from(""),
    ];

    if let Some(desc) = &task.description {
        detail_text.push(Line::from(Span::styled(
            "Description:",
            Style::default().fg(Color::Blue),
        )));
        detail_text.push(Line::from(desc.clone()));
    }

    if app.vm.has_pending(task.id) {
        detail_text.push(Line::from(""));
        detail_text.push(Line::from(Span::styled(
            "Working...",
            Style::default().fg(Color::Yellow),
        )));
    }

    let detail_block = Paragraph::new(detail_text)
        .block(block)
        .wrap(Wrap { trim: true });
    f.render_widget(detail_block, area);
}

fn draw_status_line(f: &mut Frame, app: &App, view: &PageView, area: Rect) {
    let (text, style) = if let Some(err) = app.vm.list_error() {
        (err.to_string(), Style::default().fg(Color::Red))
    } else if app.vm.is_loading() {
        ("Loading...".to_string(), Style::default().fg(Color::DarkGray))
    } else {
        (
            format!("{} tasks ({} matching)", app.vm.total_tasks(), view.matching),
            Style::default().fg(Color::DarkGray),
        )
    };
    f.render_widget(Paragraph::new(text).style(style), area);
}

fn draw_form_modal(
    f: &mut Frame,
    form: &FormState,
    engine_error: Option<&str>,
    submitting: bool,
    area: Rect,
) {
    let modal = centered_rect(62, 11, area);
    f.render_widget(Clear, modal);

    let block = Block::default()
        .title(format!(" {} ", form.submit_label()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(modal);
    f.render_widget(block, modal);

    let label_style = |field: FormField| {
        if form.field == field {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("{:<13}", "Title *"), label_style(FormField::Title)),
            Span::raw(form.title.clone()),
        ]),
        Line::from(vec![
            Span::styled(
                format!("{:<13}", "Description"),
                label_style(FormField::Description),
            ),
            Span::raw(form.description.clone()),
        ]),
        Line::from(vec![
            Span::styled(format!("{:<13}", "Due Date"), label_style(FormField::DueDate)),
            Span::raw(form.due_date.clone()),
            Span::styled("  (YYYY-MM-DD)", Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(vec![
            Span::styled(format!("{:<13}", "Status"), label_style(FormField::Status)),
            Span::raw(format!("< {} >", form.status.label())),
        ]),
        Line::from(""),
    ];

    if let Some(err) = form.local_error.as_deref().or(engine_error) {
        lines.push(Line::from(Span::styled(
            err.to_string(),
            Style::default().fg(Color::Red),
        )));
    } else if submitting {
        lines.push(Line::from(Span::styled(
            "Saving...",
            Style::default().fg(Color::Yellow),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "Enter: Save | Tab: Next field | Esc: Cancel",
            Style::default().fg(Color::DarkGray),
        )));
    }

    f.render_widget(Paragraph::new(lines), inner);

    if form.field != FormField::Status {
        let row = match form.field {
            FormField::Title => 0,
            FormField::Description => 1,
            FormField::DueDate => 2,
            FormField::Status => unreachable!(),
        };
        let prefix: String = form.buffer_text().chars().take(form.cursor).collect();
        let x = inner.x + 13 + prefix.width() as u16;
        f.set_cursor_position(Position::new(x, inner.y + row));
    }
}

fn draw_confirm_modal(f: &mut Frame, task: &Task, area: Rect) {
    let modal = centered_rect(46, 7, area);
    f.render_widget(Clear, modal);

    let block = Block::default()
        .title(" Confirm Delete ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Red));
    let inner = block.inner(modal);
    f.render_widget(block, modal);

    let lines = vec![
        Line::from(format!(
            "Are you sure you want to delete \"{}\"?",
            task.title
        )),
        Line::from(""),
        Line::from(Span::styled(
            "y: Delete | n: Cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

fn draw_notice(f: &mut Frame, notice: &Notice, area: Rect) {
    let width = (notice.message.width() as u16 + 4).min(area.width);
    let rect = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + 1,
        width,
        height: 1,
    };
    let color = match notice.severity {
        Severity::Success => Color::Green,
        Severity::Error => Color::Red,
        Severity::Info => Color::Blue,
    };
    f.render_widget(Clear, rect);
    let toast = Paragraph::new(notice.message.clone())
        .style(
            Style::default()
                .fg(Color::White)
                .bg(color)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(toast, rect);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}
