use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};

use std::time::{Duration, Instant};

use tui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};

use crate::{
    api::{health::HealthStatus, transport::Transport},
    dates,
    store::StatusFilter,
    ui::app::{ActiveBlock, App, FormField, InputMode, RouteId},
};

/// Takes over the terminal and runs the dashboard until `q` is pressed
pub fn run_dashboard<T: Transport>(mut app: App<T>, tick_rate: Duration) -> anyhow::Result<()> {
    app.on_tick();
    app.load();

    // setup terminal
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();

    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app, tick_rate);

    // restore terminal
    disable_raw_mode()?;

    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;

    terminal.show_cursor()?;

    res?;

    Ok(())
}

fn run_app<B: Backend, T: Transport>(
    terminal: &mut Terminal<B>,
    mut app: App<T>,
    tick_rate: Duration,
) -> std::io::Result<()> {
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| ui(f, &mut app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if app.on_key(key.code) {
                    return Ok(());
                }
            }
        }
        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }
}

fn ui<B: Backend, T: Transport>(f: &mut Frame<B>, app: &mut App<T>) {
    draw_home_content(f, app);

    match app.get_current_route().active_block {
        ActiveBlock::Message => draw_message_content(f, app),
        ActiveBlock::Error => draw_error_content(f, app),
        ActiveBlock::Input => draw_input_content(f, app),
        ActiveBlock::Home => {}
    }
}

/// Rectangle of `percent_x` by `percent_y` in the middle of `r`
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(vertical[1])[1]
}

// Draws Message if occured
fn draw_message_content<B: Backend, T: Transport>(f: &mut Frame<B>, app: &App<T>) {
    let area = centered_rect(60, 20, f.size());

    let message_text = vec![Spans::from(vec![Span::styled(
        app.message.as_str(),
        Style::default().fg(Color::LightBlue),
    )])];

    let message_paragraph = Paragraph::new(message_text)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(
                    "Message (Esc to close)",
                    Style::default().fg(Color::LightBlue),
                ))
                .border_style(Style::default().fg(Color::LightCyan)),
        );

    f.render_widget(Clear, area);
    f.render_widget(message_paragraph, area);
}

// Draws Error if occured
fn draw_error_content<B: Backend, T: Transport>(f: &mut Frame<B>, app: &App<T>) {
    let area = centered_rect(70, 30, f.size());

    let error_text: Vec<Spans> = app
        .error_message
        .lines()
        .map(|line| Spans::from(Span::styled(line, Style::default().fg(Color::Red))))
        .collect();

    let error_paragraph = Paragraph::new(error_text).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(
                "Error (Esc to close)",
                Style::default().fg(Color::Red),
            ))
            .border_style(Style::default().fg(Color::LightRed)),
    );

    f.render_widget(Clear, area);
    f.render_widget(error_paragraph, area);
}

fn draw_input_content<B: Backend, T: Transport>(f: &mut Frame<B>, app: &App<T>) {
    let area = centered_rect(60, 40, f.size());

    let route = app.get_current_route().id.clone();

    let (title, action) = match route {
        RouteId::EditTodo => ("Edit Todo", " to save"),
        RouteId::Search => ("Search", " to keep the search"),
        _ => ("New Todo", " to add the todo item"),
    };

    let fields = if route == RouteId::Search {
        vec![("Search", app.input_text.as_str(), true)]
    } else {
        vec![
            ("Title", app.form.title.as_str(), app.focus == FormField::Title),
            (
                "Description (optional)",
                app.form.description.as_str(),
                app.focus == FormField::Description,
            ),
        ]
    };

    let mut constraints = vec![Constraint::Length(2)];
    constraints.extend(fields.iter().map(|_| Constraint::Length(3)));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .margin(1)
        .split(area);

    let mut prompt_message = vec![
        Span::raw("Press "),
        Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" to cancel, "),
    ];
    if fields.len() > 1 {
        prompt_message.push(Span::styled(
            "Tab",
            Style::default().add_modifier(Modifier::BOLD),
        ));
        prompt_message.push(Span::raw(" to switch field, "));
    }
    prompt_message.push(Span::styled(
        "Enter",
        Style::default().add_modifier(Modifier::BOLD),
    ));
    prompt_message.push(Span::raw(action));

    let help_para = Paragraph::new(Text::from(Spans::from(prompt_message)));

    f.render_widget(Clear, area);
    f.render_widget(Block::default().borders(Borders::ALL).title(title), area);
    f.render_widget(help_para, chunks[0]);

    for (i, (label, value, focused)) in fields.into_iter().enumerate() {
        let chunk = chunks[i + 1];
        let active = focused && app.input_mode == InputMode::Editing;

        let input_style = if active {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };

        let input = Paragraph::new(value)
            .style(input_style)
            .block(Block::default().borders(Borders::ALL).title(label));

        f.render_widget(input, chunk);

        if active {
            f.set_cursor(chunk.x + value.chars().count() as u16 + 1, chunk.y + 1);
        }
    }
}

fn draw_home_content<B: Backend, T: Transport>(f: &mut Frame<B>, app: &mut App<T>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(5),
            ]
            .as_ref(),
        )
        .split(f.size());

    let counts = app.store.counts();
    let titles: Vec<Spans> = StatusFilter::ALL
        .iter()
        .map(|filter| {
            Spans::from(format!(
                "{} ({})",
                filter.label(),
                counts.for_filter(*filter)
            ))
        })
        .collect();

    let selected_tab = StatusFilter::ALL
        .iter()
        .position(|filter| *filter == app.store.filter())
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title("Todos"))
        .select(selected_tab)
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(tabs, chunks[0]);

    let now = chrono::Utc::now();

    let items: Vec<ListItem> = app
        .list
        .items
        .iter()
        .map(|todo| {
            let (marker, title_style) = if todo.completed {
                (
                    "[x] ",
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::CROSSED_OUT),
                )
            } else {
                ("[ ] ", Style::default().add_modifier(Modifier::BOLD))
            };

            let mut lines = vec![Spans::from(vec![
                Span::raw(marker),
                Span::styled(todo.title.as_str(), title_style),
                Span::raw("  "),
                Span::styled(
                    dates::relative_time(&todo.created_at, &now, &chrono::Local),
                    Style::default().fg(Color::Gray),
                ),
            ])];

            if let Some(description) = &todo.description {
                lines.push(Spans::from(Span::styled(
                    format!("    {}", description),
                    Style::default().fg(Color::Gray),
                )));
            }

            ListItem::new(lines)
        })
        .collect();

    let list_title = if app.store.search().is_empty() {
        String::from("List")
    } else {
        format!("List, matching \"{}\"", app.store.search())
    };

    let items = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(list_title))
        .highlight_style(
            Style::default()
                .bg(Color::LightYellow)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    f.render_stateful_widget(items, chunks[1], &mut app.list.state);

    let health_style = match app.health.status() {
        HealthStatus::Online => Style::default().fg(Color::Green),
        HealthStatus::Offline(_) => Style::default().fg(Color::Red),
        HealthStatus::Unknown => Style::default().fg(Color::Gray),
    };

    let last_error = match app.store.last_error() {
        Some(e) => Span::styled(
            format!("last error: {}", e),
            Style::default().fg(Color::LightRed),
        ),
        None => Span::raw(""),
    };

    let footer = vec![
        Spans::from(vec![
            Span::raw(format!(
                "Page {}/{} ({} per page)  |  {} shown  |  backend: ",
                app.store.page(),
                app.store.total_pages(),
                app.store.page_size(),
                app.store.filtered().len()
            )),
            Span::styled(app.health.status().to_string(), health_style),
        ]),
        Spans::from(last_error),
        Spans::from(Span::styled(
            "a add  e edit  space toggle  x delete  / search  tab filter  \u{2190}/\u{2192} page  r refresh  q quit",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let footer = Paragraph::new(footer).block(Block::default().borders(Borders::ALL));

    f.render_widget(footer, chunks[2]);
}
