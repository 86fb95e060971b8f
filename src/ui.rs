use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use econ_dashboard::dashboard::Dashboard;
use econ_dashboard::model::Indicator;
use econ_dashboard::presentation::{
    chart_series, country_label, country_select_label, format_number, palette_color,
    year_select_label,
};
use econ_dashboard::selection::{ChartType, Pick, Tab};
use econ_dashboard::source::LoadEvent;
use econ_dashboard::transform::shares;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart, Dataset as ChartDataset,
        GraphType, List, ListItem, ListState, Paragraph, Row, Table, TableState,
    },
    Frame, Terminal,
};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Countries,
    Years,
    Content,
}

impl Focus {
    pub fn next(&self) -> Self {
        match self {
            Focus::Countries => Focus::Years,
            Focus::Years => Focus::Content,
            Focus::Content => Focus::Countries,
        }
    }
}

pub struct App {
    pub dashboard: Dashboard,
    pub focus: Focus,
    /// Row 0 of each picker is "Select All"
    pub country_cursor: usize,
    pub year_cursor: usize,
    pub table_state: TableState,
    pub source_label: String,
    pending_loads: usize,
    events: UnboundedReceiver<LoadEvent>,
}

impl App {
    pub fn new(events: UnboundedReceiver<LoadEvent>, source_label: String) -> Self {
        Self {
            dashboard: Dashboard::new(),
            focus: Focus::Countries,
            country_cursor: 0,
            year_cursor: 0,
            table_state: TableState::default(),
            source_label,
            pending_loads: 2,
            events,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending_loads > 0
    }

    /// Apply every fetch result that has arrived since the last frame
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.dashboard.apply_event(event);
            self.pending_loads = self.pending_loads.saturating_sub(1);
        }
        self.clamp_cursors();
    }

    fn clamp_cursors(&mut self) {
        self.country_cursor = self.country_cursor.min(self.dashboard.dataset.countries.len());
        self.year_cursor = self
            .year_cursor
            .min(self.dashboard.dataset.distinct_years().len());

        let rows = self.dashboard.filtered_rows().len();
        match self.table_state.selected() {
            Some(_) if rows == 0 => self.table_state.select(None),
            Some(i) if i >= rows => self.table_state.select(Some(rows - 1)),
            None if rows > 0 => self.table_state.select(Some(0)),
            _ => {}
        }
    }

    /// Returns false when the user asked to quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Tab => {
                let tab = self.dashboard.selection.active_tab;
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.dashboard.set_active_tab(tab.previous());
                } else {
                    self.dashboard.set_active_tab(tab.next());
                }
            }
            KeyCode::BackTab => {
                let tab = self.dashboard.selection.active_tab;
                self.dashboard.set_active_tab(tab.previous());
            }
            KeyCode::Char('f') => self.focus = self.focus.next(),
            KeyCode::Char('l') => self.dashboard.set_chart_type(ChartType::Line),
            KeyCode::Char('b') => self.dashboard.set_chart_type(ChartType::Bar),
            KeyCode::Char('p') => self.dashboard.set_chart_type(ChartType::Pie),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1),
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_at_cursor(),
            _ => {}
        }
        self.clamp_cursors();
        true
    }

    fn move_cursor(&mut self, delta: isize) {
        let step = |cursor: usize, len: usize| -> usize {
            if len == 0 {
                return 0;
            }
            (cursor as isize + delta).rem_euclid(len as isize) as usize
        };

        match self.focus {
            Focus::Countries => {
                let len = self.dashboard.dataset.countries.len() + 1;
                self.country_cursor = step(self.country_cursor, len);
            }
            Focus::Years => {
                let len = self.dashboard.dataset.distinct_years().len() + 1;
                self.year_cursor = step(self.year_cursor, len);
            }
            Focus::Content => {
                let len = self.dashboard.filtered_rows().len();
                let current = self.table_state.selected().unwrap_or(0);
                if len > 0 {
                    self.table_state.select(Some(step(current, len)));
                }
            }
        }
    }

    fn toggle_at_cursor(&mut self) {
        match self.focus {
            Focus::Countries => {
                let item = match self.country_cursor {
                    0 => Some(Pick::SelectAll),
                    i => self.dashboard.dataset.countries.get(i - 1).map(|c| Pick::One(c.id)),
                };
                if let Some(item) = item {
                    self.dashboard.click_country(item);
                }
            }
            Focus::Years => {
                let item = match self.year_cursor {
                    0 => Some(Pick::SelectAll),
                    i => self
                        .dashboard
                        .dataset
                        .distinct_years()
                        .get(i - 1)
                        .map(|y| Pick::One(*y)),
                };
                if let Some(item) = item {
                    self.dashboard.click_year(item);
                }
            }
            Focus::Content => {}
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!("UI loop failed: {:?}", err);
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        app.drain_events();
        terminal.draw(|f| ui(f, app))?;

        // Poll so late fetch results still get drawn without a key press
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && !app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with tabs
            Constraint::Min(0),    // Pickers + content
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(32), Constraint::Min(0)])
        .split(chunks[1]);

    let pickers = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(body[0]);

    render_country_picker(f, pickers[0], app);
    render_year_picker(f, pickers[1], app);

    match app.dashboard.selection.active_tab {
        Tab::Table => render_table(f, body[1], app),
        Tab::Chart => render_chart_tab(f, body[1], app),
        Tab::Metadata => render_metadata(f, body[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(r, g, b)
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, tab) in Tab::ALL.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *tab == app.dashboard.selection.active_tab {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(tab.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        app.source_label.clone(),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn checkbox(checked: bool) -> &'static str {
    if checked {
        "[x] "
    } else {
        "[ ] "
    }
}

fn render_country_picker(f: &mut Frame, area: Rect, app: &App) {
    let dataset = &app.dashboard.dataset;
    let selected = &app.dashboard.selection.countries;

    let mut items = vec![ListItem::new(format!(
        "{}Select All",
        checkbox(selected.len() == dataset.countries.len())
    ))];
    items.extend(
        dataset
            .countries
            .iter()
            .map(|c| ListItem::new(format!("{}{}", checkbox(selected.contains(&c.id)), c.name))),
    );

    let focused = app.focus == Focus::Countries;
    let title = format!(" {} ", truncate(&country_select_label(dataset, &app.dashboard.selection), 26));
    render_picker(f, area, items, app.country_cursor, focused, title);
}

fn render_year_picker(f: &mut Frame, area: Rect, app: &App) {
    let dataset = &app.dashboard.dataset;
    let selected = &app.dashboard.selection.years;
    let years = dataset.distinct_years();

    let mut items = vec![ListItem::new(format!(
        "{}Select All",
        checkbox(selected.len() == years.len())
    ))];
    items.extend(
        years
            .iter()
            .map(|y| ListItem::new(format!("{}{}", checkbox(selected.contains(y)), y))),
    );

    let focused = app.focus == Focus::Years;
    let title = format!(" {} ", truncate(&year_select_label(dataset, &app.dashboard.selection), 26));
    render_picker(f, area, items, app.year_cursor, focused, title);
}

fn render_picker(
    f: &mut Frame,
    area: Rect,
    items: Vec<ListItem>,
    cursor: usize,
    focused: bool,
    title: String,
) {
    let mut state = ListState::default();
    if focused {
        state.select(Some(cursor));
    }

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(focused))
                .title(title),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ");

    f.render_stateful_widget(list, area, &mut state);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Year", "Country", "External Debt", "Education Expenditure"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let dataset = &app.dashboard.dataset;
    let rows: Vec<Row> = app
        .dashboard
        .filtered_rows()
        .into_iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(r.year.to_string()),
                Cell::from(truncate(&country_label(dataset, r.country), 24)),
                Cell::from(format_number(r.external_debt)),
                Cell::from(format_number(r.education_expenditure)),
            ])
            .height(1)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(26),
            Constraint::Length(18),
            Constraint::Length(22),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style(app.focus == Focus::Content))
            .title(" Table "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.table_state);
}

fn render_chart_tab(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    // Chart type radio row
    let mut radio = vec![];
    for kind in ChartType::ALL {
        let active = kind == app.dashboard.selection.chart_type;
        let marker = if active { "(•) " } else { "( ) " };
        let style = if active {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        radio.push(Span::styled(format!("{}{}", marker, kind.title()), style));
        radio.push(Span::raw("   "));
    }
    let radio = Paragraph::new(Line::from(radio))
        .block(Block::default().borders(Borders::ALL).title(" Dashboard "));
    f.render_widget(radio, chunks[0]);

    match app.dashboard.selection.chart_type {
        ChartType::Line => render_line_chart(f, chunks[1], app),
        ChartType::Bar => render_bar_chart(f, chunks[1], app),
        ChartType::Pie => render_pie_chart(f, chunks[1], app),
    }
}

fn render_line_chart(f: &mut Frame, area: Rect, app: &App) {
    let series = chart_series(&app.dashboard.dataset, &app.dashboard.selection);
    let pivot = app.dashboard.pivot_by_year();

    // Numeric x axis: plot points in year order
    let points: Vec<Vec<(f64, f64)>> = series
        .iter()
        .map(|s| {
            let mut p: Vec<(f64, f64)> = pivot
                .iter()
                .filter_map(|row| row.value(&s.key).map(|v| (row.year as f64, v)))
                .collect();
            p.sort_by(|a, b| a.0.total_cmp(&b.0));
            p
        })
        .collect();

    let all = points.iter().flatten();
    let (mut x_min, mut x_max, mut y_max) = (f64::MAX, f64::MIN, 0.0_f64);
    for (x, y) in all {
        x_min = x_min.min(*x);
        x_max = x_max.max(*x);
        y_max = y_max.max(*y);
    }
    if x_min > x_max {
        x_min = 0.0;
        x_max = 1.0;
    } else if x_min == x_max {
        x_min -= 1.0;
        x_max += 1.0;
    }
    if y_max <= 0.0 {
        y_max = 1.0;
    }
    y_max *= 1.1;

    let datasets: Vec<ChartDataset> = series
        .iter()
        .zip(points.iter())
        .map(|(s, p)| {
            ChartDataset::default()
                .name(s.name.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(rgb(s.color)))
                .data(p)
        })
        .collect();

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(" External Debt by Year "))
        .x_axis(
            Axis::default()
                .title("Year")
                .style(Style::default().fg(Color::Gray))
                .bounds([x_min, x_max])
                .labels(vec![
                    Span::raw(format!("{:.0}", x_min)),
                    Span::raw(format!("{:.0}", x_max)),
                ]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::raw(format_number(0.0)),
                    Span::raw(format_number(y_max / 2.0)),
                    Span::raw(format_number(y_max)),
                ]),
        );

    f.render_widget(chart, area);
}

fn render_bar_chart(f: &mut Frame, area: Rect, app: &App) {
    let series = chart_series(&app.dashboard.dataset, &app.dashboard.selection);
    let pivot = app.dashboard.pivot_by_year();

    let groups: Vec<(String, Vec<Bar>)> = pivot
        .iter()
        .map(|row| {
            let bars = series
                .iter()
                .filter_map(|s| {
                    row.value(&s.key).map(|v| {
                        Bar::default()
                            .value(v.max(0.0).round() as u64)
                            .text_value(format_number(v))
                            .style(Style::default().fg(rgb(s.color)))
                    })
                })
                .collect();
            (row.year.to_string(), bars)
        })
        .collect();

    let mut chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(" External Debt by Year "))
        .bar_width(9)
        .bar_gap(1)
        .group_gap(3);

    for (label, bars) in &groups {
        chart = chart.data(BarGroup::default().label(Line::from(label.clone())).bars(bars));
    }

    f.render_widget(chart, area);
}

/// Two proportional breakdowns stand in for the concentric pie rings
fn render_pie_chart(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let totals = app.dashboard.aggregate_by_country();

    for (chunk, indicator) in chunks.iter().zip(Indicator::ALL) {
        let bar_width = chunk.width.saturating_sub(50) as f64;
        let lines: Vec<Line> = shares(&totals, indicator)
            .into_iter()
            .zip(totals.iter())
            .enumerate()
            .map(|(index, ((country, share), total))| {
                let filled = (share * bar_width).round() as usize;
                Line::from(vec![
                    Span::raw(format!(" {:<20} ", truncate(&country_label(&app.dashboard.dataset, country), 20))),
                    Span::styled("█".repeat(filled), Style::default().fg(rgb(palette_color(index)))),
                    Span::raw(format!(
                        " {:>6}%  {}",
                        format_number(share * 100.0),
                        format_number(total.value(indicator))
                    )),
                ])
            })
            .collect();

        let panel = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} Share ", indicator.label())),
        );
        f.render_widget(panel, *chunk);
    }
}

fn render_metadata(f: &mut Frame, area: Rect, app: &App) {
    let mut content = vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Metadata",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
    ];

    for line in app.dashboard.metadata().lines() {
        content.push(Line::from(format!("  • {}", line)));
    }

    for failure in app.dashboard.fetch_failures() {
        content.push(Line::from(""));
        content.push(Line::from(Span::styled(
            format!("  ✗ {}", failure.message),
            Style::default().fg(Color::Red),
        )));
    }

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Metadata "),
    );

    f.render_widget(paragraph, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![Span::styled(
        format!(" Rows: {} ", app.dashboard.filtered_rows().len()),
        Style::default().fg(Color::Cyan),
    )];

    if app.is_loading() {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled("Loading…", Style::default().fg(Color::Green)));
    }
    if !app.dashboard.fetch_failures().is_empty() {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled("Fetch failed", Style::default().fg(Color::Red)));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("f", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Focus | "));
    status_spans.push(Span::styled("Space", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Toggle | "));
    status_spans.push(Span::styled("l/b/p", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Chart | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
