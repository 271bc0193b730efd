use anyhow::Result;
use chrono::{DateTime, Local};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Map as WorldMap, MapResolution},
        Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap,
    },
    Frame, Terminal,
};
use sight_map::record::{format_percent, place_type, PLACE_TYPES};
use sight_map::{
    CellArea, FetchError, GeoError, LatLng, MapHandle, Record, RecordId,
    SelectionSyncController, TerminalMap,
};
use std::io;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

/// Frame interval; also paces the pan animation
const TICK: Duration = Duration::from_millis(50);

/// Results of the two background tasks
#[derive(Debug)]
pub enum AppEvent {
    Fetched(Result<Vec<Record>, FetchError>),
    Located(Result<LatLng, GeoError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Categories,
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryEntry {
    pub title: String,
    pub count: usize,
    pub color: Option<&'static str>,
}

/// Screen regions from the last frame, for mouse hit testing
#[derive(Debug, Default, Clone)]
struct ClickLayout {
    table_rows: Option<Rect>,
    category_rows: Option<Rect>,
    page_buttons: Vec<(Rect, usize)>,
    map_inner: Option<Rect>,
}

pub struct App {
    pub controller: SelectionSyncController,
    pub map: TerminalMap,
    pub panel: Panel,
    /// Row cursor within the current page
    pub state: TableState,
    pub category_state: TableState,
    /// Marker under the keyboard cursor, kept while it is still drawn
    pub marker_cursor: Option<RecordId>,
    pub source_name: String,
    pub loaded_at: Option<DateTime<Local>>,
    gesture_seen: bool,
    location_requested: bool,
    layout: ClickLayout,
}

impl App {
    pub fn new(controller: SelectionSyncController, map: TerminalMap, source_name: String) -> Self {
        let panel = if controller.filter().is_some() {
            Panel::Table
        } else {
            Panel::Categories
        };

        let mut category_state = TableState::default();
        category_state.select(Some(0));

        Self {
            controller,
            map,
            panel,
            state: TableState::default(),
            category_state,
            marker_cursor: None,
            source_name,
            loaded_at: None,
            gesture_seen: false,
            location_requested: false,
            layout: ClickLayout::default(),
        }
    }

    pub fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::Fetched(Ok(records)) => {
                self.controller.on_fetch_complete(records);
                self.loaded_at = Some(Local::now());
                if self.category_entries().is_empty() {
                    self.panel = Panel::Table;
                }
                self.sync_cursor();
            }
            AppEvent::Fetched(Err(error)) => self.controller.on_fetch_failed(error),
            AppEvent::Located(result) => self.controller.on_location(result),
        }
        self.refresh_map();
    }

    /// Geolocation is asked for once, after the first gesture
    pub fn take_location_request(&mut self) -> bool {
        std::mem::take(&mut self.location_requested)
    }

    fn note_gesture(&mut self) {
        if !std::mem::replace(&mut self.gesture_seen, true) {
            tracing::debug!("first user gesture, requesting location");
            self.location_requested = true;
        }
    }

    pub fn refresh_map(&mut self) {
        self.controller.sync_map(&mut self.map);
        if let Some(id) = self.marker_cursor {
            if self.marker_index(id).is_none() {
                self.marker_cursor = None;
            }
        }
    }

    // ========================================================================
    // CATEGORIES
    // ========================================================================

    /// The place-type catalog when the data uses it, otherwise the data's own categories
    pub fn category_entries(&self) -> Vec<CategoryEntry> {
        let uses_catalog = self
            .controller
            .records()
            .iter()
            .any(|r| r.category.as_deref().and_then(place_type).is_some());

        if uses_catalog {
            PLACE_TYPES
                .iter()
                .map(|p| CategoryEntry {
                    title: p.title.to_string(),
                    count: self.controller.category_count(p.title),
                    color: Some(p.color),
                })
                .collect()
        } else {
            self.controller
                .categories()
                .into_iter()
                .map(|(title, count)| CategoryEntry {
                    title,
                    count,
                    color: None,
                })
                .collect()
        }
    }

    pub fn choose_category(&mut self, index: usize) {
        let Some(entry) = self.category_entries().into_iter().nth(index) else {
            return;
        };
        tracing::info!(category = %entry.title, "category chosen");
        self.controller.set_filter(Some(entry.title));
        self.panel = Panel::Table;
        self.marker_cursor = None;
        self.state.select(Some(0));
        self.refresh_map();
    }

    pub fn show_all(&mut self) {
        self.controller.set_filter(None);
        self.panel = Panel::Table;
        self.state.select(Some(0));
        self.refresh_map();
    }

    pub fn reset_categories(&mut self) {
        self.controller.set_filter(None);
        if !self.category_entries().is_empty() {
            self.panel = Panel::Categories;
        }
        self.marker_cursor = None;
        self.refresh_map();
    }

    // ========================================================================
    // CLICKS
    // ========================================================================

    /// Row click on the current page
    pub fn click_row(&mut self, index: usize) {
        let Some(id) = self.controller.page_records().get(index).map(|r| r.id) else {
            return;
        };
        self.controller.select_from_list(id, &mut self.map);
        self.refresh_map();
        self.sync_cursor();
    }

    /// Marker click on the map
    pub fn click_marker(&mut self, id: RecordId) {
        if self.controller.select_from_map(id, &mut self.map) {
            self.panel = Panel::Table;
        }
        self.refresh_map();
        self.sync_cursor();
    }

    pub fn go_to_page(&mut self, page: usize) {
        if self.controller.set_page(page) {
            self.state.select(Some(0));
        }
    }

    /// Move the cursor onto the selected row when it is on this page
    fn sync_cursor(&mut self) {
        let rows = self.controller.page_records();
        let selected = self
            .controller
            .selection()
            .and_then(|id| rows.iter().position(|r| r.id == id));

        match selected {
            Some(i) => self.state.select(Some(i)),
            None if rows.is_empty() => self.state.select(None),
            None => {
                let i = self.state.selected().unwrap_or(0).min(rows.len() - 1);
                self.state.select(Some(i));
            }
        }
    }

    fn marker_index(&self, id: RecordId) -> Option<usize> {
        self.map
            .markers()
            .iter()
            .position(|m| m.record_id() == Some(id))
    }

    fn cycle_marker(&mut self, forward: bool) {
        let candidates: Vec<RecordId> = self
            .map
            .markers()
            .iter()
            .filter_map(|m| m.record_id())
            .collect();
        if candidates.is_empty() {
            self.marker_cursor = None;
            return;
        }

        let pos = self
            .marker_cursor
            .and_then(|c| candidates.iter().position(|&id| id == c));
        let next = match (pos, forward) {
            (None, true) => 0,
            (None, false) => candidates.len() - 1,
            (Some(p), true) => (p + 1) % candidates.len(),
            (Some(p), false) => (p + candidates.len() - 1) % candidates.len(),
        };
        self.marker_cursor = Some(candidates[next]);
    }

    fn cursor_marker_id(&self) -> Option<RecordId> {
        self.marker_cursor.filter(|&id| self.marker_index(id).is_some())
    }

    fn move_row(&mut self, down: bool) {
        let len = self.controller.page_records().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if down => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        self.state.select(Some(i));
    }

    fn move_category(&mut self, down: bool) {
        let len = self.category_entries().len();
        if len == 0 {
            return;
        }
        let i = match self.category_state.selected() {
            Some(i) if down => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        self.category_state.select(Some(i));
    }

    // ========================================================================
    // INPUT
    // ========================================================================

    pub fn handle_key(&mut self, key: KeyEvent) -> Control {
        self.note_gesture();

        match key.code {
            KeyCode::Char('q') => return Control::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Control::Quit
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.map.zoom_by(1.0),
            KeyCode::Char('-') => self.map.zoom_by(-1.0),
            KeyCode::Tab => self.cycle_marker(true),
            KeyCode::BackTab => self.cycle_marker(false),
            KeyCode::Char('m') => {
                if let Some(id) = self.cursor_marker_id() {
                    self.click_marker(id);
                }
            }
            _ => match self.panel {
                Panel::Categories => self.handle_category_key(key),
                Panel::Table => self.handle_table_key(key),
            },
        }

        Control::Continue
    }

    fn handle_category_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c @ '1'..='9') => self.choose_category(c as usize - '1' as usize),
            KeyCode::Char('0') => self.choose_category(9),
            KeyCode::Char('a') => self.show_all(),
            KeyCode::Down | KeyCode::Char('j') => self.move_category(true),
            KeyCode::Up | KeyCode::Char('k') => self.move_category(false),
            KeyCode::Enter => {
                if let Some(i) = self.category_state.selected() {
                    self.choose_category(i);
                }
            }
            _ => {}
        }
    }

    fn handle_table_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.move_row(true),
            KeyCode::Up | KeyCode::Char('k') => self.move_row(false),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(i) = self.state.selected() {
                    self.click_row(i);
                }
            }
            KeyCode::Right | KeyCode::PageDown | KeyCode::Char('l') => {
                let page = self.controller.page() + 1;
                self.go_to_page(page);
            }
            KeyCode::Left | KeyCode::PageUp | KeyCode::Char('h') => {
                let page = self.controller.page().saturating_sub(1);
                self.go_to_page(page);
            }
            KeyCode::Home => self.go_to_page(1),
            KeyCode::End => self.go_to_page(self.controller.page_count()),
            KeyCode::Esc | KeyCode::Char('c') => self.reset_categories(),
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if !matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left)) {
            return;
        }
        self.note_gesture();

        let (column, row) = (mouse.column, mouse.row);

        if let Some(rows) = self.layout.table_rows {
            if contains(rows, column, row) {
                let index = self.state.offset() + usize::from(row - rows.y);
                self.click_row(index);
                return;
            }
        }

        if let Some(rows) = self.layout.category_rows {
            if contains(rows, column, row) {
                let index = self.category_state.offset() + usize::from(row - rows.y);
                self.choose_category(index);
                return;
            }
        }

        let clicked_page = self
            .layout
            .page_buttons
            .iter()
            .find(|(rect, _)| contains(*rect, column, row))
            .map(|(_, page)| *page);
        if let Some(page) = clicked_page {
            self.go_to_page(page);
            return;
        }

        if let Some(inner) = self.layout.map_inner {
            let area = CellArea {
                x: inner.x,
                y: inner.y,
                width: inner.width,
                height: inner.height,
            };
            let hit = self
                .map
                .cell_to_geo(Instant::now(), area, column, row)
                .and_then(|point| self.map.hit_test(point, self.map.degrees_per_cell() * 1.5))
                .and_then(|i| self.map.markers()[i].record_id());

            if let Some(id) = hit {
                self.click_marker(id);
            }
        }
    }
}

fn contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x && column < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}

pub fn run_ui(
    app: &mut App,
    events: &Receiver<AppEvent>,
    request_location: impl Fn(),
) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app, events, request_location);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    events: &Receiver<AppEvent>,
    request_location: impl Fn(),
) -> io::Result<()> {
    loop {
        while let Ok(event) = events.try_recv() {
            app.apply(event);
        }
        if app.take_location_request() {
            request_location();
        }

        terminal.draw(|f| ui(f, app))?;

        if !event::poll(TICK)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if app.handle_key(key) == Control::Quit {
                    return Ok(());
                }
            }
            Event::Mouse(mouse) => app.handle_mouse(mouse),
            _ => {}
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

pub fn ui(f: &mut Frame, app: &mut App) {
    app.layout = ClickLayout::default();

    if app.controller.is_loading() {
        f.render_widget(Paragraph::new("Loading..."), f.size());
        return;
    }
    if let Some(error) = app.controller.error() {
        f.render_widget(Paragraph::new(format!("Error: {}", error)), f.size());
        return;
    }

    app.refresh_map();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Sidebar + map
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let content = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[1]);

    match app.panel {
        Panel::Categories => render_categories(f, content[0], app),
        Panel::Table => render_table_panel(f, content[0], app),
    }
    render_map(f, content[1], app);
    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled(
            "Sight Map",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(app.source_name.clone(), Style::default().fg(Color::DarkGray)),
        Span::raw("  |  "),
        Span::styled(
            format!("Total: {}", app.controller.records().len()),
            Style::default().fg(Color::White),
        ),
    ];

    if let Some(filter) = app.controller.filter() {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            format!("Filter: {} ({})", filter, app.controller.visible_records().count()),
            Style::default().fg(Color::Green),
        ));
    }

    if let Some(at) = app.loaded_at {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            format!("Loaded {}", at.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(header, area);
}

fn render_categories(f: &mut Frame, area: Rect, app: &mut App) {
    let entries = app.category_entries();

    let rows = entries.iter().enumerate().map(|(i, entry)| {
        let key = if i < 9 {
            format!("{}", i + 1)
        } else if i == 9 {
            "0".to_string()
        } else {
            " ".to_string()
        };
        let swatch_color = entry.color.map(color_for).unwrap_or(Color::Cyan);

        Row::new(vec![
            Cell::from(key).style(Style::default().fg(Color::Yellow)),
            Cell::from("■").style(Style::default().fg(swatch_color)),
            Cell::from(entry.title.clone()),
            Cell::from(format!("{:>4}", entry.count)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Min(20),
            Constraint::Length(5),
        ],
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Place Types  (1-0 choose, a all) "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    app.layout.category_rows = Some(inner(area));
    f.render_stateful_widget(table, area, &mut app.category_state);
}

fn render_table_panel(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(area);

    render_table(f, chunks[0], app);
    render_pagination(f, chunks[1], app);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let sensors = app.controller.records().iter().any(Record::is_sensor);

    let headers: &[&str] = if sensors {
        &["", "ID", "Name", "Address", "Fill", "Battery", "Updated"]
    } else {
        &["", "Name", "Address", "Type"]
    };
    let header = Row::new(headers.iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    }))
    .style(Style::default().bg(Color::DarkGray))
    .height(1);

    let rows: Vec<Row> = app
        .controller
        .page_records()
        .into_iter()
        .map(|r| {
            let selected = app.controller.is_selected(r.id);
            let check = if selected { "[x]" } else { "[ ]" };

            let cells = if sensors {
                vec![
                    Cell::from(check),
                    Cell::from(r.id.to_string()),
                    Cell::from(truncate(&r.name, 20)),
                    Cell::from(truncate(&r.address, 28)),
                    Cell::from(format!("{} %", format_percent(r.percent)))
                        .style(Style::default().fg(fill_color(r.percent))),
                    Cell::from(format!("{} %", format_percent(r.bat_level))),
                    Cell::from(r.updated_display()),
                ]
            } else {
                let kind = r.category.clone().unwrap_or_default();
                let color = r
                    .category
                    .as_deref()
                    .and_then(place_type)
                    .map(|p| color_for(p.color))
                    .unwrap_or(Color::White);
                vec![
                    Cell::from(check),
                    Cell::from(truncate(&r.name, 30)),
                    Cell::from(truncate(&r.address, 30)),
                    Cell::from(truncate(&kind, 24)).style(Style::default().fg(color)),
                ]
            };

            let style = if selected {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(cells).style(style).height(1)
        })
        .collect();

    let widths: Vec<Constraint> = if sensors {
        vec![
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Length(20),
            Constraint::Min(16),
            Constraint::Length(7),
            Constraint::Length(9),
            Constraint::Length(16),
        ]
    } else {
        vec![
            Constraint::Length(3),
            Constraint::Min(16),
            Constraint::Min(16),
            Constraint::Length(24),
        ]
    };

    let title = match app.controller.filter() {
        Some(category) => format!(" {} ", category),
        None => " All records ".to_string(),
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(title),
        )
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("→ ");

    // Data rows start below the border and the header row
    let body = inner(area);
    app.layout.table_rows = Some(Rect::new(
        body.x,
        body.y.saturating_add(1),
        body.width,
        body.height.saturating_sub(1),
    ));
    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_pagination(f: &mut Frame, area: Rect, app: &mut App) {
    let body = inner(area);
    let current = app.controller.page();
    let mut spans = Vec::new();
    let mut x = body.x;

    for page in 1..=app.controller.page_count() {
        let label = format!("[{}]", page);
        let width = label.chars().count() as u16;

        // The current page button is disabled
        let style = if page == current {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Yellow)
        };
        if page != current && x + width <= body.x + body.width {
            app.layout
                .page_buttons
                .push((Rect::new(x, body.y, width, 1), page));
        }

        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));
        x = x.saturating_add(width + 1);
    }

    let pagination = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" Page {}/{} ", current, app.controller.page_count())),
    );
    f.render_widget(pagination, area);
}

fn render_map(f: &mut Frame, area: Rect, app: &mut App) {
    let now = Instant::now();
    let body = inner(area);
    let bounds = app.map.bounds(now, body.width, body.height);
    app.layout.map_inner = Some(body);

    let cursor = app.marker_cursor;
    let markers = app.map.markers().to_vec();

    let canvas = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" Map  zoom {:.0} ", app.map.zoom())),
        )
        .marker(symbols::Marker::Braille)
        .x_bounds([bounds.west, bounds.east])
        .y_bounds([bounds.south, bounds.north])
        .paint(move |ctx| {
            ctx.draw(&WorldMap {
                color: Color::DarkGray,
                resolution: MapResolution::High,
            });
            ctx.layer();

            for marker in &markers {
                let (symbol, color) = match marker.record_id() {
                    None => ("▲", Color::LightBlue),
                    id if id.is_some() && id == cursor => ("◎", Color::Cyan),
                    Some(_) if marker.balloon_open => ("◉", Color::LightGreen),
                    Some(_) => ("●", marker.color.map(color_for).unwrap_or(Color::Red)),
                };
                ctx.print(
                    marker.position.lng,
                    marker.position.lat,
                    Span::styled(symbol, Style::default().fg(color)),
                );
            }
        });
    f.render_widget(canvas, area);

    render_balloon(f, body, app);
}

fn render_balloon(f: &mut Frame, map_body: Rect, app: &App) {
    let Some(marker) = app.map.open_marker() else {
        return;
    };
    let (lat, lng) = (marker.position.lat, marker.position.lng);

    let title = app
        .controller
        .balloon_title_for(lat, lng)
        .unwrap_or(marker.hint.as_str())
        .to_string();
    let content = app.controller.balloon_content_for(lat, lng);

    let lines = content.lines().count() as u16 + 2;
    let height = lines.min(map_body.height / 2).max(3);
    if map_body.height < height || map_body.width < 10 {
        return;
    }
    let area = Rect::new(
        map_body.x,
        map_body.y + map_body.height - height,
        map_body.width,
        height,
    );

    let balloon = Paragraph::new(content)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(format!(" {} ", title)),
        );
    f.render_widget(Clear, area);
    f.render_widget(balloon, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = Vec::new();

    match app.controller.selected_record() {
        Some(r) => spans.push(Span::styled(
            format!(" Selected: {} ", truncate(&r.name, 30)),
            Style::default().fg(Color::Green),
        )),
        None => spans.push(Span::styled(" No selection ", Style::default().fg(Color::DarkGray))),
    }

    let cursor_marker = app
        .cursor_marker_id()
        .and_then(|id| app.marker_index(id))
        .and_then(|i| app.map.markers().get(i));
    if let Some(marker) = cursor_marker {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            format!("Marker: {} ", truncate(&marker.hint, 24)),
            Style::default().fg(Color::Cyan),
        ));
    }

    spans.push(Span::raw(" | "));
    match (app.controller.geo_error(), app.controller.user_coords()) {
        (Some(error), _) => spans.push(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Yellow),
        )),
        (None, Some(coords)) => spans.push(Span::styled(
            format!("You are here: {}", coords),
            Style::default().fg(Color::LightBlue),
        )),
        (None, None) => spans.push(Span::styled(
            "Location: -",
            Style::default().fg(Color::DarkGray),
        )),
    }

    spans.push(Span::raw(" | "));
    spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Select | "));
    spans.push(Span::styled("←/→", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Page | "));
    spans.push(Span::styled("Tab/m", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Marker | "));
    spans.push(Span::styled("+/-", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Zoom | "));
    spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );
    f.render_widget(status_bar, area);
}

fn inner(area: Rect) -> Rect {
    Rect::new(
        area.x.saturating_add(1),
        area.y.saturating_add(1),
        area.width.saturating_sub(2),
        area.height.saturating_sub(2),
    )
}

fn color_for(name: &str) -> Color {
    match name {
        "red" => Color::Red,
        "blue" => Color::Blue,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "orange" => Color::Rgb(255, 165, 0),
        "violet" => Color::Magenta,
        "black" => Color::DarkGray,
        "purple" => Color::Rgb(128, 0, 128),
        "white" => Color::White,
        "lightgray" => Color::Gray,
        _ => Color::Red,
    }
}

fn fill_color(percent: Option<f64>) -> Color {
    match percent {
        Some(p) if p >= 80.0 => Color::Red,
        Some(p) if p >= 50.0 => Color::Yellow,
        Some(_) => Color::Green,
        None => Color::White,
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
