use anyhow::Result;
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use rusqlite::Connection;
use std::io;
use tracing::warn;

use field_tally::delivery::{self, DeliveryOutcome, LocalDirTarget};
use field_tally::registry::{Category, Registry, Treatment};
use field_tally::{report, store};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    /// Six category cards with counts and treatment mini-stats
    Dashboard,
    /// Per-record list of the selected category with inline edit
    Detail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Typing an ear-tag for the selected record
    EditingTag,
    /// "Borrar todo" asked, waiting for explicit confirmation
    ConfirmClear,
}

pub struct App {
    pub registry: Registry,
    conn: Connection,
    pub current_page: Page,
    pub dashboard_state: TableState,
    pub detail_state: TableState,
    pub input_mode: InputMode,
    pub tag_buffer: String,
    pub status: Option<String>,
}

impl App {
    pub fn new(registry: Registry, conn: Connection) -> Self {
        let mut dashboard_state = TableState::default();
        dashboard_state.select(Some(0));

        Self {
            registry,
            conn,
            current_page: Page::Dashboard,
            dashboard_state,
            detail_state: TableState::default(),
            input_mode: InputMode::Normal,
            tag_buffer: String::new(),
            status: None,
        }
    }

    pub fn selected_category(&self) -> Category {
        let index = self.dashboard_state.selected().unwrap_or(0);
        Category::ALL[index.min(Category::ALL.len() - 1)]
    }

    fn detail_ids(&self) -> Vec<String> {
        self.registry
            .by_category(self.selected_category())
            .map(|a| a.id.clone())
            .collect()
    }

    fn selected_record_id(&self) -> Option<String> {
        let ids = self.detail_ids();
        self.detail_state
            .selected()
            .and_then(|i| ids.get(i).cloned())
    }

    /// Fire-and-forget snapshot after a mutation: a failed write is logged
    /// and the in-memory registry stays authoritative for the session
    fn persist(&mut self) {
        if let Err(e) = store::save_registry(&self.conn, &self.registry) {
            warn!("snapshot write failed: {e:#}");
            self.status = Some("Aviso: no se pudo guardar el estado".to_string());
        }
    }

    pub fn add(&mut self, category: Category) {
        self.registry.add(category);
        self.persist();
        self.status = Some(format!("{} agregado", category.as_str()));
        if self.current_page == Page::Detail && self.detail_state.selected().is_none() {
            self.detail_state.select(Some(0));
        }
    }

    pub fn remove_selected(&mut self) {
        let Some(id) = self.selected_record_id() else {
            return;
        };
        self.registry.remove(&id);
        self.persist();

        // Keep the selection on a valid row
        let len = self.detail_ids().len();
        if len == 0 {
            self.detail_state.select(None);
        } else if let Some(i) = self.detail_state.selected() {
            self.detail_state.select(Some(i.min(len - 1)));
        }
    }

    pub fn toggle_selected(&mut self, treatment: Treatment) {
        if let Some(id) = self.selected_record_id() {
            self.registry.toggle(&id, treatment);
            self.persist();
        }
    }

    pub fn begin_tag_edit(&mut self) {
        let Some(id) = self.selected_record_id() else {
            return;
        };
        self.tag_buffer = self
            .registry
            .records()
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.tag.clone())
            .unwrap_or_default();
        self.input_mode = InputMode::EditingTag;
    }

    pub fn commit_tag_edit(&mut self) {
        if let Some(id) = self.selected_record_id() {
            let tag = self.tag_buffer.clone();
            self.registry.set_tag(&id, &tag);
            self.persist();
        }
        self.tag_buffer.clear();
        self.input_mode = InputMode::Normal;
    }

    pub fn clear_all(&mut self) {
        self.registry.clear();
        self.persist();
        self.detail_state.select(None);
        self.input_mode = InputMode::Normal;
        self.status = Some("Todos los registros borrados".to_string());
    }

    pub fn export_pdf(&mut self) {
        let outcome = match report::render_pdf(&self.registry, Local::now()) {
            Ok(bytes) => delivery::deliver_or_save(
                None,
                &LocalDirTarget::default_dir(),
                delivery::REPORT_FILE_NAME,
                &bytes,
            ),
            Err(e) => DeliveryOutcome::Failed(format!("{e:#}")),
        };
        self.status = Some(outcome.describe());
    }

    pub fn export_csv(&mut self) {
        let outcome = match report::render_csv(&self.registry) {
            Ok(bytes) => delivery::deliver_or_save(
                None,
                &LocalDirTarget::default_dir(),
                delivery::CSV_FILE_NAME,
                &bytes,
            ),
            Err(e) => DeliveryOutcome::Failed(format!("{e:#}")),
        };
        self.status = Some(outcome.describe());
    }

    pub fn enter_detail(&mut self) {
        self.current_page = Page::Detail;
        if self.detail_ids().is_empty() {
            self.detail_state.select(None);
        } else {
            self.detail_state.select(Some(0));
        }
    }

    pub fn back_to_dashboard(&mut self) {
        self.current_page = Page::Dashboard;
    }

    pub fn next(&mut self) {
        let (state, len) = self.active_table();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let (state, len) = self.active_table();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    fn active_table(&mut self) -> (&mut TableState, usize) {
        match self.current_page {
            Page::Dashboard => (&mut self.dashboard_state, Category::ALL.len()),
            Page::Detail => {
                let category = self.selected_category();
                let len = self.registry.count(category);
                (&mut self.detail_state, len)
            }
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

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };

        match app.input_mode {
            InputMode::EditingTag => match key.code {
                KeyCode::Enter => app.commit_tag_edit(),
                KeyCode::Esc => {
                    app.tag_buffer.clear();
                    app.input_mode = InputMode::Normal;
                }
                KeyCode::Backspace => {
                    app.tag_buffer.pop();
                }
                KeyCode::Char(c) => app.tag_buffer.push(c),
                _ => {}
            },
            InputMode::ConfirmClear => match key.code {
                KeyCode::Char('s') | KeyCode::Char('S') => app.clear_all(),
                _ => app.input_mode = InputMode::Normal,
            },
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Esc => match app.current_page {
                    Page::Detail => app.back_to_dashboard(),
                    Page::Dashboard => return Ok(()),
                },
                KeyCode::Enter if app.current_page == Page::Dashboard => app.enter_detail(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Char(c @ '1'..='6') if app.current_page == Page::Dashboard => {
                    let index = c as usize - '1' as usize;
                    app.add(Category::ALL[index]);
                }
                KeyCode::Char('a') => {
                    let category = app.selected_category();
                    app.add(category);
                }
                KeyCode::Char('d') | KeyCode::Delete if app.current_page == Page::Detail => {
                    app.remove_selected();
                }
                KeyCode::Char('v') if app.current_page == Page::Detail => {
                    app.toggle_selected(Treatment::Vaccinated);
                }
                KeyCode::Char('p') if app.current_page == Page::Detail => {
                    app.toggle_selected(Treatment::Dewormed);
                }
                KeyCode::Char('e') if app.current_page == Page::Detail => app.begin_tag_edit(),
                KeyCode::Char('c') => app.input_mode = InputMode::ConfirmClear,
                KeyCode::Char('x') => app.export_pdf(),
                KeyCode::Char('s') => app.export_csv(),
                _ => {}
            },
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Dashboard => render_dashboard(f, chunks[1], app),
        Page::Detail => render_detail(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);

    if app.input_mode == InputMode::ConfirmClear {
        render_confirm_popup(f);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let summary = report::summarize(&app.registry);
    let vaccinated: usize = summary.per_category.iter().map(|r| r.vaccinated).sum();
    let dewormed: usize = summary.per_category.iter().map(|r| r.dewormed).sum();

    let spans = vec![
        Span::styled(
            "Contador de Campo",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Total: {}", summary.total),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Vac: {vaccinated}"),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  "),
        Span::styled(
            format!("Anti: {dewormed}"),
            Style::default().fg(Color::Blue),
        ),
    ];

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_dashboard(f: &mut Frame, area: Rect, app: &mut App) {
    let summary = report::summarize(&app.registry);

    let header = Row::new(
        ["", "Categoría", "Cantidad", "Vacunados", "Antiparasitario"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD))),
    )
    .height(1);

    let rows = summary.per_category.iter().enumerate().map(|(i, row)| {
        Row::new(vec![
            Cell::from(format!("{}", i + 1)).style(Style::default().fg(Color::DarkGray)),
            Cell::from(row.category.as_str()),
            Cell::from(row.count.to_string()),
            Cell::from(row.vaccinated.to_string()).style(Style::default().fg(Color::Green)),
            Cell::from(row.dewormed.to_string()).style(Style::default().fg(Color::Blue)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Length(14),
            Constraint::Length(10),
            Constraint::Length(11),
            Constraint::Length(16),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title("Existencias"))
    .highlight_style(
        Style::default()
            .bg(Color::Green)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    );

    f.render_stateful_widget(table, area, &mut app.dashboard_state);
}

fn render_detail(f: &mut Frame, area: Rect, app: &mut App) {
    let category = app.selected_category();
    let animals: Vec<_> = app.registry.by_category(category).cloned().collect();

    let header = Row::new(
        ["#", "Caravana", "Vacuna", "Antiparasitario"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD))),
    )
    .height(1);

    let rows = animals.iter().enumerate().map(|(i, animal)| {
        let tag = if animal.tag.is_empty() { "-" } else { &animal.tag };
        Row::new(vec![
            Cell::from(format!("{}", i + 1)).style(Style::default().fg(Color::DarkGray)),
            Cell::from(tag.to_string()),
            Cell::from(si_no(animal.vaccinated)),
            Cell::from(si_no(animal.dewormed)),
        ])
    });

    let title = format!("{} ({})", category.as_str(), animals.len());
    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(20),
            Constraint::Length(8),
            Constraint::Length(16),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title))
    .highlight_style(
        Style::default()
            .bg(Color::Green)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    );

    f.render_stateful_widget(table, area, &mut app.detail_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let text = match &app.input_mode {
        InputMode::EditingTag => {
            format!("Caravana: {}_  (Enter confirma, Esc cancela)", app.tag_buffer)
        }
        InputMode::ConfirmClear => {
            "¿Borrar todos los registros? (s = sí, cualquier otra tecla cancela)".to_string()
        }
        InputMode::Normal => {
            let help = match app.current_page {
                Page::Dashboard => {
                    "1-6/a agregar | Enter detalle | c borrar todo | x PDF | s CSV | q salir"
                }
                Page::Detail => {
                    "a agregar | e caravana | v vacuna | p antiparasitario | d eliminar | Esc volver"
                }
            };
            match &app.status {
                Some(status) => format!("{status}  |  {help}"),
                None => help.to_string(),
            }
        }
    };

    let bar = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(bar, area);
}

fn render_confirm_popup(f: &mut Frame) {
    let area = centered_rect(50, 20, f.size());
    let popup = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "¿Borrar todos los registros?",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from("Se eliminarán todos los animales contados."),
        Line::from(""),
        Line::from("s = sí, borrar    otra tecla = cancelar"),
    ])
    .alignment(ratatui::layout::Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)),
    );

    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn si_no(flag: bool) -> &'static str {
    if flag {
        "Si"
    } else {
        "No"
    }
}
