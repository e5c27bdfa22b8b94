use anyhow::Result;
use chrono::{Duration, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use fuel_locator::{
    format_tenths, AnnotationPresenter, AnnotationRenderer, ClusterSummary, FuelType, PriceTier,
    ReferenceLookup, StationAnnotation,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierFilter {
    All,
    PricedOnly,
    CheapestHalf,
}

impl TierFilter {
    pub fn next(&self) -> Self {
        match self {
            TierFilter::All => TierFilter::PricedOnly,
            TierFilter::PricedOnly => TierFilter::CheapestHalf,
            TierFilter::CheapestHalf => TierFilter::All,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            TierFilter::All => "All stations",
            TierFilter::PricedOnly => "Priced",
            TierFilter::CheapestHalf => "Cheapest 50%",
        }
    }

    fn accepts(&self, tier: PriceTier) -> bool {
        match self {
            TierFilter::All => true,
            TierFilter::PricedOnly => tier.is_priced(),
            TierFilter::CheapestHalf => tier.rank().map_or(false, |r| r < 5),
        }
    }
}

pub struct App {
    pub fuel_type: FuelType,
    pub date: NaiveDate,
    pub annotations: Vec<StationAnnotation>,
    pub visible: Vec<StationAnnotation>,
    pub cluster: Option<ClusterSummary>,
    pub state: TableState,
    pub show_detail: bool,
    pub filter: TierFilter,
    pub clusters_enabled: bool,
}

impl App {
    pub fn new(fuel_type: FuelType, date: NaiveDate) -> Self {
        Self {
            fuel_type,
            date,
            annotations: Vec::new(),
            visible: Vec::new(),
            cluster: None,
            state: TableState::default(),
            show_detail: true,
            filter: TierFilter::All,
            clusters_enabled: true,
        }
    }

    pub fn with_clusters(mut self, enabled: bool) -> Self {
        self.clusters_enabled = enabled;
        self
    }

    /// Recompute the visible rows after annotations or the filter change
    pub fn refresh(&mut self) {
        self.visible = self
            .annotations
            .iter()
            .filter(|a| self.filter.accepts(a.tier))
            .cloned()
            .collect();

        if self.visible.is_empty() {
            self.state.select(None);
        } else {
            let i = self.state.selected().unwrap_or(0).min(self.visible.len() - 1);
            self.state.select(Some(i));
        }
    }

    /// Render every station for a day
    pub fn reload<L: ReferenceLookup>(&mut self, renderer: &AnnotationRenderer<L>, date: NaiveDate) {
        self.date = date;
        self.annotations.clear();
        self.cluster = None;
        renderer.present_all(date, self);
        self.refresh();
    }

    /// Summarize the visible stations as one cluster marker. No-op when
    /// clustering is switched off.
    pub fn summarize_visible<L: ReferenceLookup>(&mut self, renderer: &AnnotationRenderer<L>) {
        if !self.clusters_enabled {
            return;
        }
        let summary = renderer.cluster(&self.visible);
        let members = self.visible.clone();
        self.present_cluster(&summary, &members);
    }

    pub fn cycle_filter(&mut self) {
        self.filter = self.filter.next();
        self.refresh();
    }

    pub fn selected(&self) -> Option<&StationAnnotation> {
        self.state.selected().and_then(|i| self.visible.get(i))
    }

    pub fn next(&mut self) {
        let len = self.visible.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.visible.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }
}

impl AnnotationPresenter for App {
    fn present(&mut self, annotation: &StationAnnotation) {
        self.annotations.push(annotation.clone());
    }

    fn present_cluster(&mut self, summary: &ClusterSummary, _members: &[StationAnnotation]) {
        self.cluster = Some(summary.clone());
    }
}

/// Terminal color for a tier tint key
fn tint_color(tint_key: &str) -> Color {
    match tint_key {
        "per10" | "per20" => Color::Green,
        "per30" | "per40" => Color::LightGreen,
        "per50" | "per60" => Color::Yellow,
        "per70" | "per80" => Color::LightRed,
        "per90" | "per100" => Color::Red,
        "uncategorized" => Color::Gray,
        "cluster" => Color::Cyan,
        _ => Color::DarkGray,
    }
}

pub fn run_ui<L: ReferenceLookup>(app: &mut App, renderer: &AnnotationRenderer<L>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app, renderer);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!("UI error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend, L: ReferenceLookup>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    renderer: &AnnotationRenderer<L>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.show_detail = !app.show_detail,
                KeyCode::Char('f') => app.cycle_filter(),
                KeyCode::Char('c') => app.summarize_visible(renderer),
                KeyCode::Left => app.reload(renderer, app.date - Duration::days(1)),
                KeyCode::Right => app.reload(renderer, app.date + Duration::days(1)),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Home => app.state.select(Some(0)),
                KeyCode::End => {
                    if !app.visible.is_empty() {
                        app.state.select(Some(app.visible.len() - 1));
                    }
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Station list + detail
            Constraint::Length(3), // Key help
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail {
        let content = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_table(f, content[0], app);
        render_detail_panel(f, content[1], app);
    } else {
        render_table(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled(
            app.fuel_type.as_str(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::raw(app.date.format("%a %d %b %Y").to_string()),
        Span::raw("  |  "),
        Span::styled(app.filter.title(), Style::default().fg(Color::Cyan)),
        Span::raw(format!("  |  {} / {} stations", app.visible.len(), app.annotations.len())),
    ];

    if let Some(cluster) = &app.cluster {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            format!("Cluster: {}", cluster.glyph_text),
            Style::default().fg(tint_color(cluster.tint_key)),
        ));
    }

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["", "Station", "Price", "Tier", "Priority"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.visible.iter().map(|a| {
        let color = tint_color(a.style.tint_key);
        let glyph = a
            .callout
            .glyph_text
            .clone()
            .or_else(|| a.callout.glyph_image_key.clone())
            .unwrap_or_default();

        Row::new(vec![
            Cell::from(truncate(&glyph, 5)),
            Cell::from(truncate(&a.trading_name, 32)),
            Cell::from(a.price.map(format_tenths).unwrap_or_default()).style(Style::default().fg(color)),
            Cell::from(a.tier.label()).style(Style::default().fg(color)),
            Cell::from(a.style.display_priority.to_string()),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(34),
            Constraint::Length(8),
            Constraint::Length(15),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(" Stations "))
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let lines: Vec<Line> = match app.selected() {
        Some(a) => {
            let mut lines = vec![
                Line::from(Span::styled(
                    a.callout.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    a.callout.subtitle.clone().unwrap_or_default(),
                    Style::default().fg(tint_color(a.style.tint_key)),
                )),
                Line::from(""),
            ];
            lines.extend(a.callout.detail_text.lines().map(|l| Line::from(l.to_string())));
            lines
        }
        None => vec![Line::from("No station selected")],
    };

    let detail = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Callout "))
        .wrap(Wrap { trim: false });

    f.render_widget(detail, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let keys = if app.clusters_enabled {
        "q quit | ↑↓ move | Enter detail | f filter | c cluster | ←→ day"
    } else {
        "q quit | ↑↓ move | Enter detail | f filter | ←→ day"
    };
    let help = Paragraph::new(Line::from(keys))
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(help, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}
