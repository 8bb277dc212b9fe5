mod logger;
mod model;

use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
    sync::{mpsc, mpsc::Sender, Arc},
    thread,
    time::{Duration, Instant},
};

use chrono::{DateTime, Local};
use crossterm::{
    event::{self, Event as CEvent, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use logger::{LogLevel, Logger};
use model::fleet::{Fleet, Intervention};
use model::metrics::{self, MetricsAggregator, StochasticThroughput};
use model::producer::{run_producer, ProducerSettings};
use model::rng::SimRng;
use model::scheduler::DEFAULT_RECOMMENDATION_LIMIT;
use model::snapshot::{Snapshot, SnapshotStore};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Sparkline, Tabs, Wrap},
    Terminal,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct DashboardConfig {
    trains: Vec<TrainConfig>,
    #[serde(default)]
    priorities: HashMap<String, u8>,
    #[serde(default = "default_routes")]
    routes: Vec<String>,
    #[serde(default = "default_tick_seconds")]
    tick_seconds: u64,
    #[serde(default = "default_refresh_seconds")]
    refresh_seconds: u64,
    #[serde(default = "default_recommendation_limit")]
    recommendation_limit: usize,
    #[serde(default = "default_state_file")]
    state_file: String,
    #[serde(default = "default_log_file")]
    log_file: String,
    /// Fixed seed for a reproducible event stream; omit for an OS seed
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TrainConfig {
    id: String,
    name: String,
}

fn default_routes() -> Vec<String> {
    ["North", "South", "East", "West"]
        .iter()
        .map(|r| r.to_string())
        .collect()
}

fn default_tick_seconds() -> u64 {
    5
}

fn default_refresh_seconds() -> u64 {
    2
}

fn default_recommendation_limit() -> usize {
    DEFAULT_RECOMMENDATION_LIMIT
}

fn default_state_file() -> String {
    "state.json".to_string()
}

fn default_log_file() -> String {
    "railsim.log".to_string()
}

/// The five-train fleet used when no config file is given
fn builtin_config() -> DashboardConfig {
    let trains = [
        ("01101", "Mumbai LTT - Gwalior (Weekly) Special"),
        ("12951", "Mumbai Rajdhani Express"),
        ("22209", "Mumbai Duronto Express"),
        ("12009", "Mumbai Shatabdi Express"),
        ("19019", "Mumbai Dehradun Express"),
    ]
    .iter()
    .map(|(id, name)| TrainConfig {
        id: id.to_string(),
        name: name.to_string(),
    })
    .collect();

    let mut priorities = HashMap::new();
    priorities.insert("Mumbai Rajdhani Express".to_string(), 3);
    priorities.insert("Mumbai Duronto Express".to_string(), 3);
    priorities.insert("Mumbai Shatabdi Express".to_string(), 2);
    priorities.insert("Mumbai LTT - Gwalior (Weekly) Special".to_string(), 2);
    priorities.insert("Mumbai Dehradun Express".to_string(), 1);

    DashboardConfig {
        trains,
        priorities,
        routes: default_routes(),
        tick_seconds: default_tick_seconds(),
        refresh_seconds: default_refresh_seconds(),
        recommendation_limit: default_recommendation_limit(),
        state_file: default_state_file(),
        log_file: default_log_file(),
        seed: None,
    }
}

fn main() {
    let logger = Logger::new(LogLevel::Info);
    let args: Vec<String> = env::args().collect();

    let (config, title) = match parse_config_path(&args) {
        Some(config_path) => match load_dashboard_config(&config_path, &logger) {
            Ok(config) => (config, format!("RailSim - {}", config_path)),
            Err(err) => {
                logger.error(&format!("Failed to load config: {}", err));
                std::process::exit(1);
            }
        },
        None => {
            logger.info("No config file provided - using the built-in fleet");
            (builtin_config(), "RailSim - built-in fleet".to_string())
        }
    };

    if let Err(err) = run_dashboard(config, title, &logger) {
        logger.error(&format!("Failed to run dashboard: {}", err));
        std::process::exit(1);
    }
}

fn parse_config_path(args: &[String]) -> Option<String> {
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => return iter.next().cloned(),
            path => return Some(path.to_string()),
        }
    }
    None
}

fn load_dashboard_config(
    config_path: &str,
    logger: &Logger,
) -> Result<DashboardConfig, Box<dyn std::error::Error>> {
    logger.info(&format!("Loading dashboard config from {}", config_path));

    let path = Path::new(config_path);
    if !path.exists() {
        return Err(format!("Config file not found at {}", config_path).into());
    }

    let contents = fs::read_to_string(path)?;
    let config: DashboardConfig = serde_json::from_str(&contents)?;
    if config.trains.is_empty() {
        return Err("Config lists no trains to track".into());
    }

    Ok(config)
}

struct DecisionEntry {
    at: DateTime<Local>,
    action: String,
}

/// Most recent decision log entries shown on the dashboard
const DECISION_LOG_DISPLAY: usize = 10;

struct App {
    store: Arc<SnapshotStore>,
    interventions: Sender<Intervention>,
    aggregator: MetricsAggregator,
    estimator: StochasticThroughput,
    decisions: Vec<DecisionEntry>,
    latest: Option<Arc<Snapshot>>,
    snapshots_seen: u64,
    playing: bool,
    refresh_rate: Duration,
    last_refresh: Instant,
    title: String,
    status_tab: usize,
    /// Some while the operator is typing a manual log entry
    input: Option<String>,
}

impl App {
    fn log_decision(&mut self, action: String) {
        self.decisions.push(DecisionEntry {
            at: Local::now(),
            action,
        });
        // Only the tail is ever displayed; don't let the vec grow forever
        if self.decisions.len() > 100 {
            let excess = self.decisions.len() - 100;
            self.decisions.drain(..excess);
        }
    }

    /// Pull the latest snapshot and record a metrics sample
    ///
    /// Reading the same snapshot twice is harmless; a stale read just
    /// means the producer hasn't ticked since the last refresh.
    fn refresh(&mut self) {
        if let Some(snapshot) = self.store.read() {
            let changed = match &self.latest {
                Some(prev) => !Arc::ptr_eq(prev, &snapshot),
                None => true,
            };
            if changed {
                self.snapshots_seen += 1;
            }
            let sample = metrics::compute(&snapshot.active_trains, &mut self.estimator);
            self.aggregator.record(sample, Local::now());
            self.latest = Some(snapshot);
        }
    }
}

fn run_dashboard(
    config: DashboardConfig,
    title: String,
    logger: &Logger,
) -> Result<(), Box<dyn std::error::Error>> {
    let rng = match config.seed {
        Some(seed) => SimRng::from_seed_u64(seed),
        None => SimRng::from_entropy(),
    };
    let roster: Vec<(String, String)> = config
        .trains
        .iter()
        .map(|t| (t.id.clone(), t.name.clone()))
        .collect();
    let fleet = Fleet::from_roster(&roster, &config.priorities, config.routes.clone(), rng);
    logger.info(&format!("Tracking {} trains", fleet.len()));

    let store = Arc::new(SnapshotStore::new());
    let (tx, rx) = mpsc::channel();

    // The producer logs to file only: the TUI owns the terminal.
    let producer_logger = {
        let mut plogger = Logger::with_file(LogLevel::Info, &config.log_file)
            .unwrap_or_else(|_| Logger::new(LogLevel::Info));
        plogger.set_console_output(false);
        Arc::new(plogger)
    };
    let settings = ProducerSettings {
        tick_interval: Duration::from_secs(config.tick_seconds.max(1)),
        recommendation_limit: config.recommendation_limit,
        state_file: Some(PathBuf::from(&config.state_file)),
    };
    let producer_store = store.clone();
    thread::spawn(move || run_producer(fleet, producer_store, rx, producer_logger, settings));

    let mut app = App {
        store,
        interventions: tx,
        aggregator: MetricsAggregator::default(),
        estimator: StochasticThroughput::default(),
        decisions: Vec::new(),
        latest: None,
        snapshots_seen: 0,
        playing: true,
        refresh_rate: Duration::from_secs(config.refresh_seconds.max(1)),
        last_refresh: Instant::now(),
        title,
        status_tab: 0,
        input: None,
    };
    app.refresh();

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| draw_ui(f, app))?;

        let timeout = app
            .refresh_rate
            .checked_sub(app.last_refresh.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let CEvent::Key(KeyEvent { code, kind: KeyEventKind::Press, .. }) = event::read()? {
                if app.input.is_some() {
                    handle_input_key(app, code);
                } else if handle_dashboard_key(app, code) {
                    return Ok(());
                }
            }
        }

        if app.last_refresh.elapsed() >= app.refresh_rate {
            if app.playing {
                app.refresh();
            }
            app.last_refresh = Instant::now();
        }
    }
}

/// Keys while typing a manual log entry
fn handle_input_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Enter => {
            if let Some(entry) = app.input.take() {
                let trimmed = entry.trim().to_string();
                if !trimmed.is_empty() {
                    app.log_decision(trimmed);
                }
            }
        }
        KeyCode::Esc => {
            app.input = None;
        }
        KeyCode::Backspace => {
            if let Some(buffer) = &mut app.input {
                buffer.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(buffer) = &mut app.input {
                buffer.push(c);
            }
        }
        _ => {}
    }
}

/// Normal dashboard keys; returns true when the app should quit
fn handle_dashboard_key(app: &mut App, code: KeyCode) -> bool {
    match code {
        KeyCode::Char('q') => return true,
        KeyCode::Char(' ') => app.playing = !app.playing,
        KeyCode::Char('n') => app.refresh(),
        KeyCode::Char('d') => {
            if app
                .interventions
                .send(Intervention::InjectDelay { minutes: None })
                .is_ok()
            {
                app.log_decision("Delay injection requested".to_string());
            }
        }
        KeyCode::Char('b') => {
            if app.interventions.send(Intervention::Breakdown).is_ok() {
                app.log_decision("Breakdown simulation requested".to_string());
            }
        }
        KeyCode::Char('a') => {
            let action = app.latest.as_ref().and_then(|snapshot| {
                snapshot.recommendations.top().map(|top| {
                    format!(
                        "Applied recommendation: clear {} ({})",
                        top.event.train_id, top.event.train_name
                    )
                })
            });
            if let Some(action) = action {
                app.log_decision(action);
            }
        }
        KeyCode::Char('l') => app.input = Some(String::new()),
        // With two tabs, forward and backward both flip to the other one.
        KeyCode::Tab | KeyCode::BackTab => app.status_tab = (app.status_tab + 1) % 2,
        _ => {}
    }
    false
}

fn draw_ui(f: &mut ratatui::Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)].as_ref())
        .split(f.size());

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(15),
                Constraint::Length(5),
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(chunks[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(14)].as_ref())
        .split(chunks[1]);

    draw_metrics(f, left[0], app);
    draw_delay_trend(f, left[1], app);
    draw_recommendations(f, left[2], app);
    draw_status_tabs(f, right[0], app);
    draw_decision_log(f, right[1], app);
}

fn draw_metrics(f: &mut ratatui::Frame, area: Rect, app: &App) {
    let playing_text = if app.playing { "Live" } else { "Paused" };
    let fleet_size = app
        .latest
        .as_ref()
        .map(|s| s.active_trains.len())
        .unwrap_or(0);
    let (avg_delay, throughput, utilization) = app
        .aggregator
        .latest()
        .map(|s| {
            (
                s.metrics.avg_delay,
                s.metrics.throughput,
                s.metrics.utilization,
            )
        })
        .unwrap_or((0.0, 0.0, 0.0));

    let lines = vec![
        Line::from(app.title.clone()),
        Line::from(format!("Mode: {}", playing_text)),
        Line::from(format!("Snapshots seen: {}", app.snapshots_seen)),
        Line::from(format!("Fleet size: {}", fleet_size)),
        Line::from(format!("Avg delay: {:.1} min", avg_delay)),
        Line::from(format!("Throughput: {:.1} trains/hr", throughput)),
        Line::from(format!("Utilization: {:.0}%", utilization)),
        Line::from(format!("Metric samples: {}", app.aggregator.len())),
        Line::from("Controls:"),
        Line::from("  space - pause/resume  n - poll now"),
        Line::from("  d - inject delay      b - breakdown"),
        Line::from("  a - apply top rec     l - log entry"),
        Line::from("  tab - switch view     q - quit"),
    ];

    let metrics = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Metrics"))
        .wrap(Wrap { trim: true });

    f.render_widget(metrics, area);
}

/// Average delay per rolling-window sample, oldest first, for the trend panel
fn delay_trend_series(app: &App) -> Vec<u64> {
    app.aggregator
        .history()
        .map(|sample| sample.metrics.avg_delay.round() as u64)
        .collect()
}

fn draw_delay_trend(f: &mut ratatui::Frame, area: Rect, app: &App) {
    let series = delay_trend_series(app);
    let trend = Sparkline::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Avg Delay Trend"),
        )
        .data(&series)
        .style(Style::default().fg(Color::Cyan));
    f.render_widget(trend, area);
}

fn draw_recommendations(f: &mut ratatui::Frame, area: Rect, app: &App) {
    let mut lines = Vec::new();
    match &app.latest {
        Some(snapshot) if !snapshot.recommendations.is_empty() => {
            for rec in &snapshot.recommendations.entries {
                lines.push(Line::from(format!(
                    "#{} {} {}",
                    rec.rank, rec.event.train_id, rec.event.train_name
                )));
                lines.push(Line::from(format!(
                    "   P{} | Delay {}m | Sched {} | {}",
                    rec.event.priority_class,
                    rec.event.delay_minutes,
                    rec.event.scheduled_time,
                    rec.event.route
                )));
            }
        }
        Some(_) => lines.push(Line::from("No arrivals this tick")),
        None => lines.push(Line::from("Waiting for first snapshot...")),
    }

    let para = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Recommendations")
                .style(Style::default().fg(Color::White)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(para, area);
}

fn draw_status_tabs(f: &mut ratatui::Frame, area: Rect, app: &App) {
    let tabs_area = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let titles = vec![Line::from("Active Events"), Line::from("Track Status")];
    let tabs = Tabs::new(titles)
        .select(app.status_tab)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, tabs_area[0]);

    match app.status_tab {
        0 => {
            let mut event_lines = Vec::new();
            if let Some(snapshot) = &app.latest {
                for evt in &snapshot.active_trains {
                    event_lines.push(Line::from(format!(
                        "{} {} | {} | {} | P{} | Delay {}m",
                        evt.train_id,
                        evt.train_name,
                        evt.kind.as_str(),
                        evt.route,
                        evt.priority_class,
                        evt.delay_minutes
                    )));
                }
            }
            if event_lines.is_empty() {
                event_lines.push(Line::from("No events yet"));
            }
            let para = Paragraph::new(event_lines)
                .block(Block::default().borders(Borders::ALL))
                .wrap(Wrap { trim: true });
            f.render_widget(para, tabs_area[1]);
        }
        _ => {
            let mut status_lines = Vec::new();
            if let Some(snapshot) = &app.latest {
                for (name, status) in &snapshot.track_status {
                    status_lines.push(Line::from(format!("{}: {}", name, status.as_str())));
                }
            }
            if status_lines.is_empty() {
                status_lines.push(Line::from("No track status yet"));
            }
            let para = Paragraph::new(status_lines)
                .block(Block::default().borders(Borders::ALL))
                .wrap(Wrap { trim: true });
            f.render_widget(para, tabs_area[1]);
        }
    }
}

fn draw_decision_log(f: &mut ratatui::Frame, area: Rect, app: &App) {
    let mut lines = Vec::new();
    if let Some(buffer) = &app.input {
        lines.push(Line::from(format!("New entry: {}_", buffer)));
    }

    let start = app.decisions.len().saturating_sub(DECISION_LOG_DISPLAY);
    for entry in app.decisions[start..].iter().rev() {
        lines.push(Line::from(format!(
            "{} {}",
            entry.at.format("%H:%M:%S"),
            entry.action
        )));
    }
    if lines.is_empty() {
        lines.push(Line::from("No decisions logged"));
    }

    let para = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Decision Log"))
        .wrap(Wrap { trim: true });
    f.render_widget(para, area);
}
