mod ui;

use bullseye::{
    config::{Config, ConfigStore, FileConfigStore},
    end::Shot,
    history::HistoryDb,
    persistence::{FileSnapshotStore, PersistedSnapshot, SnapshotStore},
    runtime::{AppEvent, FixedTicker, Runner, SecondTicker, TerminalEventSource},
    score::TargetGeometry,
    session::{FinalizedSession, Session, SessionError, DISTANCES_M, END_SIZES},
    timer::{Cue, CueSink, MatchTimer, TimerPhase, FULL_MATCH_SECS, SHORT_MATCH_SECS},
};
use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin, Write},
    time::Duration,
};

const TICK_RATE_MS: u64 = 100;

/// archery scoring tui with target-face input and competition timing
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Score practice and competition ends on a ten-ring target face, pace timed ends with whistle cues, and keep a local history of finished sessions."
)]
pub struct Cli {
    /// arrows per end (3 or 6)
    #[clap(short = 'a', long)]
    arrows_per_end: Option<u8>,

    /// shooting distance in meters
    #[clap(short = 'd', long)]
    distance: Option<u16>,

    /// bow category; sets the length of the competition clock
    #[clap(short = 'b', long, value_enum)]
    bow_category: Option<BowCategory>,

    /// start in competition mode: each end is paced by the match clock
    #[clap(short = 'c', long)]
    competition: bool,

    /// silence whistle cues
    #[clap(long)]
    muted: bool,

    /// print recent finished sessions and exit
    #[clap(long)]
    history: bool,

    /// write the session history as CSV to stdout and exit
    #[clap(long)]
    export_csv: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum BowCategory {
    Recurve,
    Compound,
    Barebow,
    Indian,
}

impl BowCategory {
    /// Shooting window for this category: the Indian bow shoots the
    /// short clock, every other category the full one.
    pub fn match_secs(&self) -> u32 {
        match self {
            BowCategory::Indian => SHORT_MATCH_SECS,
            _ => FULL_MATCH_SECS,
        }
    }

    fn all() -> [BowCategory; 4] {
        [
            BowCategory::Recurve,
            BowCategory::Compound,
            BowCategory::Barebow,
            BowCategory::Indian,
        ]
    }

    fn next(&self) -> BowCategory {
        let all = Self::all();
        let pos = all.iter().position(|c| c == self).unwrap_or(0);
        all[(pos + 1) % all.len()]
    }
}

/// Renders cue pulses as terminal bell beeps.
#[derive(Debug)]
pub struct BellCueSink {
    pub muted: bool,
}

impl CueSink for BellCueSink {
    fn emit(&mut self, cue: Cue) {
        if self.muted {
            return;
        }
        let mut out = io::stdout();
        for _ in 0..cue.pulses() {
            let _ = out.write_all(b"\x07");
        }
        let _ = out.flush();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Setup,
    Timer,
    Scoring,
    Summary,
}

pub struct App {
    pub state: AppState,
    pub session: Option<Session>,
    pub timer: MatchTimer,
    pub second_ticker: SecondTicker,
    pub geometry: TargetGeometry,
    /// Crosshair position on the target face, in face coordinates.
    pub cursor: (f64, f64),
    /// Shot resolved at the crosshair, awaiting arrow-number confirmation.
    pub pending_shot: Option<Shot>,
    pub status: Option<String>,
    pub resumed_save_ms: Option<i64>,
    pub competition: bool,
    pub distance_meters: u16,
    pub arrows_per_end: u8,
    pub bow_category: BowCategory,
    pub summary: Option<FinalizedSession>,
    pub cue_sink: BellCueSink,
    snapshot_store: FileSnapshotStore,
    config_store: FileConfigStore,
}

impl App {
    pub fn new(cli: &Cli) -> Self {
        let config_store = FileConfigStore::new();
        let mut config = config_store.load();
        if let Some(d) = cli.distance {
            config.distance_meters = d;
        }
        if let Some(a) = cli.arrows_per_end {
            config.arrows_per_end = a;
        }
        if let Some(b) = cli.bow_category {
            config.bow_category = b.to_string();
        }
        if cli.muted {
            config.muted = true;
        }

        let bow_category = <BowCategory as ValueEnum>::from_str(&config.bow_category, true)
            .unwrap_or(BowCategory::Recurve);

        let snapshot_store = FileSnapshotStore::new();
        let (session, state, resumed_save_ms) = match snapshot_store.load() {
            Some(snapshot) => (
                Some(snapshot.session),
                AppState::Scoring,
                Some(snapshot.saved_at_epoch_millis),
            ),
            None => (None, AppState::Setup, None),
        };

        let distance_meters = session
            .as_ref()
            .map(|s| s.distance_meters)
            .unwrap_or(config.distance_meters);
        let arrows_per_end = session
            .as_ref()
            .map(|s| s.arrows_per_end)
            .unwrap_or(config.arrows_per_end);
        let muted = config.muted;

        Self {
            state,
            session,
            timer: MatchTimer::new(bow_category.match_secs()),
            second_ticker: SecondTicker::default(),
            geometry: TargetGeometry::default(),
            cursor: (50.0, 50.0),
            pending_shot: None,
            status: None,
            resumed_save_ms,
            competition: cli.competition,
            distance_meters,
            arrows_per_end,
            bow_category,
            summary: None,
            cue_sink: BellCueSink { muted },
            snapshot_store,
            config_store,
        }
    }

    fn save_config(&self) {
        let _ = self.config_store.save(&Config {
            distance_meters: self.distance_meters,
            arrows_per_end: self.arrows_per_end,
            bow_category: self.bow_category.to_string(),
            muted: self.cue_sink.muted,
        });
    }

    /// Snapshot the session after a mutation. Best-effort: scoring never
    /// waits on the write.
    fn persist(&self) {
        if let Some(session) = &self.session {
            let _ = self
                .snapshot_store
                .save(&PersistedSnapshot::taken(session));
        }
    }

    pub fn on_tick(&mut self) {
        if self.timer.is_counting() {
            let secs = self.second_ticker.advance(TICK_RATE_MS);
            for _ in 0..secs {
                self.timer.tick(&mut self.cue_sink);
                if !self.timer.is_counting() {
                    break;
                }
            }
        }
        if !self.timer.is_counting() {
            self.second_ticker.reset();
        }
    }

    fn start_session(&mut self) {
        self.save_config();
        self.session = Some(Session::start(self.distance_meters, self.arrows_per_end));
        self.resumed_save_ms = None;
        self.summary = None;
        self.pending_shot = None;
        self.status = None;
        self.cursor = (50.0, 50.0);
        self.timer = MatchTimer::new(self.bow_category.match_secs());
        self.second_ticker.reset();
        self.persist();
        self.state = if self.competition {
            AppState::Timer
        } else {
            AppState::Scoring
        };
    }

    fn abandon_session(&mut self) {
        let _ = self.snapshot_store.clear();
        self.session = None;
        self.pending_shot = None;
        self.resumed_save_ms = None;
        self.status = None;
        self.timer.stop();
        self.second_ticker.reset();
        self.state = AppState::Setup;
    }

    fn finish_session(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        if session.arrows_recorded() == 0 {
            self.status = Some("record at least one arrow before finishing".into());
            return;
        }
        let record = session.finalize();
        if let Err(e) = HistoryDb::new().and_then(|db| db.record_session(&record).map(|_| ())) {
            self.status = Some(format!("failed to save session: {}", e));
            return;
        }
        let _ = self.snapshot_store.clear();
        self.summary = Some(record);
        self.session = None;
        self.pending_shot = None;
        self.resumed_save_ms = None;
        self.status = None;
        self.timer.stop();
        self.second_ticker.reset();
        self.state = AppState::Summary;
    }

    fn move_cursor(&mut self, dx: f64, dy: f64) {
        self.cursor.0 = (self.cursor.0 + dx).clamp(0.0, 100.0);
        self.cursor.1 = (self.cursor.1 + dy).clamp(0.0, 100.0);
    }

    fn place_pending_shot(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        if session.current_end().is_complete(session.arrows_per_end) {
            self.status = Some("end is full: submit it or clear a shot".into());
            return;
        }
        let (x, y) = self.cursor;
        let value = self.geometry.resolve(x, y);
        self.pending_shot = Some(Shot::new(x, y, value));
    }

    fn confirm_pending_shot(&mut self, arrow_index: Option<u8>) {
        let Some(mut shot) = self.pending_shot.take() else {
            return;
        };
        if let Some(n) = arrow_index {
            shot = shot.with_arrow_index(n);
        }
        let mut recorded = false;
        if let Some(session) = &mut self.session {
            // A full end swallows the extra input rather than erroring.
            recorded = session.record_shot(shot).is_ok();
        }
        if recorded {
            self.status = None;
            self.persist();
        }
    }

    fn undo_last_shot(&mut self) {
        if let Some(session) = &mut self.session {
            session.undo_last_shot();
        }
        self.status = None;
        self.persist();
    }

    fn submit_end(&mut self) {
        let Some(session) = &mut self.session else {
            return;
        };
        match session.advance_end() {
            Ok(()) => {
                self.status = None;
                self.persist();
                if self.competition {
                    self.second_ticker.reset();
                    self.state = AppState::Timer;
                }
            }
            Err(SessionError::EndNotComplete { recorded, capacity }) => {
                self.status = Some(format!(
                    "end has {} of {} arrows, finish it before submitting",
                    recorded, capacity
                ));
            }
            Err(e) => {
                self.status = Some(e.to_string());
            }
        }
    }

    fn seek_relative(&mut self, delta: isize) {
        if let Some(session) = &mut self.session {
            let idx = session.current_end_index() as isize + delta;
            if idx >= 0 {
                let _ = session.seek_end(idx as usize);
            }
        }
        self.pending_shot = None;
    }

    /// Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }
        match self.state {
            AppState::Setup => self.handle_setup_key(key),
            AppState::Timer => self.handle_timer_key(key),
            AppState::Scoring => self.handle_scoring_key(key),
            AppState::Summary => self.handle_summary_key(key),
        }
    }

    fn handle_setup_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('d') | KeyCode::Right => {
                let pos = DISTANCES_M
                    .iter()
                    .position(|d| *d == self.distance_meters)
                    .unwrap_or(0);
                self.distance_meters = DISTANCES_M[(pos + 1) % DISTANCES_M.len()];
            }
            KeyCode::Left => {
                let pos = DISTANCES_M
                    .iter()
                    .position(|d| *d == self.distance_meters)
                    .unwrap_or(0);
                self.distance_meters =
                    DISTANCES_M[(pos + DISTANCES_M.len() - 1) % DISTANCES_M.len()];
            }
            KeyCode::Char('a') => {
                let pos = END_SIZES
                    .iter()
                    .position(|a| *a == self.arrows_per_end)
                    .unwrap_or(0);
                self.arrows_per_end = END_SIZES[(pos + 1) % END_SIZES.len()];
            }
            KeyCode::Char('b') => {
                self.bow_category = self.bow_category.next();
                self.timer = MatchTimer::new(self.bow_category.match_secs());
            }
            KeyCode::Char('c') => {
                self.competition = !self.competition;
            }
            KeyCode::Char('m') => {
                self.cue_sink.muted = !self.cue_sink.muted;
            }
            KeyCode::Enter => self.start_session(),
            _ => {}
        }
        false
    }

    fn handle_timer_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('s') => {
                self.second_ticker.reset();
                self.timer.start(&mut self.cue_sink);
            }
            KeyCode::Char('f') => {
                self.timer.force_expire(&mut self.cue_sink);
                self.second_ticker.reset();
            }
            KeyCode::Enter => {
                if self.timer.phase() == TimerPhase::Expired {
                    self.state = AppState::Scoring;
                }
            }
            KeyCode::Esc => {
                self.timer.stop();
                self.second_ticker.reset();
                self.state = AppState::Scoring;
            }
            _ => {}
        }
        false
    }

    fn handle_scoring_key(&mut self, key: KeyEvent) -> bool {
        if self.pending_shot.is_some() {
            match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => self.confirm_pending_shot(None),
                KeyCode::Char(c @ '1'..='9') => {
                    self.confirm_pending_shot(Some(c as u8 - b'0'));
                }
                KeyCode::Esc => {
                    self.pending_shot = None;
                }
                _ => {}
            }
            return false;
        }

        let step = if key.modifiers.contains(KeyModifiers::SHIFT) {
            5.0
        } else {
            1.0
        };
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.move_cursor(-step, 0.0),
            KeyCode::Right | KeyCode::Char('l') => self.move_cursor(step, 0.0),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(0.0, -step),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(0.0, step),
            KeyCode::Char('H') => self.move_cursor(-5.0, 0.0),
            KeyCode::Char('L') => self.move_cursor(5.0, 0.0),
            KeyCode::Char('K') => self.move_cursor(0.0, -5.0),
            KeyCode::Char('J') => self.move_cursor(0.0, 5.0),
            KeyCode::Enter | KeyCode::Char(' ') => self.place_pending_shot(),
            KeyCode::Char('u') => self.undo_last_shot(),
            KeyCode::Char('s') => self.submit_end(),
            KeyCode::Char('[') => self.seek_relative(-1),
            KeyCode::Char(']') => self.seek_relative(1),
            KeyCode::Char('t') => {
                if self.competition {
                    self.state = AppState::Timer;
                }
            }
            KeyCode::Char('f') => self.finish_session(),
            KeyCode::Char('x') => self.abandon_session(),
            KeyCode::Esc => {
                // Leave the session resumable; only 'x' abandons it.
                self.state = AppState::Setup;
            }
            _ => {}
        }
        false
    }

    fn handle_summary_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Enter | KeyCode::Char('n') | KeyCode::Esc => {
                self.summary = None;
                self.state = AppState::Setup;
            }
            _ => {}
        }
        false
    }
}

fn print_history() -> Result<(), Box<dyn Error>> {
    let db = HistoryDb::new()?;
    let sessions = db.recent_sessions(20)?;
    if sessions.is_empty() {
        println!("no finished sessions yet");
        return Ok(());
    }
    println!(
        "{:>4}  {:>8}  {:>7}  {:>9}  recorded",
        "id", "distance", "per-end", "score"
    );
    for entry in sessions {
        println!(
            "{:>4}  {:>7}m  {:>7}  {:>4}/{:<4}  {}",
            entry.id,
            entry.distance_meters,
            entry.arrows_per_end,
            entry.total_score,
            entry.total_arrows * 10,
            entry.recorded_at
        );
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(d) = cli.distance {
        if !DISTANCES_M.contains(&d) {
            let mut cmd = Cli::command();
            cmd.error(
                ErrorKind::InvalidValue,
                format!("distance must be one of {:?} meters", DISTANCES_M),
            )
            .exit();
        }
    }
    if let Some(a) = cli.arrows_per_end {
        if !END_SIZES.contains(&a) {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, "arrows per end must be 3 or 6")
                .exit();
        }
    }

    if cli.history {
        return print_history();
    }
    if cli.export_csv {
        let db = HistoryDb::new()?;
        return db.export_csv(io::stdout());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&cli);
    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        TerminalEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            AppEvent::Tick => app.on_tick(),
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if app.handle_key(key) {
                    break;
                }
            }
        }
    }

    Ok(())
}
