/// Seconds of the preparation countdown before the shooting window.
pub const PREPARATION_SECS: u32 = 10;

/// Remaining-seconds mark in the shooting window that triggers the
/// warning cue.
pub const WARNING_SECS: u32 = 30;

/// Shooting window for the Indian bow category.
pub const SHORT_MATCH_SECS: u32 = 90;

/// Shooting window for every other category.
pub const FULL_MATCH_SECS: u32 = 180;

/// Whistle cues paced by the match clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// Single whistle: step to the line.
    Preparation,
    /// Double whistle: begin shooting.
    BeginShooting,
    /// Single whistle at the warning mark.
    Warning,
    /// Triple whistle: time, stop shooting.
    TimeUp,
}

impl Cue {
    /// Number of discrete pulses the audio collaborator renders, spaced
    /// evenly within its emission window.
    pub fn pulses(&self) -> u8 {
        match self {
            Cue::Preparation | Cue::Warning => 1,
            Cue::BeginShooting => 2,
            Cue::TimeUp => 3,
        }
    }
}

/// Consumer of cue events. How a pulse sounds is the collaborator's
/// concern; the timer only decides which cue fires and when.
pub trait CueSink {
    fn emit(&mut self, cue: Cue);
}

/// Phase of the match clock. Transitions are forward-only within one
/// countdown cycle; `stop` resets to `Idle` from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Idle,
    Preparation { remaining: u32 },
    Active { remaining: u32 },
    Expired,
}

/// Phased countdown pacing one competition end.
///
/// Owns no tick source and no audio: the caller delivers one `tick` per
/// second while a countdown phase is live and supplies the cue sink.
/// Ticks arriving in `Idle` or `Expired` are ignored, so a straggling
/// tick after cancellation cannot mutate the clock.
#[derive(Debug, Clone)]
pub struct MatchTimer {
    phase: TimerPhase,
    match_secs: u32,
    warning_fired: bool,
}

impl MatchTimer {
    pub fn new(match_secs: u32) -> Self {
        Self {
            phase: TimerPhase::Idle,
            match_secs,
            warning_fired: false,
        }
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn match_secs(&self) -> u32 {
        self.match_secs
    }

    /// True while a countdown phase needs the periodic tick.
    pub fn is_counting(&self) -> bool {
        matches!(
            self.phase,
            TimerPhase::Preparation { .. } | TimerPhase::Active { .. }
        )
    }

    /// Begin a countdown cycle with the single preparation whistle.
    /// Ignored while a countdown is already running (duplicate trigger).
    pub fn start(&mut self, sink: &mut dyn CueSink) {
        match self.phase {
            TimerPhase::Idle | TimerPhase::Expired => {
                self.warning_fired = false;
                self.phase = TimerPhase::Preparation {
                    remaining: PREPARATION_SECS,
                };
                sink.emit(Cue::Preparation);
            }
            TimerPhase::Preparation { .. } | TimerPhase::Active { .. } => {}
        }
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self, sink: &mut dyn CueSink) {
        match self.phase {
            TimerPhase::Preparation { remaining } => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.phase = TimerPhase::Active {
                        remaining: self.match_secs,
                    };
                    sink.emit(Cue::BeginShooting);
                } else {
                    self.phase = TimerPhase::Preparation { remaining };
                }
            }
            TimerPhase::Active { remaining } => {
                let remaining = remaining.saturating_sub(1);
                if remaining == WARNING_SECS && !self.warning_fired {
                    self.warning_fired = true;
                    sink.emit(Cue::Warning);
                }
                if remaining == 0 {
                    self.phase = TimerPhase::Expired;
                    sink.emit(Cue::TimeUp);
                } else {
                    self.phase = TimerPhase::Active { remaining };
                }
            }
            TimerPhase::Idle | TimerPhase::Expired => {}
        }
    }

    /// Abandon the countdown and return to idle. No cue.
    pub fn stop(&mut self) {
        self.phase = TimerPhase::Idle;
        self.warning_fired = false;
    }

    /// End the shooting window early ("finish end"): same triple whistle
    /// as natural expiry. Ignored outside the active phase.
    pub fn force_expire(&mut self, sink: &mut dyn CueSink) {
        if let TimerPhase::Active { .. } = self.phase {
            self.phase = TimerPhase::Expired;
            sink.emit(Cue::TimeUp);
        }
    }
}

/// Sink recording every cue in order, for tests and headless runs.
#[derive(Debug, Default)]
pub struct RecordingCueSink {
    pub cues: Vec<Cue>,
}

impl CueSink for RecordingCueSink {
    fn emit(&mut self, cue: Cue) {
        self.cues.push(cue);
    }
}
