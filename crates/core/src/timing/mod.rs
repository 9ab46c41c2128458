/// Lowest tempo the engine accepts, in beats per minute.
pub const MIN_BPM: f32 = 20.0;
/// Highest tempo the engine accepts, in beats per minute.
pub const MAX_BPM: f32 = 300.0;

/// Beat interval used while clock mode is on, in seconds.
const CLOCK_INTERVAL: f32 = 1.0;

const DEFAULT_BPM: f32 = 120.0;

/// Beat snapshot produced by [`TimingEngine::update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatState {
    /// Number of whole beat intervals elapsed since the last reset.
    pub beat_index: i64,
    /// Fractional progress through the current interval, in `[0, 1)`.
    pub phase: f32,
    /// True when `beat_index` differs from the previously reported index.
    pub is_new_beat: bool,
}

/// Converts accumulated frame deltas into beat indices and phase.
///
/// Beats are detected by index transitions rather than phase wrap-around,
/// so the result is correct for any positive delta. A delta spanning
/// several intervals still reports a single new beat; the intermediate
/// beats are dropped, and callers cap deltas to keep that rare.
#[derive(Debug, Clone)]
pub struct TimingEngine {
    bpm: f32,
    clock_mode: bool,
    elapsed: f32,
    last_beat_index: i64,
}

impl TimingEngine {
    /// Engine at the default tempo of 120 bpm.
    pub fn new() -> Self {
        Self::with_bpm(DEFAULT_BPM)
    }

    pub fn with_bpm(bpm: f32) -> Self {
        let mut engine = Self {
            bpm: DEFAULT_BPM,
            clock_mode: false,
            elapsed: 0.0,
            last_beat_index: -1,
        };
        engine.set_bpm(bpm);
        engine
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    pub fn clock_mode(&self) -> bool {
        self.clock_mode
    }

    /// Seconds per beat: fixed at one second in clock mode, `60 / bpm`
    /// otherwise. Always positive thanks to the bpm clamp.
    pub fn interval(&self) -> f32 {
        if self.clock_mode {
            CLOCK_INTERVAL
        } else {
            60.0 / self.bpm
        }
    }

    /// Stores a tempo, clamped into `[MIN_BPM, MAX_BPM]`; non-finite values
    /// are discarded. The value is kept while clock mode is on and takes
    /// effect again once it is off.
    pub fn set_bpm(&mut self, bpm: f32) {
        if bpm.is_finite() {
            self.bpm = bpm.clamp(MIN_BPM, MAX_BPM);
        }
    }

    pub fn set_clock_mode(&mut self, on: bool) {
        self.clock_mode = on;
    }

    /// Rewinds the clock and forgets the last beat, so the next update
    /// reports beat zero as new.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.last_beat_index = -1;
    }

    /// Advances the clock by `dt` seconds and derives the beat state from
    /// the new elapsed time. Callers keep `dt` non-negative.
    pub fn update(&mut self, dt: f32) -> BeatState {
        self.elapsed += dt;

        let interval = self.interval();
        let beat_index = (self.elapsed / interval).floor() as i64;
        let phase = (self.elapsed % interval) / interval;
        let is_new_beat = beat_index != self.last_beat_index;
        self.last_beat_index = beat_index;

        BeatState {
            beat_index,
            phase,
            is_new_beat,
        }
    }
}

impl Default for TimingEngine {
    fn default() -> Self {
        Self::new()
    }
}
