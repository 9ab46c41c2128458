use std::sync::Arc;

use crate::config::AppConfig;
use crate::metronome::{Click, Metronome};
use crate::palette::Palette;
use crate::shape::ShapeType;
use crate::timing::{BeatState, TimingEngine, MAX_BPM, MIN_BPM};
use crate::tunnel::{TunnelEngine, TunnelItem};

/// Largest frame delta fed to the engines, in seconds. Anything bigger (a
/// backgrounded window, a debugger pause) is truncated rather than allowed
/// to collapse a burst of missed beats into one oversized step.
pub const MAX_FRAME_DT: f32 = 0.1;

/// Tempo of the ambient preview tunnel shown while nothing is running.
pub const IDLE_BPM: f32 = 30.0;

/// Decorrelates the two tunnel seeds derived from one session seed.
const SEED_MIX: u64 = 0x9e37_79b9_7f4a_7c15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing running; the slow ambient tunnel plays.
    Idle,
    /// Beats advance and drive the main tunnel.
    Running,
    /// Frozen mid-session; resuming keeps the beat count.
    Paused,
}

/// What one frame produced: a beat snapshot while running, plus a click
/// descriptor when a new beat lands with the metronome on.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameUpdate {
    pub beat: Option<BeatState>,
    pub click: Option<Click>,
}

/// Owns the beat clock and both tunnels and routes beat pulses between
/// them, mirroring the control surface of the full application.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    bpm: f32,
    clock_mode: bool,
    timing: TimingEngine,
    tunnel: TunnelEngine,
    idle_tunnel: TunnelEngine,
    metronome: Metronome,
}

impl Session {
    pub fn new(config: &AppConfig) -> Self {
        Self::build(config, TunnelEngine::new(), TunnelEngine::new())
    }

    /// Session with reproducible spawn jitter. The two tunnels receive
    /// distinct seeds derived from `seed`.
    pub fn with_seed(config: &AppConfig, seed: u64) -> Self {
        Self::build(
            config,
            TunnelEngine::with_seed(seed),
            TunnelEngine::with_seed(seed ^ SEED_MIX),
        )
    }

    fn build(config: &AppConfig, tunnel: TunnelEngine, idle_tunnel: TunnelEngine) -> Self {
        let mut session = Self {
            state: SessionState::Idle,
            bpm: 120.0,
            clock_mode: false,
            timing: TimingEngine::new(),
            tunnel,
            idle_tunnel,
            metronome: Metronome::new(),
        };
        session.idle_tunnel.set_bpm(IDLE_BPM);
        session.apply_config(config);
        session
    }

    fn apply_config(&mut self, config: &AppConfig) {
        self.set_bpm(config.tempo.bpm);
        self.set_clock_mode(config.tempo.clock_mode);
        self.set_shape(config.visual.shape);
        self.set_metronome(config.visual.metronome);
        let palette = Palette::named(&config.palette).unwrap_or_else(Palette::default_palette);
        self.set_palette(palette);
    }

    /// Begins a run. From idle the clocks restart at beat zero; from pause
    /// the session resumes where it stopped.
    pub fn start(&mut self) {
        match self.state {
            SessionState::Idle => {
                self.timing.reset();
                self.tunnel.reset();
                self.enter_running();
            }
            SessionState::Paused => self.enter_running(),
            SessionState::Running => {}
        }
    }

    fn enter_running(&mut self) {
        // The ambient preview is hidden while a session runs.
        self.idle_tunnel.reset();
        self.state = SessionState::Running;
    }

    /// Freezes a running session in place. No-op in any other state.
    pub fn pause(&mut self) {
        if self.state == SessionState::Running {
            self.state = SessionState::Paused;
        }
    }

    /// Ends the session and returns to the ambient idle view.
    pub fn stop(&mut self) {
        self.timing.reset();
        self.tunnel.reset();
        self.state = SessionState::Idle;
    }

    /// Updates the tempo. The beat clock always stores it; the main tunnel
    /// follows only while clock mode is off, and the idle preview keeps its
    /// own slow cadence. Non-finite input is discarded and the previous
    /// tempo kept.
    pub fn set_bpm(&mut self, bpm: f32) {
        if !bpm.is_finite() {
            return;
        }
        self.bpm = bpm.clamp(MIN_BPM, MAX_BPM);
        self.timing.set_bpm(self.bpm);
        if !self.clock_mode {
            self.tunnel.set_bpm(self.bpm);
        }
    }

    /// Switches between the tempo-derived beat interval and the fixed
    /// one-second clock. Switching back restores the stored tempo.
    pub fn set_clock_mode(&mut self, on: bool) {
        self.clock_mode = on;
        self.timing.set_clock_mode(on);
        if on {
            self.tunnel.set_clock_mode();
        } else {
            self.tunnel.set_bpm(self.bpm);
        }
    }

    /// Applies `shape` to both tunnels immediately, items in flight
    /// included.
    pub fn set_shape(&mut self, shape: ShapeType) {
        self.tunnel.set_shape(shape);
        self.idle_tunnel.set_shape(shape);
    }

    /// Applies `palette` to both tunnels; items in flight keep their
    /// colours.
    pub fn set_palette(&mut self, palette: Arc<Palette>) {
        self.tunnel.set_palette(palette.clone());
        self.idle_tunnel.set_palette(palette);
    }

    pub fn set_metronome(&mut self, on: bool) {
        self.metronome.set_enabled(on);
    }

    /// Returns every setting to its default and ends any running session.
    pub fn reset_defaults(&mut self) {
        self.apply_config(&AppConfig::default());
        self.idle_tunnel.set_bpm(IDLE_BPM);
        if self.state != SessionState::Idle {
            self.stop();
        }
    }

    /// Steps the session by one frame. `dt` is clamped into
    /// `[0, MAX_FRAME_DT]` before any engine sees it.
    pub fn advance(&mut self, dt: f32) -> FrameUpdate {
        let dt = dt.clamp(0.0, MAX_FRAME_DT);

        match self.state {
            SessionState::Running => {
                let beat = self.timing.update(dt);
                let click = if beat.is_new_beat {
                    self.tunnel.apply_beat_kick();
                    self.metronome.click_for_beat(beat.beat_index)
                } else {
                    None
                };
                self.tunnel.update(dt);
                FrameUpdate {
                    beat: Some(beat),
                    click,
                }
            }
            SessionState::Idle => {
                self.idle_tunnel.update(dt);
                FrameUpdate::default()
            }
            SessionState::Paused => FrameUpdate::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    pub fn clock_mode(&self) -> bool {
        self.clock_mode
    }

    pub fn shape(&self) -> ShapeType {
        self.tunnel.shape()
    }

    pub fn metronome_enabled(&self) -> bool {
        self.metronome.enabled()
    }

    /// Palette applied to future spawns; the accent colour drives chrome
    /// around the tunnel.
    pub fn palette(&self) -> &Arc<Palette> {
        self.tunnel.palette()
    }

    /// Pool of whichever tunnel the current state displays: the ambient
    /// preview while idle, the session tunnel otherwise.
    pub fn items(&self) -> &[TunnelItem] {
        match self.state {
            SessionState::Idle => self.idle_tunnel.items(),
            _ => self.tunnel.items(),
        }
    }

    pub fn active_count(&self) -> usize {
        self.items().iter().filter(|item| item.active).count()
    }
}
