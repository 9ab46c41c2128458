/// Every fourth beat is accented.
const ACCENT_PERIOD: i64 = 4;

const ACCENT_FREQUENCY_HZ: f32 = 1000.0;
const TICK_FREQUENCY_HZ: f32 = 800.0;
const ACCENT_GAIN: f32 = 0.5;
const TICK_GAIN: f32 = 0.3;
const CLICK_SECONDS: f32 = 0.05;

/// Description of one metronome click for an audio backend to realise as a
/// short sine burst.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Click {
    pub accent: bool,
    pub frequency_hz: f32,
    pub gain: f32,
    pub duration_seconds: f32,
}

/// Emits click descriptors for new beats while enabled.
#[derive(Debug, Clone, Default)]
pub struct Metronome {
    enabled: bool,
}

impl Metronome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, on: bool) {
        self.enabled = on;
    }

    /// Click for the given beat, or `None` while the metronome is off.
    pub fn click_for_beat(&self, beat_index: i64) -> Option<Click> {
        if !self.enabled {
            return None;
        }

        let accent = beat_index % ACCENT_PERIOD == 0;
        let (frequency_hz, gain) = if accent {
            (ACCENT_FREQUENCY_HZ, ACCENT_GAIN)
        } else {
            (TICK_FREQUENCY_HZ, TICK_GAIN)
        };

        Some(Click {
            accent,
            frequency_hz,
            gain,
            duration_seconds: CLICK_SECONDS,
        })
    }
}
