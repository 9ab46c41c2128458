//! Core library for the Fractal Beat visualiser.
//!
//! The crate is the headless heart of the application: a beat clock that
//! turns frame deltas into discrete beat events, and a fixed pool of
//! outline shapes flying down a tunnel in time with those beats. Rendering,
//! widgets and audio output belong to the embedding application; everything
//! here is plain state that a frontend reads back once per frame.

pub mod config;
pub mod error;
pub mod metronome;
pub mod palette;
pub mod session;
pub mod shape;
pub mod timing;
pub mod tunnel;

pub use config::{AppConfig, TempoConfig, VisualConfig};
pub use error::{FractalBeatError, Result};
pub use metronome::{Click, Metronome};
pub use palette::{Color, Palette};
pub use session::{FrameUpdate, Session, SessionState, IDLE_BPM, MAX_FRAME_DT};
pub use shape::{ShapeGeometry, ShapeLibrary, ShapeType};
pub use timing::{BeatState, TimingEngine, MAX_BPM, MIN_BPM};
pub use tunnel::{TunnelEngine, TunnelItem, DESPAWN_Z, POOL_SIZE, SPAWN_Z};
