use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::palette::{Color, Palette};
use crate::shape::{ShapeGeometry, ShapeLibrary, ShapeType};
use crate::timing::{MAX_BPM, MIN_BPM};

/// Number of reusable pool slots. The pool is built once and never grows.
pub const POOL_SIZE: usize = 32;
/// Depth at which items enter the tunnel.
pub const SPAWN_Z: f32 = -50.0;
/// Depth at which items leave the tunnel and return to the pool.
pub const DESPAWN_Z: f32 = 2.0;

/// Items cross the tunnel in this many spawn intervals, which keeps the
/// on-screen density steady across tempo changes.
const TRAVEL_BEATS: f32 = 4.0;
/// Scale multiplier applied when a beat lands.
const KICK_SCALE: f32 = 1.15;
/// Linear decay rate of the kick multiplier, per second.
const KICK_DECAY_RATE: f32 = 3.0;
/// Scale at the spawn end of the travel curve.
const SCALE_AT_SPAWN: f32 = 0.5;
/// Scale gained over the full travel span.
const SCALE_GAIN: f32 = 5.0;
/// Travel fraction over which freshly spawned items fade in.
const FADE_IN_END: f32 = 0.05;
/// Travel fraction past which items fade back out.
const FADE_OUT_START: f32 = 0.92;
/// Half-width of the cosmetic spawn rotation, in radians.
const JITTER_RADIANS: f32 = std::f32::consts::PI * 0.05;

const DEFAULT_BPM: f32 = 120.0;
const PARKED_COLOR: Color = Color::new(0xffffff);

/// One slot of the fixed pool, holding the renderable state an embedding
/// scene graph reads back each frame.
#[derive(Debug, Clone)]
pub struct TunnelItem {
    /// Whether the slot is currently animating.
    pub active: bool,
    /// Position along the travel axis, between [`SPAWN_Z`] and [`DESPAWN_Z`].
    pub z: f32,
    /// Scale derived from travel progress, before the beat kick.
    pub base_scale: f32,
    /// Final scale after the beat kick multiplier.
    pub scale: f32,
    pub opacity: f32,
    /// Index into the palette the item was spawned under.
    pub color_index: usize,
    pub color: Color,
    /// Cosmetic roll applied at spawn, in radians.
    pub rotation: f32,
    pub visible: bool,
    pub geometry: Arc<ShapeGeometry>,
}

impl TunnelItem {
    fn parked(geometry: Arc<ShapeGeometry>) -> Self {
        Self {
            active: false,
            z: SPAWN_Z,
            base_scale: 1.0,
            scale: 1.0,
            opacity: 1.0,
            color_index: 0,
            color: PARKED_COLOR,
            rotation: 0.0,
            visible: false,
            geometry,
        }
    }
}

/// Fixed pool of shapes receding down the tunnel, spawned on a
/// tempo-derived interval and recycled once they pass the camera.
///
/// All per-frame work is allocation-free: slots only toggle between parked
/// and active, travel speed is derived so an item crosses the tunnel in
/// four spawn intervals, and a beat kick scales every active item
/// transiently.
#[derive(Debug)]
pub struct TunnelEngine {
    pool: Vec<TunnelItem>,
    shapes: ShapeLibrary,
    current_shape: ShapeType,
    palette: Arc<Palette>,
    spawn_interval: f32,
    zoom_speed: f32,
    time_since_spawn: f32,
    color_counter: usize,
    kick_scale: f32,
    rng: StdRng,
}

impl TunnelEngine {
    /// Engine with a freshly drawn jitter seed.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Engine with reproducible spawn jitter.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        let shapes = ShapeLibrary::new();
        let current_shape = ShapeType::Hexagon;
        let geometry = shapes.get(current_shape);
        let pool = (0..POOL_SIZE)
            .map(|_| TunnelItem::parked(geometry.clone()))
            .collect();

        let mut engine = Self {
            pool,
            shapes,
            current_shape,
            palette: Palette::default_palette(),
            spawn_interval: 60.0 / DEFAULT_BPM,
            zoom_speed: 0.0,
            time_since_spawn: 0.0,
            color_counter: 0,
            kick_scale: 1.0,
            rng,
        };
        engine.update_speeds();
        // Prime the accumulator so the very first update spawns an item.
        engine.time_since_spawn = engine.spawn_interval;
        engine
    }

    /// Couples the spawn cadence to a tempo. Clamped like the beat clock so
    /// the interval stays positive; non-finite values are discarded.
    pub fn set_bpm(&mut self, bpm: f32) {
        if !bpm.is_finite() {
            return;
        }
        self.spawn_interval = 60.0 / bpm.clamp(MIN_BPM, MAX_BPM);
        self.update_speeds();
    }

    /// Pins the spawn cadence to one second, ignoring tempo. Undone by the
    /// next `set_bpm` call.
    pub fn set_clock_mode(&mut self) {
        self.spawn_interval = 1.0;
        self.update_speeds();
    }

    fn update_speeds(&mut self) {
        let travel_distance = (DESPAWN_Z - SPAWN_Z).abs();
        self.zoom_speed = travel_distance / (self.spawn_interval * TRAVEL_BEATS);
    }

    /// Swaps the outline geometry on every slot, active or parked. Depth,
    /// colour and activity are untouched, so items already in flight keep
    /// travelling under the new shape.
    pub fn set_shape(&mut self, shape: ShapeType) {
        self.current_shape = shape;
        let geometry = self.shapes.get(shape);
        for item in &mut self.pool {
            item.geometry = geometry.clone();
        }
    }

    /// Future spawns draw from `palette`; items already in flight keep the
    /// colour they were assigned.
    pub fn set_palette(&mut self, palette: Arc<Palette>) {
        self.palette = palette;
    }

    /// Arms the transient scale emphasis that subsequent updates decay.
    pub fn apply_beat_kick(&mut self) {
        self.kick_scale = KICK_SCALE;
    }

    pub fn shape(&self) -> ShapeType {
        self.current_shape
    }

    pub fn palette(&self) -> &Arc<Palette> {
        &self.palette
    }

    pub fn spawn_interval(&self) -> f32 {
        self.spawn_interval
    }

    /// Current beat-kick multiplier; 1.0 whenever no kick is decaying.
    pub fn kick_scale(&self) -> f32 {
        self.kick_scale
    }

    /// Every pool slot in stable order. Parked slots are invisible.
    pub fn items(&self) -> &[TunnelItem] {
        &self.pool
    }

    pub fn active_count(&self) -> usize {
        self.pool.iter().filter(|item| item.active).count()
    }

    /// Returns every slot to the parked state and clears the spawn
    /// accumulator, colour rotation and kick.
    pub fn reset(&mut self) {
        self.time_since_spawn = 0.0;
        self.color_counter = 0;
        self.kick_scale = 1.0;
        for item in &mut self.pool {
            item.active = false;
            item.visible = false;
            item.z = SPAWN_Z;
        }
    }

    /// Advances the pool by `dt` seconds: decays the kick, spawns at most
    /// one item when the interval has elapsed, then moves the active items
    /// and recycles the ones that passed the camera.
    ///
    /// The single conditional spawn relies on the caller capping `dt` well
    /// below the spawn interval; an extreme delta under-spawns instead of
    /// bursting.
    pub fn update(&mut self, dt: f32) {
        if self.kick_scale > 1.0 {
            self.kick_scale = decay_kick(self.kick_scale, dt);
        }

        self.time_since_spawn += dt;
        if self.time_since_spawn >= self.spawn_interval {
            self.time_since_spawn -= self.spawn_interval;
            self.spawn();
        }

        for item in &mut self.pool {
            if !item.active {
                continue;
            }

            item.z += self.zoom_speed * dt;

            let t = travel_progress(item.z);
            item.base_scale = SCALE_AT_SPAWN + t * SCALE_GAIN;
            item.scale = item.base_scale * self.kick_scale;
            item.opacity = opacity_for(t);

            if item.z >= DESPAWN_Z {
                item.active = false;
                item.visible = false;
            }
        }
    }

    /// Activates the first parked slot: back to the spawn depth, next
    /// palette colour in round-robin order, fresh rotation jitter. When
    /// every slot is busy the spawn is dropped silently and the colour
    /// rotation does not move on.
    fn spawn(&mut self) {
        let item = match self.pool.iter_mut().find(|item| !item.active) {
            Some(item) => item,
            None => return,
        };

        item.active = true;
        item.visible = true;
        item.z = SPAWN_Z;
        item.base_scale = SCALE_AT_SPAWN;
        item.scale = SCALE_AT_SPAWN;
        item.opacity = 0.0;
        item.color_index = self.color_counter % self.palette.colors().len();
        item.color = self.palette.color(self.color_counter);
        item.rotation = self.rng.gen_range(-JITTER_RADIANS..JITTER_RADIANS);
        self.color_counter += 1;
    }
}

impl Default for TunnelEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalised travel progress for a depth: 0.0 at the spawn plane, 1.0 at
/// the despawn plane.
fn travel_progress(z: f32) -> f32 {
    ((z - SPAWN_Z) / (DESPAWN_Z - SPAWN_Z)).clamp(0.0, 1.0)
}

/// Three-segment opacity envelope over travel progress: a quick fade-in, a
/// long fully-opaque middle, and a fade-out close to the camera.
fn opacity_for(t: f32) -> f32 {
    if t < FADE_IN_END {
        t / FADE_IN_END
    } else if t > FADE_OUT_START {
        1.0 - (t - FADE_OUT_START) / (1.0 - FADE_OUT_START)
    } else {
        1.0
    }
}

/// One step of the linear kick decay, floored at the resting multiplier.
fn decay_kick(current: f32, dt: f32) -> f32 {
    (current - dt * KICK_DECAY_RATE).max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> TunnelEngine {
        TunnelEngine::with_seed(7)
    }

    fn test_palette() -> Arc<Palette> {
        Arc::new(
            Palette::new(
                "Test",
                vec![
                    Color::new(0x111111),
                    Color::new(0x222222),
                    Color::new(0x333333),
                ],
                Color::new(0x111111),
            )
            .unwrap(),
        )
    }

    #[test]
    fn pool_starts_parked() {
        let engine = engine();
        assert_eq!(engine.items().len(), POOL_SIZE);
        assert_eq!(engine.active_count(), 0);
        for item in engine.items() {
            assert!(!item.active);
            assert!(!item.visible);
            assert_eq!(item.z, SPAWN_Z);
            assert_eq!(item.geometry.shape(), ShapeType::Hexagon);
        }
        assert_eq!(engine.kick_scale(), 1.0);
        assert!((engine.spawn_interval() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn first_update_spawns_immediately() {
        let mut engine = engine();
        engine.update(0.0);
        assert_eq!(engine.active_count(), 1);

        let item = &engine.items()[0];
        assert!(item.visible);
        assert_eq!(item.z, SPAWN_Z);
        assert_eq!(item.base_scale, SCALE_AT_SPAWN);
        assert_eq!(item.scale, SCALE_AT_SPAWN);
        assert_eq!(item.opacity, 0.0);

        // The primed accumulator is spent; the next spawn waits a full
        // interval.
        engine.update(0.0);
        assert_eq!(engine.active_count(), 1);
    }

    #[test]
    fn spawns_follow_the_tempo_interval() {
        let mut engine = engine();
        engine.update(0.0);
        engine.update(0.25);
        assert_eq!(engine.active_count(), 1);
        engine.update(0.25);
        assert_eq!(engine.active_count(), 2);
    }

    #[test]
    fn set_bpm_rescales_interval_and_speed() {
        let mut engine = engine();
        engine.set_bpm(60.0);
        assert_eq!(engine.spawn_interval(), 1.0);
        assert_eq!(engine.zoom_speed, 13.0);

        engine.set_bpm(240.0);
        assert_eq!(engine.spawn_interval(), 0.25);
        assert_eq!(engine.zoom_speed, 52.0);
    }

    #[test]
    fn set_bpm_clamps_into_the_tempo_range() {
        let mut engine = engine();
        engine.set_bpm(1000.0);
        assert!((engine.spawn_interval() - 0.2).abs() < 1e-6);
        engine.set_bpm(5.0);
        assert_eq!(engine.spawn_interval(), 3.0);
    }

    #[test]
    fn non_finite_bpm_is_discarded() {
        let mut engine = engine();
        engine.set_bpm(f32::NAN);
        assert_eq!(engine.spawn_interval(), 0.5);
        engine.set_bpm(f32::NEG_INFINITY);
        assert_eq!(engine.spawn_interval(), 0.5);
        assert_eq!(engine.zoom_speed, 26.0);
    }

    #[test]
    fn clock_mode_pins_the_interval_until_the_next_tempo_change() {
        let mut engine = engine();
        engine.set_clock_mode();
        assert_eq!(engine.spawn_interval(), 1.0);
        assert_eq!(engine.zoom_speed, 13.0);

        engine.set_bpm(120.0);
        assert_eq!(engine.spawn_interval(), 0.5);
        assert_eq!(engine.zoom_speed, 26.0);
    }

    #[test]
    fn items_travel_and_recycle_at_the_despawn_plane() {
        let mut engine = engine();
        engine.update(0.0);

        // At 120 bpm the zoom speed is 26 units per second, so half-second
        // steps move an item 13 units.
        engine.update(0.5);
        assert_eq!(engine.items()[0].z, -37.0);
        assert!((engine.items()[0].base_scale - 1.75).abs() < 1e-5);
        assert_eq!(engine.items()[0].opacity, 1.0);

        engine.update(0.5);
        engine.update(0.5);
        assert_eq!(engine.items()[0].z, -11.0);

        engine.update(0.5);
        assert!(!engine.items()[0].active);
        assert!(!engine.items()[0].visible);

        // Slot 1 spawned during the same update that first moved slot 0, so
        // the two travelled together and recycled together.
        assert!(!engine.items()[1].active);
        assert_eq!(engine.active_count(), 3);
    }

    #[test]
    fn recycled_slot_is_reused_first() {
        let mut engine = engine();
        for _ in 0..3 {
            engine.spawn();
        }
        engine.pool[1].active = false;
        engine.pool[1].visible = false;

        engine.spawn();
        assert!(engine.pool[1].active);
        assert_eq!(engine.pool[1].color_index, 3);
        assert_eq!(engine.pool[1].color, Color::new(0x7b68ee));
    }

    #[test]
    fn pool_never_exceeds_capacity() {
        let mut engine = engine();
        for _ in 0..POOL_SIZE + 8 {
            engine.spawn();
        }
        assert_eq!(engine.active_count(), POOL_SIZE);
        // Dropped spawns do not advance the colour rotation.
        assert_eq!(engine.color_counter, POOL_SIZE);
    }

    #[test]
    fn colors_cycle_round_robin() {
        let mut engine = engine();
        engine.set_palette(test_palette());
        for _ in 0..4 {
            engine.spawn();
        }

        assert_eq!(engine.items()[0].color, Color::new(0x111111));
        assert_eq!(engine.items()[1].color, Color::new(0x222222));
        assert_eq!(engine.items()[2].color, Color::new(0x333333));
        assert_eq!(engine.items()[3].color, Color::new(0x111111));
        assert_eq!(engine.items()[3].color_index, 0);
    }

    #[test]
    fn palette_change_affects_future_spawns_only() {
        let mut engine = engine();
        engine.spawn();
        assert_eq!(engine.items()[0].color, Color::new(0xff00ff));

        engine.set_palette(test_palette());
        engine.spawn();

        // The colour rotation keeps counting across the swap.
        assert_eq!(engine.items()[0].color, Color::new(0xff00ff));
        assert_eq!(engine.items()[1].color, Color::new(0x222222));
    }

    #[test]
    fn beat_kick_scales_active_items_and_decays_linearly() {
        let mut engine = engine();
        engine.update(0.0);
        engine.apply_beat_kick();
        assert_eq!(engine.kick_scale(), KICK_SCALE);

        engine.update(0.0);
        let item = &engine.items()[0];
        assert!((item.scale - item.base_scale * KICK_SCALE).abs() < 1e-5);

        engine.update(0.025);
        assert!((engine.kick_scale() - 1.075).abs() < 1e-5);

        let mut last = engine.kick_scale();
        for _ in 0..10 {
            engine.update(0.01);
            let kick = engine.kick_scale();
            assert!(kick <= last);
            assert!(kick >= 1.0);
            last = kick;
        }

        engine.update(1.0);
        assert_eq!(engine.kick_scale(), 1.0);
        engine.update(0.1);
        assert_eq!(engine.kick_scale(), 1.0);
    }

    #[test]
    fn shape_swap_keeps_items_in_flight() {
        let mut engine = engine();
        engine.update(0.0);
        engine.update(0.5);
        let depth_before = engine.items()[0].z;
        let active_before = engine.active_count();

        engine.set_shape(ShapeType::Square);

        assert_eq!(engine.shape(), ShapeType::Square);
        assert_eq!(engine.items()[0].z, depth_before);
        assert_eq!(engine.active_count(), active_before);
        let expected = engine.shapes.get(ShapeType::Square);
        for item in engine.items() {
            assert!(Arc::ptr_eq(&item.geometry, &expected));
        }
    }

    #[test]
    fn reset_parks_everything_without_repriming() {
        let mut engine = engine();
        engine.set_palette(test_palette());
        engine.update(0.0);
        engine.apply_beat_kick();
        engine.update(0.25);

        engine.reset();
        assert_eq!(engine.active_count(), 0);
        assert_eq!(engine.kick_scale(), 1.0);
        for item in engine.items() {
            assert!(!item.visible);
            assert_eq!(item.z, SPAWN_Z);
        }

        // The next spawn waits a full interval instead of firing at once.
        engine.update(0.25);
        assert_eq!(engine.active_count(), 0);
        engine.update(0.25);
        assert_eq!(engine.active_count(), 1);
        // The colour rotation restarted as well.
        assert_eq!(engine.items()[0].color, Color::new(0x111111));
    }

    #[test]
    fn spawn_rotation_stays_within_the_jitter_band() {
        let mut engine = engine();
        for _ in 0..POOL_SIZE {
            engine.spawn();
        }
        for item in engine.items() {
            assert!(item.rotation.abs() <= JITTER_RADIANS);
        }
    }

    #[test]
    fn seeded_engines_are_deterministic() {
        let mut a = TunnelEngine::with_seed(42);
        let mut b = TunnelEngine::with_seed(42);
        for _ in 0..6 {
            a.spawn();
            b.spawn();
        }
        for (left, right) in a.items().iter().zip(b.items()) {
            assert_eq!(left.rotation, right.rotation);
            assert_eq!(left.color, right.color);
        }
    }

    #[test]
    fn opacity_envelope_has_three_segments() {
        assert!((opacity_for(0.0)).abs() < 1e-6);
        assert!((opacity_for(0.025) - 0.5).abs() < 1e-4);
        assert_eq!(opacity_for(0.05), 1.0);
        assert_eq!(opacity_for(0.5), 1.0);
        assert_eq!(opacity_for(0.92), 1.0);
        assert!((opacity_for(0.96) - 0.5).abs() < 1e-4);
        assert!(opacity_for(1.0).abs() < 1e-5);
    }

    #[test]
    fn travel_progress_is_clamped() {
        assert_eq!(travel_progress(SPAWN_Z), 0.0);
        assert_eq!(travel_progress(DESPAWN_Z), 1.0);
        assert_eq!(travel_progress(-24.0), 0.5);
        assert_eq!(travel_progress(-60.0), 0.0);
        assert_eq!(travel_progress(5.0), 1.0);
    }

    #[test]
    fn kick_decay_never_undershoots_the_floor() {
        assert_eq!(decay_kick(1.15, 1.0), 1.0);
        assert!((decay_kick(1.15, 0.01) - 1.12).abs() < 1e-5);
        assert_eq!(decay_kick(1.0, 0.5), 1.0);
    }
}
