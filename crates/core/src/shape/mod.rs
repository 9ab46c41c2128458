use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{FractalBeatError, Result};

/// Outline shape used for the items flying down the tunnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Triangle,
    Square,
    Hexagon,
}

impl ShapeType {
    pub const fn sides(&self) -> usize {
        match self {
            ShapeType::Triangle => 3,
            ShapeType::Square => 4,
            ShapeType::Hexagon => 6,
        }
    }

    /// Rotation of the first vertex: squares sit on a corner, the other
    /// shapes start from the vertical axis.
    fn angle_offset(&self) -> f32 {
        match self {
            ShapeType::Square => PI / 4.0,
            _ => -PI / 2.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ShapeType::Triangle => "triangle",
            ShapeType::Square => "square",
            ShapeType::Hexagon => "hexagon",
        }
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapeType {
    type Err = FractalBeatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "triangle" => Ok(ShapeType::Triangle),
            "square" => Ok(ShapeType::Square),
            "hexagon" => Ok(ShapeType::Hexagon),
            other => Err(FractalBeatError::msg(format!(
                "unknown shape `{other}` (expected triangle, square or hexagon)"
            ))),
        }
    }
}

/// Unit-radius outline ring for one shape.
///
/// The last point repeats the first so the ring is closed and can be drawn
/// as a single line strip.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeGeometry {
    shape: ShapeType,
    points: Vec<[f32; 2]>,
}

impl ShapeGeometry {
    pub fn new(shape: ShapeType) -> Self {
        let sides = shape.sides();
        let offset = shape.angle_offset();
        let mut points = Vec::with_capacity(sides + 1);
        for i in 0..=sides {
            let angle = offset + (i as f32 * 2.0 * PI) / sides as f32;
            points.push([angle.cos(), angle.sin()]);
        }
        Self { shape, points }
    }

    pub fn shape(&self) -> ShapeType {
        self.shape
    }

    pub fn points(&self) -> &[[f32; 2]] {
        &self.points
    }
}

/// One shared geometry per shape, built once at startup.
///
/// Switching shape swaps an `Arc` on every pool slot rather than
/// rebuilding vertices, so the change is allocation-free.
#[derive(Debug, Clone)]
pub struct ShapeLibrary {
    triangle: Arc<ShapeGeometry>,
    square: Arc<ShapeGeometry>,
    hexagon: Arc<ShapeGeometry>,
}

impl ShapeLibrary {
    pub fn new() -> Self {
        Self {
            triangle: Arc::new(ShapeGeometry::new(ShapeType::Triangle)),
            square: Arc::new(ShapeGeometry::new(ShapeType::Square)),
            hexagon: Arc::new(ShapeGeometry::new(ShapeType::Hexagon)),
        }
    }

    pub fn get(&self, shape: ShapeType) -> Arc<ShapeGeometry> {
        match shape {
            ShapeType::Triangle => self.triangle.clone(),
            ShapeType::Square => self.square.clone(),
            ShapeType::Hexagon => self.hexagon.clone(),
        }
    }
}

impl Default for ShapeLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_counts() {
        assert_eq!(ShapeType::Triangle.sides(), 3);
        assert_eq!(ShapeType::Square.sides(), 4);
        assert_eq!(ShapeType::Hexagon.sides(), 6);
    }

    #[test]
    fn geometry_ring_is_closed() {
        for shape in [ShapeType::Triangle, ShapeType::Square, ShapeType::Hexagon] {
            let geometry = ShapeGeometry::new(shape);
            let points = geometry.points();
            assert_eq!(points.len(), shape.sides() + 1);

            let first = points[0];
            let last = points[points.len() - 1];
            assert!((first[0] - last[0]).abs() < 1e-5);
            assert!((first[1] - last[1]).abs() < 1e-5);
        }
    }

    #[test]
    fn vertices_sit_on_the_unit_circle() {
        let geometry = ShapeGeometry::new(ShapeType::Hexagon);
        for point in geometry.points() {
            let radius = (point[0] * point[0] + point[1] * point[1]).sqrt();
            assert!((radius - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn square_sits_on_a_corner() {
        let geometry = ShapeGeometry::new(ShapeType::Square);
        let first = geometry.points()[0];
        let expected = (PI / 4.0).cos();
        assert!((first[0] - expected).abs() < 1e-5);
        assert!((first[1] - expected).abs() < 1e-5);
    }

    #[test]
    fn triangle_first_vertex_is_on_the_vertical_axis() {
        let geometry = ShapeGeometry::new(ShapeType::Triangle);
        let first = geometry.points()[0];
        assert!(first[0].abs() < 1e-5);
        assert!((first[1] + 1.0).abs() < 1e-5);
    }

    #[test]
    fn names_round_trip() {
        for shape in [ShapeType::Triangle, ShapeType::Square, ShapeType::Hexagon] {
            let parsed: ShapeType = shape.to_string().parse().unwrap();
            assert_eq!(parsed, shape);
        }
        assert_eq!("HEXAGON".parse::<ShapeType>().unwrap(), ShapeType::Hexagon);
        assert!("pentagon".parse::<ShapeType>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&ShapeType::Hexagon).unwrap();
        assert_eq!(json, "\"hexagon\"");
        let parsed: ShapeType = serde_json::from_str("\"square\"").unwrap();
        assert_eq!(parsed, ShapeType::Square);
    }

    #[test]
    fn library_shares_one_geometry_per_shape() {
        let library = ShapeLibrary::new();
        let a = library.get(ShapeType::Square);
        let b = library.get(ShapeType::Square);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.shape(), ShapeType::Square);
        assert_eq!(library.get(ShapeType::Triangle).shape(), ShapeType::Triangle);
    }
}
