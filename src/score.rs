use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Center of the target face in the normalized 0-100 coordinate square.
pub const FACE_CENTER: f64 = 50.0;

/// Scored value of a single arrow.
///
/// `InnerTen` is the tie-break ring ("X"): worth the same ten points as the
/// outer ten, ranked above it when totals are otherwise equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotValue {
    InnerTen,
    Ring(u8),
    Miss,
}

impl ShotValue {
    /// Points contributed to end and session totals.
    pub fn points(&self) -> u32 {
        match self {
            ShotValue::InnerTen => 10,
            ShotValue::Ring(n) => u32::from(*n),
            ShotValue::Miss => 0,
        }
    }

    pub fn is_inner_ten(&self) -> bool {
        matches!(self, ShotValue::InnerTen)
    }

    pub fn is_miss(&self) -> bool {
        matches!(self, ShotValue::Miss)
    }
}

impl fmt::Display for ShotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShotValue::InnerTen => f.write_str("X"),
            ShotValue::Miss => f.write_str("M"),
            ShotValue::Ring(n) => write!(f, "{}", n),
        }
    }
}

// Stored snapshots carry ring values as `number | "X" | "M"`.
impl Serialize for ShotValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ShotValue::InnerTen => serializer.serialize_str("X"),
            ShotValue::Miss => serializer.serialize_str("M"),
            ShotValue::Ring(n) => serializer.serialize_u8(*n),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireValue {
    Number(u8),
    Label(String),
}

impl<'de> Deserialize<'de> for ShotValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match WireValue::deserialize(deserializer)? {
            WireValue::Number(n) if n <= 10 => Ok(ShotValue::Ring(n)),
            WireValue::Number(n) => Err(de::Error::custom(format!(
                "ring value {} out of range",
                n
            ))),
            WireValue::Label(s) => match s.as_str() {
                "X" => Ok(ShotValue::InnerTen),
                "M" => Ok(ShotValue::Miss),
                other => Err(de::Error::custom(format!(
                    "unknown ring label {:?}",
                    other
                ))),
            },
        }
    }
}

/// Target-face geometry in the normalized coordinate square.
///
/// The arrow-shaft tolerance and inner-ten radius are product-chosen
/// sporting constants, carried as configuration rather than derived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetGeometry {
    /// Radius of the outermost scoring ring.
    pub face_radius: f64,
    /// Radial width of one scoring ring.
    pub ring_width: f64,
    /// Arrow-shaft allowance subtracted from the raw distance.
    pub arrow_radius: f64,
    /// Effective distance below which a ten counts as an inner ten.
    pub inner_ten_radius: f64,
}

impl Default for TargetGeometry {
    fn default() -> Self {
        Self {
            face_radius: 50.0,
            ring_width: 5.0,
            arrow_radius: 0.8,
            inner_ten_radius: 2.5,
        }
    }
}

impl TargetGeometry {
    /// Resolve a normalized coordinate into a ring value.
    ///
    /// Scoring depends only on the Euclidean distance from the face
    /// center. A shot exactly on the line between two rings takes the
    /// outer (lower-scoring) ring; a raw distance beyond the face radius
    /// plus the shaft tolerance is a miss.
    pub fn resolve(&self, x: f64, y: f64) -> ShotValue {
        let dx = x - FACE_CENTER;
        let dy = y - FACE_CENTER;
        let dist = (dx * dx + dy * dy).sqrt();

        if dist > self.face_radius + self.arrow_radius {
            return ShotValue::Miss;
        }

        let effective = (dist - self.arrow_radius).max(0.0);
        let ring = (10.0 - (effective / self.ring_width).floor()).clamp(0.0, 10.0) as u8;

        if ring == 0 {
            ShotValue::Miss
        } else if ring == 10 && effective < self.inner_ten_radius {
            ShotValue::InnerTen
        } else {
            ShotValue::Ring(ring)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_is_inner_ten() {
        let geo = TargetGeometry::default();
        assert_eq!(geo.resolve(50.0, 50.0), ShotValue::InnerTen);
    }

    #[test]
    fn within_tolerance_of_center_is_inner_ten() {
        let geo = TargetGeometry::default();
        // Raw distance below the shaft tolerance collapses to effective 0.
        assert_eq!(geo.resolve(50.5, 50.3), ShotValue::InnerTen);
        assert_eq!(geo.resolve(49.4, 50.0), ShotValue::InnerTen);
    }

    #[test]
    fn beyond_face_plus_tolerance_is_miss() {
        let geo = TargetGeometry::default();
        assert_eq!(geo.resolve(0.0, 0.0), ShotValue::Miss);
        assert_eq!(geo.resolve(95.0, 95.0), ShotValue::Miss);
        // Just inside the outer edge still scores.
        assert_eq!(geo.resolve(0.0, 50.0), ShotValue::Ring(1));
    }

    #[test]
    fn scoring_is_rotationally_symmetric() {
        let geo = TargetGeometry::default();
        let radius = 23.0;
        let reference = geo.resolve(50.0 + radius, 50.0);
        for deg in [30.0_f64, 77.0, 145.0, 211.0, 302.0] {
            let rad = deg.to_radians();
            let x = 50.0 + radius * rad.cos();
            let y = 50.0 + radius * rad.sin();
            assert_eq!(geo.resolve(x, y), reference, "angle {} deg", deg);
        }
    }

    #[test]
    fn ring_boundary_scores_outer_ring() {
        // Zero tolerance makes the boundary distances exact in f64.
        let geo = TargetGeometry {
            arrow_radius: 0.0,
            ..TargetGeometry::default()
        };
        // 30.0 is the line between ring 5 and ring 4.
        assert_eq!(geo.resolve(80.0, 50.0), ShotValue::Ring(4));
        assert_eq!(geo.resolve(79.9, 50.0), ShotValue::Ring(5));
        // 5.0 is the line between the ten and the nine.
        assert_eq!(geo.resolve(55.0, 50.0), ShotValue::Ring(9));
        assert_eq!(geo.resolve(54.9, 50.0), ShotValue::Ring(10));
    }

    #[test]
    fn inner_ten_boundary_is_exclusive() {
        let geo = TargetGeometry {
            arrow_radius: 0.0,
            ..TargetGeometry::default()
        };
        assert_eq!(geo.resolve(52.5, 50.0), ShotValue::Ring(10));
        assert_eq!(geo.resolve(52.4, 50.0), ShotValue::InnerTen);
    }

    #[test]
    fn outermost_scoring_edge_is_reported_as_miss() {
        let geo = TargetGeometry {
            arrow_radius: 0.0,
            ..TargetGeometry::default()
        };
        // Exactly on the outer edge: the tie goes to the lower side,
        // which off the last ring is a miss.
        assert_eq!(geo.resolve(100.0, 50.0), ShotValue::Miss);
    }

    #[test]
    fn mid_ring_values_match_expected_bands() {
        let geo = TargetGeometry::default();
        // Raw 12.3 -> effective 11.5 -> third band -> ring 8.
        assert_eq!(geo.resolve(50.0 + 12.3, 50.0), ShotValue::Ring(8));
        // Raw 47.0 -> effective 46.2 -> ring 1.
        assert_eq!(geo.resolve(50.0, 50.0 + 47.0), ShotValue::Ring(1));
        // Raw 26.0 -> effective 25.2 -> ring 5.
        assert_eq!(geo.resolve(50.0 - 26.0, 50.0), ShotValue::Ring(5));
    }

    #[test]
    fn points_count_inner_ten_as_ten_and_miss_as_zero() {
        assert_eq!(ShotValue::InnerTen.points(), 10);
        assert_eq!(ShotValue::Ring(7).points(), 7);
        assert_eq!(ShotValue::Miss.points(), 0);
    }

    #[test]
    fn wire_form_round_trips() {
        for value in [ShotValue::InnerTen, ShotValue::Miss, ShotValue::Ring(8)] {
            let json = serde_json::to_string(&value).unwrap();
            let back: ShotValue = serde_json::from_str(&json).unwrap();
            assert_eq!(back, value);
        }
        assert_eq!(serde_json::to_string(&ShotValue::InnerTen).unwrap(), "\"X\"");
        assert_eq!(serde_json::to_string(&ShotValue::Miss).unwrap(), "\"M\"");
        assert_eq!(serde_json::to_string(&ShotValue::Ring(9)).unwrap(), "9");
        assert!(serde_json::from_str::<ShotValue>("11").is_err());
        assert!(serde_json::from_str::<ShotValue>("\"Z\"").is_err());
    }
}
