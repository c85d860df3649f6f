//! Encoded polyline codec for route geometries.
//!
//! Routing APIs ship paths as Google encoded polylines: each coordinate is
//! a pair of zig-zag signed deltas from the previous point, scaled by 1e5,
//! split into 5-bit chunks and offset into printable ASCII by 63.
//! Decoding happens once, at the API boundary; everything downstream
//! works on [`Polyline`] points.

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, PlannerResult, PolylineFault};
use crate::haversine::haversine_km;
use crate::model::Coordinate;

/// Fixed-point precision of the encoding (five decimal places).
const PRECISION: f64 = 1e5;

const CHUNK_OFFSET: u8 = 63;
const CONTINUATION_BIT: i64 = 0x20;
const CHUNK_MASK: i64 = 0x1f;

/// Seven 5-bit chunks hold any 32-bit delta.
const MAX_SHIFT: u32 = 30;

/// A polyline representing a route geometry as decoded coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Coordinate>,
}

impl Polyline {
    /// Creates a new Polyline from decoded coordinate points.
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    /// Decodes an encoded polyline string.
    ///
    /// An empty string yields an empty polyline. Input that ends inside a
    /// chunk, contains bytes outside `'?'..='~'`, or carries a latitude
    /// without its longitude fails with [`PlannerError::MalformedPolyline`].
    pub fn decode(encoded: &str) -> PlannerResult<Self> {
        let bytes = encoded.as_bytes();
        let mut cursor = 0;
        let mut lat: i64 = 0;
        let mut lng: i64 = 0;
        let mut points = Vec::new();

        while cursor < bytes.len() {
            lat += next_delta(bytes, &mut cursor)?;
            if cursor >= bytes.len() {
                return Err(PlannerError::MalformedPolyline {
                    position: cursor,
                    reason: PolylineFault::MissingLongitude,
                });
            }
            lng += next_delta(bytes, &mut cursor)?;

            points.push(Coordinate::new(lat as f64 / PRECISION, lng as f64 / PRECISION));
        }

        Ok(Self { points })
    }

    /// Encodes the points back into the compact string form.
    ///
    /// Latitudes are clamped to `-90..=90` and longitudes to `-180..=180`
    /// before scaling; a NaN component encodes as 0. That keeps every
    /// delta well inside the seven-chunk range the decoder accepts.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(self.points.len() * 8);
        let mut prev_lat: i64 = 0;
        let mut prev_lng: i64 = 0;

        for point in &self.points {
            let lat = fixed_point(point.latitude, 90.0);
            let lng = fixed_point(point.longitude, 180.0);
            push_delta(&mut out, lat - prev_lat);
            push_delta(&mut out, lng - prev_lng);
            prev_lat = lat;
            prev_lng = lng;
        }

        out
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// Consumes the polyline and returns the owned coordinate points.
    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The point halfway along the sequence, by index.
    pub fn midpoint(&self) -> Option<Coordinate> {
        self.points.get(self.points.len() / 2).copied()
    }

    /// Sum of great-circle segment lengths in kilometers.
    pub fn length_km(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| haversine_km(pair[0], pair[1]))
            .sum()
    }
}

fn fixed_point(degrees: f64, limit: f64) -> i64 {
    // `as` maps NaN to 0.
    (degrees.clamp(-limit, limit) * PRECISION).round() as i64
}

/// Reads one zig-zag encoded value starting at `cursor`.
fn next_delta(bytes: &[u8], cursor: &mut usize) -> PlannerResult<i64> {
    let mut result: i64 = 0;
    let mut shift: u32 = 0;

    loop {
        let Some(&byte) = bytes.get(*cursor) else {
            return Err(PlannerError::MalformedPolyline {
                position: *cursor,
                reason: PolylineFault::Truncated,
            });
        };
        if !(CHUNK_OFFSET..=b'~').contains(&byte) {
            return Err(PlannerError::MalformedPolyline {
                position: *cursor,
                reason: PolylineFault::InvalidCharacter,
            });
        }
        if shift > MAX_SHIFT {
            return Err(PlannerError::MalformedPolyline {
                position: *cursor,
                reason: PolylineFault::Overlong,
            });
        }

        let chunk = i64::from(byte - CHUNK_OFFSET);
        result |= (chunk & CHUNK_MASK) << shift;
        shift += 5;
        *cursor += 1;

        if chunk & CONTINUATION_BIT == 0 {
            break;
        }
    }

    Ok(if result & 1 == 1 { !(result >> 1) } else { result >> 1 })
}

fn push_delta(out: &mut String, delta: i64) {
    let mut value = if delta < 0 { !(delta << 1) } else { delta << 1 };

    while value >= CONTINUATION_BIT {
        let chunk = (CONTINUATION_BIT | (value & CHUNK_MASK)) as u8 + CHUNK_OFFSET;
        out.push(chunk as char);
        value >>= 5;
    }
    out.push((value as u8 + CHUNK_OFFSET) as char);
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    fn fixture_points() -> Vec<Coordinate> {
        vec![
            Coordinate::new(38.5, -120.2),
            Coordinate::new(40.7, -120.95),
            Coordinate::new(43.252, -126.453),
        ]
    }

    fn assert_close(actual: &[Coordinate], expected: &[Coordinate]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a.latitude - e.latitude).abs() < 1e-5, "{:?} vs {:?}", a, e);
            assert!((a.longitude - e.longitude).abs() < 1e-5, "{:?} vs {:?}", a, e);
        }
    }

    #[test]
    fn test_decode_known_fixture() {
        let polyline = Polyline::decode(FIXTURE).unwrap();
        assert_close(polyline.points(), &fixture_points());
    }

    #[test]
    fn test_encode_known_fixture() {
        let polyline = Polyline::new(fixture_points());
        assert_eq!(polyline.encode(), FIXTURE);
    }

    #[test]
    fn test_decode_empty() {
        let polyline = Polyline::decode("").unwrap();
        assert!(polyline.is_empty());
        assert_eq!(Polyline::new(vec![]).encode(), "");
    }

    #[test]
    fn test_decode_single_point_at_origin() {
        let polyline = Polyline::decode("??").unwrap();
        assert_eq!(polyline.points(), &[Coordinate::new(0.0, 0.0)]);
    }

    #[test]
    fn test_decode_truncated_chunk() {
        // Drop the final byte: the longitude of the last point never terminates.
        let input = &FIXTURE[..FIXTURE.len() - 1];
        let err = Polyline::decode(input).unwrap_err();
        assert!(matches!(
            err,
            PlannerError::MalformedPolyline {
                reason: PolylineFault::Truncated,
                ..
            }
        ));
    }

    #[test]
    fn test_decode_missing_longitude() {
        let err = Polyline::decode("_p~iF").unwrap_err();
        assert!(matches!(
            err,
            PlannerError::MalformedPolyline {
                position: 5,
                reason: PolylineFault::MissingLongitude,
            }
        ));
    }

    #[test]
    fn test_decode_invalid_character() {
        let err = Polyline::decode("_p~iF ps|U").unwrap_err();
        assert!(matches!(
            err,
            PlannerError::MalformedPolyline {
                position: 5,
                reason: PolylineFault::InvalidCharacter,
            }
        ));
    }

    #[test]
    fn test_decode_overlong_value() {
        let err = Polyline::decode("~~~~~~~~~~").unwrap_err();
        assert!(matches!(
            err,
            PlannerError::MalformedPolyline {
                reason: PolylineFault::Overlong,
                ..
            }
        ));
    }

    #[test]
    fn test_encode_clamps_out_of_range_points() {
        let polyline = Polyline::new(vec![
            Coordinate::new(f64::INFINITY, f64::NEG_INFINITY),
            Coordinate::new(f64::NAN, 1e300),
            Coordinate::new(-1e300, f64::NAN),
        ]);

        let decoded = Polyline::decode(&polyline.encode()).unwrap();
        assert_eq!(
            decoded.points(),
            &[
                Coordinate::new(90.0, -180.0),
                Coordinate::new(0.0, 180.0),
                Coordinate::new(-90.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_midpoint() {
        let polyline = Polyline::new(fixture_points());
        assert_eq!(polyline.midpoint(), Some(Coordinate::new(40.7, -120.95)));
        assert_eq!(Polyline::default().midpoint(), None);
    }

    #[test]
    fn test_length_km() {
        let polyline = Polyline::new(vec![
            Coordinate::new(37.78825, -122.4324),
            Coordinate::new(37.79825, -122.4324),
            Coordinate::new(37.80825, -122.4324),
        ]);
        let length = polyline.length_km();
        assert!((length - 2.22).abs() < 0.05, "got {}", length);
        assert_eq!(Polyline::new(vec![Coordinate::new(1.0, 1.0)]).length_km(), 0.0);
    }

    #[test]
    fn test_into_points() {
        let points = fixture_points();
        let polyline = Polyline::new(points.clone());
        assert_eq!(polyline.into_points(), points);
    }
}
