//! Encoded polyline codec (precision 5).
//!
//! Each point is written as two zig-zag, 5-bit-chunked deltas against the
//! previous point. The first component of a pair is written first, so
//! `[lon, lat]` input decodes back to `[lon, lat]`.

use thiserror::Error;

pub const PRECISION: u32 = 5;
/// Largest absolute coordinate the codec accepts in either direction.
pub const MAX_COORDINATE: f64 = 180.0;

const FACTOR: f64 = 100_000.0;
const CHUNK_BITS: u32 = 5;
const CHUNK_MASK: i64 = 0x1f;
const CONTINUATION: i64 = 0x20;
const CHAR_OFFSET: i64 = 63;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolylineError {
    #[error("invalid character {ch:?} at byte {index}")]
    InvalidCharacter { ch: char, index: usize },

    #[error("input ends in the middle of a value")]
    Truncated,

    #[error("odd number of values: last point has no second component")]
    DanglingComponent,

    #[error("value at byte {index} overflows")]
    Overflow { index: usize },

    #[error("coordinate {value} cannot be encoded")]
    NonFinite { value: f64 },

    #[error("coordinate {value} is outside [-180, 180]")]
    OutOfRange { value: f64 },
}

/// Rounds half away from zero, matching the reference encoder.
fn quantize(value: f64) -> Result<i64, PolylineError> {
    if !value.is_finite() {
        return Err(PolylineError::NonFinite { value });
    }
    if value.abs() > MAX_COORDINATE {
        return Err(PolylineError::OutOfRange { value });
    }
    #[allow(clippy::cast_possible_truncation)]
    let scaled = (value.abs() * FACTOR + 0.5).floor() as i64;
    Ok(if value >= 0.0 { scaled } else { -scaled })
}

fn push_delta(out: &mut String, delta: i64) {
    let mut value = if delta < 0 { !(delta << 1) } else { delta << 1 };
    while value >= CONTINUATION {
        push_char(out, (CONTINUATION | (value & CHUNK_MASK)) + CHAR_OFFSET);
        value >>= CHUNK_BITS;
    }
    push_char(out, value + CHAR_OFFSET);
}

fn push_char(out: &mut String, code: i64) {
    // Every emitted code is in 63..=126.
    if let Some(ch) = u8::try_from(code).ok().map(char::from) {
        out.push(ch);
    }
}

pub fn encode(points: &[[f64; 2]]) -> Result<String, PolylineError> {
    let mut out = String::with_capacity(points.len() * 8);
    let mut previous = [0_i64; 2];

    for point in points {
        let current = [quantize(point[0])?, quantize(point[1])?];
        push_delta(&mut out, current[0] - previous[0]);
        push_delta(&mut out, current[1] - previous[1]);
        previous = current;
    }

    Ok(out)
}

struct Reader<'a> {
    bytes: &'a [u8],
    index: usize,
}

impl Reader<'_> {
    fn is_done(&self) -> bool {
        self.index >= self.bytes.len()
    }

    fn next_delta(&mut self) -> Result<i64, PolylineError> {
        let mut result: i64 = 0;
        let mut shift: u32 = 0;

        loop {
            let Some(&byte) = self.bytes.get(self.index) else {
                return Err(PolylineError::Truncated);
            };
            let chunk = i64::from(byte) - CHAR_OFFSET;
            if !(0..=(CONTINUATION | CHUNK_MASK)).contains(&chunk) {
                return Err(PolylineError::InvalidCharacter {
                    ch: char::from(byte),
                    index: self.index,
                });
            }
            if shift > 60 {
                return Err(PolylineError::Overflow { index: self.index });
            }
            self.index += 1;

            result |= (chunk & CHUNK_MASK) << shift;
            shift += CHUNK_BITS;

            if chunk < CONTINUATION {
                break;
            }
        }

        Ok(if result & 1 == 1 {
            !(result >> 1)
        } else {
            result >> 1
        })
    }
}

pub fn decode(encoded: &str) -> Result<Vec<[f64; 2]>, PolylineError> {
    let mut reader = Reader {
        bytes: encoded.as_bytes(),
        index: 0,
    };
    let mut points = Vec::new();
    let mut current = [0_i64; 2];

    while !reader.is_done() {
        for (component, value) in current.iter_mut().enumerate() {
            if component == 1 && reader.is_done() {
                return Err(PolylineError::DanglingComponent);
            }
            let index = reader.index;
            let delta = reader.next_delta()?;
            *value = value
                .checked_add(delta)
                .ok_or(PolylineError::Overflow { index })?;
        }

        #[allow(clippy::cast_precision_loss)]
        let point = [current[0] as f64 / FACTOR, current[1] as f64 / FACTOR];
        if let Some(&value) = point.iter().find(|v| v.abs() > MAX_COORDINATE) {
            return Err(PolylineError::OutOfRange { value });
        }
        points.push(point);
    }

    Ok(points)
}
