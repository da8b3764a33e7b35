//! Region values and their URL segment encoding.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::polyline;
use crate::{RegionError, RegionResult};

/// Characters `encodeURIComponent` leaves alone; everything else in a
/// polyline payload is escaped.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub const BBOX_DECIMALS: usize = 5;
pub const MIN_POLYGON_POINTS: usize = 3;

/// Tasking-manager project id. URL text that is not a positive integer is
/// kept as an unparseable id rather than rejected; it renders as `NaN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(Option<u64>);

impl ProjectId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(if id == 0 { None } else { Some(id) })
    }

    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self(text.trim().parse().ok().filter(|id| *id > 0))
    }

    #[must_use]
    pub const fn get(self) -> Option<u64> {
        self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(id) => write!(f, "{id}"),
            None => f.write_str("NaN"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct GistId(String);

impl GistId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The user's area of interest.
///
/// `bbox` and `polygon` carry their geometry inline; `hot` and `gist` are
/// references resolved over the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Region {
    /// `[min_lon, min_lat, max_lon, max_lat]`
    Bbox { coords: [f64; 4] },
    /// Open ring of `[lon, lat]` points.
    Polygon { coords: Vec<[f64; 2]> },
    Hot { id: ProjectId },
    Gist { id: GistId },
}

impl Region {
    #[must_use]
    pub const fn bbox(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self::Bbox {
            coords: [min_lon, min_lat, max_lon, max_lat],
        }
    }

    pub fn polygon(coords: Vec<[f64; 2]>) -> RegionResult<Self> {
        check_polygon(&coords)?;
        Ok(Self::Polygon { coords })
    }

    #[must_use]
    pub const fn hot(id: u64) -> Self {
        Self::Hot {
            id: ProjectId::new(id),
        }
    }

    pub fn gist(id: impl Into<String>) -> Self {
        Self::Gist {
            id: GistId::new(id),
        }
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bbox { .. } => "bbox",
            Self::Polygon { .. } => "polygon",
            Self::Hot { .. } => "hot",
            Self::Gist { .. } => "gist",
        }
    }
}

pub(crate) fn check_polygon(coords: &[[f64; 2]]) -> RegionResult<()> {
    if coords.len() < MIN_POLYGON_POINTS {
        return Err(RegionError::payload(
            "polygon",
            format!(
                "needs at least {MIN_POLYGON_POINTS} points, got {}",
                coords.len()
            ),
        ));
    }
    Ok(())
}

/// Encodes a region as `<type>:<payload>`.
///
/// `bbox` bounds keep five decimals and `polygon` points go through the
/// polyline codec, so neither round-trips exactly. Fails only for
/// polygons with non-finite points or points outside `[-180, 180]`.
pub fn encode_region(region: &Region) -> RegionResult<String> {
    let payload = match region {
        Region::Bbox { coords } => coords
            .iter()
            .map(|c| format!("{:.*}", BBOX_DECIMALS, c))
            .collect::<Vec<_>>()
            .join(","),
        Region::Polygon { coords } => {
            let encoded = polyline::encode(coords)
                .map_err(|e| RegionError::payload("polygon", e.to_string()))?;
            utf8_percent_encode(&encoded, URI_COMPONENT).to_string()
        }
        Region::Hot { id } => id.to_string(),
        Region::Gist { id } => id.as_str().to_string(),
    };
    Ok(format!("{}:{payload}", region.type_name()))
}

/// Decodes a region segment. An empty fragment means "no region".
///
/// Unparseable `bbox` numbers become `NaN` and unparseable `hot` ids become
/// an unparseable [`ProjectId`]; both are left for the resolver to reject.
pub fn decode_region(fragment: &str) -> RegionResult<Option<Region>> {
    if fragment.is_empty() {
        return Ok(None);
    }

    let (tag, payload) = fragment.split_once(':').unwrap_or((fragment, ""));

    let region = match tag {
        "bbox" => {
            let values: Vec<f64> = payload.split(',').map(lenient_number).collect();
            let coords: [f64; 4] = values.try_into().map_err(|v: Vec<f64>| {
                RegionError::payload("bbox", format!("expected 4 numbers, got {}", v.len()))
            })?;
            Region::Bbox { coords }
        }
        "polygon" => {
            let encoded = percent_decode_str(payload)
                .decode_utf8()
                .map_err(|e| RegionError::payload("polygon", e.to_string()))?;
            let coords = polyline::decode(&encoded)
                .map_err(|e| RegionError::payload("polygon", e.to_string()))?;
            check_polygon(&coords)?;
            Region::Polygon { coords }
        }
        "hot" => Region::Hot {
            id: ProjectId::parse(payload),
        },
        "gist" => Region::Gist {
            id: GistId::new(payload),
        },
        other => return Err(RegionError::InvalidRegionType(other.to_string())),
    };

    Ok(Some(region))
}

fn lenient_number(text: &str) -> f64 {
    text.trim().parse().unwrap_or(f64::NAN)
}
