//! Region resolution.
//!
//! Inline regions are turned into features directly. References take one
//! or two GETs through the `http` capability, driven by the app:
//!
//! - `hot`: the project's area of interest.
//! - `gist`: the gist manifest, then the raw contents of its geometry file.
//!   The second request only starts once the first succeeded.
//!
//! [`start`] says what to do for a region and [`advance`] consumes each
//! reply. Nothing is cached or retried, and a resolution in flight is never
//! cancelled; the app drops replies for a region that is no longer current.

use geojson::Feature;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, instrument, warn};

use crate::config::{check_http_url, Settings};
use crate::geometry::{bbox_feature, flip_feature, normalize_json, polygon_feature};
use crate::region::Region;
use crate::{ReferenceKind, RegionError, RegionResult};

/// Gist files tried in order.
pub const GIST_FILE_PREFERENCE: [&str; 2] = ["polygon.geojson", "map.geojson"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateOrder {
    #[default]
    LonLat,
    LatLon,
}

/// A feature together with the region it was resolved for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRegion {
    pub region: Region,
    pub feature: Feature,
}

impl ResolvedRegion {
    #[must_use]
    pub fn is_current(&self, current: Option<&Region>) -> bool {
        current == Some(&self.region)
    }
}

/// Serializable summary of a failed resolution for the view model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveFailure {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl From<&RegionError> for ResolveFailure {
    fn from(err: &RegionError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            retryable: err.kind().is_retryable(),
        }
    }
}

/// Which request a reply answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStage {
    ProjectAoi,
    GistManifest,
    GistFile,
}

impl FetchStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProjectAoi => "project AOI",
            Self::GistManifest => "gist manifest",
            Self::GistFile => "gist file",
        }
    }

    /// Stages where a 404 means the referenced project or gist is unknown.
    const fn is_lookup(self) -> bool {
        matches!(self, Self::ProjectAoi | Self::GistManifest)
    }
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP outcome reduced to what resolution needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchReply {
    Response { status: u16, body: Vec<u8> },
    Failed { reason: String },
}

impl FetchReply {
    #[must_use]
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::Response {
            status: 200,
            body: body.into(),
        }
    }
}

impl From<crux_http::Result<crux_http::Response<Vec<u8>>>> for FetchReply {
    fn from(result: crux_http::Result<crux_http::Response<Vec<u8>>>) -> Self {
        match result {
            Ok(mut response) => Self::Response {
                status: response.status().into(),
                body: response.take_body().unwrap_or_default(),
            },
            Err(crux_http::Error::Http(err)) => Self::Response {
                status: err.code.into(),
                body: Vec::new(),
            },
            Err(err) => Self::Failed {
                reason: err.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Done(Feature),
    Fetch { url: String, stage: FetchStage },
}

#[derive(Debug, Deserialize)]
struct GistManifest {
    #[serde(default)]
    files: HashMap<String, GistFile>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    raw_url: String,
}

impl GistManifest {
    fn geometry_file(&self) -> Option<(&str, &GistFile)> {
        GIST_FILE_PREFERENCE
            .iter()
            .find_map(|name| self.files.get(*name).map(|file| (*name, file)))
    }
}

/// First step for `region`: a finished feature for inline regions, the
/// first request for references. Invalid payloads fail before any fetch.
pub fn start(region: &Region, settings: &Settings) -> RegionResult<Step> {
    match region {
        Region::Bbox { coords } => bbox_feature(*coords).map(Step::Done),
        Region::Polygon { coords } => polygon_feature(coords).map(Step::Done),
        Region::Hot { id } => {
            let project = id
                .get()
                .ok_or_else(|| RegionError::payload("hot", "project id is not a positive integer"))?;
            Ok(Step::Fetch {
                url: settings.project_aoi_url(project),
                stage: FetchStage::ProjectAoi,
            })
        }
        Region::Gist { id } => Ok(Step::Fetch {
            url: settings.gist_url(id.as_str()),
            stage: FetchStage::GistManifest,
        }),
    }
}

/// Consumes the reply to the `stage` request made for `region`.
#[instrument(skip(region, reply), fields(region_type = region.type_name()))]
pub fn advance(region: &Region, stage: FetchStage, reply: FetchReply) -> RegionResult<Step> {
    let body = accept(region, stage, reply)?;

    match stage {
        FetchStage::ProjectAoi | FetchStage::GistFile => {
            normalize_json(parse_body(stage, &body)?).map(Step::Done)
        }
        FetchStage::GistManifest => {
            let manifest: GistManifest = parse_body(stage, &body)?;
            let (name, file) = manifest.geometry_file().ok_or_else(|| {
                warn!(files = manifest.files.len(), "gist has no geometry file");
                RegionError::IncompatibleReference {
                    id: reference(region).map_or_else(|| region.type_name().to_string(), |(_, id)| id),
                }
            })?;

            check_http_url(&file.raw_url).map_err(|reason| {
                RegionError::transport(None, format!("invalid raw_url for {name}: {reason}"))
            })?;
            debug!(file = name, "fetching gist geometry");

            Ok(Step::Fetch {
                url: file.raw_url.clone(),
                stage: FetchStage::GistFile,
            })
        }
    }
}

#[must_use]
pub fn finish(feature: Feature, order: CoordinateOrder) -> Feature {
    match order {
        CoordinateOrder::LonLat => feature,
        CoordinateOrder::LatLon => flip_feature(feature),
    }
}

/// Body of a 2xx reply. A 404 on a lookup is an unknown reference; any
/// other failure is a transport error.
fn accept(region: &Region, stage: FetchStage, reply: FetchReply) -> RegionResult<Vec<u8>> {
    let (status, body) = match reply {
        FetchReply::Failed { reason } => {
            return Err(RegionError::transport(None, format!("{stage}: {reason}")));
        }
        FetchReply::Response { status, body } => (status, body),
    };

    if (200..300).contains(&status) {
        return Ok(body);
    }
    if status == 404 && stage.is_lookup() {
        if let Some((kind, id)) = reference(region) {
            return Err(RegionError::UnknownReference { kind, id });
        }
    }
    Err(RegionError::transport(
        Some(status),
        format!("HTTP {status} from {stage}"),
    ))
}

fn parse_body<T: DeserializeOwned>(stage: FetchStage, body: &[u8]) -> RegionResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| RegionError::transport(None, format!("invalid JSON from {stage}: {e}")))
}

fn reference(region: &Region) -> Option<(ReferenceKind, String)> {
    match region {
        Region::Hot { id } => Some((ReferenceKind::Hot, id.to_string())),
        Region::Gist { id } => Some((ReferenceKind::Gist, id.as_str().to_string())),
        Region::Bbox { .. } | Region::Polygon { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::ProjectId;
    use crate::ErrorKind;
    use assert_matches::assert_matches;
    use geojson::Value;
    use serde_json::json;

    const RAW: &str = "https://gist.githubusercontent.com/u/c0ffee/raw/polygon.geojson";

    fn triangle() -> serde_json::Value {
        json!([[[10.0, 50.0], [11.0, 50.0], [11.0, 51.0], [10.0, 50.0]]])
    }

    fn reply(body: &serde_json::Value) -> FetchReply {
        FetchReply::ok(body.to_string())
    }

    fn status(code: u16) -> FetchReply {
        FetchReply::Response {
            status: code,
            body: Vec::new(),
        }
    }

    fn done(step: Step) -> Feature {
        match step {
            Step::Done(feature) => feature,
            other => panic!("expected a feature, got {other:?}"),
        }
    }

    fn first_position(feature: &Feature) -> Vec<f64> {
        match &feature.geometry.as_ref().unwrap().value {
            Value::Polygon(rings) => rings[0][0].clone(),
            other => panic!("expected polygon, got {other:?}"),
        }
    }

    fn manifest(files: serde_json::Value) -> serde_json::Value {
        json!({ "id": "c0ffee", "files": files })
    }

    mod inline {
        use super::*;

        #[test]
        fn test_bbox_needs_no_fetch() {
            let step = start(&Region::bbox(10.0, 50.0, 11.0, 51.0), &Settings::default()).unwrap();
            assert_eq!(first_position(&done(step)), vec![10.0, 50.0]);
        }

        #[test]
        fn test_lat_lon_flips_last() {
            let step = start(&Region::bbox(10.0, 50.0, 11.0, 51.0), &Settings::default()).unwrap();
            let feature = finish(done(step), CoordinateOrder::LatLon);
            assert_eq!(first_position(&feature), vec![50.0, 10.0]);
        }

        #[test]
        fn test_non_finite_bbox_rejected() {
            let err = start(&Region::bbox(f64::NAN, 0.0, 1.0, 1.0), &Settings::default())
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidRegionPayload);
        }

        #[test]
        fn test_short_polygon_rejected() {
            let region = Region::Polygon {
                coords: vec![[0.0, 0.0], [1.0, 1.0]],
            };
            assert_matches!(
                start(&region, &Settings::default()),
                Err(RegionError::InvalidRegionPayload { region_type: "polygon", .. })
            );
        }
    }

    mod hot {
        use super::*;

        #[test]
        fn test_requests_project_aoi() {
            let step = start(&Region::hot(42), &Settings::default()).unwrap();
            assert_eq!(
                step,
                Step::Fetch {
                    url: "https://tasks.hotosm.org/api/v1/project/42/aoi".into(),
                    stage: FetchStage::ProjectAoi,
                }
            );
        }

        #[test]
        fn test_custom_endpoint() {
            let settings = Settings {
                tm_api: "https://tm.example.org/api/v2/".into(),
                ..Settings::default()
            };
            assert_matches!(
                start(&Region::hot(7), &settings),
                Ok(Step::Fetch { ref url, .. }) if url == "https://tm.example.org/api/v2/project/7/aoi"
            );
        }

        #[test]
        fn test_multipolygon_aoi_unwrapped() {
            let body = json!({"type": "MultiPolygon", "coordinates": [triangle()]});
            let step = advance(&Region::hot(42), FetchStage::ProjectAoi, reply(&body)).unwrap();
            assert_eq!(first_position(&done(step)), vec![10.0, 50.0]);
        }

        #[test]
        fn test_not_found_is_unknown_reference() {
            let err = advance(&Region::hot(42), FetchStage::ProjectAoi, status(404)).unwrap_err();
            assert_matches!(
                err,
                RegionError::UnknownReference { kind: ReferenceKind::Hot, ref id } if id == "42"
            );
        }

        #[test]
        fn test_server_error_is_transport() {
            let err = advance(&Region::hot(42), FetchStage::ProjectAoi, status(503)).unwrap_err();
            assert_matches!(err, RegionError::Transport { status: Some(503), .. });
            assert!(err.kind().is_retryable());
        }

        #[test]
        fn test_connection_failure_is_transport() {
            let failed = FetchReply::Failed {
                reason: "offline".into(),
            };
            let err = advance(&Region::hot(42), FetchStage::ProjectAoi, failed).unwrap_err();
            assert_matches!(err, RegionError::Transport { status: None, .. });
            assert_eq!(err.to_string(), "transport error: project AOI: offline");
        }

        #[test]
        fn test_unparseable_body_is_transport() {
            let err = advance(&Region::hot(42), FetchStage::ProjectAoi, FetchReply::ok("<html>"))
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Transport);
        }

        #[test]
        fn test_unparseable_id_fails_before_fetch() {
            let region = Region::Hot {
                id: ProjectId::parse("abc"),
            };
            let err = start(&region, &Settings::default()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidRegionPayload);
        }
    }

    mod gist {
        use super::*;

        fn gist() -> Region {
            Region::gist("c0ffee")
        }

        #[test]
        fn test_requests_manifest_first() {
            assert_eq!(
                start(&gist(), &Settings::default()).unwrap(),
                Step::Fetch {
                    url: "https://api.github.com/gists/c0ffee".into(),
                    stage: FetchStage::GistManifest,
                }
            );
        }

        #[test]
        fn test_prefers_polygon_geojson() {
            let body = manifest(json!({
                "map.geojson": {"raw_url": "https://example.org/other"},
                "polygon.geojson": {"raw_url": RAW}
            }));
            let step = advance(&gist(), FetchStage::GistManifest, reply(&body)).unwrap();
            assert_eq!(
                step,
                Step::Fetch {
                    url: RAW.into(),
                    stage: FetchStage::GistFile,
                }
            );
        }

        #[test]
        fn test_falls_back_to_map_geojson() {
            let body = manifest(json!({"map.geojson": {"raw_url": RAW}}));
            assert_matches!(
                advance(&gist(), FetchStage::GistManifest, reply(&body)),
                Ok(Step::Fetch { stage: FetchStage::GistFile, .. })
            );
        }

        #[test]
        fn test_without_geometry_file_is_incompatible() {
            let body = manifest(json!({"notes.md": {"raw_url": RAW}}));
            let err = advance(&gist(), FetchStage::GistManifest, reply(&body)).unwrap_err();
            assert_matches!(err, RegionError::IncompatibleReference { ref id } if id == "c0ffee");
        }

        #[test]
        fn test_invalid_raw_url_is_not_fetched() {
            let body = manifest(json!({"polygon.geojson": {"raw_url": "javascript:alert(1)"}}));
            let err = advance(&gist(), FetchStage::GistManifest, reply(&body)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Transport);
        }

        #[test]
        fn test_manifest_not_found_is_unknown_reference() {
            let err = advance(&gist(), FetchStage::GistManifest, status(404)).unwrap_err();
            assert_matches!(
                err,
                RegionError::UnknownReference { kind: ReferenceKind::Gist, .. }
            );
        }

        #[test]
        fn test_raw_file_not_found_is_transport() {
            let err = advance(&gist(), FetchStage::GistFile, status(404)).unwrap_err();
            assert_matches!(err, RegionError::Transport { status: Some(404), .. });
        }

        #[test]
        fn test_raw_feature_collection_unwrapped() {
            let body = json!({
                "type": "FeatureCollection",
                "features": [{"type": "Feature", "properties": {"name": "x"},
                              "geometry": {"type": "Polygon", "coordinates": triangle()}}]
            });
            let feature = done(advance(&gist(), FetchStage::GistFile, reply(&body)).unwrap());
            assert_eq!(first_position(&feature), vec![10.0, 50.0]);
            assert_eq!(feature.properties, Some(serde_json::Map::new()));
        }

        #[test]
        fn test_raw_file_not_geojson_is_malformed() {
            let err = advance(&gist(), FetchStage::GistFile, reply(&json!({"hello": "world"})))
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedGeometry);
        }

        #[test]
        fn test_two_polygon_multipolygon_passes_through() {
            let body = json!({"type": "MultiPolygon", "coordinates": [triangle(), triangle()]});
            let step = advance(&gist(), FetchStage::GistFile, reply(&body)).unwrap();
            let feature = finish(done(step), CoordinateOrder::LatLon);
            let Some(Value::MultiPolygon(polygons)) = feature.geometry.map(|g| g.value) else {
                panic!("expected multipolygon");
            };
            assert_eq!(polygons.len(), 2);
            assert_eq!(polygons[1][0][0], vec![50.0, 10.0]);
        }
    }

    #[test]
    fn test_is_current() {
        let resolved = ResolvedRegion {
            region: Region::gist("c0ffee"),
            feature: Feature::default(),
        };
        assert!(resolved.is_current(Some(&Region::gist("c0ffee"))));
        assert!(!resolved.is_current(Some(&Region::gist("other"))));
        assert!(!resolved.is_current(None));
    }

    #[test]
    fn test_failure_summary() {
        let err = RegionError::transport(Some(503), "HTTP 503 from project AOI");
        let failure = ResolveFailure::from(&err);
        assert_eq!(failure.code, "TRANSPORT_ERROR");
        assert!(failure.retryable);
    }
}
