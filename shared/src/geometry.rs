//! Geometry normalization for resolved regions.
//!
//! Whatever a region resolves to is reduced to a single [`Feature`] with
//! empty properties, preferably wrapping one `Polygon`.

use geojson::{Feature, GeoJson, Geometry, JsonObject, Position, Value};

use crate::{RegionError, RegionResult};

/// Wraps a geometry in a feature with empty properties.
#[must_use]
pub fn feature(geometry: Geometry) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(JsonObject::new()),
        foreign_members: None,
    }
}

/// Reduces a GeoJSON document to one feature.
///
/// A collection yields its first feature and a feature yields its
/// geometry. A `MultiPolygon` holding exactly one polygon is unwrapped to
/// a `Polygon`; anything else is wrapped unchanged.
pub fn normalize(document: GeoJson) -> RegionResult<Feature> {
    let geometry = match document {
        GeoJson::Geometry(geometry) => geometry,
        GeoJson::Feature(f) => f
            .geometry
            .ok_or_else(|| RegionError::malformed("feature has no geometry"))?,
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .next()
            .ok_or_else(|| RegionError::malformed("feature collection is empty"))?
            .geometry
            .ok_or_else(|| RegionError::malformed("first feature has no geometry"))?,
    };

    Ok(feature(unwrap_single_polygon(geometry)))
}

fn unwrap_single_polygon(geometry: Geometry) -> Geometry {
    match geometry.value {
        Value::MultiPolygon(mut polygons) if polygons.len() == 1 => {
            Geometry::new(Value::Polygon(polygons.remove(0)))
        }
        value => Geometry { value, ..geometry },
    }
}

/// Parses a response body and normalizes it.
pub fn normalize_json(body: serde_json::Value) -> RegionResult<Feature> {
    let document = GeoJson::from_json_value(body)
        .map_err(|e| RegionError::malformed(format!("not a GeoJSON document: {e}")))?;
    normalize(document)
}

/// Rectangle feature for `[min_lon, min_lat, max_lon, max_lat]`. Swapped
/// bounds are put back in order.
pub fn bbox_feature(bounds: [f64; 4]) -> RegionResult<Feature> {
    if let Some(bad) = bounds.iter().find(|b| !b.is_finite()) {
        return Err(RegionError::payload(
            "bbox",
            format!("bound {bad} is not a finite number"),
        ));
    }

    let [a, b, c, d] = bounds;
    let (west, east) = (a.min(c), a.max(c));
    let (south, north) = (b.min(d), b.max(d));

    let ring = vec![
        vec![west, south],
        vec![east, south],
        vec![east, north],
        vec![west, north],
        vec![west, south],
    ];
    Ok(feature(Geometry::new(Value::Polygon(vec![ring]))))
}

/// Polygon feature from an open ring; the first point is repeated at the
/// end.
pub fn polygon_feature(points: &[[f64; 2]]) -> RegionResult<Feature> {
    crate::region::check_polygon(points)?;

    let mut ring: Vec<Position> = points.iter().map(|p| p.to_vec()).collect();
    ring.push(points[0].to_vec());
    Ok(feature(Geometry::new(Value::Polygon(vec![ring]))))
}

/// Swaps the first two components of every position.
#[must_use]
pub fn flip_feature(mut feature: Feature) -> Feature {
    if let Some(geometry) = feature.geometry.as_mut() {
        flip_geometry(geometry);
    }
    feature
}

fn flip_geometry(geometry: &mut Geometry) {
    match &mut geometry.value {
        Value::Point(p) => flip_position(p),
        Value::MultiPoint(ps) | Value::LineString(ps) => ps.iter_mut().for_each(flip_position),
        Value::MultiLineString(lines) | Value::Polygon(lines) => lines
            .iter_mut()
            .flatten()
            .for_each(flip_position),
        Value::MultiPolygon(polygons) => polygons
            .iter_mut()
            .flatten()
            .flatten()
            .for_each(flip_position),
        Value::GeometryCollection(geometries) => geometries.iter_mut().for_each(flip_geometry),
    }
}

fn flip_position(position: &mut Position) {
    if position.len() >= 2 {
        position.swap(0, 1);
    }
}
