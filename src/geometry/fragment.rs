//! GeoJSON fragment extraction and LineString buffering.
//!
//! The store's geometry functions expect one geometry fragment with an
//! explicit coordinate reference, so any accepted input (Feature,
//! FeatureCollection, bare geometry) is reduced to its innermost
//! geometry, line-shaped filters are widened into areas, and the result
//! is stamped EPSG:4326.

use serde_json::{json, Value};

use super::errors::{GeometryError, GeometryResult};

/// Approximate degrees of latitude per meter (equirectangular).
const METERS_PER_DEGREE: f64 = 111_111.0;

/// Default LineString buffer distance in meters.
pub const DEFAULT_BUFFER_METERS: f64 = 100.0;

/// A normalized polygonal filter fragment, stamped with its CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonFragment {
    geometry: Value,
}

impl PolygonFragment {
    /// The fragment as a GeoJSON value.
    pub fn as_value(&self) -> &Value {
        &self.geometry
    }

    /// Area of the fragment's outer ring in square degrees.
    pub fn area(&self) -> f64 {
        outer_ring(&self.geometry).map(ring_area).unwrap_or(0.0)
    }
}

/// Syntax-checks raw GeoJSON text and returns the innermost geometry.
///
/// Accepts a FeatureCollection (first feature wins), a Feature, or a
/// bare geometry object. Used at validation time; buffering and CRS
/// stamping happen at plan time via [`make_fragment`].
pub fn extract_fragment(geojson_text: &str) -> GeometryResult<Value> {
    let doc: Value = serde_json::from_str(geojson_text)
        .map_err(|_| GeometryError::InvalidGeometry(geojson_text.to_string()))?;

    let fragment = if let Some(features) = doc.get("features").and_then(Value::as_array) {
        features
            .first()
            .and_then(|f| f.get("geometry"))
            .cloned()
            .ok_or_else(|| GeometryError::InvalidGeometry(geojson_text.to_string()))?
    } else if let Some(geometry) = doc.get("geometry") {
        geometry.clone()
    } else {
        doc
    };

    if fragment.get("type").and_then(Value::as_str).is_none() {
        return Err(GeometryError::InvalidGeometry(geojson_text.to_string()));
    }
    Ok(fragment)
}

/// Converts a fragment into the polygonal form the store needs.
///
/// LineStrings are buffered by `buffer_meters` into an area, since a
/// line has no interior for a containment predicate to test against.
/// Every output is stamped with an explicit EPSG:4326 marker.
pub fn make_fragment(fragment: &Value, buffer_meters: f64) -> GeometryResult<PolygonFragment> {
    let mut geometry = if fragment.get("type").and_then(Value::as_str) == Some("LineString") {
        buffer_linestring(fragment, buffer_meters)?
    } else {
        fragment.clone()
    };

    geometry["crs"] = json!({"type": "name", "properties": {"name": "EPSG:4326"}});
    Ok(PolygonFragment { geometry })
}

/// Widens a LineString into a polygon by buffering it `meters` out.
///
/// The distance converts from meters to degrees at the line's centroid
/// latitude (equirectangular approximation), then the polygon is the
/// convex hull of an eight-point offset ring around every vertex.
fn buffer_linestring(fragment: &Value, meters: f64) -> GeometryResult<Value> {
    let points = coordinate_pairs(fragment)?;
    if points.is_empty() {
        return Err(GeometryError::EmptyCoordinates(fragment.to_string()));
    }

    let centroid_lat = points.iter().map(|p| p.1).sum::<f64>() / points.len() as f64;
    let (dx, dy) = size_in_degrees(meters, centroid_lat);

    let mut cloud = Vec::with_capacity(points.len() * 8);
    for &(x, y) in &points {
        for i in 0..8 {
            let theta = std::f64::consts::PI * (i as f64) / 4.0;
            cloud.push((x + dx * theta.cos(), y + dy * theta.sin()));
        }
    }

    let mut ring = convex_hull(cloud);
    if let Some(first) = ring.first().copied() {
        ring.push(first);
    }
    let coords: Vec<Value> = ring.iter().map(|&(x, y)| json!([x, y])).collect();

    Ok(json!({"type": "Polygon", "coordinates": [coords]}))
}

/// Converts a linear distance in meters to degrees of (lon, lat) at the
/// given latitude.
pub fn size_in_degrees(meters: f64, latitude: f64) -> (f64, f64) {
    let dy = meters / METERS_PER_DEGREE;
    let dx = dy / latitude.to_radians().cos();
    (dx, dy)
}

/// Bounding box (min_x, min_y, max_x, max_y) over every coordinate in
/// a GeoJSON value, or None if it has none.
pub fn value_bbox(value: &Value) -> Option<(f64, f64, f64, f64)> {
    let mut bbox: Option<(f64, f64, f64, f64)> = None;
    collect_bbox(value.get("coordinates")?, &mut bbox);
    bbox
}

fn collect_bbox(node: &Value, bbox: &mut Option<(f64, f64, f64, f64)>) {
    if let Some(arr) = node.as_array() {
        if arr.len() >= 2 && arr[0].is_number() && arr[1].is_number() {
            let (x, y) = (arr[0].as_f64().unwrap_or(0.0), arr[1].as_f64().unwrap_or(0.0));
            *bbox = Some(match *bbox {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        } else {
            for child in arr {
                collect_bbox(child, bbox);
            }
        }
    }
}

/// Point-in-polygon test against a Polygon or MultiPolygon fragment.
///
/// Even-odd ray casting over every ring, so holes subtract.
pub fn contains(polygon: &Value, x: f64, y: f64) -> bool {
    match polygon.get("type").and_then(Value::as_str) {
        Some("Polygon") => polygon
            .get("coordinates")
            .map(|rings| polygon_contains(rings, x, y))
            .unwrap_or(false),
        Some("MultiPolygon") => polygon
            .get("coordinates")
            .and_then(Value::as_array)
            .map(|polys| polys.iter().any(|rings| polygon_contains(rings, x, y)))
            .unwrap_or(false),
        _ => false,
    }
}

fn polygon_contains(rings: &Value, x: f64, y: f64) -> bool {
    let rings = match rings.as_array() {
        Some(r) => r,
        None => return false,
    };
    let mut inside = false;
    for ring in rings {
        if ring_crossings(ring, x, y) % 2 == 1 {
            inside = !inside;
        }
    }
    inside
}

fn ring_crossings(ring: &Value, x: f64, y: f64) -> usize {
    let pts: Vec<(f64, f64)> = ring
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|p| {
                    let p = p.as_array()?;
                    Some((p.first()?.as_f64()?, p.get(1)?.as_f64()?))
                })
                .collect()
        })
        .unwrap_or_default();

    let mut crossings = 0;
    for i in 0..pts.len().saturating_sub(1) {
        let (x0, y0) = pts[i];
        let (x1, y1) = pts[i + 1];
        if (y0 > y) != (y1 > y) {
            let x_cross = x0 + (y - y0) / (y1 - y0) * (x1 - x0);
            if x_cross > x {
                crossings += 1;
            }
        }
    }
    crossings
}

/// Coordinate pairs of a Point/LineString-shaped geometry.
fn coordinate_pairs(fragment: &Value) -> GeometryResult<Vec<(f64, f64)>> {
    let coords = fragment
        .get("coordinates")
        .and_then(Value::as_array)
        .ok_or_else(|| GeometryError::EmptyCoordinates(fragment.to_string()))?;

    // A bare Point has [x, y] rather than [[x, y], ...].
    if coords.len() >= 2 && coords[0].is_number() {
        let x = coords[0].as_f64().unwrap_or(0.0);
        let y = coords[1].as_f64().unwrap_or(0.0);
        return Ok(vec![(x, y)]);
    }

    Ok(coords
        .iter()
        .filter_map(|p| {
            let p = p.as_array()?;
            Some((p.first()?.as_f64()?, p.get(1)?.as_f64()?))
        })
        .collect())
}

/// Andrew's monotone chain convex hull.
fn convex_hull(mut points: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    points.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    points.dedup();
    if points.len() < 3 {
        return points;
    }

    let cross = |o: (f64, f64), a: (f64, f64), b: (f64, f64)| {
        (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
    };

    let mut hull: Vec<(f64, f64)> = Vec::with_capacity(points.len() * 2);
    for &p in points.iter().chain(points.iter().rev().skip(1)) {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

fn outer_ring(geometry: &Value) -> Option<&Value> {
    geometry.get("coordinates")?.as_array()?.first()
}

/// Shoelace area of one closed ring.
fn ring_area(ring: &Value) -> f64 {
    let pts: Vec<(f64, f64)> = ring
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|p| {
                    let p = p.as_array()?;
                    Some((p.first()?.as_f64()?, p.get(1)?.as_f64()?))
                })
                .collect()
        })
        .unwrap_or_default();

    let mut acc = 0.0;
    for i in 0..pts.len().saturating_sub(1) {
        acc += pts[i].0 * pts[i + 1].1 - pts[i + 1].0 * pts[i].1;
    }
    (acc / 2.0).abs()
}
