//! Spatial invariants.
//!
//! - Snap-to-grid aggregation counts coincident points into one cell
//!   and keeps distinct points apart at the default resolution
//! - Geometry filters restrict detail rows to the polygon
//! - LineString filters are widened by buffering, and a wider buffer
//!   never shrinks the resulting area
//! - Fragment extraction accepts Feature, FeatureCollection, and bare
//!   geometry input and stamps the plan-time fragment EPSG:4326

mod common;

use civiq::engine::Engine;
use civiq::geometry::{extract_fragment, make_fragment};
use civiq::response::Payload;
use serde_json::json;

use common::{fixed_now, fixture_store, params, rectangle_text};

#[test]
fn test_grid_counts_points_per_cell() {
    let store = fixture_store();
    let rect = rectangle_text(-87.72, 41.86, -87.60, 41.92);
    let payload = Engine::new(&store)
        .grid(
            &params(&[
                ("dataset_name", "wifi_hotspots"),
                ("obs_date__ge", "2013"),
                ("location_geom__within", &rect),
            ]),
            fixed_now(),
        )
        .unwrap();

    let Payload::GeoJson(value) = payload else {
        panic!("expected geojson payload");
    };
    let features = value["features"].as_array().unwrap();
    // Three lone hotspots plus the coincident kiosk pair; the far
    // suburb point sits outside the rectangle.
    assert_eq!(features.len(), 4);
    let mut counts: Vec<u64> = features
        .iter()
        .map(|f| f["properties"]["count"].as_u64().unwrap())
        .collect();
    counts.sort_unstable();
    assert_eq!(counts, vec![1, 1, 1, 2]);
    for feature in features {
        assert_eq!(feature["geometry"]["type"], json!("Point"));
    }
}

#[test]
fn test_grid_cells_snap_to_shared_centers() {
    let store = fixture_store();
    let rect = rectangle_text(-87.72, 41.86, -87.60, 41.92);
    let engine = Engine::new(&store);
    let request = params(&[
        ("dataset_name", "wifi_hotspots"),
        ("obs_date__ge", "2013"),
        ("location_geom__within", &rect),
    ]);

    let first = engine.grid(&request, fixed_now()).unwrap();
    let second = engine.grid(&request, fixed_now()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_coarser_resolution_merges_cells() {
    let store = fixture_store();
    let rect = rectangle_text(-87.72, 41.86, -87.60, 41.92);
    // 10 km cells swallow the whole downtown cluster.
    let payload = Engine::new(&store)
        .grid(
            &params(&[
                ("dataset_name", "wifi_hotspots"),
                ("obs_date__ge", "2013"),
                ("location_geom__within", &rect),
                ("resolution", "10000"),
            ]),
            fixed_now(),
        )
        .unwrap();

    let Payload::GeoJson(value) = payload else {
        panic!("expected geojson payload");
    };
    let features = value["features"].as_array().unwrap();
    let total: u64 = features
        .iter()
        .map(|f| f["properties"]["count"].as_u64().unwrap())
        .sum();
    assert_eq!(total, 5);
    assert!(features.len() < 4);
}

#[test]
fn test_geometry_filter_restricts_detail_rows() {
    let store = fixture_store();
    let west = rectangle_text(-87.75, 41.80, -87.68, 41.95);
    let payload = Engine::new(&store)
        .detail(
            &params(&[
                ("dataset_name", "crimes"),
                ("obs_date__ge", "2000"),
                ("location_geom__within", &west),
            ]),
            fixed_now(),
        )
        .unwrap();

    let Payload::Json(value) = payload else {
        panic!("expected json payload");
    };
    let objects = value["objects"].as_array().unwrap();
    assert_eq!(objects.len(), 2);
    assert_eq!(objects[0]["case_number"], json!("HX100002"));
    assert_eq!(objects[1]["case_number"], json!("HX100005"));
}

#[test]
fn test_wider_buffer_never_shrinks_a_line_filter() {
    let line = json!({
        "type": "LineString",
        "coordinates": [[-87.66, 41.87], [-87.64, 41.88], [-87.62, 41.87]]
    });

    let narrow = make_fragment(&line, 100.0).unwrap();
    let wide = make_fragment(&line, 500.0).unwrap();
    assert!(narrow.area() > 0.0);
    assert!(wide.area() > narrow.area());
}

#[test]
fn test_polygon_filters_pass_through_unbuffered() {
    let polygon: serde_json::Value =
        serde_json::from_str(&rectangle_text(-87.7, 41.8, -87.6, 41.9)).unwrap();

    let fragment = make_fragment(&polygon, 100.0).unwrap();
    assert_eq!(fragment.as_value()["type"], json!("Polygon"));
    assert_eq!(
        fragment.as_value()["coordinates"],
        polygon["coordinates"]
    );
}

#[test]
fn test_fragment_extraction_unwraps_geojson_containers() {
    let bare = rectangle_text(-87.7, 41.8, -87.6, 41.9);
    let feature = json!({
        "type": "Feature",
        "properties": {},
        "geometry": serde_json::from_str::<serde_json::Value>(&bare).unwrap()
    })
    .to_string();
    let collection = json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {},
            "geometry": serde_json::from_str::<serde_json::Value>(&bare).unwrap()
        }]
    })
    .to_string();

    let from_bare = extract_fragment(&bare).unwrap();
    assert_eq!(extract_fragment(&feature).unwrap(), from_bare);
    assert_eq!(extract_fragment(&collection).unwrap(), from_bare);
}

#[test]
fn test_plan_fragments_are_stamped_epsg_4326() {
    let polygon: serde_json::Value =
        serde_json::from_str(&rectangle_text(-87.7, 41.8, -87.6, 41.9)).unwrap();
    let fragment = make_fragment(&polygon, 100.0).unwrap();
    assert_eq!(
        fragment.as_value()["crs"]["properties"]["name"],
        json!("EPSG:4326")
    );
}

#[test]
fn test_malformed_geometry_parameter_is_rejected() {
    let store = fixture_store();
    let err = Engine::new(&store)
        .grid(
            &params(&[
                ("dataset_name", "wifi_hotspots"),
                ("location_geom__within", "{\"not\": \"geojson\"}"),
            ]),
            fixed_now(),
        )
        .unwrap_err();
    let rejection = err.rejection().expect("validation rejection");
    assert!(!rejection.messages("location_geom__within").is_empty());
}
