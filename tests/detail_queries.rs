//! Row-level query invariants.
//!
//! - Condition-tree filtering returns exactly the matching fixture rows
//! - Internal columns never leave the engine
//! - CSV output carries the attachment filename and exactly one more
//!   line than the JSON objects array for the same query
//! - Business-key detail joins and containment shape joins

mod common;

use civiq::engine::Engine;
use civiq::planner::{Planner, ReadQuery};
use civiq::response::Payload;
use civiq::store::memory::{MemoryStore, MemoryTable};
use civiq::store::{ColumnInfo, Store};
use civiq::catalog::SemanticType;
use civiq::validator::Validator;
use serde_json::json;

use common::{fixed_now, fixture_store, params, row};

fn iucr_request(extra: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut pairs = vec![
        ("dataset_name", "crimes"),
        ("crimes__filter", r#"{"op":"eq","col":"iucr","val":1150}"#),
        ("obs_date__ge", "2000"),
    ];
    pairs.extend_from_slice(extra);
    params(&pairs)
}

#[test]
fn test_condition_tree_returns_exactly_matching_rows() {
    let store = fixture_store();
    let payload = Engine::new(&store).detail(&iucr_request(&[]), fixed_now()).unwrap();

    let Payload::Json(value) = payload else {
        panic!("expected json payload");
    };
    let objects = value["objects"].as_array().unwrap();
    // Two 1150 crimes after 2000; the 1999 one is outside the window.
    assert_eq!(objects.len(), 2);
    for object in objects {
        assert_eq!(object["description"], json!("CREDIT CARD FRAUD"));
    }
}

#[test]
fn test_detail_rows_are_newest_first_and_stripped() {
    let store = fixture_store();
    let payload = Engine::new(&store).detail(&iucr_request(&[]), fixed_now()).unwrap();

    let Payload::Json(value) = payload else {
        panic!("expected json payload");
    };
    let objects = value["objects"].as_array().unwrap();
    assert_eq!(objects[0]["case_number"], json!("HX100002"));
    assert_eq!(objects[1]["case_number"], json!("HX100001"));
    for object in objects {
        let keys: Vec<&String> = object.as_object().unwrap().keys().collect();
        assert!(!keys.iter().any(|k| *k == "hash" || *k == "point_date" || *k == "geom"));
    }
}

#[test]
fn test_csv_has_exactly_one_more_line_than_json_objects() {
    let store = fixture_store();
    let engine = Engine::new(&store);

    let json_payload = engine.detail(&iucr_request(&[]), fixed_now()).unwrap();
    let Payload::Json(value) = json_payload else {
        panic!("expected json payload");
    };
    let object_count = value["objects"].as_array().unwrap().len();

    let csv_payload = engine
        .detail(&iucr_request(&[("data_type", "csv")]), fixed_now())
        .unwrap();
    let Payload::Csv { filename, body } = csv_payload else {
        panic!("expected csv payload");
    };
    assert_eq!(filename, "crimes_2014-01-01.csv");
    assert_eq!(body.lines().count(), object_count + 1);
}

#[test]
fn test_empty_csv_result_has_no_header_line() {
    let store = fixture_store();
    let payload = Engine::new(&store)
        .detail(
            &params(&[
                ("dataset_name", "crimes"),
                ("iucr__eq", "9999"),
                ("obs_date__ge", "2000"),
                ("data_type", "csv"),
            ]),
            fixed_now(),
        )
        .unwrap();

    let Payload::Csv { filename, body } = payload else {
        panic!("expected csv payload");
    };
    // No rows means no column set to build a header from.
    assert_eq!(filename, "crimes_2014-01-01.csv");
    assert!(body.is_empty());
}

#[test]
fn test_limit_and_offset_page_rows() {
    let store = fixture_store();
    let engine = Engine::new(&store);
    let paged = engine
        .detail(&iucr_request(&[("limit", "1"), ("offset", "1")]), fixed_now())
        .unwrap();

    let Payload::Json(value) = paged else {
        panic!("expected json payload");
    };
    let objects = value["objects"].as_array().unwrap();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0]["case_number"], json!("HX100001"));
}

#[test]
fn test_detail_aggregate_buckets_filtered_rows() {
    let store = fixture_store();
    let payload = Engine::new(&store)
        .detail_aggregate(&iucr_request(&[("agg", "year")]), fixed_now())
        .unwrap();

    let Payload::Json(value) = payload else {
        panic!("expected json payload");
    };
    assert_eq!(
        value["objects"],
        json!([{
            "dataset_name": "crimes",
            "time_bucket": "2013-01-01T00:00:00",
            "count": 2
        }])
    );
}

#[test]
fn test_shape_join_annotates_points_with_polygons() {
    let store = fixture_store();
    let payload = Engine::new(&store)
        .detail(&iucr_request(&[("shape", "neighborhoods")]), fixed_now())
        .unwrap();

    let Payload::Json(value) = payload else {
        panic!("expected json payload");
    };
    let objects = value["objects"].as_array().unwrap();
    assert_eq!(objects.len(), 2);
    // -87.70 falls in the west polygon, -87.63 in the east one.
    assert_eq!(objects[0]["case_number"], json!("HX100002"));
    assert_eq!(objects[0]["neighborhoods.sec_neigh"], json!("WEST SIDE"));
    assert_eq!(objects[1]["neighborhoods.sec_neigh"], json!("EAST SIDE"));
}

#[test]
fn test_detail_join_through_business_key() {
    let mut store = fixture_store();
    let mut details = MemoryTable::new(
        "crime_details",
        vec![
            ColumnInfo::new("case_number", SemanticType::String),
            ColumnInfo::new("disposition", SemanticType::String),
        ],
    );
    details.push_row(row(&[
        ("case_number", json!("HX100001")),
        ("disposition", json!("ARREST")),
    ]));
    details.push_row(row(&[
        ("case_number", json!("HX100002")),
        ("disposition", json!("PENDING")),
    ]));
    store.add_table(details);

    let validated = Validator::new(&store)
        .validate(&iucr_request(&[]), fixed_now())
        .unwrap();
    let catalog = civiq::catalog::Catalog::new(&store);
    let detail_desc = catalog.resolve("crime_details").unwrap();
    let plan = Planner::detail_join(&validated.query, &validated.descriptors[0], &detail_desc)
        .unwrap();
    let rows = store.execute(&ReadQuery::DetailJoin(plan)).unwrap();

    assert_eq!(rows.len(), 2);
    // Master time descending: the June crime first.
    assert_eq!(rows[0].get("case_number"), Some(&json!("HX100002")));
    assert_eq!(rows[0].get("disposition"), Some(&json!("PENDING")));
    assert_eq!(rows[1].get("disposition"), Some(&json!("ARREST")));
}

#[test]
fn test_detail_join_without_business_key_is_internal_failure() {
    let store = fixture_store();
    let validated = Validator::new(&store)
        .validate(
            &params(&[("dataset_name", "flu_shot_clinics")]),
            fixed_now(),
        )
        .unwrap();
    let catalog = civiq::catalog::Catalog::new(&store);
    let detail_desc = catalog.resolve("crimes").unwrap();

    // No business key declared on the clinics dataset: the join is a
    // catalog inconsistency, not a validation error.
    let err = Planner::detail_join(&validated.query, &validated.descriptors[0], &detail_desc)
        .unwrap_err();
    assert!(err.to_string().contains("business key"));
}

#[test]
fn test_geojson_detail_emits_features() {
    let store = fixture_store();
    let payload = Engine::new(&store)
        .detail(&iucr_request(&[("data_type", "geojson")]), fixed_now())
        .unwrap();

    let Payload::GeoJson(value) = payload else {
        panic!("expected geojson payload");
    };
    let features = value["features"].as_array().unwrap();
    assert_eq!(features.len(), 2);
    assert_eq!(features[0]["geometry"]["type"], json!("Point"));
    assert_eq!(features[0]["properties"]["case_number"], json!("HX100002"));
}

#[test]
fn test_empty_result_is_success_with_zero_rows() {
    let store = fixture_store();
    let payload = Engine::new(&store)
        .detail(
            &params(&[
                ("dataset_name", "crimes"),
                ("iucr__eq", "9999"),
                ("obs_date__ge", "2000"),
            ]),
            fixed_now(),
        )
        .unwrap();

    let Payload::Json(value) = payload else {
        panic!("expected json payload");
    };
    assert_eq!(value["meta"]["status"], json!("ok"));
    assert_eq!(value["objects"].as_array().unwrap().len(), 0);
}

#[test]
fn test_csv_filename_uses_validation_clock() {
    let store = MemoryStore::new();
    // Unknown dataset still rejects before any filename is built.
    let err = Engine::new(&store)
        .detail(&params(&[("dataset_name", "crimes")]), fixed_now())
        .unwrap_err();
    assert!(err.rejection().is_some());
}
