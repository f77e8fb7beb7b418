//! Shared fixture datasets for integration tests.
//!
//! `fixture_store` mirrors a small civic data portal: a flu-clinic
//! point dataset with 65 rows across 2013 (five of them inside the
//! 2013-09-22..2013-10-01 window the aggregation tests query), a
//! crime dataset with known `iucr` values, a polygon neighborhood
//! dataset, and a wifi-hotspot dataset laid out for grid counting.

use chrono::NaiveDate;
use serde_json::{json, Value};

use civiq::catalog::{ColumnInfo, DatasetMeta, SemanticType};
use civiq::store::memory::{MemoryStore, MemoryTable};
use civiq::store::Row;

pub fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// GeoJSON point encoded the way the memory store keeps geometry.
pub fn point(lon: f64, lat: f64) -> Value {
    json!(json!({"type": "Point", "coordinates": [lon, lat]}).to_string())
}

fn polygon(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Value {
    json!(json!({
        "type": "Polygon",
        "coordinates": [[
            [min_x, min_y], [max_x, min_y], [max_x, max_y], [min_x, max_y], [min_x, min_y]
        ]]
    })
    .to_string())
}

/// Bare rectangle geometry for `location_geom__within` parameters.
pub fn rectangle_text(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> String {
    json!({
        "type": "Polygon",
        "coordinates": [[
            [min_x, min_y], [max_x, min_y], [max_x, max_y], [min_x, max_y], [min_x, min_y]
        ]]
    })
    .to_string()
}

fn flu_shot_clinics() -> MemoryTable {
    let mut table = MemoryTable::new(
        "flu_shot_clinics",
        vec![
            ColumnInfo::new("hash", SemanticType::String),
            ColumnInfo::new("event_type", SemanticType::String),
            ColumnInfo::new("point_date", SemanticType::Timestamp),
            ColumnInfo::new("geom", SemanticType::Geometry),
        ],
    );

    // The five rows inside [2013-09-22, 2013-10-01].
    let in_window = [
        ("2013-09-22T10:00:00", "Church"),
        ("2013-09-28T09:30:00", "School"),
        ("2013-09-30T14:00:00", "Library"),
        ("2013-10-01T00:00:00", "Church"),
        ("2013-10-01T00:00:00", "Senior Center"),
    ];
    for (index, (date, event_type)) in in_window.iter().enumerate() {
        table.push_row(row(&[
            ("event_type", json!(event_type)),
            ("point_date", json!(date)),
            ("geom", point(-87.65 + index as f64 * 0.001, 41.87)),
        ]));
    }

    // Sixty more clinics earlier in 2013, outside the test window.
    let days = [2, 5, 8, 11, 14, 17, 20, 23, 26, 28];
    for month in 1..=6u32 {
        for (index, day) in days.iter().enumerate() {
            let date = NaiveDate::from_ymd_opt(2013, month, *day).unwrap();
            table.push_row(row(&[
                ("event_type", json!("Church")),
                ("point_date", json!(format!("{date}T10:00:00"))),
                ("geom", point(-87.66 + index as f64 * 0.001, 41.86)),
            ]));
        }
    }
    table
}

fn crimes() -> MemoryTable {
    let mut table = MemoryTable::new(
        "crimes",
        vec![
            ColumnInfo::new("hash", SemanticType::String),
            ColumnInfo::new("case_number", SemanticType::String),
            ColumnInfo::new("iucr", SemanticType::Integer),
            ColumnInfo::new("description", SemanticType::String),
            ColumnInfo::new("point_date", SemanticType::Timestamp),
            ColumnInfo::new("geom", SemanticType::Geometry),
        ],
    );
    let rows = [
        ("HX100001", 1150, "CREDIT CARD FRAUD", "2013-03-02T08:00:00", -87.63),
        ("HX100002", 1150, "CREDIT CARD FRAUD", "2013-06-14T23:15:00", -87.70),
        ("HW900003", 1150, "CREDIT CARD FRAUD", "1999-05-01T12:00:00", -87.61),
        ("HX100004", 820, "THEFT UNDER $500", "2013-04-04T18:40:00", -87.66),
        ("HX100005", 1320, "CRIMINAL DAMAGE", "2012-08-20T02:30:00", -87.69),
    ];
    for (case_number, iucr, description, date, lon) in rows {
        table.push_row(row(&[
            ("case_number", json!(case_number)),
            ("iucr", json!(iucr)),
            ("description", json!(description)),
            ("point_date", json!(date)),
            ("geom", point(lon, 41.89)),
        ]));
    }
    table
}

fn neighborhoods() -> MemoryTable {
    let mut table = MemoryTable::new(
        "neighborhoods",
        vec![
            ColumnInfo::new("sec_neigh", SemanticType::String),
            ColumnInfo::new("geom", SemanticType::Geometry),
        ],
    );
    table.push_row(row(&[
        ("sec_neigh", json!("WEST SIDE")),
        ("geom", polygon(-87.75, 41.80, -87.68, 41.95)),
    ]));
    table.push_row(row(&[
        ("sec_neigh", json!("EAST SIDE")),
        ("geom", polygon(-87.68, 41.80, -87.55, 41.95)),
    ]));
    table
}

fn wifi_hotspots() -> MemoryTable {
    let mut table = MemoryTable::new(
        "wifi_hotspots",
        vec![
            ColumnInfo::new("hash", SemanticType::String),
            ColumnInfo::new("venue", SemanticType::String),
            ColumnInfo::new("point_date", SemanticType::Timestamp),
            ColumnInfo::new("geom", SemanticType::Geometry),
        ],
    );
    // Three isolated points plus one coincident pair; a 500 m grid
    // cell spans roughly 0.006 degrees of longitude here, far less
    // than the 0.02-degree spacing between distinct points.
    let hotspots = [
        ("Cafe A", -87.64, 41.880),
        ("Cafe B", -87.66, 41.895),
        ("Cafe C", -87.70, 41.910),
        ("Plaza kiosk", -87.62, 41.885),
        ("Plaza kiosk annex", -87.62, 41.885),
        // Outside the query rectangle used by the grid scenario.
        ("Far suburb", -87.40, 41.700),
    ];
    for (venue, lon, lat) in hotspots {
        table.push_row(row(&[
            ("venue", json!(venue)),
            ("point_date", json!("2013-09-25T12:00:00")),
            ("geom", point(lon, lat)),
        ]));
    }
    table
}

pub fn fixture_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.add_table(flu_shot_clinics());
    store.add_table(crimes());
    store.add_table(neighborhoods());
    store.add_table(wifi_hotspots());

    store.set_meta(DatasetMeta {
        dataset_name: "flu_shot_clinics".to_string(),
        human_name: Some("Flu Shot Clinic Locations".to_string()),
        date_column: Some("point_date".to_string()),
        geometry_column: Some("geom".to_string()),
        business_key: None,
        obs_from: NaiveDate::from_ymd_opt(2013, 1, 2),
        obs_to: NaiveDate::from_ymd_opt(2013, 10, 1),
        bbox: serde_json::from_str(
            rectangle_text(-87.70, 41.85, -87.60, 41.90).as_str(),
        )
        .ok(),
    });
    store.set_meta(DatasetMeta {
        dataset_name: "crimes".to_string(),
        human_name: Some("Crimes - 2001 to present".to_string()),
        date_column: Some("point_date".to_string()),
        geometry_column: Some("geom".to_string()),
        business_key: Some("case_number".to_string()),
        obs_from: NaiveDate::from_ymd_opt(1999, 5, 1),
        obs_to: NaiveDate::from_ymd_opt(2013, 6, 14),
        bbox: None,
    });
    store
}

/// Fixed "now" anchoring default windows well after every fixture row.
pub fn fixed_now() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2014, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
