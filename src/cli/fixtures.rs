//! Fixture-directory loading.
//!
//! A fixture directory holds one `<dataset>.json` per dataset:
//!
//! ```json
//! {
//!   "columns": {"iucr": "integer", "point_date": "timestamp"},
//!   "meta": {"date_column": "point_date"},
//!   "rows": [{"iucr": 1150, "point_date": "2013-09-22T10:00:00"}]
//! }
//! ```
//!
//! Geometry cells are GeoJSON text, matching the memory store's
//! encoding. Row hashes are derived on ingest when absent.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::catalog::{ColumnInfo, DatasetMeta, SemanticType};
use crate::store::memory::{MemoryStore, MemoryTable};
use crate::store::Row;

use super::errors::{CliError, CliResult};

#[derive(Debug, Deserialize)]
struct FixtureFile {
    columns: BTreeMap<String, SemanticType>,
    #[serde(default)]
    meta: Option<DatasetMeta>,
    #[serde(default)]
    rows: Vec<Row>,
}

/// Loads every `*.json` in the directory as one dataset named after
/// the file stem.
pub fn load_dir(dir: &Path) -> CliResult<MemoryStore> {
    let mut store = MemoryStore::new();
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    entries.sort();

    for path in entries {
        let Some(dataset) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let text = fs::read_to_string(&path)?;
        let fixture: FixtureFile =
            serde_json::from_str(&text).map_err(|e| CliError::Fixture {
                path: path.clone(),
                detail: e.to_string(),
            })?;

        let columns: Vec<ColumnInfo> = fixture
            .columns
            .iter()
            .map(|(name, ty)| ColumnInfo::new(name.clone(), *ty))
            .collect();
        let mut table = MemoryTable::new(dataset, columns);
        for row in fixture.rows {
            table.push_row(row);
        }
        store.add_table(table);

        if let Some(mut meta) = fixture.meta {
            if meta.dataset_name.is_empty() {
                meta.dataset_name = dataset.to_string();
            }
            store.set_meta(meta);
        }
    }
    Ok(store)
}
