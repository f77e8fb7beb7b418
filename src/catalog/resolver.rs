//! Per-request dataset resolution against the live store.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::errors::{CatalogError, CatalogResult};
use super::types::{DatasetDescriptor, SemanticType};
use crate::geometry::fragment::value_bbox;
use crate::store::{Store, StoreError};

/// Resolves dataset names to live table descriptors.
///
/// Pure read path: resolution introspects the store on every call, so
/// callers resolve once per request and reuse the result. The only
/// shared state is the store handle itself, which is read-only here.
pub struct Catalog<'a, S: Store> {
    store: &'a S,
}

impl<'a, S: Store> Catalog<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Resolves a dataset name to a descriptor, or `DatasetNotFound`.
    ///
    /// Date/geometry/business-key designations come from the catalog
    /// metadata record when it exists, falling back to the project
    /// naming convention (`point_date`, `geom`, first column of the
    /// right semantic type). Business keys have no convention fallback.
    pub fn resolve(&self, dataset_name: &str) -> CatalogResult<DatasetDescriptor> {
        let column_list = match self.store.table_columns(dataset_name) {
            Ok(cols) => cols,
            Err(StoreError::NoSuchTable(_)) => {
                return Err(CatalogError::DatasetNotFound(dataset_name.to_string()))
            }
            Err(other) => return Err(CatalogError::Store(other)),
        };
        if column_list.is_empty() {
            return Err(CatalogError::EmptyColumnMap(dataset_name.to_string()));
        }

        let mut columns = BTreeMap::new();
        for col in &column_list {
            columns.insert(col.name.clone(), col.semantic_type);
        }

        let meta = self.store.dataset_meta(dataset_name);

        let date_column = meta
            .as_ref()
            .and_then(|m| m.date_column.clone())
            .filter(|c| columns.get(c) == Some(&SemanticType::Timestamp))
            .or_else(|| conventional_column(&columns, "point_date", SemanticType::Timestamp));

        let geometry_column = meta
            .as_ref()
            .and_then(|m| m.geometry_column.clone())
            .filter(|c| columns.get(c) == Some(&SemanticType::Geometry))
            .or_else(|| conventional_column(&columns, "geom", SemanticType::Geometry));

        let business_key = meta
            .as_ref()
            .and_then(|m| m.business_key.clone())
            .filter(|c| columns.contains_key(c));

        Ok(DatasetDescriptor {
            name: dataset_name.to_string(),
            table: dataset_name.to_string(),
            columns,
            date_column,
            geometry_column,
            business_key,
        })
    }

    /// Narrows a candidate dataset list to those whose observed date
    /// range intersects the window and, when a geometry filter is
    /// present, whose bounding box intersects the filter's bounding box.
    ///
    /// Datasets without a metadata record are kept; only a recorded
    /// range that provably misses the query excludes a dataset.
    pub fn narrow_candidates(
        &self,
        dataset_names: &[String],
        start: NaiveDate,
        end: NaiveDate,
        geometry: Option<&serde_json::Value>,
    ) -> Vec<String> {
        let filter_bbox = geometry.and_then(value_bbox);

        dataset_names
            .iter()
            .filter(|name| {
                let meta = match self.store.dataset_meta(name) {
                    Some(m) => m,
                    None => return true,
                };
                if let (Some(from), Some(to)) = (meta.obs_from, meta.obs_to) {
                    if from > end || to < start {
                        return false;
                    }
                }
                if let (Some(fb), Some(db)) =
                    (filter_bbox, meta.bbox.as_ref().and_then(value_bbox))
                {
                    if fb.0 > db.2 || fb.2 < db.0 || fb.1 > db.3 || fb.3 < db.1 {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect()
    }
}

/// Convention fallback: the named column if it has the wanted type,
/// else the first column of that type in name order.
fn conventional_column(
    columns: &BTreeMap<String, SemanticType>,
    preferred: &str,
    wanted: SemanticType,
) -> Option<String> {
    if columns.get(preferred) == Some(&wanted) {
        return Some(preferred.to_string());
    }
    columns
        .iter()
        .find(|(_, ty)| **ty == wanted)
        .map(|(name, _)| name.clone())
}
