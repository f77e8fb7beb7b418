//! Request orchestration.
//!
//! Each entry point runs resolve → validate → compile → plan →
//! execute → materialize on the caller's thread. The only internal
//! parallelism is multi-dataset aggregation, which fans out one
//! store query per dataset across a bounded scoped-thread pool.

use std::thread;

use chrono::NaiveDateTime;

use crate::catalog::{Catalog, DatasetDescriptor};
use crate::geometry;
use crate::observability::Logger;
use crate::planner::{Planner, ReadQuery, TimeBucketQuery};
use crate::response::{Materializer, Payload};
use crate::store::{Row, Store, StoreError};
use crate::validator::{NormalizedQuery, Validated, Validator};

use super::errors::{EngineError, EngineResult};

/// Upper bound on concurrent per-dataset store queries.
const FAN_OUT_WIDTH: usize = 4;

/// The query engine over one store handle.
pub struct Engine<'a, S: Store> {
    store: &'a S,
}

impl<'a, S: Store> Engine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Time-bucketed counts across one or many datasets, merged keyed
    /// by dataset name. Buckets with no matching rows are omitted.
    pub fn timeseries(
        &self,
        params: &[(String, String)],
        now: NaiveDateTime,
    ) -> EngineResult<Payload> {
        let validated = self.validate(params, now)?;
        let descriptors = self.narrow(&validated.query, &validated.descriptors);
        let plans = Planner::timeseries(&validated.query, &descriptors)?;
        let rows = self.execute_fan_out(plans)?;
        Logger::info(
            "PLAN_EXECUTED",
            &[
                ("operation", "timeseries"),
                ("datasets", &validated.query.datasets.join(",")),
                ("rows", &rows.len().to_string()),
            ],
        );
        self.materialize(rows, &validated, None, now)
    }

    /// Row-level results for one dataset, newest first, optionally
    /// joined to a polygon dataset by containment.
    pub fn detail(&self, params: &[(String, String)], now: NaiveDateTime) -> EngineResult<Payload> {
        let validated = self.validate(params, now)?;
        let descriptor = &validated.descriptors[0];
        let plan = Planner::detail(&validated.query, descriptor, validated.shape.as_ref())?;
        let rows = self.execute(&plan)?;
        Logger::info(
            "PLAN_EXECUTED",
            &[
                ("operation", "detail"),
                ("dataset", &descriptor.name),
                ("rows", &rows.len().to_string()),
            ],
        );
        let geometry_column = descriptor.geometry_column.clone();
        self.materialize(rows, &validated, geometry_column.as_deref(), now)
    }

    /// Bucketed counts for a single dataset with its column filters.
    pub fn detail_aggregate(
        &self,
        params: &[(String, String)],
        now: NaiveDateTime,
    ) -> EngineResult<Payload> {
        let validated = self.validate(params, now)?;
        let plan = Planner::detail_aggregate(&validated.query, &validated.descriptors[0])?;
        let rows = self.execute(&ReadQuery::TimeBucket(plan))?;
        Logger::info(
            "PLAN_EXECUTED",
            &[
                ("operation", "detail_aggregate"),
                ("dataset", &validated.descriptors[0].name),
                ("rows", &rows.len().to_string()),
            ],
        );
        self.materialize(rows, &validated, None, now)
    }

    /// Snap-to-grid point counts, always emitted as GeoJSON cells.
    pub fn grid(&self, params: &[(String, String)], now: NaiveDateTime) -> EngineResult<Payload> {
        let validated = self.validate(params, now)?;
        let descriptor = &validated.descriptors[0];
        let latitude = self.center_latitude(&validated);
        let plan = Planner::grid(&validated.query, descriptor, latitude)?;
        let rows = self.execute(&ReadQuery::Grid(plan))?;
        Logger::info(
            "PLAN_EXECUTED",
            &[
                ("operation", "grid"),
                ("dataset", &descriptor.name),
                ("cells", &rows.len().to_string()),
            ],
        );
        Ok(Payload::GeoJson(
            Materializer::new(self.store).feature_collection(rows, "geom"),
        ))
    }

    /// Synchronous hook for external job runners: executes the
    /// aggregation plans for an already-validated specification and
    /// returns raw bucket rows.
    pub fn run(&self, query: &NormalizedQuery) -> EngineResult<Vec<Row>> {
        let catalog = Catalog::new(self.store);
        let mut descriptors = Vec::with_capacity(query.datasets.len());
        for name in &query.datasets {
            descriptors.push(catalog.resolve(name)?);
        }
        let descriptors = self.narrow(query, &descriptors);
        let plans = Planner::timeseries(query, &descriptors)?;
        self.execute_fan_out(plans)
    }

    /// Drops datasets whose recorded observation range or bounding box
    /// provably misses the query, so multi-dataset aggregation never
    /// scans a table the catalog already rules out. Datasets without a
    /// metadata record are always kept.
    fn narrow(
        &self,
        query: &NormalizedQuery,
        descriptors: &[DatasetDescriptor],
    ) -> Vec<DatasetDescriptor> {
        let survivors = Catalog::new(self.store).narrow_candidates(
            &query.datasets,
            query.window.lower.date(),
            query.window.upper.date(),
            query.geometry.as_ref(),
        );
        Logger::info(
            "DATASET_RESOLVED",
            &[
                ("candidates", &query.datasets.len().to_string()),
                ("narrowed", &survivors.join(",")),
            ],
        );
        descriptors
            .iter()
            .filter(|d| survivors.contains(&d.name))
            .cloned()
            .collect()
    }

    fn validate(
        &self,
        params: &[(String, String)],
        now: NaiveDateTime,
    ) -> EngineResult<Validated> {
        Validator::new(self.store)
            .validate(params, now)
            .map_err(|errors| {
                Logger::warn(
                    "VALIDATION_REJECTED",
                    &[("messages", &errors.len().to_string())],
                );
                EngineError::Rejected(errors)
            })
    }

    fn execute(&self, plan: &ReadQuery) -> EngineResult<Vec<Row>> {
        self.store.execute(plan).map_err(|e| {
            Logger::error("STORE_ERROR", &[("detail", &e.to_string())]);
            EngineError::Store(e)
        })
    }

    /// Executes per-dataset aggregation plans, at most `FAN_OUT_WIDTH`
    /// at a time, and fans results back in in plan order.
    fn execute_fan_out(&self, plans: Vec<TimeBucketQuery>) -> EngineResult<Vec<Row>> {
        if plans.len() <= 1 {
            let mut merged = Vec::new();
            for plan in plans {
                merged.extend(self.execute(&ReadQuery::TimeBucket(plan))?);
            }
            return Ok(merged);
        }

        let mut merged = Vec::new();
        for chunk in plans.chunks(FAN_OUT_WIDTH) {
            let results: Vec<Result<Vec<Row>, StoreError>> = thread::scope(|scope| {
                let handles: Vec<_> = chunk
                    .iter()
                    .map(|plan| {
                        scope.spawn(move || {
                            self.store.execute(&ReadQuery::TimeBucket(plan.clone()))
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| {
                        handle.join().unwrap_or_else(|_| {
                            Err(StoreError::Execution("aggregation worker panicked".into()))
                        })
                    })
                    .collect()
            });
            for result in results {
                match result {
                    Ok(rows) => merged.extend(rows),
                    Err(e) => {
                        Logger::error("STORE_ERROR", &[("detail", &e.to_string())]);
                        return Err(EngineError::Store(e));
                    }
                }
            }
        }
        Ok(merged)
    }

    fn materialize(
        &self,
        rows: Vec<Row>,
        validated: &Validated,
        geometry_column: Option<&str>,
        now: NaiveDateTime,
    ) -> EngineResult<Payload> {
        let dataset = validated
            .query
            .datasets
            .first()
            .cloned()
            .unwrap_or_else(|| "query".to_string());
        Ok(Materializer::new(self.store).materialize(
            rows,
            &validated.query,
            &dataset,
            geometry_column,
            &validated.warnings,
            now.date(),
        )?)
    }

    /// Latitude at which grid cell sizes are computed: the center of
    /// the dataset's recorded bounding box when the catalog has one,
    /// else the center of the geometry filter, else the equator.
    fn center_latitude(&self, validated: &Validated) -> f64 {
        let descriptor = &validated.descriptors[0];
        let meta_bbox = self
            .store
            .dataset_meta(&descriptor.name)
            .and_then(|meta| meta.bbox.as_ref().and_then(geometry::value_bbox));
        let bbox = meta_bbox.or_else(|| {
            validated
                .query
                .geometry
                .as_ref()
                .and_then(geometry::value_bbox)
        });
        match bbox {
            Some((_, min_y, _, max_y)) => (min_y + max_y) / 2.0,
            None => 0.0,
        }
    }
}
