//! Read-query planning.
//!
//! Turns a normalized query plus resolved descriptors into executable
//! `ReadQuery` plans. Planning is deterministic: the same specification
//! and descriptors always yield the same plan.

use crate::catalog::DatasetDescriptor;
use crate::condition::{Expr, Operator, Scalar};
use crate::geometry;
use crate::validator::NormalizedQuery;

use super::ast::{
    DetailJoinQuery, GridQuery, OrderBy, ReadQuery, SelectQuery, ShapeJoinQuery, TimeBucketQuery,
};
use super::errors::{PlannerError, PlannerResult};

/// Plans read queries against resolved dataset descriptors.
pub struct Planner;

impl Planner {
    /// One time-bucket plan per target dataset, all sharing the query's
    /// window, geometry and hour bounds, each carrying its own compiled
    /// filter tree.
    pub fn timeseries(
        query: &NormalizedQuery,
        descriptors: &[DatasetDescriptor],
    ) -> PlannerResult<Vec<TimeBucketQuery>> {
        descriptors
            .iter()
            .map(|desc| Self::time_bucket_for(query, desc))
            .collect()
    }

    /// Time-bucket plan for a single dataset.
    pub fn detail_aggregate(
        query: &NormalizedQuery,
        descriptor: &DatasetDescriptor,
    ) -> PlannerResult<TimeBucketQuery> {
        Self::time_bucket_for(query, descriptor)
    }

    /// Row-level plan: a paged select ordered by observation time
    /// descending, or a shape join when a polygon dataset is attached.
    pub fn detail(
        query: &NormalizedQuery,
        descriptor: &DatasetDescriptor,
        shape: Option<&DatasetDescriptor>,
    ) -> PlannerResult<ReadQuery> {
        let date_column = Self::date_column(descriptor)?;
        let predicate = Self::base_predicate(query, descriptor)?;

        match shape {
            None => Ok(ReadQuery::Select(SelectQuery {
                table: descriptor.table.clone(),
                predicate,
                order: Some(OrderBy::desc(date_column)),
                limit: Some(query.limit),
                offset: query.offset,
            })),
            Some(shape_desc) => {
                let point_geometry = Self::geometry_column(descriptor)?;
                let shape_geometry = Self::geometry_column(shape_desc)?;
                let shape_predicate = query.filter_for(&shape_desc.name).cloned();
                Ok(ReadQuery::ShapeJoin(ShapeJoinQuery {
                    point_table: descriptor.table.clone(),
                    point_geometry_column: point_geometry,
                    shape_table: shape_desc.table.clone(),
                    shape_geometry_column: shape_geometry,
                    predicate,
                    shape_predicate,
                    per_shape_counts: false,
                    order: Some(OrderBy::desc(date_column)),
                    limit: Some(query.limit),
                    offset: query.offset,
                }))
            }
        }
    }

    /// Per-polygon count plan: points falling inside each polygon of
    /// the shape dataset, after the usual window and filter predicates.
    pub fn shape_aggregate(
        query: &NormalizedQuery,
        descriptor: &DatasetDescriptor,
        shape_desc: &DatasetDescriptor,
    ) -> PlannerResult<ShapeJoinQuery> {
        let predicate = Self::base_predicate(query, descriptor)?;
        Ok(ShapeJoinQuery {
            point_table: descriptor.table.clone(),
            point_geometry_column: Self::geometry_column(descriptor)?,
            shape_table: shape_desc.table.clone(),
            shape_geometry_column: Self::geometry_column(shape_desc)?,
            predicate,
            shape_predicate: query.filter_for(&shape_desc.name).cloned(),
            per_shape_counts: true,
            order: None,
            limit: None,
            offset: 0,
        })
    }

    /// Snap-to-grid plan. Cell edge lengths are converted from meters
    /// to degrees at `center_latitude`, so cells stay square on the
    /// ground rather than in coordinate space.
    pub fn grid(
        query: &NormalizedQuery,
        descriptor: &DatasetDescriptor,
        center_latitude: f64,
    ) -> PlannerResult<GridQuery> {
        let geometry_column = Self::geometry_column(descriptor)?;
        let predicate = Self::base_predicate(query, descriptor)?;
        let (cell_x, cell_y) = geometry::size_in_degrees(query.resolution_meters, center_latitude);
        Ok(GridQuery {
            table: descriptor.table.clone(),
            geometry_column,
            predicate,
            cell_x,
            cell_y,
        })
    }

    /// Master/detail join plan keyed through the master's declared
    /// business key. Both sides must carry the key column.
    pub fn detail_join(
        query: &NormalizedQuery,
        master: &DatasetDescriptor,
        detail: &DatasetDescriptor,
    ) -> PlannerResult<DetailJoinQuery> {
        let key = master
            .business_key
            .clone()
            .ok_or_else(|| PlannerError::JoinKeyMissing {
                dataset: master.name.clone(),
            })?;
        if !detail.has_column(&key) {
            return Err(PlannerError::JoinKeyMissing {
                dataset: detail.name.clone(),
            });
        }
        Ok(DetailJoinQuery {
            master_table: master.table.clone(),
            master_key: key.clone(),
            master_date_column: Self::date_column(master)?,
            detail_table: detail.table.clone(),
            detail_key: key,
            predicate: Self::base_predicate(query, master)?,
            detail_predicate: query.filter_for(&detail.name).cloned(),
            limit: Some(query.limit),
            offset: query.offset,
        })
    }

    fn time_bucket_for(
        query: &NormalizedQuery,
        descriptor: &DatasetDescriptor,
    ) -> PlannerResult<TimeBucketQuery> {
        let date_column = Self::date_column(descriptor)?;
        let predicate = Self::base_predicate(query, descriptor)?;
        Ok(TimeBucketQuery {
            dataset_name: descriptor.name.clone(),
            table: descriptor.table.clone(),
            date_column,
            unit: query.agg,
            predicate,
        })
    }

    /// The shared predicate every plan starts from: the observation
    /// window, optional hour-of-day bounds, optional geometry
    /// containment, and the dataset's own compiled filter tree.
    fn base_predicate(
        query: &NormalizedQuery,
        descriptor: &DatasetDescriptor,
    ) -> PlannerResult<Option<Expr>> {
        let date_column = Self::date_column(descriptor)?;
        let mut parts = vec![
            Expr::compare(
                date_column.clone(),
                Operator::Ge,
                Scalar::Timestamp(query.window.lower),
            ),
            Expr::compare(
                date_column.clone(),
                Operator::Le,
                Scalar::Timestamp(query.window.upper),
            ),
        ];

        if let Some(hour) = query.hour_lower {
            parts.push(Expr::HourOfDay {
                column: date_column.clone(),
                op: Operator::Ge,
                hour,
            });
        }
        if let Some(hour) = query.hour_upper {
            parts.push(Expr::HourOfDay {
                column: date_column.clone(),
                op: Operator::Le,
                hour,
            });
        }

        if let Some(fragment) = &query.geometry {
            let geometry_column = Self::geometry_column(descriptor)?;
            let buffered = geometry::make_fragment(fragment, query.buffer_meters)?;
            parts.push(Expr::Within {
                column: geometry_column,
                fragment: buffered.as_value().clone(),
            });
        }

        if let Some(filter) = query.filter_for(&descriptor.name) {
            parts.push(filter.clone());
        }

        Ok(Expr::all(parts))
    }

    fn date_column(descriptor: &DatasetDescriptor) -> PlannerResult<String> {
        descriptor
            .date_column
            .clone()
            .ok_or_else(|| PlannerError::MissingDateColumn {
                dataset: descriptor.name.clone(),
            })
    }

    fn geometry_column(descriptor: &DatasetDescriptor) -> PlannerResult<String> {
        descriptor
            .geometry_column
            .clone()
            .ok_or_else(|| PlannerError::MissingGeometryColumn {
                dataset: descriptor.name.clone(),
            })
    }
}
