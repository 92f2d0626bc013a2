//! Model Builder: translates a [`ScheduleRequest`](crate::model::ScheduleRequest)
//! into a [`ConstraintModel`] — decision variables, domains, and the hard
//! constraints plus the tardiness objective, expressed as a flat,
//! validated, side-table-indexed structure.
//!
//! This crate has no native CP engine to delegate optional intervals
//! to, so that emulation is split across two modules: this one produces
//! the flat per-operation record (eligible resources, duration,
//! precedence position) and [`crate::search`] owns the Boolean
//! assignment variable, the no-overlap propagator, and the calendar
//! disjunction.
//!
//! The builder performs no search; every error it can produce is an
//! `invalid_request` surfaced before the Search Engine ever runs.

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::error::ScheduleError;
use crate::model::{ChangeoverMatrix, ScheduleRequest};
use crate::time;

/// A resource as seen by the solver: capabilities and calendar windows in
/// minutes relative to the horizon start.
#[derive(Debug, Clone)]
pub struct ModelResource {
    pub id: String,
    pub capabilities: Vec<String>,
    /// Sorted, disjoint `[open, close)` windows in minutes, `⊆ [0, H]`.
    pub calendar_minutes: Vec<(i64, i64)>,
}

impl ModelResource {
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    /// The window containing `[start, end)`, if any.
    pub fn window_containing(&self, start: i64, end: i64) -> Option<(i64, i64)> {
        self.calendar_minutes
            .iter()
            .copied()
            .find(|&(open, close)| start >= open && end <= close)
    }
}

/// One decision variable group: an operation's duration, required
/// capability, and the resources eligible to host it (`E_i`).
#[derive(Debug, Clone)]
pub struct ModelOperation {
    pub product_id: String,
    pub op_index: usize,
    pub capability: String,
    pub duration_minutes: i64,
    /// Indices into [`ConstraintModel::resources`], `E_i`.
    pub eligible_resources: Vec<usize>,
}

/// A product's route, recorded as indices into [`ConstraintModel::operations`]
/// in strict precedence order.
#[derive(Debug, Clone)]
pub struct ModelProduct {
    pub id: String,
    pub family: String,
    pub due_minutes: i64,
    /// Indices into [`ConstraintModel::operations`], route order.
    pub op_indices: Vec<usize>,
}

/// The constraint model: decision variables, domains, and enough side tables to express every hard constraint without the
/// Search Engine needing to look back at the original request.
#[derive(Debug, Clone)]
pub struct ConstraintModel {
    pub horizon_start: DateTime<Utc>,
    pub horizon_minutes: i64,
    pub resources: Vec<ModelResource>,
    pub operations: Vec<ModelOperation>,
    pub products: Vec<ModelProduct>,
    pub changeover_matrix: ChangeoverMatrix,
}

impl ConstraintModel {
    /// The horizon start, used to convert minute offsets back to instants.
    pub fn horizon_start(&self) -> DateTime<Utc> {
        self.horizon_start
    }
}

/// Builds a [`ConstraintModel`] from a canonical request, or an
/// `invalid_request` naming every offending entity.
#[instrument(skip_all, fields(resources = request.resources.len(), products = request.products.len()))]
pub fn build(request: &ScheduleRequest) -> Result<ConstraintModel, ScheduleError> {
    let mut why = Vec::new();
    let horizon_minutes = match time::quantize_horizon(&request.horizon) {
        Ok(h) => h,
        Err(e) => return Err(e),
    };

    let resources = build_resources(request, horizon_minutes, &mut why);

    if !why.is_empty() {
        // Calendar errors make resource indices unreliable for the
        // operation pass below; fail fast rather than compound errors.
        return Err(ScheduleError::invalid_request_many(why));
    }

    let (operations, products) = build_products(request, horizon_minutes, &resources, &mut why);

    if !why.is_empty() {
        return Err(ScheduleError::invalid_request_many(why));
    }

    debug!(
        operations = operations.len(),
        products = products.len(),
        "constraint model built"
    );

    Ok(ConstraintModel {
        horizon_start: request.horizon.start,
        horizon_minutes,
        resources,
        operations,
        products,
        changeover_matrix: request.changeover_matrix.clone(),
    })
}

fn build_resources(
    request: &ScheduleRequest,
    horizon_minutes: i64,
    why: &mut Vec<String>,
) -> Vec<ModelResource> {
    let mut resources = Vec::with_capacity(request.resources.len());

    for resource in &request.resources {
        let mut windows = Vec::with_capacity(resource.calendar.len());
        let mut ok = true;
        let mut previous_close: Option<i64> = None;

        for (i, window) in resource.calendar.iter().enumerate() {
            let open = match time::to_minutes(request.horizon.start, window.open) {
                Ok(m) => m,
                Err(_) => {
                    why.push(format!(
                        "Resource {} calendar window {i} has a non-minute-aligned open time",
                        resource.id
                    ));
                    ok = false;
                    continue;
                }
            };
            let close = match time::to_minutes(request.horizon.start, window.close) {
                Ok(m) => m,
                Err(_) => {
                    why.push(format!(
                        "Resource {} calendar window {i} has a non-minute-aligned close time",
                        resource.id
                    ));
                    ok = false;
                    continue;
                }
            };

            if close <= open {
                why.push(format!(
                    "Resource {} calendar window {i} has close <= open",
                    resource.id
                ));
                ok = false;
                continue;
            }
            if open < 0 || close > horizon_minutes {
                why.push(format!(
                    "Resource {} calendar window {i} is not contained in the horizon",
                    resource.id
                ));
                ok = false;
                continue;
            }
            if let Some(prev) = previous_close {
                if open < prev {
                    why.push(format!(
                        "Resource {} calendar window {i} is not ordered/disjoint",
                        resource.id
                    ));
                    ok = false;
                    continue;
                }
            }
            previous_close = Some(close);
            windows.push((open, close));
        }

        if ok {
            resources.push(ModelResource {
                id: resource.id.clone(),
                capabilities: resource.capabilities.clone(),
                calendar_minutes: windows,
            });
        }
    }

    resources
}

fn build_products(
    request: &ScheduleRequest,
    horizon_minutes: i64,
    resources: &[ModelResource],
    why: &mut Vec<String>,
) -> (Vec<ModelOperation>, Vec<ModelProduct>) {
    let mut operations = Vec::new();
    let mut products = Vec::new();

    for product in &request.products {
        if product.route.is_empty() {
            why.push(format!("Product {} has an empty route", product.id));
            continue;
        }

        let due_minutes = match time::to_minutes(request.horizon.start, product.due) {
            Ok(m) => m,
            Err(_) => {
                why.push(format!(
                    "Product {} due date is not minute-aligned",
                    product.id
                ));
                continue;
            }
        };
        if due_minutes < 0 || due_minutes > horizon_minutes {
            why.push(format!(
                "Product {} due date does not fall within the horizon",
                product.id
            ));
            continue;
        }

        let mut op_indices = Vec::with_capacity(product.route.len());
        let mut product_ok = true;

        for (op_index, op) in product.route.iter().enumerate() {
            if op.duration_minutes <= 0 {
                why.push(format!(
                    "Product {} operation {op_index} ('{}') has a non-positive duration",
                    product.id, op.capability
                ));
                product_ok = false;
                continue;
            }

            let eligible_resources: Vec<usize> = resources
                .iter()
                .enumerate()
                .filter(|(_, r)| r.has_capability(&op.capability))
                .map(|(i, _)| i)
                .collect();

            if eligible_resources.is_empty() {
                why.push(format!(
                    "Product {} requires capability '{}' not provided by any resource",
                    product.id, op.capability
                ));
                product_ok = false;
                continue;
            }

            if eligible_resources.len() == 1 {
                let sole = &resources[eligible_resources[0]];
                if sole.calendar_minutes.is_empty() {
                    why.push(format!(
                        "Resource {} has no calendar windows and is the only resource eligible for capability '{}'",
                        sole.id, op.capability
                    ));
                    product_ok = false;
                    continue;
                }
            }

            op_indices.push(operations.len());
            operations.push(ModelOperation {
                product_id: product.id.clone(),
                op_index,
                capability: op.capability.clone(),
                duration_minutes: op.duration_minutes,
                eligible_resources,
            });
        }

        if product_ok {
            products.push(ModelProduct {
                id: product.id.clone(),
                family: product.family.clone(),
                due_minutes,
                op_indices,
            });
        }
    }

    (operations, products)
}
