//! Validator & KPI Pass: independently re-verifies every hard
//! constraint on a returned assignment list, then computes the reported
//! metrics.
//!
//! This module takes only `&ScheduleRequest` and `&[Assignment]` — never
//! the [`crate::build::ConstraintModel`] or any Search Engine state — so
//! a bug shared between the Model Builder and the Search Engine cannot
//! also hide inside the validator. It re-derives every structural fact
//! from the request, the way a generic scheduling framework's validator
//! re-derives structural facts from `&[Task]`/`&[Resource]` rather than
//! trusting solver-internal state.
//!
//! Any failure here is fatal: the Search Engine has violated its
//! contract, and the caller gets `internal_validation_failed` instead of
//! a schedule.

use std::collections::HashMap;

use tracing::{instrument, warn};

use crate::error::ScheduleError;
use crate::model::{Assignment, Kpis, ScheduleRequest};

/// Re-verifies `assignments` against `request` and computes KPIs.
///
/// Returns `Ok(Kpis)` only if every hard constraint holds; otherwise
/// `Err(ScheduleError::InternalValidationFailed)` naming every violation
/// found.
#[instrument(skip_all, fields(assignments = assignments.len()))]
pub fn validate(request: &ScheduleRequest, assignments: &[Assignment]) -> Result<Kpis, ScheduleError> {
    let mut why = Vec::new();

    check_exactly_one_assignment_per_operation(request, assignments, &mut why);
    check_durations(request, assignments, &mut why);
    check_precedence(request, assignments, &mut why);
    check_no_overlap(assignments, &mut why);
    check_calendar_and_capability(request, assignments, &mut why);
    check_within_horizon(request, assignments, &mut why);

    if !why.is_empty() {
        warn!(violations = why.len(), "validation failed");
        return Err(ScheduleError::internal_validation_failed_many(why));
    }

    Ok(compute_kpis(request, assignments))
}

fn check_exactly_one_assignment_per_operation(
    request: &ScheduleRequest,
    assignments: &[Assignment],
    why: &mut Vec<String>,
) {
    let mut counts: HashMap<(&str, usize), usize> = HashMap::new();
    for a in assignments {
        *counts.entry((a.product_id.as_str(), a.op_index)).or_insert(0) += 1;
    }

    for product in &request.products {
        for op_index in 0..product.route.len() {
            match counts.get(&(product.id.as_str(), op_index)) {
                None | Some(0) => why.push(format!(
                    "Product {} operation {op_index} has no assignment",
                    product.id
                )),
                Some(1) => {}
                Some(n) => why.push(format!(
                    "Product {} operation {op_index} has {n} assignments, expected exactly one",
                    product.id
                )),
            }
        }
    }

    let known: std::collections::HashSet<(&str, usize)> = request
        .products
        .iter()
        .flat_map(|p| (0..p.route.len()).map(move |i| (p.id.as_str(), i)))
        .collect();
    for a in assignments {
        if !known.contains(&(a.product_id.as_str(), a.op_index)) {
            why.push(format!(
                "Assignment references unknown operation {} of product {}",
                a.op_index, a.product_id
            ));
        }
    }
}

fn check_durations(request: &ScheduleRequest, assignments: &[Assignment], why: &mut Vec<String>) {
    for a in assignments {
        let Some(product) = request.product(&a.product_id) else {
            continue;
        };
        let Some(op) = product.route.get(a.op_index) else {
            continue;
        };
        let actual = a.end.signed_duration_since(a.start).num_minutes();
        if actual != op.duration_minutes {
            why.push(format!(
                "Product {} operation {} duration is {actual} minutes, expected {}",
                a.product_id, a.op_index, op.duration_minutes
            ));
        }
    }
}

fn check_precedence(request: &ScheduleRequest, assignments: &[Assignment], why: &mut Vec<String>) {
    let by_op: HashMap<(&str, usize), &Assignment> = assignments
        .iter()
        .map(|a| ((a.product_id.as_str(), a.op_index), a))
        .collect();

    for product in &request.products {
        for op_index in 1..product.route.len() {
            let (Some(prev), Some(cur)) = (
                by_op.get(&(product.id.as_str(), op_index - 1)),
                by_op.get(&(product.id.as_str(), op_index)),
            ) else {
                continue;
            };
            if cur.start < prev.end {
                why.push(format!(
                    "Product {} operation {op_index} starts before operation {} ends",
                    product.id,
                    op_index - 1
                ));
            }
        }
    }
}

fn check_no_overlap(assignments: &[Assignment], why: &mut Vec<String>) {
    let mut by_resource: HashMap<&str, Vec<&Assignment>> = HashMap::new();
    for a in assignments {
        by_resource.entry(a.resource_id.as_str()).or_default().push(a);
    }

    for (resource_id, mut on_resource) in by_resource {
        on_resource.sort_by_key(|a| a.start);
        for pair in on_resource.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a.end > b.start {
                why.push(format!(
                    "Resource {resource_id} has overlapping assignments: {} op {} [{}, {}) and {} op {} [{}, {})",
                    a.product_id, a.op_index, a.start, a.end, b.product_id, b.op_index, b.start, b.end
                ));
            }
        }
    }
}

fn check_calendar_and_capability(request: &ScheduleRequest, assignments: &[Assignment], why: &mut Vec<String>) {
    for a in assignments {
        let Some(resource) = request.resource(&a.resource_id) else {
            why.push(format!(
                "Assignment for product {} references unknown resource {}",
                a.product_id, a.resource_id
            ));
            continue;
        };

        if !resource.has_capability(&a.capability) {
            why.push(format!(
                "Resource {} does not have capability '{}' required by product {} operation {}",
                resource.id, a.capability, a.product_id, a.op_index
            ));
        }

        let fits_a_window = resource
            .calendar
            .iter()
            .any(|w| w.open <= a.start && a.end <= w.close);
        if !fits_a_window {
            why.push(format!(
                "Product {} operation {} [{}, {}) does not fit in any calendar window of resource {}",
                a.product_id, a.op_index, a.start, a.end, resource.id
            ));
        }
    }
}

fn check_within_horizon(request: &ScheduleRequest, assignments: &[Assignment], why: &mut Vec<String>) {
    for a in assignments {
        if a.start < request.horizon.start || a.end > request.horizon.end {
            why.push(format!(
                "Product {} operation {} [{}, {}) falls outside the horizon [{}, {}]",
                a.product_id, a.op_index, a.start, a.end, request.horizon.start, request.horizon.end
            ));
        }
    }
}

fn compute_kpis(request: &ScheduleRequest, assignments: &[Assignment]) -> Kpis {
    let tardiness_minutes = tardiness(request, assignments);
    let makespan_minutes = makespan(request, assignments);
    let utilization = utilization(request, assignments);
    let changeovers = changeovers(request, assignments);

    Kpis {
        tardiness_minutes,
        changeovers,
        makespan_minutes,
        utilization,
    }
}

fn tardiness(request: &ScheduleRequest, assignments: &[Assignment]) -> i64 {
    let mut completion: HashMap<&str, chrono::DateTime<chrono::Utc>> = HashMap::new();
    for a in assignments {
        completion
            .entry(a.product_id.as_str())
            .and_modify(|c| *c = (*c).max(a.end))
            .or_insert(a.end);
    }

    request
        .products
        .iter()
        .filter_map(|p| completion.get(p.id.as_str()).map(|&c| (c, p.due)))
        .map(|(c, due)| (c.signed_duration_since(due).num_minutes()).max(0))
        .sum()
}

fn makespan(_request: &ScheduleRequest, assignments: &[Assignment]) -> i64 {
    let Some(min_start) = assignments.iter().map(|a| a.start).min() else {
        return 0;
    };
    let max_end = assignments.iter().map(|a| a.end).max().unwrap();
    max_end.signed_duration_since(min_start).num_minutes()
}

fn utilization(request: &ScheduleRequest, assignments: &[Assignment]) -> HashMap<String, i64> {
    let mut busy: HashMap<&str, i64> = HashMap::new();
    for a in assignments {
        let minutes = a.end.signed_duration_since(a.start).num_minutes();
        *busy.entry(a.resource_id.as_str()).or_insert(0) += minutes;
    }

    request
        .resources
        .iter()
        .map(|r| {
            let available: i64 = r
                .calendar
                .iter()
                .map(|w| {
                    let open = w.open.max(request.horizon.start);
                    let close = w.close.min(request.horizon.end);
                    (close.signed_duration_since(open).num_minutes()).max(0)
                })
                .sum();

            let pct = if available == 0 {
                0
            } else {
                let busy_minutes = busy.get(r.id.as_str()).copied().unwrap_or(0);
                ((busy_minutes as f64 / available as f64) * 100.0).round() as i64
            };
            (r.id.clone(), pct)
        })
        .collect()
}

fn changeovers(request: &ScheduleRequest, assignments: &[Assignment]) -> i64 {
    let family_of: HashMap<&str, &str> = request
        .products
        .iter()
        .map(|p| (p.id.as_str(), p.family.as_str()))
        .collect();

    let mut by_resource: HashMap<&str, Vec<&Assignment>> = HashMap::new();
    for a in assignments {
        by_resource.entry(a.resource_id.as_str()).or_default().push(a);
    }

    let mut count = 0i64;
    for mut on_resource in by_resource.into_values() {
        on_resource.sort_by_key(|a| a.start);
        for pair in on_resource.windows(2) {
            let fam_a = family_of.get(pair[0].product_id.as_str());
            let fam_b = family_of.get(pair[1].product_id.as_str());
            if fam_a.is_some() && fam_a != fam_b {
                count += 1;
            }
        }
    }
    count
}
