//! Search Engine: solves a [`ConstraintModel`] under a wall-clock
//! budget and returns an [`Outcome`].
//!
//! **Concrete strategy.** A depth-first branch-and-bound search over
//! *active schedules*: at every node, each product whose route still
//! has unscheduled operations contributes one ready candidate (its next
//! operation, precedence already having fixed the earliest time it may
//! start); the search branches over every `(ready product, eligible
//! resource)` pair, committing the operation to the earliest start on
//! that resource that fits a calendar window and does not overlap any
//! interval already committed to that resource, then recurses. Every
//! product's operations are still only ever placed in route order (the
//! next op only becomes ready once its predecessor is placed), but
//! *which product's ready operation is scheduled next*, and *into which
//! gap of which resource's timeline*, is fully backtracked rather than
//! fixed in advance. This is a classical active-schedule generation
//! scheme (Giffler & Thompson): because the objective here is regular
//! (non-decreasing in completion times), some active schedule is always
//! optimal, and this search enumerates all of them, so a DFS that
//! completes within budget proves the objective globally minimal —
//! [`Outcome::Optimal`] is sound. Ready products are visited due-date
//! ascending then id, and eligible resources ascending by id, at every
//! branch, which makes the exploration — and therefore the `Outcome`
//! for a fixed model and time limit — deterministic.
//!
//! A lower bound (already-fixed tardiness for completed products, plus
//! each pending product's tardiness if its remaining operations ran
//! back-to-back from its current predecessor end with no further
//! resource contention) prunes branches that cannot beat the best
//! incumbent; the bound is admissible because resource contention can
//! only delay completion further, never pull it earlier.

use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use crate::build::ConstraintModel;
use crate::model::Assignment;
use crate::time;

/// The result of a `solve` call.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Search completed and proved the objective globally minimal.
    Optimal {
        assignments: Vec<Assignment>,
        objective: i64,
    },
    /// The time limit expired after at least one feasible solution was
    /// found; `objective` is the best known.
    Feasible {
        assignments: Vec<Assignment>,
        objective: i64,
    },
    /// No assignment satisfies the constraints.
    Infeasible { reason: String },
    /// The time limit expired before any feasible solution was found.
    Unknown,
}

#[derive(Debug, Clone, Copy)]
struct PlacedOp {
    operation_idx: usize,
    resource_idx: usize,
    start: i64,
    end: i64,
}

/// Mutable search state, backtracked in lockstep with the DFS.
struct State {
    /// Per product, how many of its route operations have been placed.
    next_op_ptr: Vec<usize>,
    /// Per product, the end time of its last placed operation (0 if none).
    predecessor_end: Vec<i64>,
    /// Per resource, committed `[start, end)` intervals, kept sorted by start.
    committed: Vec<Vec<(i64, i64)>>,
    placed: Vec<PlacedOp>,
    remaining_products: usize,
}

/// Solves `model` under `time_limit_seconds`, per the `Outcome` contract
/// above, including the zero-budget and empty-model boundary cases.
#[instrument(skip_all, fields(operations = model.operations.len(), time_limit_seconds))]
pub fn solve(model: &ConstraintModel, time_limit_seconds: i64) -> Outcome {
    if model.operations.is_empty() {
        info!("empty model, reporting Optimal with no assignments");
        return Outcome::Optimal {
            assignments: Vec::new(),
            objective: 0,
        };
    }

    if time_limit_seconds <= 0 {
        warn!("time_limit_seconds <= 0, reporting Unknown without searching");
        return Outcome::Unknown;
    }

    let deadline = Instant::now() + Duration::from_secs(time_limit_seconds as u64);

    let mut product_order: Vec<usize> = (0..model.products.len()).collect();
    product_order.sort_by(|&a, &b| {
        let pa = &model.products[a];
        let pb = &model.products[b];
        pa.due_minutes.cmp(&pb.due_minutes).then_with(|| pa.id.cmp(&pb.id))
    });

    let sorted_eligible: Vec<Vec<usize>> = model
        .operations
        .iter()
        .map(|op| {
            let mut resources = op.eligible_resources.clone();
            resources.sort_by(|&a, &b| model.resources[a].id.cmp(&model.resources[b].id));
            resources
        })
        .collect();

    let mut state = State {
        next_op_ptr: vec![0; model.products.len()],
        predecessor_end: vec![0; model.products.len()],
        committed: vec![Vec::new(); model.resources.len()],
        placed: Vec::new(),
        remaining_products: model.products.iter().filter(|p| !p.op_indices.is_empty()).count(),
    };

    let mut best: Option<(Vec<PlacedOp>, i64)> = None;
    let mut timed_out = false;

    search(
        model,
        &product_order,
        &sorted_eligible,
        &mut state,
        0,
        &mut best,
        deadline,
        &mut timed_out,
    );

    match best {
        Some((placements, objective)) => {
            let assignments = to_assignments(model, &placements);
            if timed_out {
                info!(objective, "time limit expired with a feasible incumbent");
                Outcome::Feasible {
                    assignments,
                    objective,
                }
            } else {
                info!(objective, "search space exhausted, reporting Optimal");
                Outcome::Optimal {
                    assignments,
                    objective,
                }
            }
        }
        None if timed_out => {
            info!("time limit expired before any feasible solution was found");
            Outcome::Unknown
        }
        None => {
            info!("search space exhausted with no feasible solution");
            Outcome::Infeasible {
                reason: "no assignment of resources and start times satisfies the calendar, \
                         precedence, and no-overlap constraints"
                    .to_string(),
            }
        }
    }
}

/// A valid lower bound on the final objective given the operations
/// already placed: fixed tardiness for completed products, plus, for
/// each pending product, the tardiness incurred if its remaining route
/// ran back-to-back from its current predecessor end with no further
/// waiting on any resource. Resource contention can only push a
/// completion later, never earlier, so this never overestimates the
/// true objective reachable from this node.
fn lower_bound(model: &ConstraintModel, state: &State, partial_objective: i64) -> i64 {
    let mut bound = partial_objective;
    for (product_idx, product) in model.products.iter().enumerate() {
        let ptr = state.next_op_ptr[product_idx];
        if ptr >= product.op_indices.len() {
            continue; // already contributed to partial_objective
        }
        let remaining_duration: i64 = product.op_indices[ptr..]
            .iter()
            .map(|&op_idx| model.operations[op_idx].duration_minutes)
            .sum();
        let earliest_completion = state.predecessor_end[product_idx] + remaining_duration;
        bound += (earliest_completion - product.due_minutes).max(0);
    }
    bound
}

#[allow(clippy::too_many_arguments)]
fn search(
    model: &ConstraintModel,
    product_order: &[usize],
    sorted_eligible: &[Vec<usize>],
    state: &mut State,
    partial_objective: i64,
    best: &mut Option<(Vec<PlacedOp>, i64)>,
    deadline: Instant,
    timed_out: &mut bool,
) {
    if *timed_out {
        return;
    }
    if Instant::now() >= deadline {
        *timed_out = true;
        return;
    }

    if state.remaining_products == 0 {
        let is_better = match best {
            None => true,
            Some((_, obj)) => partial_objective < *obj,
        };
        if is_better {
            *best = Some((state.placed.clone(), partial_objective));
        }
        return;
    }

    if let Some((_, best_objective)) = best {
        if lower_bound(model, state, partial_objective) >= *best_objective {
            return; // branch-and-bound prune
        }
    }

    for &product_idx in product_order {
        let product = &model.products[product_idx];
        let ptr = state.next_op_ptr[product_idx];
        if ptr == product.op_indices.len() {
            continue; // this product's route is already fully placed
        }

        let operation_idx = product.op_indices[ptr];
        let op = &model.operations[operation_idx];
        let is_last_op = ptr + 1 == product.op_indices.len();
        let earliest = state.predecessor_end[product_idx];

        for &resource_idx in &sorted_eligible[operation_idx] {
            let resource = &model.resources[resource_idx];
            let Some(start) =
                earliest_feasible_start(&resource.calendar_minutes, &state.committed[resource_idx], earliest, op.duration_minutes)
            else {
                continue;
            };
            let end = start + op.duration_minutes;

            let insert_at = state.committed[resource_idx].partition_point(|&(s, _)| s < start);
            state.committed[resource_idx].insert(insert_at, (start, end));
            state.placed.push(PlacedOp {
                operation_idx,
                resource_idx,
                start,
                end,
            });
            let saved_predecessor_end = state.predecessor_end[product_idx];
            state.predecessor_end[product_idx] = end;
            state.next_op_ptr[product_idx] += 1;
            if is_last_op {
                state.remaining_products -= 1;
            }

            let mut next_objective = partial_objective;
            if is_last_op {
                next_objective += (end - product.due_minutes).max(0);
            }

            search(model, product_order, sorted_eligible, state, next_objective, best, deadline, timed_out);

            if is_last_op {
                state.remaining_products += 1;
            }
            state.next_op_ptr[product_idx] -= 1;
            state.predecessor_end[product_idx] = saved_predecessor_end;
            state.placed.pop();
            state.committed[resource_idx].remove(insert_at);

            if *timed_out {
                return;
            }
        }
    }
}

/// The earliest `start >= earliest` such that `[start, start + duration)`
/// fits entirely inside one of `windows` and overlaps none of the
/// intervals already `committed` to this resource.
fn earliest_feasible_start(windows: &[(i64, i64)], committed: &[(i64, i64)], earliest: i64, duration: i64) -> Option<i64> {
    for &(open, close) in windows {
        if let Some(start) = earliest_start_in_window(open, close, committed, earliest, duration) {
            return Some(start);
        }
    }
    None
}

/// The earliest `start` inside a single `[open, close)` window, no
/// earlier than `earliest`, such that `[start, start + duration)` fits
/// in the window and overlaps no already-committed interval.
fn earliest_start_in_window(open: i64, close: i64, committed: &[(i64, i64)], earliest: i64, duration: i64) -> Option<i64> {
    let mut candidate = earliest.max(open);
    loop {
        if candidate + duration > close {
            return None;
        }
        let blocking = committed
            .iter()
            .find(|&&(c_start, c_end)| c_end > candidate && c_start < candidate + duration);
        match blocking {
            Some(&(_, c_end)) => candidate = c_end,
            None => return Some(candidate),
        }
    }
}

fn to_assignments(model: &ConstraintModel, placements: &[PlacedOp]) -> Vec<Assignment> {
    placements
        .iter()
        .map(|p| {
            let op = &model.operations[p.operation_idx];
            let resource = &model.resources[p.resource_idx];
            Assignment::new(
                op.product_id.clone(),
                op.op_index,
                op.capability.clone(),
                resource.id.clone(),
                time::to_instant(model.horizon_start(), p.start),
                time::to_instant(model.horizon_start(), p.end),
            )
        })
        .collect()
}
