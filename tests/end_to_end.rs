//! Black-box acceptance tests against the public `solve` entry point,
//! covering the six end-to-end scenarios and the boundary behaviors.
//!
//! The crate's own inline `#[cfg(test)]` modules exercise individual
//! stages; these tests exercise the whole pipeline the way an external
//! collaborator (an HTTP adapter, say) would call it.

use chrono::{DateTime, TimeZone, Utc};

use mfg_scheduler::model::{ChangeoverMatrix, Horizon, Operation, Product, Resource, ScheduleRequest};
use mfg_scheduler::schedule::solve;

fn dt(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 3, h, m, 0).unwrap()
}

#[test]
fn scenario_1_single_product_single_resource_fits() {
    let req = ScheduleRequest::new(Horizon::new(dt(8, 0), dt(16, 0)))
        .with_resource(Resource::new("Fill-1").with_capability("fill").with_window(dt(8, 0), dt(16, 0)))
        .with_product(Product::new("P1", "standard", dt(12, 0)).with_operation(Operation::new("fill", 30)));

    let response = solve(&req).unwrap();
    assert_eq!(response.assignments.len(), 1);
    let a = &response.assignments[0];
    assert_eq!(a.start, dt(8, 0));
    assert_eq!(a.end, dt(8, 30));

    assert_eq!(response.kpis.tardiness_minutes, 0);
    assert_eq!(response.kpis.changeovers, 0);
    assert_eq!(response.kpis.makespan_minutes, 30);
    assert_eq!(response.kpis.utilization["Fill-1"], 6);
}

#[test]
fn scenario_2_break_splits_calendar() {
    let req = ScheduleRequest::new(Horizon::new(dt(8, 0), dt(16, 0)))
        .with_resource(
            Resource::new("Fill-1")
                .with_capability("fill")
                .with_window(dt(8, 0), dt(12, 0))
                .with_window(dt(12, 30), dt(16, 0)),
        )
        .with_product(Product::new("P1", "standard", dt(12, 0)).with_operation(Operation::new("fill", 45)));

    let response = solve(&req).unwrap();
    let a = &response.assignments[0];
    assert!(a.end <= dt(12, 0) || a.start >= dt(12, 30));
}

#[test]
fn scenario_3_precedence_chain() {
    let req = ScheduleRequest::new(Horizon::new(dt(8, 0), dt(20, 0)))
        .with_resource(Resource::new("Fill-1").with_capability("fill").with_window(dt(8, 0), dt(20, 0)))
        .with_resource(Resource::new("Label-1").with_capability("label").with_window(dt(8, 0), dt(20, 0)))
        .with_resource(Resource::new("Pack-1").with_capability("pack").with_window(dt(8, 0), dt(20, 0)))
        .with_product(
            Product::new("P1", "standard", dt(10, 0))
                .with_operation(Operation::new("fill", 30))
                .with_operation(Operation::new("label", 20))
                .with_operation(Operation::new("pack", 15)),
        );

    let response = solve(&req).unwrap();
    assert_eq!(response.assignments.len(), 3);
    assert!(response.assignments[0].end <= response.assignments[1].start);
    assert!(response.assignments[1].end <= response.assignments[2].start);

    let pack_end = response.assignments[2].end;
    let expected_tardiness = (pack_end - dt(10, 0)).num_minutes().max(0);
    assert_eq!(response.kpis.tardiness_minutes, expected_tardiness);
}

#[test]
fn scenario_4_two_products_same_family_share_a_resource() {
    let req = ScheduleRequest::new(Horizon::new(dt(8, 0), dt(16, 0)))
        .with_resource(Resource::new("Fill-1").with_capability("fill").with_window(dt(8, 0), dt(16, 0)))
        .with_product(Product::new("P1", "standard", dt(12, 0)).with_operation(Operation::new("fill", 30)))
        .with_product(Product::new("P2", "standard", dt(12, 0)).with_operation(Operation::new("fill", 30)));

    let response = solve(&req).unwrap();
    assert_eq!(response.assignments.len(), 2);
    let (a, b) = (&response.assignments[0], &response.assignments[1]);
    assert!(a.end <= b.start || b.end <= a.start);
    assert_eq!(response.kpis.changeovers, 0);
}

#[test]
fn scenario_5_changeover_across_families_is_reported_not_enforced() {
    let req = ScheduleRequest::new(Horizon::new(dt(8, 0), dt(16, 0)))
        .with_resource(Resource::new("Fill-1").with_capability("fill").with_window(dt(8, 0), dt(16, 0)))
        .with_product(Product::new("P1", "standard", dt(12, 0)).with_operation(Operation::new("fill", 30)))
        .with_product(Product::new("P2", "premium", dt(12, 0)).with_operation(Operation::new("fill", 30)))
        .with_changeover_matrix(ChangeoverMatrix::new().with_pair("standard", "premium", 20));

    let response = solve(&req).unwrap();
    assert_eq!(response.assignments.len(), 2);
    assert_eq!(response.kpis.changeovers, 1);
}

#[test]
fn scenario_6_infeasible_capability_is_an_invalid_request() {
    let req = ScheduleRequest::new(Horizon::new(dt(8, 0), dt(16, 0)))
        .with_product(Product::new("P1", "standard", dt(12, 0)).with_operation(Operation::new("seal", 10)));

    let err = solve(&req).unwrap_err();
    assert_eq!(err.short_code(), "invalid_request");
    assert!(err.why().iter().any(|w| w.contains("P1") && w.contains("seal")));
}

#[test]
fn boundary_empty_product_list_yields_empty_schedule() {
    let req = ScheduleRequest::new(Horizon::new(dt(8, 0), dt(16, 0)))
        .with_resource(Resource::new("Fill-1").with_capability("fill").with_window(dt(8, 0), dt(16, 0)));

    let response = solve(&req).unwrap();
    assert!(response.assignments.is_empty());
    assert_eq!(response.kpis.tardiness_minutes, 0);
    assert_eq!(response.kpis.makespan_minutes, 0);
    assert_eq!(response.kpis.utilization["Fill-1"], 0);
}

#[test]
fn boundary_duration_exceeding_every_window_is_infeasible() {
    let req = ScheduleRequest::new(Horizon::new(dt(8, 0), dt(16, 0)))
        .with_resource(Resource::new("Fill-1").with_capability("fill").with_window(dt(8, 0), dt(8, 10)))
        .with_resource(Resource::new("Fill-2").with_capability("fill").with_window(dt(8, 0), dt(8, 20)))
        .with_product(Product::new("P1", "standard", dt(12, 0)).with_operation(Operation::new("fill", 30)));

    let err = solve(&req).unwrap_err();
    assert_eq!(err.short_code(), "infeasible");
}

#[test]
fn boundary_zero_time_limit_never_returns_a_schedule() {
    let req = ScheduleRequest::new(Horizon::new(dt(8, 0), dt(16, 0)))
        .with_resource(Resource::new("Fill-1").with_capability("fill").with_window(dt(8, 0), dt(16, 0)))
        .with_product(Product::new("P1", "standard", dt(12, 0)).with_operation(Operation::new("fill", 30)))
        .with_time_limit_seconds(0);

    let err = solve(&req).unwrap_err();
    assert_eq!(err.short_code(), "timeout_unknown");
}

#[test]
fn determinism_repeated_solves_yield_the_same_kpis() {
    let req = ScheduleRequest::new(Horizon::new(dt(8, 0), dt(20, 0)))
        .with_resource(Resource::new("Fill-1").with_capability("fill").with_window(dt(8, 0), dt(20, 0)))
        .with_resource(Resource::new("Fill-2").with_capability("fill").with_window(dt(8, 0), dt(20, 0)))
        .with_product(Product::new("P1", "standard", dt(10, 0)).with_operation(Operation::new("fill", 45)))
        .with_product(Product::new("P2", "premium", dt(11, 0)).with_operation(Operation::new("fill", 30)))
        .with_product(Product::new("P3", "standard", dt(13, 0)).with_operation(Operation::new("fill", 60)));

    let first = solve(&req).unwrap();
    let second = solve(&req).unwrap();

    assert_eq!(first.kpis.tardiness_minutes, second.kpis.tardiness_minutes);
    assert_eq!(first.kpis.changeovers, second.kpis.changeovers);
    assert_eq!(first.kpis.makespan_minutes, second.kpis.makespan_minutes);

    for (a, b) in first.assignments.iter().zip(second.assignments.iter()) {
        assert_eq!(a.product_id, b.product_id);
        assert_eq!(a.start, b.start);
        assert_eq!(a.end, b.end);
    }
}
