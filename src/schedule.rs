//! The crate's public entry point: runs the four-stage pipeline (Time
//! Quantizer → Model Builder → Search Engine → Validator & KPI Pass)
//! over a single [`ScheduleRequest`] and returns a [`ScheduleResponse`]
//! or a [`ScheduleError`].

use tracing::{info, instrument};

use crate::build;
use crate::error::ScheduleError;
use crate::model::{ScheduleRequest, ScheduleResponse};
use crate::search::{self, Outcome};
use crate::validate;

/// Parses a raw JSON request body into a [`ScheduleRequest`].
///
/// Every path into [`solve`] — whether the caller already has a
/// [`ScheduleRequest`] value or raw JSON text — produces the same error
/// taxonomy: a `serde_json` parse failure is mapped to
/// [`ScheduleError::InvalidRequest`] with a single `why` entry
/// describing the failure.
pub fn parse_request(json: &str) -> Result<ScheduleRequest, ScheduleError> {
    serde_json::from_str(json)
        .map_err(|e| ScheduleError::invalid_request(format!("failed to parse request: {e}")))
}

/// Runs the full pipeline on `request`.
///
/// Single-threaded at this call's level: the model is built, search
/// runs, and validation follows, all sequentially within the caller's
/// thread. Two concurrent calls to `solve` share nothing.
#[instrument(skip_all)]
pub fn solve(request: &ScheduleRequest) -> Result<ScheduleResponse, ScheduleError> {
    let model = build::build(request)?;

    let outcome = search::solve(&model, request.settings.time_limit_seconds);

    let assignments = match outcome {
        Outcome::Optimal { assignments, .. } | Outcome::Feasible { assignments, .. } => assignments,
        Outcome::Infeasible { reason } => {
            info!(reason, "search proved infeasibility");
            return Err(ScheduleError::infeasible(reason));
        }
        Outcome::Unknown => {
            info!("search budget expired before any feasible solution was found");
            return Err(ScheduleError::timeout_unknown(format!(
                "no feasible solution found within {} second(s)",
                request.settings.time_limit_seconds
            )));
        }
    };

    let kpis = validate::validate(request, &assignments)?;

    info!(
        assignments = assignments.len(),
        tardiness_minutes = kpis.tardiness_minutes,
        "schedule produced"
    );

    Ok(ScheduleResponse { assignments, kpis })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Horizon, Operation, Product, Resource};
    use chrono::{DateTime, TimeZone, Utc};

    fn dt(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 3, h, m, 0).unwrap()
    }

    #[test]
    fn solves_a_single_product_single_resource_request() {
        let req = ScheduleRequest::new(Horizon::new(dt(8, 0), dt(16, 0)))
            .with_resource(Resource::new("Fill-1").with_capability("fill").with_window(dt(8, 0), dt(16, 0)))
            .with_product(
                Product::new("P1", "standard", dt(12, 0)).with_operation(Operation::new("fill", 30)),
            );

        let response = solve(&req).unwrap();
        assert_eq!(response.assignments.len(), 1);
        assert_eq!(response.kpis.tardiness_minutes, 0);
    }

    #[test]
    fn empty_product_list_yields_zero_kpis() {
        let req = ScheduleRequest::new(Horizon::new(dt(8, 0), dt(16, 0)))
            .with_resource(Resource::new("Fill-1").with_capability("fill").with_window(dt(8, 0), dt(16, 0)));

        let response = solve(&req).unwrap();
        assert!(response.assignments.is_empty());
        assert_eq!(response.kpis.tardiness_minutes, 0);
        assert_eq!(response.kpis.makespan_minutes, 0);
        assert_eq!(response.kpis.utilization["Fill-1"], 0);
    }

    #[test]
    fn ineligible_capability_is_an_invalid_request() {
        let req = ScheduleRequest::new(Horizon::new(dt(8, 0), dt(16, 0))).with_product(
            Product::new("P1", "standard", dt(12, 0)).with_operation(Operation::new("seal", 10)),
        );

        let err = solve(&req).unwrap_err();
        assert_eq!(err.short_code(), "invalid_request");
        assert!(err.why()[0].contains("seal"));
    }

    #[test]
    fn zero_time_limit_is_timeout_unknown() {
        let req = ScheduleRequest::new(Horizon::new(dt(8, 0), dt(16, 0)))
            .with_resource(Resource::new("Fill-1").with_capability("fill").with_window(dt(8, 0), dt(16, 0)))
            .with_product(
                Product::new("P1", "standard", dt(12, 0)).with_operation(Operation::new("fill", 30)),
            )
            .with_time_limit_seconds(0);

        let err = solve(&req).unwrap_err();
        assert_eq!(err.short_code(), "timeout_unknown");
    }

    #[test]
    fn parse_request_maps_bad_json_to_invalid_request() {
        let err = parse_request("{ not json").unwrap_err();
        assert_eq!(err.short_code(), "invalid_request");
    }

    #[test]
    fn parse_request_accepts_the_canonical_shape() {
        let json = r#"{
            "horizon": {"start": "2025-11-03T08:00:00Z", "end": "2025-11-03T16:00:00Z"},
            "resources": [{"id": "Fill-1", "capabilities": ["fill"], "calendar": [["2025-11-03T08:00:00Z", "2025-11-03T16:00:00Z"]]}],
            "products": [],
            "settings": {"time_limit_seconds": 5}
        }"#;
        let req = parse_request(json).unwrap();
        let response = solve(&req).unwrap();
        assert!(response.assignments.is_empty());
    }
}
