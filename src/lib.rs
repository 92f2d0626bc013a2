//! A deterministic production scheduler for discrete manufacturing.
//!
//! Given a time horizon, a set of resources with capability-gated
//! working calendars, and a set of products whose routes are ordered
//! operations, this crate assigns each operation to an eligible
//! resource and a time interval so that all hard constraints hold and
//! total tardiness is minimized.
//!
//! # Pipeline
//!
//! [`schedule::solve`] runs four stages in strict sequence:
//!
//! 1. **[`time`]** — converts datetimes to integer minutes from horizon
//!    start and back.
//! 2. **[`build`]** — translates a [`model::ScheduleRequest`] into a
//!    [`build::ConstraintModel`]: decision variables, domains, hard
//!    constraints, and the tardiness objective.
//! 3. **[`search`]** — a branch-and-bound search over the model,
//!    returning an [`search::Outcome`].
//! 4. **[`validate`]** — independently re-checks every hard constraint
//!    on the returned assignment and computes the reported KPIs.
//!
//! # Scope
//!
//! This crate is a library: it has no HTTP endpoint, no persistence,
//! and accepts exactly one canonical request shape. Adapters that
//! translate other client formats, serve a socket, or persist schedules
//! are external collaborators, not part of this crate.
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use mfg_scheduler::model::{Horizon, Operation, Product, Resource, ScheduleRequest};
//! use mfg_scheduler::schedule::solve;
//!
//! let start = Utc.with_ymd_and_hms(2025, 11, 3, 8, 0, 0).unwrap();
//! let end = Utc.with_ymd_and_hms(2025, 11, 3, 16, 0, 0).unwrap();
//! let due = Utc.with_ymd_and_hms(2025, 11, 3, 12, 0, 0).unwrap();
//!
//! let request = ScheduleRequest::new(Horizon::new(start, end))
//!     .with_resource(Resource::new("Fill-1").with_capability("fill").with_window(start, end))
//!     .with_product(Product::new("P1", "standard", due).with_operation(Operation::new("fill", 30)));
//!
//! let response = solve(&request).unwrap();
//! assert_eq!(response.assignments.len(), 1);
//! ```

pub mod build;
pub mod error;
pub mod model;
pub mod schedule;
pub mod search;
pub mod time;
pub mod validate;

pub use error::{ScheduleError, ScheduleResult};
pub use model::{ScheduleRequest, ScheduleResponse};
pub use schedule::{parse_request, solve};
