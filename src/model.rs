//! The data model: the one canonical request and response shape the
//! pipeline accepts and produces.
//!
//! All entities here are plain, immutable, `Clone + Debug` value types —
//! the same style as a generic scheduling framework's `Task`/`Resource`/
//! `Schedule`, specialized to this domain's concrete wire shapes rather
//! than kept generic. There is no separate DTO layer: these types are
//! deserialized directly from the canonical JSON via `serde`, and
//! also constructed via builder methods (`with_*`) in tests and by
//! adapters.
//!
//! Times are `chrono::DateTime<Utc>` everywhere in this module; only the
//! [`crate::time`] quantizer converts them to integer minutes, and only
//! for the duration of model building and search.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The global scheduling window. All other times must fall within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Horizon {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

/// A half-open resource availability window `[open, close)`.
///
/// Serialized on the wire as a two-element array (`["2025-11-03T08:00:00Z",
/// "2025-11-03T16:00:00Z"]`) rather than as a `{"open": ..., "close": ...}` object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "(DateTime<Utc>, DateTime<Utc>)",
    into = "(DateTime<Utc>, DateTime<Utc>)"
)]
pub struct CalendarWindow {
    pub open: DateTime<Utc>,
    pub close: DateTime<Utc>,
}

impl CalendarWindow {
    pub fn new(open: DateTime<Utc>, close: DateTime<Utc>) -> Self {
        Self { open, close }
    }
}

impl From<(DateTime<Utc>, DateTime<Utc>)> for CalendarWindow {
    fn from((open, close): (DateTime<Utc>, DateTime<Utc>)) -> Self {
        Self { open, close }
    }
}

impl From<CalendarWindow> for (DateTime<Utc>, DateTime<Utc>) {
    fn from(w: CalendarWindow) -> Self {
        (w.open, w.close)
    }
}

/// A resource capable of performing operations that require one of its
/// `capabilities`, during the windows in its `calendar`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub calendar: Vec<CalendarWindow>,
}

impl Resource {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            capabilities: Vec::new(),
            calendar: Vec::new(),
        }
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    pub fn with_window(mut self, open: DateTime<Utc>, close: DateTime<Utc>) -> Self {
        self.calendar.push(CalendarWindow::new(open, close));
        self
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

/// A single step in a product's route: a capability requirement and a
/// fixed duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub capability: String,
    pub duration_minutes: i64,
}

impl Operation {
    pub fn new(capability: impl Into<String>, duration_minutes: i64) -> Self {
        Self {
            capability: capability.into(),
            duration_minutes,
        }
    }
}

/// A product to be produced: an ordered route of operations, due by a
/// given instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub family: String,
    pub due: DateTime<Utc>,
    pub route: Vec<Operation>,
}

impl Product {
    pub fn new(id: impl Into<String>, family: impl Into<String>, due: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            family: family.into(),
            due,
            route: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.route.push(operation);
        self
    }
}

/// Sequence-dependent changeover minutes between product families.
///
/// Keyed by `"{from_family}->{to_family}"`; a missing pair is zero
/// minutes. Consulted for KPI reporting only; changeover time is not a
/// hard separation constraint between adjacent operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeoverMatrix {
    #[serde(default)]
    pub values: HashMap<String, i64>,
}

impl ChangeoverMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(mut self, from_family: impl AsRef<str>, to_family: impl AsRef<str>, minutes: i64) -> Self {
        self.values
            .insert(Self::key(from_family.as_ref(), to_family.as_ref()), minutes);
        self
    }

    /// Changeover minutes from `from_family` to `to_family`; zero if unlisted.
    pub fn get(&self, from_family: &str, to_family: &str) -> i64 {
        self.values
            .get(&Self::key(from_family, to_family))
            .copied()
            .unwrap_or(0)
    }

    fn key(from_family: &str, to_family: &str) -> String {
        format!("{from_family}->{to_family}")
    }
}

/// Engine-wide tunables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_time_limit_seconds")]
    pub time_limit_seconds: i64,
}

fn default_time_limit_seconds() -> i64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            time_limit_seconds: default_time_limit_seconds(),
        }
    }
}

/// The one canonical request shape the core accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub horizon: Horizon,
    pub resources: Vec<Resource>,
    pub products: Vec<Product>,
    #[serde(default, rename = "changeover_matrix_minutes")]
    pub changeover_matrix: ChangeoverMatrix,
    #[serde(default)]
    pub settings: Settings,
}

impl ScheduleRequest {
    pub fn new(horizon: Horizon) -> Self {
        Self {
            horizon,
            resources: Vec::new(),
            products: Vec::new(),
            changeover_matrix: ChangeoverMatrix::new(),
            settings: Settings::default(),
        }
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn with_product(mut self, product: Product) -> Self {
        self.products.push(product);
        self
    }

    pub fn with_changeover_matrix(mut self, matrix: ChangeoverMatrix) -> Self {
        self.changeover_matrix = matrix;
        self
    }

    pub fn with_time_limit_seconds(mut self, seconds: i64) -> Self {
        self.settings.time_limit_seconds = seconds;
        self
    }

    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }
}

/// One operation's final placement: product, position in route, resource,
/// and the time interval it occupies.
///
/// `op_index` is the operation's position within its product's route; it
/// is not part of the wire response (an operation is identified on the
/// wire by its capability string instead), so it is excluded from serialization but
/// kept on the value for precedence/no-overlap checks inside the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub product_id: String,
    pub op_index: usize,
    pub capability: String,
    pub resource_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Assignment {
    pub fn new(
        product_id: impl Into<String>,
        op_index: usize,
        capability: impl Into<String>,
        resource_id: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            op_index,
            capability: capability.into(),
            resource_id: resource_id.into(),
            start,
            end,
        }
    }
}

/// Wire shape of one assignment entry: `{"product","op","resource","start","end"}`.
#[derive(Debug, Serialize)]
struct AssignmentWire<'a> {
    product: &'a str,
    op: &'a str,
    resource: &'a str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Serialize for Assignment {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        AssignmentWire {
            product: &self.product_id,
            op: &self.capability,
            resource: &self.resource_id,
            start: self.start,
            end: self.end,
        }
        .serialize(serializer)
    }
}

/// Reported quality metrics for a successful response.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Kpis {
    pub tardiness_minutes: i64,
    pub changeovers: i64,
    pub makespan_minutes: i64,
    pub utilization: HashMap<String, i64>,
}

/// The one canonical response shape the core produces on success.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleResponse {
    pub assignments: Vec<Assignment>,
    pub kpis: Kpis,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dt(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 3, h, m, 0).unwrap()
    }

    #[test]
    fn changeover_matrix_defaults_missing_pairs_to_zero() {
        let m = ChangeoverMatrix::new().with_pair("standard", "premium", 20);
        assert_eq!(m.get("standard", "premium"), 20);
        assert_eq!(m.get("premium", "standard"), 0);
        assert_eq!(m.get("standard", "standard"), 0);
    }

    #[test]
    fn settings_default_time_limit_is_thirty_seconds() {
        assert_eq!(Settings::default().time_limit_seconds, 30);
    }

    #[test]
    fn calendar_window_round_trips_through_a_json_array() {
        let w = CalendarWindow::new(dt(8, 0), dt(16, 0));
        let json = serde_json::to_value(w).unwrap();
        assert!(json.is_array());
        let back: CalendarWindow = serde_json::from_value(json).unwrap();
        assert_eq!(back, w);
    }

    #[test]
    fn assignment_serializes_to_the_wire_shape() {
        let a = Assignment::new("P1", 0, "fill", "Fill-1", dt(8, 0), dt(8, 30));
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["product"], "P1");
        assert_eq!(json["op"], "fill");
        assert_eq!(json["resource"], "Fill-1");
        assert!(json.get("op_index").is_none());
    }

    #[test]
    fn request_builder_round_trips_into_lookup_helpers() {
        let req = ScheduleRequest::new(Horizon::new(dt(8, 0), dt(16, 0)))
            .with_resource(Resource::new("Fill-1").with_capability("fill"))
            .with_product(Product::new("P1", "standard", dt(12, 0)).with_operation(Operation::new("fill", 30)));

        assert!(req.resource("Fill-1").is_some());
        assert!(req.product("P1").is_some());
        assert_eq!(req.settings.time_limit_seconds, 30);
    }

    #[test]
    fn request_deserializes_from_the_canonical_json_shape() {
        let json = r#"{
            "horizon": {"start": "2025-11-03T08:00:00Z", "end": "2025-11-03T16:00:00Z"},
            "resources": [{"id": "Fill-1", "capabilities": ["fill"], "calendar": [["2025-11-03T08:00:00Z", "2025-11-03T16:00:00Z"]]}],
            "products": [{"id": "P1", "family": "standard", "due": "2025-11-03T12:00:00Z",
                          "route": [{"capability": "fill", "duration_minutes": 30}]}],
            "changeover_matrix_minutes": {"values": {"standard->premium": 20}},
            "settings": {"time_limit_seconds": 10}
        }"#;
        let req: ScheduleRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.resources.len(), 1);
        assert_eq!(req.products[0].route[0].duration_minutes, 30);
        assert_eq!(req.changeover_matrix.get("standard", "premium"), 20);
        assert_eq!(req.settings.time_limit_seconds, 10);
    }
}
