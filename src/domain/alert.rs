// Alert domain model
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

/// Subsystem that raised the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Battery,
    Temperature,
    Offline,
    Error,
    Maintenance,
    Collision,
    Geofence,
    Fall,
    EmergencyStop,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub id: String,
    /// Looked up by id; the alert does not own the robot.
    pub robot_id: String,
    pub severity: Severity,
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub acknowledged: bool,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub acknowledged_by: Option<String>,
}

impl Alert {
    pub fn acknowledge(&mut self, by: &str, at: DateTime<Utc>) {
        self.acknowledged = true;
        self.acknowledged_at = Some(at);
        self.acknowledged_by = Some(by.to_string());
    }
}

/// An alert before an id and timestamp are assigned.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AlertDraft {
    pub robot_id: String,
    pub severity: Severity,
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlertSummary {
    pub total: usize,
    pub unacknowledged: usize,
    pub acknowledged: usize,
    pub critical: usize,
}
