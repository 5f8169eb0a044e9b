// Robot domain model
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RobotStatus {
    Online,
    Charging,
    Offline,
    Error,
}

impl RobotStatus {
    pub const ALL: [RobotStatus; 4] = [
        RobotStatus::Online,
        RobotStatus::Charging,
        RobotStatus::Offline,
        RobotStatus::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RobotStatus::Online => "online",
            RobotStatus::Charging => "charging",
            RobotStatus::Offline => "offline",
            RobotStatus::Error => "error",
        }
    }
}

impl fmt::Display for RobotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Robot {
    pub id: String,
    pub name: String,
    pub status: RobotStatus,
    /// Percent, always within [0, 100].
    pub battery: f64,
    /// Percent, always within [0, 100].
    pub signal: f64,
    /// Degrees Celsius.
    pub temperature: f64,
    pub location: String,
    pub country: String,
    pub state: String,
    pub region: String,
    pub last_updated: DateTime<Utc>,
}

impl Robot {
    /// Fields matched by free-text search.
    pub fn searchable_fields(&self) -> [&str; 7] {
        [
            self.name.as_str(),
            self.id.as_str(),
            self.location.as_str(),
            self.country.as_str(),
            self.state.as_str(),
            self.region.as_str(),
            self.status.as_str(),
        ]
    }

    /// Error state, low battery or overheating.
    pub fn is_critical(&self) -> bool {
        self.status == RobotStatus::Error || self.battery < 20.0 || self.temperature > 65.0
    }
}

/// One change proposed by a telemetry source for a single robot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RobotReading {
    Battery(f64),
    Temperature(f64),
    Signal(f64),
    Status(RobotStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateKind {
    Battery,
    Temperature,
    Signal,
    Status,
    Alert,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UpdateValue {
    Number(f64),
    Text(String),
}

/// Change feed entry emitted whenever the simulator mutates a robot.
#[derive(Debug, Clone, Serialize)]
pub struct RealtimeUpdate {
    pub kind: UpdateKind,
    pub robot_id: String,
    pub old_value: UpdateValue,
    pub new_value: UpdateValue,
    pub timestamp: DateTime<Utc>,
}
