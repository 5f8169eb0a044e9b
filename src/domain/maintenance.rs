// Predictive maintenance model
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::alert::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    Excellent,
    Good,
    Fair,
    ReplaceSoon,
    Critical,
}

impl ComponentStatus {
    pub fn from_health(health: f64) -> Self {
        if health >= 90.0 {
            ComponentStatus::Excellent
        } else if health >= 75.0 {
            ComponentStatus::Good
        } else if health >= 60.0 {
            ComponentStatus::Fair
        } else if health >= 40.0 {
            ComponentStatus::ReplaceSoon
        } else {
            ComponentStatus::Critical
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentHealth {
    pub component: String,
    /// Percent, never below 0.
    pub health: f64,
    pub status: ComponentStatus,
    pub hours_remaining: f64,
    pub last_replaced: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictiveAlert {
    pub id: String,
    pub component: String,
    pub severity: Severity,
    pub prediction: String,
    /// Percent.
    pub confidence: u8,
    pub recommended_action: String,
    pub estimated_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaintenanceMetrics {
    /// Mean time between failures, hours.
    pub mtbf_hours: f64,
    pub current_uptime_hours: f64,
    pub total_operating_hours: f64,
    pub next_service_date: DateTime<Utc>,
    pub days_until_service: f64,
    pub last_maintenance_date: DateTime<Utc>,
    pub maintenance_score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaintenanceTelemetry {
    pub metrics: MaintenanceMetrics,
    pub components: Vec<ComponentHealth>,
    pub predictions: Vec<PredictiveAlert>,
}

impl MaintenanceTelemetry {
    pub fn seeded(now: DateTime<Utc>) -> Self {
        let component = |name: &str, health: f64, hours_remaining: f64, replaced_days_ago: i64| ComponentHealth {
            component: name.to_string(),
            health,
            status: ComponentStatus::from_health(health),
            hours_remaining,
            last_replaced: Some(now - Duration::days(replaced_days_ago)),
        };
        let prediction = |id: &str, component: &str, severity: Severity, prediction: &str, confidence: u8, action: &str, days: u32| {
            PredictiveAlert {
                id: id.to_string(),
                component: component.to_string(),
                severity,
                prediction: prediction.to_string(),
                confidence,
                recommended_action: action.to_string(),
                estimated_days: days,
            }
        };

        Self {
            metrics: MaintenanceMetrics {
                mtbf_hours: 2840.0,
                current_uptime_hours: 72.5,
                total_operating_hours: 8456.0,
                next_service_date: now + Duration::days(12),
                days_until_service: 12.0,
                last_maintenance_date: now - Duration::days(18),
                maintenance_score: 87,
            },
            components: vec![
                component("Motor Controllers", 92.0, 3200.0, 180),
                component("Joint Bearings", 78.0, 1850.0, 340),
                component("Power Supply", 95.0, 4100.0, 60),
                component("Cooling Fans", 68.0, 980.0, 520),
                component("Drive Belts", 54.0, 420.0, 680),
                component("Sensors Array", 88.0, 2600.0, 210),
            ],
            predictions: vec![
                prediction(
                    "1",
                    "Drive Belts",
                    Severity::Warning,
                    "Drive belt wear detected - replacement recommended within 30 days",
                    87,
                    "Schedule belt replacement during next maintenance window",
                    18,
                ),
                prediction(
                    "2",
                    "Cooling Fans",
                    Severity::Info,
                    "Cooling fan efficiency degrading - monitor vibration levels",
                    72,
                    "Plan replacement in next 60 days",
                    45,
                ),
                prediction(
                    "3",
                    "Joint Bearings",
                    Severity::Info,
                    "Normal wear pattern detected - on schedule for maintenance",
                    91,
                    "Continue monitoring, no immediate action required",
                    90,
                ),
            ],
        }
    }
}
