// Battery health and lifecycle model
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargingStatus {
    Charging,
    Discharging,
    Full,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargeRecord {
    pub timestamp: DateTime<Utc>,
    pub cycle_number: u32,
    pub charge_level: f64,
    pub duration_minutes: u32,
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthTrendPoint {
    pub month: String,
    pub health: f64,
    pub capacity_mah: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryHealth {
    /// Percent, within [0, 100].
    pub current_charge: f64,
    /// Remaining capacity versus design capacity.
    pub health_percentage: f64,
    pub cycle_count: u32,
    pub max_cycles: u32,
    pub manufacture_date: DateTime<Utc>,
    pub age_months: u32,
    pub design_capacity_mah: f64,
    pub current_capacity_mah: f64,
    pub voltage: f64,
    pub charging_status: ChargingStatus,
    /// Watts; positive while charging.
    pub charging_rate_w: f64,
    pub battery_temp: f64,
    pub estimated_replacement_date: DateTime<Utc>,
    pub days_until_replacement: u32,
    pub recent_charges: Vec<ChargeRecord>,
    pub health_trend: Vec<HealthTrendPoint>,
}

impl BatteryHealth {
    pub fn seeded(now: DateTime<Utc>) -> Self {
        let charge = |hours_ago: i64, cycle_number: u32, charge_level: f64, duration_minutes: u32, temperature: f64| {
            ChargeRecord {
                timestamp: now - Duration::hours(hours_ago),
                cycle_number,
                charge_level,
                duration_minutes,
                temperature,
            }
        };
        let trend = [
            ("6mo ago", 98.0, 14_700.0),
            ("5mo ago", 97.0, 14_550.0),
            ("4mo ago", 96.0, 14_400.0),
            ("3mo ago", 95.0, 14_250.0),
            ("2mo ago", 95.0, 14_250.0),
            ("1mo ago", 94.0, 14_100.0),
            ("Now", 94.0, 14_100.0),
        ];

        Self {
            current_charge: 87.0,
            health_percentage: 94.0,
            cycle_count: 342,
            max_cycles: 1500,
            manufacture_date: now - Duration::days(18 * 30),
            age_months: 18,
            design_capacity_mah: 15_000.0,
            current_capacity_mah: 14_100.0,
            voltage: 48.2,
            charging_status: ChargingStatus::Discharging,
            charging_rate_w: -145.0,
            battery_temp: 38.0,
            estimated_replacement_date: now + Duration::days(24 * 30),
            days_until_replacement: 720,
            recent_charges: vec![
                charge(4, 342, 100.0, 125, 42.0),
                charge(28, 341, 98.0, 132, 40.0),
                charge(52, 340, 100.0, 128, 41.0),
            ],
            health_trend: trend
                .into_iter()
                .map(|(month, health, capacity_mah)| HealthTrendPoint {
                    month: month.to_string(),
                    health,
                    capacity_mah,
                })
                .collect(),
        }
    }

    /// Remaining runtime in minutes for a pack that lasts `full_runtime_hours`.
    pub fn runtime_minutes(&self, full_runtime_hours: f64) -> f64 {
        self.current_charge / 100.0 * full_runtime_hours * 60.0
    }
}

/// "7h 0m" style rendering; hours are dropped when zero.
pub fn format_runtime(minutes: f64) -> String {
    let hours = (minutes / 60.0).floor() as u64;
    let rest = (minutes % 60.0).round() as u64;
    if hours == 0 {
        format!("{rest}m")
    } else {
        format!("{hours}h {rest}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_estimate() {
        let mut battery = BatteryHealth::seeded(Utc::now());
        battery.current_charge = 87.0;
        let minutes = battery.runtime_minutes(8.0);
        assert!((minutes - 417.6).abs() < 1e-9);
        assert_eq!(format_runtime(minutes), "6h 58m");
        assert_eq!(format_runtime(45.0), "45m");
    }

    #[test]
    fn test_seeded_history_is_newest_first() {
        let battery = BatteryHealth::seeded(Utc::now());
        assert_eq!(battery.recent_charges.len(), 3);
        assert!(battery.recent_charges[0].timestamp > battery.recent_charges[1].timestamp);
        assert_eq!(battery.health_trend.last().unwrap().month, "Now");
    }
}
