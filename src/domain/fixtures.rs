// Builders shared by unit tests
use chrono::{Duration, Utc};

use super::alert::{Alert, AlertType, Severity};
use super::robot::{Robot, RobotStatus};

pub fn robot(id: &str, status: RobotStatus, battery: f64, temperature: f64) -> Robot {
    Robot {
        id: id.to_string(),
        name: format!("Unit {id}"),
        status,
        battery,
        signal: 90.0,
        temperature,
        location: "Lab Floor 2".to_string(),
        country: "United States".to_string(),
        state: "California".to_string(),
        region: "North America".to_string(),
        last_updated: Utc::now(),
    }
}

/// 18 online, 3 charging, 2 offline, 1 error.
pub fn fleet_of_24() -> Vec<Robot> {
    let mut robots = Vec::with_capacity(24);
    for i in 0..24 {
        let status = match i {
            0..=17 => RobotStatus::Online,
            18..=20 => RobotStatus::Charging,
            21..=22 => RobotStatus::Offline,
            _ => RobotStatus::Error,
        };
        let mut r = robot(&format!("AURA-{:03}", i + 1), status, 50.0 + i as f64, 40.0);
        r.last_updated = Utc::now() - Duration::minutes(i as i64);
        robots.push(r);
    }
    robots
}

pub fn alert(id: &str, severity: Severity, kind: AlertType, minutes_ago: i64) -> Alert {
    Alert {
        id: id.to_string(),
        robot_id: "AURA-001".to_string(),
        severity,
        kind,
        message: format!("{kind:?} on AURA-001"),
        timestamp: Utc::now() - Duration::minutes(minutes_ago),
        acknowledged: false,
        acknowledged_at: None,
        acknowledged_by: None,
    }
}
