// Initial fleet loader - maps config/fleet.toml records to domain models
use crate::domain::alert::{Alert, AlertType, Severity};
use crate::domain::robot::{Robot, RobotStatus};
use crate::domain::telemetry::Bounds;
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::collections::HashSet;

const PERCENT: Bounds = Bounds::new(0.0, 100.0);

#[derive(Debug, Deserialize)]
struct FleetFile {
    #[serde(default)]
    robots: Vec<RobotRecord>,
    #[serde(default)]
    alerts: Vec<AlertRecord>,
}

#[derive(Debug, Deserialize)]
struct RobotRecord {
    id: String,
    name: String,
    status: RobotStatus,
    battery: f64,
    signal: f64,
    temperature: f64,
    location: String,
    country: String,
    state: String,
    region: String,
    #[serde(default)]
    updated_minutes_ago: i64,
}

#[derive(Debug, Deserialize)]
struct AlertRecord {
    id: String,
    robot_id: String,
    severity: Severity,
    kind: AlertType,
    message: String,
    #[serde(default)]
    minutes_ago: i64,
    acknowledged_minutes_ago: Option<i64>,
    acknowledged_by: Option<String>,
}

/// The robot list and alert set the service starts from.
#[derive(Debug, Clone)]
pub struct FleetSeed {
    pub robots: Vec<Robot>,
    pub alerts: Vec<Alert>,
}

fn robot_from_record(record: RobotRecord, now: DateTime<Utc>) -> Robot {
    Robot {
        id: record.id,
        name: record.name,
        status: record.status,
        battery: PERCENT.clamp(record.battery),
        signal: PERCENT.clamp(record.signal),
        temperature: record.temperature,
        location: record.location,
        country: record.country,
        state: record.state,
        region: record.region,
        last_updated: now - Duration::minutes(record.updated_minutes_ago),
    }
}

fn alert_from_record(record: AlertRecord, now: DateTime<Utc>) -> Alert {
    let acknowledged_at = record
        .acknowledged_minutes_ago
        .map(|minutes| now - Duration::minutes(minutes));

    Alert {
        id: record.id,
        robot_id: record.robot_id,
        severity: record.severity,
        kind: record.kind,
        message: record.message,
        timestamp: now - Duration::minutes(record.minutes_ago),
        acknowledged: acknowledged_at.is_some(),
        acknowledged_at,
        acknowledged_by: record.acknowledged_by,
    }
}

fn build_seed(file: FleetFile, now: DateTime<Utc>) -> Result<FleetSeed> {
    let mut seen = HashSet::new();
    for robot in &file.robots {
        if !seen.insert(robot.id.as_str()) {
            bail!("duplicate robot id {} in fleet seed", robot.id);
        }
    }
    for alert in &file.alerts {
        if !seen.contains(alert.robot_id.as_str()) {
            tracing::warn!(alert = %alert.id, robot = %alert.robot_id, "seed alert references unknown robot");
        }
    }

    let robots: Vec<Robot> = file
        .robots
        .into_iter()
        .map(|r| robot_from_record(r, now))
        .collect();
    let alerts: Vec<Alert> = file
        .alerts
        .into_iter()
        .map(|a| alert_from_record(a, now))
        .collect();

    tracing::info!(robots = robots.len(), alerts = alerts.len(), "fleet seed loaded");
    Ok(FleetSeed { robots, alerts })
}

pub fn load_fleet_seed(path: &str) -> Result<FleetSeed> {
    let file: FleetFile = config::Config::builder()
        .add_source(config::File::with_name(path))
        .build()
        .and_then(|settings| settings.try_deserialize())
        .with_context(|| format!("failed to load fleet seed from {path}"))?;

    build_seed(file, Utc::now())
}

#[cfg(test)]
pub fn parse_fleet_seed(toml: &str, now: DateTime<Utc>) -> Result<FleetSeed> {
    let file: FleetFile = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?
        .try_deserialize()?;

    build_seed(file, now)
}
