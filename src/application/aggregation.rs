// Fleet aggregation - KPIs, distributions and filter options derived from the robot list
use crate::domain::alert::{Alert, AlertSummary, Severity};
use crate::domain::kpi::{CountBucket, FilterOptions, FleetDistributions, KpiSnapshot};
use crate::domain::robot::{Robot, RobotStatus};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};

const TOP_BUCKETS: usize = 8;

/// Derive a KPI snapshot. The input is only read; an empty fleet yields zeros.
pub fn compute_kpi(robots: &[Robot], timestamp: DateTime<Utc>) -> KpiSnapshot {
    let total = robots.len();
    let count = |status: RobotStatus| robots.iter().filter(|r| r.status == status).count();
    let online = count(RobotStatus::Online);
    let charging = count(RobotStatus::Charging);

    let mean = |field: fn(&Robot) -> f64| {
        if total == 0 {
            0.0
        } else {
            robots.iter().map(field).sum::<f64>() / total as f64
        }
    };

    let fleet_health = if total == 0 {
        0
    } else {
        ((online + charging) as f64 / total as f64 * 100.0).round() as u32
    };

    KpiSnapshot {
        timestamp,
        total,
        online,
        offline: count(RobotStatus::Offline),
        charging,
        error: count(RobotStatus::Error),
        fleet_health,
        avg_battery: mean(|r: &Robot| r.battery),
        avg_temperature: mean(|r: &Robot| r.temperature),
        avg_signal: mean(|r: &Robot| r.signal),
        critical_alerts: robots.iter().filter(|r| r.is_critical()).count(),
    }
}

fn battery_band(battery: f64) -> &'static str {
    if battery < 20.0 {
        "critical"
    } else if battery < 50.0 {
        "low"
    } else if battery < 80.0 {
        "medium"
    } else {
        "high"
    }
}

fn temperature_band(temperature: f64) -> &'static str {
    if temperature < 45.0 {
        "optimal"
    } else if temperature < 60.0 {
        "normal"
    } else if temperature < 70.0 {
        "warning"
    } else {
        "critical"
    }
}

fn fixed_buckets<'a>(labels: &[&'a str], values: impl Iterator<Item = &'a str>) -> Vec<CountBucket> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }
    labels
        .iter()
        .map(|label| CountBucket::new(*label, counts.get(label).copied().unwrap_or(0)))
        .collect()
}

/// Count by value, most frequent first, ties alphabetical.
fn ranked_buckets<'a>(values: impl Iterator<Item = &'a str>, limit: Option<usize>) -> Vec<CountBucket> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }
    let mut buckets: Vec<CountBucket> = counts
        .into_iter()
        .map(|(label, count)| CountBucket::new(label, count))
        .collect();
    buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    if let Some(limit) = limit {
        buckets.truncate(limit);
    }
    buckets
}

pub fn distributions(robots: &[Robot]) -> FleetDistributions {
    let statuses: Vec<&str> = RobotStatus::ALL.iter().map(|s| s.as_str()).collect();

    FleetDistributions {
        status: fixed_buckets(&statuses, robots.iter().map(|r| r.status.as_str())),
        battery: fixed_buckets(
            &["critical", "low", "medium", "high"],
            robots.iter().map(|r| battery_band(r.battery)),
        ),
        temperature: fixed_buckets(
            &["optimal", "normal", "warning", "critical"],
            robots.iter().map(|r| temperature_band(r.temperature)),
        ),
        locations: ranked_buckets(robots.iter().map(|r| r.location.as_str()), Some(TOP_BUCKETS)),
        regions: ranked_buckets(robots.iter().map(|r| r.region.as_str()), None),
        countries: ranked_buckets(robots.iter().map(|r| r.country.as_str()), Some(TOP_BUCKETS)),
    }
}

fn unique_sorted<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

pub fn filter_options(robots: &[Robot]) -> FilterOptions {
    FilterOptions {
        locations: unique_sorted(robots.iter().map(|r| r.location.as_str())),
        countries: unique_sorted(robots.iter().map(|r| r.country.as_str())),
        states: unique_sorted(robots.iter().map(|r| r.state.as_str())),
        regions: unique_sorted(robots.iter().map(|r| r.region.as_str())),
    }
}

pub fn alert_summary(alerts: &[Alert]) -> AlertSummary {
    let acknowledged = alerts.iter().filter(|a| a.acknowledged).count();
    AlertSummary {
        total: alerts.len(),
        unacknowledged: alerts.len() - acknowledged,
        acknowledged,
        critical: alerts
            .iter()
            .filter(|a| a.severity == Severity::Critical)
            .count(),
    }
}
