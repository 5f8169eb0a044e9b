// Fleet KPI domain model
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

/// Derived fleet summary. Recomputed from the robot list, never stored as truth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSnapshot {
    pub timestamp: DateTime<Utc>,
    pub total: usize,
    pub online: usize,
    pub offline: usize,
    pub charging: usize,
    pub error: usize,
    /// round((online + charging) / total * 100)
    pub fleet_health: u32,
    pub avg_battery: f64,
    pub avg_temperature: f64,
    pub avg_signal: f64,
    pub critical_alerts: usize,
}

/// Rolling window of KPI snapshots for trend charts.
#[derive(Debug, Clone)]
pub struct KpiHistory {
    capacity: usize,
    points: VecDeque<KpiSnapshot>,
}

impl KpiHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            points: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    pub fn push(&mut self, snapshot: KpiSnapshot) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(snapshot);
    }

    /// Oldest first.
    pub fn to_vec(&self) -> Vec<KpiSnapshot> {
        self.points.iter().cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountBucket {
    pub label: String,
    pub count: usize,
}

impl CountBucket {
    pub fn new(label: impl Into<String>, count: usize) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FleetDistributions {
    pub status: Vec<CountBucket>,
    pub battery: Vec<CountBucket>,
    pub temperature: Vec<CountBucket>,
    pub locations: Vec<CountBucket>,
    pub regions: Vec<CountBucket>,
    pub countries: Vec<CountBucket>,
}

/// Distinct values offered by the table's select filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub locations: Vec<String>,
    pub countries: Vec<String>,
    pub states: Vec<String>,
    pub regions: Vec<String>,
}
