// Network link health model
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeartbeatStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalQuality {
    Excellent,
    VeryGood,
    Good,
    Fair,
    Poor,
}

impl SignalQuality {
    pub fn from_dbm(dbm: f64) -> Self {
        if dbm >= -50.0 {
            SignalQuality::Excellent
        } else if dbm >= -60.0 {
            SignalQuality::VeryGood
        } else if dbm >= -70.0 {
            SignalQuality::Good
        } else if dbm >= -80.0 {
            SignalQuality::Fair
        } else {
            SignalQuality::Poor
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectivityMetrics {
    pub last_seen: DateTime<Utc>,
    pub is_online: bool,
    pub uptime_percentage: f64,
    /// Percent.
    pub packet_loss: f64,
    /// Milliseconds.
    pub latency: f64,
    pub signal_strength_dbm: f64,
    pub connection_type: String,
    pub heartbeat_status: HeartbeatStatus,
    pub last_heartbeat: DateTime<Utc>,
    pub heartbeat_interval_s: u32,
}

impl ConnectivityMetrics {
    pub fn signal_quality(&self) -> SignalQuality {
        SignalQuality::from_dbm(self.signal_strength_dbm)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandwidthUsage {
    /// Mbps.
    pub upload_rate: f64,
    pub download_rate: f64,
    /// MB.
    pub total_uploaded: f64,
    pub total_downloaded: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkHandoff {
    pub timestamp: DateTime<Utc>,
    pub from: String,
    pub to: String,
    pub reason: String,
    pub duration_ms: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectivityTelemetry {
    pub metrics: ConnectivityMetrics,
    pub bandwidth: BandwidthUsage,
    pub recent_handoffs: Vec<NetworkHandoff>,
}

impl ConnectivityTelemetry {
    pub fn seeded(now: DateTime<Utc>) -> Self {
        let handoff = |hours_ago: i64, from: &str, to: &str, reason: &str, duration_ms: u32| NetworkHandoff {
            timestamp: now - Duration::hours(hours_ago),
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.to_string(),
            duration_ms,
        };

        Self {
            metrics: ConnectivityMetrics {
                last_seen: now,
                is_online: true,
                uptime_percentage: 99.4,
                packet_loss: 0.8,
                latency: 12.0,
                signal_strength_dbm: -42.0,
                connection_type: "WiFi 6E".to_string(),
                heartbeat_status: HeartbeatStatus::Healthy,
                last_heartbeat: now,
                heartbeat_interval_s: 5,
            },
            bandwidth: BandwidthUsage {
                upload_rate: 8.5,
                download_rate: 45.2,
                total_uploaded: 3420.0,
                total_downloaded: 18_560.0,
            },
            recent_handoffs: vec![
                handoff(3, "WiFi 6E (Lab-Main)", "5G Network", "WiFi signal weak, switched to cellular", 245),
                handoff(8, "5G Network", "WiFi 6E (Lab-Main)", "WiFi available, optimizing bandwidth", 180),
                handoff(24, "WiFi 6E (Lab-Main)", "Ethernet", "Docked at charging station", 120),
            ],
        }
    }
}

/// Dashboard-to-fleet link. A drop lasts until `dropped_until`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionStatus {
    pub latency_ms: f64,
    pub dropped_until: Option<DateTime<Utc>>,
}

impl ConnectionStatus {
    pub fn new(latency_ms: f64) -> Self {
        Self {
            latency_ms,
            dropped_until: None,
        }
    }

    pub fn is_connected(&self, now: DateTime<Utc>) -> bool {
        self.dropped_until.is_none_or(|until| now >= until)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionView {
    pub is_connected: bool,
    pub latency_ms: u32,
}

impl ConnectionView {
    pub fn at(status: &ConnectionStatus, now: DateTime<Utc>) -> Self {
        Self {
            is_connected: status.is_connected(now),
            latency_ms: status.latency_ms.round() as u32,
        }
    }
}
