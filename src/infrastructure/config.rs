use crate::domain::telemetry::{Bounds, Jitter, Walk};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed RNG seed. Every poller derives its own stream from it.
    pub seed: Option<u64>,
    pub server: ServerConfig,
    pub fleet: FleetConfig,
    pub connection: ConnectionConfig,
    pub alerts: AlertConfig,
    pub imu: ImuConfig,
    pub lidar: LidarConfig,
    pub environment: EnvironmentConfig,
    pub joints: JointConfig,
    pub connectivity: ConnectivityConfig,
    pub battery: BatteryConfig,
    pub maintenance: MaintenanceConfig,
    pub analytics: AnalyticsConfig,
    pub firmware: FirmwareConfig,
    pub kpi: KpiConfig,
    pub updates: UpdatesConfig,
    pub table: TableConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Fleet-wide realtime updates. Each tick a robot gets at most one change,
/// picked by the cumulative shares below; the remainder is a status change.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FleetConfig {
    pub interval_ms: u64,
    pub update_probability: f64,
    pub battery_share: f64,
    pub temperature_share: f64,
    pub signal_share: f64,
    pub battery: Walk,
    pub temperature: Walk,
    pub signal: Walk,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            interval_ms: 30_000,
            update_probability: 0.3,
            battery_share: 0.4,
            temperature_share: 0.3,
            signal_share: 0.15,
            battery: Walk::new(3.0, 0.0, 100.0),
            temperature: Walk::new(2.0, 20.0, 80.0),
            signal: Walk::new(5.0, 0.0, 100.0),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ConnectionConfig {
    pub interval_ms: u64,
    pub latency: Walk,
    pub initial_latency: Bounds,
    pub drop_probability: f64,
    pub reconnect_ms: Bounds,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5_000,
            latency: Walk::new(5.0, 5.0, 200.0),
            initial_latency: Bounds::new(10.0, 60.0),
            drop_probability: 0.01,
            reconnect_ms: Bounds::new(500.0, 2_500.0),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AlertConfig {
    pub interval_ms: u64,
    pub probability: f64,
    pub critical_probability: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            interval_ms: 10_000,
            probability: 0.1,
            critical_probability: 0.3,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ImuConfig {
    pub interval_ms: u64,
    pub roll: Walk,
    pub pitch: Walk,
    pub yaw: Walk,
    pub accel_xy: Walk,
    pub accel_z: Jitter,
    pub gyro: Jitter,
}

impl Default for ImuConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            roll: Walk::unbounded(0.25),
            pitch: Walk::unbounded(0.25),
            yaw: Walk::unbounded(0.5),
            accel_xy: Walk::unbounded(0.01),
            accel_z: Jitter::new(9.81, 0.05),
            gyro: Jitter::new(0.0, 0.025),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LidarConfig {
    pub interval_ms: u64,
    pub obstacles: Walk,
    pub min_distance: Walk,
}

impl Default for LidarConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            obstacles: Walk::new(0.5, 0.0, 10.0),
            min_distance: Walk::new(0.15, 0.1, f64::INFINITY),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub interval_ms: u64,
    pub ambient_temp: Walk,
    pub humidity: Walk,
    pub pressure: Walk,
    pub air_quality: Walk,
    pub light_level: Walk,
    pub sound_level: Walk,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            ambient_temp: Walk::new(0.25, 15.0, 35.0),
            humidity: Walk::new(1.0, 20.0, 80.0),
            pressure: Walk::new(0.25, 980.0, 1040.0),
            air_quality: Walk::new(2.5, 0.0, 150.0),
            light_level: Walk::new(25.0, 50.0, 1000.0),
            sound_level: Walk::new(2.5, 30.0, 90.0),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct JointConfig {
    pub interval_ms: u64,
    pub angle: Walk,
    pub temperature: Walk,
    pub torque: Walk,
    pub warning_angle_error: f64,
    pub error_angle_error: f64,
    pub warning_temperature: f64,
    pub error_temperature: f64,
}

impl Default for JointConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2_000,
            angle: Walk::unbounded(1.0),
            temperature: Walk::new(0.5, 35.0, 65.0),
            torque: Walk::new(2.5, 0.0, 100.0),
            warning_angle_error: 5.0,
            error_angle_error: 10.0,
            warning_temperature: 55.0,
            error_temperature: 60.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ConnectivityConfig {
    pub interval_ms: u64,
    pub latency: Walk,
    pub packet_loss: Walk,
    pub signal_dbm: Walk,
    pub degraded_packet_loss: f64,
    pub upload_rate: Walk,
    pub download_rate: Walk,
    /// MB transferred per tick for every Mbps of rate.
    pub transfer_factor: f64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2_000,
            latency: Walk::new(5.0, 5.0, 100.0),
            packet_loss: Walk::new(0.15, 0.0, 5.0),
            signal_dbm: Walk::new(2.5, -80.0, -30.0),
            degraded_packet_loss: 3.0,
            upload_rate: Walk::new(2.5, 0.5, 50.0),
            download_rate: Walk::new(5.0, 1.0, 100.0),
            transfer_factor: 0.002,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BatteryConfig {
    pub interval_ms: u64,
    pub charge_step: f64,
    pub discharge_step: f64,
    pub charge: Bounds,
    pub temperature: Walk,
    /// Below this charge the pack switches to charging.
    pub low_threshold: f64,
    pub charging_rate_w: f64,
    pub discharging_rate_w: f64,
    pub min_voltage: f64,
    pub voltage_span: f64,
    pub full_runtime_hours: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2_000,
            charge_step: 0.05,
            discharge_step: 0.02,
            charge: Bounds::new(0.0, 100.0),
            temperature: Walk::new(0.5, 30.0, 50.0),
            low_threshold: 20.0,
            charging_rate_w: 180.0,
            discharging_rate_w: -145.0,
            min_voltage: 44.0,
            voltage_span: 8.0,
            full_runtime_hours: 8.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MaintenanceConfig {
    pub interval_ms: u64,
    pub degrade_probability: f64,
    pub degrade_step: f64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2_000,
            degrade_probability: 0.05,
            degrade_step: 0.1,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub interval_ms: u64,
    pub history_len: usize,
    pub battery_floor: f64,
    pub memory_cap_gb: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            interval_ms: 3_000,
            history_len: 49,
            battery_floor: 10.0,
            memory_cap_gb: 7.5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FirmwareConfig {
    pub upload_tick_ms: u64,
    pub upload_max_increment: f64,
    pub install_tick_ms: u64,
    pub install_max_increment: f64,
    pub failure_probability: f64,
    /// Pause between a phase reaching 100% and the next state.
    pub settle_ms: u64,
}

impl Default for FirmwareConfig {
    fn default() -> Self {
        Self {
            upload_tick_ms: 200,
            upload_max_increment: 15.0,
            install_tick_ms: 250,
            install_max_increment: 12.0,
            failure_probability: 0.1,
            settle_ms: 300,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct KpiConfig {
    pub history_capacity: usize,
}

impl Default for KpiConfig {
    fn default() -> Self {
        Self {
            history_capacity: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UpdatesConfig {
    pub log_capacity: usize,
}

impl Default for UpdatesConfig {
    fn default() -> Self {
        Self { log_capacity: 50 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TableConfig {
    pub page_size: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self { page_size: 5 }
    }
}

pub fn load_simulation_config() -> anyhow::Result<SimulationConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/simulation").required(false))
        .add_source(
            config::Environment::with_prefix("FLEET")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Parse an inline TOML document on top of the defaults.
#[cfg(test)]
pub fn parse_simulation_config(toml: &str) -> anyhow::Result<SimulationConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    Ok(settings.try_deserialize()?)
}
