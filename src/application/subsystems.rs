// Per-subsystem tick rules for the robot detail telemetry session
use crate::domain::analytics::{AnalyticsPoint, AnalyticsTelemetry, joint_wear_for, robot_seed};
use crate::domain::connectivity::{ConnectivityTelemetry, HeartbeatStatus};
use crate::domain::joints::{Joint, JointStatus, JointTelemetry};
use crate::domain::maintenance::{ComponentStatus, MaintenanceTelemetry};
use crate::domain::power::{BatteryHealth, ChargingStatus};
use crate::domain::sensors::{EnvironmentReading, ImuReading, LidarReading};
use crate::domain::telemetry::round_to;
use crate::infrastructure::config::{
    AnalyticsConfig, BatteryConfig, ConnectivityConfig, EnvironmentConfig, ImuConfig, JointConfig,
    LidarConfig, MaintenanceConfig,
};
use chrono::{DateTime, Duration, Timelike, Utc};
use rand::Rng;

const MS_PER_HOUR: f64 = 3_600_000.0;
const MS_PER_DAY: f64 = 86_400_000.0;
const ANALYTICS_SPACING_MINUTES: i64 = 30;

pub fn tick_imu<R: Rng + ?Sized>(imu: &mut ImuReading, cfg: &ImuConfig, rng: &mut R) {
    imu.roll = cfg.roll.step(imu.roll, rng);
    imu.pitch = cfg.pitch.step(imu.pitch, rng);
    imu.yaw = cfg.yaw.step(imu.yaw, rng);
    imu.accel_x = cfg.accel_xy.step(imu.accel_x, rng);
    imu.accel_y = cfg.accel_xy.step(imu.accel_y, rng);
    imu.accel_z = cfg.accel_z.sample(rng);
    imu.gyro_x = cfg.gyro.sample(rng);
    imu.gyro_y = cfg.gyro.sample(rng);
    imu.gyro_z = cfg.gyro.sample(rng);
}

pub fn tick_lidar<R: Rng + ?Sized>(lidar: &mut LidarReading, cfg: &LidarConfig, rng: &mut R) {
    lidar.detected_obstacles = cfg.obstacles.step(lidar.detected_obstacles, rng);
    lidar.min_distance = cfg.min_distance.step(lidar.min_distance, rng);
}

pub fn tick_environment<R: Rng + ?Sized>(
    env: &mut EnvironmentReading,
    cfg: &EnvironmentConfig,
    rng: &mut R,
) {
    env.ambient_temp = cfg.ambient_temp.step(env.ambient_temp, rng);
    env.humidity = cfg.humidity.step(env.humidity, rng);
    env.pressure = cfg.pressure.step(env.pressure, rng);
    env.air_quality = cfg.air_quality.step(env.air_quality, rng);
    env.light_level = cfg.light_level.step(env.light_level, rng);
    env.sound_level = cfg.sound_level.step(env.sound_level, rng);
}

/// Error thresholds win over warning thresholds.
pub fn classify_joint(joint: &Joint, cfg: &JointConfig) -> JointStatus {
    let error = joint.angle_error();
    if error > cfg.error_angle_error || joint.temperature > cfg.error_temperature {
        JointStatus::Error
    } else if error > cfg.warning_angle_error || joint.temperature > cfg.warning_temperature {
        JointStatus::Warning
    } else {
        JointStatus::Ok
    }
}

pub fn tick_joints<R: Rng + ?Sized>(joints: &mut JointTelemetry, cfg: &JointConfig, rng: &mut R) {
    for joint in joints.joints_mut() {
        joint.angle = cfg.angle.step(joint.angle, rng);
        joint.temperature = cfg.temperature.step(joint.temperature, rng);
        joint.torque = cfg.torque.step(joint.torque, rng);
        joint.status = classify_joint(joint, cfg);
    }
}

pub fn tick_connectivity<R: Rng + ?Sized>(
    link: &mut ConnectivityTelemetry,
    cfg: &ConnectivityConfig,
    now: DateTime<Utc>,
    rng: &mut R,
) {
    let metrics = &mut link.metrics;
    // heartbeat reflects the loss observed before this tick
    metrics.heartbeat_status = if metrics.packet_loss > cfg.degraded_packet_loss {
        HeartbeatStatus::Degraded
    } else {
        HeartbeatStatus::Healthy
    };
    metrics.last_seen = now;
    metrics.last_heartbeat = now;
    metrics.latency = cfg.latency.step(metrics.latency, rng);
    metrics.packet_loss = cfg.packet_loss.step(metrics.packet_loss, rng);
    metrics.signal_strength_dbm = cfg.signal_dbm.step(metrics.signal_strength_dbm, rng);

    let bandwidth = &mut link.bandwidth;
    bandwidth.total_uploaded += bandwidth.upload_rate * cfg.transfer_factor;
    bandwidth.total_downloaded += bandwidth.download_rate * cfg.transfer_factor;
    bandwidth.upload_rate = cfg.upload_rate.step(bandwidth.upload_rate, rng);
    bandwidth.download_rate = cfg.download_rate.step(bandwidth.download_rate, rng);
}

/// Charge moves with the current mode; the mode only changes at the
/// thresholds (full at 100%, charging below the low threshold).
pub fn tick_battery<R: Rng + ?Sized>(battery: &mut BatteryHealth, cfg: &BatteryConfig, rng: &mut R) {
    let charging = battery.charging_status == ChargingStatus::Charging;
    let step = if charging {
        cfg.charge_step
    } else {
        -cfg.discharge_step
    };

    battery.current_charge = cfg.charge.clamp(battery.current_charge + step);
    battery.voltage = cfg.min_voltage + battery.current_charge / 100.0 * cfg.voltage_span;
    battery.charging_rate_w = if charging {
        cfg.charging_rate_w
    } else {
        cfg.discharging_rate_w
    };
    battery.battery_temp = cfg.temperature.step(battery.battery_temp, rng);

    if battery.current_charge >= cfg.charge.max {
        battery.charging_status = ChargingStatus::Full;
    } else if battery.current_charge < cfg.low_threshold {
        battery.charging_status = ChargingStatus::Charging;
    }
}

pub fn tick_maintenance<R: Rng + ?Sized>(
    maintenance: &mut MaintenanceTelemetry,
    cfg: &MaintenanceConfig,
    now: DateTime<Utc>,
    rng: &mut R,
) {
    let elapsed_hours = cfg.interval_ms as f64 / MS_PER_HOUR;
    let metrics = &mut maintenance.metrics;
    metrics.current_uptime_hours += elapsed_hours;
    metrics.total_operating_hours += elapsed_hours;
    let until_service = (metrics.next_service_date - now).num_milliseconds() as f64;
    metrics.days_until_service = (until_service / MS_PER_DAY).max(0.0);

    for component in &mut maintenance.components {
        if rng.gen_bool(cfg.degrade_probability.clamp(0.0, 1.0)) {
            component.health = (component.health - cfg.degrade_step).max(0.0);
        }
        component.status = ComponentStatus::from_health(component.health);
        component.hours_remaining = (component.hours_remaining - elapsed_hours).max(0.0);
    }
}

fn cpu_load<R: Rng + ?Sized>(at: DateTime<Utc>, rng: &mut R) -> f64 {
    let base = if (8..=18).contains(&at.hour()) { 60.0 } else { 30.0 };
    base + rng.gen_range(-10.0..10.0)
}

fn analytics_point<R: Rng + ?Sized>(
    at: DateTime<Utc>,
    battery: f64,
    memory_used: f64,
    rng: &mut R,
) -> AnalyticsPoint {
    let cpu = cpu_load(at, rng);
    let temperature = 35.0 + cpu / 100.0 * 25.0 + rng.gen_range(0.0..5.0);

    AnalyticsPoint {
        time: at.format("%H:%M").to_string(),
        battery: round_to(battery, 1),
        cpu: round_to(cpu, 1),
        temperature: round_to(temperature, 1),
        memory_used: round_to(memory_used, 2),
        network_latency: round_to(10.0 + rng.gen_range(0.0..30.0), 1),
    }
}

/// Back-filled history at 30-minute spacing ending at `now`, plus the wear
/// table derived from the robot id.
pub fn seed_analytics<R: Rng + ?Sized>(
    robot_id: &str,
    cfg: &AnalyticsConfig,
    now: DateTime<Utc>,
    rng: &mut R,
) -> AnalyticsTelemetry {
    let points = cfg.history_len.max(1);
    let mut battery = 85.0 + (robot_seed(robot_id) % 15) as f64;
    let mut history = Vec::with_capacity(points);

    for (n, back) in (0..points).rev().enumerate() {
        let at = now - Duration::minutes(back as i64 * ANALYTICS_SPACING_MINUTES);
        battery = (battery - 0.5 - rng.gen_range(0.0..0.5)).max(cfg.battery_floor);
        let memory = (2.5 + n as f64 * 0.02 + rng.gen_range(0.0..0.3)).min(cfg.memory_cap_gb);
        history.push(analytics_point(at, battery, memory, rng));
    }

    AnalyticsTelemetry {
        history,
        joint_wear: joint_wear_for(robot_id),
    }
}

pub fn tick_analytics<R: Rng + ?Sized>(
    analytics: &mut AnalyticsTelemetry,
    cfg: &AnalyticsConfig,
    now: DateTime<Utc>,
    rng: &mut R,
) {
    let (battery, memory) = analytics
        .history
        .last()
        .map(|p| (p.battery, p.memory_used))
        .unwrap_or((100.0, 2.5));

    let battery = (battery - 0.05 - rng.gen_range(0.0..0.05)).max(cfg.battery_floor);
    let memory = (memory + rng.gen_range(0.0..0.01)).min(cfg.memory_cap_gb);
    analytics.history.push(analytics_point(now, battery, memory, rng));

    let len = cfg.history_len.max(1);
    if analytics.history.len() > len {
        let excess = analytics.history.len() - len;
        analytics.history.drain(..excess);
    }

    for joint in &mut analytics.joint_wear {
        if rng.gen_bool(0.1) {
            joint.cycles += 1;
        }
        if rng.gen_bool(0.05) {
            joint.wear = (joint.wear + 0.1).min(100.0);
        }
        joint.health = (100.0 - joint.wear).max(50.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::telemetry::Walk;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(2024)
    }

    #[test]
    fn test_environment_stays_in_bounds() {
        let cfg = EnvironmentConfig::default();
        let mut env = EnvironmentReading::default();
        let mut rng = rng();
        for _ in 0..5_000 {
            tick_environment(&mut env, &cfg, &mut rng);
            assert!(cfg.ambient_temp.bounds().contains(env.ambient_temp));
            assert!(cfg.humidity.bounds().contains(env.humidity));
            assert!(cfg.pressure.bounds().contains(env.pressure));
            assert!(cfg.air_quality.bounds().contains(env.air_quality));
            assert!(cfg.light_level.bounds().contains(env.light_level));
            assert!(cfg.sound_level.bounds().contains(env.sound_level));
        }
    }

    #[test]
    fn test_lidar_min_distance_floor() {
        let cfg = LidarConfig::default();
        let mut lidar = LidarReading::default();
        let mut rng = rng();
        for _ in 0..5_000 {
            tick_lidar(&mut lidar, &cfg, &mut rng);
            assert!(lidar.min_distance >= 0.1);
            assert!((0.0..=10.0).contains(&lidar.detected_obstacles));
        }
    }

    #[test]
    fn test_imu_redraws_accel_z_and_gyro() {
        let cfg = ImuConfig::default();
        let mut imu = ImuReading::default();
        let mut rng = rng();
        for _ in 0..1_000 {
            tick_imu(&mut imu, &cfg, &mut rng);
            assert!((imu.accel_z - 9.81).abs() <= 0.05 + 1e-9);
            assert!(imu.gyro_x.abs() <= 0.025 + 1e-9);
        }
    }

    #[test]
    fn test_joint_classification_thresholds() {
        let cfg = JointConfig::default();
        let mut joints = JointTelemetry::humanoid();
        let joint = joints.joints_mut().next().unwrap();

        joint.target_angle = 0.0;
        joint.temperature = 40.0;
        joint.angle = 4.0;
        assert_eq!(classify_joint(joint, &cfg), JointStatus::Ok);
        joint.angle = -6.0;
        assert_eq!(classify_joint(joint, &cfg), JointStatus::Warning);
        joint.angle = 10.5;
        assert_eq!(classify_joint(joint, &cfg), JointStatus::Error);

        joint.angle = 0.0;
        joint.temperature = 56.0;
        assert_eq!(classify_joint(joint, &cfg), JointStatus::Warning);
        joint.temperature = 60.5;
        assert_eq!(classify_joint(joint, &cfg), JointStatus::Error);
    }

    #[test]
    fn test_joint_tick_keeps_torque_and_temperature_bounded() {
        let cfg = JointConfig::default();
        let mut joints = JointTelemetry::humanoid();
        let mut rng = rng();
        for _ in 0..500 {
            tick_joints(&mut joints, &cfg, &mut rng);
        }
        for joint in joints.joints() {
            assert!((35.0..=65.0).contains(&joint.temperature));
            assert!((0.0..=100.0).contains(&joint.torque));
            assert_eq!(joint.status, classify_joint(joint, &cfg));
        }
        let summary = joints.summary();
        assert_eq!(summary.ok + summary.warning + summary.error, 32);
    }

    #[test]
    fn test_heartbeat_uses_previous_packet_loss() {
        let cfg = ConnectivityConfig {
            packet_loss: Walk::new(0.0, 0.0, 5.0),
            ..ConnectivityConfig::default()
        };
        let mut link = ConnectivityTelemetry::seeded(Utc::now());
        link.metrics.packet_loss = 3.5;
        let mut rng = rng();

        tick_connectivity(&mut link, &cfg, Utc::now(), &mut rng);
        assert_eq!(link.metrics.heartbeat_status, HeartbeatStatus::Degraded);

        link.metrics.packet_loss = 1.0;
        tick_connectivity(&mut link, &cfg, Utc::now(), &mut rng);
        assert_eq!(link.metrics.heartbeat_status, HeartbeatStatus::Healthy);
    }

    #[test]
    fn test_bandwidth_totals_accumulate_previous_rate() {
        let cfg = ConnectivityConfig::default();
        let mut link = ConnectivityTelemetry::seeded(Utc::now());
        let before = link.bandwidth.clone();
        let mut rng = rng();

        tick_connectivity(&mut link, &cfg, Utc::now(), &mut rng);
        let expected = before.total_uploaded + before.upload_rate * cfg.transfer_factor;
        assert!((link.bandwidth.total_uploaded - expected).abs() < 1e-9);
    }

    #[test]
    fn test_battery_switches_to_charging_below_threshold() {
        let cfg = BatteryConfig::default();
        let mut battery = BatteryHealth::seeded(Utc::now());
        battery.current_charge = 20.01;
        battery.charging_status = ChargingStatus::Discharging;
        let mut rng = rng();

        tick_battery(&mut battery, &cfg, &mut rng);
        assert_eq!(battery.charging_status, ChargingStatus::Charging);
        assert_eq!(battery.charging_rate_w, cfg.discharging_rate_w);

        tick_battery(&mut battery, &cfg, &mut rng);
        assert_eq!(battery.charging_rate_w, cfg.charging_rate_w);
        assert!((battery.current_charge - 20.04).abs() < 1e-9);
        let expected_voltage = 44.0 + battery.current_charge / 100.0 * 8.0;
        assert!((battery.voltage - expected_voltage).abs() < 1e-9);
    }

    #[test]
    fn test_battery_becomes_full_and_then_drains() {
        let cfg = BatteryConfig::default();
        let mut battery = BatteryHealth::seeded(Utc::now());
        battery.current_charge = 99.98;
        battery.charging_status = ChargingStatus::Charging;
        let mut rng = rng();

        tick_battery(&mut battery, &cfg, &mut rng);
        assert_eq!(battery.current_charge, 100.0);
        assert_eq!(battery.charging_status, ChargingStatus::Full);

        tick_battery(&mut battery, &cfg, &mut rng);
        assert!(battery.current_charge < 100.0);
        assert_eq!(battery.charging_status, ChargingStatus::Full);
    }

    #[test]
    fn test_maintenance_degrades_and_rebands() {
        let cfg = MaintenanceConfig {
            degrade_probability: 1.0,
            degrade_step: 10.0,
            ..MaintenanceConfig::default()
        };
        let now = Utc::now();
        let mut maintenance = MaintenanceTelemetry::seeded(now);
        let uptime = maintenance.metrics.current_uptime_hours;
        let mut rng = rng();

        tick_maintenance(&mut maintenance, &cfg, now, &mut rng);

        let motors = &maintenance.components[0];
        assert_eq!(motors.health, 82.0);
        assert_eq!(motors.status, ComponentStatus::Good);
        assert!(maintenance.metrics.current_uptime_hours > uptime);
        assert!((maintenance.metrics.days_until_service - 12.0).abs() < 1e-6);
    }

    #[test]
    fn test_analytics_history_is_bounded() {
        let cfg = AnalyticsConfig::default();
        let now = Utc::now();
        let mut rng = rng();
        let mut analytics = seed_analytics("AURA-003", &cfg, now, &mut rng);
        assert_eq!(analytics.history.len(), 49);
        assert_eq!(analytics.joint_wear.len(), 10);

        for _ in 0..100 {
            tick_analytics(&mut analytics, &cfg, now, &mut rng);
        }
        assert_eq!(analytics.history.len(), 49);
        assert!(analytics.history.iter().all(|p| p.battery >= cfg.battery_floor));
        assert!(analytics.history.iter().all(|p| p.memory_used <= cfg.memory_cap_gb));
        assert!(analytics.joint_wear.iter().all(|j| j.health >= 50.0));
    }
}
