// Random-walk telemetry source
use crate::application::telemetry_source::TelemetrySource;
use crate::domain::alert::{AlertDraft, AlertType, Severity};
use crate::domain::robot::{Robot, RobotReading, RobotStatus};
use crate::infrastructure::config::{AlertConfig, FleetConfig};
use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use rand::rngs::StdRng;
use tokio::sync::Mutex;

pub struct RandomWalkSource {
    fleet: FleetConfig,
    alerts: AlertConfig,
    rng: Mutex<StdRng>,
}

impl RandomWalkSource {
    pub fn new(fleet: FleetConfig, alerts: AlertConfig, rng: StdRng) -> Self {
        Self {
            fleet,
            alerts,
            rng: Mutex::new(rng),
        }
    }
}

fn probability(p: f64) -> f64 {
    p.clamp(0.0, 1.0)
}

/// Uniform pick among the statuses other than `current`.
fn other_status<R: Rng + ?Sized>(current: RobotStatus, rng: &mut R) -> RobotStatus {
    let others: Vec<RobotStatus> = RobotStatus::ALL
        .into_iter()
        .filter(|s| *s != current)
        .collect();
    others[rng.gen_range(0..others.len())]
}

/// At most one change per robot: first a Bernoulli draw on whether the robot
/// updates at all, then the kind by cumulative share, status taking the rest.
pub fn propose_reading<R: Rng + ?Sized>(
    robot: &Robot,
    cfg: &FleetConfig,
    rng: &mut R,
) -> Option<RobotReading> {
    if !rng.gen_bool(probability(cfg.update_probability)) {
        return None;
    }

    let battery_cut = cfg.battery_share;
    let temperature_cut = battery_cut + cfg.temperature_share;
    let signal_cut = temperature_cut + cfg.signal_share;
    let pick: f64 = rng.gen_range(0.0..1.0);

    let reading = if pick < battery_cut {
        RobotReading::Battery(cfg.battery.step(robot.battery, rng))
    } else if pick < temperature_cut {
        RobotReading::Temperature(cfg.temperature.step(robot.temperature, rng))
    } else if pick < signal_cut {
        RobotReading::Signal(cfg.signal.step(robot.signal, rng))
    } else {
        RobotReading::Status(other_status(robot.status, rng))
    };
    Some(reading)
}

pub fn propose_alert<R: Rng + ?Sized>(
    robots: &[Robot],
    cfg: &AlertConfig,
    rng: &mut R,
) -> Option<AlertDraft> {
    if robots.is_empty() || !rng.gen_bool(probability(cfg.probability)) {
        return None;
    }

    let robot = &robots[rng.gen_range(0..robots.len())];
    let kind = if rng.gen_bool(0.5) {
        AlertType::Collision
    } else {
        AlertType::Geofence
    };
    let severity = if rng.gen_bool(probability(cfg.critical_probability)) {
        Severity::Critical
    } else {
        Severity::Warning
    };
    let message = match kind {
        AlertType::Collision => format!("Object detected {:.2}m ahead", rng.gen_range(0.0..2.0)),
        _ => "Approaching boundary zone".to_string(),
    };

    Some(AlertDraft {
        robot_id: robot.id.clone(),
        severity,
        kind,
        message,
    })
}

#[async_trait]
impl TelemetrySource for RandomWalkSource {
    async fn sample(&self, robot: &Robot) -> Result<Option<RobotReading>> {
        let mut rng = self.rng.lock().await;
        let reading = propose_reading(robot, &self.fleet, &mut *rng);
        if let Some(reading) = &reading {
            tracing::debug!(robot = %robot.id, ?reading, "simulated reading");
        }
        Ok(reading)
    }

    async fn poll_alert(&self, robots: &[Robot]) -> Result<Option<AlertDraft>> {
        let mut rng = self.rng.lock().await;
        Ok(propose_alert(robots, &self.alerts, &mut *rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{fleet_of_24, robot};
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(17)
    }

    #[test]
    fn test_zero_probability_never_updates() {
        let cfg = FleetConfig {
            update_probability: 0.0,
            ..FleetConfig::default()
        };
        let r = robot("AURA-001", RobotStatus::Online, 50.0, 40.0);
        let mut rng = rng();
        assert!((0..1_000).all(|_| propose_reading(&r, &cfg, &mut rng).is_none()));
    }

    #[test]
    fn test_readings_respect_field_bounds() {
        let cfg = FleetConfig {
            update_probability: 1.0,
            ..FleetConfig::default()
        };
        let mut r = robot("AURA-001", RobotStatus::Online, 1.0, 79.0);
        r.signal = 99.0;
        let mut rng = rng();

        for _ in 0..5_000 {
            match propose_reading(&r, &cfg, &mut rng) {
                Some(RobotReading::Battery(v)) => assert!((0.0..=100.0).contains(&v)),
                Some(RobotReading::Temperature(v)) => assert!((20.0..=80.0).contains(&v)),
                Some(RobotReading::Signal(v)) => assert!((0.0..=100.0).contains(&v)),
                Some(RobotReading::Status(s)) => assert_ne!(s, RobotStatus::Online),
                None => panic!("update_probability is 1.0"),
            }
        }
    }

    #[test]
    fn test_update_kind_shares() {
        let cfg = FleetConfig {
            update_probability: 1.0,
            ..FleetConfig::default()
        };
        let r = robot("AURA-001", RobotStatus::Charging, 50.0, 40.0);
        let mut rng = rng();
        let mut battery = 0;
        let mut status = 0;
        let n = 20_000;
        for _ in 0..n {
            match propose_reading(&r, &cfg, &mut rng) {
                Some(RobotReading::Battery(_)) => battery += 1,
                Some(RobotReading::Status(_)) => status += 1,
                _ => {}
            }
        }
        let battery_share = battery as f64 / n as f64;
        let status_share = status as f64 / n as f64;
        assert!((battery_share - 0.4).abs() < 0.03, "battery share {battery_share}");
        assert!((status_share - 0.15).abs() < 0.03, "status share {status_share}");
    }

    #[test]
    fn test_alerts_target_known_robots() {
        let cfg = AlertConfig {
            probability: 1.0,
            ..AlertConfig::default()
        };
        let fleet = fleet_of_24();
        let mut rng = rng();

        for _ in 0..200 {
            let draft = propose_alert(&fleet, &cfg, &mut rng).unwrap();
            assert!(fleet.iter().any(|r| r.id == draft.robot_id));
            assert!(matches!(draft.kind, AlertType::Collision | AlertType::Geofence));
            assert!(matches!(draft.severity, Severity::Critical | Severity::Warning));
        }
        assert!(propose_alert(&[], &cfg, &mut rng).is_none());
    }

    #[tokio::test]
    async fn test_source_samples_through_trait() {
        let cfg = FleetConfig {
            update_probability: 1.0,
            ..FleetConfig::default()
        };
        let source = RandomWalkSource::new(cfg, AlertConfig::default(), rng());
        let r = robot("AURA-001", RobotStatus::Online, 50.0, 40.0);
        assert!(source.sample(&r).await.unwrap().is_some());
    }
}
