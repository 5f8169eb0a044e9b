// Robot detail sessions - one poller per subsystem, all torn down together
use crate::application::polling::{PollingHandle, make_rng, spawn_polling};
use crate::application::subsystems::{
    seed_analytics, tick_analytics, tick_battery, tick_connectivity, tick_environment, tick_imu,
    tick_joints, tick_lidar, tick_maintenance,
};
use crate::domain::analytics::AnalyticsTelemetry;
use crate::domain::connectivity::{ConnectivityTelemetry, SignalQuality};
use crate::domain::error::FleetError;
use crate::domain::joints::{JointSummary, JointTelemetry};
use crate::domain::maintenance::MaintenanceTelemetry;
use crate::domain::power::{BatteryHealth, format_runtime};
use crate::domain::sensors::{AirQuality, CameraStatus, EnvironmentReading, ImuReading, LidarReading, camera_rig};
use crate::infrastructure::config::SimulationConfig;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, Clone)]
struct SessionTelemetry {
    imu: ImuReading,
    cameras: Vec<CameraStatus>,
    lidar: LidarReading,
    environment: EnvironmentReading,
    joints: JointTelemetry,
    connectivity: ConnectivityTelemetry,
    battery: BatteryHealth,
    maintenance: MaintenanceTelemetry,
    analytics: AnalyticsTelemetry,
}

/// Everything the detail page shows for one robot, with derived bands.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub robot_id: String,
    pub started_at: DateTime<Utc>,
    pub imu: ImuReading,
    pub cameras: Vec<CameraStatus>,
    pub lidar: LidarReading,
    pub environment: EnvironmentReading,
    pub air_quality: AirQuality,
    pub joints: JointTelemetry,
    pub joint_summary: JointSummary,
    pub connectivity: ConnectivityTelemetry,
    pub signal_quality: SignalQuality,
    pub battery: BatteryHealth,
    pub estimated_runtime: String,
    pub maintenance: MaintenanceTelemetry,
    pub analytics: AnalyticsTelemetry,
}

type Step = fn(&mut SessionTelemetry, &SimulationConfig, DateTime<Utc>, &mut StdRng);

struct DetailSession {
    robot_id: String,
    started_at: DateTime<Utc>,
    full_runtime_hours: f64,
    telemetry: Arc<RwLock<SessionTelemetry>>,
    handles: Vec<PollingHandle>,
}

impl DetailSession {
    fn start(robot_id: &str, config: Arc<SimulationConfig>) -> Self {
        let now = Utc::now();
        let mut rng = make_rng(config.seed, &format!("{robot_id}/analytics-seed"));
        let telemetry = Arc::new(RwLock::new(SessionTelemetry {
            imu: ImuReading::default(),
            cameras: camera_rig(),
            lidar: LidarReading::default(),
            environment: EnvironmentReading::default(),
            joints: JointTelemetry::humanoid(),
            connectivity: ConnectivityTelemetry::seeded(now),
            battery: BatteryHealth::seeded(now),
            maintenance: MaintenanceTelemetry::seeded(now),
            analytics: seed_analytics(robot_id, &config.analytics, now, &mut rng),
        }));

        let subsystems: [(&str, u64, Step); 8] = [
            ("imu", config.imu.interval_ms, |t, c, _, r| tick_imu(&mut t.imu, &c.imu, r)),
            ("lidar", config.lidar.interval_ms, |t, c, _, r| {
                tick_lidar(&mut t.lidar, &c.lidar, r)
            }),
            ("environment", config.environment.interval_ms, |t, c, _, r| {
                tick_environment(&mut t.environment, &c.environment, r)
            }),
            ("joints", config.joints.interval_ms, |t, c, _, r| {
                tick_joints(&mut t.joints, &c.joints, r)
            }),
            ("connectivity", config.connectivity.interval_ms, |t, c, now, r| {
                tick_connectivity(&mut t.connectivity, &c.connectivity, now, r)
            }),
            ("battery", config.battery.interval_ms, |t, c, _, r| {
                tick_battery(&mut t.battery, &c.battery, r)
            }),
            ("maintenance", config.maintenance.interval_ms, |t, c, now, r| {
                tick_maintenance(&mut t.maintenance, &c.maintenance, now, r)
            }),
            ("analytics", config.analytics.interval_ms, |t, c, now, r| {
                tick_analytics(&mut t.analytics, &c.analytics, now, r)
            }),
        ];

        let handles = subsystems
            .into_iter()
            .map(|(name, period_ms, step)| {
                let poller = format!("{robot_id}/{name}");
                let rng = make_rng(config.seed, &poller);
                spawn_subsystem(poller, period_ms, telemetry.clone(), rng, step, config.clone())
            })
            .collect();

        Self {
            robot_id: robot_id.to_string(),
            started_at: now,
            full_runtime_hours: config.battery.full_runtime_hours,
            telemetry,
            handles,
        }
    }

    async fn snapshot(&self) -> SessionSnapshot {
        let t = self.telemetry.read().await.clone();
        SessionSnapshot {
            robot_id: self.robot_id.clone(),
            started_at: self.started_at,
            air_quality: t.environment.air_quality_band(),
            joint_summary: t.joints.summary(),
            signal_quality: t.connectivity.metrics.signal_quality(),
            estimated_runtime: format_runtime(t.battery.runtime_minutes(self.full_runtime_hours)),
            imu: t.imu,
            cameras: t.cameras,
            lidar: t.lidar,
            environment: t.environment,
            joints: t.joints,
            connectivity: t.connectivity,
            battery: t.battery,
            maintenance: t.maintenance,
            analytics: t.analytics,
        }
    }

    fn stop(&self) {
        for handle in &self.handles {
            handle.stop();
        }
    }

    #[cfg(test)]
    fn is_running(&self) -> bool {
        self.handles.iter().all(PollingHandle::is_running)
    }
}

fn spawn_subsystem(
    name: String,
    period_ms: u64,
    telemetry: Arc<RwLock<SessionTelemetry>>,
    rng: StdRng,
    step: Step,
    config: Arc<SimulationConfig>,
) -> PollingHandle {
    let rng = Arc::new(Mutex::new(rng));
    spawn_polling(name, period_ms, move || {
        let telemetry = telemetry.clone();
        let rng = rng.clone();
        let config = config.clone();
        async move {
            let mut rng = rng.lock().await;
            let mut telemetry = telemetry.write().await;
            step(&mut *telemetry, &config, Utc::now(), &mut *rng);
        }
    })
}

#[derive(Clone)]
pub struct SessionService {
    sessions: Arc<RwLock<HashMap<String, DetailSession>>>,
    config: Arc<SimulationConfig>,
}

impl SessionService {
    pub fn new(config: Arc<SimulationConfig>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Start a session, or return the running one for this robot.
    pub async fn start(&self, robot_id: &str) -> SessionSnapshot {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(robot_id.to_string()).or_insert_with(|| {
            tracing::info!(robot = %robot_id, "detail session started");
            DetailSession::start(robot_id, self.config.clone())
        });
        session.snapshot().await
    }

    pub async fn snapshot(&self, robot_id: &str) -> Result<SessionSnapshot, FleetError> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(robot_id)
            .ok_or_else(|| FleetError::SessionNotFound(robot_id.to_string()))?;
        Ok(session.snapshot().await)
    }

    pub async fn stop(&self, robot_id: &str) -> Result<(), FleetError> {
        let session = self
            .sessions
            .write()
            .await
            .remove(robot_id)
            .ok_or_else(|| FleetError::SessionNotFound(robot_id.to_string()))?;
        session.stop();
        tracing::info!(robot = %robot_id, "detail session stopped");
        Ok(())
    }

    pub async fn stop_all(&self) {
        let mut sessions = self.sessions.write().await;
        for (_, session) in sessions.drain() {
            session.stop();
        }
    }

    #[cfg(test)]
    pub async fn active(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    #[cfg(test)]
    pub async fn is_running(&self, robot_id: &str) -> bool {
        self.sessions
            .read()
            .await
            .get(robot_id)
            .is_some_and(DetailSession::is_running)
    }
}
