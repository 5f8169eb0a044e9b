// Firmware service - Drives the simulated over-the-air update flow per robot
use crate::application::polling::make_rng;
use crate::domain::error::FleetError;
use crate::domain::firmware::{FirmwareFile, FirmwareUpdate, UpdateStatus};
use crate::infrastructure::config::FirmwareConfig;
use rand::Rng;
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

/// Background flow for one robot. The generation tells a finished flow
/// apart from a newer one started for the same robot.
struct FlowTask {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Clone)]
pub struct FirmwareService {
    updates: Arc<RwLock<HashMap<String, FirmwareUpdate>>>,
    tasks: Arc<Mutex<HashMap<String, FlowTask>>>,
    generations: Arc<AtomicU64>,
    config: FirmwareConfig,
    seed: Option<u64>,
}

fn increment(rng: &mut StdRng, max: f64) -> f64 {
    if max > 0.0 {
        rng.gen_range(0.0..max)
    } else {
        0.0
    }
}

impl FirmwareService {
    pub fn new(config: FirmwareConfig, seed: Option<u64>) -> Self {
        Self {
            updates: Arc::new(RwLock::new(HashMap::new())),
            tasks: Arc::new(Mutex::new(HashMap::new())),
            generations: Arc::new(AtomicU64::new(0)),
            config,
            seed,
        }
    }

    pub async fn status(&self, robot_id: &str) -> FirmwareUpdate {
        if let Some(update) = self.updates.read().await.get(robot_id) {
            return update.clone();
        }
        FirmwareUpdate::new(robot_id)
    }

    async fn with_update<T>(
        &self,
        robot_id: &str,
        f: impl FnOnce(&mut FirmwareUpdate) -> Result<T, FleetError>,
    ) -> Result<T, FleetError> {
        let mut updates = self.updates.write().await;
        let update = updates
            .entry(robot_id.to_string())
            .or_insert_with(|| FirmwareUpdate::new(robot_id));
        f(update)
    }

    pub async fn select_file(&self, robot_id: &str, file: FirmwareFile) -> Result<FirmwareUpdate, FleetError> {
        self.with_update(robot_id, |update| {
            update.select_file(file)?;
            Ok(update.clone())
        })
        .await
    }

    /// Enter the upload phase and run the rest of the flow in the background.
    pub async fn start(&self, robot_id: &str) -> Result<FirmwareUpdate, FleetError> {
        let started = self
            .with_update(robot_id, |update| {
                update.begin()?;
                Ok(update.clone())
            })
            .await;

        let started = match started {
            Ok(update) => update,
            Err(e) => {
                tracing::warn!(robot = %robot_id, error = %e, "firmware update rejected");
                return Err(e);
            }
        };

        tracing::info!(robot = %robot_id, file = ?started.selected_file.as_ref().map(|f| &f.name), "firmware upload started");
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let flow = self.clone();
        let id = robot_id.to_string();
        // Held across spawn and insert so the flow cannot release its entry first.
        let mut tasks = self.tasks.lock().await;
        let handle = tokio::spawn(async move { flow.run(&id, generation).await });
        tasks.insert(robot_id.to_string(), FlowTask { generation, handle });
        Ok(started)
    }

    async fn run(&self, robot_id: &str, generation: u64) {
        let mut rng = make_rng(self.seed, &format!("firmware/{robot_id}"));
        let cfg = &self.config;

        let mut upload = tokio::time::interval(Duration::from_millis(cfg.upload_tick_ms.max(1)));
        upload.tick().await;
        loop {
            upload.tick().await;
            let step = increment(&mut rng, cfg.upload_max_increment);
            if self.advance(robot_id, |u| u.advance_upload(step)).await {
                break;
            }
        }

        tokio::time::sleep(Duration::from_millis(cfg.settle_ms)).await;
        self.advance(robot_id, |u| {
            u.start_install();
            false
        })
        .await;
        tracing::info!(robot = %robot_id, "firmware installing");

        let mut install = tokio::time::interval(Duration::from_millis(cfg.install_tick_ms.max(1)));
        install.tick().await;
        loop {
            install.tick().await;
            let step = increment(&mut rng, cfg.install_max_increment);
            if self.advance(robot_id, |u| u.advance_install(step)).await {
                break;
            }
        }

        tokio::time::sleep(Duration::from_millis(cfg.settle_ms)).await;
        let failed = rng.gen_bool(cfg.failure_probability.clamp(0.0, 1.0));
        self.advance(robot_id, |u| {
            u.complete(failed);
            false
        })
        .await;

        if failed {
            tracing::warn!(robot = %robot_id, "firmware installation verification failed");
        } else {
            tracing::info!(robot = %robot_id, "firmware update succeeded");
        }
        self.release_task(robot_id, generation).await;
    }

    /// Forget the flow's handle unless a newer flow has replaced it.
    async fn release_task(&self, robot_id: &str, generation: u64) {
        let mut tasks = self.tasks.lock().await;
        if tasks.get(robot_id).is_some_and(|t| t.generation == generation) {
            tasks.remove(robot_id);
        }
    }

    async fn advance(&self, robot_id: &str, f: impl FnOnce(&mut FirmwareUpdate) -> bool) -> bool {
        self.with_update(robot_id, |update| Ok(f(update)))
            .await
            .unwrap_or(false)
    }

    /// Back to idle. Refused while an update is running.
    pub async fn reset(&self, robot_id: &str) -> Result<FirmwareUpdate, FleetError> {
        self.with_update(robot_id, |update| {
            if update.is_busy() {
                return Err(FleetError::UpdateInProgress(robot_id.to_string()));
            }
            update.reset();
            Ok(update.clone())
        })
        .await
    }

    /// Abort every running flow; interrupted updates are marked failed.
    pub async fn stop_all(&self) {
        let tasks: Vec<(String, FlowTask)> = self.tasks.lock().await.drain().collect();
        let mut updates = self.updates.write().await;
        for (robot_id, task) in tasks {
            task.handle.abort();
            if let Some(update) = updates.get_mut(&robot_id) {
                if update.status == UpdateStatus::Uploading || update.status == UpdateStatus::Installing {
                    update.complete(true);
                }
            }
            tracing::info!(robot = %robot_id, "firmware flow aborted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::firmware::VERIFICATION_FAILED;

    fn fast(failure_probability: f64) -> FirmwareService {
        let config = FirmwareConfig {
            upload_tick_ms: 1,
            install_tick_ms: 1,
            settle_ms: 1,
            failure_probability,
            ..FirmwareConfig::default()
        };
        FirmwareService::new(config, Some(5))
    }

    fn file() -> FirmwareFile {
        FirmwareFile {
            name: "aura-2.5.0.bin".to_string(),
            size_bytes: 45_200_000,
        }
    }

    async fn wait_until_settled(service: &FirmwareService, robot_id: &str) -> FirmwareUpdate {
        for _ in 0..400 {
            let update = service.status(robot_id).await;
            if !update.is_busy() {
                return update;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("firmware flow did not finish");
    }

    #[tokio::test]
    async fn test_forced_failure_keeps_file() {
        let service = fast(1.0);
        service.select_file("AURA-001", file()).await.unwrap();
        let started = service.start("AURA-001").await.unwrap();
        assert_eq!(started.status, UpdateStatus::Uploading);

        let done = wait_until_settled(&service, "AURA-001").await;
        assert_eq!(done.status, UpdateStatus::Failed);
        assert_eq!(done.upload_progress, 100.0);
        assert_eq!(done.install_progress, 100.0);
        assert_eq!(done.error_message.as_deref(), Some(VERIFICATION_FAILED));
        assert_eq!(done.selected_file, Some(file()));

        let reset = service.reset("AURA-001").await.unwrap();
        assert_eq!(reset.status, UpdateStatus::Idle);
        assert!(reset.selected_file.is_none());
    }

    #[tokio::test]
    async fn test_success_clears_file() {
        let service = fast(0.0);
        service.select_file("AURA-002", file()).await.unwrap();
        service.start("AURA-002").await.unwrap();

        let done = wait_until_settled(&service, "AURA-002").await;
        assert_eq!(done.status, UpdateStatus::Success);
        assert!(done.selected_file.is_none());
        assert!(done.error_message.is_none());
    }

    #[tokio::test]
    async fn test_start_without_file() {
        let service = fast(0.1);
        assert_eq!(
            service.start("AURA-003").await,
            Err(FleetError::NoFirmwareSelected)
        );
        let status = service.status("AURA-003").await;
        assert_eq!(status.status, UpdateStatus::Idle);
        assert_eq!(
            status.error_message.as_deref(),
            Some("Please select a firmware file first.")
        );
    }

    #[tokio::test]
    async fn test_busy_update_rejects_start_and_reset() {
        let config = FirmwareConfig {
            upload_tick_ms: 1_000,
            ..FirmwareConfig::default()
        };
        let service = FirmwareService::new(config, Some(1));
        service.select_file("AURA-004", file()).await.unwrap();
        service.start("AURA-004").await.unwrap();

        assert!(matches!(
            service.start("AURA-004").await,
            Err(FleetError::UpdateInProgress(_))
        ));
        assert!(matches!(
            service.reset("AURA-004").await,
            Err(FleetError::UpdateInProgress(_))
        ));

        service.stop_all().await;
        assert_eq!(service.status("AURA-004").await.status, UpdateStatus::Failed);
    }

    #[tokio::test]
    async fn test_finished_flow_leaves_newer_flow_tracked() {
        let config = FirmwareConfig {
            upload_tick_ms: 1_000,
            ..FirmwareConfig::default()
        };
        let service = FirmwareService::new(config, Some(2));
        service.select_file("AURA-005", file()).await.unwrap();
        service.start("AURA-005").await.unwrap();
        let current = service.tasks.lock().await["AURA-005"].generation;

        // an earlier flow for the same robot finishing late
        service.release_task("AURA-005", current - 1).await;
        assert!(service.tasks.lock().await.contains_key("AURA-005"));

        service.stop_all().await;
        assert_eq!(service.status("AURA-005").await.status, UpdateStatus::Failed);
    }

    #[tokio::test]
    async fn test_flow_releases_its_own_entry() {
        let service = fast(0.0);
        service.select_file("AURA-006", file()).await.unwrap();
        service.start("AURA-006").await.unwrap();
        wait_until_settled(&service, "AURA-006").await;

        for _ in 0..100 {
            if service.tasks.lock().await.is_empty() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("finished flow kept its task entry");
    }
}
