// Over-the-air firmware update flow
use serde::{Deserialize, Serialize};

use super::error::FleetError;

pub const VERIFICATION_FAILED: &str = "Installation verification failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStatus {
    Idle,
    Uploading,
    Installing,
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirmwareFile {
    pub name: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FirmwareVersion {
    pub version: String,
    pub release_date: String,
    pub size: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateRecord {
    pub version: String,
    pub date: String,
    pub status: UpdateStatus,
    pub duration: String,
}

/// Update state for one robot. Progress values are percentages in [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FirmwareUpdate {
    pub robot_id: String,
    pub current_version: String,
    pub status: UpdateStatus,
    pub upload_progress: f64,
    pub install_progress: f64,
    pub selected_file: Option<FirmwareFile>,
    pub error_message: Option<String>,
    pub available_versions: Vec<FirmwareVersion>,
    pub history: Vec<UpdateRecord>,
}

impl FirmwareUpdate {
    pub fn new(robot_id: &str) -> Self {
        let version = |version: &str, release_date: &str, size: &str, description: &str| FirmwareVersion {
            version: version.to_string(),
            release_date: release_date.to_string(),
            size: size.to_string(),
            description: description.to_string(),
        };
        let record = |version: &str, date: &str, status: UpdateStatus, duration: &str| UpdateRecord {
            version: version.to_string(),
            date: date.to_string(),
            status,
            duration: duration.to_string(),
        };

        Self {
            robot_id: robot_id.to_string(),
            current_version: "2.4.1".to_string(),
            status: UpdateStatus::Idle,
            upload_progress: 0.0,
            install_progress: 0.0,
            selected_file: None,
            error_message: None,
            available_versions: vec![
                version(
                    "2.5.0",
                    "2025-11-25",
                    "45.2 MB",
                    "Performance improvements, new motion algorithms, bug fixes",
                ),
                version("2.4.2", "2025-11-18", "43.8 MB", "Security patch, stability improvements"),
            ],
            history: vec![
                record("2.4.1", "2025-11-10 14:32", UpdateStatus::Success, "4m 23s"),
                record("2.4.0", "2025-10-28 09:15", UpdateStatus::Success, "4m 18s"),
                record("2.3.5", "2025-10-15 16:45", UpdateStatus::Failed, "2m 10s"),
            ],
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.status, UpdateStatus::Uploading | UpdateStatus::Installing)
    }

    pub fn select_file(&mut self, file: FirmwareFile) -> Result<(), FleetError> {
        if self.is_busy() {
            return Err(FleetError::UpdateInProgress(self.robot_id.clone()));
        }
        self.selected_file = Some(file);
        self.error_message = None;
        Ok(())
    }

    /// Enter the upload phase. Without a selected file the state keeps its
    /// status and records the prompt as the error message.
    pub fn begin(&mut self) -> Result<(), FleetError> {
        if self.is_busy() {
            return Err(FleetError::UpdateInProgress(self.robot_id.clone()));
        }
        if self.selected_file.is_none() {
            let err = FleetError::NoFirmwareSelected;
            self.error_message = Some(err.to_string());
            return Err(err);
        }

        self.error_message = None;
        self.upload_progress = 0.0;
        self.install_progress = 0.0;
        self.status = UpdateStatus::Uploading;
        Ok(())
    }

    /// Returns true once the upload reaches 100%.
    pub fn advance_upload(&mut self, increment: f64) -> bool {
        self.upload_progress = (self.upload_progress + increment.max(0.0)).min(100.0);
        self.upload_progress >= 100.0
    }

    pub fn start_install(&mut self) {
        self.status = UpdateStatus::Installing;
    }

    /// Returns true once the install reaches 100%.
    pub fn advance_install(&mut self, increment: f64) -> bool {
        self.install_progress = (self.install_progress + increment.max(0.0)).min(100.0);
        self.install_progress >= 100.0
    }

    /// A failed install keeps the selected file; only `reset` clears it.
    pub fn complete(&mut self, failed: bool) {
        if failed {
            self.status = UpdateStatus::Failed;
            self.error_message = Some(VERIFICATION_FAILED.to_string());
        } else {
            self.status = UpdateStatus::Success;
            self.selected_file = None;
        }
    }

    pub fn reset(&mut self) {
        self.status = UpdateStatus::Idle;
        self.upload_progress = 0.0;
        self.install_progress = 0.0;
        self.error_message = None;
        self.selected_file = None;
    }
}
