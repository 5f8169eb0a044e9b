// Source trait for robot telemetry
use crate::domain::alert::AlertDraft;
use crate::domain::robot::{Robot, RobotReading};
use async_trait::async_trait;

/// Where fleet readings come from. The random-walk simulator is the only
/// implementation today; a real ingestion adapter plugs in here.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Propose at most one change for a robot on this tick
    async fn sample(&self, robot: &Robot) -> anyhow::Result<Option<RobotReading>>;

    /// Optionally raise a safety alert against one of the robots
    async fn poll_alert(&self, robots: &[Robot]) -> anyhow::Result<Option<AlertDraft>>;
}
