// Fleet service - Live robot list, alerts and the views derived from them
use crate::application::aggregation::{alert_summary, compute_kpi, distributions, filter_options};
use crate::application::filtering::{AlertFilter, FleetTable, RobotFilter, SortKey, TableView, filter_alerts};
use crate::application::polling::{PollingHandle, make_rng, spawn_polling};
use crate::application::telemetry_source::TelemetrySource;
use crate::domain::alert::{Alert, AlertDraft, AlertSummary};
use crate::domain::connectivity::{ConnectionStatus, ConnectionView};
use crate::domain::error::FleetError;
use crate::domain::kpi::{FilterOptions, FleetDistributions, KpiHistory, KpiSnapshot};
use crate::domain::robot::{Robot, RobotReading, RealtimeUpdate, UpdateKind, UpdateValue};
use crate::domain::telemetry::{Bounds, round_to};
use crate::infrastructure::config::SimulationConfig;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::rngs::StdRng;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

const PERCENT: Bounds = Bounds::new(0.0, 100.0);
const UPDATE_CHANNEL_CAPACITY: usize = 256;

struct FleetState {
    robots: Vec<Robot>,
    /// Newest first.
    alerts: Vec<Alert>,
    next_alert_id: u64,
    kpi_history: KpiHistory,
    /// Newest first, bounded.
    updates: VecDeque<RealtimeUpdate>,
    update_capacity: usize,
    connection: ConnectionStatus,
    connection_rng: StdRng,
    table: FleetTable,
}

impl FleetState {
    fn robot(&self, id: &str) -> Result<&Robot, FleetError> {
        self.robots
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| FleetError::RobotNotFound(id.to_string()))
    }

    fn alert_mut(&mut self, id: &str) -> Result<&mut Alert, FleetError> {
        self.alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| FleetError::AlertNotFound(id.to_string()))
    }

    fn record(&mut self, update: RealtimeUpdate) {
        self.updates.push_front(update);
        self.updates.truncate(self.update_capacity);
    }

    /// Apply one reading. Battery and signal are clamped to [0, 100] whatever
    /// the source proposed.
    fn apply_reading(
        &mut self,
        robot_id: &str,
        reading: RobotReading,
        now: DateTime<Utc>,
    ) -> Option<RealtimeUpdate> {
        let robot = self.robots.iter_mut().find(|r| r.id == robot_id)?;
        let number = |old: f64, new: f64| {
            (
                UpdateValue::Number(round_to(old, 0)),
                UpdateValue::Number(round_to(new, 0)),
            )
        };

        let (kind, (old_value, new_value)) = match reading {
            RobotReading::Battery(value) => {
                let old = robot.battery;
                robot.battery = PERCENT.clamp(value);
                (UpdateKind::Battery, number(old, robot.battery))
            }
            RobotReading::Temperature(value) => {
                let old = robot.temperature;
                robot.temperature = value;
                (UpdateKind::Temperature, number(old, robot.temperature))
            }
            RobotReading::Signal(value) => {
                let old = robot.signal;
                robot.signal = PERCENT.clamp(value);
                (UpdateKind::Signal, number(old, robot.signal))
            }
            RobotReading::Status(status) => {
                let old = robot.status;
                robot.status = status;
                (
                    UpdateKind::Status,
                    (
                        UpdateValue::Text(old.to_string()),
                        UpdateValue::Text(status.to_string()),
                    ),
                )
            }
        };
        robot.last_updated = now;

        let update = RealtimeUpdate {
            kind,
            robot_id: robot_id.to_string(),
            old_value,
            new_value,
            timestamp: now,
        };
        self.record(update.clone());
        Some(update)
    }

    fn push_alert(&mut self, draft: AlertDraft, now: DateTime<Utc>) -> Result<Alert, FleetError> {
        self.robot(&draft.robot_id)?;

        let alert = Alert {
            id: format!("ALERT-{:03}", self.next_alert_id),
            robot_id: draft.robot_id,
            severity: draft.severity,
            kind: draft.kind,
            message: draft.message,
            timestamp: now,
            acknowledged: false,
            acknowledged_at: None,
            acknowledged_by: None,
        };
        self.next_alert_id += 1;
        self.alerts.insert(0, alert.clone());
        Ok(alert)
    }
}

/// One past the highest numeric suffix among existing alert ids.
fn next_alert_id(alerts: &[Alert]) -> u64 {
    alerts
        .iter()
        .filter_map(|a| a.id.rsplit('-').next()?.parse::<u64>().ok())
        .max()
        .map_or(1, |max| max + 1)
}

#[derive(Clone)]
pub struct FleetService {
    state: Arc<RwLock<FleetState>>,
    source: Arc<dyn TelemetrySource>,
    updates_tx: broadcast::Sender<RealtimeUpdate>,
    config: Arc<SimulationConfig>,
}

impl FleetService {
    pub fn new(
        robots: Vec<Robot>,
        mut alerts: Vec<Alert>,
        source: Arc<dyn TelemetrySource>,
        config: Arc<SimulationConfig>,
    ) -> Self {
        let now = Utc::now();
        alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let mut kpi_history = KpiHistory::new(config.kpi.history_capacity);
        kpi_history.push(compute_kpi(&robots, now));

        let mut connection_rng = make_rng(config.seed, "connection");
        let connection = ConnectionStatus::new(config.connection.initial_latency.sample(&mut connection_rng));

        let state = FleetState {
            next_alert_id: next_alert_id(&alerts),
            robots,
            alerts,
            kpi_history,
            updates: VecDeque::with_capacity(config.updates.log_capacity),
            update_capacity: config.updates.log_capacity,
            connection,
            connection_rng,
            table: FleetTable::new(config.table.page_size),
        };
        let (updates_tx, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

        Self {
            state: Arc::new(RwLock::new(state)),
            source,
            updates_tx,
            config,
        }
    }

    pub async fn robots(&self) -> Vec<Robot> {
        self.state.read().await.robots.clone()
    }

    pub async fn robot(&self, id: &str) -> Result<Robot, FleetError> {
        self.state.read().await.robot(id).cloned()
    }

    pub async fn kpi(&self) -> KpiSnapshot {
        compute_kpi(&self.state.read().await.robots, Utc::now())
    }

    pub async fn kpi_history(&self) -> Vec<KpiSnapshot> {
        self.state.read().await.kpi_history.to_vec()
    }

    pub async fn distributions(&self) -> FleetDistributions {
        distributions(&self.state.read().await.robots)
    }

    pub async fn filter_options(&self) -> FilterOptions {
        filter_options(&self.state.read().await.robots)
    }

    /// Stateless table query; the shared table view is left untouched.
    pub async fn query_robots(&self, filter: RobotFilter, sort: SortKey, page: i64) -> TableView {
        let state = self.state.read().await;
        let mut table = FleetTable::new(self.config.table.page_size);
        table.set_filter(filter);
        table.set_sort(sort);
        table.set_page(page, &state.robots);
        table.view(&state.robots)
    }

    pub async fn table_view(&self) -> TableView {
        let state = self.state.read().await;
        state.table.view(&state.robots)
    }

    pub async fn set_table_filter(&self, filter: RobotFilter) -> TableView {
        let mut state = self.state.write().await;
        state.table.set_filter(filter);
        state.table.view(&state.robots)
    }

    pub async fn set_table_sort(&self, sort: SortKey) -> TableView {
        let mut state = self.state.write().await;
        state.table.set_sort(sort);
        state.table.view(&state.robots)
    }

    pub async fn set_table_page(&self, page: i64) -> TableView {
        let mut state = self.state.write().await;
        let FleetState { table, robots, .. } = &mut *state;
        table.set_page(page, robots);
        table.view(robots)
    }

    pub async fn reset_table(&self) -> TableView {
        let mut state = self.state.write().await;
        state.table.reset();
        state.table.view(&state.robots)
    }

    pub async fn recent_updates(&self) -> Vec<RealtimeUpdate> {
        self.state.read().await.updates.iter().cloned().collect()
    }

    /// The recent log (oldest first) plus a receiver for everything after
    /// it. Updates are published under the state lock, so nothing lands in
    /// both.
    pub async fn follow_updates(&self) -> (Vec<RealtimeUpdate>, broadcast::Receiver<RealtimeUpdate>) {
        let state = self.state.read().await;
        let rx = self.updates_tx.subscribe();
        let backlog = state.updates.iter().rev().cloned().collect();
        (backlog, rx)
    }

    pub async fn connection(&self) -> ConnectionView {
        ConnectionView::at(&self.state.read().await.connection, Utc::now())
    }

    pub async fn alerts(&self, filter: &AlertFilter) -> Vec<Alert> {
        filter_alerts(&self.state.read().await.alerts, filter)
    }

    pub async fn alert_summary(&self) -> AlertSummary {
        alert_summary(&self.state.read().await.alerts)
    }

    pub async fn raise_alert(&self, draft: AlertDraft) -> Result<Alert, FleetError> {
        let now = Utc::now();
        let alert = {
            let mut state = self.state.write().await;
            let alert = state.push_alert(draft, now)?;
            let update = RealtimeUpdate {
                kind: UpdateKind::Alert,
                robot_id: alert.robot_id.clone(),
                old_value: UpdateValue::Text(String::new()),
                new_value: UpdateValue::Text(alert.message.clone()),
                timestamp: now,
            };
            state.record(update.clone());
            let _ = self.updates_tx.send(update);
            alert
        };

        tracing::info!(alert = %alert.id, robot = %alert.robot_id, severity = ?alert.severity, "alert raised");
        Ok(alert)
    }

    pub async fn acknowledge_alert(&self, id: &str, by: &str) -> Result<Alert, FleetError> {
        let mut state = self.state.write().await;
        let alert = state.alert_mut(id)?;
        alert.acknowledge(by, Utc::now());
        tracing::info!(alert = %id, by = %by, "alert acknowledged");
        Ok(alert.clone())
    }

    /// Returns how many alerts changed state.
    pub async fn acknowledge_all(&self, by: &str) -> usize {
        let now = Utc::now();
        let mut state = self.state.write().await;
        let mut changed = 0;
        for alert in state.alerts.iter_mut().filter(|a| !a.acknowledged) {
            alert.acknowledge(by, now);
            changed += 1;
        }
        changed
    }

    pub async fn dismiss_alert(&self, id: &str) -> Result<Alert, FleetError> {
        let mut state = self.state.write().await;
        let index = state
            .alerts
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| FleetError::AlertNotFound(id.to_string()))?;
        Ok(state.alerts.remove(index))
    }

    /// Returns how many alerts were removed.
    pub async fn clear_acknowledged(&self) -> usize {
        let mut state = self.state.write().await;
        let before = state.alerts.len();
        state.alerts.retain(|a| !a.acknowledged);
        before - state.alerts.len()
    }

    /// One fleet pass: ask the source about every robot, apply what it
    /// proposes, then append a KPI snapshot.
    pub async fn tick(&self) -> Vec<RealtimeUpdate> {
        let robots = self.robots().await;
        let mut readings = Vec::new();
        for robot in &robots {
            match self.source.sample(robot).await {
                Ok(Some(reading)) => readings.push((robot.id.clone(), reading)),
                Ok(None) => {}
                Err(e) => tracing::warn!(robot = %robot.id, error = %e, "telemetry sample failed"),
            }
        }

        let now = Utc::now();
        let emitted: Vec<RealtimeUpdate> = {
            let mut state = self.state.write().await;
            let emitted: Vec<RealtimeUpdate> = readings
                .into_iter()
                .filter_map(|(id, reading)| state.apply_reading(&id, reading, now))
                .collect();
            let snapshot = compute_kpi(&state.robots, now);
            state.kpi_history.push(snapshot);
            for update in &emitted {
                let _ = self.updates_tx.send(update.clone());
            }
            emitted
        };

        tracing::debug!(updates = emitted.len(), "fleet tick");
        emitted
    }

    /// Walk the link latency and occasionally drop the link for a short while.
    pub async fn tick_connection(&self) {
        let cfg = &self.config.connection;
        let now = Utc::now();
        let mut state = self.state.write().await;
        let FleetState {
            connection,
            connection_rng,
            ..
        } = &mut *state;

        connection.latency_ms = cfg.latency.step(connection.latency_ms, connection_rng);
        if !connection.is_connected(now) {
            return;
        }
        connection.dropped_until = None;
        if connection_rng.gen_bool(cfg.drop_probability.clamp(0.0, 1.0)) {
            let outage = cfg.reconnect_ms.sample(connection_rng);
            connection.dropped_until = Some(now + Duration::milliseconds(outage as i64));
            tracing::warn!(outage_ms = outage as i64, "fleet link dropped");
        }
    }

    pub async fn poll_alerts(&self) -> Option<Alert> {
        let robots = self.robots().await;
        match self.source.poll_alert(&robots).await {
            Ok(Some(draft)) => match self.raise_alert(draft).await {
                Ok(alert) => Some(alert),
                Err(e) => {
                    tracing::warn!(error = %e, "generated alert rejected");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "alert poll failed");
                None
            }
        }
    }

    /// Start the fleet, connection and alert pollers. Dropping the returned
    /// handles stops them.
    pub fn start_polling(&self) -> Vec<PollingHandle> {
        let fleet = self.clone();
        let connection = self.clone();
        let alerts = self.clone();

        vec![
            spawn_polling("fleet", self.config.fleet.interval_ms, move || {
                let fleet = fleet.clone();
                async move {
                    fleet.tick().await;
                }
            }),
            spawn_polling("connection", self.config.connection.interval_ms, move || {
                let connection = connection.clone();
                async move {
                    connection.tick_connection().await;
                }
            }),
            spawn_polling("alerts", self.config.alerts.interval_ms, move || {
                let alerts = alerts.clone();
                async move {
                    alerts.poll_alerts().await;
                }
            }),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::alert::{AlertType, Severity};
    use crate::domain::fixtures::{alert, fleet_of_24};
    use crate::domain::robot::RobotStatus;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Replays fixed readings and hands out one alert per poll.
    struct ScriptedSource {
        readings: HashMap<String, RobotReading>,
        alert: Option<AlertDraft>,
    }

    #[async_trait]
    impl TelemetrySource for ScriptedSource {
        async fn sample(&self, robot: &Robot) -> anyhow::Result<Option<RobotReading>> {
            if robot.id == "AURA-024" {
                anyhow::bail!("sensor offline");
            }
            Ok(self.readings.get(&robot.id).copied())
        }

        async fn poll_alert(&self, _robots: &[Robot]) -> anyhow::Result<Option<AlertDraft>> {
            Ok(self.alert.clone())
        }
    }

    fn service(readings: Vec<(&str, RobotReading)>, scripted_alert: Option<AlertDraft>) -> FleetService {
        let source = ScriptedSource {
            readings: readings
                .into_iter()
                .map(|(id, r)| (id.to_string(), r))
                .collect(),
            alert: scripted_alert,
        };
        let alerts = vec![
            alert("ALERT-001", Severity::Critical, AlertType::Error, 5),
            alert("ALERT-002", Severity::Warning, AlertType::Temperature, 8),
            alert("ALERT-003", Severity::Warning, AlertType::Battery, 2),
        ];
        let config = SimulationConfig {
            seed: Some(7),
            ..SimulationConfig::default()
        };
        FleetService::new(fleet_of_24(), alerts, Arc::new(source), Arc::new(config))
    }

    #[tokio::test]
    async fn test_tick_applies_readings_and_clamps() {
        let svc = service(
            vec![
                ("AURA-001", RobotReading::Battery(-4.0)),
                ("AURA-002", RobotReading::Signal(140.0)),
                ("AURA-003", RobotReading::Status(RobotStatus::Error)),
            ],
            None,
        );
        let (backlog, mut rx) = svc.follow_updates().await;
        assert!(backlog.is_empty());

        let updates = svc.tick().await;
        assert_eq!(updates.len(), 3);

        assert_eq!(svc.robot("AURA-001").await.unwrap().battery, 0.0);
        assert_eq!(svc.robot("AURA-002").await.unwrap().signal, 100.0);
        assert_eq!(svc.robot("AURA-003").await.unwrap().status, RobotStatus::Error);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.kind, UpdateKind::Battery);
        assert_eq!(first.old_value, UpdateValue::Number(50.0));
        assert_eq!(first.new_value, UpdateValue::Number(0.0));
    }

    #[tokio::test]
    async fn test_tick_appends_kpi_snapshot_and_logs_newest_first() {
        let svc = service(
            vec![
                ("AURA-001", RobotReading::Temperature(41.6)),
                ("AURA-002", RobotReading::Status(RobotStatus::Offline)),
            ],
            None,
        );

        svc.tick().await;
        let history = svc.kpi_history().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].offline, 3);

        let log = svc.recent_updates().await;
        assert_eq!(log[0].robot_id, "AURA-002");
        assert_eq!(log[0].new_value, UpdateValue::Text("offline".to_string()));
        assert_eq!(log[1].new_value, UpdateValue::Number(42.0));
    }

    #[tokio::test]
    async fn test_follower_sees_each_update_once() {
        let svc = service(vec![("AURA-001", RobotReading::Battery(40.0))], None);
        svc.tick().await;

        let (backlog, mut rx) = svc.follow_updates().await;
        assert_eq!(backlog.len(), 1);
        assert!(rx.try_recv().is_err());

        svc.tick().await;
        let live = rx.try_recv().unwrap();
        assert_eq!(live.robot_id, "AURA-001");
        assert!(rx.try_recv().is_err());
        assert!(live.timestamp >= backlog[0].timestamp);
    }

    #[tokio::test]
    async fn test_update_log_is_bounded() {
        let svc = service(vec![("AURA-001", RobotReading::Battery(40.0))], None);
        for _ in 0..60 {
            svc.tick().await;
        }
        assert_eq!(svc.recent_updates().await.len(), 50);
    }

    #[tokio::test]
    async fn test_alert_lifecycle() {
        let svc = service(vec![], None);
        assert_eq!(svc.alert_summary().await.unacknowledged, 3);

        let acked = svc.acknowledge_alert("ALERT-002", "operator").await.unwrap();
        assert!(acked.acknowledged);
        assert_eq!(acked.acknowledged_by.as_deref(), Some("operator"));

        assert_eq!(svc.clear_acknowledged().await, 1);
        assert_eq!(svc.alert_summary().await.total, 2);

        let dismissed = svc.dismiss_alert("ALERT-003").await.unwrap();
        assert_eq!(dismissed.id, "ALERT-003");
        assert_eq!(
            svc.dismiss_alert("ALERT-003").await,
            Err(FleetError::AlertNotFound("ALERT-003".to_string()))
        );

        assert_eq!(svc.acknowledge_all("operator").await, 1);
        assert_eq!(svc.alert_summary().await.unacknowledged, 0);
    }

    #[tokio::test]
    async fn test_alerts_are_listed_newest_first() {
        let svc = service(vec![], None);
        let ids: Vec<String> = svc
            .alerts(&AlertFilter::default())
            .await
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["ALERT-003", "ALERT-001", "ALERT-002"]);
    }

    #[tokio::test]
    async fn test_polled_alert_gets_next_id() {
        let draft = AlertDraft {
            robot_id: "AURA-005".to_string(),
            severity: Severity::Critical,
            kind: AlertType::Collision,
            message: "Object detected 0.42m ahead".to_string(),
        };
        let svc = service(vec![], Some(draft));

        let raised = svc.poll_alerts().await.unwrap();
        assert_eq!(raised.id, "ALERT-004");
        assert_eq!(svc.alerts(&AlertFilter::default()).await[0].id, "ALERT-004");
        assert_eq!(svc.recent_updates().await[0].kind, UpdateKind::Alert);
    }

    #[tokio::test]
    async fn test_alert_for_unknown_robot_is_rejected() {
        let svc = service(vec![], None);
        let draft = AlertDraft {
            robot_id: "AURA-999".to_string(),
            severity: Severity::Info,
            kind: AlertType::Maintenance,
            message: "service due".to_string(),
        };
        assert_eq!(
            svc.raise_alert(draft).await,
            Err(FleetError::RobotNotFound("AURA-999".to_string()))
        );
    }

    #[tokio::test]
    async fn test_table_filter_change_resets_page() {
        let svc = service(vec![], None);
        assert_eq!(svc.set_table_page(3).await.page.page, 3);

        let view = svc
            .set_table_filter(RobotFilter {
                status: Some(RobotStatus::Online),
                ..Default::default()
            })
            .await;
        assert_eq!(view.page.page, 1);
        assert_eq!(view.page.total_items, 18);
        assert_eq!(view.page.total_pages, 4);

        let view = svc.set_table_page(10).await;
        assert_eq!(view.page.page, 4);
        assert_eq!(view.page.items.len(), 3);
    }

    #[tokio::test]
    async fn test_connection_latency_stays_in_bounds() {
        let svc = service(vec![], None);
        for _ in 0..500 {
            svc.tick_connection().await;
        }
        let view = svc.connection().await;
        assert!((5..=200).contains(&view.latency_ms));
    }

    #[tokio::test]
    async fn test_kpi_matches_fleet() {
        let svc = service(vec![], None);
        let kpi = svc.kpi().await;
        assert_eq!(kpi.fleet_health, 88);
        assert_eq!(svc.filter_options().await.locations, vec!["Lab Floor 2"]);
    }
}
