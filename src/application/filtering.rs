// Fleet table filtering, sorting and pagination
use crate::domain::alert::{Alert, AlertType, Severity};
use crate::domain::robot::{Robot, RobotStatus};
use crate::domain::telemetry::Bounds;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatteryBand {
    Critical,
    Low,
    Medium,
    High,
}

impl BatteryBand {
    pub fn contains(&self, battery: f64) -> bool {
        match self {
            BatteryBand::Critical => battery < 30.0,
            BatteryBand::Low => (30.0..60.0).contains(&battery),
            BatteryBand::Medium => (60.0..85.0).contains(&battery),
            BatteryBand::High => battery >= 85.0,
        }
    }
}

/// Normal and warning share their 50°C edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureBand {
    Normal,
    Warning,
    Critical,
}

impl TemperatureBand {
    pub fn contains(&self, temperature: f64) -> bool {
        match self {
            TemperatureBand::Normal => (35.0..=50.0).contains(&temperature),
            TemperatureBand::Warning => (50.0..=65.0).contains(&temperature),
            TemperatureBand::Critical => temperature > 65.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericField {
    Battery,
    Temperature,
    Signal,
}

impl NumericField {
    fn value(&self, robot: &Robot) -> f64 {
        match self {
            NumericField::Battery => robot.battery,
            NumericField::Temperature => robot.temperature,
            NumericField::Signal => robot.signal,
        }
    }
}

/// One test against a robot. Text equality is exact; search is a
/// case-insensitive substring match over the searchable fields.
#[derive(Debug, Clone, PartialEq)]
pub enum RobotPredicate {
    Search(String),
    Status(RobotStatus),
    Battery(BatteryBand),
    Temperature(TemperatureBand),
    Range { field: NumericField, bounds: Bounds },
    Location(String),
    Country(String),
    State(String),
    Region(String),
}

impl RobotPredicate {
    pub fn search(query: &str) -> Self {
        RobotPredicate::Search(query.to_lowercase())
    }

    pub fn matches(&self, robot: &Robot) -> bool {
        match self {
            RobotPredicate::Search(needle) => robot
                .searchable_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(needle.as_str())),
            RobotPredicate::Status(status) => robot.status == *status,
            RobotPredicate::Battery(band) => band.contains(robot.battery),
            RobotPredicate::Temperature(band) => band.contains(robot.temperature),
            RobotPredicate::Range { field, bounds } => bounds.contains(field.value(robot)),
            RobotPredicate::Location(v) => robot.location == *v,
            RobotPredicate::Country(v) => robot.country == *v,
            RobotPredicate::State(v) => robot.state == *v,
            RobotPredicate::Region(v) => robot.region == *v,
        }
    }
}

/// Predicates combined with logical AND. No predicates matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RobotCriteria {
    predicates: Vec<RobotPredicate>,
}

impl RobotCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, predicate: RobotPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, robot: &Robot) -> bool {
        self.predicates.iter().all(|p| p.matches(robot))
    }
}

pub fn filter_robots(robots: &[Robot], criteria: &RobotCriteria) -> Vec<Robot> {
    if criteria.is_empty() {
        return robots.to_vec();
    }
    robots
        .iter()
        .filter(|r| criteria.matches(r))
        .cloned()
        .collect()
}

/// Table filter state as the client sends it. An absent field means "all".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotFilter {
    #[serde(alias = "q")]
    pub search: Option<String>,
    pub status: Option<RobotStatus>,
    pub battery: Option<BatteryBand>,
    pub temperature: Option<TemperatureBand>,
    pub location: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub region: Option<String>,
    pub battery_min: Option<f64>,
    pub battery_max: Option<f64>,
    pub temperature_min: Option<f64>,
    pub temperature_max: Option<f64>,
    pub signal_min: Option<f64>,
    pub signal_max: Option<f64>,
}

fn range(field: NumericField, min: Option<f64>, max: Option<f64>) -> Option<RobotPredicate> {
    if min.is_none() && max.is_none() {
        return None;
    }
    Some(RobotPredicate::Range {
        field,
        bounds: Bounds::new(min.unwrap_or(f64::NEG_INFINITY), max.unwrap_or(f64::INFINITY)),
    })
}

impl RobotFilter {
    pub fn criteria(&self) -> RobotCriteria {
        let text = |value: &Option<String>| value.as_ref().filter(|v| !v.is_empty()).cloned();

        let predicates = [
            self.search
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(RobotPredicate::search),
            self.status.map(RobotPredicate::Status),
            self.battery.map(RobotPredicate::Battery),
            self.temperature.map(RobotPredicate::Temperature),
            text(&self.location).map(RobotPredicate::Location),
            text(&self.country).map(RobotPredicate::Country),
            text(&self.state).map(RobotPredicate::State),
            text(&self.region).map(RobotPredicate::Region),
            range(NumericField::Battery, self.battery_min, self.battery_max),
            range(NumericField::Temperature, self.temperature_min, self.temperature_max),
            range(NumericField::Signal, self.signal_min, self.signal_max),
        ];

        predicates
            .into_iter()
            .flatten()
            .fold(RobotCriteria::new(), RobotCriteria::with)
    }

    pub fn active_count(&self) -> usize {
        self.criteria().len()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    Name,
    BatteryAsc,
    BatteryDesc,
    Status,
    /// Most recently updated first.
    Updated,
}

/// Stable: robots with equal keys keep their relative order.
pub fn sort_robots(robots: &mut [Robot], key: SortKey) {
    match key {
        SortKey::Name => robots.sort_by(|a, b| a.name.cmp(&b.name)),
        SortKey::BatteryAsc => robots.sort_by(|a, b| a.battery.total_cmp(&b.battery)),
        SortKey::BatteryDesc => robots.sort_by(|a, b| b.battery.total_cmp(&a.battery)),
        SortKey::Status => robots.sort_by(|a, b| a.status.as_str().cmp(b.status.as_str())),
        SortKey::Updated => robots.sort_by(|a, b| b.last_updated.cmp(&a.last_updated)),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    total_items.div_ceil(page_size.max(1))
}

/// Clamp into [1, max(1, total_pages)].
pub fn clamp_page(requested: i64, total_pages: usize) -> usize {
    let last = total_pages.max(1);
    usize::try_from(requested).unwrap_or(1).clamp(1, last)
}

pub fn paginate<T: Clone>(items: &[T], requested: i64, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_pages = total_pages(items.len(), page_size);
    let page = clamp_page(requested, total_pages);
    let start = ((page - 1) * page_size).min(items.len());
    let end = (start + page_size).min(items.len());

    Page {
        items: items[start..end].to_vec(),
        page,
        page_size,
        total_items: items.len(),
        total_pages,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckState {
    #[default]
    All,
    Acknowledged,
    Unacknowledged,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertFilter {
    pub severity: Option<Severity>,
    #[serde(rename = "type")]
    pub kind: Option<AlertType>,
    pub status: AckState,
}

impl AlertFilter {
    pub fn matches(&self, alert: &Alert) -> bool {
        self.severity.is_none_or(|s| alert.severity == s)
            && self.kind.is_none_or(|k| alert.kind == k)
            && match self.status {
                AckState::All => true,
                AckState::Acknowledged => alert.acknowledged,
                AckState::Unacknowledged => !alert.acknowledged,
            }
    }
}

/// Matching alerts, newest first.
pub fn filter_alerts(alerts: &[Alert], filter: &AlertFilter) -> Vec<Alert> {
    let mut matched: Vec<Alert> = alerts.iter().filter(|a| filter.matches(a)).cloned().collect();
    matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    matched
}

/// Interactive table state: one filter, one sort key, one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetTable {
    filter: RobotFilter,
    sort: SortKey,
    page: usize,
    page_size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableView {
    #[serde(flatten)]
    pub page: Page<Robot>,
    pub sort: SortKey,
    pub filter: RobotFilter,
    pub active_filters: usize,
    /// Set when the filter leaves nothing to show; the client offers a reset.
    pub no_results: bool,
}

impl FleetTable {
    pub fn new(page_size: usize) -> Self {
        Self {
            filter: RobotFilter::default(),
            sort: SortKey::default(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Any filter change goes back to the first page.
    pub fn set_filter(&mut self, filter: RobotFilter) {
        self.filter = filter;
        self.page = 1;
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
    }

    pub fn set_page(&mut self, requested: i64, robots: &[Robot]) {
        let criteria = self.filter.criteria();
        let matching = robots.iter().filter(|r| criteria.matches(r)).count();
        self.page = clamp_page(requested, total_pages(matching, self.page_size));
    }

    pub fn reset(&mut self) {
        self.filter = RobotFilter::default();
        self.sort = SortKey::default();
        self.page = 1;
    }

    pub fn view(&self, robots: &[Robot]) -> TableView {
        let criteria = self.filter.criteria();
        let mut rows = filter_robots(robots, &criteria);
        sort_robots(&mut rows, self.sort);
        let page = paginate(&rows, self.page as i64, self.page_size);

        TableView {
            no_results: page.total_items == 0,
            page,
            sort: self.sort,
            filter: self.filter.clone(),
            active_filters: self.filter.active_count(),
        }
    }
}
