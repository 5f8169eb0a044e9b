// Per-robot analytics history
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsPoint {
    /// "HH:MM" wall-clock label.
    pub time: String,
    pub battery: f64,
    pub cpu: f64,
    pub temperature: f64,
    /// GB.
    pub memory_used: f64,
    /// ms.
    pub network_latency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JointWear {
    pub joint: String,
    pub cycles: u64,
    /// Percent.
    pub wear: f64,
    pub health: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsTelemetry {
    /// Oldest first.
    pub history: Vec<AnalyticsPoint>,
    pub joint_wear: Vec<JointWear>,
}

/// Per-robot seed: the code of the id's last character, 65 ('A') when empty.
pub fn robot_seed(robot_id: &str) -> u64 {
    robot_id.chars().last().map(|c| c as u64).unwrap_or(65)
}

/// Wear table whose base wear (5-14%) and cycle counts derive from the robot id.
pub fn joint_wear_for(robot_id: &str) -> Vec<JointWear> {
    let seed = robot_seed(robot_id);
    let base = (seed % 10 + 5) as f64;
    let upper = |d: f64| (base - d).max(1.0);

    [
        ("L Hip", 12_000, 50, base + 2.0),
        ("R Hip", 12_000, 52, base + 3.0),
        ("L Knee", 12_000, 48, base + 5.0),
        ("R Knee", 12_000, 54, base + 8.0),
        ("L Ankle", 12_000, 45, base),
        ("R Ankle", 12_000, 47, base + 1.0),
        ("L Shoulder", 8_000, 30, upper(3.0)),
        ("R Shoulder", 8_000, 32, upper(2.0)),
        ("L Elbow", 7_800, 28, upper(4.0)),
        ("R Elbow", 7_800, 31, upper(5.0)),
    ]
    .into_iter()
    .map(|(joint, base_cycles, per_seed, wear)| JointWear {
        joint: joint.to_string(),
        cycles: base_cycles + seed * per_seed,
        wear,
        health: 100.0 - wear,
    })
    .collect()
}
