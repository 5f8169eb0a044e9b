// Joint telemetry model for a 32-DOF humanoid
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JointStatus {
    Ok,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Joint {
    pub name: String,
    /// Degrees.
    pub angle: f64,
    pub target_angle: f64,
    /// Percent of rated torque.
    pub torque: f64,
    pub temperature: f64,
    pub status: JointStatus,
}

impl Joint {
    fn new(name: &str, angle: f64, target_angle: f64, torque: f64, temperature: f64, status: JointStatus) -> Self {
        Self {
            name: name.to_string(),
            angle,
            target_angle,
            torque,
            temperature,
            status,
        }
    }

    pub fn angle_error(&self) -> f64 {
        (self.angle - self.target_angle).abs()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JointGroup {
    pub name: String,
    pub joints: Vec<Joint>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JointSummary {
    pub ok: usize,
    pub warning: usize,
    pub error: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JointTelemetry {
    pub groups: Vec<JointGroup>,
}

impl JointTelemetry {
    pub fn summary(&self) -> JointSummary {
        self.joints().fold(JointSummary::default(), |mut acc, joint| {
            match joint.status {
                JointStatus::Ok => acc.ok += 1,
                JointStatus::Warning => acc.warning += 1,
                JointStatus::Error => acc.error += 1,
            }
            acc
        })
    }

    pub fn joints(&self) -> impl Iterator<Item = &Joint> {
        self.groups.iter().flat_map(|g| g.joints.iter())
    }

    pub fn joints_mut(&mut self) -> impl Iterator<Item = &mut Joint> {
        self.groups.iter_mut().flat_map(|g| g.joints.iter_mut())
    }

    /// Factory pose with the two joints that ship slightly out of tolerance.
    pub fn humanoid() -> Self {
        use JointStatus::{Ok, Warning};

        let group = |name: &str, joints: Vec<Joint>| JointGroup {
            name: name.to_string(),
            joints,
        };

        Self {
            groups: vec![
                group(
                    "Neck Joint (3 DOF)",
                    vec![
                        Joint::new("Neck Pitch", 5.0, 5.0, 12.0, 38.0, Ok),
                        Joint::new("Neck Yaw", -2.0, 0.0, 8.0, 37.0, Ok),
                        Joint::new("Neck Roll", 1.0, 0.0, 7.0, 36.0, Ok),
                    ],
                ),
                group(
                    "Shoulder Joints (6 DOF)",
                    vec![
                        Joint::new("L Shoulder Pitch", 45.0, 45.0, 35.0, 42.0, Ok),
                        Joint::new("L Shoulder Roll", 15.0, 15.0, 28.0, 41.0, Ok),
                        Joint::new("L Shoulder Yaw", 0.0, 0.0, 18.0, 39.0, Ok),
                        Joint::new("R Shoulder Pitch", 42.0, 45.0, 38.0, 43.0, Warning),
                        Joint::new("R Shoulder Roll", -15.0, -15.0, 30.0, 42.0, Ok),
                        Joint::new("R Shoulder Yaw", 0.0, 0.0, 20.0, 40.0, Ok),
                    ],
                ),
                group(
                    "Elbow Joints (6 DOF)",
                    vec![
                        Joint::new("L Elbow Pitch", 90.0, 90.0, 22.0, 40.0, Ok),
                        Joint::new("L Elbow Roll", 5.0, 5.0, 18.0, 39.0, Ok),
                        Joint::new("L Elbow Yaw", 0.0, 0.0, 15.0, 38.0, Ok),
                        Joint::new("R Elbow Pitch", 88.0, 90.0, 24.0, 41.0, Ok),
                        Joint::new("R Elbow Roll", -5.0, -5.0, 19.0, 40.0, Ok),
                        Joint::new("R Elbow Yaw", 0.0, 0.0, 16.0, 39.0, Ok),
                    ],
                ),
                group(
                    "Wrist Joints (4 DOF)",
                    vec![
                        Joint::new("L Wrist Pitch", 10.0, 10.0, 8.0, 36.0, Ok),
                        Joint::new("L Wrist Roll", 0.0, 0.0, 5.0, 35.0, Ok),
                        Joint::new("R Wrist Pitch", 12.0, 10.0, 9.0, 37.0, Ok),
                        Joint::new("R Wrist Roll", 0.0, 0.0, 6.0, 36.0, Ok),
                    ],
                ),
                group(
                    "Grippers (2 DOF)",
                    vec![
                        Joint::new("L Gripper", 30.0, 30.0, 45.0, 34.0, Ok),
                        Joint::new("R Gripper", 28.0, 30.0, 42.0, 35.0, Ok),
                    ],
                ),
                group(
                    "Hip Joint (3 DOF)",
                    vec![
                        Joint::new("Hip Pitch", -5.0, -5.0, 75.0, 46.0, Ok),
                        Joint::new("Hip Roll", 0.0, 0.0, 68.0, 45.0, Ok),
                        Joint::new("Hip Yaw", 2.0, 0.0, 62.0, 44.0, Ok),
                    ],
                ),
                group(
                    "Knee High Joints (2 DOF)",
                    vec![
                        Joint::new("L Knee High", 35.0, 35.0, 82.0, 49.0, Ok),
                        Joint::new("R Knee High", 36.0, 35.0, 85.0, 50.0, Ok),
                    ],
                ),
                group(
                    "Knee Low Joints (2 DOF)",
                    vec![
                        Joint::new("L Knee Low", 45.0, 45.0, 88.0, 51.0, Ok),
                        Joint::new("R Knee Low", 47.0, 45.0, 92.0, 52.0, Warning),
                    ],
                ),
                group(
                    "Ankle Joints (4 DOF)",
                    vec![
                        Joint::new("L Ankle Pitch", 10.0, 10.0, 72.0, 49.0, Ok),
                        Joint::new("L Ankle Roll", -2.0, 0.0, 58.0, 47.0, Ok),
                        Joint::new("R Ankle Pitch", 10.0, 10.0, 75.0, 50.0, Ok),
                        Joint::new("R Ankle Roll", 2.0, 0.0, 60.0, 48.0, Ok),
                    ],
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanoid_layout() {
        let joints = JointTelemetry::humanoid();
        assert_eq!(joints.groups.len(), 9);
        assert_eq!(joints.joints().count(), 32);
        assert_eq!(
            joints.summary(),
            JointSummary {
                ok: 30,
                warning: 2,
                error: 0
            }
        );
    }

    #[test]
    fn test_angle_error_is_absolute() {
        let joint = Joint::new("Hip Yaw", -3.0, 2.0, 0.0, 40.0, JointStatus::Ok);
        assert_eq!(joint.angle_error(), 5.0);
    }
}
