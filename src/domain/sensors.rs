// Perception and environment sensor models
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    Active,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImuReading {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
}

impl Default for ImuReading {
    fn default() -> Self {
        Self {
            roll: 2.5,
            pitch: -1.2,
            yaw: 45.3,
            accel_x: 0.05,
            accel_y: -0.02,
            accel_z: 9.81,
            gyro_x: 0.01,
            gyro_y: -0.03,
            gyro_z: 0.02,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraStatus {
    pub name: String,
    pub kind: String,
    pub status: SensorStatus,
    pub fps: u32,
    pub resolution: String,
}

pub fn camera_rig() -> Vec<CameraStatus> {
    [
        ("Front RGB", "RGB", 30, "1920x1080"),
        ("Front Depth", "Depth", 30, "640x480"),
        ("Rear RGB", "RGB", 30, "1920x1080"),
        ("Thermal", "Thermal", 15, "320x240"),
        ("Left Stereo", "Stereo", 60, "1280x720"),
        ("Right Stereo", "Stereo", 60, "1280x720"),
    ]
    .into_iter()
    .map(|(name, kind, fps, resolution)| CameraStatus {
        name: name.to_string(),
        kind: kind.to_string(),
        status: SensorStatus::Active,
        fps,
        resolution: resolution.to_string(),
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LidarReading {
    pub status: SensorStatus,
    pub scan_rate_hz: f64,
    pub detected_obstacles: f64,
    /// Metres, never below 0.1.
    pub min_distance: f64,
    pub max_range: f64,
    pub points_per_scan: u32,
}

impl Default for LidarReading {
    fn default() -> Self {
        Self {
            status: SensorStatus::Active,
            scan_rate_hz: 20.0,
            detected_obstacles: 3.0,
            min_distance: 0.85,
            max_range: 25.0,
            points_per_scan: 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AirQuality {
    Good,
    Moderate,
    Unhealthy,
    Poor,
}

impl AirQuality {
    pub fn from_aqi(aqi: f64) -> Self {
        if aqi < 50.0 {
            AirQuality::Good
        } else if aqi < 100.0 {
            AirQuality::Moderate
        } else if aqi < 150.0 {
            AirQuality::Unhealthy
        } else {
            AirQuality::Poor
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentReading {
    pub ambient_temp: f64,
    pub humidity: f64,
    /// hPa.
    pub pressure: f64,
    /// AQI.
    pub air_quality: f64,
    /// Lux.
    pub light_level: f64,
    /// dB.
    pub sound_level: f64,
}

impl EnvironmentReading {
    pub fn air_quality_band(&self) -> AirQuality {
        AirQuality::from_aqi(self.air_quality)
    }
}

impl Default for EnvironmentReading {
    fn default() -> Self {
        Self {
            ambient_temp: 22.5,
            humidity: 45.0,
            pressure: 1013.25,
            air_quality: 35.0,
            light_level: 320.0,
            sound_level: 42.0,
        }
    }
}
