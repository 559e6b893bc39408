use std::time::Duration;

use anyhow::{ensure, Context};
use config::{Config, Environment, File};
use motion::{ControlCurve, MotionPipeline};
use player_control::ControlEndpoint;
use sensor_link::SensorTarget;
use serde::Deserialize;
use shared::domain::VOLUME_FLOOR;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub playlist: String,
    pub output_values: OutputValues,
    pub control_parameters: ControlParameters,
    pub sensor: SensorSettings,
    pub player: PlayerSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputValues {
    pub max_volume: u16,
    pub min_tempo: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControlParameters {
    pub sensitivity: f64,
    pub smoothing_factor: f64,
    pub noise_floor: f64,
    /// Reserved. Read for compatibility; smoothing uses `smoothing_factor` only.
    pub decay_rate: f64,
    pub normalisation_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SensorSettings {
    pub device_id: String,
    pub data_channel: String,
    pub relay_addr: String,
    pub reconnect_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    pub binary: String,
    pub host: String,
    pub port: u16,
    pub connect_timeout_ms: u64,
    pub ready_poll_ms: u64,
    pub ready_timeout_ms: u64,
    pub stop_grace_ms: u64,
    pub require_ready: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            playlist: "your_music.mp3".into(),
            output_values: OutputValues::default(),
            control_parameters: ControlParameters::default(),
            sensor: SensorSettings::default(),
            player: PlayerSettings::default(),
        }
    }
}

impl Default for OutputValues {
    fn default() -> Self {
        Self {
            max_volume: 220,
            min_tempo: 0.6,
        }
    }
}

impl Default for ControlParameters {
    fn default() -> Self {
        Self {
            sensitivity: 1.0,
            smoothing_factor: 0.1,
            noise_floor: 0.5,
            decay_rate: 0.2,
            normalisation_factor: 100.0,
        }
    }
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            device_id: "04:be:a4:cf:03:17".into(),
            data_channel: "00002a56-0000-1000-8000-00805f9b34fb".into(),
            relay_addr: "127.0.0.1:4213".into(),
            reconnect_delay_ms: 5_000,
        }
    }
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            binary: "vlc".into(),
            host: "127.0.0.1".into(),
            port: 4212,
            connect_timeout_ms: 1_000,
            ready_poll_ms: 500,
            ready_timeout_ms: 10_000,
            stop_grace_ms: 5_000,
            require_ready: false,
        }
    }
}

/// Layers an optional file (`<base>.yaml`, `<base>.toml`, ...) under
/// `APP__SECTION__KEY` environment overrides, then validates the result.
pub fn load_settings(base: &str) -> anyhow::Result<Settings> {
    let settings: Settings = Config::builder()
        .add_source(File::with_name(base).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("failed to read configuration '{base}'"))?
        .try_deserialize()
        .with_context(|| format!("invalid configuration in '{base}'"))?;

    settings.validate()?;
    Ok(settings)
}

impl Settings {
    pub fn validate(&self) -> anyhow::Result<()> {
        let out = &self.output_values;
        let params = &self.control_parameters;

        ensure!(
            out.max_volume >= VOLUME_FLOOR,
            "output_values.max_volume must be at least {VOLUME_FLOOR}, got {}",
            out.max_volume
        );
        ensure!(
            out.min_tempo > 0.0 && out.min_tempo <= 1.0,
            "output_values.min_tempo must be in (0, 1], got {}",
            out.min_tempo
        );
        ensure!(
            params.smoothing_factor > 0.0 && params.smoothing_factor <= 1.0,
            "control_parameters.smoothing_factor must be in (0, 1], got {}",
            params.smoothing_factor
        );
        ensure!(
            params.normalisation_factor > 0.0 && params.normalisation_factor.is_finite(),
            "control_parameters.normalisation_factor must be positive, got {}",
            params.normalisation_factor
        );
        ensure!(
            params.noise_floor >= 0.0 && params.noise_floor.is_finite(),
            "control_parameters.noise_floor must be non-negative, got {}",
            params.noise_floor
        );
        ensure!(
            params.sensitivity.is_finite(),
            "control_parameters.sensitivity must be finite, got {}",
            params.sensitivity
        );
        ensure!(
            self.player.connect_timeout_ms > 0,
            "player.connect_timeout_ms must be positive"
        );
        ensure!(
            self.player.ready_poll_ms > 0,
            "player.ready_poll_ms must be positive"
        );
        ensure!(
            self.sensor.reconnect_delay_ms > 0,
            "sensor.reconnect_delay_ms must be positive"
        );
        Ok(())
    }

    pub fn control_curve(&self) -> ControlCurve {
        ControlCurve {
            sensitivity: self.control_parameters.sensitivity,
            smoothing_factor: self.control_parameters.smoothing_factor,
            normalisation_factor: self.control_parameters.normalisation_factor,
            max_volume: self.output_values.max_volume,
            min_tempo: self.output_values.min_tempo,
        }
    }

    pub fn motion_pipeline(&self) -> MotionPipeline {
        MotionPipeline::new(self.control_parameters.noise_floor, self.control_curve())
    }

    pub fn sensor_target(&self) -> SensorTarget {
        SensorTarget {
            device_id: self.sensor.device_id.clone(),
            data_channel: self.sensor.data_channel.clone(),
        }
    }

    pub fn control_endpoint(&self) -> ControlEndpoint {
        ControlEndpoint::new(self.player.host.clone(), self.player.port)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.sensor.reconnect_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.player.connect_timeout_ms)
    }

    pub fn ready_poll_interval(&self) -> Duration {
        Duration::from_millis(self.player.ready_poll_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.player.ready_timeout_ms)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.player.stop_grace_ms)
    }
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
