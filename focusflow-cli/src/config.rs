use std::path::{Path, PathBuf};

use focusflow_engine::{CpalHost, EngineSettings, ToneParameters, Wave};
use serde::Deserialize;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    audio: AudioConfig,
    #[serde(default)]
    tones: TonesConfig,
    #[serde(default)]
    timer: TimerConfig,
    #[serde(default)]
    storage: StorageConfig,
}

#[derive(Deserialize, Default)]
struct AudioConfig {
    device: Option<String>,
    sample_rate: Option<u32>,
    channels: Option<u16>,
    waveform: Option<String>,
    gain_smoothing_ms: Option<f32>,
}

#[derive(Deserialize, Default)]
struct TonesConfig {
    base_frequency_hz: Option<f32>,
    beat_frequency_hz: Option<f32>,
    volume_percent: Option<f32>,
}

#[derive(Deserialize, Default)]
struct TimerConfig {
    minutes: Option<u32>,
}

#[derive(Deserialize, Default)]
struct StorageConfig {
    dir: Option<PathBuf>,
}

pub struct Config {
    audio: AudioConfig,
    tones: TonesConfig,
    timer: TimerConfig,
    storage: StorageConfig,
}

impl Config {
    /// Embedded defaults merged with the user file: `path` when given,
    /// otherwise `<config dir>/focusflow/config.toml` if it exists.
    pub fn load(path: Option<&Path>) -> Self {
        let user_path = path.map(Path::to_path_buf).or_else(user_config_path);
        let user = user_path.filter(|p| p.exists()).and_then(|p| match std::fs::read_to_string(&p) {
            Ok(contents) => Some((p, contents)),
            Err(e) => {
                log::warn!(target: "config", "could not read config {}: {}", p.display(), e);
                None
            }
        });
        match user {
            Some((p, contents)) => Self::from_user_str(&contents, &p),
            None => Self::from_user_str("", Path::new("")),
        }
    }

    fn from_user_str(contents: &str, origin: &Path) -> Self {
        let mut base: ConfigFile = match toml::from_str(DEFAULT_CONFIG) {
            Ok(c) => c,
            Err(e) => {
                log::error!(target: "config", "embedded config.toml is invalid: {e}");
                ConfigFile::default()
            }
        };

        if !contents.trim().is_empty() {
            match toml::from_str::<ConfigFile>(contents) {
                Ok(user) => {
                    merge_audio(&mut base.audio, user.audio);
                    merge_tones(&mut base.tones, user.tones);
                    if user.timer.minutes.is_some() {
                        base.timer.minutes = user.timer.minutes;
                    }
                    if user.storage.dir.is_some() {
                        base.storage.dir = user.storage.dir;
                    }
                }
                Err(e) => {
                    log::warn!(target: "config", "ignoring malformed config {}: {}", origin.display(), e)
                }
            }
        }

        Config { audio: base.audio, tones: base.tones, timer: base.timer, storage: base.storage }
    }

    pub fn host(&self) -> CpalHost {
        CpalHost {
            device_name: self.audio.device.clone(),
            sample_rate: self.audio.sample_rate,
            channels: self.audio.channels,
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        let fallback = EngineSettings::default();
        EngineSettings {
            wave: self.audio.waveform.as_deref().and_then(parse_wave).unwrap_or(fallback.wave),
            gain_smoothing_ms: self
                .audio
                .gain_smoothing_ms
                .filter(|ms| ms.is_finite())
                .map_or(fallback.gain_smoothing_ms, |ms| ms.clamp(0.0, 1_000.0)),
        }
    }

    /// Starting tone parameters, clamped into their ranges.
    pub fn tone_parameters(&self) -> ToneParameters {
        let fallback = ToneParameters::default();
        ToneParameters {
            base_frequency_hz: self.tones.base_frequency_hz.unwrap_or(fallback.base_frequency_hz),
            beat_frequency_hz: self.tones.beat_frequency_hz.unwrap_or(fallback.beat_frequency_hz),
            volume_percent: self.tones.volume_percent.unwrap_or(fallback.volume_percent),
        }
        .clamped()
    }

    /// Focus timer length in minutes (clamped to 1..=240).
    pub fn timer_minutes(&self) -> u32 {
        self.timer.minutes.unwrap_or(25).clamp(1, 240)
    }

    pub fn storage_dir(&self) -> Option<PathBuf> {
        self.storage.dir.clone().or_else(focusflow_desk::FileStore::default_dir)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("focusflow").join("config.toml"))
}

fn merge_audio(base: &mut AudioConfig, user: AudioConfig) {
    if user.device.is_some() {
        base.device = user.device;
    }
    if user.sample_rate.is_some() {
        base.sample_rate = user.sample_rate;
    }
    if user.channels.is_some() {
        base.channels = user.channels;
    }
    if user.waveform.is_some() {
        base.waveform = user.waveform;
    }
    if user.gain_smoothing_ms.is_some() {
        base.gain_smoothing_ms = user.gain_smoothing_ms;
    }
}

fn merge_tones(base: &mut TonesConfig, user: TonesConfig) {
    if user.base_frequency_hz.is_some() {
        base.base_frequency_hz = user.base_frequency_hz;
    }
    if user.beat_frequency_hz.is_some() {
        base.beat_frequency_hz = user.beat_frequency_hz;
    }
    if user.volume_percent.is_some() {
        base.volume_percent = user.volume_percent;
    }
}

fn parse_wave(s: &str) -> Option<Wave> {
    match s.to_ascii_lowercase().as_str() {
        "sine" | "sin" => Some(Wave::Sine),
        "tri" | "triangle" => Some(Wave::Tri),
        "saw" | "sawtooth" => Some(Wave::Saw),
        other => {
            log::warn!(target: "config", "unknown waveform {other:?}, using sine");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn embedded_defaults_match_engine_defaults() {
        let c = Config::from_user_str("", Path::new(""));
        assert_eq!(c.tone_parameters(), ToneParameters::default());
        assert_eq!(c.engine_settings(), EngineSettings::default());
        assert_eq!(c.timer_minutes(), 25);
        assert_eq!(c.host().channels, Some(2));
        assert_eq!(c.host().device_name, None);
    }

    #[test]
    fn user_values_override_and_clamp() {
        let c = Config::from_user_str(
            "[tones]\nbase_frequency_hz = 900.0\nvolume_percent = 80.0\n[audio]\nwaveform = \"tri\"\n",
            Path::new("test.toml"),
        );
        let p = c.tone_parameters();
        assert_eq!(p.base_frequency_hz, 800.0);
        assert_eq!(p.beat_frequency_hz, 35.0);
        assert_eq!(p.volume_percent, 80.0);
        assert_eq!(c.engine_settings().wave, Wave::Tri);
    }

    #[test]
    fn malformed_user_file_is_ignored() {
        let c = Config::from_user_str("[tones\nbase = ", Path::new("bad.toml"));
        assert_eq!(c.tone_parameters(), ToneParameters::default());
    }

    #[test]
    fn explicit_path_is_loaded() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[timer]\nminutes = 50\n[storage]\ndir = \"/tmp/ff\"").unwrap();
        let c = Config::load(Some(f.path()));
        assert_eq!(c.timer_minutes(), 50);
        assert_eq!(c.storage_dir(), Some(PathBuf::from("/tmp/ff")));
    }
}
