//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;

/// Number the answer countdown starts from. Ticks 3, 2, 1.
pub const COUNTDOWN_START: u8 = 3;

/// Timing and behaviour knobs for the interview controller.
#[derive(Debug, Clone, PartialEq)]
pub struct InterviewConfig {
    /// Cadence of the pre-recording countdown.
    pub countdown_tick: Duration,
    /// How often metrics are sampled while listening.
    pub sample_interval: Duration,
    /// Interval between attention checks (video mode only).
    pub attention_interval: Duration,
    /// How long a raised attention warning stays visible.
    pub attention_warning_duration: Duration,
    /// Chance in [0, 1] that an attention check raises the warning.
    pub attention_probability: f64,
    /// Delay before a question is presented (and spoken).
    pub speak_delay: Duration,
    /// Whether questions are spoken aloud at session start.
    pub audio_enabled: bool,
    /// Fixed RNG seed for reproducible scoring.
    pub seed: Option<u64>,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            countdown_tick: Duration::from_secs(1),
            sample_interval: Duration::from_secs(1),
            attention_interval: Duration::from_secs(10),
            attention_warning_duration: Duration::from_secs(3),
            attention_probability: 0.3,
            speak_delay: Duration::from_secs(1),
            audio_enabled: true,
            seed: None,
        }
    }
}

impl InterviewConfig {
    /// Build config from `INTERVIEW_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Missing keys keep their
    /// defaults; present but malformed values are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let millis = |key: &str, default: Duration| -> Result<Duration, ConfigError> {
            match lookup(key) {
                None => Ok(default),
                Some(raw) => {
                    let ms: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                        key: key.to_string(),
                        message: format!("expected milliseconds, got {raw:?}"),
                    })?;
                    if ms == 0 {
                        return Err(ConfigError::InvalidValue {
                            key: key.to_string(),
                            message: "must be greater than zero".to_string(),
                        });
                    }
                    Ok(Duration::from_millis(ms))
                }
            }
        };

        let countdown_tick = millis("INTERVIEW_COUNTDOWN_TICK_MS", defaults.countdown_tick)?;
        let sample_interval = millis("INTERVIEW_SAMPLE_INTERVAL_MS", defaults.sample_interval)?;
        let attention_interval =
            millis("INTERVIEW_ATTENTION_INTERVAL_MS", defaults.attention_interval)?;
        let attention_warning_duration = millis(
            "INTERVIEW_ATTENTION_WARNING_MS",
            defaults.attention_warning_duration,
        )?;
        let speak_delay = millis("INTERVIEW_SPEAK_DELAY_MS", defaults.speak_delay)?;

        let attention_probability = match lookup("INTERVIEW_ATTENTION_PROBABILITY") {
            None => defaults.attention_probability,
            Some(raw) => {
                let p: f64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: "INTERVIEW_ATTENTION_PROBABILITY".to_string(),
                        message: format!("expected a number, got {raw:?}"),
                    })?;
                if !(0.0..=1.0).contains(&p) {
                    return Err(ConfigError::InvalidValue {
                        key: "INTERVIEW_ATTENTION_PROBABILITY".to_string(),
                        message: "must be between 0 and 1".to_string(),
                    });
                }
                p
            }
        };

        let audio_enabled = match lookup("INTERVIEW_AUDIO_ENABLED") {
            None => defaults.audio_enabled,
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "INTERVIEW_AUDIO_ENABLED".to_string(),
                        message: format!("expected a boolean, got {raw:?}"),
                    });
                }
            },
        };

        let seed = match lookup("INTERVIEW_SEED") {
            None => None,
            Some(raw) => Some(raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "INTERVIEW_SEED".to_string(),
                message: format!("expected an unsigned integer, got {raw:?}"),
            })?),
        };

        Ok(Self {
            countdown_tick,
            sample_interval,
            attention_interval,
            attention_warning_duration,
            attention_probability,
            speak_delay,
            audio_enabled,
            seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_lookup_yields_defaults() {
        let config = InterviewConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, InterviewConfig::default());
        assert_eq!(config.countdown_tick, Duration::from_secs(1));
        assert_eq!(config.attention_interval, Duration::from_secs(10));
        assert!(config.audio_enabled);
        assert!(config.seed.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = InterviewConfig::from_lookup(lookup(&[
            ("INTERVIEW_COUNTDOWN_TICK_MS", "250"),
            ("INTERVIEW_SPEAK_DELAY_MS", " 10 "),
            ("INTERVIEW_ATTENTION_PROBABILITY", "0.5"),
            ("INTERVIEW_AUDIO_ENABLED", "off"),
            ("INTERVIEW_SEED", "42"),
        ]))
        .unwrap();

        assert_eq!(config.countdown_tick, Duration::from_millis(250));
        assert_eq!(config.speak_delay, Duration::from_millis(10));
        assert_eq!(config.attention_probability, 0.5);
        assert!(!config.audio_enabled);
        assert_eq!(config.seed, Some(42));
        // Untouched keys keep defaults
        assert_eq!(config.sample_interval, Duration::from_secs(1));
    }

    #[test]
    fn rejects_zero_interval() {
        let err = InterviewConfig::from_lookup(lookup(&[("INTERVIEW_SAMPLE_INTERVAL_MS", "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("INTERVIEW_SAMPLE_INTERVAL_MS"));
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(
            InterviewConfig::from_lookup(lookup(&[("INTERVIEW_COUNTDOWN_TICK_MS", "soon")]))
                .is_err()
        );
        assert!(
            InterviewConfig::from_lookup(lookup(&[("INTERVIEW_ATTENTION_PROBABILITY", "1.5")]))
                .is_err()
        );
        assert!(InterviewConfig::from_lookup(lookup(&[("INTERVIEW_AUDIO_ENABLED", "maybe")])).is_err());
        assert!(InterviewConfig::from_lookup(lookup(&[("INTERVIEW_SEED", "-1")])).is_err());
    }
}
