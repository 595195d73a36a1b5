use std::ops::RangeInclusive;

use recall_core::PresentationMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SEQUENCE_LENGTH_RANGE: RangeInclusive<usize> = 4..=14;
pub const MAX_VALUE_LIMIT: u32 = 9_999;
pub const ALLOWED_TIME_RANGE: RangeInclusive<u32> = 5..=60;
pub const SPEECH_TIMEOUT_RANGE: RangeInclusive<u32> = 1..=120;
/// Extra seconds of speech allowed per spoken item, on top of the base timeout.
pub const SPEECH_SECS_PER_ITEM: u32 = 4;

/// Whether the answer-collection window is timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerWindow {
    /// Closes after the allowed time, same as the presentation countdown.
    #[default]
    Timed,
    /// Stays open until the user reveals.
    Untimed,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("sequence length must be between {min} and {max}, got {value}")]
    SequenceLength { value: i64, min: usize, max: usize },
    #[error("maximum item value must be between 0 and {max}, got {value}")]
    MaxValue { value: i64, max: u32 },
    #[error("allowed time must be between {min} and {max} seconds, got {value}")]
    AllowedTime { value: i64, min: u32, max: u32 },
    #[error("speech timeout must be between {min} and {max} seconds, got {value}")]
    SpeechTimeout { value: i64, min: u32, max: u32 },
}

/// Raw settings as they arrive from a config file or the command line.
/// Nothing here is trusted until [`TrialSettings::validate`] succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrialSettings {
    pub sequence_length: i64,
    pub max_value: i64,
    pub allowed_time_secs: i64,
    pub mode: PresentationMode,
    pub answer_window: AnswerWindow,
    pub speech_timeout_secs: i64,
}

impl Default for TrialSettings {
    fn default() -> Self {
        TrialConfig::default().into()
    }
}

impl TrialSettings {
    pub fn validate(&self) -> Result<TrialConfig, ConfigError> {
        let sequence_length = usize::try_from(self.sequence_length)
            .ok()
            .filter(|len| SEQUENCE_LENGTH_RANGE.contains(len))
            .ok_or(ConfigError::SequenceLength {
                value: self.sequence_length,
                min: *SEQUENCE_LENGTH_RANGE.start(),
                max: *SEQUENCE_LENGTH_RANGE.end(),
            })?;

        let max_value = u32::try_from(self.max_value)
            .ok()
            .filter(|v| *v <= MAX_VALUE_LIMIT)
            .ok_or(ConfigError::MaxValue {
                value: self.max_value,
                max: MAX_VALUE_LIMIT,
            })?;

        let allowed_time_secs = u32::try_from(self.allowed_time_secs)
            .ok()
            .filter(|t| ALLOWED_TIME_RANGE.contains(t))
            .ok_or(ConfigError::AllowedTime {
                value: self.allowed_time_secs,
                min: *ALLOWED_TIME_RANGE.start(),
                max: *ALLOWED_TIME_RANGE.end(),
            })?;

        let speech_timeout_secs = u32::try_from(self.speech_timeout_secs)
            .ok()
            .filter(|t| SPEECH_TIMEOUT_RANGE.contains(t))
            .ok_or(ConfigError::SpeechTimeout {
                value: self.speech_timeout_secs,
                min: *SPEECH_TIMEOUT_RANGE.start(),
                max: *SPEECH_TIMEOUT_RANGE.end(),
            })?;

        Ok(TrialConfig {
            sequence_length,
            max_value,
            allowed_time_secs,
            mode: self.mode,
            answer_window: self.answer_window,
            speech_timeout_secs,
        })
    }
}

/// Validated trial configuration. Every value is within bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialConfig {
    sequence_length: usize,
    max_value: u32,
    allowed_time_secs: u32,
    mode: PresentationMode,
    answer_window: AnswerWindow,
    speech_timeout_secs: u32,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            sequence_length: 6,
            max_value: 99,
            allowed_time_secs: 5,
            mode: PresentationMode::Visual,
            answer_window: AnswerWindow::Timed,
            speech_timeout_secs: 30,
        }
    }
}

impl From<TrialConfig> for TrialSettings {
    fn from(config: TrialConfig) -> Self {
        Self {
            sequence_length: config.sequence_length as i64,
            max_value: i64::from(config.max_value),
            allowed_time_secs: i64::from(config.allowed_time_secs),
            mode: config.mode,
            answer_window: config.answer_window,
            speech_timeout_secs: i64::from(config.speech_timeout_secs),
        }
    }
}

impl TrialConfig {
    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    pub fn max_value(&self) -> u32 {
        self.max_value
    }

    pub fn allowed_time_secs(&self) -> u32 {
        self.allowed_time_secs
    }

    pub fn mode(&self) -> PresentationMode {
        self.mode
    }

    pub fn answer_window(&self) -> AnswerWindow {
        self.answer_window
    }

    pub fn speech_timeout_secs(&self) -> u32 {
        self.speech_timeout_secs
    }

    /// Seconds to wait for a completion signal before speaking `items`
    /// numbers is given up on.
    pub fn speech_budget_secs(&self, items: usize) -> u32 {
        let items = u32::try_from(items).unwrap_or(u32::MAX);
        self.speech_timeout_secs
            .saturating_add(SPEECH_SECS_PER_ITEM.saturating_mul(items))
    }

    // Interactive adjustments clamp into range instead of failing.

    pub fn with_sequence_length(mut self, len: usize) -> Self {
        self.sequence_length =
            len.clamp(*SEQUENCE_LENGTH_RANGE.start(), *SEQUENCE_LENGTH_RANGE.end());
        self
    }

    pub fn with_max_value(mut self, max: u32) -> Self {
        self.max_value = max.min(MAX_VALUE_LIMIT);
        self
    }

    pub fn with_allowed_time(mut self, secs: u32) -> Self {
        self.allowed_time_secs = secs.clamp(*ALLOWED_TIME_RANGE.start(), *ALLOWED_TIME_RANGE.end());
        self
    }

    pub fn with_mode(mut self, mode: PresentationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_answer_window(mut self, window: AnswerWindow) -> Self {
        self.answer_window = window;
        self
    }

    pub fn with_speech_timeout(mut self, secs: u32) -> Self {
        self.speech_timeout_secs =
            secs.clamp(*SPEECH_TIMEOUT_RANGE.start(), *SPEECH_TIMEOUT_RANGE.end());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_validate() {
        let config = TrialSettings::default().validate().unwrap();
        assert_eq!(config, TrialConfig::default());
    }

    #[test]
    fn rejects_degenerate_length() {
        for len in [0, -1, 3, 15] {
            let settings = TrialSettings {
                sequence_length: len,
                ..TrialSettings::default()
            };
            assert!(matches!(
                settings.validate(),
                Err(ConfigError::SequenceLength { value, .. }) if value == len
            ));
        }
    }

    #[test]
    fn rejects_negative_range() {
        let settings = TrialSettings {
            max_value: -1,
            ..TrialSettings::default()
        };
        assert_eq!(
            settings.validate(),
            Err(ConfigError::MaxValue {
                value: -1,
                max: MAX_VALUE_LIMIT
            })
        );
    }

    #[test]
    fn zero_max_value_is_valid() {
        let settings = TrialSettings {
            max_value: 0,
            ..TrialSettings::default()
        };
        assert_eq!(settings.validate().unwrap().max_value(), 0);
    }

    #[test]
    fn rejects_out_of_bounds_times() {
        let settings = TrialSettings {
            allowed_time_secs: 4,
            ..TrialSettings::default()
        };
        assert!(matches!(settings.validate(), Err(ConfigError::AllowedTime { .. })));

        let settings = TrialSettings {
            speech_timeout_secs: 0,
            ..TrialSettings::default()
        };
        assert!(matches!(settings.validate(), Err(ConfigError::SpeechTimeout { .. })));
    }

    #[test]
    fn adjustments_clamp_into_bounds() {
        let config = TrialConfig::default()
            .with_sequence_length(100)
            .with_max_value(u32::MAX)
            .with_allowed_time(1);
        assert_eq!(config.sequence_length(), 14);
        assert_eq!(config.max_value(), MAX_VALUE_LIMIT);
        assert_eq!(config.allowed_time_secs(), 5);
    }

    #[test]
    fn speech_budget_grows_with_sequence_length() {
        let config = TrialConfig::default();
        assert_eq!(config.speech_budget_secs(0), 30);
        assert_eq!(config.speech_budget_secs(6), 30 + 6 * SPEECH_SECS_PER_ITEM);
        assert!(config.speech_budget_secs(14) > config.speech_budget_secs(4));
        assert_eq!(config.with_speech_timeout(5).speech_budget_secs(1), 5 + SPEECH_SECS_PER_ITEM);
    }

    #[test]
    fn parses_partial_toml_over_defaults() {
        let settings: TrialSettings = toml::from_str(
            r#"
            sequence_length = 4
            mode = "spoken"
            answer_window = "untimed"
            "#,
        )
        .unwrap();
        let config = settings.validate().unwrap();
        assert_eq!(config.sequence_length(), 4);
        assert_eq!(config.mode(), PresentationMode::Spoken);
        assert_eq!(config.answer_window(), AnswerWindow::Untimed);
        assert_eq!(config.allowed_time_secs(), 5);
    }

    #[test]
    fn unknown_toml_keys_are_rejected() {
        let parsed: Result<TrialSettings, _> = toml::from_str("length = 4");
        assert!(parsed.is_err());
    }
}
