use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use recall_core::PresentationMode;
use recall_trial::{AnswerWindow, TrialConfig, TrialSettings};
use serde::Deserialize;

/// Short-term memory trainer: memorize a number sequence, then recall it.
#[derive(Parser, Debug, Default)]
#[command(name = "recall", version)]
pub struct Cli {
    /// TOML file with [trial], [speech] and [display] tables
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Number of items per sequence (4-14)
    #[arg(long)]
    pub length: Option<i64>,
    /// Largest value an item may take (0-9999)
    #[arg(long)]
    pub max_value: Option<i64>,
    /// Seconds to memorize, and to answer (5-60)
    #[arg(long)]
    pub time: Option<i64>,
    /// visual or spoken
    #[arg(long)]
    pub mode: Option<PresentationMode>,
    /// Keep the answer window open until R is pressed
    #[arg(long)]
    pub untimed_answers: bool,
    #[arg(long)]
    pub speech_program: Option<String>,
    #[arg(long)]
    pub voice: Option<String>,
    /// Speaking rate in words per minute
    #[arg(long)]
    pub rate: Option<u32>,
    #[arg(long)]
    pub pitch: Option<u32>,
    #[arg(long)]
    pub volume: Option<u32>,
    /// TrueType font used for all text
    #[arg(long)]
    pub font: Option<PathBuf>,
    /// Run in a window instead of borderless fullscreen
    #[arg(long)]
    pub windowed: bool,
}

/// `[speech]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpeechSettings {
    pub program: Option<String>,
    pub voice: Option<String>,
    pub rate: Option<u32>,
    pub pitch: Option<u32>,
    pub volume: Option<u32>,
}

/// `[display]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplaySettings {
    pub font: Option<PathBuf>,
    pub windowed: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    trial: TrialSettings,
    speech: SpeechSettings,
    display: DisplaySettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub trial: TrialConfig,
    pub speech: SpeechSettings,
    pub display: DisplaySettings,
}

impl AppConfig {
    pub fn load(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => read_file(path)?,
            None => FileConfig::default(),
        };
        Self::merge(file, cli)
    }

    fn merge(file: FileConfig, cli: &Cli) -> Result<Self> {
        let FileConfig {
            mut trial,
            mut speech,
            mut display,
        } = file;

        if let Some(length) = cli.length {
            trial.sequence_length = length;
        }
        if let Some(max) = cli.max_value {
            trial.max_value = max;
        }
        if let Some(secs) = cli.time {
            trial.allowed_time_secs = secs;
        }
        if let Some(mode) = cli.mode {
            trial.mode = mode;
        }
        if cli.untimed_answers {
            trial.answer_window = AnswerWindow::Untimed;
        }

        speech.program = cli.speech_program.clone().or(speech.program);
        speech.voice = cli.voice.clone().or(speech.voice);
        speech.rate = cli.rate.or(speech.rate);
        speech.pitch = cli.pitch.or(speech.pitch);
        speech.volume = cli.volume.or(speech.volume);

        display.font = cli.font.clone().or(display.font);
        display.windowed |= cli.windowed;

        let trial = trial.validate().context("invalid trial settings")?;
        Ok(Self {
            trial,
            speech,
            display,
        })
    }
}

fn read_file(path: &Path) -> Result<FileConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    parse(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn parse(text: &str) -> Result<FileConfig> {
    Ok(toml::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("recall").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_without_file_or_flags() {
        let config = AppConfig::load(&Cli::default()).unwrap();
        assert_eq!(config.trial, TrialConfig::default());
        assert_eq!(config.speech, SpeechSettings::default());
        assert!(!config.display.windowed);
    }

    #[test]
    fn flags_override_file_values() {
        let file = parse(
            r#"
            [trial]
            sequence_length = 8
            max_value = 9
            mode = "spoken"

            [speech]
            voice = "en"
            rate = 150

            [display]
            windowed = true
            "#,
        )
        .unwrap();
        let config = AppConfig::merge(file, &cli(&["--length", "10", "--rate", "120"])).unwrap();
        assert_eq!(config.trial.sequence_length(), 10);
        assert_eq!(config.trial.max_value(), 9);
        assert_eq!(config.trial.mode(), PresentationMode::Spoken);
        assert_eq!(config.speech.voice.as_deref(), Some("en"));
        assert_eq!(config.speech.rate, Some(120));
        assert!(config.display.windowed);
    }

    #[test]
    fn mode_and_answer_window_flags() {
        let config =
            AppConfig::merge(FileConfig::default(), &cli(&["--mode", "spoken", "--untimed-answers"]))
                .unwrap();
        assert_eq!(config.trial.mode(), PresentationMode::Spoken);
        assert_eq!(config.trial.answer_window(), AnswerWindow::Untimed);
    }

    #[test]
    fn unknown_mode_is_rejected_by_the_parser() {
        let parsed = Cli::try_parse_from(["recall", "--mode", "telepathic"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        let err = AppConfig::merge(FileConfig::default(), &cli(&["--length", "3"])).unwrap_err();
        assert!(format!("{err:#}").contains("sequence length"));

        let err = AppConfig::merge(FileConfig::default(), &cli(&["--time", "61"])).unwrap_err();
        assert!(format!("{err:#}").contains("allowed time"));
    }

    #[test]
    fn unknown_tables_are_rejected() {
        assert!(parse("[audio]\nvoice = \"en\"").is_err());
        assert!(parse("[display]\ncolour = \"red\"").is_err());
    }

    #[test]
    fn missing_config_file_names_the_path() {
        let err = AppConfig::load(&cli(&["--config", "/no/such/recall.toml"])).unwrap_err();
        assert!(format!("{err:#}").contains("/no/such/recall.toml"));
    }
}
