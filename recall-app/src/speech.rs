use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use recall_core::Generation;
use recall_trial::{SilentSpeech, SpeechCompletion, SpeechEngine, SpeechError, Utterance};
use tracing::{debug, info, warn};

use crate::config::SpeechSettings;

/// Programs tried in order when none is configured.
pub const SPEECH_PROGRAMS: &[&str] = &["espeak-ng", "espeak", "say"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    Espeak,
    Say,
}

impl Flavor {
    fn of(program: &str) -> Self {
        let name = Path::new(program)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(program);
        if name == "say" { Self::Say } else { Self::Espeak }
    }
}

/// Speaks by running a text-to-speech program, one child process per
/// utterance. The child is polled with `try_wait`, never waited on.
#[derive(Debug)]
pub struct CommandSpeech {
    program: String,
    flavor: Flavor,
    settings: SpeechSettings,
    child: Option<(Generation, Child)>,
}

impl CommandSpeech {
    pub fn new(program: impl Into<String>, settings: SpeechSettings) -> Self {
        let program = program.into();
        Self {
            flavor: Flavor::of(&program),
            program,
            settings,
            child: None,
        }
    }

    /// Uses the configured program, or the first known one on `PATH`.
    pub fn detect(settings: &SpeechSettings) -> Option<Self> {
        let program = match &settings.program {
            Some(program) => program.clone(),
            None => find_program(SPEECH_PROGRAMS)?.display().to_string(),
        };
        Some(Self::new(program, settings.clone()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn arguments(&self, text: &str) -> Vec<String> {
        let s = &self.settings;
        let mut args = Vec::new();
        if let Some(voice) = &s.voice {
            args.extend(["-v".to_string(), voice.clone()]);
        }
        match self.flavor {
            Flavor::Espeak => {
                if let Some(rate) = s.rate {
                    args.extend(["-s".to_string(), rate.to_string()]);
                }
                if let Some(pitch) = s.pitch {
                    args.extend(["-p".to_string(), pitch.min(99).to_string()]);
                }
                if let Some(volume) = s.volume {
                    args.extend(["-a".to_string(), volume.min(200).to_string()]);
                }
            }
            Flavor::Say => {
                if let Some(rate) = s.rate {
                    args.extend(["-r".to_string(), rate.to_string()]);
                }
            }
        }
        args.push(text.to_string());
        args
    }
}

impl SpeechEngine for CommandSpeech {
    fn speak(&mut self, utterance: Utterance) -> Result<(), SpeechError> {
        self.cancel();
        let child = Command::new(&self.program)
            .args(self.arguments(&utterance.text))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SpeechError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        debug!(program = %self.program, generation = %utterance.generation, pid = child.id(), "speech started");
        self.child = Some((utterance.generation, child));
        Ok(())
    }

    fn poll(&mut self) -> Option<SpeechCompletion> {
        let (generation, child) = self.child.as_mut()?;
        let generation = *generation;
        let completion = match child.try_wait() {
            Ok(None) => return None,
            Ok(Some(status)) if status.success() => SpeechCompletion::finished(generation),
            Ok(Some(status)) => {
                SpeechCompletion::failed(generation, format!("{} exited with {status}", self.program))
            }
            Err(e) => SpeechCompletion::failed(generation, e.to_string()),
        };
        self.child = None;
        Some(completion)
    }

    fn cancel(&mut self) {
        if let Some((generation, mut child)) = self.child.take() {
            if let Err(e) = child.kill() {
                debug!(generation = %generation, "speech process already gone: {e}");
            }
            if let Err(e) = child.wait() {
                debug!(generation = %generation, "reaping speech process failed: {e}");
            }
        }
    }
}

impl Drop for CommandSpeech {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// First candidate that resolves to an executable on `PATH`.
fn find_program(candidates: &[&str]) -> Option<PathBuf> {
    candidates.iter().find_map(|name| which::which(name).ok())
}

/// Picks the process engine when a program is available, otherwise a
/// silent engine so spoken trials still run (the countdown starts at once).
pub fn speech_engine(settings: &SpeechSettings) -> Box<dyn SpeechEngine> {
    match CommandSpeech::detect(settings) {
        Some(engine) => {
            info!(program = engine.program(), "speech engine ready");
            Box::new(engine)
        }
        None => {
            warn!("no text-to-speech program found; spoken trials will start without audio");
            Box::new(SilentSpeech)
        }
    }
}
