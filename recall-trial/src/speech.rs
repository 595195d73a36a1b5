use recall_core::Generation;
use thiserror::Error;

/// Text handed to a speech engine, tagged with the trial it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub generation: Generation,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechStatus {
    Finished,
    Failed(String),
}

/// Completion notice for an utterance. Carries the generation it was issued
/// for so a late notice from a discarded trial can be told apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechCompletion {
    pub generation: Generation,
    pub status: SpeechStatus,
}

impl SpeechCompletion {
    pub fn finished(generation: Generation) -> Self {
        Self {
            generation,
            status: SpeechStatus::Finished,
        }
    }

    pub fn failed(generation: Generation, reason: impl Into<String>) -> Self {
        Self {
            generation,
            status: SpeechStatus::Failed(reason.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("no speech engine available")]
    Unavailable,
    #[error("failed to start speech program `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Text-to-speech collaborator.
///
/// `speak` submits an utterance and returns immediately; playback completion
/// is reported later through `poll`. Engines play one utterance at a time and
/// a new `speak` replaces whatever was playing.
pub trait SpeechEngine {
    fn speak(&mut self, utterance: Utterance) -> Result<(), SpeechError>;
    fn poll(&mut self) -> Option<SpeechCompletion>;
    fn cancel(&mut self);
}

/// Engine for machines without text-to-speech. Every request fails, which
/// the controller treats as an immediate completion.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSpeech;

impl SpeechEngine for SilentSpeech {
    fn speak(&mut self, _utterance: Utterance) -> Result<(), SpeechError> {
        Err(SpeechError::Unavailable)
    }

    fn poll(&mut self) -> Option<SpeechCompletion> {
        None
    }

    fn cancel(&mut self) {}
}

impl<E: SpeechEngine + ?Sized> SpeechEngine for Box<E> {
    fn speak(&mut self, utterance: Utterance) -> Result<(), SpeechError> {
        (**self).speak(utterance)
    }

    fn poll(&mut self) -> Option<SpeechCompletion> {
        (**self).poll()
    }

    fn cancel(&mut self) {
        (**self).cancel()
    }
}
