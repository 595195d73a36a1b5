//! Test doubles for driving a [`TrialController`](crate::TrialController)
//! without a real speech engine.
//!
//! ```
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use recall_core::PresentationMode;
//! use recall_timing::ManualTimer;
//! use recall_trial::testing::ScriptedSpeech;
//! use recall_trial::{TrialConfig, TrialController};
//!
//! let speech = ScriptedSpeech::new();
//! let config = TrialConfig::default().with_mode(PresentationMode::Spoken);
//! let mut controller =
//!     TrialController::new(config, ManualTimer::new(), StdRng::seed_from_u64(1), speech.clone());
//!
//! let generation = controller.generate();
//! assert!(controller.is_speaking());
//!
//! speech.complete(generation);
//! controller.update();
//! assert!(!controller.is_speaking());
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use recall_core::Generation;

use crate::speech::{SpeechCompletion, SpeechEngine, SpeechError, Utterance};

#[derive(Debug, Default)]
struct Script {
    spoken: Vec<Utterance>,
    completions: VecDeque<SpeechCompletion>,
    refuse_next: bool,
    cancellations: usize,
}

/// Speech engine whose completions are pushed by the test. Clones share
/// state, so the test keeps one handle and gives the other to the controller.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSpeech {
    script: Arc<Mutex<Script>>,
}

impl ScriptedSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful completion for `generation`.
    pub fn complete(&self, generation: Generation) {
        self.lock()
            .completions
            .push_back(SpeechCompletion::finished(generation));
    }

    /// Queues a failed completion for `generation`.
    pub fn fail(&self, generation: Generation, reason: &str) {
        self.lock()
            .completions
            .push_back(SpeechCompletion::failed(generation, reason));
    }

    /// Makes the next `speak` call return an error.
    pub fn refuse_next(&self) {
        self.lock().refuse_next = true;
    }

    pub fn spoken(&self) -> Vec<Utterance> {
        self.lock().spoken.clone()
    }

    pub fn cancellations(&self) -> usize {
        self.lock().cancellations
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SpeechEngine for ScriptedSpeech {
    fn speak(&mut self, utterance: Utterance) -> Result<(), SpeechError> {
        let mut script = self.lock();
        if std::mem::take(&mut script.refuse_next) {
            return Err(SpeechError::Unavailable);
        }
        script.spoken.push(utterance);
        Ok(())
    }

    fn poll(&mut self) -> Option<SpeechCompletion> {
        self.lock().completions.pop_front()
    }

    fn cancel(&mut self) {
        self.lock().cancellations += 1;
    }
}
