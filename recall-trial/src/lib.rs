pub mod config;
pub mod controller;
pub mod generator;
pub mod speech;
pub mod testing;
pub mod view;

pub use config::{AnswerWindow, ConfigError, TrialConfig, TrialSettings};
pub use controller::{TrialCommand, TrialController, TrialEvent};
pub use generator::generate;
pub use speech::{SilentSpeech, SpeechCompletion, SpeechEngine, SpeechError, SpeechStatus, Utterance};
pub use view::{SequenceCell, TrialView};
