pub mod answer;
pub mod generation;
pub mod phase;
pub mod presentation;
pub mod trial;

pub use answer::{Answer, SlotOutcome, score};
pub use generation::Generation;
pub use phase::{Phase, TrialPhase};
pub use presentation::PresentationMode;
pub use trial::{Trial, TrialOutcome};
