use recall_core::{Phase, PresentationMode, SlotOutcome, Trial, TrialPhase};

use crate::config::TrialConfig;

/// What the display surface may show for one sequence position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceCell {
    Shown(u32),
    Concealed,
}

/// Read-only snapshot of the active trial for the display surface
#[derive(Debug, Clone, PartialEq)]
pub struct TrialView {
    pub phase: TrialPhase,
    pub mode: PresentationMode,
    pub cells: Vec<SequenceCell>,
    pub entries: Vec<String>,
    pub outcomes: Option<Vec<SlotOutcome>>,
    pub time_remaining: u32,
    pub countdown_running: bool,
    pub speaking: bool,
    pub input_enabled: bool,
    /// Configuration the next Generate will use.
    pub next_config: TrialConfig,
}

impl TrialView {
    pub(crate) fn capture(
        trial: &Trial,
        countdown_running: bool,
        speaking: bool,
        next_config: TrialConfig,
    ) -> Self {
        let phase = trial.phase();
        let shown = !trial.mode().conceals_immediately() && !phase.conceals_sequence();
        let cells = trial
            .sequence()
            .iter()
            .map(|&v| {
                if shown {
                    SequenceCell::Shown(v)
                } else {
                    SequenceCell::Concealed
                }
            })
            .collect();

        Self {
            phase,
            mode: trial.mode(),
            cells,
            entries: trial.entries().to_vec(),
            outcomes: trial.score(),
            time_remaining: trial.time_remaining(),
            countdown_running,
            speaking,
            input_enabled: phase.allows_input(),
            next_config,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Sequence line, e.g. `3 - 50 - 12` or `?? - ?? - ??` while concealed.
    pub fn sequence_label(&self) -> String {
        self.cells
            .iter()
            .map(|cell| match cell {
                SequenceCell::Shown(v) => v.to_string(),
                SequenceCell::Concealed => "??".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" - ")
    }

    pub fn correct_count(&self) -> Option<usize> {
        self.outcomes
            .as_ref()
            .map(|slots| slots.iter().filter(|s| s.is_correct()).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::Generation;

    fn view_of(mode: PresentationMode, phase: TrialPhase) -> TrialView {
        let mut trial = Trial::new(Generation::new(1), mode, vec![3, 50, 12], 5);
        trial.enter_phase(phase);
        TrialView::capture(&trial, true, false, TrialConfig::default())
    }

    #[test]
    fn visual_presenting_shows_sequence() {
        let view = view_of(PresentationMode::Visual, TrialPhase::Presenting);
        assert_eq!(view.sequence_label(), "3 - 50 - 12");
        assert!(!view.input_enabled);
        assert!(view.outcomes.is_none());
    }

    #[test]
    fn spoken_presenting_never_exposes_sequence() {
        let view = view_of(PresentationMode::Spoken, TrialPhase::Presenting);
        assert_eq!(view.sequence_label(), "?? - ?? - ??");
        assert!(view.cells.iter().all(|c| *c == SequenceCell::Concealed));
    }

    #[test]
    fn hidden_conceals_and_enables_input() {
        let view = view_of(PresentationMode::Visual, TrialPhase::Hidden);
        assert_eq!(view.sequence_label(), "?? - ?? - ??");
        assert!(view.input_enabled);
    }

    #[test]
    fn visual_reveal_shows_sequence_and_scores() {
        let view = view_of(PresentationMode::Visual, TrialPhase::Revealed);
        assert_eq!(view.sequence_label(), "3 - 50 - 12");
        assert_eq!(view.correct_count(), Some(0));
        assert!(!view.input_enabled);
    }

    #[test]
    fn spoken_reveal_scores_without_showing_sequence() {
        let view = view_of(PresentationMode::Spoken, TrialPhase::Revealed);
        assert!(view.cells.iter().all(|c| *c == SequenceCell::Concealed));
        assert_eq!(view.outcomes.as_ref().map(Vec::len), Some(3));
        assert_eq!(view.correct_count(), Some(0));
        assert!(!view.input_enabled);
    }
}
