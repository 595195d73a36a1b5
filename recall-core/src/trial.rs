use serde::{Deserialize, Serialize};

use crate::{Answer, Generation, PresentationMode, SlotOutcome, TrialPhase, score};

/// One round of generate, present, hide, answer and reveal.
///
/// `sequence` is fixed at construction. `answers` and `entries` always have
/// the same length as `sequence`; only single slots are ever replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    generation: Generation,
    mode: PresentationMode,
    sequence: Vec<u32>,
    answers: Vec<Answer>,
    entries: Vec<String>,
    phase: TrialPhase,
    time_remaining: u32,
    manual_reveal: bool,
}

impl Trial {
    pub fn new(
        generation: Generation,
        mode: PresentationMode,
        sequence: Vec<u32>,
        time_remaining: u32,
    ) -> Self {
        let len = sequence.len();
        Self {
            generation,
            mode,
            sequence,
            answers: vec![Answer::Unset; len],
            entries: vec![String::new(); len],
            phase: TrialPhase::Presenting,
            time_remaining,
            manual_reveal: false,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn mode(&self) -> PresentationMode {
        self.mode
    }

    pub fn sequence(&self) -> &[u32] {
        &self.sequence
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    /// Raw text per slot, as last typed.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Replaces one slot. Returns the parsed answer, or `None` when the index
    /// is out of range.
    pub fn record_answer(&mut self, index: usize, raw: &str) -> Option<Answer> {
        let answer = Answer::parse(raw);
        let slot = self.answers.get_mut(index)?;
        *slot = answer;
        self.entries[index] = raw.to_string();
        Some(answer)
    }

    pub fn enter_phase(&mut self, phase: TrialPhase) {
        self.phase = phase;
    }

    pub fn mark_manual_reveal(&mut self) {
        self.manual_reveal = true;
    }

    pub fn set_time_remaining(&mut self, seconds: u32) {
        self.time_remaining = seconds;
    }

    /// Per-slot correctness; only available once revealed.
    pub fn score(&self) -> Option<Vec<SlotOutcome>> {
        (self.phase == TrialPhase::Revealed).then(|| score(&self.sequence, &self.answers))
    }

    pub fn outcome(&self) -> Option<TrialOutcome> {
        let slots = self.score()?;
        Some(TrialOutcome {
            generation: self.generation,
            mode: self.mode,
            sequence: self.sequence.clone(),
            answers: self.answers.clone(),
            correct: slots.iter().filter(|s| s.is_correct()).count(),
            slots,
            manual_reveal: self.manual_reveal,
        })
    }
}

/// Summary of a revealed trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub generation: Generation,
    pub mode: PresentationMode,
    pub sequence: Vec<u32>,
    pub answers: Vec<Answer>,
    pub slots: Vec<SlotOutcome>,
    pub correct: usize,
    pub manual_reveal: bool,
}

impl TrialOutcome {
    pub fn total(&self) -> usize {
        self.slots.len()
    }

    pub fn is_perfect(&self) -> bool {
        self.correct == self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial() -> Trial {
        Trial::new(Generation::new(1), PresentationMode::Visual, vec![3, 50, 12], 5)
    }

    #[test]
    fn answers_track_sequence_length_through_edits() {
        let mut t = trial();
        assert_eq!(t.answers().len(), 3);
        t.record_answer(0, "3");
        t.record_answer(2, "abc");
        t.record_answer(1, "51");
        assert_eq!(t.answers().len(), t.sequence().len());
        assert_eq!(t.entries()[2], "abc");
        assert_eq!(t.answers()[2], Answer::Unset);
    }

    #[test]
    fn out_of_range_edit_is_rejected() {
        let mut t = trial();
        assert_eq!(t.record_answer(3, "1"), None);
        assert_eq!(t.answers().len(), 3);
    }

    #[test]
    fn score_is_withheld_until_revealed() {
        let mut t = trial();
        t.record_answer(0, "3");
        t.enter_phase(TrialPhase::Hidden);
        assert!(t.score().is_none());

        t.enter_phase(TrialPhase::Revealed);
        let outcome = t.outcome().expect("revealed trial has an outcome");
        assert_eq!(outcome.correct, 1);
        assert_eq!(outcome.total(), 3);
        assert!(!outcome.is_perfect());
    }

    #[test]
    fn outcome_serializes_with_snake_case_tags() {
        let mut t = trial();
        t.enter_phase(TrialPhase::Revealed);
        let json = serde_json::to_value(t.outcome().unwrap()).unwrap();
        assert_eq!(json["mode"], "visual");
        assert_eq!(json["answers"][0], "unset");
        assert_eq!(json["slots"][0], "incorrect");
    }
}
