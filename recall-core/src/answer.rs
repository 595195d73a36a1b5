use serde::{Deserialize, Serialize};

/// One answer slot as submitted by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    #[default]
    Unset,
    Value(u32),
}

impl Answer {
    /// Non-numeric text is not an error; it simply leaves the slot unset.
    pub fn parse(raw: &str) -> Self {
        raw.trim().parse::<u32>().map_or(Self::Unset, Self::Value)
    }

    pub fn value(self) -> Option<u32> {
        match self {
            Self::Unset => None,
            Self::Value(v) => Some(v),
        }
    }

    pub fn is_set(self) -> bool {
        matches!(self, Self::Value(_))
    }

    pub fn matches(self, expected: u32) -> bool {
        self.value() == Some(expected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotOutcome {
    Correct,
    Incorrect,
}

impl SlotOutcome {
    pub fn is_correct(self) -> bool {
        matches!(self, Self::Correct)
    }
}

/// Scores answers against the sequence slot by slot. Missing answers count as
/// incorrect.
pub fn score(sequence: &[u32], answers: &[Answer]) -> Vec<SlotOutcome> {
    sequence
        .iter()
        .enumerate()
        .map(|(i, &expected)| match answers.get(i) {
            Some(answer) if answer.matches(expected) => SlotOutcome::Correct,
            _ => SlotOutcome::Incorrect,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use SlotOutcome::*;

    #[test]
    fn scores_exact_equality_per_slot() {
        let answers = [Answer::Value(3), Answer::Value(51), Answer::Value(12)];
        assert_eq!(score(&[3, 50, 12], &answers), vec![Correct, Incorrect, Correct]);
    }

    #[test]
    fn unset_answers_score_incorrect() {
        let answers = [Answer::Unset, Answer::Value(0)];
        assert_eq!(score(&[0, 0], &answers), vec![Incorrect, Correct]);
    }

    #[test]
    fn short_answer_list_scores_missing_slots_incorrect() {
        assert_eq!(score(&[1, 2], &[Answer::Value(1)]), vec![Correct, Incorrect]);
    }

    #[test]
    fn parse_treats_garbage_as_unset() {
        assert_eq!(Answer::parse(" 42 "), Answer::Value(42));
        assert_eq!(Answer::parse("0"), Answer::Value(0));
        assert_eq!(Answer::parse(""), Answer::Unset);
        assert_eq!(Answer::parse("4x"), Answer::Unset);
        assert_eq!(Answer::parse("-3"), Answer::Unset);
        assert_eq!(Answer::parse("99999999999"), Answer::Unset);
    }
}
