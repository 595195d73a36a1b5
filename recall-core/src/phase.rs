use serde::{Deserialize, Serialize};

/// Defines trial phases and what each one permits
pub trait Phase: Copy + Clone + PartialEq + Send + Sync + std::fmt::Debug + Default {
    fn allows_input(&self) -> bool;
    fn conceals_sequence(&self) -> bool;
    fn next(&self) -> Option<Self>;

    fn shows_results(&self) -> bool {
        false
    }
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialPhase {
    #[default]
    Presenting,
    Hidden,
    Revealed,
}

impl Phase for TrialPhase {
    fn allows_input(&self) -> bool {
        matches!(self, Self::Hidden)
    }

    fn conceals_sequence(&self) -> bool {
        matches!(self, Self::Hidden)
    }

    fn next(&self) -> Option<Self> {
        use TrialPhase::*;
        Some(match self {
            Presenting => Hidden,
            Hidden => Revealed,
            Revealed => return None,
        })
    }

    fn shows_results(&self) -> bool {
        matches!(self, Self::Revealed)
    }
}

impl std::fmt::Display for TrialPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Presenting => "presenting",
            Self::Hidden => "hidden",
            Self::Revealed => "revealed",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_advance_to_terminal_revealed() {
        let mut phase = TrialPhase::default();
        let mut seen = vec![phase];
        while let Some(next) = phase.next() {
            phase = next;
            seen.push(phase);
        }
        assert_eq!(
            seen,
            vec![TrialPhase::Presenting, TrialPhase::Hidden, TrialPhase::Revealed]
        );
    }

    #[test]
    fn only_hidden_accepts_answers() {
        assert!(!TrialPhase::Presenting.allows_input());
        assert!(TrialPhase::Hidden.allows_input());
        assert!(!TrialPhase::Revealed.allows_input());
        assert!(TrialPhase::Revealed.shows_results());
    }
}
