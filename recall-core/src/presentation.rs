use serde::{Deserialize, Serialize};

/// Delimiter placed between spoken items so speech engines pause on each number.
pub const SPOKEN_DELIMITER: &str = ". ";

/// How a sequence becomes perceivable to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationMode {
    #[default]
    Visual,
    Spoken,
}

impl PresentationMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Visual => Self::Spoken,
            Self::Spoken => Self::Visual,
        }
    }

    /// Whether the display surface may show the sequence while presenting.
    pub fn exposes_sequence(self) -> bool {
        matches!(self, Self::Visual)
    }

    /// Spoken sequences are never shown, so they are concealed from the start.
    pub fn conceals_immediately(self) -> bool {
        matches!(self, Self::Spoken)
    }

    /// Whether the countdown waits on a speech-completion signal.
    pub fn awaits_speech(self) -> bool {
        matches!(self, Self::Spoken)
    }

    pub fn speakable(sequence: &[u32]) -> String {
        sequence
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(SPOKEN_DELIMITER)
    }
}

impl std::fmt::Display for PresentationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Visual => "visual",
            Self::Spoken => "spoken",
        })
    }
}

impl std::str::FromStr for PresentationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "visual" => Ok(Self::Visual),
            "spoken" | "speech" | "audio" => Ok(Self::Spoken),
            other => Err(format!("unknown presentation mode `{other}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speakable_separates_items_with_periods() {
        assert_eq!(PresentationMode::speakable(&[3, 50, 12]), "3. 50. 12");
        assert_eq!(PresentationMode::speakable(&[7]), "7");
    }

    #[test]
    fn toggling_flips_between_modes() {
        assert_eq!(PresentationMode::Visual.toggled(), PresentationMode::Spoken);
        assert_eq!(PresentationMode::Spoken.toggled(), PresentationMode::Visual);
    }

    #[test]
    fn parses_mode_names() {
        assert_eq!("Spoken".parse(), Ok(PresentationMode::Spoken));
        assert_eq!(" visual ".parse(), Ok(PresentationMode::Visual));
        assert!("braille".parse::<PresentationMode>().is_err());
    }
}
