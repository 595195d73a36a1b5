use recall_core::TrialPhase;
use recall_trial::{AnswerWindow, TrialConfig};
use winit::keyboard::KeyCode;

/// Most digits an answer slot accepts.
pub const MAX_ENTRY_DIGITS: usize = 4;

/// Presets the `,` and `.` keys step through for the largest item value.
pub const RANGE_PRESETS: &[u32] = &[9, 99, 999, 9_999];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Generate,
    Reveal,
    Submit,
    ToggleMode,
    ToggleAnswerWindow,
    Length(i32),
    Time(i32),
    Range(bool),
    Digit(char),
    Backspace,
    Clear,
    Focus(i32),
    Exit,
}

pub fn action_for(key: KeyCode) -> Option<Action> {
    use KeyCode::*;
    let action = match key {
        KeyG => Action::Generate,
        KeyR => Action::Reveal,
        Enter | NumpadEnter => Action::Submit,
        KeyM => Action::ToggleMode,
        KeyU => Action::ToggleAnswerWindow,
        BracketLeft => Action::Length(-1),
        BracketRight => Action::Length(1),
        Minus | NumpadSubtract => Action::Time(-1),
        Equal | NumpadAdd => Action::Time(1),
        Comma => Action::Range(false),
        Period => Action::Range(true),
        Backspace => Action::Backspace,
        Delete => Action::Clear,
        Tab | ArrowRight => Action::Focus(1),
        ArrowLeft => Action::Focus(-1),
        Escape => Action::Exit,
        other => Action::Digit(digit(other)?),
    };
    Some(action)
}

fn digit(key: KeyCode) -> Option<char> {
    use KeyCode::*;
    let d = match key {
        Digit0 | Numpad0 => '0',
        Digit1 | Numpad1 => '1',
        Digit2 | Numpad2 => '2',
        Digit3 | Numpad3 => '3',
        Digit4 | Numpad4 => '4',
        Digit5 | Numpad5 => '5',
        Digit6 | Numpad6 => '6',
        Digit7 | Numpad7 => '7',
        Digit8 | Numpad8 => '8',
        Digit9 | Numpad9 => '9',
        _ => return None,
    };
    Some(d)
}

/// Applies a configuration key to `config`. Returns `None` for keys that
/// don't touch configuration.
pub fn adjust(config: TrialConfig, action: Action) -> Option<TrialConfig> {
    let next = match action {
        Action::ToggleMode => config.with_mode(config.mode().toggled()),
        Action::ToggleAnswerWindow => config.with_answer_window(match config.answer_window() {
            AnswerWindow::Timed => AnswerWindow::Untimed,
            AnswerWindow::Untimed => AnswerWindow::Timed,
        }),
        Action::Length(step) => {
            config.with_sequence_length(config.sequence_length().saturating_add_signed(step as isize))
        }
        Action::Time(step) => config.with_allowed_time(config.allowed_time_secs().saturating_add_signed(step)),
        Action::Range(up) => config.with_max_value(step_range(config.max_value(), up)),
        _ => return None,
    };
    Some(next)
}

fn step_range(current: u32, up: bool) -> u32 {
    if up {
        RANGE_PRESETS
            .iter()
            .copied()
            .find(|&p| p > current)
            .unwrap_or(current)
    } else {
        RANGE_PRESETS
            .iter()
            .rev()
            .copied()
            .find(|&p| p < current)
            .unwrap_or(current)
    }
}

/// Appends a digit to an answer entry, or `None` if the slot is full.
pub fn push_digit(entry: &str, d: char) -> Option<String> {
    (entry.chars().count() < MAX_ENTRY_DIGITS).then(|| format!("{entry}{d}"))
}

/// What Enter does in each phase.
pub fn submit_action(phase: Option<TrialPhase>) -> Option<Action> {
    match phase {
        None | Some(TrialPhase::Revealed) => Some(Action::Generate),
        Some(TrialPhase::Hidden) => Some(Action::Reveal),
        Some(TrialPhase::Presenting) => None,
    }
}

pub fn move_focus(focus: usize, step: i32, slots: usize) -> usize {
    if slots == 0 {
        return 0;
    }
    (focus as i64 + i64::from(step)).rem_euclid(slots as i64) as usize
}
