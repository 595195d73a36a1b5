use rand::Rng;
use recall_core::{Generation, PresentationMode, SlotOutcome, Trial, TrialOutcome, TrialPhase};
use recall_timing::{Countdown, TICK_NS, Ticket, Timer};
use tracing::{debug, info, trace, warn};

use crate::config::{AnswerWindow, TrialConfig};
use crate::generator::generate;
use crate::speech::{SpeechCompletion, SpeechEngine, SpeechStatus, Utterance};
use crate::view::TrialView;

/// Requests from the display and configuration surfaces
#[derive(Debug, Clone, PartialEq)]
pub enum TrialCommand {
    Generate,
    Reveal,
    Answer { index: usize, raw: String },
    Configure(TrialConfig),
}

/// Things that happened to the active trial, in order
#[derive(Debug, Clone, PartialEq)]
pub enum TrialEvent {
    Generated {
        generation: Generation,
        mode: PresentationMode,
        length: usize,
    },
    SpeechRequested {
        generation: Generation,
        utterance: String,
    },
    SpeechFailed {
        generation: Generation,
        reason: String,
    },
    CountdownStarted {
        ticket: Ticket,
        phase: TrialPhase,
        seconds: u32,
    },
    Tick {
        generation: Generation,
        remaining: u32,
    },
    Concealed {
        generation: Generation,
    },
    Revealed(TrialOutcome),
}

#[derive(Debug, Clone, Copy)]
struct PendingSpeech {
    generation: Generation,
    submitted_at: u64,
    budget_secs: u32,
}

/// Owns the active trial and moves it through Presenting, Hidden and Revealed.
///
/// All mutation goes through `&mut self`, so ticks, speech completions and
/// answer edits are applied one at a time. At most one countdown and one
/// speech request are outstanding, both tagged with the generation they were
/// issued for; anything tagged with an older generation is dropped.
pub struct TrialController<T, R, E>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
    E: SpeechEngine,
{
    timer: T,
    rng: R,
    speech: E,
    config: TrialConfig,
    active: TrialConfig,
    generation: Generation,
    trial: Option<Trial>,
    countdown: Option<Countdown>,
    serial: u64,
    pending_speech: Option<PendingSpeech>,
    outbox: Vec<TrialEvent>,
}

impl<T, R, E> TrialController<T, R, E>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
    E: SpeechEngine,
{
    pub fn new(config: TrialConfig, timer: T, rng: R, speech: E) -> Self {
        Self {
            timer,
            rng,
            speech,
            config,
            active: config,
            generation: Generation::default(),
            trial: None,
            countdown: None,
            serial: 0,
            pending_speech: None,
            outbox: Vec::new(),
        }
    }

    /// Discards the current trial and starts a new one.
    pub fn generate(&mut self) -> Generation {
        self.cancel_outstanding();

        self.generation = self.generation.next();
        self.active = self.config;
        let generation = self.generation;
        let mode = self.active.mode();
        let sequence = generate(
            &mut self.rng,
            self.active.sequence_length(),
            self.active.max_value(),
        );
        let now = self.timer.now();

        info!(
            %generation,
            %mode,
            length = sequence.len(),
            max_value = self.active.max_value(),
            allowed_time = self.active.allowed_time_secs(),
            "trial generated"
        );

        self.trial = Some(Trial::new(
            generation,
            mode,
            sequence,
            self.active.allowed_time_secs(),
        ));
        self.outbox.push(TrialEvent::Generated {
            generation,
            mode,
            length: self.active.sequence_length(),
        });

        if mode.awaits_speech() {
            self.start_speech(now);
        } else {
            self.arm_countdown(now);
        }
        generation
    }

    /// Polls the speech engine and the clock, applies whatever is due and
    /// returns every event produced since the last call.
    pub fn update(&mut self) -> Vec<TrialEvent> {
        let now = self.timer.now();

        while let Some(completion) = self.speech.poll() {
            self.apply_speech_completion(completion, now);
        }
        self.check_speech_timeout(now);

        while let Some(countdown) = &self.countdown {
            if countdown.due(now) == 0 {
                break;
            }
            let at = countdown.next_tick_at().unwrap_or(now);
            self.apply_tick(at);
        }

        std::mem::take(&mut self.outbox)
    }

    pub fn handle_command(&mut self, command: TrialCommand) -> bool {
        match command {
            TrialCommand::Generate => {
                self.generate();
                true
            }
            TrialCommand::Reveal => self.reveal(),
            TrialCommand::Answer { index, raw } => self.set_answer(index, &raw),
            TrialCommand::Configure(config) => {
                self.configure(config);
                true
            }
        }
    }

    /// One tick from an external one-second source. Ticks for a countdown
    /// that has since been replaced are ignored.
    pub fn tick(&mut self, ticket: Ticket) -> bool {
        let current = self
            .countdown
            .as_ref()
            .is_some_and(|countdown| countdown.ticket() == ticket);
        if !current {
            trace!(generation = %ticket.generation, serial = ticket.serial, "dropping stale tick");
            return false;
        }
        let now = self.timer.now();
        self.apply_tick(now);
        true
    }

    /// Completion notice delivered by a host callback rather than `poll`.
    pub fn speech_finished(&mut self, completion: SpeechCompletion) -> bool {
        let now = self.timer.now();
        self.apply_speech_completion(completion, now)
    }

    /// Records raw answer text for one slot. Only accepted while hidden.
    pub fn set_answer(&mut self, index: usize, raw: &str) -> bool {
        let Some(trial) = self.trial.as_mut() else {
            return false;
        };
        if trial.phase() != TrialPhase::Hidden {
            return false;
        }
        match trial.record_answer(index, raw) {
            Some(answer) => {
                debug!(generation = %trial.generation(), index, ?answer, "answer recorded");
                true
            }
            None => false,
        }
    }

    /// Manual reveal. Only valid while answers are being collected.
    pub fn reveal(&mut self) -> bool {
        let Some(trial) = self.trial.as_mut() else {
            return false;
        };
        if trial.phase() != TrialPhase::Hidden {
            return false;
        }
        trial.mark_manual_reveal();
        self.enter_revealed();
        true
    }

    /// Stores a new configuration. The in-flight trial keeps the settings it
    /// was generated with.
    pub fn configure(&mut self, config: TrialConfig) {
        if config != self.config {
            debug!(?config, "configuration updated; applies on next generate");
        }
        self.config = config;
    }

    pub fn config(&self) -> &TrialConfig {
        &self.config
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn trial(&self) -> Option<&Trial> {
        self.trial.as_ref()
    }

    pub fn phase(&self) -> Option<TrialPhase> {
        self.trial.as_ref().map(Trial::phase)
    }

    pub fn time_remaining(&self) -> Option<u32> {
        self.trial.as_ref().map(Trial::time_remaining)
    }

    pub fn is_speaking(&self) -> bool {
        self.pending_speech.is_some()
    }

    pub fn countdown_ticket(&self) -> Option<Ticket> {
        self.countdown.as_ref().map(Countdown::ticket)
    }

    pub fn score(&self) -> Option<Vec<SlotOutcome>> {
        self.trial.as_ref().and_then(Trial::score)
    }

    pub fn outcome(&self) -> Option<TrialOutcome> {
        self.trial.as_ref().and_then(Trial::outcome)
    }

    pub fn view(&self) -> Option<TrialView> {
        self.trial.as_ref().map(|trial| {
            TrialView::capture(
                trial,
                self.countdown.is_some(),
                self.pending_speech.is_some(),
                self.config,
            )
        })
    }

    /// Earliest timestamp at which `update` has something to do, if any.
    pub fn next_deadline(&self) -> Option<u64> {
        let tick = self.countdown.as_ref().and_then(Countdown::next_tick_at);
        let speech = self.pending_speech.map(|p| self.speech_deadline(p));
        match (tick, speech) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn cancel_outstanding(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            trace!(generation = %countdown.generation(), "countdown cancelled");
        }
        if let Some(pending) = self.pending_speech.take() {
            trace!(generation = %pending.generation, "speech cancelled");
            self.speech.cancel();
        }
    }

    fn start_speech(&mut self, now: u64) {
        let Some(trial) = self.trial.as_ref() else {
            return;
        };
        let generation = trial.generation();
        let text = PresentationMode::speakable(trial.sequence());
        let budget_secs = self.active.speech_budget_secs(trial.len());

        match self.speech.speak(Utterance {
            generation,
            text: text.clone(),
        }) {
            Ok(()) => {
                debug!(%generation, budget_secs, "utterance submitted");
                self.pending_speech = Some(PendingSpeech {
                    generation,
                    submitted_at: now,
                    budget_secs,
                });
                self.outbox.push(TrialEvent::SpeechRequested {
                    generation,
                    utterance: text,
                });
            }
            Err(err) => {
                warn!(%generation, error = %err, "speech unavailable; starting countdown");
                self.outbox.push(TrialEvent::SpeechFailed {
                    generation,
                    reason: err.to_string(),
                });
                self.arm_countdown(now);
            }
        }
    }

    fn apply_speech_completion(&mut self, completion: SpeechCompletion, now: u64) -> bool {
        let current = matches!(
            self.pending_speech,
            Some(pending) if pending.generation == completion.generation
        );
        if !current {
            trace!(generation = %completion.generation, "dropping stale speech completion");
            return false;
        }
        self.pending_speech = None;

        match completion.status {
            SpeechStatus::Finished => {
                debug!(generation = %completion.generation, "speech finished");
            }
            SpeechStatus::Failed(reason) => {
                warn!(generation = %completion.generation, %reason, "speech failed; starting countdown");
                self.outbox.push(TrialEvent::SpeechFailed {
                    generation: completion.generation,
                    reason,
                });
            }
        }
        self.arm_countdown(now);
        true
    }

    fn check_speech_timeout(&mut self, now: u64) {
        let Some(pending) = self.pending_speech else {
            return;
        };
        if now < self.speech_deadline(pending) {
            return;
        }
        self.speech.cancel();
        let reason = format!("no completion after {}s", pending.budget_secs);
        self.apply_speech_completion(SpeechCompletion::failed(pending.generation, reason), now);
    }

    fn speech_deadline(&self, pending: PendingSpeech) -> u64 {
        pending.submitted_at + u64::from(pending.budget_secs) * TICK_NS
    }

    /// Replaces the countdown slot with a fresh full-length countdown.
    fn arm_countdown(&mut self, at: u64) {
        let Some(trial) = self.trial.as_mut() else {
            return;
        };
        let seconds = self.active.allowed_time_secs();
        self.serial += 1;
        let ticket = Ticket {
            generation: trial.generation(),
            serial: self.serial,
        };
        trial.set_time_remaining(seconds);

        if let Some(previous) = self.countdown.replace(Countdown::arm(ticket, at, seconds)) {
            trace!(serial = previous.ticket().serial, "replaced countdown");
        }
        debug!(generation = %ticket.generation, phase = %trial.phase(), seconds, "countdown started");
        self.outbox.push(TrialEvent::CountdownStarted {
            ticket,
            phase: trial.phase(),
            seconds,
        });
    }

    fn apply_tick(&mut self, at: u64) {
        let Some(countdown) = self.countdown.as_mut() else {
            return;
        };
        let Some(remaining) = countdown.tick() else {
            return;
        };
        let generation = countdown.generation();
        if let Some(trial) = self.trial.as_mut() {
            trial.set_time_remaining(remaining);
        }
        debug!(%generation, remaining, "tick");
        self.outbox.push(TrialEvent::Tick {
            generation,
            remaining,
        });

        if remaining == 0 {
            self.countdown = None;
            self.countdown_elapsed(at);
        }
    }

    fn countdown_elapsed(&mut self, at: u64) {
        let Some(trial) = self.trial.as_mut() else {
            return;
        };
        match trial.phase() {
            TrialPhase::Presenting => {
                trial.enter_phase(TrialPhase::Hidden);
                let generation = trial.generation();
                info!(%generation, "sequence concealed; collecting answers");
                self.outbox.push(TrialEvent::Concealed { generation });
                if self.active.answer_window() == AnswerWindow::Timed {
                    self.arm_countdown(at);
                }
            }
            TrialPhase::Hidden => self.enter_revealed(),
            TrialPhase::Revealed => {}
        }
    }

    fn enter_revealed(&mut self) {
        self.countdown = None;
        let Some(trial) = self.trial.as_mut() else {
            return;
        };
        trial.enter_phase(TrialPhase::Revealed);
        if let Some(outcome) = trial.outcome() {
            info!(
                generation = %outcome.generation,
                correct = outcome.correct,
                total = outcome.total(),
                manual = outcome.manual_reveal,
                "trial revealed"
            );
            self.outbox.push(TrialEvent::Revealed(outcome));
        }
    }
}
