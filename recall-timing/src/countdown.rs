use recall_core::Generation;

/// One countdown step.
pub const TICK_NS: u64 = 1_000_000_000;

/// Handle identifying one armed countdown. External tick sources carry it
/// back so ticks meant for a replaced countdown can be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub generation: Generation,
    pub serial: u64,
}

/// A one-second repeating countdown bound to a single trial generation.
///
/// Owners keep at most one of these; arming a new one means replacing the old
/// value, so a superseded countdown can never tick again. `remaining` only
/// ever moves down and stops at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    ticket: Ticket,
    armed_at: u64,
    total: u32,
    remaining: u32,
}

impl Countdown {
    pub fn arm(ticket: Ticket, armed_at: u64, seconds: u32) -> Self {
        Self {
            ticket,
            armed_at,
            total: seconds,
            remaining: seconds,
        }
    }

    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn generation(&self) -> Generation {
        self.ticket.generation
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_spent(&self) -> bool {
        self.remaining == 0
    }

    /// Timestamp of the next tick, or `None` once spent.
    pub fn next_tick_at(&self) -> Option<u64> {
        if self.is_spent() {
            return None;
        }
        let elapsed_ticks = u64::from(self.total - self.remaining);
        Some(self.armed_at + (elapsed_ticks + 1) * TICK_NS)
    }

    /// Number of ticks that have come due by `now` and not yet been taken.
    pub fn due(&self, now: u64) -> u32 {
        let elapsed = now.saturating_sub(self.armed_at) / TICK_NS;
        let target = u64::from(self.total).saturating_sub(elapsed);
        u64::from(self.remaining).saturating_sub(target) as u32
    }

    /// Takes one tick. Returns the new remaining time, or `None` if the
    /// countdown was already spent.
    pub fn tick(&mut self) -> Option<u32> {
        if self.is_spent() {
            return None;
        }
        self.remaining -= 1;
        Some(self.remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICKET: Ticket = Ticket {
        generation: Generation::new(4),
        serial: 9,
    };

    #[test]
    fn due_counts_whole_seconds_since_arming() {
        let cd = Countdown::arm(TICKET, 1_000, 5);
        assert_eq!(cd.due(1_000), 0);
        assert_eq!(cd.due(1_000 + TICK_NS - 1), 0);
        assert_eq!(cd.due(1_000 + TICK_NS), 1);
        assert_eq!(cd.due(1_000 + 3 * TICK_NS + 5), 3);
    }

    #[test]
    fn due_never_exceeds_remaining() {
        let cd = Countdown::arm(TICKET, 0, 5);
        assert_eq!(cd.due(60 * TICK_NS), 5);
    }

    #[test]
    fn ticking_stops_at_zero() {
        let mut cd = Countdown::arm(TICKET, 0, 2);
        assert_eq!(cd.tick(), Some(1));
        assert_eq!(cd.tick(), Some(0));
        assert!(cd.is_spent());
        assert_eq!(cd.tick(), None);
        assert_eq!(cd.remaining(), 0);
        assert_eq!(cd.due(100 * TICK_NS), 0);
    }

    #[test]
    fn taken_ticks_are_not_due_again() {
        let mut cd = Countdown::arm(TICKET, 0, 5);
        let now = 2 * TICK_NS;
        for _ in 0..cd.due(now) {
            cd.tick();
        }
        assert_eq!(cd.remaining(), 3);
        assert_eq!(cd.due(now), 0);
        assert_eq!(cd.next_tick_at(), Some(3 * TICK_NS));
    }

    #[test]
    fn first_tick_is_one_second_after_arming() {
        let cd = Countdown::arm(TICKET, 500, 3);
        assert_eq!(cd.next_tick_at(), Some(500 + TICK_NS));
        assert_eq!(cd.remaining(), 3);
        assert_eq!(cd.ticket(), TICKET);
        assert_eq!(cd.generation(), Generation::new(4));
    }
}
