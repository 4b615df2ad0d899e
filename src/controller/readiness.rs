use std::time::Duration;
use tokio::time::Instant;

/// Readiness protocol for a freshly mounted embed.
///
/// The load signal alone is not enough: the player needs a settle delay after
/// it before it accepts the registration. If the load signal never shows up,
/// a fallback deadline starts the settle phase anyway. Whichever of the two
/// comes first wins; the other is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    AwaitingLoad { fallback_at: Instant },
    Settling { ready_at: Instant },
    Registered,
}

impl Readiness {
    pub fn new(now: Instant, load_fallback: Duration) -> Self {
        Readiness::AwaitingLoad {
            fallback_at: now + load_fallback,
        }
    }

    /// Embed load signal. Returns true if this started the settle phase.
    pub fn on_load(&mut self, now: Instant, settle: Duration) -> bool {
        match self {
            Readiness::AwaitingLoad { .. } => {
                *self = Readiness::Settling {
                    ready_at: now + settle,
                };
                true
            }
            _ => false,
        }
    }

    /// Next instant at which [`Readiness::on_deadline`] must run
    pub fn deadline(&self) -> Option<Instant> {
        match self {
            Readiness::AwaitingLoad { fallback_at } => Some(*fallback_at),
            Readiness::Settling { ready_at } => Some(*ready_at),
            Readiness::Registered => None,
        }
    }

    /// Advance past an expired deadline. Returns true exactly once, when the
    /// embed becomes ready for registration.
    pub fn on_deadline(&mut self, now: Instant, settle: Duration) -> bool {
        match self {
            Readiness::AwaitingLoad { .. } => {
                *self = Readiness::Settling {
                    ready_at: now + settle,
                };
                false
            }
            Readiness::Settling { .. } => {
                *self = Readiness::Registered;
                true
            }
            Readiness::Registered => false,
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, Readiness::Registered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTLE: Duration = Duration::from_millis(1500);
    const FALLBACK: Duration = Duration::from_millis(1500);

    #[test]
    fn test_load_then_settle() {
        let start = Instant::now();
        let mut readiness = Readiness::new(start, FALLBACK);
        assert_eq!(readiness.deadline(), Some(start + FALLBACK));

        let loaded_at = start + Duration::from_millis(300);
        assert!(readiness.on_load(loaded_at, SETTLE));
        assert_eq!(readiness.deadline(), Some(loaded_at + SETTLE));

        assert!(readiness.on_deadline(loaded_at + SETTLE, SETTLE));
        assert!(readiness.is_registered());
        assert_eq!(readiness.deadline(), None);
    }

    #[test]
    fn test_missed_load_falls_back() {
        let start = Instant::now();
        let mut readiness = Readiness::new(start, FALLBACK);

        assert!(!readiness.on_deadline(start + FALLBACK, SETTLE));
        assert_eq!(readiness.deadline(), Some(start + FALLBACK + SETTLE));

        // A late load signal does not restart settling
        assert!(!readiness.on_load(start + FALLBACK + Duration::from_millis(10), SETTLE));
        assert_eq!(readiness.deadline(), Some(start + FALLBACK + SETTLE));

        assert!(readiness.on_deadline(start + FALLBACK + SETTLE, SETTLE));
        assert!(!readiness.on_deadline(start + FALLBACK + SETTLE, SETTLE));
    }

    #[test]
    fn test_second_load_ignored() {
        let start = Instant::now();
        let mut readiness = Readiness::new(start, FALLBACK);
        assert!(readiness.on_load(start, SETTLE));
        assert!(!readiness.on_load(start + Duration::from_millis(100), SETTLE));
        assert_eq!(readiness.deadline(), Some(start + SETTLE));
    }
}
