//! Aggression accumulator: a bounded scalar that escalates the agent
//! from watching to chasing.

/// Escalation fires when the level reaches this bound.
pub const ESCALATION_THRESHOLD: f32 = 1.0;

/// Default accumulation/decay rate, per second.
pub const DEFAULT_RATE: f32 = 1.0;

/// Which way the accumulator moves this tick. Decided by the state
/// machine: rise only while escalating at an empty-handed target, hold
/// during the chase, decay everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drive {
    Rise,
    Hold,
    Decay,
}

#[derive(Debug)]
pub struct Aggression {
    level: f32,
    rate: f32,
}

impl Aggression {
    pub fn new(rate: f32) -> Self {
        Self { level: 0.0, rate }
    }

    /// Current level, always within `[0, 1]`.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Advance the accumulator. Returns true exactly on the tick the
    /// level first reaches the escalation threshold — no hysteresis on
    /// the rising edge.
    pub fn update(&mut self, dt: f32, drive: Drive) -> bool {
        match drive {
            Drive::Rise => {
                let before = self.level;
                self.level = (self.level + self.rate * dt).min(ESCALATION_THRESHOLD);
                before < ESCALATION_THRESHOLD && self.level >= ESCALATION_THRESHOLD
            }
            Drive::Hold => false,
            Drive::Decay => {
                if self.level > 0.0 {
                    self.level = (self.level - self.rate * dt).max(0.0);
                }
                false
            }
        }
    }
}

impl Default for Aggression {
    fn default() -> Self {
        Self::new(DEFAULT_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_stays_bounded_through_any_drive_sequence() {
        let mut aggression = Aggression::default();
        let drives = [Drive::Rise, Drive::Decay, Drive::Hold];
        for step in 0..10_000 {
            let drive = drives[step % drives.len()];
            aggression.update(0.7, drive);
            assert!((0.0..=1.0).contains(&aggression.level()));
        }
    }

    #[test]
    fn escalation_fires_once_on_crossing() {
        let mut aggression = Aggression::default();
        let mut fired = 0;
        // 0.95 in, then small ticks across the threshold.
        aggression.update(0.95, Drive::Rise);
        for _ in 0..10 {
            if aggression.update(0.02, Drive::Rise) {
                fired += 1;
            }
        }
        assert_eq!(fired, 1);
        assert_eq!(aggression.level(), 1.0);
    }

    #[test]
    fn decay_floors_at_zero() {
        let mut aggression = Aggression::default();
        aggression.update(0.5, Drive::Rise);
        for _ in 0..100 {
            aggression.update(0.25, Drive::Decay);
        }
        assert_eq!(aggression.level(), 0.0);
    }

    #[test]
    fn hold_freezes_the_level() {
        let mut aggression = Aggression::default();
        aggression.update(0.4, Drive::Rise);
        let level = aggression.level();
        aggression.update(5.0, Drive::Hold);
        assert_eq!(aggression.level(), level);
    }

    #[test]
    fn single_large_tick_crossing_fires_immediately() {
        let mut aggression = Aggression::default();
        assert!(aggression.update(1.5, Drive::Rise));
    }
}
