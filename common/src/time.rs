use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub fn since_epoch() -> Duration {
    // A clock set before 1970 only skews interpolation; it isn't worth a panic.
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
}

// Wall-clock milliseconds. Snapshot timestamps and the interpolation render
// clock both use this, so peers rely on the OS keeping their clocks close.
pub fn now_ms() -> f64 {
    since_epoch().as_secs_f64() * 1000.0
}

#[derive(Clone, Debug)]
pub struct Cadence {
    interval_ms: f64,
    elapsed_ms: f64,
}

impl Cadence {
    pub fn from_rate(hz: f32) -> Self {
        Self {
            interval_ms: 1000.0 / hz.max(f32::EPSILON) as f64,
            elapsed_ms: 0.0,
        }
    }

    pub fn ready(&mut self, elapsed_ms: f64) -> bool {
        self.elapsed_ms += elapsed_ms.max(0.0);
        if self.elapsed_ms < self.interval_ms {
            return false;
        }

        // Keep the phase but drop whole missed intervals rather than bursting.
        self.elapsed_ms = (self.elapsed_ms - self.interval_ms) % self.interval_ms;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirty_hertz_cadence_fires_every_other_sixty_hertz_frame() {
        let mut cadence = Cadence::from_rate(30.0);
        let fired: Vec<bool> = (0..6).map(|_| cadence.ready(1000.0 / 60.0 + 0.01)).collect();
        assert_eq!(fired, vec![false, true, false, true, false, true]);
    }

    #[test]
    fn long_stall_fires_once() {
        let mut cadence = Cadence::from_rate(15.0);
        assert!(cadence.ready(500.0));
        assert!(!cadence.ready(1.0));
    }
}
