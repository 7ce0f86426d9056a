use serde::{Deserialize, Serialize};

pub trait SequenceGuard: Send {
    // Returns `true` if the frame carrying `seq` should be applied.
    fn admit(&mut self, seq: u32) -> bool;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl SequenceGuard for AcceptAll {
    fn admit(&mut self, _seq: u32) -> bool {
        true
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DropStale {
    latest: Option<u32>,
}

impl SequenceGuard for DropStale {
    fn admit(&mut self, seq: u32) -> bool {
        let Some(latest) = self.latest else {
            self.latest = Some(seq);
            return true;
        };

        // Cast by 2's complement, so that a wrapped sequence number just past
        // u32::MAX still compares as newer. Only ambiguous if the two are more
        // than 2^31 frames apart, which at 30Hz is about two years.
        let difference = seq.wrapping_sub(latest) as i32;
        if difference > 0 {
            self.latest = Some(seq);
            true
        } else {
            false
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequencePolicy {
    #[default]
    AcceptAll,
    DropStale,
}

impl SequencePolicy {
    pub fn guard(self) -> Box<dyn SequenceGuard> {
        match self {
            SequencePolicy::AcceptAll => Box::new(AcceptAll),
            SequencePolicy::DropStale => Box::new(DropStale::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_all_admits_stale_frames() {
        let mut guard = AcceptAll;
        assert!(guard.admit(10));
        assert!(guard.admit(3));
    }

    #[test]
    fn drop_stale_rejects_older_and_duplicate_frames() {
        let mut guard = DropStale::default();
        assert!(guard.admit(10));
        assert!(!guard.admit(9));
        assert!(!guard.admit(10));
        assert!(guard.admit(11));
    }

    #[test]
    fn drop_stale_handles_wraparound() {
        let mut guard = DropStale::default();
        assert!(guard.admit(u32::MAX - 1));
        assert!(guard.admit(2));
        assert!(!guard.admit(u32::MAX));
    }
}
