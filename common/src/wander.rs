use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::input::{Controls, InputSource};

const MIN_LEG_MS: f64 = 400.0;
const MAX_LEG_MS: f64 = 2_000.0;
const BOOST_CHANCE: f64 = 0.3;
const JUMP_CHANCE: f64 = 0.25;
const JUMP_HOLD_MS: f64 = 100.0;

// A headless stand-in for a player: picks a heading, holds it for a while,
// sometimes boosts, sometimes jumps.
#[derive(Debug)]
pub struct Wander {
    rng: StdRng,
    current: Controls,
    leg_remaining_ms: f64,
    jump_remaining_ms: f64,
}

impl Wander {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            current: Controls::default(),
            leg_remaining_ms: 0.0,
            jump_remaining_ms: 0.0,
        }
    }

    fn next_leg(&mut self) {
        self.current.move_x = self.rng.random_range(-1.0..=1.0);
        self.current.move_y = self.rng.random_range(-1.0..=1.0);
        self.current.boost = self.rng.random_bool(BOOST_CHANCE);
        self.leg_remaining_ms = self.rng.random_range(MIN_LEG_MS..MAX_LEG_MS);

        if self.rng.random_bool(JUMP_CHANCE) {
            self.jump_remaining_ms = JUMP_HOLD_MS;
        }
    }
}

impl Default for Wander {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for Wander {
    fn sample(&mut self, elapsed_ms: f64) -> Controls {
        self.leg_remaining_ms -= elapsed_ms;
        self.jump_remaining_ms -= elapsed_ms;
        if self.leg_remaining_ms <= 0.0 {
            self.next_leg();
        }

        Controls {
            jump: self.jump_remaining_ms > 0.0,
            ..self.current
        }
    }
}
