use tracing::debug;

use crate::config::SimConfig;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tick {
    pub index: u64,
    pub dt: f32,
    // Simulated clock after this tick, in milliseconds.
    pub now_ms: f64,
}

// Past `max_substeps` the remainder stays in the accumulator and the
// simulation runs slow rather than piling up catch-up ticks.
#[derive(Clone, Debug)]
pub struct Scheduler {
    dt: f32,
    max_substeps: u32,
    max_frame_ms: f64,
    accumulator: f64, // Seconds.
    tick: u64,
    sim_time_ms: f64,
}

impl Scheduler {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            dt: config.tick_secs(),
            max_substeps: config.max_substeps.max(1),
            max_frame_ms: config.max_frame_ms,
            accumulator: 0.0,
            tick: 0,
            sim_time_ms: 0.0,
        }
    }

    pub fn advance<F>(&mut self, elapsed_real_ms: f64, mut run_tick: F) -> u32
    where
        F: FnMut(Tick),
    {
        let elapsed_ms = if elapsed_real_ms.is_finite() {
            elapsed_real_ms.clamp(0.0, self.max_frame_ms)
        } else {
            0.0
        };
        self.accumulator += elapsed_ms / 1000.0;

        let dt = self.dt as f64;
        let mut ticks_this_frame = 0;
        while self.accumulator >= dt && ticks_this_frame < self.max_substeps {
            self.tick += 1;
            self.sim_time_ms += dt * 1000.0;
            run_tick(Tick {
                index: self.tick,
                dt: self.dt,
                now_ms: self.sim_time_ms,
            });
            self.accumulator -= dt;
            ticks_this_frame += 1;
        }

        if self.accumulator >= dt {
            debug!(
                backlog_ms = self.accumulator * 1000.0,
                "substep limit reached; simulation running behind"
            );
        }

        ticks_this_frame
    }

    pub fn now_ms(&self) -> f64 {
        self.sim_time_ms
    }
}
