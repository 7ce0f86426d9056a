use std::time::{Duration, Instant};

use tracing::debug;

const REPORT_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct NetStats {
    pub ingress_bytes: u64,
    pub egress_bytes: u64,
    pub snapshots_sent: u64,
    pub inputs_applied: u64,
    pub inputs_rejected: u64,
    window_start: Instant,
    window_ingress: u64,
    window_egress: u64,
}

impl NetStats {
    pub fn new() -> Self {
        Self {
            ingress_bytes: 0,
            egress_bytes: 0,
            snapshots_sent: 0,
            inputs_applied: 0,
            inputs_rejected: 0,
            window_start: Instant::now(),
            window_ingress: 0,
            window_egress: 0,
        }
    }

    pub fn note_ingress_bytes(&mut self, bytes: usize) {
        self.ingress_bytes = self.ingress_bytes.saturating_add(bytes as u64);
        self.window_ingress = self.window_ingress.saturating_add(bytes as u64);
    }

    pub fn note_egress_bytes(&mut self, bytes: usize) {
        self.egress_bytes = self.egress_bytes.saturating_add(bytes as u64);
        self.window_egress = self.window_egress.saturating_add(bytes as u64);
    }

    pub fn log_if_ready(&mut self) {
        let elapsed = self.window_start.elapsed();
        if elapsed < REPORT_INTERVAL {
            return;
        }

        let secs = elapsed.as_secs_f64();
        debug!(
            ingress_bps = self.window_ingress as f64 / secs,
            egress_bps = self.window_egress as f64 / secs,
            snapshots = self.snapshots_sent,
            inputs_applied = self.inputs_applied,
            inputs_rejected = self.inputs_rejected,
            "network rates"
        );

        self.window_start = Instant::now();
        self.window_ingress = 0;
        self.window_egress = 0;
    }
}

impl Default for NetStats {
    fn default() -> Self {
        Self::new()
    }
}
