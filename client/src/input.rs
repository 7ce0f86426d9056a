use common::{
    input::{Controls, InputFrame, JumpLatch},
    time::Cadence,
};

// A jump pressed between sends rides on the next outgoing frame, delivered
// or not.
#[derive(Debug)]
pub struct InputChannel {
    cadence: Cadence,
    latch: JumpLatch,
    seq: u32,
    pending_jump: bool,
    latest: Controls,
}

impl InputChannel {
    pub fn new(send_rate_hz: f32) -> Self {
        Self {
            cadence: Cadence::from_rate(send_rate_hz),
            latch: JumpLatch::default(),
            seq: 0,
            pending_jump: false,
            latest: Controls::default(),
        }
    }

    // Records this frame's controls and returns the frame local prediction
    // should use. Its `jump_edge` is set only on the frame jump went down.
    pub fn sample(&mut self, controls: &Controls) -> InputFrame {
        let jump_edge = self.latch.edge(controls.jump);
        self.pending_jump |= jump_edge;
        self.latest = *controls;
        controls.to_frame(jump_edge, self.seq)
    }

    pub fn poll_send(&mut self, elapsed_ms: f64) -> Option<InputFrame> {
        if !self.cadence.ready(elapsed_ms) {
            return None;
        }

        self.seq = self.seq.wrapping_add(1);
        let jump_edge = std::mem::take(&mut self.pending_jump);
        Some(self.latest.to_frame(jump_edge, self.seq))
    }
}
