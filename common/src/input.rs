use glam::{Vec3, vec3};
use serde::{Deserialize, Serialize};

// `jump_edge` is only true on the sample where jump was newly pressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputFrame {
    pub move_x: f32,
    pub move_y: f32,
    pub boost: bool,
    pub jump_edge: bool,
    pub seq: u32,
}

impl InputFrame {
    // Last write wins except `jump_edge`, which holds until a tick consumes it.
    pub fn absorb(&mut self, incoming: &InputFrame) {
        self.move_x = sanitize_axis(incoming.move_x);
        self.move_y = sanitize_axis(incoming.move_y);
        self.boost = incoming.boost;
        self.jump_edge |= incoming.jump_edge;
        self.seq = incoming.seq;
    }

    pub fn take_jump(&mut self) -> bool {
        std::mem::take(&mut self.jump_edge)
    }

    // Unit-length (or zero) horizontal wish direction. `move_y` is forward,
    // which is -z in world space.
    pub fn wish_direction(&self) -> Vec3 {
        let wish = vec3(sanitize_axis(self.move_x), 0.0, -sanitize_axis(self.move_y));
        if wish.length_squared() > 1e-6 {
            wish.normalize()
        } else {
            Vec3::ZERO
        }
    }
}

// NaN from a misbehaving peer would poison the body forever.
fn sanitize_axis(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Controls {
    pub move_x: f32,
    pub move_y: f32,
    pub boost: bool,
    pub jump: bool, // Held, not edge.
}

impl Controls {
    pub fn to_frame(&self, jump_edge: bool, seq: u32) -> InputFrame {
        InputFrame {
            move_x: sanitize_axis(self.move_x),
            move_y: sanitize_axis(self.move_y),
            boost: self.boost,
            jump_edge,
            seq,
        }
    }
}

pub trait InputSource {
    fn sample(&mut self, elapsed_ms: f64) -> Controls;
}

// Turns a held button into a press edge.
#[derive(Clone, Copy, Debug, Default)]
pub struct JumpLatch {
    held: bool,
}

impl JumpLatch {
    pub fn edge(&mut self, held: bool) -> bool {
        let pressed = held && !self.held;
        self.held = held;
        pressed
    }
}
