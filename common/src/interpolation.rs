use std::collections::VecDeque;

use glam::{Quat, Vec3};

use crate::{actor::AuxFlags, snapshot::ActorSnapshot};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InterpolationSample {
    // Host clock of the snapshot this came from, in milliseconds.
    pub received_at: f64,
    pub position: Vec3,
    pub orientation: Quat,
    pub stamina: f32,
    pub tired: bool,
    pub aux: AuxFlags,
}

impl InterpolationSample {
    pub fn from_snapshot(server_time: f64, actor: &ActorSnapshot) -> Self {
        Self {
            received_at: server_time,
            position: actor.position,
            orientation: actor.orientation,
            stamina: actor.stamina,
            tired: actor.tired,
            aux: actor.aux,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
    pub stamina: f32,
    pub tired: bool,
    pub aux: AuxFlags,
}

impl From<&InterpolationSample> for Pose {
    fn from(sample: &InterpolationSample) -> Self {
        Self {
            position: sample.position,
            orientation: sample.orientation,
            stamina: sample.stamina,
            tired: sample.tired,
            aux: sample.aux,
        }
    }
}

#[derive(Clone, Debug)]
pub struct InterpolationBuffer {
    samples: VecDeque<InterpolationSample>,
    capacity: usize,
}

impl InterpolationBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    // Appends in arrival order. A reordered snapshot lands out of time order
    // and briefly pulls the render window backwards; the next in-order one
    // corrects it.
    pub fn push(&mut self, sample: InterpolationSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    // Pose at `target_time`, discarding samples the render clock has moved
    // past. Holds the last known pose when fewer than two samples remain.
    pub fn sample_at(&mut self, target_time: f64) -> Option<Pose> {
        while self.samples.len() >= 2 && self.samples[1].received_at <= target_time {
            self.samples.pop_front();
        }

        match (self.samples.front(), self.samples.get(1)) {
            (Some(a), Some(b)) => {
                let span = (b.received_at - a.received_at).max(1.0);
                let alpha = ((target_time - a.received_at) / span).clamp(0.0, 1.0) as f32;
                Some(Pose {
                    position: a.position.lerp(b.position, alpha),
                    orientation: a.orientation.slerp(b.orientation, alpha),
                    stamina: b.stamina,
                    tired: b.tired,
                    aux: b.aux,
                })
            }
            (Some(only), None) => Some(Pose::from(only)),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
