// Simulation:
pub const TICK_RATE: f32 = 60.0;
pub const MAX_SUBSTEPS: u32 = 3; // Spiral-of-death guard: at most 50ms of simulation per frame.
pub const MAX_FRAME_MS: f64 = 50.0; // Longer frames are clamped before accumulating.

// Networking:
pub const INPUT_SEND_RATE: f32 = 30.0; // Hz.
pub const SNAPSHOT_RATE: f32 = 15.0; // Hz.
pub const RECONCILIATION_ALPHA: f32 = 0.25;
pub const INTERPOLATION_DELAY_MS: f64 = 120.0;
pub const INTERPOLATION_BUFFER_LENGTH: usize = 30; // 2s of snapshots at 15Hz.

// Host:
pub const MAX_PLAYERS: usize = 10;
pub const MAX_INPUT_MESSAGES_PER_FRAME: u32 = 128;
pub const MAX_OVER_CAP_STRIKES: u8 = 8;
