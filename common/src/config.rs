use std::{env, net::SocketAddr};

use glam::{Vec3, vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    INPUT_SEND_RATE, INTERPOLATION_BUFFER_LENGTH, INTERPOLATION_DELAY_MS, MAX_FRAME_MS,
    MAX_SUBSTEPS, RECONCILIATION_ALPHA, SNAPSHOT_RATE, TICK_RATE,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    // Scheduler.
    pub tick_rate: f32,
    pub max_substeps: u32,
    pub max_frame_ms: f64,

    // Body and ground.
    pub mass: f32,
    pub body_radius: f32,
    pub ground_level: f32,
    pub grounded_epsilon: f32,
    pub coyote_window_ms: f64,
    pub fall_threshold: f32,
    pub spawn_points: Vec<Vec3>,

    // Stamina.
    pub stamina_drain_rate: f32, // Units per second while boosting.
    pub recharge_duration_ms: f64, // Time to refill from 0 to 100.
    pub tired_multiplier: f32,

    // Movement.
    pub max_normal_speed: f32,
    pub max_boost_speed: f32,
    pub max_move_force: f32,
    pub max_boost_force: f32,
    pub air_control_multiplier: f32,
    pub braking_force: f32,
    pub overspeed_decay: f32, // Per tick, applied when over the cap without boosting.
    pub jump_impulse: f32,

    // Default physics step.
    pub gravity: Vec3,
    pub restitution: f32,
    pub ground_friction: f32,
    pub impact_threshold: f32,
    pub platform_half_extent: f32,

    // Sync.
    pub input_send_rate: f32,
    pub snapshot_rate: f32,
    pub reconciliation_alpha: f32,
    pub interpolation_delay_ms: f64,
    pub interpolation_buffer_length: usize,
}

impl SimConfig {
    pub fn tick_secs(&self) -> f32 {
        1.0 / self.tick_rate
    }

    pub fn spawn_point(&self, slot: usize) -> Vec3 {
        if self.spawn_points.is_empty() {
            return vec3(0.0, self.ground_level + self.body_radius, 0.0);
        }
        self.spawn_points[slot % self.spawn_points.len()]
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        let spawn_height = 1.0;
        Self {
            tick_rate: TICK_RATE,
            max_substeps: MAX_SUBSTEPS,
            max_frame_ms: MAX_FRAME_MS,

            mass: 1.0,
            body_radius: 0.5,
            ground_level: 0.0,
            grounded_epsilon: 0.05,
            coyote_window_ms: 150.0,
            fall_threshold: -20.0,
            spawn_points: vec![
                vec3(0.0, spawn_height, 0.0),
                vec3(3.0, spawn_height, 0.0),
                vec3(-3.0, spawn_height, 0.0),
                vec3(0.0, spawn_height, 3.0),
                vec3(0.0, spawn_height, -3.0),
                vec3(3.0, spawn_height, 3.0),
                vec3(-3.0, spawn_height, -3.0),
                vec3(3.0, spawn_height, -3.0),
                vec3(-3.0, spawn_height, 3.0),
                vec3(6.0, spawn_height, 0.0),
            ],

            stamina_drain_rate: 20.0,
            recharge_duration_ms: 3000.0,
            tired_multiplier: 0.6,

            max_normal_speed: 8.0,
            max_boost_speed: 14.0,
            max_move_force: 40.0,
            max_boost_force: 70.0,
            air_control_multiplier: 0.35,
            braking_force: 30.0,
            overspeed_decay: 0.92,
            jump_impulse: 7.0,

            gravity: vec3(0.0, -20.0, 0.0),
            restitution: 0.2,
            ground_friction: 1.5,
            impact_threshold: 4.0,
            platform_half_extent: 40.0,

            input_send_rate: INPUT_SEND_RATE,
            snapshot_rate: SNAPSHOT_RATE,
            reconciliation_alpha: RECONCILIATION_ALPHA,
            interpolation_delay_ms: INTERPOLATION_DELAY_MS,
            interpolation_buffer_length: INTERPOLATION_BUFFER_LENGTH,
        }
    }
}

// Matches the key the netcode demo ships with; override with `NETCODE_KEY`.
const DEFAULT_PRIVATE_KEY: [u8; 32] = [
    211, 120, 2, 54, 202, 170, 80, 236, 225, 33, 220, 193, 223, 199, 20, 80, 202, 88, 77, 123, 88,
    129, 160, 222, 33, 251, 99, 37, 145, 18, 199, 199,
];

// Network settings loaded from the environment (and `.env`, if present).
#[derive(Clone, Debug)]
pub struct NetConfig {
    // Address the host binds to and clients connect to.
    pub address: SocketAddr,
    pub log_level: String,
    pub protocol_id: u64,
    pub private_key: [u8; 32],
}

impl NetConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let ip = env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT").unwrap_or_else(|_| "5000".to_string());
        let address = format!("{}:{}", ip, port)
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(format!("{}:{}", ip, port)))?;

        let protocol_id = match env::var("PROTOCOL_ID") {
            Ok(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("PROTOCOL_ID"))?,
            Err(_) => crate::protocol::version(),
        };

        let private_key = match env::var("NETCODE_KEY") {
            Ok(value) => parse_key(&value)?,
            Err(_) => DEFAULT_PRIVATE_KEY,
        };

        Ok(Self {
            address,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            protocol_id,
            private_key,
        })
    }
}

fn parse_key(hex: &str) -> Result<[u8; 32], ConfigError> {
    let hex = hex.trim();
    if hex.len() != 64 || !hex.is_ascii() {
        return Err(ConfigError::InvalidKey);
    }

    let mut key = [0u8; 32];
    for (i, byte) in key.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| ConfigError::InvalidKey)?;
    }
    Ok(key)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid IP or port: {0}")]
    InvalidAddress(String),

    #[error("environment variable {0} is not a valid number")]
    InvalidNumber(&'static str),

    #[error("NETCODE_KEY must be 64 hex characters")]
    InvalidKey,
}
