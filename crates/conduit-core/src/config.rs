//! Engine configuration.
//!
//! Values are stored as plain numbers so configuration files stay readable;
//! the engine converts them to [`Fixed64`] once at construction. Every field
//! has a default, so an empty document is a valid configuration.

use crate::fixed::{Fixed64, Ticks, f64_to_fixed64, tick_seconds};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("tick_rate must be positive")]
    ZeroTickRate,
    #[error("{field} must be finite and non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} = {value} does not fit the fixed-point range")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("max_transitions_per_tick must be at least 1")]
    ZeroTransitions,
    #[error("capture distance {capture} exceeds suction range {range}")]
    CaptureBeyondRange { capture: f64, range: f64 },
}

fn default_tick_rate() -> u32 {
    60
}
fn default_friction() -> f64 {
    0.1
}
fn default_min_follow_speed() -> f64 {
    0.5
}
fn default_max_transitions() -> u32 {
    8
}
fn default_event_capacity() -> usize {
    1024
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Ticks per second.
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    /// Friction for conduits placed without an explicit value.
    #[serde(default = "default_friction")]
    pub default_friction: f64,
    /// Speed floor for in-transit items.
    #[serde(default = "default_min_follow_speed")]
    pub min_follow_speed: f64,
    /// Segment changes allowed per item per tick.
    #[serde(default = "default_max_transitions")]
    pub max_transitions_per_tick: u32,
    /// Seed for junction routing and suction picks.
    #[serde(default)]
    pub seed: u64,
    /// Per-kind event buffer capacity.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    #[serde(default)]
    pub suction: SuctionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_rate: default_tick_rate(),
            default_friction: default_friction(),
            min_follow_speed: default_min_follow_speed(),
            max_transitions_per_tick: default_max_transitions(),
            seed: 0,
            event_capacity: default_event_capacity(),
            suction: SuctionConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if self.max_transitions_per_tick == 0 {
            return Err(ConfigError::ZeroTransitions);
        }
        for (field, value) in [
            ("default_friction", self.default_friction),
            ("min_follow_speed", self.min_follow_speed),
            ("suction.range", self.suction.range),
            ("suction.capture_distance", self.suction.capture_distance),
            ("suction.insert_speed", self.suction.insert_speed),
            ("suction.impulse", self.suction.impulse),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
            if Fixed64::checked_from_num(value).is_none() {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }
        // The floor keeps items moving against friction.
        if self.min_follow_speed <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "min_follow_speed",
                value: self.min_follow_speed,
            });
        }
        if self.suction.capture_distance > self.suction.range {
            return Err(ConfigError::CaptureBeyondRange {
                capture: self.suction.capture_distance,
                range: self.suction.range,
            });
        }
        Ok(())
    }

    pub fn dt(&self) -> Fixed64 {
        tick_seconds(self.tick_rate)
    }

    pub fn base_friction(&self) -> Fixed64 {
        f64_to_fixed64(self.default_friction)
    }

    pub fn min_speed(&self) -> Fixed64 {
        f64_to_fixed64(self.min_follow_speed)
    }
}

fn default_range() -> f64 {
    5.0
}
fn default_capture_distance() -> f64 {
    1.0
}
fn default_cooldown() -> Ticks {
    60
}
fn default_insert_speed() -> f64 {
    1.0
}
fn default_impulse() -> f64 {
    2.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuctionConfig {
    #[serde(default = "default_range")]
    pub range: f64,
    #[serde(default = "default_capture_distance")]
    pub capture_distance: f64,
    #[serde(default = "default_cooldown")]
    pub cooldown_ticks: Ticks,
    /// Speed given to captured items.
    #[serde(default = "default_insert_speed")]
    pub insert_speed: f64,
    /// Magnitude of the push applied on every contact.
    #[serde(default = "default_impulse")]
    pub impulse: f64,
}

impl Default for SuctionConfig {
    fn default() -> Self {
        Self {
            range: default_range(),
            capture_distance: default_capture_distance(),
            cooldown_ticks: default_cooldown(),
            insert_speed: default_insert_speed(),
            impulse: default_impulse(),
        }
    }
}
