//! Configuration types for the simulation.

use serde::{Deserialize, Serialize};

/// Successful moves an alien may make before it is considered exhausted.
pub const DEFAULT_MAX_MOVES: u32 = 10_000;

/// Simulation run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of alien invaders to unleash upon the world
    pub aliens: usize,
    /// Move cap after which an alien is marked trapped (exhausted)
    pub max_moves: u32,
    /// Hard ceiling on turns, in case an invariant breaks elsewhere
    pub max_turns: u64,
    /// Seed for every per-alien random stream, for reproducible runs
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            aliens: 2,
            max_moves: DEFAULT_MAX_MOVES,
            max_turns: DEFAULT_MAX_MOVES as u64,
            seed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.aliens, 2);
        assert_eq!(config.max_moves, 10_000);
        assert_eq!(config.max_turns, 10_000);
        assert_eq!(config.seed, 0);
    }

    #[test]
    fn test_config_serialization() {
        let config = SimulationConfig {
            aliens: 5,
            seed: 42,
            ..SimulationConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.aliens, 5);
        assert_eq!(deserialized.seed, 42);
        assert_eq!(deserialized.max_moves, config.max_moves);
    }
}
