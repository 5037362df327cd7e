//! Engine-wide tuning knobs (spec §5, §9 — the fallback penalty and the
//! depth cap are product policy, not derived constants, so they live here
//! rather than hard-coded in the algorithm).

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Default final-hop beam width `k`.
    pub default_k: usize,
    /// `k_explore = explore_multiplier * k` unless the caller overrides it.
    pub explore_multiplier: usize,
    /// Maximum traversal depth (spec §5): 4.
    pub max_depth: u32,
    /// Safety cap on candidates materialised per hop before truncation.
    pub max_candidates_per_hop: usize,
    /// Fixed penalty factor applied to "no path found" fallback candidates.
    pub no_path_penalty: f32,
    /// Overall per-query deadline.
    pub deadline: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            default_k: 5,
            explore_multiplier: 3,
            max_depth: 4,
            max_candidates_per_hop: 1000,
            no_path_penalty: 0.5,
            deadline: Duration::from_secs(5),
        }
    }
}

impl EngineConfig {
    pub fn default_k_explore(&self) -> usize {
        self.explore_multiplier * self.default_k
    }

    /// Reads tuning knobs from the environment, falling back to [`Default`]
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        EngineConfig {
            default_k: read_usize_env("QP_DEFAULT_K").unwrap_or(defaults.default_k),
            explore_multiplier: read_usize_env("QP_EXPLORE_MULTIPLIER").unwrap_or(defaults.explore_multiplier),
            max_depth: read_usize_env("QP_MAX_DEPTH").map(|v| v as u32).unwrap_or(defaults.max_depth),
            max_candidates_per_hop: read_usize_env("QP_MAX_CANDIDATES_PER_HOP").unwrap_or(defaults.max_candidates_per_hop),
            no_path_penalty: read_f32_env("QP_NO_PATH_PENALTY").unwrap_or(defaults.no_path_penalty),
            deadline: read_usize_env("QP_DEADLINE_MS").map(|ms| Duration::from_millis(ms as u64)).unwrap_or(defaults.deadline),
        }
    }
}

fn read_usize_env(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn read_f32_env(key: &str) -> Option<f32> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
