use std::env;
use std::str::FromStr;
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

pub const PROBE_TICK_ENV: &str = "STARNAV_PROBE_TICK_MS";
pub const PROBE_FUEL_ENV: &str = "STARNAV_PROBE_FUEL";
pub const STARTING_PROBES_ENV: &str = "STARNAV_STARTING_PROBES";
pub const COLLISION_POLICY_ENV: &str = "STARNAV_COLLISION_POLICY";

/// When static-body collisions are evaluated relative to a step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Apply the step, then report the obstruction at the landing point.
    #[default]
    PostMove,
    /// Refuse the step before any record is touched.
    PreMove,
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "post_move" | "post-move" => Ok(CollisionPolicy::PostMove),
            "pre_move" | "pre-move" => Ok(CollisionPolicy::PreMove),
            other => Err(format!("unknown collision policy '{other}'")),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub probe_tick_interval: Duration,
    /// Fuel (and therefore jumps) a freshly launched probe carries.
    pub probe_max_fuel: u32,
    pub starting_probes: u32,
    pub collision_policy: CollisionPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            probe_tick_interval: Duration::from_secs(1),
            probe_max_fuel: 10,
            starting_probes: 3,
            collision_policy: CollisionPolicy::PostMove,
        }
    }
}

impl EngineConfig {
    /// Create configuration from environment variables.
    ///
    /// - `STARNAV_PROBE_TICK_MS`: scheduler interval in milliseconds (default: 1000)
    /// - `STARNAV_PROBE_FUEL`: fuel of a launched probe (default: 10)
    /// - `STARNAV_STARTING_PROBES`: probes carried by new agents (default: 3)
    /// - `STARNAV_COLLISION_POLICY`: `post_move` or `pre_move` (default: `post_move`)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup. Unparseable or
    /// zero values fall back to the default with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let tick_ms = parse_var::<u64, _>(&lookup, PROBE_TICK_ENV).filter(|ms| *ms > 0);
        let probe_max_fuel = parse_var::<u32, _>(&lookup, PROBE_FUEL_ENV)
            .filter(|fuel| *fuel > 0)
            .unwrap_or(defaults.probe_max_fuel);
        let starting_probes =
            parse_var::<u32, _>(&lookup, STARTING_PROBES_ENV).unwrap_or(defaults.starting_probes);
        let collision_policy = parse_var::<CollisionPolicy, _>(&lookup, COLLISION_POLICY_ENV)
            .unwrap_or(defaults.collision_policy);

        Self {
            probe_tick_interval: tick_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.probe_tick_interval),
            probe_max_fuel,
            starting_probes,
            collision_policy,
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring invalid {key}={raw:?}, using default");
            None
        }
    }
}
