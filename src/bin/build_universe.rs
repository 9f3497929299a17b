//! Convert a JSON universe description into a compressed snapshot.
//!
//! Usage: `build_universe <seed.json> [output.bin]`

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::{info, warn};
use serde::Serialize;
use starnav_engine::coords::{system_of, SystemCoord};
use starnav_engine::data::{write_snapshot_to_file, UniverseSnapshot, SNAPSHOT_FORMAT_VERSION};
use starnav_engine::universe::{ProbeStatus, SystemRecord};

#[derive(Debug, Serialize)]
struct SnapshotMetadata {
    seed: String,
    format_version: u16,
    systems: usize,
    static_bodies: usize,
    agents: usize,
    active_probes: usize,
    dropped_bodies: usize,
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let Some(seed_path) = args.next().map(PathBuf::from) else {
        bail!("usage: build_universe <seed.json> [output.bin]");
    };
    let output_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data").join("universe.bin"));

    let raw = fs::read_to_string(&seed_path)
        .with_context(|| format!("failed to read seed {}", seed_path.display()))?;
    let seed: UniverseSnapshot = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse seed {}", seed_path.display()))?;

    let (snapshot, dropped_bodies) = normalise(seed);

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).context("failed to create snapshot output directory")?;
    }
    write_snapshot_to_file(&snapshot, &output_path)
        .with_context(|| format!("failed to write snapshot to {}", output_path.display()))?;

    let metadata = SnapshotMetadata {
        seed: seed_path.display().to_string(),
        format_version: SNAPSHOT_FORMAT_VERSION,
        systems: snapshot.systems.len(),
        static_bodies: snapshot.systems.iter().map(|s| s.static_bodies.len()).sum(),
        agents: snapshot.agents.len(),
        active_probes: snapshot
            .probes
            .iter()
            .filter(|p| p.status == ProbeStatus::Active)
            .count(),
        dropped_bodies,
    };
    let metadata_path = output_path.with_extension("meta.json");
    fs::write(&metadata_path, serde_json::to_vec_pretty(&metadata)?)
        .with_context(|| format!("failed to write metadata to {}", metadata_path.display()))?;

    info!(
        "Wrote universe snapshot to {} ({} systems, {} bodies, {} agents)",
        output_path.display(),
        metadata.systems,
        metadata.static_bodies,
        metadata.agents
    );
    Ok(())
}

/// Drop bodies lying outside their system and rebuild presence sets from
/// agent and probe positions.
fn normalise(seed: UniverseSnapshot) -> (UniverseSnapshot, usize) {
    let mut dropped = 0usize;
    let mut systems: BTreeMap<SystemCoord, SystemRecord> = BTreeMap::new();

    for mut system in seed.systems {
        let coordinates = system.coordinates;
        system.static_bodies.retain(|body| {
            let inside = system_of(&body.position) == coordinates;
            if !inside {
                warn!(
                    "Dropping body {} at {}: outside system {coordinates}",
                    body.id, body.position
                );
                dropped += 1;
            }
            inside
        });
        system.presence.ships.clear();
        system.presence.probes.clear();
        systems.insert(coordinates, system);
    }

    for agent in &seed.agents {
        let coordinates = system_of(&agent.position);
        systems
            .entry(coordinates)
            .or_insert_with(|| SystemRecord::empty(coordinates))
            .presence
            .add_ship(&agent.id);
    }
    for probe in seed.probes.iter().filter(|p| p.is_active()) {
        let coordinates = system_of(&probe.position);
        systems
            .entry(coordinates)
            .or_insert_with(|| SystemRecord::empty(coordinates))
            .presence
            .add_probe(&probe.id);
    }

    let snapshot = UniverseSnapshot {
        systems: systems.into_values().collect(),
        agents: seed.agents,
        probes: seed.probes,
        next_probe_id: seed.next_probe_id,
    };
    (snapshot, dropped)
}
