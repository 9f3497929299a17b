use std::env;
use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use log::{info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use starnav_engine::collision::{check_collision, CollisionInfo};
use starnav_engine::config::EngineConfig;
use starnav_engine::coords::{parse_position, system_of, Direction, SystemCoord};
use starnav_engine::course::{plot_course, NavigationPath, NavigationStep};
use starnav_engine::data::read_snapshot_from_file;
use starnav_engine::movement::{
    advance_autopilot, jump_agent, move_agent, AutopilotState, MovementResult,
};
use starnav_engine::probe::{
    active_probes, launch_probe, recall_probe, LoggingObserver, ProbeScheduler,
};
use starnav_engine::store::{MemoryStore, NavigationStore};
use starnav_engine::universe::{AgentRecord, BodyKind, ProbeRecord, StaticBody, SystemRecord};
use starnav_engine::{NavError, Position};

const UNIVERSE_PATH_ENV: &str = "STARNAV_UNIVERSE_PATH";

struct Engine {
    store: Arc<MemoryStore>,
    config: EngineConfig,
}

static ENGINE: Lazy<Engine> = Lazy::new(|| {
    let config = EngineConfig::from_env();
    let store = match env::var(UNIVERSE_PATH_ENV) {
        Ok(path) => match read_snapshot_from_file(&path) {
            Ok(snapshot) => {
                info!(
                    "Loaded universe from {path} ({} systems, {} agents)",
                    snapshot.systems.len(),
                    snapshot.agents.len()
                );
                MemoryStore::from_snapshot(snapshot)
            }
            Err(err) => {
                warn!("Failed to load universe from {path}: {err}; using demo universe");
                demo_universe(&config)
            }
        },
        Err(_) => demo_universe(&config),
    };
    Engine {
        store: Arc::new(store),
        config,
    }
});

// Tiny demo universe; point STARNAV_UNIVERSE_PATH at a built snapshot in production.
fn demo_universe(config: &EngineConfig) -> MemoryStore {
    let store = MemoryStore::new();
    let body = |id: &str, kind, name: &str, position, size| StaticBody {
        id: id.into(),
        kind,
        name: name.into(),
        position,
        size,
    };

    let mut home = SystemRecord::empty(SystemCoord::new(0, 0, 0));
    home.static_bodies = vec![
        body("helios", BodyKind::Star, "Helios", Position::new(0.2, 0.2, 0.2), 25.0),
        body("tethys", BodyKind::Planet, "Tethys", Position::new(0.4, 0.1, 0.3), 16.0),
    ];
    home.presence.add_ship("demo");

    let mut neighbour = SystemRecord::empty(SystemCoord::new(1, 0, 0));
    neighbour.static_bodies = vec![
        body("waypoint", BodyKind::Station, "Waypoint", Position::new(1.2, 0.2, 0.2), 1.0),
        body("grit", BodyKind::Asteroid, "Grit", Position::new(1.4, 0.4, 0.0), 4.0),
    ];

    let seeded = [home, neighbour]
        .into_iter()
        .try_for_each(|system| store.put_system(system))
        .and_then(|_| {
            store.put_agent(AgentRecord {
                id: "demo".into(),
                position: Position::new(0.0, 0.0, 0.0),
                fuel: 50,
                max_fuel: 50,
                probes: config.starting_probes,
                docked: false,
            })
        });
    if let Err(err) = seeded {
        warn!("Failed to seed demo universe: {err}");
    }
    store
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum EngineRequest {
    Plot {
        agent_id: String,
        from: String,
        to: String,
    },
    Autopilot {
        agent_id: String,
        path: Vec<NavigationStep>,
    },
    CheckCollision {
        agent_id: String,
        coordinates: String,
    },
    Move {
        agent_id: String,
        direction: String,
    },
    Jump {
        agent_id: String,
        direction: String,
    },
    LaunchProbe {
        agent_id: String,
        direction: String,
    },
    RecallProbe {
        agent_id: String,
        probe_id: String,
    },
    ActiveProbes,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum EngineResponse {
    Plot {
        path: NavigationPath,
    },
    Autopilot {
        state: AutopilotState,
        movement: Option<MovementResult>,
        remaining: Vec<NavigationStep>,
        error: Option<String>,
    },
    Collision {
        system: SystemCoord,
        collision: CollisionInfo,
    },
    Movement {
        result: MovementResult,
    },
    Probe {
        probe: ProbeRecord,
    },
    Probes {
        probes: Vec<ProbeRecord>,
    },
    Error {
        code: &'static str,
        message: String,
    },
}

fn dispatch(engine: &Engine, request: EngineRequest) -> Result<EngineResponse, NavError> {
    let store: &dyn NavigationStore = &*engine.store;
    let policy = engine.config.collision_policy;
    match request {
        EngineRequest::Plot { agent_id, from, to } => {
            info!("Plotting course for {agent_id}: {from} -> {to}");
            let path = plot_course(&from, &to)?;
            Ok(EngineResponse::Plot { path })
        }
        EngineRequest::Autopilot { agent_id, path } => {
            let report = advance_autopilot(store, &agent_id, path, policy);
            Ok(EngineResponse::Autopilot {
                state: report.state,
                movement: report.movement,
                remaining: report.remaining,
                error: report.error.map(|e| e.to_string()),
            })
        }
        EngineRequest::CheckCollision {
            agent_id,
            coordinates,
        } => {
            if store.agent(&agent_id)?.is_none() {
                return Err(NavError::not_found("agent", agent_id));
            }
            let target = parse_position(&coordinates)?;
            let collision = check_collision(store, &target)?;
            Ok(EngineResponse::Collision {
                system: system_of(&target),
                collision,
            })
        }
        EngineRequest::Move {
            agent_id,
            direction,
        } => {
            let direction: Direction = direction.parse()?;
            let result = move_agent(store, &agent_id, direction, policy)?;
            Ok(EngineResponse::Movement { result })
        }
        EngineRequest::Jump {
            agent_id,
            direction,
        } => {
            let direction: Direction = direction.parse()?;
            let result = jump_agent(store, &agent_id, direction, policy)?;
            Ok(EngineResponse::Movement { result })
        }
        EngineRequest::LaunchProbe {
            agent_id,
            direction,
        } => {
            let direction: Direction = direction.parse()?;
            let probe = launch_probe(store, &agent_id, direction, engine.config.probe_max_fuel)?;
            Ok(EngineResponse::Probe { probe })
        }
        EngineRequest::RecallProbe { agent_id, probe_id } => {
            let probe = recall_probe(store, &agent_id, &probe_id)?;
            Ok(EngineResponse::Probe { probe })
        }
        EngineRequest::ActiveProbes => Ok(EngineResponse::Probes {
            probes: active_probes(store)?,
        }),
    }
}

fn respond(engine: &Engine, request: EngineRequest) -> EngineResponse {
    match dispatch(engine, request) {
        Ok(response) => response,
        Err(err) => {
            warn!("request rejected: {err}");
            EngineResponse::Error {
                code: err.kind(),
                message: err.to_string(),
            }
        }
    }
}

async fn handler(event: LambdaEvent<EngineRequest>) -> Result<EngineResponse, Error> {
    Ok(respond(&ENGINE, event.payload))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let engine = &*ENGINE;
    let scheduler = ProbeScheduler::new(
        engine.store.clone(),
        Arc::new(LoggingObserver),
        engine.config.probe_tick_interval,
    )
    .spawn();

    let func = service_fn(handler);
    let served = lambda_runtime::run(func).await;
    scheduler.shutdown().await?;
    served
}
