//! Fixed-interval advancement of autonomous probes.
//!
//! One task owns the loop. Each tick processes every active probe in id
//! order and finishes before the next interval is awaited, so ticks never
//! overlap and no two probes write the same system record at once.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::coords::{edge_entry_point, system_of, SystemCoord};
use crate::error::{NavError, Result};
use crate::store::NavigationStore;
use crate::universe::{ProbeRecord, ProbeStatus, StaticBody};
use crate::Position;

use super::now_millis;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlayerSighting {
    pub id: String,
    pub position: Position,
}

/// What a probe sees on arrival: static bodies and undocked players.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SystemSnapshot {
    pub coordinates: SystemCoord,
    pub static_bodies: Vec<StaticBody>,
    pub players: Vec<PlayerSighting>,
}

/// Collaborators told about probe arrivals: exploration tracking and
/// external reporting.
pub trait ProbeObserver: Send + Sync {
    fn system_explored(&self, owner_id: &str, system: SystemCoord);

    fn system_snapshot(&self, probe: &ProbeRecord, snapshot: &SystemSnapshot);
}

/// Observer that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl ProbeObserver for LoggingObserver {
    fn system_explored(&self, owner_id: &str, system: SystemCoord) {
        debug!("{owner_id} explored system {system}");
    }

    fn system_snapshot(&self, probe: &ProbeRecord, snapshot: &SystemSnapshot) {
        debug!(
            "{} reports system {}: {} bodies, {} players",
            probe.id,
            snapshot.coordinates,
            snapshot.static_bodies.len(),
            snapshot.players.len()
        );
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TickSummary {
    pub advanced: usize,
    pub destroyed: Vec<String>,
    pub failed: usize,
}

pub fn system_snapshot(
    store: &dyn NavigationStore,
    coordinates: SystemCoord,
) -> Result<SystemSnapshot> {
    let Some(system) = store.system(coordinates)? else {
        return Ok(SystemSnapshot {
            coordinates,
            static_bodies: Vec::new(),
            players: Vec::new(),
        });
    };

    let mut players = Vec::new();
    for ship in &system.presence.ships {
        if let Some(agent) = store.agent(ship)? {
            if !agent.docked {
                players.push(PlayerSighting {
                    id: agent.id,
                    position: agent.position,
                });
            }
        }
    }

    Ok(SystemSnapshot {
        coordinates,
        static_bodies: system.static_bodies,
        players,
    })
}

pub struct ProbeScheduler {
    store: Arc<dyn NavigationStore>,
    observer: Arc<dyn ProbeObserver>,
    period: Duration,
}

impl ProbeScheduler {
    pub fn new(
        store: Arc<dyn NavigationStore>,
        observer: Arc<dyn ProbeObserver>,
        period: Duration,
    ) -> Self {
        ProbeScheduler {
            store,
            observer,
            period,
        }
    }

    /// Advance every active probe by one system jump.
    ///
    /// A failure on one probe is logged and counted; the others still move.
    pub fn tick(&self) -> TickSummary {
        let mut summary = TickSummary::default();
        let probes = match self.store.probes_with_status(ProbeStatus::Active) {
            Ok(probes) => probes,
            Err(err) => {
                warn!("probe tick skipped, cannot list active probes: {err}");
                return summary;
            }
        };

        for probe in probes {
            match self.advance_probe(&probe) {
                Ok(updated) => {
                    summary.advanced += 1;
                    if updated.status == ProbeStatus::Destroyed {
                        summary.destroyed.push(updated.id);
                    }
                }
                Err(err) => {
                    warn!("failed to advance {}: {err}", probe.id);
                    summary.failed += 1;
                }
            }
        }

        if summary.advanced > 0 || summary.failed > 0 {
            debug!(
                "probe tick: {} advanced, {} destroyed, {} failed",
                summary.advanced,
                summary.destroyed.len(),
                summary.failed
            );
        }
        summary
    }

    /// Move one probe into the next system along its launch vector.
    pub fn advance_probe(&self, probe: &ProbeRecord) -> Result<ProbeRecord> {
        let store = self.store.as_ref();
        let origin = system_of(&probe.position);

        if probe.fuel == 0 {
            return self.retire(probe);
        }

        let target = origin.offset(probe.direction.unit());
        let landing = edge_entry_point(&probe.position, target);
        let now = now_millis();

        let updated = store.update_probe(&probe.id, &mut |record| {
            if !record.is_active() || record.fuel == 0 {
                return Err(NavError::validation(format!(
                    "probe {} cannot be advanced",
                    record.id
                )));
            }
            record.fuel -= 1;
            record.position = landing;
            record.last_activity = now;
            if record.fuel == 0 {
                record.status = ProbeStatus::Destroyed;
            }
            Ok(())
        })?;

        store.update_system(origin, &mut |system| {
            system.presence.remove_probe(&probe.id);
            Ok(())
        })?;
        if updated.is_active() {
            store.update_system(target, &mut |system| {
                system.presence.add_probe(&probe.id);
                Ok(())
            })?;
        }

        self.observer.system_explored(&updated.owner_id, target);
        let snapshot = system_snapshot(store, target)?;
        self.observer.system_snapshot(&updated, &snapshot);

        if updated.status == ProbeStatus::Destroyed {
            store.purge_probe_presence(&updated.id)?;
            info!(
                "{} ran out of fuel in system {target} and was destroyed",
                updated.id
            );
        }
        Ok(updated)
    }

    fn retire(&self, probe: &ProbeRecord) -> Result<ProbeRecord> {
        let retired = self.store.update_probe(&probe.id, &mut |record| {
            record.status = ProbeStatus::Destroyed;
            Ok(())
        })?;
        self.store.purge_probe_presence(&probe.id)?;
        info!("{} had no fuel left and was destroyed", probe.id);
        Ok(retired)
    }

    /// Start the loop on the current tokio runtime.
    ///
    /// The first tick fires one period after spawning.
    pub fn spawn(self) -> SchedulerHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let mut ticker = interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            info!("probe scheduler started, period {:?}", self.period);

            let mut ticks = 0u64;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        self.tick();
                        ticks += 1;
                    }
                }
            }
            info!("probe scheduler stopped after {ticks} ticks");
            ticks
        });

        SchedulerHandle {
            stop: Some(stop_tx),
            task,
        }
    }
}

/// Owner of a running scheduler loop.
///
/// Dropping the handle also stops the loop at its next wake-up.
pub struct SchedulerHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<u64>,
}

impl SchedulerHandle {
    /// Stop the loop and wait for it to exit. No tick starts after this
    /// returns. Yields the number of ticks that ran.
    pub async fn shutdown(mut self) -> Result<u64> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        (&mut self.task)
            .await
            .map_err(|err| NavError::Internal(format!("probe scheduler task failed: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Direction;
    use crate::probe::launch_probe;
    use crate::store::MemoryStore;
    use crate::universe::{AgentRecord, BodyKind, SystemRecord};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingObserver {
        explored: Mutex<Vec<(String, SystemCoord)>>,
        snapshots: Mutex<Vec<SystemSnapshot>>,
    }

    impl ProbeObserver for RecordingObserver {
        fn system_explored(&self, owner_id: &str, system: SystemCoord) {
            self.explored
                .lock()
                .unwrap()
                .push((owner_id.to_string(), system));
        }

        fn system_snapshot(&self, _probe: &ProbeRecord, snapshot: &SystemSnapshot) {
            self.snapshots.lock().unwrap().push(snapshot.clone());
        }
    }

    fn setup(probes: u32) -> (Arc<MemoryStore>, Arc<RecordingObserver>, ProbeScheduler) {
        let store = Arc::new(MemoryStore::new());
        store
            .put_agent(AgentRecord {
                id: "owner".into(),
                position: Position::new(0.2, 0.2, 0.2),
                fuel: 10,
                max_fuel: 10,
                probes,
                docked: false,
            })
            .unwrap();
        let observer = Arc::new(RecordingObserver::default());
        let scheduler =
            ProbeScheduler::new(store.clone(), observer.clone(), Duration::from_secs(1));
        (store, observer, scheduler)
    }

    fn listed_anywhere(store: &MemoryStore, probe_id: &str) -> bool {
        store
            .snapshot()
            .unwrap()
            .systems
            .iter()
            .any(|s| s.presence.probes.iter().any(|p| p == probe_id))
    }

    #[test]
    fn tick_jumps_one_system_and_moves_presence() {
        let (store, observer, scheduler) = setup(1);
        let probe = launch_probe(&*store, "owner", Direction::East, 3).unwrap();

        let summary = scheduler.tick();
        assert_eq!(summary.advanced, 1);

        let moved = store.probe(&probe.id).unwrap().unwrap();
        assert_eq!(moved.fuel, 2);
        assert_eq!(moved.position, Position::new(1.0, 0.2, 0.2));
        let origin = store.system(SystemCoord::new(0, 0, 0)).unwrap().unwrap();
        let target = store.system(SystemCoord::new(1, 0, 0)).unwrap().unwrap();
        assert!(origin.presence.probes.is_empty());
        assert_eq!(target.presence.probes, vec![probe.id.clone()]);
        assert_eq!(
            observer.explored.lock().unwrap().as_slice(),
            &[("owner".to_string(), SystemCoord::new(1, 0, 0))]
        );
    }

    #[test]
    fn probe_is_destroyed_after_its_last_fuel_unit() {
        let (store, _observer, scheduler) = setup(1);
        let probe = launch_probe(&*store, "owner", Direction::Down, 3).unwrap();

        for tick in 1..=3 {
            let summary = scheduler.tick();
            assert_eq!(summary.advanced, 1, "tick {tick}");
            let current = store.probe(&probe.id).unwrap().unwrap();
            if tick < 3 {
                assert_eq!(current.status, ProbeStatus::Active);
                assert!(listed_anywhere(&store, &probe.id));
            } else {
                assert_eq!(summary.destroyed, vec![probe.id.clone()]);
                assert_eq!(current.status, ProbeStatus::Destroyed);
                assert_eq!(current.fuel, 0);
                assert_eq!(system_of(&current.position), SystemCoord::new(0, 0, -3));
            }
        }

        assert!(!listed_anywhere(&store, &probe.id));
        assert_eq!(scheduler.tick(), TickSummary::default());
        assert_eq!(store.probe(&probe.id).unwrap().unwrap().fuel, 0);
    }

    #[test]
    fn probes_are_independent() {
        let (store, _observer, scheduler) = setup(2);
        let a = launch_probe(&*store, "owner", Direction::North, 1).unwrap();
        let b = launch_probe(&*store, "owner", Direction::South, 4).unwrap();

        let summary = scheduler.tick();
        assert_eq!(summary.advanced, 2);
        assert_eq!(summary.destroyed, vec![a.id.clone()]);
        let b_now = store.probe(&b.id).unwrap().unwrap();
        assert_eq!(b_now.fuel, 3);
        assert_eq!(system_of(&b_now.position), SystemCoord::new(0, -1, 0));
    }

    #[test]
    fn snapshot_lists_bodies_and_undocked_players() {
        let (store, observer, scheduler) = setup(1);
        let mut target = SystemRecord::empty(SystemCoord::new(0, 0, 1));
        target.static_bodies.push(StaticBody {
            id: "giant".into(),
            kind: BodyKind::Planet,
            name: "Giant".into(),
            position: Position::new(0.3, 0.3, 1.3),
            size: 40.0,
        });
        target.presence.add_ship("flyer");
        target.presence.add_ship("dockhand");
        store.put_system(target).unwrap();
        for (id, docked) in [("flyer", false), ("dockhand", true)] {
            store
                .put_agent(AgentRecord {
                    id: id.into(),
                    position: Position::new(0.1, 0.1, 1.1),
                    fuel: 1,
                    max_fuel: 1,
                    probes: 0,
                    docked,
                })
                .unwrap();
        }

        launch_probe(&*store, "owner", Direction::Up, 2).unwrap();
        scheduler.tick();

        let snapshots = observer.snapshots.lock().unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].static_bodies.len(), 1);
        let players: Vec<&str> = snapshots[0].players.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(players, vec!["flyer"]);
    }

    #[test]
    fn recalled_probes_are_not_ticked() {
        let (store, _observer, scheduler) = setup(1);
        let probe = launch_probe(&*store, "owner", Direction::West, 5).unwrap();
        crate::probe::recall_probe(&*store, "owner", &probe.id).unwrap();

        assert_eq!(scheduler.tick().advanced, 0);
        assert_eq!(store.probe(&probe.id).unwrap().unwrap().fuel, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_loop_ticks_once_per_period_until_shutdown() {
        let (store, _observer, scheduler) = setup(1);
        let probe = launch_probe(&*store, "owner", Direction::East, 10).unwrap();

        let handle = scheduler.spawn();
        tokio::time::sleep(Duration::from_millis(3500)).await;
        let ticks = handle.shutdown().await.expect("shutdown");

        assert_eq!(ticks, 3);
        let probe = store.probe(&probe.id).unwrap().unwrap();
        assert_eq!(probe.fuel, 7);
        assert_eq!(system_of(&probe.position), SystemCoord::new(3, 0, 0));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(store.probe(&probe.id).unwrap().unwrap().fuel, 7);
    }
}
