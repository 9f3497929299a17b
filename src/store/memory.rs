use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use crate::coords::SystemCoord;
use crate::data::UniverseSnapshot;
use crate::error::{NavError, Result};
use crate::universe::{AgentRecord, ProbeRecord, ProbeStatus, SystemRecord};

use super::{AgentUpdate, NavigationStore, ProbeUpdate, SystemUpdate};

#[derive(Debug, Default)]
struct StoreState {
    agents: HashMap<String, AgentRecord>,
    systems: BTreeMap<SystemCoord, SystemRecord>,
    probes: BTreeMap<String, ProbeRecord>,
    next_probe_id: u64,
}

/// In-process store. A single lock serialises every record update, so two
/// writers touching the same system record cannot lose each other's changes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: UniverseSnapshot) -> Self {
        let state = StoreState {
            agents: snapshot
                .agents
                .into_iter()
                .map(|a| (a.id.clone(), a))
                .collect(),
            systems: snapshot
                .systems
                .into_iter()
                .map(|s| (s.coordinates, s))
                .collect(),
            probes: snapshot
                .probes
                .into_iter()
                .map(|p| (p.id.clone(), p))
                .collect(),
            next_probe_id: snapshot.next_probe_id,
        };
        MemoryStore {
            state: Mutex::new(state),
        }
    }

    pub fn snapshot(&self) -> Result<UniverseSnapshot> {
        let state = self.lock()?;
        let mut agents: Vec<AgentRecord> = state.agents.values().cloned().collect();
        agents.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(UniverseSnapshot {
            systems: state.systems.values().cloned().collect(),
            agents,
            probes: state.probes.values().cloned().collect(),
            next_probe_id: state.next_probe_id,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|_| NavError::Internal("store lock poisoned".into()))
    }
}

impl NavigationStore for MemoryStore {
    fn agent(&self, id: &str) -> Result<Option<AgentRecord>> {
        Ok(self.lock()?.agents.get(id).cloned())
    }

    fn put_agent(&self, agent: AgentRecord) -> Result<()> {
        self.lock()?.agents.insert(agent.id.clone(), agent);
        Ok(())
    }

    fn update_agent(&self, id: &str, update: AgentUpdate<'_>) -> Result<AgentRecord> {
        let mut state = self.lock()?;
        let slot = state
            .agents
            .get_mut(id)
            .ok_or_else(|| NavError::not_found("agent", id))?;
        let mut draft = slot.clone();
        update(&mut draft)?;
        *slot = draft.clone();
        Ok(draft)
    }

    fn system(&self, coordinates: SystemCoord) -> Result<Option<SystemRecord>> {
        Ok(self.lock()?.systems.get(&coordinates).cloned())
    }

    fn put_system(&self, system: SystemRecord) -> Result<()> {
        self.lock()?.systems.insert(system.coordinates, system);
        Ok(())
    }

    fn update_system(
        &self,
        coordinates: SystemCoord,
        update: SystemUpdate<'_>,
    ) -> Result<SystemRecord> {
        let mut state = self.lock()?;
        let mut draft = state
            .systems
            .get(&coordinates)
            .cloned()
            .unwrap_or_else(|| SystemRecord::empty(coordinates));
        update(&mut draft)?;
        state.systems.insert(coordinates, draft.clone());
        Ok(draft)
    }

    fn purge_probe_presence(&self, probe_id: &str) -> Result<usize> {
        let mut state = self.lock()?;
        let mut purged = 0;
        for system in state.systems.values_mut() {
            if system.presence.remove_probe(probe_id) {
                purged += 1;
            }
        }
        Ok(purged)
    }

    fn probe(&self, id: &str) -> Result<Option<ProbeRecord>> {
        Ok(self.lock()?.probes.get(id).cloned())
    }

    fn put_probe(&self, probe: ProbeRecord) -> Result<()> {
        self.lock()?.probes.insert(probe.id.clone(), probe);
        Ok(())
    }

    fn update_probe(&self, id: &str, update: ProbeUpdate<'_>) -> Result<ProbeRecord> {
        let mut state = self.lock()?;
        let slot = state
            .probes
            .get_mut(id)
            .ok_or_else(|| NavError::not_found("probe", id))?;
        let mut draft = slot.clone();
        update(&mut draft)?;
        *slot = draft.clone();
        Ok(draft)
    }

    fn probes_with_status(&self, status: ProbeStatus) -> Result<Vec<ProbeRecord>> {
        Ok(self
            .lock()?
            .probes
            .values()
            .filter(|p| p.status == status)
            .cloned()
            .collect())
    }

    fn next_probe_id(&self) -> Result<String> {
        let mut state = self.lock()?;
        state.next_probe_id += 1;
        Ok(format!("probe-{}", state.next_probe_id))
    }
}
