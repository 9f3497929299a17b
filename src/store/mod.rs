//! Read/write contract for agent, system and probe records.
//!
//! The engine does not pick a storage technology. Implementations must make
//! every `update_*` call atomic for the record it touches: the closure sees
//! the current record and its changes are committed only if it returns `Ok`.

pub mod memory;

pub use memory::MemoryStore;

use crate::coords::SystemCoord;
use crate::error::Result;
use crate::universe::{AgentRecord, ProbeRecord, ProbeStatus, SystemRecord};

pub type AgentUpdate<'a> = &'a mut dyn FnMut(&mut AgentRecord) -> Result<()>;
pub type SystemUpdate<'a> = &'a mut dyn FnMut(&mut SystemRecord) -> Result<()>;
pub type ProbeUpdate<'a> = &'a mut dyn FnMut(&mut ProbeRecord) -> Result<()>;

pub trait NavigationStore: Send + Sync {
    fn agent(&self, id: &str) -> Result<Option<AgentRecord>>;

    fn put_agent(&self, agent: AgentRecord) -> Result<()>;

    /// Atomically modify an existing agent; fails with `NotFound` if absent.
    fn update_agent(&self, id: &str, update: AgentUpdate<'_>) -> Result<AgentRecord>;

    fn system(&self, coordinates: SystemCoord) -> Result<Option<SystemRecord>>;

    fn put_system(&self, system: SystemRecord) -> Result<()>;

    /// Atomically modify a system, creating an empty record first if needed.
    fn update_system(&self, coordinates: SystemCoord, update: SystemUpdate<'_>)
        -> Result<SystemRecord>;

    /// Remove a probe from the presence sets of every system. Returns the
    /// number of systems that listed it.
    fn purge_probe_presence(&self, probe_id: &str) -> Result<usize>;

    fn probe(&self, id: &str) -> Result<Option<ProbeRecord>>;

    fn put_probe(&self, probe: ProbeRecord) -> Result<()>;

    fn update_probe(&self, id: &str, update: ProbeUpdate<'_>) -> Result<ProbeRecord>;

    /// Probes with the given status, ordered by id.
    fn probes_with_status(&self, status: ProbeStatus) -> Result<Vec<ProbeRecord>>;

    /// Allocate a fresh probe identifier.
    fn next_probe_id(&self) -> Result<String>;
}
