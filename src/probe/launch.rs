use log::{info, warn};

use crate::coords::{system_of, Direction};
use crate::error::{NavError, Result};
use crate::store::NavigationStore;
use crate::universe::{ProbeRecord, ProbeStatus};

use super::now_millis;

/// Launch one of the agent's probes along `direction` with a full tank.
///
/// The agent's probe count is debited only once the probe has an id; if
/// registering the probe fails afterwards the slot is handed back.
pub fn launch_probe(
    store: &dyn NavigationStore,
    agent_id: &str,
    direction: Direction,
    max_fuel: u32,
) -> Result<ProbeRecord> {
    if max_fuel == 0 {
        return Err(NavError::validation("probe fuel capacity must be positive"));
    }
    let agent = store
        .agent(agent_id)?
        .ok_or_else(|| NavError::not_found("agent", agent_id))?;
    ensure_probe_carried(agent.probes)?;

    let probe_id = store.next_probe_id()?;
    let agent = store.update_agent(agent_id, &mut |agent| {
        ensure_probe_carried(agent.probes)?;
        agent.probes -= 1;
        Ok(())
    })?;

    let now = now_millis();
    let probe = ProbeRecord {
        id: probe_id,
        owner_id: agent.id.clone(),
        position: agent.position,
        direction,
        fuel: max_fuel,
        max_fuel,
        status: ProbeStatus::Active,
        launched_at: now,
        last_activity: now,
    };
    let origin = system_of(&agent.position);
    let registered = store
        .update_system(origin, &mut |system| {
            system.presence.add_probe(&probe.id);
            Ok(())
        })
        .and_then(|_| store.put_probe(probe.clone()));
    if let Err(err) = registered {
        warn!("launch of {} for {agent_id} failed: {err}", probe.id);
        store.purge_probe_presence(&probe.id)?;
        store.update_agent(agent_id, &mut |agent| {
            agent.probes += 1;
            Ok(())
        })?;
        return Err(err);
    }

    info!(
        "{} launched {} {direction} from {} with {max_fuel} fuel",
        agent.id, probe.id, agent.position
    );
    Ok(probe)
}

fn ensure_probe_carried(carried: u32) -> Result<()> {
    if carried == 0 {
        return Err(NavError::InsufficientResource {
            resource: "probes",
            available: 0,
            required: 1,
        });
    }
    Ok(())
}

/// Bring an active probe home; its slot returns to the owner.
///
/// The owner is credited first, so a missing owner leaves the probe flying.
pub fn recall_probe(
    store: &dyn NavigationStore,
    owner_id: &str,
    probe_id: &str,
) -> Result<ProbeRecord> {
    let probe = store
        .probe(probe_id)?
        .filter(|p| p.owner_id == owner_id)
        .ok_or_else(|| NavError::not_found("probe", probe_id))?;
    if !probe.is_active() {
        return Err(NavError::validation(format!(
            "probe {probe_id} is {:?} and cannot be recalled",
            probe.status
        )));
    }

    store.update_agent(owner_id, &mut |agent| {
        agent.probes += 1;
        Ok(())
    })?;

    let now = now_millis();
    let recalled = match store.update_probe(probe_id, &mut |record| {
        if !record.is_active() {
            return Err(NavError::validation(format!(
                "probe {probe_id} is no longer active"
            )));
        }
        record.status = ProbeStatus::Recalled;
        record.last_activity = now;
        Ok(())
    }) {
        Ok(recalled) => recalled,
        Err(err) => {
            store.update_agent(owner_id, &mut |agent| {
                agent.probes = agent.probes.saturating_sub(1);
                Ok(())
            })?;
            return Err(err);
        }
    };
    store.purge_probe_presence(probe_id)?;

    info!("{owner_id} recalled {probe_id} at {}", recalled.position);
    Ok(recalled)
}

/// All active probes, ordered by id.
pub fn active_probes(store: &dyn NavigationStore) -> Result<Vec<ProbeRecord>> {
    store.probes_with_status(ProbeStatus::Active)
}
