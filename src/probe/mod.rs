pub mod launch;
pub mod scheduler;

pub use launch::{active_probes, launch_probe, recall_probe};
pub use scheduler::{
    system_snapshot, LoggingObserver, PlayerSighting, ProbeObserver, ProbeScheduler,
    SchedulerHandle, SystemSnapshot, TickSummary,
};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in Unix epoch milliseconds.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
