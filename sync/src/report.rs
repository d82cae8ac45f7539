//! Run reporter
//!
//! Collects structured events from every pipeline stage and prints the
//! run-level summary. Each event is logged at record time, so the reporter
//! doubles as the single place deciding log levels for outcomes.

use crate::matcher::MatchType;
use tracing::{error, info, warn};

/// Outcome event recorded during a run
#[derive(Debug)]
pub enum RunEvent {
    VmCreated {
        name: String,
    },
    VmUpdated {
        name: String,
        fields: Vec<&'static str>,
        match_type: MatchType,
    },
    VmFailed {
        name: String,
        error: String,
    },
    DuplicateIpRemoved {
        host: String,
        kept: String,
        removed: String,
    },
    PrimaryAssigned {
        vm: String,
        address: String,
    },
    Warning {
        message: String,
    },
}

/// Accumulates run events for the summary
#[derive(Debug, Default)]
pub struct Reporter {
    events: Vec<RunEvent>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log and store an event
    pub fn record(&mut self, event: RunEvent) {
        match &event {
            RunEvent::VmCreated { name } => info!("Created VM {name}"),
            RunEvent::VmUpdated {
                name,
                fields,
                match_type,
            } => info!(
                "Updated VM {name} ({} match): {}",
                match_type.as_str(),
                fields.join(", ")
            ),
            RunEvent::VmFailed { name, error } => error!("Failed to sync VM {name}: {error}"),
            RunEvent::DuplicateIpRemoved {
                host,
                kept,
                removed,
            } => info!("Removed duplicate IP {removed} for host {host}, kept {kept}"),
            RunEvent::PrimaryAssigned { vm, address } => {
                info!("Assigned primary IP {address} to VM {vm}");
            }
            RunEvent::Warning { message } => warn!("{message}"),
        }
        self.events.push(event);
    }

    /// Shorthand for recording a warning
    pub fn warn(&mut self, message: impl Into<String>) {
        self.record(RunEvent::Warning {
            message: message.into(),
        });
    }

    fn count(&self, pred: impl Fn(&RunEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn created(&self) -> usize {
        self.count(|e| matches!(e, RunEvent::VmCreated { .. }))
    }

    pub fn updated(&self) -> usize {
        self.count(|e| matches!(e, RunEvent::VmUpdated { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|e| matches!(e, RunEvent::VmFailed { .. }))
    }

    pub fn duplicates_removed(&self) -> usize {
        self.count(|e| matches!(e, RunEvent::DuplicateIpRemoved { .. }))
    }

    pub fn primaries_assigned(&self) -> usize {
        self.count(|e| matches!(e, RunEvent::PrimaryAssigned { .. }))
    }

    pub fn warnings(&self) -> usize {
        self.count(|e| matches!(e, RunEvent::Warning { .. }))
    }

    /// Print the run-level summary
    pub fn log_summary(&self) {
        info!(
            "Run summary: {} VMs created, {} updated, {} failed; {} duplicate IPs removed, {} primary IPs assigned, {} warnings",
            self.created(),
            self.updated(),
            self.failed(),
            self.duplicates_removed(),
            self.primaries_assigned(),
            self.warnings()
        );
    }
}
