use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Owned copy of one monitor's log, as written by the JSON output format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpikeRecords {
    pub name: String,
    pub source_start: usize,
    pub source_stop: usize,
    pub indices: Vec<usize>,
    pub times: Vec<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSummary {
    pub name: String,
    pub num_spikes: usize,
    pub written: bool,
}
