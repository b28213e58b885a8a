use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use simple_error::SimpleError;

use crate::types::HashSet;
use crate::util;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorParams {
    pub name: String,
    pub source_start: usize,
    pub source_stop: usize,
    pub record: bool,
    pub output_dir: PathBuf,
    pub output_format: OutputFormat,
    pub scan_strategy: ScanStrategy,
}

impl MonitorParams {
    pub fn defaults_for_range(name: &str, source_start: usize, source_stop: usize) -> Self {
        Self {
            name: name.to_string(),
            source_start,
            source_stop,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanStrategy {
    Linear,
    Binary,
}

#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct PoolParams {
    pub population_size: usize,
    pub monitors: Vec<MonitorParams>,
    pub technical_params: TechnicalParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalParams {
    pub num_threads: Option<usize>,
    pub pin_threads: bool,
}

impl Default for MonitorParams {
    fn default() -> Self {
        Self {
            name: "spikemonitor".to_string(),
            source_start: 0,
            source_stop: 0,
            record: true,
            output_dir: PathBuf::from("results"),
            output_format: OutputFormat::Text,
            scan_strategy: ScanStrategy::default(),
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Text
    }
}

impl Default for ScanStrategy {
    fn default() -> Self {
        ScanStrategy::Binary
    }
}

impl Default for TechnicalParams {
    fn default() -> Self {
        Self {
            num_threads: Some(1),
            pin_threads: false,
        }
    }
}

/// Splits `[0, population_size)` into `num_monitors` contiguous ranges, named
/// `<prefix>_<i>`. Sizes differ by at most one.
pub fn partition_population(
    prefix: &str,
    population_size: usize,
    num_monitors: usize,
) -> Vec<MonitorParams> {
    (0..num_monitors)
        .map(|monitor_id| {
            let range = util::get_partition_range(num_monitors, monitor_id, population_size);
            MonitorParams::defaults_for_range(
                &format!("{}_{}", prefix, monitor_id),
                range.start,
                range.end,
            )
        })
        .collect()
}

pub fn validate_monitor_params(monitor_params: &MonitorParams) -> Result<(), SimpleError> {
    if monitor_params.name.is_empty() {
        return Err(SimpleError::new("monitor name must not be empty"));
    }

    if monitor_params
        .name
        .chars()
        .any(|c| c == '/' || c == '\\')
    {
        return Err(SimpleError::new(format!(
            "monitor name must not contain a path separator: {}",
            monitor_params.name
        )));
    }

    if monitor_params.source_start > monitor_params.source_stop {
        return Err(SimpleError::new(format!(
            "source_start ({}) must not be greater than source_stop ({})",
            monitor_params.source_start, monitor_params.source_stop
        )));
    }

    Ok(())
}

pub fn validate_pool_params(pool_params: &PoolParams) -> Result<(), SimpleError> {
    let mut seen_names = HashSet::default();

    for monitor_params in &pool_params.monitors {
        validate_monitor_params(monitor_params)?;

        if !seen_names.insert(monitor_params.name.as_str()) {
            return Err(SimpleError::new(format!(
                "duplicate monitor name: {}",
                monitor_params.name
            )));
        }

        if monitor_params.source_stop > pool_params.population_size {
            return Err(SimpleError::new(format!(
                "source_stop of monitor {} exceeds population size {}",
                monitor_params.name, pool_params.population_size
            )));
        }
    }

    validate_technical_params(&pool_params.technical_params)?;

    Ok(())
}

fn validate_technical_params(technical_params: &TechnicalParams) -> Result<(), SimpleError> {
    if let Some(num_threads) = technical_params.num_threads {
        if num_threads == 0 {
            return Err(SimpleError::new("num_threads must be strictly positive"));
        }

        if num_cpus::get() < num_threads {
            return Err(SimpleError::new(
                "num_threads must not be greater than number of available CPUs",
            ));
        }
    }

    Ok(())
}
