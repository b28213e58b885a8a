use std::ops::Range;
use std::path::PathBuf;

use simple_error::{try_with, SimpleError};

use crate::params::{self, MonitorParams, OutputFormat, ScanStrategy};
use crate::range_filter;
use crate::report::{self, Diagnostics};
use crate::spike_log::SpikeLog;
use crate::spike_records::{MonitorSummary, SpikeRecords};
use crate::spike_space::SpikeSpace;
use crate::types::{HashMap, Timestamp};

pub fn create_monitor(params: MonitorParams) -> Result<SpikeMonitor, SimpleError> {
    create_monitor_with_diagnostics(params, report::stdout_diagnostics())
}

pub fn create_monitor_with_diagnostics(
    params: MonitorParams,
    diagnostics: Diagnostics,
) -> Result<SpikeMonitor, SimpleError> {
    try_with!(
        params::validate_monitor_params(&params),
        "invalid monitor parameters"
    );

    let source = params.source_start..params.source_stop;

    log::debug!(
        "created spike monitor {} for source range {:?}",
        params.name,
        source
    );

    Ok(SpikeMonitor {
        name: params.name,
        spike_counts: HashMap::default(),
        source,
        record: params.record,
        output_dir: params.output_dir,
        output_format: params.output_format,
        scan_strategy: params.scan_strategy,
        log: SpikeLog::new(),
        num_spikes: 0,
        diagnostics,
    })
}

/// Records the spikes of one contiguous sub-population over a whole run.
pub struct SpikeMonitor {
    name: String,
    source: Range<usize>,
    record: bool,
    output_dir: PathBuf,
    output_format: OutputFormat,
    scan_strategy: ScanStrategy,
    log: SpikeLog,
    spike_counts: HashMap<usize, usize>,
    num_spikes: usize,
    diagnostics: Diagnostics,
}

impl SpikeMonitor {
    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_source(&self) -> Range<usize> {
        self.source.clone()
    }

    /// Filters the step's spikes to the source range and records them at `t`.
    /// Returns the number of spikes that fell into the range.
    pub fn on_step(&mut self, spike_space: &SpikeSpace, t: Timestamp) -> usize {
        let spikes = spike_space.spikes();
        let local_indices = range_filter::filter(spikes, &self.source, self.scan_strategy);

        let spike_counts = &mut self.spike_counts;
        let counted =
            local_indices.inspect(|local_idx| *spike_counts.entry(*local_idx).or_default() += 1);

        let num_recorded = if self.record {
            self.log.record(counted, t)
        } else {
            counted.count()
        };

        self.num_spikes += num_recorded;
        num_recorded
    }

    /// Spikes seen in the source range, whether or not they were logged.
    pub fn num_spikes(&self) -> usize {
        self.num_spikes
    }

    pub fn get_log(&self) -> &SpikeLog {
        &self.log
    }

    /// Number of spikes per local index over the run so far. Neurons that never
    /// fired are absent.
    pub fn count(&self) -> &HashMap<usize, usize> {
        &self.spike_counts
    }

    /// Spike times grouped by local index. Neurons that never fired are absent.
    pub fn spike_trains(&self) -> HashMap<usize, Vec<Timestamp>> {
        let mut result: HashMap<usize, Vec<Timestamp>> = HashMap::default();
        for (local_idx, t) in self.log.iter() {
            result.entry(local_idx).or_default().push(t);
        }
        result
    }

    pub fn extract_records(&self) -> SpikeRecords {
        SpikeRecords {
            name: self.name.clone(),
            source_start: self.source.start,
            source_stop: self.source.end,
            indices: self.log.indices().to_vec(),
            times: self.log.times().to_vec(),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        report::output_path(&self.output_dir, &self.name, self.output_format)
    }

    /// Persists the log, overwriting earlier output. A failure is reported on the
    /// diagnostics channel and otherwise ignored; the return value tells whether
    /// the file was written.
    pub fn write(&mut self) -> bool {
        let path = self.output_path();

        let result = match self.output_format {
            OutputFormat::Text => report::write_text(&self.log, &path),
            OutputFormat::Json => report::write_json(&self.extract_records(), &path),
        };

        match result {
            Ok(()) => true,
            Err(err) => {
                log::error!("monitor {}: cannot write {:?}: {}", self.name, path, err);
                report::emit(&mut self.diagnostics, report::WRITE_ERROR_MESSAGE);
                false
            }
        }
    }

    /// Reports the number of logged entries.
    pub fn debug_report(&mut self) {
        report::emit(
            &mut self.diagnostics,
            &report::spike_count_line(self.log.len()),
        );
    }

    pub fn finalize(&mut self) -> MonitorSummary {
        let written = self.write();
        self.debug_report();

        log::info!(
            "monitor {} finalized with {} spikes",
            self.name,
            self.num_spikes
        );

        MonitorSummary {
            name: self.name.clone(),
            num_spikes: self.num_spikes,
            written,
        }
    }
}
