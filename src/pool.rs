use std::sync::mpsc::channel as mpsc_channel;
use std::sync::mpsc::Receiver as MpscReceiver;
use std::sync::mpsc::Sender as MpscSender;
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;

use bus::{Bus, BusReader};
use core_affinity::CoreId;
use itertools::Itertools;
use simple_error::{try_with, SimpleError, SimpleResult};

use crate::monitor::{self, SpikeMonitor};
use crate::params::{self, PoolParams};
use crate::report::{self, Diagnostics};
use crate::spike_records::{MonitorSummary, SpikeRecords};
use crate::spike_space::SpikeSpace;
use crate::types::Timestamp;
use crate::util;

#[derive(Debug, Clone)]
enum Request {
    Step(StepContext),
    ExtractRecords,
    Finalize,
}

#[derive(Debug, Clone)]
struct StepContext {
    t: Timestamp,
    spike_space: Arc<SpikeSpace>,
}

#[derive(Debug)]
pub struct StepResult {
    pub t: Timestamp,
    pub num_recorded: usize,
    pub num_recorded_per_monitor: Vec<usize>,
}

type MonitorSlot = (usize, SpikeMonitor);

pub fn create_monitor_pool(params: PoolParams) -> Result<MonitorPool, SimpleError> {
    create_monitor_pool_with_diagnostics(params, &report::stdout_diagnostics)
}

pub fn create_monitor_pool_with_diagnostics(
    params: PoolParams,
    make_diagnostics: &dyn Fn() -> Diagnostics,
) -> Result<MonitorPool, SimpleError> {
    try_with!(
        params::validate_pool_params(&params),
        "invalid pool parameters"
    );

    let num_monitors = params.monitors.len();
    let num_threads = get_num_threads(&params);

    let mut monitors = Vec::with_capacity(num_monitors);
    for monitor_params in params.monitors {
        monitors.push(monitor::create_monitor_with_diagnostics(
            monitor_params,
            make_diagnostics(),
        )?);
    }

    let mut monitors = monitors.into_iter().enumerate();
    let monitor_groups: Vec<Vec<MonitorSlot>> = (0..num_threads)
        .map(|thread_id| {
            let group_size = util::get_partition_range(num_threads, thread_id, num_monitors).len();
            monitors.by_ref().take(group_size).collect()
        })
        .collect();

    let mut broadcast_tx = Bus::new(1);
    let (step_result_tx, step_result_rx) = mpsc_channel();
    let (records_tx, records_rx) = mpsc_channel();
    let (summaries_tx, summaries_rx) = mpsc_channel();

    let pin_threads = params.technical_params.pin_threads;
    let mut join_handles = Vec::new();

    for (thread_id, mut monitor_group) in monitor_groups.into_iter().enumerate() {
        let broadcast_rx = broadcast_tx.add_rx();
        let step_result_tx = step_result_tx.clone();
        let records_tx = records_tx.clone();
        let summaries_tx = summaries_tx.clone();

        join_handles.push(thread::spawn(move || {
            if pin_threads {
                let core_id = CoreId { id: thread_id };
                core_affinity::set_for_current(core_id);
            }

            run_worker(
                &mut monitor_group,
                broadcast_rx,
                step_result_tx,
                records_tx,
                summaries_tx,
            );
        }));
    }

    log::debug!(
        "monitor pool started with {} monitors on {} threads",
        num_monitors,
        num_threads
    );

    Ok(MonitorPool {
        population_size: params.population_size,
        num_monitors,
        num_threads,
        broadcast_tx: Some(broadcast_tx),
        step_result_rx,
        records_rx,
        summaries_rx,
        join_handles,
    })
}

fn get_num_threads(params: &PoolParams) -> usize {
    let num_threads = params
        .technical_params
        .num_threads
        .unwrap_or_else(num_cpus::get);

    num_threads.min(params.monitors.len()).max(1)
}

fn run_worker(
    monitors: &mut [MonitorSlot],
    mut rx: BusReader<Request>,
    step_result_tx: MpscSender<Vec<(usize, usize)>>,
    records_tx: MpscSender<Vec<(usize, SpikeRecords)>>,
    summaries_tx: MpscSender<Vec<(usize, MonitorSummary)>>,
) {
    while let Ok(request) = rx.recv() {
        let sent = match request {
            Request::Step(ctx) => {
                let counts = monitors
                    .iter_mut()
                    .map(|(monitor_id, monitor)| {
                        (*monitor_id, monitor.on_step(&ctx.spike_space, ctx.t))
                    })
                    .collect();
                step_result_tx.send(counts).is_ok()
            }
            Request::ExtractRecords => {
                let records = monitors
                    .iter()
                    .map(|(monitor_id, monitor)| (*monitor_id, monitor.extract_records()))
                    .collect();
                records_tx.send(records).is_ok()
            }
            Request::Finalize => {
                let summaries = monitors
                    .iter_mut()
                    .map(|(monitor_id, monitor)| (*monitor_id, monitor.finalize()))
                    .collect();
                summaries_tx.send(summaries).is_ok()
            }
        };

        if !sent {
            break;
        }
    }
}

/// Owns a set of monitors spread over worker threads and steps them together.
pub struct MonitorPool {
    population_size: usize,
    num_monitors: usize,
    num_threads: usize,
    broadcast_tx: Option<Bus<Request>>,
    step_result_rx: MpscReceiver<Vec<(usize, usize)>>,
    records_rx: MpscReceiver<Vec<(usize, SpikeRecords)>>,
    summaries_rx: MpscReceiver<Vec<(usize, MonitorSummary)>>,
    join_handles: Vec<JoinHandle<()>>,
}

impl MonitorPool {
    pub fn get_num_monitors(&self) -> usize {
        self.num_monitors
    }

    pub fn get_num_threads(&self) -> usize {
        self.num_threads
    }

    pub fn step(&mut self, spike_space: &SpikeSpace, t: Timestamp) -> SimpleResult<StepResult> {
        self.validate_spike_space(spike_space)?;

        self.broadcast(Request::Step(StepContext {
            t,
            spike_space: Arc::new(spike_space.clone()),
        }))?;

        let mut num_recorded_per_monitor = vec![0; self.num_monitors];
        for counts in self.gather(&self.step_result_rx)? {
            for (monitor_id, count) in counts {
                num_recorded_per_monitor[monitor_id] = count;
            }
        }

        Ok(StepResult {
            t,
            num_recorded: num_recorded_per_monitor.iter().sum(),
            num_recorded_per_monitor,
        })
    }

    /// Copies of every monitor's log, ordered by monitor id.
    pub fn extract_records(&mut self) -> SimpleResult<Vec<SpikeRecords>> {
        self.broadcast(Request::ExtractRecords)?;
        Ok(order_by_monitor_id(self.gather(&self.records_rx)?))
    }

    /// Writes and reports every monitor. Summaries are ordered by monitor id.
    pub fn finalize(&mut self) -> SimpleResult<Vec<MonitorSummary>> {
        self.broadcast(Request::Finalize)?;
        let summaries = order_by_monitor_id(self.gather(&self.summaries_rx)?);

        log::info!(
            "monitor pool finalized: {} spikes over {} monitors",
            summaries.iter().map(|summary| summary.num_spikes).sum::<usize>(),
            summaries.len()
        );

        Ok(summaries)
    }

    fn broadcast(&mut self, request: Request) -> SimpleResult<()> {
        match self.broadcast_tx.as_mut() {
            Some(broadcast_tx) => {
                broadcast_tx.broadcast(request);
                Ok(())
            }
            None => Err(SimpleError::new("monitor pool is shut down")),
        }
    }

    fn gather<T>(&self, rx: &MpscReceiver<Vec<T>>) -> SimpleResult<Vec<Vec<T>>> {
        let mut results = Vec::with_capacity(self.num_threads);
        for _ in 0..self.num_threads {
            results.push(try_with!(rx.recv(), "monitor worker terminated"));
        }
        Ok(results)
    }

    fn validate_spike_space(&self, spike_space: &SpikeSpace) -> SimpleResult<()> {
        if let Some(nid) = spike_space.spikes().last() {
            if *nid >= self.population_size {
                return Err(SimpleError::new(format!(
                    "Invalid neuron id in spike space: {}",
                    nid
                )));
            }
        }

        Ok(())
    }
}

impl Drop for MonitorPool {
    fn drop(&mut self) {
        drop(self.broadcast_tx.take()); // signals the worker threads to exit the loop

        self.join_handles.drain(..).for_each(|join_handle| {
            join_handle.join().ok();
        });
    }
}

fn order_by_monitor_id<T>(groups: Vec<Vec<(usize, T)>>) -> Vec<T> {
    groups
        .into_iter()
        .flatten()
        .sorted_by_key(|(monitor_id, _)| *monitor_id)
        .map(|(_, item)| item)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{partition_population, MonitorParams, TechnicalParams};
    use crate::report::test_util::{ScratchDir, SharedBuffer};
    use itertools::assert_equal;

    fn make_pool_params(
        test_name: &str,
        num_monitors: usize,
        num_threads: usize,
    ) -> (PoolParams, ScratchDir) {
        let scratch = ScratchDir::new(test_name);
        let mut monitors = partition_population("mon", 20, num_monitors);
        for monitor_params in monitors.iter_mut() {
            monitor_params.output_dir = scratch.path().to_path_buf();
        }

        let params = PoolParams {
            population_size: 20,
            monitors,
            technical_params: TechnicalParams {
                num_threads: Some(num_threads),
                pin_threads: false,
            },
        };
        (params, scratch)
    }

    #[test]
    fn empty_pool() {
        let mut pool = create_monitor_pool(PoolParams::default()).unwrap();
        assert_eq!(pool.get_num_threads(), 1);

        let step_result = pool.step(&SpikeSpace::default(), 0.0).unwrap();
        assert_eq!(step_result.num_recorded, 0);
        assert!(pool.finalize().unwrap().is_empty());
    }

    #[test]
    fn step_and_extract() {
        let (params, _scratch) = make_pool_params("pool_step_and_extract", 4, 1);
        let mut pool = create_monitor_pool_with_diagnostics(params, &|| {
            SharedBuffer::default().diagnostics()
        })
        .unwrap();

        let step_result = pool
            .step(&SpikeSpace::from_spiking_nids(&[0, 4, 5, 12, 19]), 0.5)
            .unwrap();

        assert_eq!(step_result.num_recorded, 5);
        assert_eq!(step_result.num_recorded_per_monitor, [2, 1, 1, 1]);

        let records = pool.extract_records().unwrap();
        assert_equal(
            records.iter().map(|records| records.name.as_str()),
            ["mon_0", "mon_1", "mon_2", "mon_3"],
        );
        assert_eq!(records[0].indices, [0, 4]);
        assert_eq!(records[1].indices, [0]);
        assert_eq!(records[2].indices, [2]);
        assert_eq!(records[3].indices, [4]);
    }

    #[test]
    fn finalize_reports_every_monitor() {
        let (params, _scratch) = make_pool_params("pool_finalize", 3, 1);
        let buffer = SharedBuffer::default();
        let mut pool =
            create_monitor_pool_with_diagnostics(params, &|| buffer.diagnostics()).unwrap();

        pool.step(&SpikeSpace::from_spiking_nids(&[1, 2, 7, 15]), 0.0)
            .unwrap();

        let summaries = pool.finalize().unwrap();
        assert_equal(
            summaries.iter().map(|summary| summary.num_spikes),
            [2, 1, 1],
        );
        assert!(summaries.iter().all(|summary| summary.written));
        assert_eq!(buffer.lines().len(), 3);
        assert!(buffer
            .lines()
            .iter()
            .all(|line| line.starts_with("Number of spikes: ")));
    }

    #[test]
    fn invalid_spike_space() {
        let (params, _scratch) = make_pool_params("pool_invalid_spike_space", 2, 1);
        let mut pool = create_monitor_pool(params).unwrap();

        let result = pool.step(&SpikeSpace::from_spiking_nids(&[3, 20]), 0.0);
        assert_eq!(
            result.unwrap_err().as_str(),
            "Invalid neuron id in spike space: 20"
        );
    }

    #[test]
    fn invalid_params() {
        let (mut params, _scratch) = make_pool_params("pool_invalid_params", 2, 1);
        params.monitors.push(MonitorParams::defaults_for_range("mon_0", 0, 1));
        assert!(create_monitor_pool(params).is_err());
    }

    #[test]
    fn more_threads_than_monitors() {
        let (mut params, _scratch) = make_pool_params("pool_more_threads", 1, 1);
        params.technical_params.num_threads = None;
        let pool = create_monitor_pool(params).unwrap();
        assert_eq!(pool.get_num_threads(), 1);
    }
}
