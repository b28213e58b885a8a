use std::time::Instant;

use rand::{prelude::Distribution, rngs::StdRng, seq::SliceRandom, SeedableRng};
use spikemon::{pool, spike_space::SpikeSpace};
use statrs::distribution::Poisson;

#[path = "../scenario_params.rs"]
mod scenario_params;

const TIME_STEP: f64 = 1e-4;

fn main() {
    let params = scenario_params::get_scenario_params();
    let population_size = params.population_size;

    if let Some(monitor_params) = params.monitors.first() {
        if let Err(err) = std::fs::create_dir_all(&monitor_params.output_dir) {
            eprintln!("Cannot create output directory: {}", err);
        }
    }

    let mut pool = pool::create_monitor_pool(params).unwrap();

    let all_nids: Vec<usize> = (0..population_size).collect();
    let mut rng = StdRng::seed_from_u64(0);
    let num_spikes_dist = Poisson::new(20.0).unwrap();

    let mut spike_space = SpikeSpace::with_capacity(population_size);
    let mut step_spikes = Vec::with_capacity(population_size);
    let mut spike_count = 0usize;
    let mut recorded_count = 0usize;
    let t_stop = 100000;

    let wall_start = Instant::now();

    for step in 0..t_stop {
        let num_spikes = num_spikes_dist.sample(&mut rng) as usize;

        step_spikes.clear();
        step_spikes.extend(all_nids.choose_multiple(&mut rng, num_spikes));
        step_spikes.sort();

        spike_space.clear();
        for nid in &step_spikes {
            spike_space.push(*nid);
        }
        spike_count += spike_space.count();

        let step_result = pool.step(&spike_space, step as f64 * TIME_STEP).unwrap();
        recorded_count += step_result.num_recorded;
    }

    let wall_time = wall_start.elapsed();

    let summaries = pool.finalize().unwrap();

    eprintln!("Spikes per step: {}", spike_count as f64 / t_stop as f64);
    eprintln!("Recorded entries: {}", recorded_count);
    eprintln!(
        "Throughput: {:.3e} steps per second ({:.3} us per step)",
        t_stop as f64 / wall_time.as_secs_f64(),
        wall_time.as_secs_f64() * 1e6 / t_stop as f64
    );
    for summary in summaries {
        eprintln!(
            "{}: {} spikes{}",
            summary.name,
            summary.num_spikes,
            if summary.written { "" } else { " (not written)" }
        );
    }
}
