pub mod monitor;
pub mod params;
pub mod pool;
pub mod range_filter;
pub mod report;
pub mod spike_log;
pub mod spike_records;
pub mod spike_space;
pub mod types;

mod util;
