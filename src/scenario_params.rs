use spikemon::params::PoolParams;

pub fn get_scenario_params() -> PoolParams {
    let params_yaml_str = r#"
population_size: 1000
monitors:
- name: spikemonitor_exc
  source_start: 0
  source_stop: 800
  record: true
  output_dir: results
  output_format: Text
  scan_strategy: Binary
- name: spikemonitor_inh
  source_start: 800
  source_stop: 1000
  record: true
  output_dir: results
  output_format: Text
  scan_strategy: Binary
- name: spikemonitor_inh_linear
  source_start: 800
  source_stop: 1000
  record: false
  output_dir: results
  output_format: Text
  scan_strategy: Linear
technical_params:
  num_threads: 1
  pin_threads: false
"#;

    serde_yaml::from_str(params_yaml_str).unwrap()
}
