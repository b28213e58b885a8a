use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::params::OutputFormat;
use crate::spike_log::SpikeLog;
use crate::spike_records::SpikeRecords;
use crate::types::Timestamp;

pub const WRITE_ERROR_MESSAGE: &str = "Error writing output file.";

const TIME_SIGNIFICANT_DIGITS: usize = 6;

/// Human-readable channel for end-of-run messages.
pub type Diagnostics = Box<dyn Write + Send>;

pub fn stdout_diagnostics() -> Diagnostics {
    Box::new(io::stdout())
}

pub fn output_path(output_dir: &Path, name: &str, output_format: OutputFormat) -> PathBuf {
    let extension = match output_format {
        OutputFormat::Text => "txt",
        OutputFormat::Json => "json",
    };
    output_dir.join(format!("{}.{}", name, extension))
}

/// Creates or truncates `path` and writes one `<local_index>, <time>` line per entry.
pub fn write_text(log: &SpikeLog, path: &Path) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for (index, t) in log.iter() {
        writeln!(out, "{}, {}", index, format_time(t))?;
    }
    out.flush()
}

/// Shortest of fixed or scientific notation with six significant digits and
/// trailing zeros removed, e.g. `0.0003`, `123457`, `1.23457e+06`, `1e-05`.
pub fn format_time(t: Timestamp) -> String {
    if t.is_nan() {
        return "nan".to_string();
    }
    if t.is_infinite() {
        return if t > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if t == 0.0 {
        return "0".to_string();
    }

    let scientific = format!("{:.*e}", TIME_SIGNIFICANT_DIGITS - 1, t);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if exponent < -4 || exponent >= TIME_SIGNIFICANT_DIGITS as i32 {
        format!(
            "{}e{}{:02}",
            strip_trailing_zeros(mantissa),
            if exponent < 0 { '-' } else { '+' },
            exponent.abs()
        )
    } else {
        let decimals = (TIME_SIGNIFICANT_DIGITS as i32 - 1 - exponent) as usize;
        strip_trailing_zeros(&format!("{:.*}", decimals, t)).to_string()
    }
}

fn strip_trailing_zeros(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

pub fn write_json(records: &SpikeRecords, path: &Path) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut out, records)?;
    out.flush()
}

pub fn spike_count_line(num_spikes: usize) -> String {
    format!("Number of spikes: {}", num_spikes)
}

/// Diagnostics are best effort; a failing channel must not disturb the run.
pub fn emit(diagnostics: &mut Diagnostics, line: &str) {
    if writeln!(diagnostics, "{}", line)
        .and_then(|_| diagnostics.flush())
        .is_err()
    {
        log::warn!("could not emit diagnostic line: {}", line);
    }
}


#[cfg(test)]
mod tests {
    use super::test_util::{ScratchDir, SharedBuffer};
    use super::*;

    #[test]
    fn text_lines() {
        let mut log = SpikeLog::new();
        log.record([0, 2], 0.5);
        log.record([1], 0.75);

        let scratch = ScratchDir::new("text_lines");
        let path = scratch.join("mon.txt");
        write_text(&log, &path).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "0, 0.5\n2, 0.5\n1, 0.75\n"
        );
    }

    #[test]
    fn text_overwrites_previous_content() {
        let scratch = ScratchDir::new("text_overwrites");
        let path = scratch.join("mon.txt");
        std::fs::write(&path, "stale content that is longer than the new one\n").unwrap();

        let mut log = SpikeLog::new();
        log.record([3], 1.0);
        write_text(&log, &path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "3, 1\n");
    }

    #[test]
    fn missing_directory() {
        let scratch = ScratchDir::new("missing_dir");
        let path = scratch.join("nope").join("mon.txt");
        assert!(write_text(&SpikeLog::new(), &path).is_err());
    }

    #[test]
    fn json_records() {
        let records = SpikeRecords {
            name: "mon".to_string(),
            source_start: 5,
            source_stop: 9,
            indices: vec![0, 2],
            times: vec![0.25, 0.25],
        };

        let scratch = ScratchDir::new("json_records");
        let path = scratch.join("mon.json");
        write_json(&records, &path).unwrap();

        let read_back: SpikeRecords =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read_back, records);
    }

    #[test]
    fn step_times_are_written_with_six_significant_digits() {
        let mut log = SpikeLog::new();
        log.record([1], 3.0 * 1e-4);
        log.record([2], 0.1 + 0.2);

        let scratch = ScratchDir::new("six_significant_digits");
        let path = scratch.join("mon.txt");
        write_text(&log, &path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1, 0.0003\n2, 0.3\n");
    }

    #[test]
    fn time_formatting() {
        assert_eq!(format_time(0.0), "0");
        assert_eq!(format_time(1.0), "1");
        assert_eq!(format_time(0.25), "0.25");
        assert_eq!(format_time(7.0 * 1e-4), "0.0007");
        assert_eq!(format_time(12.3456789), "12.3457");
        assert_eq!(format_time(123456.7), "123457");
        assert_eq!(format_time(999999.5), "1e+06");
        assert_eq!(format_time(1234567.0), "1.23457e+06");
        assert_eq!(format_time(0.00001), "1e-05");
        assert_eq!(format_time(0.000012345678), "1.23457e-05");
        assert_eq!(format_time(-0.5), "-0.5");
    }

    #[test]
    fn scratch_dir_is_removed() {
        let scratch = ScratchDir::new("scratch_dir_is_removed");
        let dir = scratch.path().to_path_buf();
        std::fs::write(scratch.join("mon.txt"), "0, 0\n").unwrap();

        drop(scratch);
        assert!(!dir.exists());
    }

    #[test]
    fn paths() {
        assert_eq!(
            output_path(Path::new("results"), "spikemonitor_1", OutputFormat::Text),
            PathBuf::from("results/spikemonitor_1.txt")
        );
        assert_eq!(
            output_path(Path::new("out"), "exc", OutputFormat::Json),
            PathBuf::from("out/exc.json")
        );
    }

    #[test]
    fn emitted_lines() {
        let buffer = SharedBuffer::default();
        let mut diagnostics = buffer.diagnostics();
        emit(&mut diagnostics, &spike_count_line(42));
        emit(&mut diagnostics, WRITE_ERROR_MESSAGE);
        assert_eq!(
            buffer.lines(),
            ["Number of spikes: 42", "Error writing output file."]
        );
    }
}
