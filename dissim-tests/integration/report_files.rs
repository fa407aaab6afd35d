//! Reports rendered from a finished optimizing run into files.

use std::fs::{self, File};
use std::io::{BufWriter, Write};

use dissim_core::{DisseminationConfig, RunMode};
use dissim_sim::{SimulationReport, reports, scenario_for};
use tempfile::TempDir;

fn optimizing_report() -> SimulationReport {
    let config = DisseminationConfig {
        client_count: 10,
        channel_count: 3,
        run_mode: RunMode::Optimizing,
        ..Default::default()
    };
    scenario_for(config).unwrap().execute().unwrap()
}

fn write_to_file<F>(dir: &TempDir, name: &str, render: F) -> String
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let path = dir.path().join(name);
    let mut out = BufWriter::new(File::create(&path).unwrap());
    render(&mut out).unwrap();
    out.flush().unwrap();
    drop(out);
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_channel_reports() {
    let dir = TempDir::new().unwrap();
    let report = optimizing_report();

    let all = write_to_file(&dir, "channels.txt", |out| {
        reports::write_receptions_per_channel(&report.log, out)
    });
    assert_eq!(all, "# Total receptions per channel\n# <channel> <count>\n1 5\n2 3\n3 2\n");

    let clients = write_to_file(&dir, "clients.txt", |out| {
        reports::write_client_receptions_per_channel(&report.log, out)
    });
    assert_eq!(clients, "# Client receptions per channel\n# <channel> <count>\n1 3\n2 3\n3 2\n");
}

#[test]
fn test_bucketed_report() {
    let dir = TempDir::new().unwrap();
    let report = optimizing_report();

    let text = write_to_file(&dir, "cdf.txt", |out| {
        reports::write_receptions_bucketed(&report.log, 2.0, out)
    });
    assert_eq!(
        text,
        "# Reception CDF\n# <time> <fraction received>\n2.0 0.3\n4.0 0.9\n5.0 1.0\n"
    );
}

#[test]
fn test_leader_count_report() {
    let dir = TempDir::new().unwrap();
    let report = optimizing_report();

    let text = write_to_file(&dir, "leaders.txt", |out| {
        reports::write_leader_count_over_time(&report.log, out)
    });
    assert_eq!(text, "# Leader count vs. time\n0.0 1\n1.0 2\n2.0 3\n");
}

#[test]
fn test_json_report_round_trips_counts() {
    let dir = TempDir::new().unwrap();
    let report = optimizing_report();

    let text = write_to_file(&dir, "report.json", |out| reports::write_json_report(&report, out));
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(json["event_count"], report.event_count);
    assert_eq!(json["backlog_remaining"], 0);
    assert_eq!(json["log"]["client_receptions"].as_array().unwrap().len(), 8);
    assert_eq!(json["log"]["leader_activations"].as_array().unwrap().len(), 3);
}
