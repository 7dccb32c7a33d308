//! CLI entry point: run a scenario file through the match engine and
//! report pass/fail counts, exiting non-zero on any failure.

use std::path::PathBuf;
use std::process::ExitCode;

use mockmatcher::harness::run_file;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(all_passed) => {
            if all_passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("mockmatcher: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<bool> {
    let scenario_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("usage: mockmatcher <scenario.json>"))?;

    let report = run_file(&scenario_path)?;

    for (tag, (passed, failed)) in report.by_tag() {
        println!("{tag}: {passed} passed, {failed} failed");
    }
    for outcome in report.outcomes.iter().filter(|o| !o.passed) {
        println!("FAIL {} — {}", outcome.example_id, outcome.detail);
    }
    println!("{}/{} passed", report.passed(), report.total());

    Ok(report.all_passed())
}
