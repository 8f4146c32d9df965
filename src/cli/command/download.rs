use anyhow::{bail, Result};
use luftdaten::{load_sensors, Luftdaten, SensorSyncStatus};
use std::fmt::Write;
use std::path::Path;

pub async fn download(client: &Luftdaten, config: &Path) -> Result<String> {
    let sensors = load_sensors(config)?;
    let results = client.sync_all(&sensors).await;

    let mut summary = String::new();
    let mut errors = 0;
    for (code, result) in &results {
        match result {
            Ok(SensorSyncStatus::Synced(report)) => {
                writeln!(
                    summary,
                    "Sensor {}: {} required, {} already present, {} downloaded, {} failed",
                    code,
                    report.required,
                    report.already_present,
                    report.downloaded.len(),
                    report.failed.len()
                )?;
                for failed in &report.failed {
                    writeln!(summary, "  {}: {}", failed.file, failed.reason)?;
                }
            }
            Ok(SensorSyncStatus::StartDateUnknown) => {
                writeln!(summary, "Sensor {}: no archived data found", code)?;
            }
            Err(e) => {
                errors += 1;
                writeln!(summary, "Sensor {}: sync failed: {}", code, e)?;
            }
        }
    }

    if errors > 0 {
        print!("{}", summary);
        bail!("{} of {} sensors failed to sync", errors, results.len());
    }
    Ok(summary.trim_end().to_string())
}
