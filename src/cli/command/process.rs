use anyhow::Result;
use luftdaten::{load_sensors, Luftdaten};
use std::path::Path;

pub async fn process(client: &Luftdaten, config: &Path) -> Result<String> {
    let sensors = load_sensors(config)?;
    let summary = client.process(&sensors).await?;

    Ok(format!(
        "Aggregated {} of {} sensors, summary saved to `{}`",
        summary.luftdaten_sensors.len(),
        sensors.len(),
        client.summary_path().display()
    ))
}
