use anyhow::Result;
use chrono::NaiveDate;
use luftdaten::Luftdaten;

pub async fn find_start_date(
    client: &Luftdaten,
    sensor: &str,
    earliest: Option<NaiveDate>,
    latest: Option<NaiveDate>,
) -> Result<String> {
    let start_date = client
        .find_start_date()
        .sensor_code(sensor)
        .maybe_earliest(earliest)
        .maybe_latest(latest)
        .call()
        .await?;

    Ok(match start_date {
        Some(date) => format!("Sensor {} has data from {}", sensor, date),
        None => format!("No data found for sensor {}", sensor),
    })
}
