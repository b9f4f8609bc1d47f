use serde::Deserialize;
use std::time::Duration;

/// Deserializes a `{ unit = "...", value = N }` table into a [`Duration`].
pub fn duration_from_toml<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Helper {
        unit: String,
        value: u64,
    }

    let helper = Helper::deserialize(deserializer)?;
    match helper.unit.as_str() {
        "seconds" | "secs" | "s" => Ok(Duration::from_secs(helper.value)),
        "milliseconds" | "millis" | "ms" => Ok(Duration::from_millis(helper.value)),
        "microseconds" | "micros" | "us" => Ok(Duration::from_micros(helper.value)),
        unit => Err(serde::de::Error::custom(format!(
            "Unsupported duration unit: {}",
            unit
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ext_config::{Config, File, FileFormat};

    #[derive(Deserialize)]
    struct Timeouts {
        #[serde(deserialize_with = "duration_from_toml")]
        transmit: Duration,
    }

    fn parse(src: &str) -> Result<Timeouts, ext_config::ConfigError> {
        Config::builder()
            .add_source(File::from_str(src, FileFormat::Toml))
            .build()?
            .try_deserialize::<Timeouts>()
    }

    #[test]
    fn parses_milliseconds_and_seconds() {
        let t = parse("transmit = { unit = \"milliseconds\", value = 100 }").unwrap();
        assert_eq!(t.transmit, Duration::from_millis(100));
        let t = parse("transmit = { unit = \"s\", value = 2 }").unwrap();
        assert_eq!(t.transmit, Duration::from_secs(2));
    }

    #[test]
    fn rejects_unknown_unit() {
        assert!(parse("transmit = { unit = \"fortnights\", value = 1 }").is_err());
    }
}
