use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use driver::accel::adxl345::ADXL345_DEFAULT_ADDRESS;
use driver::TapCount;

/// SITL run settings, overridable from the environment
#[derive(Debug, Clone)]
pub struct SitlConfig {
    /// Number of sample cycles before stopping
    pub cycles: u32,
    /// Sleep between cycles
    pub period: Duration,
    /// I2C address the simulated chip answers on
    pub address: u8,
    pub tap_count: TapCount,
    /// A tap is scripted every `tap_every` cycles
    pub tap_every: u32,
    /// Requested output data rate in Hz
    pub rate_hz: f32,
}

impl Default for SitlConfig {
    fn default() -> Self {
        Self {
            cycles: 20,
            period: Duration::from_millis(500),
            address: ADXL345_DEFAULT_ADDRESS,
            tap_count: TapCount::Single,
            tap_every: 4,
            rate_hz: 100.0,
        }
    }
}

impl SitlConfig {
    /// Read `SITL_CYCLES`, `SITL_PERIOD_MS` and `SITL_DOUBLE_TAP`
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(cycles) = parse_var(&lookup, "SITL_CYCLES")? {
            config.cycles = cycles;
        }
        if let Some(period_ms) = parse_var::<u64>(&lookup, "SITL_PERIOD_MS")? {
            config.period = Duration::from_millis(period_ms);
        }
        if let Some(true) = parse_var::<bool>(&lookup, "SITL_DOUBLE_TAP")? {
            config.tap_count = TapCount::Double;
        }

        Ok(config)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(name)
        .map(|value| {
            value
                .trim()
                .parse()
                .with_context(|| format!("Invalid value for {}: {:?}", name, value))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_environment() {
        let config = SitlConfig::from_lookup(|_| None).unwrap();

        assert_eq!(config.cycles, 20);
        assert_eq!(config.period, Duration::from_millis(500));
        assert_eq!(config.tap_count, TapCount::Single);
    }

    #[test]
    fn test_overrides() {
        let config = SitlConfig::from_lookup(|name| match name {
            "SITL_CYCLES" => Some("3".into()),
            "SITL_PERIOD_MS" => Some(" 10 ".into()),
            "SITL_DOUBLE_TAP" => Some("true".into()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.cycles, 3);
        assert_eq!(config.period, Duration::from_millis(10));
        assert_eq!(config.tap_count, TapCount::Double);
    }

    #[test]
    fn test_invalid_value_is_reported() {
        let result = SitlConfig::from_lookup(|name| (name == "SITL_CYCLES").then(|| "many".into()));

        let err = result.unwrap_err();
        assert!(err.to_string().contains("SITL_CYCLES"));
    }
}
