use std::path::PathBuf;
use std::time::Duration;

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Simulated latencies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delays {
    pub eligibility: Duration,
    pub ehr: Duration,
    pub typing: Duration,
    pub otp: Duration,
    pub ocr: Duration,
    pub submit: Duration,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            eligibility: Duration::from_millis(500),
            ehr: Duration::from_millis(800),
            typing: Duration::from_millis(600),
            otp: Duration::from_millis(1000),
            ocr: Duration::from_millis(1500),
            submit: Duration::from_millis(1000),
        }
    }
}

impl Delays {
    pub fn none() -> Self {
        Self {
            eligibility: Duration::ZERO,
            ehr: Duration::ZERO,
            typing: Duration::ZERO,
            otp: Duration::ZERO,
            ocr: Duration::ZERO,
            submit: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub log_format: LogFormat,
    pub delays: Delays,
    pub fixtures_path: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            log_format: LogFormat::Json,
            delays: Delays::default(),
            fixtures_path: None,
        }
    }
}

impl ServiceConfig {
    /// Read configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same configuration with every simulated delay switched off
    pub fn without_delays() -> Self {
        Self {
            delays: Delays::none(),
            ..Self::default()
        }
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Delays::default();
        let millis = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(default)
        };

        Self {
            port: lookup("PORT")
                .and_then(|value| value.parse::<u16>().ok())
                .unwrap_or(3000),
            log_format: LogFormat::parse(&lookup("LOG_FORMAT").unwrap_or_default()),
            delays: Delays {
                eligibility: millis("ELIGIBILITY_DELAY_MS", defaults.eligibility),
                ehr: millis("EHR_DELAY_MS", defaults.ehr),
                typing: millis("TYPING_DELAY_MS", defaults.typing),
                otp: millis("OTP_DELAY_MS", defaults.otp),
                ocr: millis("OCR_DELAY_MS", defaults.ocr),
                submit: millis("SUBMIT_DELAY_MS", defaults.submit),
            },
            fixtures_path: lookup("FIXTURES_PATH")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> ServiceConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.delays, Delays::default());
        assert_eq!(config.delays.eligibility, Duration::from_millis(500));
        assert_eq!(config.delays.ehr, Duration::from_millis(800));
        assert!(config.fixtures_path.is_none());
    }

    #[test]
    fn overrides_and_bad_values() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("LOG_FORMAT", "pretty"),
            ("EHR_DELAY_MS", "0"),
            ("OCR_DELAY_MS", "soon"),
            ("FIXTURES_PATH", "/etc/intakepal/demo.yaml"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.delays.ehr, Duration::ZERO);
        assert_eq!(config.delays.ocr, Duration::from_millis(1500));
        assert_eq!(
            config.fixtures_path,
            Some(PathBuf::from("/etc/intakepal/demo.yaml"))
        );
    }
}
