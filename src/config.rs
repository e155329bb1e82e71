use std::time::Duration;

/// Runtime tuning for a [`Camera`](crate::Camera).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraConfig {
    /// Upper bound for `wait_all_streams`. `None` blocks until frames arrive.
    pub wait_timeout: Option<Duration>,
    /// Warn once every this many dropped frames per stream. `0` disables the warning.
    pub drop_warn_interval: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            wait_timeout: None,
            drop_warn_interval: 30,
        }
    }
}

impl CameraConfig {
    /// Read overrides from the environment:
    /// - `UVCAM_WAIT_TIMEOUT_MS` (unset or `0` = wait indefinitely)
    /// - `UVCAM_DROP_WARN_INTERVAL`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let wait_timeout = match read_env_u64("UVCAM_WAIT_TIMEOUT_MS", 0) {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        Self {
            wait_timeout,
            drop_warn_interval: read_env_u64("UVCAM_DROP_WARN_INTERVAL", defaults.drop_warn_interval),
        }
    }
}

fn read_env_u64(name: &str, default: u64) -> u64 {
    parse_u64(std::env::var(name).ok().as_deref()).unwrap_or(default)
}

fn parse_u64(value: Option<&str>) -> Option<u64> {
    value.and_then(|v| v.trim().parse::<u64>().ok())
}
