use std::time::Duration;

/// Quiet period after the last playback sample before progress is saved
pub const DEFAULT_AUTOSAVE_QUIET_PERIOD: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the server, without the `/api` suffix
    pub host: String,
    pub autosave_quiet_period: Duration,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>) -> ClientConfig {
        ClientConfig {
            host: host.into(),
            autosave_quiet_period: DEFAULT_AUTOSAVE_QUIET_PERIOD,
        }
    }
}
