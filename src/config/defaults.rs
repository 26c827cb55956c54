//! Configuration defaults and fixed constants

/// The provider only guarantees compliance data this many seconds after a
/// window closes.
pub const COMPLIANCE_MIN_LATENCY_SECS: i64 = 300;

/// Default window length in seconds.
pub const DEFAULT_QUERY_LENGTH_SECS: u64 = 600;

/// Default sleep increment between steady-state windows.
pub const DEFAULT_SLEEP_TIME_SECS: u64 = 10;

/// Default sleep increment while holding off before the first window.
pub const DEFAULT_HOLD_OFF_SECS: u64 = 30;

/// How far back the first window starts when resuming without a checkpoint.
pub const DEFAULT_INITIAL_GO_BACK_HOURS: f64 = 24.0;

/// Default output root.
pub const DEFAULT_OUT_BOX: &str = "./data";

/// Default checkpoint file.
pub const DEFAULT_CHECKPOINT_FILE: &str = "./start_time.dat";

/// Default configuration file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "./config.yaml";

/// Default compliance endpoint root; the account name is appended.
pub const DEFAULT_BASE_URL: &str = "https://compliance.gnip.com/accounts/";

/// Default publisher segment of the endpoint URL.
pub const DEFAULT_PUBLISHER: &str = "twitter";

/// Default HTTP request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// The only storage backend implemented.
pub const STORAGE_FILES: &str = "files";

/// `start_time` value that selects checkpoint-resume mode.
pub const START_FROM_FILE: &str = "file";
