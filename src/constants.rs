/// Field names read from each log object
pub const FIELD_ACTION: &str = "action";
pub const FIELD_PAGE: &str = "page";
pub const FIELD_SESSION_ID: &str = "sessionId";
pub const FIELD_TIMESTAMP: &str = "timestamp";

// Defaults applied when a field is missing or null
pub const DEFAULT_ACTION: &str = "unknown";
pub const DEFAULT_PAGE: &str = "/";
pub const DEFAULT_SESSION_ID: &str = "no-session";
pub const DEFAULT_TIMESTAMP: &str = "";

/// Hour bucket used when the timestamp cannot be split
pub const UNKNOWN_HOUR: &str = "unknown";

/// Number of session id characters kept in output labels
pub const SESSION_LABEL_CHARS: usize = 8;

/// Counter group reported to streaming frameworks
pub const COUNTER_GROUP: &str = "WebLogMetrics";

// Job defaults
pub const DEFAULT_REDUCERS: usize = 2;
pub const DEFAULT_SPLIT_LINES: usize = 10_000;
pub const DEFAULT_CONFIG_FILE: &str = "weblog_metrics.toml";

/// Marker file written after a successful run
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Name of the part file for a reduce partition, Hadoop style
pub fn part_file_name(partition: usize) -> String {
    format!("part-r-{:05}", partition)
}
