/// Record layout
pub const RECORD_TERMINATOR: u8 = b'\n';
pub const FIELD_SEPARATOR: u8 = b';';
pub const MINUS_SIGN: u8 = b'-';
pub const DECIMAL_POINT: u8 = b'.';

/// Temperatures are carried as integers scaled by this factor
pub const TEMPERATURE_SCALE: i64 = 10;

/// Processing defaults
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024 * 1024; // 32MB
pub const MIN_CHUNK_SIZE: usize = 16;
pub const DEFAULT_PARTIAL_CAPACITY: usize = 1024;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "MEASUREMENTS";

/// Pool size: one worker per processing unit plus one
pub fn default_workers() -> usize {
    num_cpus::get() + 1
}

pub fn default_merge_threads() -> usize {
    num_cpus::get()
}
