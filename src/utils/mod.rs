/// Settings loading (YAML file + environment overrides).
pub mod config;
/// Shared token usage accounting.
pub mod token_counter;
