use crate::error::{DispatchError, Result};
use crate::routing::{SolverMode, VehicleProfile};
use chrono::NaiveTime;

/// Top-level configuration, injected explicitly into the components that
/// need it. Nothing in the crate reads ambient global state.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub database_url: String,
    pub bind_address: String,
    pub event_buffer_size: usize,
    pub routing: RoutingConfig,
    pub shift: ShiftConfig,
}

/// Route matrix service connection settings.
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
    pub default_vehicle: VehicleProfile,
    pub default_mode: SolverMode,
}

/// Shift window and auto-close settings. All times are UTC wall-clock.
#[derive(Debug, Clone)]
pub struct ShiftConfig {
    /// Earliest session start covered by the daily sweep
    pub window_start: NaiveTime,
    /// Latest session start covered by the daily sweep
    pub window_end: NaiveTime,
    /// Time of day the auto-close sweep fires
    pub auto_close_at: NaiveTime,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            database_url: "postgresql://localhost/dispatch_development".to_string(),
            bind_address: "0.0.0.0:8080".to_string(),
            event_buffer_size: 1024,
            routing: RoutingConfig {
                endpoint: "http://localhost:5000".to_string(),
                timeout_ms: 10_000,
                default_vehicle: VehicleProfile::Motorbike,
                default_mode: SolverMode::Fastest,
            },
            shift: ShiftConfig {
                window_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                window_end: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                auto_close_at: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            },
        }
    }
}

impl DispatchConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(db_url) = std::env::var("DATABASE_URL") {
            config.database_url = db_url;
        }

        if let Ok(bind) = std::env::var("DISPATCH_BIND_ADDRESS") {
            config.bind_address = bind;
        }

        if let Ok(endpoint) = std::env::var("DISPATCH_ROUTING_URL") {
            config.routing.endpoint = endpoint;
        }

        if let Ok(timeout) = std::env::var("DISPATCH_ROUTING_TIMEOUT_MS") {
            config.routing.timeout_ms = timeout.parse().map_err(|e| {
                DispatchError::ConfigurationError(format!("Invalid routing timeout: {e}"))
            })?;
        }

        if let Ok(start) = std::env::var("DISPATCH_SHIFT_START") {
            config.shift.window_start = parse_time("DISPATCH_SHIFT_START", &start)?;
        }

        if let Ok(end) = std::env::var("DISPATCH_SHIFT_END") {
            config.shift.window_end = parse_time("DISPATCH_SHIFT_END", &end)?;
        }

        if let Ok(cutoff) = std::env::var("DISPATCH_AUTO_CLOSE_AT") {
            config.shift.auto_close_at = parse_time("DISPATCH_AUTO_CLOSE_AT", &cutoff)?;
        }

        Ok(config)
    }
}

fn parse_time(name: &str, value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|e| DispatchError::ConfigurationError(format!("Invalid {name} ({value}): {e}")))
}
