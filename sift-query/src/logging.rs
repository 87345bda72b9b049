//! Logging setup for Sift.
//!
//! The compiler logs through `tracing`. Nothing is printed unless a
//! subscriber is installed, either by the host application or by [`init`]
//! when the `tracing-subscriber` feature is enabled.
//!
//! # Environment Variables
//!
//! - `SIFT_DEBUG=true|1|yes` enables debug logging
//! - `SIFT_LOG_LEVEL=trace|debug|info|warn|error` sets the level
//! - `SIFT_LOG_FORMAT=json|pretty|compact` sets the output format (default: json)
//!
//! ```rust,no_run
//! use sift_query::logging;
//!
//! logging::init();
//! ```
//!
//! Events emitted by the compiler:
//!
//! | level | event |
//! |-------|-------|
//! | trace | each leaf as it is emitted |
//! | debug | each compiled specification, unknown fields skipped in lenient mode |
//! | info  | each compiled specification when `log_compilations` is on |
//! | warn  | unknown fields rejected in strict mode |

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

const DEBUG_VAR: &str = "SIFT_DEBUG";
const LEVEL_VAR: &str = "SIFT_LOG_LEVEL";
const FORMAT_VAR: &str = "SIFT_LOG_FORMAT";

/// Output format of the bundled subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line, human readable.
    Pretty,
    /// Single-line, human readable.
    Compact,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "compact" => Self::Compact,
            _ => Self::Json,
        }
    }

    /// Get the format name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        }
    }
}

/// Check if `SIFT_DEBUG` is set to "true", "1" or "yes" (case-insensitive).
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var(DEBUG_VAR)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// The level from `SIFT_LOG_LEVEL`, falling back to "debug" when
/// `SIFT_DEBUG` is on and "warn" otherwise.
pub fn get_log_level() -> &'static str {
    let fallback = if is_debug_enabled() { "debug" } else { "warn" };
    match env::var(LEVEL_VAR) {
        Ok(level) => match level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

/// The format from `SIFT_LOG_FORMAT`.
pub fn get_log_format() -> LogFormat {
    env::var(FORMAT_VAR)
        .map(|f| LogFormat::parse(&f))
        .unwrap_or_default()
}

/// Install the bundled subscriber. Later calls are no-ops, as are calls
/// when neither `SIFT_DEBUG` nor `SIFT_LOG_LEVEL` is set.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var(LEVEL_VAR).is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = get_log_level();
            let format = get_log_format();
            let filter = EnvFilter::try_new(format!(
                "sift={},sift_query={},sift_schema={}",
                level, level, level
            ))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

            let registry = tracing_subscriber::registry().with(filter);
            match format {
                LogFormat::Json => registry.with(fmt::layer().json()).init(),
                LogFormat::Compact => registry.with(fmt::layer().compact()).init(),
                LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
            }

            tracing::info!(log_level = level, format = format.as_str(), "Sift logging initialized");
        }
    });
}

/// Set `SIFT_LOG_LEVEL` and call [`init`].
///
/// # Safety
///
/// This modifies the process environment. Call it at startup, before
/// spawning threads.
pub fn init_with_level(level: &str) {
    // SAFETY: documented as startup-only.
    unsafe {
        env::set_var(LEVEL_VAR, level);
    }
    init();
}

/// Set `SIFT_DEBUG=true` and call [`init`].
///
/// # Safety
///
/// This modifies the process environment. Call it at startup, before
/// spawning threads.
pub fn init_debug() {
    // SAFETY: documented as startup-only.
    unsafe {
        env::set_var(DEBUG_VAR, "true");
    }
    init();
}

/// Debug event, emitted only when `SIFT_DEBUG` is on.
#[macro_export]
macro_rules! sift_debug {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            tracing::debug!($($arg)*);
        }
    };
}

/// Trace event, emitted only when `SIFT_DEBUG` is on.
#[macro_export]
macro_rules! sift_trace {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            tracing::trace!($($arg)*);
        }
    };
}
