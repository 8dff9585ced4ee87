//! Process-wide tracing setup shared by the binaries.
//!
//! Libraries in this workspace only emit `tracing` events; installing a
//! subscriber is left to the process, through [`init`] or
//! [`init_with_default`].

pub use ::tracing::Level;

/// Install the JSON subscriber, filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; only the first call installs anything.
pub fn init() {
    tracing::init(tracing::DEFAULT_DIRECTIVE);
}

/// Like [`init`], with `level` as the filter used when `RUST_LOG` is unset.
pub fn init_with_default(level: Level) {
    tracing::init(&level.to_string().to_ascii_lowercase());
}

/// Subscriber construction.
pub mod tracing;
