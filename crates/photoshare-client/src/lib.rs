//! # photoshare-client
//!
//! Client side of PhotoShare: typed data and storage facades, the identity
//! session provider, the route guard and one controller per page.  The
//! `photoshare` binary drives these against the local backend.

pub mod controllers;
pub mod data_client;
pub mod error;
pub mod routes;
pub mod session;
pub mod session_file;
pub mod state;
pub mod storage;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

use tracing_subscriber::{fmt, EnvFilter};

pub use crate::error::{ClientError, Result};
pub use crate::state::AppContext;

/// Install the global subscriber; `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,photoshare_client=debug,photoshare_backend=info,photoshare_store=info")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
