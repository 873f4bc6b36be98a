//! Common types and utilities shared across firmfetch crates.
//!
//! This crate defines the shared error type, observability helpers, and the
//! small path helpers used when laying out downloaded packages on disk. It is
//! intentionally lightweight so that every crate can depend on it.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`paths`]: Directory and file naming for saved packages
//! - [`FirmfetchError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use firmfetch_common::paths::safe_dir_name;
//!
//! assert_eq!(safe_dir_name("Windows Server 2022 LTSC"), "Windows Server 2022 LTSC");
//! assert_eq!(safe_dir_name("a/b:c"), "a_b_c");
//! ```

pub mod observability;
pub mod paths;

/// Error types used across the firmfetch workspace.
#[derive(thiserror::Error, Debug)]
pub enum FirmfetchError {
    /// The browser driver (WebDriver session, element calls) reported an error.
    #[error("Driver error: {0}")]
    Driver(#[from] anyhow::Error),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A page did not load or landed somewhere unexpected.
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// No operating-system option could be selected on the page.
    #[error("Selection error: {0}")]
    Selection(String),

    /// Fetching a package failed.
    #[error("Download error: {0}")]
    Download(String),

    /// Local filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenient alias for results that use [`FirmfetchError`].
pub type Result<T> = std::result::Result<T, FirmfetchError>;
