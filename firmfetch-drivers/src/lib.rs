//! Driver layer for browser automation.
//!
//! This crate exposes the browser seam used by the harvest loop and its
//! WebDriver-backed implementation.
//!
//! - [`browser::Browser`] / [`browser::PageElement`]: what the harvest loop needs from a page
//! - [`browser::driver::WebDriverBrowser`]: `fantoccini` client wrapper
//! - [`browser::probe`]: element probes and selector fallback chains
//! - [`browser::pacing::Pacer`]: fixed delays between interactions
//! - [`browser::options`]: Chrome command-line arguments
pub mod browser;
