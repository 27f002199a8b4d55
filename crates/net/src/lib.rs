#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! HTTP transport for otaup
//!
//! A thin wrapper over reqwest: one client per updater, streaming downloads
//! with incremental digest verification. There is no retry logic here; retry
//! policy belongs to the boot loop that invokes the engine.

mod client;
mod download;

pub use client::{NetClient, NetConfig};
pub use download::{download_file, fetch_text, DownloadResult};
