#![doc = "layerkit-core: core logic library for layerkit."]

//! This crate holds the two utilities shipped with the layer stack:
//! - the document renderer: HTML sources → per-source PDFs in headless Chromium
//!   → one merged PDF on disk ([`render`], [`chromium`], [`merge`], [`document`])
//! - the bucket lister: an S3 client with a capped exponential retry policy
//!   ([`storage`], [`retry`])
//!
//! External engines are reached through the traits in [`contract`].

pub mod chromium;
pub mod config;
pub mod contract;
pub mod document;
pub mod error;
pub mod merge;
pub mod render;
pub mod retry;
pub mod storage;
