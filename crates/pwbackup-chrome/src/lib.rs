//! # pwbackup – Chrome
//!
//! One-way migration of a Chromium browser's login database.

pub mod chrome;
