//! # pwbackup – Interchange
//!
//! Reading and writing saved-login export documents.

pub mod interchange;
