//! # pwbackup-interchange: saved-login export documents
//!
//! Reads and writes the XML and quoted-CSV export dialects, current and
//! legacy:
//! - **XML**: `<xml><entries ...><entry .../></entries></xml>`
//! - **CSV**: header comment, label line, seven quoted columns
//! - **Legacy**: 1.0.2 / 1.0.4 / 1.1 documents from the predecessor engine
//! - **Disabled hosts**: `type="rejected"` XML documents
//!
//! Architecture:
//! - `types`: layouts, raw entries, export options and outcome
//! - `escape`: XML / CSV escaping, quote-aware splitting, legacy unescape
//! - `obfuscation`: base64 username/password obfuscation
//! - `detect`: header reading and layout classification
//! - `xml_parser` / `csv_parser`: document → raw entries
//! - `upgrade`: old signon layout → current layout
//! - `normalize`: raw entries → canonical login records
//! - `xml_writer` / `csv_writer`: login records → document
//! - `disabled_hosts`: never-save list export/import
//! - `service`: high-level orchestrator

pub mod types;
pub mod escape;
pub mod obfuscation;
pub mod detect;
pub mod xml_parser;
pub mod csv_parser;
pub mod upgrade;
pub mod normalize;
pub mod xml_writer;
pub mod csv_writer;
pub mod disabled_hosts;
pub mod service;

// Re-exports
pub use types::*;
pub use detect::{detect, detect_document, DetectedDocument};
pub use normalize::{normalize_all, normalize_entry, NormalizeOutcome};
pub use service::{decode_document, default_file_name, InterchangeService, PreparedImport};
