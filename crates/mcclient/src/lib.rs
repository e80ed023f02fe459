//! mcclient library interface
//!
//! File-level helpers on top of [`mccore::Client`] used by the `mcclient`
//! binary.

pub mod transfer;

pub use transfer::{connection_usable, download_files, download_to_dir, local_name_for, upload_files, upload_path};
