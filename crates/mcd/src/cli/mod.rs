//! Subcommand implementations

pub mod info;
pub mod init;
pub mod serve;
