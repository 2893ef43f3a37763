//! CLI command implementations.

pub mod clean;
pub mod convert;
pub mod init;
pub mod serve;
pub mod watch;
