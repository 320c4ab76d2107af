//! chatbridge core library — config, channels, translation gateway, and the
//! message pipeline used by the CLI.

pub mod channels;
pub mod config;
pub mod gateway;
pub mod init;
pub mod pipeline;
pub mod routing;
pub mod translate;
