// This file exposes the modules as public modules in the crate

pub mod config;
pub mod locations;
pub mod mcp;
