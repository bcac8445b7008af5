//! Typed settings and sortable lists for a Transmission client.

pub mod cli;
pub mod config;
pub mod model;
pub mod preferences;
pub mod rpc;
pub mod settings;
pub mod sorters;
pub mod usertypes;
