//! svc-deploy - build, ship and control a systemd-managed service
//!
//! This crate cross-compiles a service binary, copies it together with its
//! configuration and unit file to remote hosts over SSH, and drives the
//! service through systemd.

pub mod build;
pub mod cli;
pub mod config;
pub mod deploy;
pub mod remote;
pub mod service;

pub use config::DeployConfig;
pub use deploy::{DeployError, Result, Tasks};
