//! Wiring pieces of the `protectbridged` daemon that are shared with its
//! integration tests.

pub mod config;
pub mod health;
