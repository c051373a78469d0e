//! Board-agnostic plant logic for the Plantwatch firmware
//!
//! This crate contains everything that does not depend on a specific board:
//!
//! - Alarm registry with per-id configuration and bounded history
//! - Safety monitor with escalation and emergency shutdown
//! - Producer sweeps for modules, batteries, AC phases and DC circuits
//! - Supervisor that answers host commands
//! - Settings persistence format
//! - Hardware abstraction traits (frame sink, module control, config store)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod alarm;
pub mod persist;
pub mod safety;
pub mod supervisor;
pub mod sweep;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use supervisor::Supervisor;
