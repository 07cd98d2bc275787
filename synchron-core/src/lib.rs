//! Board-agnostic I2C master transaction engine
//!
//! This crate contains the transaction state machine that sequences an
//! I2C master peripheral through single-byte reads, single-byte writes,
//! and multi-byte burst writes against register-addressed devices:
//!
//! - Transaction engine with bounded flag waits ([`master::I2cMaster`])
//! - Error taxonomy with per-wait-step diagnosis ([`error::BusError`])
//! - Scripted peripheral simulation for host testing ([`sim::SimPort`])
//!
//! The engine drives hardware only through the [`synchron_hal::I2cPort`]
//! trait, so anything from real register blocks to the bundled simulation
//! can sit underneath it.

#![no_std]
#![deny(unsafe_code)]

pub mod error;
pub mod master;
pub mod sim;

pub use error::{BusError, WaitPhase};
pub use master::{I2cMaster, MasterConfig};
