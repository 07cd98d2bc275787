//! Real-time clock drivers

pub mod ds1337;

pub use ds1337::{Ds1337, TimeDate};
