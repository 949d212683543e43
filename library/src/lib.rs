#![no_std]

#[macro_use]
mod fmt;

mod block;
mod config;
mod containers;
mod hal;
mod homing;
mod shared;
mod stepper;
mod timer;
mod tracer;
mod trapezoid;
mod xyz;

#[cfg(test)]
mod sim;

pub use block::*;
pub use config::*;
pub use containers::*;
pub use hal::*;
pub use homing::*;
pub use shared::*;
pub use stepper::*;
pub use timer::*;
pub use tracer::*;
pub use trapezoid::*;
pub use xyz::*;
