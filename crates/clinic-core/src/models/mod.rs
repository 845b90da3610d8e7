//! Domain models for the clinic records system.

mod appointment;
mod patient;
mod treatment;

pub use appointment::*;
pub use patient::*;
pub use treatment::*;
