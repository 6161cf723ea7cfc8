//! Domain models for Emailer

pub mod email;

pub use email::*;
