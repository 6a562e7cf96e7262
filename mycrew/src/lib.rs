#![doc = include_str!("../README.md")]
#![warn(
    unreachable_pub,
    missing_debug_implementations,
    missing_docs,
    clippy::pedantic
)]

mod client;
pub mod schedule;
mod token;
mod window;

pub use client::*;
pub use token::{AuthError, Token};
pub use window::Window;
