#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

//! Shared error taxonomy, wire-size constants, and pool/event identifiers used
//! by both `octopus-crypto` and `octopus-wallet`. This crate carries no
//! cryptographic dependency of its own.

mod constants;
mod error;
mod ids;

pub use constants::*;
pub use error::{OctopusError, OctopusResult};
pub use ids::*;
