#![doc = include_str!("../README.md")]

mod batch;
mod checksum;
mod codec;
mod error;
mod id;
mod provider;
mod sampler;
mod time;
mod window;

pub use crate::batch::*;
pub use crate::checksum::*;
pub use crate::codec::*;
pub use crate::error::*;
pub use crate::id::*;
pub use crate::provider::*;
pub use crate::sampler::*;
pub use crate::time::*;
pub use crate::window::*;

// Re-exported so callers can name the date type used across the API without
// depending on `chrono` directly.
pub use chrono::NaiveDate;
pub use tokio_util::sync::CancellationToken;
