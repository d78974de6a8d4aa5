//! Feed composition and the social graph.
//!
//! Every entry point takes the store and an explicit [`Viewer`]; nothing here
//! reads ambient request state.

pub mod comments;
mod convert;
pub mod error;
pub mod feed;
pub mod follow;
pub mod pagination;
pub mod posts;
pub mod viewer;

pub use error::{CoreError, Result};
pub use viewer::{Identity, Viewer};

#[cfg(test)]
pub(crate) mod testing;
