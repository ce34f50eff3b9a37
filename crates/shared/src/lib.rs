//! Types shared between the prediction client and its front ends.

pub mod domain;
pub mod error;
pub mod format;
pub mod protocol;
