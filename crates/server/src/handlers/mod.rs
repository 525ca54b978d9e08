//! HTTP request handlers.

pub mod admin;
pub mod common;
pub mod genes;
pub mod health;
pub mod matrices;

pub use admin::*;
pub use genes::*;
pub use health::*;
pub use matrices::*;
