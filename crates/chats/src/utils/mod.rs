//! Internal helpers for the chat services.

pub mod permissions;

pub use permissions::{AccessGate, Authorization, MutationKind, Visibility};
