//! Core library components.
//!
//! The crypto engine ([`cipher`]) and the repository state machine
//! ([`repo`]) never call each other; [`vault`] composes them.

pub mod cipher;
pub mod config;
pub mod constants;
pub mod identity;
pub mod repo;
pub mod store;
pub mod validation;
pub mod vault;
