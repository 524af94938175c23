//! Data types for the netlease network broker.
//!
//! This crate holds the shapes shared by the lease broker
//! (`netlease-runtime`) and the policy engine (`netlease`):
//! networks and catalog snapshots, request classes and purposes, and policy
//! decisions.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: no behavior beyond small lookups and conversions
//! * Serializable: every type round-trips through serde for diagnostics and config
//! * Platform-agnostic: "the network" is an opaque reference handed out by the platform layer

pub mod decision;
pub mod network;
pub mod request;

pub use decision::*;
pub use network::*;
pub use request::*;
