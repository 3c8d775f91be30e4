//! Onbid feature module
//!
//! Batch trigger and interactive listing query over the Onbid open-data API.
//! No authentication; the web tier in front of this server handles users.

pub mod routes;

#[cfg(test)]
mod routes_test;

pub use routes::{onbid_routes, OnbidState};
