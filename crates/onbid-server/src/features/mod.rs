//! Feature modules implementing the Onbid API
//!
//! # Features
//!
//! - **onbid**: batch ingestion trigger and interactive auction listing query
//!
//! Each feature is a vertical slice with its own `routes.rs`; handlers stay
//! thin and delegate to the `ingest` module.

pub mod onbid;

use axum::Router;

use crate::ingest::onbid::AuctionStore;

pub use onbid::OnbidState;

/// Creates the API router with all feature routes mounted
///
/// - `/onbid` - batch trigger and listing query
pub fn router<S>(state: OnbidState<S>) -> Router<()>
where
    S: AuctionStore + 'static,
{
    Router::new().nest("/onbid", onbid::onbid_routes().with_state(state))
}
