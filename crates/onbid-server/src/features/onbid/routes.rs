//! Onbid routes
//!
//! - `GET /batch` runs one full ingestion synchronously and returns the
//!   summary line as plain text
//! - `GET /list` proxies one interactive query to the Onbid API and returns
//!   the normalized `{totalCount, items}` document

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tracing::info;

use crate::error::AppError;
use crate::ingest::onbid::{
    normalize_list_response, AuctionStore, IngestionPipeline, ListQuery, OnbidClient,
    OnbidListPage,
};

/// State shared by the Onbid handlers
pub struct OnbidState<S: AuctionStore> {
    pub pipeline: Arc<IngestionPipeline<S>>,
    pub client: OnbidClient,
}

impl<S: AuctionStore> Clone for OnbidState<S> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            client: self.client.clone(),
        }
    }
}

/// Create Onbid routes
pub fn onbid_routes<S>() -> Router<OnbidState<S>>
where
    S: AuctionStore + 'static,
{
    Router::new()
        .route("/batch", get(run_batch::<S>))
        .route("/list", get(list_items::<S>))
}

/// Run one ingestion
///
/// GET /batch
async fn run_batch<S>(State(state): State<OnbidState<S>>) -> Result<String, AppError>
where
    S: AuctionStore + 'static,
{
    info!("Batch ingestion triggered over HTTP");
    let summary = state.pipeline.run().await?;
    Ok(summary.summary())
}

/// Interactive listing query
///
/// GET /list?numOfRows=10&pageNo=1&prptDvsnCd=0001&sido=서울특별시
async fn list_items<S>(
    State(state): State<OnbidState<S>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<OnbidListPage>, AppError>
where
    S: AuctionStore + 'static,
{
    if query.num_of_rows == 0 || query.page_no == 0 {
        return Err(AppError::Validation(
            "numOfRows and pageNo must be greater than 0".to_string(),
        ));
    }

    let xml = state.client.fetch_list(&query).await?;
    let page = normalize_list_response(&xml)?;

    Ok(Json(page))
}
