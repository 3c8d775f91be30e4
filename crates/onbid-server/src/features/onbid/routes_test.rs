use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::routes::{onbid_routes, OnbidState};
use crate::ingest::onbid::config::DEFAULT_LIST_ENDPOINT;
use crate::ingest::onbid::{
    IngestionPipeline, MemoryAuctionStore, OnbidApiConfig, OnbidClient, RunGuard,
};

fn page_xml(first: usize, count: usize) -> String {
    let items: String = (first..first + count)
        .map(|n| format!("<item><RNUM>{n}</RNUM><CLTR_NM>물건 {n}</CLTR_NM></item>"))
        .collect();
    format!(
        "<response><header><resultCode>00</resultCode><resultMsg>NORMAL SERVICE.</resultMsg></header>\
         <body><items>{items}</items><totalCount>{count}</totalCount></body></response>"
    )
}

async fn setup(server: &MockServer, pages: u32) -> (Router, MemoryAuctionStore) {
    let config = OnbidApiConfig::builder()
        .base_url(server.uri())
        .service_key("test-key")
        .total_pages(pages)
        .page_delay_ms(0)
        .build();
    let client = OnbidClient::new(config).unwrap();
    let store = MemoryAuctionStore::new();
    let pipeline = IngestionPipeline::new(client.clone(), store.clone(), RunGuard::new())
        .with_page_delay(Duration::ZERO);

    let state = OnbidState {
        pipeline: Arc::new(pipeline),
        client,
    };
    (onbid_routes().with_state(state), store)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_batch_returns_summary() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DEFAULT_LIST_ENDPOINT))
        .and(query_param("pageNo", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page_xml(1, 3)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DEFAULT_LIST_ENDPOINT))
        .and(query_param("pageNo", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page_xml(4, 2)))
        .mount(&server)
        .await;

    let (app, store) = setup(&server, 2).await;
    let (status, body) = get(app, "/batch").await;

    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.starts_with("Loaded 5 records (pages 1-2) in "), "got {text}");
    assert!(text.ends_with(" s"));
    assert_eq!(store.len().await, 5);
}

#[tokio::test]
async fn test_batch_upstream_failure_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DEFAULT_LIST_ENDPOINT))
        .respond_with(ResponseTemplate::new(500).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let (app, store) = setup(&server, 1).await;
    let (status, body) = get(app, "/batch").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"]["status"], 502);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_list_forwards_filters_and_normalizes() {
    let server = MockServer::start().await;
    let xml = "<response><body><items>\
               <item><CLTR_NM> 아파트 </CLTR_NM><CLTR_MNMT_NO>2024-0001</CLTR_MNMT_NO></item>\
               </items><totalCount>1</totalCount></body></response>";
    Mock::given(method("GET"))
        .and(path(DEFAULT_LIST_ENDPOINT))
        .and(query_param("serviceKey", "test-key"))
        .and(query_param("numOfRows", "5"))
        .and(query_param("pageNo", "2"))
        .and(query_param("DPSL_MTD_CD", "0001"))
        .and(query_param("SIDO", "서울특별시"))
        .and(query_param_is_missing("SGK"))
        .respond_with(ResponseTemplate::new(200).set_body_string(xml))
        .mount(&server)
        .await;

    let (app, _store) = setup(&server, 1).await;
    let uri = "/list?numOfRows=5&pageNo=2&sido=%EC%84%9C%EC%9A%B8%ED%8A%B9%EB%B3%84%EC%8B%9C&sgk=";
    let (status, body) = get(app, uri).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["totalCount"], 1);
    assert_eq!(json["items"][0]["cltrNm"], "아파트");
    assert_eq!(json["items"][0]["cltrMnmtNo"], "2024-0001");
}

#[tokio::test]
async fn test_list_rejects_zero_page() {
    let server = MockServer::start().await;
    let (app, _store) = setup(&server, 1).await;

    let (status, _) = get(app, "/list?pageNo=0").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DEFAULT_LIST_ENDPOINT))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (app, _store) = setup(&server, 1).await;
    let (status, _) = get(app, "/list").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
}
