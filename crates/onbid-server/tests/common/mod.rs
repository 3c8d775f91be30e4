//! Shared fixtures for Onbid integration tests
//!
//! Builds list-operation XML documents and mounts them on a wiremock server
//! standing in for the Onbid API.

#![allow(dead_code)]

use onbid_server::ingest::onbid::config::DEFAULT_LIST_ENDPOINT;
use onbid_server::ingest::onbid::{OnbidApiConfig, OnbidClient};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One `<item>` with a row number, name and two image links
pub fn item_xml(n: usize) -> String {
    format!(
        "<item>\
           <RNUM>{n}</RNUM>\
           <CLTR_NM>서울 강남구 물건 {n}</CLTR_NM>\
           <CLTR_MNMT_NO>2025-{n:05}-001</CLTR_MNMT_NO>\
           <MIN_BID_PRC>{price}</MIN_BID_PRC>\
           <CLTR_IMG_FILES>\
             <CLTR_IMG_FILE>https://img.onbid.test/{n}/a.jpg</CLTR_IMG_FILE>\
             <CLTR_IMG_FILE>https://img.onbid.test/{n}/b.jpg</CLTR_IMG_FILE>\
           </CLTR_IMG_FILES>\
         </item>",
        price = n * 1000
    )
}

/// A full response page with `count` items numbered from `first`
pub fn page_xml(first: usize, count: usize) -> String {
    page_xml_with_code("00", first, count)
}

pub fn page_xml_with_code(code: &str, first: usize, count: usize) -> String {
    let items: String = (first..first + count).map(item_xml).collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <response>\
           <header><resultCode>{code}</resultCode><resultMsg>NORMAL SERVICE.</resultMsg></header>\
           <body><items>{items}</items><numOfRows>{count}</numOfRows><pageNo>1</pageNo><totalCount>{count}</totalCount></body>\
         </response>"
    )
}

/// Serve `body` for one `pageNo`
pub async fn mount_page(server: &MockServer, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path(DEFAULT_LIST_ENDPOINT))
        .and(query_param("pageNo", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Serve an error status for one `pageNo`
pub async fn mount_failure(server: &MockServer, page: u32, status: u16) {
    Mock::given(method("GET"))
        .and(path(DEFAULT_LIST_ENDPOINT))
        .and(query_param("pageNo", page.to_string()))
        .respond_with(ResponseTemplate::new(status).set_body_string("upstream unavailable"))
        .mount(server)
        .await;
}

/// Client pointed at the mock server, no page delay
pub fn client(server: &MockServer, pages: u32) -> OnbidClient {
    let config = OnbidApiConfig::builder()
        .base_url(server.uri())
        .service_key("test-key")
        .total_pages(pages)
        .page_delay_ms(0)
        .build();
    OnbidClient::new(config).expect("valid client config")
}
