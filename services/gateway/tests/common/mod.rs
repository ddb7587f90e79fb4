#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use api_gateway::{router, Config, Gateway};
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use test_utils::unreachable_upstream;

pub const CLIENT: &str = "192.0.2.10:40000";

/// Config with every upstream pointing at `unreachable_upstream()` unless
/// overridden.
pub fn config(auth: Option<&str>, products: Option<&str>, orders: Option<&str>) -> Config {
    let dead = unreachable_upstream();
    Config::for_upstreams(
        auth.unwrap_or(&dead),
        products.unwrap_or(&dead),
        orders.unwrap_or(&dead),
    )
    .unwrap()
}

pub fn app(config: &Config) -> (Router, Arc<Gateway>) {
    let gateway = Arc::new(Gateway::from_config(config).unwrap());
    (router(Arc::clone(&gateway), &config.cors_origin), gateway)
}

pub fn request(method: Method, uri: &str) -> Request<Body> {
    request_from(method, uri, CLIENT)
}

pub fn request_from(method: Method, uri: &str, client: &str) -> Request<Body> {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let peer: SocketAddr = client.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));
    request
}

pub fn with_header(mut request: Request<Body>, name: &'static str, value: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert(name, value.parse().unwrap());
    request
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn json_body(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
