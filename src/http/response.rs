use serde_json::Value;

use crate::constants::{
    CONTENT_TYPE_JSON, CONTENT_TYPE_TEXT, HEADER_ACCESS_CONTROL_ALLOW_ORIGIN, HEADER_CACHE_CONTROL,
};

pub fn json_response(value: &Value) -> warp::reply::Response {
    let json_string = serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string());
    build_response(CONTENT_TYPE_JSON, json_string)
}

/// Whole-body plain text reply.
pub fn text_response(text: String) -> warp::reply::Response {
    build_response(CONTENT_TYPE_TEXT, text)
}

fn build_response(content_type: &str, body: String) -> warp::reply::Response {
    let content_length = body.len();

    warp::http::Response::builder()
        .status(warp::http::StatusCode::OK)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length.to_string())
        .header("Cache-Control", HEADER_CACHE_CONTROL)
        .header(
            "Access-Control-Allow-Origin",
            HEADER_ACCESS_CONTROL_ALLOW_ORIGIN,
        )
        .body(body.into())
        .unwrap_or_else(|_| {
            let mut fallback = warp::reply::Response::new("Internal Server Error".into());
            *fallback.status_mut() = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}
