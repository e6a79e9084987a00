use std::sync::Arc;

use futures_util::StreamExt;
use serde_json::{Value, json};
use warp::Filter;
use warp::http::StatusCode;

use super::fakes::{
    ScriptedPromptProvider, ScriptedStreamProvider, TEST_DIRECTIVE, bind_local, test_config,
};
use crate::error::RelayError;
use crate::model::{Message, Role};
use crate::providers::Fragment;
use crate::server::routes::create_routes;
use crate::server::{RelayServer, handle_rejection};

fn server(
    stream_provider: Arc<ScriptedStreamProvider>,
    prompt_provider: Arc<ScriptedPromptProvider>,
) -> Arc<RelayServer> {
    Arc::new(RelayServer::with_providers(
        test_config(),
        stream_provider,
        prompt_provider,
    ))
}

fn order_complaint() -> Value {
    json!([{"role": "user", "content": "My order didn't arrive"}])
}

fn error_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("error body should be JSON")
}

#[tokio::test]
async fn streaming_route_relays_fragments_with_directive_first() {
    let stream_provider = Arc::new(ScriptedStreamProvider::replying(vec![
        Ok(Fragment::default()),
        Ok(Fragment::from("Sorry to hear ")),
        Ok(Fragment::from("that.")),
    ]));
    let prompt_provider = Arc::new(ScriptedPromptProvider::replying("unused"));
    let relay = server(stream_provider.clone(), prompt_provider.clone());
    let routes = create_routes(relay).recover(handle_rejection);

    let response = warp::test::request()
        .method("POST")
        .path("/api/chat")
        .json(&order_complaint())
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body().as_ref(), b"Sorry to hear that.");
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );

    let calls = stream_provider.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0],
        vec![
            Message::system(TEST_DIRECTIVE),
            Message::new(Role::User, "My order didn't arrive"),
        ]
    );
    assert!(prompt_provider.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn streaming_route_with_no_fragments_returns_empty_body() {
    let stream_provider = Arc::new(ScriptedStreamProvider::replying(vec![]));
    let prompt_provider = Arc::new(ScriptedPromptProvider::replying("unused"));
    let routes = create_routes(server(stream_provider, prompt_provider)).recover(handle_rejection);

    let response = warp::test::request()
        .method("POST")
        .path("/api/chat")
        .json(&order_complaint())
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.body().is_empty());
}

#[tokio::test]
async fn streaming_route_reports_open_failure_as_json() {
    let stream_provider = Arc::new(ScriptedStreamProvider::failing_to_open(
        RelayError::provider_authentication("OPENAI_API_KEY is not configured"),
    ));
    let prompt_provider = Arc::new(ScriptedPromptProvider::replying("unused"));
    let routes = create_routes(server(stream_provider, prompt_provider)).recover(handle_rejection);

    let response = warp::test::request()
        .method("POST")
        .path("/api/chat")
        .json(&order_complaint())
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = error_body(response.body());
    assert_eq!(body["error"], "OPENAI_API_KEY is not configured");
    assert_eq!(body["status"], 502);
}

#[tokio::test]
async fn upstream_failure_mid_stream_aborts_the_http_body() {
    let stream_provider = Arc::new(ScriptedStreamProvider::replying(vec![
        Ok(Fragment::from("one ")),
        Ok(Fragment::from("two ")),
        Err(RelayError::provider_response("connection reset".to_string())),
    ]));
    let prompt_provider = Arc::new(ScriptedPromptProvider::replying("unused"));
    let routes = create_routes(server(stream_provider, prompt_provider)).recover(handle_rejection);

    let (listener, base_url) = bind_local().await;
    tokio::spawn(warp::serve(routes).incoming(listener).run());

    let response = reqwest::Client::new()
        .post(format!("{}/api/chat", base_url))
        .json(&order_complaint())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let mut received = Vec::new();
    let mut transfer_failed = false;
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => received.extend_from_slice(&bytes),
            Err(_) => {
                transfer_failed = true;
                break;
            }
        }
    }

    assert!(transfer_failed, "body should end in a transfer error, got {:?}", received);
    assert!(b"one two ".starts_with(&received));
}

#[tokio::test]
async fn buffered_route_sends_flattened_prompt_and_returns_text() {
    let stream_provider = Arc::new(ScriptedStreamProvider::replying(vec![]));
    let prompt_provider = Arc::new(ScriptedPromptProvider::replying(
        "I'm sorry your order hasn't arrived.\nCould you share the order number?",
    ));
    let relay = server(stream_provider.clone(), prompt_provider.clone());
    let routes = create_routes(relay).recover(handle_rejection);

    let response = warp::test::request()
        .method("POST")
        .path("/api/chat/buffered")
        .json(&order_complaint())
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/plain; charset=utf-8"
    );
    assert_eq!(
        response.body().as_ref(),
        "I'm sorry your order hasn't arrived.\nCould you share the order number?".as_bytes()
    );

    let prompts = prompt_provider.prompts.lock().unwrap();
    assert_eq!(
        prompts.as_slice(),
        [format!("{}\nuser: My order didn't arrive", TEST_DIRECTIVE)]
    );
    assert!(stream_provider.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn buffered_route_fails_whole_request_on_provider_error() {
    let stream_provider = Arc::new(ScriptedStreamProvider::replying(vec![]));
    let prompt_provider = Arc::new(ScriptedPromptProvider::failing(
        RelayError::provider_timeout(),
    ));
    let routes = create_routes(server(stream_provider, prompt_provider)).recover(handle_rejection);

    let response = warp::test::request()
        .method("POST")
        .path("/api/chat/buffered")
        .json(&order_complaint())
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(error_body(response.body())["status"], 504);
}

#[tokio::test]
async fn malformed_conversation_is_rejected_before_any_provider_call() {
    let stream_provider = Arc::new(ScriptedStreamProvider::replying(vec![]));
    let prompt_provider = Arc::new(ScriptedPromptProvider::replying("unused"));
    let relay = server(stream_provider.clone(), prompt_provider.clone());
    let routes = create_routes(relay).recover(handle_rejection);

    for path in ["/api/chat", "/api/chat/buffered"] {
        let response = warp::test::request()
            .method("POST")
            .path(path)
            .json(&json!({"role": "user", "content": "not wrapped in an array"}))
            .reply(&routes)
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", path);
        let body = error_body(response.body());
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("invalid conversation body")
        );
    }

    assert!(stream_provider.calls.lock().unwrap().is_empty());
    assert!(prompt_provider.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn chat_routes_only_accept_post() {
    let stream_provider = Arc::new(ScriptedStreamProvider::replying(vec![]));
    let prompt_provider = Arc::new(ScriptedPromptProvider::replying("unused"));
    let routes = create_routes(server(stream_provider, prompt_provider)).recover(handle_rejection);

    let response = warp::test::request()
        .method("GET")
        .path("/api/chat")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn health_reports_providers_without_secrets() {
    let stream_provider = Arc::new(ScriptedStreamProvider::replying(vec![]));
    let prompt_provider = Arc::new(ScriptedPromptProvider::replying("unused"));
    let routes = create_routes(server(stream_provider, prompt_provider)).recover(handle_rejection);

    let response = warp::test::request()
        .method("GET")
        .path("/health")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["providers"]["stream"]["model"], "scripted-chat");
    assert_eq!(body["providers"]["stream"]["credentials_configured"], true);
    assert_eq!(body["providers"]["buffered"]["credentials_configured"], false);
    assert!(!String::from_utf8_lossy(response.body()).contains("sk-test"));
}
