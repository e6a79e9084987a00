use std::sync::Arc;

use warp::Filter;

use crate::constants::MAX_JSON_BODY_SIZE_BYTES;
use crate::handlers::{RequestContext, handle_chat_buffered, handle_chat_stream, handle_health_check};
use crate::http::json_response;
use crate::model::Conversation;
use crate::server::RelayServer;

pub fn create_routes(
    server: Arc<RelayServer>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let with_server_state = warp::any().map(move || server.clone());

    let health_route = warp::path!("health")
        .and(warp::get())
        .and(with_server_state.clone())
        .map(|s: Arc<RelayServer>| {
            let context = create_context(&s);
            json_response(&handle_health_check(&context))
        });

    let chat_stream_route = warp::path!("api" / "chat")
        .and(warp::post())
        .and(conversation_body())
        .and(with_server_state.clone())
        .and_then(|conversation: Conversation, s: Arc<RelayServer>| async move {
            let context = create_context(&s);
            let token = s.shutdown.child_token();
            handle_chat_stream(context, conversation, token)
                .await
                .map_err(warp::reject::custom)
        });

    let chat_buffered_route = warp::path!("api" / "chat" / "buffered")
        .and(warp::post())
        .and(conversation_body())
        .and(with_server_state.clone())
        .and_then(|conversation: Conversation, s: Arc<RelayServer>| async move {
            let context = create_context(&s);
            let token = s.shutdown.child_token();
            handle_chat_buffered(context, conversation, token)
                .await
                .map_err(warp::reject::custom)
        });

    health_route
        .or(chat_stream_route)
        .or(chat_buffered_route)
}

fn create_context(s: &Arc<RelayServer>) -> RequestContext<'_> {
    RequestContext {
        stream_provider: s.stream_provider.as_ref(),
        prompt_provider: s.prompt_provider.as_ref(),
        system_prompt: &s.config.system_prompt,
        stream_timeout: std::time::Duration::from_secs(s.config.stream_timeout_seconds),
    }
}

/// JSON array of messages; anything else is rejected before a handler runs.
fn conversation_body() -> impl Filter<Extract = (Conversation,), Error = warp::Rejection> + Clone {
    warp::body::content_length_limit(MAX_JSON_BODY_SIZE_BYTES).and(warp::body::json())
}
