use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::constants::{LOG_PREFIX_CONN, ROUTE_CHAT_STREAM};
use crate::error::RelayError;
use crate::handlers::RequestContext;
use crate::logging::{log_handler_io, log_request, log_timed};
use crate::model::{Conversation, with_system_directive};
use crate::streaming::relay_fragments;

/// `POST /api/chat`: relays the streamed reply as it arrives.
///
/// Failures while opening the upstream stream are returned as a normal
/// error response; failures after that abort the response body.
pub async fn handle_chat_stream(
    context: RequestContext<'_>,
    conversation: Conversation,
    cancellation_token: CancellationToken,
) -> Result<warp::reply::Response, RelayError> {
    let start_time = Instant::now();
    log_request("POST", ROUTE_CHAT_STREAM, conversation.len());
    log_handler_io("chat", Some(&conversation), None);

    let messages = with_system_directive(context.system_prompt, &conversation);

    let fragments = context
        .stream_provider
        .stream_chat(&messages, cancellation_token.clone())
        .await?;

    log_timed(
        LOG_PREFIX_CONN,
        &format!(
            "{} stream opened ({})",
            context.stream_provider.name(),
            context.stream_provider.model()
        ),
        start_time,
    );

    relay_fragments(fragments, cancellation_token, context.stream_timeout)
}
