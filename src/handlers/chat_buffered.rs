use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::constants::{LOG_PREFIX_SUCCESS, ROUTE_CHAT_BUFFERED};
use crate::error::RelayError;
use crate::handlers::RequestContext;
use crate::http::text_response;
use crate::logging::{log_handler_io, log_request, log_timed};
use crate::model::{Conversation, flatten_prompt};

/// `POST /api/chat/buffered`: one prompt in, one complete text out.
pub async fn handle_chat_buffered(
    context: RequestContext<'_>,
    conversation: Conversation,
    cancellation_token: CancellationToken,
) -> Result<warp::reply::Response, RelayError> {
    let start_time = Instant::now();
    log_request("POST", ROUTE_CHAT_BUFFERED, conversation.len());

    let prompt = flatten_prompt(context.system_prompt, &conversation);
    let text = context
        .prompt_provider
        .generate(&prompt, cancellation_token)
        .await?;

    log_handler_io("chat buffered", Some(&conversation), Some(&text));
    log_timed(
        LOG_PREFIX_SUCCESS,
        &format!(
            "{} reply ({}) | {} chars",
            context.prompt_provider.name(),
            context.prompt_provider.model(),
            text.chars().count()
        ),
        start_time,
    );

    Ok(text_response(text))
}
