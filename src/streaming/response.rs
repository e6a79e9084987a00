use futures_util::StreamExt;
use http_body_util::StreamBody;
use tokio::sync::mpsc;

use crate::constants::{CONTENT_TYPE_TEXT, HEADER_ACCESS_CONTROL_ALLOW_ORIGIN, HEADER_CACHE_CONTROL};
use crate::error::RelayError;

/// Wraps the relay's receiving half into a chunked `text/plain` response.
///
/// An `Err` item aborts the body mid-transfer instead of ending it cleanly.
pub fn create_streaming_response(
    rx: mpsc::UnboundedReceiver<Result<bytes::Bytes, std::io::Error>>,
) -> Result<warp::reply::Response, RelayError> {
    use bytes::Bytes;

    let stream = tokio_stream::wrappers::UnboundedReceiverStream::new(rx);
    // Same frame mapping warp uses internally for wrapped streams
    let mapped_stream = stream.map(|item: Result<Bytes, std::io::Error>| {
        item.map(warp::hyper::body::Frame::data)
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
    });

    let body_impl = StreamBody::new(mapped_stream);
    let boxed_body = http_body_util::BodyExt::boxed(body_impl);

    let temp_response = warp::http::Response::builder()
        .status(warp::http::StatusCode::OK)
        .header("content-type", CONTENT_TYPE_TEXT)
        .header("cache-control", HEADER_CACHE_CONTROL)
        .header("x-content-type-options", "nosniff")
        .header(
            "access-control-allow-origin",
            HEADER_ACCESS_CONTROL_ALLOW_ORIGIN,
        )
        .body(boxed_body)
        .map_err(|_| RelayError::internal_server_error("failed to create chat stream response"))?;

    // SAFETY: mirrors warp's internal `Body` wrapper around a boxed body for
    // the pinned warp 0.4 release. Not checked by the compiler; revisit on
    // any warp upgrade.
    Ok(unsafe {
        std::mem::transmute::<
            warp::http::Response<
                http_body_util::combinators::BoxBody<
                    bytes::Bytes,
                    Box<dyn std::error::Error + Send + Sync>,
                >,
            >,
            warp::reply::Response,
        >(temp_response)
    })
}
