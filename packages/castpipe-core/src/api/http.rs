//! HTTP route handlers.
//!
//! Every path resolves to the same file: the server exists to expose one
//! media artifact, and receivers are free to put whatever they like in
//! the request path.

use std::io;
use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{connect_info::ConnectInfo, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::Response,
    routing::get,
    Router,
};
use bytes::Bytes;
use futures::StreamExt;

use crate::api::{MediaHandler, TransferGuard};
use crate::error::{MediaError, MediaResult};
use crate::media::{ByteRange, RangeReader};
use crate::protocol_constants::{APP_NAME, RANGE_UNIT};

/// Creates the Axum router serving the configured file on every path.
///
/// `get` also answers `HEAD`; other methods get `405 Method Not Allowed`.
pub fn create_router(handler: MediaHandler) -> Router {
    Router::new()
        .route("/", get(serve_media))
        .route("/{*path}", get(serve_media))
        .with_state(handler)
}

/// Formats a `Content-Range` value for `range` out of `total` bytes.
///
/// An empty range has no first or last byte, so it is reported in the
/// unsatisfied form `bytes */<total>`.
pub fn content_range(range: ByteRange, total: u64) -> String {
    match range.last_byte() {
        Some(last) => format!("{RANGE_UNIT} {}-{}/{}", range.start, last, total),
        None => format!("{RANGE_UNIT} */{total}"),
    }
}

/// Answers a GET or HEAD for the served file with `206 Partial Content`.
///
/// Ranges longer than the chunked threshold are streamed with chunked
/// transfer coding; shorter ones are read whole and sent with a
/// `Content-Length`. HEAD computes the same headers and skips the read.
async fn serve_media(
    State(handler): State<MediaHandler>,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> MediaResult<Response> {
    let file = &handler.file;
    let range_header = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    let requested = ByteRange::parse(range_header, file.size());

    log::debug!(
        "[Media] {} {} from {}: range header={:?}, requested={}",
        method,
        uri.path(),
        remote_addr,
        range_header,
        requested
    );

    let reader = RangeReader::open(file.path(), requested)
        .await
        .map_err(|e| MediaError::from_io(e, file.path()))?;
    let range = reader.range();
    let is_head = method == Method::HEAD;

    let builder = Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(header::SERVER, APP_NAME)
        .header(header::ACCEPT_RANGES, RANGE_UNIT)
        .header(header::CONTENT_TYPE, file.content_type());

    if handler.streaming.use_chunked(range.len()) {
        let builder = builder
            .header(header::TRANSFER_ENCODING, "chunked")
            .header(header::CONTENT_RANGE, content_range(range, reader.true_end()));

        if is_head {
            // An unsized body keeps the GET framing: no Content-Length is
            // inserted for it.
            let empty = futures::stream::empty::<io::Result<Bytes>>();
            return finish(builder, Body::from_stream(empty));
        }

        let mut guard = TransferGuard::new(remote_addr, range);
        let chunks = reader
            .into_chunks(handler.streaming.chunk_size)
            .map(move |item| {
                guard.record(&item);
                item
            });
        return finish(builder, Body::from_stream(chunks));
    }

    if is_head {
        let builder = builder
            .header(header::CONTENT_LENGTH, range.len())
            .header(header::CONTENT_RANGE, content_range(range, file.size()));
        return finish(builder, Body::empty());
    }

    let body = reader
        .read_bounded()
        .await
        .map_err(MediaError::FileUnreadable)?;
    let returned = ByteRange::new(range.start, range.start + body.len() as u64);

    log::debug!(
        "[Media] Fixed response to {}: {} bytes at offset {}",
        remote_addr,
        body.len(),
        range.start
    );

    let builder = builder
        .header(header::CONTENT_LENGTH, body.len())
        .header(header::CONTENT_RANGE, content_range(returned, file.size()));
    finish(builder, Body::from(body))
}

fn finish(builder: axum::http::response::Builder, body: Body) -> MediaResult<Response> {
    builder
        .body(body)
        .map_err(|e| MediaError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::media::ServedFile;
    use crate::state::StreamingConfig;

    fn router_for(dir: &tempfile::TempDir, len: usize, streaming: StreamingConfig) -> Router {
        let path = dir.path().join("movie.mp4");
        std::fs::write(&path, vec![1u8; len]).unwrap();
        let file = Arc::new(ServedFile::load(&path).unwrap());
        create_router(MediaHandler::new(file, streaming))
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))))
    }

    async fn send(router: Router, method: Method) -> Response {
        router
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn chunked_head_matches_get_headers() {
        let dir = tempfile::tempdir().unwrap();
        let streaming = StreamingConfig::new(4096, 1024).unwrap();

        let get = send(router_for(&dir, 20_000, streaming), Method::GET).await;
        let head = send(router_for(&dir, 20_000, streaming), Method::HEAD).await;

        assert_eq!(head.status(), StatusCode::PARTIAL_CONTENT);
        for name in [
            header::TRANSFER_ENCODING,
            header::CONTENT_RANGE,
            header::CONTENT_TYPE,
            header::ACCEPT_RANGES,
        ] {
            assert_eq!(head.headers().get(&name), get.headers().get(&name), "{name}");
        }
        assert_eq!(head.headers()[header::TRANSFER_ENCODING], "chunked");
        assert!(head.headers().get(header::CONTENT_LENGTH).is_none());
        assert!(get.headers().get(header::CONTENT_LENGTH).is_none());
    }

    #[tokio::test]
    async fn fixed_head_reports_range_length() {
        let dir = tempfile::tempdir().unwrap();
        let head = send(router_for(&dir, 500, StreamingConfig::default()), Method::HEAD).await;

        assert_eq!(head.headers()[header::CONTENT_LENGTH], "500");
        assert_eq!(head.headers()[header::CONTENT_RANGE], "bytes 0-499/500");
        assert!(head.headers().get(header::TRANSFER_ENCODING).is_none());
    }

    #[test]
    fn content_range_uses_inclusive_last_byte() {
        assert_eq!(
            content_range(ByteRange::new(500, 1000), 1000),
            "bytes 500-999/1000"
        );
        assert_eq!(content_range(ByteRange::new(0, 1), 1), "bytes 0-0/1");
    }

    #[test]
    fn empty_content_range_is_unsatisfied_form() {
        assert_eq!(content_range(ByteRange::new(0, 0), 0), "bytes */0");
    }
}
