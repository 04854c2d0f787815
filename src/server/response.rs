//! Response builders.

use anyhow::Result;
use rama::http::{Body, Response, StatusCode, header};

/// Responds with plain text
pub fn text(status: StatusCode, body: &str) -> Result<Response<Body>> {
    Response::builder()
        .status(status)
        .header(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("text/plain; charset=utf-8"),
        )
        .body(Body::from(body.to_owned()))
        .map_err(Into::into)
}

/// Responds with an HTML page
pub fn html(status: StatusCode, body: String) -> Result<Response<Body>> {
    let mut builder = Response::builder().status(status);
    {
        let headers = builder
            .headers_mut()
            .expect("headers available while building response");
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("text/html; charset=utf-8"),
        );
        headers.insert(
            header::CACHE_CONTROL,
            header::HeaderValue::from_static("no-store"),
        );
    }
    builder.body(Body::from(body)).map_err(Into::into)
}

/// Responds with raw file bytes and a guessed content type/encoding
pub fn file(
    bytes: Vec<u8>,
    (content_type, content_encoding): (Option<&'static str>, Option<&'static str>),
) -> Result<Response<Body>> {
    let mut builder = Response::builder().status(StatusCode::OK);
    {
        let headers = builder
            .headers_mut()
            .expect("headers available while building response");
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static(content_type.unwrap_or("application/octet-stream")),
        );
        if let Some(encoding) = content_encoding {
            headers.insert(
                header::CONTENT_ENCODING,
                header::HeaderValue::from_static(encoding),
            );
        }
        headers.insert(
            header::CONTENT_LENGTH,
            header::HeaderValue::from_str(&bytes.len().to_string())?,
        );
    }
    builder.body(Body::from(bytes)).map_err(Into::into)
}
