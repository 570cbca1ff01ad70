//! Translation between hyper's request/response types and the crate's own [`Request`] and
//! [`Response`] values.

use crate::{
    data::{OptionalBody, Request, Response},
    error::Error,
    util,
};
use hyper::{
    body,
    header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, TRANSFER_ENCODING},
    Body, StatusCode,
};
use std::convert::TryFrom;

/// Reads a whole inbound request, decoding its body with the charset its `Content-Type`
/// declares.
pub async fn decode(request: hyper::Request<Body>) -> Result<Request, Error> {
    let (parts, request_body) = request.into_parts();

    let bytes = body::to_bytes(request_body)
        .await
        .map_err(|_| Error::InvalidBody)?;
    let declares_body =
        parts.headers.contains_key(CONTENT_LENGTH) || parts.headers.contains_key(TRANSFER_ENCODING);

    let body = if !bytes.is_empty() {
        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok());
        let charset = util::charset_from_content_type(content_type);
        OptionalBody::Present(util::decode_text(&bytes, charset).into_bytes())
    } else if declares_body {
        OptionalBody::Empty
    } else {
        OptionalBody::Missing
    };

    let mut request = Request::new(parts.method.as_str(), parts.uri.path()).with_body(body);

    if let Some(query) = parts.uri.query() {
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            request = request.with_query(name, value);
        }
    }

    for (name, value) in util::extract_headers(&parts.headers) {
        request = request.with_header(name, value);
    }

    Ok(request)
}

/// Builds the outbound response. The content length is always exact, `0` without a body.
pub fn encode(response: &Response) -> Result<hyper::Response<Body>, Error> {
    let mut response_builder =
        hyper::Response::builder().status(StatusCode::try_from(response.status)?);

    let headers_mut = response_builder.headers_mut().ok_or(Error::InvalidBody)?;
    util::put_headers(headers_mut, util::filter_headers(&response.headers))?;
    headers_mut.insert(CONTENT_LENGTH, HeaderValue::from(response.body.len()));

    let body = match &response.body {
        OptionalBody::Present(bytes) => Body::from(bytes.clone()),
        OptionalBody::Empty | OptionalBody::Missing => Body::empty(),
    };

    Ok(response_builder.body(body)?)
}
