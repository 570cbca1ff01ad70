use crate::error::Error;
use hyper::{
    header::{HeaderName, HeaderValue},
    HeaderMap,
};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};

lazy_static! {
    static ref CHARSET_REGEX: Regex =
        Regex::new(r#"(?i);\s*charset\s*=\s*"?(?P<charset>[^";\s]*)"?"#).unwrap();
    static ref JSON_CONTENT_TYPE: Regex =
        Regex::new(r"(?i)^\s*application/([a-z0-9.+-]*\+)?json\s*(;|$)").unwrap();
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Charset {
    Utf8,
    Latin1,
}

pub const DEFAULT_CHARSET: Charset = Charset::Latin1;

/// Flattens every header to one value, joining repeated headers with `", "`.
pub fn extract_headers(header_map: &HeaderMap) -> HashMap<String, String> {
    // it currently ignores header values with opaque characters
    header_map
        .keys()
        .map(|name| {
            let values = header_map
                .get_all(name)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .collect::<Vec<_>>();
            (String::from(name.as_str()), values)
        })
        .filter(|(_, values)| !values.is_empty())
        .map(|(name, values)| (name, values.join(", ")))
        .collect()
}

pub fn put_headers<'a, I: IntoIterator<Item = (&'a String, &'a Vec<String>)>>(
    header_map: &mut HeaderMap<HeaderValue>,
    headers: I,
) -> Result<(), Error> {
    for (key, values) in headers {
        let header_name = HeaderName::from_bytes(key.as_bytes())?;
        let header_value = HeaderValue::from_str(&values.join(", "))?;
        header_map.append(header_name, header_value);
    }

    Ok(())
}

/// The response body is always written with an exact length, so framing headers from the
/// interaction would contradict it.
pub fn filter_headers<'a>(
    headers: &'a BTreeMap<String, Vec<String>>,
) -> impl Iterator<Item = (&'a String, &'a Vec<String>)> + 'a {
    headers.iter().filter(|(key, _)| {
        !key.eq_ignore_ascii_case("transfer-encoding")
            && !key.eq_ignore_ascii_case("content-length")
    })
}

/// `application/json` and the `+json` suffix types.
pub fn is_json_content_type(content_type: &str) -> bool {
    JSON_CONTENT_TYPE.is_match(content_type)
}

/// Picks the charset declared by a `Content-Type` header. JSON is always UTF-8 unless told
/// otherwise, anything else falls back to ISO-8859-1.
pub fn charset_from_content_type(content_type: Option<&str>) -> Charset {
    let content_type = match content_type {
        Some(content_type) => content_type,
        None => return DEFAULT_CHARSET,
    };

    let charset = match CHARSET_REGEX.captures(content_type) {
        Some(captures) => captures["charset"].to_lowercase(),
        None if is_json_content_type(content_type) => return Charset::Utf8,
        None => {
            tracing::debug!(content_type, "No charset in content type, using the default");
            return DEFAULT_CHARSET;
        }
    };

    match charset.as_str() {
        "utf-8" | "utf8" => Charset::Utf8,
        "iso-8859-1" | "iso8859-1" | "latin1" | "l1" | "us-ascii" | "ascii" => Charset::Latin1,
        _ => {
            tracing::warn!(
                content_type,
                charset = charset.as_str(),
                "Unsupported or malformed charset, using the default"
            );
            DEFAULT_CHARSET
        }
    }
}

pub fn decode_text(bytes: &[u8], charset: Charset) -> String {
    match charset {
        Charset::Utf8 => String::from_utf8_lossy(bytes).into(),
        Charset::Latin1 => bytes.iter().map(|&byte| char::from(byte)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_is_read_from_content_type() {
        assert_eq!(
            charset_from_content_type(Some("application/json; charset=UTF-8")),
            Charset::Utf8
        );
        assert_eq!(
            charset_from_content_type(Some(r#"text/plain;charset="iso-8859-1""#)),
            Charset::Latin1
        );
    }

    #[test]
    fn missing_or_unknown_charset_falls_back_to_latin1() {
        assert_eq!(charset_from_content_type(None), DEFAULT_CHARSET);
        assert_eq!(charset_from_content_type(Some("text/plain")), DEFAULT_CHARSET);
        assert_eq!(
            charset_from_content_type(Some("text/plain; charset=klingon-42")),
            DEFAULT_CHARSET
        );
        assert_eq!(
            charset_from_content_type(Some("text/plain; charset=")),
            DEFAULT_CHARSET
        );
    }

    #[test]
    fn json_without_charset_is_utf8() {
        assert_eq!(charset_from_content_type(Some("application/json")), Charset::Utf8);
        assert_eq!(
            charset_from_content_type(Some("application/vnd.api+json")),
            Charset::Utf8
        );
        assert_eq!(
            charset_from_content_type(Some("application/json; charset=iso-8859-1")),
            Charset::Latin1
        );
        assert_eq!(charset_from_content_type(Some("application/jsonp")), DEFAULT_CHARSET);
    }

    #[test]
    fn differently_cased_header_keys_are_all_kept() {
        let mut headers = BTreeMap::new();
        headers.insert(String::from("Vary"), vec![String::from("Accept")]);
        headers.insert(String::from("vary"), vec![String::from("Origin")]);
        let mut header_map = HeaderMap::new();

        put_headers(&mut header_map, headers.iter()).unwrap();

        let values = header_map
            .get_all("vary")
            .iter()
            .map(|value| value.to_str().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(values, vec!["Accept", "Origin"]);
    }

    #[test]
    fn latin1_maps_every_byte_to_one_char() {
        assert_eq!(decode_text(&[0x63, 0x61, 0x66, 0xe9], Charset::Latin1), "café");
        assert_eq!(decode_text("café".as_bytes(), Charset::Utf8), "café");
    }

    #[test]
    fn repeated_headers_are_flattened() {
        let mut header_map = HeaderMap::new();
        header_map.append("accept", HeaderValue::from_static("text/html"));
        header_map.append("accept", HeaderValue::from_static("text/plain"));
        header_map.append("x-opaque", HeaderValue::from_bytes(b"\xff").unwrap());

        let headers = extract_headers(&header_map);

        assert_eq!(headers["accept"], "text/html, text/plain");
        assert!(!headers.contains_key("x-opaque"));
    }
}
