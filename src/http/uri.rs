//! Request-target decomposition and query percent-decoding.

use std::collections::HashMap;

/// The decomposed request target of an HTTP request.
///
/// `uri` is the path plus the `?query` suffix when one is present; the
/// `#fragment` suffix is always stripped from it. All parts are stored as
/// they appeared on the wire — percent-decoding is applied only to the
/// query parameter map, never to the stored strings.
///
/// # Examples
///
/// ```
/// use platter::http::Url;
///
/// let url = Url::parse("/you/got/served?reason=science#idet");
/// assert_eq!(url.uri(), "/you/got/served?reason=science");
/// assert_eq!(url.path(), "/you/got/served");
/// assert_eq!(url.query(), "reason=science");
/// assert_eq!(url.fragment(), "idet");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Url {
    uri: String,
    path: String,
    query: String,
    fragment: String,
}

impl Url {
    /// Splits a raw request target into path, query, and fragment.
    ///
    /// The fragment is everything after the first `#`; the query is
    /// everything after the first `?` of what remains.
    pub fn parse(raw: &str) -> Self {
        let (rest, fragment) = match raw.find('#') {
            Some(pos) => (&raw[..pos], &raw[pos + 1..]),
            None => (raw, ""),
        };

        let (path, query) = match rest.find('?') {
            Some(pos) => (&rest[..pos], &rest[pos + 1..]),
            None => (rest, ""),
        };

        Self {
            uri: rest.to_owned(),
            path: path.to_owned(),
            query: query.to_owned(),
            fragment: fragment.to_owned(),
        }
    }

    /// The path plus `?query` suffix, without the fragment.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The path component alone.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The raw query string (without the leading `?`), empty when absent.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The fragment (without the leading `#`), empty when absent.
    pub fn fragment(&self) -> &str {
        &self.fragment
    }
}

/// Decodes `%HH` escapes in `input` into their byte values.
///
/// A `%` that is not followed by two hex digits is passed through literally.
/// `+` is left untouched. Decoded bytes that do not form valid UTF-8 are
/// replaced with U+FFFD.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Parses a query string (`key=value&key2=value2`) into a map, applying
/// percent-decoding to both keys and values.
///
/// A pair without `=` yields the key with an empty value, and malformed
/// queries are accepted best-effort rather than rejected. Duplicate keys
/// keep the last value.
pub fn parse_query_params(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = percent_decode(parts.next().unwrap_or(""));
            let value = percent_decode(parts.next().unwrap_or(""));
            (key, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_path_query_fragment() {
        let url = Url::parse("/you/got/served?reason=science#idet");
        assert_eq!(url.uri(), "/you/got/served?reason=science");
        assert_eq!(url.path(), "/you/got/served");
        assert_eq!(url.query(), "reason=science");
        assert_eq!(url.fragment(), "idet");
    }

    #[test]
    fn plain_path_has_empty_query_and_fragment() {
        let url = Url::parse("/endpoints/int/test");
        assert_eq!(url.uri(), "/endpoints/int/test");
        assert_eq!(url.path(), "/endpoints/int/test");
        assert_eq!(url.query(), "");
        assert_eq!(url.fragment(), "");
    }

    #[test]
    fn query_stays_raw_in_url() {
        let url = Url::parse("/p?reason%25=the%24%24");
        assert_eq!(url.query(), "reason%25=the%24%24");
    }

    #[test]
    fn percent_decoding() {
        assert_eq!(percent_decode("the%24%24"), "the$$");
        assert_eq!(percent_decode("reason%25"), "reason%");
        assert_eq!(percent_decode("a%2Fb"), "a/b");
    }

    #[test]
    fn malformed_percent_passes_through() {
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("50%ZZoff"), "50%ZZoff");
        assert_eq!(percent_decode("%2"), "%2");
    }

    #[test]
    fn plus_is_not_a_space() {
        assert_eq!(percent_decode("a+b"), "a+b");
    }

    #[test]
    fn query_params_decode_keys_and_values() {
        let params = parse_query_params("reason=science&reason2=theinternet&reason%25=the%24%24");
        assert_eq!(params["reason"], "science");
        assert_eq!(params["reason2"], "theinternet");
        assert_eq!(params["reason%"], "the$$");
    }

    #[test]
    fn pair_without_equals_gets_empty_value() {
        let params = parse_query_params("t=r&wrong");
        assert_eq!(params["t"], "r");
        assert_eq!(params["wrong"], "");
    }

    #[test]
    fn duplicate_keys_keep_last_value() {
        let params = parse_query_params("k=first&k=last");
        assert_eq!(params["k"], "last");
    }

    #[test]
    fn garbage_queries_are_accepted() {
        let params = parse_query_params("?thisiswrong&");
        assert_eq!(params["?thisiswrong"], "");
    }
}
