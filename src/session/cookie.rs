//! Cookie header parsing and `Set-Cookie` rendering.

use axum::http::header::{InvalidHeaderValue, COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use std::time::Duration;

/// Value of the first cookie called `name` across all `Cookie` headers.
pub fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
}

/// `name=value; Max-Age=<secs>; HttpOnly`, with no Path or Domain.
pub fn set_cookie(name: &str, value: &str, max_age: Duration) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!("{name}={value}; Max-Age={}; HttpOnly", max_age.as_secs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; lang=en"));
        headers.append(COOKIE, HeaderValue::from_static("sticky-session=YWJj; other=1"));

        assert_eq!(find_cookie(&headers, "sticky-session"), Some("YWJj"));
        assert_eq!(find_cookie(&headers, "lang"), Some("en"));
        assert_eq!(find_cookie(&headers, "missing"), None);
    }

    #[test]
    fn keeps_base64_padding_in_value() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("sticky-session=YWI=; a=b"));
        assert_eq!(find_cookie(&headers, "sticky-session"), Some("YWI="));
    }

    #[test]
    fn renders_attributes() {
        let value = set_cookie("sticky-session", "YWJj", Duration::from_secs(3600)).unwrap();
        assert_eq!(value, "sticky-session=YWJj; Max-Age=3600; HttpOnly");
    }
}
