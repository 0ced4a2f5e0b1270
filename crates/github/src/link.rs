//! `Link` header parsing.
//!
//! REST list endpoints advertise further pages through RFC 8288 links:
//!
//! ```text
//! <https://api.github.com/user/keys?per_page=100&page=2>; rel="next", <...&page=5>; rel="last"
//! ```
//!
//! Only the `next` relation matters here, and only its `page` query
//! parameter.

use reqwest::header::{HeaderMap, LINK};
use reqwest::Url;

/// Page number of the `rel="next"` link, if any.
pub fn next_page(link: &str) -> Option<u32> {
    link.split(',').find_map(|entry| {
        let (target, params) = entry.trim().split_once(';')?;
        let is_next = params
            .split(';')
            .any(|p| matches!(p.trim(), r#"rel="next""# | "rel=next"));
        if !is_next {
            return None;
        }
        let url = target.trim().strip_prefix('<')?.strip_suffix('>')?;
        page_parameter(url)
    })
}

/// [`next_page`] applied to the `Link` header of a response.
pub fn next_page_from_headers(headers: &HeaderMap) -> Option<u32> {
    headers
        .get(LINK)
        .and_then(|v| v.to_str().ok())
        .and_then(next_page)
}

fn page_parameter(url: &str) -> Option<u32> {
    Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
}
