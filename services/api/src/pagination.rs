//! Limit/offset pagination for list endpoints
//!
//! Responses carry `{count, next, previous, results}` where `next` and
//! `previous` are the request URI with `limit`/`offset` rewritten.

use axum::http::Uri;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// `?limit=&offset=`
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageParams {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// One page of results
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, count: i64, params: PageParams, uri: &Uri) -> Self {
        let limit = params.limit();
        let offset = params.offset();

        let following = offset.saturating_add(limit);
        let next = (following < count).then(|| page_link(uri, limit, following));
        let previous = (offset > 0).then(|| page_link(uri, limit, offset.saturating_sub(limit).max(0)));

        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

/// Request URI with `limit` and `offset` replaced, other parameters kept
fn page_link(uri: &Uri, limit: i64, offset: i64) -> String {
    let mut pairs: Vec<String> = uri
        .query()
        .unwrap_or("")
        .split('&')
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or("");
            !pair.is_empty() && key != "limit" && key != "offset"
        })
        .map(str::to_string)
        .collect();

    pairs.push(format!("limit={}", limit));
    if offset > 0 {
        pairs.push(format!("offset={}", offset));
    }

    format!("{}?{}", uri.path(), pairs.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(limit: Option<i64>, offset: Option<i64>) -> PageParams {
        PageParams { limit, offset }
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(params(None, None).limit(), DEFAULT_LIMIT);
        assert_eq!(params(Some(0), None).limit(), 1);
        assert_eq!(params(Some(1000), None).limit(), MAX_LIMIT);
        assert_eq!(params(None, Some(-5)).offset(), 0);
    }

    #[test]
    fn test_first_page_links() {
        let uri: Uri = "/api/recipes/?tags=lunch".parse().unwrap();
        let page = Page::new(vec![1, 2], 5, params(Some(2), None), &uri);

        assert_eq!(page.count, 5);
        assert_eq!(page.previous, None);
        assert_eq!(
            page.next.as_deref(),
            Some("/api/recipes/?tags=lunch&limit=2&offset=2")
        );
    }

    #[test]
    fn test_middle_and_last_page_links() {
        let uri: Uri = "/api/users/?limit=2&offset=2".parse().unwrap();
        let page = Page::new(vec![3, 4], 5, params(Some(2), Some(2)), &uri);
        assert_eq!(page.previous.as_deref(), Some("/api/users/?limit=2"));
        assert_eq!(page.next.as_deref(), Some("/api/users/?limit=2&offset=4"));

        let uri: Uri = "/api/users/?limit=2&offset=4".parse().unwrap();
        let page = Page::new(vec![5], 5, params(Some(2), Some(4)), &uri);
        assert_eq!(page.next, None);
        assert_eq!(page.previous.as_deref(), Some("/api/users/?limit=2&offset=2"));
    }

    #[test]
    fn test_huge_offset_past_the_end() {
        let uri: Uri = "/api/recipes/?offset=9223372036854775807".parse().unwrap();
        let page = Page::<i32>::new(vec![], 3, params(None, Some(i64::MAX)), &uri);

        assert_eq!(page.next, None);
        assert_eq!(
            page.previous,
            Some(format!("/api/recipes/?limit={}&offset={}", DEFAULT_LIMIT, i64::MAX - DEFAULT_LIMIT))
        );
    }
}
