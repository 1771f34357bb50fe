//! Paginated GET hook with page navigation.

use std::ops::Deref;

use serde::de::DeserializeOwned;

use super::state::RequestState;
use crate::client::ApiClient;
use crate::http::Query;
use crate::types::{total_pages, PaginatedResponse, Pagination};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug)]
pub struct PaginatedRequest<T> {
    url: String,
    initial_page: u32,
    state: RequestState<Vec<T>>,
    pagination: Pagination,
}

impl<T> Deref for PaginatedRequest<T> {
    type Target = RequestState<Vec<T>>;

    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

impl<T: DeserializeOwned> PaginatedRequest<T> {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_page(url, DEFAULT_PAGE, DEFAULT_LIMIT)
    }

    pub fn with_page(url: impl Into<String>, initial_page: u32, initial_limit: u32) -> Self {
        Self {
            url: url.into(),
            initial_page,
            state: RequestState::new(),
            pagination: Pagination {
                page: initial_page,
                limit: initial_limit,
                total: 0,
                total_pages: 0,
            },
        }
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    /// Current page items; empty before the first successful fetch.
    pub fn items(&self) -> &[T] {
        self.state.data().map(Vec::as_slice).unwrap_or_default()
    }

    /// Fetch a page. `page` and `limit` fall back to the current pagination
    /// state and take precedence over same-named keys in `extra`.
    pub fn execute(
        &mut self,
        client: &ApiClient,
        page: Option<u32>,
        limit: Option<u32>,
        extra: &Query,
    ) -> Option<&[T]> {
        let url = self.url.clone();
        self.execute_at(client, &url, page, limit, extra)
    }

    pub fn execute_at(
        &mut self,
        client: &ApiClient,
        url: &str,
        page: Option<u32>,
        limit: Option<u32>,
        extra: &Query,
    ) -> Option<&[T]> {
        let page = page.filter(|p| *p > 0).unwrap_or(self.pagination.page);
        let limit = limit.filter(|l| *l > 0).unwrap_or(self.pagination.limit);
        let mut query = Query::new().with("page", page).with("limit", limit);
        query.merge_missing(extra);

        let ticket = self.state.begin();
        let outcome = client.get_paginated::<T>(url, &query);
        match outcome {
            Ok(PaginatedResponse { data, pagination }) => {
                if !self.state.settle(ticket, Ok(data)) {
                    return None;
                }
                self.pagination = normalize(pagination);
                Some(self.items())
            }
            Err(e) => {
                self.state.settle(ticket, Err(e));
                None
            }
        }
    }

    /// Fetch the following page; no request when already on the last page.
    pub fn next_page(&mut self, client: &ApiClient) -> Option<&[T]> {
        if !self.pagination.has_next() {
            return None;
        }
        let page = self.pagination.page + 1;
        self.execute(client, Some(page), None, &Query::new())
    }

    /// Fetch the preceding page; no request when on the first page.
    pub fn previous_page(&mut self, client: &ApiClient) -> Option<&[T]> {
        if !self.pagination.has_previous() {
            return None;
        }
        let page = self.pagination.page - 1;
        self.execute(client, Some(page), None, &Query::new())
    }

    /// Fetch `page` when it lies in `[1, total_pages]`; otherwise a no-op.
    pub fn go_to_page(&mut self, client: &ApiClient, page: u32) -> Option<&[T]> {
        if !self.pagination.contains(page) {
            return None;
        }
        self.execute(client, Some(page), None, &Query::new())
    }

    /// Clear items and counts and return to the initial page. The limit is
    /// kept.
    pub fn reset(&mut self) {
        self.state.reset();
        self.pagination = Pagination {
            page: self.initial_page,
            limit: self.pagination.limit,
            total: 0,
            total_pages: 0,
        };
    }
}

fn normalize(pagination: Pagination) -> Pagination {
    if pagination.limit == 0 {
        return pagination;
    }
    let expected = total_pages(pagination.total, pagination.limit);
    if expected != pagination.total_pages {
        tracing::warn!(
            reported = pagination.total_pages,
            expected,
            "server page count disagrees with total/limit"
        );
    }
    Pagination {
        total_pages: expected,
        ..pagination
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::RequestStatus;
    use crate::test_support::Harness;

    fn page_body(items: &[u32], page: u32, limit: u32, total: u64) -> String {
        serde_json::json!({
            "data": items,
            "pagination": {
                "page": page,
                "limit": limit,
                "total": total,
                "totalPages": total_pages(total, limit),
            }
        })
        .to_string()
    }

    #[test]
    fn initial_state() {
        let hook: PaginatedRequest<u32> = PaginatedRequest::with_page("/api/items", 2, 5);
        assert!(hook.items().is_empty());
        assert_eq!(hook.pagination(), Pagination { page: 2, limit: 5, total: 0, total_pages: 0 });
        assert_eq!(hook.status(), RequestStatus::Idle);
    }

    #[test]
    fn execute_sends_current_page_and_limit() {
        let h = Harness::new();
        h.transport.push_json(200, &page_body(&[1, 2, 3], 1, 3, 7));
        let mut hook: PaginatedRequest<u32> = PaginatedRequest::with_page("/api/items", 1, 3);

        let items = hook
            .execute(&h.client, None, None, &Query::new().with("sort", "asc"))
            .map(<[u32]>::to_vec);
        assert_eq!(items, Some(vec![1, 2, 3]));
        assert_eq!(hook.pagination().total_pages, 3);
        assert_eq!(
            h.transport.requests()[0].url,
            "http://api.test/api/items?page=1&limit=3&sort=asc"
        );
    }

    #[test]
    fn explicit_page_wins_over_extra_params() {
        let h = Harness::new();
        h.transport.push_json(200, &page_body(&[], 2, 10, 20));
        let mut hook: PaginatedRequest<u32> = PaginatedRequest::new("/api/items");
        hook.execute(&h.client, Some(2), None, &Query::new().with("page", 9));
        assert!(h.transport.requests()[0].url.contains("page=2"));
        assert!(!h.transport.requests()[0].url.contains("page=9"));
    }

    #[test]
    fn total_pages_is_recomputed_from_total_and_limit() {
        let h = Harness::new();
        h.transport.push_json(
            200,
            r#"{"data":[1],"pagination":{"page":1,"limit":10,"total":41,"totalPages":99}}"#,
        );
        let mut hook: PaginatedRequest<u32> = PaginatedRequest::new("/api/items");
        hook.execute(&h.client, None, None, &Query::new());
        assert_eq!(hook.pagination().total_pages, 5);
    }

    #[test]
    fn next_and_previous_respect_bounds() {
        let h = Harness::new();
        h.transport.push_json(200, &page_body(&[1, 2], 1, 2, 4));
        h.transport.push_json(200, &page_body(&[3, 4], 2, 2, 4));
        h.transport.push_json(200, &page_body(&[1, 2], 1, 2, 4));
        let mut hook: PaginatedRequest<u32> = PaginatedRequest::with_page("/api/items", 1, 2);

        assert!(hook.previous_page(&h.client).is_none());
        assert!(h.transport.requests().is_empty());

        hook.execute(&h.client, None, None, &Query::new());
        assert_eq!(hook.next_page(&h.client).map(<[u32]>::to_vec), Some(vec![3, 4]));
        assert_eq!(hook.pagination().page, 2);

        assert!(hook.next_page(&h.client).is_none());
        assert_eq!(h.transport.requests().len(), 2);

        assert_eq!(hook.previous_page(&h.client).map(<[u32]>::to_vec), Some(vec![1, 2]));
        assert_eq!(h.transport.requests().len(), 3);
    }

    #[test]
    fn go_to_page_out_of_range_is_a_no_op() {
        let h = Harness::new();
        h.transport.push_json(200, &page_body(&[1], 1, 1, 3));
        let mut hook: PaginatedRequest<u32> = PaginatedRequest::with_page("/api/items", 1, 1);
        hook.execute(&h.client, None, None, &Query::new());
        let before = hook.pagination();

        assert!(hook.go_to_page(&h.client, 0).is_none());
        assert!(hook.go_to_page(&h.client, 4).is_none());
        assert_eq!(h.transport.requests().len(), 1);
        assert_eq!(hook.pagination(), before);
        assert_eq!(hook.items(), &[1]);
        assert_eq!(hook.status(), RequestStatus::Success);
    }

    #[test]
    fn go_to_page_before_first_fetch_is_a_no_op() {
        let h = Harness::new();
        let mut hook: PaginatedRequest<u32> = PaginatedRequest::new("/api/items");
        assert!(hook.go_to_page(&h.client, 1).is_none());
        assert!(h.transport.requests().is_empty());
    }

    #[test]
    fn failure_keeps_items_and_pagination() {
        let h = Harness::new();
        h.transport.push_json(200, &page_body(&[1, 2], 1, 2, 6));
        h.transport.push_json(503, "");
        let mut hook: PaginatedRequest<u32> = PaginatedRequest::with_page("/api/items", 1, 2);
        hook.execute(&h.client, None, None, &Query::new());

        assert!(hook.next_page(&h.client).is_none());
        assert_eq!(hook.items(), &[1, 2]);
        assert_eq!(hook.pagination().page, 1);
        assert_eq!(hook.status(), RequestStatus::Error);
    }

    #[test]
    fn reset_returns_to_initial_page_and_keeps_limit() {
        let h = Harness::new();
        h.transport.push_json(200, &page_body(&[5], 3, 4, 12));
        let mut hook: PaginatedRequest<u32> = PaginatedRequest::with_page("/api/items", 1, 4);
        hook.execute(&h.client, Some(3), None, &Query::new());

        hook.reset();
        assert_eq!(hook.pagination(), Pagination { page: 1, limit: 4, total: 0, total_pages: 0 });
        assert!(hook.items().is_empty());
        assert_eq!(hook.status(), RequestStatus::Idle);
    }
}
