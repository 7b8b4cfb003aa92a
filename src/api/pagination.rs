//
//  gerrit-rest
//  api/pagination.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Pagination Cursor for Change Queries
//!
//! Gerrit's pagination changed across server versions: newer servers take a
//! numeric `S=` start offset and flag the last record of a page with
//! `_more_changes`, while older servers resume from an opaque `_sortkey`
//! carried by each record. The [`ChangesCursor`] bridges both transparently:
//! every page request carries the offset (records fetched so far) and, when
//! one is known, the last page's sort key - and if the server rejects the
//! offset as unsupported, the capability-degrading runner drops it and the
//! sort key alone anchors the query.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gerrit_rest::{AuthData, GerritClient, HttpConfig, StaticAuthProvider};
//!
//! # async fn example() -> Result<(), gerrit_rest::GerritError> {
//! let provider = Arc::new(StaticAuthProvider::new(AuthData::anonymous(
//!     "https://gerrit.example.com",
//! )));
//! let client = GerritClient::new(provider, &HttpConfig::default())?;
//! let cursor = client.query_changes("status:open", [], 25);
//!
//! let first = cursor.fetch_next_page().await?;
//! let second = cursor.fetch_next_page().await?;
//! assert!(first.len() <= 25 && second.len() <= 25);
//! # Ok(())
//! # }
//! ```

use tokio::sync::Mutex;

use crate::api::changes::ChangeRecord;
use crate::api::error::GerritError;
use crate::api::query::{ChangesQuery, QueryRunner};

struct CursorState {
    query: ChangesQuery,
    fetched: usize,
    sort_key: Option<String>,
    exhausted: bool,
}

/// Serially fetches fixed-size pages of a changes query.
///
/// Pages are returned in server order and are disjoint: each call resumes
/// where the previous one stopped. Once the server signals that no more
/// results exist (or returns an empty page), the cursor is exhausted and
/// every further call returns an empty page immediately, without a network
/// round trip.
///
/// # Concurrency
///
/// At most one fetch is in flight per cursor: the whole fetch runs under an
/// async mutex, so a second concurrent call waits for the first to finish
/// and then proceeds with the updated offset and continuation token. Pages
/// can therefore never interleave or observe stale state.
pub struct ChangesCursor {
    runner: QueryRunner,
    state: Mutex<CursorState>,
}

impl ChangesCursor {
    /// Creates a cursor over `query`, executed through `runner`.
    ///
    /// Usually obtained from
    /// [`GerritClient::query_changes`](crate::api::GerritClient::query_changes).
    pub fn new(runner: QueryRunner, query: ChangesQuery) -> Self {
        Self {
            runner,
            state: Mutex::new(CursorState {
                query,
                fetched: 0,
                sort_key: None,
                exhausted: false,
            }),
        }
    }

    /// Fetches the next page of change records.
    ///
    /// # Returns
    ///
    /// The next page of records in server order, or an empty vector once
    /// the query is exhausted. Calling again after exhaustion keeps
    /// returning empty vectors and never touches the network.
    ///
    /// # Errors
    ///
    /// Propagates any error from the underlying query runner. The cursor
    /// state is unchanged on error, so the same page may be retried by
    /// calling again.
    pub async fn fetch_next_page(&self) -> Result<Vec<ChangeRecord>, GerritError> {
        let mut state = self.state.lock().await;

        if state.exhausted {
            tracing::debug!("cursor exhausted, returning empty page without a request");
            return Ok(Vec::new());
        }

        let start = state.fetched as u32;
        let sort_key = state.sort_key.clone();
        state.query.set_start(start);
        state.query.set_sort_key(sort_key);

        let page = self.runner.run(&mut state.query).await?;

        if page.is_empty() {
            state.exhausted = true;
            return Ok(Vec::new());
        }

        state.fetched += page.len();
        state.sort_key = page.next_sort_key.clone();
        state.exhausted = !page.more;

        tracing::debug!(
            page_len = page.len(),
            total = state.fetched,
            exhausted = state.exhausted,
            "fetched page"
        );

        Ok(page.records)
    }

    /// Whether another page may exist.
    ///
    /// `true` until the server signals exhaustion; a `true` result does not
    /// guarantee the next page is non-empty.
    pub async fn has_more(&self) -> bool {
        !self.state.lock().await.exhausted
    }

    /// Number of records fetched so far across all pages.
    pub async fn fetched(&self) -> usize {
        self.state.lock().await.fetched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::GerritClient;
    use crate::api::query::ListChangesOption;
    use crate::auth::{AuthData, StaticAuthProvider};
    use crate::config::HttpConfig;
    use mockito::Matcher;
    use std::sync::Arc;

    fn cursor_for(server: &mockito::Server, page_size: u32) -> ChangesCursor {
        let provider = Arc::new(StaticAuthProvider::new(AuthData::anonymous(server.url())));
        let client = GerritClient::new(provider, &HttpConfig::default()).unwrap();
        client.query_changes("is:open", Vec::<ListChangesOption>::new(), page_size)
    }

    #[tokio::test]
    async fn test_pages_are_disjoint_and_ordered() {
        let mut server = mockito::Server::new_async().await;

        let first = server
            .mock("GET", "/changes/")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "is:open".into()),
                Matcher::UrlEncoded("n".into(), "2".into()),
            ]))
            .with_body(r#")]}'[{"id": "a"}, {"id": "b", "_more_changes": true}]"#)
            .expect(1)
            .create_async()
            .await;

        let second = server
            .mock("GET", "/changes/")
            .match_query(Matcher::UrlEncoded("S".into(), "2".into()))
            .with_body(r#")]}'[{"id": "c"}]"#)
            .expect(1)
            .create_async()
            .await;

        let cursor = cursor_for(&server, 2);

        assert!(cursor.has_more().await);
        let page1 = cursor.fetch_next_page().await.unwrap();
        let ids1: Vec<_> = page1.iter().filter_map(ChangeRecord::id).collect();
        assert_eq!(ids1, ["a", "b"]);
        assert!(cursor.has_more().await);

        let page2 = cursor.fetch_next_page().await.unwrap();
        let ids2: Vec<_> = page2.iter().filter_map(ChangeRecord::id).collect();
        assert_eq!(ids2, ["c"]);
        assert!(!cursor.has_more().await);

        // Exhausted: no further network calls (mock expectations stay at 1).
        let page3 = cursor.fetch_next_page().await.unwrap();
        assert!(page3.is_empty());
        let page4 = cursor.fetch_next_page().await.unwrap();
        assert!(page4.is_empty());

        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_sort_key_continuation_is_sent() {
        let mut server = mockito::Server::new_async().await;

        let first = server
            .mock("GET", "/changes/")
            .match_query(Matcher::UrlEncoded("q".into(), "is:open".into()))
            .with_body(
                r#"[{"id": "a", "_sortkey": "0015"}, {"id": "b", "_sortkey": "0016", "_more_changes": true}]"#,
            )
            .expect(1)
            .create_async()
            .await;

        let second = server
            .mock("GET", "/changes/")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("S".into(), "2".into()),
                Matcher::UrlEncoded("N".into(), "0016".into()),
            ]))
            .with_body(r#"[{"id": "c", "_sortkey": "0017"}]"#)
            .expect(1)
            .create_async()
            .await;

        let cursor = cursor_for(&server, 2);
        cursor.fetch_next_page().await.unwrap();
        let page2 = cursor.fetch_next_page().await.unwrap();
        assert_eq!(page2.len(), 1);

        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_first_page_exhausts() {
        let mut server = mockito::Server::new_async().await;
        let only = server
            .mock("GET", "/changes/")
            .match_query(Matcher::Any)
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        let cursor = cursor_for(&server, 10);
        assert!(cursor.fetch_next_page().await.unwrap().is_empty());
        assert!(!cursor.has_more().await);
        assert!(cursor.fetch_next_page().await.unwrap().is_empty());
        only.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_leaves_cursor_retryable() {
        let mut server = mockito::Server::new_async().await;
        let flaky = server
            .mock("GET", "/changes/")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("internal error")
            .expect(1)
            .create_async()
            .await;

        let cursor = cursor_for(&server, 10);
        let err = cursor.fetch_next_page().await.unwrap_err();
        assert!(err.is_status(500));
        // The cursor did not exhaust on error.
        assert!(cursor.has_more().await);
        assert_eq!(cursor.fetched().await, 0);
        flaky.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetched_accumulates() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/changes/")
            .match_query(Matcher::Any)
            .with_body(r#"[{"id": "a"}, {"id": "b"}]"#)
            .create_async()
            .await;

        let cursor = cursor_for(&server, 2);
        cursor.fetch_next_page().await.unwrap();
        assert_eq!(cursor.fetched().await, 2);
        // No more-changes marker: the cursor is now exhausted.
        assert!(!cursor.has_more().await);
    }
}
