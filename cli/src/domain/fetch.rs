//! Generic paginated fetch engine
//!
//! One loop for every remote listing: request up to `per_page` items,
//! accumulate, follow the next page token until the server stops issuing
//! one, sleeping between requests as a cooperative throttle. Offset and
//! cursor pagination share the same token abstraction, so stall detection
//! and the throttle are written once.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::remote::{Page, PageToken, RemoteError};

/// Fixed upper bound on items per page request
pub const PAGE_SIZE: u32 = 100;

/// Default inter-page delay
pub const DEFAULT_PAGE_DELAY_MS: u64 = 500;

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub per_page: u32,
    pub page_delay: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            per_page: PAGE_SIZE,
            page_delay: Duration::from_millis(DEFAULT_PAGE_DELAY_MS),
        }
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("pagination stalled on page {page}: server repeated the same cursor")]
    PaginationStalled { page: u32 },

    #[error("fetch cancelled after {pages} pages ({items} items)")]
    Cancelled { pages: u32, items: usize },

    #[error("page {page} request failed: {source}")]
    Remote {
        page: u32,
        #[source]
        source: RemoteError,
    },
}

/// A failed fetch still hands the caller everything collected before the
/// failure; the reconciliation layer must never store `partial` as a new
/// snapshot.
#[derive(Debug)]
pub struct FetchFailure<T> {
    pub partial: Vec<T>,
    pub error: FetchError,
}

impl<T> FetchFailure<T> {
    fn new(partial: Vec<T>, error: FetchError) -> Self {
        Self { partial, error }
    }
}

/// Fetch every page of a listing, starting from `first`.
///
/// `list_page` is called once per page with the current token. The loop
/// terminates when the server reports no next token, fails fast if a
/// cursor does not advance, and observes `cancel` both around the page
/// request and during the inter-page sleep.
pub async fn fetch_all<T, F, Fut>(
    first: PageToken,
    options: &FetchOptions,
    cancel: &CancellationToken,
    mut list_page: F,
) -> Result<Vec<T>, FetchFailure<T>>
where
    F: FnMut(PageToken, u32) -> Fut,
    Fut: Future<Output = Result<Page<T>, RemoteError>>,
{
    let mut items: Vec<T> = Vec::new();
    let mut token = first;
    let mut pages = 0u32;

    loop {
        pages += 1;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let error = FetchError::Cancelled { pages: pages - 1, items: items.len() };
                return Err(FetchFailure::new(items, error));
            }
            r = list_page(token.clone(), options.per_page) => r,
        };

        let page = match result {
            Ok(page) => page,
            Err(source) => {
                let error = FetchError::Remote { page: pages, source };
                return Err(FetchFailure::new(items, error));
            }
        };

        items.extend(page.items);
        tracing::debug!(pages, items = items.len(), "fetch progress");

        match page.next {
            None => return Ok(items),
            Some(next) => {
                if next == token {
                    let error = FetchError::PaginationStalled { page: pages };
                    return Err(FetchFailure::new(items, error));
                }
                token = next;
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let error = FetchError::Cancelled { pages, items: items.len() };
                return Err(FetchFailure::new(items, error));
            }
            _ = tokio::time::sleep(options.page_delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick() -> FetchOptions {
        FetchOptions {
            per_page: 2,
            page_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_accumulates_all_pages() {
        let cancel = CancellationToken::new();
        let result = fetch_all(PageToken::first_page(), &quick(), &cancel, |token, _| async move {
            let n = match token {
                PageToken::Number(n) => n,
                PageToken::Cursor(_) => unreachable!(),
            };
            let items = vec![n * 10, n * 10 + 1];
            let next = (n < 3).then(|| PageToken::Number(n + 1));
            Ok(Page { items, next })
        })
        .await
        .unwrap();
        assert_eq!(result, vec![10, 11, 20, 21, 30, 31]);
    }

    #[tokio::test]
    async fn test_single_page() {
        let cancel = CancellationToken::new();
        let result = fetch_all(PageToken::first_page(), &quick(), &cancel, |_, _| async {
            Ok(Page {
                items: vec!["only"],
                next: None,
            })
        })
        .await
        .unwrap();
        assert_eq!(result, vec!["only"]);
    }

    #[tokio::test]
    async fn test_stalled_cursor_fails_fast() {
        let cancel = CancellationToken::new();
        let failure = fetch_all(
            PageToken::start_cursor(),
            &quick(),
            &cancel,
            |_, _| async {
                Ok(Page {
                    items: vec![1],
                    // Never advances past the same cursor.
                    next: Some(PageToken::Cursor("stuck".to_string())),
                })
            },
        )
        .await
        .unwrap_err();
        // First page advances ("" -> "stuck"), second page repeats it.
        assert!(matches!(
            failure.error,
            FetchError::PaginationStalled { page: 2 }
        ));
        assert_eq!(failure.partial, vec![1, 1]);
    }

    #[tokio::test]
    async fn test_remote_error_carries_partial_items() {
        let cancel = CancellationToken::new();
        let failure = fetch_all(PageToken::first_page(), &quick(), &cancel, |token, _| async move {
            match token {
                PageToken::Number(1) => Ok(Page {
                    items: vec![1, 2],
                    next: Some(PageToken::Number(2)),
                }),
                _ => Err(RemoteError::status(500, "/things", "boom")),
            }
        })
        .await
        .unwrap_err();
        assert_eq!(failure.partial, vec![1, 2]);
        assert!(matches!(failure.error, FetchError::Remote { page: 2, .. }));
    }

    #[tokio::test]
    async fn test_cancellation_returns_promptly() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let failure = fetch_all(PageToken::first_page(), &quick(), &cancel, |_, _| async {
            Ok(Page {
                items: vec![1],
                next: Some(PageToken::Number(2)),
            })
        })
        .await
        .unwrap_err();
        assert!(matches!(failure.error, FetchError::Cancelled { .. }));
    }
}
