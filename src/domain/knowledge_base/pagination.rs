//! Continuation-token pagination as a lazy stream of pages

use std::future::Future;

use futures::{Stream, TryStreamExt, stream};

use crate::domain::DomainError;

/// One page of a list operation
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_token: Option<String>) -> Self {
        Self { items, next_token }
    }

    /// A page with no continuation
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }
}

enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Lazily fetch pages, following continuation tokens until one is absent or
/// empty. Nothing is requested until the stream is polled; calling this again
/// with a fresh `fetch` restarts from the first page.
pub fn pages<T, F, Fut>(fetch: F) -> impl Stream<Item = Result<Vec<T>, DomainError>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, DomainError>>,
{
    stream::try_unfold((fetch, Cursor::Start), |(mut fetch, cursor)| async move {
        let token = match cursor {
            Cursor::Start => None,
            Cursor::Next(token) => Some(token),
            Cursor::Done => return Ok(None),
        };

        let page = fetch(token).await?;
        let next = match page.next_token {
            Some(token) if !token.is_empty() => Cursor::Next(token),
            _ => Cursor::Done,
        };

        Ok(Some((page.items, (fetch, next))))
    })
}

/// Drain every page into one ordered collection
pub async fn collect_all<T, F, Fut>(fetch: F) -> Result<Vec<T>, DomainError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, DomainError>>,
{
    pages(fetch).try_concat().await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use futures::StreamExt;

    use super::*;

    fn three_pages(token: Option<String>) -> Result<Page<u32>, DomainError> {
        match token.as_deref() {
            None => Ok(Page::new(vec![1, 2], Some("p2".to_string()))),
            Some("p2") => Ok(Page::new(vec![3], Some("p3".to_string()))),
            Some("p3") => Ok(Page::new(vec![4, 5], Some(String::new()))),
            Some(other) => panic!("unexpected token {}", other),
        }
    }

    #[tokio::test]
    async fn test_collect_all_preserves_order() {
        let items = collect_all(|token| async move { three_pages(token) }).await.unwrap();
        assert_eq!(items, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_single_page() {
        let items = collect_all(|_| async { Ok(Page::last(vec!["only"])) }).await.unwrap();
        assert_eq!(items, vec!["only"]);
    }

    #[tokio::test]
    async fn test_error_stops_iteration() {
        let calls = Mutex::new(Vec::new());

        let result: Result<Vec<u32>, _> = collect_all(|token: Option<String>| {
            calls.lock().unwrap().push(token.clone());
            async move {
                match token {
                    None => Ok(Page::new(vec![1], Some("p2".to_string()))),
                    Some(_) => Err(DomainError::remote(
                        "ListKnowledgeBases",
                        Some("ThrottlingException".to_string()),
                        None,
                        None,
                    )),
                }
            }
        })
        .await;

        assert!(matches!(result, Err(DomainError::Remote(_))));
        assert_eq!(*calls.lock().unwrap(), vec![None, Some("p2".to_string())]);
    }

    #[tokio::test]
    async fn test_pages_are_lazy() {
        let calls = Mutex::new(0);

        let mut stream = Box::pin(pages(|token| {
            *calls.lock().unwrap() += 1;
            async move { three_pages(token) }
        }));
        assert_eq!(*calls.lock().unwrap(), 0);

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first, vec![1, 2]);
        assert_eq!(*calls.lock().unwrap(), 1);
    }
}
