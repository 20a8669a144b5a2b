use crate::core::{Collection, CollectionItem, Credential, Result, SubscriptionApi};
use std::sync::Arc;

/// 遠端 API 單頁允許的最大筆數
pub const MAX_PAGE_SIZE: usize = 100;

/// Follows continuation cursors until the remote collection is exhausted.
pub struct CollectionFetcher<A: SubscriptionApi> {
    api: Arc<A>,
    page_size: usize,
}

impl<A: SubscriptionApi> CollectionFetcher<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            page_size: MAX_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Fetches every page for the credential's account.
    ///
    /// Any failed page aborts the whole fetch; pages already received are
    /// dropped with the error.
    pub async fn fetch_collection(&self, credential: &Credential) -> Result<Collection> {
        let mut items: Vec<CollectionItem> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .api
                .fetch_page(&credential.token, cursor.as_deref(), self.page_size)
                .await?;
            pages += 1;

            tracing::debug!(
                "📄 {}: page {} returned {} items (cursor: {:?})",
                credential.slot,
                pages,
                page.items.len(),
                page.next_cursor
            );

            items.extend(page.items);

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        tracing::info!(
            "📥 {}: fetched {} subscriptions across {} page(s)",
            credential.slot,
            items.len(),
            pages
        );

        Ok(Collection::from_fetched(credential.slot, items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AccountIdentity, AccountSlot, CollectionPage};
    use crate::utils::error::SyncError;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    /// 以 cursor 為鍵的假分頁 API
    struct PagedApi {
        pages: HashMap<Option<String>, std::result::Result<CollectionPage, u16>>,
        requests: Mutex<Vec<(Option<String>, usize)>>,
    }

    impl PagedApi {
        fn new() -> Self {
            Self {
                pages: HashMap::new(),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn with_page(mut self, cursor: Option<&str>, names: &[&str], next: Option<&str>) -> Self {
            let page = CollectionPage {
                items: names.iter().map(|n| CollectionItem::new(*n)).collect(),
                next_cursor: next.map(str::to_string),
            };
            self.pages.insert(cursor.map(str::to_string), Ok(page));
            self
        }

        fn with_failure(mut self, cursor: Option<&str>, status: u16) -> Self {
            self.pages.insert(cursor.map(str::to_string), Err(status));
            self
        }
    }

    #[async_trait::async_trait]
    impl SubscriptionApi for PagedApi {
        async fn fetch_page(
            &self,
            _token: &str,
            cursor: Option<&str>,
            page_size: usize,
        ) -> Result<CollectionPage> {
            let key = cursor.map(str::to_string);
            self.requests.lock().await.push((key.clone(), page_size));
            match self.pages.get(&key) {
                Some(Ok(page)) => Ok(page.clone()),
                Some(Err(status)) => Err(SyncError::HttpError { status: *status }),
                None => Err(SyncError::HttpError { status: 404 }),
            }
        }

        async fn subscribe(&self, _token: &str, _name: &str) -> Result<()> {
            unreachable!("fetcher never writes")
        }

        async fn fetch_identity(&self, _token: &str) -> Result<AccountIdentity> {
            unreachable!("fetcher never asks for identity")
        }
    }

    fn credential() -> Credential {
        Credential::new(AccountSlot::Source, "token")
    }

    #[tokio::test]
    async fn test_single_page_without_cursor() {
        let api = Arc::new(PagedApi::new().with_page(None, &["rust", "golang"], None));
        let fetcher = CollectionFetcher::new(api.clone());

        let collection = fetcher.fetch_collection(&credential()).await.unwrap();

        let names: Vec<&str> = collection.names().collect();
        assert_eq!(names, vec!["golang", "rust"]);
        assert_eq!(collection.slot(), AccountSlot::Source);
        assert_eq!(*api.requests.lock().await, vec![(None, MAX_PAGE_SIZE)]);
    }

    #[tokio::test]
    async fn test_follows_cursors_across_pages_and_sorts() {
        let api = Arc::new(
            PagedApi::new()
                .with_page(None, &["zig", "python"], Some("t5_a"))
                .with_page(Some("t5_a"), &["Cooking", "books"], Some("t5_b"))
                .with_page(Some("t5_b"), &["AskReddit"], None),
        );
        let fetcher = CollectionFetcher::new(api.clone());

        let collection = fetcher.fetch_collection(&credential()).await.unwrap();

        let names: Vec<&str> = collection.names().collect();
        assert_eq!(names, vec!["AskReddit", "books", "Cooking", "python", "zig"]);

        let cursors: Vec<Option<String>> = api
            .requests
            .lock()
            .await
            .iter()
            .map(|(cursor, _)| cursor.clone())
            .collect();
        assert_eq!(
            cursors,
            vec![None, Some("t5_a".to_string()), Some("t5_b".to_string())]
        );
    }

    #[tokio::test]
    async fn test_failed_page_discards_partial_results() {
        let api = Arc::new(
            PagedApi::new()
                .with_page(None, &["rust"], Some("t5_a"))
                .with_failure(Some("t5_a"), 503),
        );
        let fetcher = CollectionFetcher::new(api);

        let err = fetcher.fetch_collection(&credential()).await.unwrap_err();
        assert!(matches!(err, SyncError::HttpError { status: 503 }));
    }

    #[tokio::test]
    async fn test_page_size_is_clamped() {
        let api = Arc::new(PagedApi::new().with_page(None, &[], None));
        let fetcher = CollectionFetcher::new(api.clone()).with_page_size(500);

        let collection = fetcher.fetch_collection(&credential()).await.unwrap();

        assert!(collection.is_empty());
        assert_eq!(api.requests.lock().await[0].1, MAX_PAGE_SIZE);
    }
}
