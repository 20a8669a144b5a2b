use crate::core::fetcher::MAX_PAGE_SIZE;
use crate::core::{AccountIdentity, CollectionItem, CollectionPage, ConfigProvider, SubscriptionApi};
use crate::utils::error::{Result, SyncError};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;

pub const DEFAULT_API_BASE_URL: &str = "https://oauth.reddit.com";
pub const DEFAULT_USER_AGENT: &str = "RedAltSync/1.0";

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: SubredditData,
}

#[derive(Debug, Deserialize)]
struct SubredditData {
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct Me {
    name: String,
}

/// Reddit OAuth API client.
#[derive(Debug, Clone)]
pub struct RedditApiClient {
    client: Client,
    base_url: String,
    user_agent: String,
}

impl RedditApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent());
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.api_base_url().trim_end_matches('/').to_string(),
            user_agent: config.user_agent().to_string(),
        })
    }

    fn authorized(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request
            .bearer_auth(token)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
    }

    fn ensure_success(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(SyncError::HttpError {
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait::async_trait]
impl SubscriptionApi for RedditApiClient {
    async fn fetch_page(
        &self,
        token: &str,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<CollectionPage> {
        let url = format!("{}/subreddits/mine/subscriber", self.base_url);
        let limit = page_size.clamp(1, MAX_PAGE_SIZE).to_string();

        let mut query = vec![("limit", limit.as_str())];
        if let Some(after) = cursor {
            query.push(("after", after));
        }

        tracing::debug!("Making API request to: {} (after: {:?})", url, cursor);
        let response = self
            .authorized(self.client.get(&url), token)
            .query(&query)
            .send()
            .await?;
        tracing::debug!("API response status: {}", response.status());

        let listing: Listing = Self::ensure_success(response)?.json().await?;

        Ok(CollectionPage {
            items: listing
                .data
                .children
                .into_iter()
                .map(|child| CollectionItem::new(child.data.display_name))
                .collect(),
            // 空字串的 after 視同沒有下一頁
            next_cursor: listing.data.after.filter(|after| !after.is_empty()),
        })
    }

    async fn subscribe(&self, token: &str, name: &str) -> Result<()> {
        let url = format!("{}/api/subscribe", self.base_url);

        let response = self
            .authorized(self.client.post(&url), token)
            .form(&[("sr_name", name), ("action", "sub")])
            .send()
            .await?;

        Self::ensure_success(response)?;
        Ok(())
    }

    async fn fetch_identity(&self, token: &str) -> Result<AccountIdentity> {
        let url = format!("{}/api/v1/me", self.base_url);

        let response = self
            .authorized(self.client.get(&url), token)
            .send()
            .await?;
        let me: Me = Self::ensure_success(response)?.json().await?;

        Ok(AccountIdentity { username: me.name })
    }
}
