//! Resource façade over the resilient fetcher.

use crate::{
    ApiUrls, CommentThread, CommentsQuery, CourierConfig, Entry, Listing, ListingQuery,
    MoreChildren, ResourceMetadata, SearchQuery, expansion_entries,
};
use courier_cache::ResponseCache;
use courier_error::CourierResult;
use courier_fetch::{FetchRequest, RelayTransport, ReqwestTransport, ResilientFetcher};
use futures::future::try_join_all;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// High-level client for the upstream API.
///
/// Cloning is cheap; clones share the fetcher, so they share its cache and
/// admission queue.
///
/// # Example
///
/// ```rust,ignore
/// use courier::{CourierClient, CourierConfig, ListingQuery, Sort};
///
/// let client = CourierClient::new(&CourierConfig::load()?)?;
/// let page = client.listing(&ListingQuery::new("rust").with_sort(Sort::New)).await?;
/// for post in page.posts() {
///     println!("{} ({})", post.title(), post.score());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CourierClient {
    fetcher: Arc<ResilientFetcher>,
    urls: ApiUrls,
    more_children_chunk: usize,
    cancel: CancellationToken,
}

impl CourierClient {
    /// Create a client that talks to the relays over HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the relay list is invalid, the base URL cannot be
    /// parsed or the HTTP client cannot be built.
    pub fn new(config: &CourierConfig) -> CourierResult<Self> {
        let transport = ReqwestTransport::new(config.fetch().user_agent())?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over a custom transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the relay list is invalid or the base URL cannot be parsed.
    pub fn with_transport(
        config: &CourierConfig,
        transport: Arc<dyn RelayTransport>,
    ) -> CourierResult<Self> {
        let fetcher = ResilientFetcher::new(
            config.fetch().clone(),
            config.relay_directory()?,
            ResponseCache::new(config.cache().clone()),
            transport,
        );
        Self::from_fetcher(fetcher, config)
    }

    /// Create a client around an existing fetcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot be parsed.
    pub fn from_fetcher(fetcher: ResilientFetcher, config: &CourierConfig) -> CourierResult<Self> {
        let api = config.api();
        let urls = ApiUrls::new(api.base_url(), *api.page_size())?;
        info!(base_url = %api.base_url(), "Created courier client");
        Ok(Self {
            fetcher: Arc::new(fetcher),
            urls,
            more_children_chunk: (*api.more_children_chunk()).max(1),
            cancel: CancellationToken::new(),
        })
    }

    /// A client whose calls observe `token`, sharing this client's fetcher.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            cancel: token,
            ..self.clone()
        }
    }

    /// Token observed by this client's calls.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Underlying fetcher.
    pub fn fetcher(&self) -> &ResilientFetcher {
        &self.fetcher
    }

    /// URL builder.
    pub fn urls(&self) -> &ApiUrls {
        &self.urls
    }

    /// Number of cached responses.
    pub fn cache_len(&self) -> usize {
        self.fetcher.cache_len()
    }

    /// Drop every cached response.
    pub fn clear_cache(&self) {
        self.fetcher.clear_cache();
    }

    /// Fetch one listing page.
    ///
    /// # Errors
    ///
    /// Returns fetch errors unchanged in kind, or a JSON error when the
    /// response is not a listing.
    #[instrument(skip(self, query), fields(category = %query.category(), sort = %query.sort()))]
    pub async fn listing(&self, query: &ListingQuery) -> CourierResult<Listing> {
        let url = self.urls.listing(query)?;
        let value = self.get(url, *query.refresh()).await?;
        Ok(Listing::from_value(value)?)
    }

    /// Fetch a post and its comment tree.
    ///
    /// # Errors
    ///
    /// Returns fetch errors unchanged in kind, or a JSON error when the
    /// response is not a comment envelope.
    #[instrument(skip(self, query), fields(permalink = %query.permalink()))]
    pub async fn comments(&self, query: &CommentsQuery) -> CourierResult<CommentThread> {
        let url = self.urls.comments(query)?;
        let value = self.get(url, *query.refresh()).await?;
        Ok(CommentThread::from_value(value)?)
    }

    /// Search posts.
    ///
    /// # Errors
    ///
    /// Returns fetch errors unchanged in kind, or a JSON error when the
    /// response is not a listing.
    #[instrument(skip(self, query), fields(query = %query.query()))]
    pub async fn search(&self, query: &SearchQuery) -> CourierResult<Listing> {
        let url = self.urls.search(query)?;
        let value = self.get(url, *query.refresh()).await?;
        Ok(Listing::from_value(value)?)
    }

    /// Fetch metadata for a named category.
    ///
    /// # Errors
    ///
    /// Returns fetch errors unchanged in kind (a private or banned category is
    /// `Terminal`), or a JSON error when the response has no metadata.
    #[instrument(skip(self))]
    pub async fn about(&self, name: &str, refresh: bool) -> CourierResult<ResourceMetadata> {
        let url = self.urls.about(name)?;
        let value = self.get(url, refresh).await?;
        Ok(ResourceMetadata::from_value(value)?)
    }

    /// Expand truncated comment branches.
    ///
    /// Ids are split into chunks of the configured size; each chunk is one
    /// POST submitted concurrently, and results are flattened in chunk order.
    /// Any failing chunk fails the whole call.
    ///
    /// # Errors
    ///
    /// Returns the first chunk failure.
    #[instrument(skip(self, children), fields(children = children.len()))]
    pub async fn more_children(
        &self,
        link_id: &str,
        children: &[String],
    ) -> CourierResult<Vec<Entry>> {
        if children.is_empty() {
            return Ok(Vec::new());
        }

        let chunks = children.chunks(self.more_children_chunk).map(|chunk| {
            let (url, body) = self.urls.more_children(link_id, chunk);
            let request = FetchRequest::post_form(url, body).with_cancellation(self.cancel.clone());
            async move {
                let value = self.fetcher.fetch(request).await?;
                CourierResult::Ok(expansion_entries(value)?)
            }
        });
        debug!(chunk_size = self.more_children_chunk, "Expanding branches");

        let batches = try_join_all(chunks).await?;
        Ok(batches.into_iter().flatten().collect())
    }

    /// Expand one placeholder of `thread` in place.
    ///
    /// # Errors
    ///
    /// Returns the expansion failure; the thread is unchanged then.
    pub async fn expand(&self, thread: &mut CommentThread, more: &MoreChildren) -> CourierResult<()> {
        let link_id = thread.post().name().clone();
        let entries = self.more_children(&link_id, more.children()).await?;
        thread.merge_expanded(more.id(), entries);
        Ok(())
    }

    async fn get(&self, url: String, refresh: bool) -> CourierResult<JsonValue> {
        let request = FetchRequest::get(url)
            .bypass_cache(refresh)
            .with_cancellation(self.cancel.clone());
        Ok(self.fetcher.fetch(request).await?)
    }
}
