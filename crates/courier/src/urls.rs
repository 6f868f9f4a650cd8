//! Canonical request URLs for each logical operation.
//!
//! The same query always produces the same URL string, which is also the
//! response cache key. `raw_json=1` is always requested so text fields arrive
//! without HTML entity escaping.

use courier_error::{FetchError, FetchErrorKind, FetchResult};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use url::Url;
use url::form_urlencoded::Serializer;

/// Listing sort order.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Sort {
    /// Currently trending
    #[default]
    Hot,
    /// Newest first
    New,
    /// Highest score within a time window
    Top,
    /// Gaining traction
    Rising,
}

/// Time window for `top` listings and search.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TimeWindow {
    /// Past hour
    Hour,
    /// Past day
    Day,
    /// Past week
    Week,
    /// Past month
    Month,
    /// Past year
    Year,
    /// All time
    All,
}

/// Search result ordering.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SearchSort {
    /// Best match
    #[default]
    Relevance,
    /// Currently trending
    Hot,
    /// Highest score
    Top,
    /// Newest first
    New,
    /// Most discussed
    Comments,
}

/// One page of a feed listing.
///
/// An empty category selects the front page.
///
/// # Example
///
/// ```
/// use courier::{ListingQuery, Sort, TimeWindow};
///
/// let query = ListingQuery::new("rust")
///     .with_sort(Sort::Top)
///     .with_time(TimeWindow::Week)
///     .with_after("t3_abc123");
/// assert_eq!(query.category(), "rust");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
pub struct ListingQuery {
    category: String,
    sort: Sort,
    time: Option<TimeWindow>,
    limit: Option<u32>,
    after: Option<String>,
    refresh: bool,
}

impl ListingQuery {
    /// Query the first page of a category, sorted by `hot`.
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            ..Self::default()
        }
    }

    /// Query the front page.
    pub fn front_page() -> Self {
        Self::default()
    }

    /// Set the sort order.
    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    /// Set the time window; only sent for `top`.
    pub fn with_time(mut self, time: TimeWindow) -> Self {
        self.time = Some(time);
        self
    }

    /// Override the configured page size.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Continue after the cursor of a previous page.
    pub fn with_after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    /// Bypass the cache for this query.
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }
}

/// Comment tree of one post.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct CommentsQuery {
    permalink: String,
    limit: Option<u32>,
    refresh: bool,
}

impl CommentsQuery {
    /// Query the comment tree at a permalink (path or absolute URL).
    pub fn new(permalink: impl Into<String>) -> Self {
        Self {
            permalink: permalink.into(),
            limit: None,
            refresh: false,
        }
    }

    /// Limit the number of comments returned.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Bypass the cache for this query.
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }
}

/// Text search, optionally restricted to one category.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct SearchQuery {
    query: String,
    scope: Option<String>,
    sort: SearchSort,
    time: Option<TimeWindow>,
    limit: Option<u32>,
    after: Option<String>,
    refresh: bool,
}

impl SearchQuery {
    /// Search everywhere.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            scope: None,
            sort: SearchSort::default(),
            time: None,
            limit: None,
            after: None,
            refresh: false,
        }
    }

    /// Restrict results to one category.
    pub fn within(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Set the result ordering.
    pub fn with_sort(mut self, sort: SearchSort) -> Self {
        self.sort = sort;
        self
    }

    /// Set the time window.
    pub fn with_time(mut self, time: TimeWindow) -> Self {
        self.time = Some(time);
        self
    }

    /// Override the configured page size.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Continue after the cursor of a previous page.
    pub fn with_after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    /// Bypass the cache for this query.
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }
}

/// Builds canonical URLs against the configured API host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiUrls {
    base: Url,
    page_size: u32,
}

impl ApiUrls {
    /// Create a URL builder for `base_url` with a default page size.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute URL.
    pub fn new(base_url: &str, page_size: u32) -> FetchResult<Self> {
        let base = Url::parse(base_url).map_err(|e| invalid(format!("{}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(invalid(format!("{} cannot be a base URL", base_url)));
        }
        Ok(Self { base, page_size })
    }

    /// Listing page URL.
    ///
    /// ```
    /// use courier::{ApiUrls, ListingQuery, Sort, TimeWindow};
    ///
    /// let urls = ApiUrls::new("https://www.reddit.com", 25).unwrap();
    /// let query = ListingQuery::new("rust").with_sort(Sort::Top).with_time(TimeWindow::Week);
    /// assert_eq!(
    ///     urls.listing(&query).unwrap(),
    ///     "https://www.reddit.com/r/rust/top.json?limit=25&t=week&raw_json=1"
    /// );
    /// ```
    pub fn listing(&self, query: &ListingQuery) -> FetchResult<String> {
        let path = if query.category.is_empty() {
            format!("/{}.json", query.sort)
        } else {
            format!("/r/{}/{}.json", segment(&query.category)?, query.sort)
        };
        let mut url = self.with_path(&path);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("limit", &query.limit.unwrap_or(self.page_size).to_string());
            if query.sort == Sort::Top {
                if let Some(time) = query.time {
                    pairs.append_pair("t", &time.to_string());
                }
            }
            if let Some(after) = &query.after {
                pairs.append_pair("after", after);
            }
            pairs.append_pair("raw_json", "1");
        }
        Ok(url.into())
    }

    /// Comment tree URL.
    pub fn comments(&self, query: &CommentsQuery) -> FetchResult<String> {
        let permalink = match Url::parse(&query.permalink) {
            Ok(absolute) => absolute.path().to_string(),
            Err(_) => query.permalink.clone(),
        };
        let permalink = permalink.trim().trim_end_matches('/');
        if permalink.is_empty() || !permalink.starts_with('/') {
            return Err(invalid(format!("Invalid permalink: {:?}", query.permalink)));
        }
        let permalink = permalink.strip_suffix(".json").unwrap_or(permalink);

        let mut url = self.with_path(&format!("{}.json", permalink));
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(limit) = query.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
            pairs.append_pair("raw_json", "1");
        }
        Ok(url.into())
    }

    /// Search URL.
    pub fn search(&self, query: &SearchQuery) -> FetchResult<String> {
        if query.query.trim().is_empty() {
            return Err(invalid("Search query is empty".to_string()));
        }
        let path = match &query.scope {
            Some(scope) => format!("/r/{}/search.json", segment(scope)?),
            None => "/search.json".to_string(),
        };
        let mut url = self.with_path(&path);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", &query.query);
            if query.scope.is_some() {
                pairs.append_pair("restrict_sr", "1");
            }
            pairs.append_pair("sort", &query.sort.to_string());
            if let Some(time) = query.time {
                pairs.append_pair("t", &time.to_string());
            }
            pairs.append_pair("limit", &query.limit.unwrap_or(self.page_size).to_string());
            if let Some(after) = &query.after {
                pairs.append_pair("after", after);
            }
            pairs.append_pair("raw_json", "1");
        }
        Ok(url.into())
    }

    /// Metadata URL for a named category.
    pub fn about(&self, name: &str) -> FetchResult<String> {
        let mut url = self.with_path(&format!("/r/{}/about.json", segment(name)?));
        url.query_pairs_mut().append_pair("raw_json", "1");
        Ok(url.into())
    }

    /// Batch expansion endpoint and its form body.
    pub fn more_children(&self, link_id: &str, children: &[String]) -> (String, String) {
        let url = self.with_path("/api/morechildren");
        let body = Serializer::new(String::new())
            .append_pair("api_type", "json")
            .append_pair("link_id", link_id)
            .append_pair("children", &children.join(","))
            .append_pair("raw_json", "1")
            .finish();
        (url.into(), body)
    }

    fn with_path(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        url.set_query(None);
        url
    }
}

fn segment(name: &str) -> FetchResult<&str> {
    let name = name.trim().trim_start_matches("r/").trim_matches('/');
    if name.is_empty() || name.contains(['/', '?', '#']) {
        return Err(invalid(format!("Invalid category name: {:?}", name)));
    }
    Ok(name)
}

#[track_caller]
fn invalid(message: String) -> FetchError {
    FetchError::new(FetchErrorKind::InvalidRequest(message))
}
