//! Resource categories and their time-to-live policy.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Resource category of a canonical request URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ResourceCategory {
    /// Metadata for a named resource (`/about`)
    About,
    /// Comment tree for one item
    Comments,
    /// Text search results
    Search,
    /// Paginated feed listing
    Listing,
    /// Anything else
    Default,
}

const LISTING_SORTS: [&str; 4] = ["hot", "new", "top", "rising"];

impl ResourceCategory {
    /// Classify a canonical URL by pattern-matching its path.
    ///
    /// # Example
    ///
    /// ```
    /// use courier_cache::ResourceCategory;
    ///
    /// let url = "https://www.reddit.com/r/rust/about.json";
    /// assert_eq!(ResourceCategory::classify(url), ResourceCategory::About);
    /// ```
    pub fn classify(url: &str) -> Self {
        let path = url
            .split_once("://")
            .map_or(url, |(_, rest)| rest.split_once('/').map_or("", |(_, path)| path))
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        // Scope prefix `r/<name>`; the name itself never decides the category.
        let rest = match segments.as_slice() {
            ["r", _, rest @ ..] => rest,
            all => all,
        };
        let Some(last) = rest.last() else {
            return Self::Default;
        };
        let stem = last.strip_suffix(".json").unwrap_or(last);

        if rest.first() == Some(&"comments") {
            Self::Comments
        } else if stem == "about" {
            Self::About
        } else if stem == "search" {
            Self::Search
        } else if LISTING_SORTS.contains(&stem) {
            Self::Listing
        } else {
            Self::Default
        }
    }
}

/// Time-to-live per resource category, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct CategoryTtls {
    /// Metadata lookups
    #[serde(default = "default_about_secs")]
    about_secs: u64,
    /// Comment trees
    #[serde(default = "default_comments_secs")]
    comments_secs: u64,
    /// Search results
    #[serde(default = "default_search_secs")]
    search_secs: u64,
    /// Feed listings
    #[serde(default = "default_listing_secs")]
    listing_secs: u64,
    /// Uncategorized URLs
    #[serde(default = "default_default_secs")]
    default_secs: u64,
}

fn default_about_secs() -> u64 {
    24 * 60 * 60
}

fn default_comments_secs() -> u64 {
    10 * 60
}

fn default_search_secs() -> u64 {
    10 * 60
}

fn default_listing_secs() -> u64 {
    5 * 60
}

fn default_default_secs() -> u64 {
    2 * 60
}

impl CategoryTtls {
    /// Create a TTL table from explicit values in seconds.
    pub fn new(about: u64, comments: u64, search: u64, listing: u64, default: u64) -> Self {
        Self {
            about_secs: about,
            comments_secs: comments,
            search_secs: search,
            listing_secs: listing,
            default_secs: default,
        }
    }

    /// TTL for the given category.
    pub fn ttl_for(&self, category: ResourceCategory) -> Duration {
        let secs = match category {
            ResourceCategory::About => self.about_secs,
            ResourceCategory::Comments => self.comments_secs,
            ResourceCategory::Search => self.search_secs,
            ResourceCategory::Listing => self.listing_secs,
            ResourceCategory::Default => self.default_secs,
        };
        Duration::from_secs(secs)
    }
}

impl Default for CategoryTtls {
    fn default() -> Self {
        Self {
            about_secs: default_about_secs(),
            comments_secs: default_comments_secs(),
            search_secs: default_search_secs(),
            listing_secs: default_listing_secs(),
            default_secs: default_default_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_listing_paths() {
        for url in [
            "https://www.reddit.com/r/popular/hot.json?limit=25&raw_json=1",
            "https://www.reddit.com/new.json",
            "https://www.reddit.com/r/rust/top.json?t=week",
        ] {
            assert_eq!(ResourceCategory::classify(url), ResourceCategory::Listing, "{url}");
        }
    }

    #[test]
    fn classifies_other_paths() {
        assert_eq!(
            ResourceCategory::classify("https://www.reddit.com/r/rust/comments/abc/title.json"),
            ResourceCategory::Comments
        );
        assert_eq!(
            ResourceCategory::classify("https://www.reddit.com/search.json?q=hot"),
            ResourceCategory::Search
        );
        assert_eq!(
            ResourceCategory::classify("https://www.reddit.com/user/someone.json"),
            ResourceCategory::Default
        );
    }

    #[test]
    fn category_names_do_not_leak_into_the_category() {
        let cases = [
            ("https://www.reddit.com/r/aboutdaddy/hot.json?limit=25&raw_json=1", ResourceCategory::Listing),
            ("https://www.reddit.com/r/searchengines/new.json?limit=25", ResourceCategory::Listing),
            ("https://www.reddit.com/r/aboutdaddy/search.json?q=x&restrict_sr=1", ResourceCategory::Search),
            ("https://www.reddit.com/r/comments/hot.json", ResourceCategory::Listing),
            ("https://www.reddit.com/r/comments/about.json", ResourceCategory::About),
            ("https://www.reddit.com/r/search/comments/abc/title.json", ResourceCategory::Comments),
            ("https://www.reddit.com/r/hot/about.json", ResourceCategory::About),
            ("https://www.reddit.com/r/rust.json", ResourceCategory::Default),
        ];
        for (url, expected) in cases {
            assert_eq!(ResourceCategory::classify(url), expected, "{url}");
        }
    }

    #[test]
    fn metadata_outlives_feeds() {
        let ttls = CategoryTtls::default();
        assert!(ttls.ttl_for(ResourceCategory::About) > ttls.ttl_for(ResourceCategory::Comments));
        assert!(ttls.ttl_for(ResourceCategory::Comments) > ttls.ttl_for(ResourceCategory::Listing));
        assert!(ttls.ttl_for(ResourceCategory::Listing) > ttls.ttl_for(ResourceCategory::Default));
    }
}
