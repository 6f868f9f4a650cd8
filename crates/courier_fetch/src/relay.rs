//! Relay endpoints and per-call relay ordering.

use courier_error::ConfigError;
use derive_getters::Getters;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, instrument};

/// A relay that rewrites a target URL into a relayed URL.
///
/// The template decides how the target is embedded:
/// - `{url}` is replaced by the percent-encoded target
/// - `{raw}` is replaced by the target verbatim
/// - a template without placeholder is a prefix followed by the verbatim target
///
/// # Example
///
/// ```
/// use courier_fetch::RelayBuilder;
///
/// let relay = RelayBuilder::new("corsproxy", "https://corsproxy.io/?url={url}");
/// assert_eq!(
///     relay.build("https://www.reddit.com/hot.json?limit=5"),
///     "https://corsproxy.io/?url=https%3A%2F%2Fwww.reddit.com%2Fhot.json%3Flimit%3D5"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct RelayBuilder {
    /// Short name used in logs
    name: String,
    /// URL template
    template: String,
    /// Whether this relay is known to forward request bodies (non-GET methods)
    #[serde(default)]
    supports_body_forwarding: bool,
}

impl RelayBuilder {
    /// Create a read-only relay.
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            supports_body_forwarding: false,
        }
    }

    /// Mark whether this relay forwards request bodies.
    pub fn with_body_forwarding(mut self, supported: bool) -> Self {
        self.supports_body_forwarding = supported;
        self
    }

    /// Wrap `target` in this relay's URL.
    pub fn build(&self, target: &str) -> String {
        if self.template.contains("{url}") {
            let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
            self.template.replace("{url}", &encoded)
        } else if self.template.contains("{raw}") {
            self.template.replace("{raw}", target)
        } else {
            format!("{}{}", self.template, target)
        }
    }
}

/// How read requests order the relays for each call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayOrdering {
    /// Uniform shuffle per call, spreading load and avoiding a dead relay first
    #[default]
    Shuffled,
    /// Configured order, for reproducible attempt sequences
    Fixed,
}

/// Ordered set of relays with capability-aware selection.
#[derive(Debug)]
pub struct RelayDirectory {
    relays: Vec<RelayBuilder>,
    ordering: RelayOrdering,
    rng: Mutex<StdRng>,
}

impl RelayDirectory {
    /// Create a directory whose shuffle is seeded from OS entropy.
    ///
    /// # Errors
    ///
    /// Returns an error if no relays are given or none forwards request bodies.
    pub fn new(relays: Vec<RelayBuilder>, ordering: RelayOrdering) -> Result<Self, ConfigError> {
        Self::with_rng(relays, ordering, StdRng::from_entropy())
    }

    /// Create a directory with an injected random source.
    ///
    /// # Errors
    ///
    /// Returns an error if no relays are given or none forwards request bodies.
    #[instrument(skip(relays, rng), fields(relay_count = relays.len()))]
    pub fn with_rng(
        relays: Vec<RelayBuilder>,
        ordering: RelayOrdering,
        rng: StdRng,
    ) -> Result<Self, ConfigError> {
        if relays.is_empty() {
            return Err(ConfigError::new("At least one relay must be configured"));
        }
        if !relays.iter().any(|r| r.supports_body_forwarding) {
            return Err(ConfigError::new(
                "At least one relay must support body forwarding",
            ));
        }
        debug!(?ordering, "Creating relay directory");

        Ok(Self {
            relays,
            ordering,
            rng: Mutex::new(rng),
        })
    }

    /// All configured relays in configured order.
    pub fn relays(&self) -> &[RelayBuilder] {
        &self.relays
    }

    /// Relays to try for one logical request, in attempt order.
    ///
    /// Read requests may use every relay; other methods only those that
    /// forward request bodies.
    pub fn select_order(&self, method: &Method) -> Vec<RelayBuilder> {
        if *method != Method::GET && *method != Method::HEAD {
            return self
                .relays
                .iter()
                .filter(|r| r.supports_body_forwarding)
                .cloned()
                .collect();
        }

        let mut order = self.relays.clone();
        if self.ordering == RelayOrdering::Shuffled {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            order.shuffle(&mut *rng);
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relays() -> Vec<RelayBuilder> {
        vec![
            RelayBuilder::new("a", "https://a.test/?url={url}").with_body_forwarding(true),
            RelayBuilder::new("b", "https://b.test/raw?quest={raw}"),
            RelayBuilder::new("c", "https://c.test/fetch/"),
        ]
    }

    #[test]
    fn builds_each_template_style() {
        let target = "https://host.test/r/x.json?a=1";
        let [a, b, c]: [RelayBuilder; 3] = relays().try_into().unwrap();
        assert_eq!(a.build(target), "https://a.test/?url=https%3A%2F%2Fhost.test%2Fr%2Fx.json%3Fa%3D1");
        assert_eq!(b.build(target), "https://b.test/raw?quest=https://host.test/r/x.json?a=1");
        assert_eq!(c.build(target), "https://c.test/fetch/https://host.test/r/x.json?a=1");
    }

    #[test]
    fn non_get_uses_body_forwarding_subset() {
        let dir = RelayDirectory::new(relays(), RelayOrdering::Shuffled).unwrap();
        let order = dir.select_order(&Method::POST);
        assert_eq!(order.len(), 1);
        assert_eq!(order[0].name(), "a");
    }

    #[test]
    fn seeded_shuffle_is_reproducible() {
        let first = RelayDirectory::with_rng(relays(), RelayOrdering::Shuffled, StdRng::seed_from_u64(7)).unwrap();
        let second = RelayDirectory::with_rng(relays(), RelayOrdering::Shuffled, StdRng::seed_from_u64(7)).unwrap();
        for _ in 0..5 {
            assert_eq!(first.select_order(&Method::GET), second.select_order(&Method::GET));
        }
    }

    #[test]
    fn get_order_is_a_permutation() {
        let dir = RelayDirectory::new(relays(), RelayOrdering::Shuffled).unwrap();
        let mut names: Vec<_> = dir.select_order(&Method::GET).iter().map(|r| r.name().clone()).collect();
        names.sort();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn fixed_ordering_keeps_configuration_order() {
        let dir = RelayDirectory::new(relays(), RelayOrdering::Fixed).unwrap();
        let names: Vec<_> = dir.select_order(&Method::GET).iter().map(|r| r.name().clone()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn rejects_missing_body_forwarding_relay() {
        let only_reads = vec![RelayBuilder::new("b", "https://b.test/{raw}")];
        assert!(RelayDirectory::new(only_reads, RelayOrdering::Fixed).is_err());
        assert!(RelayDirectory::new(Vec::new(), RelayOrdering::Fixed).is_err());
    }
}
