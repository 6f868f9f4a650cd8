//! Typed shapes of the upstream JSON envelopes.

use courier_error::JsonError;
use derive_getters::Getters;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

/// A submitted post (`t3`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct Post {
    /// Short id
    id: String,
    /// Fullname (`t3_<id>`)
    #[serde(default)]
    name: String,
    /// Title
    #[serde(default)]
    title: String,
    /// Author, `[deleted]` when removed
    #[serde(default)]
    author: String,
    /// Owning category
    #[serde(default)]
    subreddit: String,
    /// Self text body
    #[serde(default)]
    selftext: String,
    /// Link target, or the permalink for self posts
    #[serde(default)]
    url: String,
    /// Path of the comment page
    #[serde(default)]
    permalink: String,
    /// Net score
    #[serde(default)]
    score: i64,
    /// Comment count
    #[serde(default)]
    num_comments: u64,
    /// Creation time in seconds since the epoch
    #[serde(default)]
    created_utc: f64,
    /// Marked adult
    #[serde(default)]
    over_18: bool,
    /// Text post rather than link
    #[serde(default)]
    is_self: bool,
    /// Pinned by moderators
    #[serde(default)]
    stickied: bool,
}

/// A comment (`t1`) with its nested replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct Comment {
    /// Short id
    id: String,
    /// Fullname (`t1_<id>`)
    #[serde(default)]
    name: String,
    /// Fullname of the parent post or comment
    #[serde(default)]
    parent_id: String,
    /// Fullname of the post this comment belongs to
    #[serde(default)]
    link_id: String,
    /// Author, `[deleted]` when removed
    #[serde(default)]
    author: String,
    /// Markdown body
    #[serde(default)]
    body: String,
    /// Net score
    #[serde(default)]
    score: i64,
    /// Creation time in seconds since the epoch
    #[serde(default)]
    created_utc: f64,
    /// Nesting depth, zero for top level
    #[serde(default)]
    depth: u32,
    /// Replies; the upstream sends `""` when there are none
    #[serde(default, deserialize_with = "deserialize_replies")]
    replies: Vec<Entry>,
}

impl Comment {
    /// Mutable access to the replies.
    pub fn replies_mut(&mut self) -> &mut Vec<Entry> {
        &mut self.replies
    }
}

/// Placeholder for comment branches truncated by the upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct MoreChildren {
    /// Short id
    id: String,
    /// Fullname
    #[serde(default)]
    name: String,
    /// Fullname of the comment or post these children hang under
    #[serde(default)]
    parent_id: String,
    /// Number of hidden comments
    #[serde(default)]
    count: u64,
    /// Nesting depth
    #[serde(default)]
    depth: u32,
    /// Ids to pass to batch expansion
    #[serde(default)]
    children: Vec<String>,
}

/// One child of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::From)]
#[serde(tag = "kind", content = "data")]
pub enum Entry {
    /// `t3`
    #[serde(rename = "t3")]
    Post(Post),
    /// `t1`
    #[serde(rename = "t1")]
    Comment(Comment),
    /// `more`
    #[serde(rename = "more")]
    More(MoreChildren),
}

impl Entry {
    /// Shape a `{kind, data}` thing; unknown kinds yield `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if a known kind has malformed data.
    pub fn from_thing(kind: &str, data: JsonValue) -> Result<Option<Self>, JsonError> {
        let entry = match kind {
            "t3" => Entry::Post(parse(kind, data)?),
            "t1" => Entry::Comment(parse(kind, data)?),
            "more" => Entry::More(parse(kind, data)?),
            other => {
                debug!(kind = other, "Skipping entry of unknown kind");
                return Ok(None);
            }
        };
        Ok(Some(entry))
    }

    /// Fullname of this entry.
    pub fn name(&self) -> &str {
        match self {
            Entry::Post(post) => &post.name,
            Entry::Comment(comment) => &comment.name,
            Entry::More(more) => &more.name,
        }
    }

    /// Fullname of the parent, when the entry lives in a comment tree.
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            Entry::Post(_) => None,
            Entry::Comment(comment) => Some(&comment.parent_id),
            Entry::More(more) => Some(&more.parent_id),
        }
    }
}

fn parse<T: serde::de::DeserializeOwned>(kind: &str, data: JsonValue) -> Result<T, JsonError> {
    serde_json::from_value(data)
        .map_err(|e| JsonError::new(format!("Malformed {} entry: {}", kind, e)))
}

#[derive(Deserialize)]
struct RawThing {
    kind: String,
    #[serde(default)]
    data: JsonValue,
}

#[derive(Deserialize)]
struct RawListingData {
    #[serde(default)]
    after: Option<String>,
    #[serde(default)]
    before: Option<String>,
    #[serde(default)]
    children: Vec<RawThing>,
}

#[derive(Deserialize)]
struct RawListing {
    kind: String,
    data: RawListingData,
}

/// A page of entries with its pagination cursors.
///
/// # Example
///
/// ```
/// use courier::Listing;
/// use serde_json::json;
///
/// let listing = Listing::from_value(json!({
///     "kind": "Listing",
///     "data": {
///         "after": "t3_b",
///         "children": [{"kind": "t3", "data": {"id": "a", "title": "Hello"}}]
///     }
/// })).unwrap();
/// assert_eq!(listing.after().as_deref(), Some("t3_b"));
/// assert_eq!(listing.entries().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Getters)]
pub struct Listing {
    /// Entries in upstream order
    entries: Vec<Entry>,
    /// Cursor for the next page, threaded back verbatim
    after: Option<String>,
    /// Cursor for the previous page
    before: Option<String>,
}

impl Listing {
    /// Shape a listing envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a `Listing` envelope.
    pub fn from_value(value: JsonValue) -> Result<Self, JsonError> {
        let raw: RawListing = serde_json::from_value(value)
            .map_err(|e| JsonError::new(format!("Malformed listing envelope: {}", e)))?;
        if raw.kind != "Listing" {
            return Err(JsonError::new(format!(
                "Expected a Listing envelope, got {}",
                raw.kind
            )));
        }
        let entries = things_to_entries(raw.data.children)?;
        Ok(Self {
            entries,
            after: raw.data.after.filter(|cursor| !cursor.is_empty()),
            before: raw.data.before.filter(|cursor| !cursor.is_empty()),
        })
    }

    /// Consume the listing, keeping only its entries.
    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    /// Posts in this page.
    pub fn posts(&self) -> impl Iterator<Item = &Post> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Post(post) => Some(post),
            _ => None,
        })
    }
}

impl<'de> Deserialize<'de> for Listing {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = JsonValue::deserialize(deserializer)?;
        Listing::from_value(value).map_err(de::Error::custom)
    }
}

fn things_to_entries(things: Vec<RawThing>) -> Result<Vec<Entry>, JsonError> {
    let mut entries = Vec::with_capacity(things.len());
    for thing in things {
        if let Some(entry) = Entry::from_thing(&thing.kind, thing.data)? {
            entries.push(entry);
        }
    }
    Ok(entries)
}

fn deserialize_replies<'de, D>(deserializer: D) -> Result<Vec<Entry>, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::Null => Ok(Vec::new()),
        JsonValue::String(s) if s.is_empty() => Ok(Vec::new()),
        JsonValue::Array(entries) => entries
            .into_iter()
            .map(|entry| serde_json::from_value(entry).map_err(de::Error::custom))
            .collect(),
        value => Listing::from_value(value)
            .map(Listing::into_entries)
            .map_err(de::Error::custom),
    }
}

/// Shape the `things` of a batch expansion response.
///
/// # Errors
///
/// Returns an error if the response has no `json.data.things` array.
pub fn expansion_entries(value: JsonValue) -> Result<Vec<Entry>, JsonError> {
    let things = value
        .pointer("/json/data/things")
        .cloned()
        .ok_or_else(|| JsonError::new("Expansion response has no json.data.things"))?;
    let things: Vec<RawThing> = serde_json::from_value(things)
        .map_err(|e| JsonError::new(format!("Malformed expansion things: {}", e)))?;
    things_to_entries(things)
}

/// A post together with its comment tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct CommentThread {
    /// The post
    post: Post,
    /// Top-level comments and placeholders
    comments: Vec<Entry>,
}

impl CommentThread {
    /// Assemble a thread.
    pub fn new(post: Post, comments: Vec<Entry>) -> Self {
        Self { post, comments }
    }

    /// Shape the two-element comment envelope `[post listing, comment listing]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope does not hold a post and a comment listing.
    pub fn from_value(value: JsonValue) -> Result<Self, JsonError> {
        let JsonValue::Array(parts) = value else {
            return Err(JsonError::new("Expected a two-element comment envelope"));
        };
        let [post_part, comment_part]: [JsonValue; 2] = parts
            .try_into()
            .map_err(|_| JsonError::new("Expected a two-element comment envelope"))?;

        let post = Listing::from_value(post_part)?
            .into_entries()
            .into_iter()
            .find_map(|entry| match entry {
                Entry::Post(post) => Some(post),
                _ => None,
            })
            .ok_or_else(|| JsonError::new("Comment envelope has no post"))?;
        let comments = Listing::from_value(comment_part)?.into_entries();

        Ok(Self { post, comments })
    }

    /// Every truncated-branch placeholder in the tree, depth first.
    pub fn more_placeholders(&self) -> Vec<&MoreChildren> {
        fn walk<'a>(entries: &'a [Entry], found: &mut Vec<&'a MoreChildren>) {
            for entry in entries {
                match entry {
                    Entry::More(more) => found.push(more),
                    Entry::Comment(comment) => walk(&comment.replies, found),
                    Entry::Post(_) => {}
                }
            }
        }
        let mut found = Vec::new();
        walk(&self.comments, &mut found);
        found
    }

    /// Replace the placeholder `more_id` with expanded entries.
    ///
    /// Each entry is attached under the comment whose fullname matches its
    /// `parent_id`, falling back to top level when no such comment is present.
    /// Entries are attached in the order given, so a parent must precede its
    /// children (which is how the upstream returns them).
    pub fn merge_expanded(&mut self, more_id: &str, expanded: Vec<Entry>) {
        remove_placeholder(&mut self.comments, more_id);

        for entry in expanded {
            let parent = entry.parent_id().map(str::to_string);
            match parent {
                Some(parent) => {
                    if let Some(entry) = attach(&mut self.comments, &parent, entry) {
                        self.comments.push(entry);
                    }
                }
                None => self.comments.push(entry),
            }
        }
    }
}

fn remove_placeholder(entries: &mut Vec<Entry>, more_id: &str) -> bool {
    if let Some(index) = entries
        .iter()
        .position(|entry| matches!(entry, Entry::More(more) if more.id == more_id))
    {
        entries.remove(index);
        return true;
    }
    entries.iter_mut().any(|entry| match entry {
        Entry::Comment(comment) => remove_placeholder(&mut comment.replies, more_id),
        _ => false,
    })
}

/// Attach `entry` under the comment named `parent`; returns it back when absent.
fn attach(entries: &mut [Entry], parent: &str, entry: Entry) -> Option<Entry> {
    let mut entry = entry;
    for candidate in entries.iter_mut() {
        if let Entry::Comment(comment) = candidate {
            if comment.name == parent {
                comment.replies.push(entry);
                return None;
            }
            entry = attach(&mut comment.replies, parent, entry)?;
        }
    }
    Some(entry)
}

/// Shaped metadata of a named category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct ResourceMetadata {
    /// Canonical display name
    #[serde(rename = "display_name")]
    name: String,
    /// Title
    #[serde(default)]
    title: String,
    /// Public description
    #[serde(default, rename = "public_description")]
    description: String,
    /// Subscriber count, absent for some private resources
    #[serde(default)]
    subscribers: Option<u64>,
    /// Creation time in seconds since the epoch
    #[serde(default)]
    created_utc: f64,
    /// Marked adult
    #[serde(default, rename = "over18")]
    over_18: bool,
}

impl ResourceMetadata {
    /// Shape an about envelope (`{kind: "t5", data: {...}}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope has no usable data.
    pub fn from_value(value: JsonValue) -> Result<Self, JsonError> {
        let raw: RawThing = serde_json::from_value(value)
            .map_err(|e| JsonError::new(format!("Malformed metadata envelope: {}", e)))?;
        if raw.kind != "t5" {
            return Err(JsonError::new(format!(
                "Expected a t5 metadata envelope, got {}",
                raw.kind
            )));
        }
        parse(&raw.kind, raw.data)
    }
}
