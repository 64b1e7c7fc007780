//! Defines [`ContentItem`], the record the surrounding site pipeline hands us
//! for each source document, and [`Collection`], the date-ordered group of
//! items that index pages and the feed are built from. Items arrive as a YAML
//! (or JSON) sequence; see [`parse_items`] for the expected shape.

use crate::filters::{self, Dated};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// The name of the collection exposed to templates as `collections.posts`.
pub const POSTS: &str = "posts";

/// A single source document: a blog post with a publication date and body
/// markup. Items are never modified once loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct ContentItem {
    /// The item's title.
    pub title: String,

    /// The publication instant, normalized to UTC.
    pub date: DateTime<Utc>,

    /// The rendered body markup. May contain HTML tags.
    pub content: String,

    /// The site-relative URL of the item's page, if the pipeline supplied
    /// one. See [`ContentItem::permalink`].
    pub url: Option<String>,
}

impl ContentItem {
    /// Returns the item's site-relative URL. When the pipeline didn't supply
    /// one, the URL is derived from the title as `posts/{slug}/`.
    pub fn permalink(&self) -> String {
        match &self.url {
            Some(url) => url.trim_start_matches('/').to_owned(),
            None => format!("{}/{}/", POSTS, slug::slugify(&self.title)),
        }
    }
}

impl Dated for ContentItem {
    fn date(&self) -> &DateTime<Utc> {
        &self.date
    }
}

/// The on-disk shape of an item. Dates stay as text here so a bad one can be
/// reported against the item it belongs to.
#[derive(Deserialize)]
struct RawItem {
    title: String,
    date: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    url: Option<String>,
}

impl RawItem {
    fn into_item(self) -> Result<ContentItem> {
        let date = filters::parse_instant(&self.date).map_err(|err| Error::InvalidDate {
            title: self.title.clone(),
            err,
        })?;
        Ok(ContentItem {
            title: self.title,
            date,
            content: self.content,
            url: self.url,
        })
    }
}

/// Parses a YAML or JSON sequence of items. Each element needs a `title` and
/// a `date`; `content` and `url` are optional:
///
/// ```yaml
/// - title: Hello, world!
///   date: 2026-01-15
///   content: <p>Hello</p>
///   url: /posts/hello/
/// ```
pub fn parse_items(input: &str) -> Result<Vec<ContentItem>> {
    let raw: Vec<RawItem> = serde_yaml::from_str(input)?;
    raw.into_iter()
        .enumerate()
        .map(|(i, raw)| {
            raw.into_item()
                .map_err(|e| Error::Annotated(format!("item {}", i), Box::new(e)))
        })
        .collect()
}

/// Reads and parses the item list at `path`. See [`parse_items`].
pub fn load_items(path: &Path) -> Result<Vec<ContentItem>> {
    use std::io::Read;
    let mut contents = String::new();
    std::fs::File::open(path)?.read_to_string(&mut contents)?;
    match parse_items(&contents) {
        Ok(items) => {
            tracing::info!(path = %path.display(), items = items.len(), "loaded content items");
            Ok(items)
        }
        Err(e) => Err(Error::Annotated(
            format!("loading items from `{}`", path.display()),
            Box::new(e),
        )),
    }
}

/// A named, date-ordered group of [`ContentItem`]s, newest first.
#[derive(Clone, Debug)]
pub struct Collection {
    name: String,
    items: Vec<ContentItem>,
}

impl Collection {
    /// Builds the `posts` collection: every supplied item, sorted by
    /// [`filters::sort_by_date_descending`].
    pub fn posts(items: Vec<ContentItem>) -> Collection {
        let items = filters::sort_by_date_descending(items);
        tracing::debug!(collection = POSTS, items = items.len(), "built collection");
        Collection {
            name: POSTS.to_owned(),
            items,
        }
    }

    /// The collection's name, as exposed to templates.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All items, newest first.
    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    /// The `n` newest items (or the `|n|` oldest when `n` is negative). See
    /// [`filters::head`].
    pub fn head(&self, n: i64) -> &[ContentItem] {
        filters::head(&self.items, n)
    }

    /// The most recent item, if any.
    pub fn newest(&self) -> Option<&ContentItem> {
        self.items.first()
    }
}

/// Represents the result of an item-loading operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading [`ContentItem`]s.
#[derive(Debug)]
pub enum Error {
    /// Returned when an item's `date` field can't be parsed.
    InvalidDate { title: String, err: filters::Error },

    /// Returned when the item list isn't a valid YAML sequence of items.
    DeserializeYaml(serde_yaml::Error),

    /// Returned for I/O errors reading the item list.
    Io(std::io::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidDate { title, err } => {
                write!(f, "`{}`: field `date`: {}", title, err)
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidDate { title: _, err } => Some(err),
            Error::DeserializeYaml(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    const ITEMS: &str = r#"
- title: First
  date: 2026-01-01
  content: <p>one</p>
- title: Third
  date: "2026-01-03T00:00:00Z"
  content: <p>three</p>
  url: /notes/third/
- title: Second
  date: 2026-01-02T00:00:00+00:00
"#;

    #[test]
    fn test_parse_items() -> Result<()> {
        let items = parse_items(ITEMS)?;
        assert_eq!(3, items.len());
        assert_eq!(
            ContentItem {
                title: String::from("First"),
                date: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
                content: String::from("<p>one</p>"),
                url: None,
            },
            items[0]
        );
        assert_eq!("", items[2].content);
        Ok(())
    }

    #[test]
    fn test_parse_items_json() -> Result<()> {
        let items = parse_items(r#"[{"title": "J", "date": "2026-05-06", "content": "x"}]"#)?;
        assert_eq!("J", items[0].title);
        Ok(())
    }

    #[test]
    fn test_parse_items_invalid_date_names_item_and_field() {
        let err = parse_items("- title: Ok\n  date: 2026-01-01\n- title: Broken\n  date: someday\n")
            .unwrap_err();
        assert_eq!(
            "item 1: `Broken`: field `date`: invalid date `someday`",
            err.to_string()
        );
    }

    #[test]
    fn test_parse_items_missing_title() {
        assert!(matches!(
            parse_items("- date: 2026-01-01\n"),
            Err(Error::DeserializeYaml(_))
        ));
    }

    #[test]
    fn test_posts_collection_order() -> Result<()> {
        let posts = Collection::posts(parse_items(ITEMS)?);
        let titles: Vec<&str> = posts.items().iter().map(|i| i.title.as_str()).collect();
        assert_eq!(vec!["Third", "Second", "First"], titles);
        assert_eq!("posts", posts.name());
        assert_eq!(Some("Third"), posts.newest().map(|i| i.title.as_str()));
        assert_eq!(1, posts.head(1).len());
        assert_eq!("First", posts.head(-1)[0].title);
        Ok(())
    }

    #[test]
    fn test_permalink() -> Result<()> {
        let items = parse_items(ITEMS)?;
        assert_eq!("posts/first/", items[0].permalink());
        assert_eq!("notes/third/", items[1].permalink());
        Ok(())
    }

    #[test]
    fn test_load_items_missing_file() {
        let err = load_items(Path::new("./does-not-exist.yaml")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
