//! Support for creating Atom feeds from the posts [`Collection`].

use crate::config::Author;
use crate::filters;
use crate::item::{Collection, ContentItem};
use atom_syndication::{Content, Entry, Error as AtomError, Feed, Link, Person, Text};
use chrono::{DateTime, FixedOffset, Utc};
use std::convert::TryFrom;
use std::fmt;
use std::io::Write;
use url::Url;

/// Bundled configuration for creating a feed. The title, author, and base URL
/// double as site metadata for templates.
#[derive(Clone, Debug, PartialEq)]
pub struct FeedConfig {
    pub title: String,
    pub subtitle: Option<String>,

    /// The site's root URL. Item permalinks are resolved against it, and it
    /// serves as the feed's ID. It should end in a trailing slash.
    pub base_url: Url,

    pub author: Author,

    /// The feed's `xml:lang`, e.g. `en`.
    pub language: String,

    /// The maximum number of entries, newest first.
    pub limit: usize,

    /// The feed's own location relative to `base_url`, e.g. `feed.xml`.
    pub path: String,
}

/// Creates a feed from some configuration ([`FeedConfig`]) and the posts
/// [`Collection`] and writes the result to a [`std::io::Write`].
pub fn write_feed<W: Write>(config: &FeedConfig, posts: &Collection, w: W) -> Result<()> {
    feed(config, posts)?.write_to(w)?;
    Ok(())
}

/// Builds the feed document. Only the newest [`FeedConfig::limit`] posts are
/// included, and the feed's `updated` stamp is the newest post's date (or the
/// current time when there are no posts).
pub fn feed(config: &FeedConfig, posts: &Collection) -> Result<Feed> {
    let limit = i64::try_from(config.limit).unwrap_or(i64::MAX);
    let items = posts.head(limit);
    let updated: DateTime<Utc> = match posts.newest() {
        Some(item) => item.date,
        None => Utc::now(),
    };

    let mut feed = Feed::default();
    feed.set_title(config.title.clone());
    feed.set_id(config.base_url.to_string());
    feed.set_updated(DateTime::<FixedOffset>::from(updated));
    feed.set_subtitle(config.subtitle.clone().map(Text::from));
    feed.set_lang(Some(config.language.clone()));
    feed.set_authors(vec![person(&config.author)]);
    feed.set_links(vec![
        link(config.base_url.join(&config.path)?.to_string(), "self"),
        link(config.base_url.to_string(), "alternate"),
    ]);
    feed.set_entries(feed_entries(config, items)?);

    tracing::debug!(
        entries = feed.entries().len(),
        available = posts.items().len(),
        "built feed"
    );
    Ok(feed)
}

fn feed_entries(config: &FeedConfig, items: &[ContentItem]) -> Result<Vec<Entry>> {
    let mut entries: Vec<Entry> = Vec::with_capacity(items.len());

    for item in items {
        let url = config.base_url.join(&item.permalink())?.to_string();
        let date = DateTime::<FixedOffset>::from(item.date);

        let mut content = Content::default();
        content.set_content_type(Some(String::from("html")));
        content.set_value(Some(item.content.clone()));

        let mut entry = Entry::default();
        entry.set_id(url.clone());
        entry.set_title(item.title.clone());
        entry.set_updated(date);
        entry.set_published(Some(date));
        entry.set_links(vec![link(url, "alternate")]);
        entry.set_summary(Some(Text::from(filters::excerpt(&item.content))));
        entry.set_content(Some(content));
        entries.push(entry);
    }
    Ok(entries)
}

fn link(href: String, rel: &str) -> Link {
    let mut link = Link::default();
    link.set_href(href);
    link.set_rel(rel.to_owned());
    link
}

fn person(author: &Author) -> Person {
    let mut person = Person::default();
    person.set_name(author.name.clone());
    person.set_email(author.email.clone());
    person
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed. Variants inlude I/O, Atom, and
/// URL issues.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is a generic I/O error.
    Io(std::io::Error),

    /// Returned when there is an Atom-related error.
    Atom(AtomError),

    /// Returned when an item permalink or the feed path can't be joined onto
    /// the base URL.
    UrlParse(url::ParseError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(f),
            Error::Atom(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Atom(err) => Some(err),
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator in fallible feed operations.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<AtomError> for Error {
    /// Converts [`AtomError`]s into [`Error`]. This allows us to use the `?`
    /// operator in fallible feed operations.
    fn from(err: AtomError) -> Error {
        Error::Atom(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts [`url::ParseError`]s into [`Error`]. This allows us to use the
    /// `?` operator when joining URLs.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::item::parse_items;

    fn config(limit: usize) -> FeedConfig {
        FeedConfig {
            title: String::from("My Blog"),
            subtitle: Some(String::from("Notes and things")),
            base_url: Url::parse("https://example.org/blog/").unwrap(),
            author: Author {
                name: String::from("Ada"),
                email: Some(String::from("ada@example.org")),
            },
            language: String::from("en"),
            limit,
            path: String::from("feed.xml"),
        }
    }

    fn posts(count: usize) -> Collection {
        let yaml: String = (1..=count)
            .map(|day| {
                format!(
                    "- title: Post {day}\n  date: 2026-01-{day:02}\n  content: <p>Body <b>{day}</b></p>\n",
                    day = day
                )
            })
            .collect();
        Collection::posts(parse_items(&yaml).unwrap())
    }

    #[test]
    fn test_feed_metadata() -> Result<()> {
        let feed = feed(&config(10), &posts(3))?;
        assert_eq!("My Blog", feed.title.value);
        assert_eq!("https://example.org/blog/", feed.id);
        assert_eq!(Some(String::from("en")), feed.lang);
        assert_eq!(
            Some(String::from("Notes and things")),
            feed.subtitle.as_ref().map(|t| t.value.clone())
        );
        assert_eq!("Ada", feed.authors[0].name);
        assert_eq!(
            vec!["https://example.org/blog/feed.xml", "https://example.org/blog/"],
            feed.links.iter().map(|l| l.href.as_str()).collect::<Vec<&str>>()
        );
        assert_eq!(
            DateTime::<FixedOffset>::from(posts(3).items()[0].date),
            feed.updated
        );
        Ok(())
    }

    #[test]
    fn test_feed_entries_newest_first() -> Result<()> {
        let feed = feed(&config(10), &posts(3))?;
        let titles: Vec<&str> = feed.entries.iter().map(|e| e.title.value.as_str()).collect();
        assert_eq!(vec!["Post 3", "Post 2", "Post 1"], titles);

        let newest = &feed.entries[0];
        assert_eq!("https://example.org/blog/posts/post-3/", newest.id);
        assert_eq!(
            Some(String::from("Body 3")),
            newest.summary.as_ref().map(|t| t.value.clone())
        );
        assert_eq!(
            Some(String::from("<p>Body <b>3</b></p>")),
            newest.content.as_ref().and_then(|c| c.value.clone())
        );
        Ok(())
    }

    #[test]
    fn test_feed_limit() -> Result<()> {
        let feed = feed(&config(10), &posts(12))?;
        assert_eq!(10, feed.entries.len());
        assert_eq!("Post 12", feed.entries[0].title.value);
        assert_eq!("Post 3", feed.entries[9].title.value);

        assert!(super::feed(&config(0), &posts(2))?.entries.is_empty());
        Ok(())
    }

    #[test]
    fn test_write_feed() -> Result<()> {
        let mut out: Vec<u8> = Vec::new();
        write_feed(&config(10), &posts(2), &mut out)?;
        let xml = String::from_utf8(out).unwrap();
        assert!(xml.contains("http://www.w3.org/2005/Atom"));
        assert!(xml.contains("Post 2"));
        assert!(xml.contains("https://example.org/blog/posts/post-1/"));
        Ok(())
    }

    #[test]
    fn test_empty_feed() -> Result<()> {
        let feed = feed(&config(10), &Collection::posts(Vec::new()))?;
        assert!(feed.entries.is_empty());
        Ok(())
    }
}
