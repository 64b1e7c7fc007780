//! The formatting filters applied to content items: date rendering
//! ([`readable_date`], [`format_date`]), excerpting ([`excerpt`]), slicing
//! ([`head`]), and the newest-first collection order
//! ([`sort_by_date_descending`]). Everything here is pure; the template
//! bindings in [`crate::template`] and the feed in [`crate::feed`] are thin
//! adapters over these functions.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use regex::Regex;
use std::convert::TryFrom;
use std::fmt;
use std::sync::OnceLock;

/// The number of characters of stripped text kept by [`excerpt`].
pub const EXCERPT_LENGTH: usize = 200;

/// Appended by [`excerpt`] when the stripped text was cut short.
pub const ELLIPSIS: &str = "...";

/// Selects the rendering rule for [`format_date`]. The set is closed: any
/// selector other than `"YYYY"` or `"MMM DD"` means [`DateFormat::Iso`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateFormat {
    /// `"YYYY"`: the four-digit year, e.g. `2026`.
    Year,

    /// `"MMM DD"`: abbreviated month and zero-padded day, e.g. `Jan 05`.
    MonthDay,

    /// Anything else: the full UTC instant, e.g. `2026-01-15T00:00:00.000Z`.
    Iso,
}

impl DateFormat {
    /// Maps a template-supplied selector onto a [`DateFormat`]. An absent
    /// selector and any unrecognized one both fall through to
    /// [`DateFormat::Iso`].
    pub fn from_selector(selector: Option<&str>) -> DateFormat {
        match selector {
            Some("YYYY") => DateFormat::Year,
            Some("MMM DD") => DateFormat::MonthDay,
            None => DateFormat::Iso,
            Some(other) => {
                tracing::debug!(selector = other, "unrecognized date format, using ISO-8601");
                DateFormat::Iso
            }
        }
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        DateFormat::Iso
    }
}

impl From<&str> for DateFormat {
    fn from(selector: &str) -> DateFormat {
        DateFormat::from_selector(Some(selector))
    }
}

/// Implemented by anything that can be placed in a date-ordered collection.
pub trait Dated {
    fn date(&self) -> &DateTime<Utc>;
}

impl Dated for DateTime<Utc> {
    fn date(&self) -> &DateTime<Utc> {
        self
    }
}

/// Parses an instant from text. Accepts RFC 3339 date-times with any offset
/// (normalized to UTC), offset-less date-times (taken as UTC), and bare
/// `YYYY-MM-DD` dates (UTC midnight).
pub fn parse_instant(text: &str) -> Result<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Ok(instant.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(naive) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(midnight) = naive.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight));
        }
    }
    Err(Error::InvalidDate(text.to_owned()))
}

/// Renders an instant as a long-form US English date, e.g. `January 1, 2026`.
pub fn readable_date(instant: &DateTime<Utc>) -> String {
    instant.format("%B %-d, %Y").to_string()
}

/// Renders an instant according to `format`. See [`DateFormat`] for the
/// three rules.
pub fn format_date(instant: &DateTime<Utc>, format: DateFormat) -> String {
    match format {
        DateFormat::Year => instant.format("%Y").to_string(),
        DateFormat::MonthDay => instant.format("%b %d").to_string(),
        DateFormat::Iso => instant.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"(?i)(<([^>]+)>)").expect("tag pattern compiles"))
}

/// Removes everything that looks like a tag from `content` and keeps the
/// first [`EXCERPT_LENGTH`] characters, appending [`ELLIPSIS`] if anything
/// was cut. Tag removal is a plain pattern match: a `<` with no closing `>`
/// survives, and nested or malformed markup is not repaired.
pub fn excerpt(content: &str) -> String {
    let stripped = tag_pattern().replace_all(content, "");
    let mut excerpt: String = stripped.chars().take(EXCERPT_LENGTH).collect();
    if stripped.chars().count() > EXCERPT_LENGTH {
        excerpt.push_str(ELLIPSIS);
    }
    excerpt
}

/// Returns the first `n` items, or the last `|n|` items when `n` is negative.
/// Out-of-range counts are clamped to the length of `items`.
pub fn head<T>(items: &[T], n: i64) -> &[T] {
    let len = items.len();
    if n < 0 {
        let count = usize::try_from(n.unsigned_abs()).unwrap_or(usize::MAX).min(len);
        &items[len - count..]
    } else {
        let count = usize::try_from(n).unwrap_or(usize::MAX).min(len);
        &items[..count]
    }
}

/// Orders `items` newest first. Items sharing an instant keep their relative
/// input order.
pub fn sort_by_date_descending<T: Dated>(mut items: Vec<T>) -> Vec<T> {
    items.sort_by(|a, b| b.date().cmp(a.date()));
    items
}

/// The result of a fallible formatting operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a formatting error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Returned when a value can't be interpreted as an instant. Holds the
    /// offending text.
    InvalidDate(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidDate(text) => write!(f, "invalid date `{}`", text),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod test {
    use super::*;

    fn instant(text: &str) -> DateTime<Utc> {
        parse_instant(text).unwrap()
    }

    #[test]
    fn test_parse_instant_formats() -> Result<()> {
        let wanted = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap();
        assert_eq!(wanted, parse_instant("2026-01-15")?);
        assert_eq!(wanted, parse_instant("2026-01-15T00:00:00Z")?);
        assert_eq!(wanted, parse_instant("2026-01-15T00:00:00")?);
        assert_eq!(wanted, parse_instant("2026-01-15T02:00:00+02:00")?);
        assert_eq!(wanted, parse_instant("  2026-01-15  ")?);
        Ok(())
    }

    #[test]
    fn test_parse_instant_invalid() {
        assert_eq!(
            Err(Error::InvalidDate(String::from("not a date"))),
            parse_instant("not a date")
        );
        assert!(parse_instant("2026-02-30").is_err());
        assert!(parse_instant("").is_err());
    }

    #[test]
    fn test_readable_date() {
        assert_eq!("January 1, 2026", readable_date(&instant("2026-01-01")));
        assert_eq!("December 31, 1999", readable_date(&instant("1999-12-31T23:59:59Z")));
    }

    #[test]
    fn test_format_date_month_day() {
        let date = instant("2026-01-15T00:00:00Z");
        assert_eq!("Jan 15", format_date(&date, DateFormat::from("MMM DD")));
        assert_eq!("Mar 05", format_date(&instant("2026-03-05"), DateFormat::MonthDay));
    }

    #[test]
    fn test_format_date_year_matches_readable_date() {
        for text in &["2026-01-01", "1999-12-31T23:59:59Z", "2004-02-29T12:00:00-05:00"] {
            let date = instant(text);
            let year = format_date(&date, DateFormat::Year);
            assert_eq!(4, year.len());
            assert!(readable_date(&date).ends_with(&year));
        }
    }

    #[test]
    fn test_format_date_default_is_iso() {
        let date = instant("2026-01-15T00:00:00Z");
        assert_eq!("2026-01-15T00:00:00.000Z", format_date(&date, DateFormat::default()));
        assert_eq!("2026-01-15T00:00:00.000Z", format_date(&date, DateFormat::from("dd/mm")));
        assert_eq!(DateFormat::Iso, DateFormat::from_selector(None));
    }

    #[test]
    fn test_excerpt_strips_tags() {
        assert_eq!(
            "Hello World, this is a test.",
            excerpt("<p>Hello <b>World</b>, this is a test.</p>")
        );
        assert_eq!("shout", excerpt("<DIV CLASS=\"x\">shout</DIV>"));
    }

    #[test]
    fn test_excerpt_keeps_unclosed_angle_bracket() {
        assert_eq!("1 < 2", excerpt("1 < 2"));
    }

    #[test]
    fn test_excerpt_truncates() {
        let long = format!("<p>{}</p>", "a".repeat(250));
        let result = excerpt(&long);
        assert_eq!(format!("{}...", "a".repeat(200)), result);
        assert_eq!(203, result.chars().count());
    }

    #[test]
    fn test_excerpt_boundary() {
        let exact = "b".repeat(EXCERPT_LENGTH);
        assert_eq!(exact, excerpt(&format!("<em>{}</em>", exact)));

        let over = "c".repeat(EXCERPT_LENGTH + 1);
        assert!(excerpt(&over).ends_with(ELLIPSIS));
    }

    #[test]
    fn test_excerpt_counts_characters() {
        let text = "é".repeat(201);
        let result = excerpt(&text);
        assert_eq!(203, result.chars().count());
        assert!(result.starts_with(&"é".repeat(200)));
    }

    #[test]
    fn test_excerpt_never_exceeds_limit() {
        for len in 0..450 {
            let content = format!("<section><h1>{}</h1></section>", "x".repeat(len));
            let result = excerpt(&content);
            assert!(result.chars().count() <= EXCERPT_LENGTH + ELLIPSIS.len());
            assert!(!result.contains('<') && !result.contains('>'));
        }
    }

    #[test]
    fn test_head() {
        let items = [1, 2, 3, 4, 5];
        assert_eq!(&[4, 5], head(&items, -2));
        assert_eq!(&[1, 2], head(&items, 2));
        assert!(head(&[] as &[i32], 3).is_empty());
        assert!(head(&items, 0).is_empty());
        assert_eq!(&items, head(&items, 10));
        assert_eq!(&items, head(&items, -10));
        assert_eq!(&items, head(&items, i64::MIN));
        assert_eq!(&items, head(&items, i64::MAX));
    }

    #[test]
    fn test_head_lengths() {
        let items: Vec<i64> = (0..7).collect();
        for n in -10i64..=10 {
            let result = head(&items, n);
            let wanted_len = (n.unsigned_abs() as usize).min(items.len());
            assert_eq!(wanted_len, result.len());
            if n < 0 {
                assert_eq!(&items[items.len() - wanted_len..], result);
            } else {
                assert_eq!(&items[..wanted_len], result);
            }
        }
        assert_eq!((0..7).collect::<Vec<i64>>(), items);
    }

    #[derive(Clone, Debug, PartialEq)]
    struct Item {
        name: &'static str,
        date: DateTime<Utc>,
    }

    impl Dated for Item {
        fn date(&self) -> &DateTime<Utc> {
            &self.date
        }
    }

    fn item(name: &'static str, date: &str) -> Item {
        Item {
            name,
            date: instant(date),
        }
    }

    fn names(items: &[Item]) -> Vec<&'static str> {
        items.iter().map(|i| i.name).collect()
    }

    #[test]
    fn test_sort_by_date_descending() {
        let sorted = sort_by_date_descending(vec![
            item("third", "2026-01-03"),
            item("first", "2026-01-01"),
            item("second", "2026-01-02"),
        ]);
        assert_eq!(vec!["third", "second", "first"], names(&sorted));
    }

    #[test]
    fn test_sort_is_stable_and_idempotent() {
        let sorted = sort_by_date_descending(vec![
            item("a", "2026-01-01"),
            item("b", "2026-01-02"),
            item("c", "2026-01-01"),
            item("d", "2026-01-02"),
            item("e", "2026-01-01T00:00:00+00:00"),
        ]);
        assert_eq!(vec!["b", "d", "a", "c", "e"], names(&sorted));
        assert_eq!(sorted.clone(), sort_by_date_descending(sorted));
    }
}
