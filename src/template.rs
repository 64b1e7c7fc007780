//! Binds the formatting filters to the [`gtmpl`] template engine and converts
//! content items into template values.
//!
//! The filters are registered under the names site templates already use:
//! `readableDate`, `excerpt`, `date`, and `head`. Go templates pass a piped
//! value as the *last* argument, so the value being formatted always comes
//! last:
//!
//! ```text
//! {{ range .collections.posts | head 3 }}
//!   <h2>{{ .title }}</h2>
//!   <time>{{ .date | readableDate }}</time> ({{ .date | date "MMM DD" }})
//!   <p>{{ .content | excerpt }}</p>
//! {{ end }}
//! ```

use crate::config::Author;
use crate::feed::FeedConfig;
use crate::filters::{self, DateFormat};
use crate::item::{Collection, ContentItem};
use gtmpl::{Context, Template};
use gtmpl_value::{FuncError, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Creates an empty [`Template`] with the builtin functions plus the
/// formatting filters registered.
pub fn new_template() -> Template {
    let mut template = Template::default();
    register_filters(&mut template);
    template
}

/// Registers the formatting filters on an existing [`Template`].
pub fn register_filters(template: &mut Template) {
    template.add_func("readableDate", readable_date);
    template.add_func("excerpt", excerpt);
    template.add_func("date", date);
    template.add_func("head", head);
}

/// Parses a template file, with the filters registered.
pub fn parse_template(path: &Path) -> Result<Template> {
    use std::io::Read;
    let mut contents = String::new();
    std::fs::File::open(path)
        .map_err(|err| Error::OpenTemplateFile {
            path: path.to_owned(),
            err,
        })?
        .read_to_string(&mut contents)?;
    parse_template_str(&contents)
}

/// Parses template text, with the filters registered.
pub fn parse_template_str(text: &str) -> Result<Template> {
    let mut template = new_template();
    template
        .parse(text)
        .map_err(|e| Error::ParseTemplate(e.to_string()))?;
    Ok(template)
}

/// Renders `template` against `value`.
pub fn render(template: &Template, value: Value) -> Result<String> {
    template
        .render(&Context::from(value))
        .map_err(|e| Error::Render(e.to_string()))
}

/// Builds the root template value: `site` metadata from the feed
/// configuration and `collections.posts`.
pub fn site_context(site: &FeedConfig, posts: &Collection) -> Value {
    let mut collections: HashMap<String, Value> = HashMap::new();
    collections.insert(
        posts.name().to_owned(),
        Value::Array(posts.items().iter().map(Value::from).collect()),
    );

    let mut root: HashMap<String, Value> = HashMap::new();
    root.insert("site".to_owned(), site_value(site));
    root.insert("collections".to_owned(), Value::Object(collections));
    Value::Object(root)
}

fn site_value(site: &FeedConfig) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("title".to_owned(), Value::String(site.title.clone()));
    m.insert(
        "subtitle".to_owned(),
        match &site.subtitle {
            Some(subtitle) => Value::String(subtitle.clone()),
            None => Value::Nil,
        },
    );
    m.insert("url".to_owned(), Value::String(site.base_url.to_string()));
    m.insert("language".to_owned(), Value::String(site.language.clone()));
    m.insert("author".to_owned(), Value::from(&site.author));
    Value::Object(m)
}

impl From<&Author> for Value {
    /// Converts an [`Author`] into a [`Value`] with `name` and `email` fields.
    fn from(author: &Author) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("name".to_owned(), Value::String(author.name.clone()));
        m.insert(
            "email".to_owned(),
            match &author.email {
                Some(email) => Value::String(email.clone()),
                None => Value::Nil,
            },
        );
        Value::Object(m)
    }
}

impl From<&ContentItem> for Value {
    /// Converts a [`ContentItem`] into a [`Value`] for templating. The date is
    /// passed as an ISO-8601 string so the date filters can take it as-is.
    fn from(item: &ContentItem) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("title".to_owned(), Value::String(item.title.clone()));
        m.insert(
            "date".to_owned(),
            Value::String(filters::format_date(&item.date, DateFormat::Iso)),
        );
        m.insert("content".to_owned(), Value::String(item.content.clone()));
        m.insert(
            "url".to_owned(),
            Value::String(format!("/{}", item.permalink())),
        );
        Value::Object(m)
    }
}

fn string_arg<'a>(name: &str, value: &'a Value) -> std::result::Result<&'a str, FuncError> {
    match value {
        Value::String(s) => Ok(s.as_str()),
        other => Err(FuncError::Generic(format!(
            "{}: expected a string, got `{}`",
            name, other
        ))),
    }
}

fn instant_arg(
    name: &str,
    value: &Value,
) -> std::result::Result<chrono::DateTime<chrono::Utc>, FuncError> {
    filters::parse_instant(string_arg(name, value)?)
        .map_err(|e| FuncError::Generic(format!("{}: {}", name, e)))
}

fn arity(name: &str, args: &[Value], min: usize, max: usize) -> std::result::Result<(), FuncError> {
    if args.len() < min || args.len() > max {
        return Err(FuncError::Generic(format!(
            "{} takes {} argument(s), got {}",
            name,
            if min == max {
                min.to_string()
            } else {
                format!("{} to {}", min, max)
            },
            args.len()
        )));
    }
    Ok(())
}

/// `readableDate INSTANT`
fn readable_date(args: &[Value]) -> std::result::Result<Value, FuncError> {
    arity("readableDate", args, 1, 1)?;
    let instant = instant_arg("readableDate", &args[0])?;
    Ok(Value::String(filters::readable_date(&instant)))
}

/// `excerpt CONTENT`
fn excerpt(args: &[Value]) -> std::result::Result<Value, FuncError> {
    arity("excerpt", args, 1, 1)?;
    Ok(Value::String(filters::excerpt(string_arg(
        "excerpt", &args[0],
    )?)))
}

/// `date [FORMAT] INSTANT`
fn date(args: &[Value]) -> std::result::Result<Value, FuncError> {
    arity("date", args, 1, 2)?;
    let (selector, instant) = match args {
        [instant] => (None, instant),
        [selector, instant] => (Some(string_arg("date", selector)?), instant),
        _ => unreachable!(),
    };
    let instant = instant_arg("date", instant)?;
    Ok(Value::String(filters::format_date(
        &instant,
        DateFormat::from_selector(selector),
    )))
}

/// `head N SEQUENCE`. Anything other than an array yields an empty array.
fn head(args: &[Value]) -> std::result::Result<Value, FuncError> {
    arity("head", args, 2, 2)?;
    let n = match &args[0] {
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
    .ok_or_else(|| FuncError::Generic(format!("head: expected an integer, got `{}`", args[0])))?;
    match &args[1] {
        Value::Array(items) => Ok(Value::Array(filters::head(items, n).to_vec())),
        _ => Ok(Value::Array(Vec::new())),
    }
}

/// The result of a fallible template operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading, parsing, or rendering a template.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template text.
    ParseTemplate(String),

    /// Returned for errors while rendering, including filter failures.
    Render(String),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate(err) => write!(f, "Parsing template: {}", err),
            Error::Render(err) => write!(f, "Rendering template: {}", err),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::Render(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
