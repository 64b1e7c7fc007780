//! Exports the [`build_site`] function which stitches together the high-level
//! steps of a build: ordering the content items into the posts collection
//! ([`crate::item`]), rendering the configured pages ([`crate::template`]),
//! writing the Atom feed ([`crate::feed`]), and copying passthrough assets
//! from the input directory to the output directory.

use crate::config::Config;
use crate::feed::{write_feed, Error as FeedError};
use crate::item::{Collection, ContentItem};
use crate::template::{self, Error as TemplateError};
use std::fmt;
use std::fs::File;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Builds the site from a [`Config`] and the content items supplied by the
/// pipeline. Templates are all parsed before anything is written, so a bad
/// template leaves the output directory untouched.
pub fn build_site(config: &Config, items: Vec<ContentItem>) -> Result<()> {
    let posts = Collection::posts(items);

    let pages = config
        .pages
        .iter()
        .map(|page| -> Result<_> { Ok((page, template::parse_template(&page.template)?)) })
        .collect::<Result<Vec<_>>>()?;

    std::fs::create_dir_all(&config.output_directory)?;

    // Passthrough copies may clean their destination directories, so they go
    // first; pages and the feed may live inside them.
    copy_passthrough(
        &config.input_directory,
        &config.output_directory,
        &config.passthrough,
    )?;

    let context = template::site_context(&config.feed, &posts);
    for (page, template) in &pages {
        let rendered = template::render(template, context.clone())?;
        create_parent(&page.output)?;
        std::fs::write(&page.output, rendered).map_err(|err| Error::Write {
            path: page.output.clone(),
            err,
        })?;
        tracing::info!(path = %page.output.display(), "rendered page");
    }

    create_parent(&config.feed_path)?;
    write_feed(&config.feed, &posts, File::create(&config.feed_path)?)?;
    tracing::info!(path = %config.feed_path.display(), "wrote feed");

    Ok(())
}

/// Copies each of `paths` (relative to `src`) to the same relative location
/// under `dst`. Directories are copied recursively. A stale copy at the
/// destination is removed first. Every entry is checked before anything is
/// touched: entries must be non-empty relative paths that stay below `src`
/// and `dst`.
pub fn copy_passthrough(src: &Path, dst: &Path, paths: &[PathBuf]) -> Result<()> {
    if let Some(bad) = paths.iter().find(|p| !is_contained(p)) {
        return Err(Error::InvalidPassthrough(bad.clone()));
    }

    for relative in paths {
        let from = src.join(relative);
        let to = dst.join(relative);
        let metadata = std::fs::metadata(&from).map_err(|err| Error::Passthrough {
            path: from.clone(),
            err,
        })?;

        if metadata.is_dir() {
            rmdir(&to)?;
            for result in WalkDir::new(&from) {
                let entry = result?;
                if entry.file_type().is_file() {
                    let suffix = entry.path().strip_prefix(&from).map_err(|_| {
                        Error::InvalidPassthrough(entry.path().to_owned())
                    })?;
                    let target = to.join(suffix);
                    copy_file(entry.path(), &target)?;
                }
            }
        } else {
            copy_file(&from, &to)?;
        }
        tracing::debug!(path = %relative.display(), "copied passthrough");
    }
    Ok(())
}

fn is_contained(path: &Path) -> bool {
    let mut normal = false;
    for component in path.components() {
        match component {
            Component::Normal(_) => normal = true,
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) | Component::ParentDir => return false,
        }
    }
    normal
}

fn copy_file(from: &Path, to: &Path) -> Result<()> {
    create_parent(to)?;
    std::fs::copy(from, to).map_err(|err| Error::Passthrough {
        path: from.to_owned(),
        err,
    })?;
    Ok(())
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during templating,
/// writing pages or the feed, copying passthrough assets, and other I/O.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors parsing or rendering templates.
    Template(TemplateError),

    /// Returned for errors writing the feed.
    Feed(FeedError),

    /// Returned for I/O problems writing a rendered page.
    Write { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems copying a passthrough asset.
    Passthrough { path: PathBuf, err: std::io::Error },

    /// Returned when a passthrough entry is empty, absolute, or climbs out of
    /// its directory with `..`.
    InvalidPassthrough(PathBuf),

    /// Returned for I/O problems while cleaning a stale passthrough copy.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for errors walking a passthrough directory.
    WalkDir(walkdir::Error),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::Feed(err) => write!(f, "Writing feed: {}", err),
            Error::Write { path, err } => {
                write!(f, "Writing page '{}': {}", path.display(), err)
            }
            Error::Passthrough { path, err } => {
                write!(f, "Copying '{}': {}", path.display(), err)
            }
            Error::InvalidPassthrough(path) => write!(
                f,
                "Passthrough entry '{}' must be a relative path inside the input directory",
                path.display()
            ),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::WalkDir(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(err) => Some(err),
            Error::Feed(err) => Some(err),
            Error::Write { path: _, err } => Some(err),
            Error::Passthrough { path: _, err } => Some(err),
            Error::InvalidPassthrough(_) => None,
            Error::Clean { path: _, err } => Some(err),
            Error::WalkDir(err) => Some(err),
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

impl From<TemplateError> for Error {
    /// Converts [`TemplateError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: TemplateError) -> Error {
        Error::Template(err)
    }
}

impl From<FeedError> for Error {
    /// Converts [`FeedError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: FeedError) -> Error {
        Error::Feed(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts [`walkdir::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator while walking directories.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}
