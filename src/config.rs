//! Loads the project configuration from a `gazette.yaml` file. The file is
//! found by searching upward from a starting directory, and every relative
//! path in it is resolved against the directory that holds it.

use crate::feed::FeedConfig;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file.
pub const PROJECT_FILE: &str = "gazette.yaml";

/// The feed's author.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Author {
    pub name: String,

    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Deserialize)]
struct FeedLimit(usize);
impl Default for FeedLimit {
    fn default() -> Self {
        FeedLimit(10)
    }
}

fn default_language() -> String {
    String::from("en")
}

fn default_feed_path() -> String {
    String::from("feed.xml")
}

#[derive(Deserialize)]
struct Feed {
    title: String,

    #[serde(default)]
    subtitle: Option<String>,

    base_url: Url,

    author: Author,

    #[serde(default = "default_language")]
    language: String,

    #[serde(default)]
    limit: FeedLimit,

    #[serde(default = "default_feed_path")]
    path: String,
}

#[derive(Deserialize)]
struct Directories {
    #[serde(default = "Directories::default_input")]
    input: PathBuf,

    #[serde(default = "Directories::default_includes")]
    includes: PathBuf,

    #[serde(default = "Directories::default_output")]
    output: PathBuf,
}

impl Directories {
    fn default_input() -> PathBuf {
        PathBuf::from("src")
    }

    fn default_includes() -> PathBuf {
        PathBuf::from("_includes")
    }

    fn default_output() -> PathBuf {
        PathBuf::from("_site")
    }
}

impl Default for Directories {
    fn default() -> Self {
        Directories {
            input: Directories::default_input(),
            includes: Directories::default_includes(),
            output: Directories::default_output(),
        }
    }
}

#[derive(Deserialize)]
struct PageEntry {
    template: PathBuf,
    output: PathBuf,
}

#[derive(Deserialize)]
struct Project {
    #[serde(default)]
    dir: Directories,

    #[serde(default)]
    pages: Vec<PageEntry>,

    #[serde(default)]
    passthrough: Vec<PathBuf>,

    feed: Feed,
}

/// A page to render: a template from the includes directory and the file it
/// renders to.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    pub template: PathBuf,
    pub output: PathBuf,
}

/// The resolved project configuration. All paths are absolute or relative to
/// the working directory, never to the project file.
#[derive(Clone, Debug)]
pub struct Config {
    /// The directory holding the project file.
    pub root_directory: PathBuf,

    pub input_directory: PathBuf,
    pub includes_directory: PathBuf,
    pub output_directory: PathBuf,
    pub pages: Vec<Page>,

    /// Paths relative to `input_directory`, copied unchanged into
    /// `output_directory`.
    pub passthrough: Vec<PathBuf>,

    pub feed: FeedConfig,

    /// Where the Atom feed is written.
    pub feed_path: PathBuf,
}

impl Config {
    /// Searches `dir` and its ancestors for [`PROJECT_FILE`] and loads the
    /// first one found. `output_directory` overrides the configured output
    /// directory.
    pub fn from_directory(dir: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            match Config::from_project_file(&path, output_directory) {
                Ok(config) => Ok(config),
                Err(e) => Err(anyhow!("Loading configuration: {:?}", e)),
            }
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    /// Loads the project file at `path`.
    pub fn from_project_file(path: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("opening project file `{}`", path.display()))?;
        let project: Project = serde_yaml::from_reader(file)?;
        match path.parent() {
            None => Err(anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )),
            Some(project_root) => Ok(Config::resolve(project, project_root, output_directory)),
        }
    }

    /// Parses project YAML, resolving relative paths against `project_root`.
    pub fn from_yaml(
        input: &str,
        project_root: &Path,
        output_directory: Option<&Path>,
    ) -> Result<Config> {
        let project: Project = serde_yaml::from_str(input)?;
        Ok(Config::resolve(project, project_root, output_directory))
    }

    fn resolve(project: Project, project_root: &Path, output_directory: Option<&Path>) -> Config {
        let input_directory = project_root.join(&project.dir.input);
        let includes_directory = input_directory.join(&project.dir.includes);
        let output_directory = match output_directory {
            Some(dir) => dir.to_owned(),
            None => project_root.join(&project.dir.output),
        };
        Config {
            pages: project
                .pages
                .iter()
                .map(|page| Page {
                    template: includes_directory.join(&page.template),
                    output: output_directory.join(&page.output),
                })
                .collect(),
            passthrough: project.passthrough,
            feed_path: output_directory.join(&project.feed.path),
            feed: FeedConfig {
                title: project.feed.title,
                subtitle: project.feed.subtitle,
                base_url: project.feed.base_url,
                author: project.feed.author,
                language: project.feed.language,
                limit: project.feed.limit.0,
                path: project.feed.path,
            },
            root_directory: project_root.to_owned(),
            input_directory,
            includes_directory,
            output_directory,
        }
    }

    /// Resolves an item-list path. Relative paths are taken from the project
    /// root, like every other path in the project file.
    pub fn items_path(&self, path: &Path) -> PathBuf {
        self.root_directory.join(path)
    }
}
