use anyhow::{anyhow, Context, Result};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use gazette::build::build_site;
use gazette::config::Config;
use gazette::feed::write_feed;
use gazette::item::{load_items, Collection, ContentItem};
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let project_arg = Arg::with_name("project")
        .long("project")
        .short("p")
        .takes_value(true)
        .default_value(".")
        .help("Directory to search (upward) for gazette.yaml");
    let items_arg = Arg::with_name("items")
        .long("items")
        .short("i")
        .takes_value(true)
        .default_value("items.yaml")
        .help("YAML or JSON list of content items, relative to the directory holding gazette.yaml");

    let matches = App::new("gazette")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Formats content items into pages and an Atom feed")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("log-level")
                .long("log-level")
                .takes_value(true)
                .default_value("info")
                .help("Log filter used when RUST_LOG is unset"),
        )
        .subcommand(
            SubCommand::with_name("build")
                .about("Renders pages, writes the feed, and copies passthrough files")
                .arg(project_arg.clone())
                .arg(items_arg.clone())
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .takes_value(true)
                        .help("Overrides the configured output directory"),
                ),
        )
        .subcommand(
            SubCommand::with_name("feed")
                .about("Writes the Atom feed to stdout")
                .arg(project_arg)
                .arg(items_arg),
        )
        .get_matches();

    init_logging(matches.value_of("log-level").unwrap_or("info"))?;

    match matches.subcommand() {
        ("build", Some(matches)) => build(matches),
        ("feed", Some(matches)) => feed(matches),
        (name, _) => Err(anyhow!("unknown subcommand `{}`", name)),
    }
}

fn load(matches: &ArgMatches, output: Option<&Path>) -> Result<(Config, Vec<ContentItem>)> {
    let project = matches.value_of("project").unwrap_or(".");
    let project = std::fs::canonicalize(project)
        .with_context(|| format!("resolving project directory `{}`", project))?;
    let config = Config::from_directory(&project, output)?;
    let items_path = config.items_path(Path::new(matches.value_of("items").unwrap_or("items.yaml")));
    let items = load_items(&items_path)?;
    Ok((config, items))
}

fn build(matches: &ArgMatches) -> Result<()> {
    let output = matches.value_of("output").map(Path::new);
    let (config, items) = load(matches, output)?;
    build_site(&config, items)
        .with_context(|| format!("building site into `{}`", config.output_directory.display()))
}

fn feed(matches: &ArgMatches) -> Result<()> {
    let (config, items) = load(matches, None)?;
    let posts = Collection::posts(items);
    let stdout = std::io::stdout();
    write_feed(&config.feed, &posts, stdout.lock())?;
    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}
