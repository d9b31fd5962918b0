mod config;
mod session;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use config::AppConfig;
use serde_json::json;
use sitepage_core::{locate, HttpChannel, Pipeline, PipelineConfig, SiteAddress};
use sitepage_model::ContentDocument;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use url::Url;

const DEFAULT_LIBRARY: &str = "Site Pages";

fn cli() -> Command {
    Command::new("sitepage")
        .version(sitepage_core::VERSION)
        .about("Resolve and update pages in a site's page libraries")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("site")
                .long("site")
                .global(true)
                .help("Site URL, e.g. https://contoso.sharepoint.com/sites/TeamX"),
        )
        .arg(
            Arg::new("cookies")
                .long("cookies")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Cookie export of a signed-in browser session"),
        )
        .arg(
            Arg::new("token-env")
                .long("token-env")
                .global(true)
                .help("Environment variable holding a bearer token"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print results as JSON"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("resolve")
                .about("Find the page a hint refers to")
                .arg(Arg::new("hint").required(true).help("Title, file name or partial name")),
        )
        .subcommand(
            Command::new("update")
                .about("Replace a page's content, then publish it")
                .arg(
                    Arg::new("target")
                        .required(true)
                        .help("Page URL, server-relative path, or a hint to resolve"),
                )
                .arg(
                    Arg::new("html")
                        .long("html")
                        .conflicts_with("content-file")
                        .help("HTML fragment placed in a one-column text canvas"),
                )
                .arg(
                    Arg::new("content-file")
                        .long("content-file")
                        .value_parser(value_parser!(PathBuf))
                        .help("File holding the raw canvas JSON"),
                )
                .arg(
                    Arg::new("no-publish")
                        .long("no-publish")
                        .action(ArgAction::SetTrue)
                        .help("Write without publishing"),
                )
                .arg(
                    Arg::new("verify")
                        .long("verify")
                        .action(ArgAction::SetTrue)
                        .help("Read the content back after writing"),
                ),
        )
        .subcommand(
            Command::new("probe")
                .about("Check which addressing scheme reaches a page")
                .arg(Arg::new("target").required(true).help("Page URL or server-relative path")),
        )
        .subcommand(
            Command::new("diagnose")
                .about("Show web context and library permissions")
                .arg(
                    Arg::new("library")
                        .long("library")
                        .default_value(DEFAULT_LIBRARY)
                        .help("Library title"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// What an `update` argument names
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    /// URL or server-relative path
    Address(String),
    /// Anything else goes through the resolver
    Hint(String),
}

impl Target {
    fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.contains("://") || trimmed.starts_with('/') {
            Self::Address(trimmed.to_string())
        } else {
            Self::Hint(trimmed.to_string())
        }
    }
}

fn smoke_html() -> String {
    format!(
        "<p>Smoke update {}</p>",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

fn content_from(args: &ArgMatches) -> Result<ContentDocument> {
    if let Some(path) = args.get_one::<PathBuf>("content-file") {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading content {}", path.display()))?;
        return Ok(ContentDocument::new(raw));
    }
    let html = args.get_one::<String>("html").cloned().unwrap_or_else(smoke_html);
    Ok(ContentDocument::text_canvas(&html))
}

fn load_config(matches: &ArgMatches) -> Result<AppConfig> {
    let config = AppConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    Ok(config
        .with_site_url(matches.get_one::<String>("site").cloned())
        .with_cookies_file(matches.get_one::<PathBuf>("cookies").cloned())
        .with_token_env(matches.get_one::<String>("token-env").cloned()))
}

fn connect(config: &AppConfig, site: Url, pipeline: PipelineConfig) -> Result<Pipeline> {
    let credentials = session::credentials(&config.credentials)?;
    let channel = HttpChannel::new(credentials, pipeline.request_timeout())
        .context("building HTTP client")?;
    tracing::info!("Connected to {}", site);
    Ok(Pipeline::new(Arc::new(channel), site, pipeline))
}

fn locate_page(raw: &str, site: &Url) -> Result<SiteAddress> {
    locate(raw, site).with_context(|| format!("locating {raw}"))
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn resolve(config: &AppConfig, args: &ArgMatches, json: bool) -> Result<()> {
    let hint = args.get_one::<String>("hint").map_or("", String::as_str);
    let pipeline = connect(config, config.site()?, config.pipeline.clone())?;
    let candidate = pipeline
        .resolve(hint)
        .await
        .with_context(|| format!("resolving '{hint}'"))?;

    if json {
        print_json(&json!({
            "name": candidate.name,
            "path": candidate.path,
            "kind": candidate.kind,
        }))
    } else {
        println!("{} ({})", candidate.path, candidate.kind);
        Ok(())
    }
}

async fn update(config: &AppConfig, args: &ArgMatches, json: bool) -> Result<()> {
    let target = Target::parse(args.get_one::<String>("target").map_or("", String::as_str));
    let content = content_from(args)?;
    let publish = !args.get_flag("no-publish");
    let mut pipeline_config = config.pipeline.clone();
    if args.get_flag("verify") {
        pipeline_config = pipeline_config.with_verify(true);
    }

    let outcome = match target {
        Target::Address(raw) => {
            let address = locate_page(&raw, &config.site()?)?;
            let pipeline = connect(config, address.base, pipeline_config)?;
            pipeline
                .update(&address.path, &content, publish)
                .await
                .with_context(|| format!("updating {}", address.path))?
        }
        Target::Hint(hint) => {
            let pipeline = connect(config, config.site()?, pipeline_config)?;
            pipeline
                .resolve_and_update(&hint, &content, publish)
                .await
                .with_context(|| format!("updating '{hint}'"))?
        }
    };

    if json {
        return print_json(&serde_json::to_value(&outcome)?);
    }
    if let Some(original) = &outcome.corrected_from {
        println!("Corrected {} -> {}", original, outcome.resolved_path);
    }
    println!(
        "Updated {} via {} (published: {}, verified: {})",
        outcome.resolved_path, outcome.scheme, outcome.published, outcome.verified
    );
    if let Some(published) = outcome.published_scheme.filter(|s| *s != outcome.scheme) {
        println!("Published via {published}");
    }
    Ok(())
}

async fn probe(config: &AppConfig, args: &ArgMatches, json: bool) -> Result<()> {
    let raw = args.get_one::<String>("target").map_or("", String::as_str);
    let address = locate_page(raw, &config.site()?)?;
    let pipeline = connect(config, address.base, config.pipeline.clone())?;
    let scheme = pipeline
        .probe(&address.path)
        .await
        .with_context(|| format!("probing {}", address.path))?;

    if json {
        return print_json(&json!({ "path": address.path, "scheme": scheme }));
    }
    match scheme {
        Some(scheme) => println!("{} reachable via {}", address.path, scheme),
        None => println!("{} not found under any addressing scheme", address.path),
    }
    Ok(())
}

async fn diagnose(config: &AppConfig, args: &ArgMatches, json: bool) -> Result<()> {
    let library = args.get_one::<String>("library").map_or(DEFAULT_LIBRARY, String::as_str);
    let pipeline = connect(config, config.site()?, config.pipeline.clone())?;
    let diagnostics = pipeline.diagnostics();
    let web = diagnostics.web_context().await.context("reading web context")?;
    let permissions = diagnostics
        .library_permissions(library)
        .await
        .with_context(|| format!("reading permissions of '{library}'"))?;

    if json {
        return print_json(&json!({
            "web": web,
            "library": library,
            "permissions": permissions,
            "view": permissions.can_view(),
            "add": permissions.can_add(),
            "edit": permissions.can_edit(),
            "delete": permissions.can_delete(),
        }));
    }
    println!("Web: {} ({})", web.title, web.url);
    println!("Server-relative URL: {}", web.server_relative_url);
    println!("Library '{library}':");
    println!("  View:   {}", permissions.can_view());
    println!("  Add:    {}", permissions.can_add());
    println!("  Edit:   {}", permissions.can_edit());
    println!("  Delete: {}", permissions.can_delete());
    Ok(())
}

async fn run(matches: ArgMatches) -> Result<()> {
    let config = load_config(&matches)?;
    let json = matches.get_flag("json");

    match matches.subcommand() {
        Some(("resolve", args)) => resolve(&config, args, json).await,
        Some(("update", args)) => update(&config, args, json).await,
        Some(("probe", args)) => probe(&config, args, json).await,
        Some(("diagnose", args)) => diagnose(&config, args, json).await,
        _ => Ok(()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match run(matches).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn target_classification() {
        assert_eq!(
            Target::parse("https://contoso.example/sites/X/SitePages/A.aspx"),
            Target::Address("https://contoso.example/sites/X/SitePages/A.aspx".into())
        );
        assert_eq!(
            Target::parse(" /sites/X/SitePages/A.aspx "),
            Target::Address("/sites/X/SitePages/A.aspx".into())
        );
        assert_eq!(Target::parse("First Test Page"), Target::Hint("First Test Page".into()));
    }

    #[test]
    fn update_flags() {
        let matches = cli()
            .try_get_matches_from([
                "sitepage", "update", "Home", "--html", "<p>x</p>", "--no-publish", "--site",
                "https://contoso.example/sites/X",
            ])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "update");
        assert!(args.get_flag("no-publish"));
        assert!(!args.get_flag("verify"));
        let content = content_from(args).unwrap();
        assert!(content.as_str().contains("<p>x</p>"));

        let config = load_config(&matches).unwrap();
        assert_eq!(config.site().unwrap().as_str(), "https://contoso.example/sites/X");
    }

    #[test]
    fn html_and_content_file_conflict() {
        let result = cli().try_get_matches_from([
            "sitepage", "update", "Home", "--html", "<p>x</p>", "--content-file", "c.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn default_content_is_timestamped_smoke_page() {
        let matches = cli().try_get_matches_from(["sitepage", "update", "Home"]).unwrap();
        let (_, args) = matches.subcommand().unwrap();
        let content = content_from(args).unwrap();
        assert!(content.as_str().contains("Smoke update 20"));
    }

    #[test]
    fn diagnose_defaults_to_site_pages() {
        let matches = cli().try_get_matches_from(["sitepage", "diagnose"]).unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(args.get_one::<String>("library").unwrap(), DEFAULT_LIBRARY);
    }
}
