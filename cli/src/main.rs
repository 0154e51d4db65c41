//! Command-line client for a Blivate post repository.
//!
//! Credentials come from `BLIVATE_OWNER` and `BLIVATE_TOKEN`; everything else
//! from an optional TOML file and `BLIVATE_*` overrides.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use blivate::analytics::ClickSummary;
use blivate::models::document::sort_newest_first;
use blivate::{AppState, Document, DocumentId, LinkId, Lookup, Session, StoreConfig};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};

const EXCERPT_LEN: usize = 120;

#[derive(Parser, Debug)]
#[command(name = "blivate")]
#[command(about = "Manage posts stored in a GitHub repository", long_about = None)]
struct Cli {
    /// Configuration file (TOML). Missing files are ignored.
    #[arg(short, long, global = true, env = "BLIVATE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a post, or update one when --id is given
    Save {
        #[arg(short, long)]
        title: String,
        /// Markdown body; read from --body-file or stdin when omitted
        #[arg(short, long, conflicts_with = "body_file")]
        body: Option<String>,
        #[arg(long)]
        body_file: Option<PathBuf>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Existing post to overwrite
        #[arg(long)]
        id: Option<String>,
    },
    /// Print one post
    Get {
        id: String,
        /// Print as JSON instead of the stored text
        #[arg(long)]
        json: bool,
    },
    /// List posts, newest first
    List {
        /// Only posts whose title, body or tags contain this term
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Delete a post
    Delete { id: String },
    /// Create a share link for a post
    Share {
        id: String,
        /// Expire the link after this many hours
        #[arg(long)]
        expires_in_hours: Option<i64>,
    },
    /// Show the record behind a share link
    Resolve { link: String },
    /// Read a shared post anonymously and record the click
    Open {
        link: String,
        #[arg(long, default_value = "127.0.0.1")]
        address: String,
        #[arg(long, default_value = concat!("blivate-cli/", env!("CARGO_PKG_VERSION")))]
        user_agent: String,
    },
    /// Click statistics of a share link
    Clicks {
        link: String,
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blivate=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = StoreConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let session = Session::from_env().context("Missing credentials")?;
    let app = AppState::github(&config, session)?;

    run(&app, cli.command).await
}

async fn run(app: &AppState, command: Command) -> Result<()> {
    match command {
        Command::Save {
            title,
            body,
            body_file,
            tags,
            id,
        } => {
            let body = read_body(body, body_file.as_deref())?;
            let id = id.map(|raw| parse_document_id(&raw)).transpose()?;
            let document = Document::new(title, body).with_tags(tags);
            let saved = app.documents.save(&document, id.as_ref()).await?;
            println!("{saved}");
        }
        Command::Get { id, json } => {
            let id = parse_document_id(&id)?;
            let stored = found(app.documents.get(&id).await, || format!("post '{id}'"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stored.document)?);
            } else {
                print!("{}", blivate::codec::encode(&stored.document));
            }
        }
        Command::List { search } => {
            let mut documents = app.documents.try_list_all().await?;
            if let Some(term) = search.as_deref() {
                documents.retain(|stored| stored.document.matches(term));
            }
            sort_newest_first(&mut documents);
            for stored in &documents {
                let created = stored
                    .document
                    .created_at
                    .map(|t| t.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "----------".to_string());
                println!("{created}  {}  {}", stored.id, stored.document.title);
                let excerpt = stored.document.excerpt(EXCERPT_LEN);
                if !excerpt.is_empty() {
                    println!("            {excerpt}");
                }
            }
        }
        Command::Delete { id } => {
            let id = parse_document_id(&id)?;
            app.documents.delete(&id).await?;
            println!("Deleted {id}");
        }
        Command::Share {
            id,
            expires_in_hours,
        } => {
            let id = parse_document_id(&id)?;
            let expires_at = expires_in_hours
                .map(|hours| expiry_after_hours(Utc::now(), hours))
                .transpose()?;
            let issued = app.links.create(&id, expires_at).await?;
            println!("{}", issued.share_url);
        }
        Command::Resolve { link } => {
            let link_id = parse_link_id(&link)?;
            let link = found(app.links.resolve(&link_id).await, || format!("share link '{link_id}'"))?;
            println!("post:     {}", link.document_ref);
            println!("raw url:  {}", link.resource_url);
            println!("created:  {}", link.created_at);
            match link.expires_at {
                Some(expires_at) if link.is_expired(Utc::now()) => {
                    println!("expires:  {expires_at} (expired)")
                }
                Some(expires_at) => println!("expires:  {expires_at}"),
                None => println!("expires:  never"),
            }
        }
        Command::Open {
            link,
            address,
            user_agent,
        } => {
            let link_id = parse_link_id(&link)?;
            let link = found(app.links.resolve(&link_id).await, || format!("share link '{link_id}'"))?;
            if link.is_expired(Utc::now()) {
                tracing::warn!("Refusing expired share link '{link_id}'");
                bail!("share link '{link_id}' has expired");
            }
            let document = app.raw.read_shared(&link).await?;
            app.analytics.record_click(&link_id, &address, &user_agent).await;
            tracing::info!("Opened post '{}' through link '{link_id}'", link.document_ref);

            println!("# {}", document.title);
            if !document.tags.is_empty() {
                println!("tags: {}", document.tags.join(", "));
            }
            println!();
            println!("{}", document.body);
        }
        Command::Clicks { link, json } => {
            let link_id = parse_link_id(&link)?;
            let events = app.analytics.list_clicks(&link_id).await;
            let summary = ClickSummary::from_events(&events);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
        }
    }
    Ok(())
}

fn print_summary(summary: &ClickSummary) {
    println!("clicks:  {}", summary.total_clicks);
    println!(
        "unique:  {} ({}%)",
        summary.unique_addresses,
        summary.unique_ratio_percent()
    );
    for (browser, count) in &summary.browsers {
        println!("  {browser:<8} {count}");
    }
    for (device, count) in &summary.devices {
        println!("  {device:<8} {count}");
    }
}

fn read_body(body: Option<String>, body_file: Option<&Path>) -> Result<String> {
    if let Some(body) = body {
        return Ok(body);
    }
    if let Some(path) = body_file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }
    let mut body = String::new();
    std::io::stdin()
        .read_to_string(&mut body)
        .context("Failed to read body from stdin")?;
    Ok(body)
}

fn expiry_after_hours(now: DateTime<Utc>, hours: i64) -> Result<DateTime<Utc>> {
    Duration::try_hours(hours)
        .and_then(|delta| now.checked_add_signed(delta))
        .with_context(|| format!("--expires-in-hours {hours} is out of range"))
}

fn found<T>(lookup: Lookup<T>, what: impl FnOnce() -> String) -> Result<T> {
    match lookup {
        Lookup::Found(value) => Ok(value),
        Lookup::Absent => bail!("{} not found", what()),
        Lookup::Failed(e) => Err(e).with_context(|| format!("Failed to read {}", what())),
    }
}

fn parse_document_id(raw: &str) -> Result<DocumentId> {
    DocumentId::parse(raw).with_context(|| format!("'{raw}' is not a valid post id"))
}

fn parse_link_id(raw: &str) -> Result<LinkId> {
    // Accept a full share URL as well as a bare id.
    let raw = raw.trim_end_matches('/');
    let id = raw.rsplit('/').next().unwrap_or(raw);
    LinkId::parse(id).with_context(|| format!("'{raw}' is not a valid share link"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_save_with_tags() {
        let cli = Cli::try_parse_from([
            "blivate", "save", "--title", "Hello", "--body", "text", "--tag", "a", "--tag", "b",
        ])
        .unwrap();
        match cli.command {
            Command::Save { title, tags, id, .. } => {
                assert_eq!(title, "Hello");
                assert_eq!(tags, vec!["a", "b"]);
                assert!(id.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_body_and_body_file_conflict() {
        let result = Cli::try_parse_from([
            "blivate", "save", "--title", "x", "--body", "y", "--body-file", "z.md",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_read_body_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post.md");
        std::fs::write(&path, "# Heading\n\ntext").unwrap();

        assert_eq!(read_body(None, Some(&path)).unwrap(), "# Heading\n\ntext");
        assert_eq!(read_body(Some("inline".into()), Some(&path)).unwrap(), "inline");
    }

    #[test]
    fn test_parse_link_id_accepts_urls() {
        let id = parse_link_id("https://blog.example.com/shared/abc123/").unwrap();
        assert_eq!(id.as_str(), "abc123");
        assert_eq!(parse_link_id("abc123").unwrap().as_str(), "abc123");
        assert!(parse_link_id("not-valid!").is_err());
    }

    #[test]
    fn test_expiry_after_hours() {
        let now = Utc::now();
        assert_eq!(expiry_after_hours(now, 24).unwrap(), now + Duration::hours(24));
        assert!(expiry_after_hours(now, 9_000_000_000_000).is_err());
        assert!(expiry_after_hours(now, i64::MAX).is_err());
    }

    #[test]
    fn test_found_maps_absent_to_error() {
        let err = found::<()>(Lookup::Absent, || "post 'x'".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "post 'x' not found");
    }
}
