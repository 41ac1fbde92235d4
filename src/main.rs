use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use murmur::audit::{AuditLog, DEFAULT_RETENTION_DAYS};
use murmur::config::Config;
use murmur::corpus::LexicalSet;
use murmur::db::models::{NewPost, FORBIDDEN_KEY, STOP_WORDS_KEY};
use murmur::db::Database;
use murmur::error::PipelineError;
use murmur::pipeline::{Collaborators, Services};
use murmur::wordcloud::{CloudOutcome, RegistryManager};

/// Murmur: Markov sentences and word clouds from observed timeline posts.
///
/// Serves two endpoints over HTTP (a generated sentence and a PNG word
/// cloud) and offers the same operations from the command line.
#[derive(Parser)]
#[command(name = "murmur", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Run the HTTP server
    Serve {
        /// Port to listen on (default: MURMUR_PORT or 3000)
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind (default: MURMUR_BIND or 0.0.0.0)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Generate one sentence and print it
    Generate,

    /// Render a word cloud of the last four hours to a PNG file
    Wordcloud {
        /// Output file
        #[arg(long, default_value = "wordcloud.png")]
        out: PathBuf,
    },

    /// Load posts, one per line, from a file (or - for stdin)
    Ingest {
        file: String,

        /// Author recorded with each post
        #[arg(long)]
        user: Option<String>,

        /// Instance recorded with each post
        #[arg(long)]
        instance: Option<String>,
    },

    /// Manage the forbidden and stop word lists
    Words {
        #[command(subcommand)]
        action: WordsAction,
    },

    /// Delete audit log entries older than N days
    PruneLogs {
        #[arg(long, default_value_t = DEFAULT_RETENTION_DAYS)]
        days: u32,
    },

    /// Delete every stored post
    ClearPosts,

    /// Show system status (post counts, word lists, registry, recent log)
    Status,
}

#[derive(Subcommand)]
enum WordsAction {
    /// Replace a list with the given words
    Set {
        list: WordList,
        #[arg(required = true)]
        words: Vec<String>,
    },

    /// Print a list
    Show { list: ShowList },
}

#[derive(Clone, Copy, ValueEnum)]
enum WordList {
    Forbidden,
    Stop,
}

impl WordList {
    fn key(self) -> &'static str {
        match self {
            WordList::Forbidden => FORBIDDEN_KEY,
            WordList::Stop => STOP_WORDS_KEY,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ShowList {
    Forbidden,
    Stop,
    Registry,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("murmur=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing Murmur database...");
            let config = Config::load()?;
            let db = init_database(&config).await?;
            let table_count = db.table_count().await?;
            println!("Database initialized at: {}", config.db_display());
            println!("Tables created: {table_count}");
            println!("\nNext: load posts with `murmur ingest <file>`, then `murmur serve`");
        }

        Commands::Serve { port, bind } => {
            let mut config = Config::load()?;
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(bind) = bind {
                config.bind = bind;
            }
            let db = init_database(&config).await?;
            let services = Arc::new(Services::new(db, Collaborators::from_config(&config)));
            murmur::web::run_server(&config, services).await?;
        }

        Commands::Generate => {
            let config = Config::load()?;
            let db = open_database(&config).await?;
            let services = Services::new(db, Collaborators::from_config(&config));
            let generated = services.generate_text().await.map_err(explain)?;
            if generated.degraded {
                eprintln!(
                    "{}",
                    "Warning: no candidate passed every check; showing the last one".yellow()
                );
            }
            println!("{}", generated.text);
        }

        Commands::Wordcloud { out } => {
            let config = Config::load()?;
            let db = open_database(&config).await?;
            let services = Services::new(db, Collaborators::from_config(&config));
            match services.render_wordcloud(&out).await.map_err(explain)? {
                CloudOutcome::Rendered(result) => {
                    println!(
                        "{} Word cloud written to {} ({} words, font {})",
                        "✓".green(),
                        out.display(),
                        result.words.len(),
                        result.font_path.display()
                    );
                    if !result.registry_updated {
                        println!("  {}", "Registry was not updated".yellow());
                    }
                }
                CloudOutcome::NoEligibleWords => {
                    anyhow::bail!("No eligible words in recent posts; nothing was written");
                }
            }
        }

        Commands::Ingest {
            file,
            user,
            instance,
        } => {
            let config = Config::load()?;
            let db = open_database(&config).await?;

            let reader: Box<dyn Read> = if file == "-" {
                Box::new(std::io::stdin())
            } else {
                Box::new(
                    std::fs::File::open(&file)
                        .with_context(|| format!("Failed to open {file}"))?,
                )
            };

            let mut inserted = 0usize;
            for line in BufReader::new(reader).lines() {
                let line = line?;
                let text = line.trim();
                if text.is_empty() {
                    continue;
                }
                db.insert_post(&NewPost {
                    user_name: user.clone(),
                    instance_name: instance.clone(),
                    text: text.to_string(),
                    observed_at: None,
                })
                .await?;
                inserted += 1;
            }

            AuditLog::new(db)
                .info(
                    "ingest",
                    format!("Ingested {inserted} posts"),
                    Some(serde_json::json!({ "source": file, "count": inserted })),
                )
                .await;
            println!("{} Ingested {inserted} posts", "✓".green());
        }

        Commands::Words { action } => {
            let config = Config::load()?;
            let db = open_database(&config).await?;
            match action {
                WordsAction::Set { list, words } => {
                    let set = LexicalSet::from_words(words);
                    db.set_setting(list.key(), &set.to_json()).await?;
                    println!("{} Stored {} words", "✓".green(), set.len());
                }
                WordsAction::Show { list } => {
                    let words: Vec<String> = match list {
                        ShowList::Forbidden | ShowList::Stop => {
                            let key = match list {
                                ShowList::Forbidden => FORBIDDEN_KEY,
                                _ => STOP_WORDS_KEY,
                            };
                            let raw = db.get_setting(key).await?.unwrap_or_default();
                            LexicalSet::parse(&raw).iter().map(str::to_string).collect()
                        }
                        ShowList::Registry => {
                            let audit = AuditLog::new(db.clone());
                            RegistryManager::new(db, audit).load().await.words().to_vec()
                        }
                    };
                    if words.is_empty() {
                        println!("{}", "(empty)".dimmed());
                    }
                    for word in words {
                        println!("{word}");
                    }
                }
            }
        }

        Commands::PruneLogs { days } => {
            let config = Config::load()?;
            let db = open_database(&config).await?;
            let deleted = AuditLog::new(db).prune(days).await?;
            println!(
                "{} Deleted {deleted} log entries older than {days} days",
                "✓".green()
            );
        }

        Commands::ClearPosts => {
            let config = Config::load()?;
            let db = open_database(&config).await?;
            let deleted = db.clear_posts().await?;
            AuditLog::new(db)
                .info(
                    "clear_posts",
                    "Cleared observation table",
                    Some(serde_json::json!({ "deleted": deleted })),
                )
                .await;
            println!("{} Deleted {deleted} posts", "✓".green());
        }

        Commands::Status => {
            let config = Config::load()?;
            let db = open_database(&config).await?;
            murmur::status::show(&db, &config).await?;
        }
    }

    Ok(())
}

/// Turn a pipeline failure into a CLI error with a hint where one helps.
fn explain(err: PipelineError) -> anyhow::Error {
    match err {
        PipelineError::NoCorpus => {
            anyhow::anyhow!("No posts found. Load some with `murmur ingest <file>` first.")
        }
        PipelineError::ResourceMissing(what) => anyhow::anyhow!(
            "Required resource not found: {what}. Set MURMUR_FONT_PATH to a Japanese font."
        ),
        other => anyhow::Error::new(other),
    }
}

/// Select the database backend based on configuration.
///
/// When DATABASE_URL is set and points to PostgreSQL, uses the Postgres backend
/// (requires the `postgres` feature). Otherwise, falls back to SQLite.
async fn open_database(config: &Config) -> Result<Arc<dyn Database>> {
    if config.uses_postgres() {
        return connect_postgres(config).await;
    }
    murmur::db::open_sqlite(&config.db_path)
}

/// Initialize the database (create if needed).
async fn init_database(config: &Config) -> Result<Arc<dyn Database>> {
    if config.uses_postgres() {
        return connect_postgres(config).await;
    }
    murmur::db::initialize_sqlite(&config.db_path)
}

#[cfg(feature = "postgres")]
async fn connect_postgres(config: &Config) -> Result<Arc<dyn Database>> {
    info!("Using PostgreSQL backend");
    let url = config.database_url.as_deref().unwrap_or_default();
    murmur::db::connect_postgres(url).await
}

#[cfg(not(feature = "postgres"))]
async fn connect_postgres(_config: &Config) -> Result<Arc<dyn Database>> {
    anyhow::bail!(
        "DATABASE_URL points to PostgreSQL but the 'postgres' feature is not compiled in.\n\
         Rebuild with: cargo build --features postgres"
    )
}
