//! Binary entrypoint for the abysm console.
//!
//! Commands:
//! - `play [--player <id>] [--name <name>] [--cycle <tag>] [--no-save]` - play in the terminal
//! - `init` - write a starter `config.toml`
//! - `status --player <id>` - print a stored player's stats
//! - `migrate [--dry-run]` - bring every stored player record to the current data version
//!
//! See the library crate docs for module-level details: `abysm::`.
use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use abysm::config::{Config, FlavorConfig};
use abysm::engine::commands::{stats_line, FAREWELL};
use abysm::engine::flavor::flavor_from_config;
use abysm::engine::sessions::utc_day_cycle;
use abysm::engine::{PlayerRepository, PlayerStore, Session, SessionOptions};
use abysm::validation::{sanitize_display_name, validate_player_id};

#[derive(Parser)]
#[command(name = "abysm")]
#[command(about = "A deterministic text adventure in the Abysm of Karth")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Play in this terminal
    Play {
        /// Player id (defaults to config, ABYSM_PLAYER_ID, then $USER)
        #[arg(short, long)]
        player: Option<String>,
        /// Display name for a new player
        #[arg(short, long)]
        name: Option<String>,
        /// Fixed cycle tag for the shop (defaults to today's UTC date)
        #[arg(long)]
        cycle: Option<String>,
        /// Do not load or save the player
        #[arg(long)]
        no_save: bool,
    },
    /// Write a default configuration file
    Init,
    /// Show a stored player's stats
    Status {
        #[arg(short, long)]
        player: String,
    },
    /// Migrate stored player records to the current data version
    Migrate {
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Init writes the config, so there is nothing to load yet
    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Some(Config::load_or_default(&cli.config).await?),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Init => {
            info!("Initializing new configuration");
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
            println!("Configuration file created at {}", cli.config);
        }
        Commands::Play {
            player,
            name,
            cycle,
            no_save,
        } => {
            let config = resolve_config(pre_config)?;
            let raw_id = player
                .or_else(|| config.game.player_id.clone())
                .or_else(|| std::env::var("USER").ok())
                .or_else(|| std::env::var("USERNAME").ok())
                .unwrap_or_else(|| "local".to_string());
            let id = validate_player_id(&raw_id)?;
            let name = sanitize_display_name(
                name.as_deref().unwrap_or(&config.game.default_player_name),
                &id,
            );
            let repo = if no_save {
                None
            } else {
                open_repository(&config)
            };
            let options = SessionOptions {
                map_size: config.game.map_size(),
                cycle: cycle.clone().unwrap_or_else(utc_day_cycle),
                autosave: config.storage.autosave,
            };
            let console = Console {
                world_name: config.game.world_name.clone(),
                flavor: config.flavor.clone(),
                fixed_cycle: cycle,
            };
            info!("Starting abysm v{} for player {}", env!("CARGO_PKG_VERSION"), id);
            // The flavor client blocks, so the whole console runs off the async workers
            tokio::task::spawn_blocking(move || console.run(repo, &id, &name, options))
                .await
                .map_err(|e| anyhow!("Console task failed: {}", e))??;
        }
        Commands::Status { player } => {
            let config = resolve_config(pre_config)?;
            let id = validate_player_id(&player)?;
            let store = PlayerStore::open(config.storage.db_path())?;
            match store.get_player(&id)? {
                Some(p) => println!("{}", stats_line(&p)),
                None => println!("Player {} not found", id),
            }
        }
        Commands::Migrate { dry_run } => {
            let config = resolve_config(pre_config)?;
            let path = config.storage.db_path();
            info!("Migrating player records in {}", path.display());
            let store = PlayerStore::open(&path)?;
            let report = store.migrate_all(dry_run)?;
            println!("{}", report.summary());
            for (id, err) in &report.failures {
                println!("  {}: {}", id, err);
            }
        }
    }

    Ok(())
}

/// Defaults, file, then environment; rejected if unusable.
fn resolve_config(pre_config: Option<Config>) -> Result<Config> {
    let mut config = pre_config.unwrap_or_default();
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

fn open_repository(config: &Config) -> Option<Arc<dyn PlayerRepository>> {
    let path = config.storage.db_path();
    match PlayerStore::open(&path) {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            warn!(
                "Player store at {} unavailable ({}); playing without saving",
                path.display(),
                e
            );
            None
        }
    }
}

struct Console {
    world_name: String,
    flavor: FlavorConfig,
    fixed_cycle: Option<String>,
}

impl Console {
    fn run(
        self,
        repo: Option<Arc<dyn PlayerRepository>>,
        id: &str,
        name: &str,
        options: SessionOptions,
    ) -> Result<()> {
        let flavor = flavor_from_config(&self.flavor);
        let mut session = Session::open(repo, id, name, options, flavor);
        println!(
            "{} welcomes you, {}. Type 'help' to begin.\n",
            self.world_name,
            session.player().name
        );

        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        let mut line = String::new();
        loop {
            print!("> ");
            stdout.flush()?;
            line.clear();
            if stdin.lock().read_line(&mut line)? == 0 {
                println!("\n{}", FAREWELL);
                session.close();
                break;
            }
            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            if self.fixed_cycle.is_none() {
                session.set_cycle(&utc_day_cycle());
            }
            let (out, ended) = session.handle_line(input);
            println!("{}", out);
            if ended {
                break;
            }
        }
        Ok(())
    }
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::str::FromStr;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let configured = config
        .as_ref()
        .and_then(|c| log::LevelFilter::from_str(&c.logging.level).ok())
        .unwrap_or(log::LevelFilter::Info);
    let base_level = match verbosity {
        0 => configured,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Echo to the console only when someone is watching it
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
