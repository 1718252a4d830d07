use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ledger_cli::{config, ParamsApp};

#[derive(Parser)]
#[command(name = "ledger-params")]
#[command(about = "Inspect and exercise ledger parameter subspaces", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the genesis pass and print the stored parameters
    Genesis {
        #[arg(long)]
        config: PathBuf,

        /// Genesis file already committed before this pass
        #[arg(long)]
        existing: Option<PathBuf>,

        /// Keys to leave untouched, repeatable
        #[arg(long = "ignore")]
        ignore: Vec<String>,
    },

    /// Apply a JSON-encoded value to one key on top of genesis
    Update {
        #[arg(long)]
        config: PathBuf,

        #[arg(long)]
        key: String,

        #[arg(long)]
        value: String,
    },

    /// Print the decoded parameter set after genesis
    Show {
        #[arg(long)]
        config: PathBuf,
    },
}

fn boot(path: &Path) -> Result<ParamsApp> {
    let cfg = config::load(path).with_context(|| format!("loading {}", path.display()))?;
    let mut app = ParamsApp::new(&cfg.chain_id)?;
    app.init_genesis(&cfg.staking.to_params(), &[]);
    let id = app.commit();
    info!(version = id.version, hash = %id.hash_hex(), "genesis committed");
    Ok(app)
}

fn print_snapshot(app: &mut ParamsApp) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&app.snapshot())?);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Genesis { config: path, existing, ignore } => {
            let cfg = config::load(&path).with_context(|| format!("loading {}", path.display()))?;
            let mut app = match existing {
                Some(prev) => boot(&prev)?,
                None => ParamsApp::new(&cfg.chain_id)?,
            };

            for key in &ignore {
                if !app.has_param(key.as_bytes()) {
                    bail!("unknown parameter key {:?}", key);
                }
            }
            let ignore_keys: Vec<&[u8]> = ignore.iter().map(|k| k.as_bytes()).collect();

            app.init_genesis(&cfg.staking.to_params(), &ignore_keys);
            print_snapshot(&mut app)?;
            let id = app.commit();
            info!(version = id.version, hash = %id.hash_hex(), "block committed");
        }
        Commands::Update { config: path, key, value } => {
            let mut app = boot(&path)?;
            if !app.has_param(key.as_bytes()) {
                bail!("unknown parameter key {:?}", key);
            }

            if let Err(e) = app.update(key.as_bytes(), value.as_bytes()) {
                error!("update of {} rejected: {}", key, e);
                return Err(e.into());
            }
            print_snapshot(&mut app)?;
            let id = app.commit();
            info!(version = id.version, hash = %id.hash_hex(), "block committed");
        }
        Commands::Show { config: path } => {
            let mut app = boot(&path)?;
            println!("{}", serde_json::to_string_pretty(&app.staking_params())?);
        }
    }

    Ok(())
}
