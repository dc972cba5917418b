use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Layer, Registry};

use linkreach::batch::{CancelFlag, LogProgress};
use linkreach::commands::{self, BatchSelector};
use linkreach::config::{load_or_default, Config};
use linkreach::driver::{SessionGuard, WebDriverSession};
use linkreach::store::BatchPeriod;
use linkreach::{Credentials, Invitation, InvitationDecision, LinkreachError};

const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser, Debug)]
#[command(name = "linkreach", version, about = "Harvest a startup directory and work through founder outreach in resumable batches")]
struct Cli {
    /// Path to a JSON config file (defaults to ./linkreach.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect company links from a batch listing
    Harvest {
        #[command(flatten)]
        batch: BatchArgs,
        /// Replace an existing company list
        #[arg(long)]
        force: bool,
    },
    /// Build the record store from a founder extraction file
    Import {
        #[command(flatten)]
        batch: BatchArgs,
        #[arg(long)]
        input: PathBuf,
        /// Replace an existing store, discarding its progress
        #[arg(long)]
        force: bool,
    },
    /// Sign in and process the next batch of records
    Connect {
        #[command(flatten)]
        batch: BatchArgs,
        /// Number of profiles to visit (defaults to batch.default_count)
        #[arg(long)]
        count: Option<usize>,
    },
    /// Sign in and answer received connection invitations
    Invitations {
        #[arg(long, value_enum, default_value_t = InvitationMode::Review)]
        mode: InvitationMode,
    },
    /// Show progress for a store
    Status {
        #[command(flatten)]
        batch: BatchArgs,
    },
    /// List store files in the data directory
    Files,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InvitationMode {
    /// Ask for each invitation in turn
    Review,
    /// Only print pending invitations
    List,
    AcceptAll,
    IgnoreAll,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Winter, Spring, Summer or Fall (or W, X, S, F)
    #[arg(long)]
    period: BatchPeriod,
    /// Four-digit year
    #[arg(long)]
    year: u16,
}

impl BatchArgs {
    fn selector(&self) -> Result<BatchSelector, LinkreachError> {
        BatchSelector::new(self.period, self.year)
    }
}

fn main() {
    let _ = dotenv();
    let cli = Cli::parse();
    init_tracing(cli.json);

    let cancel = CancelFlag::new();
    if let Err(e) = cancel.install_ctrlc_handler() {
        warn!(error = %e, "Could not install interrupt handler");
    }

    match run(cli, cancel.clone()) {
        Ok(()) if cancel.is_cancelled() => process::exit(EXIT_INTERRUPTED),
        Ok(()) => {}
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("linkreach=info"));
    let format: Box<dyn Layer<Registry> + Send + Sync> = if json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(false).boxed()
    };
    let subscriber = Registry::default().with(format).with(filter);

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("Tracing subscriber already set; skipping re-initialization.");
    }
    let _ = tracing_log::LogTracer::init();
}

fn run(cli: Cli, cancel: CancelFlag) -> Result<(), LinkreachError> {
    let config = load_or_default(cli.config.as_deref())?;

    match cli.command {
        Command::Harvest { batch, force } => {
            let batch = batch.selector()?;
            let mut session = open_session(&config)?;
            let output = commands::harvest(&mut *session, &config, batch, force)?;
            session.close();
            info!(
                path = %output.path.display(),
                count = output.count,
                "Harvested {} companies for {}",
                output.count,
                batch
            );
            info!("Founder records for this batch belong in {}", output.store_file);
            if output.possibly_incomplete {
                warn!("Listing may be incomplete; rerun with --force to try again");
            }
        }
        Command::Import {
            batch,
            input,
            force,
        } => {
            let batch = batch.selector()?;
            let stats = commands::import(&config, batch, &input, force)?;
            info!(
                "Imported {} founders from {} companies into {}",
                stats.total,
                stats.companies,
                batch.store_path(&config).display()
            );
        }
        Command::Connect { batch, count } => {
            let batch = batch.selector()?;
            let (store, mut records) = commands::open_store(&config, batch)?;
            let count = count.unwrap_or(config.batch.default_count);

            let mut session = open_session(&config)?;
            let summary = commands::connect(
                &mut *session,
                &config,
                &store,
                &mut records,
                count,
                cancel,
                &LogProgress,
                || Credentials::resolve(&config.credentials),
            )?;
            session.close();

            println!(
                "{}/{} connection requests sent ({} skipped without a profile link)",
                summary.successful, summary.attempted, summary.skipped
            );
            for (outcome, n) in &summary.by_outcome {
                println!("  {:<18} {}", outcome.as_str(), n);
            }
        }
        Command::Invitations { mode } => {
            let mut session = open_session(&config)?;
            let credentials = || Credentials::resolve(&config.credentials);

            if mode == InvitationMode::List {
                let invitations = commands::list_invitations(&mut *session, &config, credentials)?;
                session.close();
                println!("{} pending invitations", invitations.len());
                for (i, invitation) in invitations.iter().enumerate() {
                    print_invitation(invitation, i + 1, invitations.len());
                }
                return Ok(());
            }

            let report = commands::answer_invitations(
                &mut *session,
                &config,
                &cancel,
                credentials,
                |invitation, position, total| match mode {
                    InvitationMode::AcceptAll => Some(InvitationDecision::Accept),
                    InvitationMode::IgnoreAll => Some(InvitationDecision::Ignore),
                    _ => ask_decision(invitation, position, total),
                },
            )?;
            session.close();

            println!(
                "{} accepted, {} ignored, {} skipped, {} failed",
                report.accepted, report.ignored, report.skipped, report.failed
            );
            if report.remaining > 0 {
                println!("{} invitations left unanswered", report.remaining);
            }
        }
        Command::Status { batch } => {
            let report = commands::status(&config, batch.selector()?)?;
            println!("{}", report.file);
            println!("  records:    {}", report.stats.total);
            println!("  companies:  {}", report.stats.companies);
            println!("  processed:  {}", report.stats.processed);
            println!("  remaining:  {}", report.stats.actionable_remaining);
            match report.next_serial {
                Some(serial) => println!("  next:       #{}", serial),
                None => println!("  next:       (done)"),
            }
            for (outcome, n) in &report.stats.by_outcome {
                println!("  {:<18} {}", outcome.as_str(), n);
            }
        }
        Command::Files => {
            let files = commands::files(&config)?;
            if files.is_empty() {
                println!("No store files in {}", config.data_dir().display());
            }
            for file in files {
                match file.batch {
                    Some(batch) => println!("{}  ({})", file.name, batch),
                    None => println!("{}", file.name),
                }
            }
        }
    }

    Ok(())
}

fn print_invitation(invitation: &Invitation, position: usize, total: usize) {
    println!("[{}/{}] {}", position, total, invitation.name);
    let details = [
        &invitation.headline,
        &invitation.mutual_connections,
        &invitation.time_sent,
        &invitation.profile_url,
    ];
    for line in details.into_iter().flatten() {
        println!("    {}", line);
    }
    if invitation.is_verified {
        println!("    verified");
    }
    if invitation.follows_you {
        println!("    follows you");
    }
}

/// `None` (stop) also covers a prompt that could not be shown.
fn ask_decision(invitation: &Invitation, position: usize, total: usize) -> Option<InvitationDecision> {
    print_invitation(invitation, position, total);
    let choice = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Answer {}", invitation.name))
        .items(&["Accept", "Ignore", "Skip", "Stop reviewing"])
        .default(0)
        .interact();

    match choice {
        Ok(0) => Some(InvitationDecision::Accept),
        Ok(1) => Some(InvitationDecision::Ignore),
        Ok(2) => Some(InvitationDecision::Skip),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "Prompt failed; stopping review");
            None
        }
    }
}

fn open_session(config: &Config) -> Result<SessionGuard<WebDriverSession>, LinkreachError> {
    Ok(SessionGuard::new(WebDriverSession::start(&config.webdriver)?))
}
