//! Cadence CLI
//!
//! Command-line front end for the Cadence study scheduler. All state lives in
//! a single JSON snapshot file.

mod snapshot;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use cadence_core::{
    CardScheduler, DeckCountNode, DeckTree, QueueKind, Rating, SessionRequest, SettingsSource,
    build, count_tree, load_settings, resolve,
};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::snapshot::Snapshot;

/// Cadence - Spaced Repetition Study Scheduler CLI
#[derive(Parser)]
#[command(name = "cadence")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CLI for the Cadence spaced-repetition scheduler")]
#[command(long_about = "Cadence schedules flashcards and quiz items with FSRS-4.5, FSRS-6 or SM-2.\n\nIt builds daily study sessions across nested decks with per-deck settings.")]
struct Cli {
    /// Snapshot file (defaults to $CADENCE_SNAPSHOT, then the platform data directory)
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Evaluate as of this RFC 3339 timestamp instead of the current time
    #[arg(long, global = true)]
    now: Option<DateTime<Utc>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show New / Learning / Due counts for every deck
    Counts,

    /// Build today's study session
    Session {
        /// Deck to study (repeatable; defaults to every top-level deck)
        #[arg(long = "deck")]
        decks: Vec<String>,
        /// Seed for random ordering (defaults to the day number)
        #[arg(long)]
        seed: Option<u64>,
        /// Record the session's new items as introduced today
        #[arg(long)]
        save: bool,
    },

    /// Show the outcome of every rating for an item
    Preview {
        /// Item id
        item: String,
    },

    /// Rate an item and save the result
    Review {
        /// Item id
        item: String,
        /// again, hard, good, easy (or 1-4)
        rating: Rating,
        /// Time spent answering, in milliseconds
        #[arg(long)]
        duration_ms: Option<u64>,
    },

    /// Show which settings apply to a deck
    Resolve {
        /// Deck id
        deck: String,
    },

    /// Validate a settings file, or the snapshot when no file is given
    Validate {
        /// Path to a settings JSON file
        file: Option<PathBuf>,
    },

    /// Write an example snapshot
    Init {
        /// Overwrite an existing snapshot
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let path = snapshot::resolve_path(cli.snapshot)?;
    let now = cli.now.unwrap_or_else(Utc::now);

    match cli.command {
        Commands::Counts => run_counts(&path, now),
        Commands::Session { decks, seed, save } => run_session(&path, now, decks, seed, save),
        Commands::Preview { item } => run_preview(&path, now, &item),
        Commands::Review {
            item,
            rating,
            duration_ms,
        } => run_review(&path, now, &item, rating, duration_ms),
        Commands::Resolve { deck } => run_resolve(&path, &deck),
        Commands::Validate { file } => run_validate(&path, file),
        Commands::Init { force } => run_init(&path, force),
    }
}

/// Run counts command
fn run_counts(path: &Path, now: DateTime<Utc>) -> anyhow::Result<()> {
    let snapshot = Snapshot::load(path)?;
    let tree = DeckTree::new(&snapshot.decks);

    println!("{}", "=== Cadence Deck Counts ===".cyan().bold());
    println!();
    println!(
        "{:<40} {:>6} {:>6} {:>6}",
        "Deck".white().bold(),
        "New".blue().bold(),
        "Learn".red().bold(),
        "Due".green().bold()
    );

    let nodes = count_tree(&tree, &snapshot.settings, now);
    if nodes.is_empty() {
        println!("{}", "No decks found.".dimmed());
    }
    for node in &nodes {
        print_count_node(node, 0);
    }
    Ok(())
}

fn print_count_node(node: &DeckCountNode, depth: usize) {
    let label = format!("{}{}", "  ".repeat(depth), node.name);
    println!(
        "{:<40} {:>6} {:>6} {:>6}",
        label,
        node.total.new.to_string().blue(),
        node.total.learning.to_string().red(),
        node.total.review.to_string().green()
    );
    for child in &node.children {
        print_count_node(child, depth + 1);
    }
}

/// Run session command
fn run_session(
    path: &Path,
    now: DateTime<Utc>,
    decks: Vec<String>,
    seed: Option<u64>,
    save: bool,
) -> anyhow::Result<()> {
    let mut snapshot = Snapshot::load(path)?;
    let deck_ids = if decks.is_empty() {
        snapshot.decks.iter().map(|d| d.id.clone()).collect()
    } else {
        decks
    };
    let seed = seed.unwrap_or_else(|| now.timestamp().div_euclid(86_400) as u64);

    let session = {
        let tree = DeckTree::new(&snapshot.decks);
        let request = SessionRequest::new(deck_ids, now, seed)
            .with_introduced(snapshot.introduced_today.clone());
        build(&request, &tree, &snapshot.settings)
    };

    println!("{}", "=== Cadence Study Session ===".cyan().bold());
    println!();
    println!(
        "{} learning, {} review, {} new (seed {})",
        session.count(QueueKind::Learning).to_string().red(),
        (session.count(QueueKind::Review) + session.count(QueueKind::InterdayLearning))
            .to_string()
            .green(),
        session.count(QueueKind::New).to_string().blue(),
        seed
    );
    println!();

    for (i, queued) in session.items.iter().enumerate() {
        let kind = match queued.kind {
            QueueKind::Learning => "learn".red(),
            QueueKind::Review => "review".green(),
            QueueKind::InterdayLearning => "learn+".yellow(),
            QueueKind::New => "new".blue(),
        };
        println!(
            "{:>4}. {:<8} {:<24} {}",
            i + 1,
            kind,
            queued.item_id,
            queued.deck_id.dimmed()
        );
    }
    if session.is_empty() {
        println!("{}", "Nothing to study right now.".dimmed());
    }

    if save {
        snapshot.introduced_today = session.introduced_today;
        snapshot.save(path)?;
        println!();
        println!("{}", "Introduced-today set saved.".green());
    }
    Ok(())
}

/// Run preview command
fn run_preview(path: &Path, now: DateTime<Utc>, item_id: &str) -> anyhow::Result<()> {
    let snapshot = Snapshot::load(path)?;
    let tree = DeckTree::new(&snapshot.decks);
    let (item, deck) = tree
        .find_item(item_id)
        .ok_or_else(|| anyhow::anyhow!("Item not found: {}", item_id))?;
    let resolved = resolve(&deck.id, &tree, &snapshot.settings);
    let scheduler = CardScheduler::from_settings(resolved.settings)
        .with_context(|| format!("Invalid settings for deck {}", deck.id))?;

    println!("{}", "=== Cadence Preview ===".cyan().bold());
    println!();
    println!("{}: {}", "Item".white().bold(), item.id);
    println!("{}: {} ({})", "Deck".white().bold(), deck.name, resolved.source.label());
    println!("{}: {}", "Algorithm".white().bold(), scheduler.algorithm());
    println!(
        "{}: {}",
        "Phase".white().bold(),
        item.scheduling.view(scheduler.algorithm()).phase
    );
    if let Some(r) = scheduler.current_retrievability(item, now) {
        println!("{}: {:.1}%", "Retrievability".white().bold(), r * 100.0);
    }
    println!();

    for outcome in scheduler.preview(item, now).iter() {
        let wait = if outcome.interval_days > 0 {
            format!("{}d", outcome.interval_days)
        } else {
            format!("{}m", (outcome.due - now).num_minutes())
        };
        println!(
            "  {:<6} {:>8}  {:<10} {}",
            outcome.rating.as_str().bold(),
            wait,
            outcome.phase.as_str(),
            outcome.due.format("%Y-%m-%d %H:%M").to_string().dimmed()
        );
    }
    Ok(())
}

/// Run review command
fn run_review(
    path: &Path,
    now: DateTime<Utc>,
    item_id: &str,
    rating: Rating,
    duration_ms: Option<u64>,
) -> anyhow::Result<()> {
    let mut snapshot = Snapshot::load(path)?;

    let outcome = {
        let tree = DeckTree::new(&snapshot.decks);
        let (item, deck) = tree
            .find_item(item_id)
            .ok_or_else(|| anyhow::anyhow!("Item not found: {}", item_id))?;
        let settings = resolve(&deck.id, &tree, &snapshot.settings).settings;
        CardScheduler::from_settings(settings)?.review(item, rating, now, duration_ms)
    };

    let item = snapshot
        .find_item_mut(item_id)
        .ok_or_else(|| anyhow::anyhow!("Item not found: {}", item_id))?;
    item.scheduling = outcome.record;
    snapshot.review_log.push(outcome.log);
    snapshot.save(path)?;

    println!("{}", "=== Cadence Review ===".cyan().bold());
    println!();
    println!("{} rated {}", item_id, rating.as_str().bold());
    if let Some(notice) = outcome.leech {
        println!(
            "{}",
            format!(
                "Leech: {} lapses (suggested action: {:?})",
                notice.lapses, notice.action
            )
            .yellow()
            .bold()
        );
    }
    Ok(())
}

/// Run resolve command
fn run_resolve(path: &Path, deck_id: &str) -> anyhow::Result<()> {
    let snapshot = Snapshot::load(path)?;
    let tree = DeckTree::new(&snapshot.decks);
    if tree.get(deck_id).is_none() {
        anyhow::bail!("Deck not found: {}", deck_id);
    }
    let resolved = resolve(deck_id, &tree, &snapshot.settings);
    let settings = resolved.settings;

    println!("{}", "=== Cadence Settings ===".cyan().bold());
    println!();
    let source = match &resolved.source {
        SettingsSource::Global => "Global".to_string(),
        SettingsSource::Deck { id, name } => format!("{} ({})", name, id),
    };
    println!("{}: {}", "Source".white().bold(), source);
    println!("{}: {}", "Algorithm".white().bold(), settings.algorithm);
    println!("{}: {}", "Learning Steps".white().bold(), settings.learning_steps);
    println!("{}: {}", "Relearning Steps".white().bold(), settings.relearning_steps);
    println!("{}: {}", "New / Day".white().bold(), settings.new_per_day);
    println!("{}: {}", "Reviews / Day".white().bold(), settings.max_reviews_per_day);
    println!(
        "{}: {} ({:?})",
        "Leech Threshold".white().bold(),
        settings.leech_threshold,
        settings.leech_action
    );
    Ok(())
}

/// Run validate command
fn run_validate(path: &Path, file: Option<PathBuf>) -> anyhow::Result<()> {
    println!("{}", "=== Cadence Validate ===".cyan().bold());
    println!();
    match file {
        Some(file) => {
            let settings = load_settings(&file)
                .with_context(|| format!("Invalid settings file {}", file.display()))?;
            println!("{} {} ({})", "OK".green().bold(), file.display(), settings.algorithm);
        }
        None => {
            let snapshot = Snapshot::load(path)?;
            let items: usize = snapshot.decks.iter().map(|d| d.total_items()).sum();
            println!(
                "{} {} ({} decks, {} items)",
                "OK".green().bold(),
                path.display(),
                DeckTree::new(&snapshot.decks).len(),
                items
            );
        }
    }
    Ok(())
}

/// Run init command
fn run_init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Snapshot already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    Snapshot::example().save(path)?;
    println!("{}", "=== Cadence Init ===".cyan().bold());
    println!();
    println!("Wrote example snapshot to {}", path.display().to_string().cyan());
    Ok(())
}
