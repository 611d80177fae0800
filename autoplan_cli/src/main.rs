use autoplan_core::*;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "autoplan")]
#[command(about = "Automatic strength training routine planner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan today's routine and sync it to the tracking service
    Run {
        /// Train this split instead of the scheduled one (push, pull, legs, core, cardio)
        #[arg(long)]
        split: Option<Split>,
    },

    /// Preview today's routine without syncing or saving anything
    Plan {
        /// Train this split instead of the scheduled one
        #[arg(long)]
        split: Option<Split>,

        /// Read workouts.json and exercise_templates.json from this directory
        #[arg(long)]
        from_dir: Option<PathBuf>,
    },

    /// Show weekly coverage, the next split and progression records
    Status {
        /// Read workouts.json and exercise_templates.json from this directory
        #[arg(long)]
        from_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    autoplan_core::logging::init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }
    tracing::debug!("Using data directory {:?}", config.data.data_dir);

    match cli.command {
        Commands::Run { split } => cmd_run(&config, split).await,
        Commands::Plan { split, from_dir } => cmd_plan(&config, split, from_dir).await,
        Commands::Status { from_dir } => cmd_status(&config, from_dir).await,
    }
}

fn workout_source(config: &Config, from_dir: Option<PathBuf>) -> Result<Box<dyn WorkoutSource>> {
    match from_dir {
        Some(dir) => Ok(Box::new(ExportDirSource::new(dir))),
        None => Ok(Box::new(tracker_client(config)?)),
    }
}

fn tracker_client(config: &Config) -> Result<TrackerClient> {
    Ok(TrackerClient::new(&config.api)?.with_retry(RetryPolicy::from_config(&config.retry)))
}

async fn cmd_run(config: &Config, split: Option<Split>) -> Result<()> {
    let client = tracker_client(config)?;
    let report = Autoplanner::new(&client, config)
        .with_split(split)
        .run(&client, Utc::now())
        .await;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.success {
        std::process::exit(1);
    }
    Ok(())
}

async fn cmd_plan(config: &Config, split: Option<Split>, from_dir: Option<PathBuf>) -> Result<()> {
    let source = workout_source(config, from_dir)?;
    let options = PlanOptions {
        split_override: split,
        persist_assignment: false,
        relaxed: false,
    };
    let plan = Autoplanner::new(source.as_ref(), config)
        .plan(Utc::now(), &options)
        .await?;

    display_workout(&TodaysWorkout::new(plan.decision, &plan.composition));
    println!("[Preview - nothing synced or saved]");
    Ok(())
}

async fn cmd_status(config: &Config, from_dir: Option<PathBuf>) -> Result<()> {
    let source = workout_source(config, from_dir)?;
    let status = Autoplanner::new(source.as_ref(), config)
        .status(Utc::now())
        .await?;

    println!("Sessions analyzed: {}", status.sessions_analyzed);
    if let Some(last) = status.last_session_at {
        println!("Last session: {}", last.format("%Y-%m-%d %H:%M"));
    }

    println!();
    println!("This week:");
    for (split, count) in &status.weekly_split_frequency {
        let rest = match status.days_since_hit.get(split).copied().flatten() {
            Some(days) => format!("{} days ago", days),
            None => "never".to_string(),
        };
        println!("  {:<7} {} sessions (last: {})", split.name(), count, rest);
    }

    println!();
    match &status.previous_assignment {
        Some(previous) => println!(
            "Last scheduled: {} at {}",
            previous.split,
            previous.assigned_at.format("%Y-%m-%d %H:%M")
        ),
        None => println!("Last scheduled: none"),
    }
    println!("Next split: {} ({:?})", status.next.split, status.next.reason);

    if !status.progression.is_empty() {
        println!();
        println!("Progression:");
        for record in &status.progression {
            println!("  {}: {}", record.title, record.note());
        }
    }

    Ok(())
}

fn display_workout(workout: &TodaysWorkout) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {} DAY ({:?})", workout.split.name().to_uppercase(), workout.reason);
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  {}", workout.title);
    println!();

    for line in &workout.exercises {
        let group = match line.superset_id {
            Some(id) => format!("[S{}] ", id + 1),
            None => String::new(),
        };
        println!("  {}{} (rest {}s)", group, line.title, line.rest_seconds);

        for set in &line.sets {
            match (set.weight_kg, set.reps, set.duration_seconds) {
                (_, _, Some(seconds)) => println!("    → {} s", seconds),
                (Some(weight), Some(reps), _) if weight > 0.0 => {
                    println!("    → {} kg x {}", weight, reps)
                }
                (_, Some(reps), _) => println!("    → {} reps", reps),
                _ => {}
            }
        }
        if !line.note.is_empty() {
            println!("    ℹ {}", line.note);
        }
        println!();
    }
}
