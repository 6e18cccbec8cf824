//! jobfeed CLI
//!
//! Browse the job feed from a terminal, against the configured backend or
//! an in-memory demo data set.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use jobfeed::{
    config::load_config,
    error::Result,
    feed::{FeedFetcher, FeedView},
    models::{
        Config, DatePosted, ExperienceLevel, FilterSelection, Job, JobType, SalaryRange, SortOrder,
        WorkMode,
    },
    store::{JobStore, MemoryStore, RestStore},
};

/// jobfeed - Job board feed client
#[derive(Parser, Debug)]
#[command(name = "jobfeed", version, about = "Filtered, paginated job feed client")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "jobfeed.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Use built-in sample jobs instead of the backend
    #[arg(long)]
    demo: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the job feed
    Feed {
        /// Search text matched against titles
        #[arg(short, long, default_value = "")]
        query: String,

        /// Job type (repeatable)
        #[arg(long = "type", value_enum)]
        job_types: Vec<JobType>,

        /// Location (repeatable)
        #[arg(long = "location")]
        locations: Vec<String>,

        /// Work mode (repeatable)
        #[arg(long = "mode", value_enum)]
        work_modes: Vec<WorkMode>,

        /// Experience level (repeatable)
        #[arg(long = "level", value_enum)]
        levels: Vec<ExperienceLevel>,

        /// Lower bound of the salary range
        #[arg(long, requires = "salary_max")]
        salary_min: Option<i64>,

        /// Upper bound of the salary range
        #[arg(long, requires = "salary_min")]
        salary_max: Option<i64>,

        /// How recently the job was posted
        #[arg(long, value_enum, default_value_t = DatePosted::All)]
        posted: DatePosted,

        /// Result ordering
        #[arg(long, value_enum, default_value_t = SortOrder::Newest)]
        sort: SortOrder,

        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },

    /// List locations offered by the filter panel
    Locations,

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Sample postings for `--demo`.
fn demo_jobs() -> Vec<Job> {
    let now = Utc::now();
    let deadline = (now + Duration::days(30)).date_naive();
    // title, location, type, mode, level, salary range, age in days
    #[rustfmt::skip]
    let rows = [
        ("Rust Developer", "Tirana", JobType::FullTime, Some(WorkMode::Hybrid), Some(ExperienceLevel::Senior), Some((1800, 2500)), 0),
        ("Frontend Developer", "Durres", JobType::Contract, Some(WorkMode::Remote), Some(ExperienceLevel::Mid), Some((1000, 1500)), 2),
        ("Barista", "Tirana", JobType::PartTime, Some(WorkMode::Onsite), Some(ExperienceLevel::Entry), Some((400, 500)), 5),
        ("Data Analyst Intern", "Vlore", JobType::Internship, Some(WorkMode::Onsite), Some(ExperienceLevel::Entry), None, 9),
        ("DevOps Engineer", "Tirana", JobType::FullTime, Some(WorkMode::Remote), Some(ExperienceLevel::Mid), Some((1500, 2000)), 20),
        ("Project Manager", "Shkoder", JobType::FullTime, None, Some(ExperienceLevel::Executive), Some((2500, 3500)), 45),
    ];

    rows.into_iter()
        .enumerate()
        .map(|(i, (title, location, job_type, work_mode, level, salary, age_days))| Job {
            id: format!("demo-{}", i + 1),
            employer_id: "demo-employer".to_string(),
            title: title.to_string(),
            description: format!("<p>Join our team as a <b>{}</b>.</p>", title),
            location: location.to_string(),
            salary: salary
                .map(|(min, max)| format!("€{}-{}", min, max))
                .unwrap_or_default(),
            job_type,
            work_mode,
            experience_level: level,
            min_salary: salary.map(|(min, _)| min),
            max_salary: salary.map(|(_, max)| max),
            salary_currency: salary.map(|_| "EUR".to_string()),
            deadline,
            is_active: true,
            created_at: now - Duration::days(age_days),
        })
        .collect()
}

/// Backend for this run.
fn open_store(demo: bool, config: &Config) -> Result<Arc<dyn JobStore>> {
    if demo {
        log::info!("Using demo data");
        return Ok(Arc::new(MemoryStore::with_jobs(demo_jobs())));
    }
    Ok(Arc::new(RestStore::new(&config.backend)?))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli.config)?;
    log::debug!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Feed {
            query,
            job_types,
            locations,
            work_modes,
            levels,
            salary_min,
            salary_max,
            posted,
            sort,
            pages,
        } => {
            let selection = FilterSelection {
                query,
                job_types: job_types.into_iter().collect(),
                locations: locations.into_iter().collect(),
                work_modes: work_modes.into_iter().collect(),
                experience_levels: levels.into_iter().collect(),
                salary_range: salary_min
                    .zip(salary_max)
                    .map(|(min, max)| SalaryRange::new(min, max)),
                date_posted: posted,
                sort,
            };

            let fetcher = FeedFetcher::new(open_store(cli.demo, &config)?, &config.feed);
            if let Err(e) = fetcher.refresh(selection).await {
                eprintln!("{}", e.user_message());
                return Err(e);
            }
            for _ in 1..pages.max(1) {
                match fetcher.load_more().await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => {
                        eprintln!("{}", e.user_message());
                        break;
                    }
                }
            }

            print!("{}", FeedView::from_snapshot(&fetcher.snapshot()));
        }

        Command::Locations => {
            let store = open_store(cli.demo, &config)?;
            let locations = store.distinct_locations().await.inspect_err(|e| {
                eprintln!("{}", e.user_message());
            })?;
            if locations.is_empty() {
                println!("No locations yet");
            }
            for location in locations {
                println!("{}", location);
            }
        }

        Command::Validate => {
            if config.backend.url.is_empty() || config.backend.anon_key.is_empty() {
                log::warn!("Backend url or anon_key not set; only --demo will work");
            }
            println!("✓ Config OK");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_args_use_wire_names() {
        let cli = Cli::try_parse_from([
            "jobfeed", "feed", "--type", "full-time", "--type", "part-time", "--mode", "remote",
            "--level", "mid", "--posted", "24h", "--sort", "salary_high",
        ])
        .unwrap();

        let Command::Feed {
            job_types,
            work_modes,
            levels,
            posted,
            sort,
            ..
        } = cli.command
        else {
            panic!("expected the feed command");
        };
        assert_eq!(job_types, vec![JobType::FullTime, JobType::PartTime]);
        assert_eq!(work_modes, vec![WorkMode::Remote]);
        assert_eq!(levels, vec![ExperienceLevel::Mid]);
        assert_eq!(posted, DatePosted::Day);
        assert_eq!(sort, SortOrder::SalaryHigh);
    }

    #[test]
    fn test_feed_defaults_and_rejections() {
        let cli = Cli::try_parse_from(["jobfeed", "feed"]).unwrap();
        let Command::Feed { posted, sort, .. } = cli.command else {
            panic!("expected the feed command");
        };
        assert_eq!(posted, DatePosted::All);
        assert_eq!(sort, SortOrder::Newest);

        assert!(Cli::try_parse_from(["jobfeed", "feed", "--type", "freelance"]).is_err());
        assert!(Cli::try_parse_from(["jobfeed", "feed", "--salary-min", "800"]).is_err());
    }
}
