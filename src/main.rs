use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use course_index::config;
use course_index::model::Level;
use course_index::visibility::{BuildMode, ModeSource};
use course_index::{ContentIndex, FsStore};

#[derive(Debug, Parser)]
#[command(author, version, about = "Query the blog and course content index")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = config::DEFAULT_PATH)]
    config: PathBuf,

    /// Treat the build as production (drafts hidden, cache kept)
    #[arg(long)]
    production: bool,

    /// Show drafts even in production
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List visible courses, newest first
    Courses {
        /// Only courses at this level (Beginner, Intermediate, Advanced)
        #[arg(long)]
        level: Option<String>,
    },
    /// Show a course with its sections and lessons
    Course { slug: String },
    /// List the sections of a course
    Sections { course: String },
    /// List every lesson of a course in reading order
    Lessons { course: String },
    /// Show previous/next lessons around a lesson
    Navigation { course: String, lesson: String },
    /// Combined timeline of posts, courses and lessons
    Archive,
    /// Main feed with the pinned course first
    Feed,
    /// Tags on visible posts with their counts
    Tags,
    /// Load all content and report invalid records
    Check,
    /// Print a documented example configuration
    ExampleConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    if matches!(args.command, Command::ExampleConfig) {
        print!("{}", config::example());
        return Ok(());
    }

    let cfg = config::load(Some(&args.config))?;
    let base = args.config.parent().unwrap_or_else(|| Path::new("."));
    let content_dir = cfg.content_dir(base);

    let mode = if args.production || args.debug {
        let mut mode = BuildMode::from_env();
        if args.production {
            mode.production = Some(true);
        }
        if args.debug {
            mode.debug = Some(true);
        }
        ModeSource::Fixed(mode)
    } else {
        ModeSource::Env
    };
    info!(content = %content_dir.display(), ?mode, "opening content index");

    let index = ContentIndex::from_config(&cfg, Arc::new(FsStore::new(content_dir)), mode);
    run(&index, args.command).await?;

    info!(cache = %index.cache().stats().await, "done");
    Ok(())
}

async fn run(index: &ContentIndex, command: Command) -> Result<()> {
    match command {
        Command::Courses { level } => match level {
            Some(level) => print_json(&index.courses_by_level(parse_level(&level)?).await?),
            None => print_json(&index.list_courses().await?),
        },
        Command::Course { slug } => {
            let bundle = index
                .get_course_bundle(&slug)
                .await?
                .ok_or_else(|| anyhow!("course '{}' not found", slug))?;
            print_json(&bundle)
        }
        Command::Sections { course } => print_json(&index.list_sections(&course).await?),
        Command::Lessons { course } => {
            print_json(&index.list_all_lessons_for_course(&course).await?)
        }
        Command::Navigation { course, lesson } => {
            let nav = index
                .get_lesson_navigation(&course, &lesson)
                .await?
                .ok_or_else(|| anyhow!("lesson '{}' not found in course '{}'", lesson, course))?;
            print_json(&nav)
        }
        Command::Archive => print_json(&index.get_combined_archive().await?),
        Command::Feed => print_json(&index.get_feed_with_pinned_course().await?),
        Command::Tags => print_json(&index.tag_counts().await?),
        Command::Check => check(index).await,
        Command::ExampleConfig => {
            print!("{}", config::example());
            Ok(())
        }
    }
}

async fn check(index: &ContentIndex) -> Result<()> {
    let skipped = index.validate_all().await?;
    if skipped.is_empty() {
        println!("Content is valid");
        return Ok(());
    }
    for s in &skipped {
        warn!(kind = s.kind.as_str(), slug = %s.slug, reason = %s.reason, "invalid content");
    }
    print_json(&skipped)?;
    bail!("{} invalid content file(s)", skipped.len())
}

fn parse_level(raw: &str) -> Result<Level> {
    [Level::Beginner, Level::Intermediate, Level::Advanced]
        .into_iter()
        .find(|l| l.as_str().eq_ignore_ascii_case(raw))
        .ok_or_else(|| anyhow!("unknown level '{}'", raw))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
