use std::env;
use std::path::PathBuf;

use anyhow::Context;
use dotenv::dotenv;
use quiz_admin::constants::{question_type_name, APP_NAME, APP_VERSION, OTHERS_CATEGORY};
use quiz_admin::DataManager;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";
const ROOT_ENV: &str = "QUIZ_ADMIN_ROOT";
const USAGE: &str = "Usage: quiz-admin [--root <dir>] [list | check <subject> | stats <subject> | \
                     new <subject> | backup <subject> | export <subject> <path> | migrate <subject>]";

#[derive(Debug, PartialEq)]
pub enum Command {
    List,
    Check(String),
    Stats(String),
    New(String),
    Backup(String),
    Export(String, PathBuf),
    Migrate(String),
}

#[derive(Debug, PartialEq)]
pub struct Config {
    pub root: PathBuf,
    pub command: Command,
}

fn parse_config(
    mut args: impl Iterator<Item = String>,
    default_root: Option<String>,
) -> anyhow::Result<Config> {
    let mut root = PathBuf::from(default_root.unwrap_or_else(|| ".".to_string()));
    let mut rest = Vec::new();
    while let Some(arg) = args.next() {
        if arg == "--root" {
            root = args.next().context("--root needs a directory")?.into();
        } else {
            rest.push(arg);
        }
    }

    let mut rest = rest.into_iter();
    let command = match rest.next().as_deref() {
        None | Some("list") => Command::List,
        Some(name) => {
            let subject = rest
                .next()
                .with_context(|| format!("'{name}' needs a subject name"))?;
            match name {
                "check" => Command::Check(subject),
                "stats" => Command::Stats(subject),
                "new" => Command::New(subject),
                "backup" => Command::Backup(subject),
                "migrate" => Command::Migrate(subject),
                "export" => {
                    let path = rest.next().context("'export' needs a destination path")?;
                    Command::Export(subject, path.into())
                }
                other => anyhow::bail!("unknown command '{other}'"),
            }
        }
    };

    Ok(Config { root, command })
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = match parse_config(env::args().skip(1), env::var(ROOT_ENV).ok()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{USAGE}");
            return Err(e);
        }
    };

    let manager = DataManager::new(&config.root);
    match config.command {
        Command::List => list(&manager),
        Command::Check(name) => check(&manager, &name),
        Command::Stats(name) => stats(&manager, &name),
        Command::New(name) => {
            let subject = manager
                .create_subject(&name)
                .context(format!("failed to create subject {name}"))?;
            println!("created {BOLD}{name}{RESET} at {}", subject.filename());
            Ok(())
        }
        Command::Backup(name) => {
            let subject = manager.load_subject(&name).context("failed to load subject")?;
            let backup = manager
                .backup_subject(&subject)
                .context(format!("failed to back up subject {name}"))?;
            println!("backup written to {BOLD}{}{RESET}", backup.display());
            Ok(())
        }
        Command::Export(name, path) => {
            let subject = manager.load_subject(&name).context("failed to load subject")?;
            manager
                .export_subject(&subject, &path)
                .context(format!("failed to export subject {name}"))?;
            println!("exported {BOLD}{name}{RESET} to {}", path.display());
            Ok(())
        }
        Command::Migrate(name) => {
            let report = manager
                .migrate_subject_to_latest(&name)
                .context(format!("failed to migrate subject {name}"))?;
            if !report.needs_rewrite() {
                println!("{name} is already up-to-date");
            } else {
                println!("{}", serde_yaml_ng::to_string(&report)?);
            }
            Ok(())
        }
    }
}

fn list(manager: &DataManager) -> anyhow::Result<()> {
    println!("{APP_NAME} {APP_VERSION}\n");
    let subjects = manager
        .discover_subjects()
        .context("failed to scan questions folder")?;
    if subjects.is_empty() {
        println!("no subjects found in {}", manager.questions_dir().display());
    }
    for name in subjects.keys() {
        match manager.load_subject(name) {
            Ok(subject) => println!(
                "{BOLD}{name}{RESET}: {} lessons, {} questions",
                subject.lessons().len(),
                subject.questions().len()
            ),
            Err(e) => println!("{BOLD}{name}{RESET}: {e}"),
        }
    }
    Ok(())
}

fn check(manager: &DataManager, name: &str) -> anyhow::Result<()> {
    manager
        .validate_json_file(&manager.subject_path(name))
        .context(format!("{name} is not a valid subject file"))?;
    let subject = manager.load_subject(name).context("failed to load subject")?;

    let mut failures = 0;
    for (index, lesson) in subject.lessons().iter().enumerate() {
        if let Err(e) = lesson.validate() {
            failures += 1;
            println!("lesson {} ({}): {e}", index + 1, lesson.id);
        }
    }
    for question in subject.questions() {
        let label = question_type_name(question.type_name()).unwrap_or(question.type_name());
        if let Err(e) = question.validate() {
            failures += 1;
            println!("q{} ({label}): {e}", question.id);
        }
        if question.lesson_id.is_some() && subject.bucket_of(question).is_none() {
            println!(
                "q{} ({label}): lesson is missing, listed under {OTHERS_CATEGORY}",
                question.id
            );
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} lesson(s) or question(s) in {name} failed validation");
    }
    println!(
        "{BOLD}{}{RESET} lessons and {BOLD}{}{RESET} questions in {BOLD}{name}{RESET} are valid",
        subject.lessons().len(),
        subject.questions().len()
    );
    Ok(())
}

fn stats(manager: &DataManager, name: &str) -> anyhow::Result<()> {
    let subject = manager.load_subject(name).context("failed to load subject")?;
    let stats = manager.subject_statistics(&subject);
    let content = serde_yaml_ng::to_string(&stats).context("failed to serialize statistics")?;

    println!("---");
    println!("{}", content);
    println!("---");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> impl Iterator<Item = String> {
        items
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn no_command_lists() {
        let config = parse_config(args(&[]), None).unwrap();
        assert_eq!(config.command, Command::List);
        assert_eq!(config.root, PathBuf::from("."));
    }

    #[test]
    fn root_flag_overrides_environment() {
        let config = parse_config(
            args(&["stats", "geo", "--root", "/data"]),
            Some("/env".to_string()),
        )
        .unwrap();
        assert_eq!(config.root, PathBuf::from("/data"));
        assert_eq!(config.command, Command::Stats("geo".into()));

        let config = parse_config(args(&["check", "geo"]), Some("/env".into())).unwrap();
        assert_eq!(config.root, PathBuf::from("/env"));
    }

    #[test]
    fn export_needs_a_path() {
        assert!(parse_config(args(&["export", "geo"]), None).is_err());
        let config = parse_config(args(&["export", "geo", "out/geo.json"]), None).unwrap();
        assert_eq!(
            config.command,
            Command::Export("geo".into(), PathBuf::from("out/geo.json"))
        );
    }

    #[test]
    fn unknown_command_is_an_error() {
        assert!(parse_config(args(&["frobnicate", "geo"]), None).is_err());
        assert!(parse_config(args(&["new"]), None).is_err());
    }
}
