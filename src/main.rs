use std::{env, process};

use anyhow::Context;
use chrono::Local;
use clap::{Arg, ArgMatches, Command};
use tracing_subscriber::EnvFilter;

mod gitlet;

use gitlet::{
    base::{Repository, Status, DEFAULT_BRANCH},
    config::{Config, LOG_ENV},
    diff::Change,
    error::GitletError,
    merge::MergeOutcome,
    object::Commit,
    Digest, GITLET_DIR,
};

fn cli() -> Command {
    Command::new(clap::crate_name!())
        .about(clap::crate_description!())
        .version(clap::crate_version!())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("init")
                .about("Create a new repository in the current directory")
                .arg(
                    Arg::new("initial-branch")
                        .long("initial-branch")
                        .short('b')
                        .default_value(DEFAULT_BRANCH),
                ),
        )
        .subcommand(
            Command::new("add")
                .about("Stage a file for the next commit")
                .arg(Arg::new("path").required(true)),
        )
        .subcommand(
            Command::new("commit")
                .about("Record the staged changes")
                .arg(Arg::new("message").required(true)),
        )
        .subcommand(
            Command::new("rm")
                .about("Unstage a file, deleting it if it is tracked")
                .arg(Arg::new("path").required(true)),
        )
        .subcommand(Command::new("log").about("Show the current branch's history"))
        .subcommand(Command::new("global-log").about("Show every commit ever made"))
        .subcommand(
            Command::new("find")
                .about("Print the ids of commits with the given message")
                .arg(Arg::new("message").required(true)),
        )
        .subcommand(Command::new("status").about("Show branches, staging and working tree changes"))
        .subcommand(
            Command::new("checkout")
                .about("Restore a file, or switch branches")
                .override_usage(
                    "gitlet checkout -- <path>\n       \
                     gitlet checkout <commit> -- <path>\n       \
                     gitlet checkout <branch>",
                )
                .arg(Arg::new("target"))
                .arg(Arg::new("path").last(true)),
        )
        .subcommand(
            Command::new("branch")
                .about("Create a branch at the current commit")
                .arg(Arg::new("name").required(true)),
        )
        .subcommand(
            Command::new("rm-branch")
                .about("Delete a branch pointer")
                .arg(Arg::new("name").required(true)),
        )
        .subcommand(
            Command::new("reset")
                .about("Move the current branch to a commit")
                .arg(Arg::new("commit").required(true)),
        )
        .subcommand(
            Command::new("merge")
                .about("Merge a branch into the current branch")
                .arg(Arg::new("branch").required(true)),
        )
}

fn main() {
    let matches = cli().get_matches();

    if let Err(err) = run(&matches) {
        match err.downcast_ref::<GitletError>() {
            Some(user_err) if user_err.is_user_error() => {
                println!("{}", user_err);
                process::exit(0);
            }
            _ => {
                eprintln!("error: {:#}", err);
                process::exit(1);
            }
        }
    }
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&config.log.filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let cwd = env::current_dir().context("failed to get current directory")?;

    if let Some(("init", matches)) = matches.subcommand() {
        init_logging(&Config::default());
        let branch = string_arg(matches, "initial-branch");
        Repository::init(&cwd, branch)?;
        return Ok(());
    }

    // Logging should honour the repository's config even when opening it fails.
    let config = Config::load(&cwd.join(GITLET_DIR)).unwrap_or_default();
    init_logging(&config);

    let mut repo = Repository::open(&cwd)?;
    match matches.subcommand() {
        Some(("add", m)) => repo.add(string_arg(m, "path"))?,
        Some(("commit", m)) => {
            repo.commit(string_arg(m, "message"))?;
        }
        Some(("rm", m)) => repo.remove(string_arg(m, "path"))?,
        Some(("log", _)) => print_log(&repo, &repo.log()?),
        Some(("global-log", _)) => print_log(&repo, &repo.global_log()?),
        Some(("find", m)) => {
            let abbrev = repo.config().abbrev();
            for digest in repo.find(string_arg(m, "message"))? {
                println!("{}", digest.abbrev(abbrev));
            }
        }
        Some(("status", _)) => print_status(&repo.status()?, repo.config()),
        Some(("checkout", m)) => checkout(&mut repo, m)?,
        Some(("branch", m)) => repo.branch(string_arg(m, "name"))?,
        Some(("rm-branch", m)) => repo.delete_branch(string_arg(m, "name"))?,
        Some(("reset", m)) => {
            let digest = repo.resolve_commit(string_arg(m, "commit"))?;
            repo.reset(&digest)?;
        }
        Some(("merge", m)) => match repo.merge(string_arg(m, "branch"))? {
            MergeOutcome::AlreadyUpToDate => {
                println!("Given branch is an ancestor of the current branch.")
            }
            MergeOutcome::FastForwarded(_) => println!("Current branch fast-forwarded."),
            MergeOutcome::Merged(_) => {}
            MergeOutcome::Conflicted(_) => println!("Encountered a merge conflict."),
        },
        _ => unreachable!("clap requires a known subcommand"),
    }

    repo.save().context("failed to save repository state")?;
    Ok(())
}

fn string_arg<'a>(matches: &'a ArgMatches, name: &str) -> &'a str {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .unwrap_or_default()
}

fn checkout(repo: &mut Repository, matches: &ArgMatches) -> anyhow::Result<()> {
    let target = matches.get_one::<String>("target");
    let path = matches.get_one::<String>("path");
    match (target, path) {
        (None, Some(path)) => repo.checkout_file(path, None)?,
        (Some(commit), Some(path)) => {
            let digest = repo.resolve_commit(commit)?;
            repo.checkout_file(path, Some(&digest))?;
        }
        (Some(branch), None) => repo.checkout_branch(branch)?,
        (None, None) => return Err(GitletError::IncorrectOperands.into()),
    }
    Ok(())
}

fn print_log(repo: &Repository, commits: &[(Digest, Commit)]) {
    let abbrev = repo.config().abbrev();
    for (digest, commit) in commits {
        println!("===");
        println!("commit {}", digest.abbrev(abbrev));
        println!(
            "Date: {}",
            commit
                .timestamp
                .with_timezone(&Local)
                .format("%a %b %-d %H:%M:%S %Y %z")
        );
        println!("{}", commit.message);
        println!();
    }
}

fn print_status(status: &Status, config: &Config) {
    println!("=== Branches ===");
    for branch in &status.branches {
        if *branch == status.current_branch {
            print!("*");
        }
        println!("{}", branch);
    }
    println!();

    println!("=== Staged Files ===");
    status.staged.iter().for_each(|path| println!("{}", path));
    println!();

    println!("=== Removed Files ===");
    status.removed.iter().for_each(|path| println!("{}", path));
    println!();

    println!("=== Modifications Not Staged For Commit ===");
    for (path, change) in &status.modified {
        let label = match change {
            Change::Deleted => "deleted",
            _ => "modified",
        };
        println!("{} ({})", path, label);
    }
    println!();

    println!("=== Untracked Files ===");
    if config.display.show_untracked {
        status.untracked.iter().for_each(|path| println!("{}", path));
    }
    println!();
}
