use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::warn;

use crate::config::{self, AppConfig};
use crate::interpret::Interpreter;
use crate::model::task::TaskRecord;
use crate::model::tracker::Team;
use crate::parser;
use crate::runlog;
use crate::sync::{self, SyncEvent, SyncSummary};
use crate::tracker::Tracker;

const RULE: &str = "================================================================================";
const DEFAULT_LOG_LIMIT: usize = 20;
const YES_ANSWERS: &[&str] = &["s", "si", "sí", "y", "yes"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(RunOptions),
    Parse { path: PathBuf },
    Log { limit: usize },
    Help,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub input_file: Option<PathBuf>,
    pub structured_file: Option<PathBuf>,
    pub team: Option<String>,
    pub assume_yes: bool,
    pub dry_run: bool,
}

/// Parse everything after the binary name.
///
/// Supported forms:
///   tasksync [run] [--file PATH] [--structured PATH] [--team KEY] [--yes] [--dry-run]
///   tasksync parse PATH
///   tasksync log [-n N]
///   tasksync help
pub fn parse_args(args: &[String]) -> Result<Command> {
    let Some(first) = args.first() else {
        return Ok(Command::Run(RunOptions::default()));
    };

    match first.as_str() {
        "help" | "-h" | "--help" => Ok(Command::Help),
        "run" => parse_run_args(&args[1..]).map(Command::Run),
        "parse" => match &args[1..] {
            [path] => Ok(Command::Parse {
                path: PathBuf::from(path),
            }),
            _ => bail!("Usage: tasksync parse <file>"),
        },
        "log" => parse_log_args(&args[1..]),
        flag if flag.starts_with('-') => parse_run_args(args).map(Command::Run),
        other => bail!("Unknown command: {other}. Run `tasksync help` for usage."),
    }
}

fn parse_run_args(args: &[String]) -> Result<RunOptions> {
    let mut opts = RunOptions::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-f" | "--file" => opts.input_file = Some(PathBuf::from(flag_value(&mut iter, arg)?)),
            "-s" | "--structured" => {
                opts.structured_file = Some(PathBuf::from(flag_value(&mut iter, arg)?))
            }
            "-t" | "--team" => opts.team = Some(flag_value(&mut iter, arg)?),
            "-y" | "--yes" => opts.assume_yes = true,
            "--dry-run" => opts.dry_run = true,
            other => bail!("Unknown option: {other}"),
        }
    }

    if opts.input_file.is_some() && opts.structured_file.is_some() {
        bail!("--file and --structured cannot be used together");
    }
    Ok(opts)
}

fn parse_log_args(args: &[String]) -> Result<Command> {
    let mut limit = DEFAULT_LOG_LIMIT;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-n" | "--limit" => {
                let value = flag_value(&mut iter, arg)?;
                limit = value
                    .parse()
                    .with_context(|| format!("Invalid value for {arg}: {value}"))?;
            }
            other => bail!("Unknown option: {other}"),
        }
    }
    Ok(Command::Log { limit })
}

fn flag_value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<String> {
    match iter.next() {
        Some(v) => Ok(v.clone()),
        None => bail!("Missing value for {flag}"),
    }
}

pub fn print_help() {
    println!("tasksync — turn a free-form request into tracker issues\n");
    println!("USAGE:");
    println!("  tasksync [run] [OPTIONS]   Interpret text, then create the issues");
    println!("  tasksync parse <file>      Print the tasks found in structured text as JSON");
    println!("  tasksync log [-n N]        Show the last N activity log entries");
    println!();
    println!("RUN OPTIONS:");
    println!("  -f, --file <path>        Read the free-form text from a file instead of stdin");
    println!("  -s, --structured <path>  Skip interpretation and read structured text");
    println!("  -t, --team <key>         Select the team by key or name");
    println!("  -y, --yes                Create without asking for confirmation");
    println!("      --dry-run            Parse and show the tasks, create nothing");
    println!();
    println!("ENVIRONMENT:");
    println!("  {}   tracker API key", config::LINEAR_KEY_VAR);
    println!("  {}   interpreter API key", config::OPENAI_KEY_VAR);
}

pub async fn handle_run(opts: &RunOptions) -> Result<()> {
    let config = config::load_config()?;
    let tracker = if opts.dry_run {
        None
    } else {
        Some(config.linear_client()?)
    };

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();

    let structured = structured_text(opts, &config, &mut input, &mut out).await?;
    let tasks = extract_tasks(&structured, &mut out)?;

    let Some(tracker) = tracker else {
        for task in &tasks {
            write_task(&mut out, task)?;
        }
        return Ok(());
    };

    let log_path = runlog::log_path();
    sync_run(
        &tasks,
        opts,
        &tracker,
        Some(log_path.as_path()),
        &mut input,
        &mut out,
    )
    .await?;
    Ok(())
}

async fn structured_text<R: BufRead, W: Write>(
    opts: &RunOptions,
    config: &AppConfig,
    input: &mut R,
    out: &mut W,
) -> Result<String> {
    if let Some(path) = &opts.structured_file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }

    let interpreter = config.interpreter()?;
    let text = match &opts.input_file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => read_paste(input, out)?,
    };
    if text.trim().is_empty() {
        bail!("Nothing to interpret: the input text is empty");
    }

    writeln!(out, "\nInterpreting with {}...", interpreter.name())?;
    interpreter.interpret(&text).await
}

/// Show the structured text and parse it. Finding no tasks ends the run.
pub fn extract_tasks<W: Write>(structured: &str, out: &mut W) -> Result<Vec<TaskRecord>> {
    writeln!(out, "\n{RULE}\nSTRUCTURED TASKS\n{RULE}\n{structured}\n{RULE}\n")?;

    let tasks = parser::parse(structured);
    if tasks.is_empty() {
        bail!("No tasks could be extracted from the text. Check its format.");
    }
    writeln!(out, "Found {} task(s) to create.\n", tasks.len())?;
    Ok(tasks)
}

/// Team selection, confirmation and the sync itself. `None` when cancelled.
pub async fn sync_run<R: BufRead, W: Write>(
    tasks: &[TaskRecord],
    opts: &RunOptions,
    tracker: &dyn Tracker,
    log_path: Option<&Path>,
    input: &mut R,
    out: &mut W,
) -> Result<Option<SyncSummary>> {
    writeln!(out, "Fetching {} teams...", tracker.name())?;
    let teams = tracker
        .list_teams()
        .await
        .context("Failed to list teams")?;
    if teams.is_empty() {
        bail!("No teams available in {}", tracker.name());
    }

    let team = match &opts.team {
        Some(wanted) => find_team(&teams, wanted)
            .with_context(|| format!("No team matches '{wanted}'"))?,
        None => select_team(&teams, input, out)?,
    };

    if !opts.assume_yes {
        let question = format!("Create these {} issue(s) in {}?", tasks.len(), team.name);
        if !confirm(&question, input, out)? {
            writeln!(out, "Cancelled.")?;
            return Ok(None);
        }
    }

    writeln!(out, "\nCreating issues in {}...\n", team.name)?;
    let mut on_event = |event: &SyncEvent| {
        if let Err(e) = write_event(&mut *out, event) {
            warn!(error = %e, "could not write progress");
        }
        if let Some(path) = log_path {
            let logged = runlog::new_entry(Some(&team.key), event)
                .and_then(|entry| runlog::append_entry(path, &entry));
            if let Err(e) = logged {
                warn!(error = %e, "could not append to activity log");
            }
        }
    };
    let summary = sync::sync_tasks(tracker, &team.id, tasks, &mut on_event).await?;

    writeln!(out, "\n{RULE}")?;
    writeln!(
        out,
        "Done: {} of {} issue(s) created",
        summary.created(),
        summary.attempted()
    )?;
    for (title, message) in summary.failures() {
        writeln!(out, "  failed: {title}: {message}")?;
    }
    writeln!(out, "{RULE}")?;
    Ok(Some(summary))
}

pub fn handle_parse(path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let tasks = parser::parse(&text);
    println!("{}", serde_json::to_string_pretty(&tasks)?);
    Ok(())
}

pub fn handle_log(limit: usize) -> Result<()> {
    let entries = runlog::read_entries(&runlog::log_path(), Some(limit));
    if entries.is_empty() {
        println!("No activity recorded yet.");
    }
    for entry in &entries {
        println!("{}", runlog::describe(entry));
    }
    Ok(())
}

pub fn find_team<'a>(teams: &'a [Team], wanted: &str) -> Option<&'a Team> {
    teams
        .iter()
        .find(|t| t.key.eq_ignore_ascii_case(wanted) || t.name.eq_ignore_ascii_case(wanted))
}

/// Numbered prompt; asks again until a valid number is entered.
pub fn select_team<'a, R: BufRead, W: Write>(
    teams: &'a [Team],
    input: &mut R,
    out: &mut W,
) -> Result<&'a Team> {
    writeln!(out, "\nAvailable teams:")?;
    for (i, team) in teams.iter().enumerate() {
        writeln!(out, "{}. {} (key: {})", i + 1, team.name, team.key)?;
    }

    loop {
        write!(out, "\nSelect a team (1-{}): ", teams.len())?;
        out.flush()?;
        let answer = read_answer(input)?;
        match answer.parse::<usize>() {
            Ok(n) if (1..=teams.len()).contains(&n) => return Ok(&teams[n - 1]),
            Ok(_) => writeln!(out, "Please enter a number between 1 and {}", teams.len())?,
            Err(_) => writeln!(out, "Please enter a valid number")?,
        }
    }
}

pub fn confirm<R: BufRead, W: Write>(question: &str, input: &mut R, out: &mut W) -> Result<bool> {
    write!(out, "{question} (y/n): ")?;
    out.flush()?;
    let answer = read_answer(input)?.to_lowercase();
    Ok(YES_ANSWERS.contains(&answer.as_str()))
}

pub fn read_paste<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<String> {
    writeln!(out, "\nPaste the conversation or description, then press Ctrl-D:")?;
    out.flush()?;
    let mut text = String::new();
    input
        .read_to_string(&mut text)
        .context("Failed to read input")?;
    Ok(text)
}

fn read_answer<R: BufRead>(input: &mut R) -> Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line).context("Failed to read input")? == 0 {
        bail!("Input closed before an answer was given");
    }
    Ok(line.trim().to_string())
}

fn write_task<W: Write>(out: &mut W, task: &TaskRecord) -> io::Result<()> {
    writeln!(out, "- {} [{}] ({})", task.title, task.priority, task.project)?;
    if !task.tags.is_empty() {
        writeln!(out, "  tags: {}", task.tags.join(", "))?;
    }
    Ok(())
}

fn write_event<W: Write>(out: &mut W, event: &SyncEvent) -> io::Result<()> {
    match event {
        SyncEvent::ProjectsLoaded { count } => {
            writeln!(out, "Found {count} existing project(s)")
        }
        SyncEvent::ProjectsUnavailable { message } => {
            writeln!(out, "Warning: could not list projects: {message}")
        }
        SyncEvent::CreatingProject { name } => writeln!(out, "  Creating project: {name}..."),
        SyncEvent::ProjectCreated { .. } => writeln!(out, "    project created"),
        SyncEvent::ProjectFailed { message, .. } => {
            writeln!(out, "    could not create project: {message}")
        }
        SyncEvent::CreatingIssue {
            index,
            total,
            title,
            project,
        } => {
            let short: String = title.chars().take(50).collect();
            writeln!(out, "[{index}/{total}] Creating issue: {short}...")?;
            if let Some(project) = project {
                writeln!(out, "  -> Project: {project}")?;
            }
            Ok(())
        }
        SyncEvent::IssueCreated { issue, .. } => writeln!(out, "  created: {}", issue.url),
        SyncEvent::IssueFailed { message, .. } => writeln!(out, "  error: {message}"),
    }
}
