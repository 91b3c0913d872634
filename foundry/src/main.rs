//! Protocol foundry CLI.
//!
//! Drives one session through the refinement loop from the terminal: submit
//! an intent, let the agents iterate until the supervisor pauses, apply any
//! revision requests in order and finally approve the draft.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use foundry::agents::Agents;
use foundry::core::drafter::DraftRequest;
use foundry::core::types::{CriticNote, Draft, LogEntry, SafetyFlag, Verdict};
use foundry::io::config::{FoundryConfig, load_config, write_config};
use foundry::io::pacer::{PacingConfig, ThreadPacer};
use foundry::io::report::{SessionReport, write_report};
use foundry::looping::CycleOutcome;
use foundry::session::Session;
use foundry::{CommandError, Foundry, exit_codes, logging};

const DEFAULT_CONFIG: &str = "foundry.toml";

#[derive(Parser)]
#[command(
    name = "foundry",
    version,
    about = "Deterministic multi-agent refinement loop for CBT exercises"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Refine a draft for INTENT until human review, then approve it.
    Run {
        intent: String,
        /// Request a revision at review time. Repeat to apply several in order.
        #[arg(long = "revise", value_name = "FEEDBACK")]
        revisions: Vec<String>,
        /// Stop at human review instead of approving.
        #[arg(long)]
        hold: bool,
        /// Skip simulated agent latency.
        #[arg(long)]
        no_delay: bool,
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
        /// Print the session as JSON.
        #[arg(long)]
        json: bool,
        /// Also write a JSON audit report to this path.
        #[arg(long, value_name = "PATH")]
        export: Option<PathBuf>,
    },
    /// Draft once for INTENT and show flags, notes and the supervisor verdict.
    Scan {
        intent: String,
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Write the default configuration file.
    InitConfig {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        path: PathBuf,
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(()) => exit_codes::OK,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_code_for(&err)
        }
    };
    std::process::exit(code);
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<CommandError>().is_some() {
        exit_codes::REJECTED
    } else {
        exit_codes::INVALID
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            intent,
            revisions,
            hold,
            no_delay,
            config,
            json,
            export,
        } => cmd_run(&RunArgs {
            intent: &intent,
            revisions: &revisions,
            hold,
            no_delay,
            config: &config,
            json,
            export: export.as_deref(),
        }),
        Command::Scan {
            intent,
            config,
            json,
        } => cmd_scan(&intent, &config, json),
        Command::InitConfig { path, force } => cmd_init_config(&path, force),
    }
}

struct RunArgs<'a> {
    intent: &'a str,
    revisions: &'a [String],
    hold: bool,
    no_delay: bool,
    config: &'a Path,
    json: bool,
    export: Option<&'a Path>,
}

fn cmd_run(args: &RunArgs<'_>) -> Result<()> {
    let mut cfg = load_config(args.config)?;
    if args.no_delay {
        cfg.pacing = PacingConfig::none();
    }
    let mut foundry = Foundry::new(&cfg, ThreadPacer)?;

    foundry.submit_intent(args.intent)?;
    let quiet = args.json;
    let progress = |cycle: &CycleOutcome| {
        if !quiet {
            print_cycle(cycle);
        }
    };

    foundry.begin_processing_with(progress)?;
    for feedback in args.revisions {
        foundry.request_revision_with(feedback, progress)?;
    }
    if !args.hold {
        foundry.approve_draft()?;
    }

    let session = foundry.session();
    if let Some(path) = args.export {
        write_report(path, &SessionReport::new(session))?;
    }
    if args.json {
        print!("{}", SessionReport::new(session).to_json()?);
    } else {
        print_session(session);
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScanReport {
    draft: Draft,
    safety_flags: Vec<SafetyFlag>,
    critic_notes: Vec<CriticNote>,
    verdict: Verdict,
}

fn cmd_scan(intent: &str, config: &Path, json: bool) -> Result<()> {
    let intent = intent.trim();
    if intent.is_empty() {
        return Err(CommandError::EmptyIntent.into());
    }
    let cfg = load_config(config)?;
    let agents = Agents::from_config(&cfg)?;

    let draft = agents.draft(&DraftRequest {
        intent,
        feedback: None,
    })?;
    let safety_flags = agents.scan(&draft);
    let critic_notes = agents.critique(&draft, &safety_flags);
    let verdict = agents.decide(1, &safety_flags, &critic_notes);
    let report = ScanReport {
        draft,
        safety_flags,
        critic_notes,
        verdict,
    };

    if json {
        let buf = serde_json::to_string_pretty(&report).context("serialize scan report")?;
        println!("{buf}");
    } else {
        print_draft(&report.draft);
        print_findings(&report.safety_flags, &report.critic_notes);
        println!("verdict: {}", report.verdict.reason);
    }
    Ok(())
}

fn cmd_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("{} already exists (use --force to overwrite)", path.display());
        return Ok(());
    }
    write_config(path, &FoundryConfig::default())?;
    println!("wrote {}", path.display());
    Ok(())
}

fn print_cycle(cycle: &CycleOutcome) {
    println!(
        "iteration {}: {} safety flag(s), {} critic note(s). {}",
        cycle.iteration,
        cycle.flags.len(),
        cycle.notes.len(),
        cycle.verdict.reason
    );
}

fn print_session(session: &Session) {
    println!();
    println!(
        "status: {} (iteration {}, {} draft(s) archived)",
        session.status().as_str(),
        session.iteration(),
        session.previous_drafts().len()
    );
    if let Some(draft) = session.draft() {
        println!();
        print_draft(draft);
    }
    print_findings(session.safety_flags(), session.critic_notes());
    if !session.revision_feedback().is_empty() {
        println!("revision feedback:");
        for (idx, feedback) in session.revision_feedback().iter().enumerate() {
            println!("  {}. {feedback}", idx + 1);
        }
    }
    println!("activity log:");
    for entry in session.logs() {
        println!("  {}", format_log(entry));
    }
}

fn print_draft(draft: &Draft) {
    println!("# {}", draft.title);
    for (name, text) in draft.sections.named() {
        println!();
        println!("## {name}");
        println!("{text}");
    }
    println!();
}

fn print_findings(flags: &[SafetyFlag], notes: &[CriticNote]) {
    if flags.is_empty() {
        println!("safety flags: none");
    } else {
        println!("safety flags:");
        for flag in flags {
            println!(
                "  - {} [{}] ...{}...",
                flag.keyword,
                flag.severity.as_str(),
                flag.context
            );
        }
    }
    if notes.is_empty() {
        println!("critic notes: none");
    } else {
        println!("critic notes:");
        for note in notes {
            println!("  - {}: {}", note.section, note.suggestion);
        }
    }
}

fn format_log(entry: &LogEntry) -> String {
    format!(
        "{} {:<10} {}",
        entry.timestamp.format("%H:%M:%S"),
        entry.agent.as_str(),
        entry.message
    )
}
