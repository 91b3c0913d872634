//! Refinement loop: generate, scan, critique, decide, repeat.

use anyhow::{Result, bail};
use tracing::{info, instrument};

use crate::agents::Agents;
use crate::core::drafter::DraftRequest;
use crate::core::types::{Agent, CriticNote, HaltRule, LogKind, SafetyFlag, Status, Verdict};
use crate::io::pacer::{Pacer, Stage};
use crate::session::Session;

/// Result of a single refinement cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Iteration number (1-indexed, never reset by revisions).
    pub iteration: u32,
    pub flags: Vec<SafetyFlag>,
    pub notes: Vec<CriticNote>,
    pub verdict: Verdict,
}

/// Summary of a loop invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    pub started_at_iteration: u32,
    pub cycles_executed: u32,
    /// Rule that handed the session to human review.
    pub halt: HaltRule,
    pub reason: String,
}

/// Run one cycle against a drafting session.
///
/// On a halting verdict the session moves to `paused`; otherwise it stays in
/// `drafting` after the inter-cycle pause.
#[instrument(skip_all, fields(iteration = session.iteration() + 1))]
pub fn run_cycle<P: Pacer>(session: &mut Session, agents: &Agents, pacer: &P) -> Result<CycleOutcome> {
    if session.status() != Status::Drafting {
        bail!(
            "cannot run a refinement cycle while session is {}",
            session.status().as_str()
        );
    }
    let pacing = agents.pacing();

    // A drafter error must leave the session untouched.
    let draft = agents.draft(&DraftRequest {
        intent: session.intent(),
        feedback: session.latest_feedback(),
    })?;

    let iteration = session.begin_iteration();
    session.log(Agent::System, LogKind::Info, format!("Starting iteration {iteration}"));

    session.log(Agent::Drafter, LogKind::Info, "Generating CBT exercise draft...");
    pacer.pause(Stage::Drafting, pacing.delay(Stage::Drafting));
    session.record_draft(draft.clone());
    session.log(Agent::Drafter, LogKind::Success, "Draft generated successfully");

    session.log(Agent::Safety, LogKind::Info, "Analyzing draft for safety concerns...");
    pacer.pause(Stage::Scanning, pacing.delay(Stage::Scanning));
    let flags = agents.scan(&draft);
    session.replace_safety_flags(flags.clone());
    if flags.is_empty() {
        session.log(Agent::Safety, LogKind::Success, "No safety concerns detected");
    } else {
        session.log(
            Agent::Safety,
            LogKind::Warning,
            format!("Found {} safety flag(s)", flags.len()),
        );
    }

    session.log(Agent::Critic, LogKind::Info, "Evaluating clinical quality and empathy...");
    pacer.pause(Stage::Critiquing, pacing.delay(Stage::Critiquing));
    let notes = agents.critique(&draft, &flags);
    session.replace_critic_notes(notes.clone());
    if notes.is_empty() {
        session.log(Agent::Critic, LogKind::Success, "Draft meets quality standards");
    } else {
        session.log(
            Agent::Critic,
            LogKind::Info,
            format!("Generated {} improvement suggestion(s)", notes.len()),
        );
    }

    session.log(
        Agent::Supervisor,
        LogKind::Info,
        "Evaluating whether to continue refinement or pause for human review...",
    );
    pacer.pause(Stage::Deciding, pacing.delay(Stage::Deciding));
    let verdict = agents.decide(iteration, &flags, &notes);
    let verdict_kind = if verdict.should_continue {
        LogKind::Info
    } else {
        LogKind::Success
    };
    session.log(Agent::Supervisor, verdict_kind, verdict.reason.clone());

    if verdict.should_continue {
        session.log(Agent::System, LogKind::Info, "Initiating next refinement cycle...");
        pacer.pause(Stage::CycleGap, pacing.delay(Stage::CycleGap));
    } else {
        session.set_status(Status::Paused);
        session.log(Agent::System, LogKind::Success, "Protocol ready for human review");
    }

    Ok(CycleOutcome {
        iteration,
        flags,
        notes,
        verdict,
    })
}

/// Run cycles until the supervisor halts, calling `on_cycle` after each one.
///
/// Always terminates: the iteration counter only grows and the supervisor
/// halts at its iteration cap.
pub fn run_loop<P: Pacer, F: FnMut(&CycleOutcome)>(
    session: &mut Session,
    agents: &Agents,
    pacer: &P,
    mut on_cycle: F,
) -> Result<LoopOutcome> {
    if session.status() != Status::Drafting {
        bail!(
            "cannot start refinement while session is {}",
            session.status().as_str()
        );
    }
    let started_at_iteration = session.iteration() + 1;

    let mut cycles_executed = 0u32;
    loop {
        let cycle = run_cycle(session, agents, pacer)?;
        cycles_executed += 1;
        on_cycle(&cycle);

        if let Some(halt) = cycle.verdict.halt {
            info!(
                started_at_iteration,
                cycles_executed,
                ?halt,
                "refinement paused for human review"
            );
            return Ok(LoopOutcome {
                started_at_iteration,
                cycles_executed,
                halt,
                reason: cycle.verdict.reason,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::core::drafter::{Drafter, DrafterOptions};
    use crate::core::types::Severity;
    use crate::io::config::FoundryConfig;
    use crate::io::pacer::InstantPacer;
    use crate::test_support::RecordingPacer;

    fn agents() -> Agents {
        Agents::from_config(&FoundryConfig::default()).expect("agents")
    }

    fn drafting_session(intent: &str) -> Session {
        let mut session = Session::new();
        session.set_intent(intent.to_string());
        session.set_status(Status::Drafting);
        session
    }

    #[test]
    fn clean_intent_halts_after_one_cycle() {
        let mut session = drafting_session("Managing anxiety in social situations");
        let outcome = run_loop(&mut session, &agents(), &InstantPacer, |_| {}).expect("loop");

        assert_eq!(outcome.started_at_iteration, 1);
        assert_eq!(outcome.cycles_executed, 1);
        assert_eq!(outcome.halt, HaltRule::QualityThreshold);
        assert_eq!(
            outcome.reason,
            "Quality threshold met. Draft ready for human review."
        );
        assert_eq!(session.status(), Status::Paused);
        assert_eq!(session.iteration(), 1);
        assert_eq!(session.previous_drafts().len(), 1);
        assert!(session.safety_flags().is_empty());
        assert!(session.critic_notes().is_empty());
    }

    #[test]
    fn heavily_flagged_intent_loops_until_iteration_cap() {
        let mut session = drafting_session("a weapon, suicide and the urge to kill");
        let mut seen = Vec::new();
        let outcome = run_loop(&mut session, &agents(), &InstantPacer, |cycle| {
            seen.push(cycle.iteration);
        })
        .expect("loop");

        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
        assert_eq!(outcome.cycles_executed, 5);
        assert_eq!(outcome.halt, HaltRule::MaxIterations);
        assert_eq!(session.previous_drafts().len(), 5);
        let keywords: Vec<&str> = session
            .safety_flags()
            .iter()
            .map(|f| f.keyword.as_str())
            .collect();
        assert_eq!(keywords, vec!["kill", "suicide", "weapon"]);
        assert_eq!(session.critic_notes().len(), 1);
        assert_eq!(session.critic_notes()[0].section, "safety");
    }

    #[test]
    fn single_high_flag_halts_on_second_iteration() {
        let mut session = drafting_session("urges to kill the noise in my head");
        let outcome = run_loop(&mut session, &agents(), &InstantPacer, |_| {}).expect("loop");

        assert_eq!(outcome.cycles_executed, 2);
        assert_eq!(outcome.halt, HaltRule::AcceptableQuality);
        assert_eq!(session.safety_flags().len(), 1);
        assert_eq!(session.safety_flags()[0].severity, Severity::High);
    }

    #[test]
    fn cycle_logs_follow_causal_order() {
        let mut session = drafting_session("test");
        run_cycle(&mut session, &agents(), &InstantPacer).expect("cycle");

        let lines: Vec<(Agent, &str)> = session
            .logs()
            .iter()
            .map(|l| (l.agent, l.message.as_str()))
            .collect();
        assert_eq!(
            lines,
            vec![
                (Agent::System, "Starting iteration 1"),
                (Agent::Drafter, "Generating CBT exercise draft..."),
                (Agent::Drafter, "Draft generated successfully"),
                (Agent::Safety, "Analyzing draft for safety concerns..."),
                (Agent::Safety, "No safety concerns detected"),
                (Agent::Critic, "Evaluating clinical quality and empathy..."),
                (Agent::Critic, "Draft meets quality standards"),
                (
                    Agent::Supervisor,
                    "Evaluating whether to continue refinement or pause for human review..."
                ),
                (
                    Agent::Supervisor,
                    "Quality threshold met. Draft ready for human review."
                ),
                (Agent::System, "Protocol ready for human review"),
            ]
        );
    }

    #[test]
    fn pauses_happen_between_steps_in_order() {
        let mut session = drafting_session("thoughts of death");
        let pacer = RecordingPacer::default();
        run_cycle(&mut session, &agents(), &pacer).expect("cycle");

        assert_eq!(
            pacer.stages(),
            vec![
                Stage::Drafting,
                Stage::Scanning,
                Stage::Critiquing,
                Stage::Deciding,
                Stage::CycleGap,
            ]
        );
        assert_eq!(pacer.pauses()[0].1, Duration::from_millis(1500));
        assert_eq!(session.status(), Status::Drafting);
    }

    #[test]
    fn halting_cycle_skips_cycle_gap() {
        let mut session = drafting_session("test");
        let pacer = RecordingPacer::default();
        run_cycle(&mut session, &agents(), &pacer).expect("cycle");
        assert!(!pacer.stages().contains(&Stage::CycleGap));
    }

    #[test]
    fn drafter_failure_leaves_session_untouched() {
        let broken = Drafter::from_sources(
            DrafterOptions::default(),
            [
                ("introduction", "{% include \"missing.txt\" %}"),
                ("cognitive_restructuring", "{{ intent }}"),
                ("behavioral_activation", "{{ intent }}"),
                ("exposure", "{{ intent }}"),
                ("reflection", "{{ intent }}"),
            ],
        )
        .expect("templates parse");
        let agents = agents().with_drafter(broken);
        let mut session = drafting_session("stress");
        let pacer = RecordingPacer::default();

        assert!(run_cycle(&mut session, &agents, &pacer).is_err());
        assert_eq!(session.iteration(), 0);
        assert!(session.logs().is_empty());
        assert!(session.previous_drafts().is_empty());
        assert!(pacer.stages().is_empty());
        assert_eq!(session.status(), Status::Drafting);
    }

    #[test]
    fn loop_refuses_non_drafting_session() {
        let mut session = Session::new();
        let err = run_loop(&mut session, &agents(), &InstantPacer, |_| {}).unwrap_err();
        assert!(err.to_string().contains("session is idle"));
        assert_eq!(session.iteration(), 0);
    }
}
