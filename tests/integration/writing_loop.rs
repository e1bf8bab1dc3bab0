//! End-to-end tests for the writing loop through the public session API

use crate::integration::test_utils::{sequential_config, session_with, ScriptedProvider};
use quill::error::WriterError;
use quill::prompts;
use quill::provider::Backend;
use quill::roles::TaskRole;
use quill::state::RunState;
use quill::writer::{
    Aggregator, Resolution, RunBudget, TaskOutput, TurnOutcome, Verdict, WriterConfig,
};
use quill::history::ConversationHistory;
use std::sync::Arc;
use std::time::Duration;

fn output(role: TaskRole, iteration: u32, content: &str) -> TaskOutput {
    TaskOutput {
        role,
        iteration,
        content: content.to_string(),
        instruction: "revise".to_string(),
    }
}

#[tokio::test]
async fn test_single_candidate_passes_through_for_both_roles() {
    let provider = Arc::new(ScriptedProvider::new());
    let backend = Backend::new(provider.clone());
    let mut state = RunState {
        iteration: 4,
        ..RunState::default()
    };

    let report = Aggregator::new()
        .aggregate(
            &backend,
            vec![
                output(TaskRole::Outline, 4, "# Exact outline\n"),
                output(TaskRole::Section, 4, "Exact body, untouched.  "),
            ],
            &mut state,
            &ConversationHistory::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.outline, Resolution::PassedThrough);
    assert_eq!(report.document, Resolution::PassedThrough);
    assert_eq!(state.outline, "# Exact outline\n");
    assert_eq!(state.document, "Exact body, untouched.  ");
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn test_stale_outputs_never_become_candidates() {
    let provider = Arc::new(ScriptedProvider::replies(&["Merged body"]));
    let backend = Backend::new(provider.clone());
    let mut state = RunState {
        iteration: 3,
        outline: "# Outline".to_string(),
        document: "Old body".to_string(),
    };

    let report = Aggregator::new()
        .aggregate(
            &backend,
            vec![
                output(TaskRole::Section, 2, "STALE SECTION"),
                output(TaskRole::Outline, 1, "# STALE OUTLINE"),
                output(TaskRole::Section, 3, "Fresh A"),
                output(TaskRole::Section, 3, "Fresh B"),
            ],
            &mut state,
            &ConversationHistory::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.stale_dropped, 2);
    assert_eq!(report.outline, Resolution::Unchanged);
    assert_eq!(report.document, Resolution::Merged { candidates: 2 });
    assert_eq!(provider.request_count(), 1);
    let merge_prompt = provider.user_prompt(0);
    assert!(!merge_prompt.contains("STALE"));
    assert_eq!(state.outline, "# Outline");
    assert_eq!(state.document, "Merged body");
}

#[tokio::test]
async fn test_malformed_plan_line_is_dropped() {
    let provider = Arc::new(ScriptedProvider::replies(&[
        "Outline Writer;9;Create an outline about gardening\nSection Writer;5",
        "# Gardening",
        "RETURN TO REQUESTING AGENT",
    ]));
    let mut session = session_with(provider.clone(), WriterConfig::default());

    session
        .handle("Write an outline about gardening", RunBudget::unlimited())
        .await
        .unwrap();

    assert_eq!(
        provider.system_prompts(),
        vec![
            prompts::PLANNER_SYSTEM.to_string(),
            prompts::OUTLINE_TASK_SYSTEM.to_string(),
            prompts::JUDGE_SYSTEM.to_string(),
        ]
    );
    assert!(provider
        .user_prompt(1)
        .contains("Create an outline about gardening"));
}

#[tokio::test]
async fn test_iteration_cap_terminates_persistent_keep_editing() {
    let provider = Arc::new(ScriptedProvider::new().when("CHECK LIST", "KEEP EDITING"));
    let config = WriterConfig {
        max_extra_iterations: 1,
        ..WriterConfig::default()
    };
    let mut session = session_with(provider.clone(), config);

    let report = session
        .handle("Write about the sea", RunBudget::unlimited())
        .await
        .unwrap();

    assert_eq!(report.iterations, 2);
    let planner_calls = provider
        .system_prompts()
        .iter()
        .filter(|p| p.as_str() == prompts::PLANNER_SYSTEM)
        .count();
    assert_eq!(planner_calls, 2);
    let judgement = report.judgement.unwrap();
    assert_eq!(judgement.verdict, Verdict::Done);
    assert!(judgement.forced_by_cap);
}

#[tokio::test]
async fn test_follow_up_turn_starts_from_previous_state() {
    let provider = Arc::new(ScriptedProvider::replies(&[
        "Outline Writer;9;Outline boxes\nSection Writer;8;Write about boxes",
        "# Boxes",
        "Boxes have a long history.",
        "RETURN TO REQUESTING AGENT",
        "",
        "RETURN TO REQUESTING AGENT",
    ]));
    let mut session = session_with(provider.clone(), sequential_config());

    session
        .handle("Tell me about boxes", RunBudget::unlimited())
        .await
        .unwrap();
    assert_eq!(session.state().outline, "# Boxes");
    assert_eq!(session.state().document, "Boxes have a long history.");

    let report = session
        .handle("Please add a section on cardboard", RunBudget::unlimited())
        .await
        .unwrap();

    let second_planner_prompt = provider.user_prompt(4);
    assert!(second_planner_prompt.contains("# Boxes"));
    assert!(second_planner_prompt.contains("Boxes have a long history."));
    assert!(second_planner_prompt.contains("user: Please add a section on cardboard"));
    assert_eq!(
        report.outcome,
        TurnOutcome::Complete("Boxes have a long history.".to_string())
    );
    assert_eq!(session.history().len(), 4);
}

#[tokio::test]
async fn test_outline_request_continues_into_section_iteration() {
    let provider = Arc::new(ScriptedProvider::replies(&[
        "Outline Writer;9;Create an outline about gardening",
        "# Gardening\n## Soil\n## Water",
        "- Article is empty: KEEP EDITING",
        "Section Writer;9;Write every section in the outline",
        "# Gardening\n## Soil\nRich soil.\n## Water\nWater often.",
        "RETURN TO REQUESTING AGENT",
    ]));
    let mut session = session_with(provider.clone(), WriterConfig::default());

    let report = session
        .handle("Write an outline about gardening", RunBudget::unlimited())
        .await
        .unwrap();

    assert_eq!(report.iterations, 2);
    let systems = provider.system_prompts();
    assert_eq!(systems[1], prompts::OUTLINE_TASK_SYSTEM);
    assert_eq!(systems[4], prompts::SECTION_TASK_SYSTEM);
    assert!(provider.user_prompt(4).contains("## Water"));
    assert_eq!(
        report.document(),
        Some("# Gardening\n## Soil\nRich soil.\n## Water\nWater often.")
    );
}

#[tokio::test]
async fn test_two_section_outputs_need_exactly_one_merge() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .when("Controller Decision", "Section Writer;8;Write the intro\nSection Writer;7;Write the history")
            .when("Write the intro", "Intro draft")
            .when("Write the history", "History draft")
            .when("PARTIAL ARTICLES", "Intro and history, merged")
            .when("CHECK LIST", "RETURN TO REQUESTING AGENT"),
    );
    let mut session = session_with(provider.clone(), WriterConfig::default());

    session
        .handle("Tell me about box manufacturing", RunBudget::unlimited())
        .await
        .unwrap();

    let merges: Vec<usize> = provider
        .system_prompts()
        .iter()
        .enumerate()
        .filter(|(_, p)| p.as_str() == prompts::DOCUMENT_MERGE_SYSTEM)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(merges.len(), 1);
    let merge_prompt = provider.user_prompt(merges[0]);
    assert!(merge_prompt.contains("Intro draft"));
    assert!(merge_prompt.contains("History draft"));
    assert_eq!(session.state().document, "Intro and history, merged");
}

#[tokio::test]
async fn test_empty_plan_still_invokes_judge_on_unchanged_state() {
    let provider = Arc::new(ScriptedProvider::replies(&["", "RETURN TO REQUESTING AGENT"]));
    let mut session = session_with(provider.clone(), WriterConfig::default())
        .with_state(RunState {
            iteration: 7,
            outline: "# Kept".to_string(),
            document: "Kept body".to_string(),
        });

    let report = session
        .handle("Anything else?", RunBudget::unlimited())
        .await
        .unwrap();

    assert_eq!(
        provider.system_prompts(),
        vec![
            prompts::PLANNER_SYSTEM.to_string(),
            prompts::JUDGE_SYSTEM.to_string()
        ]
    );
    assert!(provider.user_prompt(1).contains("Kept body"));
    assert_eq!(session.state().iteration, 8);
    assert_eq!(session.state().outline, "# Kept");
    assert_eq!(report.document(), Some("Kept body"));
}

#[tokio::test]
async fn test_backend_failure_is_reported() {
    let provider = Arc::new(
        ScriptedProvider::replies(&["Section Writer;8;Write it"])
            .then_fail(WriterError::ProviderRequestFailed("connection reset".into())),
    );
    let mut session = session_with(provider, WriterConfig::default());

    let err = session
        .handle("Write about bees", RunBudget::unlimited())
        .await
        .unwrap_err();
    assert!(err.is_backend());
    assert!(matches!(err, WriterError::TaskFailed { role: TaskRole::Section, .. }));
}

#[tokio::test(start_paused = true)]
async fn test_time_budget_yields_pending_with_readable_state() {
    let provider = Arc::new(
        ScriptedProvider::replies(&["", "KEEP EDITING"]).with_delay(Duration::from_secs(5)),
    );
    let mut session = session_with(provider, WriterConfig::default()).with_state(RunState {
        iteration: 0,
        outline: "# Start".to_string(),
        document: "Start body".to_string(),
    });

    let report = session
        .handle(
            "Write about bees",
            RunBudget::unlimited().with_time(Duration::from_secs(7)),
        )
        .await
        .unwrap();

    assert!(report.is_pending());
    assert_eq!(session.state().document, "Start body");
    assert_eq!(session.history().len(), 1);
}
