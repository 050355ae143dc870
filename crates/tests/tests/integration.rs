//! End-to-end tests for the compile-and-train pipeline.
//!
//! These tests drive the full chain:
//! Resolve → Classify → Regenerate → Schedule → Train → Verify artifacts
//! across consecutive runs against the same artifact directory.

use cognate_ldsl_ast::{Name, PreExtract, Program, Rounds};
use cognate_revision::RevisionStatus;
use cognate_tests::{TestHarness, classifier, learner, with_learner};

/// Classifier A plus learner B using A as its feature extractor.
fn scenario_program() -> Program {
    Program::new(vec![
        classifier("caps", 1, "return capitalized(t);", &[]),
        learner("tagger", 5, "caps"),
    ])
}

#[test]
fn test_first_run_builds_everything() {
    let harness = TestHarness::new();
    let program = scenario_program();

    let report = harness.compile(&program);

    assert!(report.is_success());
    assert!(!report.no_changes());
    assert_eq!(
        report.revision.status(&Name::from("caps")),
        RevisionStatus::Revised
    );
    assert_eq!(
        report.revision.status(&Name::from("tagger")),
        RevisionStatus::Revised
    );

    let outcome = report.outcome.expect("training ran");
    assert_eq!(outcome.trained, vec![Name::from("tagger")]);

    // Generated sources and trained artifacts are on disk
    let store = harness.store();
    assert!(store.source_path(&Name::from("caps")).exists());
    assert!(store.source_path(&Name::from("tagger")).exists());
    assert!(store.model_path(&Name::from("tagger")).exists());
    assert!(store.lexicon_path(&Name::from("tagger")).exists());
}

#[test]
fn test_second_run_is_a_no_op() {
    let harness = TestHarness::new();
    let program = scenario_program();

    harness.compile(&program);
    harness.clear_events();

    let second = harness.compile(&program);

    assert!(second.is_success());
    assert!(second.no_changes());
    assert!(second.outcome.is_none());
    for (_, status) in second.revision.statuses() {
        assert_eq!(status, RevisionStatus::Unaffected);
    }
    // The scheduler dispatched nothing
    assert!(harness.events().is_empty());
}

#[test]
fn test_upstream_edit_retrains_dependent_learner() {
    let harness = TestHarness::new();
    harness.compile(&scenario_program());
    harness.clear_events();

    // caps gets a new body; tagger itself is untouched
    let edited = Program::new(vec![
        classifier("caps", 1, "return all_caps(t);", &[]),
        learner("tagger", 5, "caps"),
    ]);
    let report = harness.compile(&edited);

    assert!(report.is_success());
    assert_eq!(
        report.revision.status(&Name::from("caps")),
        RevisionStatus::Revised
    );
    assert_eq!(
        report.revision.status(&Name::from("tagger")),
        RevisionStatus::Affected
    );

    let facets = report.revision.learner(&Name::from("tagger")).unwrap();
    assert!(facets.features >= RevisionStatus::Affected);
    assert!(facets.learning >= RevisionStatus::Affected);

    let outcome = report.outcome.expect("training ran");
    assert_eq!(outcome.trained, vec![Name::from("tagger")]);
    assert!(harness.events().contains(&"tagger:begin:fresh".to_string()));
}

#[test]
fn test_reformatting_keeps_the_fast_path() {
    let harness = TestHarness::new();
    harness.compile(&scenario_program());

    // Same canonical specification, different surface formatting
    let reformatted = Program::new(vec![
        classifier(
            "caps",
            1,
            "  return\n      capitalized(t);   // surface edit",
            &[],
        ),
        learner("tagger", 5, "caps"),
    ]);
    let report = harness.compile(&reformatted);

    assert!(report.no_changes());
    assert!(report.outcome.is_none());
}

#[test]
fn test_round_increase_resumes_instead_of_restarting() {
    let harness = TestHarness::new();
    let mut program = scenario_program();
    with_learner(&mut program, "tagger", |l| {
        l.pre_extract = PreExtract::Disk { compressed: false };
        l.rounds = Some(Rounds::Fixed(3));
    });
    harness.compile(&program);
    harness.clear_events();

    with_learner(&mut program, "tagger", |l| {
        l.rounds = Some(Rounds::Fixed(8));
    });
    let report = harness.compile(&program);

    let facets = report.revision.learner(&Name::from("tagger")).unwrap();
    assert_eq!(facets.features, RevisionStatus::Unaffected);
    assert_eq!(facets.learning, RevisionStatus::Revised);
    assert_eq!(facets.starting_round, 4);

    let events = harness.events();
    assert!(events.contains(&"tagger:begin:resume@4".to_string()));
    assert!(events.contains(&"tagger:train:4..8".to_string()));
    // Features were not re-extracted
    assert!(!events.contains(&"tagger:pre_extract:train".to_string()));
}

#[test]
fn test_cycle_trains_earlier_declaration_first() {
    let harness = TestHarness::concurrent();
    // l1 (declared first) and l2 reach each other through the
    // intermediate classifier mid
    let program = Program::new(vec![
        learner("l1", 1, "mid"),
        classifier("mid", 3, "return l2(t);", &["l2"]),
        learner("l2", 5, "l1"),
    ]);

    let report = harness.compile(&program);

    assert!(report.is_success());
    let outcome = report.outcome.expect("training ran");
    assert_eq!(outcome.trained, vec![Name::from("l1"), Name::from("l2")]);
}

#[test]
fn test_concurrent_run_trains_independent_learners() {
    let harness = TestHarness::concurrent();
    let program = Program::new(vec![
        classifier("word", 1, "return word(t);", &[]),
        learner("chunker", 5, "word"),
        learner("tagger", 9, "word"),
    ]);

    let report = harness.compile(&program);

    assert!(report.is_success());
    let outcome = report.outcome.expect("training ran");
    assert_eq!(outcome.trained.len(), 2);

    // Third run after no edits: nothing left to do
    let again = harness.compile(&program);
    assert!(again.no_changes());
}

#[test]
fn test_hand_edited_generated_file_fails_without_overwriting() {
    let harness = TestHarness::new();
    let program = scenario_program();
    harness.compile(&program);

    let store = harness.store();
    let caps_path = store.source_path(&Name::from("caps"));
    std::fs::write(&caps_path, "// hand-edited\nfn caps() {}\n").unwrap();

    // Force a change so the run would regenerate caps if it could
    let edited = Program::new(vec![
        classifier("caps", 1, "return all_caps(t);", &[]),
        learner("tagger", 5, "caps"),
    ]);
    let report = harness.compile(&edited);

    assert!(!report.is_success());
    assert!(report.outcome.is_none());
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].message.contains("does not appear"));

    // The hand-edited file was left alone
    let contents = std::fs::read_to_string(&caps_path).unwrap();
    assert!(contents.starts_with("// hand-edited"));
}

#[test]
fn test_unresolved_reference_reports_before_training() {
    let harness = TestHarness::new();
    let program = Program::new(vec![
        classifier("caps", 1, "return ghost(t);", &["ghost"]),
        learner("tagger", 5, "caps"),
    ]);

    let report = harness.compile(&program);

    assert!(!report.is_success());
    assert!(report.outcome.is_none());
    assert!(report.errors[0].message.contains("undefined name 'ghost'"));
    assert!(harness.events().is_empty());
}

#[test]
fn test_propagation_is_monotonic_across_a_chain() {
    let harness = TestHarness::new();
    let chain = |body: &str| {
        Program::new(vec![
            classifier("a", 1, body, &[]),
            classifier("b", 2, "return a(t);", &["a"]),
            classifier("c", 3, "return b(t);", &["b"]),
            learner("l", 7, "c"),
        ])
    };
    harness.compile(&chain("return 1;"));

    let report = harness.compile(&chain("return 2;"));

    // Every declaration downstream of the edit is at least affected
    for name in ["b", "c", "l"] {
        assert!(
            report.revision.status(&Name::from(name)) >= RevisionStatus::Affected,
            "{name} was left unaffected"
        );
    }
    assert_eq!(report.revision.status(&Name::from("a")), RevisionStatus::Revised);
}
