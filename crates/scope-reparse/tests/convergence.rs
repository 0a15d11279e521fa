use pretty_assertions::assert_eq;
use proptest::prelude::*;
use scope_reparse::{
    DocumentSession, FlushPolicy, ReparseConfig, SchedulerState, ScopeRegion,
};

const PIECES: &[&str] = &[
    "/*", "*/", "{", "}", "\"", "\n", "//", "x", "\"\"\"", " ", "\\", "'", "\r", "\r\n",
];

#[derive(Debug, Clone)]
struct Edit {
    position: usize,
    delete: usize,
    pieces: Vec<usize>,
    cycles_after: usize,
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    (
        any::<usize>(),
        0usize..6,
        prop::collection::vec(0..PIECES.len(), 0..5),
        0usize..3,
    )
        .prop_map(|(position, delete, pieces, cycles_after)| Edit {
            position,
            delete,
            pieces,
            cycles_after,
        })
}

fn text_of(pieces: &[usize]) -> String {
    pieces.iter().map(|&i| PIECES[i]).collect()
}

/// Small windows and a tiny unit cap so edits land in the middle of unfinished work.
fn interleaving_config() -> ReparseConfig {
    ReparseConfig::default()
        .with_max_unit_chars(3)
        .with_max_units_per_cycle(Some(3))
}

fn replay(initial: &str, edits: &[Edit]) -> DocumentSession {
    let mut session = DocumentSession::new(initial, interleaving_config());
    session.run_cycle();

    for edit in edits {
        let len = session.buffer().len_chars();
        let start = edit.position % (len + 1);
        let end = (start + edit.delete).min(len);
        session
            .apply_edit(start..end, &text_of(&edit.pieces))
            .unwrap();
        for _ in 0..edit.cycles_after {
            session.run_cycle();
        }
    }

    session.run_until_idle(100_000);
    session
}

/// Replays `edits` publishing after every cycle, flipping highlighting after each edit whose
/// flag is set. Highlighting is switched back on before draining.
fn replay_toggling(initial: &str, edits: &[Edit], toggles: &[bool]) -> DocumentSession {
    let config = interleaving_config().with_flush_policy(FlushPolicy::EveryCycle);
    let mut session = DocumentSession::new(initial, config);
    session.run_cycle();

    for (edit, &toggle) in edits.iter().zip(toggles.iter().chain(std::iter::repeat(&false))) {
        let len = session.buffer().len_chars();
        let start = edit.position % (len + 1);
        let end = (start + edit.delete).min(len);
        session
            .apply_edit(start..end, &text_of(&edit.pieces))
            .unwrap();
        if toggle {
            let enabled = session.config().highlighting_enabled;
            session.set_highlighting_enabled(!enabled);
        }
        for _ in 0..edit.cycles_after {
            session.run_cycle();
        }
    }

    session.set_highlighting_enabled(true);
    session.run_until_idle(100_000);
    session
}

fn settled(text: &str) -> DocumentSession {
    let mut session = DocumentSession::new(text, ReparseConfig::default());
    session.run_until_idle(100_000);
    session
}

fn assert_converged(session: &DocumentSession) {
    let fresh = settled(&session.text());

    assert_eq!(session.scheduler_state(), SchedulerState::Idle);
    assert!(session.queue().is_empty());
    assert_eq!(session.parser().stale_count(), 0);
    assert_eq!(
        session.parser().line_count(),
        session.buffer().line_count()
    );

    for line in 0..session.buffer().line_count() {
        assert_eq!(
            session.line_state(line),
            fresh.line_state(line),
            "line {line} of {:?}",
            session.text()
        );
    }
    assert_eq!(session.scope_regions(), fresh.scope_regions());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_edits_converge_to_a_full_parse(
        initial in prop::collection::vec(0..PIECES.len(), 0..40),
        edits in prop::collection::vec(edit_strategy(), 1..25),
    ) {
        let session = replay(&text_of(&initial), &edits);
        assert_converged(&session);
    }

    #[test]
    fn every_cycle_flushes_and_toggles_converge(
        initial in prop::collection::vec(0..PIECES.len(), 0..40),
        edits in prop::collection::vec(edit_strategy(), 1..25),
        toggles in prop::collection::vec(any::<bool>(), 0..25),
    ) {
        let session = replay_toggling(&text_of(&initial), &edits, &toggles);
        assert!(session.config().highlighting_enabled);
        assert_converged(&session);
    }

    #[test]
    fn replaying_edits_is_deterministic(
        initial in prop::collection::vec(0..PIECES.len(), 0..40),
        edits in prop::collection::vec(edit_strategy(), 1..15),
    ) {
        let first = replay(&text_of(&initial), &edits);
        let second = replay(&text_of(&initial), &edits);

        let first_regions: Vec<ScopeRegion> = first.get_scope_regions();
        prop_assert_eq!(first_regions, second.get_scope_regions());
        prop_assert_eq!(first.text(), second.text());
    }
}

#[test]
fn crlf_documents_converge() {
    let mut session = DocumentSession::new("a {\r\n/* b\r\n} */\r\n}", interleaving_config());
    session.run_until_idle(1_000);

    session.apply_edit(5..5, "x\r").unwrap();
    session.apply_edit(2..3, "").unwrap();
    session.run_until_idle(1_000);
    assert_converged(&session);
}

#[test]
fn line_feed_after_lone_carriage_return_converges() {
    let mut session = DocumentSession::new("\"'//", ReparseConfig::default());
    session.apply_edit(0..2, "\\\r\n\r").unwrap();
    session.run_cycle();
    session.apply_edit(4..4, "\n ").unwrap();
    session.run_until_idle(10);

    assert_converged(&session);
    let ranges: Vec<_> = session
        .scope_regions()
        .iter()
        .map(|region| region.range.clone())
        .collect();
    assert_eq!(ranges, vec![6..8]);
}

#[test]
fn deleting_everything_converges() {
    let mut session = DocumentSession::new("{\n/*\n}\n", interleaving_config());
    session.run_cycle();
    let len = session.buffer().len_chars();
    session.apply_edit(0..len, "").unwrap();
    session.run_until_idle(1_000);

    assert_converged(&session);
    assert!(session.scope_regions().is_empty());
}
