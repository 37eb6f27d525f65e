use std::time::{Duration, Instant};

use assert_matches::assert_matches;
use dreamshelf::app::{Confirmation, NoticeLevel, Outcome, Transition, ViewState};
use dreamshelf::search::{SortKey, SortOrder, SortSpec};
use dreamshelf::{DreamRecord, HistoryRepository, MemoryHistory};

fn seed() -> Vec<DreamRecord> {
    vec![
        DreamRecord::new("a", "Lanterns drifting over a frozen lake", "poetic", "2024-04-01T07:00:00Z")
            .collected_at("2024-04-02T07:00:00Z"),
        DreamRecord::new("b", "A cat teaching calculus", "humorous", "2024-04-03T07:00:00Z")
            .collected_at("2024-04-03T09:00:00Z"),
        DreamRecord::new("c", "Doors that open onto yesterday", "philosophical", "2024-04-04T07:00:00Z"),
        DreamRecord::new("d", "Lake of stars", "fantasy", "2024-04-05T07:00:00Z")
            .collected_at("2024-04-06T07:00:00Z"),
    ]
}

fn shown(repo: &MemoryHistory) -> ViewState {
    let mut state = ViewState::new(
        SortSpec::default(),
        Duration::from_millis(300),
        Duration::from_secs(2),
    );
    state.on_show(repo);
    state
}

fn ids(state: &ViewState) -> Vec<String> {
    state.collection().iter().map(|r| r.id.to_string()).collect()
}

#[test]
fn typing_burst_applies_only_the_final_keyword() {
    let repo = MemoryHistory::new(seed());
    let mut state = shown(&repo);
    assert_eq!(ids(&state), vec!["d", "b", "a"]);
    let before = state.revision();
    let start = Instant::now();

    for (ms, text) in [(0u64, "l"), (120, "la"), (240, "lak")] {
        state.apply(Transition::SearchInput {
            text: text.to_string(),
            at: start + Duration::from_millis(ms),
        });
        state.apply(Transition::Tick {
            at: start + Duration::from_millis(ms + 100),
        });
    }
    assert_eq!(state.revision(), before);
    assert_eq!(ids(&state), vec!["d", "b", "a"]);

    state.apply(Transition::Tick {
        at: start + Duration::from_millis(540),
    });
    assert_eq!(state.revision(), before + 1);
    assert_eq!(ids(&state), vec!["d", "a"]);
}

#[test]
fn sorting_by_type_and_length() {
    let repo = MemoryHistory::new(seed());
    let state = shown(&repo)
        .reduce(Transition::SortBy(SortKey::Type))
        .reduce(Transition::SortOrder(SortOrder::Asc));
    assert_eq!(ids(&state), vec!["d", "b", "a"]);

    let state = state.reduce(Transition::SortBy(SortKey::Length));
    assert_eq!(ids(&state), vec!["d", "b", "a"]);
    let state = state.reduce(Transition::SortOrder(SortOrder::Desc));
    assert_eq!(ids(&state), vec!["a", "b", "d"]);
}

#[test]
fn stale_view_cannot_resurrect_deleted_records() {
    let repo = MemoryHistory::new(seed());
    let mut state = shown(&repo);
    state.request_delete();
    assert_eq!(
        state.confirmation,
        Some(Confirmation::Delete { id: "d".into() })
    );

    // Another writer removes "d" while the dialog is open.
    let others: Vec<_> = repo.snapshot().into_iter().filter(|r| r.id != "d").collect();
    repo.replace(others);

    let outcome = state.confirm(&repo);
    assert_eq!(outcome, Some(Outcome::Missing));
    assert_eq!(repo.save_count(), 0);
    assert_eq!(ids(&state), vec!["b", "a"]);
    assert_eq!(
        state.notice.as_ref().map(|n| n.level),
        Some(NoticeLevel::Info)
    );
}

#[test]
fn collect_round_trip_restores_the_stored_record() {
    let repo = MemoryHistory::new(seed());
    let original = repo.snapshot();
    let mut state = shown(&repo);

    state.request_toggle_collect();
    assert_matches!(
        state.confirmation,
        Some(Confirmation::Collect { ref id, collect: false }) if id == "d"
    );
    state.confirm(&repo);
    assert_eq!(ids(&state), vec!["b", "a"]);

    let mut restored = repo.snapshot();
    restored[3] = restored[3].with_collected(true, "2024-04-06T07:00:00Z");
    assert_eq!(restored, original);
}

#[test]
fn read_failure_degrades_to_empty_collection() -> anyhow::Result<()> {
    let repo = MemoryHistory::new(seed());
    repo.set_fail_reads(true);
    let mut state = shown(&repo);
    assert!(state.collection().is_empty());
    assert_eq!(
        state.notice.as_ref().map(|n| n.level),
        Some(NoticeLevel::Error)
    );

    repo.set_fail_reads(false);
    state.on_show(&repo);
    assert_eq!(state.collection().len(), 3);
    assert_eq!(repo.load()?.len(), 4);
    Ok(())
}
