//! Property tests for the bounded undo/redo history.

use proptest::prelude::*;
use sketch_core::{History, Snapshot};

#[derive(Debug, Clone, Copy)]
enum Command {
    Commit(u8),
    Undo,
    Redo,
}

fn command() -> impl Strategy<Value = Command> {
    prop_oneof![
        3 => any::<u8>().prop_map(Command::Commit),
        2 => Just(Command::Undo),
        1 => Just(Command::Redo),
    ]
}

fn snapshot(shade: u8) -> Snapshot {
    Snapshot::filled(1, 1, [shade, shade, shade, 255])
}

fn check_cursor(history: &History) -> Result<(), TestCaseError> {
    if history.is_empty() {
        prop_assert!(!history.can_undo());
        prop_assert!(!history.can_redo());
        prop_assert!(history.current().is_none());
    } else {
        prop_assert!(history.position() < history.len());
        prop_assert_eq!(history.can_undo(), history.position() != 0);
        prop_assert_eq!(history.can_redo(), history.position() != history.len() - 1);
    }
    prop_assert!(history.len() <= history.capacity());
    Ok(())
}

proptest! {
    #[test]
    fn cursor_invariants_hold(capacity in 1_usize..12, commands in prop::collection::vec(command(), 0..200)) {
        let mut history = History::with_capacity(capacity);
        for cmd in commands {
            match cmd {
                Command::Commit(shade) => {
                    let snap = snapshot(shade);
                    history.commit(snap.clone());
                    prop_assert_eq!(history.current(), Some(&snap));
                    prop_assert!(!history.can_redo());
                }
                Command::Undo => {
                    history.undo();
                }
                Command::Redo => {
                    history.redo();
                }
            }
            check_cursor(&history)?;
        }
    }

    #[test]
    fn undo_then_redo_restores_current(count in 2_usize..60) {
        let mut history = History::new();
        for i in 0..count {
            history.commit(snapshot((i % 256) as u8));
        }

        let before = history.current().cloned();
        prop_assert!(history.undo().is_some());
        prop_assert!(history.redo().is_some());
        prop_assert_eq!(history.current().cloned(), before);
    }

    #[test]
    fn length_never_exceeds_capacity(capacity in 1_usize..20, commits in 0_usize..100) {
        let mut history = History::with_capacity(capacity);
        for _ in 0..commits {
            history.commit(snapshot(0));
        }
        prop_assert_eq!(history.len(), commits.min(capacity));
        if commits > 0 {
            prop_assert_eq!(history.position(), history.len() - 1);
        }
    }
}

#[test]
fn fifty_one_commits_into_default_capacity() {
    let mut history = History::new();
    let first = snapshot(1);
    history.commit(first.clone());
    for _ in 0..50 {
        history.commit(snapshot(2));
    }

    assert_eq!(history.len(), 50);
    assert_eq!(history.position(), 49);
    assert!(history.iter().all(|s| s != &first));
}

#[test]
fn commit_after_undo_discards_redo() {
    let mut history = History::new();
    history.commit(snapshot(1));
    history.commit(snapshot(2));
    history.commit(snapshot(3));
    history.undo();
    history.undo();
    assert!(history.can_redo());

    history.commit(snapshot(4));
    assert!(!history.can_redo());
    assert_eq!(history.len(), 2);
}
