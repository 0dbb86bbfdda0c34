use std::sync::{Arc, Barrier};

use hookgate_core::{
    AcquireOutcome, ActivityRecord, ActivityStatus, ActorId, AlertRecord, LockStatus, ProgressRecord, ReleaseBy,
    ReleaseOutcome,
};
use hookgate_ledger::{ActivityLedger, Ledger, LockLedger, ProgressLedger};
use hookgate_ledger_fs::{work_status::TRUNCATION_MARKER, FsLedger, FsLedgerOptions};

fn ledger(dir: &std::path::Path) -> FsLedger {
    FsLedger::open(dir, FsLedgerOptions::default())
}

#[test]
fn concurrent_acquires_admit_exactly_one_holder() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_path_buf();
    let contenders = 8;
    let barrier = Arc::new(Barrier::new(contenders));

    let outcomes: Vec<AcquireOutcome> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..contenders)
            .map(|i| {
                let barrier = Arc::clone(&barrier);
                let root = root.clone();
                s.spawn(move || {
                    // each thread opens its own handle, like separate hook processes
                    let ledger = FsLedger::open(&root, FsLedgerOptions::default());
                    barrier.wait();
                    ledger
                        .acquire("src/shared.py", &ActorId::new(format!("agent-{i}")), "writing")
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners: Vec<_> = outcomes.iter().filter(|o| o.is_acquired()).collect();
    assert_eq!(winners.len(), 1);
    let AcquireOutcome::Acquired { record, .. } = winners[0] else { unreachable!() };
    for o in &outcomes {
        if let AcquireOutcome::Conflict(held) = o {
            assert_eq!(held.holder, record.holder);
        }
    }
    assert_eq!(ledger(&root).locks().unwrap().len(), 1);
}

#[test]
fn conflict_names_the_first_holder_and_refresh_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let l = ledger(dir.path());
    let a = ActorId::new("python-pro");
    let b = ActorId::new("react-pro");
    assert!(l.acquire("a.py", &a, "writing").unwrap().is_acquired());
    match l.acquire("a.py", &b, "editing").unwrap() {
        AcquireOutcome::Conflict(rec) => {
            assert_eq!(rec.holder, a);
            assert_eq!(rec.purpose, "writing");
        }
        other => panic!("expected conflict, got {other:?}"),
    }
    assert!(matches!(l.acquire("a.py", &a, "editing").unwrap(), AcquireOutcome::Acquired { refreshed: true, .. }));
    assert_eq!(l.locks().unwrap().len(), 1);
}

#[test]
fn release_of_free_resource_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let l = ledger(dir.path());
    assert_eq!(l.release("nothing.py", &ReleaseBy::Holder(ActorId::new("a"))).unwrap(), ReleaseOutcome::NotHeld);
    assert_eq!(l.query("nothing.py").unwrap(), LockStatus::Free);
}

#[test]
fn retention_on_disk_keeps_twenty_and_one_marker() {
    let dir = tempfile::tempdir().unwrap();
    let l = ledger(dir.path());
    for n in 0..25 {
        l.append(ActivityRecord {
            at: hookgate_core::time::now(),
            actor: ActorId::new("a"),
            operation: "write".into(),
            resource: format!("f{n}.py"),
            status: ActivityStatus::Completed,
            details: None,
        })
        .unwrap();
    }
    let text = std::fs::read_to_string(l.work_status_path()).unwrap();
    assert_eq!(text.matches(TRUNCATION_MARKER).count(), 1);
    assert_eq!(text.matches("\n### ").count(), 20);
    let log = l.activities().unwrap();
    assert_eq!(log.len(), 20);
    assert_eq!(log.entries()[0].resource, "f24.py");
}

#[test]
fn progress_and_alerts_persist_across_handles() {
    let dir = tempfile::tempdir().unwrap();
    let first = ledger(dir.path());
    first.init().unwrap();
    for status in ["active", "completed"] {
        first
            .update(ProgressRecord {
                actor: ActorId::new("x"),
                topic: "progress".into(),
                operation: "write".into(),
                resource: "a.py".into(),
                status: status.into(),
                updated_at: hookgate_core::time::now(),
            })
            .unwrap();
    }
    first
        .signal(AlertRecord {
            topic: "containerization-review".into(),
            requested_by: ActorId::new("x"),
            roles: vec!["docker-expert".into()],
            resources: vec!["svc.py".into()],
            raised_at: hookgate_core::time::now(),
        })
        .unwrap();

    let second = ledger(dir.path());
    let snap = second.snapshot().unwrap();
    assert_eq!(snap.progress.len(), 1);
    assert_eq!(snap.progress[0].status, "completed");
    assert_eq!(snap.alerts.len(), 1);
    assert_eq!(second.clear_alerts(Some("containerization-review")).unwrap(), 1);
    assert!(second.alerts().unwrap().is_empty());
}

#[test]
fn init_leaves_existing_documents_alone() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("WORK_STATUS.md"), "# Mine\n\n## Notes\nkeep me\n").unwrap();
    let l = ledger(dir.path());
    l.init().unwrap();
    let text = std::fs::read_to_string(l.work_status_path()).unwrap();
    assert_eq!(text, "# Mine\n\n## Notes\nkeep me\n");
    assert!(l.orchestration_path().exists());

    l.acquire("a.py", &ActorId::new("a"), "writing").unwrap();
    let text = std::fs::read_to_string(l.work_status_path()).unwrap();
    assert!(text.contains("## Notes\nkeep me\n"));
    assert!(text.contains("LOCKED: `a.py` by a (writing)"));
}

#[test]
fn markdown_in_details_does_not_drop_older_activity() {
    let dir = tempfile::tempdir().unwrap();
    let l = ledger(dir.path());
    let details = [None, Some("ok"), Some("Refactor module\n\n## Summary\nsplit helpers")];
    for (n, d) in details.into_iter().enumerate() {
        l.append(ActivityRecord {
            at: hookgate_core::time::now(),
            actor: ActorId::new("a"),
            operation: "edit".into(),
            resource: format!("f{n}.py"),
            status: ActivityStatus::Completed,
            details: d.map(str::to_string),
        })
        .unwrap();
    }
    let log = l.activities().unwrap();
    assert_eq!(log.len(), 3);
    assert_eq!(log.entries()[0].details.as_deref(), Some("Refactor module\n\n## Summary\nsplit helpers"));
}

#[test]
fn newline_in_a_locked_path_keeps_the_ledger_readable() {
    let dir = tempfile::tempdir().unwrap();
    let l = ledger(dir.path());
    let a = ActorId::new("a");
    assert!(l.acquire("odd\nname.py", &a, "writing").unwrap().is_acquired());
    assert!(l.acquire("clean.py", &ActorId::new("b"), "writing").unwrap().is_acquired());
    match l.query("odd\nname.py").unwrap() {
        LockStatus::Held(rec) => assert_eq!(rec.holder, a),
        other => panic!("expected held, got {other:?}"),
    }
    assert_eq!(l.locks().unwrap().len(), 2);
}

#[test]
fn holder_with_parentheses_owns_its_lock() {
    let dir = tempfile::tempdir().unwrap();
    let l = ledger(dir.path());
    let qa = ActorId::new("qa (night)");
    assert!(l.acquire("a.py", &qa, "writing").unwrap().is_acquired());
    assert!(matches!(l.acquire("a.py", &qa, "writing").unwrap(), AcquireOutcome::Acquired { refreshed: true, .. }));
    assert!(matches!(l.release("a.py", &ReleaseBy::Holder(qa)).unwrap(), ReleaseOutcome::Released(_)));
    assert!(l.locks().unwrap().is_empty());
}
