use hookgate_core::{category, Action, ActorId, Operation, OperationBody, ReleaseBy, ReleaseOutcome, SyncStep, CONTAINERIZATION_TOPIC};
use hookgate_ledger::{ActivityLedger, ProgressLedger};
use hookgate_runner::{Config, Gate};

fn actor() -> ActorId {
    ActorId::new("python-pro")
}

#[test]
fn init_writes_config_and_both_ledgers() {
    let dir = tempfile::tempdir().unwrap();
    Gate::init_workspace(dir.path()).unwrap();
    assert!(Config::config_path(dir.path()).exists());
    assert!(dir.path().join("WORK_STATUS.md").exists());
    assert!(dir.path().join("orchestration-index.md").exists());

    // A second init keeps hand edits.
    let status = dir.path().join("WORK_STATUS.md");
    let edited = format!("{}\n## Notes\nkeep me\n", std::fs::read_to_string(&status).unwrap());
    std::fs::write(&status, &edited).unwrap();
    Gate::init_workspace(dir.path()).unwrap();
    assert!(std::fs::read_to_string(&status).unwrap().contains("keep me"));
}

#[test]
fn pre_and_post_round_trip_through_the_files() {
    let dir = tempfile::tempdir().unwrap();
    let gate = Gate::open(dir.path()).unwrap();
    let path = dir.path().join("api/handlers.py");
    let op = gate.relative(Operation::new(
        actor(),
        OperationBody::Write { path: path.to_string_lossy().into_owned(), content: "def ok():\n    return 1\n".into() },
    ));

    assert_eq!(gate.pre_tool_use(&op).action, Action::Allow);
    let text = std::fs::read_to_string(dir.path().join("WORK_STATUS.md")).unwrap();
    assert!(text.contains("LOCKED: `api/handlers.py` by python-pro (writing)"), "{text}");

    let report = gate.post_tool_use(&op, true);
    assert!(!report.is_degraded(), "{report:?}");
    let text = std::fs::read_to_string(dir.path().join("WORK_STATUS.md")).unwrap();
    assert!(!text.contains("LOCKED:"));
    assert!(text.contains("- **File**: `api/handlers.py`"));

    let orchestration = std::fs::read_to_string(dir.path().join("orchestration-index.md")).unwrap();
    assert!(orchestration.contains("### Latest Progress: python-pro / progress"));
}

#[test]
fn session_start_asks_for_containerization_once() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("src")).unwrap();
    std::fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
    for f in ["src/a.py", "src/b.ts", "main.go", "node_modules/pkg/index.js"] {
        std::fs::write(dir.path().join(f), "").unwrap();
    }
    let gate = Gate::open(dir.path()).unwrap();

    let report = gate.session_start(&actor());
    assert!(!report.sync.is_degraded(), "{:?}", report.sync);
    assert_eq!(report.source_files, ["main.go", "src/a.py", "src/b.ts"]);
    assert!(report.needs_containerization());
    assert!(report.sync.completed.contains(&SyncStep::LedgerInit));

    let alerts = gate.ledger().alerts().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].topic, CONTAINERIZATION_TOPIC);
    assert_eq!(alerts[0].roles, ["docker-expert"]);

    gate.session_start(&actor());
    assert_eq!(gate.ledger().alerts().unwrap().len(), 1);

    let log = gate.ledger().activities().unwrap();
    assert_eq!(log.entries()[0].operation, "session_start");
    let progress = gate.ledger().progress().unwrap();
    assert!(progress.iter().any(|p| p.actor == actor() && p.status == "active"));
}

#[test]
fn dockerfile_in_root_means_ready() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("app.py"), "").unwrap();
    std::fs::write(dir.path().join("Dockerfile.prod"), "FROM python:3.12\n").unwrap();
    let gate = Gate::open(dir.path()).unwrap();
    let report = gate.session_start(&actor());
    assert!(report.containerization_ready);
    assert!(gate.ledger().alerts().unwrap().is_empty());
}

#[test]
fn unlock_needs_the_holder_or_force() {
    let dir = tempfile::tempdir().unwrap();
    let gate = Gate::open(dir.path()).unwrap();
    let op = Operation::new(actor(), OperationBody::Write { path: "a.py".into(), content: String::new() });
    gate.pre_tool_use(&op);

    let other = gate.unlock("a.py", &ReleaseBy::Holder(ActorId::new("react-pro"))).unwrap();
    assert!(matches!(other, ReleaseOutcome::HeldByOther(_)));
    let forced = gate.unlock(&dir.path().join("a.py").to_string_lossy(), &ReleaseBy::Override).unwrap();
    assert!(matches!(forced, ReleaseOutcome::Released(_)));
    assert!(gate.status().unwrap().locks.is_empty());
}

#[test]
fn dockerfile_satisfies_the_containerization_check() {
    let dir = tempfile::tempdir().unwrap();
    let gate = Gate::open(dir.path()).unwrap();
    let op = Operation::new(actor(), OperationBody::Write { path: "svc/app.py".into(), content: "x = 1\n".into() })
        .with_description("deploy the api");
    assert_eq!(gate.pre_tool_use(&op).category, category::CONTAINERIZATION_REQUIRED);
    assert!(gate.status().unwrap().locks.is_empty());

    std::fs::write(dir.path().join("Dockerfile"), "FROM python:3.12\n").unwrap();
    assert_eq!(gate.pre_tool_use(&op).action, Action::Allow);
}
