use actionkit::canvas::{
    CanvasError, CanvasRepository, LockOptions, StepStatus, Workflow, WorkflowStatus,
    WorkflowStep, LOCK_KIND,
};
use actionkit::shared::ids::CanvasId;
use actionkit::shared::logging::EventLog;
use actionkit::store::{EntityKey, FileStore, KeyValueStore, MemoryStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

fn fast_lock() -> LockOptions {
    LockOptions {
        backoff_min: Duration::from_millis(1),
        backoff_max: Duration::from_millis(3),
    }
}

fn repository<S: KeyValueStore>(store: S) -> CanvasRepository<S> {
    CanvasRepository::new(store, fast_lock(), EventLog::discard())
}

fn stored_workflow<S: KeyValueStore>(repo: &CanvasRepository<S>, id: &str) -> CanvasId {
    let canvas_id = CanvasId::parse(id).expect("canvas id");
    let mut workflow = Workflow::new(canvas_id.clone());
    workflow.description = Some("Release".to_string());
    workflow.channel_id = Some("C123".to_string());
    workflow.message_id = Some("1700000000.000100".to_string());
    workflow.begin_progress();
    repo.store_workflow(&workflow).expect("store workflow");
    canvas_id
}

fn lock_holder(store: &MemoryStore, canvas_id: &CanvasId) -> Option<String> {
    store
        .get(&EntityKey::new(LOCK_KIND, canvas_id.as_str()))
        .expect("get lock")
        .and_then(|entity| entity.get_str("lock_id").map(str::to_string))
}

#[test]
fn persist_and_reload_preserves_steps_and_artifacts() {
    let repo = repository(MemoryStore::new());
    let canvas_id = CanvasId::parse("roundtrip").expect("canvas id");
    let mut workflow = Workflow::new(canvas_id.clone());
    workflow.status = WorkflowStatus::Failed;
    workflow.channel_name = Some("#ci".to_string());
    for (description, status) in [
        ("lint", StepStatus::Succeeded),
        ("test", StepStatus::Failed),
        ("deploy", StepStatus::Skipped),
    ] {
        workflow
            .add_step(WorkflowStep::new(description, status))
            .expect("step");
    }
    workflow.begin_progress();
    workflow.add_artifact("coverage 93%").expect("artifact");

    repo.store_workflow(&workflow).expect("store");
    let loaded = repo.load_workflow(&canvas_id).expect("load");
    assert_eq!(loaded, workflow);
}

#[test]
fn missing_record_is_canvas_not_found() {
    let repo = repository(MemoryStore::new());
    let err = repo
        .with_locked_workflow(&CanvasId::parse("nope").expect("id"), true, |_| Ok(()))
        .expect_err("missing");
    assert!(matches!(err, CanvasError::CanvasNotFound { .. }));
}

#[test]
fn locked_mutation_saves_and_releases() {
    let store = MemoryStore::new();
    let repo = repository(store.clone());
    let canvas_id = stored_workflow(&repo, "save");

    let (workflow, step_count) = repo
        .with_locked_workflow(&canvas_id, true, |workflow| {
            assert_eq!(lock_holder(&store, &canvas_id).as_deref(), Some(repo.instance_id()));
            workflow
                .add_step(WorkflowStep::new("build", StepStatus::InProgress))
                .expect("step");
            Ok(workflow.steps.len())
        })
        .expect("mutate");

    assert_eq!(step_count, 1);
    assert_eq!(repo.load_workflow(&canvas_id).expect("load"), workflow);
    assert_eq!(lock_holder(&store, &canvas_id), None);
}

#[test]
fn failed_mutation_is_not_saved_and_still_releases() {
    let store = MemoryStore::new();
    let repo = repository(store.clone());
    let canvas_id = stored_workflow(&repo, "fail");

    let err = repo
        .with_locked_workflow(&canvas_id, true, |workflow| -> Result<(), CanvasError> {
            workflow.status = WorkflowStatus::Succeeded;
            Err(CanvasError::Usage("boom".to_string()))
        })
        .expect_err("mutation fails");
    assert!(matches!(err, CanvasError::Usage(_)));

    let reloaded = repo.load_workflow(&canvas_id).expect("load");
    assert_eq!(reloaded.status, WorkflowStatus::Initializing);
    assert_eq!(lock_holder(&store, &canvas_id), None);

    let other = repository(store.clone());
    other
        .with_locked_workflow(&canvas_id, false, |_| Ok(()))
        .expect("lock is free again");
}

#[test]
fn panicking_mutation_releases_lock() {
    let store = MemoryStore::new();
    let repo = repository(store.clone());
    let canvas_id = stored_workflow(&repo, "panic");

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _ = repo.with_locked_workflow(&canvas_id, true, |_| -> Result<(), CanvasError> {
            panic!("mutation panicked")
        });
    }));
    assert!(result.is_err());
    assert_eq!(lock_holder(&store, &canvas_id), None);
}

#[test]
fn lock_held_by_another_instance_blocks_until_released() {
    let store = MemoryStore::new();
    let first = repository(store.clone());
    let canvas_id = stored_workflow(&first, "contended");
    let guard = first.acquire_lock(&canvas_id).expect("first lock");

    let waiter_store = store.clone();
    let waiter_id = canvas_id.clone();
    let acquired = Arc::new(AtomicUsize::new(0));
    let acquired_flag = Arc::clone(&acquired);
    let waiter = thread::spawn(move || {
        let second = repository(waiter_store);
        second
            .with_locked_workflow(&waiter_id, false, |_| {
                acquired_flag.store(1, Ordering::SeqCst);
                Ok(())
            })
            .expect("second lock");
    });

    thread::sleep(Duration::from_millis(50));
    assert_eq!(acquired.load(Ordering::SeqCst), 0);
    guard.release().expect("release");
    waiter.join().expect("join waiter");
    assert_eq!(acquired.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_instances_hold_the_lock_one_at_a_time() {
    let store = MemoryStore::new();
    let canvas_id = stored_workflow(&repository(store.clone()), "race");
    let inside = Arc::new(AtomicUsize::new(0));
    let max_inside = Arc::new(AtomicUsize::new(0));

    let workers: Vec<_> = (0..8)
        .map(|i| {
            let store = store.clone();
            let canvas_id = canvas_id.clone();
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            thread::spawn(move || {
                let repo = repository(store);
                repo.with_locked_workflow(&canvas_id, true, |workflow| {
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(2));
                    workflow
                        .add_step(WorkflowStep::new(format!("worker {i}"), StepStatus::Succeeded))
                        .expect("step");
                    inside.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
                .expect("locked mutation");
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("join worker");
    }

    assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    let workflow = repository(store).load_workflow(&canvas_id).expect("load");
    assert_eq!(workflow.steps.len(), 8);
}

#[test]
fn file_store_backs_the_same_lock_protocol() {
    let dir = tempdir().expect("tempdir");
    let store = FileStore::new(dir.path(), "github-actions");
    let canvas_id = stored_workflow(&repository(store.clone()), "on-disk");

    let workers: Vec<_> = (0..4)
        .map(|i| {
            let store = store.clone();
            let canvas_id = canvas_id.clone();
            thread::spawn(move || {
                repository(store)
                    .with_locked_workflow(&canvas_id, true, |workflow| {
                        workflow.add_artifact(&format!("worker {i}"))
                    })
                    .expect("locked mutation");
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("join worker");
    }

    let workflow = repository(store).load_workflow(&canvas_id).expect("load");
    assert_eq!(workflow.artifacts.len(), 5);
}
