use actionkit::store::file::STALE_GUARD_AGE;
use actionkit::store::{Entity, EntityKey, FileStore, KeyValueStore};
use serde_json::json;
use std::fs;
use std::thread;
use std::time::{Duration, Instant, SystemTime};
use tempfile::tempdir;

fn entity(name: &str, holder: serde_json::Value) -> Entity {
    let mut entity = Entity::new(EntityKey::new("SlackWorkflowLock", name));
    entity.set("lock_id", holder);
    entity
}

#[test]
fn entities_live_under_namespace_and_kind() {
    let dir = tempdir().expect("tempdir");
    let store = FileStore::new(dir.path(), "github-actions");
    let record = entity("canvas-1", json!("holder-a"));
    store.put(&record).expect("put");

    let path = dir
        .path()
        .join("github-actions")
        .join("SlackWorkflowLock")
        .join("canvas-1.json");
    assert_eq!(store.entity_path(&record.key), path);
    let raw = fs::read_to_string(&path).expect("read entity file");
    assert!(raw.contains("holder-a"));

    let loaded = store.get(&record.key).expect("get").expect("present");
    assert_eq!(loaded, record);
    assert_eq!(loaded.get_str("lock_id"), Some("holder-a"));
}

#[test]
fn missing_entities_read_as_none_and_delete_is_idempotent() {
    let dir = tempdir().expect("tempdir");
    let store = FileStore::new(dir.path(), "ns");
    let key = EntityKey::new("SlackWorkflowCanvas", "absent");
    assert!(store.get(&key).expect("get").is_none());
    store.delete(&key).expect("delete missing");

    store.put(&Entity::new(key.clone())).expect("put");
    store.delete(&key).expect("delete");
    assert!(store.get(&key).expect("get").is_none());
}

#[test]
fn conditional_put_only_lands_on_expected_state() {
    let dir = tempdir().expect("tempdir");
    let store = FileStore::new(dir.path(), "ns");
    let free = entity("canvas-2", serde_json::Value::Null);

    assert!(store.put_if_unchanged(None, &free).expect("create"));
    assert!(!store.put_if_unchanged(None, &free).expect("already exists"));

    let claimed = entity("canvas-2", json!("holder-a"));
    assert!(store.put_if_unchanged(Some(&free), &claimed).expect("claim"));

    let stolen = entity("canvas-2", json!("holder-b"));
    assert!(!store.put_if_unchanged(Some(&free), &stolen).expect("stale claim"));
    assert_eq!(
        store
            .get(&claimed.key)
            .expect("get")
            .and_then(|e| e.get_str("lock_id").map(str::to_string))
            .as_deref(),
        Some("holder-a")
    );
}

#[test]
fn unusual_names_are_sanitized_into_file_names() {
    let dir = tempdir().expect("tempdir");
    let store = FileStore::new(dir.path(), "team/one");
    let key = EntityKey::new("Kind", "../escape");
    store.put(&Entity::new(key.clone())).expect("put");
    let path = store.entity_path(&key);
    assert!(path.starts_with(dir.path().join("team_one")));
    assert!(path.exists());
}

#[test]
fn guard_left_by_a_dead_writer_is_reclaimed() {
    let dir = tempdir().expect("tempdir");
    let store = FileStore::new(dir.path(), "ns");
    let claimed = entity("canvas-3", json!("holder-a"));
    let guard_path = store.guard_path(&claimed.key);
    fs::create_dir_all(guard_path.parent().expect("parent")).expect("mkdir");
    let guard = fs::File::create(&guard_path).expect("leftover guard");
    guard
        .set_modified(SystemTime::now() - STALE_GUARD_AGE - Duration::from_secs(1))
        .expect("age guard");
    drop(guard);

    assert!(store.put_if_unchanged(None, &claimed).expect("claim"));
    assert!(!guard_path.exists());
}

#[test]
fn plain_writes_wait_for_a_held_guard() {
    let dir = tempdir().expect("tempdir");
    let store = FileStore::new(dir.path(), "ns");
    let record = entity("canvas-4", json!("holder-a"));
    let guard_path = store.guard_path(&record.key);
    fs::create_dir_all(guard_path.parent().expect("parent")).expect("mkdir");
    fs::File::create(&guard_path).expect("held guard");

    let releaser = {
        let guard_path = guard_path.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            fs::remove_file(guard_path).expect("release guard");
        })
    };
    let started = Instant::now();
    store.put(&record).expect("put");
    assert!(started.elapsed() >= Duration::from_millis(50));
    releaser.join().expect("join");
    assert!(store.get(&record.key).expect("get").is_some());
}
