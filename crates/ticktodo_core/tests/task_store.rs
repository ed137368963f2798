use chrono::{TimeZone, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use ticktodo_core::{
    Clock, FilterMode, KeyValueStore, KvTaskRepository, ManualClock, MemoryKeyValueStore,
    StoreError, Task, TaskCounts, TaskId, TaskRepository, TaskStore, TaskValidationError,
    TimerConfig, TimerStatus,
};

type MemoryStore = TaskStore<KvTaskRepository<MemoryKeyValueStore>>;

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
    ))
}

fn open(slot: &MemoryKeyValueStore, clock: &Arc<ManualClock>) -> MemoryStore {
    TaskStore::open(KvTaskRepository::new(slot.clone()), clock.clone())
}

fn persisted(slot: &MemoryKeyValueStore) -> Vec<Task> {
    KvTaskRepository::new(slot.clone()).load()
}

#[test]
fn add_assigns_unique_ids_and_persists() {
    let slot = MemoryKeyValueStore::new();
    let clock = clock();
    let mut store = open(&slot, &clock);

    let mut ids = HashSet::new();
    for text in ["one", "two", " three "] {
        let task = store.add(text, None).unwrap();
        assert!(!task.completed);
        assert_eq!(task.created_at, clock.now());
        assert!(ids.insert(task.id));
    }

    assert_eq!(store.list().len(), 3);
    assert_eq!(store.list()[2].text, "three");
    assert_eq!(persisted(&slot), store.list());
}

#[test]
fn add_rejects_empty_text_without_changing_store() {
    let slot = MemoryKeyValueStore::new();
    let mut store = open(&slot, &clock());
    store.add("keep me", None).unwrap();
    let before = store.list().to_vec();

    for text in ["", "   ", "\t\n"] {
        let err = store.add(text, None).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(TaskValidationError::EmptyText)
        ));
    }
    assert_eq!(store.list(), before);
    assert_eq!(persisted(&slot), before);
}

#[test]
fn add_with_timer_starts_countdown_now() {
    let clock = clock();
    let mut store = open(&MemoryKeyValueStore::new(), &clock);

    let task = store
        .add("Tea", Some(TimerConfig::from_seconds(180).unwrap()))
        .unwrap();
    let timer = task.timer.unwrap();
    assert_eq!(timer.duration_seconds, 180);
    assert_eq!(timer.start_time, clock.now());
    assert!(timer.is_active);
}

#[test]
fn toggle_twice_restores_flag() {
    let slot = MemoryKeyValueStore::new();
    let mut store = open(&slot, &clock());
    let id = store.add("Laundry", None).unwrap().id;

    assert!(store.toggle(&id).unwrap().completed);
    assert!(persisted(&slot)[0].completed);
    assert!(!store.toggle(&id).unwrap().completed);
    assert!(!persisted(&slot)[0].completed);
}

#[test]
fn toggle_unknown_id_is_not_found() {
    let mut store = open(&MemoryKeyValueStore::new(), &clock());
    let missing = TaskId::parse("nope").unwrap();
    let err = store.toggle(&missing).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(id) if id == missing));
}

#[test]
fn completing_disarms_timer_permanently() {
    let mut store = open(&MemoryKeyValueStore::new(), &clock());
    let id = store
        .add("Pomodoro", Some(TimerConfig::from_seconds(1500).unwrap()))
        .unwrap()
        .id;

    let completed = store.toggle(&id).unwrap();
    assert!(!completed.timer.as_ref().unwrap().is_active);

    let reopened = store.toggle(&id).unwrap();
    assert!(!reopened.completed);
    assert!(!reopened.timer.as_ref().unwrap().is_active);
    assert_eq!(store.rows(FilterMode::All)[0].timer, TimerStatus::Inactive);
}

#[test]
fn delete_twice_is_a_noop_the_second_time() {
    let slot = MemoryKeyValueStore::new();
    let mut store = open(&slot, &clock());
    let keep = store.add("keep", None).unwrap().id;
    let drop_id = store.add("drop", None).unwrap().id;

    assert!(store.delete(&drop_id).unwrap());
    assert!(!store.delete(&drop_id).unwrap());
    assert_eq!(store.list().len(), 1);
    assert_eq!(store.list()[0].id, keep);
    assert_eq!(persisted(&slot).len(), 1);
}

#[test]
fn clear_completed_removes_exactly_completed_in_order() {
    let slot = MemoryKeyValueStore::new();
    let mut store = open(&slot, &clock());
    let ids: Vec<TaskId> = ["a", "b", "c", "d", "e"]
        .into_iter()
        .map(|text| store.add(text, None).unwrap().id)
        .collect();
    store.toggle(&ids[1]).unwrap();
    store.toggle(&ids[3]).unwrap();

    assert_eq!(store.clear_completed().unwrap(), 2);
    let texts: Vec<&str> = store.list().iter().map(|task| task.text.as_str()).collect();
    assert_eq!(texts, ["a", "c", "e"]);
    assert_eq!(persisted(&slot), store.list());

    assert_eq!(store.clear_completed().unwrap(), 0);
}

#[test]
fn filtered_views_and_counts() {
    let mut store = open(&MemoryKeyValueStore::new(), &clock());
    let a = store.add("A", None).unwrap().id;
    let b = store.add("B", None).unwrap().id;
    let c = store.add("C", None).unwrap().id;
    store.toggle(&b).unwrap();

    let active: Vec<&TaskId> = store
        .filtered(FilterMode::Active)
        .into_iter()
        .map(|task| &task.id)
        .collect();
    assert_eq!(active, [&a, &c]);
    let completed: Vec<&TaskId> = store
        .filtered(FilterMode::Completed)
        .into_iter()
        .map(|task| &task.id)
        .collect();
    assert_eq!(completed, [&b]);
    assert_eq!(
        store.counts(),
        TaskCounts {
            total: 3,
            active: 2,
            completed: 1
        }
    );
}

#[test]
fn failed_save_leaves_store_unchanged() {
    let slot = MemoryKeyValueStore::with_quota(400);
    let mut store = open(&slot, &clock());
    store.add("fits", None).unwrap();
    let before = store.list().to_vec();

    let err = store.add(&"x".repeat(500), None).unwrap_err();
    assert!(matches!(err, StoreError::Repo(_)));
    assert_eq!(store.list(), before);
    assert_eq!(persisted(&slot), before);
}

#[test]
fn reopen_restores_previous_state() {
    let slot = MemoryKeyValueStore::new();
    let clock = clock();
    let mut store = open(&slot, &clock);
    store
        .add("Buy milk", Some(TimerConfig::from_seconds(30).unwrap()))
        .unwrap();
    let done = store.add("Walk dog", None).unwrap().id;
    store.toggle(&done).unwrap();
    let snapshot = store.list().to_vec();
    drop(store.teardown());

    let reopened = open(&slot, &clock);
    assert_eq!(reopened.list(), snapshot);
}

#[test]
fn resolve_matches_unique_prefix_only() {
    let slot = MemoryKeyValueStore::new();
    let payload = r#"[
        {"id":"abc-1","text":"one","completed":false,"createdAt":"2024-05-01T09:00:00.000Z"},
        {"id":"abc-2","text":"two","completed":false,"createdAt":"2024-05-01T09:00:00.000Z"},
        {"id":"xyz","text":"three","completed":false,"createdAt":"2024-05-01T09:00:00.000Z"}
    ]"#;
    let mut kv = slot.clone();
    kv.set("todos", payload).unwrap();
    let store = open(&slot, &clock());

    assert_eq!(store.resolve("abc-2").unwrap().text, "two");
    assert_eq!(store.resolve("x").unwrap().text, "three");
    assert!(store.resolve("abc").is_none());
    assert!(store.resolve("").is_none());
    assert!(store.resolve("q").is_none());
}

#[test]
fn buy_milk_timer_expires_without_completing() {
    let slot = MemoryKeyValueStore::new();
    let clock = clock();
    let mut store = open(&slot, &clock);
    let id = store
        .add("Buy milk", Some(TimerConfig::from_seconds(30).unwrap()))
        .unwrap()
        .id;

    clock.advance_secs(10);
    assert!(store.expire_due().unwrap().is_empty());
    assert_eq!(
        store.rows(FilterMode::All)[0]
            .timer
            .remaining()
            .map(|left| left.total_seconds()),
        Some(20)
    );

    clock.advance_secs(21);
    assert_eq!(store.expire_due().unwrap(), vec![id.clone()]);

    let task = store.get(&id).unwrap();
    assert!(!task.completed);
    assert!(!task.timer.as_ref().unwrap().is_active);
    assert_eq!(store.rows(FilterMode::All)[0].timer, TimerStatus::Inactive);
    assert_eq!(store.rows(FilterMode::All)[0].timer_label(), None);
    assert!(!persisted(&slot)[0].timer.as_ref().unwrap().is_active);

    assert!(store.expire_due().unwrap().is_empty());
}

#[test]
fn expire_due_at_uses_injected_instant() {
    let clock = clock();
    let mut store = open(&MemoryKeyValueStore::new(), &clock);
    let start = clock.now();
    store
        .add("Report", Some(TimerConfig::from_seconds(1800).unwrap()))
        .unwrap();

    assert!(store
        .expire_due_at(start + chrono::Duration::seconds(1500))
        .unwrap()
        .is_empty());
    assert_eq!(
        store
            .expire_due_at(start + chrono::Duration::seconds(1800))
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn completed_task_loaded_with_armed_timer_never_counts_down() {
    let mut slot = MemoryKeyValueStore::new();
    let payload = r#"[{"id":"a","text":"Stretch","completed":true,"createdAt":"2024-05-01T09:00:00.000Z",
        "timer":{"durationSeconds":30,"startTime":"2024-05-01T09:00:00.000Z","isActive":true}}]"#;
    slot.set("todos", payload).unwrap();
    let clock = clock();
    let mut store = open(&slot, &clock);

    assert_eq!(store.rows(FilterMode::All)[0].timer, TimerStatus::Inactive);
    clock.advance_secs(60);
    assert!(store.expire_due().unwrap().is_empty());
    assert!(!store.list()[0].has_running_timer());
}
