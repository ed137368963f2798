use chrono::{TimeZone, Utc};
use ticktodo_core::{decode_tasks, encode_tasks, Task, TaskId, TaskTimer, TimerConfig};

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
}

#[test]
fn task_new_trims_text_and_sets_defaults() {
    let task = Task::new("  Buy milk \n", t0()).unwrap();

    assert!(!task.id.as_str().is_empty());
    assert_eq!(task.text, "Buy milk");
    assert!(!task.completed);
    assert_eq!(task.created_at, t0());
    assert!(task.timer.is_none());
    assert!(task.is_active());
}

#[test]
fn task_serialization_uses_expected_wire_fields() {
    let id = TaskId::parse("11111111-2222-4333-8444-555555555555").unwrap();
    let mut task = Task::with_id(id, "Write report", t0()).unwrap();
    task.timer = Some(TaskTimer::start(TimerConfig::from_seconds(1800).unwrap(), t0()));

    let json = serde_json::to_value(&task).unwrap();
    assert_eq!(json["id"], "11111111-2222-4333-8444-555555555555");
    assert_eq!(json["text"], "Write report");
    assert_eq!(json["completed"], false);
    assert_eq!(json["createdAt"], "2024-05-01T09:30:00.000Z");
    assert_eq!(json["timer"]["durationSeconds"], 1800);
    assert_eq!(json["timer"]["startTime"], "2024-05-01T09:30:00.000Z");
    assert_eq!(json["timer"]["isActive"], true);

    let decoded: Task = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, task);
}

#[test]
fn timer_field_is_omitted_when_absent() {
    let task = Task::new("plain", t0()).unwrap();
    let json = serde_json::to_value(&task).unwrap();
    assert!(json.get("timer").is_none());
}

#[test]
fn legacy_browser_payload_loads() {
    let payload = r#"[
        {"id":"1714555800000","text":"Buy milk","completed":false,"createdAt":"2024-05-01T09:30:00.000Z"},
        {"id":"1714555860000","text":"Stretch","completed":true,"createdAt":"2024-05-01T09:31:00.000Z",
         "timer":{"duration":0.5,"startTime":"2024-05-01T09:31:00.000Z","isActive":false}}
    ]"#;

    let tasks = decode_tasks(payload).unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].id.as_str(), "1714555800000");
    assert!(tasks[0].timer.is_none());
    let timer = tasks[1].timer.as_ref().unwrap();
    assert_eq!(timer.duration_seconds, 30);
    assert!(!timer.is_active);
}

#[test]
fn legacy_fractional_minutes_round_to_whole_seconds() {
    let payload = r#"[{"id":"a","text":"x","completed":false,"createdAt":"2024-05-01T09:30:00.000Z",
        "timer":{"duration":1.3333333333,"startTime":"2024-05-01T09:30:00.000Z","isActive":true}}]"#;
    let tasks = decode_tasks(payload).unwrap();
    assert_eq!(tasks[0].timer.as_ref().unwrap().duration_seconds, 80);
}

#[test]
fn deserialize_rejects_invalid_records() {
    let cases = [
        r#"{"id":"","text":"x","completed":false,"createdAt":"2024-05-01T09:30:00.000Z"}"#,
        r#"{"id":"a","text":"  ","completed":false,"createdAt":"2024-05-01T09:30:00.000Z"}"#,
        r#"{"id":"a","text":"x","completed":false,"createdAt":"yesterday"}"#,
        r#"{"id":"a","text":"x","completed":false,"createdAt":"2024-05-01T09:30:00.000Z",
            "timer":{"durationSeconds":0,"startTime":"2024-05-01T09:30:00.000Z","isActive":true}}"#,
        r#"{"id":"a","text":"x","completed":false,"createdAt":"2024-05-01T09:30:00.000Z",
            "timer":{"startTime":"2024-05-01T09:30:00.000Z","isActive":true}}"#,
    ];
    for case in cases {
        assert!(
            serde_json::from_str::<Task>(case).is_err(),
            "payload should be rejected: {case}"
        );
    }
}

#[test]
fn collections_round_trip_with_and_without_timers() {
    let mut with_timer = Task::new("Focus", t0()).unwrap();
    with_timer.timer = Some(TaskTimer::start(
        TimerConfig::from_seconds(95).unwrap(),
        t0() + chrono::Duration::milliseconds(250),
    ));
    let mut done = Task::new("Done already", t0() + chrono::Duration::seconds(5)).unwrap();
    done.completed = true;
    let mut expired = Task::new("Expired timer", t0()).unwrap();
    expired.timer = Some(TaskTimer {
        duration_seconds: 30,
        start_time: t0(),
        is_active: false,
    });
    let tasks = vec![with_timer, done, expired];

    let payload = encode_tasks(&tasks).unwrap();
    assert_eq!(decode_tasks(&payload).unwrap(), tasks);
}

#[test]
fn completed_record_with_armed_timer_loads_disarmed() {
    let payload = r#"[{"id":"a","text":"Stretch","completed":true,"createdAt":"2024-05-01T09:30:00.000Z",
        "timer":{"durationSeconds":600,"startTime":"2024-05-01T09:30:00.000Z","isActive":true}}]"#;

    let tasks = decode_tasks(payload).unwrap();
    assert!(tasks[0].completed);
    assert!(!tasks[0].has_running_timer());
}
