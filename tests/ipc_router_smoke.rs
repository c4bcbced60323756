use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_planbookd");
    let mut child = Command::new(exe)
        .env("PLANBOOKD_OFFLINE", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn planbookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({ "id": id, "method": method, "params": params });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "expected ok for {}: {}",
        method,
        value
    );
    value.get("result").cloned().expect("result payload")
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request_ok(&mut stdin, &mut reader, "r1", "health", json!({}));
    assert_eq!(health.get("offline").and_then(|v| v.as_bool()), Some(true));

    let created = request_ok(&mut stdin, &mut reader, "r2", "session.create", json!({}));
    let sid = created
        .get("sessionId")
        .and_then(|v| v.as_str())
        .expect("session id")
        .to_string();

    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "r3",
        "setup.update",
        json!({ "sessionId": sid, "fields": { "grade": "7" } }),
    );
    assert_eq!(updated.get("changed").and_then(|v| v.as_bool()), Some(true));

    let grades = request_ok(
        &mut stdin,
        &mut reader,
        "r4",
        "setup.grades.list",
        json!({ "sessionId": sid }),
    );
    assert_eq!(
        grades.get("grades").and_then(|v| v.as_array()).map(|a| a.len()),
        Some(12)
    );

    let nav = request_ok(
        &mut stdin,
        &mut reader,
        "r5",
        "nav.state",
        json!({ "sessionId": sid }),
    );
    assert_eq!(nav.get("currentStep").and_then(|v| v.as_u64()), Some(0));

    let unknown = request(&mut stdin, &mut reader, "r6", "no.such.method", json!({}));
    assert_eq!(unknown.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        unknown
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("not_implemented")
    );

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn nav_methods_drive_current_step() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let created = request_ok(&mut stdin, &mut reader, "n1", "session.create", json!({}));
    let sid = created
        .get("sessionId")
        .and_then(|v| v.as_str())
        .expect("session id")
        .to_string();

    let jumped = request_ok(
        &mut stdin,
        &mut reader,
        "n2",
        "nav.goToStep",
        json!({ "sessionId": sid, "step": 4 }),
    );
    assert_eq!(jumped.get("currentStep").and_then(|v| v.as_u64()), Some(4));

    let out_of_range = request(
        &mut stdin,
        &mut reader,
        "n3",
        "nav.goToStep",
        json!({ "sessionId": sid, "step": 9 }),
    );
    assert_eq!(out_of_range.get("ok").and_then(|v| v.as_bool()), Some(false));

    let scrolled = request_ok(
        &mut stdin,
        &mut reader,
        "n4",
        "nav.scroll",
        json!({
            "sessionId": sid,
            "sectionOffsets": [0.0, 400.0, 900.0],
            "scrollY": 500.0,
            "headerHeight": 64.0,
        }),
    );
    assert_eq!(scrolled.get("currentStep").and_then(|v| v.as_u64()), Some(1));

    let sticky = request_ok(
        &mut stdin,
        &mut reader,
        "n5",
        "nav.sticky",
        json!({ "sessionId": sid, "sticky": true }),
    );
    assert_eq!(sticky.get("isSticky").and_then(|v| v.as_bool()), Some(true));

    let marked = request_ok(
        &mut stdin,
        &mut reader,
        "n6",
        "nav.markComplete",
        json!({ "sessionId": sid, "step": 4 }),
    );
    let completed = marked
        .get("completedSteps")
        .and_then(|v| v.as_array())
        .expect("steps");
    assert!(completed.iter().any(|s| s == "assessment"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn malformed_json_gets_bad_json_envelope() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    // The second line is valid JSON of the wrong shape; its parse error
    // message contains quotes, which must not corrupt the reply envelope.
    for junk in ["this is not json", "\"hello\""] {
        writeln!(stdin, "{}", junk).expect("write junk");
        stdin.flush().expect("flush junk");

        let mut line = String::new();
        reader.read_line(&mut line).expect("read response line");
        let value: serde_json::Value =
            serde_json::from_str(line.trim()).expect("parse response json");
        assert_eq!(value.get("ok").and_then(|v| v.as_bool()), Some(false));
        assert_eq!(
            value
                .get("error")
                .and_then(|e| e.get("code"))
                .and_then(|v| v.as_str()),
            Some("bad_json")
        );
    }

    // The loop keeps serving after a bad line.
    let health = request(&mut stdin, &mut reader, "r1", "health", json!({}));
    assert_eq!(health.get("ok").and_then(|v| v.as_bool()), Some(true));

    drop(stdin);
    let _ = child.wait();
}
