//! `oh events` against a backend that refuses the Socket.IO connect.

use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;
use tokio_tungstenite::tungstenite::{self, Message};

const HANDSHAKE: &str =
    r#"0{"sid":"s1","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;

#[test]
fn test_events_exits_when_connect_is_refused() {
    let Ok(listener) = TcpListener::bind("127.0.0.1:0") else {
        eprintln!("skipping: cannot bind localhost");
        return;
    };
    let addr = listener.local_addr().unwrap();

    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut ws = tungstenite::accept(stream).unwrap();
        ws.send(Message::text(HANDSHAKE)).unwrap();
        loop {
            match ws.read().unwrap() {
                Message::Text(text) if text.as_str() == "40" => break,
                _ => {}
            }
        }
        ws.send(Message::text(r#"44{"message":"conversation not found"}"#))
            .unwrap();
        while ws.read().is_ok() {}
    });

    let dir = tempdir().unwrap();
    cargo_bin_cmd!("oh")
        .env("OH_HOME", dir.path())
        .env_remove("OH_BACKEND_BASE_URL")
        .args(["--backend", &format!("http://{addr}")])
        .args(["events", "--conversation", "c1"])
        .timeout(Duration::from_secs(10))
        .assert()
        .failure()
        .stderr(predicate::str::contains("conversation not found"))
        .stderr(predicate::str::contains(
            "Event stream closed for conversation c1",
        ));

    server.join().unwrap();
}
