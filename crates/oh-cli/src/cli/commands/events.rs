//! Headless event stream: one line per backend event on stdout.

use std::io::{self, Write};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime};
use oh_core::config::Config;
use oh_core::endpoint::Endpoint;
use oh_core::logging;
use oh_core::session::{SessionController, SessionUpdate};
use oh_core::transport::{ReconnectPolicy, SocketIoConnector, TransportEvent};
use oh_types::{Action, EventRecord, EventSource};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info};

pub struct EventsOptions<'a> {
    pub config: &'a Config,
    pub endpoint: Endpoint,
    pub conversation_id: &'a str,
    pub send: Option<&'a str>,
    pub pretty: bool,
}

pub async fn run(opts: EventsOptions<'_>) -> Result<()> {
    logging::init_stderr(&opts.config.log.level).context("initialize logging")?;

    let policy = ReconnectPolicy::from_config(&opts.config.backend);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session = SessionController::new(SocketIoConnector::new(opts.endpoint, policy), tx);

    if let Some(text) = opts.send {
        let text = text.trim();
        if text.is_empty() {
            anyhow::bail!("--send text cannot be empty");
        }
        // Queued actions go out as soon as the connection opens.
        session.queue(Action::user_message(text).to_payload());
    }

    session
        .connect(opts.conversation_id)
        .context("open event stream")?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let result = loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupted");
                break Ok(());
            }
            message = rx.recv() => {
                let Some(message) = message else {
                    break Ok(());
                };
                let gave_up = matches!(message.event, TransportEvent::ConnectFailed(_));
                for update in session.handle(message, Instant::now()) {
                    print_update(&update, opts.pretty)?;
                }
                if gave_up {
                    break Err(anyhow::anyhow!(
                        "Event stream closed for conversation {}",
                        opts.conversation_id
                    ));
                }
            }
        }
    };

    session.close();
    result
}

fn print_update(update: &SessionUpdate, pretty: bool) -> Result<()> {
    match update {
        SessionUpdate::Event(record) => {
            let line = if pretty {
                pretty_line(record)
            } else {
                serde_json::to_string(record.as_value()).context("serialize event")?
            };
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{line}").context("write event")?;
            stdout.flush().context("flush stdout")?;
        }
        SessionUpdate::StatusChanged(status) => eprintln!("[{status}]"),
        SessionUpdate::ChatError(error) => eprintln!("error: {}", error.message),
        SessionUpdate::Flushed(count) => debug!(count, "queued actions sent"),
    }
    Ok(())
}

/// `HH:MM:SS #id source kind message`, with placeholders for missing fields.
fn pretty_line(record: &EventRecord) -> String {
    let time = record
        .timestamp()
        .and_then(format_timestamp)
        .unwrap_or_else(|| "--:--:--".to_string());
    let id = record
        .id()
        .map_or_else(|| "-".to_string(), |id| id.to_string());
    let source = record.source().map_or("?", EventSource::as_str);
    let kind = record
        .action_tag()
        .map(|tag| format!("action:{tag}"))
        .or_else(|| record.observation().map(|obs| format!("observation:{}", obs.tag)))
        .unwrap_or_else(|| "event".to_string());
    let message = record.message().unwrap_or_default().replace('\n', " ");
    format!("{time} #{id} {source} {kind} {message}")
        .trim_end()
        .to_string()
}

/// Backend timestamps are ISO 8601, with or without an offset.
fn format_timestamp(raw: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.format("%H:%M:%S").to_string());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.format("%H:%M:%S").to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_format_timestamp_variants() {
        assert_eq!(
            format_timestamp("2025-03-01T10:20:30.123456").as_deref(),
            Some("10:20:30")
        );
        assert_eq!(
            format_timestamp("2025-03-01T10:20:30+02:00").as_deref(),
            Some("10:20:30")
        );
        assert_eq!(format_timestamp("yesterday"), None);
    }

    #[test]
    fn test_pretty_line_for_action() {
        let record = EventRecord::new(json!({
            "id": 7,
            "source": "agent",
            "message": "Running\nls",
            "timestamp": "2025-03-01T10:20:30",
            "action": "run",
            "args": {"command": "ls"}
        }));
        assert_eq!(pretty_line(&record), "10:20:30 #7 agent action:run Running ls");
    }

    #[test]
    fn test_pretty_line_for_bare_record() {
        let record = EventRecord::new(json!({"status_update": true}));
        assert_eq!(pretty_line(&record), "--:--:-- #- ? event");
    }

    #[test]
    fn test_pretty_line_for_observation() {
        let record = EventRecord::new(json!({
            "id": "12",
            "source": "environment",
            "message": "",
            "timestamp": "2025-03-01T10:20:31",
            "observation": "run",
            "content": "a.txt"
        }));
        assert_eq!(pretty_line(&record), "10:20:31 #12 environment observation:run");
    }
}
