//! Newline-delimited JSON message loop.
//!
//! Each input line is one message. Every message is handled by its own task, so a slow analytics
//! request never holds up the others; replies are written one per line in completion order. A
//! message carrying an `id` gets the same `id` back on its reply, and a task that panics is
//! answered with a failure that carries no `id`.

use super::Host;
use super::common::Common;
use crate::Result;
use crate::router::{RequestRouter, Response, UNKNOWN_MESSAGE, encode_response};
use crate::store::KvStore;
use ohno::IntoAppError;
use serde_json::Value;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;

const LOG_TARGET: &str = "     serve";

/// Error text for a message whose handler stopped without replying.
const HANDLER_FAILED: &str = "Internal error while handling the message";

pub async fn serve<H: Host>(host: &mut H, common: &Common) -> Result<()> {
    let router = Arc::new(common.router()?);
    serve_lines(host, router, BufReader::new(tokio::io::stdin())).await
}

/// Answer every message read from `input` until it is exhausted and all replies are written.
pub async fn serve_lines<H, S, R>(host: &mut H, router: Arc<RequestRouter<S>>, input: R) -> Result<()>
where
    H: Host,
    S: KvStore + 'static,
    R: AsyncBufRead + Unpin,
{
    answer_lines(host, input, move |line| {
        let router = Arc::clone(&router);
        async move { handle_line(&router, &line).await }
    })
    .await
}

/// Run `handle` on every non-blank line in its own task and write each reply as it completes.
///
/// A task that dies without producing a reply is answered with a failure, so every message gets
/// exactly one reply and the loop always drains.
async fn answer_lines<H, R, F, Fut>(host: &mut H, input: R, handle: F) -> Result<()>
where
    H: Host,
    R: AsyncBufRead + Unpin,
    F: Fn(String) -> Fut,
    Fut: Future<Output = String> + Send + 'static,
{
    let mut tasks = JoinSet::new();
    let mut lines = input.lines();
    let mut input_open = true;

    while input_open || !tasks.is_empty() {
        tokio::select! {
            line = lines.next_line(), if input_open => {
                match line.into_app_err("reading a message")? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => {
                        let _ = tasks.spawn(handle(line));
                    }
                    None => {
                        log::debug!(target: LOG_TARGET, "Input closed, waiting for {} pending repl(y/ies)", tasks.len());
                        input_open = false;
                    }
                }
            }

            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                let reply = joined.unwrap_or_else(|e| {
                    log::error!(target: LOG_TARGET, "Message handler failed: {e}");
                    encode_response(&Response::failure(HANDLER_FAILED))
                });

                let mut out = host.output();
                let _ = writeln!(out, "{reply}");
                let _ = out.flush();
            }

            else => break,
        }
    }

    Ok(())
}

async fn handle_line<S: KvStore>(router: &RequestRouter<S>, line: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(line) else {
        log::debug!(target: LOG_TARGET, "Malformed message: {line}");
        return encode_response(&Response::failure(UNKNOWN_MESSAGE));
    };

    let id = value.get("id").cloned();
    let response = router.handle_value(value).await;

    let Some(id) = id else {
        return encode_response(&response);
    };

    match serde_json::to_value(&response) {
        Ok(Value::Object(mut map)) => {
            let _ = map.insert("id".to_string(), id);
            Value::Object(map).to_string()
        }
        _ => encode_response(&response),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::commands::host::TestHost;
    use crate::config::Config;
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn router() -> Arc<RequestRouter<MemoryStore>> {
        let store = Arc::new(MemoryStore::new());
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()));
        let config = Config {
            api_base_url: "http://127.0.0.1:9".into(),
            ..Config::default()
        };
        Arc::new(RequestRouter::new(&config, Arc::clone(&store), store, clock).unwrap())
    }

    fn replies(host: &TestHost) -> Vec<Value> {
        host.output_text().lines().map(|l| serde_json::from_str(l).unwrap()).collect()
    }

    #[tokio::test]
    async fn answers_every_line() {
        let mut host = TestHost::new();
        let input = concat!(
            r#"{"type": "FETCH_ANALYTICS", "username": "bad name", "id": 1}"#,
            "\n",
            "\n",
            "not json\n",
            r#"{"type": "SET_CREDENTIAL", "token": " <tok> ", "id": "two"}"#,
            "\n",
            r#"{"type": "LIST_RECENT"}"#,
            "\n",
        );

        serve_lines(&mut host, router(), input.as_bytes()).await.unwrap();

        let replies = replies(&host);
        assert_eq!(replies.len(), 4);

        let by_id = |id: Value| replies.iter().find(|r| r.get("id") == Some(&id)).unwrap().clone();
        assert_eq!(by_id(1.into())["error"], "Invalid username format");
        assert_eq!(by_id("two".into())["ok"], true);

        assert!(replies.iter().any(|r| r["error"] == UNKNOWN_MESSAGE));
        assert!(replies.iter().any(|r| r["recent"].is_array()));
    }

    #[tokio::test]
    async fn crashed_handler_still_gets_a_failure_reply() {
        let mut host = TestHost::new();
        let input = "first\ncrash\nthird\n";

        answer_lines(&mut host, input.as_bytes(), |line| async move {
            assert_ne!(line, "crash", "handler crashed");
            json!({"ok": true, "echo": line}).to_string()
        })
        .await
        .unwrap();

        let replies = replies(&host);
        assert_eq!(replies.len(), 3);
        assert_eq!(replies.iter().filter(|r| r["error"] == HANDLER_FAILED).count(), 1);
        assert!(replies.iter().any(|r| r["echo"] == "first"));
        assert!(replies.iter().any(|r| r["echo"] == "third"));
    }

    #[tokio::test]
    async fn empty_input_writes_nothing() {
        let mut host = TestHost::new();
        serve_lines(&mut host, router(), &b""[..]).await.unwrap();
        assert!(host.output_buf.is_empty());
    }
}
