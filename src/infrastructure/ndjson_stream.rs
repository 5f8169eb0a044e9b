// Newline-delimited JSON streaming of realtime updates
use crate::domain::robot::RealtimeUpdate;
use axum::body::Body;
use axum::http::{Response, StatusCode, header};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::StreamExt;
use futures::stream::Stream;
use std::future::Future;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

/// Create a chunked NDJSON streaming response, one update per line
pub fn ndjson_stream<S>(stream: S) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = RealtimeUpdate> + Send + 'static,
{
    let byte_stream = stream.map(|update| serialize_line(&update));
    let body = Body::from_stream(byte_stream);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(body)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

fn serialize_line(update: &RealtimeUpdate) -> Result<Bytes, std::io::Error> {
    let json = serde_json::to_vec(update).map_err(std::io::Error::other)?;
    let mut line = BytesMut::with_capacity(json.len() + 1);
    line.put_slice(&json);
    line.put_u8(b'\n');
    Ok(line.freeze())
}

/// Replay `backlog` (oldest first), then follow the live feed until the
/// sender closes or `shutdown` resolves. A subscriber that falls behind skips
/// the missed updates instead of disconnecting.
pub fn stream_updates<F>(
    backlog: Vec<RealtimeUpdate>,
    rx: broadcast::Receiver<RealtimeUpdate>,
    shutdown: F,
) -> impl IntoResponse
where
    F: Future<Output = ()> + Send + 'static,
{
    let stream = async_stream::stream! {
        for update in backlog {
            yield update;
        }
        let mut shutdown = Box::pin(shutdown);
        let mut live = BroadcastStream::new(rx);
        loop {
            let next = tokio::select! {
                _ = &mut shutdown => None,
                item = live.next() => item,
            };
            match next {
                Some(Ok(update)) => yield update,
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    tracing::warn!(skipped, "update stream subscriber lagged");
                }
                None => break,
            }
        }
        tracing::debug!("update stream closed");
    };

    match ndjson_stream(stream) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::robot::{UpdateKind, UpdateValue};
    use chrono::Utc;

    fn update(robot_id: &str, new: f64) -> RealtimeUpdate {
        RealtimeUpdate {
            kind: UpdateKind::Battery,
            robot_id: robot_id.to_string(),
            old_value: UpdateValue::Number(50.0),
            new_value: UpdateValue::Number(new),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_one_update_per_line() {
        let updates = vec![update("AURA-001", 49.0), update("AURA-002", 51.0)];
        let response = ndjson_stream(futures::stream::iter(updates)).unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/x-ndjson");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["robot_id"], "AURA-001");
        assert_eq!(lines[1]["new_value"], 51.0);
        assert_eq!(lines[1]["kind"], "battery");
    }

    fn robot_ids(body: &[u8]) -> Vec<String> {
        String::from_utf8(body.to_vec())
            .unwrap()
            .lines()
            .map(|l| {
                let value: serde_json::Value = serde_json::from_str(l).unwrap();
                value["robot_id"].as_str().unwrap().to_string()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_backlog_then_live_until_sender_closes() {
        let (tx, rx) = broadcast::channel(8);
        let response =
            stream_updates(vec![update("AURA-001", 10.0)], rx, std::future::pending()).into_response();

        tx.send(update("AURA-002", 20.0)).unwrap();
        drop(tx);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(robot_ids(&body), vec!["AURA-001", "AURA-002"]);
    }

    #[tokio::test]
    async fn test_shutdown_ends_stream_while_sender_is_alive() {
        let (tx, rx) = broadcast::channel(8);
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let response = stream_updates(Vec::new(), rx, async move {
            let _ = stop_rx.await;
        })
        .into_response();

        tx.send(update("AURA-003", 30.0)).unwrap();
        stop_tx.send(()).unwrap();

        let body = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            axum::body::to_bytes(response.into_body(), usize::MAX),
        )
        .await
        .expect("stream did not end after shutdown")
        .unwrap();
        assert!(robot_ids(&body).len() <= 1);
        drop(tx);
    }
}
