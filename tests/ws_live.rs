// tests/ws_live.rs
//
// Live WebSocket round trip against a real listener:
// - a connected client receives an accepted record as one text frame
// - closing the client deregisters it, later broadcasts do not fail the engine

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use status_relay::api::{self, AppState};
use status_relay::{Entry, FeedError, FeedFetcher, Provider, SubscriberRegistry, UpdateEngine};

#[derive(Default)]
struct OneFeed(Mutex<Vec<Entry>>);

#[async_trait]
impl FeedFetcher for OneFeed {
    async fn fetch(&self, _provider: &Provider) -> Result<Vec<Entry>, FeedError> {
        Ok(self.0.lock().clone())
    }
}

fn entry(hour: u32, title: &str) -> Entry {
    Entry {
        title: title.to_string(),
        summary: "<p>Status: <b>Investigating</b></p>  issue".to_string(),
        published_at: NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap(),
    }
}

async fn wait_for_subscribers(registry: &SubscriberRegistry, n: usize) {
    for _ in 0..200 {
        if registry.len() == n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {n} subscribers, have {}", registry.len());
}

#[tokio::test]
async fn websocket_client_receives_accepted_record_once() {
    let feed = Arc::new(OneFeed::default());
    let registry = Arc::new(SubscriberRegistry::new());
    let engine = Arc::new(UpdateEngine::new(feed.clone(), registry.clone(), 10));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = api::router(AppState::new(engine.clone()));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let (mut ws, _resp) = connect_async(format!("ws://{addr}/ws")).await.expect("connect");
    wait_for_subscribers(&registry, 1).await;

    let acme = Provider::new("Acme", "mem://acme");
    *feed.0.lock() = vec![entry(10, "API degraded")];
    let out = engine.process_provider(&acme).await;
    assert_eq!(out.accepted.len(), 1);

    let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("push within timeout")
        .expect("stream open")
        .expect("frame ok");
    match frame {
        Message::Text(text) => {
            assert_eq!(
                text.as_str(),
                "[2024-01-02 10:00:00] Product: Acme - API degraded\nStatus: Investigating issue\n"
            );
        }
        other => panic!("expected text frame, got {other:?}"),
    }

    // Nothing new: no further frame.
    engine.process_provider(&acme).await;
    assert!(
        tokio::time::timeout(Duration::from_millis(200), ws.next())
            .await
            .is_err(),
        "unexpected second push"
    );

    ws.send(Message::Close(None)).await.unwrap();
    wait_for_subscribers(&registry, 0).await;

    *feed.0.lock() = vec![entry(11, "Resolved")];
    let out = engine.process_provider(&acme).await;
    assert_eq!(out.accepted.len(), 1);
    assert!(out.error.is_none());
}
