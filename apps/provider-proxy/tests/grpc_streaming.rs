//! gRPC Streaming Integration Tests
//!
//! Tests the full data flow from message injection to gRPC client reception.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::time::timeout;
use tonic::Request;
use tonic::transport::{Channel, Server};
use tokio_util::sync::CancellationToken;

use provider_proxy::infrastructure::provider::{
    Credentials, MacroFeedClient, MacroFeedConfig, NewsSentimentFeedClient,
    NewsSentimentFeedConfig, PriceFeedClient, PriceFeedConfig,
};
use provider_proxy::{
    BroadcastConfig, BroadcastHub, MacroSeriesUpdateMessage, NewsSentimentUpdateMessage,
    PriceUpdateMessage, StreamProxyServer, StreamProxyServerConfig, SubscriptionManager,
    proto::{
        Environment, GetConnectionStatusRequest, StreamMacroSeriesRequest,
        StreamNewsSentimentRequest, StreamPricesRequest,
        provider_proxy_service_client::ProviderProxyServiceClient,
        provider_proxy_service_server::ProviderProxyServiceServer,
    },
};

/// Start a test gRPC server on a random port and return the client.
async fn setup_test_server() -> (
    ProviderProxyServiceClient<Channel>,
    Arc<BroadcastHub>,
    tokio::task::JoinHandle<()>,
) {
    let broadcast_hub = Arc::new(BroadcastHub::new(BroadcastConfig::default()));
    let subscription_manager = Arc::new(SubscriptionManager::new());

    let config = StreamProxyServerConfig {
        version: "test-0.0.1".to_string(),
        environment: Environment::Paper,
    };

    let credentials = Credentials::new("test-key", "test-secret").unwrap();
    let cancel = CancellationToken::new();
    let (price_tx, _price_rx) = tokio::sync::mpsc::channel(16);
    let (macro_tx, _macro_rx) = tokio::sync::mpsc::channel(16);
    let (news_tx, _news_rx) = tokio::sync::mpsc::channel(16);

    let price_client = Arc::new(PriceFeedClient::new(
        PriceFeedConfig::new("wss://test.invalid/price".to_string(), credentials.clone()),
        price_tx,
        cancel.clone(),
    ));
    let macro_client = Arc::new(MacroFeedClient::new(
        MacroFeedConfig::new("wss://test.invalid/macro".to_string(), credentials.clone()),
        macro_tx,
        cancel.clone(),
    ));
    let news_sentiment_client = Arc::new(NewsSentimentFeedClient::new(
        NewsSentimentFeedConfig::new("wss://test.invalid/news".to_string(), credentials),
        news_tx,
        cancel,
    ));

    let server = StreamProxyServer::new(
        config,
        Arc::clone(&broadcast_hub),
        subscription_manager,
        price_client,
        macro_client,
        news_sentiment_client,
    );

    // Find an available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Start gRPC server
    let server_handle = tokio::spawn(async move {
        Server::builder()
            .add_service(ProviderProxyServiceServer::new(server))
            .serve_with_incoming(tokio_stream::wrappers::TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    // Give server time to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Create client
    let client = ProviderProxyServiceClient::connect(format!("http://{addr}"))
        .await
        .unwrap();

    (client, broadcast_hub, server_handle)
}

fn make_test_price(security_id: &str, close: f64) -> PriceUpdateMessage {
    PriceUpdateMessage {
        msg_type: "price".to_string(),
        security_id: security_id.to_string(),
        close: Decimal::try_from(close).unwrap(),
        currency: "USD".to_string(),
        source: "primary".to_string(),
        timestamp: Utc::now(),
    }
}

fn make_test_macro_series(series_name: &str, value: f64) -> MacroSeriesUpdateMessage {
    MacroSeriesUpdateMessage {
        msg_type: "macro".to_string(),
        series_name: series_name.to_string(),
        value: Decimal::try_from(value).unwrap(),
        source: "primary".to_string(),
        timestamp: Utc::now(),
    }
}

fn make_test_news_sentiment(security_id: &str, score: f64) -> NewsSentimentUpdateMessage {
    NewsSentimentUpdateMessage {
        msg_type: "news_sentiment".to_string(),
        security_id: security_id.to_string(),
        score: Decimal::try_from(score).unwrap(),
        source: "primary".to_string(),
        headline: Some("headline".to_string()),
        timestamp: Utc::now(),
    }
}

// =============================================================================
// Connection Status Tests
// =============================================================================

#[tokio::test]
async fn test_get_connection_status() {
    let (mut client, _hub, handle) = setup_test_server().await;

    let response = client
        .get_connection_status(Request::new(GetConnectionStatusRequest {}))
        .await
        .unwrap();

    let status = response.into_inner().status.unwrap();
    assert_eq!(status.version, "test-0.0.1");
    assert_eq!(status.environment, Environment::Paper as i32);
    assert_eq!(status.feeds.len(), 3); // price, macro, news sentiment

    handle.abort();
}

// =============================================================================
// Price Streaming Tests
// =============================================================================

#[tokio::test]
async fn test_stream_prices_receives_broadcast_messages() {
    let (mut client, hub, handle) = setup_test_server().await;

    // Start streaming (subscribe to all security ids)
    let mut stream = client
        .stream_prices(Request::new(StreamPricesRequest {
            security_ids: vec![], // Empty = subscribe to all
        }))
        .await
        .unwrap()
        .into_inner();

    // Give stream time to set up
    tokio::time::sleep(Duration::from_millis(20)).await;

    let price = make_test_price("AAPL", 150.0);
    let _ = hub.send_price(price);

    let received = timeout(Duration::from_secs(2), stream.message())
        .await
        .expect("timeout waiting for price")
        .expect("stream error")
        .expect("no message");

    let price = received.price.unwrap();
    assert_eq!(price.security_id, "AAPL");
    assert!((price.close - 150.0).abs() < 0.01);

    handle.abort();
}

#[tokio::test]
async fn test_stream_prices_filters_by_security_id() {
    let (mut client, hub, handle) = setup_test_server().await;

    // Subscribe only to AAPL
    let mut stream = client
        .stream_prices(Request::new(StreamPricesRequest {
            security_ids: vec!["AAPL".to_string()],
        }))
        .await
        .unwrap()
        .into_inner();

    tokio::time::sleep(Duration::from_millis(20)).await;

    // Send prices for different securities
    let _ = hub.send_price(make_test_price("MSFT", 300.0));
    let _ = hub.send_price(make_test_price("AAPL", 150.0));
    let _ = hub.send_price(make_test_price("GOOG", 140.0));

    // Should only receive AAPL
    let received = timeout(Duration::from_secs(2), stream.message())
        .await
        .expect("timeout")
        .expect("error")
        .expect("no message");

    assert_eq!(received.price.unwrap().security_id, "AAPL");

    // No more messages should be immediately available (MSFT and GOOG filtered)
    let result = timeout(Duration::from_millis(100), stream.message()).await;
    assert!(
        result.is_err(),
        "should timeout - no more messages expected"
    );

    handle.abort();
}

// =============================================================================
// Macro Series Streaming Tests
// =============================================================================

#[tokio::test]
async fn test_stream_macro_series_receives_broadcast_messages() {
    let (mut client, hub, handle) = setup_test_server().await;

    let mut stream = client
        .stream_macro_series(Request::new(StreamMacroSeriesRequest {
            series_names: vec![],
        }))
        .await
        .unwrap()
        .into_inner();

    tokio::time::sleep(Duration::from_millis(20)).await;

    let _ = hub.send_macro_series(make_test_macro_series("CPI_YOY", 3.2));

    let received = timeout(Duration::from_secs(2), stream.message())
        .await
        .expect("timeout")
        .expect("error")
        .expect("no message");

    let series = received.series.unwrap();
    assert_eq!(series.series_name, "CPI_YOY");
    assert!((series.value - 3.2).abs() < 0.01);

    handle.abort();
}

// =============================================================================
// News Sentiment Streaming Tests
// =============================================================================

#[tokio::test]
async fn test_stream_news_sentiment_receives_broadcast_messages() {
    let (mut client, hub, handle) = setup_test_server().await;

    let mut stream = client
        .stream_news_sentiment(Request::new(StreamNewsSentimentRequest {
            security_ids: vec![],
        }))
        .await
        .unwrap()
        .into_inner();

    tokio::time::sleep(Duration::from_millis(20)).await;

    let _ = hub.send_news_sentiment(make_test_news_sentiment("TSLA", 0.65));

    let received = timeout(Duration::from_secs(2), stream.message())
        .await
        .expect("timeout")
        .expect("error")
        .expect("no message");

    let sentiment = received.sentiment.unwrap();
    assert_eq!(sentiment.security_id, "TSLA");
    assert!((sentiment.score - 0.65).abs() < 0.01);
    assert_eq!(sentiment.headline.as_deref(), Some("headline"));

    handle.abort();
}

// =============================================================================
// Multiple Consumer Tests
// =============================================================================

#[tokio::test]
async fn test_multiple_consumers_receive_same_message() {
    let (mut client1, hub, handle) = setup_test_server().await;
    let mut client2 = client1.clone();

    // Both clients subscribe to AAPL
    let mut stream1 = client1
        .stream_prices(Request::new(StreamPricesRequest {
            security_ids: vec!["AAPL".to_string()],
        }))
        .await
        .unwrap()
        .into_inner();

    let mut stream2 = client2
        .stream_prices(Request::new(StreamPricesRequest {
            security_ids: vec!["AAPL".to_string()],
        }))
        .await
        .unwrap()
        .into_inner();

    tokio::time::sleep(Duration::from_millis(20)).await;

    // Send one price update
    let _ = hub.send_price(make_test_price("AAPL", 150.0));

    // Both should receive it
    let r1 = timeout(Duration::from_secs(2), stream1.message())
        .await
        .expect("timeout")
        .expect("error")
        .expect("no message");

    let r2 = timeout(Duration::from_secs(2), stream2.message())
        .await
        .expect("timeout")
        .expect("error")
        .expect("no message");

    assert_eq!(r1.price.unwrap().security_id, "AAPL");
    assert_eq!(r2.price.unwrap().security_id, "AAPL");

    handle.abort();
}

#[tokio::test]
async fn test_consumers_with_overlapping_security_ids() {
    let (mut client1, hub, handle) = setup_test_server().await;
    let mut client2 = client1.clone();

    // Client 1 subscribes to AAPL and MSFT
    let mut stream1 = client1
        .stream_prices(Request::new(StreamPricesRequest {
            security_ids: vec!["AAPL".to_string(), "MSFT".to_string()],
        }))
        .await
        .unwrap()
        .into_inner();

    // Client 2 subscribes to MSFT and GOOG
    let mut stream2 = client2
        .stream_prices(Request::new(StreamPricesRequest {
            security_ids: vec!["MSFT".to_string(), "GOOG".to_string()],
        }))
        .await
        .unwrap()
        .into_inner();

    tokio::time::sleep(Duration::from_millis(20)).await;

    // Send MSFT price (both should receive)
    let _ = hub.send_price(make_test_price("MSFT", 300.0));

    let r1 = timeout(Duration::from_secs(2), stream1.message())
        .await
        .expect("timeout")
        .expect("error")
        .expect("no message");

    let r2 = timeout(Duration::from_secs(2), stream2.message())
        .await
        .expect("timeout")
        .expect("error")
        .expect("no message");

    assert_eq!(r1.price.unwrap().security_id, "MSFT");
    assert_eq!(r2.price.unwrap().security_id, "MSFT");

    // Send AAPL price (only client 1 should receive)
    let _ = hub.send_price(make_test_price("AAPL", 150.0));

    let r1 = timeout(Duration::from_secs(2), stream1.message())
        .await
        .expect("timeout")
        .expect("error")
        .expect("no message");

    assert_eq!(r1.price.unwrap().security_id, "AAPL");

    // Client 2 should not receive (AAPL not in subscription)
    let result = timeout(Duration::from_millis(100), stream2.message()).await;
    assert!(result.is_err());

    handle.abort();
}

// =============================================================================
// High Throughput Tests
// =============================================================================

#[tokio::test]
async fn test_high_throughput_price_streaming() {
    let (mut client, hub, handle) = setup_test_server().await;

    let mut stream = client
        .stream_prices(Request::new(StreamPricesRequest {
            security_ids: vec![],
        }))
        .await
        .unwrap()
        .into_inner();

    tokio::time::sleep(Duration::from_millis(20)).await;

    // Send 100 price updates rapidly
    for i in 0..100 {
        let _ = hub.send_price(make_test_price("AAPL", f64::from(i).mul_add(0.01, 150.0)));
    }

    // Count received messages
    let mut count = 0;
    let start = std::time::Instant::now();

    while count < 100 && start.elapsed() < Duration::from_secs(5) {
        if let Ok(Ok(Some(_))) = timeout(Duration::from_millis(100), stream.message()).await {
            count += 1;
        } else {
            break;
        }
    }

    // Should receive all or most messages (some may be lagged if buffer full)
    assert!(count >= 90, "Expected at least 90 messages, got {count}");

    handle.abort();
}
