//! End-to-end tests through the listening HTTP server.

use reverse_balancer::http::HttpServer;
use reverse_balancer::lifecycle::Shutdown;
use std::time::Duration;
use tokio::net::TcpListener;

mod common;
use common::{config_for, MockBackend, BACKEND_HEADER};

async fn start_balancer(servers: &[String], shutdown: &Shutdown) -> (String, tokio::task::JoinHandle<()>) {
    let config = config_for(servers, |c| c.sticky_sessions = true);
    let server = HttpServer::new(config);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let rx = shutdown.subscribe();

    let handle = tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });
    (format!("http://{addr}"), handle)
}

#[tokio::test]
async fn proxies_and_pins_sessions_end_to_end() {
    let b0 = MockBackend::start().await;
    let b1 = MockBackend::start().await;
    let shutdown = Shutdown::new();
    let (base, handle) = start_balancer(&[b0.url(), b1.url()], &shutdown).await;

    let client = reqwest::Client::new();
    let first = client.get(format!("{base}/hello")).send().await.unwrap();
    assert_eq!(first.status(), 200);
    assert!(first.headers().contains_key("x-request-id"));

    let pinned = first.headers()[BACKEND_HEADER].to_str().unwrap().to_string();
    let cookie = first.headers()["set-cookie"]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    for _ in 0..4 {
        let response = client
            .post(format!("{base}/orders"))
            .header("cookie", &cookie)
            .body("{}")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()[BACKEND_HEADER].to_str().unwrap(), pinned);
    }

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not shut down")
        .unwrap();
}

#[tokio::test]
async fn request_id_is_propagated_when_supplied() {
    let backend = MockBackend::start().await;
    let shutdown = Shutdown::new();
    let (base, _handle) = start_balancer(&[backend.url()], &shutdown).await;

    let response = reqwest::Client::new()
        .get(format!("{base}/"))
        .header("x-request-id", "req-42")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");
    shutdown.trigger();
}
