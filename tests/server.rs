//! End-to-end: endpoints behind the router, the binding and a real socket.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::timeout;
use tsu_endpoint::hooks::{content_type_finalize, payload_bytes};
use tsu_endpoint::{ContextExt, Control, Input, Key, Output, Request, Router, Server, binding};

const SEEN_BY: Key<String> = Key::new("seen_by");

fn tagging_initialize(input: &mut Input<'_>) {
    binding::initialize(input);
    input.context_mut().set(SEEN_BY, "initializer".to_owned());
}

fn show_clip(input: &mut Input<'_>) -> Option<Output> {
    let id = input.params().require("id");
    let seen_by = input.context().require(SEEN_BY);
    let loopback = input.context().get(binding::REMOTE_ADDR).map(|a| a.ip().is_loopback());
    Some(Output::new(StatusCode::OK).with_data(json!({
        "id": id,
        "seen_by": seen_by,
        "loopback": loopback,
    })))
}

fn clip_owner(input: &mut Input<'_>) -> Option<Output> {
    let owner = input.params().require("owner");
    Some(Output::new(StatusCode::OK).with_data(owner.to_owned()))
}

fn stream(input: &mut Input<'_>) -> Option<Output> {
    let w = input.writer();
    w.set_header("content-type", "text/plain").ok()?;
    w.write_head(StatusCode::ACCEPTED).ok()?;
    w.write_body(b"a").ok()?;
    w.write_body(b"b").ok()?;
    None
}

async fn healthz(_req: Request) -> &'static str {
    "ok"
}

fn app() -> Router {
    let control = Control::new(tagging_initialize, content_type_finalize, payload_bytes);
    Router::new()
        .get("/clips/{id}", control.handler(show_clip))
        .get("/clips/{id}/owner", control.handler(clip_owner))
        .post("/stream", control.handler(stream))
        .get("/healthz", healthz)
}

fn get(path: &str) -> http::Request<Full<Bytes>> {
    http::Request::builder().uri(path).body(Full::new(Bytes::new())).unwrap()
}

async fn send(addr: SocketAddr, raw: &str) -> io::Result<String> {
    let mut stream = TcpStream::connect(addr).await?;
    stream.write_all(raw.as_bytes()).await?;
    let mut buf = String::new();
    stream.read_to_string(&mut buf).await?;
    Ok(buf)
}

#[tokio::test]
async fn route_params_reach_the_endpoint() {
    let res = app().handle(get("/clips/42")).await;

    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/json");
    let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(body, json!({"id": "42", "seen_by": "initializer", "loopback": null}));
}

#[tokio::test]
#[should_panic(expected = "key missing from MatchitParams: owner")]
async fn missing_route_param_aborts_the_request() {
    app().handle(get("/clips/42/owner")).await;
}

#[tokio::test]
async fn plain_handlers_share_the_router() {
    let res = app().handle(get("/healthz")).await;
    assert_eq!(res.body().as_ref(), b"ok");
    assert_eq!(app().handle(get("/nope")).await.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn serves_over_tcp_and_shuts_down() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let server = tokio::spawn(Server::from_listener(listener).serve_with_shutdown(app(), async move {
        let _ = rx.await;
    }));

    let res = send(addr, "GET /clips/7 HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n")
        .await
        .unwrap();
    assert!(res.starts_with("HTTP/1.1 200 OK\r\n"), "{res}");
    assert!(res.contains("content-type: application/json\r\n"), "{res}");
    assert!(res.ends_with(r#"{"id":"7","loopback":true,"seen_by":"initializer"}"#), "{res}");

    let res = send(
        addr,
        "POST /stream HTTP/1.1\r\nhost: localhost\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
    )
    .await
    .unwrap();
    assert!(res.starts_with("HTTP/1.1 202 Accepted\r\n"), "{res}");
    assert!(res.contains("content-type: text/plain\r\n"), "{res}");
    assert!(res.ends_with("\r\n\r\nab"), "{res}");

    let res = send(addr, "GET /missing HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n")
        .await
        .unwrap();
    assert!(res.starts_with("HTTP/1.1 404 Not Found\r\n"), "{res}");

    // A fatal lookup kills the connection without a response.
    let res = send(addr, "GET /clips/7/owner HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n").await;
    assert!(res.map(|s| s.is_empty()).unwrap_or(true));

    tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn shutdown_closes_idle_keep_alive_connections() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let server = tokio::spawn(Server::from_listener(listener).serve_with_shutdown(app(), async move {
        let _ = rx.await;
    }));

    // No `connection: close`, so the connection stays open after the response.
    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(b"GET /healthz HTTP/1.1\r\nhost: localhost\r\n\r\n").await.unwrap();

    let mut res = Vec::new();
    let mut chunk = [0u8; 1024];
    while !res.ends_with(b"\r\n\r\nok") {
        let n = client.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before the response was complete");
        res.extend_from_slice(&chunk[..n]);
    }
    assert!(res.starts_with(b"HTTP/1.1 200 OK\r\n"));

    tx.send(()).unwrap();
    timeout(Duration::from_secs(3), server)
        .await
        .expect("server kept waiting on an idle connection")
        .unwrap()
        .unwrap();

    // The server hung up on the idle client.
    let n = timeout(Duration::from_secs(1), client.read(&mut chunk)).await.unwrap().unwrap_or(0);
    assert_eq!(n, 0);
}
