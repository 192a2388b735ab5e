//! Endpoints as plain functions behind the matchit binding.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -X POST http://localhost:3000/users -d '{"name":"alice"}'
//!   curl -X DELETE http://localhost:3000/users/42
//!   curl http://localhost:3000/events
//!   curl http://localhost:3000/healthz

use http::StatusCode;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;
use tsu_endpoint::{
    ContentType, ContextExt, Input, Key, Output, Request, Response, Router, Server, binding,
};

const CALLER: Key<String> = Key::new("caller");

#[tokio::main]
async fn main() -> Result<(), tsu_endpoint::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr = std::env::var("TSU_LISTEN_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_owned());

    let control = binding::control();
    let app = Router::new()
        .get("/users/{id}",    control.handler(get_user))
        .post("/users",        control.handler(create_user))
        .delete("/users/{id}", control.handler(delete_user))
        .get("/events",        control.handler(events))
        .get("/healthz",       healthz)
        .get("/",              index);

    Server::bind(&addr)?.serve(app).await
}

// GET /users/{id}
fn get_user(input: &mut Input<'_>) -> Option<Output> {
    let id = input.params().require("id").to_owned();
    let caller = input.request().header("x-caller").unwrap_or("anonymous").to_owned();
    input.context_mut().set(CALLER, caller);

    let caller = input.context().require(CALLER);
    Some(Output::new(StatusCode::OK).with_data(json!({ "id": id, "name": "alice", "caller": caller })))
}

// POST /users
//
// The body arrives as bytes; parsing it is the endpoint's business.
fn create_user(input: &mut Input<'_>) -> Option<Output> {
    let Ok(user) = serde_json::from_slice::<Value>(input.request().body()) else {
        return Some(Output::new(StatusCode::BAD_REQUEST).with_data("body must be JSON"));
    };
    Some(
        Output::new(StatusCode::CREATED)
            .header("location", "/users/99")
            .with_data(json!({ "id": "99", "name": user["name"] })),
    )
}

// DELETE /users/{id} → 204 No Content
fn delete_user(_input: &mut Input<'_>) -> Option<Output> {
    Some(Output::new(StatusCode::NO_CONTENT))
}

// GET /events: writes the response itself and opts out of the pipeline.
fn events(input: &mut Input<'_>) -> Option<Output> {
    let w = input.writer();
    w.set_header("content-type", ContentType::EventStream.as_str()).ok()?;
    w.write_head(StatusCode::OK).ok()?;
    for n in 1..=3 {
        w.write_body(format!("data: tick {n}\n\n").as_bytes()).ok()?;
    }
    None
}

// Plain router handlers still work alongside endpoints.
async fn healthz(_req: Request) -> &'static str {
    "ok"
}

async fn index(_req: Request) -> Response {
    Response::bytes(
        ContentType::Html,
        "<a href=\"/events\">events</a> <a href=\"/users/1\">user 1</a>",
    )
}
