//! In-process stand-in for the management API. It serves the queue listing and the queue delete
//! endpoints, records every request and can be told how to answer deletes of specific queues.
use crate::client::{DEFAULT_VHOST, ENCODED_DEFAULT_VHOST};
use crate::model::Queue;
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use http_body_util::Full;
use hyper::{body::Incoming, header, server::conn::http1, service::service_fn, Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use log::error;
use serde_json::json;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// A request as the fake broker received it.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    /// The raw, still percent-encoded path.
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
}

#[derive(Default)]
struct State {
    queues: Vec<Queue>,
    listing_response: Option<(StatusCode, String)>,
    delete_responses: HashMap<String, (StatusCode, String)>,
    requests: Vec<RecordedRequest>,
    authorization: String,
}

pub struct FakeBroker {
    addr: SocketAddr,
    state: Arc<Mutex<State>>,
}

impl FakeBroker {
    /// Start serving on a random local port. The broker accepts `guest`/`guest` only.
    pub async fn start(queues: Vec<Queue>) -> std::io::Result<FakeBroker> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(Mutex::new(State {
            queues,
            authorization: format!("Basic {}", general_purpose::STANDARD.encode("guest:guest")),
            ..Default::default()
        }));

        let server_state = state.clone();

        tokio::spawn(async move {
            loop {
                let stream = match listener.accept().await {
                    Ok((stream, _)) => stream,
                    Err(e) => {
                        error!("Fake broker cannot accept {:?}", e);
                        break;
                    }
                };
                let state = server_state.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req| route(req, state.clone()));

                    if let Err(e) = http1::Builder::new().serve_connection(TokioIo::new(stream), service).await {
                        error!("Fake broker connection error {:?}", e);
                    }
                });
            }
        });

        Ok(FakeBroker { addr, state })
    }

    /// The base url to be passed to `ManagementClient::new`.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Answer the delete of the queue with the given status and body from now on. The queue is
    /// kept in the listing.
    pub fn respond_to_delete(&self, vhost: &str, name: &str, status: u16, body: &str) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        self.state
            .lock()
            .unwrap()
            .delete_responses
            .insert(queue_path(vhost, name), (status, body.to_string()));
    }

    /// Answer the queue listing with the given status and body instead of the queue list.
    pub fn respond_to_listing(&self, status: u16, body: &str) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        self.state.lock().unwrap().listing_response = Some((status, body.to_string()));
    }

    /// Make the queue look like it has consumers, the way RabbitMQ answers an `if-unused` delete.
    pub fn mark_in_use(&self, vhost: &str, name: &str) {
        let body = json!({
            "error": "bad_request",
            "reason": format!("Queue '{name}' in vhost '{vhost}' in use"),
        });

        self.respond_to_delete(vhost, name, 400, &body.to_string());
    }

    /// Queues which haven't been deleted yet.
    pub fn queues(&self) -> Vec<Queue> {
        self.state.lock().unwrap().queues.clone()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn deletes(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == Method::DELETE)
            .collect()
    }
}

fn queue_path(vhost: &str, name: &str) -> String {
    let vhost = if vhost == DEFAULT_VHOST { ENCODED_DEFAULT_VHOST } else { vhost };

    format!("/api/queues/{vhost}/{name}")
}

fn response(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::from(body)));
    *resp.status_mut() = status;

    resp
}

async fn route(req: Request<Incoming>, state: Arc<Mutex<State>>) -> Result<Response<Full<Bytes>>, Infallible> {
    let recorded = RecordedRequest {
        method: req.method().clone(),
        path: req.uri().path().to_string(),
        query: req.uri().query().map(str::to_string),
        authorization: req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    let mut state = state.lock().unwrap();

    state.requests.push(recorded.clone());

    if recorded.authorization.as_deref() != Some(state.authorization.as_str()) {
        let body = json!({"error": "not_authorized", "reason": "Login failed"});

        return Ok(response(StatusCode::UNAUTHORIZED, body.to_string()));
    }

    match (&recorded.method, recorded.path.as_str()) {
        (&Method::GET, "/api/queues" | "/api/queues/") => {
            if let Some((status, body)) = &state.listing_response {
                return Ok(response(*status, body.clone()));
            }

            let listing = state
                .queues
                .iter()
                .map(|q| {
                    json!({
                        "name": q.name,
                        "vhost": q.vhost,
                        "durable": true,
                        "auto_delete": false,
                        "consumers": 0,
                        "messages": 0,
                        "arguments": {},
                    })
                })
                .collect::<Vec<_>>();

            Ok(response(StatusCode::OK, serde_json::Value::Array(listing).to_string()))
        }
        (&Method::DELETE, path) => {
            if let Some((status, body)) = state.delete_responses.get(path) {
                return Ok(response(*status, body.clone()));
            }

            match state.queues.iter().position(|q| queue_path(&q.vhost, &q.name) == path) {
                Some(index) => {
                    state.queues.remove(index);

                    Ok(response(StatusCode::NO_CONTENT, String::new()))
                }
                None => {
                    let body = json!({"error": "Object Not Found", "reason": "Not Found"});

                    Ok(response(StatusCode::NOT_FOUND, body.to_string()))
                }
            }
        }
        _ => Ok(response(StatusCode::NOT_FOUND, "Not Found".to_string())),
    }
}
