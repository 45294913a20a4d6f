//! A local HTTP server standing in for an upstream API. It records every
//! request it receives and answers from a fixed routing function.

use actix_web::{http::StatusCode, web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Maps `(method, raw path)` to a status code and JSON body.
pub type Responder = fn(&str, &str) -> (u16, Value);

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    /// Path as sent on the wire, percent-encoding intact.
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

pub struct StubUpstream {
    pub base_url: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl StubUpstream {
    /// Binds an ephemeral port on loopback and serves until the test's
    /// runtime shuts down. Must be called from an actix system.
    pub fn start(respond: Responder) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let captured = requests.clone();

        let server = HttpServer::new(move || {
            let captured = captured.clone();
            App::new().default_service(web::to(move |req: HttpRequest, body: web::Bytes| {
                let captured = captured.clone();
                async move {
                    let method = req.method().to_string();
                    let path = req.uri().path().to_string();
                    captured.lock().unwrap().push(CapturedRequest {
                        method: method.clone(),
                        path: path.clone(),
                        authorization: req
                            .headers()
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(String::from),
                        body: serde_json::from_slice(&body).ok(),
                    });

                    let (status, json) = respond(&method, &path);
                    HttpResponse::build(StatusCode::from_u16(status).unwrap()).json(json)
                }
            }))
        })
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))
        .expect("bind stub upstream");

        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());

        Self {
            base_url: format!("http://{}", addr),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}
