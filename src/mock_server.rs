use crate::{
    data::{Interaction, RequestData},
    error::Error,
    matching, util,
};
use hyper::{
    body,
    service::{make_service_fn, service_fn},
    Body, Request, Response, Server,
};
use std::{
    convert::Infallible,
    fmt::{self, Display},
    net::SocketAddr,
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};
use tokio::{runtime::Runtime, sync::oneshot};

/// What `verify` found wanting: interactions that were never exercised
/// and requests no interaction matched.
#[derive(Debug, Clone)]
pub struct ExpectationReport {
    pub unmatched: Vec<String>,
    pub unexpected: Vec<RequestData>,
}

impl Display for ExpectationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} unmatched interaction(s) [{}], {} unexpected request(s) [{}]",
            self.unmatched.len(),
            self.unmatched.join(", "),
            self.unexpected.len(),
            self.unexpected
                .iter()
                .map(|r| format!("{} {}", r.method, r.uri))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

#[derive(Debug)]
struct RegisteredInteraction {
    interaction: Interaction,
    match_count: usize,
}

#[derive(Debug, Default)]
struct MockState {
    registered: Vec<RegisteredInteraction>,
    unexpected: Vec<RequestData>,
}

/// An in-process mock server bound to one port for the lifetime of one
/// session. Runs hyper on a dedicated thread with its own runtime so it
/// serves requests regardless of the caller's async context.
#[derive(Debug)]
pub struct MockServer {
    port: u16,
    state: Arc<Mutex<MockState>>,
    shutdown: Option<oneshot::Sender<()>>,
    join_handle: Option<JoinHandle<()>>,
}

impl MockServer {
    pub fn start(port: u16) -> Result<Self, Error> {
        let state = Arc::new(Mutex::new(MockState::default()));
        let service_state = state.clone();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (bound_tx, bound_rx) = mpsc::channel::<Result<(), Error>>();

        let join_handle = thread::spawn(move || {
            let runtime = match Runtime::new() {
                Ok(runtime) => runtime,
                Err(e) => {
                    let _ = bound_tx.send(Err(Error::ServerStart(e.to_string())));
                    return;
                }
            };

            runtime.block_on(async move {
                let addr = SocketAddr::from(([127, 0, 0, 1], port));

                let builder = match Server::try_bind(&addr) {
                    Ok(builder) => builder,
                    Err(e) => {
                        let _ = bound_tx.send(Err(Error::ServerStart(e.to_string())));
                        return;
                    }
                };

                let server = builder.serve(make_service_fn(move |_| {
                    let state = service_state.clone();
                    async move {
                        Ok::<_, Infallible>(service_fn(move |request| {
                            let state = state.clone();
                            async move {
                                Ok::<_, Infallible>(handle_request(state, request).await)
                            }
                        }))
                    }
                }));

                let _ = bound_tx.send(Ok(()));

                let graceful = server.with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                });

                if let Err(e) = graceful.await {
                    tracing::error!("mock server error: {}", e);
                }
            });
        });

        match bound_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = join_handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = join_handle.join();
                return Err(Error::ServerStart(
                    "the server thread exited before binding".into(),
                ));
            }
        }

        tracing::debug!(port, "mock server started");

        Ok(Self {
            port,
            state,
            shutdown: Some(shutdown_tx),
            join_handle: Some(join_handle),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Registers one interaction, acknowledging once the server will
    /// match against it. Duplicate descriptions are accepted with a
    /// warning; a response status outside 100..=599 is rejected.
    pub async fn register(&self, interaction: Interaction) -> Result<(), Error> {
        if !(100..=599).contains(&interaction.response.status) {
            return Err(Error::Registration(format!(
                "response status {} out of range in '{}'",
                interaction.response.status, interaction.description
            )));
        }

        let mut state = self.state.lock()?;

        if state
            .registered
            .iter()
            .any(|r| r.interaction.description == interaction.description)
        {
            tracing::warn!(
                description = %interaction.description,
                "duplicate interaction description registered"
            );
        }

        tracing::debug!(description = %interaction.description, "interaction registered");
        state.registered.push(RegisteredInteraction {
            interaction,
            match_count: 0,
        });

        Ok(())
    }

    /// Succeeds iff every registered interaction was matched at least
    /// once and no unexpected request arrived. Idempotent.
    pub fn verify(&self) -> Result<(), Error> {
        let state = self.state.lock()?;

        let unmatched: Vec<String> = state
            .registered
            .iter()
            .filter(|r| r.match_count == 0)
            .map(|r| r.interaction.description.clone())
            .collect();

        if unmatched.is_empty() && state.unexpected.is_empty() {
            Ok(())
        } else {
            Err(Error::UnmetExpectations(ExpectationReport {
                unmatched,
                unexpected: state.unexpected.clone(),
            }))
        }
    }

    /// The registered interactions in registration order.
    pub fn interactions(&self) -> Result<Vec<Interaction>, Error> {
        let state = self.state.lock()?;
        Ok(state
            .registered
            .iter()
            .map(|r| r.interaction.clone())
            .collect())
    }

    pub fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }

        if let Some(join_handle) = self.join_handle.take() {
            let _ = join_handle.join();
            tracing::debug!(port = self.port, "mock server stopped");
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn handle_request(state: Arc<Mutex<MockState>>, mut request: Request<Body>) -> Response<Body> {
    let request_data = match read_request_data(&mut request).await {
        Ok(request_data) => request_data,
        Err(_) => return plain_response(500, "the request body could not be read"),
    };

    match respond(&state, request_data) {
        Ok(response) => response,
        Err(e) => plain_response(500, &e.to_string()),
    }
}

fn respond(state: &Arc<Mutex<MockState>>, request_data: RequestData) -> Result<Response<Body>, Error> {
    let mut state = state.lock()?;

    let matched = state
        .registered
        .iter_mut()
        .find(|r| matching::request_matches(&r.interaction.request, &request_data));

    match matched {
        Some(registered) => {
            registered.match_count += 1;
            let response = &registered.interaction.response;

            let mut response_builder = Response::builder().status(response.status);
            if let Some(header_map) = response_builder.headers_mut() {
                util::put_headers(header_map, &response.headers)?;
            }

            Ok(response_builder.body(response.body_string().into())?)
        }
        None => {
            tracing::warn!(
                method = %request_data.method,
                uri = %request_data.uri,
                "unexpected request"
            );
            state.unexpected.push(request_data);

            Ok(plain_response(500, "no registered interaction matched"))
        }
    }
}

fn plain_response(status: u16, message: &str) -> Response<Body> {
    let mut response = Response::new(Body::from(message.to_string()));
    *response.status_mut() = hyper::StatusCode::from_u16(status)
        .unwrap_or(hyper::StatusCode::INTERNAL_SERVER_ERROR);
    response
}

async fn read_request_data(request: &mut Request<Body>) -> Result<RequestData, Error> {
    let method = request.method().to_string();
    let uri = request.uri().to_string();
    let headers = util::extract_headers(request.headers());

    let body = body::to_bytes(request.body_mut())
        .await
        .map_err(|_| Error::InvalidBody)?;

    Ok(RequestData {
        method,
        uri,
        headers,
        body: String::from_utf8_lossy(&body).into(),
    })
}
