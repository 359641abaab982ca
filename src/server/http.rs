//! HTTP server
//!
//! hyper http1 server with one task per connection and manual routing on
//! method and path. A client that disconnects drops its handler future, which
//! abandons any store call still in flight.

use bytes::Bytes;
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::auth::{spawn_session_listener, AdminAllowList, AuthService, SessionGuard, SessionStore};
use crate::config::Args;
use crate::db::ContentStore;
use crate::routes::{self, response, BoxBody};
use crate::services::{CommentService, ContactRelay, ContentAccess, ContentEditor};
use crate::types::{FolioError, Result};

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Content store acting with the public API key
    pub store: Arc<dyn ContentStore>,
    pub auth: Arc<dyn AuthService>,
    /// Single source of truth for admin access
    pub guard: Arc<SessionGuard>,
    /// Live sessions, written only by the session listener
    pub sessions: Arc<SessionStore>,
    /// Contact form relay, absent when no endpoint is configured
    pub contact: Option<ContactRelay>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        args: Args,
        store: Arc<dyn ContentStore>,
        auth: Arc<dyn AuthService>,
    ) -> Result<Self> {
        let allow_list = AdminAllowList::new(args.admin_email_list());
        let guard = Arc::new(SessionGuard::new(Arc::clone(&auth), allow_list));

        let contact = match args.contact_endpoint.as_deref() {
            Some(endpoint) => Some(ContactRelay::new(
                endpoint,
                Duration::from_millis(args.request_timeout_ms),
            )?),
            None => None,
        };

        Ok(Self {
            args,
            store,
            auth,
            guard,
            sessions: Arc::new(SessionStore::new()),
            contact,
            started_at: Instant::now(),
        })
    }

    /// Start the task that keeps the session store current
    pub fn spawn_session_listener(&self) -> JoinHandle<()> {
        spawn_session_listener(self.auth.as_ref(), Arc::clone(&self.sessions))
    }

    pub fn access(&self) -> ContentAccess {
        ContentAccess::new(Arc::clone(&self.store))
    }

    pub fn comments(&self) -> CommentService {
        CommentService::new(Arc::clone(&self.store))
    }

    /// Comment service acting as the signed-in admin
    pub fn comments_for(&self, access_token: &str) -> CommentService {
        CommentService::new(self.store.as_user(access_token))
    }

    /// Editor acting as the signed-in admin
    pub fn editor_for(&self, access_token: &str) -> ContentEditor {
        ContentEditor::new(
            self.store.as_user(access_token),
            self.args.site_author.clone(),
        )
    }
}

pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Folio listening on {}", state.args.listen);

    if state.args.dev_mode {
        warn!("Development mode enabled - in-memory store and local auth");
    }
    if state.contact.is_none() {
        warn!("CONTACT_ENDPOINT not set - contact form disabled");
    }

    state.spawn_session_listener();
    info!(
        "Session guard active ({} admin account(s))",
        state.guard.allow_list().len()
    );

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req: Request<Incoming>| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
pub async fn handle_request<B>(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<B>,
) -> std::result::Result<Response<BoxBody>, hyper::Error>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let response = match (&method, path.as_str()) {
        (&Method::OPTIONS, _) => response::cors_preflight(),

        (&Method::GET, "/health") => routes::health_check(&state),
        (_, "/health") => response::method_not_allowed(),

        (_, p) if p.starts_with("/auth/") => routes::handle_auth_request(req, state).await,
        (_, p) if p.starts_with("/api/") => routes::handle_api_request(req, state).await,
        (_, p) if p == "/admin" || p.starts_with("/admin/") => {
            routes::handle_admin_request(req, state).await
        }

        _ => response::error_response(FolioError::NotFound(format!("No route for {}", path))),
    };

    Ok(response)
}
