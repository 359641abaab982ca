//! Folio - portfolio, research and travel blog backend
//!
//! Visitors read published blog posts, research articles and a resume, and
//! leave comments. A single admin (or a short allow-list of admins) signs in
//! to write, publish and delete content. All persistence lives in a hosted
//! store reached over REST; dev mode swaps in an in-memory store and a local
//! auth service.
//!
//! ## Layers
//!
//! - **db**: the content store boundary and row schemas
//! - **auth**: sign-in, the session guard and the session store
//! - **services**: public access, editing, comments, contact relay
//! - **routes** / **server**: the JSON HTTP API

pub mod auth;
pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{FolioError, Result};
