//! Configuration for Folio
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;

/// Dev-mode fallback for JWT_SECRET (local auth only)
const DEV_JWT_SECRET: &str = "dev-only-insecure-secret-do-not-deploy-0000";

/// Folio - portfolio and travel blog backend
#[derive(Parser, Debug, Clone)]
#[command(name = "folio")]
#[command(about = "Portfolio, research and travel blog backend with an admin-only editor")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Base URL of the hosted store (REST at /rest/v1, auth at /auth/v1)
    #[arg(long, env = "STORE_URL")]
    pub store_url: Option<String>,

    /// Public API key of the hosted store
    #[arg(long, env = "STORE_ANON_KEY")]
    pub store_anon_key: Option<String>,

    /// Comma-separated list of admin email addresses (exact match)
    #[arg(long, env = "ADMIN_EMAILS")]
    pub admin_emails: Option<String>,

    /// Enable development mode (in-memory store, local auth)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Admin account seeded into local auth in dev mode
    #[arg(long, env = "DEV_ADMIN_EMAIL", default_value = "admin@localhost")]
    pub dev_admin_email: String,

    /// Password for the seeded dev-mode admin account
    #[arg(long, env = "DEV_ADMIN_PASSWORD", default_value = "admin")]
    pub dev_admin_password: String,

    /// JWT secret for local-auth access tokens
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "3600")]
    pub jwt_expiry_seconds: u64,

    /// Form-relay endpoint for the contact form
    #[arg(long, env = "CONTACT_ENDPOINT")]
    pub contact_endpoint: Option<String>,

    /// Author stamped on newly created blog posts
    #[arg(long, env = "SITE_AUTHOR", default_value = "Site Author")]
    pub site_author: String,

    /// Timeout for outbound store, auth and relay calls in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,
}

impl Args {
    /// Admin allow-list; in dev mode the seeded account is always included
    pub fn admin_email_list(&self) -> Vec<String> {
        let mut emails: Vec<String> = self
            .admin_emails
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if self.dev_mode && !emails.contains(&self.dev_admin_email) {
            emails.push(self.dev_admin_email.clone());
        }

        emails
    }

    /// Get effective JWT secret (uses default in dev mode)
    pub fn jwt_secret(&self) -> String {
        self.jwt_secret
            .clone()
            .unwrap_or_else(|| DEV_JWT_SECRET.to_string())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            if self.store_url.is_none() {
                return Err("STORE_URL is required in production mode".to_string());
            }
            if self.store_anon_key.is_none() {
                return Err("STORE_ANON_KEY is required in production mode".to_string());
            }
        }

        if self.admin_email_list().is_empty() {
            return Err("ADMIN_EMAILS must name at least one admin account".to_string());
        }

        if self.request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["folio"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_production_requires_store() {
        let args = parse(&["--admin-emails", "me@example.com"]);
        if args.store_url.is_none() {
            assert!(args.validate().is_err());
        }

        let args = parse(&[
            "--admin-emails",
            "me@example.com",
            "--store-url",
            "https://store.example.com",
            "--store-anon-key",
            "anon",
        ]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_admin_list_splits_and_trims() {
        let args = parse(&["--admin-emails", " a@example.com, ,b@example.com "]);
        let list = args.admin_email_list();
        assert!(!list.iter().any(|e| e.is_empty()));
        assert!(list.contains(&"a@example.com".to_string()));
        assert!(list.contains(&"b@example.com".to_string()));
    }

    #[test]
    fn test_dev_mode_seeds_admin() {
        let args = parse(&["--dev-mode", "--dev-admin-email", "dev@example.com"]);
        assert!(args.admin_email_list().contains(&"dev@example.com".to_string()));
        assert!(args.validate().is_ok());
        assert!(!args.jwt_secret().is_empty());
    }
}
