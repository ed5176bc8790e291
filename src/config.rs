use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    #[allow(dead_code)]
    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // Identity provider (JWT verification)
    pub identity_jwks_url: String,
    pub identity_jwt_issuer: String,
    pub identity_jwt_audience: String,
    pub jwks_cache_ttl_seconds: u64,

    // Sitter scoring service
    pub scoring_service_url: String,
    pub scoring_service_token: String,
    pub scoring_service_timeout_seconds: u64,

    // Scheduling engine
    pub batch_chunk_size: usize,
    pub series_write_pacing_ms: u64,
    pub auto_assign_siblings: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let env = Environment::from_str(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        // Database
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        // CORS
        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Identity provider
        let identity_jwks_url =
            env::var("IDENTITY_JWKS_URL").context("IDENTITY_JWKS_URL must be set")?;
        let identity_jwt_issuer =
            env::var("IDENTITY_JWT_ISSUER").context("IDENTITY_JWT_ISSUER must be set")?;
        let identity_jwt_audience =
            env::var("IDENTITY_JWT_AUDIENCE").unwrap_or_else(|_| "authenticated".to_string());
        let jwks_cache_ttl_seconds = env::var("JWKS_CACHE_TTL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1800); // 30 minutes default

        // Scoring service
        let scoring_service_url = env::var("SCORING_SERVICE_URL")
            .unwrap_or_else(|_| "http://scoring-service:8000".to_string());
        let scoring_service_token =
            env::var("SCORING_SERVICE_TOKEN").context("SCORING_SERVICE_TOKEN must be set")?;
        let scoring_service_timeout_seconds = env::var("SCORING_SERVICE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        // Scheduling engine. Chunk size matches the store's per-transaction
        // operation ceiling; the pacing delay keeps sequential sibling writes
        // inside the store's expected write rate.
        let batch_chunk_size = env::var("BATCH_CHUNK_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(crate::scheduling::batch::DEFAULT_CHUNK_SIZE);
        let series_write_pacing_ms = env::var("SERIES_WRITE_PACING_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(150);
        let auto_assign_siblings = env::var("AUTO_ASSIGN_SIBLINGS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(false);

        Ok(Settings {
            env,
            server_addr,
            database_url,
            database_max_connections,
            cors_allow_origins,
            identity_jwks_url,
            identity_jwt_issuer,
            identity_jwt_audience,
            jwks_cache_ttl_seconds,
            scoring_service_url,
            scoring_service_token,
            scoring_service_timeout_seconds,
            batch_chunk_size,
            series_write_pacing_ms,
            auto_assign_siblings,
        })
    }
}
