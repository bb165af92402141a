use std::env;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub app_env: String,
    pub jwt_secret: String,
    pub refresh_token_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    pub reset_token_ttl_days: i64,
    pub frontend_url: String,
    pub demo_account_email: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let refresh_token_secret =
            env::var("REFRESH_TOKEN_SECRET").context("REFRESH_TOKEN_SECRET is not set")?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let demo_account_email =
            env::var("DEMO_ACCOUNT_EMAIL").unwrap_or_else(|_| "demo@gmail.com".to_string());

        Ok(Self {
            port,
            database_url,
            host,
            app_env,
            jwt_secret,
            refresh_token_secret,
            access_token_ttl_minutes: env_i64("ACCESS_TOKEN_TTL_MINUTES", 15),
            refresh_token_ttl_days: env_i64("REFRESH_TOKEN_TTL_DAYS", 7),
            reset_token_ttl_days: env_i64("RESET_TOKEN_TTL_DAYS", 7),
            frontend_url,
            demo_account_email,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}
