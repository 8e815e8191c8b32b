use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    /// Session lifetime in days; also drives the cookie Max-Age.
    pub cookie_expire_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub base_path: String,
    pub environment: String,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let base_path =
            std::env::var("BASE_PATH").unwrap_or_else(|_| "/everblue/customers".into());
        let environment = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "everblue".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "everblue-customers".into()),
            cookie_expire_days: std::env::var("JWT_COOKIE_EXPIRE")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(30),
        };
        Ok(Self {
            database_url,
            base_path,
            environment,
            jwt,
        })
    }

    /// The `Secure` cookie attribute is only set in production deployments.
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
