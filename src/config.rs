use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
    pub email_verify_ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub public_base_url: String,
    pub min_password_length: usize,
    pub jwt: JwtConfig,
    pub mail: Option<MailConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("TOKEN_SIGNING_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "contactbook".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "contactbook-users".into()),
            access_ttl_minutes: std::env::var("ACCESS_TOKEN_TTL")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(30),
            refresh_ttl_days: std::env::var("REFRESH_TOKEN_TTL")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(7),
            email_verify_ttl_hours: std::env::var("EMAIL_VERIFY_TTL")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(24),
        };
        let mail = match std::env::var("MAIL_SERVER") {
            Ok(server) => {
                let username = std::env::var("MAIL_USERNAME")?;
                Some(MailConfig {
                    server,
                    port: std::env::var("MAIL_PORT")
                        .ok()
                        .and_then(|v| v.parse::<u16>().ok())
                        .unwrap_or(465),
                    password: std::env::var("MAIL_PASSWORD")?,
                    from: std::env::var("MAIL_FROM").unwrap_or_else(|_| username.clone()),
                    username,
                })
            }
            Err(_) => None,
        };
        Ok(Self {
            database_url,
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            min_password_length: std::env::var("MIN_PASSWORD_LENGTH")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(8),
            jwt,
            mail,
        })
    }
}
