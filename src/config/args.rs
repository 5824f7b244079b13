//! Command-line and environment overrides.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::schema::{Environment, ServiceConfig};

/// User account microservice.
#[derive(Debug, Parser)]
#[command(name = "user-service", version, about, long_about = None)]
pub struct Args {
    /// Optional TOML configuration file.
    #[arg(long, env = "USER_SERVICE_CONFIG")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Environment (development|staging|production).
    #[arg(long = "env", env = "APP_ENV")]
    pub environment: Option<Environment>,

    /// Database DSN.
    #[arg(long, env = "DBDSN")]
    pub db_dsn: Option<String>,

    /// Database max open connections.
    #[arg(long = "db-max-open-conn")]
    pub db_max_open_conn: Option<u32>,

    /// Database max idle connections.
    #[arg(long = "db-max-idle-conn")]
    pub db_max_idle_conn: Option<u32>,

    /// Database max connection idle time (e.g. "15m").
    #[arg(long = "db-max-idle-time")]
    pub db_max_idle_time: Option<String>,

    /// Token signing secret.
    #[arg(long, env = "AUTH_SECRET", hide_env_values = true)]
    pub auth_secret: Option<String>,

    /// Enable rate limiter.
    #[arg(long, action = ArgAction::Set)]
    pub limiter_enabled: Option<bool>,

    /// Rate limiter maximum requests per second.
    #[arg(long)]
    pub limiter_rps: Option<f64>,

    /// Rate limiter maximum burst.
    #[arg(long)]
    pub limiter_burst: Option<u32>,

    /// Trusted CORS origins (space separated).
    #[arg(long)]
    pub cors_trusted_origins: Option<String>,
}

impl Args {
    /// Overlay every flag that was given onto `config`.
    pub fn apply(&self, config: &mut ServiceConfig) {
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(environment) = self.environment {
            config.environment = environment;
        }
        if let Some(dsn) = &self.db_dsn {
            if !dsn.is_empty() {
                config.database.dsn = Some(dsn.clone());
            }
        }
        if let Some(n) = self.db_max_open_conn {
            config.database.max_open_conns = n;
        }
        if let Some(n) = self.db_max_idle_conn {
            config.database.max_idle_conns = n;
        }
        if let Some(idle) = &self.db_max_idle_time {
            config.database.max_idle_time = idle.clone();
        }
        if let Some(secret) = &self.auth_secret {
            config.auth.secret = secret.clone();
        }
        if let Some(enabled) = self.limiter_enabled {
            config.rate_limit.enabled = enabled;
        }
        if let Some(rps) = self.limiter_rps {
            config.rate_limit.requests_per_second = rps;
        }
        if let Some(burst) = self.limiter_burst {
            config.rate_limit.burst_size = burst;
        }
        if let Some(origins) = &self.cors_trusted_origins {
            config.cors.trusted_origins = origins.split_whitespace().map(str::to_string).collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_flag_surface() {
        let args = Args::try_parse_from([
            "user-service",
            "--port",
            "8080",
            "--env",
            "staging",
            "--db-max-idle-time",
            "5m",
            "--limiter-enabled",
            "false",
            "--limiter-rps",
            "7.5",
            "--cors-trusted-origins",
            "https://a.example  https://b.example",
        ])
        .unwrap();

        let mut config = ServiceConfig::default();
        args.apply(&mut config);

        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.environment, Environment::Staging);
        assert_eq!(config.database.max_idle_time, "5m");
        assert!(!config.rate_limit.enabled);
        assert_eq!(config.rate_limit.requests_per_second, 7.5);
        assert_eq!(
            config.cors.trusted_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn absent_flags_leave_config_untouched() {
        let args = Args::try_parse_from(["user-service"]).unwrap();
        let mut config = ServiceConfig::default();
        config.auth.secret = "from-file".into();
        args.apply(&mut config);
        assert_eq!(config.auth.secret, "from-file");
    }
}
