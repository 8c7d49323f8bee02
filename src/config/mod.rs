use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub sanitizer: SanitizerConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizerConfig {
    /// Reject requests carrying forbidden keys instead of silently stripping them
    pub reject_on_violation: bool,
    pub audit_logging: bool,
    pub sanitize_query: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub max_request_size_bytes: usize,
    pub enable_cors: bool,
    pub enable_request_logging: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Sanitizer overrides
        if let Ok(v) = env::var("REQSHIELD_REJECT_ON_VIOLATION") {
            self.sanitizer.reject_on_violation = v.parse().unwrap_or(self.sanitizer.reject_on_violation);
        }
        if let Ok(v) = env::var("REQSHIELD_AUDIT_LOGGING") {
            self.sanitizer.audit_logging = v.parse().unwrap_or(self.sanitizer.audit_logging);
        }
        if let Ok(v) = env::var("REQSHIELD_SANITIZE_QUERY") {
            self.sanitizer.sanitize_query = v.parse().unwrap_or(self.sanitizer.sanitize_query);
        }

        // API overrides
        if let Ok(v) = env::var("REQSHIELD_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Ok(v) = env::var("REQSHIELD_ENABLE_CORS") {
            self.api.enable_cors = v.parse().unwrap_or(self.api.enable_cors);
        }
        if let Ok(v) = env::var("REQSHIELD_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            sanitizer: SanitizerConfig {
                reject_on_violation: false,
                audit_logging: true,
                sanitize_query: true,
            },
            api: ApiConfig {
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
                enable_cors: true,
                enable_request_logging: true,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            sanitizer: SanitizerConfig {
                reject_on_violation: false,
                audit_logging: true,
                sanitize_query: true,
            },
            api: ApiConfig {
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
                enable_cors: true,
                enable_request_logging: true,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            sanitizer: SanitizerConfig {
                reject_on_violation: false,
                audit_logging: true,
                sanitize_query: true,
            },
            api: ApiConfig {
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
                enable_cors: true,
                enable_request_logging: false,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
