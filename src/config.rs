//! Relying-party configuration

use serde::{Deserialize, Serialize};

/// Ceremony validity window in milliseconds.
///
/// Bounds how long an issued challenge may be redeemed; it is not a network
/// timeout. The same value is advertised to the browser in the `timeout`
/// field of creation/request options.
pub const CEREMONY_TIMEOUT_MS: u64 = 30_000;

/// Static identity of the server that authenticators bind credentials to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelyingParty {
    /// Human-readable name shown by authenticator UI
    pub name: String,

    /// Relying-party id: the registrable domain credentials are scoped to
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpConfig {
    /// Relying-party identity
    pub rp: RelyingParty,

    /// Web origins accepted in clientDataJSON, e.g. "https://example.test"
    pub allowed_origins: Vec<String>,

    /// Accept origins whose host is a subdomain of the rp id
    pub allow_subdomains: bool,

    /// Require the UV flag on every attestation and assertion
    pub require_user_verification: bool,

    /// Ceremony validity window in milliseconds
    pub timeout_ms: u64,
}

impl Default for RpConfig {
    fn default() -> Self {
        Self {
            rp: RelyingParty {
                name: "Passkey RP".to_string(),
                id: "localhost".to_string(),
            },
            allowed_origins: vec!["http://localhost:8080".to_string()],
            allow_subdomains: false,
            require_user_verification: true,
            timeout_ms: CEREMONY_TIMEOUT_MS,
        }
    }
}

pub struct RpConfigBuilder {
    config: RpConfig,
}

impl RpConfig {
    pub fn builder() -> RpConfigBuilder {
        RpConfigBuilder {
            config: RpConfig::default(),
        }
    }

    /// The `userVerification` value advertised in ceremony options.
    ///
    /// Kept in lockstep with the verify-time UV flag check so options
    /// never demand more than verification enforces.
    pub fn user_verification_policy(&self) -> &'static str {
        if self.require_user_verification {
            "required"
        } else {
            "preferred"
        }
    }

    /// Load configuration from environment and files
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let mut config = config::Config::builder();

        // Start with defaults
        config = config.add_source(config::Config::try_from(&RpConfig::default())?);

        // Layer on .env file
        if dotenvy::dotenv().is_ok() {
            config = config.add_source(config::Environment::with_prefix("PASSKEY_RP"));
        }

        // Layer on config file if exists
        if std::path::Path::new("passkey-rp.toml").exists() {
            config = config.add_source(config::File::with_name("passkey-rp"));
        }

        config.build()?.try_deserialize()
    }
}

impl RpConfigBuilder {
    pub fn rp_name(mut self, name: impl Into<String>) -> Self {
        self.config.rp.name = name.into();
        self
    }

    pub fn rp_id(mut self, id: impl Into<String>) -> Self {
        self.config.rp.id = id.into();
        self
    }

    pub fn allowed_origins(mut self, origins: Vec<impl Into<String>>) -> Self {
        self.config.allowed_origins = origins.into_iter().map(|s| s.into()).collect();
        self
    }

    pub fn allow_subdomains(mut self, allow: bool) -> Self {
        self.config.allow_subdomains = allow;
        self
    }

    pub fn require_user_verification(mut self, require: bool) -> Self {
        self.config.require_user_verification = require;
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeout_ms = ms;
        self
    }

    pub fn build(self) -> RpConfig {
        self.config
    }
}
