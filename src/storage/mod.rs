//! Storage for settings and carrier credentials.

pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{
    CliOverrides, Config, ConfigSource, ENV_CONFIG, ENV_ENVIRONMENT, ENV_PRETTY, ENV_TIMEOUT,
    ResolvedSettings,
};
pub use credentials::{ConfigValidation, CredentialSource, Credentials, RawCredentials};
pub use paths::AppPaths;
