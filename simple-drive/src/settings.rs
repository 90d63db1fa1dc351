use anyhow::{Context, Result};
use serde::Deserialize;

/// Process configuration, layered from an optional TOML file and environment
/// variables. Defaults match a local development setup.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_url: String,

    pub storage_backend: String,
    pub local_storage_path: String,

    pub s3_endpoint_url: String,
    pub s3_access_key_id: String,
    pub s3_secret_access_key: String,
    pub s3_bucket_name: String,
    pub s3_region: String,

    pub ftp_host: String,
    pub ftp_port: u16,
    pub ftp_username: String,
    pub ftp_password: String,
    pub ftp_base_dir: String,

    pub api_token: String,

    pub host: String,
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            database_url: "sqlite://simpledrive.db".to_string(),
            storage_backend: "local".to_string(),
            local_storage_path: "./storage".to_string(),
            s3_endpoint_url: "https://s3.amazonaws.com".to_string(),
            s3_access_key_id: String::new(),
            s3_secret_access_key: String::new(),
            s3_bucket_name: String::new(),
            s3_region: "us-east-1".to_string(),
            ftp_host: String::new(),
            ftp_port: 21,
            ftp_username: String::new(),
            ftp_password: String::new(),
            ftp_base_dir: "/storage".to_string(),
            api_token: "dev-token".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Settings {
    /// Values from the environment override values from the file; anything
    /// unset falls back to the defaults above.
    pub fn load(path: Option<&str>) -> Result<Settings> {
        let mut builder = config::Config::builder();

        builder = match path {
            Some(path) => builder.add_source(config::File::with_name(path)),
            None => builder.add_source(config::File::with_name("simple-drive").required(false)),
        };

        let settings = builder
            .add_source(config::Environment::default().try_parsing(true))
            .build()
            .context("failed to load configuration")?
            .try_deserialize()
            .context("failed to load configuration")?;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_a_development_setup() {
        let settings = Settings::default();

        assert_eq!(settings.database_url, "sqlite://simpledrive.db");
        assert_eq!(settings.storage_backend, "local");
        assert_eq!(settings.local_storage_path, "./storage");
        assert_eq!(settings.s3_region, "us-east-1");
        assert_eq!(settings.ftp_port, 21);
        assert_eq!(settings.ftp_base_dir, "/storage");
        assert_eq!(settings.api_token, "dev-token");
    }
}
