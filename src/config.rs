use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;

pub const DEFAULT_EXPORT_KEY: &str = "ZAIN-ADMIN";
pub const DEFAULT_ADMIN_PASSCODE: &str = "ZAIN-ADMIN";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Where application records are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationBackend {
    Postgres,
    Sheets,
    Supabase,
    Memory,
}

impl FromStr for ApplicationBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "sql" => Ok(Self::Postgres),
            "sheets" | "spreadsheet" => Ok(Self::Sheets),
            "supabase" | "document" => Ok(Self::Supabase),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown application backend '{}'", other)),
        }
    }
}

/// Where uploaded CV files are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    Blob,
    Drive,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "fs" => Ok(Self::Local),
            "blob" => Ok(Self::Blob),
            "drive" => Ok(Self::Drive),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub public_base_url: String,
    pub application_backend: ApplicationBackend,
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub blob_token: Option<String>,
    pub blob_api_url: String,
    pub sheets_id: Option<String>,
    pub sheets_range: String,
    pub google_credentials_base64: Option<String>,
    pub drive_folder_id: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_service_role: Option<String>,
    pub export_key: String,
    pub admin_passcode: String,
    pub uploads_dir: String,
    pub cv_namespace: String,
    pub file_signing_secret: String,
    pub signed_url_ttl_secs: i64,
    pub max_upload_bytes: usize,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let export_key = get_env_or("EXPORT_KEY", DEFAULT_EXPORT_KEY);
        let file_signing_secret = get_env_opt("FILE_SIGNING_SECRET").unwrap_or_else(|| export_key.clone());

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:3000"),
            public_base_url: get_env_or("PUBLIC_BASE_URL", "http://localhost:3000")
                .trim_end_matches('/')
                .to_string(),
            application_backend: get_env_parse_or("APPLICATION_BACKEND", ApplicationBackend::Postgres)?,
            storage_backend: get_env_parse_or("CV_STORAGE", StorageBackend::Local)?,
            database_url: get_env_opt("DATABASE_URL"),
            blob_token: blob_token_from_env(),
            blob_api_url: get_env_or("BLOB_API_URL", "https://blob.vercel-storage.com"),
            sheets_id: get_env_opt("GOOGLE_SHEETS_ID"),
            sheets_range: get_env_or("GOOGLE_SHEETS_RANGE", "A:Z"),
            google_credentials_base64: get_env_opt("GOOGLE_CLOUD_CREDENTIALS_BASE64"),
            drive_folder_id: get_env_opt("GOOGLE_DRIVE_FOLDER_ID"),
            supabase_url: get_env_opt("SUPABASE_URL"),
            supabase_service_role: get_env_opt("SUPABASE_SERVICE_ROLE"),
            export_key,
            admin_passcode: get_env_or("ADMIN_PASSCODE", DEFAULT_ADMIN_PASSCODE),
            uploads_dir: get_env_or("UPLOADS_DIR", "./uploads"),
            cv_namespace: get_env_or("CV_NAMESPACE", "cvs"),
            file_signing_secret,
            signed_url_ttl_secs: get_env_parse_or("SIGNED_URL_TTL_SECS", 900)?,
            max_upload_bytes: get_env_parse_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }

    /// Returns a setting that the selected backend cannot run without.
    pub fn require<'a>(&self, value: &'a Option<String>, name: &str) -> Result<&'a str> {
        value
            .as_deref()
            .ok_or_else(|| Error::Config(format!("Missing environment variable: {}", name)))
    }
}

/// Hosting platforms sometimes suffix the blob token name with the store name.
fn blob_token_from_env() -> Option<String> {
    get_env_opt("BLOB_READ_WRITE_TOKEN").or_else(|| {
        env::vars()
            .filter(|(k, v)| k.starts_with("BLOB_READ_WRITE_TOKEN__") && !v.is_empty())
            .map(|(_, v)| v)
            .next()
    })
}

fn get_env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or(name: &str, default: &str) -> String {
    get_env_opt(name).unwrap_or_else(|| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_opt(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
