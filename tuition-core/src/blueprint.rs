use std::time::Duration;

use anyhow::anyhow;
use tuition_auth::session::SessionSettings;
use url::Url;

use crate::config::{self, Config};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SESSION_PATH: &str = ".tuition-session.json";
const DEFAULT_MAX_FILE_SIZE: usize = 1024 * 1024 * 10; // 10MB
const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Validated form of [`Config`], with every default filled in.
#[derive(Debug, Clone)]
pub struct Blueprint {
    pub api: Api,
    pub session: Session,
    pub upload: Upload,
}

#[derive(Debug, Clone)]
pub struct Api {
    pub base_url: Url,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub path: String,
    pub settings: SessionSettings,
}

#[derive(Debug, Clone, Copy)]
pub struct Upload {
    pub max_file_size: usize,
    pub chunk_size: usize,
}

impl TryFrom<config::ApiInfo> for Api {
    type Error = anyhow::Error;

    fn try_from(api: config::ApiInfo) -> Result<Self, Self::Error> {
        if api.base_url.is_empty() {
            return Err(anyhow!("api.baseUrl is required"));
        }
        let base_url = Url::parse(&api.base_url)
            .map_err(|e| anyhow!("Invalid api.baseUrl {}: {}", api.base_url, e))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "api.baseUrl must be an http(s) URL, found: {}",
                base_url.scheme()
            ));
        }
        let timeout = api.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout == 0 {
            return Err(anyhow!("api.timeout must be greater than 0"));
        }

        Ok(Api {
            base_url,
            timeout: Duration::from_secs(timeout),
        })
    }
}

impl From<config::SessionInfo> for Session {
    fn from(session: config::SessionInfo) -> Self {
        let defaults = SessionSettings::default();
        Session {
            path: session
                .path
                .unwrap_or_else(|| DEFAULT_SESSION_PATH.to_string()),
            settings: SessionSettings {
                csrf_cookie: session.csrf_cookie.unwrap_or(defaults.csrf_cookie),
                csrf_header: session.csrf_header.unwrap_or(defaults.csrf_header),
                login_route: session.login_route.unwrap_or(defaults.login_route),
            },
        }
    }
}

impl TryFrom<config::UploadInfo> for Upload {
    type Error = anyhow::Error;

    fn try_from(upload: config::UploadInfo) -> Result<Self, Self::Error> {
        let max_file_size = upload.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE);
        let chunk_size = upload.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE);
        if max_file_size == 0 {
            return Err(anyhow!("upload.maxFileSize must be greater than 0"));
        }
        if chunk_size == 0 {
            return Err(anyhow!("upload.chunkSize must be greater than 0"));
        }
        Ok(Upload {
            max_file_size,
            chunk_size,
        })
    }
}

impl TryFrom<Config> for Blueprint {
    type Error = anyhow::Error;

    fn try_from(config: Config) -> Result<Self, Self::Error> {
        let session = Session::from(config.session);
        if session.settings.csrf_header.trim().is_empty() {
            return Err(anyhow!("session.csrfHeader cannot be empty"));
        }
        reqwest::header::HeaderName::from_bytes(session.settings.csrf_header.as_bytes())
            .map_err(|_| anyhow!("Invalid session.csrfHeader"))?;

        Ok(Self {
            api: Api::try_from(config.api)?,
            session,
            upload: Upload::try_from(config.upload)?,
        })
    }
}
