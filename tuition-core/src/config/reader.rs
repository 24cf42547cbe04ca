use crate::config::Config;
use crate::runtime::TargetRuntime;
use anyhow::Context;
use reqwest::Url;

/// Reads the configuration from a file or from an HTTP URL.
pub struct ConfigReader {
    runtime: TargetRuntime,
}

/// Response of a file read operation
#[derive(Debug)]
struct FileRead {
    content: String,
    path: String,
}

impl ConfigReader {
    pub fn init(runtime: TargetRuntime) -> Self {
        Self { runtime }
    }

    /// Reads the config file and returns serialized config
    pub async fn read<T: AsRef<str>>(&self, file: T) -> anyhow::Result<Config> {
        let file = self.read_file(file).await?;
        Config::from_json(&file.content)
            .with_context(|| format!("Unable to parse config: {}", file.path))
    }

    /// Reads a file from the filesystem or from an HTTP URL
    async fn read_file<T: AsRef<str>>(&self, file: T) -> anyhow::Result<FileRead> {
        let remote = Url::parse(file.as_ref())
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https"));

        let content = if let Some(url) = remote {
            let response = self
                .runtime
                .http
                .execute(reqwest::Request::new(reqwest::Method::GET, url))
                .await?;
            if !response.status.is_success() {
                anyhow::bail!(
                    "Unable to fetch config from {}: {}",
                    file.as_ref(),
                    response.status
                );
            }

            String::from_utf8(response.body.to_vec())?
        } else {
            self.runtime.file.read(file.as_ref()).await?
        };

        Ok(FileRead {
            content,
            path: file.as_ref().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    async fn get_rt() -> anyhow::Result<TargetRuntime> {
        let rt = crate::runtime::tests::init();
        let path = get_example_config();
        let content = tokio::fs::read(&path).await?;
        rt.file.write(&path, content.as_ref()).await?;
        Ok(rt)
    }

    fn start_mock_server() -> httpmock::MockServer {
        httpmock::MockServer::start()
    }

    fn get_example_config() -> String {
        let mut parent = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        parent.pop();

        parent
            .join("demos/config.json")
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_read_file() {
        let runtime = get_rt().await.unwrap();
        let reader = ConfigReader::init(runtime);

        let example_config = get_example_config();

        let file = reader.read_file(&example_config).await.unwrap();

        assert_eq!(file.path, example_config);
    }

    #[tokio::test]
    async fn test_read_from_url() {
        let runtime = get_rt().await.unwrap();
        let reader = ConfigReader::init(runtime);
        let expected = reader.read_file(get_example_config()).await.unwrap();

        let server = start_mock_server();

        server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/config.json");
            then.status(200).body(expected.content.as_str());
        });

        let actual = reader
            .read_file(format!("{}/config.json", server.base_url()))
            .await
            .unwrap();

        assert_eq!(expected.content, actual.content);
    }

    #[tokio::test]
    async fn test_read_from_missing_url() {
        let runtime = get_rt().await.unwrap();
        let reader = ConfigReader::init(runtime);
        let server = start_mock_server();

        server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/config.json");
            then.status(404);
        });

        let result = reader
            .read(format!("{}/config.json", server.base_url()))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_read() {
        let runtime = get_rt().await.unwrap();
        let reader = ConfigReader::init(runtime);
        let example_config = get_example_config();

        let config = reader.read(example_config).await.unwrap();
        assert_eq!(config.api.base_url, "http://localhost:5000/api");
        assert_eq!(config.api.timeout, Some(30));
        assert_eq!(config.session.path.as_deref(), Some(".tuition-session.json"));
        assert_eq!(config.upload.max_file_size, Some(10485760));
    }
}
