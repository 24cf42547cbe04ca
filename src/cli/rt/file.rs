use anyhow::Context;
use tuition_core::FileIO;

#[derive(Default, Clone)]
pub struct NativeFileIO {}

#[async_trait::async_trait]
impl FileIO for NativeFileIO {
    async fn write<'a>(&'a self, path: &'a str, content: &'a [u8]) -> anyhow::Result<()> {
        tokio::fs::write(path, content)
            .await
            .with_context(|| format!("Unable to write {}", path))?;
        log::debug!("File write: {} ({} bytes)", path, content.len());
        Ok(())
    }

    async fn read<'a>(&'a self, path: &'a str) -> anyhow::Result<String> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Unable to read {}", path))?;
        log::debug!("File read: {}", path);
        Ok(content)
    }

    async fn read_bytes<'a>(&'a self, path: &'a str) -> anyhow::Result<Vec<u8>> {
        let content = tokio::fs::read(path)
            .await
            .with_context(|| format!("Unable to read {}", path))?;
        log::debug!("File read: {} ({} bytes)", path, content.len());
        Ok(content)
    }
}
