use std::path::{Path, PathBuf};
use std::process::exit;

use anyhow::{anyhow, Context, Result};
use schemars::schema::RootSchema;
use serde_json::{json, Value};
use tuition_core::config::Config;

static JSON_SCHEMA_FILE: &str = "../generated/.tuitionrc.schema.json";

#[tokio::main]
async fn main() {
    logger_init();

    let mode = std::env::args().nth(1);
    let path = schema_path();
    let result = match mode.as_deref() {
        Some("fix") => mode_fix(&path).await,
        Some("check") => mode_check(&path).await,
        Some(other) => Err(anyhow!(
            "Unknown argument {}, you can pass either `fix` or `check`",
            other
        )),
        None => Err(anyhow!(
            "An argument required, you can pass either `fix` or `check`"
        )),
    };
    if let Err(e) = result {
        log::error!("{:#}", e);
        exit(1);
    }
}

fn logger_init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn schema_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(JSON_SCHEMA_FILE)
}

fn current_schema() -> Value {
    let schema: RootSchema = schemars::schema_for!(Config);
    json!(schema)
}

async fn mode_fix(path: &Path) -> Result<()> {
    let schema = serde_json::to_string_pretty(&current_schema())?;
    log::info!("Updating JSON Schema: {}", path.display());
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, schema)
        .await
        .with_context(|| format!("Unable to write {}", path.display()))?;
    Ok(())
}

async fn mode_check(path: &Path) -> Result<()> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Unable to read {}, run with `fix` first", path.display()))?;
    let content = serde_json::from_str::<Value>(&content)?;
    if content == current_schema() {
        log::info!("JSON Schema is up to date");
        Ok(())
    } else {
        Err(anyhow!("Schema mismatch, run with `fix` to update {}", path.display()))
    }
}
