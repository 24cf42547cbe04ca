use std::sync::Arc;

use anyhow::Context;
use tuition_auth::session::{Session, SessionSnapshot};
use tuition_core::blueprint::Blueprint;
use tuition_core::runtime::TargetRuntime;

/// Restores the session saved by the previous run. A missing or unreadable
/// file means signed out.
pub async fn load(runtime: &TargetRuntime, blueprint: &Blueprint) -> Arc<Session> {
    let path = &blueprint.session.path;
    let settings = blueprint.session.settings.clone();
    let snapshot = match runtime.file.read(path).await {
        Ok(content) => serde_json::from_str::<SessionSnapshot>(&content).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable session file {}: {}", path, e);
            SessionSnapshot::default()
        }),
        Err(_) => SessionSnapshot::default(),
    };
    Arc::new(Session::restore(settings, snapshot))
}

pub async fn save(
    runtime: &TargetRuntime,
    blueprint: &Blueprint,
    session: &Session,
) -> anyhow::Result<()> {
    let content = serde_json::to_vec_pretty(&session.snapshot())?;
    runtime
        .file
        .write(&blueprint.session.path, &content)
        .await
        .context("Unable to save the session")
}
