//! Stagepath CLI support
//!
//! Loads host configuration and a fixture data set, runs a path session
//! against the in-memory backend and formats the result.

use anyhow::{bail, Context, Result};
use stagepath_core::{
    BackendFixture, InMemoryBackend, Notification, NotificationSink, PathConfig, PathHandle,
    PathSession, PathView, Severity, WriteOutcome,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Host parameter overrides from the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Record ID
    pub record_id: Option<String>,
    /// Entity name
    pub object_api_name: Option<String>,
    /// Qualified stage field
    pub field: Option<String>,
}

/// Loaded configuration and backend
#[derive(Debug, Clone)]
pub struct Inputs {
    /// Host parameters
    pub config: PathConfig,
    /// Backend seeded from the fixture
    pub backend: Arc<InMemoryBackend>,
}

/// Outcome of a simulated click
#[derive(Debug, Clone)]
pub struct ClickReport {
    /// Result of the write itself
    pub outcome: WriteOutcome,
    /// Notifications shown to the user, including unrelated fetch failures
    pub notifications: Vec<Notification>,
    /// View after the click settled
    pub view: PathView,
}

impl ClickReport {
    /// Whether the record store rejected the write
    #[must_use]
    pub fn failed(&self) -> bool {
        matches!(self.outcome, WriteOutcome::Failed { .. })
    }
}

/// Load host config (TOML, optional) and fixture data (JSON)
///
/// # Errors
/// Unreadable or malformed files
pub fn load_inputs(config: Option<&Path>, data: &Path, overrides: Overrides) -> Result<Inputs> {
    let mut path_config = match config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            PathConfig::from_toml(&raw).with_context(|| format!("parsing {}", path.display()))?
        }
        None => PathConfig::default(),
    };
    if let Some(record_id) = overrides.record_id {
        path_config = path_config.with_record_id(record_id);
    }
    if let Some(object) = overrides.object_api_name {
        path_config = path_config.with_object_api_name(object);
    }
    if let Some(field) = overrides.field {
        path_config = path_config.with_field(field);
    }

    let raw = std::fs::read_to_string(data)
        .with_context(|| format!("reading data set {}", data.display()))?;
    let fixture: BackendFixture = serde_json::from_str(&raw)
        .with_context(|| format!("parsing data set {}", data.display()))?;

    tracing::debug!(
        objects = fixture.objects.len(),
        records = fixture.records.len(),
        "data set loaded"
    );
    Ok(Inputs {
        config: path_config,
        backend: Arc::new(InMemoryBackend::from_fixture(fixture)),
    })
}

/// Sink forwarding notifications to a channel
#[derive(Debug, Clone)]
struct ChannelSink(mpsc::UnboundedSender<Notification>);

impl NotificationSink for ChannelSink {
    fn notify(&self, notification: Notification) {
        tracing::debug!(title = %notification.title, "notification");
        let _ = self.0.send(notification);
    }
}

fn start(inputs: &Inputs) -> Result<(PathHandle, mpsc::UnboundedReceiver<Notification>)> {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = PathSession::spawn(
        &inputs.config,
        inputs.backend.clone(),
        inputs.backend.clone(),
        Arc::new(ChannelSink(tx)),
    )?;
    Ok((handle, rx))
}

async fn settle(path: &PathHandle, timeout: Duration) -> Result<PathView> {
    let view = tokio::time::timeout(
        timeout,
        path.wait_for(|v| !v.steps.is_empty() || v.error_message.is_some()),
    )
    .await
    .context("timed out waiting for the path to load")??;
    Ok(view)
}

/// Load the path and return its view
///
/// # Errors
/// Setup errors, or the path not loading within `timeout`
pub async fn render(inputs: &Inputs, timeout: Duration) -> Result<PathView> {
    let (path, _notifications) = start(inputs)?;
    let view = settle(&path, timeout).await?;
    path.shutdown().await?;
    Ok(view)
}

/// Load the path, click `value` and wait for the outcome
///
/// # Errors
/// Setup errors, no stages to click, or no outcome within `timeout`
pub async fn click(inputs: &Inputs, value: &str, timeout: Duration) -> Result<ClickReport> {
    let (path, mut notifications) = start(inputs)?;
    let Ok(loaded) = tokio::time::timeout(timeout, path.wait_for(|v| !v.steps.is_empty())).await
    else {
        let view = path.view();
        path.shutdown().await?;
        match view.error_message {
            Some(message) => bail!("path failed to load: {message}"),
            None => bail!("path has no stages to click"),
        }
    };
    loaded?;

    let outcome = tokio::time::timeout(timeout, path.submit(value))
        .await
        .context("timed out waiting for the update")??;

    let view = if outcome.is_applied() {
        tokio::time::timeout(
            timeout,
            path.wait_for(|v| v.current().is_some_and(|s| s.value == value)),
        )
        .await
        .context("timed out waiting for the refreshed record")??
    } else {
        if outcome == WriteOutcome::Skipped {
            tracing::info!(value, "already at requested stage");
        }
        path.view()
    };
    path.shutdown().await?;

    let mut seen = Vec::new();
    while let Ok(n) = notifications.try_recv() {
        seen.push(n);
    }

    Ok(ClickReport {
        outcome,
        notifications: seen,
        view,
    })
}

/// Format a view as one line per step
#[must_use]
pub fn format_view(title: &str, view: &PathView) -> String {
    let mut out = format!("{title}\n");
    for step in &view.steps {
        let marker = if step.is_current {
            "[>]"
        } else if step.is_completed {
            "[x]"
        } else {
            "[ ]"
        };
        out.push_str(&format!("  {marker} {}\n", step.label));
    }
    if view.steps.is_empty() {
        out.push_str("  (no stages)\n");
    }
    if view.current_unmatched {
        out.push_str("  note: current value matches no stage\n");
    }
    if let Some(message) = &view.error_message {
        out.push_str(&format!("  error: {message}\n"));
    }
    out
}

/// Format a notification as one line
#[must_use]
pub fn format_notification(n: &Notification) -> String {
    let level = match n.severity {
        Severity::Success => "success",
        Severity::Info => "info",
        Severity::Warning => "warning",
        Severity::Error => "error",
    };
    format!("{level}: {}: {}", n.title, n.message)
}
