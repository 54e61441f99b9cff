//! Mesh API gateway server
//!
//! HTTP entry point serving the static frontend's link-token, payment and
//! portfolio calls

use anyhow::{Context, Result};
use meshproxy::config::settings::LoggingConfig;
use meshproxy::{create_router, version_info, Settings};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::new().context("Failed to load server settings")?;

    init_logging(&settings.logging)?;
    info!("{}", version_info());

    if settings.secrets.secret_name.is_none() {
        info!("MESH_SECRET_NAME not set; Mesh routes will report a configuration error");
    }

    // Secret store and HTTP client are created once and shared by every request
    let app = create_router(settings.clone())
        .await
        .context("Failed to create router")?;

    let addr = settings.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🚀 Mesh gateway started on http://{}", addr);
    if let Some(stage) = &settings.server.stage {
        info!("Stripping stage prefix: /{}", stage);
    }

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start server: {}", e))?;

    Ok(())
}

/// Initialize logging system
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if logging.format == "json" {
        // JSON format logs (production environment)
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(logging.level.as_str())
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .finish(),
        )
    } else {
        // Human readable format (development environment)
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(logging.level.as_str())
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .finish(),
        )
    };

    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")?;

    info!("Logging system initialized");
    Ok(())
}
