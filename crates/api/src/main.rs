use std::net::SocketAddr;
use std::time::Duration;

use hotelier_infra::Settings;

/// How often elapsed rate-limit windows are dropped.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    hotelier_observability::init();

    let settings = Settings::from_env()?;
    let (app, services) = hotelier_api::app::build_app(&settings).await?;

    let admission = services.admission.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let removed = admission.sweep_expired();
            if removed > 0 {
                tracing::debug!(removed, tracked = admission.tracked(), "swept rate-limit windows");
            }
        }
    });

    let listener = tokio::net::TcpListener::bind(settings.bind_addr()).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
