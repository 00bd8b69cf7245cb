#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use timetable::persistence::{Catalog, InMemoryCatalog, load_catalog_from_json};
    use timetable::{EngineConfig, TimetableEngine, http_api, telemetry};
    use tracing::info;

    let config = EngineConfig::load()?;
    telemetry::init(&config.log_filter);
    let addr: SocketAddr = config.http_addr.parse()?;

    let store: Box<dyn Catalog> = match (&config.database, &config.snapshot) {
        #[cfg(feature = "sqlite")]
        (Some(path), _) => {
            info!(path = %path.display(), "opening sqlite catalog");
            Box::new(timetable::persistence::sqlite::SqliteCatalog::new(path)?)
        }
        (_, Some(path)) => {
            info!(path = %path.display(), "loading catalog snapshot");
            Box::new(InMemoryCatalog::from_snapshot(load_catalog_from_json(path)?)?)
        }
        _ => Box::new(InMemoryCatalog::new()),
    };

    info!(%addr, clustering = %config.clustering, "timetable HTTP API listening");
    let engine = TimetableEngine::new(store, config);
    http_api::serve(addr, engine).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
