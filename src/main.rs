use std::error::Error;

use tokio::net::TcpListener;
use tracing::info;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use upload_behavior::app_from_env;
use upload_behavior::utils::static_object::BIND_ADDR;

/// Console output by default, bunyan JSON lines with `LOG_FORMAT=json`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "upload_behavior=debug,tower_http=info".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let (storage, bunyan, console) = if json {
        (
            Some(JsonStorageLayer),
            Some(BunyanFormattingLayer::new(
                "upload-behavior".into(),
                std::io::stdout,
            )),
            None,
        )
    } else {
        (None, None, Some(fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(storage)
        .with(bunyan)
        .with(console)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let app = app_from_env()?;

    let listener = TcpListener::bind(BIND_ADDR.as_str()).await?;
    info!("Server starting at http://{}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
