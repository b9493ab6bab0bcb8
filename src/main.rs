use anyhow::{Context, Result};
use phdscraper::{config::Config, serve};
use reqwest::Client;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    // ─── 2) load configuration ───────────────────────────────────────
    let config = Config::from_env().context("loading configuration")?;
    info!(
        sheet = %config.sheet_link,
        vacancy_sheet = ?config.vacancy_sheet,
        institution_sheet = ?config.institution_sheet,
        cache_ttl = ?config.cache_ttl,
        "configured"
    );

    // ─── 3) shared HTTP client with a bounded timeout ────────────────
    let client = Client::builder()
        .timeout(config.fetch_timeout)
        .build()
        .context("building HTTP client")?;

    // ─── 4) serve ────────────────────────────────────────────────────
    let listen_addr = config.listen_addr;
    let state = serve::AppState::new(config, client);
    info!(%listen_addr, "listening");
    warp::serve(serve::routes(state)).run(listen_addr).await;

    Ok(())
}
