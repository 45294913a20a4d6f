use comicgen::{logger, ComicClient, Config};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    logger::init_with_config(logger::LoggerConfig::from_env())?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("No .env file found, using system environment variables");
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ {}", e);
            return Err(e.into());
        }
    };
    logger::log_config_info(&config);

    let client = ComicClient::from_config(&config)?;

    logger::log_startup_info(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        &config.host,
        config.port(),
    );

    comicgen::server::run(&config, client).await?;

    log::info!("👋 Server stopped");
    Ok(())
}
