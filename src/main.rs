use ferrule::config::Config;
use ferrule::server::Server;

fn main() -> anyhow::Result<()> {
    let cfg = Config::load()?;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(cfg.tracing_level())
        .init();

    let mut server = Server::bind(&cfg)?;
    server.install_signal_handlers()?;
    server.run()?;

    tracing::info!("Server stopped");
    Ok(())
}
