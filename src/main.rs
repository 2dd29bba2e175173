mod api;
mod app;
mod config;
mod library;
mod logging;
mod player;
mod runtime;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = logging::init() {
        tracing::info!(log = %path.display(), version = env!("CARGO_PKG_VERSION"), "Starting cadenza");
    }
    runtime::run()
}
