use std::sync::mpsc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

use crate::api::ApiClient;
use crate::app::{App, CatalogEvent};
use crate::player::Player;

mod event_loop;
mod settings;
mod startup;
mod tasks;

use tasks::Catalog;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();

    // Catalog calls and prefetches run here; the UI and player stay on their
    // own threads.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("cadenza-net")
        .enable_all()
        .build()?;

    let client = ApiClient::new(&settings.server.base_url, settings.request_timeout())?;
    let (player, notices) = Player::spawn(
        settings.audio.clone(),
        client.stream_endpoints(),
        client.http(),
        runtime.handle().clone(),
    );

    let (catalog_tx, catalog_rx) = mpsc::channel::<CatalogEvent>();
    let catalog = Catalog::new(
        client,
        runtime.handle().clone(),
        catalog_tx,
        settings.library.clone(),
    );

    let mut app = App::new();
    app.set_playback_handle(player.playback_handle());
    startup::bootstrap(&catalog, &settings);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        let channels = event_loop::Channels {
            player: &player,
            catalog: &catalog,
            notices: &notices,
            catalog_rx: &catalog_rx,
        };
        let mut state = event_loop::EventLoopState::default();
        event_loop::run(&mut terminal, &settings, &mut app, &channels, &mut state)
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    player.quit_softly(settings.quit_fade_out());
    info!("Shut down");
    run_result
}
