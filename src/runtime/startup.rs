use tracing::info;

use crate::app::App;
use crate::config;

use super::tasks::Catalog;

/// Kick off sign-in and the catalog loads that need no account.
pub fn bootstrap(catalog: &Catalog, settings: &config::Settings) {
    info!(base_url = %settings.server.base_url, "Connecting");
    catalog.sign_in(&settings.server);
    catalog.load_page(1);
    catalog.load_popular();
    catalog.load_artists();
    catalog.load_plans();
}

/// Loads that depend on the signed-in user. Track lists are refetched so
/// their like flags reflect the account.
pub fn after_sign_in(catalog: &Catalog, app: &App) {
    let Some(user) = app.user.as_ref() else {
        return;
    };
    catalog.load_liked(user.user_id);
    catalog.load_playlists(user.user_id);
    catalog.load_page(app.page);
    catalog.load_popular();
}
