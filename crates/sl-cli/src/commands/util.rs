//! Shared utilities for CLI commands.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use sl_api::AgendaBackend;
use sl_core::{BookingId, ExhibitionId};

use crate::Config;
use crate::render::{DisplayZone, RenderOptions};
use crate::view::{AgendaView, LoadedAgenda, ViewState};

/// Parse a user-supplied exhibition ID.
pub fn parse_exhibition(raw: &str) -> Result<ExhibitionId> {
    ExhibitionId::new(raw).with_context(|| format!("invalid exhibition ID: {raw:?}"))
}

/// Parse a user-supplied booking ID.
pub fn parse_booking(raw: &str) -> Result<BookingId> {
    BookingId::new(raw).with_context(|| format!("invalid booking ID: {raw:?}"))
}

/// Display zone and locale from configuration.
pub fn render_options(config: &Config) -> Result<RenderOptions> {
    Ok(RenderOptions {
        zone: DisplayZone::from_offset(config.display_offset()?),
        locale: config.locale()?,
    })
}

/// Create a view and load it once.
pub async fn open_view<B: AgendaBackend>(
    backend: Arc<B>,
    config: &Config,
    exhibition: &str,
) -> Result<AgendaView<B>> {
    let exhibition_id = parse_exhibition(exhibition)?;
    let view = AgendaView::new(backend, exhibition_id, config.check_in_window());
    view.refresh()
        .await
        .with_context(|| format!("could not show the agenda for exhibition {exhibition}"))?;
    Ok(view)
}

/// The loaded agenda, or an error if the view holds none.
pub async fn loaded<B: AgendaBackend>(view: &AgendaView<B>) -> Result<LoadedAgenda> {
    match view.state().await {
        ViewState::Ready(loaded) => Ok(loaded),
        ViewState::Loading => bail!("agenda is still loading"),
        ViewState::Failed(message) => bail!("agenda unavailable: {message}"),
    }
}
