//! Agenda command: one-shot render of the user's agenda.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use sl_api::AgendaBackend;

use crate::Config;
use crate::commands::util;
use crate::render;

pub async fn run<W: Write, B: AgendaBackend>(
    writer: &mut W,
    backend: Arc<B>,
    config: &Config,
    exhibition: &str,
    json: bool,
) -> Result<()> {
    let options = util::render_options(config)?;
    let view = util::open_view(backend, config, exhibition).await?;
    let loaded = util::loaded(&view).await?;

    let now = Utc::now();
    if json {
        render::render_json(writer, &loaded, now, options)?;
    } else {
        render::render_agenda(writer, &loaded, now, options)?;
    }
    Ok(())
}
