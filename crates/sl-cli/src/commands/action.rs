//! Check-in and cancel commands.
//!
//! Both load the agenda first so an unknown booking is reported locally,
//! then act through the view, which refetches before anything is rendered.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use sl_api::AgendaBackend;

use crate::Config;
use crate::commands::util;
use crate::render;

/// Which booking action to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CheckIn,
    Cancel,
}

impl Action {
    const fn past_tense(self) -> &'static str {
        match self {
            Self::CheckIn => "Checked in to",
            Self::Cancel => "Cancelled",
        }
    }
}

pub async fn run<W: Write, B: AgendaBackend>(
    writer: &mut W,
    backend: Arc<B>,
    config: &Config,
    exhibition: &str,
    booking: &str,
    action: Action,
) -> Result<()> {
    let options = util::render_options(config)?;
    let booking_id = util::parse_booking(booking)?;
    let view = util::open_view(backend, config, exhibition).await?;

    let title = {
        let loaded = util::loaded(&view).await?;
        let Some(found) = loaded.agenda.find_booking(&booking_id) else {
            bail!("booking {booking_id} is not in your agenda for exhibition {exhibition}");
        };
        found.session_title.clone()
    };

    let result = match action {
        Action::CheckIn => view.check_in(&booking_id).await,
        Action::Cancel => view.cancel_booking(&booking_id).await,
    };
    result.with_context(|| format!("booking {booking_id} ({title})"))?;

    writeln!(writer, "{} {title}.", action.past_tense())?;
    let loaded = util::loaded(&view).await?;
    render::render_agenda(writer, &loaded, Utc::now(), options)?;
    Ok(())
}
