//! Watch command: keep the agenda on screen with live countdowns.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use sl_api::AgendaBackend;

use crate::Config;
use crate::commands::util;
use crate::render::{self, RenderOptions};
use crate::view::{AgendaView, ViewState};

/// ANSI clear-screen and cursor-home.
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub async fn run<B: AgendaBackend + 'static>(
    backend: Arc<B>,
    config: &Config,
    exhibition: &str,
) -> Result<()> {
    let view = util::open_view(backend, config, exhibition).await?;
    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .context("failed to listen for Ctrl-C")
    };
    watch(view, config, io::stdout, shutdown).await
}

/// Redraw the view on every tick until `shutdown` resolves, then close it.
async fn watch<B, W, F, S>(
    mut view: AgendaView<B>,
    config: &Config,
    writer: F,
    shutdown: S,
) -> Result<()>
where
    B: AgendaBackend + 'static,
    W: Write,
    F: Fn() -> W + Send + 'static,
    S: Future<Output = Result<()>>,
{
    let options = util::render_options(config)?;
    view.start_ticker(config.refresh_interval(), move |state, now| {
        let mut out = writer();
        if let Err(err) = draw_frame(&mut out, state, now, options) {
            tracing::warn!(error = %err, "failed to render agenda");
        }
    });

    let result = shutdown.await;
    tracing::debug!("closing agenda view");
    view.close();
    result
}

fn draw_frame<W: Write>(
    out: &mut W,
    state: &ViewState,
    now: chrono::DateTime<chrono::Utc>,
    options: RenderOptions,
) -> io::Result<()> {
    write!(out, "{CLEAR_SCREEN}")?;
    render::render_state(out, state, now, options)?;
    writeln!(out, "\n(Ctrl-C to quit)")?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use chrono::{DateTime, Utc};

    use super::*;
    use crate::testing::{FakeBackend, at, booking};

    /// Writer that appends into a shared buffer.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn frames(buf: &SharedBuf) -> Vec<String> {
        let output = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        output
            .split(CLEAR_SCREEN)
            .filter(|frame| !frame.is_empty())
            .map(str::to_string)
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_decrements_on_each_tick_until_shutdown() {
        let backend = Arc::new(FakeBackend::new(
            vec![],
            vec![booking("b", "Dune", at(14, 9, 20), at(14, 11, 0))],
        ));
        let config = Config {
            utc_offset: Some("+00:00".to_string()),
            refresh_interval_secs: 60,
            ..Config::default()
        };

        let base = at(14, 9, 0);
        let started = tokio::time::Instant::now();
        let view = util::open_view(backend, &config, "1")
            .await
            .unwrap()
            .with_clock(move || -> DateTime<Utc> {
                let elapsed = chrono::Duration::from_std(started.elapsed()).unwrap();
                base + elapsed
            });

        let buf = SharedBuf::default();
        let sink = buf.clone();
        let shutdown = async {
            tokio::time::sleep(Duration::from_secs(150)).await;
            Ok(())
        };
        watch(view, &config, move || sink.clone(), shutdown)
            .await
            .unwrap();

        let drawn = frames(&buf);
        assert_eq!(drawn.len(), 3, "one frame per tick: {drawn:?}");
        for (frame, minutes) in drawn.iter().zip([5, 4, 3]) {
            assert!(
                frame.contains(&format!("CONFIRMED  check-in in {minutes} min")),
                "expected {minutes} min in {frame}"
            );
            assert!(frame.ends_with("(Ctrl-C to quit)\n"));
        }

        // Closed: further time produces no frames.
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(frames(&buf).len(), 3);
    }

    #[tokio::test]
    async fn shutdown_error_is_returned() {
        let backend = Arc::new(FakeBackend::new(vec![], vec![]));
        let config = Config {
            utc_offset: Some("+00:00".to_string()),
            ..Config::default()
        };
        let view = util::open_view(backend, &config, "1").await.unwrap();

        let buf = SharedBuf::default();
        let sink = buf.clone();
        let err = watch(view, &config, move || sink.clone(), async {
            Err(anyhow::anyhow!("signal handler unavailable"))
        })
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "signal handler unavailable");
    }

    #[test]
    fn frame_clears_screen_and_shows_state() {
        let mut out = Vec::new();
        let options = util::render_options(&Config {
            utc_offset: Some("+00:00".to_string()),
            ..Config::default()
        })
        .unwrap();
        draw_frame(&mut out, &ViewState::Loading, at(14, 9, 0), options).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{CLEAR_SCREEN}Loading agenda...\n\n(Ctrl-C to quit)\n")
        );
    }
}
