//! Agenda view controller.
//!
//! Owns one [`UserAgenda`] for as long as the view is open. Data is only
//! replaced by a complete refetch, actions are serialized by a single-attempt
//! guard, and once the view is closed any result still in flight is dropped.
//! A ticker re-renders on a fixed interval so countdowns move without
//! touching the network.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use sl_api::{AgendaBackend, ApiError};
use sl_core::{AgendaEntry, BookingId, CheckInState, CheckInWindow, ExhibitionId, UserAgenda};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Errors surfaced by the view, following what the user gets to see.
#[derive(Debug, Error)]
pub enum ViewError {
    /// The agenda could not be loaded; nothing is rendered.
    #[error("failed to load agenda: {0}")]
    Fetch(#[source] ApiError),

    /// The backend rejected an action; the previous agenda stays on screen.
    #[error("{action} failed: {source}")]
    Action {
        action: &'static str,
        #[source]
        source: ApiError,
    },

    /// An action was started while another one was still running.
    #[error("another action is already in progress")]
    ActionInFlight,

    /// The view was closed before the operation finished.
    #[error("view closed")]
    Closed,
}

/// A loaded agenda together with the window used to evaluate check-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedAgenda {
    pub agenda: UserAgenda,
    pub window: CheckInWindow,
    /// Transient message from the last failed action.
    pub notice: Option<String>,
}

impl LoadedAgenda {
    pub fn check_in_state(&self, entry: &AgendaEntry, now: DateTime<Utc>) -> CheckInState {
        entry.check_in_state(now, &self.window)
    }
}

/// What the view currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Ready(LoadedAgenda),
    Failed(String),
}

/// Clears the in-flight flag when the action finishes, however it finishes.
struct ActionGuard<'a>(&'a AtomicBool);

impl<'a> ActionGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for ActionGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Wall clock read on every tick.
type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Per-exhibition agenda view.
pub struct AgendaView<B> {
    backend: Arc<B>,
    exhibition_id: ExhibitionId,
    base_window: CheckInWindow,
    state: Arc<Mutex<ViewState>>,
    action_in_flight: AtomicBool,
    closed: CancellationToken,
    ticker: Option<JoinHandle<()>>,
    clock: Clock,
}

impl<B: AgendaBackend> AgendaView<B> {
    pub fn new(backend: Arc<B>, exhibition_id: ExhibitionId, base_window: CheckInWindow) -> Self {
        Self {
            backend,
            exhibition_id,
            base_window,
            state: Arc::new(Mutex::new(ViewState::Loading)),
            action_in_flight: AtomicBool::new(false),
            closed: CancellationToken::new(),
            ticker: None,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the clock the ticker reads.
    #[must_use]
    pub fn with_clock<C>(mut self, clock: C) -> Self
    where
        C: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub async fn state(&self) -> ViewState {
        self.state.lock().await.clone()
    }

    /// Fetch everything and replace the agenda wholesale.
    pub async fn refresh(&self) -> Result<(), ViewError> {
        let fetched = tokio::select! {
            biased;
            () = self.closed.cancelled() => return Err(ViewError::Closed),
            result = self.fetch() => result,
        };

        let mut state = self.state.lock().await;
        if self.closed.is_cancelled() {
            tracing::warn!(exhibition = %self.exhibition_id, "dropping agenda fetched after close");
            return Err(ViewError::Closed);
        }
        match fetched {
            Ok(loaded) => {
                *state = ViewState::Ready(loaded);
                Ok(())
            }
            Err(err) => {
                *state = ViewState::Failed(err.to_string());
                Err(ViewError::Fetch(err))
            }
        }
    }

    async fn fetch(&self) -> Result<LoadedAgenda, ApiError> {
        let backend = self.backend.as_ref();
        let exhibition_id = &self.exhibition_id;
        let (user, exhibition, gm_sessions, bookings) = tokio::try_join!(
            backend.current_user(),
            backend.exhibition(exhibition_id),
            backend.gm_sessions(exhibition_id),
            backend.bookings(exhibition_id),
        )?;

        let window = exhibition
            .grace_period_minutes
            .map_or(self.base_window, |minutes| {
                self.base_window.with_grace_period(minutes)
            });
        let agenda = UserAgenda::build(
            user.id,
            exhibition.id,
            exhibition.title,
            gm_sessions,
            bookings,
        );
        Ok(LoadedAgenda {
            agenda,
            window,
            notice: None,
        })
    }

    pub async fn check_in(&self, booking: &BookingId) -> Result<(), ViewError> {
        self.run_action("check-in", self.backend.check_in(booking))
            .await
    }

    pub async fn cancel_booking(&self, booking: &BookingId) -> Result<(), ViewError> {
        self.run_action("cancel", self.backend.cancel_booking(booking))
            .await
    }

    /// Run one backend action, then refetch on success.
    async fn run_action<T>(
        &self,
        action: &'static str,
        call: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<(), ViewError> {
        let Some(_guard) = ActionGuard::acquire(&self.action_in_flight) else {
            tracing::warn!(action, "ignoring action while another is in flight");
            return Err(ViewError::ActionInFlight);
        };

        let result = tokio::select! {
            biased;
            () = self.closed.cancelled() => return Err(ViewError::Closed),
            result = call => result,
        };

        match result {
            Ok(_) => {
                tracing::debug!(action, "action succeeded, refetching agenda");
                self.refresh().await
            }
            Err(source) => {
                let mut state = self.state.lock().await;
                if self.closed.is_cancelled() {
                    return Err(ViewError::Closed);
                }
                tracing::warn!(action, error = %source, "action rejected");
                if let ViewState::Ready(loaded) = &mut *state {
                    loaded.notice = Some(format!("{action} failed: {source}"));
                }
                Err(ViewError::Action { action, source })
            }
        }
    }

    /// Call `on_tick` with the current state every `every`, starting now.
    ///
    /// Replaces any running ticker. The ticker stops when the view is closed
    /// or dropped.
    pub fn start_ticker<F>(&mut self, every: Duration, mut on_tick: F)
    where
        F: FnMut(&ViewState, DateTime<Utc>) + Send + 'static,
    {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }

        let state = Arc::clone(&self.state);
        let closed = self.closed.clone();
        let clock = Arc::clone(&self.clock);
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                tokio::select! {
                    biased;
                    () = closed.cancelled() => break,
                    _ = interval.tick() => {}
                }
                let snapshot = state.lock().await.clone();
                on_tick(&snapshot, clock());
            }
        }));
    }

    /// Tear the view down: stop the ticker and drop in-flight results.
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

impl<B> Drop for AgendaView<B> {
    fn drop(&mut self) {
        self.closed.cancel();
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use sl_core::{BookingStatus, Role};

    use super::*;
    use crate::testing::{FakeBackend, at, booking, session};

    fn view(backend: FakeBackend) -> (Arc<FakeBackend>, AgendaView<FakeBackend>) {
        let backend = Arc::new(backend);
        let view = AgendaView::new(
            Arc::clone(&backend),
            ExhibitionId::new("1").unwrap(),
            CheckInWindow::default(),
        );
        (backend, view)
    }

    fn loaded(state: ViewState) -> LoadedAgenda {
        match state {
            ViewState::Ready(loaded) => loaded,
            other => panic!("expected loaded agenda, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn refresh_builds_agenda_with_conflicts() {
        let backend = FakeBackend::new(
            vec![session("a", "Session A", at(14, 10, 0), at(14, 14, 0))],
            vec![booking("b", "Booking B", at(14, 13, 0), at(14, 16, 0))],
        );
        let (_, view) = view(backend);
        assert_eq!(view.state().await, ViewState::Loading);

        view.refresh().await.unwrap();

        let loaded = loaded(view.state().await);
        assert_eq!(loaded.agenda.exhibition_title, "Ludis Expo");
        assert_eq!(loaded.agenda.user_id.as_str(), "u1");
        assert_eq!(loaded.agenda.conflicts.len(), 1);
        assert_eq!(loaded.agenda.conflicts[0].session1_role, Role::Gm);
        assert_eq!(loaded.window, CheckInWindow::default());
    }

    #[tokio::test]
    async fn exhibition_grace_period_overrides_default() {
        let mut backend = FakeBackend::new(vec![], vec![]);
        backend.grace_period_minutes = Some(30);
        let (_, view) = view(backend);

        view.refresh().await.unwrap();

        assert_eq!(loaded(view.state().await).window.grace_period_minutes, 30);
    }

    #[tokio::test]
    async fn fetch_failure_is_page_level() {
        let backend = FakeBackend::new(vec![], vec![]);
        backend.fail_fetch.store(true, Ordering::SeqCst);
        let (_, view) = view(backend);

        let err = view.refresh().await.unwrap_err();

        assert!(matches!(err, ViewError::Fetch(ApiError::Api { status: 401, .. })));
        assert!(matches!(view.state().await, ViewState::Failed(_)));
    }

    #[tokio::test]
    async fn check_in_refetches_before_showing_new_state() {
        let backend = FakeBackend::new(
            vec![],
            vec![booking("b", "Booking B", at(14, 13, 0), at(14, 16, 0))],
        );
        let (backend, view) = view(backend);
        view.refresh().await.unwrap();
        let fetches_before = backend.fetches.load(Ordering::SeqCst);

        view.check_in(&BookingId::new("b").unwrap()).await.unwrap();

        assert_eq!(backend.fetches.load(Ordering::SeqCst), fetches_before + 1);
        let loaded = loaded(view.state().await);
        assert_eq!(loaded.agenda.bookings[0].status, BookingStatus::CheckedIn);
        assert_eq!(loaded.notice, None);
    }

    #[tokio::test]
    async fn cancel_removes_booking_after_refetch() {
        let backend = FakeBackend::new(
            vec![session("a", "Session A", at(14, 10, 0), at(14, 14, 0))],
            vec![booking("b", "Booking B", at(14, 13, 0), at(14, 16, 0))],
        );
        let (_, view) = view(backend);
        view.refresh().await.unwrap();

        view.cancel_booking(&BookingId::new("b").unwrap())
            .await
            .unwrap();

        let loaded = loaded(view.state().await);
        assert!(loaded.agenda.bookings.is_empty());
        assert!(loaded.agenda.conflicts.is_empty());
    }

    #[tokio::test]
    async fn rejected_action_keeps_agenda_and_sets_notice() {
        let backend = FakeBackend::new(
            vec![],
            vec![booking("b", "Booking B", at(14, 13, 0), at(14, 16, 0))],
        );
        backend.reject_actions.store(true, Ordering::SeqCst);
        let (backend, view) = view(backend);
        view.refresh().await.unwrap();
        let before = loaded(view.state().await).agenda;
        let fetches_before = backend.fetches.load(Ordering::SeqCst);

        let err = view
            .check_in(&BookingId::new("b").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, ViewError::Action { action: "check-in", .. }));
        let after = loaded(view.state().await);
        assert_eq!(after.agenda, before);
        assert_eq!(
            after.notice.as_deref(),
            Some("check-in failed: API error (409): Check-in is not open yet.")
        );
        assert_eq!(backend.fetches.load(Ordering::SeqCst), fetches_before);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_action_is_rejected() {
        let mut backend = FakeBackend::new(
            vec![],
            vec![booking("b", "Booking B", at(14, 13, 0), at(14, 16, 0))],
        );
        backend.action_delay = Duration::from_secs(5);
        let (backend, view) = view(backend);
        view.refresh().await.unwrap();
        let id = BookingId::new("b").unwrap();

        let (first, second) = tokio::join!(view.check_in(&id), async {
            tokio::task::yield_now().await;
            view.check_in(&id).await
        });

        assert!(first.is_ok());
        assert!(matches!(second, Err(ViewError::ActionInFlight)));
        assert_eq!(backend.check_ins.load(Ordering::SeqCst), 1);

        // The guard is released once the first action completes
        assert!(view.check_in(&id).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn results_after_close_are_dropped() {
        let mut backend = FakeBackend::new(vec![], vec![]);
        backend.fetch_delay = Duration::from_secs(10);
        let (_, view) = view(backend);

        let (result, ()) = tokio::join!(view.refresh(), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            view.close();
        });

        assert!(matches!(result, Err(ViewError::Closed)));
        assert!(view.is_closed());
        assert_eq!(view.state().await, ViewState::Loading);
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_runs_until_close() {
        let (_, mut view) = view(FakeBackend::new(vec![], vec![]));
        view.refresh().await.unwrap();
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);

        view.start_ticker(Duration::from_secs(30), move |state, _now| {
            assert!(matches!(state, ViewState::Ready(_)));
            counter.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_secs(95)).await;
        let ticked = ticks.load(Ordering::SeqCst);
        assert!(ticked >= 3, "expected at least 3 ticks, got {ticked}");

        view.close();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), ticked);
    }
}
