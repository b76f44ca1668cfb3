//! In-memory backend and fixtures shared by the unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sl_api::{AgendaBackend, ApiError, Exhibition, UserProfile};
use sl_core::{
    BookingId, BookingStatus, ExhibitionId, GameSessionId, GmSession, PlayerBooking,
    SessionStatus, UserId,
};

pub fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, minute, 0).unwrap()
}

pub fn session(id: &str, title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> GmSession {
    GmSession {
        id: GameSessionId::new(id).unwrap(),
        title: title.to_string(),
        exhibition_id: ExhibitionId::new("1").unwrap(),
        exhibition_title: "Ludis Expo".to_string(),
        status: SessionStatus::Validated,
        scheduled_start: start,
        scheduled_end: end,
        zone_name: Some("Hall A".to_string()),
        table_label: Some("T1".to_string()),
        language: "en".to_string(),
        max_players: 5,
        confirmed_players: 3,
        waitlist_count: 0,
        game: None,
    }
}

pub fn booking(id: &str, title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> PlayerBooking {
    PlayerBooking {
        id: BookingId::new(id).unwrap(),
        game_session_id: GameSessionId::new(format!("gs-{id}")).unwrap(),
        session_title: title.to_string(),
        exhibition_id: ExhibitionId::new("1").unwrap(),
        exhibition_title: "Ludis Expo".to_string(),
        status: BookingStatus::Confirmed,
        scheduled_start: start,
        scheduled_end: end,
        zone_name: Some("Hall B".to_string()),
        table_label: None,
        gm_name: "Morgan".to_string(),
        language: "fr".to_string(),
        max_players: 4,
        confirmed_players: 4,
        waitlist_count: 2,
        game: None,
    }
}

/// Backend double holding the user's sessions and bookings in memory.
pub struct FakeBackend {
    pub gm_sessions: Mutex<Vec<GmSession>>,
    pub bookings: Mutex<Vec<PlayerBooking>>,
    pub grace_period_minutes: Option<u32>,
    pub fail_fetch: AtomicBool,
    pub reject_actions: AtomicBool,
    pub fetch_delay: Duration,
    pub action_delay: Duration,
    pub fetches: AtomicUsize,
    pub check_ins: AtomicUsize,
}

impl FakeBackend {
    pub fn new(gm_sessions: Vec<GmSession>, bookings: Vec<PlayerBooking>) -> Self {
        Self {
            gm_sessions: Mutex::new(gm_sessions),
            bookings: Mutex::new(bookings),
            grace_period_minutes: None,
            fail_fetch: AtomicBool::new(false),
            reject_actions: AtomicBool::new(false),
            fetch_delay: Duration::ZERO,
            action_delay: Duration::ZERO,
            fetches: AtomicUsize::new(0),
            check_ins: AtomicUsize::new(0),
        }
    }

    fn check_fetch(&self) -> Result<(), ApiError> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(ApiError::Api {
                status: 401,
                message: "Invalid token.".to_string(),
            });
        }
        Ok(())
    }

    async fn before_action(&self) -> Result<(), ApiError> {
        if !self.action_delay.is_zero() {
            tokio::time::sleep(self.action_delay).await;
        }
        if self.reject_actions.load(Ordering::SeqCst) {
            return Err(ApiError::Api {
                status: 409,
                message: "Check-in is not open yet.".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AgendaBackend for FakeBackend {
    async fn current_user(&self) -> Result<UserProfile, ApiError> {
        self.check_fetch()?;
        Ok(UserProfile {
            id: UserId::new("u1").unwrap(),
            username: "alex".to_string(),
        })
    }

    async fn exhibition(&self, id: &ExhibitionId) -> Result<Exhibition, ApiError> {
        self.check_fetch()?;
        Ok(Exhibition {
            id: id.clone(),
            title: "Ludis Expo".to_string(),
            grace_period_minutes: self.grace_period_minutes,
        })
    }

    async fn gm_sessions(&self, _exhibition: &ExhibitionId) -> Result<Vec<GmSession>, ApiError> {
        if !self.fetch_delay.is_zero() {
            tokio::time::sleep(self.fetch_delay).await;
        }
        self.check_fetch()?;
        Ok(self.gm_sessions.lock().unwrap().clone())
    }

    async fn bookings(&self, _exhibition: &ExhibitionId) -> Result<Vec<PlayerBooking>, ApiError> {
        self.check_fetch()?;
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.bookings.lock().unwrap().clone())
    }

    async fn check_in(&self, booking: &BookingId) -> Result<PlayerBooking, ApiError> {
        self.check_ins.fetch_add(1, Ordering::SeqCst);
        self.before_action().await?;
        let mut bookings = self.bookings.lock().unwrap();
        let found = bookings
            .iter_mut()
            .find(|b| &b.id == booking)
            .ok_or_else(|| ApiError::Api {
                status: 404,
                message: "Not found.".to_string(),
            })?;
        found.status = BookingStatus::CheckedIn;
        Ok(found.clone())
    }

    async fn cancel_booking(&self, booking: &BookingId) -> Result<(), ApiError> {
        self.before_action().await?;
        self.bookings.lock().unwrap().retain(|b| &b.id != booking);
        Ok(())
    }
}
