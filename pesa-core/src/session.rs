//! Session id reuse strategies.
//!
//! The API issues short-lived session ids. [`NoSessionCache`] asks for a fresh
//! one before every transaction; [`TtlSessionCache`] keeps the last one for a
//! fixed time.

use chrono::{DateTime, TimeDelta, Utc};
use std::fmt::Debug;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

pub trait SessionCache: Send + Sync + Debug {
    fn get(&self) -> Option<String>;
    fn store(&self, session_id: &str);
    fn invalidate(&self);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoSessionCache;

impl SessionCache for NoSessionCache {
    fn get(&self) -> Option<String> {
        None
    }

    fn store(&self, _session_id: &str) {}

    fn invalidate(&self) {}
}

#[derive(Debug)]
struct CachedSession {
    session_id: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct TtlSessionCache {
    ttl: TimeDelta,
    slot: Mutex<Option<CachedSession>>,
}

impl TtlSessionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            slot: Mutex::new(None),
        }
    }
}

impl SessionCache for TtlSessionCache {
    fn get(&self) -> Option<String> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .filter(|cached| Utc::now() < cached.expires_at)
            .map(|cached| cached.session_id.clone())
    }

    fn store(&self, session_id: &str) {
        let expires_at = Utc::now()
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(CachedSession {
            session_id: session_id.to_string(),
            expires_at,
        });
    }

    fn invalidate(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }
}
