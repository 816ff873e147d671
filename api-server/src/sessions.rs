use std::{
    collections::HashMap,
    fmt,
    time::{Duration, Instant},
};

use quiver_core::{
    Clock, DistancePreset, SessionId, ShootingSession, VolleyError, VolleyRecord, VolleyState,
};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RegistryError {
    /// The registry already holds `max` sessions.
    Full { max: usize },
    NotFound,
    /// A volley of this session is being written to the log.
    CommitInProgress,
    Volley(VolleyError),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full { max } => write!(f, "too many open sessions (max {max})"),
            Self::NotFound => write!(f, "unknown or expired session"),
            Self::CommitInProgress => write!(f, "the current volley is being saved, try again"),
            Self::Volley(err) => write!(f, "{err}"),
        }
    }
}

impl From<VolleyError> for RegistryError {
    fn from(err: VolleyError) -> Self {
        Self::Volley(err)
    }
}

struct SessionEntry {
    session: ShootingSession,
    preset: DistancePreset,
    last_used: Instant,
    committing: bool,
}

#[derive(Default)]
struct Sessions {
    entries: HashMap<Uuid, SessionEntry>,
    /// Last time-derived id handed out and how many sessions received it.
    last_issued: Option<(SessionId, u32)>,
}

impl Sessions {
    /// A session id no live session uses and no earlier session of the same
    /// second received.
    fn claim_id(&mut self, base: &SessionId) -> SessionId {
        let mut n = match &self.last_issued {
            Some((last, issued)) if last == base => issued + 1,
            _ => 1,
        };
        let mut id = base.clone();
        loop {
            if n > 1 {
                id = base.with_suffix(n);
            }
            if !self.entries.values().any(|e| e.session.session_id() == &id) {
                break;
            }
            n += 1;
        }
        self.last_issued = Some((base.clone(), n));
        id
    }

    fn get_mut(&mut self, handle: Uuid) -> Result<&mut SessionEntry, RegistryError> {
        let entry = self.entries.get_mut(&handle).ok_or(RegistryError::NotFound)?;
        if entry.committing {
            return Err(RegistryError::CommitInProgress);
        }
        entry.last_used = Instant::now();
        Ok(entry)
    }
}

/// In-progress sessions of every connected archer, keyed by a random handle.
///
/// A handle only ever reaches its own session, and every session gets a
/// distinct `session_id` for the log even when several start in the same
/// second.
pub(crate) struct SessionRegistry {
    inner: RwLock<Sessions>,
    max_sessions: usize,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PendingShot {
    pub(crate) arrow_index: usize,
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) score: u8,
}

/// Read-only picture of a session for display.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SessionView {
    pub(crate) handle: Uuid,
    pub(crate) session_id: String,
    pub(crate) distance: u16,
    pub(crate) preset: DistancePreset,
    pub(crate) capacity: usize,
    pub(crate) volley_number: u32,
    pub(crate) state: VolleyState,
    pub(crate) pending: Vec<PendingShot>,
    pub(crate) remaining: usize,
    pub(crate) total: u32,
}

impl SessionView {
    fn new(handle: Uuid, entry: &SessionEntry) -> Self {
        let volley = entry.session.volley();
        Self {
            handle,
            session_id: entry.session.session_id().to_string(),
            distance: entry.session.distance().metres(),
            preset: entry.preset,
            capacity: volley.capacity(),
            volley_number: entry.session.volley_number(),
            state: volley.state(),
            pending: volley
                .scored()
                .enumerate()
                .map(|(idx, (shot, score))| PendingShot {
                    arrow_index: idx + 1,
                    x: shot.x,
                    y: shot.y,
                    score,
                })
                .collect(),
            remaining: volley.remaining(),
            total: volley.total(),
        }
    }
}

impl SessionRegistry {
    pub(crate) fn new(max_sessions: usize) -> Self {
        Self {
            inner: RwLock::new(Sessions::default()),
            max_sessions,
        }
    }

    /// Register `session`, renaming it when its id is already taken.
    pub(crate) async fn insert(
        &self,
        session: ShootingSession,
        preset: DistancePreset,
    ) -> Result<SessionView, RegistryError> {
        let mut inner = self.inner.write().await;
        if inner.entries.len() >= self.max_sessions {
            return Err(RegistryError::Full {
                max: self.max_sessions,
            });
        }

        let id = inner.claim_id(session.session_id());
        let session = if &id == session.session_id() {
            session
        } else {
            tracing::debug!("session id {} taken, using {}", session.session_id(), id);
            session.with_session_id(id)
        };

        let handle = Uuid::new_v4();
        let entry = SessionEntry {
            session,
            preset,
            last_used: Instant::now(),
            committing: false,
        };
        let view = SessionView::new(handle, &entry);
        inner.entries.insert(handle, entry);
        Ok(view)
    }

    pub(crate) async fn view(&self, handle: Uuid) -> Option<SessionView> {
        let inner = self.inner.read().await;
        inner
            .entries
            .get(&handle)
            .map(|entry| SessionView::new(handle, entry))
    }

    /// Run `f` against one session and return its result with a fresh view.
    pub(crate) async fn with_session<R>(
        &self,
        handle: Uuid,
        f: impl FnOnce(&mut ShootingSession) -> R,
    ) -> Result<(R, SessionView), RegistryError> {
        let mut inner = self.inner.write().await;
        let entry = inner.get_mut(handle)?;
        let result = f(&mut entry.session);
        Ok((result, SessionView::new(handle, entry)))
    }

    /// Freeze the current volley and hand out the records to store. The
    /// session refuses changes until [`SessionRegistry::finish_commit`].
    pub(crate) async fn begin_commit<C: Clock + ?Sized>(
        &self,
        handle: Uuid,
        clock: &C,
    ) -> Result<Vec<VolleyRecord>, RegistryError> {
        let mut inner = self.inner.write().await;
        let entry = inner.get_mut(handle)?;
        let records = entry.session.pending_records(clock)?;
        entry.committing = true;
        Ok(records)
    }

    /// Unfreeze the session. With `saved` the volley is cleared and the volley
    /// number advances; otherwise every pending shot stays for a retry.
    pub(crate) async fn finish_commit(
        &self,
        handle: Uuid,
        saved: bool,
    ) -> Result<SessionView, RegistryError> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .entries
            .get_mut(&handle)
            .ok_or(RegistryError::NotFound)?;
        entry.committing = false;
        entry.last_used = Instant::now();
        if saved {
            entry.session.confirm_commit();
        }
        Ok(SessionView::new(handle, entry))
    }

    /// Drop a session, returning how many unsaved arrows it still held.
    pub(crate) async fn remove(&self, handle: Uuid) -> Result<usize, RegistryError> {
        let mut inner = self.inner.write().await;
        inner.get_mut(handle)?;
        let entry = inner
            .entries
            .remove(&handle)
            .ok_or(RegistryError::NotFound)?;
        Ok(entry.session.volley().pending_count())
    }

    /// Forget sessions idle for at least `ttl`. Sessions in the middle of a
    /// commit are kept.
    pub(crate) async fn sweep(&self, ttl: Duration) -> usize {
        let mut inner = self.inner.write().await;
        let before = inner.entries.len();
        inner
            .entries
            .retain(|_, entry| entry.committing || entry.last_used.elapsed() < ttl);
        before - inner.entries.len()
    }

    pub(crate) async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use quiver_core::{Distance, FixedClock, Shot};

    fn session(id: &str) -> ShootingSession {
        ShootingSession::new(SessionId::new(id), 3, Distance::new(18)).unwrap()
    }

    fn clock() -> FixedClock {
        FixedClock(
            NaiveDate::from_ymd_opt(2024, 8, 3)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn handles_isolate_sessions() {
        let registry = SessionRegistry::new(4);
        let a = registry.insert(session("a"), DistancePreset::Standard).await.unwrap();
        let b = registry.insert(session("b"), DistancePreset::Standard).await.unwrap();
        assert_ne!(a.handle, b.handle);

        registry
            .with_session(a.handle, |s| s.add(Shot::new(1.0, 0.0)))
            .await
            .unwrap()
            .0
            .unwrap();

        assert_eq!(registry.view(a.handle).await.unwrap().pending.len(), 1);
        assert_eq!(registry.view(b.handle).await.unwrap().pending.len(), 0);
    }

    #[tokio::test]
    async fn same_second_sessions_get_distinct_ids() {
        let registry = SessionRegistry::new(4);
        let first = registry.insert(session("t"), DistancePreset::Standard).await.unwrap();
        let second = registry.insert(session("t"), DistancePreset::Standard).await.unwrap();
        assert_eq!(first.session_id, "t");
        assert_eq!(second.session_id, "t_2");

        // A closed session's id is not handed out again either.
        registry.remove(second.handle).await.unwrap();
        let third = registry.insert(session("t"), DistancePreset::Standard).await.unwrap();
        assert_eq!(third.session_id, "t_3");

        let other = registry.insert(session("u"), DistancePreset::Standard).await.unwrap();
        assert_eq!(other.session_id, "u");
    }

    #[tokio::test]
    async fn registry_is_bounded() {
        let registry = SessionRegistry::new(1);
        registry.insert(session("a"), DistancePreset::Standard).await.unwrap();
        let err = registry
            .insert(session("b"), DistancePreset::Standard)
            .await
            .unwrap_err();
        assert_eq!(err, RegistryError::Full { max: 1 });
    }

    #[tokio::test]
    async fn sweep_drops_idle_sessions() {
        let registry = SessionRegistry::new(4);
        registry.insert(session("a"), DistancePreset::Mobile).await.unwrap();

        assert_eq!(registry.sweep(Duration::from_secs(3600)).await, 0);
        assert_eq!(registry.sweep(Duration::ZERO).await, 1);
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn remove_reports_unsaved_arrows() {
        let registry = SessionRegistry::new(4);
        let view = registry.insert(session("a"), DistancePreset::Standard).await.unwrap();
        registry
            .with_session(view.handle, |s| s.add(Shot::new(0.0, 0.0)))
            .await
            .unwrap()
            .0
            .unwrap();

        assert_eq!(registry.remove(view.handle).await, Ok(1));
        assert_eq!(registry.remove(view.handle).await, Err(RegistryError::NotFound));
    }

    #[tokio::test]
    async fn session_is_frozen_while_its_volley_is_saved() {
        let registry = SessionRegistry::new(4);
        let view = registry.insert(session("a"), DistancePreset::Standard).await.unwrap();
        let handle = view.handle;
        registry
            .with_session(handle, |s| s.add(Shot::new(0.0, 0.0)))
            .await
            .unwrap()
            .0
            .unwrap();

        let records = registry.begin_commit(handle, &clock()).await.unwrap();
        assert_eq!(records.len(), 1);

        let blocked = registry
            .with_session(handle, |s| s.add(Shot::new(1.0, 1.0)))
            .await
            .unwrap_err();
        assert_eq!(blocked, RegistryError::CommitInProgress);
        assert_eq!(
            registry.begin_commit(handle, &clock()).await.unwrap_err(),
            RegistryError::CommitInProgress
        );
        assert_eq!(registry.remove(handle).await, Err(RegistryError::CommitInProgress));
        assert_eq!(registry.sweep(Duration::ZERO).await, 0);

        // A failed write keeps the shots and the volley number.
        let view = registry.finish_commit(handle, false).await.unwrap();
        assert_eq!(view.pending.len(), 1);
        assert_eq!(view.volley_number, 1);

        registry.begin_commit(handle, &clock()).await.unwrap();
        let view = registry.finish_commit(handle, true).await.unwrap();
        assert!(view.pending.is_empty());
        assert_eq!(view.volley_number, 2);
    }

    #[tokio::test]
    async fn empty_volley_is_not_frozen() {
        let registry = SessionRegistry::new(4);
        let view = registry.insert(session("a"), DistancePreset::Standard).await.unwrap();

        let err = registry.begin_commit(view.handle, &clock()).await.unwrap_err();
        assert_eq!(err, RegistryError::Volley(VolleyError::EmptyVolley));
        registry
            .with_session(view.handle, |s| s.add(Shot::new(0.0, 0.0)))
            .await
            .unwrap()
            .0
            .unwrap();
    }
}
