use crate::{
    Clock, CommitError, Distance, RecordSink, SessionId, Shot, VolleyError, VolleyRecord,
    VolleySession,
};

/// One archer's sitting: a fixed distance and volley size, and a counter of
/// the volleys committed so far. Only one volley accumulates at a time.
#[derive(Debug, Clone)]
pub struct ShootingSession {
    session_id: SessionId,
    distance: Distance,
    volley_number: u32,
    volley: VolleySession,
}

impl ShootingSession {
    pub fn new(
        session_id: SessionId,
        capacity: usize,
        distance: Distance,
    ) -> Result<Self, VolleyError> {
        Ok(Self {
            session_id,
            distance,
            volley_number: 1,
            volley: VolleySession::new(capacity)?,
        })
    }

    /// Open a session whose id is derived from the clock's current time.
    pub fn start<C: Clock + ?Sized>(
        capacity: usize,
        distance: Distance,
        clock: &C,
    ) -> Result<Self, VolleyError> {
        Self::new(SessionId::from_time(clock.now()), capacity, distance)
    }

    /// Replace the id of a session that has not committed anything yet, e.g.
    /// when its time-derived id is already taken by another archer.
    pub fn with_session_id(mut self, session_id: SessionId) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn distance(&self) -> Distance {
        self.distance
    }

    /// Number the next committed volley will carry.
    pub fn volley_number(&self) -> u32 {
        self.volley_number
    }

    pub fn volley(&self) -> &VolleySession {
        &self.volley
    }

    pub fn add(&mut self, shot: Shot) -> Result<(), VolleyError> {
        self.volley.add(shot)
    }

    pub fn remaining(&self) -> usize {
        self.volley.remaining()
    }

    /// Commit the current volley, clearing it regardless of what happens to
    /// the returned records.
    pub fn commit<C: Clock + ?Sized>(
        &mut self,
        clock: &C,
    ) -> Result<Vec<VolleyRecord>, VolleyError> {
        let records = self
            .volley
            .commit(&self.session_id, self.volley_number, self.distance, clock)?;
        self.volley_number += 1;
        Ok(records)
    }

    /// Commit the current volley through `sink`. The volley counter only moves
    /// when the sink accepted the batch.
    pub fn commit_into<C, S>(
        &mut self,
        clock: &C,
        sink: &mut S,
    ) -> Result<Vec<VolleyRecord>, CommitError<S::Error>>
    where
        C: Clock + ?Sized,
        S: RecordSink + ?Sized,
    {
        let records = self.volley.commit_into(
            &self.session_id,
            self.volley_number,
            self.distance,
            clock,
            sink,
        )?;
        self.volley_number += 1;
        Ok(records)
    }

    /// Records the current volley would be saved as. Nothing changes until
    /// [`ShootingSession::confirm_commit`] is called after they were stored.
    pub fn pending_records<C: Clock + ?Sized>(
        &self,
        clock: &C,
    ) -> Result<Vec<VolleyRecord>, VolleyError> {
        self.volley
            .records(&self.session_id, self.volley_number, self.distance, clock)
    }

    /// The records from [`ShootingSession::pending_records`] were stored:
    /// clear the volley and move on to the next one.
    pub fn confirm_commit(&mut self) {
        self.volley.clear();
        self.volley_number += 1;
    }
}
