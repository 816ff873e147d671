use serde::{Deserialize, Serialize};

use crate::{Clock, CommitError, Distance, SessionId, Shot, VolleyError, VolleyRecord};

/// Where committed records go.
///
/// Implemented by the CSV log store; closures work too, which keeps tests and
/// lock-guarded stores short.
pub trait RecordSink {
    type Error;

    fn append(&mut self, records: &[VolleyRecord]) -> Result<(), Self::Error>;
}

impl<F, E> RecordSink for F
where
    F: FnMut(&[VolleyRecord]) -> Result<(), E> + ?Sized,
{
    type Error = E;

    fn append(&mut self, records: &[VolleyRecord]) -> Result<(), E> {
        (self)(records)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VolleyState {
    Empty,
    Accumulating,
    Full,
}

/// Shots of the volley currently being shot.
#[derive(Debug, Clone)]
pub struct VolleySession {
    capacity: usize,
    pending: Vec<Shot>,
}

impl VolleySession {
    pub fn new(capacity: usize) -> Result<Self, VolleyError> {
        if capacity == 0 {
            return Err(VolleyError::InvalidCapacity);
        }
        Ok(Self {
            capacity,
            pending: Vec::with_capacity(capacity),
        })
    }

    /// Record one more arrow. A full volley rejects the shot and is left as is.
    pub fn add(&mut self, shot: Shot) -> Result<(), VolleyError> {
        if self.pending.len() >= self.capacity {
            return Err(VolleyError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.pending.push(shot);
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.pending.len()
    }

    pub fn pending(&self) -> &[Shot] {
        &self.pending
    }

    /// Pending shots in shooting order, paired with their scores.
    pub fn scored(&self) -> impl Iterator<Item = (Shot, u8)> + '_ {
        self.pending.iter().map(|shot| (*shot, shot.score()))
    }

    pub fn total(&self) -> u32 {
        self.scored().map(|(_, score)| u32::from(score)).sum()
    }

    pub fn state(&self) -> VolleyState {
        match self.pending.len() {
            0 => VolleyState::Empty,
            n if n < self.capacity => VolleyState::Accumulating,
            _ => VolleyState::Full,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Turn the pending shots into records and reset the volley.
    ///
    /// The volley is cleared as soon as the records exist, whatever the caller
    /// later does with them. Use [`VolleySession::commit_into`] to keep the
    /// shots until a store has accepted them.
    pub fn commit<C: Clock + ?Sized>(
        &mut self,
        session_id: &SessionId,
        volley_number: u32,
        distance: Distance,
        clock: &C,
    ) -> Result<Vec<VolleyRecord>, VolleyError> {
        let records = self.records(session_id, volley_number, distance, clock)?;
        self.clear();
        Ok(records)
    }

    /// Like [`VolleySession::commit`], but the volley is only cleared once
    /// `sink` has accepted the records. On a sink error every pending shot is
    /// still there for a retry.
    pub fn commit_into<C, S>(
        &mut self,
        session_id: &SessionId,
        volley_number: u32,
        distance: Distance,
        clock: &C,
        sink: &mut S,
    ) -> Result<Vec<VolleyRecord>, CommitError<S::Error>>
    where
        C: Clock + ?Sized,
        S: RecordSink + ?Sized,
    {
        let records = self.records(session_id, volley_number, distance, clock)?;
        sink.append(&records).map_err(CommitError::Sink)?;
        self.clear();
        Ok(records)
    }

    /// The records the pending shots would be saved as. The volley itself is
    /// left untouched; pair with [`VolleySession::clear`] once they are stored.
    pub fn records<C: Clock + ?Sized>(
        &self,
        session_id: &SessionId,
        volley_number: u32,
        distance: Distance,
        clock: &C,
    ) -> Result<Vec<VolleyRecord>, VolleyError> {
        if self.pending.is_empty() {
            return Err(VolleyError::EmptyVolley);
        }

        let timestamp = clock.now();
        Ok(self
            .pending
            .iter()
            .zip(1u32..)
            .map(|(shot, arrow_index)| VolleyRecord {
                timestamp,
                session_id: session_id.clone(),
                volley_number,
                arrow_index,
                x: shot.x,
                y: shot.y,
                score: shot.score(),
                distance,
            })
            .collect())
    }

    /// Drop every pending shot.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
