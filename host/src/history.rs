use chrono::NaiveDateTime;
use quiver_core::{Distance, SessionId, VolleyRecord, MAX_SCORE};
use serde::Serialize;

#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub session_id: Option<SessionId>,
    pub distance: Option<Distance>,
}

impl HistoryFilter {
    pub fn matches(&self, record: &VolleyRecord) -> bool {
        self.session_id
            .as_ref()
            .map_or(true, |id| *id == record.session_id)
            && self.distance.map_or(true, |d| d == record.distance)
    }

    pub fn apply(&self, records: Vec<VolleyRecord>) -> Vec<VolleyRecord> {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VolleySummary {
    pub session_id: SessionId,
    pub volley_number: u32,
    pub distance: Distance,
    pub timestamp: NaiveDateTime,
    pub scores: Vec<u8>,
    pub total: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub distance: Distance,
    pub volleys: usize,
    pub arrows: usize,
    pub total: u32,
    pub average: f64,
    pub tens: usize,
    pub misses: usize,
}

/// Group records into volleys, in the order the volleys first appear.
pub fn summarize_volleys(records: &[VolleyRecord]) -> Vec<VolleySummary> {
    let mut volleys: Vec<VolleySummary> = Vec::new();

    for record in records {
        let existing = volleys.iter_mut().find(|v| {
            v.session_id == record.session_id && v.volley_number == record.volley_number
        });
        match existing {
            Some(volley) => {
                volley.scores.push(record.score);
                volley.total += u32::from(record.score);
            }
            None => volleys.push(VolleySummary {
                session_id: record.session_id.clone(),
                volley_number: record.volley_number,
                distance: record.distance,
                timestamp: record.timestamp,
                scores: vec![record.score],
                total: u32::from(record.score),
            }),
        }
    }

    volleys
}

/// Per-session totals, in the order sessions first appear.
pub fn summarize_sessions(records: &[VolleyRecord]) -> Vec<SessionSummary> {
    let volleys = summarize_volleys(records);
    let mut sessions: Vec<SessionSummary> = Vec::new();

    for volley in &volleys {
        let idx = match sessions.iter().position(|s| s.session_id == volley.session_id) {
            Some(idx) => idx,
            None => {
                sessions.push(SessionSummary {
                    session_id: volley.session_id.clone(),
                    distance: volley.distance,
                    volleys: 0,
                    arrows: 0,
                    total: 0,
                    average: 0.0,
                    tens: 0,
                    misses: 0,
                });
                sessions.len() - 1
            }
        };

        let session = &mut sessions[idx];
        session.volleys += 1;
        session.arrows += volley.scores.len();
        session.total += volley.total;
        session.tens += volley.scores.iter().filter(|s| **s == MAX_SCORE).count();
        session.misses += volley.scores.iter().filter(|s| **s == 0).count();
    }

    for session in &mut sessions {
        if session.arrows > 0 {
            session.average = f64::from(session.total) / session.arrows as f64;
        }
    }

    sessions
}
