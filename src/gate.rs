//! Holds back stop and snooze requests until a challenge is won.
//!
//! The gate never fails closed: a lost attempt just leaves the challenge
//! pending so the user can try again.

use serde::{Deserialize, Serialize};

use crate::{
    alarm::AlarmId,
    alert::Alert,
    error::{AlarmError, Result},
};

pub type ChallengeTicket = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DismissMode {
    Stop,
    Snooze,
}

/// A challenge the user has to win before `mode` is applied to `alarm`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeRequest {
    pub ticket: ChallengeTicket,
    pub alarm: AlarmId,
    pub mode: DismissMode,
    /// snoozes so far, for scaling the difficulty
    pub snooze_count: u32,
}

/// The outcome of a stop or snooze request.
#[derive(Debug, Clone, PartialEq)]
pub enum Dismissal {
    Committed(Alert),
    Challenged(ChallengeRequest),
}

#[derive(Debug, Default)]
pub struct DismissalGate {
    challenge_required: bool,
    pending: Vec<ChallengeRequest>,
    last_ticket: ChallengeTicket,
}

impl DismissalGate {
    #[must_use]
    pub fn new(challenge_required: bool) -> Self {
        Self {
            challenge_required,
            ..Self::default()
        }
    }

    /// pending challenges stay resolvable when this is switched off
    pub fn set_challenge_required(&mut self, required: bool) {
        self.challenge_required = required;
    }

    /// Returns the challenge to run, or `None` when the request may commit
    /// right away. A new request replaces any pending one for the same alarm.
    pub fn admit(
        &mut self,
        alarm: AlarmId,
        mode: DismissMode,
        snooze_count: u32,
    ) -> Option<ChallengeRequest> {
        if !self.challenge_required {
            return None;
        }
        self.forget(alarm);
        self.last_ticket += 1;
        let request = ChallengeRequest {
            ticket: self.last_ticket,
            alarm,
            mode,
            snooze_count,
        };
        self.pending.push(request.clone());
        Some(request)
    }

    /// Takes a won challenge out of the pending set.
    ///
    /// # Errors
    /// [`AlarmError::UnknownChallenge`] if it isn't pending (anymore)
    pub fn resolve(&mut self, ticket: ChallengeTicket) -> Result<ChallengeRequest> {
        self.take(ticket)
    }

    /// # Errors
    /// [`AlarmError::UnknownChallenge`] if it isn't pending (anymore)
    pub fn withdraw(&mut self, ticket: ChallengeTicket) -> Result<ChallengeRequest> {
        self.take(ticket)
    }

    /// drops whatever is pending for `alarm`
    pub fn forget(&mut self, alarm: AlarmId) {
        self.pending.retain(|request| request.alarm != alarm);
    }

    #[must_use]
    pub fn pending(&self) -> &[ChallengeRequest] {
        &self.pending
    }

    pub(crate) fn clear(&mut self) {
        self.pending.clear();
    }

    fn take(&mut self, ticket: ChallengeTicket) -> Result<ChallengeRequest> {
        let index = self
            .pending
            .iter()
            .position(|request| request.ticket == ticket)
            .ok_or(AlarmError::UnknownChallenge(ticket))?;
        Ok(self.pending.remove(index))
    }
}
