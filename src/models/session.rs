//! Add-plant session state machine
//!
//! **[LFL-SES-010]** One session tracks one add-plant flow through named
//! phases:
//! IDLE → CAPTURING → IDENTIFYING → REVIEWING → SUBMITTING → SAVED
//!
//! FAILED is recoverable: the user can retake, re-search, or fall back to
//! manual entry, so every failure leaves a path back into an active phase.
//!
//! **[LFL-SES-020]** Each identification call draws a monotonically
//! increasing request token. A completion carrying anything older than the
//! latest issued token is discarded, so a slow response can never overwrite
//! the state of a newer request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::plant::PlantDetails;

/// **[LFL-SES-010]** Add-plant session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionPhase {
    /// Session created, nothing happening yet
    Idle,
    /// User is taking or choosing a photo
    Capturing,
    /// Identification request in flight
    Identifying,
    /// Identification (or manual entry) shown for review/editing
    Reviewing,
    /// Submission request in flight
    Submitting,
    /// Record persisted, session finished
    Saved,
    /// Last action failed; recoverable
    Failed,
}

/// Phase transition event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub session_id: Uuid,
    pub old_phase: SessionPhase,
    pub new_phase: SessionPhase,
    pub transitioned_at: DateTime<Utc>,
}

/// Session state errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Illegal session transition: {from:?} -> {to:?}")]
    IllegalTransition { from: SessionPhase, to: SessionPhase },

    #[error("Stale identification token {token} (latest is {latest})")]
    StaleToken { token: u64, latest: u64 },
}

/// **[LFL-SES-010]** Add-plant session (in-memory state)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPlantSession {
    pub session_id: Uuid,
    pub phase: SessionPhase,
    /// Latest identification request token issued for this session
    pub request_seq: u64,
    /// Current identification result, replaced wholesale by a newer one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<PlantDetails>,
    /// Last user-facing advisory, if the previous action failed softly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_advisory: Option<String>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AddPlantSession {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            phase: SessionPhase::Idle,
            request_seq: 0,
            details: None,
            last_advisory: None,
            started_at: now,
            updated_at: now,
        }
    }

    fn transition_to(&mut self, new_phase: SessionPhase) -> PhaseTransition {
        let transition = PhaseTransition {
            session_id: self.session_id,
            old_phase: self.phase,
            new_phase,
            transitioned_at: Utc::now(),
        };
        self.phase = new_phase;
        self.updated_at = transition.transitioned_at;
        transition
    }

    /// User opened the camera or file picker. Clears any previous result.
    pub fn begin_capture(&mut self) -> Result<PhaseTransition, SessionError> {
        match self.phase {
            SessionPhase::Idle
            | SessionPhase::Capturing
            | SessionPhase::Reviewing
            | SessionPhase::Failed => {
                // Invalidate any in-flight identification
                self.request_seq += 1;
                self.details = None;
                self.last_advisory = None;
                Ok(self.transition_to(SessionPhase::Capturing))
            }
            from => Err(SessionError::IllegalTransition {
                from,
                to: SessionPhase::Capturing,
            }),
        }
    }

    /// Start an identification (image or text). Returns the request token the
    /// completion must present.
    ///
    /// **[LFL-SES-020]** A new call from REVIEWING or FAILED simply issues a
    /// newer token; the older in-flight response becomes stale.
    pub fn begin_identify(&mut self) -> Result<u64, SessionError> {
        match self.phase {
            SessionPhase::Idle
            | SessionPhase::Capturing
            | SessionPhase::Identifying
            | SessionPhase::Reviewing
            | SessionPhase::Failed => {
                self.request_seq += 1;
                self.transition_to(SessionPhase::Identifying);
                Ok(self.request_seq)
            }
            from => Err(SessionError::IllegalTransition {
                from,
                to: SessionPhase::Identifying,
            }),
        }
    }

    /// Complete an identification with the token from [`begin_identify`].
    ///
    /// **[LFL-SES-020]** Stale tokens are rejected without touching state.
    pub fn complete_identify(
        &mut self,
        token: u64,
        outcome: Result<PlantDetails, String>,
    ) -> Result<PhaseTransition, SessionError> {
        if token != self.request_seq {
            return Err(SessionError::StaleToken {
                token,
                latest: self.request_seq,
            });
        }

        match outcome {
            Ok(details) => {
                self.details = Some(details);
                self.last_advisory = None;
                Ok(self.transition_to(SessionPhase::Reviewing))
            }
            Err(advisory) => {
                self.last_advisory = Some(advisory);
                Ok(self.transition_to(SessionPhase::Failed))
            }
        }
    }

    /// User bypassed identification and is filling fields directly.
    /// Converges into the same review/submit path.
    pub fn apply_manual_entry(&mut self) -> Result<PhaseTransition, SessionError> {
        match self.phase {
            SessionPhase::Saved => Err(SessionError::IllegalTransition {
                from: SessionPhase::Saved,
                to: SessionPhase::Reviewing,
            }),
            _ => {
                // Invalidate any in-flight identification; manual fields win
                self.request_seq += 1;
                self.details = None;
                self.last_advisory = None;
                Ok(self.transition_to(SessionPhase::Reviewing))
            }
        }
    }

    /// Start submitting the assembled record
    pub fn begin_submit(&mut self) -> Result<PhaseTransition, SessionError> {
        match self.phase {
            SessionPhase::Idle | SessionPhase::Reviewing | SessionPhase::Failed => {
                Ok(self.transition_to(SessionPhase::Submitting))
            }
            from => Err(SessionError::IllegalTransition {
                from,
                to: SessionPhase::Submitting,
            }),
        }
    }

    /// Record the submission outcome. Failure keeps the session alive so the
    /// user can resubmit.
    pub fn complete_submit(&mut self, outcome: Result<(), String>) -> PhaseTransition {
        match outcome {
            Ok(()) => self.transition_to(SessionPhase::Saved),
            Err(advisory) => {
                self.last_advisory = Some(advisory);
                self.transition_to(SessionPhase::Failed)
            }
        }
    }

    /// A session is terminal only once its record is saved
    pub fn is_terminal(&self) -> bool {
        self.phase == SessionPhase::Saved
    }
}

impl Default for AddPlantSession {
    fn default() -> Self {
        Self::new()
    }
}
