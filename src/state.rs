//! Consumer State Machine (§4.4): `Uninitialized → Subscribed ⇄ Unsubscribed → Closed`.

use crate::error::ActionError;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConsumerState {
    Uninitialized,
    Subscribed,
    Unsubscribed,
    Closed,
}

/// Guards and drives one session's consumer lifecycle. Not shared: owned by one
/// [`crate::session::Session`], behind the same lock that serializes subscribe/unsubscribe/
/// close against every other handler (§5).
#[derive(Debug)]
pub struct StateMachine {
    state: ConsumerState,
}

impl Default for StateMachine {
    fn default() -> Self {
        StateMachine {
            state: ConsumerState::Uninitialized,
        }
    }
}

impl StateMachine {
    pub fn current(&self) -> ConsumerState {
        self.state
    }

    /// Guard for `subscribe` (§4.4 table). Legal from Uninitialized (first subscribe) and
    /// Unsubscribed (re-subscribe); rejected while already Subscribed.
    pub fn begin_subscribe(&self) -> Result<(), ActionError> {
        match self.state {
            ConsumerState::Uninitialized | ConsumerState::Unsubscribed => Ok(()),
            ConsumerState::Subscribed => {
                Err(ActionError::Precondition("tmq should have unsubscribed first"))
            }
            ConsumerState::Closed => Err(ActionError::Precondition("tmq not init")),
        }
    }

    pub fn finish_subscribe(&mut self) {
        self.state = ConsumerState::Subscribed;
    }

    /// Guard shared by every operation that requires a live consumer handle (§4.4: "require
    /// `consumer != null`"). The reference implementation checks the handle itself, not
    /// whether the session is actively Subscribed, so this also accepts Unsubscribed — the
    /// consumer handle is retained across unsubscribe (§3 invariants).
    pub fn require_consumer(&self) -> Result<(), ActionError> {
        match self.state {
            ConsumerState::Subscribed | ConsumerState::Unsubscribed => Ok(()),
            ConsumerState::Uninitialized | ConsumerState::Closed => {
                Err(ActionError::Precondition("tmq not init"))
            }
        }
    }

    /// Guard for `unsubscribe`: same precondition as any other consumer operation.
    pub fn begin_unsubscribe(&self) -> Result<(), ActionError> {
        self.require_consumer()
    }

    pub fn finish_unsubscribe(&mut self) {
        self.state = ConsumerState::Unsubscribed;
    }

    pub fn close(&mut self) {
        self.state = ConsumerState::Closed;
    }

    pub fn is_closed(&self) -> bool {
        self.state == ConsumerState::Closed
    }
}
