//! Repair session state machine.
//!
//! Frontends re-run the repair whenever an input changes. This module
//! makes that discipline explicit: the session tracks the fingerprint of
//! the last attempted input set, enforces single-flight execution, and
//! coalesces changes that arrive while a run is in flight into exactly
//! one follow-up run reflecting the newest inputs.
//!
//! The session itself is a plain deterministic struct. Callers feed it
//! [`Session::offer`] / [`Session::complete`] events and start a run
//! whenever a fingerprint is handed back.

use crate::codec::Imei;

/// Identity of one set of repair inputs.
///
/// Two input sets with equal fingerprints produce identical artifacts, so
/// a run only starts when the fingerprint differs from the last attempted
/// one. The fingerprint is recorded together with the run it describes;
/// the two can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    /// Identity of the backup being repaired (path, name, or content hash).
    pub file: String,
    /// Identity of the profile source (see `ProfileSource::identity`).
    pub profile: String,
    pub imei1: Imei,
    pub imei2: Imei,
}

/// Lifecycle of the current repair attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No run attempted yet.
    Idle,
    /// A run is in flight.
    Processing,
    /// The last run produced an artifact.
    Success,
    /// The last run failed; a changed input set re-triggers.
    Failed,
}

/// Single-flight repair session.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    last_attempted: Option<Fingerprint>,
    in_flight: Option<Fingerprint>,
    pending: Option<Fingerprint>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            last_attempted: None,
            in_flight: None,
            pending: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Offer the current input set.
    ///
    /// Returns the fingerprint of the run to start now, or `None` when
    /// nothing should start: the inputs match the last attempt, or a run
    /// is in flight, in which case the offer is kept (only the newest
    /// one) as the pending follow-up.
    pub fn offer(&mut self, inputs: Fingerprint) -> Option<Fingerprint> {
        if self.in_flight.is_some() {
            if self.in_flight.as_ref() == Some(&inputs) {
                // The newest inputs are exactly what is running; any
                // previously queued change is obsolete.
                self.pending = None;
            } else {
                self.pending = Some(inputs);
            }
            return None;
        }

        if self.last_attempted.as_ref() == Some(&inputs) {
            return None;
        }

        self.begin(inputs.clone());
        Some(inputs)
    }

    /// Report completion of the in-flight run.
    ///
    /// Returns the fingerprint of the follow-up run to start, if a changed
    /// input set was coalesced while the run was in flight.
    pub fn complete(&mut self, success: bool) -> Option<Fingerprint> {
        self.in_flight = None;
        self.state = if success {
            SessionState::Success
        } else {
            SessionState::Failed
        };

        let next = self.pending.take()?;
        if self.last_attempted.as_ref() == Some(&next) {
            return None;
        }
        self.begin(next.clone());
        Some(next)
    }

    fn begin(&mut self, inputs: Fingerprint) {
        self.state = SessionState::Processing;
        self.last_attempted = Some(inputs.clone());
        self.in_flight = Some(inputs);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(file: &str, imei1: &str) -> Fingerprint {
        Fingerprint {
            file: file.to_owned(),
            profile: "builtin:qualcomm_profile_1".to_owned(),
            imei1: Imei::new(imei1).unwrap(),
            imei2: Imei::new("543210987654321").unwrap(),
        }
    }

    #[test]
    fn test_fresh_inputs_start_a_run() {
        let mut session = Session::new();
        assert_eq!(session.state(), SessionState::Idle);

        let started = session.offer(fp("a.txt", "123456789012345"));
        assert_eq!(started, Some(fp("a.txt", "123456789012345")));
        assert_eq!(session.state(), SessionState::Processing);
    }

    #[test]
    fn test_unchanged_inputs_do_not_rerun() {
        let mut session = Session::new();
        session.offer(fp("a.txt", "123456789012345")).unwrap();
        assert_eq!(session.complete(true), None);
        assert_eq!(session.state(), SessionState::Success);

        assert_eq!(session.offer(fp("a.txt", "123456789012345")), None);
        assert_eq!(session.state(), SessionState::Success);
    }

    #[test]
    fn test_changed_inputs_rerun_after_success() {
        let mut session = Session::new();
        session.offer(fp("a.txt", "123456789012345")).unwrap();
        session.complete(true);

        let rerun = session.offer(fp("a.txt", "111111111111111"));
        assert_eq!(rerun, Some(fp("a.txt", "111111111111111")));
    }

    #[test]
    fn test_failure_reruns_only_on_change() {
        let mut session = Session::new();
        session.offer(fp("a.txt", "123456789012345")).unwrap();
        session.complete(false);
        assert_eq!(session.state(), SessionState::Failed);

        // Same inputs: the failure stands.
        assert_eq!(session.offer(fp("a.txt", "123456789012345")), None);
        // Any change re-triggers.
        assert!(session.offer(fp("b.txt", "123456789012345")).is_some());
    }

    #[test]
    fn test_single_flight_coalesces_to_newest() {
        let mut session = Session::new();
        session.offer(fp("a.txt", "123456789012345")).unwrap();

        // Three changes land while the run is in flight.
        assert_eq!(session.offer(fp("a.txt", "111111111111111")), None);
        assert_eq!(session.offer(fp("a.txt", "222222222222222")), None);
        assert_eq!(session.offer(fp("a.txt", "333333333333333")), None);

        // Exactly one follow-up, reflecting the newest inputs.
        let follow_up = session.complete(true);
        assert_eq!(follow_up, Some(fp("a.txt", "333333333333333")));
        assert_eq!(session.state(), SessionState::Processing);
        assert_eq!(session.complete(true), None);
    }

    #[test]
    fn test_revert_to_in_flight_inputs_cancels_follow_up() {
        let mut session = Session::new();
        session.offer(fp("a.txt", "123456789012345")).unwrap();

        session.offer(fp("a.txt", "111111111111111"));
        // The user reverts to what is already running.
        session.offer(fp("a.txt", "123456789012345"));

        assert_eq!(session.complete(true), None);
        assert_eq!(session.state(), SessionState::Success);
    }

    #[test]
    fn test_fingerprint_covers_every_input() {
        let base = fp("a.txt", "123456789012345");

        let mut other_file = base.clone();
        other_file.file = "b.txt".to_owned();
        assert_ne!(base, other_file);

        let mut other_profile = base.clone();
        other_profile.profile = "custom:aa:bb:cc".to_owned();
        assert_ne!(base, other_profile);

        let mut other_imei = base.clone();
        other_imei.imei2 = Imei::new("999999999999999").unwrap();
        assert_ne!(base, other_imei);
    }
}
