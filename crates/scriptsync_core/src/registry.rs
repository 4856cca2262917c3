//! Registry of open sessions, owned by the host application.

use crate::corrector::CorrectionOptions;
use crate::session::ScriptSession;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Weak handles to every open session, for settings that apply to all of
/// them at once.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Vec<Weak<RefCell<ScriptSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `session` until it is dropped.
    pub fn register(&mut self, session: &Rc<RefCell<ScriptSession>>) {
        self.sessions.push(Rc::downgrade(session));
    }

    /// Live sessions; dropped ones are pruned.
    pub fn len(&mut self) -> usize {
        self.prune();
        self.sessions.len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    fn prune(&mut self) {
        self.sessions.retain(|session| session.strong_count() > 0);
    }

    /// Apply `options` to every live session.
    ///
    /// # Returns
    /// How many sessions were updated. Sessions that are currently borrowed
    /// are skipped.
    pub fn broadcast_correction_options(&mut self, options: CorrectionOptions) -> usize {
        self.prune();
        let mut updated = 0;
        for session in self.sessions.iter().filter_map(Weak::upgrade) {
            match session.try_borrow_mut() {
                Ok(mut session) => {
                    session.set_correction_options(options);
                    updated += 1;
                }
                Err(_) => tracing::warn!("skipping busy session during options broadcast"),
            }
        }
        updated
    }
}
