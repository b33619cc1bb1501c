//! RAII guard for the transient "in update statement" session flag.
//!
//! The guard owns the mutable borrow of the session for its lifetime and
//! derefs to it, so the compile pipeline keeps using the session through the
//! guard. Dropping the guard restores the value the flag had on entry
//! (panic-safe, and on every early `?` return).

use std::ops::{Deref, DerefMut};

use crate::session::SessionState;

pub struct UpdateStmtScope<'a> {
    session: &'a mut SessionState,
    previous: bool,
}

impl<'a> UpdateStmtScope<'a> {
    /// Enter the scope. The flag is raised only when `is_update`; otherwise
    /// the guard is a pass-through that leaves the flag untouched.
    pub fn enter(session: &'a mut SessionState, is_update: bool) -> Self {
        let previous = session.in_update_stmt();
        if is_update {
            session.set_in_update_stmt(true);
        }
        Self { session, previous }
    }

    /// Value the flag will be restored to.
    pub fn previous(&self) -> bool {
        self.previous
    }
}

impl Deref for UpdateStmtScope<'_> {
    type Target = SessionState;

    fn deref(&self) -> &SessionState {
        self.session
    }
}

impl DerefMut for UpdateStmtScope<'_> {
    fn deref_mut(&mut self) -> &mut SessionState {
        self.session
    }
}

impl Drop for UpdateStmtScope<'_> {
    fn drop(&mut self) {
        self.session.set_in_update_stmt(self.previous);
    }
}
