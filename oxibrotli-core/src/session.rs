//! Session lifecycle shared by encoders and decoders.
//!
//! A [`Session`] owns the endpoint a stream is bound to (a sink for encoders,
//! a source for decoders) and tracks whether the stream is still open.
//!
//! ```text
//! Open --write*/flush*--> Open --close--> Closed
//! {Open, Closed} --rebind--> Open
//! ```

use crate::error::{OxiBrotliError, Result};
use tracing::trace;

/// Lifecycle state of a stream session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Accepting operations.
    #[default]
    Open,
    /// Finalized; only a rebind reopens it.
    Closed,
}

/// An endpoint plus its lifecycle state.
#[derive(Debug)]
pub struct Session<T> {
    endpoint: T,
    state: SessionState,
    generation: u64,
}

impl<T> Session<T> {
    /// Bind a new open session to `endpoint`.
    pub fn open(endpoint: T) -> Self {
        Self {
            endpoint,
            state: SessionState::Open,
            generation: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the session accepts operations.
    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    /// Number of rebinds since construction.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Fail with [`OxiBrotliError::ClosedStream`] unless open.
    pub fn ensure_open(&self, operation: &'static str) -> Result<()> {
        match self.state {
            SessionState::Open => Ok(()),
            SessionState::Closed => Err(OxiBrotliError::closed_stream(operation)),
        }
    }

    /// Transition Open to Closed.
    ///
    /// Closing twice is a usage error, not a no-op.
    pub fn close(&mut self, operation: &'static str) -> Result<()> {
        self.ensure_open(operation)?;
        self.state = SessionState::Closed;
        Ok(())
    }

    /// Bind to `endpoint` and reopen, returning the detached endpoint.
    pub fn rebind(&mut self, endpoint: T) -> T {
        self.state = SessionState::Open;
        self.generation += 1;
        trace!(generation = self.generation, "session rebound");
        std::mem::replace(&mut self.endpoint, endpoint)
    }

    /// Get a reference to the bound endpoint.
    pub fn get_ref(&self) -> &T {
        &self.endpoint
    }

    /// Get a mutable reference to the bound endpoint.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.endpoint
    }

    /// Consume the session and return the endpoint.
    pub fn into_inner(self) -> T {
        self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_open_close() {
        let mut session = Session::open(Vec::<u8>::new());
        assert!(session.is_open());
        session.ensure_open("write").expect("fresh session closed");

        session.close("close").expect("close failed");
        assert_eq!(session.state(), SessionState::Closed);

        let err = session.ensure_open("write").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ClosedStream);
    }

    #[test]
    fn test_double_close_is_error() {
        let mut session = Session::open(());
        session.close("close").expect("close failed");
        let err = session.close("close").unwrap_err();
        assert!(matches!(
            err,
            OxiBrotliError::ClosedStream {
                operation: "close"
            }
        ));
    }

    #[test]
    fn test_rebind_reopens_and_detaches() {
        let mut session = Session::open(vec![1u8]);
        session.close("close").expect("close failed");

        let old = session.rebind(vec![2u8]);
        assert_eq!(old, vec![1u8]);
        assert!(session.is_open());
        assert_eq!(session.get_ref(), &vec![2u8]);
        assert_eq!(session.generation(), 1);

        // Rebinding an open session is allowed too.
        session.rebind(vec![3u8]);
        assert_eq!(session.generation(), 2);
        assert_eq!(session.into_inner(), vec![3u8]);
    }
}
