//! Session ownership contract

/// A connector that owns exactly one transport session or driver connection.
///
/// `close` releases the session. It is idempotent: only the first call
/// releases anything. Implementors also close on `Drop`, so leaving a scope,
/// including by unwinding, releases the session once.
pub trait Lifecycle {
    /// Release the owned session
    fn close(&mut self);

    /// Whether the session has been released
    fn is_closed(&self) -> bool;
}
