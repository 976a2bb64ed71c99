use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

/// Operator interrupt (Ctrl+C) shared between the signal listener and running commands.
///
/// While an operation is in flight the interrupt cancels its token, so the running
/// command and any pending pause stop and the operation unwinds with `Cancelled`.
/// With no operation in flight the console exits.
#[derive(Clone, Default)]
pub struct Interrupt {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    token: Mutex<CancellationToken>,
    busy: AtomicBool,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for the operation currently in flight.
    pub fn token(&self) -> CancellationToken {
        self.lock().clone()
    }

    pub fn trigger(&self) {
        self.lock().cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.lock().is_cancelled()
    }

    /// Mark an operation as in flight until the guard is dropped.
    pub fn begin(&self) -> OperationGuard<'_> {
        *self.lock() = CancellationToken::new();
        self.inner.busy.store(true, Ordering::SeqCst);
        OperationGuard { interrupt: self }
    }

    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::SeqCst)
    }

    /// Spawn the Ctrl+C listener on the given runtime.
    pub fn listen(&self, handle: &Handle) {
        let interrupt = self.clone();
        handle.spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if interrupt.is_busy() {
                    tracing::debug!("Interrupt received, cancelling current operation");
                    interrupt.trigger();
                } else {
                    println!("\n\n Interrupted by user. Goodbye!");
                    std::process::exit(0);
                }
            }
        });
    }

    fn lock(&self) -> MutexGuard<'_, CancellationToken> {
        self.inner
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct OperationGuard<'a> {
    interrupt: &'a Interrupt,
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        self.interrupt.inner.busy.store(false, Ordering::SeqCst);
        *self.interrupt.lock() = CancellationToken::new();
    }
}

#[cfg(test)]
mod tests {
    use super::Interrupt;

    #[test]
    fn test_trigger_cancels_current_token() {
        let interrupt = Interrupt::new();
        let _guard = interrupt.begin();
        let token = interrupt.token();

        interrupt.trigger();

        assert!(token.is_cancelled());
        assert!(interrupt.is_triggered());
    }

    #[test]
    fn test_guard_tracks_busy_and_resets_token() {
        let interrupt = Interrupt::new();
        assert!(!interrupt.is_busy());

        {
            let _guard = interrupt.begin();
            assert!(interrupt.is_busy());
            interrupt.trigger();
        }

        assert!(!interrupt.is_busy());
        assert!(!interrupt.is_triggered());
    }

    #[test]
    fn test_begin_starts_with_fresh_token() {
        let interrupt = Interrupt::new();
        interrupt.trigger();

        let _guard = interrupt.begin();
        assert!(!interrupt.token().is_cancelled());
    }
}
