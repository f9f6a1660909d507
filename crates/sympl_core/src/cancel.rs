use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation token polled by the trajectory drivers once per
/// output interval. Call-scoped: each integration call takes its own token,
/// so concurrent calls never race on a shared flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Safe to call from any thread (or from a
    /// signal handler through [`SigintGuard`]).
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Reads and clears the flag in one step. The drivers call this once per
    /// output interval; a request arriving mid-interval stays latent until
    /// the interval's sub-stepping completes.
    pub fn poll(&self) -> bool {
        self.flag.swap(false, Ordering::SeqCst)
    }
}

#[cfg(unix)]
mod sigint {
    use super::CancelToken;
    use std::ptr;
    use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};
    use std::sync::Arc;

    // Signal handlers cannot capture state, so the currently registered
    // token's flag is published here. Only ever touched through atomics;
    // the handler itself is async-signal-safe.
    static ACTIVE: AtomicPtr<AtomicBool> = AtomicPtr::new(ptr::null_mut());

    extern "C" fn handle_sigint(_signum: libc::c_int) {
        let flag = ACTIVE.load(Ordering::SeqCst);
        if !flag.is_null() {
            unsafe { (*flag).store(true, Ordering::SeqCst) };
        }
    }

    /// Routes SIGINT into a [`CancelToken`] for the guard's lifetime and
    /// restores the platform-default handler on drop. At most one guard
    /// should be alive at a time; a later guard displaces an earlier one.
    /// Non-unix hosts drive the token from their own console-control hook.
    pub struct SigintGuard {
        // Keeps the flag allocation alive while the handler may observe it.
        _flag: Arc<AtomicBool>,
    }

    impl SigintGuard {
        pub fn install(token: &CancelToken) -> Self {
            let flag = token.flag.clone();
            ACTIVE.store(Arc::as_ptr(&flag) as *mut AtomicBool, Ordering::SeqCst);
            unsafe {
                libc::signal(libc::SIGINT, handle_sigint as *const () as libc::sighandler_t);
            }
            Self { _flag: flag }
        }
    }

    impl Drop for SigintGuard {
        fn drop(&mut self) {
            unsafe {
                libc::signal(libc::SIGINT, libc::SIG_DFL);
            }
            ACTIVE.store(ptr::null_mut(), Ordering::SeqCst);
        }
    }
}

#[cfg(unix)]
pub use sigint::SigintGuard;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_reads_and_clears_the_flag() {
        let token = CancelToken::new();
        assert!(!token.poll());
        token.cancel();
        assert!(token.is_cancelled());
        assert!(token.poll());
        assert!(!token.is_cancelled());
        assert!(!token.poll());
    }

    #[test]
    fn clones_share_one_flag() {
        let token = CancelToken::new();
        let other = token.clone();
        other.cancel();
        assert!(token.is_cancelled());
    }

    #[cfg(unix)]
    #[test]
    fn sigint_guard_routes_signal_into_token() {
        let token = CancelToken::new();
        {
            let _guard = SigintGuard::install(&token);
            unsafe {
                libc::raise(libc::SIGINT);
            }
            assert!(token.is_cancelled());
        }
        // Guard dropped; the default handler is back and the token is ours.
        assert!(token.poll());
    }
}
