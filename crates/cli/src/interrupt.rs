//! Ctrl-C → cancel token. The engine checks the token between batches.

use std::sync::OnceLock;

use sitebook_recon::CancelToken;

static TOKEN: OnceLock<CancelToken> = OnceLock::new();

#[cfg(unix)]
extern "C" fn on_sigint(_: libc::c_int) {
    // OnceLock::get is a plain atomic load once initialized.
    if let Some(token) = TOKEN.get() {
        token.store(true, std::sync::atomic::Ordering::Relaxed);
    }
    // signal(2) is async-signal-safe; the next Ctrl-C terminates.
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_DFL);
    }
}

/// Route SIGINT to `token`. The first Ctrl-C requests cancellation and the
/// run stops after the current batch; a second Ctrl-C kills the process.
pub fn install(token: CancelToken) {
    if TOKEN.set(token).is_err() {
        return;
    }
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGINT, on_sigint as libc::sighandler_t);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn first_sigint_cancels_then_restores_default() {
        let token: CancelToken = Arc::new(AtomicBool::new(false));
        install(token.clone());

        unsafe {
            assert_eq!(libc::raise(libc::SIGINT), 0);
        }
        assert!(token.load(Ordering::Relaxed));

        // Swap in SIG_IGN to read the disposition left by the handler.
        let previous = unsafe { libc::signal(libc::SIGINT, libc::SIG_IGN) };
        assert_eq!(previous, libc::SIG_DFL);
        unsafe {
            libc::signal(libc::SIGINT, libc::SIG_DFL);
        }
    }
}
