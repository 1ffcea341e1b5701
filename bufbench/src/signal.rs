//! Routing SIGINT/SIGTERM into a [`CancelToken`].
//!
//! The tool runs in its own process group, so a terminal Ctrl-C only reaches
//! the harness. The handler cancels the token, and every in-flight
//! invocation then kills its tool's process group and returns `Cancelled`.
//! The handler resets itself after the first delivery, so a second signal
//! terminates the harness the usual way.

use std::sync::OnceLock;

use crate::{
    error::{BenchError, Result},
    sweep::CancelToken,
};

static SIGNAL_TOKEN: OnceLock<CancelToken> = OnceLock::new();

/// Installs the process-wide handler. Only one token can ever be wired up.
#[cfg(unix)]
pub fn cancel_on_signals(token: &CancelToken) -> Result<()> {
    use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

    SIGNAL_TOKEN
        .set(token.clone())
        .map_err(|_| BenchError::InvalidConfig("signal handler already installed".to_string()))?;

    let action = SigAction::new(
        SigHandler::Handler(on_signal),
        SaFlags::SA_RESTART | SaFlags::SA_RESETHAND,
        SigSet::empty(),
    );
    for signal in [Signal::SIGINT, Signal::SIGTERM] {
        // SAFETY: on_signal only does an atomic load and an atomic store.
        unsafe { sigaction(signal, &action) }.map_err(std::io::Error::from)?;
    }
    log::debug!("SIGINT/SIGTERM will cancel the running sweep");
    Ok(())
}

#[cfg(not(unix))]
pub fn cancel_on_signals(token: &CancelToken) -> Result<()> {
    SIGNAL_TOKEN
        .set(token.clone())
        .map_err(|_| BenchError::InvalidConfig("signal handler already installed".to_string()))
}

#[cfg(unix)]
extern "C" fn on_signal(_signal: std::ffi::c_int) {
    if let Some(token) = SIGNAL_TOKEN.get() {
        token.cancel();
    }
}
