//! Process-wide configuration context.
//!
//! The engine is single-threaded, so the configuration lives in one
//! thread-local slot with an explicit lifecycle: [`set`] installs a value,
//! [`get`] reads a snapshot, [`reset`] restores the defaults and
//! [`with_config`] overrides it for the duration of a closure. Tests can
//! therefore isolate their configuration per run.
use std::{cell::RefCell, rc::Rc};

use crate::{error::UnhandledError, notification::NotificationKind};

/// Sink for errors delivered to subscribers without an error callback.
pub type UnhandledErrorHandler = Rc<dyn Fn(UnhandledError)>;

/// Hook invoked when a notification arrives after a subscriber closed.
pub type StoppedNotificationHandler = Rc<dyn Fn(NotificationKind)>;

#[derive(Clone, Default)]
pub struct Config {
  /// Replaces the default sink (a `tracing` error event) for unhandled errors.
  pub on_unhandled_error: Option<UnhandledErrorHandler>,

  /// Observes notifications that were dropped because their target had
  /// already closed. Nothing is reported when unset.
  pub on_stopped_notification: Option<StoppedNotificationHandler>,

  /// Legacy mode: unhandled errors panic synchronously at the delivery site.
  ///
  /// A panic raised this way unwinds through whatever is delivering the
  /// error, which can cut other consumers of a multicast source short. It is
  /// strictly opt-in and not meant for production use.
  pub use_deprecated_synchronous_error_handling: bool,
}

thread_local! {
  static CONFIG: RefCell<Config> = RefCell::new(Config::default());
}

/// Installs `config` for the current thread, returning the previous value.
pub fn set(config: Config) -> Config { CONFIG.with(|c| c.replace(config)) }

/// Snapshot of the active configuration.
pub fn get() -> Config { CONFIG.with(|c| c.borrow().clone()) }

pub fn reset() { set(Config::default()); }

/// Runs `f` with `config` installed, restoring the previous configuration
/// afterwards even if `f` panics.
pub fn with_config<R>(config: Config, f: impl FnOnce() -> R) -> R {
  struct Restore(Option<Config>);
  impl Drop for Restore {
    fn drop(&mut self) {
      if let Some(previous) = self.0.take() {
        set(previous);
      }
    }
  }

  let _restore = Restore(Some(set(config)));
  f()
}

/// Routes an error nobody handled to the configured sink.
pub(crate) fn report_unhandled_error<E: 'static>(err: E) {
  let config = get();
  let err = UnhandledError::new(err);
  if config.use_deprecated_synchronous_error_handling {
    panic!("{err}");
  }
  match config.on_unhandled_error {
    Some(handler) => handler(err),
    None => tracing::error!(error_type = err.type_name(), "{err}"),
  }
}

pub(crate) fn report_stopped_notification(kind: NotificationKind) {
  let handler = CONFIG.with(|c| c.borrow().on_stopped_notification.clone());
  if let Some(handler) = handler {
    handler(kind);
  }
}
