//! Background poller for the "extension installed" flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::PanelError;
use crate::host::{ConfigurationManager, DisposalScope, UiDispatcher};
use crate::msg::Msg;

const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Cross-thread view of the "a start sequence is in flight" guard.
///
/// Written only by the controller on the UI thread; read here and by the watcher.
#[derive(Debug, Clone, Default)]
pub struct StartGuard(Arc<AtomicBool>);

impl StartGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check-and-set in one step. False if a start is already in flight.
    pub fn try_acquire(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_held(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

pub struct ConfigWatcher {
    config: Arc<dyn ConfigurationManager>,
    dispatcher: UiDispatcher,
    guard: StartGuard,
    interval: Duration,
    last_installed: bool,
}

impl ConfigWatcher {
    /// Samples the initial install flag right away.
    pub fn new(
        config: Arc<dyn ConfigurationManager>,
        dispatcher: UiDispatcher,
        guard: StartGuard,
        interval: Duration,
    ) -> Self {
        let last_installed = config.is_extension_installed().unwrap_or_else(|err| {
            tracing::warn!("{}", PanelError::ConfigQuery(err));
            false
        });

        Self {
            config,
            dispatcher,
            guard,
            interval,
            last_installed,
        }
    }

    pub fn last_installed(&self) -> bool {
        self.last_installed
    }

    /// One sampling step. Returns the new value when it differs from the last
    /// sample; intermediate flips between samples are invisible.
    pub fn poll_once(&mut self) -> Option<bool> {
        if self.guard.is_held() {
            return None;
        }

        let installed = match self.config.is_extension_installed() {
            Ok(installed) => installed,
            Err(err) => {
                tracing::warn!("{}", PanelError::ConfigQuery(err));
                return None;
            }
        };

        if installed == self.last_installed {
            return None;
        }

        tracing::info!(
            "extension install state changed: {} -> {installed}",
            self.last_installed
        );
        self.last_installed = installed;
        Some(installed)
    }

    /// Runs until `scope` is disposed or the UI queue goes away.
    pub fn run(mut self, scope: &DisposalScope) {
        while !scope.is_disposed() {
            if !sleep_unless_disposed(self.interval, scope) {
                break;
            }

            if let Some(installed) = self.poll_once()
                && !self.dispatcher.dispatch(Msg::ConfigChanged(installed))
            {
                break;
            }
        }

        tracing::info!("configuration monitoring stopped");
    }

    pub fn spawn(self, scope: DisposalScope) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("agentpanel-config-watch".to_string())
            .spawn(move || self.run(&scope))
    }
}

/// False when the scope got disposed while sleeping.
fn sleep_unless_disposed(total: Duration, scope: &DisposalScope) -> bool {
    let deadline = Instant::now() + total;
    loop {
        if scope.is_disposed() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(SLEEP_SLICE.min(deadline - now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FlagConfig {
        installed: AtomicBool,
        fail: AtomicBool,
        queries: Mutex<usize>,
    }

    impl FlagConfig {
        fn set(&self, installed: bool) {
            self.installed.store(installed, Ordering::SeqCst);
        }
    }

    impl ConfigurationManager for FlagConfig {
        fn is_extension_installed(&self) -> Result<bool, HostError> {
            *self.queries.lock().unwrap() += 1;
            if self.fail.load(Ordering::SeqCst) {
                return Err(HostError::Unavailable("config store".to_string()));
            }
            Ok(self.installed.load(Ordering::SeqCst))
        }
        fn is_configuration_loaded(&self) -> bool {
            true
        }
        fn is_configuration_valid(&self) -> bool {
            true
        }
        fn configuration_error(&self) -> Option<String> {
            None
        }
        fn current_extension_id(&self) -> Option<String> {
            None
        }
        fn set_current_extension_id(&self, _id: &str) -> Result<(), HostError> {
            Ok(())
        }
    }

    fn watcher(config: &Arc<FlagConfig>, guard: StartGuard) -> ConfigWatcher {
        let (dispatcher, _rx) = UiDispatcher::channel();
        ConfigWatcher::new(config.clone(), dispatcher, guard, Duration::from_millis(5))
    }

    #[test]
    fn guard_is_single_holder() {
        let guard = StartGuard::new();
        assert!(guard.try_acquire());
        assert!(!guard.try_acquire());
        guard.release();
        assert!(guard.try_acquire());
    }

    #[test]
    fn reports_edges_only() {
        let config = Arc::new(FlagConfig::default());
        let mut watcher = watcher(&config, StartGuard::new());

        assert_eq!(watcher.poll_once(), None);
        config.set(true);
        assert_eq!(watcher.poll_once(), Some(true));
        assert_eq!(watcher.poll_once(), None);
        config.set(false);
        assert_eq!(watcher.poll_once(), Some(false));
    }

    #[test]
    fn flips_between_samples_collapse() {
        let config = Arc::new(FlagConfig::default());
        config.set(true);
        let mut watcher = watcher(&config, StartGuard::new());
        assert!(watcher.last_installed());

        config.set(false);
        config.set(true);
        assert_eq!(watcher.poll_once(), None);
    }

    #[test]
    fn query_errors_do_not_change_last_sample() {
        let config = Arc::new(FlagConfig::default());
        let mut watcher = watcher(&config, StartGuard::new());

        config.fail.store(true, Ordering::SeqCst);
        config.set(true);
        assert_eq!(watcher.poll_once(), None);
        assert!(!watcher.last_installed());

        config.fail.store(false, Ordering::SeqCst);
        assert_eq!(watcher.poll_once(), Some(true));
    }

    #[test]
    fn held_guard_skips_sampling() {
        let config = Arc::new(FlagConfig::default());
        let guard = StartGuard::new();
        let mut watcher = watcher(&config, guard.clone());
        let baseline = *config.queries.lock().unwrap();

        assert!(guard.try_acquire());
        config.set(true);
        assert_eq!(watcher.poll_once(), None);
        assert_eq!(*config.queries.lock().unwrap(), baseline);

        guard.release();
        assert_eq!(watcher.poll_once(), Some(true));
    }

    #[test]
    fn loop_dispatches_edge_and_stops_on_dispose() {
        let config = Arc::new(FlagConfig::default());
        let (dispatcher, rx) = UiDispatcher::channel();
        let watcher = ConfigWatcher::new(
            config.clone(),
            dispatcher,
            StartGuard::new(),
            Duration::from_millis(10),
        );
        let scope = DisposalScope::new();
        let handle = watcher.spawn(scope.clone()).unwrap();

        config.set(true);
        let msg = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(msg, Msg::ConfigChanged(true)));

        scope.dispose();
        handle.join().unwrap();
    }
}
