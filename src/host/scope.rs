use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

type Disposer = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct ScopeInner {
    disposed: AtomicBool,
    disposers: Mutex<Vec<Disposer>>,
}

/// Host disposal mechanism: a flag plus disposers run once, newest first.
///
/// Cloning shares the same scope.
#[derive(Clone, Default)]
pub struct DisposalScope {
    inner: Arc<ScopeInner>,
}

impl DisposalScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// Registering on an already disposed scope runs the disposer immediately.
    pub fn register(&self, disposer: impl FnOnce() + Send + 'static) {
        if self.is_disposed() {
            disposer();
            return;
        }

        let mut disposers = self
            .inner
            .disposers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        disposers.push(Box::new(disposer));
    }

    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        let disposers = {
            let mut guard = self
                .inner
                .disposers
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            std::mem::take(&mut *guard)
        };

        for disposer in disposers.into_iter().rev() {
            disposer();
        }
    }
}

impl std::fmt::Debug for DisposalScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisposalScope")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn disposers_run_once_newest_first() {
        let scope = DisposalScope::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for n in 0..3 {
            let order = order.clone();
            scope.register(move || order.lock().unwrap().push(n));
        }

        scope.dispose();
        scope.dispose();

        assert!(scope.is_disposed());
        assert_eq!(*order.lock().unwrap(), vec![2, 1, 0]);
    }

    #[test]
    fn late_registration_runs_immediately() {
        let scope = DisposalScope::new();
        scope.dispose();

        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        scope.register(move || flag.store(true, Ordering::SeqCst));

        assert!(ran.load(Ordering::SeqCst));
    }
}
