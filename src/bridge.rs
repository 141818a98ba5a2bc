//! Forwards surface lifecycle callbacks from the view manager onto the UI queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::PanelError;
use crate::host::{
    CreationCallback, DisposalScope, Surface, SurfaceId, SurfaceRef, UiDispatcher, ViewManager,
};
use crate::msg::Msg;

/// Result of registering with the view manager.
pub enum Registration {
    /// A surface already existed. The caller is on the UI thread and handles its
    /// creation (and load, if `loaded`) directly.
    Existing {
        surface: Arc<dyn Surface>,
        loaded: bool,
    },
    /// A creation callback is pending.
    Pending,
    /// Registration failed; surface events will never arrive.
    Unavailable,
}

pub struct WebViewLifecycleBridge;

impl WebViewLifecycleBridge {
    pub fn register(
        views: &Arc<dyn ViewManager>,
        dispatcher: &UiDispatcher,
        scope: &DisposalScope,
    ) -> Registration {
        if let Some(surface) = views.latest_surface() {
            // Hook before checking: a load landing in between is still seen by
            // one of the two, and the claim keeps it to one.
            let signal = watch_page_load(&surface, dispatcher);
            let loaded = surface.is_page_loaded() && signal.claim();
            tracing::info!(
                "found existing {} ({}), loaded: {loaded}",
                surface.id(),
                surface.view_type()
            );
            return Registration::Existing { surface, loaded };
        }

        let forwarded: Mutex<Option<SurfaceId>> = Mutex::new(None);
        let callback_dispatcher = dispatcher.clone();
        let callback: CreationCallback = Box::new(move |surface: Arc<dyn Surface>| {
            let id = surface.id();
            {
                let mut last = forwarded.lock().unwrap_or_else(|p| p.into_inner());
                if *last == Some(id) {
                    return;
                }
                *last = Some(id);
            }

            tracing::info!("{id} created ({})", surface.view_type());
            callback_dispatcher.dispatch(Msg::SurfaceCreated(SurfaceRef::new(&surface)));
            let signal = watch_page_load(&surface, &callback_dispatcher);
            if surface.is_page_loaded() {
                signal.fire();
            }
        });

        match views.add_creation_callback(callback, scope) {
            Ok(()) => Registration::Pending,
            Err(source) => {
                tracing::error!(
                    "{}",
                    PanelError::Subscription {
                        channel: "surface creation",
                        source,
                    }
                );
                Registration::Unavailable
            }
        }
    }
}

/// Delivers `SurfaceLoaded` for one surface at most once, whichever path fires first.
#[derive(Clone)]
struct LoadSignal {
    id: SurfaceId,
    fired: Arc<AtomicBool>,
    dispatcher: UiDispatcher,
}

impl LoadSignal {
    fn fire(&self) {
        if !self.fired.swap(true, Ordering::AcqRel) {
            tracing::debug!("{} page loaded", self.id);
            self.dispatcher.dispatch(Msg::SurfaceLoaded(self.id));
        }
    }

    /// Takes the load for the caller instead of dispatching it. False when the
    /// hook already delivered it.
    fn claim(&self) -> bool {
        !self.fired.swap(true, Ordering::AcqRel)
    }
}

fn watch_page_load(surface: &Arc<dyn Surface>, dispatcher: &UiDispatcher) -> LoadSignal {
    let signal = LoadSignal {
        id: surface.id(),
        fired: Arc::new(AtomicBool::new(false)),
        dispatcher: dispatcher.clone(),
    };

    let hook = signal.clone();
    surface.set_page_load_callback(Box::new(move || hook.fire()));
    signal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;
    use crate::host::{ComponentHandle, PageLoadCallback};
    use std::sync::mpsc::Receiver;

    struct StubSurface {
        id: u64,
        loaded: AtomicBool,
        callback: Mutex<Option<PageLoadCallback>>,
    }

    impl StubSurface {
        fn new(id: u64, loaded: bool) -> Arc<Self> {
            Arc::new(Self {
                id,
                loaded: AtomicBool::new(loaded),
                callback: Mutex::new(None),
            })
        }

        fn finish_loading(&self) {
            self.loaded.store(true, Ordering::SeqCst);
            if let Some(callback) = self.callback.lock().unwrap().take() {
                callback();
            }
        }
    }

    impl Surface for StubSurface {
        fn id(&self) -> SurfaceId {
            SurfaceId(self.id)
        }
        fn view_type(&self) -> &str {
            "stub"
        }
        fn component(&self) -> ComponentHandle {
            ComponentHandle(self.id)
        }
        fn is_page_loaded(&self) -> bool {
            self.loaded.load(Ordering::SeqCst)
        }
        fn set_page_load_callback(&self, callback: PageLoadCallback) {
            *self.callback.lock().unwrap() = Some(callback);
        }
    }

    #[derive(Default)]
    struct StubViews {
        latest: Mutex<Option<Arc<dyn Surface>>>,
        callbacks: Mutex<Vec<CreationCallback>>,
        refuse: bool,
    }

    impl StubViews {
        fn create(&self, surface: Arc<dyn Surface>) {
            for callback in self.callbacks.lock().unwrap().iter() {
                callback(surface.clone());
            }
        }
    }

    impl ViewManager for StubViews {
        fn latest_surface(&self) -> Option<Arc<dyn Surface>> {
            self.latest.lock().unwrap().clone()
        }
        fn add_creation_callback(
            &self,
            callback: CreationCallback,
            _scope: &DisposalScope,
        ) -> Result<(), HostError> {
            if self.refuse {
                return Err(HostError::Unavailable("view manager".to_string()));
            }
            self.callbacks.lock().unwrap().push(callback);
            Ok(())
        }
    }

    fn drain(rx: &Receiver<Msg>) -> Vec<Msg> {
        rx.try_iter().collect()
    }

    #[test]
    fn existing_loaded_surface_is_reported_without_messages() {
        let views = Arc::new(StubViews::default());
        let surface = StubSurface::new(1, true);
        *views.latest.lock().unwrap() = Some(surface.clone() as Arc<dyn Surface>);
        let views: Arc<dyn ViewManager> = views;
        let (dispatcher, rx) = UiDispatcher::channel();

        let scope = DisposalScope::new();
        let registration = WebViewLifecycleBridge::register(&views, &dispatcher, &scope);
        assert!(matches!(registration, Registration::Existing { loaded: true, .. }));

        surface.finish_loading();
        assert!(drain(&rx).is_empty());
    }

    /// Finishes loading while the hook is being installed. `fire_hook` picks
    /// whether the load lands before the hook (never called) or right after it.
    struct LateLoadSurface {
        loaded: AtomicBool,
        fire_hook: bool,
    }

    impl Surface for LateLoadSurface {
        fn id(&self) -> SurfaceId {
            SurfaceId(5)
        }
        fn view_type(&self) -> &str {
            "stub"
        }
        fn component(&self) -> ComponentHandle {
            ComponentHandle(5)
        }
        fn is_page_loaded(&self) -> bool {
            self.loaded.load(Ordering::SeqCst)
        }
        fn set_page_load_callback(&self, callback: PageLoadCallback) {
            self.loaded.store(true, Ordering::SeqCst);
            if self.fire_hook {
                callback();
            }
        }
    }

    fn register_existing(surface: Arc<dyn Surface>) -> (Registration, Vec<Msg>) {
        let views = Arc::new(StubViews::default());
        *views.latest.lock().unwrap() = Some(surface);
        let views: Arc<dyn ViewManager> = views;
        let (dispatcher, rx) = UiDispatcher::channel();
        let scope = DisposalScope::new();
        let registration = WebViewLifecycleBridge::register(&views, &dispatcher, &scope);
        (registration, drain(&rx))
    }

    #[test]
    fn existing_surface_loading_before_hook_is_reported_loaded() {
        let (registration, msgs) = register_existing(Arc::new(LateLoadSurface {
            loaded: AtomicBool::new(false),
            fire_hook: false,
        }));
        assert!(matches!(registration, Registration::Existing { loaded: true, .. }));
        assert!(msgs.is_empty());
    }

    #[test]
    fn existing_surface_loading_after_hook_signals_once() {
        let (registration, msgs) = register_existing(Arc::new(LateLoadSurface {
            loaded: AtomicBool::new(false),
            fire_hook: true,
        }));
        assert!(matches!(registration, Registration::Existing { loaded: false, .. }));
        assert_eq!(msgs.len(), 1);
        assert!(matches!(msgs[0], Msg::SurfaceLoaded(SurfaceId(5))));
    }

    #[test]
    fn existing_unloaded_surface_signals_on_load() {
        let views = Arc::new(StubViews::default());
        let surface = StubSurface::new(2, false);
        *views.latest.lock().unwrap() = Some(surface.clone() as Arc<dyn Surface>);
        let views: Arc<dyn ViewManager> = views;
        let (dispatcher, rx) = UiDispatcher::channel();
        let scope = DisposalScope::new();

        let registration = WebViewLifecycleBridge::register(&views, &dispatcher, &scope);
        assert!(matches!(registration, Registration::Existing { loaded: false, .. }));
        assert!(drain(&rx).is_empty());

        surface.finish_loading();
        surface.finish_loading();
        let msgs = drain(&rx);
        assert_eq!(msgs.len(), 1);
        assert!(matches!(msgs[0], Msg::SurfaceLoaded(SurfaceId(2))));
    }

    #[test]
    fn pending_creation_forwards_once_per_surface() {
        let stub = Arc::new(StubViews::default());
        let views: Arc<dyn ViewManager> = stub.clone();
        let (dispatcher, rx) = UiDispatcher::channel();

        let scope = DisposalScope::new();
        let registration = WebViewLifecycleBridge::register(&views, &dispatcher, &scope);
        assert!(matches!(registration, Registration::Pending));

        let surface = StubSurface::new(9, false);
        stub.create(surface.clone());
        stub.create(surface.clone());
        surface.finish_loading();

        let msgs = drain(&rx);
        assert_eq!(msgs.len(), 2);
        assert!(matches!(&msgs[0], Msg::SurfaceCreated(r) if r.id() == SurfaceId(9)));
        assert!(matches!(msgs[1], Msg::SurfaceLoaded(SurfaceId(9))));
    }

    #[test]
    fn surface_loaded_before_hook_signals_immediately() {
        let stub = Arc::new(StubViews::default());
        let views: Arc<dyn ViewManager> = stub.clone();
        let (dispatcher, rx) = UiDispatcher::channel();
        let scope = DisposalScope::new();
        WebViewLifecycleBridge::register(&views, &dispatcher, &scope);

        stub.create(StubSurface::new(4, true));

        let msgs = drain(&rx);
        assert_eq!(msgs.len(), 2);
        assert!(matches!(msgs[1], Msg::SurfaceLoaded(SurfaceId(4))));
    }

    #[test]
    fn refused_registration_degrades() {
        let views: Arc<dyn ViewManager> = Arc::new(StubViews {
            refuse: true,
            ..Default::default()
        });
        let (dispatcher, _rx) = UiDispatcher::channel();
        let scope = DisposalScope::new();
        let registration = WebViewLifecycleBridge::register(&views, &dispatcher, &scope);
        assert!(matches!(registration, Registration::Unavailable));
    }
}
