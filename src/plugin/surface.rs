use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::error::HostError;
use crate::host::{
    ComponentHandle, CreationCallback, DisposalScope, PageLoadCallback, Surface, SurfaceId,
    ViewManager,
};

/// Surface created by the local extension runtime.
pub struct LocalSurface {
    id: SurfaceId,
    view_type: String,
    loaded: AtomicBool,
    on_load: Mutex<Option<PageLoadCallback>>,
}

impl LocalSurface {
    fn new(id: SurfaceId, view_type: String) -> Self {
        Self {
            id,
            view_type,
            loaded: AtomicBool::new(false),
            on_load: Mutex::new(None),
        }
    }

    /// Marks the page loaded and fires the callback, once.
    pub fn finish_loading(&self) {
        if self.loaded.swap(true, Ordering::AcqRel) {
            return;
        }

        let callback = self
            .on_load
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        if let Some(callback) = callback {
            callback();
        }
    }
}

impl Surface for LocalSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn view_type(&self) -> &str {
        &self.view_type
    }

    fn component(&self) -> ComponentHandle {
        ComponentHandle(self.id.0)
    }

    fn is_page_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    fn set_page_load_callback(&self, callback: PageLoadCallback) {
        *self.on_load.lock().unwrap_or_else(|p| p.into_inner()) = Some(callback);
    }
}

type CallbackTable = Mutex<Vec<(u64, CreationCallback)>>;

/// Local view manager. Owns every surface it creates.
pub struct SurfaceRegistry {
    latest: Mutex<Option<Arc<LocalSurface>>>,
    callbacks: Arc<CallbackTable>,
    next_callback: AtomicU64,
    next_surface: AtomicU64,
}

impl Default for SurfaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self {
            latest: Mutex::new(None),
            callbacks: Arc::new(Mutex::new(Vec::new())),
            next_callback: AtomicU64::new(1),
            next_surface: AtomicU64::new(1),
        }
    }

    /// Creates a surface and notifies creation callbacks on the calling thread.
    pub fn create_surface(&self, view_type: impl Into<String>) -> Arc<LocalSurface> {
        let id = SurfaceId(self.next_surface.fetch_add(1, Ordering::Relaxed));
        let surface = Arc::new(LocalSurface::new(id, view_type.into()));
        *self.latest.lock().unwrap_or_else(|p| p.into_inner()) = Some(surface.clone());

        let callbacks = self.callbacks.lock().unwrap_or_else(|p| p.into_inner());
        for (_, callback) in callbacks.iter() {
            callback(surface.clone());
        }

        surface
    }

    /// Creates a surface on a worker thread and completes its page load after `load_delay`.
    pub fn open(self: &Arc<Self>, view_type: String, load_delay: Duration) {
        let registry = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("agentpanel-surface".to_string())
            .spawn(move || {
                let surface = registry.create_surface(view_type);
                thread::sleep(load_delay);
                surface.finish_loading();
            });

        if let Err(err) = spawned {
            tracing::error!("failed to spawn surface loader: {err}");
        }
    }

    /// Drops the latest surface. Panels holding a reference see it go away.
    pub fn close_all(&self) {
        self.latest.lock().unwrap_or_else(|p| p.into_inner()).take();
    }

    pub fn callback_count(&self) -> usize {
        self.callbacks.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

impl ViewManager for SurfaceRegistry {
    fn latest_surface(&self) -> Option<Arc<dyn Surface>> {
        self.latest
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
            .map(|surface| surface as Arc<dyn Surface>)
    }

    fn add_creation_callback(
        &self,
        callback: CreationCallback,
        scope: &DisposalScope,
    ) -> Result<(), HostError> {
        let id = self.next_callback.fetch_add(1, Ordering::Relaxed);
        self.callbacks
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((id, callback));

        let table = Arc::downgrade(&self.callbacks);
        scope.register(move || {
            if let Some(table) = table.upgrade() {
                table
                    .lock()
                    .unwrap_or_else(|p| p.into_inner())
                    .retain(|(callback_id, _)| *callback_id != id);
            }
        });
        Ok(())
    }
}
