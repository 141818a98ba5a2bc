use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use crate::host::{ComponentHandle, SurfaceId};

new_key_type! {
    pub struct ComponentKey;
}

/// A child of the panel's content tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    /// System information card shown until the surface page loads.
    Placeholder,
    /// Known-issues / copy-system-info actions under the placeholder.
    ButtonBar,
    InstallPrompt,
    StatusLine,
    Surface {
        id: SurfaceId,
        handle: ComponentHandle,
        view_type: String,
    },
}

impl Component {
    fn is_surface(&self) -> bool {
        matches!(self, Component::Surface { .. })
    }
}

/// What occupies the main body of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Body<'a> {
    Empty,
    InstallPrompt,
    /// Placeholder, possibly with a surface attached behind it that is still loading.
    Placeholder { loading: Option<SurfaceId> },
    Surface {
        id: SurfaceId,
        view_type: &'a str,
    },
}

/// Content tree of the panel. Mutated by the controller only.
#[derive(Debug, Default)]
pub struct PanelContent {
    components: SlotMap<ComponentKey, Component>,
    order: SmallVec<[ComponentKey; 4]>,
    surface: Option<(SurfaceId, ComponentKey)>,
    placeholder_retired: bool,
}

impl PanelContent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chrome for "no extension installed".
    pub fn show_install_prompt(&mut self) {
        self.clear_chrome();
        self.push(Component::InstallPrompt);
        self.push(Component::StatusLine);
    }

    /// Chrome for every installed state. The placeholder only comes back if
    /// it was never retired.
    pub fn show_status(&mut self) {
        self.clear_chrome();
        if !self.placeholder_retired {
            self.push(Component::Placeholder);
            self.push(Component::ButtonBar);
        }
        self.push(Component::StatusLine);
    }

    /// Returns false when a surface with this identity is already attached.
    pub fn attach_surface(
        &mut self,
        id: SurfaceId,
        handle: ComponentHandle,
        view_type: impl Into<String>,
    ) -> bool {
        if self.surface.is_some_and(|(attached, _)| attached == id) {
            return false;
        }

        if let Some((_, stale)) = self.surface.take() {
            self.remove(stale);
        }

        let key = self.push(Component::Surface {
            id,
            handle,
            view_type: view_type.into(),
        });
        self.surface = Some((id, key));
        true
    }

    /// Removes placeholder chrome for the rest of the panel's life.
    pub fn retire_placeholder(&mut self) {
        self.placeholder_retired = true;
        let doomed: Vec<ComponentKey> = self
            .order
            .iter()
            .copied()
            .filter(|key| {
                matches!(
                    self.components.get(*key),
                    Some(Component::Placeholder | Component::ButtonBar)
                )
            })
            .collect();
        for key in doomed {
            self.remove(key);
        }
    }

    pub fn placeholder_retired(&self) -> bool {
        self.placeholder_retired
    }

    pub fn has_placeholder(&self) -> bool {
        self.components().any(|c| *c == Component::Placeholder)
    }

    pub fn attached_surface(&self) -> Option<SurfaceId> {
        self.surface.map(|(id, _)| id)
    }

    pub fn surface_count(&self) -> usize {
        self.components().filter(|c| c.is_surface()).count()
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.order.iter().filter_map(|key| self.components.get(*key))
    }

    pub fn body(&self) -> Body<'_> {
        let mut placeholder = false;
        let mut surface = None;

        for component in self.components() {
            match component {
                Component::InstallPrompt => return Body::InstallPrompt,
                Component::Placeholder => placeholder = true,
                Component::Surface { id, view_type, .. } => surface = Some((*id, view_type)),
                Component::ButtonBar | Component::StatusLine => {}
            }
        }

        match (placeholder, surface) {
            (true, loading) => Body::Placeholder {
                loading: loading.map(|(id, _)| id),
            },
            (false, Some((id, view_type))) => Body::Surface {
                id,
                view_type: view_type.as_str(),
            },
            (false, None) => Body::Empty,
        }
    }

    fn push(&mut self, component: Component) -> ComponentKey {
        let key = self.components.insert(component);
        self.order.push(key);
        key
    }

    fn remove(&mut self, key: ComponentKey) {
        self.components.remove(key);
        self.order.retain(|k| *k != key);
    }

    fn clear_chrome(&mut self) {
        let chrome: Vec<ComponentKey> = self
            .order
            .iter()
            .copied()
            .filter(|key| self.surface.is_none_or(|(_, surface)| surface != *key))
            .collect();
        for key in chrome {
            self.remove(key);
        }
    }
}
