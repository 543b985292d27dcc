mod headless;
mod scene;

use std::rc::Rc;

use tracing::{debug, error, warn};

use crate::error::{EngineError, EngineResult};
use crate::layout::ViewDimension;

pub use headless::{BackendEvent, HeadlessBackend, HeadlessContext};
pub use scene::{ResourceKind, SceneGraph, SceneObject};

/// Outcome of asking a backend to drop its context on purpose.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextLoss {
    Forced,
    Unsupported,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SurfaceStatus {
    #[default]
    Idle,
    Active,
    /// Context creation failed even after sweeping orphans.
    Unavailable(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SurfaceRequest {
    pub label: String,
    pub dimension: ViewDimension,
}

/// A GPU-ish rendering backend. Every call takes `&self`; backends keep their own bookkeeping
/// behind interior mutability so surfaces and the manager can share one instance.
pub trait SurfaceBackend {
    type Context;
    type Resource;

    /// Whether a new context could be created right now.
    fn probe_context(&self) -> bool;

    fn create_context(&self, request: &SurfaceRequest) -> Option<Self::Context>;

    fn create_resource(
        &self,
        context: &mut Self::Context,
        kind: ResourceKind,
        label: &str,
    ) -> Option<Self::Resource>;

    fn stop_animation(&self, context: &mut Self::Context);

    fn dispose_resource(&self, context: &mut Self::Context, kind: ResourceKind, resource: Self::Resource);

    fn lose_context(&self, context: &mut Self::Context) -> ContextLoss;

    /// Detaches the drawing target and shrinks it to zero size.
    fn detach_canvas(&self, context: &mut Self::Context);

    fn release_renderer(&self, context: Self::Context);

    /// Releases drawing targets nobody owns any more. Returns how many were freed.
    fn sweep_orphans(&self) -> usize;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub disposed_resources: usize,
    pub context_loss: Option<ContextLoss>,
    pub renderer_released: bool,
}

/// A live rendering context plus the scene drawn into it. Its resources are released exactly
/// once, on [`RenderSurface::release`] or on drop, whichever comes first.
pub struct RenderSurface<B: SurfaceBackend> {
    id: u64,
    label: String,
    backend: Rc<B>,
    context: Option<B::Context>,
    scene: SceneGraph<B::Resource>,
    animating: bool,
    disposed: bool,
}

impl<B: SurfaceBackend> RenderSurface<B> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn start_animation(&mut self) {
        if !self.disposed {
            self.animating = true;
        }
    }

    pub fn context(&self) -> Option<&B::Context> {
        self.context.as_ref()
    }

    pub fn scene(&self) -> &SceneGraph<B::Resource> {
        &self.scene
    }

    /// Creates a resource through the backend and attaches it to the named scene object,
    /// creating the object when needed.
    pub fn attach_resource(&mut self, object: &str, kind: ResourceKind, label: &str) -> bool {
        let Some(context) = self.context.as_mut() else {
            return false;
        };
        let Some(resource) = self.backend.create_resource(context, kind, label) else {
            return false;
        };

        match self.scene.get_mut(object) {
            Some(existing) => existing.attach(kind, resource),
            None => {
                let mut created = SceneObject::new(object);
                created.attach(kind, resource);
                self.scene.insert(created);
            }
        }
        true
    }

    pub fn scene_object(&self, name: &str) -> Option<&SceneObject<B::Resource>> {
        self.scene.get(name)
    }

    /// Stops the animation loop, disposes every scene resource, forces context loss, detaches
    /// the canvas and releases the renderer. Later calls do nothing.
    pub fn release(&mut self) -> TeardownReport {
        if self.disposed {
            return TeardownReport::default();
        }
        self.disposed = true;
        self.animating = false;

        let mut report = TeardownReport::default();
        let resources = self.scene.drain_resources();
        let Some(mut context) = self.context.take() else {
            // Nothing to dispose against; the handles are simply dropped.
            warn!(surface = self.id, "surface released without a live context");
            return report;
        };

        self.backend.stop_animation(&mut context);
        for (kind, resource) in resources {
            self.backend.dispose_resource(&mut context, kind, resource);
            report.disposed_resources += 1;
        }
        report.context_loss = Some(self.backend.lose_context(&mut context));
        self.backend.detach_canvas(&mut context);
        self.backend.release_renderer(context);
        report.renderer_released = true;

        debug!(
            surface = self.id,
            resources = report.disposed_resources,
            loss = ?report.context_loss,
            "render surface released"
        );
        report
    }
}

impl<B: SurfaceBackend> Drop for RenderSurface<B> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Owns the single live render surface. Registering a new one tears the old one down first.
pub struct RenderSurfaceManager<B: SurfaceBackend> {
    backend: Rc<B>,
    active: Option<RenderSurface<B>>,
    status: SurfaceStatus,
    next_id: u64,
}

impl<B: SurfaceBackend> RenderSurfaceManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Rc::new(backend),
            active: None,
            status: SurfaceStatus::Idle,
            next_id: 1,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn status(&self) -> &SurfaceStatus {
        &self.status
    }

    pub fn active(&self) -> Option<&RenderSurface<B>> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut RenderSurface<B>> {
        self.active.as_mut()
    }

    /// Replaces the active surface. The previous one is fully torn down before the new context
    /// is requested. When no context can be had even after an orphan sweep, the manager becomes
    /// unavailable and the error is returned.
    pub fn register(&mut self, request: SurfaceRequest) -> EngineResult<&mut RenderSurface<B>> {
        self.teardown();

        let context = match self.try_create(&request) {
            Some(context) => context,
            None => {
                let swept = self.backend.sweep_orphans();
                debug!(swept, "context unavailable, orphan sweep done");
                match self.try_create(&request) {
                    Some(context) => context,
                    None => {
                        let reason = format!("no rendering context available for {}", request.label);
                        error!("{reason}");
                        self.status = SurfaceStatus::Unavailable(reason.clone());
                        return Err(EngineError::RenderSurfaceExhausted(reason));
                    }
                }
            }
        };

        let id = self.next_id;
        self.next_id += 1;
        debug!(surface = id, label = %request.label, "render surface registered");
        self.status = SurfaceStatus::Active;

        let surface = self.active.insert(RenderSurface {
            id,
            label: request.label,
            backend: Rc::clone(&self.backend),
            context: Some(context),
            scene: SceneGraph::default(),
            animating: false,
            disposed: false,
        });
        surface.start_animation();
        Ok(surface)
    }

    fn try_create(&self, request: &SurfaceRequest) -> Option<B::Context> {
        if !self.backend.probe_context() {
            return None;
        }
        self.backend.create_context(request)
    }

    /// Releases the active surface, if any. Safe to call any number of times.
    pub fn teardown(&mut self) -> TeardownReport {
        let report = match self.active.take() {
            Some(mut surface) => surface.release(),
            None => TeardownReport::default(),
        };
        if self.status == SurfaceStatus::Active {
            self.status = SurfaceStatus::Idle;
        }
        report
    }
}

impl<B: SurfaceBackend> Drop for RenderSurfaceManager<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(label: &str) -> SurfaceRequest {
        SurfaceRequest {
            label: label.into(),
            dimension: ViewDimension::Three,
        }
    }

    #[test]
    fn replacing_a_surface_tears_down_the_previous_one_first() {
        let mut manager = RenderSurfaceManager::new(HeadlessBackend::with_limit(1));
        let first = manager.register(request("first")).expect("first surface");
        let (first_surface, first_context) = (first.id(), first.context().expect("context").id);
        assert!(first.attach_resource("nodes", ResourceKind::Texture, "sprite"));

        let second = manager.register(request("second")).expect("second surface");
        let (second_surface, second_context) = (second.id(), second.context().expect("context").id);
        assert_ne!(first_surface, second_surface);
        assert_eq!(manager.backend().live_contexts(), 1);

        let events = manager.backend().events();
        let released = events
            .iter()
            .position(|event| *event == BackendEvent::RendererReleased(first_context))
            .expect("first released");
        let created = events
            .iter()
            .position(|event| *event == BackendEvent::ContextCreated(second_context))
            .expect("second created");
        assert!(released < created);
    }

    #[test]
    fn release_runs_once() {
        let mut manager = RenderSurfaceManager::new(HeadlessBackend::with_limit(2));
        let surface = manager.register(request("only")).expect("surface");
        surface.attach_resource("links", ResourceKind::Geometry, "batch");
        surface.attach_resource("links", ResourceKind::Material, "line");

        let report = surface.release();
        assert_eq!(report.disposed_resources, 2);
        assert_eq!(report.context_loss, Some(ContextLoss::Forced));
        assert!(surface.is_disposed());
        assert_eq!(surface.release(), TeardownReport::default());

        assert_eq!(manager.teardown(), TeardownReport::default());
        assert_eq!(manager.teardown(), TeardownReport::default());
        assert_eq!(manager.backend().live_contexts(), 0);
    }

    #[test]
    fn exhaustion_sweeps_orphans_and_retries_once() {
        let backend = HeadlessBackend::with_limit(1);
        backend.leak_orphan();
        let mut manager = RenderSurfaceManager::new(backend);
        assert!(manager.register(request("after sweep")).is_ok());
        assert_eq!(*manager.status(), SurfaceStatus::Active);
    }

    #[test]
    fn unmitigated_exhaustion_is_reported() {
        let mut manager = RenderSurfaceManager::new(HeadlessBackend::with_limit(0));
        let result = manager.register(request("doomed"));
        assert!(matches!(result, Err(EngineError::RenderSurfaceExhausted(_))));
        assert!(matches!(manager.status(), SurfaceStatus::Unavailable(_)));
        assert!(manager.active().is_none());
    }
}
