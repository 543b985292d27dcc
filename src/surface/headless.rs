use std::cell::{Cell, RefCell};

use super::{ContextLoss, ResourceKind, SurfaceBackend, SurfaceRequest};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendEvent {
    ContextCreated(u64),
    ResourceCreated(u64, ResourceKind),
    AnimationStopped(u64),
    ResourceDisposed(u64, ResourceKind),
    ContextLost(u64),
    CanvasDetached(u64),
    RendererReleased(u64),
    OrphansSwept(usize),
}

#[derive(Debug)]
pub struct HeadlessContext {
    pub id: u64,
    pub canvas_size: (u32, u32),
    pub lost: bool,
}

/// Backend without any real GPU behind it. It enforces a context limit the way browsers and
/// drivers do and records every call, which makes surface lifecycles observable.
#[derive(Debug)]
pub struct HeadlessBackend {
    limit: usize,
    supports_context_loss: bool,
    live: Cell<usize>,
    orphans: Cell<usize>,
    next_id: Cell<u64>,
    events: RefCell<Vec<BackendEvent>>,
}

impl HeadlessBackend {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            supports_context_loss: true,
            live: Cell::new(0),
            orphans: Cell::new(0),
            next_id: Cell::new(1),
            events: RefCell::new(Vec::new()),
        }
    }

    pub fn without_context_loss(mut self) -> Self {
        self.supports_context_loss = false;
        self
    }

    /// Simulates a canvas whose owner vanished without cleaning up.
    pub fn leak_orphan(&self) {
        self.orphans.set(self.orphans.get() + 1);
    }

    pub fn live_contexts(&self) -> usize {
        self.live.get()
    }

    pub fn orphans(&self) -> usize {
        self.orphans.get()
    }

    pub fn events(&self) -> Vec<BackendEvent> {
        self.events.borrow().clone()
    }

    fn record(&self, event: BackendEvent) {
        self.events.borrow_mut().push(event);
    }

    fn allocate_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::with_limit(16)
    }
}

impl SurfaceBackend for HeadlessBackend {
    type Context = HeadlessContext;
    type Resource = u64;

    fn probe_context(&self) -> bool {
        self.live.get() + self.orphans.get() < self.limit
    }

    fn create_context(&self, request: &SurfaceRequest) -> Option<HeadlessContext> {
        if !self.probe_context() {
            return None;
        }
        let id = self.allocate_id();
        self.live.set(self.live.get() + 1);
        self.record(BackendEvent::ContextCreated(id));
        let canvas_size = match request.dimension {
            crate::layout::ViewDimension::Two => (800, 600),
            crate::layout::ViewDimension::Three => (1024, 768),
        };
        Some(HeadlessContext {
            id,
            canvas_size,
            lost: false,
        })
    }

    fn create_resource(
        &self,
        context: &mut HeadlessContext,
        kind: ResourceKind,
        _label: &str,
    ) -> Option<u64> {
        if context.lost {
            return None;
        }
        let resource = self.allocate_id();
        self.record(BackendEvent::ResourceCreated(resource, kind));
        Some(resource)
    }

    fn stop_animation(&self, context: &mut HeadlessContext) {
        self.record(BackendEvent::AnimationStopped(context.id));
    }

    fn dispose_resource(&self, _context: &mut HeadlessContext, kind: ResourceKind, resource: u64) {
        self.record(BackendEvent::ResourceDisposed(resource, kind));
    }

    fn lose_context(&self, context: &mut HeadlessContext) -> ContextLoss {
        if !self.supports_context_loss {
            return ContextLoss::Unsupported;
        }
        context.lost = true;
        self.record(BackendEvent::ContextLost(context.id));
        ContextLoss::Forced
    }

    fn detach_canvas(&self, context: &mut HeadlessContext) {
        context.canvas_size = (0, 0);
        self.record(BackendEvent::CanvasDetached(context.id));
    }

    fn release_renderer(&self, context: HeadlessContext) {
        self.live.set(self.live.get().saturating_sub(1));
        self.record(BackendEvent::RendererReleased(context.id));
    }

    fn sweep_orphans(&self) -> usize {
        let swept = self.orphans.replace(0);
        self.record(BackendEvent::OrphansSwept(swept));
        swept
    }
}
