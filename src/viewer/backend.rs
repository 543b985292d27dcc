use std::cell::Cell;

use eframe::egui::{self, ColorImage, TextureHandle, TextureId, TextureOptions};
use graph_lens::surface::{ContextLoss, ResourceKind, SurfaceBackend, SurfaceRequest};

const SPRITE_SIZE: usize = 64;
/// Canvases egui will hand out at once. The viewer only ever needs one.
const CONTEXT_LIMIT: usize = 2;

pub(super) struct EguiSurfaceContext {
    id: u64,
    ctx: egui::Context,
    attached: bool,
    animating: bool,
}

impl EguiSurfaceContext {
    pub(super) fn is_attached(&self) -> bool {
        self.attached
    }

    /// The canvas only schedules repaints for contexts that are still animating.
    pub(super) fn is_animating(&self) -> bool {
        self.animating && self.attached
    }
}

pub(super) enum EguiResource {
    Texture(TextureHandle),
    /// egui builds meshes every frame; these only reserve a slot in the scene.
    Mesh,
}

impl EguiResource {
    pub(super) fn texture_id(&self) -> Option<TextureId> {
        match self {
            Self::Texture(handle) => Some(handle.id()),
            Self::Mesh => None,
        }
    }
}

/// Render surfaces backed by egui textures.
pub(super) struct EguiBackend {
    ctx: egui::Context,
    live: Cell<usize>,
    next_id: Cell<u64>,
}

impl EguiBackend {
    pub(super) fn new(ctx: egui::Context) -> Self {
        Self {
            ctx,
            live: Cell::new(0),
            next_id: Cell::new(1),
        }
    }

    fn allocate_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

/// White disc with a soft rim, tinted per node when drawn.
fn node_sprite() -> ColorImage {
    let mut rgba = Vec::with_capacity(SPRITE_SIZE * SPRITE_SIZE * 4);
    let center = (SPRITE_SIZE as f32 - 1.0) * 0.5;
    for y in 0..SPRITE_SIZE {
        for x in 0..SPRITE_SIZE {
            let dx = x as f32 - center;
            let dy = y as f32 - center;
            let distance = (dx * dx + dy * dy).sqrt() / center;
            let alpha = ((1.0 - distance) * 6.0).clamp(0.0, 1.0);
            let shade = if distance > 0.82 { 0.78 } else { 1.0 };
            let value = (255.0 * shade) as u8;
            rgba.extend_from_slice(&[value, value, value, (alpha * 255.0) as u8]);
        }
    }
    ColorImage::from_rgba_unmultiplied([SPRITE_SIZE, SPRITE_SIZE], &rgba)
}

impl SurfaceBackend for EguiBackend {
    type Context = EguiSurfaceContext;
    type Resource = EguiResource;

    fn probe_context(&self) -> bool {
        self.live.get() < CONTEXT_LIMIT
    }

    fn create_context(&self, _request: &SurfaceRequest) -> Option<EguiSurfaceContext> {
        if !self.probe_context() {
            return None;
        }
        self.live.set(self.live.get() + 1);
        Some(EguiSurfaceContext {
            id: self.allocate_id(),
            ctx: self.ctx.clone(),
            attached: true,
            animating: true,
        })
    }

    fn create_resource(
        &self,
        context: &mut EguiSurfaceContext,
        kind: ResourceKind,
        label: &str,
    ) -> Option<EguiResource> {
        if !context.attached {
            return None;
        }
        Some(match kind {
            ResourceKind::Texture => {
                let name = format!("{label}-{}", context.id);
                EguiResource::Texture(context.ctx.load_texture(
                    name,
                    node_sprite(),
                    TextureOptions::LINEAR,
                ))
            }
            ResourceKind::Geometry | ResourceKind::Material => EguiResource::Mesh,
        })
    }

    fn stop_animation(&self, context: &mut EguiSurfaceContext) {
        context.animating = false;
    }

    fn dispose_resource(&self, _context: &mut EguiSurfaceContext, _kind: ResourceKind, resource: EguiResource) {
        drop(resource);
    }

    fn lose_context(&self, _context: &mut EguiSurfaceContext) -> ContextLoss {
        ContextLoss::Unsupported
    }

    fn detach_canvas(&self, context: &mut EguiSurfaceContext) {
        context.attached = false;
    }

    fn release_renderer(&self, _context: EguiSurfaceContext) {
        self.live.set(self.live.get().saturating_sub(1));
    }

    fn sweep_orphans(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use graph_lens::layout::ViewDimension;

    use super::*;

    fn request() -> SurfaceRequest {
        SurfaceRequest {
            label: "graph".into(),
            dimension: ViewDimension::Three,
        }
    }

    #[test]
    fn stopped_contexts_no_longer_animate() {
        let backend = EguiBackend::new(egui::Context::default());
        let mut context = backend.create_context(&request()).expect("context");
        assert!(context.is_animating());

        backend.stop_animation(&mut context);
        assert!(!context.is_animating());
        assert!(context.is_attached());

        backend.detach_canvas(&mut context);
        assert!(backend
            .create_resource(&mut context, ResourceKind::Geometry, "links")
            .is_none());
        backend.release_renderer(context);
        assert!(backend.probe_context());
    }

    #[test]
    fn context_limit_is_enforced() {
        let backend = EguiBackend::new(egui::Context::default());
        let contexts = (0..CONTEXT_LIMIT)
            .map(|_| backend.create_context(&request()).expect("context"))
            .collect::<Vec<_>>();
        assert!(backend.create_context(&request()).is_none());
        for context in contexts {
            backend.release_renderer(context);
        }
        assert!(backend.create_context(&request()).is_some());
    }
}
