use graph_lens::layout::ViewDimension;
use graph_lens::surface::{
    BackendEvent, ContextLoss, HeadlessBackend, RenderSurfaceManager, ResourceKind, SurfaceRequest,
    SurfaceStatus,
};

fn request(label: &str, dimension: ViewDimension) -> SurfaceRequest {
    SurfaceRequest {
        label: label.into(),
        dimension,
    }
}

fn phase_of(event: &BackendEvent) -> Option<u8> {
    match event {
        BackendEvent::AnimationStopped(_) => Some(0),
        BackendEvent::ResourceDisposed(..) => Some(1),
        BackendEvent::ContextLost(_) => Some(2),
        BackendEvent::CanvasDetached(_) => Some(3),
        BackendEvent::RendererReleased(_) => Some(4),
        _ => None,
    }
}

#[test]
fn teardown_runs_every_phase_in_order() {
    let mut manager = RenderSurfaceManager::new(HeadlessBackend::with_limit(2));
    let surface = manager
        .register(request("graph", ViewDimension::Three))
        .expect("surface");
    assert!(surface.is_animating());
    assert!(surface.attach_resource("nodes", ResourceKind::Texture, "sprite"));
    assert!(surface.attach_resource("nodes", ResourceKind::Material, "sprite material"));
    assert!(surface.attach_resource("links", ResourceKind::Geometry, "line batch"));
    assert_eq!(surface.scene().resource_count(), 3);

    let report = manager.teardown();
    assert_eq!(report.disposed_resources, 3);
    assert_eq!(report.context_loss, Some(ContextLoss::Forced));
    assert!(report.renderer_released);
    assert_eq!(*manager.status(), SurfaceStatus::Idle);

    let phases = manager
        .backend()
        .events()
        .iter()
        .filter_map(phase_of)
        .collect::<Vec<_>>();
    assert_eq!(phases, vec![0, 1, 1, 1, 2, 3, 4]);
    assert_eq!(manager.backend().live_contexts(), 0);
}

#[test]
fn backends_without_forced_loss_still_release() {
    let backend = HeadlessBackend::with_limit(1).without_context_loss();
    let mut manager = RenderSurfaceManager::new(backend);
    manager
        .register(request("flat", ViewDimension::Two))
        .expect("surface");

    let report = manager.teardown();
    assert_eq!(report.context_loss, Some(ContextLoss::Unsupported));
    assert!(report.renderer_released);

    let events = manager.backend().events();
    assert!(!events.iter().any(|event| matches!(event, BackendEvent::ContextLost(_))));
    assert!(events.iter().any(|event| matches!(event, BackendEvent::CanvasDetached(_))));
}

#[test]
fn repeated_switching_never_exceeds_the_context_limit() {
    let mut manager = RenderSurfaceManager::new(HeadlessBackend::with_limit(1));
    for round in 0..10 {
        let dimension = if round % 2 == 0 {
            ViewDimension::Two
        } else {
            ViewDimension::Three
        };
        let surface = manager
            .register(request(dimension.label(), dimension))
            .expect("a context is always free after teardown");
        assert!(surface.attach_resource("nodes", ResourceKind::Texture, "sprite"));
        assert_eq!(manager.backend().live_contexts(), 1);
    }
}

#[test]
fn orphans_are_swept_before_giving_up() {
    let backend = HeadlessBackend::with_limit(2);
    backend.leak_orphan();
    backend.leak_orphan();
    let mut manager = RenderSurfaceManager::new(backend);

    manager
        .register(request("graph", ViewDimension::Three))
        .expect("surface after sweep");
    assert_eq!(manager.backend().orphans(), 0);
    assert!(
        manager
            .backend()
            .events()
            .contains(&BackendEvent::OrphansSwept(2))
    );
}

#[test]
fn exhausted_backends_leave_the_manager_unavailable() {
    let mut manager = RenderSurfaceManager::new(HeadlessBackend::with_limit(0));
    assert!(manager.register(request("graph", ViewDimension::Three)).is_err());
    assert!(matches!(manager.status(), SurfaceStatus::Unavailable(_)));

    // Tearing down an unavailable manager is harmless and keeps the status.
    manager.teardown();
    manager.teardown();
    assert!(matches!(manager.status(), SurfaceStatus::Unavailable(_)));
}
