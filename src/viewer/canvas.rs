use std::time::Instant;

use eframe::egui::{
    self, Align2, Color32, FontId, Key, Modifiers, PointerButton, Rect, Sense, Shape, Stroke,
    StrokeKind, Ui, pos2, vec2,
};
use graph_lens::interaction::{KeyCommand, PointerEvent, ScreenNode, link_polyline};
use graph_lens::layout::LayoutMode;
use graph_lens::selection::Region;
use graph_lens::style::{blend_color, with_opacity};

use super::ViewModel;
use super::backend::EguiResource;

const BACKGROUND: Color32 = Color32::from_rgb(19, 23, 29);
const REGION_STROKE: Color32 = Color32::from_rgb(116, 192, 252);
/// Nodes smaller than this on screen get no label unless selected.
const LABEL_MIN_RADIUS: f32 = 7.0;

const POINTER_BUTTONS: [PointerButton; 3] = [
    PointerButton::Primary,
    PointerButton::Secondary,
    PointerButton::Middle,
];

impl ViewModel {
    pub(super) fn draw_canvas(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, BACKGROUND);

        self.forward_input(ui, rect, response.hovered());

        let delta_seconds = ui
            .ctx()
            .input(|input| input.stable_dt)
            .clamp(1.0 / 240.0, 1.0 / 20.0);
        let frame = self.controller.frame(rect, Instant::now(), delta_seconds);

        let sprite = self.node_sprite();
        let graph = self.controller.graph();

        for (index, (link, style)) in graph.links().iter().zip(&frame.style.links).enumerate() {
            let Some((source, target)) = graph.link_endpoints(index) else {
                continue;
            };
            let (Some(start), Some(end)) = (
                frame.nodes.get(source).copied().flatten(),
                frame.nodes.get(target).copied().flatten(),
            ) else {
                continue;
            };
            if link.source_id == link.target_id {
                continue;
            }

            let points = link_polyline(start.center, end.center, style.curvature);
            let width = (style.width * 2.0).clamp(0.5, 6.0);
            let segments = points.len().saturating_sub(1).max(1) as f32;
            for (step, pair) in points.windows(2).enumerate() {
                let t = (step as f32 + 0.5) / segments;
                let color = blend_color(style.source_color, style.target_color, t);
                painter.line_segment(
                    [pair[0], pair[1]],
                    Stroke::new(width, with_opacity(color, style.opacity)),
                );
            }
        }

        let mut order = frame
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| node.map(|node| (index, node)))
            .filter(|(_, node)| circle_visible(rect, node))
            .collect::<Vec<_>>();
        // Far nodes first so near ones cover them.
        order.sort_by(|a, b| b.1.depth.total_cmp(&a.1.depth));

        let hovered = ui
            .input(|input| input.pointer.hover_pos())
            .and_then(|pointer| graph_lens::interaction::hit_node(&frame.nodes, pointer));

        for (index, screen) in order {
            let Some((node, style)) = graph.nodes().get(index).zip(frame.style.nodes.get(index))
            else {
                continue;
            };
            let tint = with_opacity(style.color, style.opacity);
            match sprite {
                Some(texture) => {
                    painter.image(
                        texture,
                        Rect::from_center_size(screen.center, vec2(screen.radius, screen.radius) * 2.0),
                        Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                        tint,
                    );
                }
                None => {
                    painter.circle_filled(screen.center, screen.radius, tint);
                }
            }

            if style.is_selected || hovered == Some(index) || screen.radius >= LABEL_MIN_RADIUS {
                painter.text(
                    screen.center + vec2(0.0, screen.radius + 2.0),
                    Align2::CENTER_TOP,
                    node.display_label(),
                    FontId::proportional(11.0),
                    with_opacity(Color32::from_gray(225), style.opacity),
                );
            }
        }

        if let Some(region) = frame
            .pending_region
            .as_ref()
            .or_else(|| self.controller.last_region())
        {
            draw_region(&painter, region);
        }

        draw_mode_badge(&painter, rect, self);

        let stopped = self
            .controller
            .surfaces()
            .active()
            .and_then(|surface| surface.context())
            .is_some_and(|context| !context.is_animating());
        if !stopped
            && (frame.layout_moving
                || frame.search_settling
                || self.controller.camera().is_transitioning())
        {
            ui.ctx().request_repaint();
        }
    }

    fn node_sprite(&self) -> Option<egui::TextureId> {
        let surface = self.controller.surfaces().active()?;
        if !surface.context().is_some_and(|context| context.is_attached()) {
            return None;
        }
        surface
            .scene_object("nodes")?
            .textures
            .iter()
            .find_map(EguiResource::texture_id)
    }

    fn forward_input(&mut self, ui: &Ui, rect: Rect, hovered: bool) {
        let (pointer_pos, moved, modifiers, scroll, pressed, released) = ui.input(|input| {
            let pressed = POINTER_BUTTONS.map(|button| input.pointer.button_pressed(button));
            let released = POINTER_BUTTONS.map(|button| input.pointer.button_released(button));
            (
                input.pointer.interact_pos(),
                input.pointer.delta() != egui::Vec2::ZERO,
                input.modifiers,
                input.raw_scroll_delta.y,
                pressed,
                released,
            )
        });

        if let Some(pos) = pointer_pos {
            for (button, was_pressed) in POINTER_BUTTONS.into_iter().zip(pressed) {
                if was_pressed && hovered && rect.contains(pos) {
                    self.node_menu = None;
                    self.controller.pointer(PointerEvent::Press {
                        pos,
                        button,
                        modifiers,
                    });
                }
            }
            if moved {
                self.controller.pointer(PointerEvent::Move { pos });
            }
            for (button, was_released) in POINTER_BUTTONS.into_iter().zip(released) {
                if was_released {
                    self.controller.pointer(PointerEvent::Release {
                        pos,
                        button,
                        modifiers,
                    });
                }
            }
        }

        if hovered && scroll.abs() > f32::EPSILON {
            self.controller.pointer(PointerEvent::Scroll { delta: scroll });
        }

        if !ui.ctx().wants_keyboard_input() {
            for command in key_commands(ui, modifiers) {
                self.controller.key(command);
            }
        }
    }
}

fn key_commands(ui: &Ui, modifiers: Modifiers) -> Vec<KeyCommand> {
    if modifiers.command {
        return Vec::new();
    }
    ui.input(|input| {
        [
            (Key::Escape, KeyCommand::ClearSelection),
            (Key::M, KeyCommand::CycleSelectionMode),
            (Key::Plus, KeyCommand::ZoomIn),
            (Key::Equals, KeyCommand::ZoomIn),
            (Key::Minus, KeyCommand::ZoomOut),
            (Key::F, KeyCommand::ZoomFit),
        ]
        .into_iter()
        .filter(|(key, _)| input.key_pressed(*key))
        .map(|(_, command)| command)
        .collect()
    })
}

fn circle_visible(rect: Rect, node: &ScreenNode) -> bool {
    rect.expand(node.radius).contains(node.center)
}

fn draw_region(painter: &egui::Painter, region: &Region) {
    let stroke = Stroke::new(1.2, REGION_STROKE);
    match region {
        Region::Box(bounds) => {
            painter.rect_filled(*bounds, 0.0, with_opacity(REGION_STROKE, 0.08));
            painter.rect_stroke(*bounds, 0.0, stroke, StrokeKind::Middle);
        }
        Region::Lasso(points) if points.len() > 1 => {
            painter.add(Shape::closed_line(points.clone(), stroke));
        }
        Region::Lasso(_) => {}
    }
}

fn draw_mode_badge(painter: &egui::Painter, rect: Rect, model: &ViewModel) {
    let layout = model.controller.layout();
    let mut text = format!(
        "{} · {} · {}",
        model.controller.selection().mode.label(),
        layout.mode().label(),
        layout.dimension().label()
    );
    if layout.mode() == LayoutMode::Tree {
        let locked = layout.locked_axes();
        let names = graph_lens::layout::Axis::ALL
            .into_iter()
            .filter(|axis| locked.is_locked(*axis))
            .map(|axis| axis.label())
            .collect::<Vec<_>>();
        if !names.is_empty() {
            text.push_str(&format!(" · locked {}", names.join("")));
        }
    }
    painter.text(
        rect.left_top() + vec2(10.0, 8.0),
        Align2::LEFT_TOP,
        text,
        FontId::monospace(11.0),
        Color32::from_gray(150),
    );
}
