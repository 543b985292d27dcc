use std::time::Instant;

use eframe::egui::{self, Color32, Context, Key, RichText, Ui, vec2};
use graph_lens::graph::category_color;
use graph_lens::interaction::ZoomCommand;
use graph_lens::layout::{Axis, LayoutMode, ViewDimension};
use graph_lens::selection::SelectionMode;

use super::ViewModel;

impl ViewModel {
    pub(super) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Controls");
        ui.add_space(6.0);

        self.draw_search(ui);
        ui.separator();

        ui.label(RichText::new("Selection").strong());
        ui.horizontal_wrapped(|ui| {
            let current = self.controller.selection().mode;
            for mode in SelectionMode::ALL {
                if ui
                    .selectable_label(current == mode, mode.label())
                    .on_hover_text("Press M on the canvas to cycle modes.")
                    .clicked()
                {
                    self.controller.set_selection_mode(mode);
                }
            }
        });

        ui.label(RichText::new("Layout").strong());
        ui.horizontal(|ui| {
            let current = self.controller.layout().mode();
            for mode in [LayoutMode::Force, LayoutMode::Tree] {
                if ui.selectable_label(current == mode, mode.label()).clicked() && current != mode {
                    self.controller.set_layout_mode(mode);
                }
            }
        });

        let tree_mode = self.controller.layout().mode() == LayoutMode::Tree;
        ui.add_enabled_ui(tree_mode, |ui| {
            ui.horizontal(|ui| {
                ui.label("Lock axes:");
                let mut locked = self.controller.layout().locked_axes();
                let mut changed = false;
                for axis in Axis::ALL {
                    let mut value = locked.is_locked(axis);
                    if ui.checkbox(&mut value, axis.label()).changed() {
                        locked.toggle(axis);
                        changed = true;
                    }
                }
                if changed {
                    self.controller.set_locked_axes(locked);
                }
            });
        });

        ui.label(RichText::new("View").strong());
        ui.horizontal(|ui| {
            let current = self.controller.layout().dimension();
            for dimension in [ViewDimension::Two, ViewDimension::Three] {
                if ui
                    .selectable_label(current == dimension, dimension.label())
                    .clicked()
                    && current != dimension
                {
                    self.switch_dimension(dimension);
                }
            }
        });
        ui.horizontal(|ui| {
            if ui.button("Zoom in").clicked() {
                self.controller.zoom(ZoomCommand::In);
            }
            if ui.button("Zoom out").clicked() {
                self.controller.zoom(ZoomCommand::Out);
            }
            if ui
                .button("Fit")
                .on_hover_text("Frame the whole graph. Shortcut: F.")
                .clicked()
            {
                self.controller.zoom(ZoomCommand::Fit);
            }
        });

        ui.separator();
        self.draw_style_sliders(ui);

        ui.collapsing("Physics tuning", |ui| self.draw_force_sliders(ui));

        ui.separator();
        self.draw_category_toggles(ui);
    }

    fn draw_search(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Search").strong());
        let response = ui.add(
            egui::TextEdit::singleline(&mut self.search_text)
                .hint_text("name, id, type or property")
                .desired_width(f32::INFINITY),
        );
        if response.changed() {
            self.controller
                .search_input(&self.search_text, Instant::now());
            ui.ctx()
                .request_repaint_after(self.controller.config().search.debounce());
        }
        if response.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter)) {
            self.controller.search_submit();
        }

        let progress = self.controller.search_index_progress();
        if progress < 1.0 {
            ui.add(egui::ProgressBar::new(progress).text("indexing"));
        }

        if let Some(matches) = self.controller.search_matches() {
            ui.small(format!("{} matching nodes", matches.len()));
        }

        let limit = self.controller.config().search.suggestion_limit;
        let suggestions = self.controller.suggestions(limit);
        for suggestion in suggestions {
            if ui
                .link(suggestion.label.as_str())
                .on_hover_text(suggestion.id.as_str())
                .clicked()
            {
                self.controller.select_node(&suggestion.id);
                self.controller.zoom_to_node(&suggestion.id);
            }
        }
    }

    fn draw_style_sliders(&mut self, ui: &mut Ui) {
        let mut style = self.controller.style_config();
        let mut changed = ui
            .add(egui::Slider::new(&mut style.edge_thickness, 0.0..=100.0).text("Edge thickness"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut style.node_size, 0.0..=100.0).text("Node size"))
            .changed();
        if changed {
            self.controller.set_style_config(style);
        }
    }

    fn draw_force_sliders(&mut self, ui: &mut Ui) {
        let mut force = self.controller.config().force;
        let mut changed = ui
            .add(
                egui::Slider::new(&mut force.charge, 500.0..=40_000.0)
                    .text("Repulsion")
                    .logarithmic(true)
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("How strongly nodes push away from each other.")
            .changed();
        changed |= ui
            .add(
                egui::Slider::new(&mut force.link_distance, 10.0..=300.0)
                    .text("Link distance")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("Rest length of every link.")
            .changed();
        if changed {
            self.controller.set_force_config(force);
        }
    }

    fn draw_category_toggles(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.label(RichText::new("Categories").strong());
            if ui.small_button("Show all").clicked() {
                self.controller.show_all_categories();
            }
        });

        for category in self.controller.graph().categories() {
            let mut visible = !self.controller.visibility().is_hidden(&category);
            ui.horizontal(|ui| {
                let (swatch, _) = ui.allocate_exact_size(vec2(10.0, 10.0), egui::Sense::hover());
                ui.painter()
                    .rect_filled(swatch, 2.0, category_color(&category));
                if ui.checkbox(&mut visible, category.as_str()).changed() {
                    self.controller.set_category_hidden(&category, !visible);
                }
            });
        }
    }

    pub(super) fn draw_node_menu(&mut self, ctx: &Context) {
        let Some((node_id, pos)) = self.node_menu.clone() else {
            return;
        };
        let Some(node) = self.controller.graph().node(&node_id).cloned() else {
            self.node_menu = None;
            return;
        };

        let mut close = false;
        egui::Area::new(egui::Id::new("node_menu"))
            .fixed_pos(pos)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.label(RichText::new(node.display_label()).strong());
                    ui.small(RichText::new(node.category.as_str()).color(Color32::GRAY));
                    if ui.button("Select").clicked() {
                        self.controller.select_node(&node.id);
                        close = true;
                    }
                    if ui.button("Zoom to node").clicked() {
                        self.controller.zoom_to_node(&node.id);
                        close = true;
                    }
                    if ui.button(format!("Hide {}", node.category)).clicked() {
                        self.controller.set_category_hidden(&node.category, true);
                        close = true;
                    }
                    if ui.button("Close").clicked() {
                        close = true;
                    }
                });
            });

        if close {
            self.node_menu = None;
        }
    }
}
