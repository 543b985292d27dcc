use eframe::egui::{self, RichText, Ui};
use graph_lens::graph::{Link, Node};
use graph_lens::selection::Selected;
use serde_json::{Map, Value};

use super::ViewModel;

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "null".to_owned(),
        other => other.to_string(),
    }
}

fn property_grid(ui: &mut Ui, id: &str, properties: &Map<String, Value>) {
    if properties.is_empty() {
        return;
    }
    egui::Grid::new(id)
        .num_columns(2)
        .striped(true)
        .show(ui, |ui| {
            for (key, value) in properties {
                ui.label(key.as_str());
                ui.label(value_text(value));
                ui.end_row();
            }
        });
}

impl ViewModel {
    pub(super) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let state = self.controller.selection();
        let primary = state.primary.clone();
        let node_count = state.selected_node_ids.len();
        let edge_count = state.selected_edge_ids.len();
        let has_subgraph = state.derived_subgraph.is_some();

        match &primary {
            Some(Selected::Node(id)) => match self.controller.graph().node(id).cloned() {
                Some(node) => self.draw_node(ui, &node),
                None => {
                    ui.label("Selected node no longer exists in the graph.");
                }
            },
            Some(Selected::Link(id)) => match self.controller.graph().link(id).cloned() {
                Some(link) => self.draw_link(ui, &link),
                None => {
                    ui.label("Selected link no longer exists in the graph.");
                }
            },
            None if node_count == 0 => {
                ui.label("Click a node or link, or draw a box or lasso in a multi-select mode.");
            }
            None => {}
        }

        if has_subgraph {
            ui.separator();
            ui.label(format!("Selected subgraph: {node_count} nodes, {edge_count} links"));
        }

        ui.separator();
        self.draw_highlights(ui);
    }

    fn draw_node(&mut self, ui: &mut Ui, node: &Node) {
        ui.label(RichText::new(node.display_label()).strong());
        ui.small(node.id.as_str());
        ui.add_space(6.0);

        if !node.node_type.is_empty() {
            ui.label(format!("Type: {}", node.node_type));
        }
        ui.label(format!("Category: {}", node.category));
        ui.label(format!("Links: {}", self.controller.graph().degree(&node.id)));
        if ui.button("Zoom to node").clicked() {
            self.controller.zoom_to_node(&node.id);
        }

        ui.add_space(4.0);
        property_grid(ui, "node_properties", &node.properties);
    }

    fn draw_link(&self, ui: &mut Ui, link: &Link) {
        let heading = if link.label.is_empty() {
            "Link"
        } else {
            link.label.as_str()
        };
        ui.label(RichText::new(heading).strong());
        ui.small(format!("{} → {}", link.source_name, link.target_name));
        ui.add_space(6.0);

        if !link.link_type.is_empty() {
            ui.label(format!("Type: {}", link.link_type));
        }
        if let Some(title) = &link.title {
            ui.label(format!("Source: {title}"));
        }
        if let Some(url) = &link.url {
            ui.hyperlink_to("Open article", url.as_str());
        }

        ui.add_space(4.0);
        property_grid(ui, "link_properties", &link.properties);
    }

    fn draw_highlights(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Highlights").strong());
        let highlights = self
            .controller
            .graph()
            .highlights()
            .into_iter()
            .map(|node| (node.id.clone(), node.display_label()))
            .collect::<Vec<_>>();
        if highlights.is_empty() {
            ui.small("No highlighted entities in this graph.");
            return;
        }
        for (id, label) in highlights {
            if ui.link(label).on_hover_text(id.as_str()).clicked() {
                self.controller.select_node(&id);
                self.controller.zoom_to_node(&id);
            }
        }
    }
}
