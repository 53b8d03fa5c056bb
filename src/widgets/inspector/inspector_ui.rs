use eframe::egui;

use super::inspector_events::*;
use crate::editor::session::EditorSession;
use crate::store::Neighbours;
use crate::widgets::actions::ActionQueue;

/// Sample state shown above the box list.
pub struct SampleInfo<'a> {
    pub id: Option<&'a str>,
    pub neighbours: &'a Neighbours,
    pub excluded: bool,
    pub point_count: usize,
}

/// Render the side panel: sample navigation, box list, selected box readout.
pub fn render(ui: &mut egui::Ui, session: &EditorSession, sample: &SampleInfo) -> ActionQueue {
    let mut actions = ActionQueue::new();

    ui.heading(sample.id.unwrap_or("No sample"));
    if let Some(i) = sample.neighbours.index {
        ui.label(format!("{} / {}  •  {} points", i + 1, sample.neighbours.total, sample.point_count));
    }
    ui.horizontal(|ui| {
        if ui.add_enabled(sample.neighbours.previous.is_some(), egui::Button::new("◀ Prev")).clicked() {
            actions.send(NavigateEvent(Navigate::Previous));
        }
        if ui.add_enabled(sample.neighbours.next.is_some(), egui::Button::new("Next ▶")).clicked() {
            actions.send(NavigateEvent(Navigate::Next));
        }
        if ui.button("Next unlabeled").clicked() {
            actions.send(NavigateEvent(Navigate::NextUnlabeled));
        }
    });
    ui.horizontal(|ui| {
        let label = if session.is_modified() { "Save *" } else { "Save" };
        if ui.add_enabled(sample.id.is_some(), egui::Button::new(label)).clicked() {
            actions.send(SaveSampleEvent);
        }
        let mut excluded = sample.excluded;
        if ui.add_enabled(sample.id.is_some(), egui::Checkbox::new(&mut excluded, "Opt out")).changed() {
            actions.send(ToggleExcludedEvent);
        }
        if ui.button("⚙").on_hover_text("Settings").clicked() {
            actions.send(OpenSettingsEvent);
        }
    });

    ui.separator();
    ui.horizontal(|ui| {
        ui.strong(format!("Boxes ({})", session.boxes().len()));
        if ui.small_button("+").on_hover_text("Add box").clicked() {
            actions.send(AddBoxEvent);
        }
        if ui.small_button("Align").on_hover_text("Align views to box axes").clicked() {
            actions.send(AlignAxesEvent);
        }
    });

    egui::ScrollArea::vertical().max_height(ui.available_height() * 0.6).show(ui, |ui| {
        for (i, b) in session.boxes().iter().enumerate() {
            ui.horizontal(|ui| {
                let selected = session.selected_index() == Some(i);
                let text = format!("{:>3}  {}  {}", i, b.obj_id, b.category);
                if ui.selectable_label(selected, egui::RichText::new(text).monospace()).clicked() {
                    actions.send(SelectBoxEvent(i));
                }
                if ui.small_button("✖").on_hover_text("Remove box").clicked() {
                    actions.send(RemoveBoxEvent(i));
                }
            });
        }
    });

    ui.separator();
    if let Some(b) = session.selected() {
        let (c, s, e) = (b.center(), b.size(), b.euler_display());
        egui::Grid::new("box_readout").num_columns(4).show(ui, |ui| {
            ui.label("center");
            ui.monospace(format!("{:8.3}", c.x));
            ui.monospace(format!("{:8.3}", c.y));
            ui.monospace(format!("{:8.3}", c.z));
            ui.end_row();
            ui.label("size");
            ui.monospace(format!("{:8.3}", s.x));
            ui.monospace(format!("{:8.3}", s.y));
            ui.monospace(format!("{:8.3}", s.z));
            ui.end_row();
            ui.label("euler°");
            ui.monospace(format!("{:8.2}", e.x.to_degrees()));
            ui.monospace(format!("{:8.2}", e.y.to_degrees()));
            ui.monospace(format!("{:8.2}", e.z.to_degrees()));
            ui.end_row();
        });
    } else {
        ui.label("No box selected");
    }

    ui.add_space(8.0);
    ui.small("Hold R/C/D + X/Y/Z, press ←/→ to nudge. Tab / Shift+Tab cycles boxes.");

    actions.hovered = ui.ui_contains_pointer();
    actions
}
