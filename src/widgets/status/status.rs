use eframe::egui;

use crate::editor::session::EditorSession;
use crate::editor::view::ViewKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Status bar: the last message plus live session readouts.
#[derive(Debug, Clone)]
pub struct StatusBar {
    pub current_message: String,
    pub severity: Severity,
}

impl Default for StatusBar {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBar {
    pub fn new() -> Self {
        Self {
            current_message: String::new(),
            severity: Severity::Info,
        }
    }

    pub fn set(&mut self, severity: Severity, message: impl Into<String>) {
        self.severity = severity;
        self.current_message = message.into();
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.set(Severity::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.set(Severity::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.set(Severity::Error, message);
    }

    /// Render status bar at bottom of screen
    pub fn render(&self, ctx: &egui::Context, session: &EditorSession) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                match session.selected_index() {
                    Some(i) => ui.monospace(format!("box {}/{}", i + 1, session.boxes().len())),
                    None => ui.monospace(format!("box -/{}", session.boxes().len())),
                };

                ui.separator();

                if let Some(drag) = session.drag() {
                    ui.monospace(format!("{} {}", drag.view.as_str(), drag.control.as_str()));
                    if drag.is_rotation() {
                        ui.monospace(format!("{:+.1}°", drag.angle_accumulator.to_degrees()));
                    }
                } else {
                    ui.monospace("idle");
                }

                ui.separator();

                for view in ViewKind::ALL {
                    ui.monospace(format!("{} {:.0}px/m", view.as_str(), session.view(view).zoom));
                }

                if session.is_modified() {
                    ui.separator();
                    ui.monospace("modified");
                }

                if !self.current_message.is_empty() {
                    ui.separator();
                    let color = match self.severity {
                        Severity::Info => ui.visuals().text_color(),
                        Severity::Warning => egui::Color32::from_rgb(230, 180, 60),
                        Severity::Error => egui::Color32::from_rgb(255, 100, 100),
                    };
                    ui.colored_label(color, egui::RichText::new(&self.current_message).monospace());
                }
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_message_wins() {
        let mut bar = StatusBar::new();
        bar.info("saved");
        bar.error("write failed");
        assert_eq!(bar.severity, Severity::Error);
        assert_eq!(bar.current_message, "write failed");
    }
}
