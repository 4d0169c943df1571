//! Small reusable widgets: severity tags and the activity log table.

use egui::{Color32, Grid, Response, RichText, ScrollArea, Ui};
use shared::domain::{LogEntry, Severity, SeverityTone};

use crate::controller::state::LogBook;

pub fn tone_color(tone: SeverityTone) -> Color32 {
    match tone {
        SeverityTone::Informational => Color32::from_rgb(49, 130, 206),
        SeverityTone::Positive => Color32::from_rgb(47, 158, 68),
        SeverityTone::Negative => Color32::from_rgb(214, 51, 57),
    }
}

pub fn severity_tag(ui: &mut Ui, severity: Severity) -> Response {
    let text = RichText::new(format!(" {} ", severity.label()))
        .color(Color32::WHITE)
        .background_color(tone_color(severity.tone()))
        .small()
        .strong();
    ui.label(text)
}

fn log_row(ui: &mut Ui, entry: &LogEntry) {
    severity_tag(ui, entry.severity);
    ui.label(entry.event.as_str());
    match &entry.filename {
        Some(name) => ui.label(name.as_str()),
        None => ui.weak("-"),
    };
    ui.end_row();
}

pub fn log_table(ui: &mut Ui, log: &LogBook) {
    ui.horizontal(|ui| {
        ui.strong("Log");
        ui.weak(format!("({} entries)", log.len()));
    });
    ui.separator();

    if log.is_empty() {
        ui.weak("No activity yet.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            Grid::new("event_log")
                .num_columns(3)
                .striped(true)
                .spacing([12.0, 4.0])
                .show(ui, |ui| {
                    ui.strong("Severity");
                    ui.strong("Event");
                    ui.strong("File");
                    ui.end_row();
                    for entry in log.iter() {
                        log_row(ui, entry);
                    }
                });
        });
}
