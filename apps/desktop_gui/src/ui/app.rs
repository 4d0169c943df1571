use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::controller::orchestration::drive;
use crate::controller::reducer::ViewController;
use crate::ui::widgets;

const LABEL_WIDTH: f32 = 84.0;

pub struct UploaderApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    controller: ViewController,
    // Set on every edit, cleared on commit; a blur without edits commits nothing.
    api_key_dirty: bool,
}

impl UploaderApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        log_capacity: usize,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            controller: ViewController::new(log_capacity),
            api_key_dirty: false,
        }
    }

    fn run(&mut self, commands: Vec<BackendCommand>) {
        drive(&mut self.controller, &self.cmd_tx, commands);
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            let commands = self.controller.handle_event(event);
            self.run(commands);
        }
    }

    fn show_inputs(&mut self, ui: &mut egui::Ui) {
        let field_width = (ui.available_width() - LABEL_WIDTH - 16.0).max(120.0);

        ui.horizontal(|ui| {
            ui.add_sized([LABEL_WIDTH, 20.0], egui::Label::new("API key"));
            let mut api_key = self.controller.state().api_key.clone();
            let response = ui.add(
                egui::TextEdit::singleline(&mut api_key)
                    .hint_text("API key from OResults.eu")
                    .desired_width(field_width),
            );
            if response.changed() {
                self.controller.set_api_key(api_key);
                self.api_key_dirty = true;
            }
            if response.lost_focus() && self.api_key_dirty {
                self.api_key_dirty = false;
                let commands = self.controller.commit_api_key_change();
                self.run(commands);
            }
        });

        ui.horizontal(|ui| {
            ui.add_sized([LABEL_WIDTH, 20.0], egui::Label::new("XML files"));
            let mut xml_path = self.controller.state().xml_path.as_str();
            let response = ui.add(
                egui::TextEdit::singleline(&mut xml_path)
                    .hint_text("select folder for exported XML files")
                    .desired_width(field_width),
            );
            if response.clicked() {
                let commands = self.controller.change_xml_path();
                self.run(commands);
            }
        });
    }

    fn show_toggle(&mut self, ui: &mut egui::Ui) {
        let state = self.controller.state();
        let enabled = state.toggle_enabled();
        let mut checked = state.is_running;
        let label = state.status_label();

        ui.vertical_centered(|ui| {
            let response = ui.add_enabled(enabled, egui::Checkbox::new(&mut checked, label));
            if response.changed() {
                let commands = self.controller.toggle();
                self.run(commands);
            }
        });
    }
}

impl eframe::App for UploaderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        egui::TopBottomPanel::top("inputs")
            .resizable(false)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                self.show_inputs(ui);
                ui.add_space(6.0);
                self.show_toggle(ui);
                ui.add_space(8.0);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            widgets::log_table(ui, &self.controller.state().log);
        });

        // Backend events arrive off-thread; poll for them.
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

impl Drop for UploaderApp {
    fn drop(&mut self) {
        let _ = self.cmd_tx.try_send(BackendCommand::Shutdown);
    }
}
