//! Form panels using bevy_egui
//!
//! Widgets edit local copies of the session's values. Edits are collected as
//! [`UiAction`]s and applied after the panel is drawn, so the session is only
//! marked changed when the user actually changed something.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};
use leverarm_core::{
    AdjustmentField, AdjustmentState, Axis, ForwardDirection, InstancePhase, RotationAxis,
    SensorId, Session, UpDirection,
};

use crate::compass::compass_system;
use crate::models::SceneContext;
use crate::types::{FocusedSensor, LastError, SessionResource, SnapshotExport, UiLayout};

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, update_ui_layout)
            .add_systems(EguiPrimaryContextPass, (ui_system, compass_system).chain());
    }
}

const METERS: &str = " m";

/// A user edit, applied to the session after the frame's UI is built
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    SelectVehicle(String),
    AttachSensor(String),
    UpdateVehicle(AdjustmentField, f64),
    UpdateSensor(SensorId, AdjustmentField, f64),
    SetForward(ForwardDirection),
    SetUp(UpDirection),
    ExportSnapshot,
    CloseSnapshot,
}

/// Sensor model chosen in the attach combo box
#[derive(Default)]
pub struct SensorPicker(Option<String>);

/// Update UI layout based on window size
fn update_ui_layout(windows: Query<&Window>, mut ui_layout: ResMut<UiLayout>) {
    if let Ok(window) = windows.single() {
        let width = window.width();
        let height = window.height();

        // Only update if dimensions changed significantly
        if (ui_layout.screen_width - width).abs() > 1.0
            || (ui_layout.screen_height - height).abs() > 1.0
        {
            ui_layout.update_from_window(width, height);
        }
    }
}

fn ui_system(
    mut contexts: EguiContexts,
    mut session: ResMut<SessionResource>,
    mut ctx: SceneContext,
    mut ui_layout: ResMut<UiLayout>,
    mut last_error: ResMut<LastError>,
    mut export: ResMut<SnapshotExport>,
    mut focused: ResMut<FocusedSensor>,
    mut picker: Local<SensorPicker>,
) {
    let Ok(egui_ctx) = contexts.ctx_mut() else { return };

    let is_mobile = ui_layout.is_mobile;
    let ui_scale = ui_layout.ui_scale();
    let mut actions = Vec::new();

    if is_mobile {
        egui::TopBottomPanel::top("mobile_toolbar").show(egui_ctx, |ui| {
            let menu_text = if ui_layout.show_panel {
                "☰ Lever Arm ✕"
            } else {
                "☰ Lever Arm"
            };
            if ui.button(egui::RichText::new(menu_text).size(16.0 * ui_scale)).clicked() {
                ui_layout.show_panel = !ui_layout.show_panel;
            }
        });
    }

    // A sensor clicked in the scene opens the panel on mobile
    if is_mobile && focused.0.is_some() {
        ui_layout.show_panel = true;
    }

    if !is_mobile || ui_layout.show_panel {
        let view = &session.0;
        let focus = focused.0.take();

        egui::SidePanel::left("lever_arm_panel")
            .default_width(ui_layout.panel_width())
            .resizable(!is_mobile)
            .show(egui_ctx, |ui| {
                ui.heading("Lever Arm");
                ui.separator();

                egui::ScrollArea::vertical().show(ui, |ui| {
                    section(ui, "Vehicle", ui_scale, true, |ui| {
                        vehicle_section(ui, view, &mut actions);
                    });
                    ui.separator();

                    section(ui, "Sensors", ui_scale, true, |ui| {
                        sensors_section(ui, view, ui_scale, focus, &mut picker, &mut actions);
                    });
                    ui.separator();

                    section(ui, "Export", ui_scale, !is_mobile, |ui| {
                        export_section(ui, &export, &mut actions);
                    });

                    if let Some(message) = &last_error.0 {
                        ui.separator();
                        ui.colored_label(egui::Color32::from_rgb(230, 80, 80), message);
                    }
                });
            });
    }

    for action in actions {
        apply_action(action, &mut session, &mut ctx, &mut last_error, &mut export);
    }
}

/// Collapsible top-level panel section
fn section(
    ui: &mut egui::Ui,
    title: &str,
    ui_scale: f32,
    default_open: bool,
    add_contents: impl FnOnce(&mut egui::Ui),
) {
    egui::CollapsingHeader::new(egui::RichText::new(title).size(14.0 * ui_scale))
        .default_open(default_open)
        .show(ui, add_contents);
}

fn vehicle_section(ui: &mut egui::Ui, view: &Session<Entity>, actions: &mut Vec<UiAction>) {
    let state = view.vehicle_state();
    let current = view.pending_vehicle().unwrap_or(state.bound_model());
    let current_name = view
        .registry()
        .get(current)
        .map(|d| d.display_name.clone())
        .unwrap_or_else(|| current.to_string());

    egui::ComboBox::from_label("Model")
        .selected_text(current_name)
        .show_ui(ui, |ui| {
            for descriptor in view.registry().vehicles() {
                let selected = descriptor.key == current;
                if ui
                    .selectable_label(selected, descriptor.display_name.as_str())
                    .clicked()
                {
                    actions.push(UiAction::SelectVehicle(descriptor.key.clone()));
                }
            }
        });

    match view.vehicle_phase() {
        InstancePhase::Loading => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading model...");
            });
        }
        InstancePhase::Unset => {
            ui.label("No model loaded");
        }
        InstancePhase::Loaded => {}
    }

    ui.add_space(4.0);
    ui.label("Forward:");
    ui.horizontal(|ui| {
        for forward in ForwardDirection::ALL {
            if ui
                .selectable_label(state.forward() == forward, forward.label())
                .clicked()
            {
                actions.push(UiAction::SetForward(forward));
            }
        }
    });
    ui.label("Up:");
    ui.horizontal(|ui| {
        for up in UpDirection::ALL {
            if ui.selectable_label(state.up() == up, up.label()).clicked() {
                actions.push(UiAction::SetUp(up));
            }
        }
    });

    ui.add_space(4.0);
    adjustment_grid(ui, "vehicle_grid", state, METERS, &mut |field, value| {
        actions.push(UiAction::UpdateVehicle(field, value));
    });
}

fn sensors_section(
    ui: &mut egui::Ui,
    view: &Session<Entity>,
    ui_scale: f32,
    focus: Option<SensorId>,
    picker: &mut SensorPicker,
    actions: &mut Vec<UiAction>,
) {
    if picker.0.is_none() {
        picker.0 = view.registry().sensors().next().map(|d| d.key.clone());
    }
    let picked_name = picker
        .0
        .as_deref()
        .and_then(|key| view.registry().get(key))
        .map(|d| d.display_name.clone())
        .unwrap_or_else(|| "None".to_string());

    ui.horizontal(|ui| {
        egui::ComboBox::from_id_salt("sensor_picker")
            .selected_text(picked_name)
            .show_ui(ui, |ui| {
                for descriptor in view.registry().sensors() {
                    ui.selectable_value(
                        &mut picker.0,
                        Some(descriptor.key.clone()),
                        descriptor.display_name.as_str(),
                    );
                }
            });
        if ui
            .add_enabled(picker.0.is_some(), egui::Button::new("Attach"))
            .clicked()
        {
            if let Some(key) = picker.0.clone() {
                actions.push(UiAction::AttachSensor(key));
            }
        }
    });

    let loading = view.loading_sensor_count();
    if loading > 0 {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label(format!("Loading {} sensor(s)...", loading));
        });
    }

    for sensor in view.sensors() {
        let id = sensor.id;
        let name = view
            .registry()
            .get(sensor.state.bound_model())
            .map(|d| d.display_name.as_str())
            .unwrap_or(sensor.state.bound_model());
        let short_id: String = id.to_string().chars().take(8).collect();
        let header = format!("{} ({})", name, short_id);
        let is_focused = focus == Some(id);

        let response = egui::CollapsingHeader::new(
            egui::RichText::new(header).size(12.0 * ui_scale),
        )
        .id_salt(id)
        .default_open(true)
        .open(is_focused.then_some(true))
        .show(ui, |ui| {
            adjustment_grid(ui, ("sensor_grid", id), &sensor.state, METERS, &mut |field, value| {
                actions.push(UiAction::UpdateSensor(id, field, value));
            });
        });

        if is_focused {
            response.header_response.scroll_to_me(Some(egui::Align::TOP));
        }
    }
}

fn export_section(ui: &mut egui::Ui, export: &SnapshotExport, actions: &mut Vec<UiAction>) {
    ui.horizontal(|ui| {
        if ui.button("Export JSON").clicked() {
            actions.push(UiAction::ExportSnapshot);
        }
        if export.0.is_some() && ui.button("Close").clicked() {
            actions.push(UiAction::CloseSnapshot);
        }
    });
    if let Some(json) = &export.0 {
        if ui.button("Copy").clicked() {
            ui.ctx().copy_text(json.clone());
        }
        let mut text = json.as_str();
        ui.add(
            egui::TextEdit::multiline(&mut text)
                .code_editor()
                .desired_rows(10)
                .desired_width(f32::INFINITY),
        );
    }
}

/// Size, translation, and rotation fields for one instance
fn adjustment_grid(
    ui: &mut egui::Ui,
    id_salt: impl std::hash::Hash,
    state: &AdjustmentState,
    suffix: &str,
    on_change: &mut dyn FnMut(AdjustmentField, f64),
) {
    egui::Grid::new(id_salt)
        .num_columns(2)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            ui.label("Size:");
            let mut size = state.target_size();
            if ui
                .add(egui::DragValue::new(&mut size).speed(0.01).suffix(suffix))
                .changed()
            {
                on_change(AdjustmentField::TargetSize, size);
            }
            ui.end_row();

            ui.label("Offset:");
            ui.label("");
            ui.end_row();
            for axis in Axis::ALL {
                let field = AdjustmentField::Translation(axis);
                ui.label(format!("  {}:", axis.label()));
                let mut value = state.get(field);
                if ui
                    .add(egui::DragValue::new(&mut value).speed(0.01).suffix(suffix))
                    .changed()
                {
                    on_change(field, value);
                }
                ui.end_row();
            }

            ui.label("Rotation:");
            ui.label("");
            ui.end_row();
            for axis in RotationAxis::ALL {
                let field = AdjustmentField::Rotation(axis);
                ui.label(format!("  {}:", axis.label()));
                let mut value = state.get(field);
                if ui
                    .add(egui::DragValue::new(&mut value).speed(1.0).suffix("°"))
                    .changed()
                {
                    on_change(field, value);
                }
                ui.end_row();
            }
        });
}

fn apply_action(
    action: UiAction,
    session: &mut SessionResource,
    ctx: &mut SceneContext,
    last_error: &mut LastError,
    export: &mut SnapshotExport,
) {
    let result = match action {
        UiAction::SelectVehicle(key) => session.0.select_vehicle(&key, ctx),
        UiAction::AttachSensor(key) => session.0.attach_sensor(&key, ctx).map(|_| ()),
        UiAction::UpdateVehicle(field, value) => session.0.update_vehicle(field, value),
        UiAction::UpdateSensor(id, field, value) => session.0.update_sensor(id, field, value),
        UiAction::SetForward(forward) => {
            session.0.set_forward_direction(forward);
            Ok(())
        }
        UiAction::SetUp(up) => {
            session.0.set_up_direction(up);
            Ok(())
        }
        UiAction::ExportSnapshot => {
            match session.0.snapshot().to_json() {
                Ok(json) => export.0 = Some(json),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize snapshot");
                    last_error.0 = Some(format!("Export failed: {}", e));
                }
            }
            return;
        }
        UiAction::CloseSnapshot => {
            export.0 = None;
            return;
        }
    };

    match result {
        Ok(()) => last_error.clear(),
        Err(e) => last_error.set(&e),
    }
}
