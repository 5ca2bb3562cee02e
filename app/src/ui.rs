use crate::app::ChurnApp;
use crate::charts;
use crate::form::FormState;

use churnguard::{ChartKind, ChurnLabel, PredictionResult, BOOLEAN_FEATURES, NUMERIC_FEATURES};
use eframe::egui::{self, Color32, RichText, Ui};

const CHURNED_BG: Color32 = ecolor::hex_color!("#8e2424");
const RETAIN_BG: Color32 = ecolor::hex_color!("#2e7d32");

/// Sidebar with one toggle per insight chart.
pub fn draw_side_panel(app: &mut ChurnApp, ctx: &egui::Context) {
    egui::SidePanel::left("insights_menu").show(ctx, |ui| {
        if let Some(uri) = &app.sidebar_image {
            ui.add(egui::Image::new(uri.as_str()).max_width(ui.available_width()));
            ui.separator();
        }
        ui.heading("Data Insights Menu");
        ui.separator();

        for chart in ChartKind::ALL {
            let mut visible = app.is_visible(chart);
            if ui.checkbox(&mut visible, chart.menu_label()).changed() {
                app.set_visible(chart, visible);
            }
        }

        ui.separator();
        if ui.button("Reload insights").clicked() {
            app.reload_insights();
        }
        ui.separator();
        ui.small(format!("Model: {}", app.service.classifier_name()));
    });
}

pub fn draw_footer(ctx: &egui::Context) {
    egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.small("Customer churn prediction. Powered by egui.");
        });
    });
}

/// Form, result panel and the enabled charts.
pub fn draw_central_panel(app: &mut ChurnApp, ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading(RichText::new("💲 Customer Churn Prediction 💲").size(28.0));
            });
            ui.add_space(8.0);

            ui.label(RichText::new("Enter Customer Details:").strong().size(18.0));
            draw_numeric_inputs(&mut app.form, ui);
            ui.add_space(6.0);
            draw_flag_inputs(&mut app.form, ui);
            ui.add_space(10.0);

            ui.vertical_centered(|ui| {
                let button = egui::Button::new(RichText::new("Predict →").size(20.0))
                    .min_size(egui::vec2(160.0, 40.0));
                if ui.add(button).clicked() {
                    app.submit();
                }
                if ui.small_button("Reset").clicked() {
                    app.reset_form();
                }
            });

            if let Some(error) = &app.last_error {
                ui.add_space(8.0);
                draw_error(ui, error);
            }
            if let Some(result) = &app.last_result {
                ui.add_space(8.0);
                draw_result(ui, result);
            }

            ui.separator();
            draw_charts(app, ui);
        });
    });
}

fn draw_numeric_inputs(form: &mut FormState, ui: &mut Ui) {
    for row in 0..2 {
        ui.columns(3, |columns| {
            for (col, column_ui) in columns.iter_mut().enumerate() {
                let index = row * 3 + col;
                let name = NUMERIC_FEATURES[index];
                column_ui.label(name);
                let value = &mut form.numeric[index];
                let drag = if FormState::is_integer(name) {
                    egui::DragValue::new(value).speed(1.0).fixed_decimals(0)
                } else {
                    egui::DragValue::new(value).speed(100.0).max_decimals(2)
                };
                column_ui.add(drag);
            }
        });
    }
}

fn draw_flag_inputs(form: &mut FormState, ui: &mut Ui) {
    for (start, end) in [(0, 5), (5, BOOLEAN_FEATURES.len())] {
        ui.columns(5, |columns| {
            for (offset, index) in (start..end).enumerate() {
                columns[offset].checkbox(&mut form.flags[index], BOOLEAN_FEATURES[index]);
            }
        });
    }
}

fn draw_result(ui: &mut Ui, result: &PredictionResult) {
    let fill = match result.label {
        ChurnLabel::Churned => CHURNED_BG,
        ChurnLabel::Retain => RETAIN_BG,
    };
    egui::Frame::new()
        .fill(fill)
        .corner_radius(egui::CornerRadius::same(10))
        .inner_margin(egui::Margin::same(15))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.vertical_centered(|ui| {
                ui.label(
                    RichText::new(format!("Prediction: {}", result.label))
                        .size(22.0)
                        .strong()
                        .color(Color32::WHITE),
                );
                ui.label(
                    RichText::new(format!("Churn Probability: {:.2}%", result.probability_churn * 100.0))
                        .color(Color32::WHITE),
                );
                ui.label(
                    RichText::new(format!(
                        "Retention Probability: {:.2}%",
                        result.probability_retain * 100.0
                    ))
                    .color(Color32::WHITE),
                );
                for warning in &result.warnings {
                    ui.label(
                        RichText::new(format!("Undefined input: {}", warning))
                            .italics()
                            .color(Color32::YELLOW),
                    );
                }
            });
        });
}

fn draw_error(ui: &mut Ui, error: &str) {
    egui::Frame::new()
        .stroke(egui::Stroke::new(1.0, ui.visuals().error_fg_color))
        .corner_radius(egui::CornerRadius::same(6))
        .inner_margin(egui::Margin::same(10))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.colored_label(ui.visuals().error_fg_color, format!("Cannot predict: {}", error));
        });
}

fn draw_charts(app: &ChurnApp, ui: &mut Ui) {
    for chart in ChartKind::ALL {
        if !app.is_visible(chart) {
            continue;
        }
        ui.add_space(6.0);
        ui.label(RichText::new(chart.title()).strong().size(16.0));
        match app.insights.table(chart) {
            Ok(table) => charts::draw_chart(ui, table, chart.style()),
            Err(reason) => {
                ui.colored_label(ui.visuals().warn_fg_color, reason);
            }
        }
    }
}
