use crate::form::FormState;
use crate::ui;

use churnguard::insights::{self, ChartKind, InsightTable, InsightsWorkbook};
use churnguard::{AppConfig, ChurnService, PredictionResult};
use eframe::egui;
use eframe::{App, Frame};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// Insight data as last read from disk. A failure only disables the charts.
pub struct Insights {
    pub workbook: Result<InsightsWorkbook, String>,
    pub feature_importance: Result<InsightTable, String>,
}

impl Insights {
    pub fn load(config: &AppConfig) -> Self {
        let workbook = InsightsWorkbook::open(&config.insights.workbook).map_err(|e| {
            warn!("Insights workbook unavailable: {e}");
            e.to_string()
        });
        let feature_importance = insights::read_feature_importance(&config.insights.feature_importance)
            .map(|table| table.sorted_ascending())
            .map_err(|e| {
                warn!("Feature importance unavailable: {e}");
                e.to_string()
            });
        Self {
            workbook,
            feature_importance,
        }
    }

    /// The table behind a chart, or the reason it cannot be shown.
    pub fn table(&self, chart: ChartKind) -> Result<&InsightTable, &str> {
        match chart {
            ChartKind::FeatureImportance => self.feature_importance.as_ref().map_err(String::as_str),
            _ => {
                let workbook = self.workbook.as_ref().map_err(String::as_str)?;
                let sheet = chart.sheet().name;
                workbook.sheet(sheet).ok_or("sheet missing from workbook")
            }
        }
    }
}

/// The churn form window.
pub struct ChurnApp {
    /// Loaded once at startup; never replaced while the window is open.
    pub service: ChurnService,
    pub config: AppConfig,

    pub form: FormState,
    /// Kept until the next successful submit.
    pub last_result: Option<PredictionResult>,
    /// Error of the most recent submit, if it failed.
    pub last_error: Option<String>,

    pub visible_charts: HashSet<ChartKind>,
    /// Re-read on every submit and whenever a chart is switched on.
    pub insights: Insights,
    /// `file://` URI of the sidebar image, if one is configured and present.
    pub sidebar_image: Option<String>,
}

fn image_uri(path: &Path) -> Option<String> {
    if path.is_file() {
        Some(format!("file://{}", path.display()))
    } else {
        warn!("Sidebar image {:?} not found", path);
        None
    }
}

impl ChurnApp {
    pub fn new(service: ChurnService, config: AppConfig) -> Self {
        let insights = Insights::load(&config);
        let sidebar_image = config.ui.sidebar_image.as_deref().and_then(image_uri);
        Self {
            service,
            config,
            form: FormState::default(),
            last_result: None,
            last_error: None,
            visible_charts: ChartKind::ALL.into_iter().collect(),
            insights,
            sidebar_image,
        }
    }

    /// Runs one prediction with the current form values, then re-reads the insights.
    pub fn submit(&mut self) {
        match self.service.submit(&self.form.to_raw_inputs()) {
            Ok(result) => {
                info!(
                    "Predicted {} ({:.2}% churn)",
                    result.label,
                    result.probability_churn * 100.0
                );
                self.last_result = Some(result);
                self.last_error = None;
            }
            Err(e) => {
                warn!("Submit failed: {e}");
                self.last_error = Some(e.to_string());
            }
        }
        self.reload_insights();
    }

    /// Restores the form defaults. The last result stays until the next submit.
    pub fn reset_form(&mut self) {
        self.form.reset();
    }

    pub fn is_visible(&self, chart: ChartKind) -> bool {
        self.visible_charts.contains(&chart)
    }

    pub fn set_visible(&mut self, chart: ChartKind, visible: bool) {
        if visible {
            self.visible_charts.insert(chart);
            self.reload_insights();
        } else {
            self.visible_charts.remove(&chart);
        }
    }

    pub fn reload_insights(&mut self) {
        self.insights = Insights::load(&self.config);
    }
}

impl App for ChurnApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        ui::draw_side_panel(self, ctx);
        ui::draw_footer(ctx);
        ui::draw_central_panel(self, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use churnguard::insights::SHEETS;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn assets() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../assets")
    }

    /// Sample artifacts with the insight files copied into `dir`.
    fn app_with_insights_in(dir: &TempDir) -> ChurnApp {
        let mut config = AppConfig::default();
        config.artifacts.classifier = assets().join("model.json");
        config.artifacts.scaler = assets().join("scaler.json");
        for sheet in SHEETS {
            fs::copy(assets().join("insights").join(sheet.file_name()), dir.path().join(sheet.file_name())).unwrap();
        }
        let importance = dir.path().join("feature_importance.csv");
        fs::copy(assets().join("insights/feature_importance.csv"), &importance).unwrap();
        config.insights.workbook = dir.path().to_path_buf();
        config.insights.feature_importance = importance;
        let service = ChurnService::load(&config).unwrap();
        ChurnApp::new(service, config)
    }

    fn germany_rate(app: &ChurnApp) -> f64 {
        let table = app.insights.table(ChartKind::Geography).unwrap();
        table.rows.iter().find(|row| row.category == "Germany").unwrap().value
    }

    #[test]
    fn test_submit_rereads_insights() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with_insights_in(&dir);
        assert_eq!(germany_rate(&app), 0.3244);

        fs::write(
            dir.path().join("Geo Churn.csv"),
            "Geography,Churn Rate\nFrance,0.1615\nGermany,0.5\nSpain,0.1667\n",
        )
        .unwrap();
        app.submit();
        assert!(app.last_result.is_some());
        assert_eq!(germany_rate(&app), 0.5);

        fs::remove_file(dir.path().join("feature_importance.csv")).unwrap();
        app.set_visible(ChartKind::FeatureImportance, false);
        app.set_visible(ChartKind::FeatureImportance, true);
        assert!(app.insights.table(ChartKind::FeatureImportance).is_err());
        assert!(app.insights.table(ChartKind::Geography).is_ok());
    }

    #[test]
    fn test_reset_form_keeps_last_result() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with_insights_in(&dir);
        app.submit();
        let result = app.last_result.clone();
        app.form.numeric[1] = 70.0;
        app.form.flags[0] = !app.form.flags[0];
        app.reset_form();
        assert_eq!(app.form, FormState::default());
        assert_eq!(app.last_result, result);
    }

    #[test]
    fn test_sidebar_image_needs_an_existing_file() {
        assert_eq!(
            image_uri(&assets().join("logo.png")),
            Some(format!("file://{}", assets().join("logo.png").display()))
        );
        assert_eq!(image_uri(&assets().join("missing.png")), None);
        assert_eq!(image_uri(&assets()), None);
    }
}
