use blockverify::config::{AppConfig, ScreeningSettings};
use blockverify::error::AppError;
use blockverify::screening::ScreeningService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Screening settings for one-shot commands: environment first, then an
/// optional scoring file passed on the command line.
pub(crate) fn screening_settings(
    scoring_config: Option<PathBuf>,
) -> Result<ScreeningSettings, AppError> {
    let mut settings = AppConfig::load()?.screening;
    if let Some(path) = scoring_config {
        settings.scoring = ScreeningSettings::scoring_from_file(path)?;
    }
    Ok(settings)
}

pub(crate) fn build_service(settings: ScreeningSettings) -> Result<ScreeningService, AppError> {
    Ok(ScreeningService::new(settings.scoring, settings.retention)?)
}
