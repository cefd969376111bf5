mod bootstrap;
mod report;

use std::io::{self, Write};

use anyhow::{Context, Result};
use dashboard_core::schema::SchemaConfig;
use dashboard_core::settings::Settings;
use dashboard_runtime::session::DashboardSession;
use dashboard_ui::app::App;

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    let target = bootstrap::log_target(&settings.view, settings.log_file.as_deref());
    bootstrap::setup_logging(&settings.log_level, &target)?;

    tracing::info!("Case Dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Data: {}, View: {}, Theme: {}",
        settings.data.display(),
        settings.view,
        settings.theme
    );

    let mut schema = match &settings.schema {
        Some(path) => SchemaConfig::from_file(path)
            .with_context(|| format!("loading schema {}", path.display()))?,
        None => SchemaConfig::default(),
    };
    if settings.totals {
        schema.include_totals = true;
    }

    let mut session = DashboardSession::new(settings.data.clone(), schema, settings.filter_spec());
    let snapshot = session
        .run()
        .with_context(|| format!("reading {}", settings.data.display()))?;
    for warning in &snapshot.warnings {
        tracing::warn!("{}", warning);
    }

    match settings.view.as_str() {
        "dashboard" => {
            tracing::info!("Starting interactive dashboard...");
            App::new(&settings.theme, settings.output.clone()).run(&mut session)?;
        }

        "summary" => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            report::write_summary(&mut out, snapshot)?;
            out.flush()?;
        }

        "export" => {
            let rows = session
                .export(&settings.output)
                .with_context(|| format!("exporting to {}", settings.output.display()))?;
            println!("Exported {} rows to {}", rows, settings.output.display());
        }

        unknown => {
            eprintln!("Unknown view mode: {}", unknown);
        }
    }

    Ok(())
}
