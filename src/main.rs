// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::Result;
use chrono::Local;
use std::env;
use tracing_subscriber::EnvFilter;

// Use library instead of local modules
use field_tally::{delivery, report, store};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("report") => run_export(ExportKind::Pdf)?,
        Some("csv") => run_export(ExportKind::Csv)?,
        _ => run_ui_mode()?,
    }

    Ok(())
}

enum ExportKind {
    Pdf,
    Csv,
}

fn run_export(kind: ExportKind) -> Result<()> {
    let conn = store::open_database(&store::default_db_path())?;
    let registry = store::load_registry(&conn);

    println!("📋 {} animales registrados", registry.len());

    let (file_name, payload) = match kind {
        ExportKind::Pdf => (
            delivery::REPORT_FILE_NAME,
            report::render_pdf(&registry, Local::now())?,
        ),
        ExportKind::Csv => (delivery::CSV_FILE_NAME, report::render_csv(&registry)?),
    };

    let cwd = env::current_dir()?;
    let outcome = delivery::save_to_dir(&cwd, file_name, &payload);
    println!("{}", outcome.describe());

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode() -> Result<()> {
    let conn = store::open_database(&store::default_db_path())?;
    let registry = store::load_registry(&conn);

    println!("🐄 Contador de Campo - {} animales\n", registry.len());
    println!("Iniciando interfaz... (tecla 'q' para salir)\n");

    let mut app = ui::App::new(registry, conn);
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode() -> Result<()> {
    eprintln!("❌ Modo interactivo no disponible!");
    eprintln!("   Recompilar con: cargo build --features tui");
    eprintln!("   O exportar directo: field-tally report");
    std::process::exit(1);
}
