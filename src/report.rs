// 📊 Report Generator - registry aggregation and document assembly
//
// Reads a settled registry, derives per-category counts, and renders the
// shareable report fully in memory: summary table, proportional category
// breakdown, grand total and the per-animal detail listing. Generation is
// decoupled from delivery: the result is a byte payload, nothing is written
// here.

use crate::pdf::{Font, PdfDocument, Rgb, A4_HEIGHT};
use crate::registry::{Category, Registry};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;

// ============================================================================
// SUMMARY
// ============================================================================

/// Aggregates for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category: Category,
    pub count: usize,
    pub vaccinated: usize,
    pub dewormed: usize,
}

/// Per-category aggregates in canonical order, plus the grand total.
/// Derived on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub per_category: Vec<CategorySummary>,
    pub total: usize,
}

/// Recompute the summary from the current registry state
pub fn summarize(registry: &Registry) -> ReportSummary {
    let per_category = Category::ALL
        .iter()
        .map(|&category| {
            let mut summary = CategorySummary {
                category,
                count: 0,
                vaccinated: 0,
                dewormed: 0,
            };
            for animal in registry.by_category(category) {
                summary.count += 1;
                if animal.vaccinated {
                    summary.vaccinated += 1;
                }
                if animal.dewormed {
                    summary.dewormed += 1;
                }
            }
            summary
        })
        .collect();

    ReportSummary {
        per_category,
        total: registry.len(),
    }
}

// ============================================================================
// PDF LAYOUT
// ============================================================================

const MARGIN_X: f64 = 40.0;
/// Content must end above this distance from the page top; the next block
/// otherwise opens a new page
const BOTTOM_LIMIT: f64 = 794.0;
/// Top-of-content cursor position on continuation pages
const PAGE_TOP: f64 = 50.0;

const HEADER_FILL: Rgb = Rgb(132, 204, 22);
const TOTAL_COLOR: Rgb = Rgb(22, 101, 52);
const GRID_COLOR: Rgb = Rgb(180, 180, 180);

const SUMMARY_COLS: [f64; 4] = [150.0, 90.0, 90.0, 120.0];
const SUMMARY_HEADERS: [&str; 4] = ["Categoría", "Cantidad", "Vacunados", "Antiparasitario"];

const DETAIL_COLS: [f64; 5] = [30.0, 110.0, 160.0, 70.0, 70.0];
const DETAIL_HEADERS: [&str; 5] = ["#", "Categoría", "Caravana", "Vac.", "Anti."];

const CHART_BLOCK_HEIGHT: f64 = 210.0;
const CHART_RADIUS: f64 = 80.0;

/// Top-down page flow over the bottom-up PDF coordinate system
struct PageFlow {
    doc: PdfDocument,
    cursor: f64,
}

impl PageFlow {
    fn new() -> Self {
        PageFlow {
            doc: PdfDocument::a4(),
            cursor: PAGE_TOP,
        }
    }

    /// Baseline y in PDF coordinates for a point `dy` below the cursor
    fn y(&self, dy: f64) -> f64 {
        A4_HEIGHT - (self.cursor + dy)
    }

    /// Open a new page when `height` does not fit above the bottom limit
    fn ensure_room(&mut self, height: f64) {
        if self.cursor + height > BOTTOM_LIMIT {
            self.doc.add_page();
            self.cursor = PAGE_TOP;
        }
    }

    fn text(&mut self, x: f64, dy: f64, size: f64, font: Font, color: Rgb, s: &str) {
        self.doc.text(x, self.y(dy), size, font, color, s);
    }
}

/// Render the full report as an in-memory PDF.
///
/// Deterministic for a given registry state and timestamp; an empty registry
/// produces a valid all-zero report with an explicit no-records note.
pub fn render_pdf(registry: &Registry, generated_at: DateTime<Local>) -> Result<Vec<u8>> {
    let summary = summarize(registry);
    let mut flow = PageFlow::new();

    // Title and generation date
    flow.text(
        MARGIN_X,
        6.0,
        20.0,
        Font::Bold,
        Rgb::BLACK,
        "Reporte de Existencias Ganaderas",
    );
    flow.cursor += 18.0;
    flow.text(
        MARGIN_X,
        8.0,
        10.0,
        Font::Regular,
        Rgb::BLACK,
        &format!("Fecha: {}", generated_at.format("%d/%m/%Y")),
    );
    flow.cursor += 20.0;

    render_summary_table(&mut flow, &summary);
    render_chart(&mut flow, &summary);
    render_total(&mut flow, summary.total);
    render_detail(&mut flow, registry);

    Ok(flow.doc.finish())
}

fn render_summary_table(flow: &mut PageFlow, summary: &ReportSummary) {
    let header_h = 18.0;
    let row_h = 16.0;
    let table_w: f64 = SUMMARY_COLS.iter().sum();

    // Header row on lime fill
    flow.doc.fill_rect(
        MARGIN_X,
        flow.y(header_h),
        table_w,
        header_h,
        HEADER_FILL,
    );
    let mut x = MARGIN_X;
    for (header, width) in SUMMARY_HEADERS.iter().zip(SUMMARY_COLS) {
        flow.text(x + 4.0, 13.0, 9.0, Font::Bold, Rgb::WHITE, header);
        x += width;
    }
    flow.cursor += header_h;

    for row in &summary.per_category {
        let cells = [
            row.category.as_str().to_string(),
            row.count.to_string(),
            row.vaccinated.to_string(),
            row.dewormed.to_string(),
        ];
        let mut x = MARGIN_X;
        for (cell, width) in cells.iter().zip(SUMMARY_COLS) {
            flow.text(x + 4.0, 12.0, 9.0, Font::Regular, Rgb::BLACK, cell);
            x += width;
        }
        let sep_y = flow.y(row_h);
        flow.doc
            .line(MARGIN_X, sep_y, MARGIN_X + table_w, sep_y, 0.5, GRID_COLOR);
        flow.cursor += row_h;
    }

    // Vertical grid lines over the full table height
    let table_h = header_h + row_h * summary.per_category.len() as f64;
    let top = flow.y(0.0) + table_h;
    let mut x = MARGIN_X;
    for width in SUMMARY_COLS.iter().chain(std::iter::once(&0.0)) {
        flow.doc.line(x, top, x, top - table_h, 0.5, GRID_COLOR);
        x += width;
    }
    flow.doc
        .line(MARGIN_X, top, MARGIN_X + table_w, top, 0.5, GRID_COLOR);

    flow.cursor += 10.0;
}

fn render_chart(flow: &mut PageFlow, summary: &ReportSummary) {
    flow.ensure_room(CHART_BLOCK_HEIGHT);

    flow.text(
        MARGIN_X,
        12.0,
        12.0,
        Font::Regular,
        Rgb::BLACK,
        "Distribución",
    );

    let cx = MARGIN_X + 110.0;
    let cy = flow.y(28.0 + CHART_RADIUS);

    // Wedges start at twelve o'clock and run clockwise, proportional to the
    // category counts; categories with no animals contribute no wedge
    if summary.total > 0 {
        let mut start = 90.0;
        for row in &summary.per_category {
            if row.count == 0 {
                continue;
            }
            let sweep = -360.0 * row.count as f64 / summary.total as f64;
            flow.doc
                .fill_wedge(cx, cy, CHART_RADIUS, start, sweep, row.category.color().into());
            start += sweep;
        }
    }

    // Legend with the fixed category colors, every category listed
    let legend_x = MARGIN_X + 230.0;
    let mut dy = 40.0;
    for row in &summary.per_category {
        flow.doc.fill_rect(
            legend_x,
            flow.y(dy + 9.0),
            9.0,
            9.0,
            row.category.color().into(),
        );
        flow.text(
            legend_x + 14.0,
            dy + 8.0,
            10.0,
            Font::Regular,
            Rgb::BLACK,
            &format!("{} ({})", row.category.as_str(), row.count),
        );
        dy += 16.0;
    }

    flow.cursor += CHART_BLOCK_HEIGHT;
}

fn render_total(flow: &mut PageFlow, total: usize) {
    flow.ensure_room(30.0);
    flow.text(
        MARGIN_X,
        14.0,
        16.0,
        Font::Bold,
        TOTAL_COLOR,
        &format!("Total General: {total} Animales"),
    );
    flow.cursor += 28.0;
}

fn render_detail(flow: &mut PageFlow, registry: &Registry) {
    let row_h = 13.0;

    // Keep the heading, the header row and at least one data row together
    flow.ensure_room(18.0 + row_h * 2.0);
    flow.text(
        MARGIN_X,
        12.0,
        12.0,
        Font::Regular,
        Rgb::BLACK,
        "Detalle Individual",
    );
    flow.cursor += 18.0;

    if registry.is_empty() {
        flow.text(
            MARGIN_X,
            10.0,
            10.0,
            Font::Regular,
            Rgb::BLACK,
            "No hay animales registrados.",
        );
        flow.cursor += row_h;
        return;
    }

    detail_header(flow, row_h);
    for (index, animal) in registry.records().iter().enumerate() {
        if flow.cursor + row_h > BOTTOM_LIMIT {
            flow.doc.add_page();
            flow.cursor = PAGE_TOP;
            detail_header(flow, row_h);
        }

        let tag = if animal.tag.is_empty() { "-" } else { &animal.tag };
        let cells = [
            (index + 1).to_string(),
            animal.category.as_str().to_string(),
            tag.to_string(),
            si_no(animal.vaccinated).to_string(),
            si_no(animal.dewormed).to_string(),
        ];
        let mut x = MARGIN_X;
        for (cell, width) in cells.iter().zip(DETAIL_COLS) {
            flow.text(x + 2.0, 10.0, 8.0, Font::Regular, Rgb::BLACK, cell);
            x += width;
        }
        flow.cursor += row_h;
    }
}

fn detail_header(flow: &mut PageFlow, row_h: f64) {
    let mut x = MARGIN_X;
    for (header, width) in DETAIL_HEADERS.iter().zip(DETAIL_COLS) {
        flow.text(x + 2.0, 10.0, 8.0, Font::Bold, Rgb::BLACK, header);
        x += width;
    }
    let table_w: f64 = DETAIL_COLS.iter().sum();
    let underline_y = flow.y(row_h) + 1.0;
    flow.doc.line(
        MARGIN_X,
        underline_y,
        MARGIN_X + table_w,
        underline_y,
        0.5,
        GRID_COLOR,
    );
    flow.cursor += row_h;
}

fn si_no(flag: bool) -> &'static str {
    if flag {
        "Si"
    } else {
        "No"
    }
}

// ============================================================================
// CSV LISTING
// ============================================================================

/// Render the detail listing as CSV, the secondary export format
pub fn render_csv(registry: &Registry) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(["#", "Categoría", "Caravana", "Vacunado", "Antiparasitario"])
        .context("Failed to write CSV header")?;

    for (index, animal) in registry.records().iter().enumerate() {
        let tag = if animal.tag.is_empty() { "-" } else { &animal.tag };
        writer
            .write_record([
                (index + 1).to_string().as_str(),
                animal.category.as_str(),
                tag,
                si_no(animal.vaccinated),
                si_no(animal.dewormed),
            ])
            .context("Failed to write CSV row")?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to finish CSV payload: {e}"))
}

// ============================================================================
// TESTS
// ============================================================================
