//! CSV and PDF renderings of a [`WeeklyUsageReport`].

use anyhow::Context;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

use crate::models::report::{format_number, WeeklyUsageReport};

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

const CSV_HEADER: [&str; 7] = [
    "Gear Name",
    "Requests",
    "Check-Outs",
    "Check-Ins",
    "Bookings",
    "Damages",
    "Total Activity",
];

/// A downloadable rendering of a report.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

pub fn generate_csv_report(report: &WeeklyUsageReport) -> anyhow::Result<ExportFile> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(CSV_HEADER)?;

    for gear in &report.gear_usage {
        wtr.write_record([
            gear.gear_name.clone(),
            gear.request_count.to_string(),
            gear.checkout_count.to_string(),
            gear.checkin_count.to_string(),
            gear.booking_count.to_string(),
            gear.damage_count.to_string(),
            gear.total_activity().to_string(),
        ])?;
    }

    let totals = report.totals();
    wtr.write_record([
        "Total".to_string(),
        totals.requests.to_string(),
        totals.checkouts.to_string(),
        totals.checkins.to_string(),
        totals.bookings.to_string(),
        totals.damages.to_string(),
        totals.total_activity().to_string(),
    ])?;

    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush CSV report: {}", e.error()))?;

    Ok(ExportFile {
        file_name: format!("{}.csv", report.file_stem()),
        content_type: CSV_CONTENT_TYPE,
        bytes,
    })
}

// A4 landscape, in millimetres.
const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 15.0;
const LINE_HEIGHT: f32 = 6.0;
const GEAR_NAME_WIDTH: usize = 40;

/// Writes lines top to bottom, starting a new page when the current one fills.
struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl<'a> PageWriter<'a> {
    fn line(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        if self.y < MARGIN {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
        }
        self.layer.use_text(text, size, Mm(MARGIN), Mm(self.y), font);
        self.y -= LINE_HEIGHT * (size / 10.0).max(1.0);
    }

    fn gap(&mut self) {
        self.y -= LINE_HEIGHT;
    }
}

fn table_row(cells: [&str; 7]) -> String {
    let name: String = cells[0].chars().take(GEAR_NAME_WIDTH).collect();
    format!(
        "{:<width$}{:>10}{:>12}{:>11}{:>10}{:>9}{:>16}",
        name,
        cells[1],
        cells[2],
        cells[3],
        cells[4],
        cells[5],
        cells[6],
        width = GEAR_NAME_WIDTH + 2
    )
}

pub fn generate_pdf_report(report: &WeeklyUsageReport, title: &str) -> anyhow::Result<ExportFile> {
    let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let heading = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| anyhow::anyhow!("failed to load PDF font: {:?}", e))?;
    let body = doc
        .add_builtin_font(BuiltinFont::Courier)
        .map_err(|e| anyhow::anyhow!("failed to load PDF font: {:?}", e))?;

    let mut w = PageWriter {
        layer: doc.get_page(page).get_layer(layer),
        doc: &doc,
        y: PAGE_HEIGHT - MARGIN,
    };

    w.line(title, 16.0, &heading);
    w.gap();

    let totals = report.totals();
    w.line(
        &format!(
            "Total Requests: {}   Total Check-outs: {}   Total Check-ins: {}   Total Bookings: {}   Damage Reports: {}",
            format_number(totals.requests),
            format_number(totals.checkouts),
            format_number(totals.checkins),
            format_number(totals.bookings),
            format_number(totals.damages),
        ),
        10.0,
        &body,
    );
    w.gap();

    if report.gear_usage.is_empty() {
        w.line("No activity data found for the selected period.", 10.0, &body);
    } else {
        w.line(&table_row(CSV_HEADER), 10.0, &heading);
        for gear in &report.gear_usage {
            let counts = [
                gear.request_count,
                gear.checkout_count,
                gear.checkin_count,
                gear.booking_count,
                gear.damage_count,
                gear.total_activity(),
            ]
            .map(format_number);
            w.line(
                &table_row([
                    gear.gear_name.as_str(),
                    &counts[0],
                    &counts[1],
                    &counts[2],
                    &counts[3],
                    &counts[4],
                    &counts[5],
                ]),
                10.0,
                &body,
            );
        }
    }

    drop(w);
    let bytes = doc
        .save_to_bytes()
        .map_err(|e| anyhow::anyhow!("{:?}", e))
        .context("failed to render PDF report")?;

    Ok(ExportFile {
        file_name: format!("{}.pdf", report.file_stem()),
        content_type: PDF_CONTENT_TYPE,
        bytes,
    })
}
