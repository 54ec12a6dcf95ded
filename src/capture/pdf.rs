//! PDF export via `Page.printToPDF`.

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::emulation::SetEmulatedMediaParams;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;

// A4 paper in inches, 12 mm margins.
const PAPER_WIDTH_IN: f64 = 8.27;
const PAPER_HEIGHT_IN: f64 = 11.69;
const MARGIN_IN: f64 = 12.0 / 25.4;

/// Print the current page to PDF bytes.
///
/// Screen media is emulated first so the print stylesheet does not hide the
/// content we just waited to load.
pub async fn print_page_to_pdf(page: &Page) -> Result<Vec<u8>> {
    page.execute(SetEmulatedMediaParams::builder().media("screen").build())
        .await
        .context("Failed to emulate screen media")?;

    let params = PrintToPdfParams::builder()
        .print_background(true)
        .paper_width(PAPER_WIDTH_IN)
        .paper_height(PAPER_HEIGHT_IN)
        .margin_top(MARGIN_IN)
        .margin_bottom(MARGIN_IN)
        .margin_left(MARGIN_IN)
        .margin_right(MARGIN_IN)
        .build();

    page.pdf(params).await.context("Failed to print page to PDF")
}
