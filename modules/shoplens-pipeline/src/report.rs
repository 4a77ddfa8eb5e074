use anyhow::Result;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use genpdf::{elements, style, Element};
use tracing::info;

use shoplens_common::{format_number, DetailRecord};

use crate::enrichment::EnrichedRow;
use crate::files::{FileStore, StoredFile};

/// Structured report document, assembled before any rendering. Pure and
/// unit-testable; PDF generation is the thin edge in [`ReportRenderer`].
#[derive(Debug)]
pub struct ReportDocument {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub analyzed: usize,
    pub items: Vec<ReportItem>,
}

#[derive(Debug)]
pub struct ReportItem {
    /// `"<rank>: <listing title>"`.
    pub heading: String,
    pub url: String,
    pub body: ReportBody,
}

#[derive(Debug)]
pub enum ReportBody {
    /// Key/value rows for the non-empty detail fields.
    Details(Vec<(String, String)>),
    Error(String),
}

/// Build one report from the ordered enrichment outcomes of a run.
pub fn compile(keyword: &str, rows: &[EnrichedRow]) -> ReportDocument {
    let items = rows
        .iter()
        .map(|row| ReportItem {
            heading: format!("{}: {}", row.rank, row.title),
            url: row.url.clone(),
            body: match &row.outcome {
                Ok(record) => ReportBody::Details(detail_fields(record)),
                Err(reason) => ReportBody::Error(reason.clone()),
            },
        })
        .collect::<Vec<_>>();

    ReportDocument {
        title: format!("Product detail report: {keyword}"),
        generated_at: Utc::now(),
        analyzed: items.len(),
        items,
    }
}

/// Key/value table rows for a detail record, listing only populated
/// fields. The price row carries the old price and discount inline.
fn detail_fields(record: &DetailRecord) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    let mut push = |key: &str, value: Option<String>| {
        if let Some(v) = value {
            if !v.is_empty() {
                fields.push((key.to_string(), v));
            }
        }
    };

    push("Title", record.title.clone());
    push("Price", record.price.map(|p| price_line(record, p)));
    push("Brand", record.brand.clone());
    push(
        "Rating",
        record.rating.map(|r| {
            format!("{r}/5 ({} reviews)", record.review_count.unwrap_or(0))
        }),
    );
    push(
        "Availability",
        record
            .availability
            .map(|a| if a { "in stock" } else { "out of stock" }.to_string()),
    );
    push("Category", record.category.clone());
    push("Seller", record.seller.clone());
    push("SKU", record.sku.clone());
    if !record.review_excerpts.is_empty() {
        push("Reviews", Some(record.review_excerpts.join(" / ")));
    }

    fields
}

fn price_line(record: &DetailRecord, price: f64) -> String {
    let mut line = format_number(price);
    if let Some(currency) = &record.currency {
        line.push(' ');
        line.push_str(currency);
    }
    if let (Some(old), Some(pct)) = (record.old_price, record.discount_pct) {
        line.push_str(&format!(" (was {}, -{pct}%)", format_number(old)));
    }
    line
}

/// Timestamped name of the exported file.
pub fn report_file_name(generated_at: &DateTime<Utc>) -> String {
    format!("report_{}.pdf", generated_at.format("%Y%m%d_%H%M%S"))
}

/// Renders a [`ReportDocument`] to PDF and stores it. Only the exported
/// file is kept; the in-memory document is dropped after rendering.
pub struct ReportRenderer {
    font_dir: String,
}

/// Font family expected under the configured font directory.
const FONT_FAMILY: &str = "LiberationSans";

impl ReportRenderer {
    pub fn new(font_dir: impl Into<String>) -> Self {
        Self {
            font_dir: font_dir.into(),
        }
    }

    pub async fn export(
        &self,
        document: ReportDocument,
        files: &dyn FileStore,
    ) -> Result<StoredFile> {
        let name = report_file_name(&document.generated_at);
        let bytes = self.render(&document)?;
        let stored = files.store(&name, Bytes::from(bytes)).await?;
        info!(file = %stored.url, items = document.analyzed, "Report exported");
        Ok(stored)
    }

    fn render(&self, document: &ReportDocument) -> Result<Vec<u8>> {
        let family = genpdf::fonts::from_files(&self.font_dir, FONT_FAMILY, None)
            .map_err(|e| anyhow::anyhow!("Failed to load report fonts: {e}"))?;
        let mut doc = genpdf::Document::new(family);
        doc.set_title(&document.title);

        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        doc.push(
            elements::Paragraph::new(&document.title)
                .styled(style::Style::new().bold().with_font_size(18)),
        );
        doc.push(elements::Paragraph::new(format!(
            "Generated at: {}",
            document.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )));
        doc.push(elements::Paragraph::new(format!(
            "Analyzed items: {}",
            document.analyzed
        )));
        doc.push(elements::Break::new(1));

        for (idx, item) in document.items.iter().enumerate() {
            doc.push(
                elements::Paragraph::new(&item.heading)
                    .styled(style::Style::new().bold().with_font_size(13)),
            );
            doc.push(
                elements::Paragraph::new(format!("URL: {}", item.url))
                    .styled(style::Style::new().with_font_size(9)),
            );

            match &item.body {
                ReportBody::Details(fields) => {
                    let mut table = elements::TableLayout::new(vec![1, 3]);
                    table.set_cell_decorator(elements::FrameCellDecorator::new(
                        true, true, false,
                    ));
                    for (key, value) in fields {
                        table
                            .row()
                            .element(elements::Paragraph::new(key))
                            .element(elements::Paragraph::new(value))
                            .push()
                            .map_err(|e| anyhow::anyhow!("Failed to lay out table row: {e}"))?;
                    }
                    doc.push(table);
                }
                ReportBody::Error(reason) => {
                    doc.push(
                        elements::Paragraph::new(format!("Detail extraction failed: {reason}"))
                            .styled(style::Style::new().italic()),
                    );
                }
            }

            doc.push(elements::Break::new(1));
            if idx + 1 < document.items.len() {
                doc.push(elements::Paragraph::new("-".repeat(80)));
                doc.push(elements::Break::new(1));
            }
        }

        let mut out = Vec::new();
        doc.render(&mut out)
            .map_err(|e| anyhow::anyhow!("PDF rendering failed: {e}"))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> DetailRecord {
        DetailRecord {
            title: Some("USB-C Hub".to_string()),
            brand: Some("Acme".to_string()),
            price: Some(800.0),
            currency: Some("USD".to_string()),
            old_price: Some(1000.0),
            discount_pct: Some(20),
            rating: Some(4.2),
            review_count: Some(57),
            availability: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn compile_builds_one_item_per_outcome() {
        let rows = vec![
            EnrichedRow {
                rank: 1,
                title: "First".to_string(),
                url: "https://a.example/1".to_string(),
                outcome: Ok(record()),
            },
            EnrichedRow {
                rank: 2,
                title: "Second".to_string(),
                url: "https://a.example/2".to_string(),
                outcome: Err("API error (status 500)".to_string()),
            },
        ];

        let doc = compile("headphones", &rows);
        assert_eq!(doc.title, "Product detail report: headphones");
        assert_eq!(doc.analyzed, 2);
        assert_eq!(doc.items[0].heading, "1: First");
        assert!(matches!(doc.items[0].body, ReportBody::Details(_)));
        assert!(matches!(doc.items[1].body, ReportBody::Error(_)));
    }

    #[test]
    fn detail_fields_skip_empty_values() {
        let record = DetailRecord {
            title: Some("Only title".to_string()),
            ..Default::default()
        };
        let fields = detail_fields(&record);
        assert_eq!(fields, vec![("Title".to_string(), "Only title".to_string())]);
    }

    #[test]
    fn price_row_carries_discount_inline() {
        let fields = detail_fields(&record());
        let price = fields.iter().find(|(k, _)| k == "Price").unwrap();
        assert_eq!(price.1, "800 USD (was 1000, -20%)");
    }

    #[test]
    fn price_row_without_discount_has_no_annotation() {
        let mut r = record();
        r.old_price = None;
        r.discount_pct = None;
        let fields = detail_fields(&r);
        let price = fields.iter().find(|(k, _)| k == "Price").unwrap();
        assert_eq!(price.1, "800 USD");
    }

    #[test]
    fn report_file_name_is_timestamped() {
        let at = chrono::DateTime::parse_from_rfc3339("2026-08-25T09:30:05Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(report_file_name(&at), "report_20260825_093005.pdf");
    }

    #[test]
    fn rating_row_formats_count() {
        let fields = detail_fields(&record());
        let rating = fields.iter().find(|(k, _)| k == "Rating").unwrap();
        assert_eq!(rating.1, "4.2/5 (57 reviews)");
    }
}
