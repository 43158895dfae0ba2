use crate::fetch;
use crate::sheet::{self, Row};
use crate::store::{PriceRecord, Store};
use anyhow::Result;
use reqwest::Client;
use std::path::Path;
use tracing::{debug, info};

/// Reply text shown in place of a price when extraction failed.
pub const PRICE_UNAVAILABLE: &str = "Не удалось извлечь";

/// Run one uploaded spreadsheet through the whole pipeline: parse the rows,
/// fetch every price, persist the batch, and render the reply text.
pub async fn process_batch(client: &Client, store: &Store, path: &Path) -> Result<String> {
    let rows = sheet::read_rows(path)?;
    info!(rows = rows.len(), "processing batch");
    let records = fetch_rows(client, &rows).await;
    store.append_batch(&records)?;
    Ok(format_report(&records))
}

/// Fetch prices for every row in upload order. A failed row still yields a
/// record, just without a price.
async fn fetch_rows(client: &Client, rows: &[Row]) -> Vec<PriceRecord> {
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let price = fetch::fetch_price(client, &row.url, &row.xpath).await;
        debug!(title = %row.title, price = ?price, "row done");
        records.push(PriceRecord {
            title: row.title.clone(),
            url: row.url.clone(),
            price,
        });
    }
    records
}

/// Three lines per record, blocks separated by a blank line.
pub fn format_report(records: &[PriceRecord]) -> String {
    records
        .iter()
        .map(|record| {
            format!(
                "Товар: {}\nЦена: {}\nURL: {}",
                record.title,
                record.price.as_deref().unwrap_or(PRICE_UNAVAILABLE),
                record.url
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::serve_once;

    fn row(title: &str, url: &str, xpath: &str) -> Row {
        Row {
            title: title.to_string(),
            url: url.to_string(),
            xpath: xpath.to_string(),
        }
    }

    #[tokio::test]
    async fn failed_rows_still_produce_records_in_order() {
        let ok_url = serve_once("200 OK", r#"<span class="price"> 12.99  USD </span>"#);
        let missing_url = serve_once("404 Not Found", "");
        let rows = vec![
            row("Widget", &ok_url, "span.price"),
            row("Gadget", &missing_url, "span.price"),
        ];

        let store = Store::in_memory().unwrap();
        let client = Client::new();
        let records = fetch_rows(&client, &rows).await;
        store.append_batch(&records).unwrap();

        let stored = store.records().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].title, "Widget");
        assert_eq!(stored[0].price.as_deref(), Some("12.99 USD"));
        assert_eq!(stored[1].title, "Gadget");
        assert_eq!(stored[1].price, None);
    }

    #[test]
    fn report_has_one_block_per_record_in_order() {
        let records = vec![
            PriceRecord {
                title: "Widget".into(),
                url: "http://example.test/a".into(),
                price: Some("12.99 USD".into()),
            },
            PriceRecord {
                title: "Gadget".into(),
                url: "http://example.test/b".into(),
                price: None,
            },
        ];
        let report = format_report(&records);
        let blocks: Vec<&str> = report.split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[0],
            "Товар: Widget\nЦена: 12.99 USD\nURL: http://example.test/a"
        );
        assert_eq!(
            blocks[1],
            "Товар: Gadget\nЦена: Не удалось извлечь\nURL: http://example.test/b"
        );
    }

    #[test]
    fn empty_batch_renders_empty_report() {
        assert_eq!(format_report(&[]), "");
    }
}
