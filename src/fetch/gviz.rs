// src/fetch/gviz.rs

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::process::{CellValue, RawCell, RawTable};

use super::urls::gviz_query_url;

/// Wire shape of the payload inside the callback envelope. Fields the
/// pipeline does not use (version, status, sig, column types) are ignored.
#[derive(Debug, Deserialize)]
struct GvizResponse {
    table: GvizTable,
}

#[derive(Debug, Deserialize, Default)]
struct GvizTable {
    #[serde(default)]
    cols: Vec<GvizColumn>,
    #[serde(default)]
    rows: Vec<GvizRow>,
}

#[derive(Debug, Deserialize)]
struct GvizColumn {
    id: Option<String>,
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GvizRow {
    #[serde(default)]
    c: Vec<Option<GvizCell>>,
}

#[derive(Debug, Deserialize)]
struct GvizCell {
    #[serde(default)]
    v: CellValue,
    f: Option<String>,
}

/// Fetch one sheet's table through the visualization-query endpoint.
///
/// Transport failures and non-success statuses are `Error::Fetch`; a body
/// that is not callback-wrapped JSON is `Error::Envelope`/`Error::Payload`.
#[instrument(level = "debug", skip(client))]
pub async fn fetch_table(
    client: &Client,
    spreadsheet_id: &str,
    sheet: Option<&str>,
) -> Result<RawTable> {
    let url = gviz_query_url(spreadsheet_id, sheet);
    debug!(%url, "fetching sheet");
    let body = client
        .get(url.as_str())
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let table = parse_body(&body)?;
    debug!(
        columns = table.columns.len(),
        rows = table.rows.len(),
        "sheet fetched"
    );
    Ok(table)
}

/// Parse a raw response body: peel the `<callback>(<json>);` envelope,
/// decode the JSON, and map it into a `RawTable`.
pub fn parse_body(body: &str) -> Result<RawTable> {
    let json = extract_envelope(body)?;
    let response: GvizResponse = serde_json::from_str(json)?;
    Ok(table_from_wire(response.table))
}

/// The body is a JavaScript call, `<callback-identifier>(<json>);` — the
/// argument list is everything between the first `(` and the last `)`.
fn extract_envelope(body: &str) -> Result<&str> {
    match (body.find('('), body.rfind(')')) {
        (Some(open), Some(close)) if open < close => Ok(&body[open + 1..close]),
        _ => Err(Error::Envelope(preview(body))),
    }
}

fn preview(body: &str) -> String {
    let mut head: String = body.chars().take(80).collect();
    if head.len() < body.len() {
        head.push('…');
    }
    head
}

fn table_from_wire(table: GvizTable) -> RawTable {
    let columns = table
        .cols
        .into_iter()
        .map(|col| {
            col.label
                .filter(|label| !label.is_empty())
                .or_else(|| col.id.filter(|id| !id.is_empty()))
                .unwrap_or_default()
        })
        .collect();
    let rows = table
        .rows
        .into_iter()
        .map(|row| {
            row.c
                .into_iter()
                .map(|cell| match cell {
                    Some(cell) => RawCell {
                        value: cell.v,
                        formatted: cell.f,
                    },
                    None => RawCell::new(CellValue::Null),
                })
                .collect()
        })
        .collect();
    RawTable { columns, rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = concat!(
        "/*O_o*/\ngoogle.visualization.Query.setResponse(",
        r#"{"version":"0.6","reqId":"0","status":"ok","table":{"#,
        r#""cols":[{"id":"A","label":"","type":"string"},"#,
        r#"{"id":"B","label":"Institution","type":"string"},"#,
        r#"{"id":"C","label":"","type":"number"}],"#,
        r#""rows":[{"c":[{"v":"x"},{"v":"KTH","f":"KTH Royal Institute"},{"v":3.5}]},"#,
        r#"{"c":[null,{"v":null}]}]}}"#,
        ");"
    );

    #[test]
    fn wraps_are_peeled_and_the_table_mapped() {
        let table = parse_body(BODY).unwrap();
        // empty label falls back to the column id
        assert_eq!(table.columns, vec!["A", "Institution", "C"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(
            table.rows[0][1].value,
            CellValue::String("KTH".to_string())
        );
        assert_eq!(
            table.rows[0][1].formatted.as_deref(),
            Some("KTH Royal Institute")
        );
        assert_eq!(table.rows[0][2].value, CellValue::Number(3.5));
        // absent cell and null value both read as null
        assert_eq!(table.rows[1][0].value, CellValue::Null);
        assert_eq!(table.rows[1][1].value, CellValue::Null);
        // short row stays short; record conversion pads later
        assert_eq!(table.rows[1].len(), 2);
    }

    #[test]
    fn an_unwrapped_body_is_an_envelope_error() {
        let err = parse_body("<html><body>sign in required</body></html>").unwrap_err();
        assert!(matches!(err, Error::Envelope(_)));
    }

    #[test]
    fn garbage_inside_the_envelope_is_a_payload_error() {
        let err = parse_body("cb(this is not json);").unwrap_err();
        assert!(matches!(err, Error::Payload(_)));
    }

    #[test]
    fn a_payload_without_a_table_is_a_payload_error() {
        let err = parse_body(r#"cb({"status":"error"});"#).unwrap_err();
        assert!(matches!(err, Error::Payload(_)));
    }
}
