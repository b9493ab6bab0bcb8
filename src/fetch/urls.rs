// src/fetch/urls.rs

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Spreadsheet ids are long alphanumeric tokens; a run this long anywhere
/// in the input is taken to be the id.
static ID_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\w]{44,}").unwrap());

/// Fallback for share links whose id is shorter than usual.
static SHEET_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"spreadsheets/d/([-\w]+)").unwrap());

/// Extract a spreadsheet id from a share link or a raw id string.
///
/// Best-effort by design: anything that matches neither pattern is
/// returned unchanged and a wrong id surfaces as a downstream fetch
/// failure.
pub fn extract_id(input: &str) -> String {
    if let Some(found) = ID_RUN.find(input) {
        return found.as_str().to_string();
    }
    if let Some(caps) = SHEET_PATH.captures(input) {
        return caps[1].to_string();
    }
    input.to_string()
}

/// Visualization-query endpoint for one sheet of a spreadsheet. The
/// payload is JSON wrapped in a JavaScript callback; `sheet` scopes the
/// query to a named sheet, otherwise the first sheet answers.
pub fn gviz_query_url(spreadsheet_id: &str, sheet: Option<&str>) -> Url {
    let mut url = Url::parse("https://docs.google.com/").expect("base url should parse");
    url.set_path(&format!("spreadsheets/d/{}/gviz/tq", spreadsheet_id));
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("tqx", "out:json");
        if let Some(sheet) = sheet {
            pairs.append_pair("sheet", sheet);
        }
    }
    url
}
