// src/serve/mod.rs

use std::convert::Infallible;
use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::error;
use warp::http::header::{HeaderValue, CACHE_CONTROL};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::cache::{CacheKey, TableCache};
use crate::config::Config;
use crate::error::Result as PipelineResult;
use crate::fetch::{extract_id, fetch_table};
use crate::process::remap::{to_institution_records, to_vacancy_records};
use crate::process::RawTable;
use crate::query::{self, FilterQuery, InstitutionItem, VacancyItem};

/// The sheet changes rarely; let edge caches absorb repeat traffic.
const VACANCY_CACHE_CONTROL: &str = "s-maxage=60, stale-while-revalidate=120";
const INSTITUTION_CACHE_CONTROL: &str = "s-maxage=300, stale-while-revalidate=600";

/// Everything a handler needs, cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: Client,
    pub cache: Arc<TableCache>,
}

impl AppState {
    pub fn new(config: Config, client: Client) -> Self {
        let cache = Arc::new(TableCache::new(config.cache_ttl));
        AppState {
            config: Arc::new(config),
            client,
            cache,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VacancyParams {
    q: Option<String>,
    field: Option<String>,
    university: Option<String>,
    page: Option<String>,
    #[serde(rename = "pageSize")]
    page_size: Option<String>,
}

#[derive(Serialize)]
struct ItemsBody<T> {
    items: Vec<T>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// All routes: `GET /institutions`, `GET /vacancies/all`,
/// `GET /vacancies?q=&field=&university=&page=&pageSize=`.
pub fn routes(
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let vacancies_all = warp::path!("vacancies" / "all")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handle_vacancies_all);

    let vacancies = warp::path!("vacancies")
        .and(warp::get())
        .and(warp::query::<VacancyParams>())
        .and(with_state(state.clone()))
        .and_then(handle_vacancies);

    let institutions = warp::path!("institutions")
        .and(warp::get())
        .and(with_state(state))
        .and_then(handle_institutions);

    vacancies_all.or(vacancies).or(institutions)
}

fn with_state(
    state: AppState,
) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

async fn handle_vacancies(
    params: VacancyParams,
    state: AppState,
) -> Result<Response, Infallible> {
    let query_spec = FilterQuery::from_params(
        params.q.as_deref(),
        params.field.as_deref(),
        params.university.as_deref(),
        params.page.as_deref(),
        params.page_size.as_deref(),
    );
    Ok(match vacancy_items_for(&state).await {
        Ok(items) => {
            let page = query::list_vacancies(&items, &query_spec);
            json_with_cache(&page, VACANCY_CACHE_CONTROL)
        }
        Err(err) => server_error("listing vacancies", &err),
    })
}

async fn handle_vacancies_all(state: AppState) -> Result<Response, Infallible> {
    Ok(match vacancy_items_for(&state).await {
        Ok(items) => json_with_cache(&ItemsBody { items }, VACANCY_CACHE_CONTROL),
        Err(err) => server_error("listing all vacancies", &err),
    })
}

async fn handle_institutions(state: AppState) -> Result<Response, Infallible> {
    Ok(match institution_items_for(&state).await {
        Ok(items) => json_with_cache(&ItemsBody { items }, INSTITUTION_CACHE_CONTROL),
        Err(err) => server_error("listing institutions", &err),
    })
}

async fn vacancy_items_for(state: &AppState) -> PipelineResult<Vec<VacancyItem>> {
    let table = sheet_table(state, state.config.vacancy_sheet.as_deref()).await?;
    let records = to_vacancy_records(&table);
    Ok(query::vacancy_items(
        &records,
        state.config.deadline_month_fix,
    ))
}

async fn institution_items_for(state: &AppState) -> PipelineResult<Vec<InstitutionItem>> {
    let table = sheet_table(state, state.config.institution_sheet.as_deref()).await?;
    let records = to_institution_records(&table);
    Ok(query::institution_items(&records))
}

/// Read-through: serve a live cache entry, otherwise fetch and remember.
async fn sheet_table(state: &AppState, sheet: Option<&str>) -> PipelineResult<Arc<RawTable>> {
    let spreadsheet_id = extract_id(&state.config.sheet_link);
    let key = CacheKey::new(&spreadsheet_id, sheet);
    if let Some(table) = state.cache.get(&key) {
        return Ok(table);
    }
    let table = Arc::new(fetch_table(&state.client, &spreadsheet_id, sheet).await?);
    state.cache.put(key, table.clone());
    Ok(table)
}

fn json_with_cache<T: Serialize>(body: &T, cache_control: &'static str) -> Response {
    let mut response = warp::reply::json(body).into_response();
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static(cache_control));
    response
}

fn server_error(action: &str, err: &crate::Error) -> Response {
    error!(error = %err, "{} failed", action);
    let body = ErrorBody {
        error: err.to_string(),
    };
    let mut response = warp::reply::json(&body).into_response();
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{CellValue, RawCell};
    use serde_json::Value;
    use std::time::Duration;

    fn test_config() -> Config {
        Config::from_lookup(|key| {
            match key {
                "SHEET_LINK" => Some("test-sheet"),
                "VACANCY_SHEET_NAME" => Some("Vacancies"),
                "UNIVERSITY_SHEET_NAME" => Some("Institutions"),
                _ => None,
            }
            .map(str::to_string)
        })
        .unwrap()
    }

    fn test_state() -> AppState {
        let client = Client::builder()
            .timeout(Duration::from_millis(250))
            .build()
            .unwrap();
        AppState::new(test_config(), client)
    }

    fn cell(text: &str) -> RawCell {
        RawCell::new(CellValue::String(text.to_string()))
    }

    fn vacancy_table() -> RawTable {
        let row = |vacancy: &str, institution: &str, subject: &str, deadline: &str| {
            vec![
                cell(""),
                cell(vacancy),
                cell(institution),
                cell(subject),
                cell(deadline),
                cell("https://example.org/apply"),
            ]
        };
        RawTable {
            columns: vec![String::new(); 6],
            rows: vec![
                row("header", "header", "header", "header"),
                row("header", "header", "header", "header"),
                row("AI PhD", "KTH", "CS", "Date(2026,0,15)"),
                row("Bio PhD", "Lund", "Biology", ""),
            ],
        }
    }

    fn institution_table() -> RawTable {
        let row = |location: &str, institution: &str| {
            vec![
                cell(""),
                cell(""),
                cell(location),
                cell(institution),
                cell("https://uni.example"),
            ]
        };
        RawTable {
            columns: vec![String::new(); 5],
            rows: vec![
                row("header", "header"),
                row("Stockholm", "KTH"),
                row("Lund", "Lund University"),
            ],
        }
    }

    fn seeded_state() -> AppState {
        let state = test_state();
        state.cache.put(
            CacheKey::new("test-sheet", Some("Vacancies")),
            Arc::new(vacancy_table()),
        );
        state.cache.put(
            CacheKey::new("test-sheet", Some("Institutions")),
            Arc::new(institution_table()),
        );
        state
    }

    #[tokio::test]
    async fn vacancies_all_serves_normalized_records() {
        let routes = routes(seeded_state());
        let response = warp::test::request()
            .method("GET")
            .path("/vacancies/all")
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("cache-control").unwrap(),
            VACANCY_CACHE_CONTROL
        );
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        let items = body["items"].as_array().unwrap();
        // two header rows dropped
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["id"], 1);
        assert_eq!(items[0]["vacancy"], "AI PhD");
        assert_eq!(items[0]["institution"], "KTH");
        assert_eq!(items[0]["deadline"], "2026-01-15");
        assert_eq!(items[1]["deadline"], "—");
        assert_eq!(items[0]["raw"]["col1"], "AI PhD");
    }

    #[tokio::test]
    async fn vacancies_filter_and_paginate() {
        let routes = routes(seeded_state());
        let response = warp::test::request()
            .method("GET")
            .path("/vacancies?university=kth&pageSize=1")
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["total"], 1);
        assert_eq!(body["page"], 1);
        assert_eq!(body["pageSize"], 1);
        assert_eq!(body["items"][0]["institution"], "KTH");
    }

    #[tokio::test]
    async fn vacancies_with_bad_paging_defaults() {
        let routes = routes(seeded_state());
        let response = warp::test::request()
            .method("GET")
            .path("/vacancies?page=zero&pageSize=zero")
            .reply(&routes)
            .await;
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["page"], 1);
        assert_eq!(body["pageSize"], 20);
        assert_eq!(body["total"], 2);
    }

    #[tokio::test]
    async fn institutions_serve_their_own_sheet() {
        let routes = routes(seeded_state());
        let response = warp::test::request()
            .method("GET")
            .path("/institutions")
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("cache-control").unwrap(),
            INSTITUTION_CACHE_CONTROL
        );
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        let items = body["items"].as_array().unwrap();
        // one header row dropped
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["name"], "KTH");
        assert_eq!(items[0]["location"], "Stockholm");
    }

    #[tokio::test]
    async fn pipeline_failures_become_json_500s() {
        // nothing seeded: the handler has to fetch, and the id does not
        // resolve to a reachable sheet
        let routes = routes(test_state());
        let response = warp::test::request()
            .method("GET")
            .path("/vacancies/all")
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert!(body["error"].as_str().is_some());
    }
}
