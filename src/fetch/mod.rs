// src/fetch/mod.rs

pub mod gviz;
pub mod urls;

pub use gviz::fetch_table;
pub use urls::{extract_id, gviz_query_url};
