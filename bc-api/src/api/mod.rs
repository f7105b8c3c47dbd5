//! HTTP API handlers for bc-api

pub mod error;
pub mod extract;
pub mod forms;
pub mod health;
pub mod matching;
pub mod report;
pub mod verification;

pub use error::ApiError;
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use forms::{get_form, get_form_grid, get_form_view, list_forms, list_summaries, put_form};
pub use health::health_routes;
pub use matching::match_text;
pub use report::get_report;
pub use verification::{list_scans, scan_marker, update_marker, update_verification};
