use actix_web::{post, web, HttpResponse};
use serde::Deserialize;

use crate::config::Config;
use crate::errors::AppError;
use crate::page_range;
use crate::pricing::{PrintSettings, Quote};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub total_pages: u32,
    #[serde(default)]
    pub settings: PrintSettings,
}

/// Price preview while the customer edits settings. Nothing is stored.
#[post("/quote")]
pub async fn quote(
    body: web::Json<QuoteRequest>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    if request.total_pages > config.orders.max_pages {
        return Err(AppError::BadRequest(format!(
            "Documents are limited to {} pages",
            config.orders.max_pages
        )));
    }

    let settings = request.settings.clamped(config.orders.max_copies);
    let report = page_range::expand_with_report(&settings.page_range, request.total_pages);
    let warnings: Vec<String> = report.dropped.iter().map(ToString::to_string).collect();
    let quote = Quote::for_pages(report.pages, &settings);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "ok": true,
        "quote": quote,
        "settings": settings,
        "warnings": warnings
    })))
}
