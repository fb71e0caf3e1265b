use actix_web::{get, HttpResponse, Responder};

use crate::layouts::LAYOUTS;

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "ok": true }))
}

#[get("/layouts")]
pub async fn list_layouts() -> impl Responder {
    let layouts: Vec<serde_json::Value> = LAYOUTS
        .iter()
        .map(|layout| {
            serde_json::json!({
                "id": layout.id,
                "columns": layout.columns,
                "rows": layout.rows,
                "capacity": layout.capacity()
            })
        })
        .collect();

    HttpResponse::Ok().json(serde_json::json!({
        "ok": true,
        "layouts": layouts
    }))
}
