// Route modules organization

use actix_web::web;

pub mod base_routes;
pub mod queue_routes;
pub mod quote_routes;
pub mod session_routes;

pub use base_routes::*;
pub use queue_routes::*;
pub use quote_routes::*;
pub use session_routes::*;

/// Register every JSON endpoint. Static output files are mounted by the caller.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(list_layouts)
        .service(quote)
        // Session management
        .service(create_session)
        .service(get_session)
        .service(reset_session)
        .service(register_uploads)
        .service(select_layout)
        .service(add_to_selection)
        .service(remove_from_selection)
        // Queue
        .service(queue_document)
        .service(queue_layout)
        .service(remove_queue_item)
        .service(checkout);
}
