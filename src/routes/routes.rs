use actix_web::web;

use crate::handlers::health_handlers::health_check;
use crate::handlers::history_handlers::{clear_history, get_history};
use crate::handlers::logo_handlers::upload_logo;
use crate::handlers::qr_handlers::{
    close_modal, export_png, export_svg, generate_qr, open_modal, share_outcome, share_qr,
};
use crate::handlers::scan_handlers::{camera_check, scan_frame, scan_image, scanner_settings};

/// Configure the routes
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health/check", web::get().to(health_check))
            // Generator
            .route("/qr", web::post().to(generate_qr))
            .route("/qr/{created_at}/svg", web::get().to(export_svg))
            .route("/qr/{created_at}/png", web::get().to(export_png))
            .route("/qr/{created_at}/modal", web::post().to(open_modal))
            .route("/qr/{created_at}/modal", web::delete().to(close_modal))
            .route("/qr/{created_at}/share", web::post().to(share_qr))
            .route("/share/outcome", web::post().to(share_outcome))
            .route("/logo", web::post().to(upload_logo))
            // History
            .route("/history", web::get().to(get_history))
            .route("/history", web::delete().to(clear_history))
            // Scanner
            .service(
                web::scope("/scan")
                    .route("/image", web::post().to(scan_image))
                    .route("/frame", web::post().to(scan_frame))
                    .route("/settings", web::get().to(scanner_settings))
                    .route("/camera-check", web::post().to(camera_check)),
            ),
    );
}
