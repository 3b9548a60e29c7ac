use crate::{
    api::{admin, attendance, muster_roll},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let punch_limiter = Arc::new(build_limiter(config.rate_punch_per_min));
    let read_limiter = Arc::new(build_limiter(config.rate_read_per_min));
    let admin_limiter = Arc::new(build_limiter(config.rate_admin_per_min));

    cfg.service(
        web::scope(&config.api_prefix).service(
            web::scope("/attendance")
                // /attendance/muster-roll/{year}/{month}
                .service(
                    web::resource("/muster-roll/{year}/{month}")
                        .wrap(read_limiter.clone())
                        .route(web::get().to(muster_roll::get_muster_roll)),
                )
                // /attendance/{employee_id}/punch
                .service(
                    web::resource("/{employee_id}/punch")
                        .wrap(punch_limiter.clone())
                        .route(web::post().to(attendance::punch)),
                )
                // /attendance/{employee_id}/{year}/{month}
                .service(
                    web::resource("/{employee_id}/{year}/{month}")
                        .wrap(read_limiter.clone())
                        .route(web::get().to(attendance::get_monthly_attendance)),
                )
                // /attendance/{employee_id}/{year}/{month}/stats
                .service(
                    web::resource("/{employee_id}/{year}/{month}/stats")
                        .wrap(read_limiter)
                        .route(web::get().to(attendance::monthly_stats)),
                )
                // /attendance/{employee_id}/{year}/{month}/bulk-mark
                .service(
                    web::resource("/{employee_id}/{year}/{month}/bulk-mark")
                        .wrap(admin_limiter.clone())
                        .route(web::post().to(attendance::bulk_mark)),
                )
                // /attendance/{employee_id}/{year}/{month}/{day}
                .service(
                    web::resource("/{employee_id}/{year}/{month}/{day}")
                        .wrap(admin_limiter)
                        .route(web::patch().to(admin::edit_record)),
                ),
        ),
    );
}
