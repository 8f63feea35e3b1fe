pub mod review;
pub mod review_cycle;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/performance")
            .service(
                web::scope("/review-cycles")
                    .service(
                        web::resource("")
                            .route(web::get().to(review_cycle::list_review_cycles))
                            .route(web::post().to(review_cycle::create_review_cycle)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(review_cycle::get_review_cycle))
                            .route(web::put().to(review_cycle::update_review_cycle))
                            .route(web::delete().to(review_cycle::delete_review_cycle)),
                    ),
            )
            .service(
                web::scope("/reviews")
                    .service(
                        web::resource("")
                            .route(web::get().to(review::list_reviews))
                            .route(web::post().to(review::create_review)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(review::get_review))
                            .route(web::put().to(review::update_review))
                            .route(web::delete().to(review::delete_review)),
                    )
                    .service(web::resource("/{id}/start").route(web::put().to(review::start_review)))
                    .service(
                        web::resource("/{id}/complete").route(web::put().to(review::complete_review)),
                    ),
            ),
    );
}
