use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware::Logger, web};
use anyhow::Result;

use robosaga_api::database::{
    init_database,
    repositories::{ContactRepository, EventRepository, TeamRepository, UserRepository},
};
use robosaga_api::handlers::{admin, auth, contact, events, hackaway, stats, teams};
use robosaga_api::middleware::RequestId;
use robosaga_api::{
    AppState, Config, IdentityService, RegistrationService, StatsService, TeamService,
};

#[get("/")]
async fn hello() -> impl Responder {
    HttpResponse::Ok().body("RoboSaga API v1.0")
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now()
    }))
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init();

    log::info!("Starting RoboSaga API server...");

    // Load configuration
    let config = Config::from_env()?;
    log::info!("Configuration loaded (environment: {})", config.environment);

    // Initialize database
    let pool = init_database(&config.database_url).await?;
    log::info!("Database initialized");

    // Initialize repositories and services
    let user_repository = UserRepository::new(pool.clone());
    let team_repository = TeamRepository::new(pool.clone());
    let event_repository = EventRepository::new(pool.clone());
    let contact_repository = ContactRepository::new(pool.clone());

    let app_state = web::Data::new(AppState {
        identity: IdentityService::new(user_repository.clone()),
        teams: TeamService::new(pool.clone()),
        registrations: RegistrationService::new(pool.clone()),
        stats: StatsService::new(pool.clone()),
    });
    let user_repo_data = web::Data::new(user_repository);
    let team_repo_data = web::Data::new(team_repository);
    let event_repo_data = web::Data::new(event_repository);
    let contact_repo_data = web::Data::new(contact_repository);
    let config_data = web::Data::new(config.clone());

    let server_address = config.server_address();
    log::info!("Server starting on http://{}", server_address);

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(user_repo_data.clone())
            .app_data(team_repo_data.clone())
            .app_data(event_repo_data.clone())
            .app_data(contact_repo_data.clone())
            .app_data(config_data.clone())
            .wrap(
                Cors::default()
                    .allowed_origin(&config.client_base_url)
                    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                    .allowed_headers(vec![
                        "Authorization",
                        "Content-Type",
                        "Accept",
                        "X-Requested-With",
                        "X-Correlation-ID",
                    ])
                    .max_age(3600),
            )
            .wrap(RequestId)
            .wrap(Logger::new(
                r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T correlation_id=%{x-correlation-id}o"#,
            ))
            .service(hello)
            .service(health)
            .service(
                web::scope("/api/v1")
                    .service(
                        web::scope("/auth")
                            .route("/session", web::post().to(auth::session))
                            .route("/me", web::get().to(auth::me))
                            .route("/profile", web::put().to(auth::update_profile)),
                    )
                    .service(
                        web::scope("/teams")
                            .route("", web::post().to(teams::create_team))
                            .route("/me", web::get().to(teams::my_team))
                            .route("/join", web::post().to(teams::request_join))
                            .route("/requests", web::get().to(teams::my_join_requests))
                            .route(
                                "/requests/{id}/accept",
                                web::post().to(teams::accept_join_request),
                            )
                            .route(
                                "/requests/{id}/reject",
                                web::post().to(teams::reject_join_request),
                            )
                            .route(
                                "/members/{user_id}",
                                web::delete().to(teams::remove_member),
                            )
                            .route("/leave", web::post().to(teams::leave_team))
                            .route("/{slug}", web::get().to(teams::get_team_by_slug))
                            .route("/{slug}", web::delete().to(teams::delete_team)),
                    )
                    .route("/leaderboard", web::get().to(stats::leaderboard))
                    .service(
                        web::scope("/events")
                            .route("", web::get().to(events::list_events))
                            .route(
                                "/registrations/me",
                                web::get().to(events::my_registrations),
                            )
                            .route(
                                "/{slug}/register",
                                web::post().to(events::register_for_event),
                            ),
                    )
                    .service(
                        web::scope("/hackaway")
                            .route(
                                "/problem-statements",
                                web::get().to(hackaway::problem_statements),
                            )
                            .route("/stats", web::get().to(hackaway::stats))
                            .route(
                                "/registration",
                                web::get().to(hackaway::registration_status),
                            )
                            .route("/register", web::post().to(hackaway::register)),
                    )
                    .service(
                        web::scope("/admin")
                            .route("/stats", web::get().to(admin::dashboard_stats))
                            .route("/analytics", web::get().to(admin::analytics))
                            .route("/users", web::get().to(admin::get_users))
                            .route("/users/{id}/role", web::put().to(admin::update_user_role))
                            .route("/teams", web::get().to(admin::get_teams))
                            .route(
                                "/teams/{id}/score",
                                web::put().to(admin::update_team_score),
                            )
                            .route("/events", web::post().to(admin::create_event))
                            .route("/events", web::get().to(admin::get_events))
                            .route("/events/{id}", web::put().to(admin::update_event))
                            .route("/events/{id}", web::delete().to(admin::delete_event))
                            .route("/registrations", web::get().to(admin::get_registrations))
                            .route(
                                "/hackaway/registrations",
                                web::get().to(admin::get_hackaway_registrations),
                            )
                            .route(
                                "/hackaway/problem-statements/{no}",
                                web::put().to(admin::update_problem_statement),
                            )
                            .route("/messages", web::get().to(admin::get_messages)),
                    )
                    .route("/contact", web::post().to(contact::submit)),
            )
    })
    .bind(&server_address)?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
