mod common;

use actix_web::{App, test, web};
use pretty_assertions::assert_eq;
use sqlx::PgPool;

use common::{auth_token, create_user, services, team_of_size, test_config};
use robosaga_api::database::repositories::{
    ContactRepository, EventRepository, TeamRepository, UserRepository,
};
use robosaga_api::handlers::{auth, hackaway, shared::ApiResponse, teams};
use robosaga_api::{
    AppState, IdentityService, RegistrationService, StatsService, TeamService,
};

macro_rules! test_app {
    ($pool:expr, $config:expr) => {{
        let app_state = web::Data::new(AppState {
            identity: IdentityService::new(UserRepository::new($pool.clone())),
            teams: TeamService::new($pool.clone()),
            registrations: RegistrationService::new($pool.clone()),
            stats: StatsService::new($pool.clone()),
        });

        test::init_service(
            App::new()
                .app_data(app_state)
                .app_data(web::Data::new(UserRepository::new($pool.clone())))
                .app_data(web::Data::new(TeamRepository::new($pool.clone())))
                .app_data(web::Data::new(EventRepository::new($pool.clone())))
                .app_data(web::Data::new(ContactRepository::new($pool.clone())))
                .app_data(web::Data::new($config.clone()))
                .service(
                    web::scope("/api/v1")
                        .service(
                            web::scope("/auth")
                                .route("/session", web::post().to(auth::session))
                                .route("/me", web::get().to(auth::me)),
                        )
                        .service(
                            web::scope("/teams")
                                .route("", web::post().to(teams::create_team))
                                .route("/me", web::get().to(teams::my_team))
                                .route("/join", web::post().to(teams::request_join))
                                .route("/{slug}", web::get().to(teams::get_team_by_slug)),
                        )
                        .service(
                            web::scope("/hackaway")
                                .route("/register", web::post().to(hackaway::register)),
                        ),
                ),
        )
        .await
    }};
}

#[sqlx::test]
async fn session_endpoint_provisions_the_user(pool: PgPool) {
    let config = test_config();
    let app = test_app!(pool, config);

    let id = uuid::Uuid::new_v4();
    let claims = robosaga_api::services::Claims {
        sub: id,
        email: "asha@bitmesra.ac.in".to_string(),
        name: Some("Asha".to_string()),
        picture: None,
        exp: (chrono::Utc::now() + chrono::Duration::days(1)).timestamp() as usize,
    };
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(config.session_secret.as_ref()),
    )
    .unwrap();

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/session")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: ApiResponse<robosaga_api::database::models::User> =
        test::read_body_json(resp).await;
    assert!(body.success);
    assert_eq!(body.data.unwrap().id, id);

    // /me now resolves the same user
    let req = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}

#[sqlx::test]
async fn requests_without_a_token_are_unauthorized(pool: PgPool) {
    let config = test_config();
    let app = test_app!(pool, config);

    let req = test::TestRequest::get().uri("/api/v1/auth/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 401);

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 401);
}

#[sqlx::test]
async fn create_team_over_http(pool: PgPool) {
    let config = test_config();
    let app = test_app!(pool, config);
    let user = create_user(&pool, "Asha").await;
    let token = auth_token(&user, &config);

    let req = test::TestRequest::post()
        .uri("/api/v1/teams")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(serde_json::json!({ "teamName": "Falcons" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: ApiResponse<robosaga_api::database::models::Team> =
        test::read_body_json(resp).await;
    let team = body.data.unwrap();
    assert!(team.slug.starts_with("falcons-"));

    // The second create surfaces the error kind in the envelope
    let req = test::TestRequest::post()
        .uri("/api/v1/teams")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(serde_json::json!({ "teamName": "Eagles" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 409);

    let body: ApiResponse<serde_json::Value> = test::read_body_json(resp).await;
    assert!(!body.success);
    assert_eq!(body.kind.as_deref(), Some("AlreadyInTeam"));
}

#[sqlx::test]
async fn hackaway_gate_errors_travel_the_envelope(pool: PgPool) {
    let config = test_config();
    let app = test_app!(pool, config);
    let svcs = services(&pool);

    let (_, members) = team_of_size(&pool, &svcs, "Falcons", 2).await;
    svcs.registrations
        .update_problem_statement(
            3,
            &robosaga_api::database::models::UpdateProblemStatementInput {
                max_participants: Some(1),
                is_active: None,
            },
        )
        .await
        .unwrap();

    let (_, occupants) = team_of_size(&pool, &svcs, "First", 2).await;
    svcs.registrations
        .register_for_hackaway(occupants[0].id, 3)
        .await
        .unwrap();

    let token = auth_token(&members[0], &config);
    let req = test::TestRequest::post()
        .uri("/api/v1/hackaway/register")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(serde_json::json!({ "problemStatementNo": 3 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 409);

    let body: ApiResponse<serde_json::Value> = test::read_body_json(resp).await;
    assert_eq!(body.kind.as_deref(), Some("ProblemStatementFull"));
}

#[sqlx::test]
async fn public_team_preview(pool: PgPool) {
    let config = test_config();
    let app = test_app!(pool, config);
    let svcs = services(&pool);
    let (team, _) = team_of_size(&pool, &svcs, "Falcons", 2).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/teams/{}", team.slug))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: ApiResponse<robosaga_api::database::models::TeamPreview> =
        test::read_body_json(resp).await;
    assert_eq!(body.data.unwrap().members.len(), 2);
}
