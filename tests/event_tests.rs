mod common;

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use sqlx::PgPool;

use common::{assert_kind, create_user, services, team_of_size};
use robosaga_api::database::models::EventInput;

fn event_input(name: &str, slug: &str) -> EventInput {
    let start = Utc::now() + Duration::days(7);
    EventInput {
        name: name.to_string(),
        slug: slug.to_string(),
        description: Some("Line follower race".to_string()),
        category: "robotics".to_string(),
        start_time: start,
        end_time: start + Duration::hours(4),
        max_score: 100,
        is_active: true,
    }
}

#[sqlx::test]
async fn register_team_for_event(pool: PgPool) {
    let svcs = services(&pool);
    let (_, members) = team_of_size(&pool, &svcs, "Falcons", 2).await;
    svcs.events.create(&event_input("Robo Race", "robo-race")).await.unwrap();

    let outcome = svcs
        .registrations
        .register_for_event(members[0].id, "robo-race")
        .await
        .unwrap();
    assert!(!outcome.already_registered);
    assert_eq!(outcome.event_name, "Robo Race");

    let slugs = svcs
        .registrations
        .user_event_registrations(members[1].id)
        .await
        .unwrap();
    assert_eq!(slugs, vec!["robo-race".to_string()]);
}

#[sqlx::test]
async fn event_registration_is_idempotent(pool: PgPool) {
    let svcs = services(&pool);
    let (team, members) = team_of_size(&pool, &svcs, "Falcons", 2).await;
    let event = svcs.events.create(&event_input("Robo Race", "robo-race")).await.unwrap();

    let first = svcs
        .registrations
        .register_for_event(members[0].id, "robo-race")
        .await
        .unwrap();
    assert!(!first.already_registered);

    // Second attempt, by another member even, is a soft success
    let second = svcs
        .registrations
        .register_for_event(members[1].id, "robo-race")
        .await
        .unwrap();
    assert!(second.already_registered);

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM event_registrations WHERE event_id = $1 AND team_id = $2",
    )
    .bind(event.id)
    .bind(team.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 1, "no duplicate registration row");
}

#[sqlx::test]
async fn registration_requires_a_team(pool: PgPool) {
    let svcs = services(&pool);
    let loner = create_user(&pool, "Asha").await;
    svcs.events.create(&event_input("Robo Race", "robo-race")).await.unwrap();

    assert_kind(
        svcs.registrations.register_for_event(loner.id, "robo-race").await,
        "NotInTeam",
    );
}

#[sqlx::test]
async fn unknown_or_inactive_events_are_not_found(pool: PgPool) {
    let svcs = services(&pool);
    let (_, members) = team_of_size(&pool, &svcs, "Falcons", 2).await;

    assert_kind(
        svcs.registrations.register_for_event(members[0].id, "no-such").await,
        "NotFound",
    );

    let mut input = event_input("Hidden", "hidden");
    input.is_active = false;
    svcs.events.create(&input).await.unwrap();

    assert_kind(
        svcs.registrations.register_for_event(members[0].id, "hidden").await,
        "NotFound",
    );
}

#[sqlx::test]
async fn concurrent_duplicate_registrations_collapse_to_one_row(pool: PgPool) {
    let svcs = services(&pool);
    let (team, members) = team_of_size(&pool, &svcs, "Falcons", 4).await;
    let event = svcs.events.create(&event_input("Robo Race", "robo-race")).await.unwrap();

    let attempts = members.iter().map(|member| {
        let registrations = svcs.registrations.clone();
        let user_id = member.id;
        tokio::spawn(async move { registrations.register_for_event(user_id, "robo-race").await })
    });

    let results = futures::future::join_all(attempts).await;
    for result in results {
        // Every attempt succeeds; late ones as already-registered
        result.expect("task panicked").expect("registration failed");
    }

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM event_registrations WHERE event_id = $1 AND team_id = $2",
    )
    .bind(event.id)
    .bind(team.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 1);
}
