mod common;

use pretty_assertions::assert_eq;
use sqlx::PgPool;

use common::{
    add_member_directly, assert_kind, create_user, random_user, seed_hackaway_registration,
    seed_team, services, team_of_size,
};
use robosaga_api::database::models::{
    DEFAULT_MAX_PARTICIPANTS, UpdateProblemStatementInput,
};

fn set_max(max: i32) -> UpdateProblemStatementInput {
    UpdateProblemStatementInput {
        max_participants: Some(max),
        is_active: None,
    }
}

#[sqlx::test]
async fn register_happy_path(pool: PgPool) {
    let svcs = services(&pool);
    let (_, members) = team_of_size(&pool, &svcs, "Falcons", 3).await;

    let outcome = svcs
        .registrations
        .register_for_hackaway(members[1].id, 4)
        .await
        .unwrap();

    assert!(!outcome.already_registered);
    assert_eq!(outcome.problem_statement_no, 4);
    assert_eq!(outcome.members.len(), 3);

    let status = svcs.registrations.check_registration(members[0].id).await.unwrap();
    assert!(status.is_registered);
    assert_eq!(status.problem_statement_no, Some(4));
}

#[sqlx::test]
async fn team_size_gate(pool: PgPool) {
    let svcs = services(&pool);

    // 1 member: too small
    let solo = create_user(&pool, "Asha").await;
    svcs.teams.create_team(solo.id, "Solo").await.unwrap();
    assert_kind(
        svcs.registrations.register_for_hackaway(solo.id, 1).await,
        "TeamTooSmall",
    );

    // 5 members (seeded past the enforcer): too large
    let (big_team, big_leader) = seed_team(&pool, "Bigs").await;
    for _ in 0..4 {
        let extra = random_user(&pool).await;
        add_member_directly(&pool, big_team.id, extra.id).await;
    }
    assert_kind(
        svcs.registrations.register_for_hackaway(big_leader.id, 1).await,
        "TeamTooLarge",
    );

    // 2, 3 and 4 members all pass
    for size in 2..=4 {
        let (_, members) = team_of_size(&pool, &svcs, &format!("Size{}", size), size).await;
        let outcome = svcs
            .registrations
            .register_for_hackaway(members[0].id, size as i32)
            .await
            .unwrap();
        assert!(!outcome.already_registered, "size {} should register", size);
    }
}

#[sqlx::test]
async fn one_problem_statement_per_team(pool: PgPool) {
    let svcs = services(&pool);
    let (_, members) = team_of_size(&pool, &svcs, "Falcons", 2).await;

    svcs.registrations.register_for_hackaway(members[0].id, 3).await.unwrap();

    // A second pick, even of a different statement, reports the existing one
    let outcome = svcs
        .registrations
        .register_for_hackaway(members[1].id, 7)
        .await
        .unwrap();
    assert!(outcome.already_registered);
    assert_eq!(outcome.problem_statement_no, 3);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM hackaway_registrations")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test]
async fn invalid_and_inactive_statements_are_refused(pool: PgPool) {
    let svcs = services(&pool);
    let (_, members) = team_of_size(&pool, &svcs, "Falcons", 2).await;

    assert_kind(
        svcs.registrations.register_for_hackaway(members[0].id, 0).await,
        "InvalidInput",
    );
    assert_kind(
        svcs.registrations.register_for_hackaway(members[0].id, 13).await,
        "InvalidInput",
    );

    svcs.registrations
        .update_problem_statement(
            5,
            &UpdateProblemStatementInput {
                max_participants: None,
                is_active: Some(false),
            },
        )
        .await
        .unwrap();

    assert_kind(
        svcs.registrations.register_for_hackaway(members[0].id, 5).await,
        "ProblemStatementInactive",
    );
}

#[sqlx::test]
async fn capacity_is_enforced_at_commit(pool: PgPool) {
    let svcs = services(&pool);
    svcs.registrations.update_problem_statement(2, &set_max(3)).await.unwrap();

    for i in 0..3 {
        let (_, members) = team_of_size(&pool, &svcs, &format!("Team{}", i), 2).await;
        svcs.registrations.register_for_hackaway(members[0].id, 2).await.unwrap();
    }

    let (_, members) = team_of_size(&pool, &svcs, "Late", 2).await;
    assert_kind(
        svcs.registrations.register_for_hackaway(members[0].id, 2).await,
        "ProblemStatementFull",
    );

    let stats = svcs.registrations.hackaway_stats().await.unwrap();
    let stat = stats.iter().find(|s| s.problem_statement_no == 2).unwrap();
    assert_eq!(stat.count, 3);
    assert_eq!(stat.max, 3);
    assert!(stat.is_full);
}

/// Twenty distinct teams race for a statement capped at five; exactly
/// five commits land no matter how the attempts interleave.
#[sqlx::test]
async fn concurrent_registrations_never_exceed_capacity(pool: PgPool) {
    let svcs = services(&pool);
    svcs.registrations.update_problem_statement(8, &set_max(5)).await.unwrap();

    let mut leaders = Vec::new();
    for i in 0..20 {
        let (team, leader) = seed_team(&pool, &format!("Racer{}", i)).await;
        let second = random_user(&pool).await;
        add_member_directly(&pool, team.id, second.id).await;
        leaders.push(leader);
    }

    let attempts = leaders.into_iter().map(|leader| {
        let registrations = svcs.registrations.clone();
        tokio::spawn(async move { registrations.register_for_hackaway(leader.id, 8).await })
    });

    let results = futures::future::join_all(attempts).await;

    let mut succeeded = 0;
    let mut full = 0;
    for result in results {
        match result.expect("task panicked") {
            Ok(outcome) => {
                assert!(!outcome.already_registered);
                succeeded += 1;
            }
            Err(e) => {
                assert_eq!(e.kind(), "ProblemStatementFull", "unexpected error: {}", e);
                full += 1;
            }
        }
    }

    assert_eq!(succeeded, 5);
    assert_eq!(full, 15);

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM hackaway_registrations WHERE problem_statement_no = 8",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 5);
}

#[sqlx::test]
async fn lowering_max_below_count_keeps_registrations(pool: PgPool) {
    let svcs = services(&pool);

    for i in 0..4 {
        let (_, members) = team_of_size(&pool, &svcs, &format!("Team{}", i), 2).await;
        svcs.registrations.register_for_hackaway(members[0].id, 6).await.unwrap();
    }

    // Admin squeezes the cap under the live count; nobody is evicted
    svcs.registrations.update_problem_statement(6, &set_max(2)).await.unwrap();

    let stats = svcs.registrations.hackaway_stats().await.unwrap();
    let stat = stats.iter().find(|s| s.problem_statement_no == 6).unwrap();
    assert_eq!(stat.count, 4);
    assert_eq!(stat.max, 2);
    assert!(stat.is_full);

    // And the gate refuses newcomers
    let (_, members) = team_of_size(&pool, &svcs, "Late", 2).await;
    assert_kind(
        svcs.registrations.register_for_hackaway(members[0].id, 6).await,
        "ProblemStatementFull",
    );
}

#[sqlx::test]
async fn max_participants_is_bounds_checked(pool: PgPool) {
    let svcs = services(&pool);

    assert_kind(
        svcs.registrations.update_problem_statement(1, &set_max(0)).await,
        "InvalidInput",
    );
    assert_kind(
        svcs.registrations.update_problem_statement(1, &set_max(101)).await,
        "InvalidInput",
    );
    assert_kind(
        svcs.registrations.update_problem_statement(99, &set_max(10)).await,
        "InvalidInput",
    );

    let setting = svcs.registrations.update_problem_statement(1, &set_max(100)).await.unwrap();
    assert_eq!(setting.max_participants, 100);
}

#[sqlx::test]
async fn settings_merge_defaults_with_sparse_overrides(pool: PgPool) {
    let svcs = services(&pool);

    // Nothing persisted: all twelve defaults
    let settings = svcs.registrations.problem_statement_settings().await.unwrap();
    assert_eq!(settings.len(), 12);
    assert!(settings.iter().all(|s| s.max_participants == DEFAULT_MAX_PARTICIPANTS));
    assert!(settings.iter().all(|s| s.is_active));
    assert_eq!(settings[0].title, "The Reviewer Who Never Sleeps");

    // One override; the other eleven stay at defaults
    svcs.registrations.update_problem_statement(7, &set_max(25)).await.unwrap();

    let settings = svcs.registrations.problem_statement_settings().await.unwrap();
    assert_eq!(settings.len(), 12);
    let seven = settings.iter().find(|s| s.id == 7).unwrap();
    assert_eq!(seven.max_participants, 25);
    assert!(
        settings
            .iter()
            .filter(|s| s.id != 7)
            .all(|s| s.max_participants == DEFAULT_MAX_PARTICIPANTS)
    );
}

/// The end-to-end story: create, join, accept, then squeeze into the
/// last slot of a nearly-full problem statement.
#[sqlx::test]
async fn full_registration_scenario(pool: PgPool) {
    let svcs = services(&pool);

    // User A creates team Falcons
    let a = create_user(&pool, "Asha").await;
    let team = svcs.teams.create_team(a.id, "Falcons").await.unwrap();
    assert!(team.slug.starts_with("falcons-"));
    assert_eq!(svcs.team_repo.member_count(team.id).await.unwrap(), 1);

    // User B requests to join via the slug and A accepts
    let b = create_user(&pool, "Bharat").await;
    let (request, _) = svcs.teams.request_join(b.id, &team.slug).await.unwrap();
    svcs.teams.accept_join_request(a.id, request.id).await.unwrap();
    assert_eq!(svcs.team_repo.member_count(team.id).await.unwrap(), 2);

    // Problem statement 4 is at 9 of 10
    for i in 0..9 {
        let (other, _) = seed_team(&pool, &format!("Filler{}", i)).await;
        seed_hackaway_registration(&pool, other.id, 4).await;
    }

    // Falcons take the last slot
    let outcome = svcs.registrations.register_for_hackaway(a.id, 4).await.unwrap();
    assert!(!outcome.already_registered);

    let stats = svcs.registrations.hackaway_stats().await.unwrap();
    let stat = stats.iter().find(|s| s.problem_statement_no == 4).unwrap();
    assert_eq!(stat.count, 10);
    assert!(stat.is_full);

    // The next team is turned away
    let (_, members) = team_of_size(&pool, &svcs, "Late", 2).await;
    assert_kind(
        svcs.registrations.register_for_hackaway(members[0].id, 4).await,
        "ProblemStatementFull",
    );
}
