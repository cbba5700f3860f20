#![allow(dead_code)]

use fake::Fake;
use fake::faker::name::en::Name;
use sqlx::PgPool;
use uuid::Uuid;

use robosaga_api::database::models::{Team, User, UserRole};
use robosaga_api::database::repositories::{
    ContactRepository, EventRepository, TeamRepository, UserRepository,
};
use robosaga_api::error::AppError;
use robosaga_api::services::{IdentityService, RegistrationService, StatsService, TeamService};

pub struct TestServices {
    pub identity: IdentityService,
    pub teams: TeamService,
    pub registrations: RegistrationService,
    pub stats: StatsService,
    pub users: UserRepository,
    pub team_repo: TeamRepository,
    pub events: EventRepository,
    pub contact: ContactRepository,
}

pub fn services(pool: &PgPool) -> TestServices {
    TestServices {
        identity: IdentityService::new(UserRepository::new(pool.clone())),
        teams: TeamService::new(pool.clone()),
        registrations: RegistrationService::new(pool.clone()),
        stats: StatsService::new(pool.clone()),
        users: UserRepository::new(pool.clone()),
        team_repo: TeamRepository::new(pool.clone()),
        events: EventRepository::new(pool.clone()),
        contact: ContactRepository::new(pool.clone()),
    }
}

/// Insert a user row directly, the way the identity provider's first
/// sign-in would.
pub async fn create_user(pool: &PgPool, name: &str) -> User {
    let id = Uuid::new_v4();
    let email = format!(
        "{}.{}@bitmesra.ac.in",
        name.to_lowercase().replace(' ', "."),
        &id.to_string()[..8]
    );

    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, name, email)
        VALUES ($1, $2, $3)
        RETURNING id, name, email, image, role, roll_no, branch, phone_no, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(email)
    .fetch_one(pool)
    .await
    .expect("failed to insert test user")
}

pub async fn create_user_with_role(pool: &PgPool, name: &str, role: UserRole) -> User {
    let user = create_user(pool, name).await;
    sqlx::query("UPDATE users SET role = $1 WHERE id = $2")
        .bind(role)
        .bind(user.id)
        .execute(pool)
        .await
        .expect("failed to set test user role");
    User { role, ..user }
}

pub async fn random_user(pool: &PgPool) -> User {
    let name: String = Name().fake();
    create_user(pool, &name).await
}

/// Create a team through the real flow and grow it to `size` members by
/// filing and accepting join requests.
pub async fn team_of_size(
    pool: &PgPool,
    svcs: &TestServices,
    name: &str,
    size: usize,
) -> (Team, Vec<User>) {
    let leader = random_user(pool).await;
    let team = svcs
        .teams
        .create_team(leader.id, name)
        .await
        .expect("failed to create test team");

    let mut members = vec![leader.clone()];
    for _ in 1..size {
        let user = random_user(pool).await;
        svcs.teams
            .request_join(user.id, &team.slug)
            .await
            .expect("failed to file join request");
        let request = svcs
            .teams
            .list_user_join_requests(user.id)
            .await
            .expect("failed to list join requests")
            .into_iter()
            .next()
            .expect("join request missing");
        svcs.teams
            .accept_join_request(leader.id, request.id)
            .await
            .expect("failed to accept join request");
        members.push(user);
    }

    (team, members)
}

/// Bypass the size cap: insert a membership row directly. Used to build
/// states the enforcer would refuse, like a five-member team.
pub async fn add_member_directly(pool: &PgPool, team_id: Uuid, user_id: Uuid) {
    sqlx::query("INSERT INTO team_members (team_id, user_id, role) VALUES ($1, $2, 'member')")
        .bind(team_id)
        .bind(user_id)
        .execute(pool)
        .await
        .expect("failed to insert membership directly");
}

/// Seed a committed HackAway registration without going through the gate.
pub async fn seed_hackaway_registration(pool: &PgPool, team_id: Uuid, problem_statement_no: i32) {
    sqlx::query(
        "INSERT INTO hackaway_registrations (team_id, problem_statement_no) VALUES ($1, $2)",
    )
    .bind(team_id)
    .bind(problem_statement_no)
    .execute(pool)
    .await
    .expect("failed to seed hackaway registration");
}

/// A bare team row plus leader membership, inserted directly; cheaper than
/// the full flow when a test needs many teams.
pub async fn seed_team(pool: &PgPool, name: &str) -> (Team, User) {
    let leader = random_user(pool).await;
    let slug = format!("{}-{}", name.to_lowercase(), &Uuid::new_v4().to_string()[..6]);

    let team = sqlx::query_as::<_, Team>(
        r#"
        INSERT INTO teams (name, slug, leader_id)
        VALUES ($1, $2, $3)
        RETURNING id, name, slug, leader_id, score, created_at
        "#,
    )
    .bind(name)
    .bind(slug)
    .bind(leader.id)
    .fetch_one(pool)
    .await
    .expect("failed to seed team");

    sqlx::query("INSERT INTO team_members (team_id, user_id, role) VALUES ($1, $2, 'leader')")
        .bind(team.id)
        .bind(leader.id)
        .execute(pool)
        .await
        .expect("failed to seed leader membership");

    (team, leader)
}

pub fn test_config() -> robosaga_api::Config {
    robosaga_api::Config {
        database_url: String::new(),
        session_secret: "test-session-secret-that-is-long-enough".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        client_base_url: "http://localhost:3000".to_string(),
    }
}

/// Mint the session token the identity provider would hand the client.
pub fn auth_token(user: &User, config: &robosaga_api::Config) -> String {
    let claims = robosaga_api::services::Claims {
        sub: user.id,
        email: user.email.clone(),
        name: Some(user.name.clone()),
        picture: None,
        exp: (chrono::Utc::now() + chrono::Duration::days(1)).timestamp() as usize,
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(config.session_secret.as_ref()),
    )
    .expect("failed to encode test token")
}

pub fn assert_kind<T: std::fmt::Debug>(result: Result<T, AppError>, kind: &str) {
    match result {
        Err(e) => assert_eq!(e.kind(), kind, "unexpected error: {}", e),
        Ok(v) => panic!("expected {} error, got Ok({:?})", kind, v),
    }
}

/// The invariant the whole membership subsystem protects: no user appears
/// in more than one membership row, and every team has exactly one leader
/// who is also the team's `leader_id`.
pub async fn assert_membership_invariant(pool: &PgPool) {
    let duplicates: Vec<(Uuid, i64)> = sqlx::query_as(
        "SELECT user_id, COUNT(*) FROM team_members GROUP BY user_id HAVING COUNT(*) > 1",
    )
    .fetch_all(pool)
    .await
    .expect("failed to query memberships");
    assert!(
        duplicates.is_empty(),
        "users with more than one membership: {:?}",
        duplicates
    );

    let leaderless: Vec<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT t.id
        FROM teams t
        LEFT JOIN team_members tm
            ON tm.team_id = t.id AND tm.user_id = t.leader_id AND tm.role = 'leader'
        WHERE tm.id IS NULL
        "#,
    )
    .fetch_all(pool)
    .await
    .expect("failed to query leaders");
    assert!(leaderless.is_empty(), "teams without their leader: {:?}", leaderless);
}
