// tests/listing_tests.rs

use kasi_rentals::{config::Config, routes, state::AppState};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

/// Spawns the app on a random port backed by an in-memory SQLite database.
/// Returns the base URL and the pool (for seeding).
async fn spawn_app() -> (String, SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_email: None,
        admin_password: None,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool)
}

/// Registers a user with the given role and returns (token, user id).
async fn register_and_login(
    client: &reqwest::Client,
    address: &str,
    role: &str,
) -> (String, i64) {
    let email = format!("u_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8]);
    let password = "password123";

    client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "name": "Test User",
            "email": email,
            "password": password,
            "role": role
        }))
        .send()
        .await
        .expect("Register failed");

    let login: serde_json::Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");

    (
        login["token"].as_str().expect("Token not found").to_string(),
        login["user"]["id"].as_i64().expect("User id not found"),
    )
}

async fn seed_region(pool: &SqlitePool, name: &str, township: &str, province: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO regions (name, township, city, province) \
         VALUES (?, ?, 'Johannesburg', ?) RETURNING id",
    )
    .bind(name)
    .bind(township)
    .bind(province)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Creates a listing through the API and returns its id.
async fn create_listing(
    client: &reqwest::Client,
    address: &str,
    token: &str,
    region: i64,
    price: i64,
    amenities: &[&str],
) -> i64 {
    let body: serde_json::Value = client
        .post(format!("{}/api/listings", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "title": "Room to rent",
            "description": "A tidy room",
            "price": price,
            "type": "room",
            "category": "rent",
            "region": region,
            "amenities": amenities
        }))
        .send()
        .await
        .expect("Create listing failed")
        .json()
        .await
        .expect("Failed to parse create listing json");

    body["listing"]["id"].as_i64().expect("Listing id not found")
}

#[tokio::test]
async fn amenity_filter_uses_intersection_semantics() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _) = register_and_login(&client, &address, "landlord").await;
    let region = seed_region(&pool, "Soweto Central", "Soweto", "Gauteng").await;

    create_listing(&client, &address, &token, region, 1000, &["wifi"]).await;
    create_listing(&client, &address, &token, region, 1200, &["wifi", "water"]).await;
    create_listing(&client, &address, &token, region, 1400, &["electricity"]).await;
    create_listing(&client, &address, &token, region, 1600, &[]).await;
    create_listing(&client, &address, &token, region, 1800, &["security"]).await;

    let body: serde_json::Value = client
        .get(format!("{}/api/listings?amenities=wifi", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 2);
    assert_eq!(body["listings"].as_array().unwrap().len(), 2);

    // One listed amenity in common is enough; a full superset is not required.
    let body: serde_json::Value = client
        .get(format!("{}/api/listings?amenities=water,parking", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 1);

    // Unknown tokens are not an error, they just match nothing.
    let body: serde_json::Value = client
        .get(format!("{}/api/listings?amenities=helipad", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn township_filter_matches_case_insensitively() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _) = register_and_login(&client, &address, "landlord").await;
    let soweto = seed_region(&pool, "Soweto Central", "Soweto", "Gauteng").await;
    let tembisa = seed_region(&pool, "Tembisa East", "Tembisa", "Gauteng").await;

    create_listing(&client, &address, &token, soweto, 1000, &[]).await;
    create_listing(&client, &address, &token, soweto, 1200, &[]).await;
    create_listing(&client, &address, &token, tembisa, 1400, &[]).await;

    let body: serde_json::Value = client
        .get(format!("{}/api/listings?township=sOwEtO", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 2);
    for listing in body["listings"].as_array().unwrap() {
        assert_eq!(listing["region"]["township"], "Soweto");
    }
}

#[tokio::test]
async fn unknown_township_short_circuits_to_empty_page() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _) = register_and_login(&client, &address, "landlord").await;
    let region = seed_region(&pool, "Soweto Central", "Soweto", "Gauteng").await;
    create_listing(&client, &address, &token, region, 1000, &[]).await;

    let body: serde_json::Value = client
        .get(format!("{}/api/listings?township=nowhereville&page=3", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["listings"].as_array().unwrap().len(), 0);
    assert_eq!(body["total"], 0);
    assert_eq!(body["totalPages"], 0);
    assert_eq!(body["currentPage"], 3);
}

#[tokio::test]
async fn township_substring_policy_and_precedence_over_region() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _) = register_and_login(&client, &address, "landlord").await;
    let soweto = seed_region(&pool, "Soweto Central", "Soweto", "Gauteng").await;
    let sowetoville = seed_region(&pool, "Sowetoville Ext", "Sowetoville", "Gauteng").await;
    let tembisa = seed_region(&pool, "Tembisa East", "Tembisa", "Gauteng").await;

    create_listing(&client, &address, &token, soweto, 1000, &[]).await;
    create_listing(&client, &address, &token, sowetoville, 1200, &[]).await;
    create_listing(&client, &address, &token, tembisa, 1400, &[]).await;

    // Substring policy: "Soweto" also matches "Sowetoville".
    let body: serde_json::Value = client
        .get(format!("{}/api/listings?township=Soweto", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 2);

    // When both region and township are supplied, township wins.
    let body: serde_json::Value = client
        .get(format!(
            "{}/api/listings?region={}&township=Tembisa",
            address, soweto
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["listings"][0]["region"]["township"], "Tembisa");
}

#[tokio::test]
async fn pagination_envelope_is_consistent() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _) = register_and_login(&client, &address, "landlord").await;
    let region = seed_region(&pool, "Soweto Central", "Soweto", "Gauteng").await;

    for i in 0..5 {
        create_listing(&client, &address, &token, region, 1000 + i * 100, &[]).await;
    }

    let body: serde_json::Value = client
        .get(format!("{}/api/listings?limit=2", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 5);
    assert_eq!(body["totalPages"], 3);
    assert_eq!(body["currentPage"], 1);
    assert_eq!(body["listings"].as_array().unwrap().len(), 2);

    let body: serde_json::Value = client
        .get(format!("{}/api/listings?limit=2&page=3", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["listings"].as_array().unwrap().len(), 1);

    // A page beyond the last returns an empty list with the true total.
    let body: serde_json::Value = client
        .get(format!("{}/api/listings?limit=2&page=4", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["listings"].as_array().unwrap().len(), 0);
    assert_eq!(body["total"], 5);
    assert_eq!(body["totalPages"], 3);
    assert_eq!(body["currentPage"], 4);
}

#[tokio::test]
async fn price_range_filter() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _) = register_and_login(&client, &address, "landlord").await;
    let region = seed_region(&pool, "Soweto Central", "Soweto", "Gauteng").await;

    create_listing(&client, &address, &token, region, 1000, &[]).await;
    create_listing(&client, &address, &token, region, 2000, &[]).await;
    create_listing(&client, &address, &token, region, 3000, &[]).await;

    let body: serde_json::Value = client
        .get(format!(
            "{}/api/listings?minPrice=1500&maxPrice=2500",
            address
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["listings"][0]["price"], 2000);

    // Half-open range: only the lower bound given.
    let body: serde_json::Value = client
        .get(format!("{}/api/listings?minPrice=2000", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn malformed_numeric_params_are_rejected() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    for query in ["minPrice=cheap", "maxPrice=1e3x", "page=first", "limit=-2"] {
        let response = client
            .get(format!("{}/api/listings?{}", address, query))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400, "query: {}", query);
    }
}

#[tokio::test]
async fn huge_page_number_is_served_as_an_empty_page() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _) = register_and_login(&client, &address, "landlord").await;
    let region = seed_region(&pool, "Soweto Central", "Soweto", "Gauteng").await;
    create_listing(&client, &address, &token, region, 1000, &[]).await;

    // i64::MAX as a page number must not blow up the OFFSET arithmetic.
    let response = client
        .get(format!(
            "{}/api/listings?page=9223372036854775807",
            address
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["listings"].as_array().unwrap().len(), 0);
    assert_eq!(body["total"], 1);
    assert_eq!(body["totalPages"], 1);
}

#[tokio::test]
async fn township_wildcards_match_literally() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _) = register_and_login(&client, &address, "landlord").await;
    let region = seed_region(&pool, "Soweto Central", "Soweto", "Gauteng").await;
    create_listing(&client, &address, &token, region, 1000, &[]).await;

    // '%' and '_' are data, not wildcards; neither township contains them.
    for query in ["township=%25", "township=_oweto"] {
        let body: serde_json::Value = client
            .get(format!("{}/api/listings?{}", address, query))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["total"], 0, "query: {}", query);
    }
}

#[tokio::test]
async fn owner_is_forced_from_token() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, landlord_id) = register_and_login(&client, &address, "landlord").await;
    let region = seed_region(&pool, "Soweto Central", "Soweto", "Gauteng").await;

    let body: serde_json::Value = client
        .post(format!("{}/api/listings", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "title": "Flat to rent",
            "description": "Two bedroom flat",
            "price": 4500,
            "type": "flat",
            "region": region,
            "owner": 999999
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["listing"]["owner"]["id"], landlord_id);
}

#[tokio::test]
async fn views_increment_once_per_detail_read() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _) = register_and_login(&client, &address, "landlord").await;
    let region = seed_region(&pool, "Soweto Central", "Soweto", "Gauteng").await;
    let id = create_listing(&client, &address, &token, region, 1000, &[]).await;

    let mut last = serde_json::Value::Null;
    for _ in 0..3 {
        last = client
            .get(format!("{}/api/listings/{}", address, id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
    }
    assert_eq!(last["listing"]["views"], 3);
}

#[tokio::test]
async fn create_listing_requires_landlord_role() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (tenant_token, _) = register_and_login(&client, &address, "tenant").await;
    let region = seed_region(&pool, "Soweto Central", "Soweto", "Gauteng").await;

    let payload = serde_json::json!({
        "title": "Room",
        "description": "Room",
        "price": 900,
        "type": "room",
        "region": region
    });

    let response = client
        .post(format!("{}/api/listings", address))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .post(format!("{}/api/listings", address))
        .header("Authorization", format!("Bearer {}", tenant_token))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn get_unknown_listing_is_404() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/listings/424242", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Listing not found");
}
