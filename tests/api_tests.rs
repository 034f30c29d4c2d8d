mod common;

use chrono::{TimeZone, Utc};
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

fn names(body: &Value) -> Vec<String> {
    body["projects"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect()
}

fn id_of(body: &Value) -> String {
    body["id"].as_str().unwrap().to_string()
}

// ── System ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let app = common::spawn_app().await;

    let (body, status) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn api_root_reports_running() {
    let app = common::spawn_app().await;

    let (body, status) = app.get("/api").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "NextFab API is running!");
}

#[tokio::test]
async fn security_headers_are_set() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
    assert_eq!(resp.headers()["x-frame-options"], "DENY");
}

// ── Projects ────────────────────────────────────────────────────

#[tokio::test]
async fn project_crud_lifecycle() {
    let app = common::spawn_app().await;
    let client = app.create_client("Targi Sp. z o.o.", "Poznań").await;
    let client_id = id_of(&client);

    let (created, status) = app
        .post(
            "/api/projects",
            &json!({
                "name": "Stoisko MTP",
                "project_number": "P-2025-001",
                "client_id": client_id,
                "modules": ["overview", "3d_model"],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "draft");
    assert_eq!(created["progress"], 0);
    assert_eq!(created["modules"], json!(["overview", "3d_model"]));
    let id = id_of(&created);

    let (body, status) = app
        .post(
            "/api/projects",
            &json!({ "name": "Copy", "project_number": "P-2025-001", "client_id": client_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Project number already exists");

    let (updated, status) = app
        .put(
            &format!("/api/projects/{id}"),
            &json!({ "status": "active", "progress": 40 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "active");
    assert_eq!(updated["progress"], 40);
    assert_eq!(updated["name"], "Stoisko MTP");
    assert_ne!(updated["updated_at"], created["updated_at"]);
    assert_eq!(updated["created_at"], created["created_at"]);

    let (fetched, status) = app.get(&format!("/api/projects/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["progress"], 40);

    assert_eq!(app.delete(&format!("/api/projects/{id}")).await, StatusCode::NO_CONTENT);

    let (body, status) = app.get(&format!("/api/projects/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Project not found");
    assert_eq!(app.delete(&format!("/api/projects/{id}")).await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_without_client_uses_earliest_client() {
    let app = common::spawn_app().await;
    let first = app.create_client("Pierwszy", "Gdańsk").await;
    app.create_client("Drugi", "Łódź").await;

    let (body, status) = app
        .post("/api/projects", &json!({ "name": "Bez klienta", "project_number": "P-1" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["client_id"], first["id"]);
}

#[tokio::test]
async fn create_without_any_client_is_rejected() {
    let app = common::spawn_app().await;

    let (body, status) = app
        .post("/api/projects", &json!({ "name": "Sierota", "project_number": "P-1" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No clients found. Please create a client first.");
}

#[tokio::test]
async fn create_with_unknown_client_is_a_validation_error() {
    let app = common::spawn_app().await;
    app.create_client("Istniejący", "Kraków").await;

    let (body, status) = app
        .post(
            "/api/projects",
            &json!({ "name": "X", "project_number": "P-1", "client_id": Uuid::now_v7() }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "client_id");
}

#[tokio::test]
async fn create_reports_every_invalid_field() {
    let app = common::spawn_app().await;
    app.create_client("Klient", "Kraków").await;

    let (body, status) = app
        .post("/api/projects", &json!({ "progress": 150 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["name", "progress", "project_number"]);
}

#[tokio::test]
async fn blank_name_and_number_are_rejected() {
    let app = common::spawn_app().await;
    let client_id = id_of(&app.create_client("Klient", "Kraków").await);

    let (body, status) = app
        .post(
            "/api/projects",
            &json!({ "name": "   ", "project_number": "  ", "client_id": client_id }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "name");
    assert_eq!(body["details"][1]["field"], "project_number");

    let project = app.create_project(&client_id, "Stoisko", "P-1", "draft").await;
    let id = id_of(&project);
    let (_, status) = app
        .put(&format!("/api/projects/{id}"), &json!({ "name": " " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (fetched, _) = app.get(&format!("/api/projects/{id}")).await;
    assert_eq!(fetched["name"], "Stoisko");
}

#[tokio::test]
async fn malformed_id_is_a_json_bad_request() {
    let app = common::spawn_app().await;

    for path in ["/api/projects/not-a-uuid", "/api/clients/123", "/api/materials/x"] {
        let (body, status) = app.get(path).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
        assert_eq!(body["error"], "Invalid id");
    }
    let (body, status) = app.put("/api/projects/nope", &json!({ "name": "X" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid id");
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/api/projects"))
        .header("content-type", "application/json")
        .body("{\"name\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["details"][0]["field"], "body");
}

#[tokio::test]
async fn conflicting_update_leaves_project_untouched() {
    let app = common::spawn_app().await;
    let client_id = id_of(&app.create_client("Klient", "Kraków").await);
    app.create_project(&client_id, "Pierwszy", "N-1", "active").await;
    let second = app.create_project(&client_id, "Drugi", "N-2", "active").await;
    let id = id_of(&second);

    let (_, status) = app
        .put(
            &format!("/api/projects/{id}"),
            &json!({ "name": "Zmieniony", "project_number": "N-1" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (fetched, _) = app.get(&format!("/api/projects/{id}")).await;
    assert_eq!(fetched["name"], "Drugi");
    assert_eq!(fetched["project_number"], "N-2");
    assert_eq!(fetched["updated_at"], second["updated_at"]);
}

#[tokio::test]
async fn update_of_missing_project_is_not_found() {
    let app = common::spawn_app().await;

    let (_, status) = app
        .put(&format!("/api/projects/{}", Uuid::now_v7()), &json!({ "name": "X" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Project listing ─────────────────────────────────────────────

#[tokio::test]
async fn list_filters_combine_as_conjunction() {
    let app = common::spawn_app().await;
    let c1 = id_of(&app.create_client("C1", "Warszawa").await);
    let c2 = id_of(&app.create_client("C2", "Kraków").await);
    app.create_project(&c1, "C1 active", "A-1", "active").await;
    app.create_project(&c1, "C1 draft", "A-2", "draft").await;
    app.create_project(&c2, "C2 active", "A-3", "active").await;

    let (body, status) = app
        .get(&format!("/api/projects?status=active&client={c1}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["C1 active"]);
    assert_eq!(body["pagination"]["total"], 1);

    let (body, _) = app
        .get(&format!("/api/projects?status=active&status=draft&client={c1}&client={c2}&sortBy=name&sortOrder=asc"))
        .await;
    assert_eq!(names(&body), vec!["C1 active", "C1 draft", "C2 active"]);
}

#[tokio::test]
async fn list_paginates_after_filtering() {
    let app = common::spawn_app().await;
    let client_id = id_of(&app.create_client("Klient", "Kraków").await);
    for (name, number, status) in [
        ("Alpha", "P-1", "active"),
        ("Bravo", "P-2", "draft"),
        ("Charlie", "P-3", "active"),
        ("Delta", "P-4", "draft"),
        ("Echo", "P-5", "active"),
        ("Foxtrot", "P-6", "archived"),
    ] {
        app.create_project(&client_id, name, number, status).await;
    }

    let query = "status=active&status=draft&sortBy=name&sortOrder=asc&limit=2";
    let (body, status) = app.get(&format!("/api/projects?{query}&page=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Alpha", "Bravo"]);
    assert_eq!(
        body["pagination"],
        json!({ "page": 1, "limit": 2, "total": 5, "pages": 3 })
    );

    let (body, _) = app.get(&format!("/api/projects?{query}&page=3")).await;
    assert_eq!(names(&body), vec!["Echo"]);

    let (body, _) = app.get(&format!("/api/projects?{query}&page=4")).await;
    assert!(names(&body).is_empty());
    assert_eq!(body["pagination"]["total"], 5);
}

#[tokio::test]
async fn list_items_carry_client_contact_and_location() {
    let app = common::spawn_app().await;
    let client = app.create_client("Expo Team", "Wrocław").await;
    app.create_project(&id_of(&client), "Stoisko", "P-1", "active").await;

    let (body, _) = app.get("/api/projects").await;
    let item = &body["projects"][0];
    assert_eq!(item["client"]["id"], client["id"]);
    assert_eq!(item["client"]["name"], "Expo Team");
    assert_eq!(item["client"]["email"], "office@example.com");
    assert_eq!(item["location"]["city"], "Wrocław");
    assert_eq!(item["location"]["postalCode"], "00-001");
    assert_eq!(item["location"]["country"], "Polska");
    assert_eq!(item["budget"], json!({ "planned": 0.0, "spent": 0.0, "remaining": 0.0 }));
}

#[tokio::test]
async fn list_filters_by_search_modules_and_city() {
    let app = common::spawn_app().await;
    let krakow = id_of(&app.create_client("K", "Kraków").await);
    let gdansk = id_of(&app.create_client("G", "Gdańsk").await);

    let (_, status) = app
        .post(
            "/api/projects",
            &json!({ "name": "Stoisko Targowe", "project_number": "S-1", "client_id": krakow, "modules": ["crew"] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    app.create_project(&gdansk, "Stoisko Morskie", "S-2", "active").await;
    app.create_project(&krakow, "Scena", "S-3", "active").await;

    let (body, _) = app.get("/api/projects?search=stoisko&sortBy=name&sortOrder=asc").await;
    assert_eq!(names(&body), vec!["Stoisko Morskie", "Stoisko Targowe"]);

    let (body, _) = app.get("/api/projects?search=s-3").await;
    assert_eq!(names(&body), vec!["Scena"]);

    let (body, _) = app.get("/api/projects?modules=crew&modules=files").await;
    assert_eq!(names(&body), vec!["Stoisko Targowe"]);

    let (body, _) = app
        .get("/api/projects?city=KRAK%C3%93W&radius=50&sortBy=name&sortOrder=asc")
        .await;
    assert_eq!(names(&body), vec!["Scena", "Stoisko Targowe"]);
}

#[tokio::test]
async fn list_filters_by_creation_date() {
    let app = common::spawn_app().await;
    let client_id = id_of(&app.create_client("Klient", "Kraków").await);
    let old = app.create_project(&client_id, "Stary", "D-1", "active").await;
    app.create_project(&client_id, "Nowy", "D-2", "active").await;

    let old_id: Uuid = id_of(&old).parse().unwrap();
    let backdated = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
    assert!(app.store.backdate_project(old_id, backdated));

    let (body, _) = app.get("/api/projects?endDate=2024-03-10").await;
    assert_eq!(names(&body), vec!["Stary"]);

    let (body, _) = app.get("/api/projects?startDate=2024-03-11").await;
    assert_eq!(names(&body), vec!["Nowy"]);
}

#[tokio::test]
async fn invalid_query_parameters_are_rejected() {
    let app = common::spawn_app().await;

    for query in ["page=abc", "status=bogus", "sortBy=price", "startDate=yesterday"] {
        let (body, status) = app.get(&format!("/api/projects?{query}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "query {query} accepted");
        assert_eq!(body["error"], "Validation failed");
    }
}

#[tokio::test]
async fn store_failure_is_an_internal_error() {
    let app = common::spawn_app().await;
    app.store.fail_next("connection reset");

    let (body, status) = app.get("/api/projects").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");

    let (_, status) = app.get("/api/projects").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn stats_count_every_status() {
    let app = common::spawn_app().await;
    let client_id = id_of(&app.create_client("Klient", "Kraków").await);
    app.create_project(&client_id, "A", "P-1", "active").await;
    app.create_project(&client_id, "B", "P-2", "active").await;
    app.create_project(&client_id, "C", "P-3", "archived").await;

    let (body, status) = app.get("/api/projects/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["by_status"]["active"], 2);
    assert_eq!(body["by_status"]["archived"], 1);
    assert_eq!(body["by_status"]["cancelled"], 0);
}

// ── Clients ─────────────────────────────────────────────────────

#[tokio::test]
async fn client_crud_and_contacts() {
    let app = common::spawn_app().await;

    let (created, status) = app
        .post(
            "/api/clients",
            &json!({
                "name": "Nowa Firma",
                "tax_id": "PL1234567890",
                "contacts": [
                    { "name": "Anna", "email": "anna@firma.pl" },
                    { "name": "Piotr", "email": "piotr@firma.pl", "position": "CEO" }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["contact_persons"].as_array().unwrap().len(), 2);
    assert_eq!(created["contact_persons"][0]["name"], "Anna");
    let id = id_of(&created);

    let (updated, status) = app
        .put(
            &format!("/api/clients/{id}"),
            &json!({ "contact_persons": [{ "name": "Ewa", "email": "ewa@firma.pl" }] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Nowa Firma");
    assert_eq!(updated["contact_persons"].as_array().unwrap().len(), 1);
    assert_eq!(updated["contact_persons"][0]["email"], "ewa@firma.pl");

    let (list, status) = app.get("/api/clients?search=nowa").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["pagination"]["total"], 1);
    assert_eq!(list["clients"][0]["id"], created["id"]);

    assert_eq!(app.delete(&format!("/api/clients/{id}")).await, StatusCode::NO_CONTENT);
    let (_, status) = app.get(&format!("/api/clients/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn client_contact_email_is_validated() {
    let app = common::spawn_app().await;

    let (body, status) = app
        .post(
            "/api/clients",
            &json!({ "name": "Firma", "contact_persons": [{ "name": "Jan", "email": "nie-email" }] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "contact_persons[0].email");
}

#[tokio::test]
async fn client_with_projects_cannot_be_deleted() {
    let app = common::spawn_app().await;
    let client_id = id_of(&app.create_client("Zajęty", "Kraków").await);
    let project = app.create_project(&client_id, "Projekt", "P-1", "active").await;

    let (_, status) = app.get(&format!("/api/clients/{client_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.delete(&format!("/api/clients/{client_id}")).await, StatusCode::CONFLICT);

    assert_eq!(
        app.delete(&format!("/api/projects/{}", id_of(&project))).await,
        StatusCode::NO_CONTENT
    );
    assert_eq!(app.delete(&format!("/api/clients/{client_id}")).await, StatusCode::NO_CONTENT);
}

// ── Materials ───────────────────────────────────────────────────

#[tokio::test]
async fn material_crud_and_low_stock_filter() {
    let app = common::spawn_app().await;

    let (mdf, status) = app
        .post(
            "/api/materials",
            &json!({
                "name": "Płyta MDF 18mm",
                "sku": "MDF-18",
                "category": ["płyty"],
                "unit": "sq-meter",
                "default_price": 42.5,
                "stock": 2,
                "min_stock": 5
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(mdf["price"], 42.5);
    assert_eq!(mdf["specification"], json!({}));

    let (_, status) = app
        .post(
            "/api/materials",
            &json!({ "name": "Śruby", "sku": "SCR-4", "unit": "piece", "stock": 500, "min_stock": 100 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (body, status) = app
        .post(
            "/api/materials",
            &json!({ "name": "Duplikat", "sku": "MDF-18", "unit": "piece" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "SKU already exists");

    let (low, status) = app.get("/api/materials?lowStock=true").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(low["pagination"]["total"], 1);
    assert_eq!(low["materials"][0]["sku"], "MDF-18");

    let id = id_of(&mdf);
    let (updated, status) = app
        .put(&format!("/api/materials/{id}"), &json!({ "stock": 20 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["stock"], 20.0);

    let (low, _) = app.get("/api/materials?lowStock=true").await;
    assert_eq!(low["pagination"]["total"], 0);

    assert_eq!(app.delete(&format!("/api/materials/{id}")).await, StatusCode::NO_CONTENT);
    let (_, status) = app.get(&format!("/api/materials/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn material_requires_unit_and_non_negative_stock() {
    let app = common::spawn_app().await;

    let (body, status) = app
        .post("/api/materials", &json!({ "name": "X", "sku": "X-1", "stock": -1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["stock", "unit"]);
}
