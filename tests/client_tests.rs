mod common;

use std::time::Duration;

use reqwest::StatusCode;
use uuid::Uuid;

use nextfab::client::cache::STALE_TIME;
use nextfab::client::{ApiClient, ApiError, FilterController, ProjectQueries, ProjectTab};
use nextfab::models::{MaterialUnit, ProjectStatus};
use nextfab::query::{MaterialFilter, ProjectFilter, ProjectSortField, SortOrder};
use nextfab::validation::{
    ContactRequest, CreateClientRequest, CreateMaterialRequest, CreateProjectRequest,
    UpdateProjectRequest,
};

async fn seed_client(api: &ApiClient, name: &str) -> Uuid {
    let req = CreateClientRequest {
        name: name.to_string(),
        contact_persons: vec![ContactRequest {
            name: "Marta".to_string(),
            email: "marta@example.com".to_string(),
            ..ContactRequest::default()
        }],
        ..CreateClientRequest::default()
    };
    api.create_client(&req).await.unwrap().client.id
}

fn project(name: &str, number: &str, client_id: Uuid, status: ProjectStatus) -> CreateProjectRequest {
    CreateProjectRequest {
        name: name.to_string(),
        project_number: number.to_string(),
        client_id: Some(client_id),
        status,
        ..CreateProjectRequest::default()
    }
}

#[tokio::test]
async fn api_client_round_trips_projects() {
    let app = common::spawn_app().await;
    let api = ApiClient::new(app.base_url()).unwrap();

    let health = api.health().await.unwrap();
    assert_eq!(health["status"], "OK");

    let client_id = seed_client(&api, "Targi").await;
    let created = api
        .create_project(&project("Stoisko", "P-1", client_id, ProjectStatus::Active))
        .await
        .unwrap();
    assert_eq!(created.client_id, client_id);

    let archived = api.archive_project(created.id).await.unwrap();
    assert_eq!(archived.status, ProjectStatus::Archived);
    let restored = api.unarchive_project(created.id).await.unwrap();
    assert_eq!(restored.status, ProjectStatus::Active);

    let page = api
        .list_projects(&ProjectTab::Current.default_filter())
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.projects[0].client.email, "marta@example.com");

    api.delete_project(created.id).await.unwrap();
    let err = api.get_project(created.id).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn api_client_surfaces_validation_details() {
    let app = common::spawn_app().await;
    let api = ApiClient::new(app.base_url()).unwrap();
    seed_client(&api, "Targi").await;

    let err = api
        .create_project(&CreateProjectRequest::default())
        .await
        .unwrap_err();
    match err {
        ApiError::Status {
            status,
            message,
            details,
        } => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(message, "Validation failed");
            let fields: Vec<_> = details.iter().map(|d| d.field.as_str()).collect();
            assert_eq!(fields, vec!["name", "project_number"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn api_client_lists_materials() {
    let app = common::spawn_app().await;
    let api = ApiClient::new(app.base_url()).unwrap();

    let req = CreateMaterialRequest {
        name: "Listwa".to_string(),
        sku: "LST-1".to_string(),
        unit: Some(MaterialUnit::Meter),
        stock: 1.0,
        min_stock: 10.0,
        ..CreateMaterialRequest::default()
    };
    let material = api.create_material(&req).await.unwrap();
    assert!(material.is_low_stock());

    let filter = MaterialFilter {
        low_stock: true,
        ..MaterialFilter::default()
    };
    let page = api.list_materials(&filter).await.unwrap();
    assert_eq!(page.materials.len(), 1);
    assert_eq!(page.materials[0].id, material.id);
}

#[tokio::test]
async fn cached_list_is_refetched_after_a_mutation() {
    let app = common::spawn_app().await;
    let api = ApiClient::new(app.base_url()).unwrap();
    let client_id = seed_client(&api, "Targi").await;
    let queries = ProjectQueries::new(api);
    let filter = ProjectTab::Current.default_filter();

    assert_eq!(queries.list(&filter).await.unwrap().pagination.total, 0);
    assert!(!queries.lists().is_stale(&filter));

    let created = queries
        .create(&project("Nowy", "P-1", client_id, ProjectStatus::Draft))
        .await
        .unwrap();
    assert!(queries.lists().is_stale(&filter));
    assert_eq!(queries.details().data(&created.id), Some(created.clone()));

    let page = queries.list(&filter).await.unwrap();
    assert_eq!(page.pagination.total, 1);

    let stats = queries.project_stats().await.unwrap();
    assert_eq!(stats.by_status[&ProjectStatus::Draft], 1);

    queries.archive(created.id).await.unwrap();
    assert!(queries.stats().is_stale(&()));
    assert_eq!(queries.list(&filter).await.unwrap().pagination.total, 0);
}

#[tokio::test]
async fn failed_optimistic_update_rolls_back() {
    let app = common::spawn_app().await;
    let api = ApiClient::new(app.base_url()).unwrap();
    let client_id = seed_client(&api, "Targi").await;
    let queries = ProjectQueries::new(api);

    queries
        .create(&project("Pierwszy", "P-1", client_id, ProjectStatus::Active))
        .await
        .unwrap();
    let second = queries
        .create(&project("Drugi", "P-2", client_id, ProjectStatus::Active))
        .await
        .unwrap();

    let conflicting = UpdateProjectRequest {
        name: Some("Zmiana".to_string()),
        project_number: Some("P-1".to_string()),
        ..UpdateProjectRequest::default()
    };
    let err = queries
        .update_optimistic(second.id, &conflicting)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::CONFLICT));

    let cached = queries.details().data(&second.id).unwrap();
    assert_eq!(cached.name, "Drugi");
    assert_eq!(cached.project_number, "P-2");
}

#[tokio::test]
async fn filter_controller_drives_list_queries() {
    let app = common::spawn_app().await;
    let api = ApiClient::new(app.base_url()).unwrap();
    let client_id = seed_client(&api, "Targi").await;
    for (name, number, status) in [
        ("Alpha", "P-1", ProjectStatus::Active),
        ("Bravo", "P-2", ProjectStatus::Paused),
        ("Charlie", "P-3", ProjectStatus::Archived),
    ] {
        api.create_project(&project(name, number, client_id, status))
            .await
            .unwrap();
    }

    let mut controller = FilterController::new(ProjectTab::Current);
    controller.set_sort(ProjectSortField::Name, SortOrder::Asc);
    let names = |page: nextfab::models::ProjectPage| {
        page.projects
            .into_iter()
            .map(|p| p.project.name)
            .collect::<Vec<_>>()
    };

    let page = api.list_projects(&controller.filter()).await.unwrap();
    assert_eq!(names(page), vec!["Alpha", "Bravo"]);

    controller.remove_status(ProjectStatus::Paused);
    let page = api.list_projects(&controller.filter()).await.unwrap();
    assert_eq!(names(page), vec!["Alpha"]);

    controller.switch_tab(ProjectTab::Archived);
    let page = api.list_projects(&controller.filter()).await.unwrap();
    assert_eq!(names(page), vec!["Charlie"]);
}

#[tokio::test]
async fn idle_list_queries_are_dropped() {
    let app = common::spawn_app().await;
    let api = ApiClient::new(app.base_url()).unwrap();
    let queries = ProjectQueries::with_times(api, STALE_TIME, Duration::from_millis(50));

    let first = ProjectTab::Current.default_filter();
    let second = ProjectFilter {
        search: Some("stoisko".to_string()),
        ..first.clone()
    };
    queries.list(&first).await.unwrap();
    assert_eq!(queries.lists().len(), 1);

    tokio::time::sleep(Duration::from_millis(100)).await;
    queries.list(&second).await.unwrap();
    assert_eq!(queries.lists().len(), 1);
    assert!(queries.lists().state(&first).is_none());
    assert!(queries.lists().data(&second).is_some());
}
