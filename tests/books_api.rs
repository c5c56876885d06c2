use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use shelf_app::bootstrap::App;
use shelf_kernel::settings::{Backend, Settings};
use tower::ServiceExt;

async fn app() -> Router {
    App::init(Settings::default()).await.unwrap().router()
}

/// Same router over an embedded SurrealDB, with migrations applied.
async fn surreal_app() -> Router {
    let mut settings = Settings::default();
    settings.database.backend = Backend::Surreal;
    settings.database.endpoint = "mem://".to_string();
    App::init(settings).await.unwrap().router()
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    };
    router.clone().oneshot(request.unwrap()).await.unwrap()
}

async fn text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn json_body(response: Response) -> Value {
    serde_json::from_str(&text(response).await).unwrap()
}

async fn create(router: &Router, book: Value) -> Value {
    let response = send(router, Method::POST, "/books", Some(book)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await
}

async fn list(router: &Router, query: &str) -> Value {
    let response = send(router, Method::GET, &format!("/books{query}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    json_body(response).await
}

fn ids(page: &Value) -> Vec<&str> {
    page["books"]
        .as_array()
        .unwrap()
        .iter()
        .map(|book| book["id"].as_str().unwrap())
        .collect()
}

async fn create_update_delete_then_search(router: Router) {
    let created = create(
        &router,
        json!({"bookId": "B1", "bookName": "Dune", "authorName": "Herbert", "publishedYear": 1965, "price": 15}),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());
    assert_eq!(created["status"], 1);
    assert_eq!(created["bookName"], "Dune");

    let response = send(&router, Method::PUT, &format!("/books/{id}"), Some(json!({"price": 20}))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["price"].as_f64(), Some(20.0));
    assert_eq!(updated["authorName"], "Herbert");
    assert_eq!(updated["status"], 1);

    let response = send(&router, Method::DELETE, &format!("/books/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let deleted = json_body(response).await;
    assert_eq!(deleted["status"], 0);
    assert_eq!(deleted["id"], id.as_str());

    let page = list(&router, "?search=Dune").await;
    assert!(page["books"].as_array().unwrap().is_empty());
    assert_eq!(page["totalPages"], 0);
}

async fn unknown_id_is_plain_text_not_found(router: Router) {
    let response = send(&router, Method::PUT, "/books/missing", Some(json!({"price": 1}))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(text(response).await, "Book not found");

    let response = send(&router, Method::DELETE, "/books/missing", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(text(response).await, "Book not found");
}

async fn pages_split_the_active_set(router: Router) {
    for i in 0..12 {
        create(&router, json!({"bookName": format!("Volume {i}")})).await;
    }

    let first = list(&router, "").await;
    assert_eq!(first["totalPages"], 2);
    assert_eq!(first["currentPage"], 1);
    assert_eq!(ids(&first).len(), 10);

    let second = list(&router, "?page=2").await;
    assert_eq!(second["currentPage"], "2");
    assert_eq!(ids(&second).len(), 2);

    let small = list(&router, "?page=2&limit=5").await;
    assert_eq!(small["totalPages"], 3);
    assert_eq!(ids(&small).len(), 5);

    let beyond = list(&router, "?page=7&limit=5").await;
    assert_eq!(beyond["totalPages"], 3);
    assert_eq!(beyond["currentPage"], "7");
    assert!(ids(&beyond).is_empty());

    let far = list(&router, "?page=999999999999").await;
    assert_eq!(far["totalPages"], 2);
    assert_eq!(far["currentPage"], "999999999999");
    assert!(ids(&far).is_empty());

    let wide = list(&router, "?limit=5000000000").await;
    assert_eq!(wide["totalPages"], 1);
    assert_eq!(ids(&wide).len(), 12);

    let decimal = list(&router, "?page=2.0&limit=5").await;
    assert_eq!(decimal["currentPage"], "2.0");
    assert_eq!(ids(&decimal), ids(&small));
}

async fn search_matches_name_author_or_year(router: Router) {
    let dune = create(
        &router,
        json!({"bookName": "Dune", "authorName": "Frank Herbert", "publishedYear": 1965}),
    )
    .await;
    create(
        &router,
        json!({"bookName": "Foundation", "authorName": "Isaac Asimov", "publishedYear": 1951}),
    )
    .await;
    let dune_id = dune["id"].as_str().unwrap();

    assert_eq!(ids(&list(&router, "?search=dune").await), vec![dune_id]);
    assert_eq!(ids(&list(&router, "?search=HERBERT").await), vec![dune_id]);
    assert_eq!(ids(&list(&router, "?search=1965").await), vec![dune_id]);
    assert!(ids(&list(&router, "?search=xyz").await).is_empty());
    assert_eq!(ids(&list(&router, "?search=").await).len(), 2);
}

async fn cast_failure_is_a_storage_error(router: Router) {
    let response = send(&router, Method::POST, "/books", Some(json!({"publishedYear": "soon"}))).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "storage_error");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("publishedYear"));
    assert!(body["error"]["trace_id"].is_string());

    let page = list(&router, "").await;
    assert!(ids(&page).is_empty());
}

#[tokio::test]
async fn non_object_body_is_rejected() {
    let router = app().await;

    let response = send(&router, Method::POST, "/books", Some(json!([1, 2]))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_and_request_id() {
    let router = app().await;

    let response = send(&router, Method::GET, "/healthz", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(text(response).await, "ok");
}

#[tokio::test]
async fn create_update_delete_then_search_in_memory() {
    create_update_delete_then_search(app().await).await;
}

#[tokio::test]
async fn create_update_delete_then_search_on_surreal() {
    create_update_delete_then_search(surreal_app().await).await;
}

#[tokio::test]
async fn unknown_id_is_plain_text_not_found_in_memory() {
    unknown_id_is_plain_text_not_found(app().await).await;
}

#[tokio::test]
async fn unknown_id_is_plain_text_not_found_on_surreal() {
    unknown_id_is_plain_text_not_found(surreal_app().await).await;
}

#[tokio::test]
async fn pages_split_the_active_set_in_memory() {
    pages_split_the_active_set(app().await).await;
}

#[tokio::test]
async fn pages_split_the_active_set_on_surreal() {
    pages_split_the_active_set(surreal_app().await).await;
}

#[tokio::test]
async fn search_matches_name_author_or_year_in_memory() {
    search_matches_name_author_or_year(app().await).await;
}

#[tokio::test]
async fn search_matches_name_author_or_year_on_surreal() {
    search_matches_name_author_or_year(surreal_app().await).await;
}

#[tokio::test]
async fn cast_failure_is_a_storage_error_in_memory() {
    cast_failure_is_a_storage_error(app().await).await;
}

#[tokio::test]
async fn cast_failure_is_a_storage_error_on_surreal() {
    cast_failure_is_a_storage_error(surreal_app().await).await;
}
