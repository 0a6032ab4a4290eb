use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, Cocktail, Ingredient};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder().method(method).uri(uri).body(String::new()).unwrap()
}

fn ingredient_form(name: &str, available: bool) -> Request<String> {
    let body = format!(
        "--B\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\n{name}\r\n\
         --B\r\nContent-Disposition: form-data; name=\"is_available\"\r\n\r\n{available}\r\n\
         --B\r\nContent-Disposition: form-data; name=\"image\"; filename=\"pic.png\"\r\n\
         Content-Type: image/png\r\n\r\nPNG\r\n--B--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/bar/ingredients/")
        .header(http::header::CONTENT_TYPE, "multipart/form-data; boundary=B")
        .body(body)
        .unwrap()
}

async fn create_ingredient(app: &Router, name: &str, available: bool) -> Ingredient {
    let resp = app.clone().oneshot(ingredient_form(name, available)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
}

// --- ingredients ---

#[tokio::test]
async fn list_ingredients_empty() {
    let resp = app().oneshot(empty_request("GET", "/bar/ingredients/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let ingredients: Vec<Ingredient> = body_json(resp).await;
    assert!(ingredients.is_empty());
}

#[tokio::test]
async fn missing_slash_redirects() {
    let resp = app().oneshot(empty_request("GET", "/bar/ingredients")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(resp.headers()[http::header::LOCATION], "/bar/ingredients/");
}

#[tokio::test]
async fn missing_slash_redirects_post_keeping_method() {
    let mut request = ingredient_form("Lime", true);
    *request.uri_mut() = "/bar/ingredients".parse().unwrap();
    let resp = app().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(resp.headers()[http::header::LOCATION], "/bar/ingredients/");
}

#[tokio::test]
async fn create_ingredient_from_multipart() {
    let app = app();
    let ingredient = create_ingredient(&app, "Lime", true).await;
    assert_eq!(ingredient.name, "Lime");
    assert!(ingredient.is_available);
    let image = ingredient.image.unwrap();
    assert!(image.starts_with("/media/ingredients/") && image.ends_with(".png"), "{image}");
}

#[tokio::test]
async fn duplicate_ingredient_returns_error_field() {
    let app = app();
    create_ingredient(&app, "Lime", true).await;
    let resp = app.oneshot(ingredient_form("lime", false)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body, json!({"error": "Ingredient already exists"}));
}

#[tokio::test]
async fn get_ingredient_not_found() {
    let resp = app().oneshot(empty_request("GET", "/bar/ingredients/9/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"], "Ingredient not found");
}

#[tokio::test]
async fn get_ingredient_bad_id_returns_400() {
    let resp = app().oneshot(empty_request("GET", "/bar/ingredients/abc/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_ingredient_partial() {
    let app = app();
    let created = create_ingredient(&app, "Mint", true).await;
    let uri = format!("/bar/ingredients/{}/", created.id);

    let resp = app
        .clone()
        .oneshot(json_request("PUT", &uri, r#"{"is_available":false}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Ingredient = body_json(resp).await;
    assert_eq!(updated.name, "Mint");
    assert!(!updated.is_available);
}

#[tokio::test]
async fn delete_ingredient_returns_204() {
    let app = app();
    let created = create_ingredient(&app, "Sugar", true).await;
    let uri = format!("/bar/ingredients/{}/", created.id);

    let resp = app.clone().oneshot(empty_request("DELETE", &uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = app.oneshot(empty_request("GET", &uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_ingredient_in_use_is_logic_failure() {
    let app = app();
    let rum = create_ingredient(&app, "Rum", true).await;
    let body = json!({"name": "Daiquiri", "ingredients": [rum.id]}).to_string();
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/bar/cocktails/", &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
        .oneshot(empty_request("DELETE", &format!("/bar/ingredients/{}/", rum.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body, json!({"success": false, "error": "in use"}));
}

// --- cocktails ---

#[tokio::test]
async fn cocktails_use_success_envelope() {
    let app = app();
    let gin = create_ingredient(&app, "Gin", true).await;
    let tonic = create_ingredient(&app, "Tonic", false).await;
    let body = json!({"name": "G&T", "ingredients": [gin.id, tonic.id]}).to_string();

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/bar/cocktails/", &body))
        .await
        .unwrap();
    let created: Value = body_json(resp).await;
    assert_eq!(created["success"], true);
    let cocktail: Cocktail = serde_json::from_value(created["data"].clone()).unwrap();
    assert_eq!(cocktail.ingredients, vec![gin.id, tonic.id]);

    let resp = app.clone().oneshot(empty_request("GET", "/bar/cocktails/")).await.unwrap();
    let list: Value = body_json(resp).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);

    let uri = format!("/bar/cocktails/{}/availability/", cocktail.id);
    let resp = app.oneshot(empty_request("GET", &uri)).await.unwrap();
    let availability: Value = body_json(resp).await;
    assert_eq!(availability, json!({"success": true, "data": {"available": false}}));
}

#[tokio::test]
async fn create_cocktail_unknown_ingredient() {
    let resp = app()
        .oneshot(json_request("POST", "/bar/cocktails/", r#"{"name":"Ghost","ingredients":[42]}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"], "unknown ingredient 42");
}

#[tokio::test]
async fn delete_cocktail_not_found() {
    let resp = app().oneshot(empty_request("DELETE", "/bar/cocktails/5/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- echo ---

#[tokio::test]
async fn echo_reflects_request() {
    let resp = app()
        .oneshot(json_request("PATCH", "/echo", r#"{"a":1}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["method"], "PATCH");
    assert_eq!(body["data"]["headers"]["content-type"], "application/json");
    assert_eq!(body["data"]["body"], r#"{"a":1}"#);
}
