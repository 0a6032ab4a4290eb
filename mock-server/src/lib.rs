use std::{collections::BTreeMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Multipart, Path, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{any, delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: u32,
    pub name: String,
    pub is_available: bool,
    pub image: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cocktail {
    pub id: u32,
    pub name: String,
    pub ingredients: Vec<u32>,
}

#[derive(Deserialize)]
pub struct UpdateIngredient {
    pub name: Option<String>,
    pub is_available: Option<bool>,
}

#[derive(Deserialize)]
pub struct CreateCocktail {
    pub name: String,
    #[serde(default)]
    pub ingredients: Vec<u32>,
}

#[derive(Debug, Default)]
pub struct Bar {
    ingredients: BTreeMap<u32, Ingredient>,
    cocktails: BTreeMap<u32, Cocktail>,
    next_id: u32,
}

impl Bar {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn name_taken(&self, name: &str, except: Option<u32>) -> bool {
        self.ingredients
            .values()
            .any(|i| Some(i.id) != except && i.name.eq_ignore_ascii_case(name))
    }
}

pub type Db = Arc<RwLock<Bar>>;

/// Failure body in the server's convention: `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{what} not found"))
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

fn envelope(data: impl Serialize) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Bar::default()));
    Router::new()
        .route("/bar/ingredients", get(to_ingredients).post(to_ingredients))
        .route("/bar/ingredients/", get(list_ingredients).post(create_ingredient))
        .route(
            "/bar/ingredients/{id}/",
            get(get_ingredient).put(update_ingredient).delete(delete_ingredient),
        )
        .route("/bar/cocktails/", get(list_cocktails).post(create_cocktail))
        .route("/bar/cocktails/{id}/", delete(delete_cocktail))
        .route("/bar/cocktails/{id}/availability/", get(cocktail_availability))
        .route("/echo", any(echo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Django-style append-slash. 308 keeps the method and body.
async fn to_ingredients() -> Redirect {
    Redirect::permanent("/bar/ingredients/")
}

async fn list_ingredients(State(db): State<Db>) -> Json<Vec<Ingredient>> {
    let bar = db.read().await;
    Json(bar.ingredients.values().cloned().collect())
}

async fn create_ingredient(
    State(db): State<Db>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Ingredient>), ApiError> {
    let mut name = None;
    let mut is_available = false;
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => {
                name = Some(field.text().await.map_err(|e| ApiError::bad_request(e.body_text()))?);
            }
            "is_available" => {
                let text = field.text().await.map_err(|e| ApiError::bad_request(e.body_text()))?;
                is_available = text == "true";
            }
            "image" => {
                let ext = field
                    .file_name()
                    .and_then(|f| f.rsplit_once('.'))
                    .map(|(_, ext)| ext.to_string())
                    .unwrap_or_else(|| "bin".to_string());
                let bytes = field.bytes().await.map_err(|e| ApiError::bad_request(e.body_text()))?;
                if !bytes.is_empty() {
                    image = Some(format!("/media/ingredients/{}.{ext}", Uuid::new_v4()));
                }
            }
            _ => {}
        }
    }

    let name = name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("name is required"))?;

    let mut bar = db.write().await;
    if bar.name_taken(&name, None) {
        return Err(ApiError::bad_request("Ingredient already exists"));
    }
    let ingredient = Ingredient {
        id: bar.next_id(),
        name,
        is_available,
        image,
    };
    log::debug!("created ingredient {} ({})", ingredient.id, ingredient.name);
    bar.ingredients.insert(ingredient.id, ingredient.clone());
    Ok((StatusCode::CREATED, Json(ingredient)))
}

async fn get_ingredient(State(db): State<Db>, Path(id): Path<u32>) -> Result<Json<Ingredient>, ApiError> {
    let bar = db.read().await;
    bar.ingredients
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Ingredient"))
}

async fn update_ingredient(
    State(db): State<Db>,
    Path(id): Path<u32>,
    Json(input): Json<UpdateIngredient>,
) -> Result<Json<Ingredient>, ApiError> {
    let mut bar = db.write().await;
    if !bar.ingredients.contains_key(&id) {
        return Err(ApiError::not_found("Ingredient"));
    }
    if let Some(name) = &input.name {
        if bar.name_taken(name, Some(id)) {
            return Err(ApiError::bad_request("Ingredient already exists"));
        }
    }
    let ingredient = bar
        .ingredients
        .get_mut(&id)
        .ok_or_else(|| ApiError::not_found("Ingredient"))?;
    if let Some(name) = input.name {
        ingredient.name = name;
    }
    if let Some(is_available) = input.is_available {
        ingredient.is_available = is_available;
    }
    Ok(Json(ingredient.clone()))
}

async fn delete_ingredient(State(db): State<Db>, Path(id): Path<u32>) -> Result<Response, ApiError> {
    let mut bar = db.write().await;
    if !bar.ingredients.contains_key(&id) {
        return Err(ApiError::not_found("Ingredient"));
    }
    // The application reports a still-referenced ingredient as a logical
    // failure on a 200, not as an HTTP error.
    if bar.cocktails.values().any(|c| c.ingredients.contains(&id)) {
        return Ok(Json(json!({ "success": false, "error": "in use" })).into_response());
    }
    bar.ingredients.remove(&id);
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn list_cocktails(State(db): State<Db>) -> Json<Value> {
    let bar = db.read().await;
    envelope(bar.cocktails.values().cloned().collect::<Vec<_>>())
}

async fn create_cocktail(
    State(db): State<Db>,
    Json(input): Json<CreateCocktail>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut bar = db.write().await;
    if let Some(missing) = input.ingredients.iter().find(|id| !bar.ingredients.contains_key(*id)) {
        return Err(ApiError::bad_request(format!("unknown ingredient {missing}")));
    }
    let cocktail = Cocktail {
        id: bar.next_id(),
        name: input.name,
        ingredients: input.ingredients,
    };
    bar.cocktails.insert(cocktail.id, cocktail.clone());
    Ok((StatusCode::CREATED, envelope(cocktail)))
}

async fn delete_cocktail(State(db): State<Db>, Path(id): Path<u32>) -> Result<StatusCode, ApiError> {
    let mut bar = db.write().await;
    bar.cocktails
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| ApiError::not_found("Cocktail"))
}

async fn cocktail_availability(State(db): State<Db>, Path(id): Path<u32>) -> Result<Json<Value>, ApiError> {
    let bar = db.read().await;
    let cocktail = bar.cocktails.get(&id).ok_or_else(|| ApiError::not_found("Cocktail"))?;
    let available = cocktail
        .ingredients
        .iter()
        .all(|i| bar.ingredients.get(i).is_some_and(|i| i.is_available));
    Ok(envelope(json!({ "available": available })))
}

/// Describe the request as received, under the success envelope.
async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let headers: BTreeMap<String, String> = headers
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
        .collect();
    envelope(json!({
        "method": method.as_str(),
        "headers": headers,
        "body": String::from_utf8_lossy(&body),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingredient_serializes_to_json() {
        let ingredient = Ingredient {
            id: 1,
            name: "Lime".to_string(),
            is_available: true,
            image: None,
        };
        let json = serde_json::to_value(&ingredient).unwrap();
        assert_eq!(json, json!({"id": 1, "name": "Lime", "is_available": true, "image": null}));
    }

    #[test]
    fn create_cocktail_defaults_ingredients() {
        let input: CreateCocktail = serde_json::from_str(r#"{"name":"Water"}"#).unwrap();
        assert_eq!(input.name, "Water");
        assert!(input.ingredients.is_empty());
    }

    #[test]
    fn create_cocktail_rejects_missing_name() {
        let result: Result<CreateCocktail, _> = serde_json::from_str(r#"{"ingredients":[1]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn update_ingredient_all_fields_optional() {
        let input: UpdateIngredient = serde_json::from_str("{}").unwrap();
        assert!(input.name.is_none());
        assert!(input.is_available.is_none());
    }

    #[test]
    fn names_compare_case_insensitively() {
        let mut bar = Bar::default();
        let id = bar.next_id();
        bar.ingredients.insert(
            id,
            Ingredient {
                id,
                name: "Lime".to_string(),
                is_available: true,
                image: None,
            },
        );
        assert!(bar.name_taken("lime", None));
        assert!(!bar.name_taken("lime", Some(id)));
        assert!(!bar.name_taken("mint", None));
    }

    #[test]
    fn error_body_follows_convention() {
        let response = ApiError::not_found("Cocktail").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
