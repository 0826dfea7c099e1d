//! HTTP surface of the menu: routes, payloads and error rendering.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Path, Request, State};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::authorization::{Authorizer, Claims};
use crate::drinks::{Drink, DrinkPatch, DrinkStore, Ingredient, NewDrink, ShortDrink, StoreError};
use crate::error::error_response;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("bad request")]
    BadRequest,
    #[error("resource not found")]
    NotFound,
    #[error("unprocessable")]
    Unprocessable,
    #[error("check your data, some unique constraints are violated")]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest | ApiError::Store(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Store(error) = &self {
            tracing::debug!(%error, "store rejected write");
        }
        error_response(self.status_code(), &self.to_string())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DrinkStore>,
}

/// Builds the menu API. Reads are public, everything showing recipes or changing the menu needs a permission.
pub fn router(store: Arc<dyn DrinkStore>, authorizer: &Authorizer) -> Router {
    Router::new()
        .route(
            "/drinks",
            get(list_drinks).merge(post(create_drink).route_layer(authorizer.require("post:drinks"))),
        )
        .route(
            "/drinks-detail",
            get(drinks_detail).route_layer(authorizer.require("get:drinks-detail")),
        )
        .route(
            "/drinks/{id}",
            patch(update_drink)
                .route_layer(authorizer.require("patch:drinks"))
                .merge(delete(delete_drink).route_layer(authorizer.require("delete:drinks"))),
        )
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { store })
}

#[derive(Debug, Serialize)]
struct DrinksResponse<T> {
    success: bool,
    drinks: Vec<T>,
}

impl<T> DrinksResponse<T> {
    fn new(drinks: Vec<T>) -> Self {
        Self {
            success: true,
            drinks,
        }
    }
}

#[derive(Debug, Serialize)]
struct DeleteResponse {
    success: bool,
    delete: u64,
}

/// Clients send either a single ingredient or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Recipe {
    One(Ingredient),
    Many(Vec<Ingredient>),
}

impl Recipe {
    fn validate(self) -> ApiResult<Vec<Ingredient>> {
        let ingredients = match self {
            Recipe::One(ingredient) => vec![ingredient],
            Recipe::Many(ingredients) => ingredients,
        };
        if ingredients.is_empty() {
            return Err(ApiError::Unprocessable);
        }
        Ok(ingredients)
    }
}

fn validate_title(title: String) -> ApiResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ApiError::Unprocessable);
    }
    Ok(title.to_string())
}

#[derive(Debug, Deserialize)]
struct CreateDrinkRequest {
    title: String,
    recipe: Recipe,
}

impl CreateDrinkRequest {
    fn validate(self) -> ApiResult<NewDrink> {
        Ok(NewDrink {
            title: validate_title(self.title)?,
            recipe: self.recipe.validate()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct UpdateDrinkRequest {
    title: Option<String>,
    recipe: Option<Recipe>,
}

impl UpdateDrinkRequest {
    fn validate(self) -> ApiResult<DrinkPatch> {
        Ok(DrinkPatch {
            title: self.title.map(validate_title).transpose()?,
            recipe: self.recipe.map(Recipe::validate).transpose()?,
        })
    }
}

/// JSON body whose rejections render like every other API error.
struct JsonBody<T>(T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(JsonRejection::JsonDataError(rejection)) => {
                tracing::debug!(%rejection, "unexpected request body");
                Err(ApiError::Unprocessable)
            }
            Err(rejection) => {
                tracing::debug!(%rejection, "unreadable request body");
                Err(ApiError::BadRequest)
            }
        }
    }
}

/// Numeric drink id from the path; anything else does not name a drink.
struct DrinkId(u64);

impl<S> FromRequestParts<S> for DrinkId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<u64>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::NotFound)?;
        Ok(DrinkId(id))
    }
}

async fn list_drinks(State(state): State<AppState>) -> ApiResult<Json<DrinksResponse<ShortDrink>>> {
    let drinks = state.store.list().await?;
    Ok(Json(DrinksResponse::new(drinks.iter().map(Drink::short).collect())))
}

async fn drinks_detail(
    _claims: Claims,
    State(state): State<AppState>,
) -> ApiResult<Json<DrinksResponse<Drink>>> {
    let drinks = state.store.list().await?;
    Ok(Json(DrinksResponse::new(drinks)))
}

async fn create_drink(
    Claims(claims): Claims,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateDrinkRequest>,
) -> ApiResult<Json<DrinksResponse<Drink>>> {
    let drink = state.store.insert(request.validate()?).await?;
    tracing::info!(id = drink.id, title = %drink.title, sub = %claims.sub, "created drink");
    Ok(Json(DrinksResponse::new(vec![drink])))
}

async fn update_drink(
    Claims(claims): Claims,
    DrinkId(id): DrinkId,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<UpdateDrinkRequest>,
) -> ApiResult<Json<DrinksResponse<Drink>>> {
    let drink = state
        .store
        .update(id, request.validate()?)
        .await?
        .ok_or(ApiError::NotFound)?;
    tracing::info!(id, sub = %claims.sub, "updated drink");
    Ok(Json(DrinksResponse::new(vec![drink])))
}

async fn delete_drink(
    Claims(claims): Claims,
    DrinkId(id): DrinkId,
    State(state): State<AppState>,
) -> ApiResult<Json<DeleteResponse>> {
    let drink = state.store.delete(id).await?.ok_or(ApiError::NotFound)?;
    tracing::info!(id, sub = %claims.sub, "deleted drink");
    Ok(Json(DeleteResponse {
        success: true,
        delete: drink.id,
    }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}
