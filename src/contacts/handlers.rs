use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{error, instrument};
use uuid::Uuid;

use crate::auth::extractors::AuthUser;
use crate::state::AppState;

use super::dto::{BirthdayWindow, ContactPayload, ContactResponse, Pagination, SearchQuery};
use super::repo;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/contacts", get(list_contacts))
        .route("/contacts/search", get(search_contacts))
        .route("/contacts/birthdays", get(upcoming_birthdays))
        .route("/contacts/:id", get(get_contact))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/contacts", post(create_contact))
        .route("/contacts/:id", put(update_contact))
        .route("/contacts/:id", delete(delete_contact))
}

#[instrument(skip(state))]
async fn list_contacts(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<ContactResponse>>, (StatusCode, String)> {
    let contacts = repo::list_by_owner(&state.db, user.id, p.limit, p.offset)
        .await
        .map_err(internal)?;
    Ok(Json(contacts.into_iter().map(ContactResponse::from).collect()))
}

#[instrument(skip(state, payload))]
async fn create_contact(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<ContactPayload>,
) -> Result<(StatusCode, Json<ContactResponse>), (StatusCode, String)> {
    let contact = repo::create(&state.db, user.id, &payload)
        .await
        .map_err(internal)?;
    Ok((StatusCode::CREATED, Json(ContactResponse::from(contact))))
}

#[instrument(skip(state))]
async fn get_contact(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ContactResponse>, (StatusCode, String)> {
    match repo::get_by_id(&state.db, user.id, id).await.map_err(internal)? {
        Some(contact) => Ok(Json(ContactResponse::from(contact))),
        None => Err((StatusCode::NOT_FOUND, "Contact not found".into())),
    }
}

#[instrument(skip(state, payload))]
async fn update_contact(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ContactPayload>,
) -> Result<Json<ContactResponse>, (StatusCode, String)> {
    match repo::update(&state.db, user.id, id, &payload)
        .await
        .map_err(internal)?
    {
        Some(contact) => Ok(Json(ContactResponse::from(contact))),
        None => Err((StatusCode::NOT_FOUND, "Contact not found".into())),
    }
}

#[instrument(skip(state))]
async fn delete_contact(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if repo::delete(&state.db, user.id, id).await.map_err(internal)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Contact not found".into()))
    }
}

#[instrument(skip(state))]
async fn search_contacts(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Vec<ContactResponse>>, (StatusCode, String)> {
    let contacts = repo::search(&state.db, user.id, &q.q, q.limit, q.offset)
        .await
        .map_err(internal)?;
    Ok(Json(contacts.into_iter().map(ContactResponse::from).collect()))
}

#[instrument(skip(state))]
async fn upcoming_birthdays(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(w): Query<BirthdayWindow>,
) -> Result<Json<Vec<ContactResponse>>, (StatusCode, String)> {
    let contacts = repo::upcoming_birthdays(&state.db, user.id, w.days)
        .await
        .map_err(internal)?;
    Ok(Json(contacts.into_iter().map(ContactResponse::from).collect()))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!(error = %e, "contacts storage error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
