use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{propertydb::PropertyExt, roomdb::RoomExt, utilitydb::UtilityExt},
    dtos::{
        propertydtos::{
            CreatePropertyDto, CreateRoomDto, PropertyFilterDto, RoomFilterDto, UpdatePropertyDto,
            UpdateRoomDto,
        },
        userdtos::{RequestQueryDto, Response},
        utilitydtos::UsageDto,
    },
    error::{ErrorMessage, HttpError},
    middleware::{role_check, JWTAuthMiddeware},
    models::{
        propertymodel::{Property, Room},
        usermodel::{User, UserRole},
    },
    AppState,
};

/// Admins see everything, landlords only what they own.
pub(crate) fn ensure_owner(user: &User, landlord_id: Uuid) -> Result<(), HttpError> {
    if user.role == UserRole::Admin || user.id == landlord_id {
        Ok(())
    } else {
        Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()))
    }
}

pub(crate) async fn load_owned_property(
    app_state: &AppState,
    user: &User,
    property_id: Uuid,
) -> Result<Property, HttpError> {
    let property = app_state
        .db_client
        .get_property_by_id(property_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Property not found"))?;

    ensure_owner(user, property.landlord_id)?;
    Ok(property)
}

pub(crate) async fn load_owned_room(
    app_state: &AppState,
    user: &User,
    room_id: Uuid,
) -> Result<(Room, Property), HttpError> {
    let (room, property) = app_state
        .db_client
        .get_room_with_property(room_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Room not found"))?;

    ensure_owner(user, property.landlord_id)?;
    Ok((room, property))
}

pub fn properties_handler() -> Router {
    Router::new()
        .route("/properties", get(get_properties).post(create_property))
        .route(
            "/properties/:property_id",
            get(get_property).put(update_property).delete(delete_property),
        )
        .route(
            "/properties/:property_id/rooms",
            get(get_rooms).post(create_room),
        )
        .route(
            "/rooms/:room_id",
            get(get_room).put(update_room).delete(delete_room),
        )
        .route("/rooms/:room_id/usages", get(get_room_usages))
        .layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Landlord, UserRole::Admin])
        }))
}

pub async fn get_properties(
    Query(query_params): Query<RequestQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    query_params.validate().map_err(HttpError::validation)?;

    let page = query_params.page.unwrap_or(1) as u32;
    let limit = query_params.limit.unwrap_or(10);

    let properties = if user.user.role == UserRole::Admin {
        app_state.db_client.get_all_properties().await
    } else {
        app_state
            .db_client
            .get_properties_by_landlord(user.user.id, page, limit)
            .await
    }
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    let data: Vec<PropertyFilterDto> = properties.iter().map(PropertyFilterDto::from_property).collect();

    Ok(Json(json!({
        "status": "success",
        "data": data,
        "page": page,
        "limit": limit,
    })))
}

pub async fn create_property(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreatePropertyDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    let property = app_state
        .db_client
        .create_property(user.user.id, body)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!("Landlord {} created property {}", user.user.id, property.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "data": PropertyFilterDto::from_property(&property),
        })),
    ))
}

pub async fn get_property(
    Path(property_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let property = load_owned_property(&app_state, &user.user, property_id).await?;

    Ok(Json(json!({
        "status": "success",
        "data": PropertyFilterDto::from_property(&property),
    })))
}

pub async fn update_property(
    Path(property_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdatePropertyDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;
    load_owned_property(&app_state, &user.user, property_id).await?;

    let property = app_state
        .db_client
        .update_property(property_id, body)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": PropertyFilterDto::from_property(&property),
    })))
}

pub async fn delete_property(
    Path(property_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    load_owned_property(&app_state, &user.user, property_id).await?;

    app_state
        .db_client
        .delete_property(property_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                HttpError::unique_constraint_violation("Property still has rentals on record")
            }
            e => HttpError::server_error(e.to_string()),
        })?;

    Ok(Json(Response {
        status: "success",
        message: "Property deleted".to_string(),
    }))
}

pub async fn get_rooms(
    Path(property_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    load_owned_property(&app_state, &user.user, property_id).await?;

    let rooms = app_state
        .db_client
        .get_rooms_by_property(property_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let data: Vec<RoomFilterDto> = rooms.iter().map(RoomFilterDto::from_room).collect();

    Ok(Json(json!({ "status": "success", "data": data })))
}

pub async fn create_room(
    Path(property_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateRoomDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;
    load_owned_property(&app_state, &user.user, property_id).await?;

    let room = app_state
        .db_client
        .create_room(property_id, body)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                HttpError::unique_constraint_violation("Room number already exists in this property")
            }
            e => HttpError::server_error(e.to_string()),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "data": RoomFilterDto::from_room(&room) })),
    ))
}

pub async fn get_room(
    Path(room_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let (room, property) = load_owned_room(&app_state, &user.user, room_id).await?;

    Ok(Json(json!({
        "status": "success",
        "data": {
            "room": RoomFilterDto::from_room(&room),
            "property": PropertyFilterDto::from_property(&property),
        }
    })))
}

pub async fn update_room(
    Path(room_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateRoomDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;
    load_owned_room(&app_state, &user.user, room_id).await?;

    let room = app_state
        .db_client
        .update_room(room_id, body)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                HttpError::unique_constraint_violation("Room number already exists in this property")
            }
            e => HttpError::server_error(e.to_string()),
        })?;

    Ok(Json(json!({ "status": "success", "data": RoomFilterDto::from_room(&room) })))
}

pub async fn delete_room(
    Path(room_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    load_owned_room(&app_state, &user.user, room_id).await?;

    app_state
        .db_client
        .delete_room(room_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                HttpError::unique_constraint_violation("Room still has rentals on record")
            }
            e => HttpError::server_error(e.to_string()),
        })?;

    Ok(Json(Response {
        status: "success",
        message: "Room deleted".to_string(),
    }))
}

pub async fn get_room_usages(
    Path(room_id): Path<Uuid>,
    Query(query_params): Query<RequestQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    query_params.validate().map_err(HttpError::validation)?;
    load_owned_room(&app_state, &user.user, room_id).await?;

    let page = query_params.page.unwrap_or(1) as u32;
    let limit = query_params.limit.unwrap_or(20);

    let usages = app_state
        .db_client
        .get_room_usages(room_id, page, limit)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": UsageDto::from_usages(&usages),
        "page": page,
        "limit": limit,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Sam".into(),
            email: "sam@example.com".into(),
            password: String::new(),
            phone: None,
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn landlords_only_reach_their_own_property() {
        let landlord = user(UserRole::Landlord);
        assert!(ensure_owner(&landlord, landlord.id).is_ok());

        let err = ensure_owner(&landlord, Uuid::new_v4()).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn admins_reach_any_property() {
        let admin = user(UserRole::Admin);
        assert!(ensure_owner(&admin, Uuid::new_v4()).is_ok());
    }
}
