use crate::{
    entities::{
        store::{self, Entity as StoreEntity, StoreStatus},
        user::{self, UserRole},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::common::{
        check_coordinates, normalize_country, resolve_slug, search_pattern, AssetPolicy, Page,
    },
};
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStoreRequest {
    #[validate(length(min = 2, max = 120))]
    pub name: String,
    /// Derived from the name when absent
    pub slug: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 40))]
    pub phone: Option<String>,
    #[validate(length(max = 255))]
    pub address_line: Option<String>,
    #[validate(length(max = 120))]
    pub city: Option<String>,
    pub country: Option<String>,
    #[validate(length(max = 20))]
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateStoreRequest {
    #[validate(length(min = 2, max = 120))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 40))]
    pub phone: Option<String>,
    #[validate(length(max = 255))]
    pub address_line: Option<String>,
    #[validate(length(max = 120))]
    pub city: Option<String>,
    pub country: Option<String>,
    #[validate(length(max = 20))]
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StoreStatusRequest {
    pub status: StoreStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StoreListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<StoreStatus>,
    pub search: Option<String>,
}

#[derive(Clone)]
pub struct StoreService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    assets: AssetPolicy,
}

impl StoreService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        assets: AssetPolicy,
    ) -> Self {
        Self {
            db,
            event_sender,
            assets,
        }
    }

    async fn ensure_unique_slug(&self, slug: &str) -> Result<(), ServiceError> {
        let taken = StoreEntity::find()
            .filter(store::Column::Slug.eq(slug))
            .count(&*self.db)
            .await?;
        if taken > 0 {
            return Err(ServiceError::Conflict(format!(
                "Store slug '{}' is already taken",
                slug
            )));
        }
        Ok(())
    }

    /// Applies for a store on behalf of `owner_id`. One store per user.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn apply(
        &self,
        owner_id: Uuid,
        request: CreateStoreRequest,
    ) -> Result<store::Model, ServiceError> {
        if self.find_by_owner(owner_id).await?.is_some() {
            return Err(ServiceError::Conflict(
                "You already have a store".to_string(),
            ));
        }

        self.assets.check_opt("logo_url", request.logo_url.as_deref())?;
        self.assets
            .check_opt("banner_url", request.banner_url.as_deref())?;
        check_coordinates(request.latitude, request.longitude)?;
        let country = request
            .country
            .as_deref()
            .map(normalize_country)
            .transpose()?;

        let slug = resolve_slug(request.slug.as_deref(), &request.name)?;
        self.ensure_unique_slug(&slug).await?;

        let now = Utc::now();
        let created = store::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(owner_id),
            name: Set(request.name.trim().to_string()),
            slug: Set(slug),
            description: Set(request.description),
            logo_url: Set(request.logo_url),
            banner_url: Set(request.banner_url),
            email: Set(request.email.map(|e| e.trim().to_lowercase())),
            phone: Set(request.phone),
            address_line: Set(request.address_line),
            city: Set(request.city),
            country: Set(country),
            postal_code: Set(request.postal_code),
            latitude: Set(request.latitude),
            longitude: Set(request.longitude),
            status: Set(StoreStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::StoreApplied(created.id))
            .await;
        info!(store_id = %created.id, "Store application submitted");
        Ok(created)
    }

    pub async fn find_by_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Option<store::Model>, ServiceError> {
        Ok(StoreEntity::find()
            .filter(store::Column::OwnerId.eq(owner_id))
            .one(&*self.db)
            .await?)
    }

    /// The caller's own store in any status.
    pub async fn get_own(&self, owner_id: Uuid) -> Result<store::Model, ServiceError> {
        self.find_by_owner(owner_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("You have not applied for a store".to_string()))
    }

    /// Resolves the store a seller route operates on; it must exist and be active.
    pub async fn resolve_seller_store(&self, owner_id: Uuid) -> Result<store::Model, ServiceError> {
        let store = self
            .find_by_owner(owner_id)
            .await?
            .ok_or_else(|| {
                ServiceError::Forbidden("No store is linked to this account".to_string())
            })?;

        if store.status != StoreStatus::Active {
            return Err(ServiceError::Forbidden(format!(
                "Store is {}",
                store.status.as_str()
            )));
        }
        Ok(store)
    }

    #[instrument(skip(self, request))]
    pub async fn update_store(
        &self,
        store: store::Model,
        request: UpdateStoreRequest,
    ) -> Result<store::Model, ServiceError> {
        self.assets.check_opt("logo_url", request.logo_url.as_deref())?;
        self.assets
            .check_opt("banner_url", request.banner_url.as_deref())?;
        check_coordinates(
            request.latitude.or(store.latitude),
            request.longitude.or(store.longitude),
        )?;

        let mut active: store::ActiveModel = store.into();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(logo_url) = request.logo_url {
            active.logo_url = Set(Some(logo_url));
        }
        if let Some(banner_url) = request.banner_url {
            active.banner_url = Set(Some(banner_url));
        }
        if let Some(email) = request.email {
            active.email = Set(Some(email.trim().to_lowercase()));
        }
        if let Some(phone) = request.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(address_line) = request.address_line {
            active.address_line = Set(Some(address_line));
        }
        if let Some(city) = request.city {
            active.city = Set(Some(city));
        }
        if let Some(country) = request.country {
            active.country = Set(Some(normalize_country(&country)?));
        }
        if let Some(postal_code) = request.postal_code {
            active.postal_code = Set(Some(postal_code));
        }
        if let Some(latitude) = request.latitude {
            active.latitude = Set(Some(latitude));
        }
        if let Some(longitude) = request.longitude {
            active.longitude = Set(Some(longitude));
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn list_stores(
        &self,
        query: &StoreListQuery,
        page: Page,
    ) -> Result<(Vec<store::Model>, u64), ServiceError> {
        let mut select = StoreEntity::find();
        if let Some(status) = query.status {
            select = select.filter(store::Column::Status.eq(status));
        }
        if let Some(pattern) = search_pattern(query.search.as_deref()) {
            let lower = |col: store::Column| Expr::expr(Func::lower(Expr::col(col)));
            select = select.filter(
                Condition::any()
                    .add(lower(store::Column::Name).like(pattern.clone()))
                    .add(lower(store::Column::Slug).like(pattern)),
            );
        }

        let total = select.clone().count(&*self.db).await?;
        let stores = select
            .order_by_desc(store::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit)
            .all(&*self.db)
            .await?;
        Ok((stores, total))
    }

    pub async fn get_store(&self, id: Uuid) -> Result<store::Model, ServiceError> {
        StoreEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Store", id))
    }

    /// Public storefront lookup; only active stores are visible.
    pub async fn get_public_store(&self, slug: &str) -> Result<store::Model, ServiceError> {
        StoreEntity::find()
            .filter(store::Column::Slug.eq(slug.to_ascii_lowercase()))
            .filter(store::Column::Status.eq(StoreStatus::Active))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Store", slug))
    }

    /// Moderates a store. Activation promotes the owner to seller.
    #[instrument(skip(self))]
    pub async fn change_status(
        &self,
        id: Uuid,
        status: StoreStatus,
    ) -> Result<store::Model, ServiceError> {
        let existing = self.get_store(id).await?;
        if !existing.status.can_transition_to(status) {
            return Err(ServiceError::InvalidOperation(format!(
                "Cannot move store from {} to {}",
                existing.status.as_str(),
                status.as_str()
            )));
        }

        let owner_id = existing.owner_id;
        let updated = self
            .db
            .transaction::<_, store::Model, ServiceError>(|txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let mut active: store::ActiveModel = existing.into();
                    active.status = Set(status);
                    active.updated_at = Set(now);
                    let updated = active.update(txn).await?;

                    if status == StoreStatus::Active {
                        user::Entity::update_many()
                            .col_expr(user::Column::Role, Expr::value(UserRole::Seller))
                            .col_expr(user::Column::UpdatedAt, Expr::value(now))
                            .filter(user::Column::Id.eq(owner_id))
                            .filter(user::Column::Role.ne(UserRole::Admin))
                            .exec(txn)
                            .await?;
                    }
                    Ok(updated)
                })
            })
            .await?;

        self.event_sender
            .send_or_log(Event::StoreStatusChanged {
                store_id: id,
                status: status.as_str().to_string(),
            })
            .await;
        info!(store_id = %id, status = status.as_str(), "Store status changed");
        Ok(updated)
    }
}
