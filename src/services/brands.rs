use crate::{
    entities::{
        brand::{self, Entity as BrandEntity},
        product,
    },
    errors::ServiceError,
    services::common::{resolve_slug, AssetPolicy},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBrandRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub slug: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub logo_url: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBrandRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    pub slug: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub logo_url: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    pub is_featured: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BrandListQuery {
    /// Only featured brands
    pub featured: Option<bool>,
}

#[derive(Clone)]
pub struct BrandService {
    db: Arc<DatabaseConnection>,
    assets: AssetPolicy,
}

impl BrandService {
    pub fn new(db: Arc<DatabaseConnection>, assets: AssetPolicy) -> Self {
        Self { db, assets }
    }

    async fn ensure_unique_slug(
        &self,
        slug: &str,
        except: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = BrandEntity::find().filter(brand::Column::Slug.eq(slug));
        if let Some(id) = except {
            query = query.filter(brand::Column::Id.ne(id));
        }
        if query.count(&*self.db).await? > 0 {
            return Err(ServiceError::Conflict(format!(
                "Brand slug '{}' is already taken",
                slug
            )));
        }
        Ok(())
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_brand(
        &self,
        request: CreateBrandRequest,
    ) -> Result<brand::Model, ServiceError> {
        self.assets.check_opt("logo_url", request.logo_url.as_deref())?;
        let slug = resolve_slug(request.slug.as_deref(), &request.name)?;
        self.ensure_unique_slug(&slug, None).await?;

        let now = Utc::now();
        let created = brand::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            slug: Set(slug),
            description: Set(request.description),
            logo_url: Set(request.logo_url),
            website: Set(request.website),
            is_featured: Set(request.is_featured),
            is_active: Set(request.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(brand_id = %created.id, "Brand created");
        Ok(created)
    }

    pub async fn get_brand(&self, id: Uuid) -> Result<brand::Model, ServiceError> {
        BrandEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Brand", id))
    }

    pub async fn list_brands(&self) -> Result<Vec<brand::Model>, ServiceError> {
        Ok(BrandEntity::find()
            .order_by_asc(brand::Column::Name)
            .all(&*self.db)
            .await?)
    }

    /// Active brands for the storefront.
    pub async fn list_public_brands(
        &self,
        featured: Option<bool>,
    ) -> Result<Vec<brand::Model>, ServiceError> {
        let mut query = BrandEntity::find().filter(brand::Column::IsActive.eq(true));
        if featured == Some(true) {
            query = query.filter(brand::Column::IsFeatured.eq(true));
        }
        Ok(query.order_by_asc(brand::Column::Name).all(&*self.db).await?)
    }

    #[instrument(skip(self, request))]
    pub async fn update_brand(
        &self,
        id: Uuid,
        request: UpdateBrandRequest,
    ) -> Result<brand::Model, ServiceError> {
        let existing = self.get_brand(id).await?;
        self.assets.check_opt("logo_url", request.logo_url.as_deref())?;

        let slug = match request.slug.as_deref() {
            Some(given) => {
                let name = request.name.as_deref().unwrap_or(&existing.name);
                let slug = resolve_slug(Some(given), name)?;
                self.ensure_unique_slug(&slug, Some(id)).await?;
                Some(slug)
            }
            None => None,
        };

        let mut active: brand::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(slug) = slug {
            active.slug = Set(slug);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(logo_url) = request.logo_url {
            active.logo_url = Set(Some(logo_url));
        }
        if let Some(website) = request.website {
            active.website = Set(Some(website));
        }
        if let Some(is_featured) = request.is_featured {
            active.is_featured = Set(is_featured);
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }

    /// Refused while products reference the brand.
    #[instrument(skip(self))]
    pub async fn delete_brand(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_brand(id).await?;
        let products = product::Entity::find()
            .filter(product::Column::BrandId.eq(id))
            .count(&*self.db)
            .await?;
        if products > 0 {
            return Err(ServiceError::Conflict(format!(
                "Brand is used by {} products",
                products
            )));
        }

        existing.delete(&*self.db).await?;
        info!(brand_id = %id, "Brand deleted");
        Ok(())
    }
}
