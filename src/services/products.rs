use crate::{
    entities::{
        brand, category, flash_sale_item, order_item,
        product::{self, Entity as ProductEntity, ProductStatus},
        store::{self, StoreStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    pricing::{check_money, check_weight, round_money},
    services::common::{resolve_slug, search_pattern, AssetPolicy, Page},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Products at or below this stock level are reported as low stock.
pub const LOW_STOCK_THRESHOLD: i32 = 5;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub slug: Option<String>,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub weight_kg: Decimal,
    pub image_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub status: Option<ProductStatus>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub slug: Option<String>,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "crate::services::categories::double_option")]
    #[schema(value_type = Option<Decimal>)]
    pub compare_at_price: Option<Option<Decimal>>,
    pub stock: Option<i32>,
    pub weight_kg: Option<Decimal>,
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "crate::services::categories::double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub category_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "crate::services::categories::double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub brand_id: Option<Option<Uuid>>,
    pub status: Option<ProductStatus>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductStatusRequest {
    pub status: ProductStatus,
}

/// Seller and admin listing filters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub status: Option<ProductStatus>,
    pub store_id: Option<Uuid>,
}

/// Storefront catalog filters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CatalogQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub category: Option<Uuid>,
    pub brand: Option<Uuid>,
    pub store: Option<Uuid>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

/// Price, stock and weight rules shared by create and update.
pub fn check_product_numbers(
    price: Decimal,
    compare_at_price: Option<Decimal>,
    stock: i32,
    weight_kg: Decimal,
) -> Result<(), ServiceError> {
    if price <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "price must be greater than 0".to_string(),
        ));
    }
    check_money("price", price)?;
    if let Some(compare_at) = compare_at_price {
        check_money("compare_at_price", compare_at)?;
        if compare_at < price {
            return Err(ServiceError::ValidationError(
                "compare_at_price must be greater than or equal to price".to_string(),
            ));
        }
    }
    if stock < 0 {
        return Err(ServiceError::ValidationError(
            "stock cannot be negative".to_string(),
        ));
    }
    check_weight("weight_kg", weight_kg)?;
    Ok(())
}

fn with_search(select: Select<ProductEntity>, search: Option<&str>) -> Select<ProductEntity> {
    match search_pattern(search) {
        Some(pattern) => {
            let lower =
                |col: product::Column| Expr::expr(Func::lower(Expr::col((product::Entity, col))));
            select.filter(
                Condition::any()
                    .add(lower(product::Column::Name).like(pattern.clone()))
                    .add(lower(product::Column::Description).like(pattern)),
            )
        }
        None => select,
    }
}

#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    assets: AssetPolicy,
}

impl ProductService {
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

    async fn ensure_unique_slug(
        &self,
        slug: &str,
        except: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = ProductEntity::find().filter(product::Column::Slug.eq(slug));
        if let Some(id) = except {
            query = query.filter(product::Column::Id.ne(id));
        }
        if query.count(&*self.db).await? > 0 {
            return Err(ServiceError::Conflict(format!(
                "Product slug '{}' is already taken",
                slug
            )));
        }
        Ok(())
    }

    async fn ensure_refs(
        &self,
        category_id: Option<Uuid>,
        brand_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        if let Some(id) = category_id {
            category::Entity::find_by_id(id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| ServiceError::not_found("Category", id))?;
        }
        if let Some(id) = brand_id {
            brand::Entity::find_by_id(id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| ServiceError::not_found("Brand", id))?;
        }
        Ok(())
    }

    async fn notify_stock(&self, product: &product::Model) {
        if product.stock <= LOW_STOCK_THRESHOLD {
            self.event_sender
                .send_or_log(Event::LowStock {
                    product_id: product.id,
                    stock: product.stock,
                })
                .await;
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_product(
        &self,
        store_id: Uuid,
        request: CreateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        check_product_numbers(
            request.price,
            request.compare_at_price,
            request.stock,
            request.weight_kg,
        )?;
        self.assets
            .check_opt("image_url", request.image_url.as_deref())?;
        self.ensure_refs(request.category_id, request.brand_id).await?;
        let slug = resolve_slug(request.slug.as_deref(), &request.name)?;
        self.ensure_unique_slug(&slug, None).await?;

        let now = Utc::now();
        let created = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            store_id: Set(store_id),
            category_id: Set(request.category_id),
            brand_id: Set(request.brand_id),
            name: Set(request.name.trim().to_string()),
            slug: Set(slug),
            description: Set(request.description),
            price: Set(round_money(request.price)),
            compare_at_price: Set(request.compare_at_price.map(round_money)),
            stock: Set(request.stock),
            weight_kg: Set(request.weight_kg),
            image_url: Set(request.image_url),
            status: Set(request.status.unwrap_or(ProductStatus::Draft)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(created.id))
            .await;
        info!(product_id = %created.id, %store_id, "Product created");
        Ok(created)
    }

    /// A product of the given store; other stores' products read as missing.
    pub async fn get_store_product(
        &self,
        store_id: Uuid,
        id: Uuid,
    ) -> Result<product::Model, ServiceError> {
        ProductEntity::find_by_id(id)
            .filter(product::Column::StoreId.eq(store_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))
    }

    pub async fn get_product(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        ProductEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))
    }

    #[instrument(skip(self, request))]
    pub async fn update_product(
        &self,
        store_id: Uuid,
        id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        let existing = self.get_store_product(store_id, id).await?;

        let price = request.price.unwrap_or(existing.price);
        let compare_at = request
            .compare_at_price
            .unwrap_or(existing.compare_at_price);
        let stock = request.stock.unwrap_or(existing.stock);
        let weight = request.weight_kg.unwrap_or(existing.weight_kg);
        check_product_numbers(price, compare_at, stock, weight)?;
        self.assets
            .check_opt("image_url", request.image_url.as_deref())?;
        self.ensure_refs(
            request.category_id.flatten(),
            request.brand_id.flatten(),
        )
        .await?;

        let slug = match request.slug.as_deref() {
            Some(given) => {
                let name = request.name.as_deref().unwrap_or(&existing.name);
                let slug = resolve_slug(Some(given), name)?;
                self.ensure_unique_slug(&slug, Some(id)).await?;
                Some(slug)
            }
            None => None,
        };

        let mut active: product::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(slug) = slug {
            active.slug = Set(slug);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(image_url) = request.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(category_id) = request.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(brand_id) = request.brand_id {
            active.brand_id = Set(brand_id);
        }
        if let Some(status) = request.status {
            active.status = Set(status);
        }
        active.price = Set(round_money(price));
        active.compare_at_price = Set(compare_at.map(round_money));
        active.stock = Set(stock);
        active.weight_kg = Set(weight);
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::ProductUpdated(updated.id))
            .await;
        self.notify_stock(&updated).await;
        Ok(updated)
    }

    /// Products that were sold or put on a flash sale must be archived instead.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, store_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_store_product(store_id, id).await?;

        let sold = order_item::Entity::find()
            .filter(order_item::Column::ProductId.eq(id))
            .count(&*self.db)
            .await?;
        let on_sale = flash_sale_item::Entity::find()
            .filter(flash_sale_item::Column::ProductId.eq(id))
            .count(&*self.db)
            .await?;
        if sold > 0 || on_sale > 0 {
            return Err(ServiceError::Conflict(
                "Product has order or flash sale history; archive it instead".to_string(),
            ));
        }

        existing.delete(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::ProductDeleted(id))
            .await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        query: &ProductListQuery,
        page: Page,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let mut select = with_search(ProductEntity::find(), query.search.as_deref());
        if let Some(status) = query.status {
            select = select.filter(product::Column::Status.eq(status));
        }
        if let Some(store_id) = query.store_id {
            select = select.filter(product::Column::StoreId.eq(store_id));
        }

        let total = select.clone().count(&*self.db).await?;
        let products = select
            .order_by_desc(product::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit)
            .all(&*self.db)
            .await?;
        Ok((products, total))
    }

    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        id: Uuid,
        status: ProductStatus,
    ) -> Result<product::Model, ServiceError> {
        let existing = self.get_product(id).await?;
        let mut active: product::ActiveModel = existing.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::ProductUpdated(id))
            .await;
        Ok(updated)
    }

    fn storefront() -> Select<ProductEntity> {
        ProductEntity::find()
            .inner_join(store::Entity)
            .filter(product::Column::Status.eq(ProductStatus::Active))
            .filter(store::Column::Status.eq(StoreStatus::Active))
    }

    /// Active products of active stores.
    #[instrument(skip(self))]
    pub async fn catalog(
        &self,
        query: &CatalogQuery,
        page: Page,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let mut select = with_search(Self::storefront(), query.search.as_deref());
        if let Some(category_id) = query.category {
            select = select.filter(product::Column::CategoryId.eq(category_id));
        }
        if let Some(brand_id) = query.brand {
            select = select.filter(product::Column::BrandId.eq(brand_id));
        }
        if let Some(store_id) = query.store {
            select = select.filter(product::Column::StoreId.eq(store_id));
        }
        if let Some(min) = query.min_price {
            select = select.filter(product::Column::Price.gte(min));
        }
        if let Some(max) = query.max_price {
            select = select.filter(product::Column::Price.lte(max));
        }

        let total = select.clone().count(&*self.db).await?;
        let products = select
            .order_by_desc(product::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit)
            .all(&*self.db)
            .await?;
        Ok((products, total))
    }

    pub async fn catalog_product(&self, slug: &str) -> Result<product::Model, ServiceError> {
        Self::storefront()
            .filter(product::Column::Slug.eq(slug.to_ascii_lowercase()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", slug))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn product_number_rules() {
        assert!(check_product_numbers(dec!(10), Some(dec!(12)), 3, dec!(0.5)).is_ok());
        assert!(check_product_numbers(dec!(10), Some(dec!(10)), 0, dec!(0)).is_ok());
        assert!(check_product_numbers(dec!(0), None, 1, dec!(1)).is_err());
        assert!(check_product_numbers(dec!(10), Some(dec!(9.99)), 1, dec!(1)).is_err());
        assert!(check_product_numbers(dec!(10), None, -1, dec!(1)).is_err());
        assert!(check_product_numbers(dec!(10), None, 1, dec!(-0.1)).is_err());
    }
}
