use crate::{
    entities::{
        flash_sale::{self, Entity as FlashSaleEntity, FlashSalePhase},
        flash_sale_item::{self, Entity as FlashSaleItemEntity},
        flash_sale_purchase, product,
    },
    errors::ServiceError,
    pricing::{flash_pricing_from_percent, flash_pricing_from_sale_price, round_money, FlashPricing},
    services::categories::double_option,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, ExprTrait}, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Which flash sales a caller manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashSaleScope {
    Platform,
    Store(Uuid),
}

impl FlashSaleScope {
    fn store_id(&self) -> Option<Uuid> {
        match self {
            FlashSaleScope::Platform => None,
            FlashSaleScope::Store(id) => Some(*id),
        }
    }

    fn can_manage(&self, sale: &flash_sale::Model) -> bool {
        match self {
            FlashSaleScope::Platform => true,
            FlashSaleScope::Store(id) => sale.store_id == Some(*id),
        }
    }

    fn can_add(&self, product: &product::Model) -> bool {
        match self {
            FlashSaleScope::Platform => true,
            FlashSaleScope::Store(id) => product.store_id == *id,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFlashSaleRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateFlashSaleRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

/// Give either `sale_price` or `discount_percent`, never both.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddFlashSaleItemRequest {
    pub product_id: Uuid,
    pub sale_price: Option<Decimal>,
    pub discount_percent: Option<Decimal>,
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[validate(range(min = 1))]
    pub per_user_limit: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateFlashSaleItemRequest {
    pub sale_price: Option<Decimal>,
    pub discount_percent: Option<Decimal>,
    #[validate(range(min = 1))]
    pub quantity: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub per_user_limit: Option<Option<i32>>,
}

/// Flash sale item with its derived inventory fields
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FlashSaleItemView {
    #[serde(flatten)]
    pub item: flash_sale_item::Model,
    pub product_name: Option<String>,
    pub remaining: i32,
    pub sold_out: bool,
}

/// Flash sale with its phase and items
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FlashSaleView {
    #[serde(flatten)]
    pub sale: flash_sale::Model,
    pub phase: FlashSalePhase,
    pub items: Vec<FlashSaleItemView>,
}

fn check_schedule(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Result<(), ServiceError> {
    if ends_at <= starts_at {
        return Err(ServiceError::ValidationError(
            "ends_at must be after starts_at".to_string(),
        ));
    }
    Ok(())
}

/// Resolves the price pair from whichever of sale price or percent was given.
pub fn resolve_pricing(
    original: Decimal,
    sale_price: Option<Decimal>,
    discount_percent: Option<Decimal>,
) -> Result<FlashPricing, ServiceError> {
    match (sale_price, discount_percent) {
        (Some(price), None) => flash_pricing_from_sale_price(original, price),
        (None, Some(pct)) => flash_pricing_from_percent(original, pct),
        _ => Err(ServiceError::ValidationError(
            "Provide exactly one of sale_price or discount_percent".to_string(),
        )),
    }
}

/// Reserves `quantity` units of a flash sale item for an order.
///
/// The sale must be live and the per-user limit respected. The `sold`
/// counter is incremented with a guarded update so concurrent buyers
/// cannot oversell the pool. Returns the item; its `sale_price` is the unit
/// price to charge.
pub async fn reserve<C: ConnectionTrait>(
    conn: &C,
    item_id: Uuid,
    product_id: Uuid,
    user_id: Uuid,
    order_id: Uuid,
    quantity: i32,
    now: DateTime<Utc>,
) -> Result<flash_sale_item::Model, ServiceError> {
    let item = FlashSaleItemEntity::find_by_id(item_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Flash sale item", item_id))?;
    if item.product_id != product_id {
        return Err(ServiceError::ValidationError(format!(
            "Flash sale item {} is not for product {}",
            item_id, product_id
        )));
    }

    let sale = FlashSaleEntity::find_by_id(item.flash_sale_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Flash sale", item.flash_sale_id))?;
    if sale.phase(now) != FlashSalePhase::Live {
        return Err(ServiceError::InvalidOperation(format!(
            "Flash sale {} is not live",
            sale.name
        )));
    }

    if quantity > item.remaining() {
        return Err(ServiceError::InsufficientStock(format!(
            "Only {} left in the flash sale",
            item.remaining()
        )));
    }

    if let Some(limit) = item.per_user_limit {
        let already: i32 = flash_sale_purchase::Entity::find()
            .filter(flash_sale_purchase::Column::FlashSaleItemId.eq(item_id))
            .filter(flash_sale_purchase::Column::UserId.eq(user_id))
            .all(conn)
            .await?
            .iter()
            .map(|p| p.quantity)
            .sum();
        if already + quantity > limit {
            return Err(ServiceError::InvalidOperation(format!(
                "Flash sale limit is {} per customer; you already bought {}",
                limit, already
            )));
        }
    }

    let result = FlashSaleItemEntity::update_many()
        .col_expr(
            flash_sale_item::Column::Sold,
            Expr::col(flash_sale_item::Column::Sold).add(quantity),
        )
        .col_expr(flash_sale_item::Column::UpdatedAt, Expr::value(now))
        .filter(flash_sale_item::Column::Id.eq(item_id))
        .filter(
            Expr::col(flash_sale_item::Column::Sold)
                .add(quantity)
                .lte(Expr::col(flash_sale_item::Column::Quantity)),
        )
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(ServiceError::InsufficientStock(
            "Flash sale item sold out".to_string(),
        ));
    }

    flash_sale_purchase::ActiveModel {
        id: Set(Uuid::new_v4()),
        flash_sale_item_id: Set(item_id),
        user_id: Set(user_id),
        order_id: Set(Some(order_id)),
        quantity: Set(quantity),
        created_at: Set(now),
    }
    .insert(conn)
    .await?;

    Ok(item)
}

/// Returns an order's flash units to their pools and drops its purchase rows.
pub async fn release_for_order<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> Result<(), ServiceError> {
    let purchases = flash_sale_purchase::Entity::find()
        .filter(flash_sale_purchase::Column::OrderId.eq(order_id))
        .all(conn)
        .await?;

    for purchase in &purchases {
        FlashSaleItemEntity::update_many()
            .col_expr(
                flash_sale_item::Column::Sold,
                Expr::col(flash_sale_item::Column::Sold).sub(purchase.quantity),
            )
            .col_expr(flash_sale_item::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(flash_sale_item::Column::Id.eq(purchase.flash_sale_item_id))
            .filter(flash_sale_item::Column::Sold.gte(purchase.quantity))
            .exec(conn)
            .await?;
    }

    flash_sale_purchase::Entity::delete_many()
        .filter(flash_sale_purchase::Column::OrderId.eq(order_id))
        .exec(conn)
        .await?;
    Ok(())
}

#[derive(Clone)]
pub struct FlashSaleService {
    db: Arc<DatabaseConnection>,
}

impl FlashSaleService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn get_scoped(
        &self,
        scope: FlashSaleScope,
        id: Uuid,
    ) -> Result<flash_sale::Model, ServiceError> {
        FlashSaleEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .filter(|s| scope.can_manage(s))
            .ok_or_else(|| ServiceError::not_found("Flash sale", id))
    }

    async fn get_item(
        &self,
        sale_id: Uuid,
        item_id: Uuid,
    ) -> Result<flash_sale_item::Model, ServiceError> {
        FlashSaleItemEntity::find_by_id(item_id)
            .filter(flash_sale_item::Column::FlashSaleId.eq(sale_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Flash sale item", item_id))
    }

    async fn item_view(
        &self,
        item: flash_sale_item::Model,
    ) -> Result<FlashSaleItemView, ServiceError> {
        let name = product::Entity::find_by_id(item.product_id)
            .one(&*self.db)
            .await?
            .map(|p| p.name);
        Ok(FlashSaleItemView {
            remaining: item.remaining(),
            sold_out: item.is_sold_out(),
            product_name: name,
            item,
        })
    }

    async fn views(
        &self,
        sales: Vec<flash_sale::Model>,
        now: DateTime<Utc>,
    ) -> Result<Vec<FlashSaleView>, ServiceError> {
        if sales.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = sales.iter().map(|s| s.id).collect();
        let items = FlashSaleItemEntity::find()
            .filter(flash_sale_item::Column::FlashSaleId.is_in(ids))
            .order_by_asc(flash_sale_item::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let names: HashMap<Uuid, String> = if product_ids.is_empty() {
            HashMap::new()
        } else {
            product::Entity::find()
                .filter(product::Column::Id.is_in(product_ids))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|p| (p.id, p.name))
                .collect()
        };

        let mut by_sale: HashMap<Uuid, Vec<FlashSaleItemView>> = HashMap::new();
        for item in items {
            by_sale.entry(item.flash_sale_id).or_default().push(FlashSaleItemView {
                remaining: item.remaining(),
                sold_out: item.is_sold_out(),
                product_name: names.get(&item.product_id).cloned(),
                item,
            });
        }

        Ok(sales
            .into_iter()
            .map(|sale| FlashSaleView {
                phase: sale.phase(now),
                items: by_sale.remove(&sale.id).unwrap_or_default(),
                sale,
            })
            .collect())
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_sale(
        &self,
        scope: FlashSaleScope,
        request: CreateFlashSaleRequest,
    ) -> Result<flash_sale::Model, ServiceError> {
        check_schedule(request.starts_at, request.ends_at)?;

        let now = Utc::now();
        let created = flash_sale::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            description: Set(request.description),
            store_id: Set(scope.store_id()),
            starts_at: Set(request.starts_at),
            ends_at: Set(request.ends_at),
            is_active: Set(request.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(flash_sale_id = %created.id, "Flash sale created");
        Ok(created)
    }

    pub async fn list_sales(
        &self,
        scope: FlashSaleScope,
    ) -> Result<Vec<FlashSaleView>, ServiceError> {
        let mut select = FlashSaleEntity::find();
        if let FlashSaleScope::Store(store_id) = scope {
            select = select.filter(flash_sale::Column::StoreId.eq(store_id));
        }
        let sales = select
            .order_by_desc(flash_sale::Column::StartsAt)
            .all(&*self.db)
            .await?;
        self.views(sales, Utc::now()).await
    }

    pub async fn get_sale(
        &self,
        scope: FlashSaleScope,
        id: Uuid,
    ) -> Result<FlashSaleView, ServiceError> {
        let sale = self.get_scoped(scope, id).await?;
        let mut views = self.views(vec![sale], Utc::now()).await?;
        views
            .pop()
            .ok_or_else(|| ServiceError::not_found("Flash sale", id))
    }

    #[instrument(skip(self, request))]
    pub async fn update_sale(
        &self,
        scope: FlashSaleScope,
        id: Uuid,
        request: UpdateFlashSaleRequest,
    ) -> Result<flash_sale::Model, ServiceError> {
        let existing = self.get_scoped(scope, id).await?;
        let starts_at = request.starts_at.unwrap_or(existing.starts_at);
        let ends_at = request.ends_at.unwrap_or(existing.ends_at);
        check_schedule(starts_at, ends_at)?;

        let mut active: flash_sale::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }
        active.starts_at = Set(starts_at);
        active.ends_at = Set(ends_at);
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }

    /// Refused once any unit has been sold.
    #[instrument(skip(self))]
    pub async fn delete_sale(&self, scope: FlashSaleScope, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_scoped(scope, id).await?;
        let sold = FlashSaleItemEntity::find()
            .filter(flash_sale_item::Column::FlashSaleId.eq(id))
            .filter(flash_sale_item::Column::Sold.gt(0))
            .count(&*self.db)
            .await?;
        if sold > 0 {
            return Err(ServiceError::Conflict(
                "Flash sale has sales; deactivate it instead".to_string(),
            ));
        }

        self.db
            .transaction::<_, (), ServiceError>(|txn| {
                Box::pin(async move {
                    FlashSaleItemEntity::delete_many()
                        .filter(flash_sale_item::Column::FlashSaleId.eq(id))
                        .exec(txn)
                        .await?;
                    existing.delete(txn).await?;
                    Ok(())
                })
            })
            .await?;
        Ok(())
    }

    #[instrument(skip(self, request))]
    pub async fn add_item(
        &self,
        scope: FlashSaleScope,
        sale_id: Uuid,
        request: AddFlashSaleItemRequest,
    ) -> Result<FlashSaleItemView, ServiceError> {
        let sale = self.get_scoped(scope, sale_id).await?;

        let product = product::Entity::find_by_id(request.product_id)
            .one(&*self.db)
            .await?
            .filter(|p| scope.can_add(p))
            .ok_or_else(|| ServiceError::not_found("Product", request.product_id))?;

        let original = round_money(product.price);
        let pricing = resolve_pricing(original, request.sale_price, request.discount_percent)?;

        if request.quantity < 1 {
            return Err(ServiceError::ValidationError(
                "quantity must be at least 1".to_string(),
            ));
        }
        if request.quantity > product.stock {
            return Err(ServiceError::ValidationError(format!(
                "quantity {} exceeds product stock {}",
                request.quantity, product.stock
            )));
        }

        let duplicate = FlashSaleItemEntity::find()
            .filter(flash_sale_item::Column::FlashSaleId.eq(sale.id))
            .filter(flash_sale_item::Column::ProductId.eq(product.id))
            .count(&*self.db)
            .await?;
        if duplicate > 0 {
            return Err(ServiceError::Conflict(
                "Product is already in this flash sale".to_string(),
            ));
        }

        let now = Utc::now();
        let created = flash_sale_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            flash_sale_id: Set(sale.id),
            product_id: Set(product.id),
            original_price: Set(original),
            sale_price: Set(pricing.sale_price),
            discount_percent: Set(pricing.discount_percent),
            quantity: Set(request.quantity),
            sold: Set(0),
            per_user_limit: Set(request.per_user_limit),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        Ok(FlashSaleItemView {
            remaining: created.remaining(),
            sold_out: created.is_sold_out(),
            product_name: Some(product.name),
            item: created,
        })
    }

    #[instrument(skip(self, request))]
    pub async fn update_item(
        &self,
        scope: FlashSaleScope,
        sale_id: Uuid,
        item_id: Uuid,
        request: UpdateFlashSaleItemRequest,
    ) -> Result<FlashSaleItemView, ServiceError> {
        self.get_scoped(scope, sale_id).await?;
        let existing = self.get_item(sale_id, item_id).await?;

        let pricing = match (request.sale_price, request.discount_percent) {
            (None, None) => None,
            (price, pct) => Some(resolve_pricing(existing.original_price, price, pct)?),
        };

        if let Some(quantity) = request.quantity {
            if quantity < existing.sold {
                return Err(ServiceError::InvalidOperation(format!(
                    "quantity cannot go below the {} units already sold",
                    existing.sold
                )));
            }
        }
        if let Some(Some(limit)) = request.per_user_limit {
            if limit < 1 {
                return Err(ServiceError::ValidationError(
                    "per_user_limit must be at least 1".to_string(),
                ));
            }
        }

        let mut active: flash_sale_item::ActiveModel = existing.into();
        if let Some(pricing) = pricing {
            active.sale_price = Set(pricing.sale_price);
            active.discount_percent = Set(pricing.discount_percent);
        }
        if let Some(quantity) = request.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(limit) = request.per_user_limit {
            active.per_user_limit = Set(limit);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;
        self.item_view(updated).await
    }

    /// Re-snapshots the product price and reprices the item at the same percent.
    #[instrument(skip(self))]
    pub async fn recalculate_item(
        &self,
        scope: FlashSaleScope,
        sale_id: Uuid,
        item_id: Uuid,
    ) -> Result<FlashSaleItemView, ServiceError> {
        self.get_scoped(scope, sale_id).await?;
        let existing = self.get_item(sale_id, item_id).await?;
        let product = product::Entity::find_by_id(existing.product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", existing.product_id))?;

        let original = round_money(product.price);
        let pricing = flash_pricing_from_percent(original, existing.discount_percent)?;

        let mut active: flash_sale_item::ActiveModel = existing.into();
        active.original_price = Set(original);
        active.sale_price = Set(pricing.sale_price);
        active.discount_percent = Set(pricing.discount_percent);
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;
        self.item_view(updated).await
    }

    #[instrument(skip(self))]
    pub async fn delete_item(
        &self,
        scope: FlashSaleScope,
        sale_id: Uuid,
        item_id: Uuid,
    ) -> Result<(), ServiceError> {
        self.get_scoped(scope, sale_id).await?;
        let existing = self.get_item(sale_id, item_id).await?;
        if existing.sold > 0 {
            return Err(ServiceError::Conflict(
                "Cannot remove an item that has already sold units".to_string(),
            ));
        }
        existing.delete(&*self.db).await?;
        Ok(())
    }

    /// Live and upcoming sales for the storefront.
    pub async fn storefront_sales(&self) -> Result<Vec<FlashSaleView>, ServiceError> {
        let now = Utc::now();
        let sales: Vec<flash_sale::Model> = FlashSaleEntity::find()
            .filter(flash_sale::Column::IsActive.eq(true))
            .order_by_asc(flash_sale::Column::StartsAt)
            .all(&*self.db)
            .await?
            .into_iter()
            .filter(|s| matches!(s.phase(now), FlashSalePhase::Live | FlashSalePhase::Upcoming))
            .collect();
        self.views(sales, now).await
    }

    pub async fn storefront_sale(&self, id: Uuid) -> Result<FlashSaleView, ServiceError> {
        let sale = FlashSaleEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .filter(|s| s.is_active)
            .ok_or_else(|| ServiceError::not_found("Flash sale", id))?;
        let mut views = self.views(vec![sale], Utc::now()).await?;
        views
            .pop()
            .ok_or_else(|| ServiceError::not_found("Flash sale", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn exactly_one_pricing_input_is_required() {
        assert!(resolve_pricing(dec!(100), None, None).is_err());
        assert!(resolve_pricing(dec!(100), Some(dec!(80)), Some(dec!(20))).is_err());
        let by_price = resolve_pricing(dec!(100), Some(dec!(80)), None).unwrap();
        let by_pct = resolve_pricing(dec!(100), None, Some(dec!(20))).unwrap();
        assert_eq!(by_price, by_pct);
    }

    #[test]
    fn schedule_must_move_forward() {
        let now = Utc::now();
        assert!(check_schedule(now, now).is_err());
        assert!(check_schedule(now, now + chrono::Duration::hours(1)).is_ok());
    }
}
