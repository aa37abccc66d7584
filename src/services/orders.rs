use crate::{
    entities::{
        order::{self, Entity as OrderEntity, OrderStatus},
        order_item::{self, Entity as OrderItemEntity},
        product::{self, ProductStatus},
        store::{self, StoreStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    pricing::{self, check_money, checked_sum, round_money},
    services::{
        affiliates, common::normalize_country, common::Page, flash_sales, promotions, shipments,
        shipping,
    },
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

const MAX_ORDER_LINES: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderLineRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    /// Buy at the flash sale price from this item's pool
    pub flash_sale_item_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ShippingAddress {
    #[validate(length(min = 1, max = 120))]
    pub recipient_name: String,
    #[validate(length(min = 1, max = 255))]
    pub address_line: String,
    #[validate(length(min = 1, max = 120))]
    pub city: String,
    #[validate(length(equal = 2))]
    pub country: String,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: String,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PlaceOrderRequest {
    #[validate(length(min = 1))]
    pub items: Vec<OrderLineRequest>,
    #[validate]
    pub shipping_address: ShippingAddress,
    pub shipping_rate_id: Option<Uuid>,
    pub promotion_code: Option<String>,
    pub referral_code: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<OrderStatus>,
    /// Admin only
    pub store_id: Option<Uuid>,
}

/// Order with its line items
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

/// `ORD-YYYYMMDD-XXXXXXXX` with the suffix taken from the order id.
pub fn order_number(id: Uuid, now: DateTime<Utc>) -> String {
    let suffix: String = id.simple().to_string().chars().take(8).collect();
    format!("ORD-{}-{}", now.format("%Y%m%d"), suffix.to_uppercase())
}

fn check_lines(items: &[OrderLineRequest]) -> Result<(), ServiceError> {
    if items.is_empty() {
        return Err(ServiceError::ValidationError(
            "An order needs at least one item".to_string(),
        ));
    }
    if items.len() > MAX_ORDER_LINES {
        return Err(ServiceError::ValidationError(format!(
            "An order can hold at most {} lines",
            MAX_ORDER_LINES
        )));
    }
    let mut seen = HashSet::new();
    for line in items {
        if line.quantity < 1 {
            return Err(ServiceError::ValidationError(
                "quantity must be at least 1".to_string(),
            ));
        }
        if !seen.insert(line.product_id) {
            return Err(ServiceError::ValidationError(format!(
                "Product {} appears more than once",
                line.product_id
            )));
        }
    }
    Ok(())
}

/// Loads the ordered products and the single active store selling them.
async fn load_cart<C: ConnectionTrait>(
    conn: &C,
    items: &[OrderLineRequest],
) -> Result<(HashMap<Uuid, product::Model>, store::Model), ServiceError> {
    let ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
    let products: HashMap<Uuid, product::Model> = product::Entity::find()
        .filter(product::Column::Id.is_in(ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut store_id = None;
    for line in items {
        let product = products
            .get(&line.product_id)
            .filter(|p| p.status == ProductStatus::Active)
            .ok_or_else(|| {
                ServiceError::InvalidOperation(format!(
                    "Product {} is not available",
                    line.product_id
                ))
            })?;
        match store_id {
            None => store_id = Some(product.store_id),
            Some(id) if id != product.store_id => {
                return Err(ServiceError::InvalidOperation(
                    "All items of an order must come from the same store".to_string(),
                ));
            }
            Some(_) => {}
        }
    }

    let store_id = store_id.ok_or_else(|| {
        ServiceError::ValidationError("An order needs at least one item".to_string())
    })?;
    let store = store::Entity::find_by_id(store_id)
        .one(conn)
        .await?
        .filter(|s| s.status == StoreStatus::Active)
        .ok_or_else(|| {
            ServiceError::InvalidOperation("Store is not accepting orders".to_string())
        })?;

    Ok((products, store))
}

/// `stock = stock - q` only while enough stock remains.
async fn take_stock<C: ConnectionTrait>(
    conn: &C,
    product: &product::Model,
    quantity: i32,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    let result = product::Entity::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).sub(quantity),
        )
        .col_expr(product::Column::UpdatedAt, Expr::value(now))
        .filter(product::Column::Id.eq(product.id))
        .filter(product::Column::Stock.gte(quantity))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(ServiceError::InsufficientStock(format!(
            "Insufficient stock for {}",
            product.name
        )));
    }
    Ok(())
}

async fn restore_stock<C: ConnectionTrait>(
    conn: &C,
    items: &[order_item::Model],
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    for item in items {
        product::Entity::update_many()
            .col_expr(
                product::Column::Stock,
                Expr::col(product::Column::Stock).add(item.quantity),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(now))
            .filter(product::Column::Id.eq(item.product_id))
            .exec(conn)
            .await?;
    }
    Ok(())
}

/// Applies a status change, undoing stock, flash and commission effects on cancel.
///
/// The update is guarded by the current status so two concurrent changes
/// cannot both succeed.
async fn transition(
    txn: &DatabaseTransaction,
    order: &order::Model,
    next: OrderStatus,
) -> Result<order::Model, ServiceError> {
    let now = Utc::now();
    let result = OrderEntity::update_many()
        .col_expr(order::Column::Status, Expr::value(next))
        .col_expr(order::Column::UpdatedAt, Expr::value(now))
        .filter(order::Column::Id.eq(order.id))
        .filter(order::Column::Status.eq(order.status))
        .exec(txn)
        .await?;
    if result.rows_affected == 0 {
        return Err(ServiceError::Conflict(
            "Order was modified concurrently; reload and retry".to_string(),
        ));
    }

    if next == OrderStatus::Cancelled {
        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .all(txn)
            .await?;
        restore_stock(txn, &items, now).await?;
        flash_sales::release_for_order(txn, order.id).await?;
        affiliates::cancel_for_order(txn, order.id).await?;
        shipments::cancel_pending_for_order(txn, order.id, now).await?;
    }

    OrderEntity::find_by_id(order.id)
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Order", order.id))
}

/// Side effects of a placement, reported once the transaction commits.
struct Placement {
    detail: OrderDetail,
    flash: Vec<(Uuid, i32)>,
    promotion_id: Option<Uuid>,
    commission: Option<crate::entities::commission::Model>,
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    currency: String,
}

impl OrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        currency: String,
    ) -> Self {
        Self {
            db,
            event_sender,
            currency,
        }
    }

    /// Places an order in a single transaction.
    ///
    /// Any failure rolls back every reservation, stock decrement and
    /// redemption made so far.
    #[instrument(skip(self, request), fields(user_id = %user_id, lines = request.items.len()))]
    pub async fn place_order(
        &self,
        user_id: Uuid,
        request: PlaceOrderRequest,
    ) -> Result<OrderDetail, ServiceError> {
        check_lines(&request.items)?;
        let country = normalize_country(&request.shipping_address.country)?;
        let currency = self.currency.clone();

        let placement = self
            .db
            .transaction::<_, Placement, ServiceError>(|txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let order_id = Uuid::new_v4();
                    let (products, store) = load_cart(txn, &request.items).await?;

                    let mut lines = Vec::with_capacity(request.items.len());
                    let mut flash = Vec::new();
                    let mut subtotal = Decimal::ZERO;
                    let mut weight = Decimal::ZERO;

                    for line in &request.items {
                        let product = products
                            .get(&line.product_id)
                            .ok_or_else(|| ServiceError::not_found("Product", line.product_id))?;

                        let unit_price = match line.flash_sale_item_id {
                            Some(item_id) => {
                                let item = flash_sales::reserve(
                                    txn,
                                    item_id,
                                    product.id,
                                    user_id,
                                    order_id,
                                    line.quantity,
                                    now,
                                )
                                .await?;
                                flash.push((item_id, line.quantity));
                                item.sale_price
                            }
                            None => round_money(product.price),
                        };
                        take_stock(txn, product, line.quantity, now).await?;

                        let line_total = pricing::line_total(unit_price, line.quantity)?;
                        subtotal = checked_sum([subtotal, line_total])?;
                        weight = product
                            .weight_kg
                            .checked_mul(Decimal::from(line.quantity))
                            .and_then(|line_weight| weight.checked_add(line_weight))
                            .ok_or_else(|| {
                                ServiceError::ValidationError(
                                    "Order weight is out of range".to_string(),
                                )
                            })?;

                        lines.push(order_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            order_id: Set(order_id),
                            product_id: Set(product.id),
                            flash_sale_item_id: Set(line.flash_sale_item_id),
                            product_name: Set(product.name.clone()),
                            unit_price: Set(unit_price),
                            quantity: Set(line.quantity),
                            line_total: Set(line_total),
                        });
                    }
                    let subtotal = check_money("subtotal", round_money(subtotal))?;

                    let quote = match request.promotion_code.as_deref().map(str::trim) {
                        Some(code) if !code.is_empty() => {
                            let promo = promotions::find_by_code(txn, code).await?;
                            Some(
                                promotions::evaluate(
                                    txn,
                                    promo,
                                    subtotal,
                                    Some(store.id),
                                    Some(user_id),
                                    now,
                                )
                                .await?,
                            )
                        }
                        _ => None,
                    };
                    let discount = quote.as_ref().map_or(Decimal::ZERO, |q| q.discount);
                    let free_shipping = quote.as_ref().map_or(false, |q| q.free_shipping);

                    let shipping_total = match request.shipping_rate_id {
                        Some(rate_id) => {
                            let (_, price) = shipping::quote_rate(
                                txn, rate_id, &country, weight, subtotal,
                            )
                            .await?;
                            if free_shipping {
                                Decimal::ZERO
                            } else {
                                price
                            }
                        }
                        None => Decimal::ZERO,
                    };

                    let total = check_money(
                        "total",
                        round_money(checked_sum([subtotal - discount, shipping_total])?),
                    )?;
                    let address = request.shipping_address;

                    let created = order::ActiveModel {
                        id: Set(order_id),
                        order_number: Set(order_number(order_id, now)),
                        user_id: Set(user_id),
                        store_id: Set(store.id),
                        status: Set(OrderStatus::Pending),
                        subtotal: Set(subtotal),
                        discount_total: Set(discount),
                        shipping_total: Set(shipping_total),
                        total: Set(total),
                        currency: Set(currency),
                        promotion_id: Set(quote.as_ref().map(|q| q.promotion.id)),
                        affiliate_id: Set(None),
                        shipping_rate_id: Set(request.shipping_rate_id),
                        recipient_name: Set(address.recipient_name.trim().to_string()),
                        address_line: Set(address.address_line.trim().to_string()),
                        city: Set(address.city.trim().to_string()),
                        country: Set(country),
                        postal_code: Set(address.postal_code.trim().to_string()),
                        phone: Set(address.phone),
                        created_at: Set(now),
                        updated_at: Set(now),
                    }
                    .insert(txn)
                    .await?;

                    let mut items = Vec::with_capacity(lines.len());
                    for line in lines {
                        items.push(line.insert(txn).await?);
                    }

                    if let Some(quote) = &quote {
                        promotions::redeem(txn, &quote.promotion, user_id, order_id, discount)
                            .await?;
                    }

                    let commission = match request.referral_code.as_deref().map(str::trim) {
                        Some(code) if !code.is_empty() => {
                            affiliates::attribute(txn, code, user_id, order_id, total, now).await?
                        }
                        _ => None,
                    };
                    let order = match &commission {
                        Some(c) => {
                            let mut active: order::ActiveModel = created.into();
                            active.affiliate_id = Set(Some(c.affiliate_id));
                            active.update(txn).await?
                        }
                        None => created,
                    };

                    Ok(Placement {
                        promotion_id: quote.map(|q| q.promotion.id),
                        detail: OrderDetail { order, items },
                        flash,
                        commission,
                    })
                })
            })
            .await?;

        let order = &placement.detail.order;
        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total,
            "Order placed"
        );

        for (item_id, quantity) in &placement.flash {
            self.event_sender
                .send_or_log(Event::FlashSaleReserved {
                    item_id: *item_id,
                    user_id,
                    quantity: *quantity,
                })
                .await;
        }
        if let Some(promotion_id) = placement.promotion_id {
            self.event_sender
                .send_or_log(Event::PromotionRedeemed {
                    promotion_id,
                    order_id: order.id,
                })
                .await;
        }
        if let Some(commission) = &placement.commission {
            self.event_sender
                .send_or_log(Event::CommissionRecorded {
                    commission_id: commission.id,
                    affiliate_id: commission.affiliate_id,
                    amount: commission.amount,
                })
                .await;
        }
        self.event_sender
            .send_or_log(Event::OrderPlaced {
                order_id: order.id,
                store_id: order.store_id,
                total: order.total,
            })
            .await;

        Ok(placement.detail)
    }

    async fn detail(&self, order: order::Model) -> Result<OrderDetail, ServiceError> {
        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .all(&*self.db)
            .await?;
        Ok(OrderDetail { order, items })
    }

    async fn paginate(
        &self,
        select: Select<OrderEntity>,
        page: Page,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        let total = select.clone().count(&*self.db).await?;
        let orders = select
            .order_by_desc(order::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit)
            .all(&*self.db)
            .await?;
        Ok((orders, total))
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<OrderStatus>,
        page: Page,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        let mut select = OrderEntity::find().filter(order::Column::UserId.eq(user_id));
        if let Some(status) = status {
            select = select.filter(order::Column::Status.eq(status));
        }
        self.paginate(select, page).await
    }

    pub async fn get_for_user(&self, user_id: Uuid, id: Uuid) -> Result<OrderDetail, ServiceError> {
        let order = OrderEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .filter(|o| o.user_id == user_id)
            .ok_or_else(|| ServiceError::not_found("Order", id))?;
        self.detail(order).await
    }

    /// Buyer cancellation, allowed while pending or paid.
    #[instrument(skip(self))]
    pub async fn cancel_for_user(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<OrderDetail, ServiceError> {
        let existing = self.get_for_user(user_id, id).await?.order;
        if !existing.status.is_customer_cancellable() {
            return Err(ServiceError::InvalidOperation(format!(
                "Order is {} and can no longer be cancelled",
                existing.status.as_str()
            )));
        }
        let updated = self.apply_transition(existing, OrderStatus::Cancelled).await?;
        self.detail(updated).await
    }

    pub async fn list_for_store(
        &self,
        store_id: Uuid,
        status: Option<OrderStatus>,
        page: Page,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        let mut select = OrderEntity::find().filter(order::Column::StoreId.eq(store_id));
        if let Some(status) = status {
            select = select.filter(order::Column::Status.eq(status));
        }
        self.paginate(select, page).await
    }

    pub async fn get_for_store(
        &self,
        store_id: Uuid,
        id: Uuid,
    ) -> Result<OrderDetail, ServiceError> {
        let order = OrderEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .filter(|o| o.store_id == store_id)
            .ok_or_else(|| ServiceError::not_found("Order", id))?;
        self.detail(order).await
    }

    #[instrument(skip(self), fields(status = next.as_str()))]
    pub async fn set_store_status(
        &self,
        store_id: Uuid,
        id: Uuid,
        next: OrderStatus,
    ) -> Result<OrderDetail, ServiceError> {
        let existing = self.get_for_store(store_id, id).await?.order;
        if !existing.status.can_transition_to(next) {
            return Err(ServiceError::InvalidOperation(format!(
                "Cannot move order from {} to {}",
                existing.status.as_str(),
                next.as_str()
            )));
        }
        let updated = self.apply_transition(existing, next).await?;
        self.detail(updated).await
    }

    pub async fn list_all(
        &self,
        query: &OrderListQuery,
        page: Page,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        let mut select = OrderEntity::find();
        if let Some(status) = query.status {
            select = select.filter(order::Column::Status.eq(status));
        }
        if let Some(store_id) = query.store_id {
            select = select.filter(order::Column::StoreId.eq(store_id));
        }
        self.paginate(select, page).await
    }

    async fn apply_transition(
        &self,
        existing: order::Model,
        next: OrderStatus,
    ) -> Result<order::Model, ServiceError> {
        let updated = self
            .db
            .transaction::<_, order::Model, ServiceError>(|txn| {
                Box::pin(async move { transition(txn, &existing, next).await })
            })
            .await?;

        if next == OrderStatus::Cancelled {
            warn!(order_id = %updated.id, "Order cancelled; stock restored");
            self.event_sender
                .send_or_log(Event::OrderCancelled(updated.id))
                .await;
        } else {
            self.event_sender
                .send_or_log(Event::OrderStatusChanged {
                    order_id: updated.id,
                    status: next.as_str().to_string(),
                })
                .await;
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn line(product_id: Uuid, quantity: i32) -> OrderLineRequest {
        OrderLineRequest {
            product_id,
            quantity,
            flash_sale_item_id: None,
        }
    }

    #[test]
    fn order_numbers_carry_date_and_id_prefix() {
        let id = Uuid::parse_str("1a2b3c4d-0000-4000-8000-000000000000").unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        assert_eq!(order_number(id, now), "ORD-20240309-1A2B3C4D");
    }

    #[test]
    fn empty_and_duplicate_lines_are_rejected() {
        let p = Uuid::new_v4();
        assert!(check_lines(&[]).is_err());
        assert!(check_lines(&[line(p, 1), line(p, 2)]).is_err());
        assert!(check_lines(&[line(p, 0)]).is_err());
        assert!(check_lines(&[line(p, 2), line(Uuid::new_v4(), 1)]).is_ok());
    }
}
