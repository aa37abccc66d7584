use crate::{
    entities::{
        order::{self, OrderStatus},
        product,
        store::{self, StoreStatus},
        user,
    },
    errors::ServiceError,
    services::products::LOW_STOCK_THRESHOLD,
};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Select,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

/// Order count and revenue for one store or the whole platform
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct OrderStats {
    pub order_count: u64,
    /// Keyed by order status
    pub orders_by_status: BTreeMap<String, u64>,
    /// Sum of totals of orders that were not cancelled
    pub revenue: Decimal,
}

impl OrderStats {
    fn from_orders<'a>(orders: impl IntoIterator<Item = &'a order::Model>) -> Self {
        let mut stats = OrderStats::default();
        for o in orders {
            stats.order_count += 1;
            *stats
                .orders_by_status
                .entry(o.status.as_str().to_string())
                .or_default() += 1;
            if o.status != OrderStatus::Cancelled {
                stats.revenue += o.total;
            }
        }
        stats
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SellerDashboard {
    pub store_id: Uuid,
    pub product_count: u64,
    #[serde(flatten)]
    pub orders: OrderStats,
    pub low_stock_products: Vec<product::Model>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminDashboard {
    pub user_count: u64,
    pub store_count: u64,
    pub stores_pending_review: u64,
    pub product_count: u64,
    #[serde(flatten)]
    pub orders: OrderStats,
}

#[derive(Clone)]
pub struct DashboardService {
    db: Arc<DatabaseConnection>,
}

impl DashboardService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn order_stats(&self, select: Select<order::Entity>) -> Result<OrderStats, ServiceError> {
        let orders = select.all(&*self.db).await?;
        Ok(OrderStats::from_orders(&orders))
    }

    #[instrument(skip(self))]
    pub async fn seller_dashboard(&self, store_id: Uuid) -> Result<SellerDashboard, ServiceError> {
        let product_count = product::Entity::find()
            .filter(product::Column::StoreId.eq(store_id))
            .count(&*self.db)
            .await?;
        let low_stock_products = product::Entity::find()
            .filter(product::Column::StoreId.eq(store_id))
            .filter(product::Column::Stock.lte(LOW_STOCK_THRESHOLD))
            .order_by_asc(product::Column::Stock)
            .all(&*self.db)
            .await?;
        let orders = self
            .order_stats(order::Entity::find().filter(order::Column::StoreId.eq(store_id)))
            .await?;

        Ok(SellerDashboard {
            store_id,
            product_count,
            orders,
            low_stock_products,
        })
    }

    #[instrument(skip(self))]
    pub async fn admin_dashboard(&self) -> Result<AdminDashboard, ServiceError> {
        let user_count = user::Entity::find().count(&*self.db).await?;
        let store_count = store::Entity::find().count(&*self.db).await?;
        let stores_pending_review = store::Entity::find()
            .filter(store::Column::Status.eq(StoreStatus::Pending))
            .count(&*self.db)
            .await?;
        let product_count = product::Entity::find().count(&*self.db).await?;
        let orders = self.order_stats(order::Entity::find()).await?;

        Ok(AdminDashboard {
            user_count,
            store_count,
            stores_pending_review,
            product_count,
            orders,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn order(status: OrderStatus, total: Decimal) -> order::Model {
        let now = Utc::now();
        order::Model {
            id: Uuid::new_v4(),
            order_number: "ORD-20240101-ABCDEF12".into(),
            user_id: Uuid::nil(),
            store_id: Uuid::nil(),
            status,
            subtotal: total,
            discount_total: Decimal::ZERO,
            shipping_total: Decimal::ZERO,
            total,
            currency: "USD".into(),
            promotion_id: None,
            affiliate_id: None,
            shipping_rate_id: None,
            recipient_name: "Ana".into(),
            address_line: "1 Main St".into(),
            city: "Lisbon".into(),
            country: "PT".into(),
            postal_code: "1000".into(),
            phone: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn cancelled_orders_do_not_count_towards_revenue() {
        let orders = vec![
            order(OrderStatus::Paid, dec!(20.50)),
            order(OrderStatus::Delivered, dec!(9.50)),
            order(OrderStatus::Cancelled, dec!(100)),
        ];
        let stats = OrderStats::from_orders(&orders);
        assert_eq!(stats.order_count, 3);
        assert_eq!(stats.revenue, dec!(30.00));
        assert_eq!(stats.orders_by_status.get("cancelled"), Some(&1));
        assert_eq!(stats.orders_by_status.get("paid"), Some(&1));
    }
}
