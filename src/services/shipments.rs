use crate::{
    entities::{
        order::{self, OrderStatus},
        shipment::{self, Entity as ShipmentEntity, ShipmentStatus},
        shipping_provider,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    pricing::check_money,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, JoinType},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateShipmentRequest {
    pub provider_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub tracking_number: Option<String>,
    /// Defaults to the order's shipping total
    pub cost: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ShipmentStatusRequest {
    pub status: ShipmentStatus,
    #[validate(length(min = 1, max = 100))]
    pub tracking_number: Option<String>,
}

/// Shipment with the provider's resolved tracking link
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShipmentView {
    #[serde(flatten)]
    pub shipment: shipment::Model,
    pub provider_name: Option<String>,
    pub tracking_url: Option<String>,
}

fn view(shipment: shipment::Model, provider: Option<&shipping_provider::Model>) -> ShipmentView {
    let tracking_url = match (provider, shipment.tracking_number.as_deref()) {
        (Some(p), Some(number)) => p.tracking_url(number),
        _ => None,
    };
    ShipmentView {
        provider_name: provider.map(|p| p.name.clone()),
        tracking_url,
        shipment,
    }
}

/// Order status implied by a shipment reaching `status`, if any.
fn order_status_for(status: ShipmentStatus, current: OrderStatus) -> Option<OrderStatus> {
    match (status, current) {
        (ShipmentStatus::Shipped, OrderStatus::Paid | OrderStatus::Processing) => {
            Some(OrderStatus::Shipped)
        }
        (
            ShipmentStatus::Delivered,
            OrderStatus::Paid | OrderStatus::Processing | OrderStatus::Shipped,
        ) => Some(OrderStatus::Delivered),
        _ => None,
    }
}

/// Cancels the shipments of a cancelled order that have not left yet.
pub async fn cancel_pending_for_order<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    now: DateTime<Utc>,
) -> Result<u64, ServiceError> {
    let result = ShipmentEntity::update_many()
        .col_expr(shipment::Column::Status, Expr::value(ShipmentStatus::Cancelled))
        .col_expr(shipment::Column::UpdatedAt, Expr::value(now))
        .filter(shipment::Column::OrderId.eq(order_id))
        .filter(shipment::Column::Status.eq(ShipmentStatus::Pending))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

#[derive(Clone)]
pub struct ShipmentService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ShipmentService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    async fn providers(&self) -> Result<HashMap<Uuid, shipping_provider::Model>, ServiceError> {
        Ok(shipping_provider::Entity::find()
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect())
    }

    async fn views(
        &self,
        shipments: Vec<shipment::Model>,
    ) -> Result<Vec<ShipmentView>, ServiceError> {
        let providers = self.providers().await?;
        Ok(shipments
            .into_iter()
            .map(|s| {
                let provider = providers.get(&s.provider_id);
                view(s, provider)
            })
            .collect())
    }

    async fn store_order(
        &self,
        store_id: Uuid,
        order_id: Uuid,
    ) -> Result<order::Model, ServiceError> {
        order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .filter(|o| o.store_id == store_id)
            .ok_or_else(|| ServiceError::not_found("Order", order_id))
    }

    #[instrument(skip(self, request))]
    pub async fn create_shipment(
        &self,
        store_id: Uuid,
        order_id: Uuid,
        request: CreateShipmentRequest,
    ) -> Result<ShipmentView, ServiceError> {
        let order = self.store_order(store_id, order_id).await?;
        if !matches!(order.status, OrderStatus::Paid | OrderStatus::Processing) {
            return Err(ServiceError::InvalidOperation(format!(
                "Order is {}; only paid or processing orders can be shipped",
                order.status.as_str()
            )));
        }

        let provider = shipping_provider::Entity::find_by_id(request.provider_id)
            .one(&*self.db)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| ServiceError::not_found("Shipping provider", request.provider_id))?;

        let cost = check_money("cost", request.cost.unwrap_or(order.shipping_total))?;

        let now = Utc::now();
        let created = shipment::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            provider_id: Set(provider.id),
            tracking_number: Set(request.tracking_number.map(|t| t.trim().to_string())),
            status: Set(ShipmentStatus::Pending),
            cost: Set(cost),
            shipped_at: Set(None),
            delivered_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(shipment_id = %created.id, order_id = %order.id, "Shipment created");
        self.event_sender
            .send_or_log(Event::ShipmentCreated(created.id))
            .await;
        Ok(view(created, Some(&provider)))
    }

    /// Moves a shipment along its lifecycle and mirrors it onto the order.
    #[instrument(skip(self, request), fields(status = request.status.as_str()))]
    pub async fn update_status(
        &self,
        store_id: Uuid,
        shipment_id: Uuid,
        request: ShipmentStatusRequest,
    ) -> Result<ShipmentView, ServiceError> {
        let existing = ShipmentEntity::find_by_id(shipment_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Shipment", shipment_id))?;
        let order = self
            .store_order(store_id, existing.order_id)
            .await
            .map_err(|_| ServiceError::not_found("Shipment", shipment_id))?;

        let next = request.status;
        if order.status == OrderStatus::Cancelled && next != ShipmentStatus::Cancelled {
            return Err(ServiceError::InvalidOperation(format!(
                "Order {} is cancelled; its shipments can only be cancelled",
                order.order_number
            )));
        }
        if !existing.status.can_transition_to(next) {
            return Err(ServiceError::InvalidOperation(format!(
                "Cannot move shipment from {} to {}",
                existing.status.as_str(),
                next.as_str()
            )));
        }

        let tracking_number = request
            .tracking_number
            .map(|t| t.trim().to_string())
            .or_else(|| existing.tracking_number.clone());
        if next == ShipmentStatus::Shipped && tracking_number.is_none() {
            return Err(ServiceError::ValidationError(
                "tracking_number is required to mark a shipment as shipped".to_string(),
            ));
        }

        let order_next = order_status_for(next, order.status);
        let now = Utc::now();

        let updated = self
            .db
            .transaction::<_, shipment::Model, ServiceError>(|txn| {
                Box::pin(async move {
                    let mut active: shipment::ActiveModel = existing.into();
                    active.status = Set(next);
                    active.tracking_number = Set(tracking_number);
                    match next {
                        ShipmentStatus::Shipped => active.shipped_at = Set(Some(now)),
                        ShipmentStatus::Delivered => active.delivered_at = Set(Some(now)),
                        _ => {}
                    }
                    active.updated_at = Set(now);
                    let updated = active.update(txn).await?;

                    if let Some(status) = order_next {
                        let mut order: order::ActiveModel = order.into();
                        order.status = Set(status);
                        order.updated_at = Set(now);
                        order.update(txn).await?;
                    }
                    Ok(updated)
                })
            })
            .await?;

        self.event_sender
            .send_or_log(Event::ShipmentStatusChanged {
                shipment_id,
                status: next.as_str().to_string(),
            })
            .await;
        if let Some(status) = order_next {
            self.event_sender
                .send_or_log(Event::OrderStatusChanged {
                    order_id: updated.order_id,
                    status: status.as_str().to_string(),
                })
                .await;
        }

        let provider = shipping_provider::Entity::find_by_id(updated.provider_id)
            .one(&*self.db)
            .await?;
        Ok(view(updated, provider.as_ref()))
    }

    pub async fn list_for_store(&self, store_id: Uuid) -> Result<Vec<ShipmentView>, ServiceError> {
        let shipments = ShipmentEntity::find()
            .join(JoinType::InnerJoin, shipment::Relation::Order.def())
            .filter(order::Column::StoreId.eq(store_id))
            .order_by_desc(shipment::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        self.views(shipments).await
    }

    /// Shipments of one of the buyer's own orders.
    pub async fn list_for_buyer(
        &self,
        user_id: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<ShipmentView>, ServiceError> {
        order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .filter(|o| o.user_id == user_id)
            .ok_or_else(|| ServiceError::not_found("Order", order_id))?;

        let shipments = ShipmentEntity::find()
            .filter(shipment::Column::OrderId.eq(order_id))
            .order_by_asc(shipment::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        self.views(shipments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ShipmentStatus::Shipped, OrderStatus::Processing, Some(OrderStatus::Shipped))]
    #[case(ShipmentStatus::Shipped, OrderStatus::Paid, Some(OrderStatus::Shipped))]
    #[case(ShipmentStatus::Delivered, OrderStatus::Shipped, Some(OrderStatus::Delivered))]
    #[case(ShipmentStatus::InTransit, OrderStatus::Shipped, None)]
    #[case(ShipmentStatus::Delivered, OrderStatus::Cancelled, None)]
    fn shipment_drives_order_status(
        #[case] shipment: ShipmentStatus,
        #[case] order: OrderStatus,
        #[case] expected: Option<OrderStatus>,
    ) {
        assert_eq!(order_status_for(shipment, order), expected);
    }

    #[test]
    fn tracking_url_substitutes_number() {
        let now = Utc::now();
        let provider = shipping_provider::Model {
            id: Uuid::new_v4(),
            name: "Parcel Co".into(),
            code: "PARCEL".into(),
            tracking_url_template: Some("https://track.example/{tracking_number}".into()),
            logo_url: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let shipment = shipment::Model {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            provider_id: provider.id,
            tracking_number: Some("ZX42".into()),
            status: ShipmentStatus::Shipped,
            cost: Decimal::ZERO,
            shipped_at: Some(now),
            delivered_at: None,
            created_at: now,
            updated_at: now,
        };
        let v = view(shipment, Some(&provider));
        assert_eq!(v.tracking_url.as_deref(), Some("https://track.example/ZX42"));
        assert_eq!(v.provider_name.as_deref(), Some("Parcel Co"));
    }
}
