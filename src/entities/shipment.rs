use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "shipments")]
#[schema(as = Shipment)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Uuid,
    pub provider_id: Uuid,
    #[sea_orm(nullable)]
    pub tracking_number: Option<String>,
    pub status: ShipmentStatus,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub cost: Decimal,
    #[sea_orm(nullable)]
    pub shipped_at: Option<DateTime<Utc>>,
    #[sea_orm(nullable)]
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::shipping_provider::Entity",
        from = "Column::ProviderId",
        to = "super::shipping_provider::Column::Id"
    )]
    Provider,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::shipping_provider::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Provider.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
    strum::Display, strum::IntoStaticStr,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ShipmentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "shipped")]
    Shipped,
    #[sea_orm(string_value = "in_transit")]
    InTransit,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "returned")]
    Returned,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    pub fn can_transition_to(&self, next: ShipmentStatus) -> bool {
        use ShipmentStatus::*;
        matches!(
            (self, next),
            (Pending, Shipped)
                | (Pending, Cancelled)
                | (Shipped, InTransit)
                | (Shipped, Delivered)
                | (Shipped, Cancelled)
                | (InTransit, Delivered)
                | (InTransit, Returned)
                | (Delivered, Returned)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::ShipmentStatus::{self, *};
    use rstest::rstest;

    #[rstest]
    #[case(Pending, Shipped, true)]
    #[case(Pending, Cancelled, true)]
    #[case(Pending, Delivered, false)]
    #[case(Shipped, InTransit, true)]
    #[case(Shipped, Delivered, true)]
    #[case(InTransit, Returned, true)]
    #[case(InTransit, Cancelled, false)]
    #[case(Delivered, Returned, true)]
    #[case(Delivered, Cancelled, false)]
    #[case(Cancelled, Shipped, false)]
    #[case(Returned, Delivered, false)]
    fn shipment_transitions(
        #[case] from: ShipmentStatus,
        #[case] to: ShipmentStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }
}
