use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Time-boxed sale with a fixed inventory pool per product
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "flash_sales")]
#[schema(as = FlashSale)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(nullable)]
    pub description: Option<String>,
    #[sea_orm(nullable)]
    pub store_id: Option<Uuid>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Phase derived from the schedule at read time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FlashSalePhase {
    Disabled,
    Upcoming,
    Live,
    Ended,
}

impl Model {
    pub fn phase(&self, now: DateTime<Utc>) -> FlashSalePhase {
        if !self.is_active {
            FlashSalePhase::Disabled
        } else if now < self.starts_at {
            FlashSalePhase::Upcoming
        } else if now < self.ends_at {
            FlashSalePhase::Live
        } else {
            FlashSalePhase::Ended
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::flash_sale_item::Entity")]
    Items,
}

impl Related<super::flash_sale_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn phase_follows_schedule() {
        let now = Utc::now();
        let mut sale = Model {
            id: Uuid::new_v4(),
            name: "Midnight".into(),
            description: None,
            store_id: None,
            starts_at: now - Duration::hours(1),
            ends_at: now + Duration::hours(1),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(sale.phase(now), FlashSalePhase::Live);
        assert_eq!(sale.phase(now - Duration::hours(2)), FlashSalePhase::Upcoming);
        assert_eq!(sale.phase(now + Duration::hours(1)), FlashSalePhase::Ended);

        sale.is_active = false;
        assert_eq!(sale.phase(now), FlashSalePhase::Disabled);
    }
}
