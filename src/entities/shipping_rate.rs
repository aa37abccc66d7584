use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "shipping_rates")]
#[schema(as = ShippingRate)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub provider_id: Uuid,
    pub name: String,
    /// ISO-2 destination, empty for worldwide
    #[sea_orm(nullable)]
    pub country: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub base_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub per_kg_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 3)))")]
    pub min_weight_kg: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 3)))", nullable)]
    pub max_weight_kg: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub free_shipping_threshold: Option<Decimal>,
    pub estimated_days_min: i32,
    pub estimated_days_max: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Whether this rate serves the destination and parcel weight.
    pub fn covers(&self, country: &str, weight_kg: Decimal) -> bool {
        let country_ok = self
            .country
            .as_deref()
            .map_or(true, |c| c.eq_ignore_ascii_case(country.trim()));
        country_ok
            && self.min_weight_kg <= weight_kg
            && self.max_weight_kg.map_or(true, |max| weight_kg <= max)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shipping_provider::Entity",
        from = "Column::ProviderId",
        to = "super::shipping_provider::Column::Id"
    )]
    Provider,
}

impl Related<super::shipping_provider::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Provider.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
