use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Scheduled promotional image unit with targeting attributes
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "banners")]
#[schema(as = Banner)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(nullable)]
    pub subtitle: Option<String>,
    pub image_url: String,
    #[sea_orm(nullable)]
    pub mobile_image_url: Option<String>,
    #[sea_orm(nullable)]
    pub link_url: Option<String>,
    pub placement: BannerPlacement,
    pub priority: i32,
    pub is_active: bool,
    pub starts_at: DateTime<Utc>,
    #[sea_orm(nullable)]
    pub ends_at: Option<DateTime<Utc>>,
    #[sea_orm(nullable)]
    pub campaign_id: Option<Uuid>,
    #[sea_orm(column_type = "Json")]
    #[schema(value_type = Vec<String>)]
    pub devices: Json,
    pub audience: BannerAudience,
    #[sea_orm(column_type = "Json")]
    #[schema(value_type = Vec<String>)]
    pub countries: Json,
    #[sea_orm(column_type = "Json")]
    #[schema(value_type = Vec<String>)]
    pub excluded_countries: Json,
    pub impressions: i64,
    pub clicks: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::campaign::Entity",
        from = "Column::CampaignId",
        to = "super::campaign::Column::Id"
    )]
    Campaign,
}

impl Related<super::campaign::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaign.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum BannerPlacement {
    #[sea_orm(string_value = "home_hero")]
    HomeHero,
    #[sea_orm(string_value = "home_secondary")]
    HomeSecondary,
    #[sea_orm(string_value = "category_top")]
    CategoryTop,
    #[sea_orm(string_value = "sidebar")]
    Sidebar,
    #[sea_orm(string_value = "popup")]
    Popup,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(24))")]
#[serde(rename_all = "snake_case")]
pub enum BannerAudience {
    #[sea_orm(string_value = "all")]
    All,
    #[sea_orm(string_value = "guest")]
    Guest,
    #[sea_orm(string_value = "authenticated")]
    Authenticated,
    #[sea_orm(string_value = "new_customer")]
    NewCustomer,
    #[sea_orm(string_value = "returning_customer")]
    ReturningCustomer,
}

/// Devices a banner may target
pub const DEVICES: [&str; 3] = ["desktop", "mobile", "tablet"];

/// Who is looking at the storefront
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Guest,
    Customer { order_count: u64 },
}

/// Visitor context a banner is matched against
#[derive(Debug, Clone)]
pub struct VisitorContext {
    pub now: DateTime<Utc>,
    pub placement: Option<BannerPlacement>,
    pub device: Option<String>,
    pub country: Option<String>,
    pub viewer: Viewer,
}

/// Reads a JSON string list column, normalising entries to lowercase.
pub fn json_list(value: &Json) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

impl Model {
    pub fn device_list(&self) -> Vec<String> {
        json_list(&self.devices)
    }

    pub fn country_list(&self) -> Vec<String> {
        json_list(&self.countries)
    }

    pub fn excluded_country_list(&self) -> Vec<String> {
        json_list(&self.excluded_countries)
    }

    fn is_scheduled(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now && self.ends_at.map_or(true, |end| now < end)
    }

    fn matches_device(&self, device: Option<&str>) -> bool {
        let targeted = self.device_list();
        if targeted.is_empty() {
            return true;
        }
        match device.map(|d| d.trim().to_ascii_lowercase()) {
            Some(d) if DEVICES.contains(&d.as_str()) => targeted.contains(&d),
            _ => false,
        }
    }

    fn matches_audience(&self, viewer: Viewer) -> bool {
        match (self.audience, viewer) {
            (BannerAudience::All, _) => true,
            (BannerAudience::Guest, Viewer::Guest) => true,
            (BannerAudience::Authenticated, Viewer::Customer { .. }) => true,
            (BannerAudience::NewCustomer, Viewer::Customer { order_count }) => order_count == 0,
            (BannerAudience::ReturningCustomer, Viewer::Customer { order_count }) => {
                order_count >= 1
            }
            _ => false,
        }
    }

    fn matches_country(&self, country: Option<&str>) -> bool {
        let included = self.country_list();
        match country.map(|c| c.trim().to_ascii_lowercase()) {
            Some(c) if !c.is_empty() => {
                if self.excluded_country_list().contains(&c) {
                    return false;
                }
                included.is_empty() || included.contains(&c)
            }
            _ => included.is_empty(),
        }
    }

    /// Every targeting rule except the campaign check, which needs the campaign row.
    pub fn matches(&self, ctx: &VisitorContext) -> bool {
        self.is_active
            && self.is_scheduled(ctx.now)
            && ctx.placement.map_or(true, |p| p == self.placement)
            && self.matches_device(ctx.device.as_deref())
            && self.matches_audience(ctx.viewer)
            && self.matches_country(ctx.country.as_deref())
    }
}
