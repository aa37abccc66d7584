use crate::{
    entities::{
        banner::{
            self, BannerAudience, BannerPlacement, Entity as BannerEntity, Viewer, VisitorContext,
            DEVICES,
        },
        campaign, order,
    },
    errors::ServiceError,
    services::{
        campaigns::check_window,
        categories::double_option,
        common::{normalize_countries, AssetPolicy},
    },
};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, Set,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBannerRequest {
    #[validate(length(min = 1, max = 160))]
    pub title: String,
    #[validate(length(max = 255))]
    pub subtitle: Option<String>,
    pub image_url: String,
    pub mobile_image_url: Option<String>,
    #[validate(url)]
    pub link_url: Option<String>,
    pub placement: BannerPlacement,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub campaign_id: Option<Uuid>,
    #[serde(default)]
    pub devices: Vec<String>,
    pub audience: Option<BannerAudience>,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub excluded_countries: Vec<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBannerRequest {
    #[validate(length(min = 1, max = 160))]
    pub title: Option<String>,
    #[validate(length(max = 255))]
    pub subtitle: Option<String>,
    pub image_url: Option<String>,
    pub mobile_image_url: Option<String>,
    #[validate(url)]
    pub link_url: Option<String>,
    pub placement: Option<BannerPlacement>,
    pub priority: Option<i32>,
    pub is_active: Option<bool>,
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub ends_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub campaign_id: Option<Option<Uuid>>,
    pub devices: Option<Vec<String>>,
    pub audience: Option<BannerAudience>,
    pub countries: Option<Vec<String>>,
    pub excluded_countries: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BannerAdminQuery {
    pub placement: Option<BannerPlacement>,
    pub campaign_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BannerVisitorQuery {
    pub placement: Option<BannerPlacement>,
    /// desktop, mobile or tablet
    pub device: Option<String>,
    /// ISO 3166-1 alpha-2
    pub country: Option<String>,
}

fn normalize_devices(devices: &[String]) -> Result<Vec<String>, ServiceError> {
    let mut out: Vec<String> = Vec::new();
    for device in devices {
        let device = device.trim().to_ascii_lowercase();
        if !DEVICES.contains(&device.as_str()) {
            return Err(ServiceError::ValidationError(format!(
                "Unknown device '{}': expected one of {}",
                device,
                DEVICES.join(", ")
            )));
        }
        if !out.contains(&device) {
            out.push(device);
        }
    }
    Ok(out)
}

/// Orders matched banners: priority first, then newest.
pub fn rank(banners: &mut [banner::Model]) {
    banners.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

#[derive(Clone)]
pub struct BannerService {
    db: Arc<DatabaseConnection>,
    assets: AssetPolicy,
}

impl BannerService {
    pub fn new(db: Arc<DatabaseConnection>, assets: AssetPolicy) -> Self {
        Self { db, assets }
    }

    async fn ensure_campaign(&self, campaign_id: Uuid) -> Result<(), ServiceError> {
        campaign::Entity::find_by_id(campaign_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Campaign", campaign_id))?;
        Ok(())
    }

    #[instrument(skip(self, request), fields(title = %request.title))]
    pub async fn create_banner(
        &self,
        request: CreateBannerRequest,
    ) -> Result<banner::Model, ServiceError> {
        self.assets.check("image_url", &request.image_url)?;
        self.assets
            .check_opt("mobile_image_url", request.mobile_image_url.as_deref())?;
        let starts_at = request.starts_at.unwrap_or_else(Utc::now);
        check_window(starts_at, request.ends_at)?;
        if let Some(campaign_id) = request.campaign_id {
            self.ensure_campaign(campaign_id).await?;
        }
        let devices = normalize_devices(&request.devices)?;
        let countries = normalize_countries(&request.countries)?;
        let excluded = normalize_countries(&request.excluded_countries)?;

        let now = Utc::now();
        let created = banner::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(request.title.trim().to_string()),
            subtitle: Set(request.subtitle),
            image_url: Set(request.image_url),
            mobile_image_url: Set(request.mobile_image_url),
            link_url: Set(request.link_url),
            placement: Set(request.placement),
            priority: Set(request.priority),
            is_active: Set(request.is_active),
            starts_at: Set(starts_at),
            ends_at: Set(request.ends_at),
            campaign_id: Set(request.campaign_id),
            devices: Set(json!(devices)),
            audience: Set(request.audience.unwrap_or(BannerAudience::All)),
            countries: Set(json!(countries)),
            excluded_countries: Set(json!(excluded)),
            impressions: Set(0),
            clicks: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(banner_id = %created.id, "Banner created");
        Ok(created)
    }

    pub async fn get_banner(&self, id: Uuid) -> Result<banner::Model, ServiceError> {
        BannerEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Banner", id))
    }

    pub async fn list_banners(
        &self,
        query: &BannerAdminQuery,
    ) -> Result<Vec<banner::Model>, ServiceError> {
        let mut select = BannerEntity::find();
        if let Some(placement) = query.placement {
            select = select.filter(banner::Column::Placement.eq(placement));
        }
        if let Some(campaign_id) = query.campaign_id {
            select = select.filter(banner::Column::CampaignId.eq(campaign_id));
        }
        let mut banners = select.all(&*self.db).await?;
        rank(&mut banners);
        Ok(banners)
    }

    #[instrument(skip(self, request))]
    pub async fn update_banner(
        &self,
        id: Uuid,
        request: UpdateBannerRequest,
    ) -> Result<banner::Model, ServiceError> {
        let existing = self.get_banner(id).await?;

        if let Some(image_url) = request.image_url.as_deref() {
            self.assets.check("image_url", image_url)?;
        }
        self.assets
            .check_opt("mobile_image_url", request.mobile_image_url.as_deref())?;

        let starts_at = request.starts_at.unwrap_or(existing.starts_at);
        let ends_at = request.ends_at.unwrap_or(existing.ends_at);
        check_window(starts_at, ends_at)?;
        if let Some(Some(campaign_id)) = request.campaign_id {
            self.ensure_campaign(campaign_id).await?;
        }

        let mut active: banner::ActiveModel = existing.into();
        if let Some(title) = request.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(subtitle) = request.subtitle {
            active.subtitle = Set(Some(subtitle));
        }
        if let Some(image_url) = request.image_url {
            active.image_url = Set(image_url);
        }
        if let Some(mobile_image_url) = request.mobile_image_url {
            active.mobile_image_url = Set(Some(mobile_image_url));
        }
        if let Some(link_url) = request.link_url {
            active.link_url = Set(Some(link_url));
        }
        if let Some(placement) = request.placement {
            active.placement = Set(placement);
        }
        if let Some(priority) = request.priority {
            active.priority = Set(priority);
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(campaign_id) = request.campaign_id {
            active.campaign_id = Set(campaign_id);
        }
        if let Some(devices) = request.devices {
            active.devices = Set(json!(normalize_devices(&devices)?));
        }
        if let Some(audience) = request.audience {
            active.audience = Set(audience);
        }
        if let Some(countries) = request.countries {
            active.countries = Set(json!(normalize_countries(&countries)?));
        }
        if let Some(excluded) = request.excluded_countries {
            active.excluded_countries = Set(json!(normalize_countries(&excluded)?));
        }
        active.starts_at = Set(starts_at);
        active.ends_at = Set(ends_at);
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_banner(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_banner(id).await?;
        existing.delete(&*self.db).await?;
        info!(banner_id = %id, "Banner deleted");
        Ok(())
    }

    /// Banners visible to this visitor, highest priority first.
    #[instrument(skip(self))]
    pub async fn visible_banners(
        &self,
        query: &BannerVisitorQuery,
        user_id: Option<Uuid>,
    ) -> Result<Vec<banner::Model>, ServiceError> {
        let viewer = match user_id {
            Some(id) => Viewer::Customer {
                order_count: order::Entity::find()
                    .filter(order::Column::UserId.eq(id))
                    .count(&*self.db)
                    .await?,
            },
            None => Viewer::Guest,
        };

        let ctx = VisitorContext {
            now: Utc::now(),
            placement: query.placement,
            device: query.device.clone(),
            country: query.country.clone(),
            viewer,
        };

        let mut select = BannerEntity::find().filter(banner::Column::IsActive.eq(true));
        if let Some(placement) = query.placement {
            select = select.filter(banner::Column::Placement.eq(placement));
        }

        let candidates: Vec<banner::Model> = select
            .all(&*self.db)
            .await?
            .into_iter()
            .filter(|b| b.matches(&ctx))
            .collect();

        let campaign_ids: Vec<Uuid> = candidates.iter().filter_map(|b| b.campaign_id).collect();
        let running: HashMap<Uuid, bool> = if campaign_ids.is_empty() {
            HashMap::new()
        } else {
            campaign::Entity::find()
                .filter(campaign::Column::Id.is_in(campaign_ids))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|c| (c.id, c.is_running(ctx.now)))
                .collect()
        };

        let mut visible: Vec<banner::Model> = candidates
            .into_iter()
            .filter(|b| match b.campaign_id {
                Some(cid) => running.get(&cid).copied().unwrap_or(false),
                None => true,
            })
            .collect();
        rank(&mut visible);

        debug!(count = visible.len(), "Matched storefront banners");
        Ok(visible)
    }

    /// Single-statement counter increment.
    pub async fn record_impression(&self, id: Uuid) -> Result<(), ServiceError> {
        self.bump(id, banner::Column::Impressions).await
    }

    pub async fn record_click(&self, id: Uuid) -> Result<(), ServiceError> {
        self.bump(id, banner::Column::Clicks).await
    }

    async fn bump(&self, id: Uuid, column: banner::Column) -> Result<(), ServiceError> {
        let result = BannerEntity::update_many()
            .col_expr(column, Expr::col(column).add(1))
            .filter(banner::Column::Id.eq(id))
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Banner", id));
        }
        Ok(())
    }
}
