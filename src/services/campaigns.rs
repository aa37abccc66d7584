use crate::{
    entities::{
        banner,
        campaign::{self, CampaignStatus, Entity as CampaignEntity},
    },
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCampaignRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub status: Option<CampaignStatus>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCampaignRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub status: Option<CampaignStatus>,
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "crate::services::categories::double_option")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub ends_at: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CampaignListQuery {
    pub status: Option<CampaignStatus>,
}

pub(crate) fn check_window(
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
) -> Result<(), ServiceError> {
    match ends_at {
        Some(end) if end <= starts_at => Err(ServiceError::ValidationError(
            "ends_at must be after starts_at".to_string(),
        )),
        _ => Ok(()),
    }
}

#[derive(Clone)]
pub struct CampaignService {
    db: Arc<DatabaseConnection>,
}

impl CampaignService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_campaign(
        &self,
        request: CreateCampaignRequest,
    ) -> Result<campaign::Model, ServiceError> {
        check_window(request.starts_at, request.ends_at)?;

        let now = Utc::now();
        let created = campaign::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            description: Set(request.description),
            status: Set(request.status.unwrap_or(CampaignStatus::Draft)),
            starts_at: Set(request.starts_at),
            ends_at: Set(request.ends_at),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(campaign_id = %created.id, "Campaign created");
        Ok(created)
    }

    pub async fn get_campaign(&self, id: Uuid) -> Result<campaign::Model, ServiceError> {
        CampaignEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Campaign", id))
    }

    pub async fn list_campaigns(
        &self,
        status: Option<CampaignStatus>,
    ) -> Result<Vec<campaign::Model>, ServiceError> {
        let mut query = CampaignEntity::find();
        if let Some(status) = status {
            query = query.filter(campaign::Column::Status.eq(status));
        }
        Ok(query
            .order_by_desc(campaign::Column::StartsAt)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, request))]
    pub async fn update_campaign(
        &self,
        id: Uuid,
        request: UpdateCampaignRequest,
    ) -> Result<campaign::Model, ServiceError> {
        let existing = self.get_campaign(id).await?;
        let starts_at = request.starts_at.unwrap_or(existing.starts_at);
        let ends_at = request.ends_at.unwrap_or(existing.ends_at);
        check_window(starts_at, ends_at)?;

        let mut active: campaign::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(status) = request.status {
            active.status = Set(status);
        }
        active.starts_at = Set(starts_at);
        active.ends_at = Set(ends_at);
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }

    /// Deletes the campaign and detaches its banners.
    #[instrument(skip(self))]
    pub async fn delete_campaign(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_campaign(id).await?;

        self.db
            .transaction::<_, (), ServiceError>(|txn| {
                Box::pin(async move {
                    banner::Entity::update_many()
                        .col_expr(banner::Column::CampaignId, Expr::value(Option::<Uuid>::None))
                        .col_expr(banner::Column::UpdatedAt, Expr::value(Utc::now()))
                        .filter(banner::Column::CampaignId.eq(id))
                        .exec(txn)
                        .await?;
                    existing.delete(txn).await?;
                    Ok(())
                })
            })
            .await?;

        info!(campaign_id = %id, "Campaign deleted");
        Ok(())
    }
}
