use crate::{
    entities::{
        affiliate::{self, AffiliateStatus, Entity as AffiliateEntity},
        commission::{self, CommissionStatus, Entity as CommissionEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    pricing::commission_amount,
};
use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

const REFERRAL_CODE_LEN: usize = 8;
const RECENT_COMMISSIONS: usize = 20;

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct AffiliateApplicationRequest {
    #[validate(email)]
    pub payout_email: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAffiliateRequest {
    pub status: Option<AffiliateStatus>,
    /// Percent of the order total, within (0, 100]
    pub commission_rate: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AffiliateListQuery {
    pub status: Option<AffiliateStatus>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommissionListQuery {
    pub status: Option<CommissionStatus>,
    pub affiliate_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommissionStatusRequest {
    pub status: CommissionStatus,
}

/// Commission amounts summed per status
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct CommissionTotals {
    pub pending: Decimal,
    pub approved: Decimal,
    pub paid: Decimal,
    pub cancelled: Decimal,
}

impl CommissionTotals {
    fn add(&mut self, commission: &commission::Model) {
        let bucket = match commission.status {
            CommissionStatus::Pending => &mut self.pending,
            CommissionStatus::Approved => &mut self.approved,
            CommissionStatus::Paid => &mut self.paid,
            CommissionStatus::Cancelled => &mut self.cancelled,
        };
        *bucket += commission.amount;
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AffiliateDashboard {
    pub affiliate: affiliate::Model,
    pub totals: CommissionTotals,
    pub commission_count: u64,
    pub recent_commissions: Vec<commission::Model>,
}

fn generate_referral_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFERRAL_CODE_LEN)
        .map(char::from)
        .collect::<String>()
        .to_uppercase()
}

fn check_rate(rate: Decimal) -> Result<(), ServiceError> {
    if rate <= Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
        return Err(ServiceError::ValidationError(
            "commission_rate must be greater than 0 and at most 100".to_string(),
        ));
    }
    Ok(())
}

/// Records a pending commission when `referral_code` belongs to an approved
/// affiliate other than the buyer.
///
/// Unknown or ineligible codes are logged and ignored so they never block
/// checkout.
pub async fn attribute<C: ConnectionTrait>(
    conn: &C,
    referral_code: &str,
    buyer_id: Uuid,
    order_id: Uuid,
    order_total: Decimal,
    now: DateTime<Utc>,
) -> Result<Option<commission::Model>, ServiceError> {
    let code = referral_code.trim().to_uppercase();
    let affiliate = AffiliateEntity::find()
        .filter(affiliate::Column::ReferralCode.eq(code.as_str()))
        .one(conn)
        .await?;

    let affiliate = match affiliate {
        Some(a) if a.status == AffiliateStatus::Approved && a.user_id != buyer_id => a,
        Some(_) => {
            warn!(
                referral_code = %code,
                %order_id,
                "Referral code not eligible; skipping commission"
            );
            return Ok(None);
        }
        None => {
            warn!(referral_code = %code, %order_id, "Unknown referral code; skipping commission");
            return Ok(None);
        }
    };

    let created = commission::ActiveModel {
        id: Set(Uuid::new_v4()),
        affiliate_id: Set(affiliate.id),
        order_id: Set(order_id),
        order_total: Set(order_total),
        rate: Set(affiliate.commission_rate),
        amount: Set(commission_amount(order_total, affiliate.commission_rate)?),
        status: Set(CommissionStatus::Pending),
        paid_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await?;

    Ok(Some(created))
}

/// Cancels any still-open commission for a cancelled order.
pub async fn cancel_for_order<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> Result<u64, ServiceError> {
    let result = CommissionEntity::update_many()
        .col_expr(commission::Column::Status, Expr::value(CommissionStatus::Cancelled))
        .col_expr(commission::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(commission::Column::OrderId.eq(order_id))
        .filter(
            commission::Column::Status
                .is_in([CommissionStatus::Pending, CommissionStatus::Approved]),
        )
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

#[derive(Clone)]
pub struct AffiliateService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    default_rate: Decimal,
}

impl AffiliateService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        default_rate: Decimal,
    ) -> Self {
        Self {
            db,
            event_sender,
            default_rate,
        }
    }

    async fn unique_code(&self) -> Result<String, ServiceError> {
        for _ in 0..5 {
            let code = generate_referral_code();
            let taken = AffiliateEntity::find()
                .filter(affiliate::Column::ReferralCode.eq(code.as_str()))
                .count(&*self.db)
                .await?;
            if taken == 0 {
                return Ok(code);
            }
        }
        Err(ServiceError::InternalError(
            "Could not allocate a unique referral code".to_string(),
        ))
    }

    #[instrument(skip(self, request))]
    pub async fn apply(
        &self,
        user_id: Uuid,
        request: AffiliateApplicationRequest,
    ) -> Result<affiliate::Model, ServiceError> {
        let existing = AffiliateEntity::find()
            .filter(affiliate::Column::UserId.eq(user_id))
            .count(&*self.db)
            .await?;
        if existing > 0 {
            return Err(ServiceError::Conflict(
                "You have already applied to the affiliate program".to_string(),
            ));
        }

        let now = Utc::now();
        let created = affiliate::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            referral_code: Set(self.unique_code().await?),
            commission_rate: Set(self.default_rate),
            status: Set(AffiliateStatus::Pending),
            payout_email: Set(request.payout_email.map(|e| e.trim().to_lowercase())),
            website: Set(request.website),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(affiliate_id = %created.id, "Affiliate application received");
        self.event_sender
            .send_or_log(Event::AffiliateApplied(created.id))
            .await;
        Ok(created)
    }

    pub async fn dashboard(&self, user_id: Uuid) -> Result<AffiliateDashboard, ServiceError> {
        let affiliate = AffiliateEntity::find()
            .filter(affiliate::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("You are not an affiliate".to_string()))?;

        let commissions = CommissionEntity::find()
            .filter(commission::Column::AffiliateId.eq(affiliate.id))
            .order_by_desc(commission::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let mut totals = CommissionTotals::default();
        commissions.iter().for_each(|c| totals.add(c));

        Ok(AffiliateDashboard {
            commission_count: commissions.len() as u64,
            recent_commissions: commissions
                .into_iter()
                .take(RECENT_COMMISSIONS)
                .collect(),
            totals,
            affiliate,
        })
    }

    pub async fn list_affiliates(
        &self,
        status: Option<AffiliateStatus>,
    ) -> Result<Vec<affiliate::Model>, ServiceError> {
        let mut query = AffiliateEntity::find();
        if let Some(status) = status {
            query = query.filter(affiliate::Column::Status.eq(status));
        }
        Ok(query
            .order_by_desc(affiliate::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, request))]
    pub async fn update_affiliate(
        &self,
        id: Uuid,
        request: UpdateAffiliateRequest,
    ) -> Result<affiliate::Model, ServiceError> {
        let existing = AffiliateEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Affiliate", id))?;
        if let Some(rate) = request.commission_rate {
            check_rate(rate)?;
        }

        let mut active: affiliate::ActiveModel = existing.into();
        if let Some(status) = request.status {
            active.status = Set(status);
        }
        if let Some(rate) = request.commission_rate {
            active.commission_rate = Set(rate);
        }
        active.updated_at = Set(Utc::now());
        Ok(active.update(&*self.db).await?)
    }

    pub async fn list_commissions(
        &self,
        query: &CommissionListQuery,
    ) -> Result<Vec<commission::Model>, ServiceError> {
        let mut select = CommissionEntity::find();
        if let Some(status) = query.status {
            select = select.filter(commission::Column::Status.eq(status));
        }
        if let Some(affiliate_id) = query.affiliate_id {
            select = select.filter(commission::Column::AffiliateId.eq(affiliate_id));
        }
        Ok(select
            .order_by_desc(commission::Column::CreatedAt)
            .limit(500)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn set_commission_status(
        &self,
        id: Uuid,
        status: CommissionStatus,
    ) -> Result<commission::Model, ServiceError> {
        let existing = CommissionEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Commission", id))?;
        if !existing.status.can_transition_to(status) {
            return Err(ServiceError::InvalidOperation(format!(
                "Cannot move commission from {} to {}",
                existing.status.as_str(),
                status.as_str()
            )));
        }

        let now = Utc::now();
        let mut active: commission::ActiveModel = existing.into();
        active.status = Set(status);
        if status == CommissionStatus::Paid {
            active.paid_at = Set(Some(now));
        }
        active.updated_at = Set(now);
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CommissionStatusChanged {
                commission_id: id,
                status: status.as_str().to_string(),
            })
            .await;
        Ok(updated)
    }
}
