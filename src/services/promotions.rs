use crate::{
    entities::{
        promotion::{self, Entity as PromotionEntity, PromotionType},
        promotion_redemption,
    },
    errors::ServiceError,
    pricing::{check_money, promotion_discount, round_money},
    services::categories::double_option,
};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    static ref CODE_RE: Regex =
        Regex::new(r"^[A-Z0-9_-]{3,32}$").expect("valid promotion code regex");
}

/// Uppercases a code and checks the allowed alphabet.
pub fn normalize_code(code: &str) -> Result<String, ServiceError> {
    let code = code.trim().to_ascii_uppercase();
    if !CODE_RE.is_match(&code) {
        return Err(ServiceError::ValidationError(
            "Promotion code must be 3-32 characters of A-Z, 0-9, '_' or '-'".to_string(),
        ));
    }
    Ok(code)
}

/// Which promotions a caller manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionScope {
    /// Admins: creates platform-wide promotions, may edit any.
    Platform,
    /// Sellers: their own store's promotions only.
    Store(Uuid),
}

impl PromotionScope {
    fn store_id(&self) -> Option<Uuid> {
        match self {
            PromotionScope::Platform => None,
            PromotionScope::Store(id) => Some(*id),
        }
    }

    fn can_manage(&self, promo: &promotion::Model) -> bool {
        match self {
            PromotionScope::Platform => true,
            PromotionScope::Store(id) => promo.store_id == Some(*id),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePromotionRequest {
    pub code: String,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub promotion_type: PromotionType,
    pub discount_value: Decimal,
    pub min_order_amount: Option<Decimal>,
    pub max_discount_amount: Option<Decimal>,
    #[validate(range(min = 1))]
    pub usage_limit: Option<i32>,
    #[validate(range(min = 1))]
    pub per_user_limit: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePromotionRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub discount_value: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Decimal>)]
    pub min_order_amount: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Decimal>)]
    pub max_discount_amount: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub usage_limit: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub per_user_limit: Option<Option<i32>>,
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub ends_at: Option<Option<DateTime<Utc>>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PromotionListQuery {
    pub is_active: Option<bool>,
    /// Admin only: restrict to one store
    pub store_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidatePromotionRequest {
    pub code: String,
    pub subtotal: Decimal,
    pub store_id: Option<Uuid>,
}

/// Result of applying a promotion to a subtotal
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PromotionQuote {
    pub promotion: promotion::Model,
    pub discount: Decimal,
    pub free_shipping: bool,
}

fn check_numbers(
    promotion_type: PromotionType,
    discount_value: Decimal,
    min_order_amount: Option<Decimal>,
    max_discount_amount: Option<Decimal>,
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
    usage_limit: Option<i32>,
    per_user_limit: Option<i32>,
) -> Result<(), ServiceError> {
    let invalid = |msg: &str| Err(ServiceError::ValidationError(msg.to_string()));

    if discount_value <= Decimal::ZERO {
        return invalid("discount_value must be greater than 0");
    }
    check_money("discount_value", discount_value)?;
    if promotion_type == PromotionType::Percentage && discount_value > Decimal::ONE_HUNDRED {
        return invalid("A percentage discount cannot exceed 100");
    }
    if let Some(min) = min_order_amount {
        check_money("min_order_amount", min)?;
    }
    if max_discount_amount.map_or(false, |v| v <= Decimal::ZERO) {
        return invalid("max_discount_amount must be greater than 0");
    }
    if let Some(max) = max_discount_amount {
        check_money("max_discount_amount", max)?;
    }
    if usage_limit.map_or(false, |v| v < 1) || per_user_limit.map_or(false, |v| v < 1) {
        return invalid("Usage limits must be at least 1");
    }
    crate::services::campaigns::check_window(starts_at, ends_at)
}

/// Checks that `promo` applies to this cart and prices the discount.
///
/// `user_id` enables the per-user limit check.
pub async fn evaluate<C: ConnectionTrait>(
    conn: &C,
    promo: promotion::Model,
    subtotal: Decimal,
    store_id: Option<Uuid>,
    user_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<PromotionQuote, ServiceError> {
    let reject = |msg: String| Err(ServiceError::InvalidOperation(msg));

    if !promo.is_active || !promo.is_within_window(now) {
        return reject(format!("Promotion {} is not active", promo.code));
    }
    if promo.is_exhausted() {
        return reject(format!("Promotion {} has reached its usage limit", promo.code));
    }
    if let Some(scope) = promo.store_id {
        if store_id != Some(scope) {
            return reject(format!("Promotion {} does not apply to this store", promo.code));
        }
    }
    if let Some(min) = promo.min_order_amount {
        if subtotal < min {
            return reject(format!(
                "Promotion {} requires a minimum order of {}",
                promo.code,
                round_money(min)
            ));
        }
    }
    if let (Some(limit), Some(uid)) = (promo.per_user_limit, user_id) {
        let used = promotion_redemption::Entity::find()
            .filter(promotion_redemption::Column::PromotionId.eq(promo.id))
            .filter(promotion_redemption::Column::UserId.eq(uid))
            .count(conn)
            .await?;
        if used >= limit.max(0) as u64 {
            return reject(format!(
                "You have already used promotion {} the maximum number of times",
                promo.code
            ));
        }
    }

    let (discount, free_shipping) = promotion_discount(
        promo.promotion_type,
        promo.discount_value,
        subtotal,
        promo.max_discount_amount,
    )?;
    Ok(PromotionQuote {
        promotion: promo,
        discount,
        free_shipping,
    })
}

pub async fn find_by_code<C: ConnectionTrait>(
    conn: &C,
    code: &str,
) -> Result<promotion::Model, ServiceError> {
    let code = code.trim().to_ascii_uppercase();
    PromotionEntity::find()
        .filter(promotion::Column::Code.eq(code.clone()))
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::InvalidOperation(format!("Unknown promotion code {}", code)))
}

/// Counts one use of the promotion and records the redemption.
///
/// The increment is guarded by the usage limit, so concurrent orders cannot
/// push the counter past it.
pub async fn redeem<C: ConnectionTrait>(
    conn: &C,
    promo: &promotion::Model,
    user_id: Uuid,
    order_id: Uuid,
    discount: Decimal,
) -> Result<(), ServiceError> {
    let result = PromotionEntity::update_many()
        .col_expr(
            promotion::Column::UsageCount,
            Expr::col(promotion::Column::UsageCount).add(1),
        )
        .col_expr(promotion::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(promotion::Column::Id.eq(promo.id))
        .filter(
            sea_orm::Condition::any()
                .add(promotion::Column::UsageLimit.is_null())
                .add(
                    Expr::col(promotion::Column::UsageCount)
                        .lt(Expr::col(promotion::Column::UsageLimit)),
                ),
        )
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(ServiceError::Conflict(format!(
            "Promotion {} has reached its usage limit",
            promo.code
        )));
    }

    promotion_redemption::ActiveModel {
        id: Set(Uuid::new_v4()),
        promotion_id: Set(promo.id),
        user_id: Set(user_id),
        order_id: Set(order_id),
        discount_amount: Set(discount),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await?;
    Ok(())
}

#[derive(Clone)]
pub struct PromotionService {
    db: Arc<DatabaseConnection>,
}

impl PromotionService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn get_scoped(
        &self,
        scope: PromotionScope,
        id: Uuid,
    ) -> Result<promotion::Model, ServiceError> {
        PromotionEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .filter(|p| scope.can_manage(p))
            .ok_or_else(|| ServiceError::not_found("Promotion", id))
    }

    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn create_promotion(
        &self,
        scope: PromotionScope,
        request: CreatePromotionRequest,
    ) -> Result<promotion::Model, ServiceError> {
        let code = normalize_code(&request.code)?;
        let starts_at = request.starts_at.unwrap_or_else(Utc::now);
        check_numbers(
            request.promotion_type,
            request.discount_value,
            request.min_order_amount,
            request.max_discount_amount,
            starts_at,
            request.ends_at,
            request.usage_limit,
            request.per_user_limit,
        )?;

        let taken = PromotionEntity::find()
            .filter(promotion::Column::Code.eq(code.clone()))
            .count(&*self.db)
            .await?;
        if taken > 0 {
            return Err(ServiceError::Conflict(format!(
                "Promotion code {} already exists",
                code
            )));
        }

        let now = Utc::now();
        let created = promotion::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code),
            name: Set(request.name.trim().to_string()),
            description: Set(request.description),
            store_id: Set(scope.store_id()),
            promotion_type: Set(request.promotion_type),
            discount_value: Set(round_money(request.discount_value)),
            min_order_amount: Set(request.min_order_amount.map(round_money)),
            max_discount_amount: Set(request.max_discount_amount.map(round_money)),
            usage_limit: Set(request.usage_limit),
            usage_count: Set(0),
            per_user_limit: Set(request.per_user_limit),
            starts_at: Set(starts_at),
            ends_at: Set(request.ends_at),
            is_active: Set(request.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(promotion_id = %created.id, code = %created.code, "Promotion created");
        Ok(created)
    }

    pub async fn get_promotion(
        &self,
        scope: PromotionScope,
        id: Uuid,
    ) -> Result<promotion::Model, ServiceError> {
        self.get_scoped(scope, id).await
    }

    pub async fn list_promotions(
        &self,
        scope: PromotionScope,
        query: &PromotionListQuery,
    ) -> Result<Vec<promotion::Model>, ServiceError> {
        let mut select = PromotionEntity::find();
        match scope {
            PromotionScope::Store(store_id) => {
                select = select.filter(promotion::Column::StoreId.eq(store_id));
            }
            PromotionScope::Platform => {
                if let Some(store_id) = query.store_id {
                    select = select.filter(promotion::Column::StoreId.eq(store_id));
                }
            }
        }
        if let Some(is_active) = query.is_active {
            select = select.filter(promotion::Column::IsActive.eq(is_active));
        }
        Ok(select
            .order_by_desc(promotion::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, request))]
    pub async fn update_promotion(
        &self,
        scope: PromotionScope,
        id: Uuid,
        request: UpdatePromotionRequest,
    ) -> Result<promotion::Model, ServiceError> {
        let existing = self.get_scoped(scope, id).await?;

        let discount_value = request.discount_value.unwrap_or(existing.discount_value);
        let min_order = request.min_order_amount.unwrap_or(existing.min_order_amount);
        let max_discount = request
            .max_discount_amount
            .unwrap_or(existing.max_discount_amount);
        let usage_limit = request.usage_limit.unwrap_or(existing.usage_limit);
        let per_user_limit = request.per_user_limit.unwrap_or(existing.per_user_limit);
        let starts_at = request.starts_at.unwrap_or(existing.starts_at);
        let ends_at = request.ends_at.unwrap_or(existing.ends_at);
        check_numbers(
            existing.promotion_type,
            discount_value,
            min_order,
            max_discount,
            starts_at,
            ends_at,
            usage_limit,
            per_user_limit,
        )?;

        let mut active: promotion::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }
        active.discount_value = Set(round_money(discount_value));
        active.min_order_amount = Set(min_order.map(round_money));
        active.max_discount_amount = Set(max_discount.map(round_money));
        active.usage_limit = Set(usage_limit);
        active.per_user_limit = Set(per_user_limit);
        active.starts_at = Set(starts_at);
        active.ends_at = Set(ends_at);
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }

    /// Used promotions keep their redemption history; deactivate those instead.
    #[instrument(skip(self))]
    pub async fn delete_promotion(
        &self,
        scope: PromotionScope,
        id: Uuid,
    ) -> Result<(), ServiceError> {
        let existing = self.get_scoped(scope, id).await?;
        if existing.usage_count > 0 {
            return Err(ServiceError::Conflict(
                "Promotion has been redeemed; deactivate it instead".to_string(),
            ));
        }
        existing.delete(&*self.db).await?;
        Ok(())
    }

    /// Quotes a code against a cart without redeeming it.
    #[instrument(skip(self))]
    pub async fn validate_code(
        &self,
        request: &ValidatePromotionRequest,
        user_id: Option<Uuid>,
    ) -> Result<PromotionQuote, ServiceError> {
        check_money("subtotal", request.subtotal)?;
        let promo = find_by_code(&*self.db, &request.code).await?;
        evaluate(
            &*self.db,
            promo,
            request.subtotal,
            request.store_id,
            user_id,
            Utc::now(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(" summer-10 ", Some("SUMMER-10"))]
    #[case("vip_2024", Some("VIP_2024"))]
    #[case("ab", None)]
    #[case("HAS SPACE", None)]
    #[case("EMOJI🎉", None)]
    fn code_normalisation(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(normalize_code(input).ok().as_deref(), expected);
    }

    #[test]
    fn percentage_above_hundred_is_rejected() {
        let now = Utc::now();
        let check = |kind, value, usage_limit| {
            check_numbers(kind, value, None, None, now, None, usage_limit, None)
        };
        assert!(check(PromotionType::Percentage, dec!(101), None).is_err());
        assert!(check(PromotionType::FixedAmount, dec!(101), None).is_ok());
        assert!(check(PromotionType::FixedAmount, dec!(0), None).is_err());
        assert!(check(PromotionType::FixedAmount, dec!(5), Some(0)).is_err());
        assert!(check(PromotionType::FixedAmount, dec!(10000000000), None).is_err());
    }
}
