use crate::{
    entities::{
        shipment,
        shipping_provider::{self, Entity as ProviderEntity, TRACKING_PLACEHOLDER},
        shipping_rate::{self, Entity as RateEntity},
    },
    errors::ServiceError,
    pricing::{check_money, check_weight, shipping_price},
    services::{
        categories::double_option,
        common::{normalize_country, AssetPolicy},
    },
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProviderRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 2, max = 32))]
    pub code: String,
    /// URL containing `{tracking_number}`
    pub tracking_url_template: Option<String>,
    pub logo_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProviderRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(min = 2, max = 32))]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub tracking_url_template: Option<Option<String>>,
    pub logo_url: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRateRequest {
    pub provider_id: Uuid,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    /// ISO-2 destination; omit for worldwide
    pub country: Option<String>,
    pub base_price: Decimal,
    #[serde(default)]
    pub per_kg_price: Decimal,
    #[serde(default)]
    pub min_weight_kg: Decimal,
    pub max_weight_kg: Option<Decimal>,
    pub free_shipping_threshold: Option<Decimal>,
    #[validate(range(min = 0))]
    pub estimated_days_min: i32,
    #[validate(range(min = 0))]
    pub estimated_days_max: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateRateRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub country: Option<Option<String>>,
    pub base_price: Option<Decimal>,
    pub per_kg_price: Option<Decimal>,
    pub min_weight_kg: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Decimal>)]
    pub max_weight_kg: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Decimal>)]
    pub free_shipping_threshold: Option<Option<Decimal>>,
    #[validate(range(min = 0))]
    pub estimated_days_min: Option<i32>,
    #[validate(range(min = 0))]
    pub estimated_days_max: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RateListQuery {
    pub provider_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ShippingQuoteRequest {
    #[validate(length(equal = 2))]
    pub country: String,
    pub weight_kg: Decimal,
    #[serde(default)]
    pub subtotal: Decimal,
}

/// One priced shipping option
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShippingQuote {
    pub rate_id: Uuid,
    pub rate_name: String,
    pub provider_id: Uuid,
    pub provider_name: String,
    pub provider_code: String,
    pub price: Decimal,
    pub estimated_days_min: i32,
    pub estimated_days_max: i32,
}

struct RateNumbers {
    base_price: Decimal,
    per_kg_price: Decimal,
    min_weight_kg: Decimal,
    max_weight_kg: Option<Decimal>,
    free_shipping_threshold: Option<Decimal>,
    estimated_days_min: i32,
    estimated_days_max: i32,
}

impl RateNumbers {
    fn check(&self) -> Result<(), ServiceError> {
        check_money("base_price", self.base_price)?;
        check_money("per_kg_price", self.per_kg_price)?;
        check_weight("min_weight_kg", self.min_weight_kg)?;
        if let Some(max) = self.max_weight_kg {
            check_weight("max_weight_kg", max)?;
            if max <= self.min_weight_kg {
                return Err(ServiceError::ValidationError(
                    "max_weight_kg must be greater than min_weight_kg".to_string(),
                ));
            }
        }
        if let Some(threshold) = self.free_shipping_threshold {
            check_money("free_shipping_threshold", threshold)?;
        }
        if self.estimated_days_min > self.estimated_days_max {
            return Err(ServiceError::ValidationError(
                "estimated_days_min cannot exceed estimated_days_max".to_string(),
            ));
        }
        Ok(())
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

fn check_template(template: Option<&str>) -> Result<(), ServiceError> {
    match template {
        Some(t) if !t.contains(TRACKING_PLACEHOLDER) => Err(ServiceError::ValidationError(
            format!("tracking_url_template must contain {}", TRACKING_PLACEHOLDER),
        )),
        _ => Ok(()),
    }
}

fn normalize_opt_country(country: Option<&str>) -> Result<Option<String>, ServiceError> {
    match country.map(str::trim).filter(|c| !c.is_empty()) {
        Some(c) => Ok(Some(normalize_country(c)?)),
        None => Ok(None),
    }
}

/// Prices a specific rate for an order, failing when it does not serve the address.
pub async fn quote_rate<C: ConnectionTrait>(
    conn: &C,
    rate_id: Uuid,
    country: &str,
    weight_kg: Decimal,
    subtotal: Decimal,
) -> Result<(shipping_rate::Model, Decimal), ServiceError> {
    let rate = RateEntity::find_by_id(rate_id)
        .one(conn)
        .await?
        .filter(|r| r.is_active)
        .ok_or_else(|| ServiceError::not_found("Shipping rate", rate_id))?;

    let provider_active = ProviderEntity::find_by_id(rate.provider_id)
        .one(conn)
        .await?
        .map_or(false, |p| p.is_active);
    if !provider_active || !rate.covers(country, weight_kg) {
        return Err(ServiceError::InvalidOperation(format!(
            "Shipping rate {} does not serve {} for {} kg",
            rate.name, country, weight_kg
        )));
    }

    let price = shipping_price(
        rate.base_price,
        rate.per_kg_price,
        weight_kg,
        subtotal,
        rate.free_shipping_threshold,
    )?;
    Ok((rate, price))
}

#[derive(Clone)]
pub struct ShippingService {
    db: Arc<DatabaseConnection>,
    assets: AssetPolicy,
}

impl ShippingService {
    pub fn new(db: Arc<DatabaseConnection>, assets: AssetPolicy) -> Self {
        Self { db, assets }
    }

    async fn ensure_unique_code(
        &self,
        code: &str,
        except: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = ProviderEntity::find().filter(shipping_provider::Column::Code.eq(code));
        if let Some(id) = except {
            query = query.filter(shipping_provider::Column::Id.ne(id));
        }
        if query.count(&*self.db).await? > 0 {
            return Err(ServiceError::Conflict(format!(
                "Shipping provider code '{}' already exists",
                code
            )));
        }
        Ok(())
    }

    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn create_provider(
        &self,
        request: CreateProviderRequest,
    ) -> Result<shipping_provider::Model, ServiceError> {
        let code = normalize_code(&request.code);
        check_template(request.tracking_url_template.as_deref())?;
        self.assets.check_opt("logo_url", request.logo_url.as_deref())?;
        self.ensure_unique_code(&code, None).await?;

        let now = Utc::now();
        let created = shipping_provider::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            code: Set(code),
            tracking_url_template: Set(request.tracking_url_template),
            logo_url: Set(request.logo_url),
            is_active: Set(request.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(provider_id = %created.id, "Shipping provider created");
        Ok(created)
    }

    pub async fn get_provider(&self, id: Uuid) -> Result<shipping_provider::Model, ServiceError> {
        ProviderEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Shipping provider", id))
    }

    pub async fn list_providers(&self) -> Result<Vec<shipping_provider::Model>, ServiceError> {
        Ok(ProviderEntity::find()
            .order_by_asc(shipping_provider::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, request))]
    pub async fn update_provider(
        &self,
        id: Uuid,
        request: UpdateProviderRequest,
    ) -> Result<shipping_provider::Model, ServiceError> {
        let existing = self.get_provider(id).await?;
        if let Some(Some(template)) = &request.tracking_url_template {
            check_template(Some(template))?;
        }
        self.assets.check_opt("logo_url", request.logo_url.as_deref())?;

        let mut active: shipping_provider::ActiveModel = existing.into();
        if let Some(code) = request.code {
            let code = normalize_code(&code);
            self.ensure_unique_code(&code, Some(id)).await?;
            active.code = Set(code);
        }
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(template) = request.tracking_url_template {
            active.tracking_url_template = Set(template);
        }
        if let Some(logo_url) = request.logo_url {
            active.logo_url = Set(Some(logo_url));
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }

    /// Deletes the provider with its rates; refused while shipments use it.
    #[instrument(skip(self))]
    pub async fn delete_provider(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_provider(id).await?;
        let shipments = shipment::Entity::find()
            .filter(shipment::Column::ProviderId.eq(id))
            .count(&*self.db)
            .await?;
        if shipments > 0 {
            return Err(ServiceError::Conflict(
                "Shipping provider is referenced by shipments".to_string(),
            ));
        }

        self.db
            .transaction::<_, (), ServiceError>(|txn| {
                Box::pin(async move {
                    RateEntity::delete_many()
                        .filter(shipping_rate::Column::ProviderId.eq(id))
                        .exec(txn)
                        .await?;
                    existing.delete(txn).await?;
                    Ok(())
                })
            })
            .await?;

        info!(provider_id = %id, "Shipping provider deleted");
        Ok(())
    }

    #[instrument(skip(self, request), fields(provider_id = %request.provider_id))]
    pub async fn create_rate(
        &self,
        request: CreateRateRequest,
    ) -> Result<shipping_rate::Model, ServiceError> {
        self.get_provider(request.provider_id).await?;
        RateNumbers {
            base_price: request.base_price,
            per_kg_price: request.per_kg_price,
            min_weight_kg: request.min_weight_kg,
            max_weight_kg: request.max_weight_kg,
            free_shipping_threshold: request.free_shipping_threshold,
            estimated_days_min: request.estimated_days_min,
            estimated_days_max: request.estimated_days_max,
        }
        .check()?;
        let country = normalize_opt_country(request.country.as_deref())?;

        let now = Utc::now();
        let created = shipping_rate::ActiveModel {
            id: Set(Uuid::new_v4()),
            provider_id: Set(request.provider_id),
            name: Set(request.name.trim().to_string()),
            country: Set(country),
            base_price: Set(request.base_price),
            per_kg_price: Set(request.per_kg_price),
            min_weight_kg: Set(request.min_weight_kg),
            max_weight_kg: Set(request.max_weight_kg),
            free_shipping_threshold: Set(request.free_shipping_threshold),
            estimated_days_min: Set(request.estimated_days_min),
            estimated_days_max: Set(request.estimated_days_max),
            is_active: Set(request.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;
        Ok(created)
    }

    pub async fn get_rate(&self, id: Uuid) -> Result<shipping_rate::Model, ServiceError> {
        RateEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Shipping rate", id))
    }

    pub async fn list_rates(
        &self,
        provider_id: Option<Uuid>,
    ) -> Result<Vec<shipping_rate::Model>, ServiceError> {
        let mut query = RateEntity::find();
        if let Some(provider_id) = provider_id {
            query = query.filter(shipping_rate::Column::ProviderId.eq(provider_id));
        }
        Ok(query
            .order_by_asc(shipping_rate::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, request))]
    pub async fn update_rate(
        &self,
        id: Uuid,
        request: UpdateRateRequest,
    ) -> Result<shipping_rate::Model, ServiceError> {
        let existing = self.get_rate(id).await?;

        let numbers = RateNumbers {
            base_price: request.base_price.unwrap_or(existing.base_price),
            per_kg_price: request.per_kg_price.unwrap_or(existing.per_kg_price),
            min_weight_kg: request.min_weight_kg.unwrap_or(existing.min_weight_kg),
            max_weight_kg: request.max_weight_kg.unwrap_or(existing.max_weight_kg),
            free_shipping_threshold: request
                .free_shipping_threshold
                .unwrap_or(existing.free_shipping_threshold),
            estimated_days_min: request.estimated_days_min.unwrap_or(existing.estimated_days_min),
            estimated_days_max: request.estimated_days_max.unwrap_or(existing.estimated_days_max),
        };
        numbers.check()?;

        let mut active: shipping_rate::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(country) = request.country {
            active.country = Set(normalize_opt_country(country.as_deref())?);
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }
        active.base_price = Set(numbers.base_price);
        active.per_kg_price = Set(numbers.per_kg_price);
        active.min_weight_kg = Set(numbers.min_weight_kg);
        active.max_weight_kg = Set(numbers.max_weight_kg);
        active.free_shipping_threshold = Set(numbers.free_shipping_threshold);
        active.estimated_days_min = Set(numbers.estimated_days_min);
        active.estimated_days_max = Set(numbers.estimated_days_max);
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }

    pub async fn delete_rate(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_rate(id).await?;
        existing.delete(&*self.db).await?;
        Ok(())
    }

    /// Every active rate that serves the destination and weight, cheapest first.
    #[instrument(skip(self, request), fields(country = %request.country))]
    pub async fn quote(
        &self,
        request: &ShippingQuoteRequest,
    ) -> Result<Vec<ShippingQuote>, ServiceError> {
        check_weight("weight_kg", request.weight_kg)?;
        check_money("subtotal", request.subtotal)?;
        let country = normalize_country(&request.country)?;

        let providers: HashMap<Uuid, shipping_provider::Model> = ProviderEntity::find()
            .filter(shipping_provider::Column::IsActive.eq(true))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        let rates = RateEntity::find()
            .filter(shipping_rate::Column::IsActive.eq(true))
            .all(&*self.db)
            .await?;

        let mut quotes = Vec::new();
        for rate in rates {
            if !rate.covers(&country, request.weight_kg) {
                continue;
            }
            let Some(provider) = providers.get(&rate.provider_id) else {
                continue;
            };
            quotes.push(ShippingQuote {
                price: shipping_price(
                    rate.base_price,
                    rate.per_kg_price,
                    request.weight_kg,
                    request.subtotal,
                    rate.free_shipping_threshold,
                )?,
                rate_id: rate.id,
                rate_name: rate.name,
                provider_id: provider.id,
                provider_name: provider.name.clone(),
                provider_code: provider.code.clone(),
                estimated_days_min: rate.estimated_days_min,
                estimated_days_max: rate.estimated_days_max,
            });
        }

        sort_quotes(&mut quotes);
        Ok(quotes)
    }
}

fn sort_quotes(quotes: &mut [ShippingQuote]) {
    quotes.sort_by(|a, b| {
        a.price
            .cmp(&b.price)
            .then(a.estimated_days_min.cmp(&b.estimated_days_min))
            .then(a.estimated_days_max.cmp(&b.estimated_days_max))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn numbers() -> RateNumbers {
        RateNumbers {
            base_price: dec!(5),
            per_kg_price: dec!(1.5),
            min_weight_kg: dec!(0),
            max_weight_kg: Some(dec!(20)),
            free_shipping_threshold: None,
            estimated_days_min: 2,
            estimated_days_max: 5,
        }
    }

    #[test]
    fn valid_rate_passes() {
        assert!(numbers().check().is_ok());
    }

    #[rstest]
    #[case(RateNumbers { base_price: dec!(-1), ..numbers() })]
    #[case(RateNumbers { per_kg_price: dec!(-0.01), ..numbers() })]
    #[case(RateNumbers { max_weight_kg: Some(dec!(0)), ..numbers() })]
    #[case(RateNumbers { estimated_days_min: 6, ..numbers() })]
    fn invalid_rates_are_rejected(#[case] rate: RateNumbers) {
        assert!(matches!(rate.check(), Err(ServiceError::ValidationError(_))));
    }

    #[test]
    fn tracking_template_needs_placeholder() {
        assert!(check_template(Some("https://track.example/{tracking_number}")).is_ok());
        assert!(check_template(Some("https://track.example/")).is_err());
        assert!(check_template(None).is_ok());
    }

    #[test]
    fn quotes_sort_by_price_then_speed() {
        let quote = |price: Decimal, days: i32| ShippingQuote {
            rate_id: Uuid::new_v4(),
            rate_name: "r".into(),
            provider_id: Uuid::new_v4(),
            provider_name: "p".into(),
            provider_code: "P".into(),
            price,
            estimated_days_min: days,
            estimated_days_max: days + 2,
        };
        let mut quotes = vec![quote(dec!(9), 1), quote(dec!(4), 5), quote(dec!(4), 2)];
        sort_quotes(&mut quotes);
        let order: Vec<(Decimal, i32)> = quotes
            .iter()
            .map(|q| (q.price, q.estimated_days_min))
            .collect();
        assert_eq!(order, vec![(dec!(4), 2), (dec!(4), 5), (dec!(9), 1)]);
    }
}
