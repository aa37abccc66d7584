//! Money arithmetic shared by promotions, flash sales, shipping and commissions.
//!
//! All results are rounded to cents with half-up (away from zero) rounding.

use crate::entities::promotion::PromotionType;
use crate::errors::ServiceError;
use rust_decimal::{Decimal, RoundingStrategy};

/// Largest amount a `Decimal(12,2)` money column can hold.
pub const MAX_MONEY: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Upper bound for parcel weights in kilograms.
pub const MAX_WEIGHT_KG: Decimal = Decimal::from_parts(100_000, 0, 0, false, 0);

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn overflow(what: &str) -> ServiceError {
    ServiceError::ValidationError(format!("{what} is out of range"))
}

/// Rejects negative amounts and amounts that would not fit a money column.
pub fn check_money(field: &str, value: Decimal) -> Result<Decimal, ServiceError> {
    if value < Decimal::ZERO || value > MAX_MONEY {
        return Err(ServiceError::ValidationError(format!(
            "{field} must be between 0 and {MAX_MONEY}"
        )));
    }
    Ok(value)
}

/// Rejects negative weights and weights above [`MAX_WEIGHT_KG`].
pub fn check_weight(field: &str, value: Decimal) -> Result<Decimal, ServiceError> {
    if value < Decimal::ZERO || value > MAX_WEIGHT_KG {
        return Err(ServiceError::ValidationError(format!(
            "{field} must be between 0 and {MAX_WEIGHT_KG}"
        )));
    }
    Ok(value)
}

/// `unit_price × quantity`, rounded to cents.
pub fn line_total(unit_price: Decimal, quantity: i32) -> Result<Decimal, ServiceError> {
    unit_price
        .checked_mul(Decimal::from(quantity))
        .map(round_money)
        .ok_or_else(|| overflow("line total"))
}

/// Sums amounts, failing instead of overflowing.
pub fn checked_sum<I>(amounts: I) -> Result<Decimal, ServiceError>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
        .ok_or_else(|| overflow("total"))
}

fn percent_of(amount: Decimal, percent: Decimal) -> Option<Decimal> {
    amount
        .checked_mul(percent)?
        .checked_div(Decimal::ONE_HUNDRED)
}

/// Discount granted by a promotion against a subtotal.
///
/// Returns the discount and whether shipping becomes free.
pub fn promotion_discount(
    promotion_type: PromotionType,
    value: Decimal,
    subtotal: Decimal,
    max_discount: Option<Decimal>,
) -> Result<(Decimal, bool), ServiceError> {
    let (raw, free_shipping) = match promotion_type {
        PromotionType::Percentage => (
            percent_of(subtotal, value).ok_or_else(|| overflow("discount"))?,
            false,
        ),
        PromotionType::FixedAmount => (value, false),
        PromotionType::FreeShipping => (Decimal::ZERO, true),
    };

    let mut discount = round_money(raw);
    if let Some(cap) = max_discount {
        discount = discount.min(cap);
    }
    discount = discount.min(subtotal).max(Decimal::ZERO);
    Ok((discount, free_shipping))
}

/// Flash sale price pair `(sale_price, discount_percent)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashPricing {
    pub sale_price: Decimal,
    pub discount_percent: Decimal,
}

fn check_flash_pricing(
    original: Decimal,
    pricing: FlashPricing,
) -> Result<FlashPricing, ServiceError> {
    if pricing.sale_price <= Decimal::ZERO || pricing.sale_price >= original {
        return Err(ServiceError::ValidationError(
            "sale_price must be greater than 0 and below the original price".to_string(),
        ));
    }
    if pricing.discount_percent <= Decimal::ZERO || pricing.discount_percent >= Decimal::ONE_HUNDRED
    {
        return Err(ServiceError::ValidationError(
            "discount_percent must be between 0 and 100 exclusive".to_string(),
        ));
    }
    Ok(pricing)
}

/// Derives the discount percent from an explicit sale price.
pub fn flash_pricing_from_sale_price(
    original: Decimal,
    sale_price: Decimal,
) -> Result<FlashPricing, ServiceError> {
    if original <= Decimal::ZERO {
        return Err(ServiceError::InvalidOperation(
            "Product price must be positive to be discounted".to_string(),
        ));
    }
    let sale_price = round_money(check_money("sale_price", sale_price)?);
    let discount_percent = (original - sale_price)
        .checked_div(original)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(round_money)
        .ok_or_else(|| overflow("discount_percent"))?;
    check_flash_pricing(
        original,
        FlashPricing {
            sale_price,
            discount_percent,
        },
    )
}

/// Derives the sale price from a discount percent.
pub fn flash_pricing_from_percent(
    original: Decimal,
    discount_percent: Decimal,
) -> Result<FlashPricing, ServiceError> {
    if original <= Decimal::ZERO {
        return Err(ServiceError::InvalidOperation(
            "Product price must be positive to be discounted".to_string(),
        ));
    }
    if discount_percent <= Decimal::ZERO || discount_percent >= Decimal::ONE_HUNDRED {
        return Err(ServiceError::ValidationError(
            "discount_percent must be between 0 and 100 exclusive".to_string(),
        ));
    }
    let discount_percent = round_money(discount_percent);
    let sale_price = percent_of(original, Decimal::ONE_HUNDRED - discount_percent)
        .map(round_money)
        .ok_or_else(|| overflow("sale_price"))?;
    check_flash_pricing(
        original,
        FlashPricing {
            sale_price,
            discount_percent,
        },
    )
}

/// `base_price + per_kg_price × weight`, zeroed once the subtotal reaches the threshold.
pub fn shipping_price(
    base_price: Decimal,
    per_kg_price: Decimal,
    weight_kg: Decimal,
    subtotal: Decimal,
    free_shipping_threshold: Option<Decimal>,
) -> Result<Decimal, ServiceError> {
    if free_shipping_threshold.map_or(false, |threshold| subtotal >= threshold) {
        return Ok(Decimal::ZERO);
    }
    per_kg_price
        .checked_mul(weight_kg)
        .and_then(|weight_price| weight_price.checked_add(base_price))
        .map(round_money)
        .ok_or_else(|| overflow("shipping price"))
}

pub fn commission_amount(
    order_total: Decimal,
    rate_percent: Decimal,
) -> Result<Decimal, ServiceError> {
    percent_of(order_total, rate_percent)
        .map(round_money)
        .ok_or_else(|| overflow("commission"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn percentage_discount_rounds_half_up() {
        let (discount, free) =
            promotion_discount(PromotionType::Percentage, dec!(15), dec!(33.30), None).unwrap();
        assert_eq!(discount, dec!(5.00));
        assert!(!free);

        let (discount, _) =
            promotion_discount(PromotionType::Percentage, dec!(10), dec!(0.05), None).unwrap();
        assert_eq!(discount, dec!(0.01));
    }

    #[test]
    fn discount_is_capped_by_max_and_subtotal() {
        let (discount, _) = promotion_discount(
            PromotionType::Percentage,
            dec!(50),
            dec!(200),
            Some(dec!(30)),
        )
        .unwrap();
        assert_eq!(discount, dec!(30));

        let (discount, _) =
            promotion_discount(PromotionType::FixedAmount, dec!(25), dec!(10), None).unwrap();
        assert_eq!(discount, dec!(10));
    }

    #[test]
    fn free_shipping_gives_flag_without_discount() {
        let (discount, free) =
            promotion_discount(PromotionType::FreeShipping, dec!(1), dec!(80), None).unwrap();
        assert_eq!(discount, Decimal::ZERO);
        assert!(free);
    }

    #[test]
    fn flash_percent_from_sale_price() {
        let pricing = flash_pricing_from_sale_price(dec!(80), dec!(60)).unwrap();
        assert_eq!(pricing.discount_percent, dec!(25));
        assert_eq!(pricing.sale_price, dec!(60));
    }

    #[test]
    fn flash_sale_price_from_percent() {
        let pricing = flash_pricing_from_percent(dec!(19.99), dec!(15)).unwrap();
        assert_eq!(pricing.sale_price, dec!(16.99));
    }

    #[test]
    fn flash_pricing_rejects_out_of_range_values() {
        assert!(flash_pricing_from_sale_price(dec!(50), dec!(50)).is_err());
        assert!(flash_pricing_from_sale_price(dec!(50), dec!(0)).is_err());
        assert!(flash_pricing_from_percent(dec!(50), dec!(100)).is_err());
        assert!(flash_pricing_from_percent(dec!(50), dec!(0)).is_err());
    }

    #[test]
    fn shipping_price_is_base_plus_weight() {
        assert_eq!(
            shipping_price(dec!(5), dec!(2.5), dec!(3.2), dec!(10), None).unwrap(),
            dec!(13.00)
        );
        assert_eq!(
            shipping_price(dec!(5), dec!(2.5), dec!(3.2), dec!(100), Some(dec!(100))).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn commission_is_percent_of_total() {
        assert_eq!(commission_amount(dec!(123.45), dec!(5)).unwrap(), dec!(6.17));
    }

    #[test]
    fn money_bound_matches_the_column() {
        assert_eq!(MAX_MONEY, dec!(9999999999.99));
        assert!(check_money("price", MAX_MONEY).is_ok());
        assert!(check_money("price", MAX_MONEY + dec!(0.01)).is_err());
        assert!(check_money("price", dec!(-0.01)).is_err());
        assert!(check_weight("weight_kg", dec!(100001)).is_err());
    }

    #[test]
    fn huge_amounts_fail_instead_of_overflowing() {
        assert!(shipping_price(dec!(1), dec!(2), Decimal::MAX, dec!(0), None).is_err());
        assert!(
            promotion_discount(PromotionType::Percentage, dec!(50), Decimal::MAX, None).is_err()
        );
        assert!(commission_amount(Decimal::MAX, dec!(50)).is_err());
        assert!(line_total(Decimal::MAX, 2).is_err());
        assert!(checked_sum([Decimal::MAX, Decimal::MAX]).is_err());
        assert!(flash_pricing_from_percent(Decimal::MAX, dec!(10)).is_err());
        assert_eq!(line_total(dec!(19.99), 3).unwrap(), dec!(59.97));
    }
}
