//! Property-based tests for the marketplace money and naming rules.
//!
//! Uses proptest to check invariants over amounts and names that
//! hand-picked unit cases would miss.

use chrono::{TimeZone, Utc};
use marketplace_api::{
    entities::promotion::PromotionType,
    pricing::{
        commission_amount, flash_pricing_from_percent, flash_pricing_from_sale_price,
        promotion_discount, round_money, shipping_price,
    },
    services::{common::slugify, orders::order_number, promotions::normalize_code},
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Amounts from 0.00 to 100,000.00
fn money() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn positive_money() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Percentages with two decimals, 0.01 to 99.99
fn percent() -> impl Strategy<Value = Decimal> {
    (1i64..10_000).prop_map(|bp| Decimal::new(bp, 2))
}

fn weight() -> impl Strategy<Value = Decimal> {
    (0i64..100_000).prop_map(|grams| Decimal::new(grams, 3))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn rounding_keeps_two_places(raw in -1_000_000_000i64..1_000_000_000, scale in 0u32..8) {
        let value = Decimal::new(raw, scale);
        let rounded = round_money(value);
        prop_assert!(rounded.scale() <= 2);
        prop_assert!((rounded - value).abs() <= Decimal::new(5, 3));
        prop_assert_eq!(round_money(rounded), rounded);
    }

    #[test]
    fn discounts_never_exceed_the_subtotal(
        subtotal in money(),
        value in money(),
        kind in prop_oneof![
            Just(PromotionType::Percentage),
            Just(PromotionType::FixedAmount),
            Just(PromotionType::FreeShipping),
        ],
        cap in proptest::option::of(money()),
    ) {
        let value = if kind == PromotionType::Percentage {
            value.min(Decimal::ONE_HUNDRED)
        } else {
            value
        };
        let (discount, free_shipping) =
            promotion_discount(kind, value, subtotal, cap).expect("bounded amounts");
        prop_assert!(discount >= Decimal::ZERO);
        prop_assert!(discount <= subtotal);
        if let Some(cap) = cap {
            prop_assert!(discount <= cap);
        }
        prop_assert_eq!(free_shipping, kind == PromotionType::FreeShipping);
        if free_shipping {
            prop_assert_eq!(discount, Decimal::ZERO);
        }
    }

    #[test]
    fn flash_price_from_percent_is_below_original(original in positive_money(), pct in percent()) {
        if let Ok(pricing) = flash_pricing_from_percent(original, pct) {
            prop_assert!(pricing.sale_price > Decimal::ZERO);
            prop_assert!(pricing.sale_price < original);
            prop_assert_eq!(pricing.discount_percent, pct);
        }
    }

    #[test]
    fn flash_price_from_sale_price_keeps_the_price(
        original in positive_money(),
        ratio in 1u32..100,
    ) {
        let sale = round_money(original * Decimal::from(ratio) / Decimal::ONE_HUNDRED);
        match flash_pricing_from_sale_price(original, sale) {
            Ok(pricing) => {
                prop_assert_eq!(pricing.sale_price, sale);
                prop_assert!(pricing.discount_percent > Decimal::ZERO);
                prop_assert!(pricing.discount_percent < Decimal::ONE_HUNDRED);
            }
            // Rounding can land on zero or on the original for tiny prices.
            Err(_) => prop_assert!(sale == Decimal::ZERO || sale >= original),
        }
    }

    #[test]
    fn shipping_is_free_at_the_threshold(
        base in money(),
        per_kg in money(),
        kg in weight(),
        subtotal in money(),
        threshold in proptest::option::of(money()),
    ) {
        let price =
            shipping_price(base, per_kg, kg, subtotal, threshold).expect("bounded amounts");
        match threshold {
            Some(t) if subtotal >= t => prop_assert_eq!(price, Decimal::ZERO),
            _ => {
                prop_assert_eq!(price, round_money(base + per_kg * kg));
                prop_assert!(price >= base);
            }
        }
    }

    #[test]
    fn commission_is_bounded_by_the_total(total in money(), rate in percent()) {
        let amount = commission_amount(total, rate).expect("bounded amounts");
        prop_assert!(amount >= Decimal::ZERO);
        prop_assert!(amount <= total);
        prop_assert_eq!(commission_amount(total, Decimal::ONE_HUNDRED).ok(), Some(total));
    }

    #[test]
    fn oversized_amounts_are_rejected_not_panicking(
        hi in (1u32 << 27)..=u32::MAX,
        base in money(),
    ) {
        // At least 2^91, so doubling it leaves the 96-bit range.
        let huge = Decimal::from_parts(0, 0, hi, false, 0);
        prop_assert!(shipping_price(base, huge, huge, Decimal::ZERO, None).is_err());
        prop_assert!(
            promotion_discount(PromotionType::Percentage, Decimal::from(50), huge, None).is_err()
        );
        prop_assert!(commission_amount(huge, Decimal::from(50)).is_err());
    }

    #[test]
    fn slugs_are_url_safe(name in "[A-Za-z0-9 &'!.,-]{0,80}") {
        let slug = slugify(&name);
        prop_assert!(slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        prop_assert!(!slug.starts_with('-'));
        prop_assert!(!slug.ends_with('-'));
        prop_assert!(!slug.contains("--"));
        prop_assert_eq!(slugify(&slug), slug.clone());
    }

    #[test]
    fn promotion_codes_normalise_to_uppercase(code in "[a-zA-Z0-9_-]{3,32}") {
        let normalized = normalize_code(&code).expect("valid alphabet");
        prop_assert_eq!(normalized, code.to_ascii_uppercase());
    }

    #[test]
    fn short_or_odd_codes_are_rejected(code in "[a-z]{0,2}|[A-Z]{3,10} [A-Z]{1,5}|[A-Z]{33,40}") {
        prop_assert!(normalize_code(&code).is_err());
    }

    #[test]
    fn order_numbers_have_a_fixed_shape(bytes in any::<[u8; 16]>(), day in 0i64..20_000) {
        let id = Uuid::from_bytes(bytes);
        let now = Utc.timestamp_opt(day * 86_400, 0).single().expect("valid timestamp");
        let number = order_number(id, now);
        prop_assert_eq!(number.len(), 21);
        prop_assert!(number.starts_with("ORD-"));
        let expected_date = now.format("%Y%m%d").to_string();
        prop_assert_eq!(&number[4..12], expected_date.as_str());
        prop_assert!(number[13..].chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }
}
