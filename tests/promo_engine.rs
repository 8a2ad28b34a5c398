//! End-to-end scenarios for the promo validation engine.

use chrono::{Duration, Utc};
use medwear_commerce::domain::promo::{evaluate, DiscountType, PromoCode, PromoRejection};
use rust_decimal::Decimal;

fn code(discount_type: DiscountType, value: Decimal) -> PromoCode {
    PromoCode {
        code: "SCRUBS20".into(),
        discount_type,
        discount_value: value,
        min_order_amount: None,
        max_discount: None,
        usage_limit: None,
        per_user_limit: None,
        start_date: None,
        end_date: None,
        usage_count: 0,
        is_active: true,
    }
}

#[test]
fn percentage_with_cap_on_round_subtotal() {
    let mut promo = code(DiscountType::Percentage, Decimal::new(20, 0));
    promo.max_discount = Some(Decimal::new(10, 0));
    let quote = evaluate(&promo, Decimal::new(100, 0), Utc::now(), None).unwrap();
    assert_eq!(quote.discount_amount, Decimal::new(10, 0));
    assert_eq!(quote.new_total, Decimal::new(90, 0));
}

#[test]
fn fixed_discount_floors_total_at_zero() {
    let promo = code(DiscountType::Fixed, Decimal::new(50, 0));
    let quote = evaluate(&promo, Decimal::new(30, 0), Utc::now(), None).unwrap();
    assert_eq!(quote.discount_amount, Decimal::new(30, 0));
    assert_eq!(quote.new_total, Decimal::ZERO);
}

#[test]
fn usage_limit_rejects_regardless_of_other_fields() {
    let mut promo = code(DiscountType::Percentage, Decimal::new(5, 0));
    promo.usage_limit = Some(5);
    promo.usage_count = 5;
    promo.min_order_amount = Some(Decimal::ONE);
    promo.end_date = Some(Utc::now() + Duration::days(30));
    let err = evaluate(&promo, Decimal::new(1000, 0), Utc::now(), None).unwrap_err();
    assert_eq!(err, PromoRejection::UsageLimitReached);
}

#[test]
fn checks_short_circuit_in_declared_order() {
    // Expired AND over the usage limit AND below minimum: expiry is
    // reported first because the window check precedes the counters.
    let mut promo = code(DiscountType::Fixed, Decimal::new(5, 0));
    promo.end_date = Some(Utc::now() - Duration::days(1));
    promo.usage_limit = Some(1);
    promo.usage_count = 1;
    promo.min_order_amount = Some(Decimal::new(1000, 0));
    let err = evaluate(&promo, Decimal::ONE, Utc::now(), None).unwrap_err();
    assert_eq!(err, PromoRejection::Expired);
}

#[test]
fn uncapped_percentage_scales_with_subtotal() {
    let promo = code(DiscountType::Percentage, Decimal::new(20, 0));
    let quote = evaluate(&promo, Decimal::new(25550, 2), Utc::now(), None).unwrap();
    // 20% of 255.50 = 51.10
    assert_eq!(quote.discount_amount, Decimal::new(5110, 2));
    assert_eq!(quote.new_total, Decimal::new(20440, 2));
}

#[test]
fn rejection_codes_are_stable() {
    assert_eq!(PromoRejection::UnknownCode.code(), "UNKNOWN_CODE");
    assert_eq!(PromoRejection::UsageLimitReached.code(), "USAGE_LIMIT_REACHED");
    assert_eq!(
        PromoRejection::BelowMinimum { minimum: Decimal::TEN }.code(),
        "BELOW_MINIMUM"
    );
}
