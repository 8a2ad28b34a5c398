//! Promo Validation Engine.
//!
//! Pure evaluation of a promo code against an order subtotal: eligibility
//! checks run in a fixed order and short-circuit on the first failure,
//! then the discount is priced. Nothing here mutates state; usage counts
//! are adjusted at order confirmation, not during validation.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "PERCENTAGE",
            Self::Fixed => "FIXED",
        }
    }
}

impl FromStr for DiscountType {
    type Err = UnknownDiscountType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PERCENTAGE" => Ok(Self::Percentage),
            "FIXED" => Ok(Self::Fixed),
            _ => Err(UnknownDiscountType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UnknownDiscountType(pub String);

impl std::error::Error for UnknownDiscountType {}
impl fmt::Display for UnknownDiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown discount type: {}", self.0)
    }
}

/// Domain view of a promo code, loaded from the store.
#[derive(Clone, Debug)]
pub struct PromoCode {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_order_amount: Option<Decimal>,
    pub max_discount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub per_user_limit: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub usage_count: i32,
    pub is_active: bool,
}

/// Why a code was rejected, in check order.
#[derive(Clone, Debug, PartialEq)]
pub enum PromoRejection {
    UnknownCode,
    Inactive,
    NotStarted,
    Expired,
    UsageLimitReached,
    PerUserLimitReached,
    BelowMinimum { minimum: Decimal },
}

impl PromoRejection {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownCode => "UNKNOWN_CODE",
            Self::Inactive => "INACTIVE",
            Self::NotStarted => "NOT_STARTED",
            Self::Expired => "EXPIRED",
            Self::UsageLimitReached => "USAGE_LIMIT_REACHED",
            Self::PerUserLimitReached => "PER_USER_LIMIT_REACHED",
            Self::BelowMinimum { .. } => "BELOW_MINIMUM",
        }
    }
}

impl std::error::Error for PromoRejection {}
impl fmt::Display for PromoRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCode => write!(f, "promo code not found"),
            Self::Inactive => write!(f, "promo code is no longer active"),
            Self::NotStarted => write!(f, "promo code is not yet valid"),
            Self::Expired => write!(f, "promo code has expired"),
            Self::UsageLimitReached => write!(f, "promo code usage limit reached"),
            Self::PerUserLimitReached => write!(f, "you have already used this promo code"),
            Self::BelowMinimum { minimum } => {
                write!(f, "order subtotal is below the {minimum} minimum for this code")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PromoQuote {
    pub discount_amount: Decimal,
    pub new_total: Decimal,
}

fn round2(v: Decimal) -> Decimal {
    v.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Evaluates eligibility and prices the discount.
///
/// `prior_uses_by_user` is the count of the caller's past orders that
/// reference this code; `None` means no user context, which skips the
/// per-user check.
pub fn evaluate(
    promo: &PromoCode,
    subtotal: Decimal,
    now: DateTime<Utc>,
    prior_uses_by_user: Option<i64>,
) -> Result<PromoQuote, PromoRejection> {
    if !promo.is_active {
        return Err(PromoRejection::Inactive);
    }
    if let Some(start) = promo.start_date {
        if now < start {
            return Err(PromoRejection::NotStarted);
        }
    }
    if let Some(end) = promo.end_date {
        if now > end {
            return Err(PromoRejection::Expired);
        }
    }
    if let Some(limit) = promo.usage_limit {
        if promo.usage_count >= limit {
            return Err(PromoRejection::UsageLimitReached);
        }
    }
    if let (Some(limit), Some(uses)) = (promo.per_user_limit, prior_uses_by_user) {
        if uses >= limit as i64 {
            return Err(PromoRejection::PerUserLimitReached);
        }
    }
    if let Some(minimum) = promo.min_order_amount {
        if subtotal < minimum {
            return Err(PromoRejection::BelowMinimum { minimum });
        }
    }

    let raw = match promo.discount_type {
        DiscountType::Percentage => {
            let pct = subtotal * promo.discount_value / Decimal::new(100, 0);
            match promo.max_discount {
                Some(cap) => pct.min(cap),
                None => pct,
            }
        }
        // A fixed discount can never exceed the subtotal.
        DiscountType::Fixed => promo.discount_value.min(subtotal),
    };
    let discount_amount = round2(raw);
    let new_total = round2(subtotal - discount_amount);
    Ok(PromoQuote { discount_amount, new_total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn base() -> PromoCode {
        PromoCode {
            code: "WELCOME10".into(),
            discount_type: DiscountType::Percentage,
            discount_value: Decimal::new(10, 0),
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
    fn percentage_discount_is_capped() {
        let mut p = base();
        p.discount_value = Decimal::new(20, 0);
        p.max_discount = Some(Decimal::new(10, 0));
        let q = evaluate(&p, Decimal::new(100, 0), Utc::now(), None).unwrap();
        assert_eq!(q.discount_amount, Decimal::new(10, 0));
        assert_eq!(q.new_total, Decimal::new(90, 0));
    }

    #[test]
    fn fixed_discount_never_exceeds_subtotal() {
        let mut p = base();
        p.discount_type = DiscountType::Fixed;
        p.discount_value = Decimal::new(50, 0);
        let q = evaluate(&p, Decimal::new(30, 0), Utc::now(), None).unwrap();
        assert_eq!(q.discount_amount, Decimal::new(30, 0));
        assert_eq!(q.new_total, Decimal::ZERO);
    }

    #[test]
    fn percentage_rounds_midpoint_away_from_zero() {
        let mut p = base();
        p.discount_value = Decimal::new(15, 0);
        // 15% of 33.30 = 4.995 -> 5.00
        let q = evaluate(&p, Decimal::new(3330, 2), Utc::now(), None).unwrap();
        assert_eq!(q.discount_amount, Decimal::new(500, 2));
        assert_eq!(q.new_total, Decimal::new(2830, 2));
    }

    #[test]
    fn exhausted_usage_limit_rejects() {
        let mut p = base();
        p.usage_limit = Some(5);
        p.usage_count = 5;
        let err = evaluate(&p, Decimal::new(100, 0), Utc::now(), None).unwrap_err();
        assert_eq!(err, PromoRejection::UsageLimitReached);
    }

    #[test]
    fn inactive_wins_over_expiry() {
        let mut p = base();
        p.is_active = false;
        p.end_date = Some(Utc::now() - Duration::days(1));
        let err = evaluate(&p, Decimal::new(100, 0), Utc::now(), None).unwrap_err();
        assert_eq!(err, PromoRejection::Inactive);
    }

    #[test]
    fn validity_window_is_inclusive() {
        let now = Utc::now();
        let mut p = base();
        p.start_date = Some(now);
        p.end_date = Some(now);
        assert!(evaluate(&p, Decimal::new(100, 0), now, None).is_ok());
        p.start_date = Some(now + Duration::seconds(1));
        assert_eq!(evaluate(&p, Decimal::new(100, 0), now, None).unwrap_err(), PromoRejection::NotStarted);
    }

    #[test]
    fn per_user_limit_requires_user_context() {
        let mut p = base();
        p.per_user_limit = Some(1);
        // No user id: check is skipped.
        assert!(evaluate(&p, Decimal::new(100, 0), Utc::now(), None).is_ok());
        assert!(evaluate(&p, Decimal::new(100, 0), Utc::now(), Some(0)).is_ok());
        let err = evaluate(&p, Decimal::new(100, 0), Utc::now(), Some(1)).unwrap_err();
        assert_eq!(err, PromoRejection::PerUserLimitReached);
    }

    #[test]
    fn minimum_order_amount_enforced() {
        let mut p = base();
        p.min_order_amount = Some(Decimal::new(50, 0));
        let err = evaluate(&p, Decimal::new(4999, 2), Utc::now(), None).unwrap_err();
        assert_eq!(err, PromoRejection::BelowMinimum { minimum: Decimal::new(50, 0) });
        assert!(evaluate(&p, Decimal::new(50, 0), Utc::now(), None).is_ok());
    }
}
