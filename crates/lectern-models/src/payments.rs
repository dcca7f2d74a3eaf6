//! Payment records and the payment list filter.
//!
//! A payment is recorded for the authenticated user and points at a course, a
//! lesson, or both. Recording one never talks to a payment provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Database, Decode, Encode, FromRow, Type, postgres::PgTypeInfo};
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::ids::{CourseId, LessonId, PaymentId, UserId};

/// How a payment was made. Stored and serialized as `Cash` / `Non-cash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum PaymentMethod {
    #[serde(rename = "Cash")]
    Cash,
    #[serde(rename = "Non-cash")]
    NonCash,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::NonCash => "Non-cash",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPaymentMethod(pub String);

impl std::error::Error for UnknownPaymentMethod {}

impl fmt::Display for UnknownPaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown payment method: {}", self.0)
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Cash" => Ok(Self::Cash),
            "Non-cash" => Ok(Self::NonCash),
            other => Err(UnknownPaymentMethod(other.to_string())),
        }
    }
}

impl Type<sqlx::Postgres> for PaymentMethod {
    fn type_info() -> PgTypeInfo {
        <String as Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'q> Encode<'q, sqlx::Postgres> for PaymentMethod {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for PaymentMethod {
    fn decode(
        value: <sqlx::Postgres as Database>::ValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<'r, sqlx::Postgres>>::decode(value)?;
        Ok(s.parse()?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: UserId,
    pub paid_course: Option<CourseId>,
    pub paid_lesson: Option<LessonId>,
    /// Amount in minor currency units
    pub payment_amount: i64,
    pub payment_method: PaymentMethod,
    pub date_of_payment: DateTime<Utc>,
}

/// The payer is always the caller; a `user_id` in the body is ignored.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_payment_target"))]
pub struct CreatePaymentDto {
    pub paid_course: Option<CourseId>,
    pub paid_lesson: Option<LessonId>,
    #[validate(range(min = 0))]
    pub payment_amount: i64,
    pub payment_method: PaymentMethod,
}

fn validate_payment_target(dto: &CreatePaymentDto) -> Result<(), ValidationError> {
    if dto.paid_course.is_none() && dto.paid_lesson.is_none() {
        let mut error = ValidationError::new("paid_course");
        error.message = Some("A payment must reference a course or a lesson".into());
        return Err(error);
    }
    Ok(())
}

/// Sort order for the payment list. Oldest first unless `-date_of_payment`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub enum PaymentOrdering {
    #[default]
    #[serde(rename = "date_of_payment")]
    DateAsc,
    #[serde(rename = "-date_of_payment")]
    DateDesc,
}

/// Query filters for the caller's payments. Every filter is optional and
/// they combine with AND.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaymentFilterParams {
    pub paid_course: Option<CourseId>,
    pub paid_lesson: Option<LessonId>,
    pub payment_method: Option<PaymentMethod>,
    /// `date_of_payment` (default) or `-date_of_payment`
    pub ordering: Option<PaymentOrdering>,
}

impl PaymentFilterParams {
    pub fn ordering(&self) -> PaymentOrdering {
        self.ordering.unwrap_or_default()
    }

    pub fn matches(&self, payment: &Payment) -> bool {
        self.paid_course
            .is_none_or(|course| payment.paid_course == Some(course))
            && self
                .paid_lesson
                .is_none_or(|lesson| payment.paid_lesson == Some(lesson))
            && self
                .payment_method
                .is_none_or(|method| payment.payment_method == method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(method: PaymentMethod, course: Option<CourseId>) -> Payment {
        Payment {
            id: PaymentId::new(),
            user_id: UserId::new(),
            paid_course: course,
            paid_lesson: None,
            payment_amount: 1500,
            payment_method: method,
            date_of_payment: Utc::now(),
        }
    }

    #[test]
    fn test_payment_method_wire_names() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::NonCash).unwrap(),
            r#""Non-cash""#
        );
        let method: PaymentMethod = serde_json::from_str(r#""Cash""#).unwrap();
        assert_eq!(method, PaymentMethod::Cash);
        assert!(serde_json::from_str::<PaymentMethod>(r#""Card""#).is_err());
        assert_eq!("Non-cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::NonCash);
        assert!("cash".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_create_payment_needs_target_and_non_negative_amount() {
        let json = format!(
            r#"{{"paid_course":"{}","payment_amount":-5,"payment_method":"Cash"}}"#,
            CourseId::new()
        );
        let dto: CreatePaymentDto = serde_json::from_str(&json).unwrap();
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("payment_amount"));

        let json = r#"{"payment_amount":5,"payment_method":"Cash"}"#;
        let dto: CreatePaymentDto = serde_json::from_str(json).unwrap();
        let errors = dto.validate().unwrap_err();
        let messages: Vec<String> = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter().filter_map(|e| e.message.as_ref().map(|m| m.to_string())))
            .collect();
        assert!(messages.contains(&"A payment must reference a course or a lesson".to_string()));

        let json = format!(
            r#"{{"paid_lesson":"{}","payment_amount":0,"payment_method":"Non-cash"}}"#,
            LessonId::new()
        );
        let dto: CreatePaymentDto = serde_json::from_str(&json).unwrap();
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_filter_matches_combined_fields() {
        let course = CourseId::new();
        let cash_for_course = payment(PaymentMethod::Cash, Some(course));
        let card_for_course = payment(PaymentMethod::NonCash, Some(course));
        let cash_elsewhere = payment(PaymentMethod::Cash, Some(CourseId::new()));

        let filter = PaymentFilterParams {
            paid_course: Some(course),
            payment_method: Some(PaymentMethod::Cash),
            ..Default::default()
        };
        assert!(filter.matches(&cash_for_course));
        assert!(!filter.matches(&card_for_course));
        assert!(!filter.matches(&cash_elsewhere));
        assert!(PaymentFilterParams::default().matches(&cash_elsewhere));
    }

    #[test]
    fn test_ordering_query_values() {
        #[derive(Deserialize)]
        struct Wrapper {
            ordering: PaymentOrdering,
        }
        let w: Wrapper = serde_json::from_str(r#"{"ordering":"-date_of_payment"}"#).unwrap();
        assert_eq!(w.ordering, PaymentOrdering::DateDesc);
        assert_eq!(PaymentFilterParams::default().ordering(), PaymentOrdering::DateAsc);
    }
}
