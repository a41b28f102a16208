//! Validation gates for guest contact data, stay dates and feedback.
//!
//! Pure functions: each returns the first rule the input breaks.

use crate::error::ValidationError;
use crate::types::ADULT_AGE;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

/// Hardcoded patterns, validated by the unit tests below.
#[allow(clippy::expect_used)]
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[_a-z0-9-]+(\.[_a-z0-9-]+)*@[a-z0-9-]+(\.[a-z0-9-]+)*(\.[a-z]{2,4})$")
        .expect("email pattern should always compile")
});

#[allow(clippy::expect_used)]
static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9]{10,12}$").expect("phone pattern should always compile")
});

/// Highest accepted NPS score
pub const NPS_MAX: u8 = 10;

/// Contact and identity fields of a guest being registered
#[derive(Debug, Clone, Copy)]
pub struct GuestIdentity<'a> {
    /// First name
    pub first_name: &'a str,
    /// Last name
    pub last_name: &'a str,
    /// Age in years
    pub age: u32,
    /// Email address
    pub email: Option<&'a str>,
    /// Phone number
    pub phone: Option<&'a str>,
    /// National identification number
    pub nin: Option<&'a str>,
    /// Whether a parent or guardian is given
    pub has_guardian: bool,
}

/// Email check, case-insensitive.
///
/// # Errors
///
/// [`ValidationError::InvalidEmail`] when the address does not match.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL.is_match(&email.trim().to_ascii_lowercase()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}

/// Phone check: optional leading `+`, then 10 to 12 digits.
///
/// # Errors
///
/// [`ValidationError::InvalidPhone`] when the number does not match.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if PHONE.is_match(phone.trim()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPhone(phone.to_string()))
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Registration rules for a guest.
///
/// - names are required
/// - email and phone, when given, must match their patterns
/// - minors need a parent or guardian
/// - adults need at least one of email, phone or national ID
///
/// # Errors
///
/// The first [`ValidationError`] the identity breaks.
pub fn validate_guest(identity: &GuestIdentity<'_>) -> Result<(), ValidationError> {
    if identity.first_name.trim().is_empty() || identity.last_name.trim().is_empty() {
        return Err(ValidationError::NameRequired);
    }

    let email = present(identity.email);
    let phone = present(identity.phone);
    let nin = present(identity.nin);

    if let Some(email) = email {
        validate_email(email)?;
    }
    if let Some(phone) = phone {
        validate_phone(phone)?;
    }

    if identity.age < ADULT_AGE {
        if !identity.has_guardian {
            return Err(ValidationError::GuardianRequired);
        }
    } else if email.is_none() && phone.is_none() && nin.is_none() {
        return Err(ValidationError::ContactRequired);
    }

    Ok(())
}

/// Stay dates: check-out strictly after check-in, check-in not before today.
///
/// # Errors
///
/// [`ValidationError::CheckOutBeforeCheckIn`] or [`ValidationError::CheckInInPast`].
pub fn validate_stay(
    check_in: NaiveDate,
    check_out: NaiveDate,
    today: NaiveDate,
) -> Result<(), ValidationError> {
    if check_out <= check_in {
        return Err(ValidationError::CheckOutBeforeCheckIn {
            check_in,
            check_out,
        });
    }
    if check_in < today {
        return Err(ValidationError::CheckInInPast { check_in, today });
    }
    Ok(())
}

/// NPS score range check.
///
/// # Errors
///
/// [`ValidationError::NpsOutOfRange`] above 10.
pub const fn validate_nps(score: u8) -> Result<(), ValidationError> {
    if score > NPS_MAX {
        return Err(ValidationError::NpsOutOfRange(score));
    }
    Ok(())
}

/// Sleeping places for a bed layout: one per single, two per double.
///
/// # Errors
///
/// [`ValidationError::TooManyBeds`] when the count overflows.
pub const fn bed_capacity(single_beds: u32, double_beds: u32) -> Result<u32, ValidationError> {
    match double_beds.checked_mul(2) {
        Some(doubles) => match single_beds.checked_add(doubles) {
            Some(capacity) => Ok(capacity),
            None => Err(ValidationError::TooManyBeds {
                single_beds,
                double_beds,
            }),
        },
        None => Err(ValidationError::TooManyBeds {
            single_beds,
            double_beds,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adult<'a>() -> GuestIdentity<'a> {
        GuestIdentity {
            first_name: "Ada",
            last_name: "Lovelace",
            age: 36,
            email: Some("ada@example.com"),
            phone: None,
            nin: None,
            has_guardian: false,
        }
    }

    #[test]
    fn accepts_well_formed_emails() {
        for email in ["ada@example.com", "a.b_c-d@mail.example.co", "Ada@Example.COM"] {
            assert_eq!(validate_email(email), Ok(()), "{email}");
        }
    }

    #[test]
    fn rejects_malformed_emails() {
        for email in ["ada", "ada@", "@example.com", "ada@example.c", "ada@example.museum1"] {
            assert!(validate_email(email).is_err(), "{email}");
        }
    }

    #[test]
    fn phone_needs_ten_to_twelve_digits() {
        assert_eq!(validate_phone("+3212345678"), Ok(()));
        assert_eq!(validate_phone("123456789012"), Ok(()));
        assert!(validate_phone("123456789").is_err());
        assert!(validate_phone("1234567890123").is_err());
        assert!(validate_phone("12345-67890").is_err());
    }

    #[test]
    fn minor_needs_guardian() {
        let minor = GuestIdentity {
            age: 16,
            email: None,
            ..adult()
        };
        assert_eq!(validate_guest(&minor), Err(ValidationError::GuardianRequired));
        let guarded = GuestIdentity {
            has_guardian: true,
            ..minor
        };
        assert_eq!(validate_guest(&guarded), Ok(()));
    }

    #[test]
    fn adult_needs_some_contact() {
        let anonymous = GuestIdentity {
            email: Some("  "),
            ..adult()
        };
        assert_eq!(validate_guest(&anonymous), Err(ValidationError::ContactRequired));
        let with_nin = GuestIdentity {
            nin: Some("85.07.30-033.61"),
            ..anonymous
        };
        assert_eq!(validate_guest(&with_nin), Ok(()));
    }

    #[test]
    fn stay_dates() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap_or_default();
        let tomorrow = today.succ_opt().unwrap_or_default();
        assert_eq!(validate_stay(today, tomorrow, today), Ok(()));
        assert!(matches!(
            validate_stay(tomorrow, today, today),
            Err(ValidationError::CheckOutBeforeCheckIn { .. })
        ));
        assert!(matches!(
            validate_stay(today, today, today),
            Err(ValidationError::CheckOutBeforeCheckIn { .. })
        ));
        assert!(matches!(
            validate_stay(today.pred_opt().unwrap_or_default(), tomorrow, today),
            Err(ValidationError::CheckInInPast { .. })
        ));
    }

    #[test]
    fn nps_bounds() {
        assert_eq!(validate_nps(0), Ok(()));
        assert_eq!(validate_nps(10), Ok(()));
        assert_eq!(validate_nps(11), Err(ValidationError::NpsOutOfRange(11)));
    }

    #[test]
    fn capacity_counts_doubles_twice_and_rejects_overflow() {
        assert_eq!(bed_capacity(1, 2), Ok(5));
        assert_eq!(bed_capacity(0, u32::MAX / 2), Ok(u32::MAX - 1));
        assert!(matches!(
            bed_capacity(1, u32::MAX),
            Err(ValidationError::TooManyBeds { .. })
        ));
        assert!(bed_capacity(u32::MAX, 1).is_err());
    }
}
