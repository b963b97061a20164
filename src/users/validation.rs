use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use time::{macros::format_description, Date, OffsetDateTime};

lazy_static! {
    static ref PHONE_RE: Regex = Regex::new(r"^(?:\+84|0)\d{9}$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(
        r"^[A-Za-z0-9._%+-]+@(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,}$"
    )
    .unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9_]{2,19}$").unwrap();
}

/// Youngest age accepted by the age/dob cross-check.
pub const MIN_MATCHED_AGE: i32 = 13;

/// `+84` or a leading `0`, then exactly nine digits.
pub fn is_phone_number_valid(phone_number: &str) -> bool {
    PHONE_RE.is_match(phone_number)
}

/// Non-string input is never a valid email.
pub fn is_email_valid(email: &Value) -> bool {
    email.as_str().is_some_and(|s| EMAIL_RE.is_match(s))
}

/// True iff the value coerces to an integer in 1..=99.
pub fn is_age_valid(age: &Value) -> bool {
    coerce_age(age).is_some_and(|n| 0 < n && n < 100)
}

/// `int()`-style coercion: integers, floats truncated toward zero, and
/// strings holding an integer. Anything else, or a value outside `i32`, is `None`.
pub fn coerce_age(age: &Value) -> Option<i32> {
    match age {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i32::try_from(i).ok(),
            None => n
                .as_f64()
                .map(f64::trunc)
                .filter(|f| f.is_finite() && *f >= i32::MIN as f64 && *f <= i32::MAX as f64)
                .map(|f| f as i32),
        },
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}

pub fn is_dob_valid(dob: &str) -> bool {
    is_dob_valid_on(dob, today())
}

/// Same as [`is_dob_valid`] with an explicit reference date.
pub fn is_dob_valid_on(dob: &str, today: Date) -> bool {
    match parse_dob(dob) {
        Some(born) => {
            let age = age_on(born, today);
            0 < age && age < 100
        }
        None => false,
    }
}

/// Non-string input is never a valid username.
pub fn is_username_valid(username: &Value) -> bool {
    username.as_str().is_some_and(|s| USERNAME_RE.is_match(s))
}

/// Checks that `age` is what `dob` implies on `today` and that the user is old enough.
pub fn age_matches_dob(age: i32, dob: &str, today: Date) -> Result<(), String> {
    let born = parse_dob(dob).ok_or_else(|| "Invalid dob format".to_string())?;
    let calculated = age_on(born, today);
    if calculated != age {
        return Err(format!(
            "Provided age ({age}) does not match date of birth ({dob}). Calculated age is {calculated}."
        ));
    }
    if age < MIN_MATCHED_AGE {
        return Err(format!("User must be at least {MIN_MATCHED_AGE} years old."));
    }
    Ok(())
}

/// ISO 8601 calendar date, extended (`1990-05-20`) or basic (`19900520`).
pub fn parse_dob(dob: &str) -> Option<Date> {
    Date::parse(dob, format_description!("[year]-[month]-[day]"))
        .or_else(|_| Date::parse(dob, format_description!("[year][month][day]")))
        .ok()
}

/// Whole years between `born` and `today`, one less if the birthday hasn't come yet.
pub fn age_on(born: Date, today: Date) -> i32 {
    let mut age = today.year() - born.year();
    if (today.month() as u8, today.day()) < (born.month() as u8, born.day()) {
        age -= 1;
    }
    age
}

pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}
