use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::error::HandlerErr;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn get_required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    let raw = params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))?;
    let t = raw.trim();
    if t.is_empty() {
        return Err(HandlerErr::bad_params(format!("{} must not be empty", key)));
    }
    Ok(t.to_string())
}

pub fn get_optional_str(params: &Value, key: &str) -> Result<Option<String>, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => get_required_str(params, key).map(Some),
    }
}

/// Like [`get_required_str`] but keeps the value byte for byte.
pub fn get_required_secret(params: &Value, key: &str) -> Result<String, HandlerErr> {
    let raw = params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))?;
    if raw.is_empty() {
        return Err(HandlerErr::bad_params(format!("{} must not be empty", key)));
    }
    Ok(raw.to_string())
}

pub fn get_optional_secret(params: &Value, key: &str) -> Result<Option<String>, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => get_required_secret(params, key).map(Some),
    }
}

/// Integers arrive as JSON numbers or, from HTML forms, numeric strings.
pub fn get_required_i64(params: &Value, key: &str) -> Result<i64, HandlerErr> {
    let v = params
        .get(key)
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))?;
    let parsed = match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        HandlerErr::bad_params(format!("{} must be an integer", key))
            .with_details(json!({ key: v }))
    })
}

pub fn get_optional_i64(params: &Value, key: &str) -> Result<Option<i64>, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => get_required_i64(params, key).map(Some),
    }
}

pub fn get_required_u32(params: &Value, key: &str) -> Result<u32, HandlerErr> {
    let v = get_required_i64(params, key)?;
    u32::try_from(v).map_err(|_| {
        HandlerErr::bad_params(format!("{} must be between 0 and {}", key, u32::MAX))
            .with_details(json!({ key: v }))
    })
}

pub fn get_required_f64(params: &Value, key: &str) -> Result<f64, HandlerErr> {
    let v = params
        .get(key)
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))?;
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        HandlerErr::bad_params(format!("{} must be a number", key))
            .with_details(json!({ key: v }))
    })
}

/// bcrypt runs on the blocking pool, outside the database lock.
pub async fn hash_password(plain: String, cost: u32) -> Result<String, HandlerErr> {
    tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost))
        .await
        .map_err(|e| HandlerErr::new("task_failed", e.to_string()))?
        .map_err(|e| HandlerErr::new("hash_failed", e.to_string()))
}

pub async fn verify_password(plain: String, hashed: String) -> Result<bool, HandlerErr> {
    tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hashed))
        .await
        .map_err(|e| HandlerErr::new("task_failed", e.to_string()))?
        .map_err(|e| HandlerErr::new("hash_failed", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_accept_numeric_strings() {
        let params = json!({ "rollNum": "12", "sessions": 30, "marks": "77.5", "bad": "x" });
        assert_eq!(get_required_i64(&params, "rollNum").expect("roll"), 12);
        assert_eq!(get_required_u32(&params, "sessions").expect("sessions"), 30);
        assert_eq!(get_required_f64(&params, "marks").expect("marks"), 77.5);
        assert_eq!(get_required_i64(&params, "bad").unwrap_err().code, "bad_params");
        assert_eq!(get_required_i64(&params, "missing").unwrap_err().code, "bad_params");
    }

    #[test]
    fn blank_strings_are_rejected() {
        let params = json!({ "name": "   ", "email": null });
        assert!(get_required_str(&params, "name").is_err());
        assert_eq!(get_optional_str(&params, "email").expect("null"), None);
    }

    #[test]
    fn secrets_keep_surrounding_whitespace() {
        let params = json!({ "password": "  secret  ", "blank": "", "none": null });
        assert_eq!(get_required_secret(&params, "password").expect("pw"), "  secret  ");
        assert!(get_required_secret(&params, "blank").is_err());
        assert_eq!(get_optional_secret(&params, "none").expect("null"), None);
    }

    #[tokio::test]
    async fn hashing_round_trips_off_the_runtime_threads() {
        let hashed = hash_password("  pw ".to_string(), 4).await.expect("hash");
        assert!(verify_password("  pw ".to_string(), hashed.clone()).await.expect("verify"));
        assert!(!verify_password("pw".to_string(), hashed).await.expect("verify"));
    }

    #[test]
    fn negative_sessions_are_rejected() {
        let params = json!({ "sessions": -1 });
        assert!(get_required_u32(&params, "sessions").is_err());
    }
}
