//! Compiled statements handed to a driver

use relalg_core::Value;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// SQL text plus positional parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub sql: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// SHA-256 of the statement, stable across renders of the same relation
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).expect("statements should always serialize");
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl From<String> for Statement {
    fn from(sql: String) -> Self {
        Statement::new(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_deterministic() {
        let a = Statement::with_params("select 1 where x = ?", vec![Value::Int(1)]);
        let b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        let c = Statement::with_params("select 1 where x = ?", vec![Value::Int(2)]);
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(Statement::new("select 1")).unwrap();
        assert_eq!(json, serde_json::json!({"sql": "select 1"}));
    }
}
