//! Type system: primitive types, enumerations, domains and the join lattice

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::ident::{is_identifier, validate_identifier};

/// Discriminant of a [`Type`], used where only the variant matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Integer,
    Number,
    String,
    Boolean,
    Enum,
    Domain,
}

#[derive(Debug, Clone)]
pub enum Type {
    Integer,
    Number,
    String,
    Boolean,
    Enum(EnumType),
    Domain(Domain),
}

impl Type {
    /// Build an enumeration type from its labels.
    pub fn enumeration<I, S>(labels: I) -> Result<Type>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EnumType::new(labels).map(Type::Enum)
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            Type::Integer => TypeKind::Integer,
            Type::Number => TypeKind::Number,
            Type::String => TypeKind::String,
            Type::Boolean => TypeKind::Boolean,
            Type::Enum(_) => TypeKind::Enum,
            Type::Domain(_) => TypeKind::Domain,
        }
    }

    /// The primitive (or enum) type underneath, looking through a domain.
    pub fn base(&self) -> &Type {
        match self {
            Type::Domain(domain) => domain.base(),
            other => other,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Type::Integer => "integer".to_string(),
            Type::Number => "number".to_string(),
            Type::String => "string".to_string(),
            Type::Boolean => "boolean".to_string(),
            Type::Enum(_) => "enum".to_string(),
            Type::Domain(domain) => domain.name().to_string(),
        }
    }

    pub fn is_boolean(&self) -> bool {
        self.base().kind() == TypeKind::Boolean
    }

    pub fn is_integer(&self) -> bool {
        self.base().kind() == TypeKind::Integer
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.base().kind(), TypeKind::Integer | TypeKind::Number)
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Type::Domain(a), Type::Domain(b)) => Domain::ptr_eq(a, b),
            (Type::Enum(a), Type::Enum(b)) => a == b,
            (a, b) => a.kind() == b.kind(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Least common supertype of `a` and `b`, where number is a supertype of integer.
///
/// Two domains are only compatible with themselves. A domain is compatible with a
/// non-domain type sharing its base (an integer may flow into a number-based domain),
/// and the domain is the result. `None` signals a type error to the caller.
pub fn join(a: &Type, b: &Type) -> Option<Type> {
    match (a, b) {
        (Type::Domain(x), Type::Domain(y)) => Domain::ptr_eq(x, y).then(|| a.clone()),
        (Type::Domain(domain), other) | (other, Type::Domain(domain)) => {
            let base = domain.base().kind();
            let kind = other.kind();
            (base == kind || (base == TypeKind::Number && kind == TypeKind::Integer))
                .then(|| Type::Domain(domain.clone()))
        }
        _ => match (a.kind(), b.kind()) {
            (x, y) if x == y => Some(a.clone()),
            (TypeKind::Number, TypeKind::Integer) => Some(a.clone()),
            (TypeKind::Integer, TypeKind::Number) => Some(b.clone()),
            _ => None,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    labels: Arc<[String]>,
}

impl EnumType {
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut collected: Vec<String> = Vec::new();
        for label in labels {
            let label = label.into();
            if !is_identifier(&label) || collected.contains(&label) {
                return Err(Error::InvalidEnumLabel(label));
            }
            collected.push(label);
        }

        Ok(Self {
            labels: collected.into(),
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

#[derive(Debug)]
struct DomainData {
    name: String,
    base: Type,
    qualifiers: Qualifiers,
}

/// A named alias of a primitive or enum type carrying default qualifiers.
///
/// Domains compare by identity: two domains declared with the same name and base are
/// still distinct types.
#[derive(Debug, Clone)]
pub struct Domain(Arc<DomainData>);

impl Domain {
    pub fn new(name: impl Into<String>, base: Type, qualifiers: Qualifiers) -> Result<Self> {
        let name = name.into();
        validate_identifier(&name)?;

        if let Type::Domain(_) = base {
            return Err(Error::InvalidBaseType(base.name()));
        }

        Ok(Self(Arc::new(DomainData {
            name,
            base,
            qualifiers,
        })))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn base(&self) -> &Type {
        &self.0.base
    }

    pub fn qualifiers(&self) -> &Qualifiers {
        &self.0.qualifiers
    }

    pub fn ptr_eq(a: &Domain, b: &Domain) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Look up one labelled value of an enum-based domain.
    pub fn value(&self, label: &str) -> Result<EnumValue> {
        match self.base() {
            Type::Enum(values) if values.contains(label) => Ok(EnumValue {
                domain: self.clone(),
                label: label.to_string(),
            }),
            _ => Err(Error::UnknownEnumLabel {
                domain: self.name().to_string(),
                label: label.to_string(),
            }),
        }
    }

    /// All labelled values of an enum-based domain, in declaration order.
    pub fn values(&self) -> Vec<EnumValue> {
        match self.base() {
            Type::Enum(values) => values
                .labels()
                .iter()
                .map(|label| EnumValue {
                    domain: self.clone(),
                    label: label.clone(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Declare a domain type.
pub fn domain(name: impl Into<String>, base: Type, qualifiers: Qualifiers) -> Result<Type> {
    Domain::new(name, base, qualifiers).map(Type::Domain)
}

/// A label of an enum-based domain, usable as a literal operand.
#[derive(Debug, Clone)]
pub struct EnumValue {
    domain: Domain,
    label: String,
}

impl EnumValue {
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Column options attached to attributes and inherited from domains.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Qualifiers {
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Qualifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Fill in every qualifier not set here from `defaults`.
    pub fn inherit(mut self, defaults: &Qualifiers) -> Self {
        self.unique |= defaults.unique;
        self.auto_increment |= defaults.auto_increment;
        self.primary_key |= defaults.primary_key;
        self.not_null |= defaults.not_null;
        if self.default.is_none() {
            self.default = defaults.default.clone();
        }
        self
    }
}

/// Host values accepted as literals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Value {
    /// Resolve the literal type and its SQL text.
    pub fn to_literal(&self) -> Result<(Type, String)> {
        match self {
            Value::Bool(b) => Ok((Type::Boolean, b.to_string())),
            Value::Int(i) => Ok((Type::Integer, i.to_string())),
            Value::Float(f) if !f.is_finite() => Err(Error::InvalidLiteral(f.to_string())),
            Value::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Ok((Type::Integer, (*f as i64).to_string()))
            }
            Value::Float(f) => Ok((Type::Number, f.to_string())),
            Value::String(s) => Ok((Type::String, quote(s))),
        }
    }
}

/// Render text as a single-quoted SQL string literal.
pub fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_primitives() {
        assert_eq!(join(&Type::Number, &Type::Integer), Some(Type::Number));
        assert_eq!(join(&Type::Integer, &Type::Number), Some(Type::Number));
        assert_eq!(join(&Type::Integer, &Type::Integer), Some(Type::Integer));
        assert_eq!(join(&Type::String, &Type::String), Some(Type::String));
        assert_eq!(join(&Type::Boolean, &Type::Boolean), Some(Type::Boolean));

        assert_eq!(join(&Type::String, &Type::Boolean), None);
        assert_eq!(join(&Type::Integer, &Type::String), None);
        assert_eq!(join(&Type::Boolean, &Type::Number), None);
    }

    #[test]
    fn test_join_domains() {
        let money = domain("money", Type::Number, Qualifiers::new()).unwrap();
        let other = domain("money", Type::Number, Qualifiers::new()).unwrap();
        let flag = domain("flag", Type::Boolean, Qualifiers::new()).unwrap();

        assert_eq!(join(&money, &money), Some(money.clone()));
        assert_eq!(join(&money, &other), None);

        assert_eq!(join(&money, &Type::Number), Some(money.clone()));
        assert_eq!(join(&Type::Integer, &money), Some(money.clone()));
        assert_eq!(join(&money, &Type::String), None);

        assert_eq!(join(&flag, &Type::Boolean), Some(flag.clone()));
        assert_eq!(join(&Type::Boolean, &flag), Some(flag));
    }

    #[test]
    fn test_integer_domain_does_not_widen() {
        let id = domain("ident", Type::Integer, Qualifiers::new()).unwrap();
        assert_eq!(join(&id, &Type::Integer), Some(id.clone()));
        assert_eq!(join(&id, &Type::Number), None);
    }

    #[test]
    fn test_domain_validation() {
        assert!(matches!(
            domain("1bad", Type::String, Qualifiers::new()),
            Err(Error::InvalidIdentifier(_))
        ));

        let inner = domain("inner", Type::String, Qualifiers::new()).unwrap();
        assert!(matches!(
            domain("outer", inner, Qualifiers::new()),
            Err(Error::InvalidBaseType(_))
        ));
    }

    #[test]
    fn test_enum_domain_values() {
        let status = Type::enumeration(["open", "closed"]).unwrap();
        let Type::Domain(status) = domain("status", status, Qualifiers::new()).unwrap() else {
            panic!("expected a domain");
        };

        let labels: Vec<_> = status.values().iter().map(|v| v.label().to_string()).collect();
        assert_eq!(labels, vec!["open", "closed"]);

        assert_eq!(status.value("open").unwrap().to_string(), "open");
        assert!(matches!(
            status.value("pending"),
            Err(Error::UnknownEnumLabel { .. })
        ));
    }

    #[test]
    fn test_enum_labels_validated() {
        assert!(Type::enumeration(["a", "b"]).is_ok());
        assert_eq!(
            Type::enumeration(["a", ""]),
            Err(Error::InvalidEnumLabel(String::new()))
        );
        assert_eq!(
            Type::enumeration(["a", "a"]),
            Err(Error::InvalidEnumLabel("a".to_string()))
        );
        assert_eq!(
            Type::enumeration(["in progress"]),
            Err(Error::InvalidEnumLabel("in progress".to_string()))
        );
    }

    #[test]
    fn test_value_literals() {
        assert_eq!(Value::Int(3).to_literal().unwrap(), (Type::Integer, "3".to_string()));
        assert_eq!(Value::Float(2.0).to_literal().unwrap(), (Type::Integer, "2".to_string()));
        assert_eq!(Value::Float(2.5).to_literal().unwrap(), (Type::Number, "2.5".to_string()));
        assert_eq!(
            Value::from("O'Hara").to_literal().unwrap(),
            (Type::String, "'O''Hara'".to_string())
        );
        assert_eq!(Value::Bool(true).to_literal().unwrap(), (Type::Boolean, "true".to_string()));
        assert!(Value::Float(f64::NAN).to_literal().is_err());
        assert!(Value::Float(f64::INFINITY).to_literal().is_err());
    }

    #[test]
    fn test_qualifier_inheritance() {
        let defaults = Qualifiers::new().not_null().with_default(0);
        let own = Qualifiers::new().unique().inherit(&defaults);

        assert!(own.unique);
        assert!(own.not_null);
        assert_eq!(own.default, Some(Value::Int(0)));

        let overridden = Qualifiers::new().with_default(5).inherit(&defaults);
        assert_eq!(overridden.default, Some(Value::Int(5)));
    }

    #[test]
    fn test_qualifiers_deserialize() {
        let q: Qualifiers = serde_json::from_str(r#"{"unique": true, "default": "n/a"}"#).unwrap();
        assert!(q.unique);
        assert!(!q.not_null);
        assert_eq!(q.default, Some(Value::String("n/a".to_string())));
    }
}
