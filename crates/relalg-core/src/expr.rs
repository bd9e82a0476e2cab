//! Expression algebra
//!
//! Expressions are immutable trees. Every builder wraps its right-hand operand as a
//! literal when needed, checks operand types against the lattice in [`crate::types`],
//! and returns a new node sharing its children with the inputs.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::ident::validate_identifier;
use crate::relation::Relation;
use crate::types::{join, quote, EnumValue, Qualifiers, Type, Value};

/// Identifies the table an attribute was bound into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Owner {
    pub(crate) id: u64,
    pub(crate) table: Arc<str>,
}

#[derive(Debug)]
struct AttributeData {
    name: String,
    ty: Type,
    qualifiers: Qualifiers,
    unique: bool,
    owner: Option<Owner>,
}

/// A typed, named column. Attributes compare by identity.
#[derive(Debug, Clone)]
pub struct Attribute(Arc<AttributeData>);

/// Declare an attribute. Qualifiers not set here are inherited from a domain type.
pub fn attribute(name: impl Into<String>, ty: Type, qualifiers: Qualifiers) -> Result<Attribute> {
    let name = name.into();
    validate_identifier(&name)?;

    let qualifiers = match &ty {
        Type::Domain(domain) => qualifiers.inherit(domain.qualifiers()),
        _ => qualifiers,
    };

    if qualifiers.auto_increment && !ty.is_integer() {
        return Err(Error::AutoIncrementNotInteger(name));
    }

    if let Some(default) = &qualifiers.default {
        check_default(&ty, default)?;
    }

    let unique = qualifiers.auto_increment || qualifiers.primary_key || qualifiers.unique;

    Ok(Attribute(Arc::new(AttributeData {
        name,
        ty,
        qualifiers,
        unique,
        owner: None,
    })))
}

impl Attribute {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn ty(&self) -> &Type {
        &self.0.ty
    }

    pub fn qualifiers(&self) -> &Qualifiers {
        &self.0.qualifiers
    }

    pub fn is_unique(&self) -> bool {
        self.0.unique
    }

    /// Name of the table this attribute is bound into, if any.
    pub fn table(&self) -> Option<&str> {
        self.0.owner.as_ref().map(|owner| owner.table.as_ref())
    }

    pub fn ptr_eq(a: &Attribute, b: &Attribute) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub(crate) fn bind(&self, owner: Owner) -> Attribute {
        Attribute(Arc::new(AttributeData {
            name: self.0.name.clone(),
            ty: self.0.ty.clone(),
            qualifiers: self.0.qualifiers.clone(),
            unique: self.0.unique,
            owner: Some(owner),
        }))
    }

    /// True when `key` determines this attribute: either it is this attribute, or it is
    /// a unique attribute of the same table.
    pub fn functionally_dependent_on(&self, key: &Attribute) -> bool {
        if Attribute::ptr_eq(self, key) {
            return true;
        }

        match (&self.0.owner, &key.0.owner) {
            (Some(a), Some(b)) => a == b && key.is_unique(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Literal {
    ty: Type,
    text: Arc<str>,
}

impl Literal {
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// SQL text, already quoted where needed.
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
    Ne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunc {
    Count,
    Avg,
}

impl CompareOp {
    pub fn name(&self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Lt => "lt",
            CompareOp::Gt => "gt",
            CompareOp::Le => "le",
            CompareOp::Ge => "ge",
            CompareOp::Ne => "ne",
        }
    }
}

impl LogicOp {
    pub fn name(&self) -> &'static str {
        match self {
            LogicOp::And => "and",
            LogicOp::Or => "or",
        }
    }
}

impl ArithOp {
    pub fn name(&self) -> &'static str {
        match self {
            ArithOp::Add => "add",
            ArithOp::Sub => "sub",
            ArithOp::Mul => "mul",
            ArithOp::Div => "div",
            ArithOp::Mod => "mod",
        }
    }
}

impl AggregateFunc {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunc::Count => "count",
            AggregateFunc::Avg => "avg",
        }
    }
}

#[derive(Debug)]
pub struct Binary<Op> {
    pub op: Op,
    pub ty: Type,
    pub left: Expr,
    pub right: Expr,
}

#[derive(Debug)]
pub struct Aggregate {
    pub func: AggregateFunc,
    pub ty: Type,
    pub operand: Expr,
}

#[derive(Debug)]
pub struct Membership {
    pub ty: Type,
    pub operand: Expr,
    pub relation: Relation,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Literal),
    Attribute(Attribute),
    Compare(Arc<Binary<CompareOp>>),
    Logic(Arc<Binary<LogicOp>>),
    Arithmetic(Arc<Binary<ArithOp>>),
    Aggregate(Arc<Aggregate>),
    In(Arc<Membership>),
}

/// Anything accepted where an expression operand is expected.
#[derive(Debug, Clone)]
pub enum Operand {
    Expr(Expr),
    Value(Value),
    Enum(EnumValue),
}

/// Turn a host value into an expression; expressions pass through unchanged.
pub fn wrap_literal(operand: impl Into<Operand>) -> Result<Expr> {
    match operand.into() {
        Operand::Expr(expr) => Ok(expr),
        Operand::Value(value) => {
            let (ty, text) = value.to_literal()?;
            Ok(Expr::Literal(Literal {
                ty,
                text: text.into(),
            }))
        }
        Operand::Enum(value) => Ok(Expr::Literal(Literal {
            ty: Type::Domain(value.domain().clone()),
            text: quote(value.label()).into(),
        })),
    }
}

impl Expr {
    pub fn ty(&self) -> &Type {
        match self {
            Expr::Literal(literal) => &literal.ty,
            Expr::Attribute(attribute) => attribute.ty(),
            Expr::Compare(node) => &node.ty,
            Expr::Logic(node) => &node.ty,
            Expr::Arithmetic(node) => &node.ty,
            Expr::Aggregate(node) => &node.ty,
            Expr::In(node) => &node.ty,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, Expr::Aggregate(_))
    }

    pub fn as_attribute(&self) -> Option<&Attribute> {
        match self {
            Expr::Attribute(attribute) => Some(attribute),
            _ => None,
        }
    }

    /// Child expressions. The subselect of a membership test is not a child: it is
    /// scoped by its own relation.
    pub fn operands(&self) -> Vec<&Expr> {
        match self {
            Expr::Literal(_) | Expr::Attribute(_) => Vec::new(),
            Expr::Compare(node) => vec![&node.left, &node.right],
            Expr::Logic(node) => vec![&node.left, &node.right],
            Expr::Arithmetic(node) => vec![&node.left, &node.right],
            Expr::Aggregate(node) => vec![&node.operand],
            Expr::In(node) => vec![&node.operand],
        }
    }

    pub fn eq(&self, rhs: impl Into<Operand>) -> Result<Expr> {
        self.compare(CompareOp::Eq, rhs)
    }

    pub fn lt(&self, rhs: impl Into<Operand>) -> Result<Expr> {
        self.compare(CompareOp::Lt, rhs)
    }

    pub fn gt(&self, rhs: impl Into<Operand>) -> Result<Expr> {
        self.compare(CompareOp::Gt, rhs)
    }

    pub fn le(&self, rhs: impl Into<Operand>) -> Result<Expr> {
        self.compare(CompareOp::Le, rhs)
    }

    pub fn ge(&self, rhs: impl Into<Operand>) -> Result<Expr> {
        self.compare(CompareOp::Ge, rhs)
    }

    pub fn ne(&self, rhs: impl Into<Operand>) -> Result<Expr> {
        self.compare(CompareOp::Ne, rhs)
    }

    pub fn and(&self, rhs: impl Into<Operand>) -> Result<Expr> {
        self.logic(LogicOp::And, rhs)
    }

    pub fn or(&self, rhs: impl Into<Operand>) -> Result<Expr> {
        self.logic(LogicOp::Or, rhs)
    }

    pub fn add(&self, rhs: impl Into<Operand>) -> Result<Expr> {
        self.arithmetic(ArithOp::Add, rhs)
    }

    pub fn sub(&self, rhs: impl Into<Operand>) -> Result<Expr> {
        self.arithmetic(ArithOp::Sub, rhs)
    }

    pub fn mul(&self, rhs: impl Into<Operand>) -> Result<Expr> {
        self.arithmetic(ArithOp::Mul, rhs)
    }

    pub fn div(&self, rhs: impl Into<Operand>) -> Result<Expr> {
        self.arithmetic(ArithOp::Div, rhs)
    }

    pub fn modulo(&self, rhs: impl Into<Operand>) -> Result<Expr> {
        self.arithmetic(ArithOp::Mod, rhs)
    }

    /// Membership test against a single-attribute relation.
    pub fn is_in(&self, relation: &Relation) -> Result<Expr> {
        let attributes = relation.attributes();
        let column = match attributes.values().next() {
            Some(column) if attributes.len() == 1 => column,
            _ => return Err(Error::NotSingleAttribute(attributes.len())),
        };

        if join(self.ty(), column.ty()).is_none() {
            return Err(incompatible("in", self.ty(), column.ty()));
        }

        Ok(Expr::In(Arc::new(Membership {
            ty: Type::Boolean,
            operand: self.clone(),
            relation: relation.clone(),
        })))
    }

    pub fn count(&self) -> Expr {
        Expr::Aggregate(Arc::new(Aggregate {
            func: AggregateFunc::Count,
            ty: Type::Number,
            operand: self.clone(),
        }))
    }

    pub fn avg(&self) -> Result<Expr> {
        if join(self.ty(), &Type::Number).is_none() {
            return Err(Error::NotNumeric {
                func: AggregateFunc::Avg.name(),
                found: self.ty().name(),
            });
        }

        Ok(Expr::Aggregate(Arc::new(Aggregate {
            func: AggregateFunc::Avg,
            ty: Type::Number,
            operand: self.clone(),
        })))
    }

    fn compare(&self, op: CompareOp, rhs: impl Into<Operand>) -> Result<Expr> {
        let right = wrap_literal(rhs)?;
        if join(self.ty(), right.ty()).is_none() {
            return Err(incompatible(op.name(), self.ty(), right.ty()));
        }

        Ok(Expr::Compare(Arc::new(Binary {
            op,
            ty: Type::Boolean,
            left: self.clone(),
            right,
        })))
    }

    fn logic(&self, op: LogicOp, rhs: impl Into<Operand>) -> Result<Expr> {
        let right = wrap_literal(rhs)?;
        let ty = match join(self.ty(), right.ty()) {
            Some(ty) if ty.is_boolean() => ty,
            _ => return Err(incompatible(op.name(), self.ty(), right.ty())),
        };

        Ok(Expr::Logic(Arc::new(Binary {
            op,
            ty,
            left: self.clone(),
            right,
        })))
    }

    fn arithmetic(&self, op: ArithOp, rhs: impl Into<Operand>) -> Result<Expr> {
        let right = wrap_literal(rhs)?;
        let ty = match join(self.ty(), right.ty()) {
            Some(ty) if ty.is_numeric() => ty,
            _ => return Err(incompatible(op.name(), self.ty(), right.ty())),
        };

        Ok(Expr::Arithmetic(Arc::new(Binary {
            op,
            ty,
            left: self.clone(),
            right,
        })))
    }
}

/// Enum columns take one of their labels; every other default must join the column type.
fn check_default(ty: &Type, default: &Value) -> Result<()> {
    if let (Type::Enum(values), Value::String(label)) = (ty.base(), default) {
        return if values.contains(label) {
            Ok(())
        } else {
            Err(Error::UnknownEnumLabel {
                domain: ty.name(),
                label: label.clone(),
            })
        };
    }

    let (default_ty, _) = default.to_literal()?;
    match join(ty, &default_ty) {
        Some(_) => Ok(()),
        None => Err(incompatible("default", ty, &default_ty)),
    }
}

fn incompatible(op: &'static str, left: &Type, right: &Type) -> Error {
    Error::IncompatibleTypes {
        op,
        left: left.name(),
        right: right.name(),
    }
}

impl From<Attribute> for Expr {
    fn from(attribute: Attribute) -> Self {
        Expr::Attribute(attribute)
    }
}

impl From<Expr> for Operand {
    fn from(expr: Expr) -> Self {
        Operand::Expr(expr)
    }
}

impl From<&Expr> for Operand {
    fn from(expr: &Expr) -> Self {
        Operand::Expr(expr.clone())
    }
}

impl From<EnumValue> for Operand {
    fn from(value: EnumValue) -> Self {
        Operand::Enum(value)
    }
}

impl From<&EnumValue> for Operand {
    fn from(value: &EnumValue) -> Self {
        Operand::Enum(value.clone())
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Value(value)
    }
}

macro_rules! operand_from_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Operand {
                fn from(value: $t) -> Self {
                    Operand::Value(Value::from(value))
                }
            }
        )*
    };
}

operand_from_value!(bool, i32, i64, u32, f64, &str, String);
