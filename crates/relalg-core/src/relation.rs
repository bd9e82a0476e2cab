//! Relational algebra: base tables and the operators deriving new relations from them
//!
//! A [`Relation`] is an immutable snapshot. Operators return a new relation that shares
//! every list it did not change with its parent; changed lists are copied on write.

use indexmap::IndexMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::expr::{wrap_literal, Attribute, Expr, Operand, Owner};
use crate::ident::validate_identifier;
use crate::types::Value;

/// Free-form table options, kept for adapters that understand them.
pub type TableQualifiers = IndexMap<String, Value>;

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone)]
pub enum RelationKind {
    Table {
        name: String,
        qualifiers: TableQualifiers,
    },
    Derived,
}

#[derive(Debug, Clone)]
struct RelationData {
    kind: RelationKind,
    sources: Arc<Vec<Arc<str>>>,
    attributes: Arc<IndexMap<String, Expr>>,
    restrictions: Arc<Vec<Expr>>,
    groups: Arc<Vec<Expr>>,
    orders: Arc<Vec<Expr>>,
}

#[derive(Debug, Clone)]
pub struct Relation(Arc<RelationData>);

/// Declare a base relation. Each attribute is rebound to the new table so that
/// attributes of the same table can later be recognised as such.
pub fn table<I>(name: impl Into<String>, attributes: I, qualifiers: TableQualifiers) -> Result<Relation>
where
    I: IntoIterator<Item = Attribute>,
{
    let name = name.into();
    validate_identifier(&name)?;

    let owner = Owner {
        id: NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed),
        table: Arc::from(name.as_str()),
    };

    let mut bound = IndexMap::new();
    for attribute in attributes {
        let key = attribute.name().to_string();
        if bound.contains_key(&key) {
            return Err(Error::DuplicateAttribute(key));
        }
        bound.insert(key, Expr::Attribute(attribute.bind(owner.clone())));
    }
    if bound.is_empty() {
        return Err(Error::NoAttributes("table"));
    }

    tracing::debug!(table = %name, attributes = bound.len(), "declared relation");

    Ok(Relation(Arc::new(RelationData {
        sources: Arc::new(vec![owner.table.clone()]),
        kind: RelationKind::Table { name, qualifiers },
        attributes: Arc::new(bound),
        restrictions: Arc::default(),
        groups: Arc::default(),
        orders: Arc::default(),
    })))
}

impl Relation {
    pub fn kind(&self) -> &RelationKind {
        &self.0.kind
    }

    pub fn is_table(&self) -> bool {
        matches!(self.0.kind, RelationKind::Table { .. })
    }

    /// Table name, for base relations only.
    pub fn name(&self) -> Option<&str> {
        match &self.0.kind {
            RelationKind::Table { name, .. } => Some(name),
            RelationKind::Derived => None,
        }
    }

    pub fn qualifiers(&self) -> Option<&TableQualifiers> {
        match &self.0.kind {
            RelationKind::Table { qualifiers, .. } => Some(qualifiers),
            RelationKind::Derived => None,
        }
    }

    pub fn sources(&self) -> &[Arc<str>] {
        &self.0.sources
    }

    /// Output columns in order.
    pub fn attributes(&self) -> &IndexMap<String, Expr> {
        &self.0.attributes
    }

    pub fn restrictions(&self) -> &[Expr] {
        &self.0.restrictions
    }

    pub fn groups(&self) -> &[Expr] {
        &self.0.groups
    }

    pub fn orders(&self) -> &[Expr] {
        &self.0.orders
    }

    /// Look up an output column by name.
    pub fn attr(&self, name: &str) -> Result<Expr> {
        self.0
            .attributes
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownAttribute(name.to_string()))
    }

    pub fn ptr_eq(a: &Relation, b: &Relation) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// True when `attribute` is one of this relation's output columns.
    pub fn owns(&self, attribute: &Attribute) -> bool {
        self.0
            .attributes
            .values()
            .filter_map(Expr::as_attribute)
            .any(|own| Attribute::ptr_eq(own, attribute))
    }

    fn derive(&self) -> RelationData {
        RelationData {
            kind: RelationKind::Derived,
            ..(*self.0).clone()
        }
    }

    /// Project, extend and rename in one step.
    pub fn project<I, K, V>(&self, columns: I) -> Result<Relation>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Operand>,
    {
        let mut projected = IndexMap::new();
        for (key, value) in columns {
            let key = key.into();
            validate_identifier(&key)?;

            let expr = wrap_literal(value)?;
            if !valid(self, &expr) {
                return Err(Error::OutOfScope { context: "project argument" });
            }
            if !valid_aggregate(self, &expr) {
                return Err(Error::NotAggregated(key));
            }

            if projected.insert(key.clone(), expr).is_some() {
                return Err(Error::DuplicateAttribute(key));
            }
        }
        if projected.is_empty() {
            return Err(Error::NoAttributes("project"));
        }

        let mut data = self.derive();
        data.attributes = Arc::new(projected);
        Ok(Relation(Arc::new(data)))
    }

    /// Filter rows. Passing `None` returns this relation unchanged.
    pub fn restrict(&self, predicate: impl Into<Option<Expr>>) -> Result<Relation> {
        let Some(predicate) = predicate.into() else {
            return Ok(self.clone());
        };

        if !valid(self, &predicate) {
            return Err(Error::OutOfScope { context: "restrict argument" });
        }
        require_boolean("restrict argument", &predicate)?;

        let mut data = self.derive();
        Arc::make_mut(&mut data.restrictions).push(predicate);
        Ok(Relation(Arc::new(data)))
    }

    /// Combine with `other`, keeping rows where `on` holds. Output names must not collide.
    pub fn join(&self, other: &Relation, on: Expr) -> Result<Relation> {
        require_boolean("join on argument", &on)?;

        let mut data = self.derive();

        let sources = Arc::make_mut(&mut data.sources);
        sources.extend(other.sources().iter().cloned());

        let attributes = Arc::make_mut(&mut data.attributes);
        for (key, value) in other.attributes() {
            if attributes.contains_key(key) {
                return Err(Error::DuplicateAttribute(key.clone()));
            }
            attributes.insert(key.clone(), value.clone());
        }

        let restrictions = Arc::make_mut(&mut data.restrictions);
        restrictions.extend(other.restrictions().iter().cloned());
        restrictions.push(on.clone());

        let joined = Relation(Arc::new(data));
        if !valid(&joined, &on) {
            return Err(Error::OutOfScope { context: "join on argument" });
        }

        Ok(joined)
    }

    /// Add a grouping key. Keys keep their call order; the first is primary.
    pub fn group(&self, key: Expr) -> Result<Relation> {
        if !valid(self, &key) {
            return Err(Error::OutOfScope { context: "group argument" });
        }

        let mut data = self.derive();
        Arc::make_mut(&mut data.groups).push(key);
        Ok(Relation(Arc::new(data)))
    }

    /// Add an ordering key. Keys keep their call order; the first is primary.
    pub fn order(&self, key: Expr) -> Result<Relation> {
        if !valid(self, &key) {
            return Err(Error::OutOfScope { context: "order argument" });
        }

        let mut data = self.derive();
        Arc::make_mut(&mut data.orders).push(key);
        Ok(Relation(Arc::new(data)))
    }
}

fn require_boolean(context: &'static str, expr: &Expr) -> Result<()> {
    if expr.ty().is_boolean() {
        Ok(())
    } else {
        Err(Error::NotBoolean {
            context,
            found: expr.ty().name(),
        })
    }
}

/// Every attribute referenced by `expr` belongs to `relation`.
pub fn valid(relation: &Relation, expr: &Expr) -> bool {
    match expr {
        Expr::Attribute(attribute) => relation.owns(attribute),
        other => other.operands().into_iter().all(|e| valid(relation, e)),
    }
}

/// Like [`valid`], and in a grouped relation every attribute outside an aggregate must
/// be functionally dependent on one of the grouping keys.
pub fn valid_aggregate(relation: &Relation, expr: &Expr) -> bool {
    fn check(relation: &Relation, expr: &Expr, aggregated: bool) -> bool {
        match expr {
            Expr::Attribute(attribute) => {
                relation.owns(attribute)
                    && (aggregated
                        || relation
                            .groups()
                            .iter()
                            .filter_map(Expr::as_attribute)
                            .any(|key| attribute.functionally_dependent_on(key)))
            }
            other => {
                let aggregated = aggregated || other.is_aggregate();
                other
                    .operands()
                    .into_iter()
                    .all(|e| check(relation, e, aggregated))
            }
        }
    }

    check(relation, expr, relation.groups().is_empty())
}
