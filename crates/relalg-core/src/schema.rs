//! Registry of declared base relations

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::expr::Attribute;
use crate::relation::{table, Relation, TableQualifiers};

/// Tables in declaration order. Schema validation walks this registry.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    tables: IndexMap<String, Relation>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a table and register it under its name.
    pub fn table<I>(&mut self, name: impl Into<String>, attributes: I, qualifiers: TableQualifiers) -> Result<Relation>
    where
        I: IntoIterator<Item = Attribute>,
    {
        let name = name.into();
        if self.tables.contains_key(&name) {
            return Err(Error::DuplicateRelation(name));
        }

        let relation = table(name.clone(), attributes, qualifiers)?;
        self.tables.insert(name, relation.clone());
        Ok(relation)
    }

    pub fn get(&self, name: &str) -> Option<&Relation> {
        self.tables.get(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Relation> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::attribute;
    use crate::types::{Qualifiers, Type};

    fn id() -> Vec<Attribute> {
        vec![attribute("id", Type::Integer, Qualifiers::new()).unwrap()]
    }

    #[test]
    fn test_register_tables_in_order() {
        let mut schema = Schema::new();
        schema
            .table(
                "account_managers",
                [
                    attribute("id", Type::Integer, Qualifiers::new()).unwrap(),
                    attribute("name", Type::String, Qualifiers::new().unique()).unwrap(),
                ],
                TableQualifiers::new(),
            )
            .unwrap();
        schema.table("accounts", id(), TableQualifiers::new()).unwrap();

        let names: Vec<_> = schema.tables().filter_map(|t| t.name()).collect();
        assert_eq!(names, vec!["account_managers", "accounts"]);
        assert!(schema.get("accounts").is_some());
        assert_eq!(schema.len(), 2);
    }

    #[test]
    fn test_empty_table_not_registered() {
        let mut schema = Schema::new();
        assert_eq!(
            schema.table("e", Vec::new(), TableQualifiers::new()).unwrap_err(),
            Error::NoAttributes("table")
        );
        assert!(schema.is_empty());
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let mut schema = Schema::new();
        schema.table("t", id(), TableQualifiers::new()).unwrap();
        assert_eq!(
            schema.table("t", id(), TableQualifiers::new()).unwrap_err(),
            Error::DuplicateRelation("t".to_string())
        );
    }
}
