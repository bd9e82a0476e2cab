//! SQL compiler
//!
//! Renders relations and expressions to SQL text. One core serves every target; the
//! [`Dialect`] decides column types, key syntax and insert conventions.

use relalg_core::expr::{AggregateFunc, ArithOp, CompareOp, Literal, LogicOp};
use relalg_core::{join, valid, wrap_literal, Expr, Relation, Value};

use crate::dialect::Dialect;
use crate::error::CompileError;
use crate::row::Row;
use crate::statement::Statement;

pub type Result<T> = std::result::Result<T, CompileError>;

pub struct SqlCompiler<'a> {
    dialect: &'a dyn Dialect,
}

impl<'a> SqlCompiler<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> &'a dyn Dialect {
        self.dialect
    }

    /// Render an expression. Attributes carry their table name when `qualified`.
    pub fn expr_to_sql(&self, expr: &Expr, qualified: bool) -> String {
        match expr {
            Expr::Literal(literal) => self.literal_to_sql(literal),
            Expr::Attribute(attribute) => match attribute.table() {
                Some(table) if qualified => format!("{}.{}", table, attribute.name()),
                _ => attribute.name().to_string(),
            },
            Expr::Compare(node) => {
                let op = match node.op {
                    CompareOp::Eq => "=",
                    CompareOp::Lt => "<",
                    CompareOp::Gt => ">",
                    CompareOp::Le => "<=",
                    CompareOp::Ge => ">=",
                    CompareOp::Ne => "!=",
                };
                self.binary(op, &node.left, &node.right, qualified)
            }
            Expr::Logic(node) => {
                let op = match node.op {
                    LogicOp::And => "and",
                    LogicOp::Or => "or",
                };
                self.binary(op, &node.left, &node.right, qualified)
            }
            Expr::Arithmetic(node) => {
                let op = match node.op {
                    ArithOp::Add => "+",
                    ArithOp::Sub => "-",
                    ArithOp::Mul => "*",
                    ArithOp::Div => "/",
                    ArithOp::Mod => "%",
                };
                self.binary(op, &node.left, &node.right, qualified)
            }
            Expr::Aggregate(node) => {
                let func = match node.func {
                    AggregateFunc::Count => "count",
                    AggregateFunc::Avg => "avg",
                };
                format!("{}({})", func, self.expr_to_sql(&node.operand, qualified))
            }
            Expr::In(node) => format!(
                "{} in ({})",
                self.expr_to_sql(&node.operand, qualified),
                self.select_text(&node.relation, false)
            ),
        }
    }

    fn literal_to_sql(&self, literal: &Literal) -> String {
        if literal.ty().is_boolean() {
            match literal.text() {
                "true" => return self.dialect.boolean_literal(true).to_string(),
                "false" => return self.dialect.boolean_literal(false).to_string(),
                _ => {}
            }
        }
        literal.text().to_string()
    }

    fn binary(&self, op: &str, left: &Expr, right: &Expr, qualified: bool) -> String {
        format!(
            "({} {} {})",
            self.expr_to_sql(left, qualified),
            op,
            self.expr_to_sql(right, qualified)
        )
    }

    /// SELECT for a relation. With `rename`, computed or renamed columns get an alias.
    pub fn relation_to_select(&self, relation: &Relation, rename: bool) -> Statement {
        let statement = Statement::new(self.select_text(relation, rename));
        self.trace("select", &statement);
        statement
    }

    fn select_text(&self, relation: &Relation, rename: bool) -> String {
        let qualified = relation.sources().len() > 1;

        let columns = relation
            .attributes()
            .iter()
            .map(|(key, expr)| {
                let sql = self.expr_to_sql(expr, qualified);
                let bare = expr.as_attribute().is_some_and(|a| a.name() == key);
                if rename && !bare {
                    format!("{} as {}", sql, key)
                } else {
                    sql
                }
            })
            .collect::<Vec<_>>()
            .join(", ");

        let sources = relation
            .sources()
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!("select {} from {}", columns, sources);

        if !relation.restrictions().is_empty() {
            sql.push_str(" where ");
            sql.push_str(&self.list(relation.restrictions(), " and ", qualified));
        }
        if !relation.groups().is_empty() {
            sql.push_str(" group by ");
            sql.push_str(&self.list(relation.groups(), ", ", qualified));
        }
        if !relation.orders().is_empty() {
            sql.push_str(" order by ");
            sql.push_str(&self.list(relation.orders(), ", ", qualified));
        }

        sql
    }

    fn list(&self, exprs: &[Expr], separator: &str, qualified: bool) -> String {
        exprs
            .iter()
            .map(|e| self.expr_to_sql(e, qualified))
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// CREATE TABLE for a base relation.
    pub fn relation_to_create(&self, relation: &Relation) -> Result<Statement> {
        let name = relation.name().ok_or(CompileError::NotCreatable)?;

        let mut columns = Vec::with_capacity(relation.attributes().len());
        for attribute in relation.attributes().values().filter_map(Expr::as_attribute) {
            let qualifiers = attribute.qualifiers();
            let mut column = format!("{} {}", attribute.name(), self.dialect.column_type(attribute));

            if let Some(key) = self.dialect.key_constraint(attribute) {
                column.push(' ');
                column.push_str(key);
            }
            if qualifiers.unique {
                column.push_str(" unique");
            }
            if qualifiers.not_null {
                column.push_str(" not null");
            }
            if let Some(default) = &qualifiers.default {
                let literal = match default {
                    Value::Bool(value) => self.dialect.boolean_literal(*value).to_string(),
                    other => other.to_literal()?.1,
                };
                column.push_str(" default ");
                column.push_str(&literal);
            }

            columns.push(column);
        }

        let statement = Statement::new(format!("create table {} ({})", name, columns.join(", ")));
        self.trace("create", &statement);
        Ok(statement)
    }

    pub fn relation_to_drop(&self, relation: &Relation) -> Result<Statement> {
        let name = relation.name().ok_or(CompileError::NotCreatable)?;
        let statement = Statement::new(format!("drop table if exists {}", name));
        self.trace("drop", &statement);
        Ok(statement)
    }

    /// INSERT one or more rows. Every row must supply the columns of the first.
    pub fn rows_to_insert(&self, relation: &Relation, rows: &[Row]) -> Result<Statement> {
        let name = writable(relation, "insert")?;

        let first = match rows.first() {
            Some(row) if !row.is_empty() => row,
            _ => return Err(CompileError::EmptyRow { op: "insert" }),
        };
        if rows.len() > 1 && !self.dialect.supports_multi_row_insert() {
            return Err(CompileError::MultiRowUnsupported {
                dialect: self.dialect.name(),
            });
        }

        let columns: Vec<&str> = first.columns().collect();
        let mut tuples = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            if !row.same_columns(first) {
                return Err(CompileError::HeterogeneousRows { row: index });
            }

            let mut values = Vec::with_capacity(columns.len());
            for column in &columns {
                let value = row
                    .get(column)
                    .ok_or(CompileError::HeterogeneousRows { row: index })?;
                values.push(self.write_value(relation, name, column, value, "insert")?);
            }
            tuples.push(values.join(","));
        }

        let statement = Statement::new(format!(
            "insert into {} ({}) values ({}){}",
            name,
            columns.join(","),
            tuples.join("), ("),
            self.dialect.insert_suffix()
        ));
        self.trace("insert", &statement);
        Ok(statement)
    }

    /// UPDATE the rows matching `condition`, or every row when it is absent.
    pub fn row_to_update(&self, relation: &Relation, row: &Row, condition: Option<&Expr>) -> Result<Statement> {
        let name = writable(relation, "update")?;
        if row.is_empty() {
            return Err(CompileError::EmptyRow { op: "update" });
        }

        let mut assignments = Vec::with_capacity(row.len());
        for (column, value) in row.iter() {
            let value = self.write_value(relation, name, column, value, "update")?;
            assignments.push(format!("{} = {}", column, value));
        }

        let mut sql = format!("update {} set {}", name, assignments.join(","));
        if let Some(condition) = condition {
            sql.push_str(" where ");
            sql.push_str(&self.condition(relation, condition, "update condition")?);
        }

        let statement = Statement::new(sql);
        self.trace("update", &statement);
        Ok(statement)
    }

    /// DELETE the rows matching `condition`, or every row when it is absent.
    pub fn relation_to_remove(&self, relation: &Relation, condition: Option<&Expr>) -> Result<Statement> {
        let name = writable(relation, "remove")?;

        let mut sql = format!("delete from {}", name);
        if let Some(condition) = condition {
            sql.push_str(" where ");
            sql.push_str(&self.condition(relation, condition, "remove condition")?);
        }

        let statement = Statement::new(sql);
        self.trace("remove", &statement);
        Ok(statement)
    }

    fn write_value(
        &self,
        relation: &Relation,
        table: &str,
        column: &str,
        value: &relalg_core::Operand,
        op: &'static str,
    ) -> Result<String> {
        let target = relation
            .attributes()
            .get(column)
            .ok_or_else(|| CompileError::UnknownColumn {
                relation: table.to_string(),
                column: column.to_string(),
            })?;

        let value = wrap_literal(value.clone())?;
        if !valid(relation, &value) {
            return Err(relalg_core::Error::OutOfScope { context: "write value" }.into());
        }
        if join(target.ty(), value.ty()).is_none() {
            return Err(relalg_core::Error::IncompatibleTypes {
                op,
                left: target.ty().name(),
                right: value.ty().name(),
            }
            .into());
        }

        Ok(self.expr_to_sql(&value, false))
    }

    fn condition(&self, relation: &Relation, condition: &Expr, context: &'static str) -> Result<String> {
        if !valid(relation, condition) {
            return Err(relalg_core::Error::OutOfScope { context }.into());
        }
        if !condition.ty().is_boolean() {
            return Err(relalg_core::Error::NotBoolean {
                context,
                found: condition.ty().name(),
            }
            .into());
        }
        Ok(self.expr_to_sql(condition, false))
    }

    fn trace(&self, kind: &'static str, statement: &Statement) {
        tracing::debug!(
            dialect = self.dialect.name(),
            kind,
            sql = %statement.sql,
            fingerprint = %statement.fingerprint(),
            "compiled statement"
        );
    }
}

fn writable<'r>(relation: &'r Relation, op: &'static str) -> Result<&'r str> {
    relation.name().ok_or(CompileError::NotWritable { op })
}
