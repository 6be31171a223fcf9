//! Query parameters and filter construction.
//!
//! Operations take plain BSON filter documents, which is all the driver
//! needs. This module adds two conveniences on top:
//!
//! - [`Query`] bundles a filter with sort, limit and offset for the paged and
//!   sorted find operations.
//! - [`Filter`] builds filter documents from typed expressions instead of
//!   hand-written `doc!` literals.
//!
//! # Example
//!
//! ```ignore
//! use mongolayer::query::{Query, Filter, SortDirection};
//!
//! let query = Query::builder()
//!     .filter(Filter::gte("data", 3).and(Filter::exists("owner")).to_document()?)
//!     .sort("data", SortDirection::Desc)
//!     .limit(10)
//!     .offset(20)
//!     .build();
//! ```

use bson::{Bson, Document, doc};

use crate::error::{MongoError, MongoResult};

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

impl SortDirection {
    fn as_i32(&self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// The field name to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

/// Field comparison operators for filter expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Field value is one of the given array.
    AnyOf,
    /// Field value is none of the given array.
    NoneOf,
}

/// A filter expression.
///
/// Expressions can be combined using logical operators (`And`, `Or`, `Not`)
/// and translated into a filter document with [`Expr::to_document`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Logical AND of multiple expressions (all must match).
    And(Vec<Expr>),
    /// Logical OR of multiple expressions (any must match).
    Or(Vec<Expr>),
    /// Logical NOT of an expression.
    Not(Box<Expr>),
    /// Checks if a field exists or doesn't exist.
    Exists(String, bool),
    /// Field comparison expression.
    Field {
        field: String,
        op: FieldOp,
        value: Bson,
    },
}

impl Expr {
    /// Creates a field comparison expression.
    pub fn field(field: String, op: FieldOp, value: Bson) -> Self {
        Expr::Field { field, op, value }
    }

    /// Combines this expression with another using logical AND.
    ///
    /// If this expression is already an AND, the other expression is appended
    /// to the list. Otherwise, a new AND expression is created.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Combines this expression with another using logical OR.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut list) => {
                list.push(other);
                Expr::Or(list)
            }
            _ => Expr::Or(vec![self, other]),
        }
    }

    /// Negates this expression.
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// Translates the expression into a filter document.
    pub fn to_document(&self) -> MongoResult<Document> {
        FilterTranslator.visit_expr(self)
    }
}

/// Static constructors for filter expressions.
pub struct Filter;

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Eq, value.into())
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Ne, value.into())
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gt, value.into())
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gte, value.into())
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lt, value.into())
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lte, value.into())
    }

    /// Matches documents where the field exists.
    pub fn exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), true)
    }

    /// Matches documents where the field is missing.
    pub fn not_exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), false)
    }

    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }

    /// Matches documents where the field equals any of the given values.
    pub fn any_of(field: impl Into<String>, values: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::AnyOf, values.into())
    }

    /// Matches documents where the field equals none of the given values.
    pub fn none_of(field: impl Into<String>, values: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::NoneOf, values.into())
    }
}

pub trait QueryVisitor {
    type Output;
    type Error: Into<MongoError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error>;
    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error>;
    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(expr) => self.visit_not(expr),
            Expr::Exists(field, should_exist) => self.visit_exists(field, *should_exist),
            Expr::Field { field, op, value } => self.visit_field(field, op, value),
        }
    }
}

/// Translates expressions into MongoDB filter documents.
pub struct FilterTranslator;

impl FilterTranslator {
    fn visit_all(&mut self, exprs: &[Expr]) -> MongoResult<Vec<Document>> {
        exprs.iter().map(|expr| self.visit_expr(expr)).collect()
    }
}

impl QueryVisitor for FilterTranslator {
    type Output = Document;
    type Error = MongoError;

    fn visit_and(&mut self, exprs: &[Expr]) -> MongoResult<Document> {
        Ok(doc! { "$and": self.visit_all(exprs)? })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> MongoResult<Document> {
        Ok(doc! { "$or": self.visit_all(exprs)? })
    }

    // `$not` only applies to operator expressions, so negate whole filters with `$nor`.
    fn visit_not(&mut self, expr: &Expr) -> MongoResult<Document> {
        Ok(doc! { "$nor": [self.visit_expr(expr)?] })
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> MongoResult<Document> {
        Ok(doc! { field: { "$exists": should_exist } })
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> MongoResult<Document> {
        let condition = match op {
            FieldOp::Eq => doc! { "$eq": value },
            FieldOp::Ne => doc! { "$ne": value },
            FieldOp::Gt => doc! { "$gt": value },
            FieldOp::Gte => doc! { "$gte": value },
            FieldOp::Lt => doc! { "$lt": value },
            FieldOp::Lte => doc! { "$lte": value },
            FieldOp::AnyOf | FieldOp::NoneOf => {
                let Bson::Array(values) = value else {
                    return Err(MongoError::InvalidArgument(format!(
                        "{op:?} on '{field}' requires an array value"
                    )));
                };
                match op {
                    FieldOp::AnyOf => doc! { "$in": values.clone() },
                    _ => doc! { "$nin": values.clone() },
                }
            }
        };

        Ok(doc! { field: condition })
    }
}

/// Filter, sort and paging parameters for a find.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Filter document; empty matches everything.
    pub filter: Document,
    /// Sort keys, applied in order.
    pub sort: Vec<Sort>,
    /// Maximum number of documents to return.
    pub limit: Option<usize>,
    /// Number of documents to skip.
    pub offset: Option<usize>,
}

impl Query {
    /// Creates a query matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    /// The sort keys as a sort document, if any were given.
    pub fn sort_document(&self) -> Option<Document> {
        if self.sort.is_empty() {
            return None;
        }

        Some(
            self.sort
                .iter()
                .map(|sort| (sort.field.clone(), Bson::Int32(sort.direction.as_i32())))
                .collect(),
        )
    }
}

/// Fluent builder for [`Query`].
#[derive(Debug, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    pub fn new() -> Self {
        QueryBuilder { query: Query::default() }
    }

    /// Sets the filter document.
    pub fn filter(mut self, filter: Document) -> Self {
        self.query.filter = filter;
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Sets the number of documents to skip.
    pub fn offset(mut self, offset: usize) -> Self {
        self.query.offset = Some(offset);
        self
    }

    /// Appends a sort key. Keys added first take precedence.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.sort.push(Sort { field: field.into(), direction });
        self
    }

    pub fn build(self) -> Query {
        self.query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_operators() {
        assert_eq!(Filter::eq("name", "Alice").to_document().unwrap(), doc! { "name": { "$eq": "Alice" } });
        assert_eq!(Filter::gte("data", 3).to_document().unwrap(), doc! { "data": { "$gte": 3 } });
        assert_eq!(Filter::lt("data", 3.5).to_document().unwrap(), doc! { "data": { "$lt": 3.5 } });
        assert_eq!(
            Filter::any_of("_id", vec!["a", "b"]).to_document().unwrap(),
            doc! { "_id": { "$in": ["a", "b"] } }
        );
        assert_eq!(
            Filter::none_of("_id", vec!["a"]).to_document().unwrap(),
            doc! { "_id": { "$nin": ["a"] } }
        );
    }

    #[test]
    fn test_any_of_requires_array() {
        let err = Filter::any_of("_id", "a").to_document().unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_logical_operators() {
        let expr = Filter::gte("data", 3).and(Filter::exists("owner")).and(Filter::ne("owner", "bob"));
        assert_eq!(
            expr.to_document().unwrap(),
            doc! { "$and": [
                { "data": { "$gte": 3 } },
                { "owner": { "$exists": true } },
                { "owner": { "$ne": "bob" } },
            ] }
        );

        let expr = Filter::or([Filter::eq("a", 1), Filter::not_exists("b")]);
        assert_eq!(
            expr.to_document().unwrap(),
            doc! { "$or": [ { "a": { "$eq": 1 } }, { "b": { "$exists": false } } ] }
        );
    }

    #[test]
    fn test_not_uses_nor() {
        assert_eq!(
            Filter::eq("a", 1).not().to_document().unwrap(),
            doc! { "$nor": [ { "a": { "$eq": 1 } } ] }
        );
    }

    #[test]
    fn test_query_builder() {
        let query = Query::builder()
            .filter(doc! { "data": { "$gte": 3 } })
            .sort("data", SortDirection::Desc)
            .sort("_id", SortDirection::Asc)
            .limit(5)
            .offset(10)
            .build();

        assert_eq!(query.filter, doc! { "data": { "$gte": 3 } });
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.offset, Some(10));
        assert_eq!(query.sort_document(), Some(doc! { "data": -1, "_id": 1 }));
    }

    #[test]
    fn test_empty_query() {
        let query = Query::new();
        assert!(query.filter.is_empty());
        assert_eq!(query.sort_document(), None);
    }
}
