//! Common types and traits shared across the query builders

use crate::reader::ReaderHandle;
use crate::table_ref::{FileSource, RemoteTable, TableRef};
use crate::Result;

use super::select::Query;

/// Core trait for all statement builders
pub trait QueryBuilder {
    /// Generate the SQL text
    fn to_sql(&self) -> Result<String>;
}

/// Trait to convert various types into a field selection
///
/// Strings are split on commas; list entries are taken as given. Every
/// entry is trimmed and empty entries are dropped.
pub trait IntoFields {
    fn into_fields(self) -> Vec<String>;
}

fn clean<I, S>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl IntoFields for &str {
    fn into_fields(self) -> Vec<String> {
        clean(self.split(','))
    }
}

impl IntoFields for String {
    fn into_fields(self) -> Vec<String> {
        self.as_str().into_fields()
    }
}

impl IntoFields for &String {
    fn into_fields(self) -> Vec<String> {
        self.as_str().into_fields()
    }
}

impl IntoFields for Vec<String> {
    fn into_fields(self) -> Vec<String> {
        clean(self)
    }
}

impl IntoFields for Vec<&str> {
    fn into_fields(self) -> Vec<String> {
        clean(self)
    }
}

impl IntoFields for &[&str] {
    fn into_fields(self) -> Vec<String> {
        clean(self)
    }
}

impl<const N: usize> IntoFields for [&str; N] {
    fn into_fields(self) -> Vec<String> {
        clean(self)
    }
}

// For tuples
impl IntoFields for (&str, &str) {
    fn into_fields(self) -> Vec<String> {
        clean([self.0, self.1])
    }
}

impl IntoFields for (&str, &str, &str) {
    fn into_fields(self) -> Vec<String> {
        clean([self.0, self.1, self.2])
    }
}

impl IntoFields for (&str, &str, &str, &str) {
    fn into_fields(self) -> Vec<String> {
        clean([self.0, self.1, self.2, self.3])
    }
}

/// Ordered join conditions, left key to right key
///
/// Keys are unique: inserting an existing left key replaces its right key
/// in place and keeps the original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinConditions {
    pairs: Vec<(String, String)>,
}

impl JoinConditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, left: impl Into<String>, right: impl Into<String>) {
        let left = left.into();
        let right = right.into();
        match self.pairs.iter_mut().find(|(key, _)| *key == left) {
            Some(pair) => pair.1 = right,
            None => self.pairs.push((left, right)),
        }
    }

    /// Builder-style insert
    pub fn on(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.insert(left, right);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(l, r)| (l.as_str(), r.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<L, R> FromIterator<(L, R)> for JoinConditions
where
    L: Into<String>,
    R: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (L, R)>>(iter: I) -> Self {
        let mut conditions = JoinConditions::new();
        for (left, right) in iter {
            conditions.insert(left, right);
        }
        conditions
    }
}

/// Trait for types that can be used as the `on` mapping of a join
pub trait IntoJoinConditions {
    fn into_join_conditions(self) -> JoinConditions;
}

impl IntoJoinConditions for JoinConditions {
    fn into_join_conditions(self) -> JoinConditions {
        self
    }
}

// Single pair shorthand: join(target, ("id", "user_id"))
impl IntoJoinConditions for (&str, &str) {
    fn into_join_conditions(self) -> JoinConditions {
        JoinConditions::new().on(self.0, self.1)
    }
}

impl IntoJoinConditions for Vec<(&str, &str)> {
    fn into_join_conditions(self) -> JoinConditions {
        self.into_iter().collect()
    }
}

impl IntoJoinConditions for Vec<(String, String)> {
    fn into_join_conditions(self) -> JoinConditions {
        self.into_iter().collect()
    }
}

impl IntoJoinConditions for &[(&str, &str)] {
    fn into_join_conditions(self) -> JoinConditions {
        self.iter().copied().collect()
    }
}

impl<const N: usize> IntoJoinConditions for [(&str, &str); N] {
    fn into_join_conditions(self) -> JoinConditions {
        self.into_iter().collect()
    }
}

/// A JOIN clause: target, its alias and the ON conditions
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub target: TableRef,
    pub alias: String,
    pub conditions: JoinConditions,
}

/// What a join points at
#[derive(Debug, Clone, PartialEq)]
pub enum JoinTarget {
    /// Another plan; its source and alias are copied by value
    Plan { source: TableRef, alias: String },
    /// A table reference; the alias is derived unless given
    Table(TableRef),
}

/// Trait for types that can be joined onto a plan
pub trait IntoJoinTarget {
    fn into_join_target(self) -> JoinTarget;
}

impl IntoJoinTarget for JoinTarget {
    fn into_join_target(self) -> JoinTarget {
        self
    }
}

impl IntoJoinTarget for Query {
    fn into_join_target(self) -> JoinTarget {
        JoinTarget::Plan {
            source: self.source,
            alias: self.alias,
        }
    }
}

impl IntoJoinTarget for &Query {
    fn into_join_target(self) -> JoinTarget {
        JoinTarget::Plan {
            source: self.source.clone(),
            alias: self.alias.clone(),
        }
    }
}

impl IntoJoinTarget for TableRef {
    fn into_join_target(self) -> JoinTarget {
        JoinTarget::Table(self)
    }
}

impl IntoJoinTarget for &str {
    fn into_join_target(self) -> JoinTarget {
        JoinTarget::Table(TableRef::from(self))
    }
}

impl IntoJoinTarget for String {
    fn into_join_target(self) -> JoinTarget {
        JoinTarget::Table(TableRef::from(self))
    }
}

impl IntoJoinTarget for ReaderHandle {
    fn into_join_target(self) -> JoinTarget {
        JoinTarget::Table(TableRef::from(self))
    }
}

impl IntoJoinTarget for RemoteTable {
    fn into_join_target(self) -> JoinTarget {
        JoinTarget::Table(TableRef::from(self))
    }
}

impl IntoJoinTarget for FileSource {
    fn into_join_target(self) -> JoinTarget {
        JoinTarget::Table(TableRef::from(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_fields_implementations() {
        assert_eq!("id, name ,".into_fields(), vec!["id", "name"]);
        assert_eq!(("id", " name").into_fields(), vec!["id", "name"]);
        assert_eq!(vec!["u.id", ""].into_fields(), vec!["u.id"]);
        assert_eq!(["a", "b", "c"].into_fields(), vec!["a", "b", "c"]);
        assert!("  ".into_fields().is_empty());
    }

    #[test]
    fn test_list_entries_are_not_split() {
        let fields = vec!["concat(a, b)".to_string()].into_fields();
        assert_eq!(fields, vec!["concat(a, b)"]);
    }

    #[test]
    fn test_join_conditions_keep_order_and_unique_keys() {
        let mut conditions = JoinConditions::new().on("id", "user_id").on("org", "org_id");
        conditions.insert("id", "owner_id");

        let pairs: Vec<_> = conditions.iter().collect();
        assert_eq!(pairs, vec![("id", "owner_id"), ("org", "org_id")]);
        assert_eq!(conditions.len(), 2);
    }

    #[test]
    fn test_into_join_conditions_implementations() {
        assert_eq!(("a", "b").into_join_conditions().len(), 1);
        assert_eq!([("a", "b"), ("c", "d")].into_join_conditions().len(), 2);
        assert!(Vec::<(&str, &str)>::new().into_join_conditions().is_empty());
    }

    #[test]
    fn test_join_target_from_text_is_parsed() {
        let target = "file('x/orders.csv', 'CSV')".into_join_target();
        assert_eq!(
            target,
            JoinTarget::Table(TableRef::file("x/orders.csv", "CSV"))
        );
    }
}
