//! Query plan: the fluent SELECT builder

use std::fmt;

use tracing::debug;

use super::common::{
    IntoFields, IntoJoinConditions, IntoJoinTarget, JoinClause, JoinTarget, QueryBuilder,
};
use super::compile::compile;
use crate::alias::derive_alias;
use crate::executor::{OutputFormat, SqlExecutor};
use crate::oracle::{ColumnDescriptor, OracleRequest, SchemaHint, SqlOracle};
use crate::reader::{ReaderHandle, Schema};
use crate::table_ref::TableRef;
use crate::{Error, IntoOperator, Result, Value};

/// Temperature sent to the oracle when a cached (deterministic) answer is wanted
pub const CACHED_TEMPERATURE: f32 = 0.0;
/// Temperature sent to the oracle otherwise
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// The build state of one query
///
/// Builder methods take the plan by value and hand it back, so a plan can
/// only be mutated by its owner. Clone it to get an independent copy.
///
/// Values given to [`Query::filter`] are rendered inline with single quotes
/// and no escaping; this is a convenience builder, not an injection barrier.
///
/// # Examples
/// ```
/// use chainquery_core::{Query, QueryBuilder};
///
/// let query = Query::new("users")?
///     .select("id,name")
///     .filter("age", ">", 18)
///     .limit(5);
///
/// assert_eq!(
///     query.to_sql()?,
///     "SELECT table.id, table.name FROM users AS table WHERE table.age > 18 LIMIT 5"
/// );
/// # Ok::<(), chainquery_core::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub(crate) source: TableRef,
    pub(crate) alias: String,
    pub(crate) selected_fields: Vec<String>,
    pub(crate) predicates: Vec<String>,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) limit: Option<u64>,
    pub(crate) explain: bool,
    pub(crate) column_types: Option<Schema>,
    pub(crate) raw_override: Option<String>,
}

impl Query {
    /// Create a plan over `source`, deriving its alias
    pub fn new(source: impl Into<TableRef>) -> Result<Self> {
        let source = source.into();
        let alias = derive_alias(&source);
        Self::with_alias(source, alias)
    }

    /// Create a plan over `source` with an explicit alias
    ///
    /// An empty alias suppresses the `AS` clause and field qualification.
    pub fn with_alias(source: impl Into<TableRef>, alias: impl Into<String>) -> Result<Self> {
        let source = source.into();
        if source.is_empty() {
            return Err(Error::validation("query source must not be empty"));
        }
        Ok(Self {
            source,
            alias: alias.into(),
            selected_fields: Vec::new(),
            predicates: Vec::new(),
            joins: Vec::new(),
            limit: None,
            explain: false,
            column_types: None,
            raw_override: None,
        })
    }

    /// Create a plan that compiles to `sql` verbatim
    pub fn from_sql(sql: impl Into<String>) -> Self {
        Self {
            source: TableRef::Raw(String::new()),
            alias: String::new(),
            selected_fields: Vec::new(),
            predicates: Vec::new(),
            joins: Vec::new(),
            limit: None,
            explain: false,
            column_types: None,
            raw_override: Some(sql.into()),
        }
    }

    /// Replace the selected fields
    ///
    /// # Examples
    /// ```
    /// use chainquery_core::{Query, QueryBuilder};
    ///
    /// let query = Query::with_alias("users", "u")?.select(("id", "name"));
    /// assert_eq!(query.to_sql()?, "SELECT u.id, u.name FROM users AS u");
    /// # Ok::<(), chainquery_core::Error>(())
    /// ```
    pub fn select<F>(mut self, fields: F) -> Self
    where
        F: IntoFields,
    {
        self.selected_fields = fields.into_fields();
        self
    }

    /// Append a `field operator value` predicate; predicates are ANDed
    pub fn filter<O, V>(mut self, field: &str, operator: O, value: V) -> Self
    where
        O: IntoOperator,
        V: Into<Value>,
    {
        let field = field.trim();
        let qualified = if field.contains('.') || self.alias.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", self.alias, field)
        };
        let predicate = format!(
            "{} {} {}",
            qualified,
            operator.into_operator(),
            value.into().to_sql_literal()
        );
        self.predicates.push(predicate);
        self
    }

    /// Join another plan or table reference
    ///
    /// A plan target keeps its own alias; any other target gets a derived one.
    ///
    /// # Examples
    /// ```
    /// use chainquery_core::{Query, QueryBuilder};
    ///
    /// let orders = Query::with_alias("orders", "o")?;
    /// let query = Query::with_alias("users", "u")?.join(&orders, [("id", "user_id")])?;
    /// assert_eq!(
    ///     query.to_sql()?,
    ///     "SELECT u.*, o.* FROM users AS u JOIN orders AS o ON u.id=o.user_id"
    /// );
    /// # Ok::<(), chainquery_core::Error>(())
    /// ```
    pub fn join<T, C>(self, target: T, on: C) -> Result<Self>
    where
        T: IntoJoinTarget,
        C: IntoJoinConditions,
    {
        self.push_join(target.into_join_target(), on, None)
    }

    /// Join with an explicit alias, which wins over any other alias
    pub fn join_as<T, C>(self, target: T, on: C, alias: &str) -> Result<Self>
    where
        T: IntoJoinTarget,
        C: IntoJoinConditions,
    {
        self.push_join(target.into_join_target(), on, Some(alias.to_string()))
    }

    fn push_join<C>(mut self, target: JoinTarget, on: C, alias: Option<String>) -> Result<Self>
    where
        C: IntoJoinConditions,
    {
        let conditions = on.into_join_conditions();
        if conditions.is_empty() {
            return Err(Error::validation("join requires at least one condition"));
        }

        let (target, derived) = match target {
            JoinTarget::Plan { source, alias } => (source, alias),
            JoinTarget::Table(table) => {
                let derived = derive_alias(&table);
                (table, derived)
            }
        };
        if target.is_empty() {
            return Err(Error::validation("join target must not be empty"));
        }

        self.joins.push(JoinClause {
            target,
            alias: alias.unwrap_or(derived),
            conditions,
        });
        Ok(self)
    }

    /// Set the row limit
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Prefix the statement with EXPLAIN
    pub fn explain(mut self) -> Self {
        self.explain = true;
        self
    }

    /// Record known column types for the main table
    pub fn with_column_types(mut self, column_types: Schema) -> Self {
        self.column_types = Some(column_types);
        self
    }

    pub fn source(&self) -> &TableRef {
        &self.source
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn selected_fields(&self) -> &[String] {
        &self.selected_fields
    }

    pub fn predicates(&self) -> &[String] {
        &self.predicates
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn is_explain(&self) -> bool {
        self.explain
    }

    pub fn raw_override(&self) -> Option<&str> {
        self.raw_override.as_deref()
    }

    /// First attached reader among the source and the join targets
    pub fn reader_handle(&self) -> Option<&ReaderHandle> {
        if self.raw_override.is_some() {
            return None;
        }
        self.source
            .reader_handle()
            .or_else(|| self.joins.iter().find_map(|join| join.target.reader_handle()))
    }

    /// Distinct attached readers among the source and the join targets
    pub fn reader_handles(&self) -> Vec<&ReaderHandle> {
        if self.raw_override.is_some() {
            return Vec::new();
        }
        let mut handles: Vec<&ReaderHandle> = Vec::new();
        let targets = std::iter::once(&self.source).chain(self.joins.iter().map(|j| &j.target));
        for handle in targets.filter_map(TableRef::reader_handle) {
            if !handles.contains(&handle) {
                handles.push(handle);
            }
        }
        handles
    }

    /// Compile and run through `executor`, returning its rendered result
    ///
    /// Executors receive at most one reader, so a plan reading from two
    /// different readers is rejected before anything runs.
    pub async fn execute<E>(&self, executor: &E, format: impl Into<OutputFormat>) -> Result<String>
    where
        E: SqlExecutor,
    {
        let readers = self.reader_handles();
        if readers.len() > 1 {
            let names: Vec<&str> = readers.iter().map(|r| r.name()).collect();
            return Err(Error::validation(format!(
                "query reads from more than one reader ({}); only one can be attached",
                names.join(", ")
            )));
        }
        let sql = compile(self);
        let format = format.into();
        debug!(sql = %sql, format = %format, "executing query");
        executor.query(&sql, &format, self.reader_handle()).await
    }

    /// Best-known column schema per alias
    ///
    /// Later entries replace earlier ones with the same alias.
    pub fn schema(&self) -> Vec<SchemaHint> {
        let mut hints: Vec<SchemaHint> = Vec::new();
        let mut put = |alias: &str, columns: ColumnDescriptor| {
            match hints.iter_mut().find(|hint| hint.alias == alias) {
                Some(hint) => hint.columns = columns,
                None => hints.push(SchemaHint {
                    alias: alias.to_string(),
                    columns,
                }),
            }
        };

        if !self.alias.is_empty() {
            let columns = match (&self.column_types, self.source.reader_handle()) {
                (Some(types), _) => ColumnDescriptor::Typed(types.clone()),
                (None, Some(handle)) => match handle.schema() {
                    Ok(schema) => ColumnDescriptor::Typed(schema),
                    Err(_) => ColumnDescriptor::Names(vec!["*".to_string()]),
                },
                (None, None) if self.selected_fields.is_empty() => {
                    ColumnDescriptor::Names(vec!["*".to_string()])
                }
                (None, None) => ColumnDescriptor::Names(self.selected_fields.clone()),
            };
            put(&self.alias, columns);
        }

        for join in &self.joins {
            if join.alias.is_empty() {
                continue;
            }
            let columns = match join.target.reader_handle().map(ReaderHandle::schema) {
                Some(Ok(schema)) if !schema.is_empty() => ColumnDescriptor::Typed(schema),
                _ => ColumnDescriptor::Names(vec!["*".to_string()]),
            };
            put(&join.alias, columns);
        }

        hints
    }

    /// Ask `oracle` to answer `question` starting from this query
    ///
    /// The answer becomes a new plan that compiles to the returned SQL
    /// verbatim. `cache` asks the oracle for a deterministic answer.
    pub async fn ask<O>(&self, oracle: &O, question: &str, cache: bool) -> Result<Query>
    where
        O: SqlOracle,
    {
        let request = OracleRequest {
            question: question.to_string(),
            schema: self.schema(),
            existing_sql: compile(self),
            temperature: if cache {
                CACHED_TEMPERATURE
            } else {
                DEFAULT_TEMPERATURE
            },
        };
        debug!(question, cache, "asking oracle");
        let sql = oracle.generate(&request).await?;
        Ok(Query::from_sql(sql))
    }
}

impl QueryBuilder for Query {
    fn to_sql(&self) -> Result<String> {
        Ok(compile(self))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&compile(self))
    }
}
