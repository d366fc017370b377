//! Table models with vector indexes

use std::fmt;

use crate::builder::IntoFields;
use crate::{Error, Result, Value};

pub const DEFAULT_ENGINE: &str = "MergeTree";

/// Engine column types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Int64,
    Float64,
    Bool,
    DateTime,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "String",
            ColumnType::Int64 => "Int64",
            ColumnType::Float64 => "Float64",
            ColumnType::Bool => "Bool",
            ColumnType::DateTime => "DateTime",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One column of a table model
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: ColumnType,
    pub primary_key: bool,
    pub auto_uuid: bool,
    pub default_now: bool,
    pub default: Option<Value>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            primary_key: false,
            auto_uuid: false,
            default_now: false,
            default: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Filled with `generateUUIDv4()` when omitted
    pub fn auto_uuid(mut self) -> Self {
        self.auto_uuid = true;
        self
    }

    /// Filled with `now()` when omitted
    pub fn default_now(mut self) -> Self {
        self.default_now = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Default expression; a generated UUID beats `now()` beats a literal
    pub fn default_expr(&self) -> Option<String> {
        if self.auto_uuid {
            Some("generateUUIDv4()".to_string())
        } else if self.default_now {
            Some("now()".to_string())
        } else {
            self.default.as_ref().map(Value::to_sql_literal)
        }
    }

    pub fn to_sql(&self) -> String {
        match self.default_expr() {
            Some(expr) => format!("{} {} DEFAULT {}", self.name, self.ty, expr),
            None => format!("{} {}", self.name, self.ty),
        }
    }
}

/// Distance function used to rank search results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DistanceFunction {
    #[default]
    Cosine,
    L2,
}

impl DistanceFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceFunction::Cosine => "cosineDistance",
            DistanceFunction::L2 => "L2Distance",
        }
    }
}

/// An embedding of one text column, stored as `<source_field>_embedding`
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    pub name: String,
    pub source_field: String,
    pub model: String,
    pub dim: usize,
    pub distance: DistanceFunction,
}

impl VectorIndex {
    pub fn new(
        name: impl Into<String>,
        source_field: impl Into<String>,
        model: impl Into<String>,
        dim: usize,
    ) -> Self {
        Self {
            name: name.into(),
            source_field: source_field.into(),
            model: model.into(),
            dim,
            distance: DistanceFunction::default(),
        }
    }

    pub fn with_distance(mut self, distance: DistanceFunction) -> Self {
        self.distance = distance;
        self
    }

    pub fn embedding_column(&self) -> String {
        format!("{}_embedding", self.source_field)
    }
}

/// Declarative table description
#[derive(Debug, Clone, PartialEq)]
pub struct TableModel {
    pub name: String,
    pub fields: Vec<FieldDef>,
    pub engine: String,
    pub order_by: Vec<String>,
    pub indexes: Vec<VectorIndex>,
}

impl TableModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            engine: DEFAULT_ENGINE.to_string(),
            order_by: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    pub fn order_by<F: IntoFields>(mut self, columns: F) -> Self {
        self.order_by = columns.into_fields();
        self
    }

    pub fn index(mut self, index: VectorIndex) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn find_index(&self, name: &str) -> Option<&VectorIndex> {
        self.indexes.iter().find(|index| index.name == name)
    }

    fn primary_keys(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.primary_key)
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Sorting key; falls back to the primary key, then to `tuple()`
    fn sorting_key(&self) -> String {
        let keys: Vec<&str> = if self.order_by.is_empty() {
            self.primary_keys()
        } else {
            self.order_by.iter().map(String::as_str).collect()
        };
        match keys.as_slice() {
            [] => "tuple()".to_string(),
            [single] => single.to_string(),
            many => format!("({})", many.join(", ")),
        }
    }

    pub fn create_table_sql(&self) -> Result<String> {
        if self.fields.is_empty() {
            return Err(Error::validation(format!(
                "table '{}' has no fields",
                self.name
            )));
        }

        let mut columns: Vec<String> = self.fields.iter().map(FieldDef::to_sql).collect();
        let primary = self.primary_keys();
        if !primary.is_empty() {
            columns.push(format!("PRIMARY KEY ({})", primary.join(", ")));
        }

        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} ({}) ENGINE = {} ORDER BY {}",
            self.name,
            columns.join(", "),
            self.engine,
            self.sorting_key()
        ))
    }

    pub fn add_embedding_column_sql(&self, index: &VectorIndex) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} Array(Float32)",
            self.name,
            index.embedding_column()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comments() -> TableModel {
        TableModel::new("comments")
            .field(FieldDef::new("id", ColumnType::String).primary_key().auto_uuid())
            .field(FieldDef::new("user_id", ColumnType::Int64))
            .field(FieldDef::new("text", ColumnType::String))
            .field(FieldDef::new("created_at", ColumnType::DateTime).default_now())
            .order_by("id")
            .index(VectorIndex::new("text_idx", "text", "mock", 4))
    }

    #[test]
    fn test_create_table_sql() {
        assert_eq!(
            comments().create_table_sql().unwrap(),
            "CREATE TABLE IF NOT EXISTS comments (id String DEFAULT generateUUIDv4(), \
             user_id Int64, text String, created_at DateTime DEFAULT now(), \
             PRIMARY KEY (id)) ENGINE = MergeTree ORDER BY id"
        );
    }

    #[test]
    fn test_default_precedence() {
        let field = FieldDef::new("x", ColumnType::String)
            .default_value("n/a")
            .default_now()
            .auto_uuid();
        assert_eq!(field.default_expr().as_deref(), Some("generateUUIDv4()"));

        let field = FieldDef::new("score", ColumnType::Float64).default_value(0.5);
        assert_eq!(field.to_sql(), "score Float64 DEFAULT 0.5");
    }

    #[test]
    fn test_sorting_key_fallbacks() {
        let model = TableModel::new("t")
            .field(FieldDef::new("a", ColumnType::Int64).primary_key())
            .field(FieldDef::new("b", ColumnType::Int64).primary_key());
        assert!(model.create_table_sql().unwrap().ends_with("ORDER BY (a, b)"));

        let model = TableModel::new("t").field(FieldDef::new("a", ColumnType::Int64));
        assert!(model.create_table_sql().unwrap().ends_with("ORDER BY tuple()"));
    }

    #[test]
    fn test_empty_model_is_rejected() {
        assert!(matches!(
            TableModel::new("t").create_table_sql(),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn test_embedding_column() {
        let model = comments();
        let index = model.find_index("text_idx").unwrap();
        assert_eq!(index.embedding_column(), "text_embedding");
        assert_eq!(
            model.add_embedding_column_sql(index),
            "ALTER TABLE comments ADD COLUMN IF NOT EXISTS text_embedding Array(Float32)"
        );
        assert!(model.find_index("missing").is_none());
    }

    #[test]
    fn test_distance_functions() {
        assert_eq!(DistanceFunction::default().as_str(), "cosineDistance");
        assert_eq!(DistanceFunction::L2.as_str(), "L2Distance");
    }
}
