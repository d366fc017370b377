//! Plan to SQL text

use super::common::JoinClause;
use super::select::Query;

/// Compile a plan into one SQL statement
///
/// Pure: the same plan always compiles to the same bytes. A raw override is
/// returned unchanged. Join conditions are not cross-checked against the
/// aliases in the plan; unknown aliases are emitted as written.
pub fn compile(query: &Query) -> String {
    if let Some(raw) = &query.raw_override {
        return raw.clone();
    }

    let mut clauses: Vec<String> = Vec::new();

    if query.explain {
        clauses.push("EXPLAIN".to_string());
    }

    clauses.push(format!("SELECT {}", select_list(query)));
    clauses.push(format!(
        "FROM {}",
        with_alias(&query.source.to_sql(), &query.alias)
    ));

    for join in &query.joins {
        clauses.push(join_clause(join, &query.alias));
    }

    if !query.predicates.is_empty() {
        clauses.push(format!("WHERE {}", query.predicates.join(" AND ")));
    }

    if let Some(limit) = query.limit {
        clauses.push(format!("LIMIT {}", limit));
    }

    clauses.join(" ")
}

fn select_list(query: &Query) -> String {
    let mut fields: Vec<String> = if query.selected_fields.is_empty() {
        vec![star(&query.alias)]
    } else {
        query
            .selected_fields
            .iter()
            .map(|field| qualify(field, &query.alias))
            .collect()
    };

    fields.extend(query.joins.iter().map(|join| star(&join.alias)));
    fields.join(", ")
}

fn join_clause(join: &JoinClause, plan_alias: &str) -> String {
    let conditions: Vec<String> = join
        .conditions
        .iter()
        .map(|(left, right)| {
            format!(
                "{}={}",
                qualify_key(left, plan_alias),
                qualify_key(right, &join.alias)
            )
        })
        .collect();

    format!(
        "JOIN {} ON {}",
        with_alias(&join.target.to_sql(), &join.alias),
        conditions.join(" AND ")
    )
}

fn with_alias(sql: &str, alias: &str) -> String {
    if alias.is_empty() {
        sql.to_string()
    } else {
        format!("{} AS {}", sql, alias)
    }
}

fn star(alias: &str) -> String {
    if alias.is_empty() {
        "*".to_string()
    } else {
        format!("{}.*", alias)
    }
}

/// Select-list qualification: only fields without a `.` get the alias
fn qualify(field: &str, alias: &str) -> String {
    if field.contains('.') || alias.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", alias, field)
    }
}

/// Join keys split on the last `.`; an unqualified key takes `implicit`
fn qualify_key(key: &str, implicit: &str) -> String {
    let (table, field) = match key.rsplit_once('.') {
        Some((table, field)) => (table, field),
        None => (implicit, key),
    };
    if table.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", table, field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::common::JoinConditions;
    use crate::reader::{MemoryReader, ReaderHandle};
    use crate::table_ref::TableRef;

    fn users() -> Query {
        Query::with_alias("users", "u").unwrap()
    }

    #[test]
    fn test_select_all_without_joins() {
        assert_eq!(compile(&users()), "SELECT u.* FROM users AS u");
    }

    #[test]
    fn test_field_qualification() {
        let query = users().select("id, name");
        assert_eq!(compile(&query), "SELECT u.id, u.name FROM users AS u");
    }

    #[test]
    fn test_qualified_fields_are_kept() {
        let query = users().select("o.total, id");
        assert_eq!(compile(&query), "SELECT o.total, u.id FROM users AS u");
    }

    #[test]
    fn test_empty_selection_with_join() {
        let query = users().join_as("orders", [("id", "user_id")], "o").unwrap();
        assert_eq!(
            compile(&query),
            "SELECT u.*, o.* FROM users AS u JOIN orders AS o ON u.id=o.user_id"
        );
    }

    #[test]
    fn test_explicit_fields_followed_by_join_stars() {
        let query = users()
            .select("name")
            .join_as("orders", [("id", "user_id")], "o")
            .unwrap();
        assert_eq!(
            compile(&query),
            "SELECT u.name, o.* FROM users AS u JOIN orders AS o ON u.id=o.user_id"
        );
    }

    #[test]
    fn test_qualified_left_key() {
        let query = users()
            .join_as("orders", [("users.id", "order_id")], "o")
            .unwrap();
        assert!(compile(&query).ends_with("ON users.id=o.order_id"));
    }

    #[test]
    fn test_keys_split_on_last_dot() {
        let query = users()
            .join_as("orders", [("shop.users.id", "o2.user_id")], "o")
            .unwrap();
        assert!(compile(&query).ends_with("ON shop.users.id=o2.user_id"));
    }

    #[test]
    fn test_multiple_conditions_and_joins() {
        let conditions = JoinConditions::new()
            .on("id", "user_id")
            .on("org_id", "org_id");
        let query = users()
            .join_as("orders", conditions, "o")
            .unwrap()
            .join_as("file('data/comments.csv', 'CSV')", [("id", "author_id")], "c")
            .unwrap()
            .filter("age", ">", 18)
            .limit(10);
        assert_eq!(
            compile(&query),
            "SELECT u.*, o.*, c.* FROM users AS u \
             JOIN orders AS o ON u.id=o.user_id AND u.org_id=o.org_id \
             JOIN file('data/comments.csv', 'CSV') AS c ON u.id=c.author_id \
             WHERE u.age > 18 LIMIT 10"
        );
    }

    #[test]
    fn test_unknown_join_alias_passes_through() {
        let query = users()
            .join_as("orders", [("nowhere.id", "user_id")], "o")
            .unwrap();
        assert!(compile(&query).ends_with("ON nowhere.id=o.user_id"));
    }

    #[test]
    fn test_empty_aliases_render_bare() {
        let query = Query::with_alias("users", "")
            .unwrap()
            .select("id")
            .join_as("orders", [("id", "user_id")], "")
            .unwrap();
        assert_eq!(
            compile(&query),
            "SELECT id, * FROM users JOIN orders ON id=user_id"
        );
    }

    #[test]
    fn test_reader_source_renders_table_function() {
        let handle = ReaderHandle::new(MemoryReader::from_records("events", Vec::new()));
        let query = Query::new(TableRef::reader(handle)).unwrap().select("kind");
        assert_eq!(
            compile(&query),
            "SELECT events.kind FROM Python(reader) AS events"
        );
    }

    #[test]
    fn test_explain_prefix() {
        let query = users().select("id").explain();
        assert_eq!(compile(&query), "EXPLAIN SELECT u.id FROM users AS u");
    }

    #[test]
    fn test_compile_is_idempotent() {
        let query = users()
            .select("id")
            .join_as("orders", [("id", "user_id")], "o")
            .unwrap()
            .filter("status", "=", "paid");
        assert_eq!(compile(&query), compile(&query));
    }
}
