use chainquery_core::{op, FileSource, InsertBuilder, Query, QueryBuilder, RemoteTable, Value};

fn main() -> chainquery_core::Result<()> {
    // Alias derived from the file name
    let events = Query::new(FileSource::new("data/events.parquet", "Parquet"))?
        .select("id, kind, user_id")
        .filter("kind", op::EQ, "click")
        .filter("ts", op::GTE, "2024-01-01")
        .limit(100);
    println!("SELECT SQL: {}", events.to_sql()?);

    // Remote table aliased as <database>_<table>
    let crm_users = RemoteTable {
        host: "db.internal".to_string(),
        port: 5432,
        database: "crm".to_string(),
        table: "users".to_string(),
        user: "reader".to_string(),
        password: "secret".to_string(),
        schema: None,
    };
    let users = Query::new(crm_users)?.select(("id", "name"));
    let joined = events
        .clone()
        .select(("events.id", "crm_users.name"))
        .join(&users, [("user_id", "id")])?;
    println!("JOIN SQL: {}", joined.to_sql()?);

    // Explicit alias on the joined side
    let aliased = Query::with_alias("sessions", "s")?.join_as(
        "file('geo.csv', 'CSVWithNames')",
        ("s.ip", "g.ip"),
        "g",
    )?;
    println!("ALIASED SQL: {}", aliased.explain().to_sql()?);

    let insert = InsertBuilder::new("audit").values(vec![
        ("user_id", Value::from(7)),
        ("action", Value::from("login")),
    ]);
    println!("INSERT SQL: {}", insert.to_sql()?);

    Ok(())
}
