//! Translation of declarative filter/sort/pagination requests into SQL.
//!
//! Queries are rendered as complete SQL strings with escaped literals, in the
//! dialect of the target engine. Filters combine with implicit AND in listed
//! order; pagination and projection only apply when both `limit` and `offset`
//! are present.

use crate::types::{DataRow, Filter, FilterCondition, SelectOptions};

/// Identifier-quoting dialect of a target engine
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Dialect {
    Postgres,
    MySql,
}

impl Dialect {
    pub fn quote_ident(&self, ident: &str) -> String {
        match self {
            Dialect::Postgres => format!("\"{}\"", ident.replace('"', "\"\"")),
            Dialect::MySql => format!("`{}`", ident.replace('`', "``")),
        }
    }
}

/// Renders a JSON value as a SQL literal. Strings are single-quoted with
/// `''` doubling; arrays and objects are serialized to their JSON text.
fn quote_literal(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::Bool(true) => "TRUE".to_string(),
        serde_json::Value::Bool(false) => "FALSE".to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => quote_text(s),
        other => quote_text(&other.to_string()),
    }
}

fn quote_text(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// The filter value as plain text, for LIKE-pattern assembly
fn value_as_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Compiles one filter into a `<column> <op> <literal>` fragment.
///
/// The operator and value-transform table is part of the caller contract and
/// must stay stable:
///
/// | condition      | operator | value        |
/// |----------------|----------|--------------|
/// | is             | =        | verbatim     |
/// | is_not         | !=       | verbatim     |
/// | contains       | LIKE     | `%value%`    |
/// | not_contains   | NOT LIKE | `%value%`    |
/// | starts_with    | LIKE     | `value%`     |
/// | ends_with      | LIKE     | `%value`     |
/// | is_empty       | LIKE     | `''`         |
/// | is_not_empty   | LIKE     | `''`         |
/// | > >= < <=      | same     | verbatim     |
///
/// `is_empty`/`is_not_empty` intentionally match the empty string rather than
/// testing NULL; callers depend on the historical behavior.
pub fn condition_fragment(dialect: Dialect, filter: &Filter) -> String {
    let column = dialect.quote_ident(&filter.column_name);

    match filter.condition {
        FilterCondition::Is => format!("{} = {}", column, quote_literal(&filter.value)),
        FilterCondition::IsNot => format!("{} != {}", column, quote_literal(&filter.value)),
        FilterCondition::Contains => format!(
            "{} LIKE {}",
            column,
            quote_text(&format!("%{}%", value_as_text(&filter.value)))
        ),
        FilterCondition::NotContains => format!(
            "{} NOT LIKE {}",
            column,
            quote_text(&format!("%{}%", value_as_text(&filter.value)))
        ),
        FilterCondition::StartsWith => format!(
            "{} LIKE {}",
            column,
            quote_text(&format!("{}%", value_as_text(&filter.value)))
        ),
        FilterCondition::EndsWith => format!(
            "{} LIKE {}",
            column,
            quote_text(&format!("%{}", value_as_text(&filter.value)))
        ),
        FilterCondition::IsEmpty => format!("{} LIKE ''", column),
        FilterCondition::IsNotEmpty => format!("{} LIKE ''", column),
        FilterCondition::GreaterThan => {
            format!("{} > {}", column, quote_literal(&filter.value))
        }
        FilterCondition::GreaterThanOrEqual => {
            format!("{} >= {}", column, quote_literal(&filter.value))
        }
        FilterCondition::LessThan => format!("{} < {}", column, quote_literal(&filter.value)),
        FilterCondition::LessThanOrEqual => {
            format!("{} <= {}", column, quote_literal(&filter.value))
        }
    }
}

/// Compiles a select request for `table`.
///
/// Projection (`select`) and `LIMIT`/`OFFSET` apply together and only when
/// both `limit` and `offset` are set; otherwise the statement is `SELECT *`
/// with no bounds.
pub fn build_select(dialect: Dialect, table: &str, opts: &SelectOptions) -> String {
    let paginated = opts.limit.is_some() && opts.offset.is_some();

    let projection = if paginated && !opts.select.is_empty() {
        opts.select
            .iter()
            .map(|c| dialect.quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        "*".to_string()
    };

    let mut sql = format!("SELECT {} FROM {}", projection, dialect.quote_ident(table));

    if !opts.filters.is_empty() {
        let clauses: Vec<String> = opts
            .filters
            .iter()
            .map(|f| condition_fragment(dialect, f))
            .collect();
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    if let Some(order_by) = &opts.order_by {
        sql.push_str(&format!(
            " ORDER BY {}.{} {}",
            dialect.quote_ident(table),
            dialect.quote_ident(order_by),
            opts.order_direction.as_sql()
        ));
    }

    if paginated {
        // Both bounds checked above
        sql.push_str(&format!(
            " LIMIT {} OFFSET {}",
            opts.limit.unwrap_or(0),
            opts.offset.unwrap_or(0)
        ));
    }

    sql
}

/// Unconditional row count for a table
pub fn build_count(dialect: Dialect, table: &str) -> String {
    format!(
        "SELECT COUNT(*) AS count FROM {}",
        dialect.quote_ident(table)
    )
}

/// Single-record lookup by primary key
pub fn build_select_by_pk(
    dialect: Dialect,
    table: &str,
    pk_column: &str,
    id: &serde_json::Value,
    select: &[String],
) -> String {
    let projection = if select.is_empty() {
        "*".to_string()
    } else {
        select
            .iter()
            .map(|c| dialect.quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "SELECT {} FROM {} WHERE {} = {} LIMIT 1",
        projection,
        dialect.quote_ident(table),
        dialect.quote_ident(pk_column),
        quote_literal(id)
    )
}

/// INSERT of one row. Columns render in sorted order so statements are
/// deterministic regardless of map iteration order.
pub fn build_insert(dialect: Dialect, table: &str, data: &DataRow) -> String {
    let mut names: Vec<&String> = data.keys().collect();
    names.sort();

    let columns: Vec<String> = names.iter().map(|n| dialect.quote_ident(n)).collect();
    let values: Vec<String> = names.iter().map(|n| quote_literal(&data[*n])).collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        dialect.quote_ident(table),
        columns.join(", "),
        values.join(", ")
    )
}

/// UPDATE of one row by primary key
pub fn build_update(
    dialect: Dialect,
    table: &str,
    pk_column: &str,
    id: &serde_json::Value,
    data: &DataRow,
) -> String {
    let mut names: Vec<&String> = data.keys().collect();
    names.sort();

    let assignments: Vec<String> = names
        .iter()
        .map(|n| format!("{} = {}", dialect.quote_ident(n), quote_literal(&data[*n])))
        .collect();

    format!(
        "UPDATE {} SET {} WHERE {} = {}",
        dialect.quote_ident(table),
        assignments.join(", "),
        dialect.quote_ident(pk_column),
        quote_literal(id)
    )
}

/// DELETE of one row by primary key
pub fn build_delete(
    dialect: Dialect,
    table: &str,
    pk_column: &str,
    id: &serde_json::Value,
) -> String {
    format!(
        "DELETE FROM {} WHERE {} = {}",
        dialect.quote_ident(table),
        dialect.quote_ident(pk_column),
        quote_literal(id)
    )
}

/// Single DELETE matching the primary key against a set of ids
pub fn build_delete_many(
    dialect: Dialect,
    table: &str,
    pk_column: &str,
    ids: &[serde_json::Value],
) -> String {
    let list: Vec<String> = ids.iter().map(quote_literal).collect();
    format!(
        "DELETE FROM {} WHERE {} IN ({})",
        dialect.quote_ident(table),
        dialect.quote_ident(pk_column),
        list.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filter(column: &str, condition: FilterCondition, value: serde_json::Value) -> Filter {
        Filter {
            column_name: column.to_string(),
            condition,
            value,
        }
    }

    #[test]
    fn test_condition_operator_table() {
        let cases = [
            (FilterCondition::Is, json!("x"), r#""c" = 'x'"#),
            (FilterCondition::IsNot, json!("x"), r#""c" != 'x'"#),
            (FilterCondition::Contains, json!("x"), r#""c" LIKE '%x%'"#),
            (
                FilterCondition::NotContains,
                json!("x"),
                r#""c" NOT LIKE '%x%'"#,
            ),
            (FilterCondition::StartsWith, json!("x"), r#""c" LIKE 'x%'"#),
            (FilterCondition::EndsWith, json!("x"), r#""c" LIKE '%x'"#),
            (FilterCondition::IsEmpty, json!(null), r#""c" LIKE ''"#),
            (FilterCondition::IsNotEmpty, json!(null), r#""c" LIKE ''"#),
            (FilterCondition::GreaterThan, json!(5), r#""c" > 5"#),
            (FilterCondition::GreaterThanOrEqual, json!(5), r#""c" >= 5"#),
            (FilterCondition::LessThan, json!(5), r#""c" < 5"#),
            (FilterCondition::LessThanOrEqual, json!(5), r#""c" <= 5"#),
        ];

        for (condition, value, expected) in cases {
            assert_eq!(
                condition_fragment(Dialect::Postgres, &filter("c", condition, value)),
                expected
            );
        }
    }

    #[test]
    fn test_contains_compiles_to_like_pattern() {
        let opts = SelectOptions {
            filters: vec![filter("name", FilterCondition::Contains, json!("an"))],
            ..Default::default()
        };
        let sql = build_select(Dialect::Postgres, "users", &opts);
        assert_eq!(sql, r#"SELECT * FROM "users" WHERE "name" LIKE '%an%'"#);
    }

    #[test]
    fn test_filters_and_in_listed_order() {
        let opts = SelectOptions {
            filters: vec![
                filter("age", FilterCondition::GreaterThanOrEqual, json!(18)),
                filter("email", FilterCondition::EndsWith, json!("@example.com")),
            ],
            ..Default::default()
        };
        let sql = build_select(Dialect::Postgres, "users", &opts);
        assert_eq!(
            sql,
            r#"SELECT * FROM "users" WHERE "age" >= 18 AND "email" LIKE '%@example.com'"#
        );
    }

    #[test]
    fn test_pagination_requires_both_bounds() {
        let mut opts = SelectOptions {
            limit: Some(10),
            select: vec!["id".into(), "email".into()],
            ..Default::default()
        };

        // Only limit: unpaginated and unprojected
        let sql = build_select(Dialect::Postgres, "users", &opts);
        assert_eq!(sql, r#"SELECT * FROM "users""#);

        // Only offset: same
        opts.limit = None;
        opts.offset = Some(20);
        let sql = build_select(Dialect::Postgres, "users", &opts);
        assert_eq!(sql, r#"SELECT * FROM "users""#);

        // Both: projection and bounds apply
        opts.limit = Some(10);
        let sql = build_select(Dialect::Postgres, "users", &opts);
        assert_eq!(
            sql,
            r#"SELECT "id", "email" FROM "users" LIMIT 10 OFFSET 20"#
        );
    }

    #[test]
    fn test_order_by_is_table_qualified() {
        let opts = SelectOptions {
            order_by: Some("created_at".into()),
            order_direction: crate::types::OrderDirection::Desc,
            ..Default::default()
        };
        let sql = build_select(Dialect::Postgres, "posts", &opts);
        assert_eq!(
            sql,
            r#"SELECT * FROM "posts" ORDER BY "posts"."created_at" DESC"#
        );
    }

    #[test]
    fn test_mysql_dialect_quoting() {
        let opts = SelectOptions {
            filters: vec![filter("name", FilterCondition::Is, json!("bob"))],
            ..Default::default()
        };
        let sql = build_select(Dialect::MySql, "users", &opts);
        assert_eq!(sql, "SELECT * FROM `users` WHERE `name` = 'bob'");
    }

    #[test]
    fn test_string_literals_escape_quotes() {
        let fragment = condition_fragment(
            Dialect::Postgres,
            &filter("name", FilterCondition::Is, json!("O'Brien")),
        );
        assert_eq!(fragment, r#""name" = 'O''Brien'"#);
    }

    #[test]
    fn test_insert_update_delete_rendering() {
        let mut data = DataRow::new();
        data.insert("email".into(), json!("a@b.c"));
        data.insert("age".into(), json!(30));

        assert_eq!(
            build_insert(Dialect::Postgres, "users", &data),
            r#"INSERT INTO "users" ("age", "email") VALUES (30, 'a@b.c')"#
        );
        assert_eq!(
            build_update(Dialect::Postgres, "users", "id", &json!(7), &data),
            r#"UPDATE "users" SET "age" = 30, "email" = 'a@b.c' WHERE "id" = 7"#
        );
        assert_eq!(
            build_delete(Dialect::Postgres, "users", "id", &json!(7)),
            r#"DELETE FROM "users" WHERE "id" = 7"#
        );
    }

    #[test]
    fn test_delete_many_uses_single_in_clause() {
        let ids = vec![json!(1), json!(2), json!(3)];
        assert_eq!(
            build_delete_many(Dialect::Postgres, "users", "id", &ids),
            r#"DELETE FROM "users" WHERE "id" IN (1, 2, 3)"#
        );
    }

    #[test]
    fn test_count_is_unconditional() {
        assert_eq!(
            build_count(Dialect::MySql, "users"),
            "SELECT COUNT(*) AS count FROM `users`"
        );
    }
}
