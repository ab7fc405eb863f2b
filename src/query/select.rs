//! SELECT statement composition.
//!
//! Collects the pieces produced by the filter, order, and include layers and
//! renders them section by section. The count variant reuses the same
//! predicate/join set with a `COUNT(DISTINCT pk)` projection so one-to-many
//! joins cannot inflate totals.

use crate::query::filter::quote_ident;

#[derive(Debug, Clone)]
pub struct SelectStatement {
    table: String,
    columns: Vec<String>,
    joins: Vec<String>,
    wheres: Vec<String>,
    order: Vec<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl SelectStatement {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: vec!["*".to_string()],
            joins: Vec::new(),
            wheres: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    pub fn push_column(&mut self, column: String) {
        self.columns.push(column);
    }

    pub fn push_join(&mut self, join: String) {
        self.joins.push(join);
    }

    pub fn push_where(&mut self, condition: String) {
        self.wheres.push(condition);
    }

    pub fn push_wheres(&mut self, conditions: Vec<String>) {
        self.wheres.extend(conditions);
    }

    pub fn order_by(mut self, terms: Vec<String>) -> Self {
        self.order = terms;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn build_sql(&self) -> String {
        let mut sql = String::new();
        sql.push_str("SELECT ");
        sql.push_str(&self.columns.join(", "));
        sql.push_str(&format!(" FROM {}", quote_ident(&self.table)));

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }

        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.wheres.join(" AND "));
        }

        if !self.order.is_empty() {
            sql.push_str(&format!(" ORDER BY {}", self.order.join(", ")));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        sql
    }

    /// Count query over the same joins and predicates. Ordering and
    /// pagination are dropped; `distinct_pk` switches to a distinct count of
    /// the primary key.
    pub fn build_count_sql(&self, distinct_pk: Option<&str>) -> String {
        let projection = match distinct_pk {
            Some(pk) => format!(
                "COUNT(DISTINCT {}.{})",
                quote_ident(&self.table),
                quote_ident(pk)
            ),
            None => "COUNT(*)".to_string(),
        };

        let mut sql = format!("SELECT {projection} FROM {}", quote_ident(&self.table));
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.wheres.join(" AND "));
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_sections_in_sql_order() {
        let mut stmt = SelectStatement::new("tasks")
            .columns(vec![r#""tasks"."id""#.to_string(), r#""tasks"."title""#.to_string()]);
        stmt.push_where(r#""tasks"."status" = 'TODO'"#.to_string());
        let sql = stmt
            .order_by(vec![r#""tasks"."id" DESC"#.to_string()])
            .limit(10)
            .offset(10)
            .build_sql();
        assert_eq!(
            sql,
            r#"SELECT "tasks"."id", "tasks"."title" FROM "tasks" WHERE "tasks"."status" = 'TODO' ORDER BY "tasks"."id" DESC LIMIT 10 OFFSET 10"#
        );
    }

    #[test]
    fn count_drops_order_and_pagination_but_keeps_joins() {
        let mut stmt = SelectStatement::new("tasks");
        stmt.push_join(r#"LEFT JOIN "users" AS "assignee" ON "assignee"."id" = "tasks"."assignee_id""#.to_string());
        stmt.push_where(r#""tasks"."deleted_at" IS NULL"#.to_string());
        let stmt = stmt.order_by(vec![r#""tasks"."id" DESC"#.to_string()]).limit(5);

        let count = stmt.build_count_sql(Some("id"));
        assert!(count.starts_with(r#"SELECT COUNT(DISTINCT "tasks"."id") FROM "tasks""#));
        assert!(count.contains("LEFT JOIN"));
        assert!(!count.contains("ORDER BY"));
        assert!(!count.contains("LIMIT"));
    }
}
