//! # Data-Access Layer
//!
//! Generic accessor over one entity/table at a time. [`Dao`] translates
//! typed filter/order/include/pagination descriptors into composed SQL and
//! executes it against the shared connection pool. Per-entity accessors
//! ([`task::TaskDao`], [`user::UserDao`]) compose this type with their own
//! extension queries rather than subclassing it.
//!
//! Absence of a row is a normal result (`None`), never an error; every
//! underlying engine failure is normalized into the single data-access error
//! kind.

pub mod task;
pub mod user;

use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::{Column, FromRow, PgPool, Row, TypeInfo};
use std::marker::PhantomData;
use std::ops::Deref;

use crate::error::{Error, Result};
use crate::query::filter::{format_value, quote_ident, Filter};
use crate::query::include::Include;
use crate::query::order::OrderSpec;
use crate::query::page::{offset, PageInfo};
use crate::query::select::SelectStatement;

pub use task::TaskDao;
pub use user::UserDao;

/// Static metadata for one persisted entity. The relation registry is a
/// static, acyclic graph assembled at compile time; there is no runtime
/// entity discovery.
pub trait Entity:
    for<'r> FromRow<'r, PgRow> + Serialize + Unpin + Send + Sync + 'static
{
    const TABLE: &'static str;
    const PRIMARY_KEY: &'static str;
    /// Paranoid entities stamp `deleted_at` instead of removing rows, and
    /// default queries exclude stamped rows.
    const SOFT_DELETE: bool;

    fn default_columns() -> &'static [&'static str];

    /// Named projection presets applied before per-call options.
    fn scope_columns(name: &str) -> Option<&'static [&'static str]>;

    fn relations() -> &'static [Relation];
}

/// One edge in an entity's relation registry (belongs-to semantics: the
/// foreign key lives on the owning side).
#[derive(Debug, Clone, Copy)]
pub struct Relation {
    pub name: &'static str,
    pub table: &'static str,
    pub foreign_key: &'static str,
    pub referenced_key: &'static str,
    pub default_columns: &'static [&'static str],
    pub paranoid: bool,
    pub nested: &'static [Relation],
}

/// Column/value pairs for create and update statements. Insertion-ordered;
/// a repeated column replaces its value in place.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    entries: Vec<(String, Value)>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((column, value)),
        }
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }
}

/// Options for single-row fetches.
#[derive(Debug, Clone, Default)]
pub struct FetchOpts {
    pub scope: Option<&'static str>,
    pub attributes: Option<Vec<String>>,
    pub include: Vec<Include>,
    pub order: OrderSpec,
}

/// Options for listings; pagination applies iff `limit` resolves.
#[derive(Debug, Clone, Default)]
pub struct ListOpts {
    pub scope: Option<&'static str>,
    pub attributes: Option<Vec<String>>,
    pub include: Vec<Include>,
    pub order: OrderSpec,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

/// One fetched row: the typed entity plus nested related objects keyed by
/// relation name. Serializes flat, with each relation as a nested object
/// (or null when an outer join found nothing).
#[derive(Debug, Clone, Serialize)]
pub struct Hydrated<E> {
    #[serde(flatten)]
    pub record: E,
    #[serde(flatten)]
    pub related: Map<String, Value>,
}

impl<E> Deref for Hydrated<E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.record
    }
}

/// Listing result: rows plus pagination metadata when requested.
#[derive(Debug, Serialize)]
pub struct Listing<E> {
    pub data: Vec<Hydrated<E>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PageInfo>,
}

/// Generic accessor for one entity. Holds a handle to the shared pool;
/// connections are owned by the pool, never by accessors.
#[derive(Debug, Clone)]
pub struct Dao<E: Entity> {
    pool: PgPool,
    _entity: PhantomData<E>,
}

impl<E: Entity> Dao<E> {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, _entity: PhantomData }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Fetch the first matching row, or `None`.
    pub async fn fetch_one(
        &self,
        filter: &Filter,
        opts: &FetchOpts,
    ) -> Result<Option<Hydrated<E>>> {
        let (stmt, alias_paths) = Self::select_statement(
            filter,
            opts.scope,
            opts.attributes.as_deref(),
            &opts.include,
            &opts.order,
        )?;
        let sql = stmt.limit(1).build_sql();
        tracing::debug!(table = E::TABLE, sql = %sql, "fetch_one");

        let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;
        row.map(|row| hydrate_row(&row, &alias_paths)).transpose()
    }

    /// Fetch all matching rows. The pagination block is present iff a limit
    /// was supplied; its row count comes from a distinct count over the same
    /// predicate/join set.
    pub async fn fetch_all(&self, filter: &Filter, opts: &ListOpts) -> Result<Listing<E>> {
        let (mut stmt, alias_paths) = Self::select_statement(
            filter,
            opts.scope,
            opts.attributes.as_deref(),
            &opts.include,
            &opts.order,
        )?;
        if opts.order.is_empty() {
            stmt = stmt.order_by(vec![format!(
                "{}.{} DESC",
                quote_ident(E::TABLE),
                quote_ident(E::PRIMARY_KEY)
            )]);
        }

        let page = opts.page.unwrap_or(1);
        if let Some(limit) = opts.limit {
            stmt = stmt.limit(limit).offset(offset(page, limit));
        }

        let sql = stmt.build_sql();
        tracing::debug!(table = E::TABLE, sql = %sql, "fetch_all");

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let data = rows
            .iter()
            .map(|row| hydrate_row(&row, &alias_paths))
            .collect::<Result<Vec<_>>>()?;

        let pagination = match opts.limit {
            Some(limit) => {
                let count_sql = stmt.build_count_sql(Some(E::PRIMARY_KEY));
                let rows: i64 = sqlx::query_scalar(&count_sql).fetch_one(&self.pool).await?;
                Some(PageInfo::compute(limit, page, rows))
            }
            None => None,
        };

        Ok(Listing { data, pagination })
    }

    pub async fn count(&self, filter: &Filter) -> Result<i64> {
        let stmt = Self::bare_statement(filter);
        let sql = stmt.build_count_sql(None);
        tracing::debug!(table = E::TABLE, sql = %sql, "count");
        Ok(sqlx::query_scalar(&sql).fetch_one(&self.pool).await?)
    }

    pub async fn exist(&self, filter: &Filter) -> Result<bool> {
        let mut stmt = Self::bare_statement(filter);
        stmt = stmt
            .columns(vec![format!(
                "{}.{}",
                quote_ident(E::TABLE),
                quote_ident(E::PRIMARY_KEY)
            )])
            .limit(1);
        let sql = stmt.build_sql();
        let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;
        Ok(row.is_some())
    }

    /// True iff every id matches a row that also satisfies `filter`. The
    /// check compares the matching count to `ids.len()`, so duplicate ids
    /// undercount against distinct rows; this quirk is part of the contract.
    pub async fn ids_exist(&self, ids: &[i64], filter: &Filter) -> Result<bool> {
        let mut filter = filter.clone();
        filter.set(
            E::PRIMARY_KEY,
            Value::Array(ids.iter().map(|id| Value::from(*id)).collect()),
        );
        let count = self.count(&filter).await?;
        Ok(ids_match(ids, count))
    }

    /// Insert one row and return it.
    pub async fn create(&self, changes: &ChangeSet) -> Result<E> {
        let mut columns: Vec<String> = Vec::new();
        let mut values: Vec<String> = Vec::new();
        for (column, value) in changes.iter() {
            columns.push(quote_ident(column));
            values.push(format_value(value));
        }
        columns.push(quote_ident("created_at"));
        values.push("NOW()".to_string());
        columns.push(quote_ident("updated_at"));
        values.push("NOW()".to_string());

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            quote_ident(E::TABLE),
            columns.join(", "),
            values.join(", "),
            returning_columns::<E>(),
        );
        tracing::debug!(table = E::TABLE, sql = %sql, "create");
        Ok(sqlx::query_as::<_, E>(&sql).fetch_one(&self.pool).await?)
    }

    /// Update matching rows and return the first updated one. When the
    /// engine returns no row, falls back to a re-fetch by the same filter.
    pub async fn update(&self, changes: &ChangeSet, filter: &Filter) -> Result<Option<E>> {
        let mut assignments: Vec<String> = changes
            .iter()
            .map(|(column, value)| format!("{} = {}", quote_ident(column), format_value(value)))
            .collect();
        assignments.push(format!("{} = NOW()", quote_ident("updated_at")));

        let mut conditions = filter.conditions(E::TABLE);
        if E::SOFT_DELETE {
            conditions.push(soft_delete_guard::<E>());
        }

        let mut sql = format!(
            "UPDATE {} SET {}",
            quote_ident(E::TABLE),
            assignments.join(", ")
        );
        if !conditions.is_empty() {
            sql.push_str(&format!(" WHERE {}", conditions.join(" AND ")));
        }
        sql.push_str(&format!(" RETURNING {}", returning_columns::<E>()));
        tracing::debug!(table = E::TABLE, sql = %sql, "update");

        let updated = sqlx::query_as::<_, E>(&sql).fetch_optional(&self.pool).await?;
        match updated {
            Some(entity) => Ok(Some(entity)),
            None => {
                let refetched = self.fetch_one(filter, &FetchOpts::default()).await?;
                Ok(refetched.map(|hydrated| hydrated.record))
            }
        }
    }

    /// Delete matching rows, returning the affected row count. Paranoid
    /// entities are stamped, not removed.
    pub async fn delete(&self, filter: &Filter) -> Result<u64> {
        let mut conditions = filter.conditions(E::TABLE);
        let sql = if E::SOFT_DELETE {
            conditions.push(soft_delete_guard::<E>());
            format!(
                "UPDATE {} SET {} = NOW() WHERE {}",
                quote_ident(E::TABLE),
                quote_ident("deleted_at"),
                conditions.join(" AND ")
            )
        } else if conditions.is_empty() {
            format!("DELETE FROM {}", quote_ident(E::TABLE))
        } else {
            format!(
                "DELETE FROM {} WHERE {}",
                quote_ident(E::TABLE),
                conditions.join(" AND ")
            )
        };
        tracing::debug!(table = E::TABLE, sql = %sql, "delete");

        let done = sqlx::query(&sql).execute(&self.pool).await?;
        Ok(done.rows_affected())
    }

    /// Compose the SELECT for a fetch: projection, soft-delete guard,
    /// predicate translation, eager loads, ordering.
    fn select_statement(
        filter: &Filter,
        scope: Option<&'static str>,
        attributes: Option<&[String]>,
        include: &[Include],
        order: &OrderSpec,
    ) -> Result<(SelectStatement, Vec<String>)> {
        let columns = Self::projection(scope, attributes)?;
        let mut stmt = SelectStatement::new(E::TABLE).columns(columns);

        if E::SOFT_DELETE {
            stmt.push_where(soft_delete_guard::<E>());
        }
        stmt.push_wheres(filter.conditions(E::TABLE));

        let mut alias_paths = Vec::new();
        compose_includes(include, None, E::TABLE, E::relations(), &mut stmt, &mut alias_paths)?;

        if !order.is_empty() {
            stmt = stmt.order_by(order.to_sql(E::TABLE));
        }

        Ok((stmt, alias_paths))
    }

    fn bare_statement(filter: &Filter) -> SelectStatement {
        let mut stmt = SelectStatement::new(E::TABLE);
        if E::SOFT_DELETE {
            stmt.push_where(soft_delete_guard::<E>());
        }
        stmt.push_wheres(filter.conditions(E::TABLE));
        stmt
    }

    /// Column projection precedence: explicit attributes, then scope preset,
    /// then the entity default. An unknown scope is an engine-level failure.
    fn projection(
        scope: Option<&'static str>,
        attributes: Option<&[String]>,
    ) -> Result<Vec<String>> {
        let qualified = |column: &str| {
            format!("{}.{}", quote_ident(E::TABLE), quote_ident(column))
        };
        if let Some(attributes) = attributes {
            return Ok(attributes.iter().map(|c| qualified(c)).collect());
        }
        if let Some(name) = scope {
            let columns = E::scope_columns(name).ok_or_else(|| {
                Error::data_access(format!("unknown scope \"{name}\" on {}", E::TABLE))
            })?;
            return Ok(columns.iter().map(|c| qualified(c)).collect());
        }
        Ok(E::default_columns().iter().map(|c| qualified(c)).collect())
    }
}

fn soft_delete_guard<E: Entity>() -> String {
    format!(
        "{}.{} IS NULL",
        quote_ident(E::TABLE),
        quote_ident("deleted_at")
    )
}

fn returning_columns<E: Entity>() -> String {
    E::default_columns()
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn ids_match(ids: &[i64], count: i64) -> bool {
    ids.len() as i64 == count
}

/// Recursively translate an include tree into joins and aliased projections.
/// Nested aliases are dot-joined (`assignee`, `assignee.manager`), matching
/// the path form the where-builder resolves joined fields against.
fn compose_includes(
    includes: &[Include],
    parent_alias: Option<&str>,
    parent_table: &str,
    relations: &'static [Relation],
    stmt: &mut SelectStatement,
    alias_paths: &mut Vec<String>,
) -> Result<()> {
    for node in includes {
        let relation = relations
            .iter()
            .find(|r| r.name == node.relation)
            .ok_or_else(|| {
                Error::data_access(format!(
                    "unknown relation \"{}\" on {parent_table}",
                    node.relation
                ))
            })?;

        let alias = match parent_alias {
            Some(parent) => format!("{parent}.{}", relation.name),
            None => relation.name.to_string(),
        };
        let parent_ref = match parent_alias {
            Some(parent) => quote_ident(parent),
            None => quote_ident(parent_table),
        };

        let mut on = format!(
            "{}.{} = {}.{}",
            quote_ident(&alias),
            quote_ident(relation.referenced_key),
            parent_ref,
            quote_ident(relation.foreign_key)
        );
        if relation.paranoid {
            on.push_str(&format!(
                " AND {}.{} IS NULL",
                quote_ident(&alias),
                quote_ident("deleted_at")
            ));
        }
        if let Some(filter) = &node.filter {
            for condition in filter.conditions(&alias) {
                on.push_str(" AND ");
                on.push_str(&condition);
            }
        }

        let join_kind = if node.required == Some(true) { "INNER JOIN" } else { "LEFT JOIN" };
        stmt.push_join(format!(
            "{join_kind} {} AS {} ON {on}",
            quote_ident(relation.table),
            quote_ident(&alias)
        ));

        match &node.attributes {
            Some(attributes) => {
                for column in attributes {
                    stmt.push_column(aliased_column(&alias, column));
                }
            }
            None => {
                for column in relation.default_columns {
                    stmt.push_column(aliased_column(&alias, column));
                }
            }
        }

        alias_paths.push(alias.clone());
        compose_includes(
            &node.include,
            Some(&alias),
            relation.table,
            relation.nested,
            stmt,
            alias_paths,
        )?;
    }
    Ok(())
}

fn aliased_column(alias: &str, column: &str) -> String {
    format!(
        "{}.{} AS {}",
        quote_ident(alias),
        quote_ident(column),
        quote_ident(&format!("{alias}.{column}"))
    )
}

/// Decode one row into the typed entity plus nested related objects built
/// from dot-aliased columns. A relation whose columns all came back NULL
/// (outer join, no match) folds to null.
fn hydrate_row<E: Entity>(row: &PgRow, alias_paths: &[String]) -> Result<Hydrated<E>> {
    let record = E::from_row(row).map_err(Error::from)?;
    let related = nest_related(row, alias_paths)?;
    Ok(Hydrated { record, related })
}

fn nest_related(row: &PgRow, alias_paths: &[String]) -> Result<Map<String, Value>> {
    if alias_paths.is_empty() {
        return Ok(Map::new());
    }

    let mut groups: Vec<(String, Map<String, Value>)> = alias_paths
        .iter()
        .map(|alias| (alias.clone(), Map::new()))
        .collect();

    for (idx, column) in row.columns().iter().enumerate() {
        let name = column.name();
        let Some((alias, field)) = name.rsplit_once('.') else {
            continue;
        };
        if let Some((_, map)) = groups.iter_mut().find(|(a, _)| a == alias) {
            map.insert(field.to_string(), decode_column(row, idx));
        }
    }

    // Fold deepest aliases first so nested relations land inside parents.
    groups.sort_by_key(|(alias, _)| std::cmp::Reverse(alias.matches('.').count()));

    let mut folded: Vec<(String, Value)> = Vec::new();
    for (alias, mut map) in groups {
        let prefix = format!("{alias}.");
        let mut i = 0;
        while i < folded.len() {
            let direct_child = folded[i]
                .0
                .strip_prefix(&prefix)
                .is_some_and(|rest| !rest.contains('.'));
            if direct_child {
                let (child_alias, value) = folded.remove(i);
                map.insert(child_alias[prefix.len()..].to_string(), value);
            } else {
                i += 1;
            }
        }

        let value = if map.values().all(Value::is_null) {
            Value::Null
        } else {
            Value::Object(map)
        };
        folded.push((alias, value));
    }

    let mut related = Map::new();
    for (alias, value) in folded {
        if !alias.contains('.') {
            related.insert(alias, value);
        }
    }
    Ok(related)
}

/// Decode a single column into a JSON value by its database type.
fn decode_column(row: &PgRow, idx: usize) -> Value {
    let type_name = row.columns()[idx].type_info().name().to_string();
    match type_name.as_str() {
        "INT2" => row
            .try_get::<Option<i16>, _>(idx)
            .ok()
            .flatten()
            .map_or(Value::Null, Value::from),
        "INT4" => row
            .try_get::<Option<i32>, _>(idx)
            .ok()
            .flatten()
            .map_or(Value::Null, Value::from),
        "INT8" => row
            .try_get::<Option<i64>, _>(idx)
            .ok()
            .flatten()
            .map_or(Value::Null, Value::from),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(idx)
            .ok()
            .flatten()
            .map_or(Value::Null, |v| Value::from(f64::from(v))),
        "FLOAT8" => row
            .try_get::<Option<f64>, _>(idx)
            .ok()
            .flatten()
            .map_or(Value::Null, Value::from),
        "BOOL" => row
            .try_get::<Option<bool>, _>(idx)
            .ok()
            .flatten()
            .map_or(Value::Null, Value::from),
        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx)
            .ok()
            .flatten()
            .map_or(Value::Null, |v| Value::String(v.to_rfc3339())),
        "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(idx)
            .ok()
            .flatten()
            .map_or(Value::Null, |v| Value::String(v.to_string())),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(idx)
            .ok()
            .flatten()
            .map_or(Value::Null, |v| Value::String(v.to_string())),
        "JSON" | "JSONB" => row
            .try_get::<Option<Value>, _>(idx)
            .ok()
            .flatten()
            .unwrap_or(Value::Null),
        _ => row
            .try_get::<Option<String>, _>(idx)
            .ok()
            .flatten()
            .map_or(Value::Null, Value::String),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;
    use crate::query::order::Direction;
    use serde_json::json;

    #[test]
    fn select_applies_soft_delete_guard_and_default_projection() {
        let filter = Filter::new().with("creator_id", 7);
        let (stmt, _) = Dao::<Task>::select_statement(
            &filter,
            None,
            None,
            &[],
            &OrderSpec::new(),
        )
        .unwrap();
        let sql = stmt.build_sql();
        assert!(sql.contains(r#""tasks"."deleted_at" IS NULL"#));
        assert!(sql.contains(r#""tasks"."creator_id" = 7"#));
        assert!(sql.starts_with(r#"SELECT "tasks"."id", "tasks"."title""#));
    }

    #[test]
    fn include_tree_projects_aliased_columns_with_outer_join_by_default() {
        let include = vec![Include::new("assignee").attributes(&["id"])];
        let (stmt, aliases) = Dao::<Task>::select_statement(
            &Filter::new(),
            None,
            None,
            &include,
            &OrderSpec::new(),
        )
        .unwrap();
        let sql = stmt.build_sql();
        assert!(sql.contains(
            r#"LEFT JOIN "users" AS "assignee" ON "assignee"."id" = "tasks"."assignee_id""#
        ));
        assert!(sql.contains(r#""assignee"."id" AS "assignee.id""#));
        assert!(!sql.contains(r#""assignee"."password""#));
        assert_eq!(aliases, vec!["assignee".to_string()]);
    }

    #[test]
    fn required_include_uses_inner_join_and_filter_lands_in_on_clause() {
        let include = vec![Include::new("creator")
            .required(true)
            .filter(Filter::new().with("is_admin", true))];
        let (stmt, _) = Dao::<Task>::select_statement(
            &Filter::new(),
            None,
            None,
            &include,
            &OrderSpec::new(),
        )
        .unwrap();
        let sql = stmt.build_sql();
        assert!(sql.contains(r#"INNER JOIN "users" AS "creator""#));
        assert!(sql.contains(r#"AND "creator"."is_admin" = true"#));
    }

    #[test]
    fn unknown_relation_is_a_data_access_error() {
        let include = vec![Include::new("watchers")];
        let err = Dao::<Task>::select_statement(
            &Filter::new(),
            None,
            None,
            &include,
            &OrderSpec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::DataAccess(_)));
    }

    #[test]
    fn order_terms_render_after_joins() {
        let order = OrderSpec::new().with("created_at", Direction::Asc);
        let (stmt, _) = Dao::<Task>::select_statement(
            &Filter::new(),
            None,
            None,
            &[],
            &order,
        )
        .unwrap();
        assert!(stmt
            .build_sql()
            .ends_with(r#"ORDER BY "tasks"."created_at" ASC"#));
    }

    #[test]
    fn merged_range_filter_renders_one_compound_condition() {
        let filter = Filter::new()
            .with("due_date.gte", json!("2025-01-01T00:00:00+00:00"))
            .with("due_date.lt", json!("2026-01-01T00:00:00+00:00"));
        let (stmt, _) = Dao::<Task>::select_statement(
            &filter,
            None,
            None,
            &[],
            &OrderSpec::new(),
        )
        .unwrap();
        let sql = stmt.build_sql();
        assert!(sql.contains(
            r#"("tasks"."due_date" >= '2025-01-01T00:00:00+00:00' AND "tasks"."due_date" < '2026-01-01T00:00:00+00:00')"#
        ));
    }

    #[test]
    fn duplicate_ids_undercount_against_distinct_rows() {
        // Two distinct matching rows cannot satisfy three requested ids.
        assert!(!ids_match(&[1, 1, 2], 2));
        assert!(ids_match(&[1, 2], 2));
        assert!(!ids_match(&[1, 2, 3], 2));
    }
}
