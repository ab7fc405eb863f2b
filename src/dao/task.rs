//! Task accessor.
//!
//! Extends the generic contract with one aggregate query: the completion
//! leaderboard. Per user it counts created-or-assigned tasks, derives a
//! completion percentage, and ranks users by that rate with completed-count
//! tie-breaking. The query consumes the standard pagination contract.

use serde::Serialize;
use sqlx::PgPool;
use std::ops::Deref;

use crate::dao::Dao;
use crate::error::Result;
use crate::models::Task;
use crate::query::filter::Filter;
use crate::query::order::OrderSpec;
use crate::query::page::{offset, PageInfo};

#[derive(Debug, Clone)]
pub struct TaskDao {
    dao: Dao<Task>,
}

impl Deref for TaskDao {
    type Target = Dao<Task>;

    fn deref(&self) -> &Self::Target {
        &self.dao
    }
}

/// One leaderboard row. `completion_rate` is a rounded percentage, 0 when
/// the user has no tasks; `rank` is dense, so ties share a rank and the next
/// distinct rate follows immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub completed_tasks: i64,
    pub total_tasks: i64,
    pub completion_rate: i64,
    pub rank: i64,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardPage {
    pub data: Vec<LeaderboardEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PageInfo>,
}

/// Pagination/order options for the leaderboard query.
#[derive(Debug, Clone, Default)]
pub struct LeaderboardOpts {
    pub order: OrderSpec,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

impl TaskDao {
    pub fn new(pool: PgPool) -> Self {
        Self { dao: Dao::new(pool) }
    }

    /// Rank users by task completion rate. `task_filter` narrows which tasks
    /// are counted (it is translated against the joined `tasks` table);
    /// soft-deleted tasks never count. Pagination rows reflect the full user
    /// population.
    pub async fn completion_leaderboard(
        &self,
        task_filter: &Filter,
        opts: &LeaderboardOpts,
    ) -> Result<LeaderboardPage> {
        let page = opts.page.unwrap_or(1);
        let sql = leaderboard_sql(task_filter, &opts.order, opts.limit, page);
        tracing::debug!(sql = %sql, "completion_leaderboard");

        let data = sqlx::query_as::<_, LeaderboardEntry>(&sql)
            .fetch_all(self.dao.pool())
            .await?;

        let pagination = match opts.limit {
            Some(limit) => {
                let rows: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM "users""#)
                    .fetch_one(self.dao.pool())
                    .await?;
                Some(PageInfo::compute(limit, page, rows))
            }
            None => None,
        };

        Ok(LeaderboardPage { data, pagination })
    }
}

fn leaderboard_sql(task_filter: &Filter, order: &OrderSpec, limit: Option<i64>, page: i64) -> String {
    let mut join_on = String::from(
        r#"("tasks"."creator_id" = "users"."id" OR "tasks"."assignee_id" = "users"."id") AND "tasks"."deleted_at" IS NULL"#,
    );
    for condition in task_filter.conditions("tasks") {
        join_on.push_str(" AND ");
        join_on.push_str(&condition);
    }

    let counts_cte = format!(
        concat!(
            r#"SELECT "users"."id" AS "user_id", "users"."first_name" AS "first_name", "#,
            r#""users"."last_name" AS "last_name", "#,
            r#"COUNT("tasks"."id") FILTER (WHERE "tasks"."status" = 'COMPLETED') AS "completed_tasks", "#,
            r#"COUNT("tasks"."id") AS "total_tasks" "#,
            r#"FROM "users" LEFT JOIN "tasks" ON {} "#,
            r#"GROUP BY "users"."id", "users"."first_name", "users"."last_name""#,
        ),
        join_on
    );
    let rated_cte = concat!(
        r#"SELECT *, COALESCE(ROUND(100.0 * "completed_tasks" / NULLIF("total_tasks", 0)), 0)::BIGINT "#,
        r#"AS "completion_rate" FROM "task_counts""#,
    );

    let mut sql = format!(
        concat!(
            r#"WITH "task_counts" AS ({}), "rated" AS ({}) "#,
            r#"SELECT "user_id", "first_name", "last_name", "completed_tasks", "total_tasks", "completion_rate", "#,
            r#"DENSE_RANK() OVER (ORDER BY "completion_rate" DESC, "completed_tasks" DESC) AS "rank" "#,
            r#"FROM "rated""#,
        ),
        counts_cte, rated_cte
    );

    let mut terms = vec![
        r#""completion_rate" DESC"#.to_string(),
        r#""completed_tasks" DESC"#.to_string(),
    ];
    terms.extend(order.to_sql("rated"));
    sql.push_str(&format!(" ORDER BY {}", terms.join(", ")));

    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {limit} OFFSET {}", offset(page, limit)));
    }
    sql
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_by_rate_then_completed_count() {
        let sql = leaderboard_sql(&Filter::new(), &OrderSpec::new(), Some(10), 1);
        assert!(sql.contains(
            r#"DENSE_RANK() OVER (ORDER BY "completion_rate" DESC, "completed_tasks" DESC)"#
        ));
        assert!(sql.ends_with(r#"ORDER BY "completion_rate" DESC, "completed_tasks" DESC LIMIT 10 OFFSET 0"#));
    }

    #[test]
    fn task_filter_narrows_the_counted_tasks() {
        let filter = Filter::new().with("priority", "HIGH");
        let sql = leaderboard_sql(&filter, &OrderSpec::new(), None, 1);
        assert!(sql.contains(r#"AND "tasks"."priority" = 'HIGH'"#));
        assert!(!sql.contains("LIMIT"));
    }

    #[test]
    fn zero_task_users_fall_back_to_rate_zero() {
        let sql = leaderboard_sql(&Filter::new(), &OrderSpec::new(), None, 1);
        assert!(sql.contains(r#"COALESCE(ROUND(100.0 * "completed_tasks" / NULLIF("total_tasks", 0)), 0)"#));
    }

    #[test]
    fn soft_deleted_tasks_never_count() {
        let sql = leaderboard_sql(&Filter::new(), &OrderSpec::new(), Some(5), 2);
        assert!(sql.contains(r#""tasks"."deleted_at" IS NULL"#));
        assert!(sql.ends_with("LIMIT 5 OFFSET 5"));
    }
}
