use sqlx::SqliteConnection;

use crate::db_types::Manager;

pub async fn insert_manager(manager: &Manager, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO managers (id, name, role) VALUES ($1, $2, $3)")
        .bind(&manager.id)
        .bind(&manager.name)
        .bind(&manager.role)
        .execute(conn)
        .await?;
    Ok(())
}

/// Role names are matched case-insensitively. If several managers share a role, the one with the lowest id wins.
pub async fn find_by_role(role: &str, conn: &mut SqliteConnection) -> Result<Option<String>, sqlx::Error> {
    let id = sqlx::query_scalar("SELECT id FROM managers WHERE role = $1 COLLATE NOCASE ORDER BY id LIMIT 1")
        .bind(role.trim())
        .fetch_optional(conn)
        .await?;
    Ok(id)
}
