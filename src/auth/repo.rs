use sqlx::PgConnection;

use crate::auth::repo_types::{NewUser, User};

pub(crate) fn insert_user_sql(schema: &str) -> String {
    format!(
        r#"
        INSERT INTO {schema}.users (email, password_hash, full_name, phone, is_seller)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, email, password_hash, full_name, phone, is_seller
        "#
    )
}

pub(crate) fn find_by_email_sql(schema: &str) -> String {
    format!(
        r#"
        SELECT id, email, password_hash, full_name, phone, is_seller
        FROM {schema}.users
        WHERE email = $1
        "#
    )
}

/// Insert a user and return the stored row.
pub async fn insert_user(
    conn: &mut PgConnection,
    schema: &str,
    new: &NewUser,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&insert_user_sql(schema))
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.full_name)
        .bind(&new.phone)
        .bind(new.is_seller)
        .fetch_one(conn)
        .await
}

/// Find a user by exact email.
pub async fn find_by_email(
    conn: &mut PgConnection,
    schema: &str,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&find_by_email_sql(schema))
        .bind(email)
        .fetch_optional(conn)
        .await
}
