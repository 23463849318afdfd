use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::contacts::dto::ContactPayload;
use crate::contacts::repo_types::Contact;

const CONTACT_COLUMNS: &str =
    "id, owner_id, first_name, last_name, email, phone, birthday, notes, created_at";

pub async fn list_by_owner(
    db: &PgPool,
    owner_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Contact>> {
    let rows = sqlx::query_as::<_, Contact>(&format!(
        r#"
        SELECT {CONTACT_COLUMNS}
        FROM contacts
        WHERE owner_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    ))
    .bind(owner_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn create(
    db: &PgPool,
    owner_id: Uuid,
    payload: &ContactPayload,
) -> anyhow::Result<Contact> {
    let contact = sqlx::query_as::<_, Contact>(&format!(
        r#"
        INSERT INTO contacts (owner_id, first_name, last_name, email, phone, birthday, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {CONTACT_COLUMNS}
        "#,
    ))
    .bind(owner_id)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(payload.birthday)
    .bind(&payload.notes)
    .fetch_one(db)
    .await?;
    Ok(contact)
}

pub async fn get_by_id(
    db: &PgPool,
    owner_id: Uuid,
    contact_id: Uuid,
) -> anyhow::Result<Option<Contact>> {
    let contact = sqlx::query_as::<_, Contact>(&format!(
        r#"
        SELECT {CONTACT_COLUMNS}
        FROM contacts
        WHERE id = $2 AND owner_id = $1
        "#,
    ))
    .bind(owner_id)
    .bind(contact_id)
    .fetch_optional(db)
    .await?;
    Ok(contact)
}

pub async fn update(
    db: &PgPool,
    owner_id: Uuid,
    contact_id: Uuid,
    payload: &ContactPayload,
) -> anyhow::Result<Option<Contact>> {
    let contact = sqlx::query_as::<_, Contact>(&format!(
        r#"
        UPDATE contacts
        SET first_name = $3, last_name = $4, email = $5, phone = $6, birthday = $7, notes = $8
        WHERE id = $2 AND owner_id = $1
        RETURNING {CONTACT_COLUMNS}
        "#,
    ))
    .bind(owner_id)
    .bind(contact_id)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(payload.birthday)
    .bind(&payload.notes)
    .fetch_optional(db)
    .await?;
    Ok(contact)
}

pub async fn delete(db: &PgPool, owner_id: Uuid, contact_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(r#"DELETE FROM contacts WHERE id = $2 AND owner_id = $1"#)
        .bind(owner_id)
        .bind(contact_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Case-insensitive match on first name, last name, or email.
pub async fn search(
    db: &PgPool,
    owner_id: Uuid,
    query: &str,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Contact>> {
    let pattern = format!("%{query}%");
    let rows = sqlx::query_as::<_, Contact>(&format!(
        r#"
        SELECT {CONTACT_COLUMNS}
        FROM contacts
        WHERE owner_id = $1
          AND (first_name ILIKE $2 OR last_name ILIKE $2 OR email ILIKE $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    ))
    .bind(owner_id)
    .bind(pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Contacts whose birthday falls within the next `days` days. Day-of-year
/// comparison, with the window split in two when it wraps past new year.
pub async fn upcoming_birthdays(
    db: &PgPool,
    owner_id: Uuid,
    days: i64,
) -> anyhow::Result<Vec<Contact>> {
    let today = OffsetDateTime::now_utc().date();
    let upcoming = today + time::Duration::days(days);
    let start = i32::from(today.ordinal());
    let end = i32::from(upcoming.ordinal());

    let rows = if start <= end {
        sqlx::query_as::<_, Contact>(&format!(
            r#"
            SELECT {CONTACT_COLUMNS}
            FROM contacts
            WHERE owner_id = $1
              AND birthday IS NOT NULL
              AND EXTRACT(DOY FROM birthday) BETWEEN $2 AND $3
            ORDER BY EXTRACT(DOY FROM birthday)
            "#,
        ))
        .bind(owner_id)
        .bind(start)
        .bind(end)
        .fetch_all(db)
        .await?
    } else {
        sqlx::query_as::<_, Contact>(&format!(
            r#"
            SELECT {CONTACT_COLUMNS}
            FROM contacts
            WHERE owner_id = $1
              AND birthday IS NOT NULL
              AND (EXTRACT(DOY FROM birthday) >= $2 OR EXTRACT(DOY FROM birthday) <= $3)
            ORDER BY EXTRACT(DOY FROM birthday)
            "#,
        ))
        .bind(owner_id)
        .bind(start)
        .bind(end)
        .fetch_all(db)
        .await?
    };
    Ok(rows)
}
