use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::{
    Address, Client, ClientChanges, ClientWithContacts, ContactPerson, NewClient, NewContact,
};
use crate::query::{sql, ClientFilter};

#[derive(sqlx::FromRow)]
struct ClientRow {
    id: Uuid,
    name: String,
    tax_id: Option<String>,
    address: Option<Json<Address>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: row.id,
            name: row.name,
            tax_id: row.tax_id,
            address: row.address.map(|a| a.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub async fn list(pool: &PgPool, filter: &ClientFilter) -> Result<Vec<Client>, sqlx::Error> {
    let mut builder = sql::select_clients(filter);
    let rows = builder.build_query_as::<ClientRow>().fetch_all(pool).await?;
    Ok(rows.into_iter().map(Client::from).collect())
}

pub async fn count(pool: &PgPool, filter: &ClientFilter) -> Result<i64, sqlx::Error> {
    let mut builder = sql::count_clients(filter);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub async fn find_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Client>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ClientRow>("SELECT * FROM clients WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(Client::from).collect())
}

/// Earliest-created client, ties broken by id.
pub async fn find_default(pool: &PgPool) -> Result<Option<Client>, sqlx::Error> {
    let row = sqlx::query_as::<_, ClientRow>(
        "SELECT * FROM clients ORDER BY created_at ASC, id ASC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Client::from))
}

pub async fn contacts_for(
    pool: &PgPool,
    client_ids: &[Uuid],
) -> Result<Vec<ContactPerson>, sqlx::Error> {
    let mut builder = sql::select_contacts_for(client_ids);
    builder
        .build_query_as::<ContactPerson>()
        .fetch_all(pool)
        .await
}

async fn insert_contacts(
    tx: &mut Transaction<'_, Postgres>,
    client_id: Uuid,
    contacts: &[NewContact],
) -> Result<Vec<ContactPerson>, sqlx::Error> {
    let mut inserted = Vec::with_capacity(contacts.len());
    for contact in contacts {
        let row = sqlx::query_as::<_, ContactPerson>(
            "INSERT INTO contact_persons (client_id, name, email, phone, position)
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(client_id)
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.position)
        .fetch_one(&mut **tx)
        .await?;
        inserted.push(row);
    }
    Ok(inserted)
}

pub async fn create(pool: &PgPool, client: &NewClient) -> Result<ClientWithContacts, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, ClientRow>(
        "INSERT INTO clients (name, tax_id, address) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(&client.name)
    .bind(&client.tax_id)
    .bind(client.address.as_ref().map(Json))
    .fetch_one(&mut *tx)
    .await?;

    let contact_persons = insert_contacts(&mut tx, row.id, &client.contacts).await?;
    tx.commit().await?;

    Ok(ClientWithContacts {
        client: row.into(),
        contact_persons,
    })
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    changes: &ClientChanges,
) -> Result<Option<ClientWithContacts>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, ClientRow>(
        "UPDATE clients SET
            name = COALESCE($2, name),
            tax_id = COALESCE($3, tax_id),
            address = COALESCE($4, address),
            updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(&changes.name)
    .bind(&changes.tax_id)
    .bind(changes.address.as_ref().map(Json))
    .fetch_optional(&mut *tx)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    if let Some(contacts) = &changes.contacts {
        sqlx::query("DELETE FROM contact_persons WHERE client_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_contacts(&mut tx, id, contacts).await?;
    }

    let contact_persons = sqlx::query_as::<_, ContactPerson>(
        "SELECT * FROM contact_persons WHERE client_id = $1 ORDER BY created_at ASC, id ASC",
    )
    .bind(id)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Some(ClientWithContacts {
        client: row.into(),
        contact_persons,
    }))
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM clients WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
