use sqlx::SqliteConnection;

use crate::{db_types::Customer, traits::CustomerError};

#[derive(Debug, Clone, sqlx::FromRow)]
struct CustomerRow {
    id: String,
    name: String,
    email: String,
    discount_eligible: bool,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self { id: row.id, name: row.name, email: row.email, discount_eligible: row.discount_eligible }
    }
}

pub async fn fetch_customer(customer_id: &str, conn: &mut SqliteConnection) -> Result<Option<Customer>, CustomerError> {
    let row: Option<CustomerRow> =
        sqlx::query_as("SELECT id, name, email, discount_eligible FROM customers WHERE id = $1")
            .bind(customer_id)
            .fetch_optional(conn)
            .await?;
    Ok(row.map(Customer::from))
}

pub async fn upsert_customer(customer: &Customer, conn: &mut SqliteConnection) -> Result<(), CustomerError> {
    sqlx::query(
        r#"
            INSERT INTO customers (id, name, email, discount_eligible) VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                discount_eligible = excluded.discount_eligible,
                updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&customer.id)
    .bind(&customer.name)
    .bind(&customer.email)
    .bind(customer.discount_eligible)
    .execute(conn)
    .await?;
    Ok(())
}
