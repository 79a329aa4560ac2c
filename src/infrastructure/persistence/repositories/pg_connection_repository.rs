use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{ConnectionRepository, RepositoryError};
use crate::domain::{ConnectionId, ConnectionStatus, PbxConnection, TenantId};

pub struct PgConnectionRepository {
    pool: PgPool,
}

impl PgConnectionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_row(row: &PgRow) -> Result<PbxConnection, RepositoryError> {
    let status: String = row.try_get("status").map_err(query_failed)?;
    let port: i32 = row.try_get("port").map_err(query_failed)?;

    Ok(PbxConnection {
        id: ConnectionId::from_uuid(row.try_get::<Uuid, _>("id").map_err(query_failed)?),
        tenant_id: TenantId::from_uuid(row.try_get::<Uuid, _>("tenant_id").map_err(query_failed)?),
        host: row.try_get("host").map_err(query_failed)?,
        port: port as u16,
        username: row.try_get("username").map_err(query_failed)?,
        password_encrypted: row.try_get("password_encrypted").map_err(query_failed)?,
        verify_ssl: row.try_get("verify_ssl").map_err(query_failed)?,
        webhook_secret: row.try_get("webhook_secret").map_err(query_failed)?,
        status: ConnectionStatus::from_str(&status).map_err(RepositoryError::Mapping)?,
        last_error: row.try_get("last_error").map_err(query_failed)?,
        created_at: row.try_get("created_at").map_err(query_failed)?,
        updated_at: row.try_get("updated_at").map_err(query_failed)?,
    })
}

fn query_failed(e: sqlx::Error) -> RepositoryError {
    RepositoryError::QueryFailed(e.to_string())
}

#[async_trait]
impl ConnectionRepository for PgConnectionRepository {
    #[instrument(skip(self), fields(connection_id = %id.as_uuid()))]
    async fn get_by_id(&self, id: ConnectionId) -> Result<Option<PbxConnection>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, host, port, username, password_encrypted, verify_ssl,
                   webhook_secret, status, last_error, created_at, updated_at
            FROM pbx_connections
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        row.as_ref().map(map_row).transpose()
    }

    #[instrument(skip(self, last_error), fields(connection_id = %id.as_uuid(), status = %status))]
    async fn update_status(
        &self,
        id: ConnectionId,
        status: ConnectionStatus,
        last_error: Option<&str>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE pbx_connections
            SET status = $1, last_error = $2, updated_at = $3
            WHERE id = $4
            "#,
        )
        .bind(status.as_str())
        .bind(last_error)
        .bind(Utc::now())
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(())
    }
}
