use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A logical or child document row (spec §3, §6 `documents` table).
/// Parent rows are named directly by a job's `document_id`; child rows are
/// one per `ExtractedItem` produced during a successful run, all sharing
/// `chunking_session`.
#[derive(Debug, Clone, FromRow)]
pub struct DocumentRow {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub connector_id: i64,
    pub source_id: String,
    pub url: String,
    pub signature: Option<String>,
    pub chunking_session: Option<Uuid>,
    pub analyzed: bool,
    pub creation_date: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

/// A single extracted sub-source about to become a child document row plus
/// its chunks, carried between `document::extract` and `database::registry`
/// without re-deriving the reference string.
#[derive(Debug, Clone)]
pub struct NewChildDocument {
    pub source_id: String,
    pub url: String,
}

/// A connector configuration row, shared with the control plane (spec §3,
/// §6 `connectors` table). This worker only ever writes `status`,
/// `last_update`, `last_successful_index_date`, `total_docs_indexed`.
#[derive(Debug, Clone, FromRow)]
pub struct ConnectorRow {
    pub id: i64,
    pub name: String,
    pub connector_type: String,
    pub connector_specific_config: serde_json::Value,
    pub refresh_freq: Option<String>,
    pub user_id: Option<i64>,
    pub tenant_id: Option<i64>,
    pub status: ConnectorStatus,
    pub last_successful_index_date: Option<DateTime<Utc>>,
    pub total_docs_indexed: i64,
    pub creation_date: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    pub deleted_date: Option<DateTime<Utc>>,
}

/// Connector lifecycle state (spec §4.6). `Disabled`/`UnableToProcess` are
/// written only by the control plane; this worker reads but never sets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorStatus {
    ReadyToBeProcessed,
    Pending,
    Processing,
    CompletedSuccessfully,
    CompletedWithErrors,
    Disabled,
    UnableToProcess,
}

impl std::fmt::Display for ConnectorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ReadyToBeProcessed => "ready_to_be_processed",
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::CompletedSuccessfully => "completed_successfully",
            Self::CompletedWithErrors => "completed_with_errors",
            Self::Disabled => "disabled",
            Self::UnableToProcess => "unable_to_process",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for ConnectorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ready_to_be_processed" => Self::ReadyToBeProcessed,
            "pending" => Self::Pending,
            "processing" => Self::Processing,
            "completed_successfully" => Self::CompletedSuccessfully,
            "completed_with_errors" => Self::CompletedWithErrors,
            "disabled" => Self::Disabled,
            "unable_to_process" => Self::UnableToProcess,
            other => return Err(format!("unknown connector status: {other}")),
        })
    }
}

impl From<String> for ConnectorStatus {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(Self::Pending)
    }
}

/// Backs `connectors.status` (a plain `TEXT` column, spec §6) with this enum
/// directly rather than round-tripping through `String` at every call site —
/// `ConnectorRow::status` and every bind in `database::connector` carry the
/// enum itself.
impl sqlx::Type<sqlx::Postgres> for ConnectorStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for ConnectorStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.to_string(), buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ConnectorStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
        s.parse::<ConnectorStatus>().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_its_string_form() {
        let all = [
            ConnectorStatus::ReadyToBeProcessed,
            ConnectorStatus::Pending,
            ConnectorStatus::Processing,
            ConnectorStatus::CompletedSuccessfully,
            ConnectorStatus::CompletedWithErrors,
            ConnectorStatus::Disabled,
            ConnectorStatus::UnableToProcess,
        ];
        for status in all {
            let text = status.to_string();
            assert_eq!(ConnectorStatus::from(text), status);
        }
    }
}
