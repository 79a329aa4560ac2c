use std::str::FromStr;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{AnalysisRepository, RepositoryError};
use crate::domain::{
    CallAnalysis, CallAnalysisId, CallAnalysisResult, CallRecordId, EscalationRisk,
    SatisfactionPrediction, Sentiment, TenantId,
};

pub struct PgAnalysisRepository {
    pool: PgPool,
}

impl PgAnalysisRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn string_list(value: serde_json::Value) -> Vec<String> {
    serde_json::from_value(value).unwrap_or_default()
}

fn map_row(row: &PgRow) -> Result<CallAnalysis, RepositoryError> {
    let sentiment: String = row.try_get("sentiment").map_err(query_failed)?;
    let escalation_risk: String = row.try_get("escalation_risk").map_err(query_failed)?;
    let satisfaction: String = row
        .try_get("satisfaction_prediction")
        .map_err(query_failed)?;
    let talk_ratios: Option<serde_json::Value> = row.try_get("talk_ratios").map_err(query_failed)?;

    let result = CallAnalysisResult {
        summary: row.try_get("summary").map_err(query_failed)?,
        sentiment: Sentiment::from_str(&sentiment).map_err(RepositoryError::Mapping)?,
        sentiment_score: row.try_get("sentiment_score").map_err(query_failed)?,
        keywords: string_list(row.try_get("keywords").map_err(query_failed)?),
        topics: string_list(row.try_get("topics").map_err(query_failed)?),
        action_items: string_list(row.try_get("action_items").map_err(query_failed)?),
        questions: string_list(row.try_get("questions").map_err(query_failed)?),
        objections: string_list(row.try_get("objections").map_err(query_failed)?),
        escalation_risk: EscalationRisk::from_str(&escalation_risk)
            .map_err(RepositoryError::Mapping)?,
        escalation_reasons: string_list(row.try_get("escalation_reasons").map_err(query_failed)?),
        satisfaction_prediction: SatisfactionPrediction::from_str(&satisfaction)
            .map_err(RepositoryError::Mapping)?,
        compliance_flags: string_list(row.try_get("compliance_flags").map_err(query_failed)?),
        call_disposition: row.try_get("call_disposition").map_err(query_failed)?,
        talk_ratios: talk_ratios.and_then(|v| serde_json::from_value(v).ok()),
    };

    Ok(CallAnalysis {
        id: CallAnalysisId::from_uuid(row.try_get::<Uuid, _>("id").map_err(query_failed)?),
        tenant_id: TenantId::from_uuid(row.try_get::<Uuid, _>("tenant_id").map_err(query_failed)?),
        call_record_id: CallRecordId::from_uuid(
            row.try_get::<Uuid, _>("call_record_id")
                .map_err(query_failed)?,
        ),
        result,
        created_at: row.try_get("created_at").map_err(query_failed)?,
    })
}

fn query_failed(e: sqlx::Error) -> RepositoryError {
    RepositoryError::QueryFailed(e.to_string())
}

fn json_list(items: &[String]) -> serde_json::Value {
    serde_json::json!(items)
}

#[async_trait]
impl AnalysisRepository for PgAnalysisRepository {
    #[instrument(skip(self, analysis), fields(call_record_id = %analysis.call_record_id.as_uuid()))]
    async fn insert(&self, analysis: &CallAnalysis) -> Result<(), RepositoryError> {
        let r = &analysis.result;
        let talk_ratios = r
            .talk_ratios
            .as_ref()
            .map(|t| serde_json::json!(t));

        sqlx::query(
            r#"
            INSERT INTO call_analyses
                (id, tenant_id, call_record_id, summary, sentiment, sentiment_score,
                 keywords, topics, action_items, questions, objections, escalation_risk,
                 escalation_reasons, satisfaction_prediction, compliance_flags,
                 call_disposition, talk_ratios, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(analysis.id.as_uuid())
        .bind(analysis.tenant_id.as_uuid())
        .bind(analysis.call_record_id.as_uuid())
        .bind(&r.summary)
        .bind(r.sentiment.as_str())
        .bind(r.sentiment_score)
        .bind(json_list(&r.keywords))
        .bind(json_list(&r.topics))
        .bind(json_list(&r.action_items))
        .bind(json_list(&r.questions))
        .bind(json_list(&r.objections))
        .bind(r.escalation_risk.as_str())
        .bind(json_list(&r.escalation_reasons))
        .bind(r.satisfaction_prediction.as_str())
        .bind(json_list(&r.compliance_flags))
        .bind(&r.call_disposition)
        .bind(talk_ratios)
        .bind(analysis.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .map(|d| d.is_unique_violation())
                .unwrap_or(false)
            {
                RepositoryError::ConstraintViolation(e.to_string())
            } else {
                query_failed(e)
            }
        })?;

        Ok(())
    }

    #[instrument(skip(self), fields(call_record_id = %call_record_id.as_uuid()))]
    async fn get_by_call_record(
        &self,
        call_record_id: CallRecordId,
    ) -> Result<Option<CallAnalysis>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, call_record_id, summary, sentiment, sentiment_score,
                   keywords, topics, action_items, questions, objections, escalation_risk,
                   escalation_reasons, satisfaction_prediction, compliance_flags,
                   call_disposition, talk_ratios, created_at
            FROM call_analyses
            WHERE call_record_id = $1
            "#,
        )
        .bind(call_record_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        row.as_ref().map(map_row).transpose()
    }
}
