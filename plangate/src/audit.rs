use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::llm::Provider;
use crate::normalize::TaskType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Failure { kind: &'static str },
}

/// One dispatch, as seen by an audit sink. Holds no prompt text, secret or response.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub request_id: Uuid,
    pub provider: Provider,
    pub task: TaskType,
    pub outcome: AuditOutcome,
    pub latency_ms: u64,
    pub timestamp: DateTime<Utc>,
}

pub trait AuditSink: Send + Sync {
    fn record(&self, record: &AuditRecord);
}

/// Emits each record as a structured `tracing` event.
#[derive(Debug, Clone, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: &AuditRecord) {
        match &record.outcome {
            AuditOutcome::Success => tracing::info!(
                request_id = %record.request_id,
                provider = %record.provider,
                task = %record.task,
                latency_ms = record.latency_ms,
                "Dispatch completed"
            ),
            AuditOutcome::Failure { kind } => tracing::info!(
                request_id = %record.request_id,
                provider = %record.provider,
                task = %record.task,
                latency_ms = record.latency_ms,
                error_kind = kind,
                "Dispatch failed"
            ),
        }
    }
}
