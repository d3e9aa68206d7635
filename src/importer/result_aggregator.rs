// ==========================================
// 授权凭证管理后台 - 结果汇总器
// ==========================================
// 阶段 6: 逐行结果 + 运行计数 → BatchResult
// ==========================================

use crate::domain::import::{
    BatchCounts, BatchResult, RowAction, RowErrorKind, RowResult, ValidationReport,
};
use crate::domain::types::ImportIntent;
use crate::importer::error::ImportError;
use crate::repository::RowChangeOutcome;

pub struct ResultAggregator {
    batch_id: String,
    intent: ImportIntent,
    results: Vec<RowResult>,
    counts: BatchCounts,
    fatal_error: Option<String>,
}

impl ResultAggregator {
    pub fn new(batch_id: String, intent: ImportIntent, total: usize) -> Self {
        Self {
            batch_id,
            intent,
            results: Vec::with_capacity(total),
            counts: BatchCounts {
                total,
                ..Default::default()
            },
            fatal_error: None,
        }
    }

    pub fn record_success(&mut self, row: usize, outcome: &RowChangeOutcome) {
        let action = if outcome.credential_created {
            RowAction::Created
        } else {
            RowAction::Updated
        };
        let message = match (action, outcome.sale_id) {
            (RowAction::Created, Some(_)) => "凭证已创建，销售关联已写入",
            (RowAction::Created, None) => "凭证已创建",
            (RowAction::Updated, Some(_)) => "凭证已更新，销售关联已写入",
            (RowAction::Updated, None) => "凭证已更新",
        };

        self.counts.succeeded += 1;
        self.results.push(RowResult {
            row,
            success: true,
            credential_id: Some(outcome.credential_id),
            action: Some(action),
            message: Some(message.to_string()),
            error: None,
            error_kind: None,
        });
    }

    pub fn record_failure(&mut self, row: usize, error: &ImportError) {
        let kind = error.row_kind().unwrap_or(RowErrorKind::Internal);
        self.push_failure(row, kind, error.to_string());
    }

    pub fn record_failure_message(&mut self, row: usize, kind: RowErrorKind, message: String) {
        self.push_failure(row, kind, message);
    }

    fn push_failure(&mut self, row: usize, kind: RowErrorKind, message: String) {
        self.counts.failed += 1;
        self.results.push(RowResult {
            row,
            success: false,
            credential_id: None,
            action: None,
            message: None,
            error: Some(message),
            error_kind: Some(kind),
        });
    }

    /// 中止后未处理的行
    pub fn record_skipped(&mut self, count: usize) {
        self.counts.skipped += count;
    }

    pub fn set_fatal(&mut self, message: String) {
        self.fatal_error = Some(message);
    }

    pub fn finish(self, validation: ValidationReport, elapsed_ms: u64) -> BatchResult {
        let success = self.counts.failed == 0 && self.counts.skipped == 0 && self.fatal_error.is_none();
        BatchResult {
            batch_id: self.batch_id,
            intent: self.intent,
            success,
            validation,
            results: self.results,
            counts: self.counts,
            fatal_error: self.fatal_error,
            elapsed_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(created: bool) -> RowChangeOutcome {
        RowChangeOutcome {
            credential_id: 7,
            credential_created: created,
            user_updated: false,
            sale_id: None,
            sale_created: false,
        }
    }

    #[test]
    fn test_counts_and_success_flag() {
        let mut agg = ResultAggregator::new("b1".to_string(), ImportIntent::Ledger, 3);
        agg.record_success(1, &outcome(true));
        agg.record_success(2, &outcome(false));
        agg.record_failure(
            3,
            &ImportError::PackageNotFound {
                token: "Gold".to_string(),
                known: vec![],
            },
        );

        let result = agg.finish(ValidationReport::new(3), 5);
        assert!(!result.success);
        assert_eq!(result.counts.succeeded, 2);
        assert_eq!(result.counts.failed, 1);
        assert_eq!(result.results[0].action, Some(RowAction::Created));
        assert_eq!(result.results[1].action, Some(RowAction::Updated));
        assert_eq!(result.results[2].error_kind, Some(RowErrorKind::PackageNotFound));
        assert_eq!(result.failed_rows().count(), 1);
    }

    #[test]
    fn test_all_rows_succeeded() {
        let mut agg = ResultAggregator::new("b2".to_string(), ImportIntent::CredentialOnly, 1);
        agg.record_success(1, &outcome(true));
        let result = agg.finish(ValidationReport::new(1), 1);
        assert!(result.success);
        assert!(result.fatal_error.is_none());
    }

    #[test]
    fn test_fatal_error_marks_failure() {
        let mut agg = ResultAggregator::new("b3".to_string(), ImportIntent::Ledger, 4);
        agg.record_skipped(4);
        agg.set_fatal("缺少必填列: reseller".to_string());
        let result = agg.finish(ValidationReport::new(4), 0);
        assert!(!result.success);
        assert_eq!(result.counts.skipped, 4);
    }
}
