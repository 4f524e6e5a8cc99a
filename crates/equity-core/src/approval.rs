//! Distribution request approval chain.
//!
//! A request walks its approval steps in order. Only the approver on the
//! current step can act. A rejection anywhere rejects the request, an edit
//! request parks it until resubmitted, and approval of the final step
//! approves it. Approved requests then move through payment.

use crate::error::{EquityError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Draft,
    PendingApproval,
    Approved,
    Rejected,
    EditRequested,
    Cancelled,
    PaymentPending,
    PaymentProcessing,
    Paid,
    Failed,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Draft => "draft",
            RequestStatus::PendingApproval => "pending_approval",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::EditRequested => "edit_requested",
            RequestStatus::Cancelled => "cancelled",
            RequestStatus::PaymentPending => "payment_pending",
            RequestStatus::PaymentProcessing => "payment_processing",
            RequestStatus::Paid => "paid",
            RequestStatus::Failed => "failed",
        }
    }

    /// No further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestStatus::Rejected | RequestStatus::Cancelled | RequestStatus::Paid
        )
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Approved,
    Rejected,
    EditRequested,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalStep {
    pub approver_id: String,
    pub status: StepStatus,
    pub comment: Option<String>,
    pub acted_at: Option<DateTime<Utc>>,
}

impl ApprovalStep {
    pub fn new(approver_id: impl Into<String>) -> Self {
        Self {
            approver_id: approver_id.into(),
            status: StepStatus::Pending,
            comment: None,
            acted_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: RequestStatus,
    pub to: RequestStatus,
    pub actor: Option<String>,
    pub note: Option<String>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionRequest {
    pub id: String,
    pub amount: Decimal,
    pub status: RequestStatus,
    pub steps: Vec<ApprovalStep>,
    pub current_step: usize,
    pub failure_reason: Option<String>,
    pub history: Vec<StatusChange>,
    pub created_at: DateTime<Utc>,
}

impl DistributionRequest {
    /// A draft request whose approvers act in the given order.
    pub fn new<I, S>(id: impl Into<String>, amount: Decimal, approvers: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if amount <= Decimal::ZERO {
            return Err(EquityError::InvalidAmount {
                field: "amount".to_string(),
                value: amount,
            });
        }
        Ok(Self {
            id: id.into(),
            amount,
            status: RequestStatus::Draft,
            steps: approvers.into_iter().map(ApprovalStep::new).collect(),
            current_step: 0,
            failure_reason: None,
            history: Vec::new(),
            created_at: Utc::now(),
        })
    }

    /// The step waiting on an approver, if the request is in approval.
    pub fn pending_step(&self) -> Option<&ApprovalStep> {
        if self.status == RequestStatus::PendingApproval {
            self.steps.get(self.current_step)
        } else {
            None
        }
    }

    pub fn submit(&mut self) -> Result<()> {
        self.require(&[RequestStatus::Draft], "submit")?;
        if self.steps.is_empty() {
            return Err(EquityError::NoApprovers);
        }
        self.transition(RequestStatus::PendingApproval, None, None);
        Ok(())
    }

    pub fn approve(&mut self, approver_id: &str, comment: Option<String>) -> Result<()> {
        self.act(approver_id, StepStatus::Approved, comment.clone(), "approve")?;
        self.current_step += 1;
        if self.current_step == self.steps.len() {
            self.transition(RequestStatus::Approved, Some(approver_id), comment);
        } else {
            tracing::debug!(
                "Request {} step {} approved by {}",
                self.id,
                self.current_step,
                approver_id
            );
        }
        Ok(())
    }

    pub fn reject(&mut self, approver_id: &str, comment: Option<String>) -> Result<()> {
        self.act(approver_id, StepStatus::Rejected, comment.clone(), "reject")?;
        self.transition(RequestStatus::Rejected, Some(approver_id), comment);
        Ok(())
    }

    pub fn request_edit(&mut self, approver_id: &str, comment: Option<String>) -> Result<()> {
        self.act(approver_id, StepStatus::EditRequested, comment.clone(), "request edits")?;
        self.transition(RequestStatus::EditRequested, Some(approver_id), comment);
        Ok(())
    }

    /// Return an edited request to approval. The step that asked for edits
    /// goes back to pending; earlier approvals stand.
    pub fn resubmit(&mut self) -> Result<()> {
        self.require(&[RequestStatus::EditRequested], "resubmit")?;
        if let Some(step) = self.steps.get_mut(self.current_step) {
            step.status = StepStatus::Pending;
            step.acted_at = None;
        }
        self.transition(RequestStatus::PendingApproval, None, None);
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<()> {
        self.require(
            &[
                RequestStatus::Draft,
                RequestStatus::PendingApproval,
                RequestStatus::EditRequested,
            ],
            "cancel",
        )?;
        self.transition(RequestStatus::Cancelled, None, None);
        Ok(())
    }

    pub fn queue_payment(&mut self) -> Result<()> {
        self.require(&[RequestStatus::Approved], "queue payment")?;
        self.transition(RequestStatus::PaymentPending, None, None);
        Ok(())
    }

    pub fn start_payment(&mut self) -> Result<()> {
        self.require(&[RequestStatus::PaymentPending], "start payment")?;
        self.transition(RequestStatus::PaymentProcessing, None, None);
        Ok(())
    }

    pub fn mark_paid(&mut self) -> Result<()> {
        self.require(&[RequestStatus::PaymentProcessing], "mark paid")?;
        self.failure_reason = None;
        self.transition(RequestStatus::Paid, None, None);
        Ok(())
    }

    pub fn mark_failed(&mut self, reason: impl Into<String>) -> Result<()> {
        self.require(&[RequestStatus::PaymentProcessing], "mark failed")?;
        let reason = reason.into();
        tracing::warn!("Payment for request {} failed: {}", self.id, reason);
        self.failure_reason = Some(reason.clone());
        self.transition(RequestStatus::Failed, None, Some(reason));
        Ok(())
    }

    pub fn retry_payment(&mut self) -> Result<()> {
        self.require(&[RequestStatus::Failed], "retry payment")?;
        self.transition(RequestStatus::PaymentPending, None, None);
        Ok(())
    }

    fn require(&self, allowed: &[RequestStatus], action: &str) -> Result<()> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(EquityError::InvalidTransition {
                from: self.status.to_string(),
                action: action.to_string(),
            })
        }
    }

    /// Record an approver's decision on the current step.
    fn act(
        &mut self,
        approver_id: &str,
        outcome: StepStatus,
        comment: Option<String>,
        action: &str,
    ) -> Result<()> {
        self.require(&[RequestStatus::PendingApproval], action)?;
        let step = self
            .steps
            .get_mut(self.current_step)
            .ok_or(EquityError::NoApprovers)?;
        if step.approver_id != approver_id {
            return Err(EquityError::NotCurrentApprover {
                expected: step.approver_id.clone(),
                actual: approver_id.to_string(),
            });
        }
        step.status = outcome;
        step.comment = comment;
        step.acted_at = Some(Utc::now());
        Ok(())
    }

    fn transition(&mut self, to: RequestStatus, actor: Option<&str>, note: Option<String>) {
        tracing::info!("Distribution request {}: {} -> {}", self.id, self.status, to);
        self.history.push(StatusChange {
            from: self.status,
            to,
            actor: actor.map(str::to_string),
            note,
            at: Utc::now(),
        });
        self.status = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request() -> DistributionRequest {
        let mut req =
            DistributionRequest::new("REQ-1", dec!(25000), ["controller", "cfo", "president"])
                .unwrap();
        req.submit().unwrap();
        req
    }

    #[test]
    fn test_all_approvals_approve_request() {
        let mut req = request();
        req.approve("controller", None).unwrap();
        assert_eq!(req.status, RequestStatus::PendingApproval);
        assert_eq!(req.pending_step().unwrap().approver_id, "cfo");
        req.approve("cfo", Some("ok".to_string())).unwrap();
        req.approve("president", None).unwrap();
        assert_eq!(req.status, RequestStatus::Approved);
        assert!(req.pending_step().is_none());
        assert!(req.steps.iter().all(|s| s.status == StepStatus::Approved));
    }

    #[test]
    fn test_only_current_approver_may_act() {
        let mut req = request();
        let err = req.approve("cfo", None).unwrap_err();
        assert_eq!(
            err,
            EquityError::NotCurrentApprover {
                expected: "controller".to_string(),
                actual: "cfo".to_string(),
            }
        );
        assert_eq!(req.current_step, 0);
    }

    #[test]
    fn test_reject_at_any_step() {
        let mut req = request();
        req.approve("controller", None).unwrap();
        req.reject("cfo", Some("insufficient cash".to_string())).unwrap();
        assert_eq!(req.status, RequestStatus::Rejected);
        assert_eq!(req.steps[1].status, StepStatus::Rejected);
        assert!(req.status.is_terminal());
        assert!(req.approve("president", None).is_err());
    }

    #[test]
    fn test_edit_and_resubmit_keeps_prior_approvals() {
        let mut req = request();
        req.approve("controller", None).unwrap();
        req.request_edit("cfo", Some("split across quarters".to_string()))
            .unwrap();
        assert_eq!(req.status, RequestStatus::EditRequested);

        req.resubmit().unwrap();
        assert_eq!(req.status, RequestStatus::PendingApproval);
        assert_eq!(req.steps[0].status, StepStatus::Approved);
        assert_eq!(req.steps[1].status, StepStatus::Pending);
        req.approve("cfo", None).unwrap();
        req.approve("president", None).unwrap();
        assert_eq!(req.status, RequestStatus::Approved);
    }

    #[test]
    fn test_payment_flow_with_retry() {
        let mut req = request();
        for approver in ["controller", "cfo", "president"] {
            req.approve(approver, None).unwrap();
        }
        req.queue_payment().unwrap();
        req.start_payment().unwrap();
        req.mark_failed("bank rejected ACH").unwrap();
        assert_eq!(req.status, RequestStatus::Failed);
        assert_eq!(req.failure_reason.as_deref(), Some("bank rejected ACH"));

        req.retry_payment().unwrap();
        req.start_payment().unwrap();
        req.mark_paid().unwrap();
        assert_eq!(req.status, RequestStatus::Paid);
        assert!(req.failure_reason.is_none());
    }

    #[test]
    fn test_invalid_transitions() {
        let mut req = DistributionRequest::new("REQ-2", dec!(10), ["a"]).unwrap();
        assert!(matches!(
            req.queue_payment(),
            Err(EquityError::InvalidTransition { .. })
        ));
        assert!(req.approve("a", None).is_err());
        req.cancel().unwrap();
        assert_eq!(req.status, RequestStatus::Cancelled);
        assert!(req.submit().is_err());
    }

    #[test]
    fn test_submit_without_approvers() {
        let mut req = DistributionRequest::new("REQ-3", dec!(10), Vec::<String>::new()).unwrap();
        assert_eq!(req.submit().unwrap_err(), EquityError::NoApprovers);
        assert_eq!(req.status, RequestStatus::Draft);
    }

    #[test]
    fn test_rejects_non_positive_amount() {
        assert!(DistributionRequest::new("REQ-4", dec!(0), ["a"]).is_err());
    }

    #[test]
    fn test_history_records_transitions() {
        let mut req = request();
        req.approve("controller", None).unwrap();
        req.approve("cfo", None).unwrap();
        req.approve("president", Some("final".to_string())).unwrap();
        let trail: Vec<(RequestStatus, RequestStatus)> =
            req.history.iter().map(|c| (c.from, c.to)).collect();
        assert_eq!(
            trail,
            vec![
                (RequestStatus::Draft, RequestStatus::PendingApproval),
                (RequestStatus::PendingApproval, RequestStatus::Approved),
            ]
        );
        assert_eq!(req.history[1].actor.as_deref(), Some("president"));
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&RequestStatus::PendingApproval).unwrap();
        assert_eq!(json, "\"pending_approval\"");
    }
}
