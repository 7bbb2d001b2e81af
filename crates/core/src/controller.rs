//! Form controller: owns the form state and drives lookups and submission.
//!
//! The controller is the single owner of mutable form state. Every change
//! produces a new [`FormSnapshot`] that is published on a
//! [`tokio::sync::watch`] channel, so any presentation layer can render from
//! snapshots without reaching into the controller.
//!
//! View states: `Editing` → `Submitting` → `Submitted` (terminal). A failed
//! validation keeps the form in `Editing`; a failed submission returns to it
//! with every field value preserved.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::CoreError;
use crate::form::{EnrollmentForm, EnrollmentPayload, FormEdit};
use crate::lookup::{LookupSequencer, LookupTicket, NameCheck};
use crate::types::Timestamp;
use crate::validation::{validate_form, FormField, ValidationState};

pub const NAME_TAKEN: &str =
    "O aluno já está cadastrado no Sistema, para mudar algo, acione a coordenação";
pub const LOOKUP_FAILED: &str = "Erro ao verificar o nome. Tente novamente.";
pub const FIX_ERRORS: &str = "Corrija os erros antes de enviar o formulário.";
pub const SUBMIT_OK: &str = "Aluno cadastrado com sucesso!";
pub const SUBMIT_FAILED: &str = "Erro ao cadastrar aluno. Confira os campos e tente novamente.";

// ---------------------------------------------------------------------------
// Service seam
// ---------------------------------------------------------------------------

/// The remote registration service the form talks to.
#[async_trait]
pub trait RegistrationService: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Whether a child with this name is already registered.
    async fn check_name_exists(&self, name: &str) -> Result<bool, Self::Error>;

    /// Register a child. The same `idempotency_key` is sent on every retry
    /// of one form.
    async fn submit(
        &self,
        payload: &EnrollmentPayload,
        idempotency_key: Uuid,
    ) -> Result<SubmitReceipt, Self::Error>;
}

/// What the service answered to a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitReceipt {
    pub status: u16,
    pub body: serde_json::Value,
    pub received_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormView {
    #[default]
    Editing,
    Submitting,
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
}

/// A blocking alert shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: &str) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.to_string(),
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.to_string(),
        }
    }
}

/// Immutable view of the whole form at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormSnapshot {
    pub form: EnrollmentForm,
    pub errors: ValidationState,
    pub name_check: NameCheck,
    pub view: FormView,
    pub notice: Option<Notice>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("{} field(s) failed validation", .0.len())]
    Validation(ValidationState),

    #[error("{}", NAME_TAKEN)]
    NameTaken,

    #[error("Name lookup failed: {0}")]
    LookupFailed(String),

    #[error("Submission failed: {0}")]
    Submission(String),

    #[error("The form is no longer editable")]
    Closed,

    #[error(transparent)]
    Edit(#[from] CoreError),
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct FormController<S> {
    service: Arc<S>,
    current: FormSnapshot,
    publisher: watch::Sender<FormSnapshot>,
    lookups: LookupSequencer,
    idempotency_key: Uuid,
}

impl<S: RegistrationService> FormController<S> {
    pub fn new(service: S) -> Self {
        Self::with_shared(Arc::new(service))
    }

    /// Build a controller over a service that is shared with other callers.
    pub fn with_shared(service: Arc<S>) -> Self {
        let current = FormSnapshot::default();
        let (publisher, _) = watch::channel(current.clone());
        Self {
            service,
            current,
            publisher,
            lookups: LookupSequencer::new(),
            idempotency_key: Uuid::new_v4(),
        }
    }

    /// Shared handle to the service, for callers running lookups themselves.
    pub fn service(&self) -> Arc<S> {
        Arc::clone(&self.service)
    }

    pub fn snapshot(&self) -> &FormSnapshot {
        &self.current
    }

    /// Receive every snapshot published from now on.
    pub fn subscribe(&self) -> watch::Receiver<FormSnapshot> {
        self.publisher.subscribe()
    }

    pub fn idempotency_key(&self) -> Uuid {
        self.idempotency_key
    }

    /// Apply one user edit.
    pub fn edit(&mut self, edit: FormEdit) -> Result<(), FormError> {
        self.ensure_editing()?;

        let renames = edit.touches_child_name();
        let mut next = self.current.clone();
        next.form = self.current.form.apply(edit)?;
        next.notice = None;

        if renames {
            // Results for the previous name no longer apply.
            self.lookups.invalidate();
            next.name_check = NameCheck::Unchecked;
            clear_lookup_message(&mut next.errors);
        }

        self.publish(next);
        Ok(())
    }

    /// Start a lookup for the current name (the name field lost focus).
    ///
    /// Returns `None`, leaving state untouched, when the name is blank or
    /// the form is not editable.
    pub fn begin_name_lookup(&mut self) -> Option<LookupTicket> {
        if self.current.view != FormView::Editing {
            return None;
        }
        let ticket = self.lookups.issue(&self.current.form.child_name)?;
        tracing::debug!(generation = ticket.generation, "Name lookup started");

        let mut next = self.current.clone();
        next.name_check = NameCheck::Pending {
            name: ticket.name.clone(),
        };
        self.publish(next);
        Some(ticket)
    }

    /// Record the outcome of a lookup. Returns `false` when the ticket has
    /// been superseded and the result was discarded.
    pub fn finish_name_lookup(
        &mut self,
        ticket: LookupTicket,
        result: Result<bool, S::Error>,
    ) -> bool {
        if !self.lookups.is_current(&ticket) {
            tracing::debug!(
                generation = ticket.generation,
                latest = self.lookups.generation(),
                "Discarding stale name lookup result",
            );
            return false;
        }

        let mut next = self.current.clone();
        let name = ticket.name;
        match result {
            Ok(true) => {
                tracing::info!(generation = ticket.generation, "Child name already registered");
                next.name_check = NameCheck::Taken { name };
                next.errors.set(FormField::ChildName, NAME_TAKEN);
            }
            Ok(false) => {
                next.name_check = NameCheck::Available { name };
                clear_lookup_message(&mut next.errors);
            }
            Err(e) => {
                tracing::warn!(generation = ticket.generation, error = %e, "Name lookup failed");
                next.name_check = NameCheck::Failed {
                    name,
                    reason: e.to_string(),
                };
                next.errors.set(FormField::ChildName, LOOKUP_FAILED);
            }
        }
        self.publish(next);
        true
    }

    /// Run a full lookup for the current name and return the resulting
    /// check, or `None` when no lookup was started.
    pub async fn check_name(&mut self) -> Option<NameCheck> {
        let ticket = self.begin_name_lookup()?;
        let result = self.service.check_name_exists(&ticket.name).await;
        self.finish_name_lookup(ticket, result);
        Some(self.current.name_check.clone())
    }

    /// Validate and submit the form.
    ///
    /// The name lookup is re-run unless the current name has already been
    /// confirmed available, so a never-blurred field or a failed lookup
    /// cannot slip through.
    pub async fn submit(&mut self) -> Result<SubmitReceipt, FormError> {
        self.ensure_editing()?;

        let mut errors = validate_form(&self.current.form);
        let name_is_well_formed = errors.message(FormField::ChildName).is_none();

        if name_is_well_formed
            && !self
                .current
                .name_check
                .confirms_available(&self.current.form.child_name)
        {
            if let Some(ticket) = self.begin_name_lookup() {
                let result = self.service.check_name_exists(&ticket.name).await;
                self.finish_name_lookup(ticket, result);
            }
        }

        let blocking = if name_is_well_formed {
            match &self.current.name_check {
                NameCheck::Taken { .. } => {
                    errors.set(FormField::ChildName, NAME_TAKEN);
                    Some(FormError::NameTaken)
                }
                NameCheck::Failed { reason, .. } => {
                    errors.set(FormField::ChildName, LOOKUP_FAILED);
                    Some(FormError::LookupFailed(reason.clone()))
                }
                _ => None,
            }
        } else {
            None
        };

        let mut next = self.current.clone();
        next.errors = errors.clone();

        if !errors.is_valid() {
            tracing::info!(fields = errors.len(), "Submission blocked by form errors");
            next.notice = Some(Notice::error(FIX_ERRORS));
            self.publish(next);
            return Err(blocking.unwrap_or(FormError::Validation(errors)));
        }

        let payload = self.current.form.to_payload()?;
        tracing::debug!(?payload, key = %self.idempotency_key, "Submitting enrollment");

        next.view = FormView::Submitting;
        next.notice = None;
        self.publish(next);

        let result = self.service.submit(&payload, self.idempotency_key).await;

        let mut next = self.current.clone();
        match result {
            Ok(receipt) => {
                tracing::info!(status = receipt.status, "Enrollment submitted");
                self.lookups.invalidate();
                next.view = FormView::Submitted;
                next.notice = Some(Notice::success(SUBMIT_OK));
                self.publish(next);
                Ok(receipt)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Enrollment submission failed");
                next.view = FormView::Editing;
                next.notice = Some(Notice::error(SUBMIT_FAILED));
                self.publish(next);
                Err(FormError::Submission(e.to_string()))
            }
        }
    }

    // ---- private helpers ----

    fn ensure_editing(&self) -> Result<(), FormError> {
        match self.current.view {
            FormView::Editing => Ok(()),
            FormView::Submitting | FormView::Submitted => Err(FormError::Closed),
        }
    }

    fn publish(&mut self, next: FormSnapshot) {
        self.current = next;
        self.publisher.send_replace(self.current.clone());
    }
}

/// Drop a lookup-derived message from the name field, keeping any
/// validation message.
fn clear_lookup_message(errors: &mut ValidationState) {
    if matches!(
        errors.message(FormField::ChildName),
        Some(NAME_TAKEN) | Some(LOOKUP_FAILED)
    ) {
        errors.clear(FormField::ChildName);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use assert_matches::assert_matches;

    use super::*;
    use crate::types::ClassCode;
    use crate::validation::{NAME_TOO_SHORT, PHONE_INVALID};

    #[derive(Debug, thiserror::Error)]
    #[error("service unavailable")]
    struct Unavailable;

    #[derive(Default)]
    struct FakeService {
        taken: HashSet<String>,
        lookup_fails: bool,
        /// Number of upcoming submits to reject.
        failing_submits: AtomicUsize,
        attempt_keys: Mutex<Vec<Uuid>>,
        lookups: Mutex<Vec<String>>,
        submitted: Mutex<Vec<(EnrollmentPayload, Uuid)>>,
    }

    #[async_trait]
    impl RegistrationService for FakeService {
        type Error = Unavailable;

        async fn check_name_exists(&self, name: &str) -> Result<bool, Unavailable> {
            self.lookups.lock().unwrap().push(name.to_string());
            if self.lookup_fails {
                return Err(Unavailable);
            }
            Ok(self.taken.contains(name))
        }

        async fn submit(
            &self,
            payload: &EnrollmentPayload,
            idempotency_key: Uuid,
        ) -> Result<SubmitReceipt, Unavailable> {
            self.attempt_keys.lock().unwrap().push(idempotency_key);
            let remaining = self.failing_submits.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failing_submits.store(remaining - 1, Ordering::SeqCst);
                return Err(Unavailable);
            }
            self.submitted
                .lock()
                .unwrap()
                .push((payload.clone(), idempotency_key));
            Ok(SubmitReceipt {
                status: 201,
                body: serde_json::json!({"id": 1}),
                received_at: chrono::Utc::now(),
            })
        }
    }

    fn fill(controller: &mut FormController<FakeService>) {
        for edit in [
            FormEdit::ChildName("Ana Souza".into()),
            FormEdit::GuardianPhone("34987654321".into()),
            FormEdit::TransportNote("Não Tem".into()),
            FormEdit::ClassCode(Some(ClassCode::Turma9A)),
        ] {
            controller.edit(edit).unwrap();
        }
    }

    #[test]
    fn starts_editing_with_empty_form() {
        let controller = FormController::new(FakeService::default());
        let snap = controller.snapshot();
        assert_eq!(snap.view, FormView::Editing);
        assert_eq!(snap.form, EnrollmentForm::default());
        assert_eq!(snap.name_check, NameCheck::Unchecked);
        assert!(snap.notice.is_none());
    }

    #[test]
    fn edits_are_published_to_subscribers() {
        let mut controller = FormController::new(FakeService::default());
        let rx = controller.subscribe();
        controller
            .edit(FormEdit::GuardianPhone("349876".into()))
            .unwrap();
        assert_eq!(rx.borrow().form.guardian_phone, "(34) 9876");
    }

    #[test]
    fn blank_name_lookup_is_a_no_op() {
        let mut controller = FormController::new(FakeService::default());
        controller.edit(FormEdit::ChildName("   ".into())).unwrap();
        let before = controller.snapshot().clone();
        assert!(controller.begin_name_lookup().is_none());
        assert_eq!(controller.snapshot(), &before);
    }

    #[tokio::test]
    async fn taken_name_shows_inline_error() {
        let service = FakeService {
            taken: HashSet::from(["Ana Souza".to_string()]),
            ..Default::default()
        };
        let mut controller = FormController::new(service);
        fill(&mut controller);

        let check = controller.check_name().await;
        assert_matches!(check, Some(NameCheck::Taken { .. }));
        assert_eq!(
            controller.snapshot().errors.message(FormField::ChildName),
            Some(NAME_TAKEN)
        );
    }

    #[tokio::test]
    async fn stale_lookup_result_is_discarded() {
        let mut controller = FormController::new(FakeService::default());
        controller.edit(FormEdit::ChildName("Ana".into())).unwrap();
        let first = controller.begin_name_lookup().unwrap();
        let second = controller.begin_name_lookup().unwrap();

        // The later lookup resolves first; the earlier, slower one must not
        // overwrite it.
        assert!(controller.finish_name_lookup(second, Ok(false)));
        assert!(!controller.finish_name_lookup(first, Ok(true)));
        assert_matches!(
            controller.snapshot().name_check,
            NameCheck::Available { .. }
        );
        assert!(controller.snapshot().errors.is_valid());
    }

    #[tokio::test]
    async fn renaming_discards_in_flight_lookup_and_clears_message() {
        let mut controller = FormController::new(FakeService::default());
        controller.edit(FormEdit::ChildName("Ana".into())).unwrap();
        let ticket = controller.begin_name_lookup().unwrap();
        assert!(controller.finish_name_lookup(ticket, Ok(true)));
        assert_eq!(
            controller.snapshot().errors.message(FormField::ChildName),
            Some(NAME_TAKEN)
        );

        let ticket = controller.begin_name_lookup().unwrap();
        controller.edit(FormEdit::ChildName("Ana Maria".into())).unwrap();
        assert!(!controller.finish_name_lookup(ticket, Ok(true)));
        assert_eq!(controller.snapshot().name_check, NameCheck::Unchecked);
        assert!(controller
            .snapshot()
            .errors
            .message(FormField::ChildName)
            .is_none());
    }

    #[tokio::test]
    async fn lookup_failure_is_distinct_from_collision() {
        let service = FakeService {
            lookup_fails: true,
            ..Default::default()
        };
        let mut controller = FormController::new(service);
        fill(&mut controller);

        let check = controller.check_name().await;
        assert_matches!(check, Some(NameCheck::Failed { .. }));
        assert_eq!(
            controller.snapshot().errors.message(FormField::ChildName),
            Some(LOOKUP_FAILED)
        );
    }

    #[tokio::test]
    async fn invalid_form_is_not_submitted_and_reports_all_fields() {
        let mut controller = FormController::new(FakeService::default());
        controller.edit(FormEdit::ChildName("Jo".into())).unwrap();

        let err = controller.submit().await.unwrap_err();
        let snap = controller.snapshot();
        assert_matches!(err, FormError::Validation(ref state) if state.len() == 4);
        assert_eq!(snap.view, FormView::Editing);
        assert_eq!(snap.errors.message(FormField::ChildName), Some(NAME_TOO_SHORT));
        assert_eq!(
            snap.errors.message(FormField::GuardianPhone),
            Some(PHONE_INVALID)
        );
        assert_eq!(snap.notice, Some(Notice::error(FIX_ERRORS)));
        // A malformed name is never sent to the backend.
        assert!(controller.service().lookups.lock().unwrap().is_empty());
        assert!(controller.service().submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn submit_runs_lookup_when_name_never_checked() {
        let service = FakeService {
            taken: HashSet::from(["Ana Souza".to_string()]),
            ..Default::default()
        };
        let mut controller = FormController::new(service);
        fill(&mut controller);

        assert_matches!(controller.submit().await, Err(FormError::NameTaken));
        assert_eq!(controller.snapshot().view, FormView::Editing);
        assert_eq!(
            controller.service().lookups.lock().unwrap().as_slice(),
            ["Ana Souza"]
        );
        assert!(controller.service().submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn submit_skips_lookup_for_confirmed_name() {
        let mut controller = FormController::new(FakeService::default());
        fill(&mut controller);
        controller.check_name().await;
        controller.submit().await.unwrap();
        assert_eq!(controller.service().lookups.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_lookup_blocks_submission() {
        let service = FakeService {
            lookup_fails: true,
            ..Default::default()
        };
        let mut controller = FormController::new(service);
        fill(&mut controller);

        assert_matches!(controller.submit().await, Err(FormError::LookupFailed(_)));
        assert!(controller.service().submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn successful_submit_is_terminal() {
        let mut controller = FormController::new(FakeService::default());
        fill(&mut controller);

        let receipt = controller.submit().await.unwrap();
        assert_eq!(receipt.status, 201);
        assert_eq!(controller.snapshot().view, FormView::Submitted);
        assert_eq!(controller.snapshot().notice, Some(Notice::success(SUBMIT_OK)));

        assert_matches!(
            controller.edit(FormEdit::TransportNote("x".into())),
            Err(FormError::Closed)
        );
        assert_matches!(controller.submit().await, Err(FormError::Closed));
        assert!(controller.begin_name_lookup().is_none());
        assert_eq!(controller.service().submitted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_submit_returns_to_editing_with_values_kept() {
        let service = FakeService {
            failing_submits: AtomicUsize::new(1),
            ..Default::default()
        };
        let mut controller = FormController::new(service);
        fill(&mut controller);
        let form_before = controller.snapshot().form.clone();

        assert_matches!(controller.submit().await, Err(FormError::Submission(_)));
        let snap = controller.snapshot();
        assert_eq!(snap.view, FormView::Editing);
        assert_eq!(snap.form, form_before);
        assert_eq!(snap.notice, Some(Notice::error(SUBMIT_FAILED)));
    }

    #[tokio::test]
    async fn retries_reuse_idempotency_key() {
        let mut controller = FormController::new(FakeService::default());
        fill(&mut controller);
        let key = controller.idempotency_key();
        controller.service().failing_submits.store(1, Ordering::SeqCst);

        assert_matches!(controller.submit().await, Err(FormError::Submission(_)));
        assert_eq!(controller.snapshot().view, FormView::Editing);
        controller.submit().await.unwrap();
        assert_eq!(controller.snapshot().view, FormView::Submitted);

        let service = controller.service();
        assert_eq!(*service.attempt_keys.lock().unwrap(), vec![key, key]);
        let submitted = service.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].1, key);
    }

    #[tokio::test]
    async fn edit_errors_leave_state_unchanged() {
        let mut controller = FormController::new(FakeService::default());
        let before = controller.snapshot().clone();
        assert_matches!(
            controller.edit(FormEdit::RemoveGuardian(0)),
            Err(FormError::Edit(CoreError::Validation(_)))
        );
        assert_eq!(controller.snapshot(), &before);
    }
}
