//! Record forms
//!
//! Provides:
//! - `FormController<S>`: open/edit/validate/submit cycle shared by every entity
//! - `FormSchema`: per-entity draft shape, rules and wire mapping
//! - `FormField`: field names plus a static table of dependent fields
//! - `SubmissionState`: at-most-one in-flight submission per form

pub mod beneficiary;
pub mod crop_status;
pub mod farm_plot;
pub mod seedling;
pub mod state;

pub use beneficiary::{BeneficiaryDraft, BeneficiaryField, BeneficiarySchema};
pub use crop_status::{CropStatusDraft, CropStatusField, CropStatusSchema};
pub use farm_plot::{FarmPlotDraft, FarmPlotField, FarmPlotSchema};
pub use seedling::{SeedlingDraft, SeedlingField, SeedlingSchema};
pub use state::{SubmissionState, SubmitError};

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::DashboardApi;
use crate::error::ApiResult;
use crate::lookup::BeneficiaryIndex;
use crate::models::dates;

/// Field name → message; empty means valid
pub type FieldErrors = BTreeMap<&'static str, String>;

/// A named input on an entity form
pub trait FormField: Copy + Eq + Debug + Send + Sync + 'static {
    /// Fields cleared whenever the key field changes
    const DEPENDENCIES: &'static [(Self, &'static [Self])];

    /// Wire/camelCase name, also the key in [`FieldErrors`]
    fn name(self) -> &'static str;

    fn dependents(self) -> &'static [Self] {
        Self::DEPENDENCIES
            .iter()
            .find(|(field, _)| *field == self)
            .map(|(_, deps)| *deps)
            .unwrap_or(&[])
    }
}

/// Data a form needs besides its own draft
#[derive(Debug, Clone)]
pub struct FormContext {
    /// Currently loaded beneficiaries, for name → id resolution
    pub beneficiaries: BeneficiaryIndex,
    pub today: NaiveDate,
}

impl FormContext {
    pub fn new(beneficiaries: BeneficiaryIndex) -> Self {
        Self {
            beneficiaries,
            today: dates::today(),
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }
}

impl Default for FormContext {
    fn default() -> Self {
        Self::new(BeneficiaryIndex::default())
    }
}

/// Add/edit target of an open form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormMode {
    #[default]
    Closed,
    Add,
    Edit { id: String },
}

impl FormMode {
    pub fn is_open(&self) -> bool {
        !matches!(self, FormMode::Closed)
    }
}

/// Entity-specific half of a form
#[async_trait]
pub trait FormSchema: Send + Sync + 'static {
    type Entity: Clone + Send + Sync;
    type Draft: Clone + Default + Debug + PartialEq + Send + Sync;
    type Field: FormField;
    type Payload: Send + Sync;

    const LABEL: &'static str;

    fn entity_id(entity: &Self::Entity) -> &str;

    /// Fresh draft for add mode
    fn new_draft(_ctx: &FormContext) -> Self::Draft {
        Self::Draft::default()
    }

    /// Draft for edit mode, with dates normalized and lookups resolved
    fn draft_from(entity: &Self::Entity, ctx: &FormContext) -> Self::Draft;

    fn write(draft: &mut Self::Draft, field: Self::Field, value: &str);

    /// Recompute derived fields after `field` changed
    fn derive(_draft: &mut Self::Draft, _field: Self::Field, _ctx: &FormContext) {}

    fn validate(draft: &Self::Draft, ctx: &FormContext) -> FieldErrors;

    /// Coerce a validated draft into the wire payload
    fn to_payload(draft: &Self::Draft, ctx: &FormContext) -> Result<Self::Payload, FieldErrors>;

    /// Create when `id` is `None`, update otherwise
    async fn send(
        api: &dyn DashboardApi,
        id: Option<&str>,
        payload: &Self::Payload,
    ) -> ApiResult<Self::Entity>;
}

/// Generic add/edit form state
pub struct FormController<S: FormSchema> {
    api: Arc<dyn DashboardApi>,
    context: FormContext,
    mode: FormMode,
    draft: S::Draft,
    errors: FieldErrors,
    state: SubmissionState,
}

impl<S: FormSchema> FormController<S> {
    pub fn new(api: Arc<dyn DashboardApi>, context: FormContext) -> Self {
        Self {
            api,
            context,
            mode: FormMode::Closed,
            draft: S::Draft::default(),
            errors: FieldErrors::new(),
            state: SubmissionState::Idle,
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn draft(&self) -> &S::Draft {
        &self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn context(&self) -> &FormContext {
        &self.context
    }

    /// Inputs, close and submit are disabled while submitting
    pub fn is_disabled(&self) -> bool {
        self.state.is_submitting()
    }

    /// Replace the lookup set (e.g. after the beneficiary list refreshed)
    pub fn set_beneficiaries(&mut self, beneficiaries: BeneficiaryIndex) {
        self.context.beneficiaries = beneficiaries;
    }

    /// `None` opens add mode with defaults; `Some` opens edit mode
    pub fn open(&mut self, entity: Option<&S::Entity>) -> Result<(), SubmitError> {
        if self.state.is_submitting() {
            return Err(SubmitError::Busy);
        }
        match entity {
            Some(entity) => {
                self.mode = FormMode::Edit {
                    id: S::entity_id(entity).to_string(),
                };
                self.draft = S::draft_from(entity, &self.context);
            }
            None => {
                self.mode = FormMode::Add;
                self.draft = S::new_draft(&self.context);
            }
        }
        self.errors.clear();
        self.state = SubmissionState::Idle;
        debug!(form = S::LABEL, mode = ?self.mode, "Form opened");
        Ok(())
    }

    /// Refused while a submission is in flight
    pub fn close(&mut self) -> Result<(), SubmitError> {
        if self.state.is_submitting() {
            return Err(SubmitError::Busy);
        }
        self.reset();
        Ok(())
    }

    fn reset(&mut self) {
        self.mode = FormMode::Closed;
        self.draft = S::Draft::default();
        self.errors.clear();
        self.state = SubmissionState::Idle;
    }

    fn ensure_editable(&self) -> Result<(), SubmitError> {
        if !self.mode.is_open() {
            return Err(SubmitError::Closed);
        }
        if self.state.is_submitting() {
            return Err(SubmitError::Busy);
        }
        Ok(())
    }

    /// Mutable draft access for entity-specific editors
    pub(crate) fn edit_draft(&mut self) -> Result<&mut S::Draft, SubmitError> {
        self.ensure_editable()?;
        Ok(&mut self.draft)
    }

    pub(crate) fn errors_mut(&mut self) -> &mut FieldErrors {
        &mut self.errors
    }

    /// Update one field, clear its error and reset its dependents
    pub fn set_field(&mut self, field: S::Field, value: &str) -> Result<(), SubmitError> {
        self.ensure_editable()?;
        S::write(&mut self.draft, field, value);
        for dependent in field.dependents() {
            S::write(&mut self.draft, *dependent, "");
        }
        S::derive(&mut self.draft, field, &self.context);

        self.errors.remove(field.name());
        for dependent in field.dependents() {
            self.errors.remove(dependent.name());
        }
        Ok(())
    }

    /// Pure check of the current draft
    pub fn validate(&self) -> FieldErrors {
        S::validate(&self.draft, &self.context)
    }

    /// Blur-time check of a single field; updates the shown error
    pub fn validate_field(&mut self, field: S::Field) -> Option<String> {
        let name = field.name();
        match self.validate().remove(name) {
            Some(message) => {
                self.errors.insert(name, message.clone());
                Some(message)
            }
            None => {
                self.errors.remove(name);
                None
            }
        }
    }

    /// Validate, then create or update.
    ///
    /// Invalid drafts never reach the network. On success the form closes and
    /// the saved entity is returned; on failure the draft is kept.
    pub async fn submit(&mut self) -> Result<S::Entity, SubmitError> {
        let id = match &self.mode {
            FormMode::Closed => return Err(SubmitError::Closed),
            FormMode::Add => None,
            FormMode::Edit { id } => Some(id.clone()),
        };
        if self.state.is_submitting() {
            return Err(SubmitError::Busy);
        }

        let errors = self.validate();
        let payload = if errors.is_empty() {
            S::to_payload(&self.draft, &self.context)
        } else {
            Err(errors)
        };
        let payload = match payload {
            Ok(payload) => payload,
            Err(errors) => {
                debug!(form = S::LABEL, fields = ?errors.keys().collect::<Vec<_>>(), "Validation failed");
                self.errors = errors.clone();
                return Err(SubmitError::Invalid(errors));
            }
        };

        self.errors.clear();
        self.state.begin()?;
        let result = S::send(self.api.as_ref(), id.as_deref(), &payload).await;

        match result {
            Ok(entity) => {
                info!(form = S::LABEL, id = S::entity_id(&entity), "Saved");
                self.reset();
                Ok(entity)
            }
            Err(e) => {
                warn!(form = S::LABEL, status = e.status, error = %e, "Submission failed");
                self.state.fail(e.message.clone());
                Err(SubmitError::Api(e))
            }
        }
    }
}

// ==================== Draft Parsing Helpers ====================

pub(crate) fn required(errors: &mut FieldErrors, field: &'static str, value: &str, label: &str) -> bool {
    if value.trim().is_empty() {
        errors.insert(field, format!("{} is required", label));
        return false;
    }
    true
}

/// Non-negative whole number
pub(crate) fn parse_count(value: &str) -> Option<u32> {
    value.trim().parse().ok()
}

/// Signed whole number, so negatives can be reported as such
pub(crate) fn parse_signed(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

pub(crate) fn parse_decimal(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub(crate) fn optional_date(
    errors: &mut FieldErrors,
    field: &'static str,
    value: &str,
) -> Option<NaiveDate> {
    if value.trim().is_empty() {
        return None;
    }
    let parsed = dates::parse_date(value);
    if parsed.is_none() {
        errors.insert(field, "Enter a valid date".to_string());
    }
    parsed
}

pub(crate) fn required_date(
    errors: &mut FieldErrors,
    field: &'static str,
    value: &str,
    label: &str,
) -> Option<NaiveDate> {
    if !required(errors, field, value, label) {
        return None;
    }
    optional_date(errors, field, value)
}

/// Resolve a picked beneficiary name to `(business key, picture)`
pub(crate) fn link_beneficiary(ctx: &FormContext, name: &str) -> (String, String) {
    ctx.beneficiaries
        .find_by_name(name)
        .map(|b| (b.beneficiary_id.clone(), b.picture.clone().unwrap_or_default()))
        .unwrap_or_default()
}

/// Full name and picture shown for an existing record's beneficiary
pub(crate) fn linked_display(ctx: &FormContext, beneficiary_id: &str) -> (String, String) {
    ctx.beneficiaries
        .get(beneficiary_id)
        .map(|b| (b.full_name(), b.picture.clone().unwrap_or_default()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum NoteField {
        Topic,
        Detail,
        Body,
    }

    impl FormField for NoteField {
        const DEPENDENCIES: &'static [(Self, &'static [Self])] = &[(NoteField::Topic, &[NoteField::Detail])];

        fn name(self) -> &'static str {
            match self {
                NoteField::Topic => "topic",
                NoteField::Detail => "detail",
                NoteField::Body => "body",
            }
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct NoteDraft {
        topic: String,
        detail: String,
        body: String,
    }

    struct NoteSchema;

    #[async_trait]
    impl FormSchema for NoteSchema {
        type Entity = (String, String);
        type Draft = NoteDraft;
        type Field = NoteField;
        type Payload = String;

        const LABEL: &'static str = "note";

        fn entity_id(entity: &Self::Entity) -> &str {
            &entity.0
        }

        fn draft_from(entity: &Self::Entity, _ctx: &FormContext) -> Self::Draft {
            NoteDraft {
                body: entity.1.clone(),
                ..Default::default()
            }
        }

        fn write(draft: &mut Self::Draft, field: Self::Field, value: &str) {
            let slot = match field {
                NoteField::Topic => &mut draft.topic,
                NoteField::Detail => &mut draft.detail,
                NoteField::Body => &mut draft.body,
            };
            *slot = value.to_string();
        }

        fn validate(draft: &Self::Draft, _ctx: &FormContext) -> FieldErrors {
            let mut errors = FieldErrors::new();
            required(&mut errors, "body", &draft.body, "Body");
            errors
        }

        fn to_payload(draft: &Self::Draft, _ctx: &FormContext) -> Result<Self::Payload, FieldErrors> {
            Ok(draft.body.clone())
        }

        async fn send(
            api: &dyn DashboardApi,
            id: Option<&str>,
            payload: &Self::Payload,
        ) -> ApiResult<Self::Entity> {
            // Piggyback on a real call so failures can be injected
            api.statistics().await?;
            Ok((id.unwrap_or("new").to_string(), payload.clone()))
        }
    }

    fn controller(api: Arc<crate::api::MockApi>) -> FormController<NoteSchema> {
        FormController::new(api, FormContext::default())
    }

    #[test]
    fn test_dependency_table_lookup() {
        assert_eq!(NoteField::Topic.dependents(), &[NoteField::Detail]);
        assert!(NoteField::Body.dependents().is_empty());
    }

    #[tokio::test]
    async fn test_set_field_clears_errors_and_dependents() {
        let api = Arc::new(crate::api::MockApi::new());
        let mut form = controller(api);
        assert_eq!(form.set_field(NoteField::Body, "x"), Err(SubmitError::Closed));

        form.open(None).unwrap();
        form.set_field(NoteField::Topic, "a").unwrap();
        form.set_field(NoteField::Detail, "b").unwrap();
        assert!(matches!(form.submit().await, Err(SubmitError::Invalid(_))));
        assert!(form.errors().contains_key("body"));

        form.set_field(NoteField::Body, "hello").unwrap();
        assert!(form.errors().is_empty());

        form.set_field(NoteField::Topic, "c").unwrap();
        assert_eq!(form.draft().detail, "");
        assert_eq!(form.draft().body, "hello");
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_draft_open() {
        let api = Arc::new(crate::api::MockApi::new());
        api.fail_next(crate::api::MockOp::Statistics, ApiError::no_response("offline"));
        let mut form = controller(api.clone());

        form.open(Some(&("n1".to_string(), "text".to_string()))).unwrap();
        let err = form.submit().await.unwrap_err();
        assert_eq!(err, SubmitError::Api(ApiError::no_response("offline")));
        assert_eq!(form.state().error(), Some("offline"));
        assert_eq!(form.mode(), &FormMode::Edit { id: "n1".into() });
        assert_eq!(form.draft().body, "text");

        let saved = form.submit().await.unwrap();
        assert_eq!(saved, ("n1".to_string(), "text".to_string()));
        assert_eq!(form.mode(), &FormMode::Closed);
        assert_eq!(form.state(), &SubmissionState::Idle);
    }

    #[tokio::test]
    async fn test_validate_field_only_touches_that_field() {
        let mut form = controller(Arc::new(crate::api::MockApi::new()));
        form.open(None).unwrap();

        assert_eq!(form.validate_field(NoteField::Topic), None);
        assert_eq!(form.validate_field(NoteField::Body), Some("Body is required".into()));
        assert_eq!(form.errors().len(), 1);
        assert_eq!(form.validate().len(), 1);
    }
}
