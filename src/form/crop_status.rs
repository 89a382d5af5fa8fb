//! Crop survival survey form
//!
//! Pictures are tracked as two lists: filenames the server already stores
//! (`existing_pictures`) and new selections (`new_pictures`). They are sent
//! separately and together may not exceed [`MAX_CROP_PICTURES`].

use async_trait::async_trait;
use tracing::debug;

use super::{
    link_beneficiary, linked_display, parse_signed, required, required_date, FieldErrors,
    FormContext, FormController, FormField, FormSchema, SubmitError,
};
use crate::api::DashboardApi;
use crate::error::ApiResult;
use crate::models::dates;
use crate::models::{Attachment, CropStatusPayload, CropStatusRecord, MAX_CROP_PICTURES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CropStatusField {
    BeneficiaryName,
    BeneficiaryId,
    BeneficiaryPicture,
    SurveyDate,
    Surveyer,
    AliveCrops,
    DeadCrops,
    Plot,
    Pictures,
}

impl FormField for CropStatusField {
    const DEPENDENCIES: &'static [(Self, &'static [Self])] = &[(
        CropStatusField::BeneficiaryName,
        &[CropStatusField::BeneficiaryId, CropStatusField::BeneficiaryPicture],
    )];

    fn name(self) -> &'static str {
        match self {
            CropStatusField::BeneficiaryName => "beneficiaryName",
            CropStatusField::BeneficiaryId => "beneficiaryId",
            CropStatusField::BeneficiaryPicture => "beneficiaryPicture",
            CropStatusField::SurveyDate => "surveyDate",
            CropStatusField::Surveyer => "surveyer",
            CropStatusField::AliveCrops => "aliveCrops",
            CropStatusField::DeadCrops => "deadCrops",
            CropStatusField::Plot => "plot",
            CropStatusField::Pictures => "pictures",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CropStatusDraft {
    pub beneficiary_name: String,
    pub beneficiary_id: String,
    pub beneficiary_picture: String,
    pub survey_date: String,
    pub surveyer: String,
    pub alive_crops: String,
    /// Empty means zero
    pub dead_crops: String,
    pub plot: String,
    pub existing_pictures: Vec<String>,
    pub new_pictures: Vec<Attachment>,
}

impl CropStatusDraft {
    pub fn preview_count(&self) -> usize {
        self.existing_pictures.len() + self.new_pictures.len()
    }
}

fn too_many_pictures() -> String {
    format!("You can attach at most {} pictures", MAX_CROP_PICTURES)
}

fn dead_crops(raw: &str) -> Option<i64> {
    if raw.trim().is_empty() {
        Some(0)
    } else {
        parse_signed(raw)
    }
}

pub struct CropStatusSchema;

#[async_trait]
impl FormSchema for CropStatusSchema {
    type Entity = CropStatusRecord;
    type Draft = CropStatusDraft;
    type Field = CropStatusField;
    type Payload = CropStatusPayload;

    const LABEL: &'static str = "crop status";

    fn entity_id(entity: &CropStatusRecord) -> &str {
        &entity.id
    }

    fn draft_from(entity: &CropStatusRecord, ctx: &FormContext) -> CropStatusDraft {
        let (beneficiary_name, beneficiary_picture) = linked_display(ctx, &entity.beneficiary_id);
        CropStatusDraft {
            beneficiary_name,
            beneficiary_id: entity.beneficiary_id.clone(),
            beneficiary_picture,
            survey_date: entity.survey_date.map(dates::format_date).unwrap_or_default(),
            surveyer: entity.surveyer.clone(),
            alive_crops: entity.alive_crops.to_string(),
            dead_crops: entity.dead_crops.to_string(),
            plot: entity.plot.clone().unwrap_or_default(),
            existing_pictures: entity.pictures.clone(),
            new_pictures: Vec::new(),
        }
    }

    fn write(draft: &mut CropStatusDraft, field: CropStatusField, value: &str) {
        let slot = match field {
            CropStatusField::BeneficiaryName => &mut draft.beneficiary_name,
            CropStatusField::BeneficiaryId => &mut draft.beneficiary_id,
            CropStatusField::BeneficiaryPicture => &mut draft.beneficiary_picture,
            CropStatusField::SurveyDate => &mut draft.survey_date,
            CropStatusField::Surveyer => &mut draft.surveyer,
            CropStatusField::AliveCrops => &mut draft.alive_crops,
            CropStatusField::DeadCrops => &mut draft.dead_crops,
            CropStatusField::Plot => &mut draft.plot,
            // Pictures are edited through the attachment methods
            CropStatusField::Pictures => return,
        };
        *slot = value.to_string();
    }

    fn derive(draft: &mut CropStatusDraft, field: CropStatusField, ctx: &FormContext) {
        if field == CropStatusField::BeneficiaryName {
            let (id, picture) = link_beneficiary(ctx, &draft.beneficiary_name);
            draft.beneficiary_id = id;
            draft.beneficiary_picture = picture;
        }
    }

    fn validate(draft: &CropStatusDraft, _ctx: &FormContext) -> FieldErrors {
        let mut errors = FieldErrors::new();

        if draft.beneficiary_id.trim().is_empty() {
            errors.insert("beneficiaryName", "Select a beneficiary".to_string());
        }
        required_date(&mut errors, "surveyDate", &draft.survey_date, "Survey date");
        required(&mut errors, "surveyer", &draft.surveyer, "Surveyer");

        if required(&mut errors, "aliveCrops", &draft.alive_crops, "Alive crops") {
            match parse_signed(&draft.alive_crops) {
                Some(alive) if alive > 0 => {}
                Some(_) => {
                    errors.insert("aliveCrops", "Alive crops must be greater than 0".to_string());
                }
                None => {
                    errors.insert("aliveCrops", "Enter a whole number".to_string());
                }
            }
        }

        match dead_crops(&draft.dead_crops) {
            Some(dead) if dead < 0 => {
                errors.insert("deadCrops", "Dead crops cannot be negative".to_string());
            }
            Some(_) => {}
            None => {
                errors.insert("deadCrops", "Enter a whole number".to_string());
            }
        }

        if draft.preview_count() > MAX_CROP_PICTURES {
            errors.insert("pictures", too_many_pictures());
        }

        errors
    }

    fn to_payload(draft: &CropStatusDraft, _ctx: &FormContext) -> Result<CropStatusPayload, FieldErrors> {
        let alive = parse_signed(&draft.alive_crops).and_then(|v| u32::try_from(v).ok());
        let dead = dead_crops(&draft.dead_crops).and_then(|v| u32::try_from(v).ok());
        let survey_date = dates::parse_date(&draft.survey_date);

        match (alive, dead, survey_date) {
            (Some(alive_crops), Some(dead_crops), Some(survey_date)) => Ok(CropStatusPayload {
                beneficiary_id: draft.beneficiary_id.trim().to_string(),
                survey_date,
                surveyer: draft.surveyer.trim().to_string(),
                alive_crops,
                dead_crops,
                plot: Some(draft.plot.trim().to_string()).filter(|p| !p.is_empty()),
                existing_pictures: draft.existing_pictures.clone(),
                pictures: draft.new_pictures.clone(),
            }),
            _ => {
                let mut errors = FieldErrors::new();
                errors.insert("aliveCrops", "Enter valid crop counts".to_string());
                Err(errors)
            }
        }
    }

    async fn send(
        api: &dyn DashboardApi,
        id: Option<&str>,
        payload: &CropStatusPayload,
    ) -> ApiResult<CropStatusRecord> {
        match id {
            Some(id) => api.update_crop_status(id, payload).await,
            None => api.create_crop_status(payload).await,
        }
    }
}

impl FormController<CropStatusSchema> {
    /// Add new picture selections up to the cap.
    ///
    /// Files past the cap are dropped and reported on the `pictures` field.
    /// Returns how many were accepted.
    pub fn add_pictures(&mut self, files: Vec<Attachment>) -> Result<usize, SubmitError> {
        let draft = self.edit_draft()?;
        let room = MAX_CROP_PICTURES.saturating_sub(draft.preview_count());
        let offered = files.len();
        draft.new_pictures.extend(files.into_iter().take(room));
        let accepted = offered.min(room);

        if accepted < offered {
            debug!(offered, accepted, "Picture selection exceeds cap");
            self.errors_mut().insert("pictures", too_many_pictures());
        } else {
            self.errors_mut().remove("pictures");
        }
        Ok(accepted)
    }

    /// Drop a stored picture so it is not kept on update
    pub fn remove_existing_picture(&mut self, index: usize) -> Result<Option<String>, SubmitError> {
        let draft = self.edit_draft()?;
        let removed = (index < draft.existing_pictures.len()).then(|| draft.existing_pictures.remove(index));
        self.errors_mut().remove("pictures");
        Ok(removed)
    }

    pub fn remove_new_picture(&mut self, index: usize) -> Result<Option<Attachment>, SubmitError> {
        let draft = self.edit_draft()?;
        let removed = (index < draft.new_pictures.len()).then(|| draft.new_pictures.remove(index));
        self.errors_mut().remove("pictures");
        Ok(removed)
    }

    pub fn preview_count(&self) -> usize {
        self.draft().preview_count()
    }
}
