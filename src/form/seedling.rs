//! Seedling distribution form

use async_trait::async_trait;

use super::{
    link_beneficiary, linked_display, optional_date, parse_count, parse_decimal, required,
    required_date, FieldErrors, FormContext, FormField, FormSchema,
};
use crate::api::DashboardApi;
use crate::error::ApiResult;
use crate::models::dates;
use crate::models::{SeedlingPayload, SeedlingRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeedlingField {
    BeneficiaryName,
    BeneficiaryId,
    BeneficiaryPicture,
    Received,
    Planted,
    Hectares,
    Plot,
    DateOfPlantingStart,
    DateOfPlantingEnd,
    DateReceived,
}

impl FormField for SeedlingField {
    const DEPENDENCIES: &'static [(Self, &'static [Self])] = &[(
        SeedlingField::BeneficiaryName,
        &[SeedlingField::BeneficiaryId, SeedlingField::BeneficiaryPicture],
    )];

    fn name(self) -> &'static str {
        match self {
            SeedlingField::BeneficiaryName => "beneficiaryName",
            SeedlingField::BeneficiaryId => "beneficiaryId",
            SeedlingField::BeneficiaryPicture => "beneficiaryPicture",
            SeedlingField::Received => "received",
            SeedlingField::Planted => "planted",
            SeedlingField::Hectares => "hectares",
            SeedlingField::Plot => "plot",
            SeedlingField::DateOfPlantingStart => "dateOfPlantingStart",
            SeedlingField::DateOfPlantingEnd => "dateOfPlantingEnd",
            SeedlingField::DateReceived => "dateReceived",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedlingDraft {
    pub beneficiary_name: String,
    pub beneficiary_id: String,
    pub beneficiary_picture: String,
    pub received: String,
    pub planted: String,
    pub hectares: String,
    pub plot: String,
    pub date_of_planting_start: String,
    pub date_of_planting_end: String,
    pub date_received: String,
}

pub struct SeedlingSchema;

#[async_trait]
impl FormSchema for SeedlingSchema {
    type Entity = SeedlingRecord;
    type Draft = SeedlingDraft;
    type Field = SeedlingField;
    type Payload = SeedlingPayload;

    const LABEL: &'static str = "seedling";

    fn entity_id(entity: &SeedlingRecord) -> &str {
        &entity.id
    }

    fn draft_from(entity: &SeedlingRecord, ctx: &FormContext) -> SeedlingDraft {
        let (beneficiary_name, beneficiary_picture) = linked_display(ctx, &entity.beneficiary_id);
        let date = |d: Option<chrono::NaiveDate>| d.map(dates::format_date).unwrap_or_default();
        SeedlingDraft {
            beneficiary_name,
            beneficiary_id: entity.beneficiary_id.clone(),
            beneficiary_picture,
            received: entity.received.to_string(),
            planted: entity.planted.to_string(),
            hectares: entity.hectares.to_string(),
            plot: entity.plot.clone(),
            date_of_planting_start: date(entity.date_of_planting_start),
            date_of_planting_end: date(entity.date_of_planting_end),
            date_received: date(entity.date_received),
        }
    }

    fn write(draft: &mut SeedlingDraft, field: SeedlingField, value: &str) {
        let slot = match field {
            SeedlingField::BeneficiaryName => &mut draft.beneficiary_name,
            SeedlingField::BeneficiaryId => &mut draft.beneficiary_id,
            SeedlingField::BeneficiaryPicture => &mut draft.beneficiary_picture,
            SeedlingField::Received => &mut draft.received,
            SeedlingField::Planted => &mut draft.planted,
            SeedlingField::Hectares => &mut draft.hectares,
            SeedlingField::Plot => &mut draft.plot,
            SeedlingField::DateOfPlantingStart => &mut draft.date_of_planting_start,
            SeedlingField::DateOfPlantingEnd => &mut draft.date_of_planting_end,
            SeedlingField::DateReceived => &mut draft.date_received,
        };
        *slot = value.to_string();
    }

    fn derive(draft: &mut SeedlingDraft, field: SeedlingField, ctx: &FormContext) {
        if field == SeedlingField::BeneficiaryName {
            let (id, picture) = link_beneficiary(ctx, &draft.beneficiary_name);
            draft.beneficiary_id = id;
            draft.beneficiary_picture = picture;
        }
    }

    fn validate(draft: &SeedlingDraft, _ctx: &FormContext) -> FieldErrors {
        let mut errors = FieldErrors::new();

        if draft.beneficiary_id.trim().is_empty() {
            errors.insert("beneficiaryName", "Select a beneficiary".to_string());
        }

        let received = if required(&mut errors, "received", &draft.received, "Seedlings received") {
            let parsed = parse_count(&draft.received);
            if parsed.is_none() {
                errors.insert("received", "Enter a whole number".to_string());
            }
            parsed
        } else {
            None
        };

        if required(&mut errors, "planted", &draft.planted, "Seedlings planted") {
            match (parse_count(&draft.planted), received) {
                (None, _) => {
                    errors.insert("planted", "Enter a whole number".to_string());
                }
                (Some(planted), Some(received)) if planted > received => {
                    errors.insert("planted", "Planted cannot exceed received".to_string());
                }
                _ => {}
            }
        }

        if required(&mut errors, "hectares", &draft.hectares, "Hectares") {
            match parse_decimal(&draft.hectares) {
                Some(hectares) if hectares > 0.0 => {}
                _ => {
                    errors.insert("hectares", "Hectares must be greater than 0".to_string());
                }
            }
        }

        required(&mut errors, "plot", &draft.plot, "Plot");

        let start = required_date(
            &mut errors,
            "dateOfPlantingStart",
            &draft.date_of_planting_start,
            "Planting start date",
        );
        let end = optional_date(&mut errors, "dateOfPlantingEnd", &draft.date_of_planting_end);
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                errors.insert(
                    "dateOfPlantingEnd",
                    "End date cannot be before start date".to_string(),
                );
            }
        }
        optional_date(&mut errors, "dateReceived", &draft.date_received);

        errors
    }

    fn to_payload(draft: &SeedlingDraft, _ctx: &FormContext) -> Result<SeedlingPayload, FieldErrors> {
        let mut errors = FieldErrors::new();
        let received = parse_count(&draft.received);
        let planted = parse_count(&draft.planted);
        let hectares = parse_decimal(&draft.hectares);
        let start = dates::parse_date(&draft.date_of_planting_start);

        match (received, planted, hectares, start) {
            (Some(received), Some(planted), Some(hectares), Some(start)) => Ok(SeedlingPayload {
                beneficiary_id: draft.beneficiary_id.trim().to_string(),
                received,
                planted,
                hectares,
                plot: draft.plot.trim().to_string(),
                date_of_planting_start: start,
                date_of_planting_end: dates::parse_date(&draft.date_of_planting_end),
                date_received: dates::parse_date(&draft.date_received),
            }),
            _ => {
                errors.insert("received", "Enter valid numbers and dates".to_string());
                Err(errors)
            }
        }
    }

    async fn send(
        api: &dyn DashboardApi,
        id: Option<&str>,
        payload: &SeedlingPayload,
    ) -> ApiResult<SeedlingRecord> {
        match id {
            Some(id) => api.update_seedling(id, payload).await,
            None => api.create_seedling(payload).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockApi, MockOp};
    use crate::form::{FormController, SubmitError};
    use crate::lookup::BeneficiaryIndex;
    use crate::models::Beneficiary;
    use std::sync::Arc;

    fn juan() -> Beneficiary {
        serde_json::from_value(serde_json::json!({
            "_id": "b1",
            "beneficiaryId": "BEN-0001",
            "firstName": "Juan",
            "lastName": "Dela Cruz",
            "picture": "/uploads/juan.jpg"
        }))
        .unwrap()
    }

    fn setup() -> (FormController<SeedlingSchema>, Arc<MockApi>) {
        let api = Arc::new(MockApi::new().with_beneficiaries(vec![juan()]));
        let ctx = FormContext::new(BeneficiaryIndex::new(vec![juan()]));
        let mut form = FormController::new(api.clone(), ctx);
        form.open(None).unwrap();
        (form, api)
    }

    fn fill(form: &mut FormController<SeedlingSchema>, received: &str, planted: &str, hectares: &str) {
        use SeedlingField::*;
        for (field, value) in [
            (BeneficiaryName, "Juan Dela Cruz"),
            (Received, received),
            (Planted, planted),
            (Hectares, hectares),
            (Plot, "Plot A"),
            (DateOfPlantingStart, "2024-03-01"),
        ] {
            form.set_field(field, value).unwrap();
        }
    }

    #[test]
    fn test_name_resolves_id_and_picture() {
        let (mut form, _) = setup();
        form.set_field(SeedlingField::BeneficiaryName, "juan dela cruz").unwrap();
        assert_eq!(form.draft().beneficiary_id, "BEN-0001");
        assert_eq!(form.draft().beneficiary_picture, "/uploads/juan.jpg");

        form.set_field(SeedlingField::BeneficiaryName, "Nobody").unwrap();
        assert_eq!(form.draft().beneficiary_id, "");
        assert_eq!(form.draft().beneficiary_picture, "");
    }

    #[tokio::test]
    async fn test_planted_over_received_is_rejected() {
        let (mut form, api) = setup();
        fill(&mut form, "100", "120", "1.5");

        let err = form.submit().await.unwrap_err();
        let SubmitError::Invalid(errors) = err else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.get("planted").map(String::as_str), Some("Planted cannot exceed received"));
        assert_eq!(api.calls(MockOp::CreateSeedling), 0);
    }

    #[test]
    fn test_hectares_and_date_range_rules() {
        let (mut form, _) = setup();
        fill(&mut form, "100", "80", "0");
        form.set_field(SeedlingField::DateOfPlantingEnd, "2024-02-01").unwrap();

        let errors = form.validate();
        assert!(errors.contains_key("hectares"));
        assert_eq!(
            errors.get("dateOfPlantingEnd").map(String::as_str),
            Some("End date cannot be before start date")
        );

        form.set_field(SeedlingField::Hectares, "-2").unwrap();
        assert!(form.validate().contains_key("hectares"));
    }

    #[tokio::test]
    async fn test_valid_submit_coerces_numbers() {
        let (mut form, api) = setup();
        fill(&mut form, "100", "80", "1.5");
        form.set_field(SeedlingField::DateOfPlantingEnd, "2024-03-10").unwrap();

        let saved = form.submit().await.unwrap();
        assert_eq!(saved.received, 100);
        assert_eq!(saved.planted, 80);
        assert_eq!(saved.hectares, 1.5);
        assert_eq!(saved.unplanted(), 20);
        assert_eq!(api.seedlings().len(), 1);
    }

    #[test]
    fn test_edit_draft_resolves_name() {
        let record: SeedlingRecord = serde_json::from_value(serde_json::json!({
            "_id": "s1",
            "beneficiaryId": "BEN-0001",
            "received": 50,
            "planted": 40,
            "hectares": 2.0,
            "plot": "B",
            "dateOfPlantingStart": "2024-01-05T00:00:00.000Z"
        }))
        .unwrap();
        let (mut form, _) = setup();
        form.open(Some(&record)).unwrap();
        assert_eq!(form.draft().beneficiary_name, "Juan Dela Cruz");
        assert_eq!(form.draft().date_of_planting_start, "2024-01-05");
        assert_eq!(form.draft().hectares, "2");
    }
}
