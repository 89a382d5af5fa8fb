//! Beneficiary registration form

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

use super::{required, required_date, FieldErrors, FormContext, FormController, FormField, FormSchema, SubmitError};
use crate::address::AddressCascade;
use crate::api::DashboardApi;
use crate::error::ApiResult;
use crate::models::dates::{self, age_on};
use crate::models::{Attachment, Beneficiary, BeneficiaryPayload, Gender, MaritalStatus};

/// Philippine mobile number: `09` followed by nine digits
fn is_cellphone(value: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^09\d{9}$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(value))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BeneficiaryField {
    FirstName,
    MiddleName,
    LastName,
    Purok,
    Barangay,
    Municipality,
    Province,
    Gender,
    BirthDate,
    MaritalStatus,
    Cellphone,
}

impl FormField for BeneficiaryField {
    const DEPENDENCIES: &'static [(Self, &'static [Self])] = &[
        (
            BeneficiaryField::Province,
            &[BeneficiaryField::Municipality, BeneficiaryField::Barangay],
        ),
        (BeneficiaryField::Municipality, &[BeneficiaryField::Barangay]),
    ];

    fn name(self) -> &'static str {
        match self {
            BeneficiaryField::FirstName => "firstName",
            BeneficiaryField::MiddleName => "middleName",
            BeneficiaryField::LastName => "lastName",
            BeneficiaryField::Purok => "purok",
            BeneficiaryField::Barangay => "barangay",
            BeneficiaryField::Municipality => "municipality",
            BeneficiaryField::Province => "province",
            BeneficiaryField::Gender => "gender",
            BeneficiaryField::BirthDate => "birthDate",
            BeneficiaryField::MaritalStatus => "maritalStatus",
            BeneficiaryField::Cellphone => "cellphone",
        }
    }
}

/// Beneficiary form draft, as typed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeneficiaryDraft {
    /// Empty in add mode; the server generates it on submit
    pub beneficiary_id: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub purok: String,
    pub barangay: String,
    pub municipality: String,
    pub province: String,
    pub gender: String,
    pub birth_date: String,
    pub marital_status: String,
    pub cellphone: String,
    /// Newly picked picture
    pub picture: Option<Attachment>,
    /// Stored picture path in edit mode
    pub existing_picture: Option<String>,
}

impl BeneficiaryDraft {
    /// Age from the typed birth date; `None` when missing or out of range
    pub fn age_on(&self, today: chrono::NaiveDate) -> Option<u32> {
        dates::parse_date(&self.birth_date).and_then(|birth| age_on(birth, today))
    }
}

pub struct BeneficiarySchema;

#[async_trait]
impl FormSchema for BeneficiarySchema {
    type Entity = Beneficiary;
    type Draft = BeneficiaryDraft;
    type Field = BeneficiaryField;
    type Payload = BeneficiaryPayload;

    const LABEL: &'static str = "beneficiary";

    fn entity_id(entity: &Beneficiary) -> &str {
        &entity.id
    }

    fn new_draft(_ctx: &FormContext) -> BeneficiaryDraft {
        BeneficiaryDraft {
            gender: Gender::Male.to_string(),
            marital_status: MaritalStatus::Single.to_string(),
            ..Default::default()
        }
    }

    fn draft_from(entity: &Beneficiary, _ctx: &FormContext) -> BeneficiaryDraft {
        BeneficiaryDraft {
            beneficiary_id: entity.beneficiary_id.clone(),
            first_name: entity.first_name.clone(),
            middle_name: entity.middle_name.clone(),
            last_name: entity.last_name.clone(),
            purok: entity.purok.clone(),
            barangay: entity.barangay.clone(),
            municipality: entity.municipality.clone(),
            province: entity.province.clone(),
            gender: entity.gender.map(|g| g.to_string()).unwrap_or_default(),
            birth_date: entity.birth_date.map(dates::format_date).unwrap_or_default(),
            marital_status: entity.marital_status.map(|m| m.to_string()).unwrap_or_default(),
            cellphone: entity.cellphone.clone(),
            picture: None,
            existing_picture: entity.picture.clone(),
        }
    }

    fn write(draft: &mut BeneficiaryDraft, field: BeneficiaryField, value: &str) {
        let slot = match field {
            BeneficiaryField::FirstName => &mut draft.first_name,
            BeneficiaryField::MiddleName => &mut draft.middle_name,
            BeneficiaryField::LastName => &mut draft.last_name,
            BeneficiaryField::Purok => &mut draft.purok,
            BeneficiaryField::Barangay => &mut draft.barangay,
            BeneficiaryField::Municipality => &mut draft.municipality,
            BeneficiaryField::Province => &mut draft.province,
            BeneficiaryField::Gender => &mut draft.gender,
            BeneficiaryField::BirthDate => &mut draft.birth_date,
            BeneficiaryField::MaritalStatus => &mut draft.marital_status,
            BeneficiaryField::Cellphone => &mut draft.cellphone,
        };
        *slot = value.to_string();
    }

    fn validate(draft: &BeneficiaryDraft, ctx: &FormContext) -> FieldErrors {
        let mut errors = FieldErrors::new();
        required(&mut errors, "firstName", &draft.first_name, "First name");
        required(&mut errors, "lastName", &draft.last_name, "Last name");
        required(&mut errors, "province", &draft.province, "Province");
        required(&mut errors, "municipality", &draft.municipality, "Municipality");
        required(&mut errors, "barangay", &draft.barangay, "Barangay");

        if draft.gender.parse::<Gender>().is_err() {
            errors.insert("gender", "Select a valid gender".to_string());
        }
        if draft.marital_status.parse::<MaritalStatus>().is_err() {
            errors.insert("maritalStatus", "Select a valid marital status".to_string());
        }

        if let Some(birth) = required_date(&mut errors, "birthDate", &draft.birth_date, "Birth date") {
            if birth > ctx.today {
                errors.insert("birthDate", "Birth date cannot be in the future".to_string());
            } else if age_on(birth, ctx.today).is_none() {
                errors.insert("birthDate", "Enter a realistic birth date".to_string());
            }
        }

        let cellphone = draft.cellphone.trim();
        if required(&mut errors, "cellphone", cellphone, "Cellphone number")
            && !is_cellphone(cellphone)
        {
            errors.insert(
                "cellphone",
                "Cellphone must be 11 digits starting with 09".to_string(),
            );
        }

        errors
    }

    fn to_payload(draft: &BeneficiaryDraft, ctx: &FormContext) -> Result<BeneficiaryPayload, FieldErrors> {
        let mut errors = FieldErrors::new();
        let gender = draft.gender.parse::<Gender>().ok();
        let marital_status = draft.marital_status.parse::<MaritalStatus>().ok();
        let birth_date = dates::parse_date(&draft.birth_date);
        let age = draft.age_on(ctx.today);

        match (gender, marital_status, birth_date, age) {
            (Some(gender), Some(marital_status), Some(birth_date), Some(age)) => Ok(BeneficiaryPayload {
                beneficiary_id: draft.beneficiary_id.trim().to_string(),
                first_name: draft.first_name.trim().to_string(),
                middle_name: draft.middle_name.trim().to_string(),
                last_name: draft.last_name.trim().to_string(),
                purok: draft.purok.trim().to_string(),
                barangay: draft.barangay.clone(),
                municipality: draft.municipality.clone(),
                province: draft.province.clone(),
                gender,
                birth_date,
                age,
                marital_status,
                cellphone: draft.cellphone.trim().to_string(),
                picture: draft.picture.clone(),
            }),
            _ => {
                errors.insert("birthDate", "Enter a valid birth date".to_string());
                Err(errors)
            }
        }
    }

    async fn send(
        api: &dyn DashboardApi,
        id: Option<&str>,
        payload: &BeneficiaryPayload,
    ) -> ApiResult<Beneficiary> {
        match id {
            Some(id) => api.update_beneficiary(id, payload).await,
            None if payload.beneficiary_id.is_empty() => {
                let beneficiary_id = api
                    .generate_beneficiary_id(&payload.generate_id_request())
                    .await?;
                let payload = BeneficiaryPayload {
                    beneficiary_id,
                    ..payload.clone()
                };
                api.create_beneficiary(&payload).await
            }
            None => api.create_beneficiary(payload).await,
        }
    }
}

impl FormController<BeneficiarySchema> {
    /// Age shown next to the birth date input
    pub fn derived_age(&self) -> Option<u32> {
        self.draft().age_on(self.context().today)
    }

    /// Pick a new picture; `None` keeps the stored one
    pub fn set_picture(&mut self, picture: Option<Attachment>) -> Result<(), SubmitError> {
        self.edit_draft()?.picture = picture;
        Ok(())
    }

    /// Set an address field and drive the option cascade to match
    pub async fn select_address(
        &mut self,
        cascade: &AddressCascade,
        field: BeneficiaryField,
        value: &str,
    ) -> Result<(), SubmitError> {
        self.set_field(field, value)?;
        match field {
            BeneficiaryField::Province => cascade.load_municipalities(value).await,
            BeneficiaryField::Municipality => {
                let province = self.draft().province.clone();
                cascade.load_barangays(&province, value).await
            }
            BeneficiaryField::Barangay => cascade.select_barangay(value),
            _ => {}
        }
        Ok(())
    }

    /// Populate the cascade for the stored address of an edit draft.
    ///
    /// Draft fields are left untouched; only options and selections in the
    /// cascade change.
    pub async fn load_address_options(&self, cascade: &AddressCascade) {
        let draft = self.draft();
        let (province, municipality, barangay) = (
            draft.province.clone(),
            draft.municipality.clone(),
            draft.barangay.clone(),
        );

        cascade.load_provinces().await;
        cascade.load_municipalities(&province).await;
        if !municipality.trim().is_empty() {
            cascade.load_barangays(&province, &municipality).await;
            cascade.select_barangay(&barangay);
        }
    }
}
