//! Beneficiary (program participant) records

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::attachment::Attachment;
use super::dates::{self, age_on};

/// Beneficiary gender as captured by the registration form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gender::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown gender: {}", s))
    }
}

/// Civil status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaritalStatus {
    Single,
    Married,
    Widowed,
    Divorced,
    Separated,
}

impl MaritalStatus {
    pub const ALL: [MaritalStatus; 5] = [
        MaritalStatus::Single,
        MaritalStatus::Married,
        MaritalStatus::Widowed,
        MaritalStatus::Divorced,
        MaritalStatus::Separated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MaritalStatus::Single => "Single",
            MaritalStatus::Married => "Married",
            MaritalStatus::Widowed => "Widowed",
            MaritalStatus::Divorced => "Divorced",
            MaritalStatus::Separated => "Separated",
        }
    }
}

impl fmt::Display for MaritalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaritalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MaritalStatus::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown marital status: {}", s))
    }
}

/// Beneficiary as returned by `GET /beneficiaries`
///
/// `age` is intentionally not deserialized: it is always derived from
/// `birth_date` so a stale server value can never leak into the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beneficiary {
    /// Storage id assigned by the server
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    /// Business key used by dependent records
    pub beneficiary_id: String,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    pub last_name: String,
    #[serde(default)]
    pub purok: String,
    #[serde(default)]
    pub barangay: String,
    #[serde(default)]
    pub municipality: String,
    #[serde(default)]
    pub province: String,
    #[serde(default, deserialize_with = "lenient_enum")]
    pub gender: Option<Gender>,
    #[serde(default, with = "dates::option_date")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_enum")]
    pub marital_status: Option<MaritalStatus>,
    #[serde(default)]
    pub cellphone: String,
    /// Server-relative picture path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl Beneficiary {
    /// "First Middle Last", skipping empty parts
    pub fn full_name(&self) -> String {
        [&self.first_name, &self.middle_name, &self.last_name]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        self.birth_date.and_then(|birth| age_on(birth, today))
    }

    pub fn age(&self) -> Option<u32> {
        self.age_on(dates::today())
    }

    /// "Purok, Barangay, Municipality, Province", skipping empty parts
    pub fn address_line(&self) -> String {
        [&self.purok, &self.barangay, &self.municipality, &self.province]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Unknown or blank enum values become `None` instead of failing the whole list
fn lenient_enum<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.parse().ok()))
}

/// Body of `POST /beneficiaries/generate-id`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateIdRequest {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
}

/// Multipart payload for beneficiary create/update
#[derive(Debug, Clone, PartialEq)]
pub struct BeneficiaryPayload {
    /// Empty in add mode until the server generates one
    pub beneficiary_id: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub purok: String,
    pub barangay: String,
    pub municipality: String,
    pub province: String,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    pub age: u32,
    pub marital_status: MaritalStatus,
    pub cellphone: String,
    /// Newly selected picture; `None` keeps the stored one
    pub picture: Option<Attachment>,
}

impl BeneficiaryPayload {
    /// Text parts in wire order
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("beneficiaryId", self.beneficiary_id.clone()),
            ("firstName", self.first_name.clone()),
            ("middleName", self.middle_name.clone()),
            ("lastName", self.last_name.clone()),
            ("purok", self.purok.clone()),
            ("barangay", self.barangay.clone()),
            ("municipality", self.municipality.clone()),
            ("province", self.province.clone()),
            ("gender", self.gender.to_string()),
            ("birthDate", dates::format_date(self.birth_date)),
            ("age", self.age.to_string()),
            ("maritalStatus", self.marital_status.to_string()),
            ("cellphone", self.cellphone.clone()),
        ]
    }

    pub fn generate_id_request(&self) -> GenerateIdRequest {
        GenerateIdRequest {
            first_name: self.first_name.clone(),
            middle_name: self.middle_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}
