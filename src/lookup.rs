//! Beneficiary joins for dependent records
//!
//! Seedling, crop status and farm plot rows carry only a beneficiary business
//! key. The index resolves that key to a display name and picture, falling
//! back to the raw key when the beneficiary is unknown.

use std::collections::HashMap;

use crate::models::{Beneficiary, CropStatusRecord, FarmPlot, SeedlingRecord};

/// What a dependent row shows for its beneficiary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayInfo {
    pub name: String,
    pub picture: Option<String>,
    /// `false` when the key did not resolve (dangling reference)
    pub matched: bool,
}

/// Records that reference a beneficiary by business key
pub trait BeneficiaryLinked {
    fn beneficiary_key(&self) -> &str;
}

impl BeneficiaryLinked for SeedlingRecord {
    fn beneficiary_key(&self) -> &str {
        &self.beneficiary_id
    }
}

impl BeneficiaryLinked for CropStatusRecord {
    fn beneficiary_key(&self) -> &str {
        &self.beneficiary_id
    }
}

impl BeneficiaryLinked for FarmPlot {
    fn beneficiary_key(&self) -> &str {
        &self.beneficiary_id
    }
}

/// Hash index over beneficiaries keyed by `beneficiaryId`
#[derive(Debug, Clone, Default)]
pub struct BeneficiaryIndex {
    beneficiaries: Vec<Beneficiary>,
    by_key: HashMap<String, usize>,
}

impl BeneficiaryIndex {
    pub fn new(beneficiaries: Vec<Beneficiary>) -> Self {
        let by_key = beneficiaries
            .iter()
            .enumerate()
            .map(|(i, b)| (b.beneficiary_id.clone(), i))
            .collect();
        Self {
            beneficiaries,
            by_key,
        }
    }

    pub fn get(&self, beneficiary_id: &str) -> Option<&Beneficiary> {
        self.by_key
            .get(beneficiary_id)
            .and_then(|&i| self.beneficiaries.get(i))
    }

    /// Case-insensitive match on the full name, as picked in a form
    pub fn find_by_name(&self, name: &str) -> Option<&Beneficiary> {
        let wanted = name.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        self.beneficiaries
            .iter()
            .find(|b| b.full_name().to_lowercase() == wanted)
    }

    pub fn all(&self) -> &[Beneficiary] {
        &self.beneficiaries
    }

    pub fn len(&self) -> usize {
        self.beneficiaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beneficiaries.is_empty()
    }

    pub fn display(&self, beneficiary_id: &str) -> DisplayInfo {
        match self.get(beneficiary_id) {
            Some(b) => DisplayInfo {
                name: b.full_name(),
                picture: b.picture.clone(),
                matched: true,
            },
            None => DisplayInfo {
                name: beneficiary_id.to_string(),
                picture: None,
                matched: false,
            },
        }
    }

    pub fn resolve<R: BeneficiaryLinked>(&self, record: &R) -> DisplayInfo {
        self.display(record.beneficiary_key())
    }

    /// Pair every record with its display info, preserving order
    pub fn join<'a, R: BeneficiaryLinked>(&self, records: &'a [R]) -> Vec<(&'a R, DisplayInfo)> {
        records.iter().map(|r| (r, self.resolve(r))).collect()
    }
}

/// Turns server-relative upload paths into absolute URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadHost {
    base: String,
}

impl UploadHost {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn resolve(&self, path: &str) -> String {
        let path = path.trim();
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.base, path)
        } else {
            format!("{}/{}", self.base, path)
        }
    }

    pub fn picture_url(&self, info: &DisplayInfo) -> Option<String> {
        info.picture.as_deref().map(|p| self.resolve(p))
    }
}
