//! Farm plot boundary form

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

use super::{link_beneficiary, linked_display, FieldErrors, FormContext, FormController, FormField, FormSchema, SubmitError};
use crate::api::DashboardApi;
use crate::error::ApiResult;
use crate::models::{Coordinate, FarmPlot, FarmPlotPayload, PLOT_COLORS};

/// Fewest points that still enclose an area
pub const MIN_PLOT_POINTS: usize = 3;

fn is_hex_color(value: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(value))
}

/// Palette color for the `n`th plot, wrapping around
pub fn palette_color(n: usize) -> &'static str {
    PLOT_COLORS[n % PLOT_COLORS.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FarmPlotField {
    BeneficiaryName,
    BeneficiaryId,
    Color,
    Coordinates,
}

impl FormField for FarmPlotField {
    const DEPENDENCIES: &'static [(Self, &'static [Self])] =
        &[(FarmPlotField::BeneficiaryName, &[FarmPlotField::BeneficiaryId])];

    fn name(self) -> &'static str {
        match self {
            FarmPlotField::BeneficiaryName => "beneficiaryName",
            FarmPlotField::BeneficiaryId => "beneficiaryId",
            FarmPlotField::Color => "color",
            FarmPlotField::Coordinates => "coordinates",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FarmPlotDraft {
    pub beneficiary_name: String,
    pub beneficiary_id: String,
    pub color: String,
    pub coordinates: Vec<Coordinate>,
}

pub struct FarmPlotSchema;

#[async_trait]
impl FormSchema for FarmPlotSchema {
    type Entity = FarmPlot;
    type Draft = FarmPlotDraft;
    type Field = FarmPlotField;
    type Payload = FarmPlotPayload;

    const LABEL: &'static str = "farm plot";

    fn entity_id(entity: &FarmPlot) -> &str {
        &entity.id
    }

    fn new_draft(_ctx: &FormContext) -> FarmPlotDraft {
        FarmPlotDraft {
            color: palette_color(0).to_string(),
            ..Default::default()
        }
    }

    fn draft_from(entity: &FarmPlot, ctx: &FormContext) -> FarmPlotDraft {
        let (beneficiary_name, _) = linked_display(ctx, &entity.beneficiary_id);
        FarmPlotDraft {
            beneficiary_name,
            beneficiary_id: entity.beneficiary_id.clone(),
            color: entity.color.clone(),
            coordinates: entity.coordinates.clone(),
        }
    }

    fn write(draft: &mut FarmPlotDraft, field: FarmPlotField, value: &str) {
        let slot = match field {
            FarmPlotField::BeneficiaryName => &mut draft.beneficiary_name,
            FarmPlotField::BeneficiaryId => &mut draft.beneficiary_id,
            FarmPlotField::Color => &mut draft.color,
            FarmPlotField::Coordinates => return,
        };
        *slot = value.to_string();
    }

    fn derive(draft: &mut FarmPlotDraft, field: FarmPlotField, ctx: &FormContext) {
        if field == FarmPlotField::BeneficiaryName {
            draft.beneficiary_id = link_beneficiary(ctx, &draft.beneficiary_name).0;
        }
    }

    fn validate(draft: &FarmPlotDraft, _ctx: &FormContext) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if draft.beneficiary_id.trim().is_empty() {
            errors.insert("beneficiaryName", "Select a beneficiary".to_string());
        }
        if draft.coordinates.len() < MIN_PLOT_POINTS {
            errors.insert(
                "coordinates",
                format!("A plot needs at least {} points", MIN_PLOT_POINTS),
            );
        } else if !draft.coordinates.iter().all(Coordinate::is_valid) {
            errors.insert(
                "coordinates",
                "Coordinates must be valid latitude/longitude pairs".to_string(),
            );
        }
        if !is_hex_color(draft.color.trim()) {
            errors.insert("color", "Color must be a hex value like #2E7D32".to_string());
        }
        errors
    }

    fn to_payload(draft: &FarmPlotDraft, _ctx: &FormContext) -> Result<FarmPlotPayload, FieldErrors> {
        Ok(FarmPlotPayload {
            beneficiary_id: draft.beneficiary_id.trim().to_string(),
            coordinates: draft.coordinates.clone(),
            color: draft.color.trim().to_uppercase(),
        })
    }

    async fn send(
        api: &dyn DashboardApi,
        id: Option<&str>,
        payload: &FarmPlotPayload,
    ) -> ApiResult<FarmPlot> {
        match id {
            Some(id) => api.update_farm_plot(id, payload).await,
            None => api.create_farm_plot(payload).await,
        }
    }
}

impl FormController<FarmPlotSchema> {
    /// Append a boundary point
    pub fn add_point(&mut self, point: Coordinate) -> Result<usize, SubmitError> {
        let draft = self.edit_draft()?;
        draft.coordinates.push(point);
        let count = draft.coordinates.len();
        self.errors_mut().remove("coordinates");
        Ok(count)
    }

    pub fn remove_point(&mut self, index: usize) -> Result<Option<Coordinate>, SubmitError> {
        let draft = self.edit_draft()?;
        Ok((index < draft.coordinates.len()).then(|| draft.coordinates.remove(index)))
    }

    pub fn clear_points(&mut self) -> Result<(), SubmitError> {
        self.edit_draft()?.coordinates.clear();
        Ok(())
    }

    /// Give a new plot the next palette color after `existing` plots
    pub fn assign_palette_color(&mut self, existing: usize) -> Result<(), SubmitError> {
        self.set_field(FarmPlotField::Color, palette_color(existing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockApi;
    use crate::lookup::BeneficiaryIndex;
    use crate::models::Beneficiary;
    use std::sync::Arc;

    fn ana() -> Beneficiary {
        serde_json::from_value(serde_json::json!({
            "_id": "b3",
            "beneficiaryId": "BEN-0003",
            "firstName": "Ana",
            "lastName": "Reyes"
        }))
        .unwrap()
    }

    fn setup() -> (FormController<FarmPlotSchema>, Arc<MockApi>) {
        let api = Arc::new(MockApi::new().with_beneficiaries(vec![ana()]));
        let ctx = FormContext::new(BeneficiaryIndex::new(vec![ana()]));
        let mut form = FormController::new(api.clone(), ctx);
        form.open(None).unwrap();
        (form, api)
    }

    #[test]
    fn test_palette_wraps() {
        assert_eq!(palette_color(0), "#2E7D32");
        assert_eq!(palette_color(PLOT_COLORS.len()), "#2E7D32");
    }

    #[test]
    fn test_polygon_rules() {
        let (mut form, _) = setup();
        form.set_field(FarmPlotField::BeneficiaryName, "Ana Reyes").unwrap();
        form.add_point(Coordinate::new(8.15, 125.12)).unwrap();
        form.add_point(Coordinate::new(8.16, 125.13)).unwrap();
        assert_eq!(
            form.validate().get("coordinates").map(String::as_str),
            Some("A plot needs at least 3 points")
        );

        form.add_point(Coordinate::new(95.0, 125.14)).unwrap();
        assert!(form.validate().contains_key("coordinates"));

        form.remove_point(2).unwrap();
        form.add_point(Coordinate::new(8.17, 125.11)).unwrap();
        form.set_field(FarmPlotField::Color, "green").unwrap();
        let errors = form.validate();
        assert!(!errors.contains_key("coordinates"));
        assert!(errors.contains_key("color"));
    }

    #[tokio::test]
    async fn test_submit_creates_plot() {
        let (mut form, api) = setup();
        form.set_field(FarmPlotField::BeneficiaryName, "Ana Reyes").unwrap();
        form.assign_palette_color(1).unwrap();
        for (lat, lng) in [(8.15, 125.12), (8.16, 125.13), (8.17, 125.11)] {
            form.add_point(Coordinate::new(lat, lng)).unwrap();
        }

        let saved = form.submit().await.unwrap();
        assert_eq!(saved.beneficiary_id, "BEN-0003");
        assert_eq!(saved.color, PLOT_COLORS[1]);
        assert_eq!(saved.coordinates.len(), 3);
        assert_eq!(api.farm_plots().len(), 1);
    }
}
