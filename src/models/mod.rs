//! Domain records exchanged with the monitoring API
//!
//! Records reference beneficiaries by business key (`beneficiaryId`), never
//! by storage id.

pub mod attachment;
pub mod auth;
pub mod beneficiary;
pub mod crop_status;
pub mod dates;
pub mod farm_plot;
pub mod seedling;
pub mod summary;

pub use attachment::Attachment;
pub use auth::{LoginRequest, LoginResponse, User};
pub use beneficiary::{Beneficiary, BeneficiaryPayload, Gender, GenerateIdRequest, MaritalStatus};
pub use crop_status::{CropStatusPayload, CropStatusRecord, MAX_CROP_PICTURES};
pub use farm_plot::{Coordinate, FarmPlot, FarmPlotPayload, PLOT_COLORS};
pub use seedling::{SeedlingPayload, SeedlingRecord};
pub use summary::{DeleteSummary, DeletedRecords, Statistics};
