//! Coffee Monitor - back-office client core for coffee-farm beneficiary monitoring
//!
//! Provides the state-synchronization layer behind the monitoring dashboard:
//! beneficiaries, seedling distribution records, crop-survival surveys and
//! farm-plot annotations, all backed by a REST API.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 SessionGate                  │
//! │   (token presence, login redirect, 401)      │
//! └──────────────────────┬───────────────────────┘
//!                        │
//!        ┌───────────────┴───────────────┐
//!        ▼                               ▼
//! ┌───────────────┐              ┌────────────────┐
//! │ListController │◄── refresh ──│ FormController │
//! │ sort/paginate │              │ validate/submit│
//! └──────┬────────┘              └──────┬─────────┘
//!        │ BeneficiaryIndex (join)      │ AddressCascade
//!        ▼                              ▼
//! ┌──────────────────────────────────────────────┐
//! │        DashboardApi (HttpApi / MockApi)      │
//! └──────────────────────────────────────────────┘
//! ```

pub mod address;
pub mod api;
pub mod config;
pub mod error;
pub mod form;
pub mod list;
pub mod logging;
pub mod lookup;
pub mod models;
pub mod session;

pub use address::{AddressCascade, AddressLevel, CascadeSnapshot, LevelStatus};
pub use api::{DashboardApi, HttpApi, HttpApiConfig, MockApi, MockOp};
pub use config::{Args, Command};
pub use error::{ApiError, ApiResult};
pub use form::{FieldErrors, FormContext, FormController, FormMode, SubmissionState, SubmitError};
pub use list::{ListController, ListResource, ListView, Notice, NoticeKind};
pub use lookup::{BeneficiaryIndex, DisplayInfo, UploadHost};
pub use models::*;
pub use session::{FileSessionStore, GateDecision, MemorySessionStore, SessionGate, SessionStore};
