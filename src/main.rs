//! Coffee Monitor - command-line front end for the monitoring dashboard

use anyhow::{bail, Context};
use clap::Parser;
use std::sync::Arc;
use tracing::{debug, error};

use coffee_monitor::{
    address::AddressCascade,
    api::{DashboardApi, HttpApi, HttpApiConfig},
    config::{Args, Command, ListArgs},
    error::ApiError,
    list::{ListController, ListResource, ListView},
    logging,
    lookup::{BeneficiaryIndex, UploadHost},
    models::{Beneficiary, CropStatusRecord, FarmPlot, SeedlingRecord},
    session::{self, FileSessionStore, GateDecision, SessionGate, SessionStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    logging::init(&args.log_level, args.log_json);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(args.session_path()));
    let api = HttpApi::new(
        HttpApiConfig {
            base_url: args.api_url.clone(),
            timeout_ms: args.request_timeout_ms,
        },
        store.clone(),
    )
    .context("Failed to create API client")?;
    let api: Arc<dyn DashboardApi> = Arc::new(api);
    let gate = SessionGate::new(store.clone());
    let uploads = UploadHost::new(&args.upload_url);

    debug!(api = %args.api_url, session = %args.session_path().display(), "Starting");

    if let Some(destination) = args.command.destination() {
        if let GateDecision::RedirectToLogin { return_to, .. } = gate.check(destination) {
            bail!("Not logged in. Run `coffee-monitor login` first (requested {})", return_to);
        }
    }

    let result = run(&args, api, store.as_ref(), &uploads).await;
    if let Err(e) = &result {
        if let Some(api_error) = e.downcast_ref::<ApiError>() {
            if gate.handle_api_error(api_error) {
                bail!("Session expired. Run `coffee-monitor login` again");
            }
        }
    }
    result
}

async fn run(
    args: &Args,
    api: Arc<dyn DashboardApi>,
    store: &dyn SessionStore,
    uploads: &UploadHost,
) -> anyhow::Result<()> {
    match &args.command {
        Command::Login { username, password } => {
            let user = session::login(api.as_ref(), store, username, password).await?;
            println!("Logged in as {}", user.display_name());
        }
        Command::Logout => {
            session::logout(store);
            println!("Logged out");
        }
        Command::Whoami => {
            let user = api.current_user().await?;
            println!("{} ({})", user.display_name(), user.role.as_deref().unwrap_or("user"));
        }
        Command::Stats => {
            let stats = api.statistics().await?;
            println!("Beneficiaries:        {}", stats.total_beneficiaries);
            println!("Seedlings distributed: {}", stats.total_seeds_distributed);
            println!("Alive crops:          {}", stats.total_alive);
            println!("Dead crops:           {}", stats.total_dead);
            println!("Survival rate:        {:.1}%", stats.survival_rate() * 100.0);
        }
        Command::Beneficiaries(list) => {
            run_list::<Beneficiary>(api, list, args.page_size, uploads).await?
        }
        Command::Seedlings(list) => {
            run_list::<SeedlingRecord>(api, list, args.page_size, uploads).await?
        }
        Command::CropStatus(list) => {
            run_list::<CropStatusRecord>(api, list, args.page_size, uploads).await?
        }
        Command::FarmPlots(list) => {
            run_list::<FarmPlot>(api, list, args.page_size, uploads).await?
        }
        Command::Provinces {
            province,
            municipality,
        } => run_address(api, province.as_deref(), municipality.as_deref()).await?,
    }
    Ok(())
}

async fn run_list<T: ListResource + Describe>(
    api: Arc<dyn DashboardApi>,
    args: &ListArgs,
    page_size: usize,
    uploads: &UploadHost,
) -> anyhow::Result<()> {
    let mut list: ListController<T> =
        ListController::with_page_size(api, args.page_size.unwrap_or(page_size));
    list.refresh().await?;

    for key in &args.sort {
        if !list.sort(key) {
            bail!("Unknown sort column {:?}; expected one of {}", key, T::SORT_KEYS.join(", "));
        }
    }
    if let Some(search) = &args.search {
        list.set_search(search);
    }
    let page_size = list.pagination().page_size();
    list.paginate(args.page, page_size);

    match list.view() {
        ListView::Loading => println!("Loading..."),
        ListView::Error(message) => bail!("Failed to load {} list: {}", T::LABEL, message),
        ListView::Empty { .. } => println!("No {} records found", T::LABEL),
        ListView::Rows {
            rows,
            page,
            page_count,
            total,
            ..
        } => {
            for row in rows {
                println!("{}", row.describe(list.beneficiaries(), uploads));
            }
            println!("-- page {} of {} ({} total)", page, page_count, total);
        }
    }
    Ok(())
}

async fn run_address(
    api: Arc<dyn DashboardApi>,
    province: Option<&str>,
    municipality: Option<&str>,
) -> anyhow::Result<()> {
    let cascade = AddressCascade::new(api);
    let snapshot = match (province, municipality) {
        (Some(province), Some(municipality)) => {
            cascade.load_barangays(province, municipality).await;
            cascade.snapshot().barangay
        }
        (Some(province), None) => {
            cascade.load_municipalities(province).await;
            cascade.snapshot().municipality
        }
        _ => {
            cascade.load_provinces().await;
            cascade.snapshot().province
        }
    };

    if let coffee_monitor::LevelStatus::Error(message) = &snapshot.status {
        bail!("{}", message);
    }
    for option in &snapshot.options {
        println!("{}", option);
    }
    Ok(())
}

/// One-line rendering of a list row
trait Describe {
    fn describe(&self, index: &BeneficiaryIndex, uploads: &UploadHost) -> String;
}

impl Describe for Beneficiary {
    fn describe(&self, _index: &BeneficiaryIndex, uploads: &UploadHost) -> String {
        let age = self.age().map(|a| a.to_string()).unwrap_or_else(|| "-".into());
        let picture = self
            .picture
            .as_deref()
            .map(|p| uploads.resolve(p))
            .unwrap_or_default();
        format!(
            "{:<10} {:<28} {:>3}  {:<40} {:<11} {}",
            self.beneficiary_id,
            self.full_name(),
            age,
            self.address_line(),
            self.cellphone,
            picture
        )
    }
}

impl Describe for SeedlingRecord {
    fn describe(&self, index: &BeneficiaryIndex, _uploads: &UploadHost) -> String {
        let start = self
            .date_of_planting_start
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".into());
        format!(
            "{:<10} {:<28} received {:>6} planted {:>6} {:>6.2} ha  {:<12} from {}",
            self.beneficiary_id,
            index.display(&self.beneficiary_id).name,
            self.received,
            self.planted,
            self.hectares,
            self.plot,
            start
        )
    }
}

impl Describe for CropStatusRecord {
    fn describe(&self, index: &BeneficiaryIndex, uploads: &UploadHost) -> String {
        let date = self.survey_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
        let pictures: Vec<String> = self.pictures.iter().map(|p| uploads.resolve(p)).collect();
        format!(
            "{:<10} {:<28} {} by {:<16} alive {:>6} dead {:>6} {} {}",
            self.beneficiary_id,
            index.display(&self.beneficiary_id).name,
            date,
            self.surveyer,
            self.alive_crops,
            self.dead_crops,
            self.plot.as_deref().unwrap_or("-"),
            pictures.join(" ")
        )
    }
}

impl Describe for FarmPlot {
    fn describe(&self, index: &BeneficiaryIndex, _uploads: &UploadHost) -> String {
        let centroid = self
            .centroid()
            .map(|c| format!("{:.5},{:.5}", c.lat, c.lng))
            .unwrap_or_else(|| "-".into());
        format!(
            "{:<10} {:<28} {} {:>3} points  center {}",
            self.beneficiary_id,
            index.display(&self.beneficiary_id).name,
            self.color,
            self.coordinates.len(),
            centroid
        )
    }
}
