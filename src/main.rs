use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use smartfilm_crm::config::{ServerConfig, StorePaths};
use smartfilm_crm::followups::{FollowUpFilter, follow_up_board};
use smartfilm_crm::import::import_csv_file;
use smartfilm_crm::io::{FollowUpStore, JsonLeadStore, LeadStore};
use smartfilm_crm::model::{LeadStatus, NewFollowUp, NewLead, non_blank};
use smartfilm_crm::pipeline::{LeadFilter, PipelineSummary, filter_leads, monthly_intake};
use smartfilm_crm::reconcile::{Direction, reconcile};
use smartfilm_crm::{CrmError, Result, server};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging(&cli.log_level)?;

    match cli.command {
        Command::Sync(args) => execute_sync(args),
        Command::ImportCsv(args) => {
            let mut store = args.store.open();
            let imported = import_csv_file(&mut store, &args.input)?;
            println!("imported {imported} leads");
            Ok(())
        }
        Command::AddLead(args) => execute_add_lead(args),
        Command::SetStatus(args) => {
            let mut store = args.store.open();
            store.update_status(&args.id, args.status.into())
        }
        Command::DeleteLead(args) => args.store.open().delete_lead(&args.id),
        Command::Leads(args) => {
            let store = args.store.open();
            let filter = LeadFilter {
                search: args.search,
                status: args.status.map(LeadStatus::from),
            };
            print_json(&filter_leads(&store.list_leads()?, &filter))
        }
        Command::Pipeline(args) => {
            let leads = args.store.open().list_leads()?;
            let today = Local::now().date_naive();
            print_json(&serde_json::json!({
                "summary": PipelineSummary::from_leads(&leads),
                "monthly": monthly_intake(&leads, today, args.months),
            }))
        }
        Command::FollowUp(args) => execute_follow_up(args),
        Command::Serve(args) => execute_serve(args),
    }
}

fn execute_sync(args: SyncArgs) -> Result<()> {
    let paths = args.sheet.paths(args.store.store);
    let mut store = paths.lead_store();
    let mut sheet = paths.lead_sheet();
    let report = reconcile(&mut store, &mut sheet, args.direction.into())?;
    print_json(&report)
}

fn execute_add_lead(args: AddLeadArgs) -> Result<()> {
    let mut draft = NewLead::manual(args.name.trim());
    draft.email = args.email.and_then(non_blank);
    draft.phone = args.phone.and_then(non_blank);
    draft.city_state = args.city_state.and_then(non_blank);
    draft.project_type = args.project_type.and_then(non_blank);
    draft.timeline = args.timeline.and_then(non_blank);
    draft.glass_size = args.glass_size.and_then(non_blank);
    draft.message = args.message.and_then(non_blank);

    let lead = args.store.open().insert_lead(draft)?;
    print_json(&lead)
}

fn execute_follow_up(args: FollowUpArgs) -> Result<()> {
    match args.command {
        FollowUpCommand::Add(add) => {
            let mut store = add.store.open();
            let follow_up = store.insert_follow_up(NewFollowUp {
                lead_id: add.lead_id,
                note: add.note,
                follow_up_date: add.date,
            })?;
            print_json(&follow_up)
        }
        FollowUpCommand::Complete(complete) => {
            let mut store = complete.store.open();
            store.set_follow_up_completed(&complete.id, !complete.reopen)
        }
        FollowUpCommand::Delete(delete) => delete.store.open().delete_follow_up(&delete.id),
        FollowUpCommand::List(list) => {
            let store = list.store.open();
            let today = Local::now().date_naive();
            print_json(&follow_up_board(&store, list.filter.into(), today)?)
        }
    }
}

fn execute_serve(args: ServeArgs) -> Result<()> {
    let paths = args.sheet.paths(args.store.store);
    let config = ServerConfig::new(args.secret, paths, args.bind)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server::serve(config))
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| CrmError::Logging(error.to_string()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Lead pipeline tools: spreadsheet sync, CSV import and follow-ups."
)]
struct Cli {
    /// Log level used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one reconciliation pass between the lead store and the sheet.
    Sync(SyncArgs),
    /// Import leads from a CSV file.
    ImportCsv(ImportArgs),
    /// Add a lead by hand.
    AddLead(AddLeadArgs),
    /// Move a lead to another pipeline stage.
    SetStatus(SetStatusArgs),
    /// Delete a lead.
    DeleteLead(LeadIdArgs),
    /// List leads, newest first.
    Leads(LeadsArgs),
    /// Show pipeline totals and monthly intake.
    Pipeline(PipelineArgs),
    /// Manage follow-up reminders.
    FollowUp(FollowUpArgs),
    /// Serve the HTTP sync trigger.
    Serve(ServeArgs),
}

#[derive(clap::Args)]
struct StoreArgs {
    /// Lead store document.
    #[arg(long = "store", env = "CRM_STORE_PATH", default_value = "leads.json")]
    store: PathBuf,
}

impl StoreArgs {
    fn open(&self) -> JsonLeadStore {
        JsonLeadStore::new(&self.store)
    }
}

#[derive(clap::Args)]
struct SheetArgs {
    /// Workbook holding the lead worksheet.
    #[arg(long = "sheet", env = "CRM_SHEET_PATH", default_value = "leads.xlsx")]
    sheet: PathBuf,

    /// Name of the lead worksheet.
    #[arg(long, env = "CRM_SHEET_NAME", default_value = "Leads")]
    sheet_name: String,
}

impl SheetArgs {
    fn paths(self, store: PathBuf) -> StorePaths {
        StorePaths::new(store, self.sheet).with_sheet_name(self.sheet_name)
    }
}

#[derive(clap::Args)]
struct SyncArgs {
    #[command(flatten)]
    store: StoreArgs,

    #[command(flatten)]
    sheet: SheetArgs,

    /// Which way to reconcile.
    #[arg(long, value_enum, default_value_t = DirectionArg::Both)]
    direction: DirectionArg,
}

#[derive(clap::Args)]
struct ImportArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// CSV file to import.
    #[arg(long)]
    input: PathBuf,
}

#[derive(clap::Args)]
struct AddLeadArgs {
    #[command(flatten)]
    store: StoreArgs,

    #[arg(long)]
    name: String,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    city_state: Option<String>,
    #[arg(long)]
    project_type: Option<String>,
    #[arg(long)]
    timeline: Option<String>,
    #[arg(long)]
    glass_size: Option<String>,
    #[arg(long)]
    message: Option<String>,
}

#[derive(clap::Args)]
struct SetStatusArgs {
    #[command(flatten)]
    store: StoreArgs,

    #[arg(long)]
    id: String,

    #[arg(long, value_enum)]
    status: StatusArg,
}

#[derive(clap::Args)]
struct LeadIdArgs {
    #[command(flatten)]
    store: StoreArgs,

    #[arg(long)]
    id: String,
}

#[derive(clap::Args)]
struct LeadsArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Text matched against name, email and phone.
    #[arg(long)]
    search: Option<String>,

    #[arg(long, value_enum)]
    status: Option<StatusArg>,
}

#[derive(clap::Args)]
struct PipelineArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Number of calendar months of intake to report.
    #[arg(long, default_value_t = 6)]
    months: u32,
}

#[derive(clap::Args)]
struct FollowUpArgs {
    #[command(subcommand)]
    command: FollowUpCommand,
}

#[derive(Subcommand)]
enum FollowUpCommand {
    /// Schedule a follow-up for a lead.
    Add(FollowUpAddArgs),
    /// Mark a follow-up as done (or reopen it).
    Complete(FollowUpCompleteArgs),
    /// Remove a follow-up.
    Delete(FollowUpIdArgs),
    /// Show the follow-up board.
    List(FollowUpListArgs),
}

#[derive(clap::Args)]
struct FollowUpAddArgs {
    #[command(flatten)]
    store: StoreArgs,

    #[arg(long)]
    lead_id: String,

    #[arg(long)]
    note: String,

    /// Due date, `YYYY-MM-DD`.
    #[arg(long)]
    date: NaiveDate,
}

#[derive(clap::Args)]
struct FollowUpCompleteArgs {
    #[command(flatten)]
    store: StoreArgs,

    #[arg(long)]
    id: String,

    /// Mark the follow-up as not completed instead.
    #[arg(long)]
    reopen: bool,
}

#[derive(clap::Args)]
struct FollowUpIdArgs {
    #[command(flatten)]
    store: StoreArgs,

    #[arg(long)]
    id: String,
}

#[derive(clap::Args)]
struct FollowUpListArgs {
    #[command(flatten)]
    store: StoreArgs,

    #[arg(long, value_enum, default_value_t = FilterArg::All)]
    filter: FilterArg,
}

#[derive(clap::Args)]
struct ServeArgs {
    #[command(flatten)]
    store: StoreArgs,

    #[command(flatten)]
    sheet: SheetArgs,

    /// Address to listen on.
    #[arg(long, env = "CRM_BIND", default_value = "127.0.0.1:3000")]
    bind: SocketAddr,

    /// Bearer token callers must present.
    #[arg(long, env = "SYNC_SECRET", hide_env_values = true)]
    secret: Option<String>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum DirectionArg {
    DbToSheet,
    SheetToDb,
    Both,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::DbToSheet => Direction::DbToSheet,
            DirectionArg::SheetToDb => Direction::SheetToDb,
            DirectionArg::Both => Direction::Both,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum StatusArg {
    New,
    Contacted,
    Quoted,
    Won,
    Lost,
}

impl From<StatusArg> for LeadStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::New => LeadStatus::New,
            StatusArg::Contacted => LeadStatus::Contacted,
            StatusArg::Quoted => LeadStatus::Quoted,
            StatusArg::Won => LeadStatus::Won,
            StatusArg::Lost => LeadStatus::Lost,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FilterArg {
    All,
    Pending,
    Completed,
    Overdue,
}

impl From<FilterArg> for FollowUpFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => FollowUpFilter::All,
            FilterArg::Pending => FollowUpFilter::Pending,
            FilterArg::Completed => FollowUpFilter::Completed,
            FilterArg::Overdue => FollowUpFilter::Overdue,
        }
    }
}
