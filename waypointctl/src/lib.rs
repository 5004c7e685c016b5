use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;
use url::Url;
use waypoint_core::{
    load_waypoint_config, GeoPoint, HttpRoutePlanner, JsonFileStore, MarkerLayout,
    PersistenceAdapter, PlaceId, PlaceUpdate, RoutePlanner, RouteWorkspace, SkipReason,
    SqliteStateStore, StateStore, StorageBackend, TimeBudget,
};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] waypoint_core::ConfigError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("state error: {0}")]
    Persist(#[from] waypoint_core::PersistError),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("{0}")]
    Place(#[from] waypoint_core::PlaceError),
    #[error("planning failed: {0}")]
    Plan(#[from] waypoint_core::PlanFailure),
    #[error("no place matches '{0}'")]
    UnknownPlace(String),
    #[error("'{0}' matches more than one place, use the id")]
    AmbiguousPlace(String),
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Route planning session control", long_about = None)]
pub struct Cli {
    /// Path to waypoint.toml
    #[arg(long, default_value = "configs/waypoint.toml")]
    pub config: PathBuf,
    /// Override the persisted session location
    #[arg(long)]
    pub state: Option<PathBuf>,
    /// Override the planner endpoint
    #[arg(long)]
    pub endpoint: Option<Url>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show session summary
    Status,
    /// Manage the place collection
    #[command(subcommand)]
    Place(PlaceCommands),
    /// Manage the start anchor
    #[command(subcommand)]
    Anchor(AnchorCommands),
    /// Set the time budget
    Budget(BudgetArgs),
    /// Request a route from the planner and reconcile the result
    Plan,
    /// Print the derived marker numbering
    Markers,
    /// Drop all places, the anchor and the current session
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum PlaceCommands {
    /// Append a place
    Add(PlaceAddArgs),
    /// Remove a place by id or name
    Remove(PlaceRefArg),
    /// Rename a place
    Rename(PlaceRenameArgs),
    /// Update a place's coordinates
    Move(PlaceMoveArgs),
    /// List places in stored order
    List,
}

#[derive(Args, Debug)]
#[command(allow_negative_numbers = true)]
pub struct PlaceAddArgs {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Args, Debug)]
pub struct PlaceRefArg {
    /// Place id or exact name
    pub place: String,
}

#[derive(Args, Debug)]
pub struct PlaceRenameArgs {
    /// Place id or exact name
    pub place: String,
    pub name: String,
}

#[derive(Args, Debug)]
#[command(allow_negative_numbers = true)]
pub struct PlaceMoveArgs {
    /// Place id or exact name
    pub place: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Subcommand, Debug)]
pub enum AnchorCommands {
    /// Start from an existing place
    Place(PlaceRefArg),
    /// Start from a free coordinate not backed by any place
    Free(FreeAnchorArgs),
    /// Clear the start designation
    Clear,
}

#[derive(Args, Debug)]
#[command(allow_negative_numbers = true)]
pub struct FreeAnchorArgs {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Args, Debug)]
pub struct BudgetArgs {
    /// Budget in minutes
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub minutes: Option<u32>,
    /// Start of a wall-clock interval (HH:MM)
    #[arg(long, requires = "to")]
    pub from: Option<String>,
    /// End of a wall-clock interval (HH:MM)
    #[arg(long, requires = "from")]
    pub to: Option<String>,
}

pub fn run(cli: Cli) -> Result<()> {
    let mut context = AppContext::new(&cli)?;

    match &cli.command {
        Commands::Status => {
            let report = context.status();
            render(&report, cli.format)
        }
        Commands::Place(PlaceCommands::Add(args)) => {
            context
                .workspace
                .add_place(&args.name, GeoPoint::new(args.lat, args.lng));
            context.save()?;
            render(&context.place_list(), cli.format)
        }
        Commands::Place(PlaceCommands::Remove(args)) => {
            let id = context.resolve_place(&args.place)?;
            context.workspace.remove_place(id)?;
            context.save()?;
            render(&context.place_list(), cli.format)
        }
        Commands::Place(PlaceCommands::Rename(args)) => {
            let id = context.resolve_place(&args.place)?;
            context
                .workspace
                .update_place(id, PlaceUpdate::name(&args.name))?;
            context.save()?;
            render(&context.place_list(), cli.format)
        }
        Commands::Place(PlaceCommands::Move(args)) => {
            let id = context.resolve_place(&args.place)?;
            context.workspace.update_place(
                id,
                PlaceUpdate::position(GeoPoint::new(args.lat, args.lng)),
            )?;
            context.save()?;
            render(&context.place_list(), cli.format)
        }
        Commands::Place(PlaceCommands::List) => render(&context.place_list(), cli.format),
        Commands::Anchor(AnchorCommands::Place(args)) => {
            let id = context.resolve_place(&args.place)?;
            context.workspace.set_place_anchor(id)?;
            context.save()?;
            render(&context.markers(), cli.format)
        }
        Commands::Anchor(AnchorCommands::Free(args)) => {
            context
                .workspace
                .set_free_anchor(GeoPoint::new(args.lat, args.lng));
            context.save()?;
            render(&context.markers(), cli.format)
        }
        Commands::Anchor(AnchorCommands::Clear) => {
            context.workspace.clear_anchor();
            context.save()?;
            render(&context.markers(), cli.format)
        }
        Commands::Budget(args) => {
            let budget = match (args.minutes, &args.from, &args.to) {
                (Some(minutes), _, _) => TimeBudget::slider(minutes),
                (None, Some(from), Some(to)) => TimeBudget::from_clock(from, to)?,
                _ => context.workspace.time_budget(),
            };
            context.workspace.set_time_budget(budget);
            context.save()?;
            render(&context.status(), cli.format)
        }
        Commands::Plan => {
            let report = context.plan()?;
            render(&report, cli.format)
        }
        Commands::Markers => render(&context.markers(), cli.format),
        Commands::Clear => {
            context.workspace.clear();
            context.save()?;
            render(&context.status(), cli.format)
        }
    }
}

fn render<T>(value: &T, format: OutputFormat) -> Result<()>
where
    T: Serialize + DisplayFallback,
{
    match format {
        OutputFormat::Text => {
            println!("{}", value.display());
            Ok(())
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
            Ok(())
        }
    }
}

trait DisplayFallback {
    fn display(&self) -> String;
}

struct AppContext {
    workspace: RouteWorkspace,
    adapter: PersistenceAdapter<Box<dyn StateStore>>,
    endpoint: Url,
}

impl AppContext {
    fn new(cli: &Cli) -> Result<Self> {
        let config = load_waypoint_config(&cli.config)?;
        let endpoint = cli
            .endpoint
            .clone()
            .unwrap_or_else(|| config.planner.endpoint.clone());
        let state_path = cli
            .state
            .clone()
            .unwrap_or_else(|| config.storage.path.clone());
        let store: Box<dyn StateStore> = match config.storage.backend {
            StorageBackend::Json => Box::new(JsonFileStore::new(&state_path)),
            StorageBackend::Sqlite => Box::new(SqliteStateStore::new(&state_path)),
        };
        let adapter = PersistenceAdapter::new(store);

        let mut workspace = RouteWorkspace::new();
        if !config.defaults.require_anchor {
            workspace = workspace.allow_missing_anchor();
        }
        match adapter.load() {
            Some(state) => workspace.restore(state),
            None => {
                workspace.set_time_budget(TimeBudget::quick(config.defaults.time_budget_min));
            }
        }

        Ok(Self {
            workspace,
            adapter,
            endpoint,
        })
    }

    fn save(&self) -> Result<()> {
        self.adapter.save(&self.workspace.persisted_state())?;
        Ok(())
    }

    fn resolve_place(&self, reference: &str) -> Result<PlaceId> {
        if let Ok(id) = reference.parse::<PlaceId>() {
            if self.workspace.places().contains(id) {
                return Ok(id);
            }
        }
        let matches: Vec<PlaceId> = self
            .workspace
            .places()
            .places()
            .iter()
            .filter(|place| place.name == reference)
            .map(|place| place.id)
            .collect();
        match matches.as_slice() {
            [id] => Ok(*id),
            [] => Err(AppError::UnknownPlace(reference.to_string())),
            _ => Err(AppError::AmbiguousPlace(reference.to_string())),
        }
    }

    fn status(&self) -> StatusReport {
        let anchor = match self.workspace.anchor() {
            Some(waypoint_core::Anchor::Place { id }) => self
                .workspace
                .places()
                .get(id)
                .map(|place| format!("place: {}", place.name))
                .unwrap_or_else(|| format!("place: {id}")),
            Some(waypoint_core::Anchor::Free { position }) => format!("free: {position}"),
            None => "none".to_string(),
        };
        StatusReport {
            places: self.workspace.places().len(),
            anchor,
            time_budget_minutes: self.workspace.time_budget().minutes,
            time_budget_mode: self.workspace.time_budget().mode.to_string(),
            endpoint: self.endpoint.to_string(),
        }
    }

    fn place_list(&self) -> PlaceList {
        let layout = self.workspace.marker_layout();
        let rows = self
            .workspace
            .places()
            .places()
            .iter()
            .map(|place| {
                let assignment = layout.assignment(place.id);
                PlaceRow {
                    id: place.id.to_string(),
                    number: assignment.map(|a| a.number).unwrap_or(0),
                    name: place.name.clone(),
                    lat: place.position.lat,
                    lng: place.position.lng,
                    is_start: assignment.map(|a| a.is_start).unwrap_or(false),
                }
            })
            .collect();
        PlaceList { rows }
    }

    fn markers(&self) -> MarkerReport {
        MarkerReport::from_layout(&self.workspace, self.workspace.marker_layout())
    }

    fn plan(&mut self) -> Result<PlanReport> {
        let ticket = self.workspace.begin_plan()?;
        let planner = HttpRoutePlanner::new(self.endpoint.clone());
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let outcome = runtime.block_on(planner.submit(&ticket.request))?;
        let reconciliation = self.workspace.apply_outcome(&ticket, outcome);
        self.save()?;

        let order = reconciliation
            .applied_order
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .enumerate()
            .filter_map(|(index, id)| {
                self.workspace.places().get(*id).map(|place| OrderedStop {
                    number: index as u32 + 1,
                    name: place.name.clone(),
                })
            })
            .collect();

        Ok(PlanReport {
            distance_km: reconciliation.summary.distance_km(),
            duration_minutes: reconciliation.summary.duration_minutes(),
            within_budget: reconciliation.summary.within_budget,
            reordered: reconciliation.reordered(),
            skipped: reconciliation.skipped,
            promoted_anchor: reconciliation.promoted_anchor.is_some(),
            order,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub places: usize,
    pub anchor: String,
    pub time_budget_minutes: u32,
    pub time_budget_mode: String,
    pub endpoint: String,
}

impl DisplayFallback for StatusReport {
    fn display(&self) -> String {
        format!(
            "Places: {}\nAnchor: {}\nTime budget: {} min ({})\nPlanner: {}",
            self.places,
            self.anchor,
            self.time_budget_minutes,
            self.time_budget_mode,
            self.endpoint
        )
    }
}

#[derive(Debug, Serialize)]
pub struct PlaceList {
    pub rows: Vec<PlaceRow>,
}

#[derive(Debug, Serialize)]
pub struct PlaceRow {
    pub id: String,
    pub number: u32,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub is_start: bool,
}

impl DisplayFallback for PlaceList {
    fn display(&self) -> String {
        if self.rows.is_empty() {
            return "No places yet".to_string();
        }
        let mut lines = Vec::new();
        for row in &self.rows {
            let start = if row.is_start { " [start]" } else { "" };
            lines.push(format!(
                "{}. {}{} ({:.6}, {:.6}) id={}",
                row.number, row.name, start, row.lat, row.lng, row.id
            ));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct MarkerReport {
    pub free_start: Option<FreeStartRow>,
    pub rows: Vec<MarkerRow>,
}

#[derive(Debug, Serialize)]
pub struct FreeStartRow {
    pub number: u32,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize)]
pub struct MarkerRow {
    pub number: u32,
    pub name: String,
    pub is_start: bool,
}

impl MarkerReport {
    fn from_layout(workspace: &RouteWorkspace, layout: MarkerLayout) -> Self {
        let mut rows: Vec<MarkerRow> = layout
            .markers
            .iter()
            .filter_map(|marker| {
                workspace
                    .places()
                    .get(marker.place_id)
                    .map(|place| MarkerRow {
                        number: marker.number,
                        name: place.name.clone(),
                        is_start: marker.is_start,
                    })
            })
            .collect();
        rows.sort_by_key(|row| row.number);
        Self {
            free_start: layout.free_start.map(|free| FreeStartRow {
                number: free.number,
                lat: free.position.lat,
                lng: free.position.lng,
            }),
            rows,
        }
    }
}

impl DisplayFallback for MarkerReport {
    fn display(&self) -> String {
        let mut lines = Vec::new();
        if let Some(free) = &self.free_start {
            lines.push(format!(
                "{}. start ({:.6}, {:.6})",
                free.number, free.lat, free.lng
            ));
        }
        for row in &self.rows {
            let start = if row.is_start { " [start]" } else { "" };
            lines.push(format!("{}. {}{}", row.number, row.name, start));
        }
        if lines.is_empty() {
            return "No markers".to_string();
        }
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct PlanReport {
    pub distance_km: f64,
    pub duration_minutes: u64,
    pub within_budget: bool,
    pub reordered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
    pub promoted_anchor: bool,
    pub order: Vec<OrderedStop>,
}

#[derive(Debug, Serialize)]
pub struct OrderedStop {
    pub number: u32,
    pub name: String,
}

impl DisplayFallback for PlanReport {
    fn display(&self) -> String {
        let warn = if self.within_budget {
            ""
        } else {
            " — exceeds the time budget"
        };
        let mut lines = vec![format!(
            "Total: {:.1} km, {} min{}",
            self.distance_km, self.duration_minutes, warn
        )];
        if self.reordered {
            lines.push("Optimized order:".to_string());
            for stop in &self.order {
                lines.push(format!("  {}. {}", stop.number, stop.name));
            }
        } else {
            lines.push("Order unchanged (route drawn from geometry only)".to_string());
        }
        lines.join("\n")
    }
}
