//! Command-line surface for the almwork core.
//!
//! This is a thin, single-process demonstration harness over C1–C8 — the
//! illustrative REST routes are given here as subcommands instead of HTTP
//! paths, against the in-memory graph backend. It exists so the core can
//! be exercised end-to-end without standing up an HTTP/REST surface,
//! which stays out of scope for this crate.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use almwork_config::AlmConfig;
use almwork_domain::{CreateWorkItem, UpdateWorkItem, WorkItemStatus, WorkItemType};
use almwork_matcher::{AllocationKind, CreateMilestone};
use almwork_scheduler::ScheduleRequest;
use almwork_sprint::CreateSprint;
use almwork_store::SearchFilters;
use chrono::NaiveDate;

use crate::context::AppContext;

/// almwork — versioned work-item graph store, signature engine, scheduler,
/// sprint coordinator, and email ingestion for a regulated ALM/PLM backend.
#[derive(Parser)]
#[command(name = "almwork")]
#[command(about = "ALM/PLM work-management core: work items, signatures, sprints, scheduling")]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config overlay (environment variables still apply on top).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Caller identity recorded on audit events and snapshot ownership fields.
    #[arg(long, global = true, default_value = "cli")]
    pub actor: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Work-item CRUD, search, comparison, and restore (C3).
    #[command(subcommand)]
    Item(ItemCommand),
    /// Digital signature sign/verify/invalidate/query (C1+C4).
    #[command(subcommand)]
    Signature(SignatureCommand),
    /// Sprint and backlog coordination (C5).
    #[command(subcommand)]
    Sprint(SprintCommand),
    /// Project scheduling (C6).
    #[command(subcommand)]
    Schedule(ScheduleCommand),
    /// Milestones, dependencies, and resource allocation/matching (C8).
    #[command(subcommand)]
    Resource(ResourceCommand),
    /// Generates a fresh RSA keypair for signing (PEM, stdout).
    Keygen,
}

#[derive(Subcommand)]
pub enum ItemCommand {
    /// Creates a work item from a JSON `CreateWorkItem` payload.
    Create {
        /// Path to a JSON file, or `-`/omitted to read stdin.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Fetches the current version.
    Get { id: Uuid },
    /// Fetches a specific `MAJOR.MINOR` version.
    GetVersion { id: Uuid, version: String },
    /// Lists every version, newest first.
    History { id: Uuid },
    /// Applies a sparse update from a JSON `UpdateWorkItem` payload.
    Update {
        id: Uuid,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Deletes a work item; refused if it carries a valid signature unless `--force`.
    Delete {
        id: Uuid,
        #[arg(long)]
        force: bool,
    },
    /// Searches current snapshots.
    Search {
        #[arg(long)]
        text: Option<String>,
        #[arg(long, value_enum)]
        r#type: Option<ItemTypeArg>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long, default_value_t = 100)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Diffs two versions of the same work item.
    Compare { id: Uuid, version_a: String, version_b: String },
    /// Writes `target_version`'s fields as a new version on top of current.
    Restore { id: Uuid, target_version: String },
}

#[derive(Clone, clap::ValueEnum)]
pub enum ItemTypeArg {
    Requirement,
    Task,
    TestSpec,
    TestRun,
    Risk,
    Document,
}

impl From<ItemTypeArg> for WorkItemType {
    fn from(value: ItemTypeArg) -> Self {
        match value {
            ItemTypeArg::Requirement => Self::Requirement,
            ItemTypeArg::Task => Self::Task,
            ItemTypeArg::TestSpec => Self::TestSpec,
            ItemTypeArg::TestRun => Self::TestRun,
            ItemTypeArg::Risk => Self::Risk,
            ItemTypeArg::Document => Self::Document,
        }
    }
}

#[derive(Subcommand)]
pub enum SignatureCommand {
    /// Signs the current snapshot of a work item.
    Sign {
        workitem_id: Uuid,
        #[arg(long)]
        user_id: String,
        /// Path to a PEM-encoded PKCS#8 private key; defaults to the configured key.
        #[arg(long)]
        key_file: Option<PathBuf>,
    },
    /// Verifies a signature against the work item's current snapshot.
    Verify {
        signature_id: Uuid,
        #[arg(long)]
        key_file: Option<PathBuf>,
    },
    /// Lists signatures on a work item.
    List {
        workitem_id: Uuid,
        #[arg(long)]
        include_invalid: bool,
    },
}

#[derive(Subcommand)]
pub enum SprintCommand {
    /// Creates a sprint in `planning` status.
    Create {
        #[arg(long)]
        project_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        goal: Option<String>,
        #[arg(long)]
        start_date: NaiveDate,
        #[arg(long)]
        end_date: NaiveDate,
        #[arg(long)]
        capacity_hours: Option<f64>,
        #[arg(long)]
        capacity_story_points: Option<u32>,
    },
    Get { id: Uuid },
    /// Transitions `planning -> active`; rejected if the project already has one active.
    Start { id: Uuid },
    Cancel { id: Uuid },
    /// Transitions `active -> completed`, returning unfinished ready tasks to the backlog.
    Complete { id: Uuid },
    Delete { id: Uuid },
    AssignTask { sprint_id: Uuid, work_item_id: Uuid },
    /// Pulls a `ready` task back out of a sprint and onto its project's backlog.
    ReturnTask { sprint_id: Uuid, work_item_id: Uuid },
    Velocity { id: Uuid },
    Burndown { id: Uuid },
    TeamVelocity {
        project_id: String,
        #[arg(long, default_value_t = 3)]
        n: usize,
    },
    /// Direct backlog membership, independent of sprint assignment.
    BacklogAdd { project_id: String, work_item_id: Uuid },
    BacklogRemove { project_id: String, work_item_id: Uuid },
    BacklogGet { project_id: String },
}

#[derive(Subcommand)]
pub enum ScheduleCommand {
    /// Runs the scheduler for a JSON `ScheduleRequest` payload.
    Solve {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Returns the last stored schedule for a project.
    Get { project_id: String },
}

#[derive(Subcommand)]
pub enum ResourceCommand {
    CreateMilestone {
        #[arg(long)]
        project_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        target_date: NaiveDate,
    },
    ListMilestones { project_id: String },
    TieWorkItem { milestone_id: Uuid, work_item_id: Uuid },
    /// Records that `dependent` must complete after `dependency`; rejected on cycle.
    AddDependency { dependent: Uuid, dependency: Uuid },
    Allocate {
        resource_id: Uuid,
        #[arg(long, value_enum)]
        kind: AllocationKindArg,
        #[arg(long)]
        target_ref: String,
        #[arg(long)]
        lead: bool,
    },
    Deallocate {
        resource_id: Uuid,
        #[arg(long, value_enum)]
        kind: AllocationKindArg,
        #[arg(long)]
        target_ref: String,
    },
    /// Scores and ranks candidate resources (a JSON `Resource[]` payload)
    /// against a task's `skills_needed`.
    Rank {
        work_item_id: Uuid,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long = "department")]
        linked_departments: Vec<String>,
    },
}

#[derive(Clone, clap::ValueEnum)]
pub enum AllocationKindArg {
    Project,
    Task,
}

impl From<AllocationKindArg> for AllocationKind {
    fn from(value: AllocationKindArg) -> Self {
        match value {
            AllocationKindArg::Project => Self::Project,
            AllocationKindArg::Task => Self::Task,
        }
    }
}

fn read_payload(file: Option<PathBuf>) -> Result<String> {
    match file {
        Some(path) if path != PathBuf::from("-") => {
            std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))
        }
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading JSON payload from stdin")?;
            Ok(buf)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parses CLI arguments and runs the requested command, wiring up
/// [`AppContext`] from configuration discovered per `--config`/environment.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = AlmConfig::load(cli.config.as_deref()).context("loading configuration")?;
    crate::logging::init(config.log_format).ok();

    let ctx = AppContext::new(config).context("constructing application context")?;
    dispatch(&ctx, &cli.actor, cli.command).await
}

async fn dispatch(ctx: &AppContext, actor: &str, command: Command) -> Result<()> {
    match command {
        Command::Item(cmd) => run_item(ctx, actor, cmd).await,
        Command::Signature(cmd) => run_signature(ctx, actor, cmd).await,
        Command::Sprint(cmd) => run_sprint(ctx, actor, cmd).await,
        Command::Schedule(cmd) => run_schedule(ctx, cmd).await,
        Command::Resource(cmd) => run_resource(ctx, actor, cmd).await,
        Command::Keygen => {
            let (private_pem, public_pem) = almwork_canon::generate_keypair()?;
            print_json(&serde_json::json!({ "private_key_pem": private_pem, "public_key_pem": public_pem }))
        }
    }
}

async fn run_item(ctx: &AppContext, actor: &str, cmd: ItemCommand) -> Result<()> {
    match cmd {
        ItemCommand::Create { file } => {
            let payload: CreateWorkItem = serde_json::from_str(&read_payload(file)?)
                .context("parsing CreateWorkItem JSON")?;
            print_json(&ctx.store.create(payload, actor).await?)
        }
        ItemCommand::Get { id } => match ctx.store.get(id).await? {
            Some(item) => print_json(&item),
            None => bail!("work item {id} not found"),
        },
        ItemCommand::GetVersion { id, version } => match ctx.store.get_version(id, &version).await? {
            Some(item) => print_json(&item),
            None => bail!("work item {id} version {version} not found"),
        },
        ItemCommand::History { id } => print_json(&ctx.store.history(id).await?),
        ItemCommand::Update { id, file } => {
            let update: UpdateWorkItem = serde_json::from_str(&read_payload(file)?)
                .context("parsing UpdateWorkItem JSON")?;
            print_json(&ctx.store.update(id, update, actor).await?)
        }
        ItemCommand::Delete { id, force } => {
            ctx.store.delete(id, force, actor).await?;
            Ok(())
        }
        ItemCommand::Search {
            text,
            r#type,
            status,
            limit,
            offset,
        } => {
            let mut filters = SearchFilters::new().with_limit(limit);
            filters.free_text = text;
            filters.work_item_type = r#type.map(Into::into);
            filters.status = status.as_deref().and_then(WorkItemStatus::parse_with_aliases);
            filters.offset = offset;
            print_json(&ctx.store.search(filters).await?)
        }
        ItemCommand::Compare { id, version_a, version_b } => {
            let comparison = ctx.store.compare(id, &version_a, &version_b).await?;
            print_json(&serde_json::json!({
                "changed_fields": comparison.changed_fields,
                "unchanged_fields": comparison.unchanged_fields,
                "added_fields": comparison.added_fields,
                "removed_fields": comparison.removed_fields,
            }))
        }
        ItemCommand::Restore { id, target_version } => {
            print_json(&ctx.store.restore(id, &target_version, actor).await?)
        }
    }
}

async fn run_signature(ctx: &AppContext, actor: &str, cmd: SignatureCommand) -> Result<()> {
    match cmd {
        SignatureCommand::Sign { workitem_id, user_id, key_file } => {
            let pem = load_key(ctx, key_file, true)?;
            print_json(&ctx.signatures.sign(workitem_id, &user_id, &pem, actor).await?)
        }
        SignatureCommand::Verify { signature_id, key_file } => {
            let pem = load_key(ctx, key_file, false)?;
            print_json(&ctx.signatures.verify(signature_id, &pem).await?)
        }
        SignatureCommand::List { workitem_id, include_invalid } => {
            print_json(&ctx.signatures.signatures_for(workitem_id, include_invalid).await?)
        }
    }
}

fn load_key(ctx: &AppContext, key_file: Option<PathBuf>, private: bool) -> Result<String> {
    if let Some(path) = key_file {
        return std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()));
    }
    let configured = if private {
        ctx.config.keys.private_key_pem.as_ref().map(|s| s.expose().to_string())
    } else {
        ctx.config.keys.public_key_pem.clone()
    };
    configured.context("no key file given and none configured (KEY_MATERIAL_* / --key-file)")
}

async fn run_sprint(ctx: &AppContext, actor: &str, cmd: SprintCommand) -> Result<()> {
    match cmd {
        SprintCommand::Create {
            project_id,
            name,
            goal,
            start_date,
            end_date,
            capacity_hours,
            capacity_story_points,
        } => {
            if end_date <= start_date {
                bail!("end_date must be after start_date");
            }
            let input = CreateSprint {
                project_id,
                name,
                goal,
                start_date,
                end_date,
                capacity_hours,
                capacity_story_points,
            };
            print_json(&ctx.sprints.create_sprint(input, actor).await?)
        }
        SprintCommand::Get { id } => print_json(&ctx.sprints.get_sprint(id).await?),
        SprintCommand::Start { id } => print_json(&ctx.sprints.start_sprint(id, actor).await?),
        SprintCommand::Cancel { id } => print_json(&ctx.sprints.cancel_sprint(id, actor).await?),
        SprintCommand::Complete { id } => print_json(&ctx.sprints.complete_sprint(id, actor).await?),
        SprintCommand::Delete { id } => {
            ctx.sprints.delete_sprint(id, actor).await?;
            Ok(())
        }
        SprintCommand::AssignTask { sprint_id, work_item_id } => {
            print_json(&ctx.sprints.assign_to_sprint(sprint_id, work_item_id, actor).await?)
        }
        SprintCommand::ReturnTask { sprint_id, work_item_id } => {
            ctx.sprints.return_to_backlog(sprint_id, work_item_id, actor).await?;
            Ok(())
        }
        SprintCommand::Velocity { id } => {
            let (hours, points) = ctx.sprints.velocity(id).await?;
            print_json(&serde_json::json!({ "hours": hours, "story_points": points }))
        }
        SprintCommand::Burndown { id } => print_json(&ctx.sprints.burndown(id).await?),
        SprintCommand::TeamVelocity { project_id, n } => {
            let (hours, points) = ctx.sprints.team_avg_velocity(&project_id, n).await?;
            print_json(&serde_json::json!({ "avg_hours": hours, "avg_story_points": points }))
        }
        SprintCommand::BacklogAdd { project_id, work_item_id } => {
            print_json(&ctx.sprints.add_to_backlog(&project_id, work_item_id, actor).await?)
        }
        SprintCommand::BacklogRemove { project_id, work_item_id } => {
            print_json(&ctx.sprints.remove_from_backlog(&project_id, work_item_id, actor).await?)
        }
        SprintCommand::BacklogGet { project_id } => print_json(&ctx.sprints.get_backlog(&project_id).await?),
    }
}

async fn run_schedule(ctx: &AppContext, cmd: ScheduleCommand) -> Result<()> {
    match cmd {
        ScheduleCommand::Solve { file } => {
            let request: ScheduleRequest =
                serde_json::from_str(&read_payload(file)?).context("parsing ScheduleRequest JSON")?;
            print_json(&ctx.scheduler.solve(request).await?)
        }
        ScheduleCommand::Get { project_id } => match ctx.scheduler.get(&project_id) {
            Some(result) => print_json(&result),
            None => bail!("project {project_id} has no stored schedule"),
        },
    }
}

async fn run_resource(ctx: &AppContext, actor: &str, cmd: ResourceCommand) -> Result<()> {
    match cmd {
        ResourceCommand::CreateMilestone { project_id, name, target_date } => {
            let input = CreateMilestone { project_id, name, target_date };
            print_json(&ctx.matcher.create_milestone(input, actor).await?)
        }
        ResourceCommand::ListMilestones { project_id } => {
            print_json(&ctx.matcher.list_milestones(&project_id).await?)
        }
        ResourceCommand::TieWorkItem { milestone_id, work_item_id } => {
            print_json(&ctx.matcher.tie_work_item(milestone_id, work_item_id, actor).await?)
        }
        ResourceCommand::AddDependency { dependent, dependency } => {
            print_json(&ctx.matcher.add_dependency(dependent, dependency, actor).await?)
        }
        ResourceCommand::Allocate { resource_id, kind, target_ref, lead } => {
            print_json(
                &ctx.matcher
                    .allocate_resource(resource_id, kind.into(), target_ref, lead, actor)
                    .await?,
            )
        }
        ResourceCommand::Deallocate { resource_id, kind, target_ref } => {
            ctx.matcher
                .deallocate_resource(resource_id, kind.into(), &target_ref, actor)
                .await?;
            Ok(())
        }
        ResourceCommand::Rank { work_item_id, file, linked_departments } => {
            let candidates: Vec<almwork_domain::Resource> =
                serde_json::from_str(&read_payload(file)?).context("parsing Resource[] JSON")?;
            print_json(
                &ctx.matcher
                    .rank_candidates(work_item_id, &candidates, &linked_departments)
                    .await?,
            )
        }
    }
}
