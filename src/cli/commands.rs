use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::rc::Rc;

use crate::cli::error::{user_error, RemoteFailure};
use crate::cli::output::{format_notice, format_task_json, format_task_table, is_tty};
use crate::config::Config;
use crate::lifecycle::{purge_expired, BulkExecutor, BulkOutcome, Outcome, TaskController, ViewContext};
use crate::models::{TaskId, TaskView, Transition};
use crate::repo::{connect, ListFilter, TaskRepository};
use crate::utils::parse_period;

#[derive(Parser)]
#[command(name = "foco")]
#[command(about = "Foco - to-do client with undoable actions and a 30-day trash")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List tasks (active by default)
    List {
        /// Show completed tasks
        #[arg(long, conflicts_with = "trash")]
        completed: bool,
        /// Show the trash with retention countdowns
        #[arg(long)]
        trash: bool,
        /// Only tasks whose title or description contains this text
        #[arg(short = 'q', long)]
        query: Option<String>,
        /// Only tasks touched within this period (e.g. "7", "7d", "2w")
        #[arg(long)]
        period: Option<String>,
        /// Maximum number of tasks to fetch
        #[arg(long)]
        limit: Option<u32>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Create a task
    Add {
        /// Optional longer description
        #[arg(short = 'd', long)]
        description: Option<String>,
        /// Task title
        title: Vec<String>,
    },
    /// Mark active task(s) as completed
    Done {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Move active task(s) to the trash
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Move completed task(s) back to active
    Reopen {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Bring trashed task(s) back to active
    Restore {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Permanently delete a trashed task
    Purge {
        id: String,
    },
    /// Permanently delete trashed tasks past the 30-day retention window
    Sweep,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().context("Failed to load configuration")?;
    log::debug!("using task service at {}", config.api_url);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(handle_command(cli.command, &config))
}

/// Per-invocation wiring: one repository and one notice area shared by the
/// views a command touches
struct Session {
    repo: Rc<dyn TaskRepository>,
    ctx: ViewContext,
    config: Config,
}

impl Session {
    fn open(config: &Config) -> Result<Self> {
        let repo = connect(config).context("Failed to set up the task service client")?;
        Ok(Self {
            repo: Rc::new(repo),
            ctx: ViewContext::system(),
            config: config.clone(),
        })
    }

    fn controller(&self, view: TaskView) -> TaskController {
        TaskController::new(view, self.repo.clone(), &self.ctx).with_placement(self.config.rollback_placement)
    }

    /// A controller whose collection has been loaded
    async fn loaded(&self, view: TaskView) -> Result<TaskController> {
        let controller = self.controller(view);
        controller
            .refresh()
            .await
            .with_context(|| format!("Failed to load {} tasks", view.name()))?;
        Ok(controller)
    }

    /// Text of the notice left by the last operation
    fn notice_text(&self, fallback: &str) -> String {
        match self.ctx.snackbar.current() {
            Some(notice) => notice.text,
            None => fallback.to_string(),
        }
    }

    fn print_notice(&self) {
        if let Some(notice) = self.ctx.snackbar.current() {
            println!("{}", format_notice(&notice, is_tty()));
        }
    }
}

async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::List { completed, trash, query, period, limit, json } => {
            let view = if trash {
                TaskView::Trash
            } else if completed {
                TaskView::Completed
            } else {
                TaskView::Active
            };
            let period_days = period.map(|p| match parse_period(&p) {
                Ok(days) => days,
                Err(e) => user_error(&e.to_string()),
            });
            let filter = ListFilter {
                query: query.map(|q| q.trim().to_string()).filter(|q| !q.is_empty()),
                period_days,
                limit,
            };
            handle_list(config, view, filter, json).await
        }
        Commands::Add { description, title } => handle_add(config, title, description).await,
        Commands::Done { ids } => handle_transition(config, TaskView::Active, Transition::Complete, ids).await,
        Commands::Delete { ids } => handle_transition(config, TaskView::Active, Transition::SoftDelete, ids).await,
        Commands::Reopen { ids } => handle_transition(config, TaskView::Completed, Transition::Reopen, ids).await,
        Commands::Restore { ids } => handle_transition(config, TaskView::Trash, Transition::Restore, ids).await,
        Commands::Purge { id } => handle_purge(config, id).await,
        Commands::Sweep => handle_sweep(config).await,
    }
}

async fn handle_list(config: &Config, view: TaskView, filter: ListFilter, json: bool) -> Result<()> {
    let session = Session::open(config)?;
    let controller = session.controller(view).with_filter(filter);
    controller
        .refresh()
        .await
        .with_context(|| format!("Failed to load {} tasks", view.name()))?;

    let tasks = controller.tasks();
    if json {
        println!("{}", format_task_json(&tasks)?);
    } else {
        let now = controller.clock().now();
        let table = format_task_table(&tasks, view, now, is_tty());
        if table.ends_with('\n') {
            print!("{}", table);
        } else {
            println!("{}", table);
        }
    }
    Ok(())
}

async fn handle_add(config: &Config, title: Vec<String>, description: Option<String>) -> Result<()> {
    let title = title.join(" ");
    let session = Session::open(config)?;
    let controller = session.controller(TaskView::Active);

    match controller.create(&title, description.as_deref()).await? {
        Some(task) => {
            println!("Created task {}: {}", task.id, task.display_title());
            Ok(())
        }
        None => Err(RemoteFailure(session.notice_text("Failed to create task")).into()),
    }
}

/// Parse and de-duplicate ids, keeping their order
fn parse_ids(raw: Vec<String>) -> Vec<TaskId> {
    let mut ids: Vec<TaskId> = Vec::with_capacity(raw.len());
    for id in raw {
        let id = id.trim();
        if id.is_empty() {
            user_error("Task ID cannot be empty");
        }
        let id = TaskId::new(id);
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

fn ensure_listed(controller: &TaskController, ids: &[TaskId]) -> Result<()> {
    for id in ids {
        if controller.get(id).is_none() {
            anyhow::bail!("Task {} not found in {} tasks", id, controller.view().name());
        }
    }
    Ok(())
}

async fn handle_transition(config: &Config, view: TaskView, intent: Transition, raw_ids: Vec<String>) -> Result<()> {
    let ids = parse_ids(raw_ids);
    let session = Session::open(config)?;
    let controller = session.loaded(view).await?;
    ensure_listed(&controller, &ids)?;

    if let [id] = ids.as_slice() {
        return match controller.apply(id, intent).await {
            Outcome::Applied => {
                session.print_notice();
                Ok(())
            }
            Outcome::RolledBack => Err(RemoteFailure(session.notice_text(intent.failure_text())).into()),
            other => anyhow::bail!("Task {} was not changed ({:?})", id, other),
        };
    }

    for id in &ids {
        controller.toggle_selection(id);
    }
    match BulkExecutor::run(&controller, intent).await {
        BulkOutcome::Completed(count) => {
            session.print_notice();
            log::debug!("{} tasks changed", count);
            Ok(())
        }
        BulkOutcome::Refreshed { failed, total } => Err(RemoteFailure(format!(
            "{} ({} of {} failed)",
            session.notice_text(intent.bulk_failure_text()),
            failed,
            total
        ))
        .into()),
        other => anyhow::bail!("No tasks were changed ({:?})", other),
    }
}

async fn handle_purge(config: &Config, raw_id: String) -> Result<()> {
    let ids = parse_ids(vec![raw_id]);
    let session = Session::open(config)?;
    let trash = session.loaded(TaskView::Trash).await?;
    ensure_listed(&trash, &ids)?;

    match trash.hard_delete(&ids[0]).await {
        Outcome::Applied => {
            session.print_notice();
            Ok(())
        }
        Outcome::RolledBack => Err(RemoteFailure(session.notice_text("Failed to delete task")).into()),
        other => anyhow::bail!("Task {} was not deleted ({:?})", ids[0], other),
    }
}

async fn handle_sweep(config: &Config) -> Result<()> {
    let session = Session::open(config)?;
    let now = session.ctx.clock.now();
    let outcomes = purge_expired(session.repo.as_ref(), now)
        .await
        .context("Failed to load trash tasks")?;

    let failed = outcomes.iter().filter(|(_, result)| result.is_err()).count();
    let purged = outcomes.len() - failed;
    if purged == 0 && failed == 0 {
        println!("No expired tasks in the trash.");
        return Ok(());
    }
    println!("Purged {} expired task{}.", purged, if purged == 1 { "" } else { "s" });
    if failed > 0 {
        return Err(RemoteFailure(format!("Failed to purge {} expired task{}", failed, if failed == 1 { "" } else { "s" })).into());
    }
    Ok(())
}
