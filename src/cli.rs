use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, Parser, Subcommand};

use crate::domain::MyStatus;
use crate::search::ResultKind;

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

#[derive(Debug, Parser)]
#[command(name = "dropfarm")]
#[command(bin_name = "dropfarm")]
#[command(version)]
#[command(about = "Track airdrop projects, tasks and wallets from the terminal")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'c',
        long,
        env = "DROPFARM_CONFIG",
        help = "Path to a dropfarm.toml config file."
    )]
    pub config: Option<PathBuf>,

    #[arg(
        short = 'd',
        long,
        env = "DROPFARM_DB",
        help = "Path to the local SQLite cache database."
    )]
    pub db: Option<String>,

    #[arg(long, env = "DROPFARM_API_URL", help = "Base URL of the dropfarm API.")]
    pub api_url: Option<String>,

    #[arg(short = 'v', long, help = "Log gateway requests and load reports to stderr.")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Store an API token and load every family.")]
    Login(LoginArgs),
    #[command(about = "Forget the token and clear the local cache.")]
    Logout,
    #[command(about = "Reload every family from the API.")]
    Sync,
    #[command(about = "Search the cached catalog.")]
    Search(SearchArgs),
    #[command(about = "List projects with filtering.")]
    Projects(ProjectsArgs),
    #[command(about = "Show a project's task tree and completion.")]
    Progress(ProgressArgs),
    #[command(about = "Complete, reopen or add project tasks.")]
    Tasks(TasksArgs),
    #[command(about = "Append notes to projects.")]
    Notes(NotesArgs),
    #[command(about = "Promote a watchlist item into a project.")]
    Promote(PromoteArgs),
    #[command(about = "List alerts or mark them read.")]
    Alerts(AlertsArgs),
    #[command(about = "Manage recurring chores.")]
    Chores(ChoresArgs),
    #[command(about = "Show tasks and chores coming due.")]
    Due(DueArgs),
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(long, env = "DROPFARM_TOKEN", help = "API token for the dropfarm account.")]
    pub token: String,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(help = "Search text; quote phrases with double quotes.")]
    pub query: String,

    #[arg(
        short = 't',
        long = "type",
        value_name = "KIND",
        help = "Restrict results to a kind (repeatable)."
    )]
    pub types: Vec<ResultKind>,

    #[arg(
        short = 's',
        long,
        help = "Only projects and tasks with this personal status."
    )]
    pub status: Option<MyStatus>,

    #[arg(long, help = "Print JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ProjectsArgs {
    #[arg(short = 'a', long, help = "Include archived projects.")]
    pub all: bool,

    #[arg(short = 's', long, help = "Filter by personal status.")]
    pub status: Option<MyStatus>,

    #[arg(long, help = "Filter by chain (case-insensitive).")]
    pub chain: Option<String>,

    #[arg(long = "tag", help = "Require a tag (repeatable).")]
    pub tags: Vec<String>,

    #[arg(short = 'q', long, help = "Substring match over name, chain, notes and tags.")]
    pub query: Option<String>,

    #[arg(long, help = "Print JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ProgressArgs {
    #[arg(help = "Project id or name.")]
    pub project: String,

    #[arg(long, help = "Print JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct TasksArgs {
    #[command(subcommand)]
    pub command: TaskSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum TaskSubcommands {
    #[command(about = "Mark tasks completed.")]
    Done(TaskCompletionArgs),
    #[command(about = "Mark tasks open again.")]
    Undo(TaskCompletionArgs),
    #[command(about = "Add a task, optionally under a parent task.")]
    Add(TaskAddArgs),
}

#[derive(Debug, Args)]
pub struct TaskCompletionArgs {
    #[arg(help = "Project id or name.")]
    pub project: String,

    #[arg(required = true, help = "Task ids.")]
    pub tasks: Vec<String>,
}

#[derive(Debug, Args)]
pub struct TaskAddArgs {
    #[arg(help = "Project id or name.")]
    pub project: String,

    #[arg(help = "Task description.")]
    pub description: String,

    #[arg(long, help = "Parent task id.")]
    pub parent: Option<String>,

    #[arg(long, help = "Due date (YYYY-MM-DD or RFC3339).")]
    pub due: Option<String>,
}

#[derive(Debug, Args)]
pub struct NotesArgs {
    #[command(subcommand)]
    pub command: NoteSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum NoteSubcommands {
    #[command(about = "Append the same note to one or more projects.")]
    Add(NoteAddArgs),
}

#[derive(Debug, Args)]
pub struct NoteAddArgs {
    #[arg(required = true, help = "Project ids or names.")]
    pub projects: Vec<String>,

    #[arg(long, help = "Note text.")]
    pub text: String,
}

#[derive(Debug, Args)]
pub struct PromoteArgs {
    #[arg(help = "Watchlist item id.")]
    pub id: String,
}

#[derive(Debug, Args)]
#[command(args_conflicts_with_subcommands = true)]
pub struct AlertsArgs {
    #[arg(short = 'u', long, help = "Only unread alerts.")]
    pub unread: bool,

    #[arg(long, help = "Print JSON output.")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<AlertSubcommands>,
}

#[derive(Debug, Subcommand)]
pub enum AlertSubcommands {
    #[command(about = "Mark one alert, or every alert, read.")]
    Read(AlertReadArgs),
}

#[derive(Debug, Args)]
pub struct AlertReadArgs {
    #[arg(required_unless_present = "all", conflicts_with = "all", help = "Alert id.")]
    pub id: Option<String>,

    #[arg(long, help = "Mark every alert read.")]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct ChoresArgs {
    #[command(subcommand)]
    pub command: ChoreSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum ChoreSubcommands {
    #[command(about = "Record a completion and advance the next due date.")]
    Done(ChoreDoneArgs),
}

#[derive(Debug, Args)]
pub struct ChoreDoneArgs {
    #[arg(help = "Recurring task id.")]
    pub id: String,
}

#[derive(Debug, Args)]
pub struct DueArgs {
    #[arg(long, default_value_t = 7, help = "Look-ahead window in days.")]
    pub within_days: u32,

    #[arg(long, help = "Print JSON output.")]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{AlertSubcommands, Cli, Commands, TaskSubcommands};
    use crate::domain::MyStatus;
    use crate::search::ResultKind;

    #[test]
    fn parses_search_facets() {
        let cli = Cli::try_parse_from([
            "dropfarm", "search", "\"bridge funds\"", "--type", "tasks", "-t", "project", "--status",
            "in-progress", "--json",
        ])
        .expect("search should parse");
        let Commands::Search(args) = cli.command else {
            panic!("expected search command");
        };
        assert_eq!(args.query, "\"bridge funds\"");
        assert_eq!(args.types, vec![ResultKind::Task, ResultKind::Project]);
        assert_eq!(args.status, Some(MyStatus::InProgress));
        assert!(args.json);
    }

    #[test]
    fn parses_nested_subcommands() {
        let cli = Cli::try_parse_from(["dropfarm", "tasks", "done", "Linea Voyage", "t-1", "t-2"])
            .expect("tasks done should parse");
        let Commands::Tasks(args) = cli.command else {
            panic!("expected tasks command");
        };
        let TaskSubcommands::Done(done) = args.command else {
            panic!("expected done subcommand");
        };
        assert_eq!(done.project, "Linea Voyage");
        assert_eq!(done.tasks, vec!["t-1", "t-2"]);

        let cli = Cli::try_parse_from(["dropfarm", "alerts", "read", "--all"])
            .expect("alerts read should parse");
        let Commands::Alerts(args) = cli.command else {
            panic!("expected alerts command");
        };
        assert!(matches!(
            args.command,
            Some(AlertSubcommands::Read(ref read)) if read.all && read.id.is_none()
        ));
    }

    #[test]
    fn rejects_invalid_input() {
        assert!(Cli::try_parse_from(["dropfarm", "projects", "--status", "sleeping"]).is_err());
        assert!(Cli::try_parse_from(["dropfarm", "alerts", "read"]).is_err());
        assert!(Cli::try_parse_from(["dropfarm", "tasks", "undo", "p-1"]).is_err());
    }
}
