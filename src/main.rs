use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

use dropfarm::app::{App, AppError};
use dropfarm::cli::{
    AlertSubcommands, ChoreSubcommands, Cli, Commands, NoteSubcommands, TaskSubcommands,
};
use dropfarm::config::{Config, Overrides};
use dropfarm::coordinator::LoadReport;
use dropfarm::listing::ProjectListFilter;
use dropfarm::search::SearchFacets;
use dropfarm::ui;

const LOCAL_CONFIG_FILE: &str = "dropfarm.toml";

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn print_json(value: &impl serde::Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("json serialization should work")
    );
}

fn run() -> Result<(), AppError> {
    use clap::Parser;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = resolve_config_path(cli.config.clone());
    let overrides = Overrides {
        base_url: cli.api_url.clone(),
        cache_path: cli.db.clone(),
    };
    let config = Config::load(config_path.as_deref(), &overrides)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let app = App::open(&config)?;
    let outcome = runtime.block_on(dispatch(&app, cli.command));
    ui::print_notices(&app.take_notices());
    outcome
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// An explicit path wins; otherwise `dropfarm.toml` in the working directory is used when present.
fn resolve_config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| {
        let local = Path::new(LOCAL_CONFIG_FILE);
        local.is_file().then(|| local.to_path_buf())
    })
}

async fn dispatch(app: &App, command: Commands) -> Result<(), AppError> {
    match command {
        Commands::Login(args) => {
            let report = app.login(&args.token).await?;
            ui::print_load_report(&report);
            println!("signed in");
        }
        Commands::Logout => {
            app.logout()?;
            println!("signed out; local cache cleared");
        }
        Commands::Sync => {
            let report = app.sync().await?;
            print_sync_outcome(&report);
        }
        Commands::Search(args) => {
            let mut facets = SearchFacets::with_types(args.types);
            facets.set_status(args.status);
            let results = app.search(&args.query, &facets);
            if args.json {
                print_json(&results);
            } else {
                ui::print_search_results(&args.query, &results);
            }
        }
        Commands::Projects(args) => {
            let filter = ProjectListFilter {
                include_archived: args.all,
                my_status: args.status,
                chain: args.chain,
                tags: args.tags,
                query: args.query,
            };
            let projects = app.projects(&filter);
            if args.json {
                print_json(&projects);
            } else {
                ui::print_project_list(&projects, &filter);
            }
        }
        Commands::Progress(args) => {
            let view = app.project_progress(&args.project)?;
            if args.json {
                print_json(&view);
            } else {
                ui::print_progress(&view);
            }
        }
        Commands::Tasks(args) => match args.command {
            TaskSubcommands::Done(done) => {
                let project = app.set_tasks_done(&done.project, &done.tasks, true).await?;
                println!("completed {} task(s) in {}", done.tasks.len(), project.name);
            }
            TaskSubcommands::Undo(undo) => {
                let project = app.set_tasks_done(&undo.project, &undo.tasks, false).await?;
                println!("reopened {} task(s) in {}", undo.tasks.len(), project.name);
            }
            TaskSubcommands::Add(add) => {
                let project = app
                    .add_task(&add.project, &add.description, add.parent.as_deref(), add.due)
                    .await?;
                println!("added task to {}", project.name);
            }
        },
        Commands::Notes(args) => match args.command {
            NoteSubcommands::Add(add) => {
                let projects = app.add_note(&add.projects, &add.text).await?;
                println!("noted {} project(s)", projects.len());
            }
        },
        Commands::Promote(args) => {
            let project = app.promote(&args.id).await?;
            println!("promoted {} to project {}", args.id, project.id);
        }
        Commands::Alerts(args) => match args.command {
            Some(AlertSubcommands::Read(read)) => match read.id {
                Some(id) if !read.all => {
                    let alert = app.mark_alert_read(&id).await?;
                    println!("marked {} read", alert.id);
                }
                _ => {
                    let count = app.mark_all_alerts_read().await?;
                    println!("marked {count} alert(s) read");
                }
            },
            None => {
                let alerts = app.alerts(args.unread);
                if args.json {
                    print_json(&alerts);
                } else {
                    ui::print_alerts(&alerts);
                }
            }
        },
        Commands::Chores(args) => match args.command {
            ChoreSubcommands::Done(done) => {
                let chore = app.complete_chore(&done.id).await?;
                println!("completed {}; next due {}", chore.name, chore.next_due);
            }
        },
        Commands::Due(args) => {
            let report = app.due(args.within_days, OffsetDateTime::now_utc());
            if args.json {
                print_json(&report);
            } else {
                ui::print_due(&report, args.within_days);
            }
        }
    }
    Ok(())
}

fn print_sync_outcome(report: &LoadReport) {
    ui::print_load_report(report);
    if report.is_complete() {
        println!("sync complete");
    }
}
