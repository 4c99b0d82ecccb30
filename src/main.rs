use async_trait::async_trait;
use clap::{Parser, Subcommand};
use saa_orchestrator::config::OrchestratorConfig;
use saa_orchestrator::event::{EventHandler, LoggingEventHandler, WorkflowEvent};
use saa_orchestrator::plugins::PluginRegistry;
use saa_orchestrator::{Orchestrator, SaaResult};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "saa", about = "SAA Orchestrator: plan, fan out and refine with LLM assistants")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the workflow for an objective
    Run {
        /// The objective; several words are joined with spaces
        #[arg(required = true)]
        objective: Vec<String>,
        /// Use a specific plugin for the planning prompt
        #[arg(short, long)]
        plugin: Option<String>,
        /// Number of workers for parallel processing
        #[arg(short, long)]
        workers: Option<usize>,
        /// Model for the main assistant
        #[arg(long)]
        main_model: Option<String>,
        /// Model for the sub assistants
        #[arg(long)]
        sub_model: Option<String>,
        /// Model for the refiner assistant
        #[arg(long)]
        refiner_model: Option<String>,
        /// Custom planning prompt template; `{objective}` is replaced
        #[arg(long)]
        custom_prompt: Option<String>,
        /// Directory receiving exchange_log.md
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// List the available plugins
    ListPlugins,
}

/// Prints workflow progress to stdout and forwards every event to the log.
struct ConsoleProgress;

#[async_trait]
impl EventHandler for ConsoleProgress {
    async fn on_workflow_event(&self, event: &WorkflowEvent) {
        LoggingEventHandler.on_workflow_event(event).await;
        match event {
            WorkflowEvent::PlanReady {
                objective_completion: true,
                ..
            } => println!("Objective answered directly by the planner"),
            WorkflowEvent::PlanReady { task_count, .. } => {
                println!("Plan ready: {} sub-task(s)", task_count)
            }
            WorkflowEvent::TaskStarted {
                index, task, worker, ..
            } => println!("  [{}] {} -> {}", index + 1, task, worker),
            WorkflowEvent::TaskCompleted {
                index,
                task,
                failed,
                ..
            } => {
                let status = if *failed { "failed" } else { "done" };
                println!("  [{}] {} {}", index + 1, task, status);
            }
            WorkflowEvent::SummaryReady { .. } => println!("Summary ready"),
            _ => {}
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run(
    objective: Vec<String>,
    plugin: Option<String>,
    workers: Option<usize>,
    main_model: Option<String>,
    sub_model: Option<String>,
    refiner_model: Option<String>,
    custom_prompt: Option<String>,
    output_dir: Option<PathBuf>,
) -> SaaResult<()> {
    let objective = objective.join(" ");

    let mut config = OrchestratorConfig::from_env()?;
    if let Some(n) = workers {
        config = config.with_num_workers(n);
    }
    if let Some(model) = main_model {
        config = config.with_main_assistant_model(model);
    }
    if let Some(model) = sub_model {
        config = config.with_sub_assistant_model(model);
    }
    if let Some(model) = refiner_model {
        config = config.with_refiner_assistant_model(model);
    }
    if let Some(template) = custom_prompt {
        println!("Using custom prompt template");
        config = config.with_custom_prompt_template(template);
    }
    if let Some(dir) = output_dir {
        config = config.with_output_dir(dir);
    }
    let log_path = config.exchange_log_path();

    println!("Starting SAA Orchestrator");
    if let Some(name) = &plugin {
        println!("Using plugin: {}", name);
    }

    let orchestrator = Orchestrator::new(config)?.with_event_handler(Arc::new(ConsoleProgress));
    let output = orchestrator
        .run_workflow(&objective, plugin.as_deref())
        .await?;

    println!("\nWorkflow completed!\n\nFinal Output:\n{}", output);
    println!("\nExchange log saved to '{}'", log_path.display());
    Ok(())
}

fn list_plugins() {
    let registry = PluginRegistry::with_builtin_plugins();
    let width = registry.names().iter().map(|n| n.len()).max().unwrap_or(0);
    println!("{:<width$}  Description", "Plugin", width = width);
    for plugin in registry.iter() {
        println!(
            "{:<width$}  {}",
            plugin.name(),
            plugin.description(),
            width = width
        );
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    saa_orchestrator::init_logger();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            objective,
            plugin,
            workers,
            main_model,
            sub_model,
            refiner_model,
            custom_prompt,
            output_dir,
        } => {
            run(
                objective,
                plugin,
                workers,
                main_model,
                sub_model,
                refiner_model,
                custom_prompt,
                output_dir,
            )
            .await
        }
        Commands::ListPlugins => {
            list_plugins();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("An error occurred: {}", err);
            ExitCode::FAILURE
        }
    }
}
