use super::args::*;
use std::path::Path;
use std::sync::Arc;
use triage_core::classify::{ExternalTriage, RuleEngine};
use triage_core::config::{load_config, TriageConfig};
use triage_core::engine::Pipeline;
use triage_core::flaky::compute_flaky_stats;
use triage_core::providers::llm::openai::OpenAIClient;
use triage_core::providers::llm::LlmClient;
use triage_core::resolver::TriageResolver;
use triage_core::storage::Store;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const BLOCKED: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => cmd_run(args).await,
        Command::Runs(args) => cmd_runs(args),
        Command::Show(args) => cmd_show(args),
        Command::Flaky(args) => cmd_flaky(args),
        Command::Init(args) => cmd_init(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

async fn cmd_run(args: RunArgs) -> anyhow::Result<i32> {
    let cfg = match load_config(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };
    let db = args.db.unwrap_or_else(|| cfg.db.clone());
    ensure_parent_dir(&db)?;

    let store = Store::open(&db)?;
    store.init_schema()?;

    let pipeline = Pipeline {
        store,
        runner: Arc::new(cfg.runner.clone()),
        resolver: build_resolver(&cfg, args.no_external),
        flaky: cfg.flaky,
    };

    let report = pipeline.run_once().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    triage_core::report::console::print_summary(&report);

    Ok(if report.block_ci {
        exit_codes::BLOCKED
    } else {
        exit_codes::OK
    })
}

fn build_resolver(cfg: &TriageConfig, no_external: bool) -> TriageResolver {
    if no_external || cfg.external.provider == "none" {
        return TriageResolver::rules_only();
    }
    // Missing credentials are not an error here: the resolver falls back
    // to rules and records why.
    let client: Option<Arc<dyn LlmClient>> = std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
        .map(|key| {
            Arc::new(OpenAIClient::new(
                cfg.external.model.clone(),
                key,
                cfg.external.temperature,
                cfg.external.max_tokens,
            )) as Arc<dyn LlmClient>
        });
    TriageResolver::new(ExternalTriage::new(client), RuleEngine)
}

fn cmd_runs(args: RunsArgs) -> anyhow::Result<i32> {
    let store = Store::open(&args.db)?;
    store.init_schema()?;
    let runs = store.list_recent(args.limit)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&runs)?);
        return Ok(exit_codes::OK);
    }

    for r in &runs {
        println!(
            "{:>5}  {}  {:<4}  {:<17}  {:<13}  {}",
            r.id,
            r.created_at,
            if r.ok { "ok" } else { "FAIL" },
            r.triage.classification.as_str(),
            r.triage.action.as_str(),
            if r.triage.block_ci { "BLOCK" } else { "-" },
        );
    }
    Ok(exit_codes::OK)
}

fn cmd_show(args: ShowArgs) -> anyhow::Result<i32> {
    let store = Store::open(&args.db)?;
    store.init_schema()?;
    match store.get_run(args.id)? {
        Some(run) => {
            println!("{}", serde_json::to_string_pretty(&run)?);
            Ok(exit_codes::OK)
        }
        None => {
            eprintln!("no run with id {}", args.id);
            Ok(exit_codes::CONFIG_ERROR)
        }
    }
}

fn cmd_flaky(args: FlakyArgs) -> anyhow::Result<i32> {
    let store = Store::open(&args.db)?;
    store.init_schema()?;
    let stats = compute_flaky_stats(&store, args.window, args.min_occurrences)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(exit_codes::OK);
    }

    for (test, s) in &stats {
        println!(
            "{}  runs={} fails={} passes={} fail_rate={:.3}{}",
            test,
            s.runs,
            s.fails,
            s.passes,
            s.fail_rate,
            if s.is_flaky { "  FLAKY" } else { "" },
        );
    }
    Ok(exit_codes::OK)
}

fn cmd_init(args: InitArgs) -> anyhow::Result<i32> {
    if !args.config.exists() {
        if let Some(parent) = args.config.parent() {
            std::fs::create_dir_all(parent)?;
        }
        triage_core::config::write_sample_config(&args.config)?;
        eprintln!("created {}", args.config.display());
    } else {
        eprintln!("note: {} already exists", args.config.display());
    }

    if args.gitignore {
        write_file_if_missing(Path::new(".gitignore"), crate::templates::GITIGNORE)?;
    }

    Ok(exit_codes::OK)
}

fn write_file_if_missing(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    if !path.exists() {
        std::fs::write(path, content)?;
        eprintln!("created {}", path.display());
    } else {
        eprintln!("note: {} already exists (skipped)", path.display());
    }
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
