use anyhow::Context;
use bill_manager::config::cli::Command;
use bill_manager::utils::logger;
use bill_manager::{
    BillService, BillValidationService, CliConfig, FileBillStore, Settings, SubmitOutcome,
    TomlConfig, ViewOutcome,
};
use clap::Parser;
use std::process::ExitCode;

const EXIT_STORAGE_FAILURE: u8 = 1;
const EXIT_INVALID_INPUT: u8 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = CliConfig::parse();

    let file = cli
        .config
        .as_ref()
        .map(|path| {
            TomlConfig::from_file(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))
        })
        .transpose()?;
    let settings = Settings::resolve(file.as_ref(), cli.overrides())
        .context("Configuration validation failed")?;

    // 初始化日誌
    if settings.log_json {
        logger::init_json_logger(settings.verbose);
    } else {
        logger::init_cli_logger(settings.verbose);
    }
    tracing::debug!("Resolved settings: {:?}", settings);

    let store = match FileBillStore::open(&settings.root_dir) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("❌ {} ({})", e, e.failure());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            return Ok(ExitCode::from(EXIT_STORAGE_FAILURE));
        }
    };
    let service = BillService::new(BillValidationService::new(settings.locale), store);

    let code = match cli.command {
        Command::Save(args) => {
            let outcome = service.submit(&args.form(), settings.default_format).await;
            report_submit(&outcome)
        }
        Command::Last => report_view(&service.view_last().await),
    };
    Ok(code)
}

fn report_submit(outcome: &SubmitOutcome) -> ExitCode {
    match outcome {
        SubmitOutcome::Saved {
            stored, summary, ..
        } => {
            println!("✅ {}", outcome.status_message());
            println!("{}", summary);
            println!("📁 {}", stored.file_path.display());
            ExitCode::SUCCESS
        }
        SubmitOutcome::Invalid { errors } => {
            eprintln!("❌ {}", outcome.status_message());
            for error in errors {
                eprintln!("  - {}", error);
            }
            ExitCode::from(EXIT_INVALID_INPUT)
        }
        SubmitOutcome::Failed { .. } | SubmitOutcome::Busy => {
            eprintln!("❌ {}", outcome.status_message());
            ExitCode::from(EXIT_STORAGE_FAILURE)
        }
    }
}

fn report_view(outcome: &ViewOutcome) -> ExitCode {
    match outcome {
        ViewOutcome::Loaded {
            summary, details, ..
        } => {
            println!("{}", summary);
            print!("{}", details);
            ExitCode::SUCCESS
        }
        ViewOutcome::Empty => {
            println!("{}", outcome.status_message());
            ExitCode::SUCCESS
        }
        ViewOutcome::Failed { .. } => {
            eprintln!("❌ {}", outcome.status_message());
            ExitCode::from(EXIT_STORAGE_FAILURE)
        }
    }
}
