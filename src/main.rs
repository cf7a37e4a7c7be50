use clap::Parser;
use cxr_extract::{
    plan, Cli, CxrError, CxrExtract, OutputFormatter, OutputMode, RunStatus, Selection,
    UserFriendlyError,
};
use std::process;

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    process::exit(exit_code);
}

async fn run() -> i32 {
    let cli = Cli::parse();

    // Handle special commands first
    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let app = match CxrExtract::from_cli(&cli) {
        Ok(app) => app,
        Err(e) => {
            print_startup_error(&e);
            return 1;
        }
    };

    if cli.list {
        return handle_list(&cli, &app).await;
    }

    if cli.dry_run {
        return handle_dry_run(&cli, &app);
    }

    let options = match cli.selection_options(app.config()) {
        Ok(options) => options,
        Err(e) => {
            app.handle_error(&e);
            return 2;
        }
    };

    match app.run(&cli.input, &options).await {
        Ok(report) => {
            app.output_formatter().print_batch_report(&report);

            match report.run_status() {
                RunStatus::Success => 0,
                RunStatus::Partial => 2,
            }
        }
        Err(e) => {
            app.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(error: &CxrError) -> i32 {
    match error {
        CxrError::Cancelled => 130, // Interrupted (SIGINT)
        CxrError::InvalidSelection { .. }
        | CxrError::FrameNotFound { .. }
        | CxrError::DuplicateFrame { .. } => 2,
        CxrError::InvalidInput { .. } => 3,
        CxrError::ToolUnavailable { .. } => 4,
        CxrError::NoSequencesFound { .. } => 6,
        _ => 1, // General error
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "cxr-extract.toml".to_string());

    match CxrExtract::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  cxr-extract <input> --config {}", config_path);
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

async fn handle_list(cli: &Cli, app: &CxrExtract) -> i32 {
    let formatter = app.output_formatter();

    let outcome = match app.scan(&cli.input) {
        Ok(outcome) => outcome,
        Err(e) => {
            app.handle_error(&e);
            return exit_code_for(&e);
        }
    };

    if outcome.is_empty() {
        let error = CxrError::NoSequencesFound {
            path: cli.input.clone(),
            extension: app.config().scan.extension.clone(),
        };
        app.handle_error(&error);
        return exit_code_for(&error);
    }

    for sequence in &outcome.sequences {
        let (first, last) = sequence.frame_range();
        println!(
            "{} — {} frame(s) [{:04} - {:04}] in {}",
            sequence.base_name(),
            sequence.len(),
            first,
            last,
            sequence.directory().display()
        );

        for duplicate in sequence.duplicates() {
            formatter.warning(&format!(
                "  duplicate frame {}: {}",
                duplicate.number,
                duplicate.discarded.display()
            ));
        }

        match app.list_elements(sequence).await {
            Ok(elements) if elements.is_empty() => {
                println!("  (no element manifest in {})", elements.representative());
            }
            Ok(elements) => {
                for name in elements.names() {
                    println!("  - {}", name);
                }
            }
            Err(e) => {
                // One unreadable sequence should not hide its siblings.
                formatter.warning(&format!("  cannot list elements: {}", e.user_message()));
            }
        }
    }

    for skipped in &outcome.skipped {
        formatter.warning(&format!(
            "Skipped {}: {}",
            skipped.path.display(),
            skipped.reason
        ));
    }

    0
}

fn handle_dry_run(cli: &Cli, app: &CxrExtract) -> i32 {
    let formatter = app.output_formatter();

    formatter.info("DRY RUN MODE - No extractions will be performed");
    formatter.print_separator();

    let outcome = match app.scan(&cli.input) {
        Ok(outcome) => outcome,
        Err(e) => {
            app.handle_error(&e);
            return exit_code_for(&e);
        }
    };

    if outcome.is_empty() {
        let error = CxrError::NoSequencesFound {
            path: cli.input.clone(),
            extension: app.config().scan.extension.clone(),
        };
        app.handle_error(&error);
        return exit_code_for(&error);
    }

    let options = match cli.selection_options(app.config()) {
        Ok(options) => options,
        Err(e) => {
            app.handle_error(&e);
            return 2;
        }
    };

    let selection = match Selection::from_scan(outcome.sequences, &options) {
        Ok(selection) => selection,
        Err(e) => {
            app.handle_error(&e);
            return exit_code_for(&e);
        }
    };

    let items = match plan(&selection) {
        Ok(items) => items,
        Err(e) => {
            app.handle_error(&e);
            return exit_code_for(&e);
        }
    };

    println!("Extraction plan ({} item(s)):", items.len());
    for item in &items {
        let action = if !selection.overwrite && item.output.exists() {
            "skip (exists)"
        } else {
            "extract"
        };
        println!("  {:>14}  {}", action, item.output.display());
    }

    formatter.print_separator();
    formatter.success("Dry run completed successfully");
    formatter.info("Run without --dry-run to perform the extraction");

    0
}

fn print_startup_error(error: &CxrError) {
    // Create a basic formatter for startup errors
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use cxr_extract::Config;
    use std::fs;
    use tempfile::TempDir;

    fn cli_for(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_generate_config_command() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let cli = cli_for(&[
            "cxr-extract",
            "unused-input",
            "--generate-config",
            "--config",
            config_path.to_str().unwrap(),
        ]);

        let exit_code = handle_generate_config(&cli);
        assert_eq!(exit_code, 0);
        assert!(config_path.exists());

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[scan]"));
    }

    #[test]
    fn test_dry_run_mode() {
        let temp_dir = TempDir::new().unwrap();
        for n in 1..=2 {
            fs::write(temp_dir.path().join(format!("shot.{:04}.cxr", n)), b"cxr").unwrap();
        }

        let cli = cli_for(&[
            "cxr-extract",
            temp_dir.path().to_str().unwrap(),
            "--dry-run",
            "--elements",
            "BEAUTY",
            "--quiet",
            "--output-format",
            "plain",
        ]);

        let app = CxrExtract::new_for_test(Config::default(), OutputMode::Plain, 0, true);
        let exit_code = handle_dry_run(&cli, &app);
        assert_eq!(exit_code, 0);
    }

    #[test]
    fn test_dry_run_on_empty_directory() {
        let temp_dir = TempDir::new().unwrap();

        let cli = cli_for(&[
            "cxr-extract",
            temp_dir.path().to_str().unwrap(),
            "--dry-run",
            "--quiet",
            "--output-format",
            "plain",
        ]);

        let app = CxrExtract::new_for_test(Config::default(), OutputMode::Plain, 0, true);
        let exit_code = handle_dry_run(&cli, &app);
        assert_eq!(exit_code, 6);
    }

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(exit_code_for(&CxrError::Cancelled), 130);
        assert_eq!(
            exit_code_for(&CxrError::InvalidInput {
                path: "/x".into()
            }),
            3
        );
        assert_eq!(
            exit_code_for(&CxrError::ToolUnavailable {
                path: "/x".into()
            }),
            4
        );
        assert_eq!(
            exit_code_for(&CxrError::NoSequencesFound {
                path: "/x".into(),
                extension: "cxr".to_string()
            }),
            6
        );
        assert_eq!(
            exit_code_for(&CxrError::ExtractionFailed {
                detail: "x".to_string()
            }),
            1
        );
    }
}
