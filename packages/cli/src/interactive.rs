//! Interactive mode, used when `job_market` is run without a subcommand.
//!
//! Picks up `job_market.toml` from the working directory when present and
//! prompts for what to run, which sections to rewrite and any extra
//! category merges.

use std::path::Path;

use dialoguer::{Confirm, Input, MultiSelect, Select};
use job_market_cli_utils::MultiProgress;
use job_market_listing::relabel::CategoryRelabel;
use job_market_pipeline::config::PipelineConfig;
use job_market_pipeline::sections::Section;

const DEFAULT_CONFIG: &str = "job_market.toml";

enum Action {
    RunAll,
    RunSelected,
    Validate,
    ListSections,
}

impl Action {
    const ALL: &[Self] = &[
        Self::RunAll,
        Self::RunSelected,
        Self::Validate,
        Self::ListSections,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::RunAll => "Rebuild every section",
            Self::RunSelected => "Rebuild selected sections",
            Self::Validate => "Validate input only",
            Self::ListSections => "List sections",
        }
    }
}

fn prompt_merges(config: &mut PipelineConfig) -> Result<(), Box<dyn std::error::Error>> {
    if !config.category_merges.is_empty() {
        println!("Category merges from configuration:");
        for (old, new) in &config.category_merges {
            println!("  {old} -> {new}");
        }
    }

    let add = Confirm::new()
        .with_prompt("Add category merges?")
        .default(false)
        .interact()?;
    if !add {
        return Ok(());
    }

    loop {
        let raw: String = Input::new()
            .with_prompt("Merge as OLD=NEW (empty to finish)")
            .allow_empty(true)
            .interact_text()?;
        if raw.trim().is_empty() {
            return Ok(());
        }
        match CategoryRelabel::parse_pair(&raw) {
            Ok((old, new)) => {
                config.category_merges.insert(old, new);
            }
            Err(e) => println!("{e}"),
        }
    }
}

/// Runs the interactive flow.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected action fails.
pub fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("Job Market Statistics");
    println!();

    let config_path = Path::new(DEFAULT_CONFIG);
    let mut config = if config_path.exists() {
        PipelineConfig::load(config_path)?
    } else {
        log::info!("No {DEFAULT_CONFIG} found; using defaults");
        PipelineConfig::default()
    };

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();
    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    let sections = match Action::ALL[idx] {
        Action::ListSections => {
            super::print_sections();
            return Ok(());
        }
        Action::Validate => {
            prompt_merges(&mut config)?;
            let report = job_market_pipeline::validate(&config)?;
            super::print_validation(&report);
            return Ok(());
        }
        Action::RunAll => Section::all(),
        Action::RunSelected => {
            let all = Section::all();
            let section_labels: Vec<String> = all
                .iter()
                .map(|s| format!("{:<26} {}", s.as_ref(), s.description()))
                .collect();
            let selected = MultiSelect::new()
                .with_prompt("Sections to rebuild (space=toggle, a=all, enter=confirm)")
                .items(&section_labels)
                .interact()?;
            if selected.is_empty() {
                println!("No sections selected.");
                return Ok(());
            }
            selected.into_iter().map(|i| all[i]).collect()
        }
    };

    prompt_merges(&mut config)?;

    let proceed = Confirm::new()
        .with_prompt(format!(
            "Read {} and update {} section(s) of {}?",
            config.input.display(),
            sections.len(),
            config.document.display()
        ))
        .default(true)
        .interact()?;
    if !proceed {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_pipeline(multi, &config, &sections)
}
