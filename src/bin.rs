use anyhow::{bail, Context};
use clap::Parser;
use crossword_csp::backtracking_search::find_fill;
use crossword_csp::grid_config::{generate_grid_config_from_template_string, render_grid};
use crossword_csp::word_list::{WordList, WordListSourceConfig};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// crossword: Fill a crossword structure with words from a list
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the structure file, with _ representing open squares and anything else a block
    structure: PathBuf,

    /// Path to the word list, one word per line
    words: PathBuf,

    /// Also write the filled grid to this path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Give up after this many seconds [default: none]
    #[arg(long)]
    timeout: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let structure = fs::read_to_string(&args.structure)
        .with_context(|| format!("Couldn't read file '{}'", args.structure.display()))?;

    let grid_config = generate_grid_config_from_template_string(&structure)
        .with_context(|| format!("Invalid structure in '{}'", args.structure.display()))?;

    let word_list = WordList::new(
        &[WordListSourceConfig::File {
            id: "0".into(),
            path: args.words.clone().into_os_string(),
        }],
        Some(grid_config.width.max(grid_config.height)),
    );

    if let Some(errors) = word_list.get_source_errors().get("0") {
        if !errors.is_empty() {
            let messages: Vec<String> = errors.iter().map(|error| format!("- {error}")).collect();
            bail!("Couldn't load word list:\n{}", messages.join("\n"));
        }
    }

    if word_list.is_empty() {
        bail!("Word list is empty");
    }

    let result = find_fill(
        &grid_config,
        &word_list,
        args.timeout.map(Duration::from_secs),
        None,
    )?;

    log::debug!("{:?}", result.statistics);

    let rendered = render_grid(&grid_config, &word_list, &result.assignment);
    println!("{rendered}");

    if let Some(output) = &args.output {
        fs::write(output, format!("{rendered}\n"))
            .with_context(|| format!("Couldn't write file '{}'", output.display()))?;
    }

    Ok(())
}
