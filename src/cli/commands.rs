use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::app::{ActionDispatcher, App, Outcome};
use crate::catalog::Category;
use crate::clipboard::{Clipboard, SystemClipboard};
use crate::config::AppConfig;
use crate::dream::DreamRecord;
use crate::search::{filter_collection, CollectionQuery, SortKey, SortOrder};
use crate::storage::{merge_records, HistoryRepository, ImportSummary, StorageHandle};
use crate::timefmt;

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Only show dreams whose content or type contains this text
    #[arg(long, short)]
    pub search: Option<String>,
    /// Sort field (time, type, length); defaults to the configured sort
    #[arg(long)]
    pub sort: Option<SortKey>,
    /// Sort direction (asc, desc)
    #[arg(long)]
    pub order: Option<SortOrder>,
}

#[derive(Args, Debug, Clone)]
pub struct IdArgs {
    /// Dream identifier
    pub id: String,
}

#[derive(Args, Debug, Clone)]
pub struct ConfirmArgs {
    /// Dream identifier
    pub id: String,
    /// Skip the confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// JSON file holding an array of dream records
    pub file: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Destination file; prints to stdout when omitted
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CatalogArgs {
    /// Category page (foods, knowledge, sights, thinking)
    pub category: Category,
}

pub fn run_tui(app: &mut App) -> Result<()> {
    app.run()
}

pub fn list(config: &AppConfig, storage: StorageHandle, args: ListArgs) -> Result<()> {
    let output = run_list(&storage.history(), config, &args)?;
    print!("{output}");
    Ok(())
}

fn run_list(repo: &dyn HistoryRepository, config: &AppConfig, args: &ListArgs) -> Result<String> {
    let records = repo.load().context("loading dream history")?;
    let defaults = config.collection.default_sort;
    let query = CollectionQuery::new(
        args.search.clone().unwrap_or_default(),
        args.sort.unwrap_or(defaults.field),
        args.order.unwrap_or(defaults.direction),
    );
    let collection = filter_collection(&records, &query);
    Ok(format_collection(&collection))
}

fn format_collection(records: &[DreamRecord]) -> String {
    if records.is_empty() {
        return "No collected dreams found.\n".to_string();
    }
    let mut out = String::new();
    for record in records {
        let _ = writeln!(
            &mut out,
            "[{}]  {} {}  {}",
            record.id,
            record.type_icon(),
            record.type_name(),
            timefmt::format_display_absolute(record.sort_time())
        );
        for line in record.content.lines().filter(|line| !line.trim().is_empty()) {
            let _ = writeln!(&mut out, "    {}", line.trim_end());
        }
        out.push('\n');
    }
    out
}

pub fn show(storage: StorageHandle, args: IdArgs) -> Result<()> {
    let output = run_show(&storage.history(), &args.id)?;
    print!("{output}");
    Ok(())
}

fn find_dream(repo: &dyn HistoryRepository, id: &str) -> Result<DreamRecord> {
    match ActionDispatcher::new(repo).find(id)? {
        Some(record) => Ok(record),
        None => bail!("no dream with id {id}"),
    }
}

fn run_show(repo: &dyn HistoryRepository, id: &str) -> Result<String> {
    let record = find_dream(repo, id)?;
    let mut out = String::new();
    let _ = writeln!(
        &mut out,
        "{} {} [{}]",
        record.type_icon(),
        record.type_name(),
        record.id
    );
    let _ = writeln!(
        &mut out,
        "created    {}",
        timefmt::format_display_absolute(&record.create_time)
    );
    match record.collect_time.as_deref() {
        Some(collected) if record.is_collected => {
            let _ = writeln!(
                &mut out,
                "collected  {}",
                timefmt::format_display_absolute(collected)
            );
        }
        _ => {
            let _ = writeln!(&mut out, "collected  no");
        }
    }
    out.push('\n');
    let _ = writeln!(&mut out, "{}", record.content.trim_end());
    Ok(out)
}

pub fn collect(storage: StorageHandle, args: ConfirmArgs, collected: bool) -> Result<()> {
    let question = if collected {
        "Add this dream to your collection?"
    } else {
        "Remove this dream from your collection?"
    };
    if !args.yes && !confirm(question)? {
        println!("Canceled.");
        return Ok(());
    }
    let message = set_collected(&storage.history(), &args.id, collected)?;
    println!("{message}");
    Ok(())
}

fn set_collected(repo: &dyn HistoryRepository, id: &str, collected: bool) -> Result<String> {
    let outcome = ActionDispatcher::new(repo)
        .set_collected(id, collected)
        .with_context(|| format!("updating dream {id}"))?;
    Ok(match outcome {
        Outcome::Missing => format!("No dream with id {id}; nothing changed."),
        _ if collected => format!("Collected dream {id}."),
        _ => format!("Removed dream {id} from the collection."),
    })
}

pub fn delete(storage: StorageHandle, args: ConfirmArgs) -> Result<()> {
    if !args.yes && !confirm("Delete this dream permanently? This cannot be undone.")? {
        println!("Canceled.");
        return Ok(());
    }
    let message = delete_dream(&storage.history(), &args.id)?;
    println!("{message}");
    Ok(())
}

fn delete_dream(repo: &dyn HistoryRepository, id: &str) -> Result<String> {
    let outcome = ActionDispatcher::new(repo)
        .delete(id)
        .with_context(|| format!("deleting dream {id}"))?;
    Ok(match outcome {
        Outcome::Missing => format!("No dream with id {id}; nothing changed."),
        _ => format!("Deleted dream {id}."),
    })
}

pub fn share(storage: StorageHandle, args: IdArgs) -> Result<()> {
    let record = find_dream(&storage.history(), &args.id)?;
    // The process exits right after copying, so the clipboard must outlive it.
    let mut clipboard = SystemClipboard::hold_until_replaced();
    if clipboard.blocks_on_set() {
        println!(
            "Copying dream {}; it stays on the clipboard until another application replaces it.",
            args.id
        );
        share_dream(&record, &mut clipboard)?;
    } else {
        share_dream(&record, &mut clipboard)?;
        println!("Copied dream {} to the clipboard.", args.id);
    }
    Ok(())
}

fn share_dream(record: &DreamRecord, clipboard: &mut dyn Clipboard) -> Result<()> {
    crate::app::actions::share(record, clipboard).context("copying to clipboard")?;
    Ok(())
}

pub fn import(storage: StorageHandle, args: ImportArgs) -> Result<()> {
    let raw = fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let summary = import_records(&storage.history(), &raw)?;
    println!(
        "Imported {} new and {} replaced dreams.",
        summary.added, summary.replaced
    );
    Ok(())
}

fn import_records(repo: &dyn HistoryRepository, raw: &str) -> Result<ImportSummary> {
    let incoming: Vec<DreamRecord> =
        serde_json::from_str(raw).context("parsing import file as a list of dreams")?;
    let existing = repo.load().context("loading dream history")?;
    let (merged, summary) = merge_records(existing, incoming);
    repo.save(&merged).context("saving merged history")?;
    tracing::info!(
        added = summary.added,
        replaced = summary.replaced,
        "history imported"
    );
    Ok(summary)
}

pub fn export(storage: StorageHandle, args: ExportArgs) -> Result<()> {
    let json = export_records(&storage.history())?;
    match args.file {
        Some(path) => {
            fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
            println!("Exported history to {}.", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn export_records(repo: &dyn HistoryRepository) -> Result<String> {
    let records = repo.load().context("loading dream history")?;
    serde_json::to_string_pretty(&records).context("encoding history")
}

pub fn catalog(args: CatalogArgs) -> Result<()> {
    print!("{}", format_catalog(args.category));
    Ok(())
}

fn format_catalog(category: Category) -> String {
    let mut out = String::new();
    let _ = writeln!(&mut out, "{}", category.title());
    for item in category.items() {
        let _ = writeln!(&mut out, "  {}. {}  {}", item.id, item.title, item.desc);
    }
    out
}

fn confirm(question: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        bail!("stdin is not a terminal; pass --yes to confirm");
    }
    let answer = prompt(&format!("{question} [y/N]"))?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn prompt(label: &str) -> Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{}: ", label)?;
    stdout.flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end().to_owned())
}
