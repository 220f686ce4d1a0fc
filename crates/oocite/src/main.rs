/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

use clap::{Parser, Subcommand};
use once_cell::sync::Lazy;
use oocite_core::{markup, CitationType, Database, Entry, Style};
use oocite_office::{
    CitationManager, Flow, MemoryDocument, OfficeError, Preferences, TextDocument, TextRange,
};
use oocite_processor::{
    produce_citation_markers, Citation, CitationGroup, CitationGroupId, CitationGroups,
};
use regex::Regex;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// `[@a; @b | p. 4]`, `[+@a]` for in-text, `[!@a]` for invisible.
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([+!]?)(@[^\]|]+?)\s*(?:\|([^\]]*))?\]").expect("valid placeholder regex")
});

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a style file and show what it declares
    CheckStyle {
        /// Path to the style file
        style: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Turn citation placeholders in a text file into citations
    Cite {
        /// Path to the style file
        #[arg(short, long)]
        style: PathBuf,

        /// Bibliography files (.bib, .json, .yaml), searched in order
        #[arg(short, long = "bib", required = true)]
        bibs: Vec<PathBuf>,

        /// Preferences file (.yaml or .json)
        #[arg(short, long)]
        preferences: Option<PathBuf>,

        /// Write the cited entries to this BibTeX file
        #[arg(long)]
        export: Option<PathBuf>,

        /// Text file with placeholders
        text: PathBuf,
    },
    /// Show the marker a single citation of the given keys gets
    Markers {
        /// Path to the style file
        #[arg(short, long)]
        style: PathBuf,

        /// Bibliography files (.bib, .json, .yaml), searched in order
        #[arg(short, long = "bib", required = true)]
        bibs: Vec<PathBuf>,

        /// Cite in running text instead of in parentheses
        #[arg(long)]
        in_text: bool,

        /// Page info
        #[arg(long)]
        page: Option<String>,

        #[arg(required = true)]
        keys: Vec<String>,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::CheckStyle { style, json } => check_style(&style, json),
        Commands::Cite {
            style,
            bibs,
            preferences,
            export,
            text,
        } => cite(&style, &bibs, preferences.as_deref(), export.as_deref(), &text),
        Commands::Markers {
            style,
            bibs,
            in_text,
            page,
            keys,
        } => markers(&style, &bibs, in_text, page, keys),
    };

    if let Err(e) = result {
        match e.downcast_ref::<OfficeError>() {
            Some(office) => eprintln!("{}", office.user_message()),
            None => eprintln!("Error: {e}"),
        }
        std::process::exit(1);
    }
}

fn load_databases(paths: &[PathBuf]) -> Result<Vec<Database>, Box<dyn Error>> {
    paths
        .iter()
        .map(|p| {
            Database::from_path(p)
                .map_err(|e| -> Box<dyn Error> { format!("{}: {e}", p.display()).into() })
        })
        .collect()
}

fn check_style(path: &Path, json: bool) -> Result<(), Box<dyn Error>> {
    let style = Style::from_path(path)?;
    let kind = if style.citation_key_markers() {
        "citation keys"
    } else if style.is_numeric() {
        "numeric"
    } else {
        "author-year"
    };
    let sort = if style.is_sort_by_position() {
        "by position".to_string()
    } else {
        style.sort_algorithm()
    };
    let layouts: Vec<&str> = style.layout_types().collect();
    let journals: Vec<&String> = style.journals().iter().collect();

    if json {
        let summary = serde_json::json!({
            "name": style.name(),
            "kind": kind,
            "sort": sort,
            "layouts": layouts,
            "journals": journals,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Style: {}", style.name());
    println!("  markers:  {kind}");
    println!("  sorting:  {sort}");
    println!("  layouts:  {}", layouts.join(", "));
    if !journals.is_empty() {
        let names: Vec<&str> = journals.iter().map(|s| s.as_str()).collect();
        println!("  journals: {}", names.join(", "));
    }
    Ok(())
}

/// A placeholder found in the input, in character offsets.
#[derive(Debug)]
struct Placeholder {
    start: usize,
    end: usize,
    citation_type: CitationType,
    keys: Vec<String>,
    page_info: Option<String>,
}

fn find_placeholders(text: &str) -> Vec<Placeholder> {
    PLACEHOLDER
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let citation_type = match caps.get(1).map_or("", |m| m.as_str()) {
                "+" => CitationType::InText,
                "!" => CitationType::Invisible,
                _ => CitationType::Parenthetical,
            };
            let keys: Vec<String> = caps
                .get(2)?
                .as_str()
                .split(';')
                .map(|k| k.trim().trim_start_matches('@').to_string())
                .filter(|k| !k.is_empty())
                .collect();
            if keys.is_empty() {
                return None;
            }
            let page_info = caps
                .get(3)
                .map(|m| m.as_str().trim().to_string())
                .filter(|p| !p.is_empty());
            let start = text[..whole.start()].chars().count();
            Some(Placeholder {
                start,
                end: start + whole.as_str().chars().count(),
                citation_type,
                keys,
                page_info,
            })
        })
        .collect()
}

fn entry_for(key: &str, databases: &[Database]) -> Entry {
    databases
        .iter()
        .find_map(|db| db.lookup_by_key(key))
        .cloned()
        .unwrap_or_else(|| Entry::new(key, "misc"))
}

fn cite(
    style_path: &Path,
    bibs: &[PathBuf],
    preferences: Option<&Path>,
    export: Option<&Path>,
    text_path: &Path,
) -> Result<(), Box<dyn Error>> {
    let style = Style::from_path(style_path)?;
    let databases = load_databases(bibs)?;
    let preferences = match preferences {
        Some(path) => Preferences::from_path(path)?,
        None => Preferences::default(),
    };
    let text = fs::read_to_string(text_path)?;
    let title = text_path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());

    let mut doc = MemoryDocument::from_text(&title, &text);
    let sync = preferences.sync_when_citing;
    let mut manager = CitationManager::with_document(doc.clone(), preferences);

    let placeholders = find_placeholders(&text);
    debug!(count = placeholders.len(), "found citation placeholders");
    // Last to first, so earlier offsets stay valid.
    for placeholder in placeholders.iter().rev() {
        // The inserted citation brings its own trailing space.
        let mut end = placeholder.end;
        let body_len = doc.flow_length(Flow::Body)?;
        if doc.text(&TextRange::body(end, (end + 1).min(body_len)))? == " " {
            end += 1;
        }
        doc.replace(&TextRange::body(placeholder.start, end), "")?;
        doc.set_view_cursor(&TextRange::body(placeholder.start, placeholder.start))?;

        let entries: Vec<Entry> = placeholder
            .keys
            .iter()
            .map(|k| entry_for(k, &databases))
            .collect();
        manager.insert_citation(
            &entries,
            &databases,
            &style,
            placeholder.citation_type.in_parenthesis(),
            placeholder.citation_type != CitationType::Invisible,
            placeholder.page_info.as_deref(),
            false,
        )?;
    }

    let unresolved = if sync {
        manager.refresh(&databases, &style)?
    } else {
        Vec::new()
    };

    print!("{}", doc.body_text().replace('\u{200b}', ""));
    if !doc.body_text().ends_with('\n') {
        println!();
    }
    for key in &unresolved {
        eprintln!("Unresolved citation key: {key}");
    }

    if let Some(out) = export {
        let (exported, missing) = manager.export_cited(&databases)?;
        fs::write(out, exported.to_bibtex())?;
        eprintln!(
            "Wrote {} entries to {} ({} unresolved)",
            exported.len(),
            out.display(),
            missing.len()
        );
    }
    Ok(())
}

fn markers(
    style_path: &Path,
    bibs: &[PathBuf],
    in_text: bool,
    page: Option<String>,
    keys: Vec<String>,
) -> Result<(), Box<dyn Error>> {
    let style = Style::from_path(style_path)?;
    let databases = load_databases(bibs)?;
    let citation_type = CitationType::from_options(true, !in_text);
    let id = CitationGroupId::new("cli");
    let group = CitationGroup::new(
        id.clone(),
        citation_type,
        keys.into_iter().map(Citation::new).collect(),
        page,
    );
    let mut groups = CitationGroups::new(vec![group]);
    let result = produce_citation_markers(&mut groups, &databases, &style);

    if let Some(marker) = result.markers.get(&id) {
        println!("{}", markup::to_plain_text(marker));
    }
    for key in &result.unresolved_keys {
        eprintln!("Unresolved citation key: {key}");
    }
    Ok(())
}
