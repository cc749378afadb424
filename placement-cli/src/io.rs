//! CSV readers and writers for the scheduler CLI.
//!
//! Every string cell that becomes a key is normalized on the way in
//! (trim, lowercase, punctuation stripped, spaces to `_`), so joins across the
//! input files succeed regardless of how the spreadsheets were typed.

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use placement_core::models::{
    normalize_id, FixedAssignment, PreferenceTable, ScheduleArtifacts, Table,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

fn csv_reader(path: &Path, has_headers: bool) -> Result<csv::Reader<fs::File>> {
    ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))
}

/// Parses a panel-count cell: a non-negative whole number.
fn parse_panel_count(cell: &str, path: &Path) -> Result<u32> {
    let value: f64 = cell
        .trim()
        .parse()
        .with_context(|| format!("panel count '{}' in {} is not a number", cell, path.display()))?;
    if value.fract() != 0.0 {
        bail!(
            "panel count '{}' in {} should be a whole number",
            cell,
            path.display()
        );
    }
    if value < 0.0 {
        bail!(
            "panel count '{}' in {} cannot be negative",
            cell,
            path.display()
        );
    }
    Ok(value as u32)
}

/// Shortlists: one column per recruiter, each column listing the candidates
/// that recruiter shortlisted. Columns are ragged; empty cells are ignored.
pub fn read_shortlists(path: &Path) -> Result<BTreeMap<String, Vec<String>>> {
    let mut rdr = csv_reader(path, true)?;
    let recruiters: Vec<String> = rdr
        .headers()
        .with_context(|| format!("missing header in {}", path.display()))?
        .iter()
        .map(normalize_id)
        .collect();

    let mut shortlists: BTreeMap<String, Vec<String>> = recruiters
        .iter()
        .filter(|c| !c.is_empty())
        .map(|c| (c.clone(), Vec::new()))
        .collect();

    for record in rdr.records() {
        let record = record.with_context(|| format!("bad record in {}", path.display()))?;
        for (i, cell) in record.iter().enumerate() {
            let name = normalize_id(cell);
            if name.is_empty() {
                continue;
            }
            let Some(recruiter) = recruiters.get(i) else {
                bail!("row in {} is wider than the header", path.display());
            };
            if let Some(names) = shortlists.get_mut(recruiter) {
                names.push(name);
            }
        }
    }
    Ok(shortlists)
}

/// SlotsPanels: first column is the slot identifier, remaining columns are
/// per-recruiter panel counts. Returns the ordered slot list and the matrix.
#[allow(clippy::type_complexity)]
pub fn read_slots_panels(
    path: &Path,
) -> Result<(Vec<String>, BTreeMap<String, BTreeMap<String, u32>>)> {
    let mut rdr = csv_reader(path, true)?;
    let recruiters: Vec<String> = rdr
        .headers()
        .with_context(|| format!("missing header in {}", path.display()))?
        .iter()
        .skip(1)
        .map(normalize_id)
        .collect();

    let mut slots = Vec::new();
    let mut panels = BTreeMap::new();
    for record in rdr.records() {
        let record = record.with_context(|| format!("bad record in {}", path.display()))?;
        let Some(slot_cell) = record.get(0) else {
            continue;
        };
        let slot = normalize_id(slot_cell);
        if slot.is_empty() {
            continue;
        }
        let mut row = BTreeMap::new();
        for (i, recruiter) in recruiters.iter().enumerate() {
            if recruiter.is_empty() {
                continue;
            }
            let cell = record.get(i + 1).unwrap_or_default();
            row.insert(recruiter.clone(), parse_panel_count(cell, path)?);
        }
        slots.push(slot.clone());
        panels.insert(slot, row);
    }
    Ok((slots, panels))
}

/// SlotsInterview: recruiter header row plus a single row of positive
/// integers, the consecutive slots one interview occupies.
pub fn read_slots_interview(path: &Path) -> Result<BTreeMap<String, u32>> {
    let mut rdr = csv_reader(path, true)?;
    let recruiters: Vec<String> = rdr
        .headers()
        .with_context(|| format!("missing header in {}", path.display()))?
        .iter()
        .map(normalize_id)
        .collect();

    let mut lengths = BTreeMap::new();
    for record in rdr.records() {
        let record = record.with_context(|| format!("bad record in {}", path.display()))?;
        for (i, cell) in record.iter().enumerate() {
            let Some(recruiter) = recruiters.get(i) else {
                continue;
            };
            if recruiter.is_empty() {
                continue;
            }
            let len: u32 = cell.trim().parse().with_context(|| {
                format!(
                    "interview length '{}' for {} in {} is not a positive integer",
                    cell,
                    recruiter,
                    path.display()
                )
            })?;
            lengths.insert(recruiter.clone(), len);
        }
    }
    Ok(lengths)
}

/// GDPanels: one group tuple per row, comma-separated recruiters, no header.
pub fn read_panel_groups(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut rdr = csv_reader(path, false)?;
    let mut groups = Vec::new();
    for record in rdr.records() {
        let record = record.with_context(|| format!("bad record in {}", path.display()))?;
        let tuple: Vec<String> = record
            .iter()
            .map(normalize_id)
            .filter(|c| !c.is_empty())
            .collect();
        if !tuple.is_empty() {
            groups.push(tuple);
        }
    }
    Ok(groups)
}

/// Preferences: first column is the candidate, remaining columns hold the raw
/// rank of each recruiter.
pub fn read_prefs(path: &Path) -> Result<PreferenceTable> {
    let mut rdr = csv_reader(path, true)?;
    let recruiters: Vec<String> = rdr
        .headers()
        .with_context(|| format!("missing header in {}", path.display()))?
        .iter()
        .skip(1)
        .map(normalize_id)
        .collect();

    let mut prefs = BTreeMap::new();
    for record in rdr.records() {
        let record = record.with_context(|| format!("bad record in {}", path.display()))?;
        let Some(name_cell) = record.get(0) else {
            continue;
        };
        let candidate = normalize_id(name_cell);
        if candidate.is_empty() {
            continue;
        }
        let mut row = BTreeMap::new();
        for (i, recruiter) in recruiters.iter().enumerate() {
            if recruiter.is_empty() {
                continue;
            }
            let cell = record.get(i + 1).unwrap_or_default();
            let rank: u32 = cell.trim().parse().with_context(|| {
                format!(
                    "preference '{}' for ({}, {}) in {} is not an integer",
                    cell,
                    candidate,
                    recruiter,
                    path.display()
                )
            })?;
            row.insert(recruiter.clone(), rank);
        }
        prefs.insert(candidate, row);
    }
    Ok(prefs)
}

/// Fixed schedule: slot rows, recruiter columns, candidate cells.
///
/// Column headers may carry a trailing panel index (`acme2`), as the emitted
/// schedule grid does, so a produced `sche.csv` can be fed back as pins.
/// Annotated cells (`name rank_crit`) keep only the leading token.
pub fn read_fixed(
    path: &Path,
    recruiters: &BTreeSet<String>,
) -> Result<Vec<FixedAssignment>> {
    let mut rdr = csv_reader(path, true)?;
    let columns: Vec<Option<String>> = rdr
        .headers()
        .with_context(|| format!("missing header in {}", path.display()))?
        .iter()
        .skip(1)
        .map(|h| resolve_recruiter_column(&normalize_id(h), recruiters))
        .collect();

    let mut fixed = Vec::new();
    for record in rdr.records() {
        let record = record.with_context(|| format!("bad record in {}", path.display()))?;
        let Some(slot_cell) = record.get(0) else {
            continue;
        };
        let slot = normalize_id(slot_cell);
        if slot.is_empty() {
            continue;
        }
        for (i, recruiter) in columns.iter().enumerate() {
            let Some(recruiter) = recruiter else {
                continue;
            };
            let cell = record.get(i + 1).unwrap_or_default();
            let Some(token) = cell.split_whitespace().next() else {
                continue;
            };
            let candidate = normalize_id(token);
            if candidate.is_empty() {
                continue;
            }
            fixed.push(FixedAssignment {
                slot: slot.clone(),
                recruiter: recruiter.clone(),
                candidate,
            });
        }
    }
    Ok(fixed)
}

/// Maps a fixed-file column header to a recruiter: either an exact identifier
/// or an identifier plus a trailing panel number.
fn resolve_recruiter_column(header: &str, recruiters: &BTreeSet<String>) -> Option<String> {
    if header.is_empty() {
        return None;
    }
    if recruiters.contains(header) {
        return Some(header.to_string());
    }
    let stripped = header.trim_end_matches(|ch: char| ch.is_ascii_digit());
    if stripped != header && recruiters.contains(stripped) {
        return Some(stripped.to_string());
    }
    None
}

/// Left-process / skip-initial lists: comma-separated candidate identifiers
/// across any number of lines.
pub fn read_name_list(path: &Path) -> Result<BTreeSet<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(text
        .lines()
        .flat_map(|line| line.split(','))
        .map(normalize_id)
        .filter(|n| !n.is_empty())
        .collect())
}

fn csv_writer(path: &Path, flexible: bool) -> Result<csv::Writer<fs::File>> {
    WriterBuilder::new()
        .flexible(flexible)
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))
}

fn write_table(path: &Path, table: &Table) -> Result<()> {
    let mut wtr = csv_writer(path, false)?;
    wtr.write_record(&table.header)?;
    for row in &table.rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the output artifacts into `out_dir`: `sche.csv`, `names.csv`,
/// `buff.csv`, `staticupload.csv`, and `prefsupload.csv` when the solve ran
/// with preferences. The directory is created on demand.
pub fn write_artifacts(out_dir: &Path, artifacts: &ScheduleArtifacts) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;

    write_table(&out_dir.join("sche.csv"), &artifacts.grid)?;
    write_table(&out_dir.join("names.csv"), &artifacts.names)?;

    let mut wtr = csv_writer(&out_dir.join("buff.csv"), true)?;
    for row in &artifacts.buffer {
        wtr.write_record(row)?;
    }
    wtr.flush()?;

    let mut wtr = csv_writer(&out_dir.join("staticupload.csv"), false)?;
    wtr.write_record(["Name", "Company", "Round", "Panel"])?;
    for row in &artifacts.static_upload {
        wtr.write_record([
            row.name.as_str(),
            row.company.as_str(),
            &row.round.to_string(),
            &row.panel.to_string(),
        ])?;
    }
    wtr.flush()?;

    if !artifacts.prefs_upload.is_empty() {
        write_prefs_upload(&out_dir.join("prefsupload.csv"), &artifacts.prefs_upload)?;
    }
    Ok(())
}

/// Writes the rank-normalized preference rows, one `(candidate, recruiter,
/// rank)` triple per line, no header.
pub fn write_prefs_upload(
    path: &Path,
    rows: &[placement_core::models::PrefsUploadRow],
) -> Result<()> {
    let mut wtr = csv_writer(path, false)?;
    for row in rows {
        wtr.write_record([
            row.candidate.as_str(),
            row.recruiter.as_str(),
            &row.rank.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
