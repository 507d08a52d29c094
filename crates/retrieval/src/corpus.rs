//! Corpus loading: tabular travel records and free-text sources.
//!
//! The tabular loader canonicalizes each CSV row into one French
//! natural-language summary, the retrieval unit for structured data.
//! Rows lacking a destination are dropped (not indexed); malformed
//! numeric fields render as an explicit "unknown" marker rather than
//! crashing or turning into zeros.

use crate::chunker::chunk_text;
use crate::types::{DocMetadata, TravelDocument};
use std::path::Path;
use voyager_core::{AppError, AppResult};
use walkdir::WalkDir;

/// Marker rendered for missing or unparseable fields.
const UNKNOWN: &str = "Inconnu";

/// Marker rendered for empty or zero cost fields.
const UNSPECIFIED: &str = "Non spécifié";

/// Expected columns of the travel CSV. Part of the documented corpus
/// contract; rows violating it are skipped with a diagnostic.
const COL_TRIP_ID: &str = "Trip ID";
const COL_DESTINATION: &str = "Destination";
const COL_DURATION: &str = "Duration (days)";
const COL_TRAVELER_NAME: &str = "Traveler name";
const COL_TRAVELER_AGE: &str = "Traveler age";
const COL_NATIONALITY: &str = "Traveler nationality";
const COL_ACCOMMODATION_TYPE: &str = "Accommodation type";
const COL_ACCOMMODATION_COST: &str = "Accommodation cost";
const COL_TRANSPORT_TYPE: &str = "Transportation type";
const COL_TRANSPORT_COST: &str = "Transportation cost";

/// Load the tabular travel corpus from a CSV file.
///
/// Fails with `CorpusUnavailable` if the file is missing. Yields an
/// empty vec (logged as a warning) when no row parses; the caller
/// decides whether an empty corpus is acceptable.
pub fn load_csv(path: &Path) -> AppResult<Vec<TravelDocument>> {
    if !path.exists() {
        return Err(AppError::CorpusUnavailable(format!(
            "CSV file not found: {}",
            path.display()
        )));
    }

    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| AppError::CorpusUnavailable(format!("Failed to open CSV: {}", e)))?;

    let headers = reader
        .headers()
        .map_err(|e| AppError::CorpusUnavailable(format!("Failed to read CSV headers: {}", e)))?
        .clone();

    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    let destination_idx = column(COL_DESTINATION).ok_or_else(|| {
        AppError::CorpusUnavailable(format!(
            "CSV is missing the mandatory '{}' column",
            COL_DESTINATION
        ))
    })?;

    let trip_id_idx = column(COL_TRIP_ID);
    let duration_idx = column(COL_DURATION);
    let name_idx = column(COL_TRAVELER_NAME);
    let age_idx = column(COL_TRAVELER_AGE);
    let nationality_idx = column(COL_NATIONALITY);
    let accommodation_type_idx = column(COL_ACCOMMODATION_TYPE);
    let accommodation_cost_idx = column(COL_ACCOMMODATION_COST);
    let transport_type_idx = column(COL_TRANSPORT_TYPE);
    let transport_cost_idx = column(COL_TRANSPORT_COST);

    let mut documents = Vec::new();
    let mut skipped = 0usize;

    for (row_number, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Skipping malformed CSV row {}: {}", row_number + 1, e);
                skipped += 1;
                continue;
            }
        };

        let field = |idx: Option<usize>| -> &str {
            idx.and_then(|i| record.get(i)).unwrap_or("").trim()
        };

        // Destination is the mandatory identifying field
        let destination = field(Some(destination_idx));
        if destination.is_empty() {
            tracing::debug!("Dropping row {} without destination", row_number + 1);
            skipped += 1;
            continue;
        }

        let trip_id = int_to_str(field(trip_id_idx), UNKNOWN);
        let duration = int_to_str(field(duration_idx), UNKNOWN);
        let age = int_to_str(field(age_idx), UNKNOWN);
        let accommodation_type = non_empty_or(field(accommodation_type_idx), UNKNOWN);
        let transport_type = non_empty_or(field(transport_type_idx), UNKNOWN);
        let accommodation_cost = clean_cost(field(accommodation_cost_idx));
        let transport_cost = clean_cost(field(transport_cost_idx));
        let traveler_name = non_empty_or(field(name_idx), UNKNOWN);
        let nationality = non_empty_or(field(nationality_idx), UNKNOWN);

        let content = format!(
            "Voyage ID {trip_id}. Destination: {destination}. \
             Durée: {duration} jours. \
             Hébergement: {accommodation_type} (Coût: {accommodation_cost}). \
             Transport: {transport_type} (Coût: {transport_cost}). \
             Voyageur: {traveler_name} ({age} ans, {nationality})."
        );

        documents.push(TravelDocument {
            content,
            metadata: DocMetadata {
                trip_id: some_if_known(&trip_id),
                destination: Some(destination.to_string()),
                accommodation_type: some_if_known(&accommodation_type),
                transportation_type: some_if_known(&transport_type),
                traveler_nationality: some_if_known(&nationality),
                source: None,
                chunk: None,
            },
        });
    }

    if documents.is_empty() {
        tracing::warn!(
            "Corpus at {} yielded zero parseable records ({} skipped)",
            path.display(),
            skipped
        );
    } else {
        tracing::info!(
            "Loaded {} travel records from {} ({} skipped)",
            documents.len(),
            path.display(),
            skipped
        );
    }

    Ok(documents)
}

/// Load free-text sources (`.txt` files) from a directory, splitting
/// long files into overlapping chunks.
pub fn load_text_dir(
    dir: &Path,
    chunk_size: usize,
    chunk_overlap: usize,
) -> AppResult<Vec<TravelDocument>> {
    if !dir.exists() {
        return Err(AppError::CorpusUnavailable(format!(
            "Corpus directory not found: {}",
            dir.display()
        )));
    }

    let mut documents = Vec::new();

    for entry in WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("txt"))
    {
        let path = entry.path();
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!("Skipping unreadable file {}: {}", path.display(), e);
                continue;
            }
        };

        let source = path.display().to_string();
        for (position, chunk) in chunk_text(&text, chunk_size, chunk_overlap)
            .into_iter()
            .enumerate()
        {
            documents.push(TravelDocument {
                content: chunk,
                metadata: DocMetadata {
                    source: Some(source.clone()),
                    chunk: Some(position as u32),
                    ..Default::default()
                },
            });
        }
    }

    if documents.is_empty() {
        tracing::warn!("No free-text documents found under {}", dir.display());
    }

    Ok(documents)
}

/// Parse a numeric field into an integer string, falling back to the
/// given marker. Handles floats ("5.0" parses as 5), never zeroes out
/// garbage.
fn int_to_str(value: &str, default: &str) -> String {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| (v as i64).to_string())
        .unwrap_or_else(|| default.to_string())
}

/// Strip currency decoration from a cost field. Empty and zero costs
/// render as "Non spécifié".
fn clean_cost(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, '$' | ','))
        .collect::<String>()
        .replace("USD", "")
        .trim()
        .to_string();

    if cleaned.is_empty() || cleaned == "0" {
        UNSPECIFIED.to_string()
    } else {
        cleaned
    }
}

fn non_empty_or(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

fn some_if_known(value: &str) -> Option<String> {
    if value == UNKNOWN {
        None
    } else {
        Some(value.to_string())
    }
}
