//! Search command handler

use anyhow::{bail, Result};

use mendan_core::search::matching_entries;
use mendan_core::RecordStore;

use crate::output::Output;

/// Find records whose text fields contain the query (case-insensitive)
pub fn run(store: &RecordStore, query: String, output: &Output) -> Result<()> {
    if query.is_empty() {
        bail!("Search query cannot be empty");
    }

    let hits = matching_entries(store.days(), &query);
    output.print_hits(&hits);
    Ok(())
}
