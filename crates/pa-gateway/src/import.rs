//! Customer import from a JSON export

use std::path::Path;

use anyhow::Context;
use pa_core::{Customer, CustomerStore};
use tracing::{debug, info};

/// Load a JSON array of customer records into `store`.
///
/// Records may come straight from a Mongo export: `_id` as a string or
/// `{"$oid": ...}`, with profile fields nested under `profile` or at the top
/// level. Nothing is stored unless every record is valid. Existing records
/// with the same id are replaced. Returns the number of
/// records read.
pub async fn import_customers(store: &dyn CustomerStore, path: &Path) -> anyhow::Result<usize> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let documents: Vec<serde_json::Value> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse customer records in {}", path.display()))?;

    let customers = documents
        .into_iter()
        .enumerate()
        .map(|(index, document)| {
            Customer::from_document(document)
                .with_context(|| format!("Record {} in {}", index, path.display()))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    for customer in &customers {
        debug!("Importing customer {}", customer.id);
        store
            .upsert(customer)
            .await
            .with_context(|| format!("Failed to store customer {}", customer.id))?;
    }

    info!("Imported {} customers from {}", customers.len(), path.display());
    Ok(customers.len())
}
