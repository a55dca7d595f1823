//! Environment variable provider.

use ct_common::{CensusBuilder, Result};
use std::collections::BTreeMap;

/// Section name owned by this provider.
pub const SECTION: &str = "environment_variables";

/// Capture the full process environment as a flat string map.
///
/// Variables whose names or values are not valid UTF-8 are rendered lossily
/// rather than dropped.
pub fn collect(census: &mut CensusBuilder) -> Result<()> {
    let vars: BTreeMap<String, String> = std::env::vars_os()
        .map(|(k, v)| {
            (
                k.to_string_lossy().into_owned(),
                v.to_string_lossy().into_owned(),
            )
        })
        .collect();

    census.insert_serialized(SECTION, &vars)?;
    Ok(())
}
