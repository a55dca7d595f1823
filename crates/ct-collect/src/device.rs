//! Device identity provider.

use ct_common::{CensusBuilder, PlatformInfo, Result};
use serde_json::json;

/// Section name owned by this provider.
pub const SECTION: &str = "device_name";

/// Insert the rendered device name.
pub fn collect(census: &mut CensusBuilder, platform: &PlatformInfo) -> Result<()> {
    census.insert(SECTION, json!(platform.device_name()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_device_name() {
        let platform = PlatformInfo {
            os: "linux".to_string(),
            os_version: "6.1.0".to_string(),
            arch: "aarch64".to_string(),
            hostname: "h".to_string(),
            agent_version: "0.1.0".to_string(),
        };

        let mut census = CensusBuilder::new();
        collect(&mut census, &platform).unwrap();
        let doc = census.build();

        assert_eq!(
            doc.section(SECTION).and_then(|v| v.as_str()),
            Some("linux 6.1.0 (aarch64)")
        );
    }
}
