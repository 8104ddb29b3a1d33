//! Site configuration.
//!
//! One immutable `SiteConfig` is built at process start and passed to the
//! services that need it. There is no ambient global settings object; code
//! that needs the site identity or timezone takes `&SiteConfig`.

use std::path::Path;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    #[serde(default = "default_site_name")]
    pub site_name: String,
    #[serde(default = "default_site_description")]
    pub site_description: String,
    #[serde(default = "default_site_name")]
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_phone: Option<String>,
    /// ISO 4217 code applied when a payment or subscription doesn't name one.
    #[serde(default = "default_currency")]
    pub default_currency: String,
    /// IANA timezone name used for calendar-day bucketing and month
    /// boundaries. Falls back to Nairobi when unparseable.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub debug: bool,
}

fn default_site_name() -> String {
    "DataLinkCRM".to_string()
}

fn default_site_description() -> String {
    "Professional CRM System".to_string()
}

fn default_currency() -> String {
    "KES".to_string()
}

fn default_timezone() -> String {
    "Africa/Nairobi".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            site_name: default_site_name(),
            site_description: default_site_description(),
            company_name: default_site_name(),
            owner_name: None,
            owner_email: None,
            owner_phone: None,
            default_currency: default_currency(),
            timezone: default_timezone(),
            debug: false,
        }
    }
}

impl SiteConfig {
    /// The configured timezone, parsed. Unknown names fall back to Nairobi
    /// rather than failing the request that first touches them.
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or_else(|_| {
            log::warn!("Unknown timezone '{}', using Africa/Nairobi", self.timezone);
            chrono_tz::Africa::Nairobi
        })
    }

    /// Load configuration from a JSON file. A missing file yields defaults;
    /// an unreadable or malformed file is an error so a typo doesn't silently
    /// revert the site to defaults.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(SiteConfig::default());
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
        serde_json::from_str(&raw)
            .map_err(|e| format!("Failed to parse config {}: {}", path.display(), e))
    }
}
