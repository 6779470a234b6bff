// src/models/company.rs

use serde::{Deserialize, Serialize};

/// Данные компании для подписи. Приходят из конфигурации.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CompanyInfo {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub logo_url: String,
    #[serde(default = "default_primary_color")]
    pub primary_color: String,
    #[serde(default = "default_secondary_color")]
    pub secondary_color: String,
    #[serde(default)]
    pub disclaimer: String,

    /// Суффиксы, которые вырезаются из displayName, например "(Carton Group)"
    #[serde(default = "default_display_name_markers")]
    pub display_name_markers: Vec<String>,
}

fn default_primary_color() -> String {
    "#0066cc".to_string()
}

fn default_secondary_color() -> String {
    "#666666".to_string()
}

fn default_display_name_markers() -> Vec<String> {
    vec!["(Carton Group)".to_string(), "(Europoligrafico)".to_string()]
}

impl Default for CompanyInfo {
    fn default() -> Self {
        Self {
            name: "La Tua Azienda S.r.l.".to_string(),
            address: "Via Roma 123, 20100 Milano (MI)".to_string(),
            website: "www.tuaazienda.it".to_string(),
            logo_url: "https://www.tuaazienda.it/logo.png".to_string(),
            primary_color: default_primary_color(),
            secondary_color: default_secondary_color(),
            disclaimer: "This e-mail may contain confidential and/or privileged information. \
                         If you are not the intended recipient please notify the sender \
                         immediately and destroy this e-mail."
                .to_string(),
            display_name_markers: default_display_name_markers(),
        }
    }
}
