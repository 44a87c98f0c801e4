#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct DlpConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub patterns: Vec<String>,
}
