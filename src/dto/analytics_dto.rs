use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub history: Option<bool>,
}
