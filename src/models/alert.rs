use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    #[default]
    None,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BudgetAlert {
    pub level: AlertLevel,
    /// Share of the budget used, 0-100+
    pub percentage: f64,
    pub budget: f64,
    pub current_cost: f64,
    pub message: String,
}
