use crate::models::{AlertLevel, BudgetAlert};

/// Budget thresholds, percentages of `budget`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertConfig {
    pub budget: f64,
    pub warning: f64,
    pub critical: f64,
    pub enabled: bool,
}

pub fn evaluate_alert(current_cost: f64, cfg: &AlertConfig) -> BudgetAlert {
    let percentage = if cfg.budget > 0.0 {
        current_cost / cfg.budget * 100.0
    } else {
        0.0
    };

    let (level, message) = if !cfg.enabled {
        (AlertLevel::None, String::new())
    } else if percentage >= cfg.critical {
        (
            AlertLevel::Critical,
            format!(
                "CRITICAL: {}% of ${} budget used!",
                percentage.round(),
                cfg.budget
            ),
        )
    } else if percentage >= cfg.warning {
        (
            AlertLevel::Warning,
            format!("Warning: {}% of ${} budget used", percentage.round(), cfg.budget),
        )
    } else {
        (AlertLevel::None, String::new())
    };

    BudgetAlert {
        level,
        percentage,
        budget: cfg.budget,
        current_cost,
        message,
    }
}
