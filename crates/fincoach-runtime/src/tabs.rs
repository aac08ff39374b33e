//! Per-tab coaching strategies.
//!
//! Each product tab (budget, savings, debt, investing) selects its own
//! agents, prompt framing, extra validation vocabulary, and pre-approved
//! static fallback. The set is closed: adding a tab means adding a variant
//! here, not touching the orchestrator.

use serde::{Deserialize, Serialize};

use fincoach_core::types::{FinancialSituation, UserContext};

/// Product tab a coaching request originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabType {
    Budget,
    Savings,
    Debt,
    Investing,
}

impl TabType {
    pub const ALL: [TabType; 4] = [Self::Budget, Self::Savings, Self::Debt, Self::Investing];

    /// The capability bundle for this tab.
    pub fn strategy(self) -> TabStrategy {
        match self {
            Self::Budget => TabStrategy {
                tab: self,
                primary_agent: "budget-coach",
                secondary_agents: &["spending-analyst"],
                system_prompt: "You are a budgeting coach for students. Work from the \
                                user's actual income and expenses and suggest concrete, \
                                small adjustments.",
                extra_risk_terms: &[],
                static_fallback: "We couldn't generate personalized budgeting advice right \
                                  now. A good starting point: list your monthly income and \
                                  your three largest expenses, and check back shortly.",
            },
            Self::Savings => TabStrategy {
                tab: self,
                primary_agent: "savings-coach",
                secondary_agents: &["goal-planner"],
                system_prompt: "You are a savings coach for students. Propose achievable \
                                weekly savings amounts tied to the user's margin.",
                extra_risk_terms: &[],
                static_fallback: "We couldn't generate personalized savings advice right \
                                  now. Setting aside even a small fixed amount each week \
                                  builds the habit; check back shortly.",
            },
            Self::Debt => TabStrategy {
                tab: self,
                primary_agent: "debt-coach",
                secondary_agents: &["repayment-planner"],
                system_prompt: "You are a debt coach for students. Prioritize highest-rate \
                                balances and never suggest new borrowing to cover payments.",
                extra_risk_terms: &["debt consolidation offer", "minimum payment only"],
                static_fallback: "We couldn't generate personalized debt advice right now. \
                                  Keeping up minimum payments on every balance protects \
                                  your credit; check back shortly.",
            },
            Self::Investing => TabStrategy {
                tab: self,
                primary_agent: "investing-coach",
                secondary_agents: &[],
                system_prompt: "You are an investing educator for students. Explain \
                                long-horizon, diversified approaches; never recommend \
                                specific securities.",
                extra_risk_terms: &["penny stock", "meme stock", "short squeeze"],
                static_fallback: "We couldn't generate personalized investing guidance \
                                  right now. Investing starts after an emergency fund is \
                                  in place; check back shortly.",
            },
        }
    }
}

/// What a tab contributes to the pipeline: agent selection, prompt
/// framing, extra risk vocabulary, and the static floor.
#[derive(Debug, Clone)]
pub struct TabStrategy {
    pub tab: TabType,
    pub primary_agent: &'static str,
    pub secondary_agents: &'static [&'static str],
    pub system_prompt: &'static str,

    /// Tab-specific additions to the risk scanner vocabulary.
    pub extra_risk_terms: &'static [&'static str],

    /// Pre-approved message served at the static fallback level.
    pub static_fallback: &'static str,
}

impl TabStrategy {
    /// Summarize the user's situation for judge prompts.
    pub fn format_context(&self, user: &UserContext) -> String {
        let situation = match user.situation {
            FinancialSituation::Surplus => "income exceeds expenses",
            FinancialSituation::Balanced => "income roughly matches expenses",
            FinancialSituation::Deficit => "expenses exceed income",
        };
        format!(
            "Tab: {:?}. Student user; {situation}; {}.",
            self.tab,
            if user.has_debt {
                "currently holds debt"
            } else {
                "no outstanding debt"
            }
        )
    }
}
