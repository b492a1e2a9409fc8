//! Built-in catalog of model cards offered on the models page.

use serde::{Deserialize, Serialize};

use crate::kind::ComputationKind;
use crate::schema::{Constraint, ConstraintSchema, TIME_PERIOD_LABEL};

/// Static per-page configuration for one computation: what the user sees on
/// the card and which constraints the form exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCard {
    pub title: String,
    #[serde(default)]
    pub image: String,
    #[serde(rename = "type")]
    pub kind: ComputationKind,
    pub constraints: ConstraintSchema,
}

const TICKERS: [&str; 3] = ["AAPL", "GOOGL", "MSFT"];
const PERIODS: [&str; 5] = ["1 month", "3 months", "6 months", "1 year", "custom"];

fn card(title: &str, image: &str, kind: ComputationKind, first: Constraint) -> ModelCard {
    ModelCard {
        title: title.to_string(),
        image: image.to_string(),
        kind,
        constraints: ConstraintSchema::from_trusted(vec![
            first,
            Constraint::new(TIME_PERIOD_LABEL, PERIODS),
        ]),
    }
}

/// The three cards shipped with the site.
pub fn default_cards() -> Vec<ModelCard> {
    vec![
        card(
            "Implied Volatility Surface",
            "/graph1.png",
            ComputationKind::IVMap,
            Constraint::new("Ticker", TICKERS),
        ),
        card(
            "Order Book Ravine",
            "/graph2.png",
            ComputationKind::OrderFlowCanyon,
            Constraint::new("Ticker", TICKERS),
        ),
        card(
            "US Fix Income Yield Plot",
            "/graph3.png",
            ComputationKind::USFixedIncomeYield,
            Constraint::new("Issuer", ["US Treasury"]),
        ),
    ]
}
