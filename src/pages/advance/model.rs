use rust_decimal::Decimal;

use super::*;

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct CreateAdvance {
    pub(super) amount: Decimal,
    #[serde(default)]
    pub(super) notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct ApproveAdvance {
    pub(super) installments: i32,
}
