//! # Income Registration
//!
//! Line items, amount rounding and the `/income` call that turns them into a
//! receipt.
//!
//! Amounts are rounded per line, half-up to two decimals, and the receipt
//! total is the exact sum of the rounded lines:
//!
//! | items | lines | total |
//! |-------|-------|-------|
//! | `A ×2 @ 100.005`, `B ×1 @ 50.0` | `200.01`, `50.00` | `250.01` |
//! | `D ×3 @ 0.335` | `1.01` | `1.01` |

pub mod amount;
pub mod api;
pub mod error;
pub mod models;
pub mod payload;

pub use amount::Amount;
pub use api::IncomeApi;
pub use error::{IncomeError, Result};
pub use models::{IncomeItem, IncomeRequest, Receipt};
pub use payload::{IncomePayload, ServiceLine};
