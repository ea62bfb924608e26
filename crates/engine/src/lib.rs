//! Domain layer of Momono.
//!
//! [`Engine`] owns the database connection and exposes every operation of the
//! API scoped by the acting user's id. Records owned by someone else are
//! reported as missing.

pub use budgets::{Budget, BudgetInput};
pub use categories::Category;
pub use error::EngineError;
pub use notifications::Notification;
pub use ops::{CategoryTotal, Engine, EngineBuilder, MonthlyTotals, TransactionListFilter};
pub use transactions::{Transaction, TransactionInput, TransactionKind, TransactionPatch};
pub use users::User;

mod budgets;
mod categories;
mod error;
mod notifications;
mod ops;
mod password;
mod transactions;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
