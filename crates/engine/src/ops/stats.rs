use sea_orm::{ConnectionTrait, Statement, Value};

use crate::{EngineError, ResultEngine, TransactionKind, util::month_bounds};

use super::Engine;

/// Income and expense sums of one calendar month.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MonthlyTotals {
    pub year: i32,
    pub month: u32,
    pub total_income: i64,
    pub total_expense: i64,
}

impl MonthlyTotals {
    pub fn balance(&self) -> i64 {
        self.total_income - self.total_expense
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category_id: i32,
    pub category: String,
    pub kind: TransactionKind,
    pub total: i64,
}

fn validate_period(year: i32, month: u32) -> ResultEngine<()> {
    if !(1..=12).contains(&month) {
        return Err(EngineError::InvalidDate(
            "month must be between 1 and 12".to_string(),
        ));
    }
    if !(1..=9999).contains(&year) {
        return Err(EngineError::InvalidDate(
            "year must be between 1 and 9999".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    /// Sum income and expenses dated inside the month. Empty months yield zeros.
    pub async fn monthly_totals(
        &self,
        user_id: i32,
        year: i32,
        month: u32,
    ) -> ResultEngine<MonthlyTotals> {
        validate_period(year, month)?;
        let (first, last) = month_bounds(year, month)?;

        let stmt = Statement::from_sql_and_values(
            self.database.get_database_backend(),
            "SELECT kind, COALESCE(SUM(amount), 0) AS total \
             FROM transactions \
             WHERE user_id = ? AND date >= ? AND date <= ? \
             GROUP BY kind",
            vec![user_id.into(), first.into(), last.into()],
        );

        let mut totals = MonthlyTotals {
            year,
            month,
            ..Default::default()
        };
        for row in self.database.query_all(stmt).await? {
            let kind: String = row.try_get("", "kind")?;
            let total: i64 = row.try_get("", "total")?;
            match TransactionKind::try_from(kind.as_str())? {
                TransactionKind::Income => totals.total_income = total,
                TransactionKind::Expense => totals.total_expense = total,
            }
        }
        Ok(totals)
    }

    /// Totals per category, largest first. `period` restricts to one
    /// `(year, month)`, `kind` to income or expense categories.
    pub async fn category_totals(
        &self,
        user_id: i32,
        period: Option<(i32, u32)>,
        kind: Option<TransactionKind>,
    ) -> ResultEngine<Vec<CategoryTotal>> {
        let mut sql = String::from(
            "SELECT c.id AS category_id, c.name AS category, c.kind AS kind, \
             COALESCE(SUM(t.amount), 0) AS total \
             FROM transactions t \
             JOIN categories c ON c.id = t.category_id \
             WHERE t.user_id = ?",
        );
        let mut values: Vec<Value> = vec![user_id.into()];
        if let Some((year, month)) = period {
            validate_period(year, month)?;
            let (first, last) = month_bounds(year, month)?;
            sql.push_str(" AND t.date >= ? AND t.date <= ?");
            values.push(first.into());
            values.push(last.into());
        }
        if let Some(kind) = kind {
            sql.push_str(" AND t.kind = ?");
            values.push(kind.as_str().into());
        }
        sql.push_str(" GROUP BY c.id, c.name, c.kind ORDER BY total DESC, c.name ASC");

        let stmt =
            Statement::from_sql_and_values(self.database.get_database_backend(), sql, values);
        let mut out = Vec::new();
        for row in self.database.query_all(stmt).await? {
            let kind: String = row.try_get("", "kind")?;
            out.push(CategoryTotal {
                category_id: row.try_get("", "category_id")?,
                category: row.try_get("", "category")?,
                kind: TransactionKind::try_from(kind.as_str())?,
                total: row.try_get("", "total")?,
            });
        }
        Ok(out)
    }
}
