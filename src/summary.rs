//! The on-demand financial summary: totals, category breakdowns and monthly
//! trends computed from a user's transactions.

use std::collections::BTreeMap;

use axum::{Json, extract::{Query, State}};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    auth::Claims,
    models::TransactionKind,
    money::Money,
    policy::{Action, authorize},
    state::TransactionState,
    stores::{
        TransactionStore,
        transaction::{CategoryTotal, DateRange, KindTotals, MonthlyTotal, SummaryQuery},
    },
};

/// The query parameters accepted by the summary endpoint.
///
/// `date_from`/`date_to` take precedence over `month`, which takes precedence
/// over `year`. `category` combines with whichever date filter applies.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryParams {
    /// The start of an explicit date window (inclusive).
    pub date_from: Option<Date>,
    /// The end of an explicit date window (inclusive).
    pub date_to: Option<Date>,
    /// A calendar month, 1-12. Combined with `year`, defaulting to the
    /// current year.
    pub month: Option<u8>,
    /// A calendar year.
    pub year: Option<i32>,
    /// Restrict the summary to one category.
    pub category: Option<String>,
}

/// The totals for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAmount {
    /// The category name.
    pub category: String,
    /// The sum of the amounts in the category.
    pub total: Money,
}

/// Category totals grouped by transaction kind, largest first within each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    /// The income categories.
    pub income: Vec<CategoryAmount>,
    /// The expense categories.
    pub expense: Vec<CategoryAmount>,
}

/// The income and expense totals for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthSummary {
    /// The month in `YYYY-MM` form.
    pub month: String,
    /// The income total for the month.
    pub income: Money,
    /// The expense total for the month.
    pub expenses: Money,
}

/// The full summary response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// The sum of all matching income transactions.
    pub total_income: Money,
    /// The sum of all matching expense transactions.
    pub total_expenses: Money,
    /// Income minus expenses. Negative when spending exceeds income.
    pub net_balance: Money,
    /// Totals per category, grouped by kind.
    pub by_category: CategoryBreakdown,
    /// Totals per calendar month, in chronological order.
    pub monthly: Vec<MonthSummary>,
}

/// Assemble a [Summary] from the aggregates computed by the store.
///
/// A month that only has transactions of one kind still appears with the
/// other kind's total as zero.
pub fn build_summary(
    kind_totals: KindTotals,
    category_totals: Vec<CategoryTotal>,
    monthly_totals: Vec<MonthlyTotal>,
) -> Summary {
    let mut income_categories = Vec::new();
    let mut expense_categories = Vec::new();

    for category_total in category_totals {
        let entry = CategoryAmount {
            category: category_total.category,
            total: Money::new(category_total.total),
        };

        match category_total.kind {
            TransactionKind::Income => income_categories.push(entry),
            TransactionKind::Expense => expense_categories.push(entry),
        }
    }

    // BTreeMap keeps the YYYY-MM keys in chronological order.
    let mut months: BTreeMap<String, (f64, f64)> = BTreeMap::new();

    for monthly_total in monthly_totals {
        let entry = months.entry(monthly_total.month).or_default();

        match monthly_total.kind {
            TransactionKind::Income => entry.0 = monthly_total.total,
            TransactionKind::Expense => entry.1 = monthly_total.total,
        }
    }

    let monthly = months
        .into_iter()
        .map(|(month, (income, expenses))| MonthSummary {
            month,
            income: Money::new(income),
            expenses: Money::new(expenses),
        })
        .collect();

    Summary {
        total_income: Money::new(kind_totals.income),
        total_expenses: Money::new(kind_totals.expenses),
        net_balance: Money::new(kind_totals.income - kind_totals.expenses),
        by_category: CategoryBreakdown {
            income: income_categories,
            expense: expense_categories,
        },
        monthly,
    }
}

/// Route handler for the financial summary.
///
/// The summary covers only the caller's own transactions and is computed on
/// demand, so it always reflects the current state of the store.
///
/// # Errors
///
/// This function will return an error when the filter parameters are invalid
/// or there is an unexpected database error.
pub async fn get_summary<T>(
    claims: Claims,
    State(state): State<TransactionState<T>>,
    Query(params): Query<SummaryParams>,
) -> Result<Json<Summary>, Error>
where
    T: TransactionStore + Send + Sync,
{
    authorize(claims.role, Action::Read, true)?;

    let today = OffsetDateTime::now_utc().date();
    let date_range = DateRange::resolve(
        params.date_from,
        params.date_to,
        params.month,
        params.year,
        today,
    )?;

    let query = SummaryQuery {
        owner: claims.user_id(),
        category: params.category,
        date_range,
    };

    let kind_totals = state.transaction_store.kind_totals(&query)?;
    let category_totals = state.transaction_store.category_totals(&query)?;
    let monthly_totals = state.transaction_store.monthly_totals(&query)?;

    Ok(Json(build_summary(
        kind_totals,
        category_totals,
        monthly_totals,
    )))
}

#[cfg(test)]
mod build_summary_tests {
    use crate::{
        models::TransactionKind,
        stores::transaction::{CategoryTotal, KindTotals, MonthlyTotal},
    };

    use super::build_summary;

    #[test]
    fn net_balance_is_income_minus_expenses() {
        let summary = build_summary(
            KindTotals {
                income: 5000.0,
                expenses: 1200.0,
            },
            vec![],
            vec![],
        );

        assert_eq!(summary.net_balance.raw, 3800.0);
        assert_eq!(summary.net_balance.formatted, "$3,800.00");
    }

    #[test]
    fn net_balance_can_be_negative() {
        let summary = build_summary(
            KindTotals {
                income: 100.0,
                expenses: 250.0,
            },
            vec![],
            vec![],
        );

        assert_eq!(summary.net_balance.raw, -150.0);
        assert_eq!(summary.net_balance.formatted, "-$150.00");
    }

    #[test]
    fn categories_are_split_by_kind() {
        let summary = build_summary(
            KindTotals::default(),
            vec![
                CategoryTotal {
                    kind: TransactionKind::Income,
                    category: "Salary".to_owned(),
                    total: 5000.0,
                },
                CategoryTotal {
                    kind: TransactionKind::Expense,
                    category: "Groceries".to_owned(),
                    total: 150.0,
                },
                CategoryTotal {
                    kind: TransactionKind::Expense,
                    category: "Transport".to_owned(),
                    total: 25.0,
                },
            ],
            vec![],
        );

        assert_eq!(summary.by_category.income.len(), 1);
        assert_eq!(summary.by_category.income[0].category, "Salary");
        assert_eq!(summary.by_category.expense.len(), 2);
        assert_eq!(summary.by_category.expense[0].category, "Groceries");
        assert_eq!(summary.by_category.expense[1].category, "Transport");
    }

    #[test]
    fn monthly_totals_are_merged_and_zero_filled() {
        let summary = build_summary(
            KindTotals::default(),
            vec![],
            vec![
                MonthlyTotal {
                    month: "2025-03".to_owned(),
                    kind: TransactionKind::Expense,
                    total: 75.0,
                },
                MonthlyTotal {
                    month: "2025-01".to_owned(),
                    kind: TransactionKind::Income,
                    total: 5000.0,
                },
                MonthlyTotal {
                    month: "2025-01".to_owned(),
                    kind: TransactionKind::Expense,
                    total: 150.0,
                },
            ],
        );

        assert_eq!(summary.monthly.len(), 2);
        assert_eq!(summary.monthly[0].month, "2025-01");
        assert_eq!(summary.monthly[0].income.raw, 5000.0);
        assert_eq!(summary.monthly[0].expenses.raw, 150.0);
        assert_eq!(summary.monthly[1].month, "2025-03");
        assert_eq!(summary.monthly[1].income.raw, 0.0);
        assert_eq!(summary.monthly[1].expenses.raw, 75.0);
    }
}

#[cfg(test)]
mod summary_endpoint_tests {
    use std::str::FromStr;

    use axum_test::TestServer;
    use email_address::EmailAddress;
    use rusqlite::Connection;
    use serde_json::Value;
    use time::macros::date;

    use crate::{
        auth::encode_jwt,
        build_router, endpoints,
        models::{
            Counterparty, NewTransaction, PasswordHash, Role, TransactionDraft, TransactionKind,
            UserID, ValidatedPassword,
        },
        stores::{TransactionStore, UserStore, sqlite::create_app_state},
    };

    fn get_test_server_and_token() -> (TestServer, String, UserID) {
        let connection =
            Connection::open_in_memory().expect("Could not open database in memory.");
        let mut state =
            create_app_state(connection, "foobar").expect("Could not create app state.");

        let password = ValidatedPassword::new_unchecked("averysafeandsecurepassword");
        let password_hash = PasswordHash::new(password, 4).expect("Could not hash password");
        let user = state
            .user_store
            .create(
                EmailAddress::from_str("foo@bar.baz").unwrap(),
                password_hash,
                Role::Editor,
            )
            .expect("Could not create user");
        let user_id = user.id();

        let token = encode_jwt(user.id(), user.role(), &state.jwt_keys.encoding)
            .expect("Could not encode JWT");

        let drafts = [
            (TransactionKind::Income, 5000.0, "Salary", date!(2025 - 04 - 01)),
            (TransactionKind::Expense, 150.0, "Groceries", date!(2025 - 04 - 05)),
            (TransactionKind::Expense, 25.0, "Transport", date!(2025 - 04 - 07)),
            (TransactionKind::Expense, 75.0, "Groceries", date!(2025 - 03 - 20)),
        ];

        for (kind, amount, category, date) in drafts {
            let draft = TransactionDraft::new(
                NewTransaction {
                    amount,
                    category: category.to_owned(),
                    counterparty: Counterparty::new(kind, "Acme".to_owned()),
                    date,
                    note: String::new(),
                    media_url: String::new(),
                },
                user_id,
            )
            .expect("invalid test draft");

            state
                .transaction_store
                .create(draft)
                .expect("Could not create transaction");
        }

        let server = TestServer::try_new(build_router(state)).expect("Could not create test server.");

        (server, token, user_id)
    }

    #[tokio::test]
    async fn summary_for_april_2025() {
        let (server, token, _) = get_test_server_and_token();

        let response = server
            .get(endpoints::SUMMARY)
            .add_query_param("month", 4)
            .add_query_param("year", 2025)
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();

        let body = response.json::<Value>();
        assert_eq!(body["totalIncome"]["raw"], 5000.0);
        assert_eq!(body["totalIncome"]["formatted"], "$5,000.00");
        assert_eq!(body["totalExpenses"]["raw"], 175.0);
        assert_eq!(body["netBalance"]["raw"], 4825.0);

        let expense_categories = body["byCategory"]["expense"].as_array().unwrap();
        assert_eq!(expense_categories.len(), 2);
        assert_eq!(expense_categories[0]["category"], "Groceries");
        assert_eq!(expense_categories[0]["total"]["raw"], 150.0);
        assert_eq!(expense_categories[1]["category"], "Transport");
        assert_eq!(expense_categories[1]["total"]["raw"], 25.0);

        // Category totals add up to the type total.
        let category_sum: f64 = expense_categories
            .iter()
            .map(|entry| entry["total"]["raw"].as_f64().unwrap())
            .sum();
        assert_eq!(category_sum, body["totalExpenses"]["raw"].as_f64().unwrap());

        let monthly = body["monthly"].as_array().unwrap();
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0]["month"], "2025-04");
    }

    #[tokio::test]
    async fn summary_without_filters_covers_everything() {
        let (server, token, _) = get_test_server_and_token();

        let response = server
            .get(endpoints::SUMMARY)
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();

        let body = response.json::<Value>();
        assert_eq!(body["totalExpenses"]["raw"], 250.0);

        let monthly = body["monthly"].as_array().unwrap();
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0]["month"], "2025-03");
        assert_eq!(monthly[1]["month"], "2025-04");
    }

    #[tokio::test]
    async fn summary_category_filter_composes_with_date_filter() {
        let (server, token, _) = get_test_server_and_token();

        let response = server
            .get(endpoints::SUMMARY)
            .add_query_param("category", "Groceries")
            .add_query_param("dateFrom", "2025-04-01")
            .add_query_param("dateTo", "2025-04-30")
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();

        let body = response.json::<Value>();
        assert_eq!(body["totalExpenses"]["raw"], 150.0);
        assert_eq!(body["totalIncome"]["raw"], 0.0);
    }

    #[tokio::test]
    async fn summary_rejects_invalid_month() {
        let (server, token, _) = get_test_server_and_token();

        server
            .get(endpoints::SUMMARY)
            .add_query_param("month", 13)
            .authorization_bearer(token)
            .await
            .assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn summary_requires_authentication() {
        let (server, _, _) = get_test_server_and_token();

        server
            .get(endpoints::SUMMARY)
            .await
            .assert_status(axum::http::StatusCode::BAD_REQUEST);
    }
}
