//! Order Query/Filter Engine
//!
//! Builds a conjunction of optional predicates over orders. One predicate
//! builder feeds both the page query and the count query so the two can
//! never drift apart.
//!
//! Visibility rules are applied up front by [`OrderFilter::scoped_for`]:
//! non-staff callers are always constrained to their own orders, lose the
//! admin-only predicates, and are always sorted by order date descending.

use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};

use crate::auth::Requester;
use crate::db::models::{OrderStatus, PaymentStatus};
use shared::AppResult;

const DEFAULT_PER_PAGE: i64 = 20;
const MAX_PER_PAGE: i64 = 100;

/// Sortable columns (staff only; buyers always get date descending)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    CreatedAt,
    TotalAmount,
    OrderStatus,
}

impl SortBy {
    /// Whitelisted column name; sort keys are never interpolated from
    /// user input directly.
    fn column(self) -> &'static str {
        match self {
            SortBy::CreatedAt => "created_at",
            SortBy::TotalAmount => "total_amount",
            SortBy::OrderStatus => "order_status",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    fn keyword(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// Optional predicates for order listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    /// Created-at lower bound (inclusive, epoch millis)
    pub date_from: Option<i64>,
    /// Created-at upper bound (exclusive, epoch millis)
    pub date_to: Option<i64>,
    pub order_status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub proven: Option<bool>,
    // Staff-only predicates, stripped for buyers by scoped_for
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub buyer_email: Option<String>,
    pub code_contains: Option<String>,
    /// Owner scope; set by scoped_for, never taken from the request
    #[serde(skip)]
    pub user_id: Option<i64>,
    pub sort_by: Option<SortBy>,
    pub sort_dir: Option<SortDir>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl OrderFilter {
    /// Apply role-based visibility rules.
    ///
    /// Staff keep every predicate and sort they asked for. Buyers are
    /// scoped to their own orders, lose the staff-only predicates, and are
    /// forced to date-descending order. Anonymous callers are rejected.
    pub fn scoped_for(mut self, requester: &Requester) -> AppResult<Self> {
        if requester.is_staff() {
            return Ok(self);
        }
        let (user_id, _) = requester.require_user()?;
        self.user_id = Some(user_id);
        self.city = None;
        self.region = None;
        self.country = None;
        self.buyer_email = None;
        self.code_contains = None;
        self.sort_by = None;
        self.sort_dir = None;
        Ok(self)
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }

    /// Append the WHERE clause shared by the page and count queries.
    pub(crate) fn push_predicates(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE 1=1");
        if let Some(user_id) = self.user_id {
            qb.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(from) = self.date_from {
            qb.push(" AND created_at >= ").push_bind(from);
        }
        if let Some(to) = self.date_to {
            qb.push(" AND created_at < ").push_bind(to);
        }
        if let Some(status) = self.order_status {
            qb.push(" AND order_status = ").push_bind(status);
        }
        if let Some(status) = self.payment_status {
            qb.push(" AND payment_status = ").push_bind(status);
        }
        if let Some(proven) = self.proven {
            qb.push(" AND has_user_proven = ").push_bind(proven);
        }
        if let Some(ref city) = self.city {
            qb.push(" AND city = ").push_bind(city.clone());
        }
        if let Some(ref region) = self.region {
            qb.push(" AND region = ").push_bind(region.clone());
        }
        if let Some(ref country) = self.country {
            qb.push(" AND country = ").push_bind(country.clone());
        }
        if let Some(ref email) = self.buyer_email {
            qb.push(" AND buyer_email = ").push_bind(email.clone());
        }
        if let Some(ref fragment) = self.code_contains {
            // Substring match only makes sense against plaintext codes;
            // guest codes are stored hashed and can never match this way
            qb.push(" AND is_guest = 0 AND order_code LIKE ")
                .push_bind(format!("%{}%", fragment));
        }
    }

    /// Append ORDER BY / LIMIT / OFFSET for the page query.
    pub(crate) fn push_order_and_page(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        let column = self.sort_by.unwrap_or(SortBy::CreatedAt).column();
        let dir = self.sort_dir.unwrap_or(SortDir::Desc).keyword();
        qb.push(format!(" ORDER BY {column} {dir}"));
        qb.push(" LIMIT ")
            .push_bind(self.per_page())
            .push(" OFFSET ")
            .push_bind((self.page() - 1) * self.per_page());
    }
}

/// One page of results plus the total count for the same predicate set
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    fn full_filter() -> OrderFilter {
        OrderFilter {
            date_from: Some(1),
            date_to: Some(2),
            order_status: Some(OrderStatus::Pending),
            payment_status: Some(PaymentStatus::Paid),
            proven: Some(false),
            city: Some("Kigali".into()),
            region: Some("Kigali City".into()),
            country: Some("RW".into()),
            buyer_email: Some("a@b.com".into()),
            code_contains: Some("ORD".into()),
            user_id: None,
            sort_by: Some(SortBy::TotalAmount),
            sort_dir: Some(SortDir::Asc),
            page: Some(2),
            per_page: Some(10),
        }
    }

    #[test]
    fn test_buyer_scope_strips_staff_predicates() {
        let buyer = Requester::User {
            id: 42,
            role: Role::Customer,
        };
        let scoped = full_filter().scoped_for(&buyer).unwrap();
        assert_eq!(scoped.user_id, Some(42));
        assert!(scoped.city.is_none());
        assert!(scoped.buyer_email.is_none());
        assert!(scoped.code_contains.is_none());
        assert!(scoped.sort_by.is_none());
        // Non-staff predicates survive
        assert_eq!(scoped.order_status, Some(OrderStatus::Pending));
        assert_eq!(scoped.date_from, Some(1));
    }

    #[test]
    fn test_staff_scope_keeps_everything() {
        let admin = Requester::User {
            id: 1,
            role: Role::Admin,
        };
        let scoped = full_filter().scoped_for(&admin).unwrap();
        assert!(scoped.user_id.is_none());
        assert_eq!(scoped.buyer_email.as_deref(), Some("a@b.com"));
        assert_eq!(scoped.sort_by, Some(SortBy::TotalAmount));
    }

    #[test]
    fn test_anonymous_is_rejected() {
        let err = full_filter().scoped_for(&Requester::Anonymous);
        assert!(err.is_err());
    }

    #[test]
    fn test_page_defaults_and_clamps() {
        let mut f = OrderFilter::default();
        assert_eq!(f.page(), 1);
        assert_eq!(f.per_page(), DEFAULT_PER_PAGE);
        f.page = Some(0);
        f.per_page = Some(10_000);
        assert_eq!(f.page(), 1);
        assert_eq!(f.per_page(), MAX_PER_PAGE);
    }

    #[test]
    fn test_predicates_render_same_where_clause() {
        let f = full_filter();
        let mut list = QueryBuilder::<Sqlite>::new("SELECT * FROM orders");
        f.push_predicates(&mut list);
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM orders");
        f.push_predicates(&mut count);

        let list_sql = list.sql().to_string();
        let count_sql = count.sql().to_string();
        let list_where = list_sql.split_once("WHERE").unwrap().1.to_string();
        let count_where = count_sql.split_once("WHERE").unwrap().1.to_string();
        assert_eq!(list_where, count_where);
    }
}
