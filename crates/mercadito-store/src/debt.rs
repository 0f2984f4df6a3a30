//! # Debt Aggregator
//!
//! Per-client debt and owed-container views over the sale collection.
//! Everything here is recomputed from the open sales on every call;
//! nothing is stored, so the numbers can never drift from the ledger.

use mercadito_core::{debt, Money, Sale};

use crate::store::{Collection, MemoryStore};

pub struct DebtAggregator {
    sales: Collection<Sale>,
}

impl DebtAggregator {
    pub fn new(store: &MemoryStore) -> Self {
        DebtAggregator {
            sales: store.sales().clone(),
        }
    }

    /// A client's open (pending or partial) sales, oldest first.
    pub async fn open_sales(&self, client_id: &str) -> Vec<Sale> {
        let mut sales = self
            .sales
            .find(|s| s.is_open() && s.client_id.as_deref() == Some(client_id))
            .await;
        sales.sort_by_key(|s| s.created_at);
        sales
    }

    /// Total outstanding debt across the client's open sales.
    pub async fn total_debt(&self, client_id: &str) -> Money {
        debt::total_debt(&self.open_sales(client_id).await)
    }

    /// Total containers the client still owes across open sales.
    pub async fn total_owed_returnables(&self, client_id: &str) -> u32 {
        debt::total_owed_returnables(&self.open_sales(client_id).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use mercadito_core::PaymentState;

    fn sale(id: &str, client: &str, total_cents: i64, state: PaymentState, minutes: i64) -> Sale {
        Sale {
            id: id.to_string(),
            client_id: Some(client.to_string()),
            client_name_snapshot: "Ana".to_string(),
            cashier_id: "cashier-1".to_string(),
            created_at: Utc::now() + Duration::minutes(minutes),
            total_cents,
            state,
            lines: Vec::new(),
            total_owed_returnables: 0,
            payments: Vec::new(),
            container_returns: Vec::new(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_debt_ignores_paid_and_other_clients() {
        let store = MemoryStore::new();
        let sales = store.sales();
        sales
            .create(sale("a", "c1", 10000, PaymentState::Pending, 0))
            .await
            .unwrap();
        sales
            .create(sale(
                "b",
                "c1",
                5000,
                PaymentState::Partial { paid_cents: 2000 },
                1,
            ))
            .await
            .unwrap();
        sales
            .create(sale("c", "c1", 7000, PaymentState::Paid, 2))
            .await
            .unwrap();
        sales
            .create(sale("d", "c2", 9000, PaymentState::Pending, 3))
            .await
            .unwrap();

        let aggregator = DebtAggregator::new(&store);
        assert_eq!(aggregator.total_debt("c1").await.cents(), 13000);

        let open = aggregator.open_sales("c1").await;
        assert_eq!(open.len(), 2);
        // Oldest first.
        assert_eq!(open[0].id, "a");
        assert_eq!(open[1].id, "b");
    }

    #[tokio::test]
    async fn test_owed_returnables_sums_open_sales() {
        let store = MemoryStore::new();
        let mut a = sale("a", "c1", 4000, PaymentState::Pending, 0);
        a.total_owed_returnables = 3;
        let mut b = sale("b", "c1", 4000, PaymentState::Paid, 1);
        b.total_owed_returnables = 2;
        store.sales().create(a).await.unwrap();
        store.sales().create(b).await.unwrap();

        let aggregator = DebtAggregator::new(&store);
        // Only open sales count.
        assert_eq!(aggregator.total_owed_returnables("c1").await, 3);
    }
}
