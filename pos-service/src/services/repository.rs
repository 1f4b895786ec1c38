use anyhow::Result;
use futures::TryStreamExt;
use mongodb::bson::{doc, DateTime, Document};
use mongodb::options::{
    FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument,
};
use mongodb::{Collection, Database, IndexModel};
use uuid::Uuid;

use crate::models::{
    Customer, Invoice, OwnerStats, Product, TransactionRecord, OWNER_STATS_ID,
};

/// Document access for the POS collections.
///
/// Every mutation of a balance, stock count, or owner counter goes through
/// an atomic single-document update here; load-then-save is reserved for
/// reads and immutable inserts.
#[derive(Clone)]
pub struct PosRepository {
    customers: Collection<Customer>,
    invoices: Collection<Invoice>,
    products: Collection<Product>,
    transactions: Collection<TransactionRecord>,
    owner: Collection<OwnerStats>,
}

impl PosRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            customers: db.collection("customers"),
            invoices: db.collection("invoices"),
            products: db.collection("products"),
            transactions: db.collection("transactions"),
            owner: db.collection("owner_stats"),
        }
    }

    pub async fn init_indexes(&self) -> Result<()> {
        let phone_index = IndexModel::builder()
            .keys(doc! { "phone": 1 })
            .options(IndexOptions::builder().name("customer_phone_idx".to_string()).build())
            .build();
        self.customers.create_indexes([phone_index], None).await?;

        let invoice_customer_index = IndexModel::builder()
            .keys(doc! { "customer_phone": 1, "status": 1 })
            .options(
                IndexOptions::builder()
                    .name("invoice_customer_status_idx".to_string())
                    .build(),
            )
            .build();
        let invoice_created_index = IndexModel::builder()
            .keys(doc! { "created_at": -1 })
            .options(IndexOptions::builder().name("invoice_created_idx".to_string()).build())
            .build();
        self.invoices
            .create_indexes([invoice_customer_index, invoice_created_index], None)
            .await?;

        let transaction_date_index = IndexModel::builder()
            .keys(doc! { "date": -1 })
            .options(IndexOptions::builder().name("transaction_date_idx".to_string()).build())
            .build();
        self.transactions
            .create_indexes([transaction_date_index], None)
            .await?;

        tracing::info!("POS indexes initialized");
        Ok(())
    }

    // ---- customers ----

    pub async fn find_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>> {
        let customer = self
            .customers
            .find_one(doc! { "phone": phone }, None)
            .await?;
        Ok(customer)
    }

    pub async fn find_customer_by_id(&self, id: Uuid) -> Result<Option<Customer>> {
        let customer = self
            .customers
            .find_one(doc! { "_id": id.to_string() }, None)
            .await?;
        Ok(customer)
    }

    pub async fn insert_customer(&self, customer: Customer) -> Result<Customer> {
        self.customers.insert_one(&customer, None).await?;
        Ok(customer)
    }

    /// Upsert by phone: existing customers keep their balance, new ones
    /// start at zero.
    pub async fn upsert_customer_by_phone(
        &self,
        phone: &str,
        name: &str,
        company_name: Option<&str>,
        address: Option<&str>,
    ) -> Result<Customer> {
        let now = DateTime::now();
        let mut set = doc! { "name": name, "updated_at": now };
        if let Some(company) = company_name {
            set.insert("company_name", company);
        }
        if let Some(address) = address {
            set.insert("address", address);
        }
        let update = doc! {
            "$set": set,
            "$setOnInsert": {
                "_id": Uuid::new_v4().to_string(),
                "phone": phone,
                "balance_due": 0.0,
                "due_since": null,
                "created_at": now,
            },
        };
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        let customer = self
            .customers
            .find_one_and_update(doc! { "phone": phone }, update, options)
            .await?
            .ok_or_else(|| anyhow::anyhow!("upsert returned no customer document"))?;
        Ok(customer)
    }

    pub async fn search_customers(&self, query: Option<&str>, limit: i64) -> Result<Vec<Customer>> {
        let filter = match query {
            Some(q) if !q.is_empty() => {
                let regex = doc! { "$regex": q, "$options": "i" };
                doc! {
                    "$or": [
                        { "name": regex.clone() },
                        { "company_name": regex.clone() },
                        { "phone": regex },
                    ]
                }
            }
            _ => doc! {},
        };
        let options = FindOptions::builder()
            .sort(doc! { "updated_at": -1 })
            .limit(limit)
            .build();
        let customers = self.customers.find(filter, options).await?.try_collect().await?;
        Ok(customers)
    }

    pub async fn customers_with_pending_balance(&self, limit: i64) -> Result<Vec<Customer>> {
        let options = FindOptions::builder()
            .sort(doc! { "updated_at": -1 })
            .limit(limit)
            .build();
        let customers = self
            .customers
            .find(doc! { "balance_due": { "$gt": 0.0 } }, options)
            .await?
            .try_collect()
            .await?;
        Ok(customers)
    }

    /// Atomically add a freshly billed amount to the rolling balance and
    /// restamp `due_since`. Returns the updated customer.
    pub async fn add_to_customer_balance(&self, phone: &str, amount: f64) -> Result<Option<Customer>> {
        let update = vec![doc! {
            "$set": {
                "balance_due": { "$round": [{ "$add": ["$balance_due", amount] }, 2] },
                "due_since": "$$NOW",
                "updated_at": "$$NOW",
            }
        }];
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let customer = self
            .customers
            .find_one_and_update(doc! { "phone": phone }, update, options)
            .await?;
        Ok(customer)
    }

    /// Atomically subtract a payment, clamping the balance at zero.
    /// Returns the customer as it was *before* the update so the caller
    /// can report the previous balance.
    pub async fn settle_customer_balance(&self, phone: &str, amount: f64) -> Result<Option<Customer>> {
        let update = vec![doc! {
            "$set": {
                "balance_due": {
                    "$max": [0.0, { "$round": [{ "$subtract": ["$balance_due", amount] }, 2] }]
                },
                "due_since": "$$NOW",
                "updated_at": "$$NOW",
            }
        }];
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::Before)
            .build();
        let customer = self
            .customers
            .find_one_and_update(doc! { "phone": phone }, update, options)
            .await?;
        Ok(customer)
    }

    pub async fn zero_customer_balance(&self, phone: &str) -> Result<()> {
        self.customers
            .update_one(
                doc! { "phone": phone },
                doc! { "$set": { "balance_due": 0.0, "updated_at": DateTime::now() } },
                None,
            )
            .await?;
        Ok(())
    }

    pub async fn delete_customer(&self, id: Uuid) -> Result<u64> {
        let result = self
            .customers
            .delete_one(doc! { "_id": id.to_string() }, None)
            .await?;
        Ok(result.deleted_count)
    }

    // ---- products ----

    pub async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
        let product = self
            .products
            .find_one(doc! { "_id": id.to_string() }, None)
            .await?;
        Ok(product)
    }

    pub async fn list_products(&self) -> Result<Vec<Product>> {
        let options = FindOptions::builder().sort(doc! { "name": 1 }).build();
        let products = self.products.find(doc! {}, options).await?.try_collect().await?;
        Ok(products)
    }

    pub async fn insert_product(&self, product: Product) -> Result<Product> {
        self.products.insert_one(&product, None).await?;
        Ok(product)
    }

    pub async fn update_product(&self, id: Uuid, mut set: Document) -> Result<Option<Product>> {
        set.insert("updated_at", DateTime::now());
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let product = self
            .products
            .find_one_and_update(doc! { "_id": id.to_string() }, doc! { "$set": set }, options)
            .await?;
        Ok(product)
    }

    pub async fn delete_product(&self, id: Uuid) -> Result<u64> {
        let result = self
            .products
            .delete_one(doc! { "_id": id.to_string() }, None)
            .await?;
        Ok(result.deleted_count)
    }

    pub async fn add_stock(&self, id: Uuid, qty: i64) -> Result<Option<Product>> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let product = self
            .products
            .find_one_and_update(
                doc! { "_id": id.to_string() },
                doc! { "$inc": { "quantity": qty }, "$set": { "updated_at": DateTime::now() } },
                options,
            )
            .await?;
        Ok(product)
    }

    /// Guarded decrement: succeeds only while `quantity >= qty`, so stock
    /// can never go negative under concurrent sales.
    pub async fn try_decrement_stock(&self, id: Uuid, qty: i64) -> Result<bool> {
        let result = self
            .products
            .update_one(
                doc! { "_id": id.to_string(), "quantity": { "$gte": qty } },
                doc! { "$inc": { "quantity": -qty }, "$set": { "updated_at": DateTime::now() } },
                None,
            )
            .await?;
        Ok(result.modified_count == 1)
    }

    /// Compensating update for a failed multi-line decrement sequence.
    pub async fn restock(&self, id: Uuid, qty: i64) -> Result<()> {
        self.products
            .update_one(
                doc! { "_id": id.to_string() },
                doc! { "$inc": { "quantity": qty }, "$set": { "updated_at": DateTime::now() } },
                None,
            )
            .await?;
        Ok(())
    }

    // ---- invoices ----

    pub async fn insert_invoice(&self, invoice: Invoice) -> Result<Invoice> {
        self.invoices.insert_one(&invoice, None).await?;
        Ok(invoice)
    }

    pub async fn find_invoice(&self, id: Uuid) -> Result<Option<Invoice>> {
        let invoice = self
            .invoices
            .find_one(doc! { "_id": id.to_string() }, None)
            .await?;
        Ok(invoice)
    }

    pub async fn list_recent_invoices(&self, limit: i64) -> Result<Vec<Invoice>> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .limit(limit)
            .build();
        let invoices = self.invoices.find(doc! {}, options).await?.try_collect().await?;
        Ok(invoices)
    }

    pub async fn invoices_by_phone(&self, phone: &str) -> Result<Vec<Invoice>> {
        let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
        let invoices = self
            .invoices
            .find(doc! { "customer_phone": phone }, options)
            .await?
            .try_collect()
            .await?;
        Ok(invoices)
    }

    pub async fn pending_invoices_by_phone(&self, phone: &str) -> Result<Vec<Invoice>> {
        let invoices = self
            .invoices
            .find(
                doc! { "customer_phone": phone, "status": { "$ne": "paid" } },
                None,
            )
            .await?
            .try_collect()
            .await?;
        Ok(invoices)
    }

    /// Pending invoices of the same customer created at or before the given
    /// moment, excluding the anchor invoice itself. Cascade candidates.
    pub async fn pending_invoices_up_to(
        &self,
        phone: &str,
        created_at: DateTime,
        exclude: Uuid,
    ) -> Result<Vec<Invoice>> {
        let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
        let invoices = self
            .invoices
            .find(
                doc! {
                    "customer_phone": phone,
                    "status": { "$ne": "paid" },
                    "_id": { "$ne": exclude.to_string() },
                    "created_at": { "$lte": created_at },
                },
                options,
            )
            .await?
            .try_collect()
            .await?;
        Ok(invoices)
    }

    pub async fn mark_invoice_paid(&self, id: Uuid, amount_paid: f64, paid_at: DateTime) -> Result<()> {
        self.invoices
            .update_one(
                doc! { "_id": id.to_string() },
                doc! { "$set": {
                    "status": "paid",
                    "paid_at": paid_at,
                    "amount_paid": amount_paid,
                    "updated_at": DateTime::now(),
                }},
                None,
            )
            .await?;
        Ok(())
    }

    pub async fn patch_invoice(&self, id: Uuid, mut set: Document) -> Result<Option<Invoice>> {
        set.insert("updated_at", DateTime::now());
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let invoice = self
            .invoices
            .find_one_and_update(doc! { "_id": id.to_string() }, doc! { "$set": set }, options)
            .await?;
        Ok(invoice)
    }

    pub async fn mark_invoice_notified(&self, id: Uuid) -> Result<()> {
        self.invoices
            .update_one(
                doc! { "_id": id.to_string() },
                doc! { "$set": { "notified": true, "updated_at": DateTime::now() } },
                None,
            )
            .await?;
        Ok(())
    }

    pub async fn find_invoices_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Invoice>> {
        let id_strings: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        let invoices = self
            .invoices
            .find(doc! { "_id": { "$in": id_strings } }, None)
            .await?
            .try_collect()
            .await?;
        Ok(invoices)
    }

    pub async fn delete_invoices_by_ids(&self, ids: &[Uuid]) -> Result<u64> {
        let id_strings: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        let result = self
            .invoices
            .delete_many(doc! { "_id": { "$in": id_strings } }, None)
            .await?;
        Ok(result.deleted_count)
    }

    pub async fn delete_invoices_by_phone(&self, phone: &str) -> Result<u64> {
        let result = self
            .invoices
            .delete_many(doc! { "customer_phone": phone }, None)
            .await?;
        Ok(result.deleted_count)
    }

    pub async fn wipe_invoices(&self) -> Result<u64> {
        let result = self.invoices.delete_many(doc! {}, None).await?;
        Ok(result.deleted_count)
    }

    pub async fn wipe_customers(&self) -> Result<u64> {
        let result = self.customers.delete_many(doc! {}, None).await?;
        Ok(result.deleted_count)
    }

    // ---- owner aggregate ----

    /// Lazily create the singleton aggregate document and return it.
    pub async fn get_or_create_owner_stats(&self) -> Result<OwnerStats> {
        let update = doc! {
            "$setOnInsert": {
                "_id": OWNER_STATS_ID,
                "total_bills": 0_i64,
                "total_amount": 0.0,
                "total_received": 0.0,
                "total_pending": 0.0,
                "updated_at": DateTime::now(),
            }
        };
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        let owner = self
            .owner
            .find_one_and_update(doc! { "_id": OWNER_STATS_ID }, update, options)
            .await?
            .ok_or_else(|| anyhow::anyhow!("owner stats upsert returned no document"))?;
        Ok(owner)
    }

    /// Record a new bill in the aggregate: bills, billed amount and pending
    /// all grow by atomic increments.
    pub async fn owner_record_sale(&self, current_total: f64) -> Result<()> {
        self.get_or_create_owner_stats().await?;
        self.owner
            .update_one(
                doc! { "_id": OWNER_STATS_ID },
                doc! {
                    "$inc": {
                        "total_bills": 1_i64,
                        "total_amount": current_total,
                        "total_pending": current_total,
                    },
                    "$set": { "updated_at": DateTime::now() },
                },
                None,
            )
            .await?;
        Ok(())
    }

    /// Record received money: pending shrinks by the same amount, clamped
    /// at zero.
    pub async fn owner_record_payment(&self, amount: f64) -> Result<()> {
        self.get_or_create_owner_stats().await?;
        let update = vec![doc! {
            "$set": {
                "total_received": { "$round": [{ "$add": ["$total_received", amount] }, 2] },
                "total_pending": {
                    "$max": [0.0, { "$round": [{ "$subtract": ["$total_pending", amount] }, 2] }]
                },
                "updated_at": "$$NOW",
            }
        }];
        self.owner
            .update_one(doc! { "_id": OWNER_STATS_ID }, update, None)
            .await?;
        Ok(())
    }

    pub async fn reset_owner_stats(&self) -> Result<()> {
        self.owner
            .update_one(
                doc! { "_id": OWNER_STATS_ID },
                doc! { "$set": {
                    "total_bills": 0_i64,
                    "total_amount": 0.0,
                    "total_received": 0.0,
                    "total_pending": 0.0,
                    "updated_at": DateTime::now(),
                }},
                mongodb::options::UpdateOptions::builder().upsert(true).build(),
            )
            .await?;
        Ok(())
    }

    // ---- transactions ----

    pub async fn append_transaction(&self, record: TransactionRecord) -> Result<()> {
        self.transactions.insert_one(record, None).await?;
        Ok(())
    }

    pub async fn list_transactions(&self, limit: i64) -> Result<Vec<TransactionRecord>> {
        let options = FindOptions::builder().sort(doc! { "date": -1 }).limit(limit).build();
        let records = self
            .transactions
            .find(doc! {}, options)
            .await?
            .try_collect()
            .await?;
        Ok(records)
    }

    pub async fn delete_transactions_by_customer(&self, customer_id: Uuid) -> Result<u64> {
        let result = self
            .transactions
            .delete_many(doc! { "customer_id": customer_id.to_string() }, None)
            .await?;
        Ok(result.deleted_count)
    }

    pub async fn wipe_transactions(&self) -> Result<u64> {
        let result = self.transactions.delete_many(doc! {}, None).await?;
        Ok(result.deleted_count)
    }
}
