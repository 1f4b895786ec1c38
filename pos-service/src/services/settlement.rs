//! Rolling-balance settlement logic.
//!
//! Debt is tracked per customer, not per invoice: each sale adds its own
//! charge to the customer's rolling balance, payments subtract from it, and
//! clearing the balance (directly or by marking the newest invoice paid)
//! cascades a paid status onto every older pending invoice. The owner-wide
//! aggregate is kept in lockstep through atomic counter updates.

use std::sync::Arc;

use mongodb::bson::{doc, Bson, DateTime};
use service_core::error::AppError;
use uuid::Uuid;

use crate::config::BusinessConfig;
use crate::dtos::invoices::{CreateInvoiceRequest, UpdateInvoiceStatusRequest};
use crate::models::{
    Customer, Invoice, InvoiceItem, InvoiceStatus, TransactionKind, TransactionRecord,
};
use crate::services::metrics;
use crate::services::notify::{InvoiceNotice, Notifier};
use crate::services::repository::PosRepository;

/// Round to two decimals, half away from zero: -0.125 becomes -0.13, not
/// -0.12. Prices, quantities and discounts are non-negative, so the
/// negative half-cent case never reaches stored data. All stored money
/// values are normalized through this.
pub fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

/// A request line joined with its product snapshot.
pub struct PricedLine {
    pub product_id: Uuid,
    pub name_snapshot: String,
    pub qty: i64,
    pub unit_price: f64,
    pub tax_percent: f64,
}

/// Result of pricing a set of lines: the frozen item snapshots plus the
/// invoice-level money fields before the previous due is applied.
pub struct InvoiceTotals {
    pub items: Vec<InvoiceItem>,
    pub sub_total: f64,
    pub tax_total: f64,
    pub discount: f64,
    pub rounding: f64,
    pub current_total: f64,
}

/// Price lines and apply discount plus the whole-unit rounding adjustment.
pub fn price_items(lines: &[PricedLine], discount: f64) -> InvoiceTotals {
    let mut items = Vec::with_capacity(lines.len());
    let mut sub_total = 0.0;
    let mut tax_total = 0.0;

    for line in lines {
        let amount = round2(line.qty as f64 * line.unit_price);
        let tax = round2(amount * line.tax_percent / 100.0);
        sub_total += amount;
        tax_total += tax;
        items.push(InvoiceItem {
            product_id: line.product_id,
            name_snapshot: line.name_snapshot.clone(),
            qty: line.qty,
            unit_price: line.unit_price,
            tax_percent: line.tax_percent,
            line_total: round2(amount + tax),
        });
    }

    let sub_total = round2(sub_total);
    let tax_total = round2(tax_total);
    let discount = round2(discount);
    let before_rounding = round2(sub_total + tax_total - discount);
    // Nudge the displayed total to a whole currency unit.
    let rounding = round2(before_rounding.round() - before_rounding);
    let current_total = round2(before_rounding + rounding);

    InvoiceTotals {
        items,
        sub_total,
        tax_total,
        discount,
        rounding,
        current_total,
    }
}

pub struct SettlementOutcome {
    pub phone: String,
    pub previous: f64,
    pub amount: f64,
    pub current: f64,
}

pub struct CustomerDeletion {
    pub invoices: u64,
    pub transactions: u64,
}

/// The business flows that mutate balances, invoices and the owner
/// aggregate together.
#[derive(Clone)]
pub struct SettlementService {
    repo: PosRepository,
    notifier: Arc<dyn Notifier>,
    business: BusinessConfig,
}

impl SettlementService {
    pub fn new(repo: PosRepository, notifier: Arc<dyn Notifier>, business: BusinessConfig) -> Self {
        Self {
            repo,
            notifier,
            business,
        }
    }

    /// Create a pending invoice: price the lines, decrement stock, roll the
    /// charge into the customer balance and the owner aggregate.
    pub async fn create_invoice(&self, req: CreateInvoiceRequest) -> Result<Invoice, AppError> {
        let trim = |s: Option<String>| {
            s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        };
        let customer_name = trim(req.customer_name);
        let customer_phone = trim(req.customer_phone);
        let customer_address = trim(req.customer_address);
        let customer_company = trim(req.customer_company);

        // Resolve and check every product before touching anything.
        let mut lines = Vec::with_capacity(req.items.len());
        for item in &req.items {
            let product = self
                .repo
                .find_product(item.product_id)
                .await
                .map_err(AppError::DatabaseError)?
                .ok_or_else(|| {
                    AppError::BadRequest(anyhow::anyhow!("Product {} not found", item.product_id))
                })?;
            if product.quantity < item.qty {
                return Err(AppError::InsufficientStock {
                    product: product.name,
                    available: product.quantity,
                    requested: item.qty,
                });
            }
            lines.push(PricedLine {
                product_id: product.id,
                name_snapshot: product.name,
                qty: item.qty,
                unit_price: item.unit_price,
                tax_percent: item.tax_percent.unwrap_or(product.tax_percent),
            });
        }

        let totals = price_items(&lines, req.discount);

        // The rolling balance is the authoritative previous due; unpaid
        // invoices are never summed.
        let customer = match customer_phone.as_deref() {
            Some(phone) => self
                .repo
                .find_customer_by_phone(phone)
                .await
                .map_err(AppError::DatabaseError)?,
            None => None,
        };
        let previous_due = customer.as_ref().map(|c| c.balance_due).unwrap_or(0.0);
        let total = round2(totals.current_total + previous_due);

        // Guarded decrements; a lost race on a later line undoes the
        // earlier ones so a failed request leaves stock untouched.
        let mut decremented: Vec<(Uuid, i64)> = Vec::new();
        for line in &lines {
            let ok = self
                .repo
                .try_decrement_stock(line.product_id, line.qty)
                .await
                .map_err(AppError::DatabaseError)?;
            if !ok {
                for (product_id, qty) in decremented {
                    if let Err(e) = self.repo.restock(product_id, qty).await {
                        tracing::error!(product_id = %product_id, qty, "Failed to restock after aborted invoice: {}", e);
                    }
                }
                let available = self
                    .repo
                    .find_product(line.product_id)
                    .await
                    .ok()
                    .flatten()
                    .map(|p| p.quantity)
                    .unwrap_or(0);
                return Err(AppError::InsufficientStock {
                    product: line.name_snapshot.clone(),
                    available,
                    requested: line.qty,
                });
            }
            decremented.push((line.product_id, line.qty));
        }

        let previous_due_since = if previous_due > 0.0 {
            req.previous_due_since
                .as_deref()
                .and_then(parse_rfc3339)
                .or_else(|| customer.as_ref().and_then(|c| c.due_since))
        } else {
            None
        };

        let now = DateTime::now();
        let invoice = Invoice {
            id: Uuid::new_v4(),
            number: format!("INV-{}", now.timestamp_millis()),
            customer_name: customer_name.clone(),
            customer_phone: customer_phone.clone(),
            customer_address,
            customer_company,
            items: totals.items,
            sub_total: totals.sub_total,
            discount: totals.discount,
            tax_total: totals.tax_total,
            rounding: totals.rounding,
            current_total: totals.current_total,
            previous_due,
            previous_due_since,
            total,
            payment_mode: req.payment_mode,
            payment_ref: None,
            status: InvoiceStatus::Pending,
            amount_paid: 0.0,
            paid_at: None,
            notified: false,
            created_at: now,
            updated_at: now,
        };
        let invoice = self
            .repo
            .insert_invoice(invoice)
            .await
            .map_err(AppError::DatabaseError)?;

        // Only the new charge joins the balance; the previous due is
        // already in there.
        if let (Some(phone), Some(customer)) = (customer_phone.as_deref(), customer.as_ref()) {
            self.repo
                .add_to_customer_balance(phone, totals.current_total)
                .await
                .map_err(AppError::DatabaseError)?;

            if let Err(e) = self
                .repo
                .append_transaction(TransactionRecord {
                    id: Uuid::new_v4(),
                    kind: TransactionKind::Sale,
                    amount: totals.current_total,
                    customer_id: customer.id,
                    customer_name: Some(customer.name.clone()),
                    customer_phone: customer.phone.clone(),
                    date: now,
                })
                .await
            {
                tracing::warn!(invoice = %invoice.number, "Failed to record sale transaction: {}", e);
            }
        }

        self.repo
            .owner_record_sale(totals.current_total)
            .await
            .map_err(AppError::DatabaseError)?;

        metrics::record_invoice_created(invoice.payment_mode.as_str(), totals.current_total);

        tracing::info!(
            invoice = %invoice.number,
            current_total = totals.current_total,
            previous_due,
            total,
            "Invoice created"
        );

        if req.auto_notify {
            self.spawn_notification(&invoice);
        }

        Ok(invoice)
    }

    /// Fire-and-forget notification; failure is logged and swallowed.
    fn spawn_notification(&self, invoice: &Invoice) {
        let Some(to_phone) = invoice.customer_phone.clone() else {
            return;
        };
        let notice = InvoiceNotice {
            to_phone,
            invoice_number: invoice.number.clone(),
            total: invoice.total,
            currency: self.business.currency.clone(),
            business_name: self.business.name.clone(),
            link: format!(
                "{}/invoices/{}",
                self.business.public_url.trim_end_matches('/'),
                invoice.id
            ),
        };
        let notifier = Arc::clone(&self.notifier);
        let repo = self.repo.clone();
        let invoice_id = invoice.id;
        let number = invoice.number.clone();
        tokio::spawn(async move {
            match notifier.send_invoice_notice(&notice).await {
                Ok(()) => {
                    if let Err(e) = repo.mark_invoice_notified(invoice_id).await {
                        tracing::warn!(invoice = %number, "Sent notice but failed to flag invoice: {}", e);
                    }
                }
                Err(e) => {
                    tracing::warn!(invoice = %number, "Invoice notification failed: {}", e);
                }
            }
        });
    }

    /// Apply a partial payment to the rolling balance, clamped at zero.
    /// A balance that reaches zero settles every pending invoice.
    pub async fn settle_balance(
        &self,
        phone: &str,
        amount: f64,
    ) -> Result<SettlementOutcome, AppError> {
        let before = self
            .repo
            .settle_customer_balance(phone, amount)
            .await
            .map_err(AppError::DatabaseError)?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found")))?;

        let previous = before.balance_due;
        let current = round2((previous - amount).max(0.0));

        self.repo
            .owner_record_payment(amount)
            .await
            .map_err(AppError::DatabaseError)?;

        if current == 0.0 {
            self.cascade_settle_pending(phone).await?;
        }

        self.repo
            .append_transaction(payment_record(&before, amount))
            .await
            .map_err(AppError::DatabaseError)?;

        metrics::record_payment(amount);

        tracing::info!(phone, previous, amount, current, "Balance settled");

        Ok(SettlementOutcome {
            phone: phone.to_string(),
            previous,
            amount,
            current,
        })
    }

    /// Mark every pending invoice of the customer paid, each with its own
    /// charge as the recorded payment.
    async fn cascade_settle_pending(&self, phone: &str) -> Result<(), AppError> {
        let pending = self
            .repo
            .pending_invoices_by_phone(phone)
            .await
            .map_err(AppError::DatabaseError)?;
        let now = DateTime::now();
        for invoice in pending {
            self.repo
                .mark_invoice_paid(invoice.id, invoice.effective_amount_paid(), now)
                .await
                .map_err(AppError::DatabaseError)?;
        }
        Ok(())
    }

    /// Change an invoice's status. Transitioning to paid means "the
    /// customer has cleared their account": the full rolling balance is
    /// booked as received, every invoice up to this one is settled, and
    /// the balance drops to zero.
    pub async fn change_invoice_status(
        &self,
        id: Uuid,
        req: UpdateInvoiceStatusRequest,
    ) -> Result<Invoice, AppError> {
        let invoice = self
            .repo
            .find_invoice(id)
            .await
            .map_err(AppError::DatabaseError)?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Not found")))?;

        let customer = match invoice.customer_phone.as_deref() {
            Some(phone) => self
                .repo
                .find_customer_by_phone(phone)
                .await
                .map_err(AppError::DatabaseError)?,
            None => None,
        };
        let customer =
            customer.ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found")))?;

        match req.status {
            InvoiceStatus::Pending => {
                let updated = self
                    .repo
                    .patch_invoice(id, doc! { "status": "pending", "paid_at": Bson::Null })
                    .await
                    .map_err(AppError::DatabaseError)?
                    .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Not found")))?;
                Ok(updated)
            }
            InvoiceStatus::Paid => {
                // The full rolling due settles, not just this invoice.
                let prev_balance = customer.balance_due;
                self.repo
                    .owner_record_payment(prev_balance)
                    .await
                    .map_err(AppError::DatabaseError)?;

                // Display log only; never blocks the payment marking.
                if let Err(e) = self
                    .repo
                    .append_transaction(payment_record(&customer, prev_balance))
                    .await
                {
                    tracing::warn!(invoice = %invoice.number, "Failed to record payment transaction: {}", e);
                }

                let now = DateTime::now();
                let mut patch = doc! { "status": "paid", "paid_at": now };
                if let Some(amount_paid) = req.amount_paid {
                    patch.insert("amount_paid", amount_paid);
                }
                if let Some(payment_ref) = req.payment_ref.as_deref() {
                    patch.insert("payment_ref", payment_ref);
                }
                let updated = self
                    .repo
                    .patch_invoice(id, patch)
                    .await
                    .map_err(AppError::DatabaseError)?
                    .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Not found")))?;

                if let Some(phone) = updated.customer_phone.as_deref() {
                    let older = self
                        .repo
                        .pending_invoices_up_to(phone, updated.created_at, updated.id)
                        .await
                        .map_err(AppError::DatabaseError)?;
                    for inv in older {
                        self.repo
                            .mark_invoice_paid(inv.id, inv.effective_amount_paid(), now)
                            .await
                            .map_err(AppError::DatabaseError)?;
                    }
                    self.repo
                        .zero_customer_balance(phone)
                        .await
                        .map_err(AppError::DatabaseError)?;
                }

                metrics::record_payment(prev_balance);

                tracing::info!(
                    invoice = %updated.number,
                    settled = prev_balance,
                    "Invoice marked paid, older pending invoices cascaded"
                );

                Ok(updated)
            }
        }
    }

    /// Delete a customer and their invoices and transactions. Blocked
    /// while any balance is outstanding; no stock reversal.
    pub async fn delete_customer(&self, id: Uuid) -> Result<CustomerDeletion, AppError> {
        let customer = self
            .repo
            .find_customer_by_id(id)
            .await
            .map_err(AppError::DatabaseError)?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found")))?;

        if customer.balance_due > 0.0 {
            return Err(AppError::HasPendingBalance {
                pending: customer.balance_due,
            });
        }

        let invoices = match customer.phone.as_deref() {
            Some(phone) => self
                .repo
                .delete_invoices_by_phone(phone)
                .await
                .map_err(AppError::DatabaseError)?,
            None => 0,
        };
        let transactions = self
            .repo
            .delete_transactions_by_customer(customer.id)
            .await
            .map_err(AppError::DatabaseError)?;
        self.repo
            .delete_customer(customer.id)
            .await
            .map_err(AppError::DatabaseError)?;

        tracing::info!(customer = %customer.name, invoices, transactions, "Customer deleted");

        Ok(CustomerDeletion {
            invoices,
            transactions,
        })
    }

    /// Wipe all business data and zero the owner aggregate. Irreversible.
    pub async fn hard_reset(&self) -> Result<(), AppError> {
        self.repo.wipe_invoices().await.map_err(AppError::DatabaseError)?;
        self.repo.wipe_customers().await.map_err(AppError::DatabaseError)?;
        self.repo
            .wipe_transactions()
            .await
            .map_err(AppError::DatabaseError)?;
        self.repo
            .reset_owner_stats()
            .await
            .map_err(AppError::DatabaseError)?;
        tracing::warn!("Hard reset: all business data wiped, owner totals zeroed");
        Ok(())
    }
}

fn payment_record(customer: &Customer, amount: f64) -> TransactionRecord {
    TransactionRecord {
        id: Uuid::new_v4(),
        kind: TransactionKind::Payment,
        amount,
        customer_id: customer.id,
        customer_name: Some(customer.name.clone()),
        customer_phone: customer.phone.clone(),
        date: DateTime::now(),
    }
}

fn parse_rfc3339(s: &str) -> Option<DateTime> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| DateTime::from_chrono(dt.with_timezone(&chrono::Utc)))
}
