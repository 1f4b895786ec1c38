use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder. Call once at startup; repeated calls
/// (test harness spawning several apps in one process) are no-ops.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_some() {
        return;
    }
    if let Ok(handle) = PrometheusBuilder::new().install_recorder() {
        let _ = METRICS_HANDLE.set(handle);
    }
}

pub fn render_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

pub fn record_invoice_created(payment_mode: &str, current_total: f64) {
    let labels = [("payment_mode", payment_mode.to_string())];
    counter!("pos_invoices_created_total", &labels).increment(1);
    histogram!("pos_invoice_amount", &labels).record(current_total);
}

pub fn record_payment(amount: f64) {
    counter!("pos_payments_recorded_total").increment(1);
    histogram!("pos_payment_amount").record(amount);
}
