// service/background_jobs.rs
use std::sync::Arc;

use chrono::Utc;
use tokio::time::{interval, Duration};

use crate::{
    db::invoicedb::InvoiceExt,
    service::due_reading_service::scan_due_readings,
    AppState,
};

/// Runs the due-reading scan every `every_hours` hours.
pub async fn start_due_reading_job(app_state: Arc<AppState>, every_hours: u64) {
    let mut interval = interval(Duration::from_secs(every_hours * 3600));

    loop {
        interval.tick().await;

        tracing::info!("Running due-reading scan at {}", Utc::now());

        let today = Utc::now().date_naive();
        match scan_due_readings(
            app_state.db_client.as_ref(),
            &app_state.notification_service,
            today,
        )
        .await
        {
            Ok(report) => tracing::info!(
                "Due-reading scan completed: {} rooms due across {} properties",
                report.rooms_due,
                report.properties_scanned
            ),
            Err(e) => tracing::error!("Due-reading scan failed: {}", e),
        }
    }
}

/// Flags pending invoices past their due date as overdue, hourly.
pub async fn start_overdue_invoice_job(app_state: Arc<AppState>) {
    let mut interval = interval(Duration::from_secs(3600));

    loop {
        interval.tick().await;

        let today = Utc::now().date_naive();
        match app_state.db_client.mark_overdue_invoices(today).await {
            Ok(0) => tracing::debug!("Overdue job: nothing to update"),
            Ok(count) => tracing::info!("Overdue job: {} invoices marked overdue", count),
            Err(e) => tracing::error!("Overdue job failed: {}", e),
        }
    }
}
