//! Email worker: claims jobs from the durable queue and delivers them over
//! SMTP until SIGINT or SIGTERM, then drains in-flight deliveries.

use std::sync::Arc;

use color_eyre::eyre::{WrapErr, eyre};
use tokio::sync::watch;
use tracing::{info, info_span, warn};

use whenworks::config::WorkerProcessConfig;
use whenworks::domain::{EmailDelivery, EmailWorker};
use whenworks::outbound::mail::SmtpMailer;
use whenworks::outbound::persistence::DbPool;
use whenworks::outbound::queue::DieselEmailQueue;
use whenworks::signals::wait_for_signal;
use whenworks::telemetry;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let config = WorkerProcessConfig::load()?;
    telemetry::init(config.app.is_production())
        .map_err(|err| eyre!("tracing init failed: {err}"))?;
    let span = info_span!("whenworks", component = "email_worker");

    let pool = DbPool::new(config.database.pool_config()?)
        .await
        .wrap_err("database pool could not be created")?;
    let mailer = SmtpMailer::new(config.smtp.mailer_config()?)
        .wrap_err("SMTP transport set-up failed")?;
    let delivery = Arc::new(EmailDelivery::new(
        Arc::new(mailer),
        info_span!(parent: &span, "component", name = "delivery"),
    ));
    let worker = EmailWorker::new(
        Arc::new(DieselEmailQueue::new(pool)),
        delivery,
        config.worker.worker_config()?,
        info_span!(parent: &span, "component", name = "pool"),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signal_span = span.clone();
    tokio::spawn(async move {
        wait_for_signal(&signal_span).await;
        signal_span.in_scope(|| info!("shutdown requested, no new jobs will be claimed"));
        shutdown_tx.send_replace(true);
    });

    let report = worker
        .run(shutdown_rx)
        .await
        .wrap_err("email worker stopped unexpectedly")?;
    span.in_scope(|| {
        if report.abandoned > 0 {
            warn!(abandoned = report.abandoned, "deliveries abandoned at shutdown");
        } else {
            info!("email worker drained");
        }
    });
    Ok(())
}
