use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryEmailQueue, InMemorySubmissionRepository, LogMailer};
use crate::routes::with_quiz_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use style_finder::config::{AppConfig, QueueConfig};
use style_finder::error::AppError;
use style_finder::quiz::{CoachMailer, EmailQueue, QuizService, SubmissionRepository};
use style_finder::telemetry;
use tracing::{error, info};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemorySubmissionRepository::default());
    let queue = Arc::new(InMemoryEmailQueue::default());
    let mailer = Arc::new(LogMailer::new(config.notification.sender.clone()));
    let quiz_service = Arc::new(QuizService::new(
        repository,
        queue,
        mailer,
        &config.notification,
    ));

    spawn_queue_worker(quiz_service.clone(), config.queue);

    let app = with_quiz_routes(quiz_service, config.admin.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        email_enabled = config.notification.enabled,
        "style finder quiz service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Periodically drain the coach email retry queue. An interval of zero leaves retries to the cron route.
fn spawn_queue_worker<R, Q, M>(service: Arc<QuizService<R, Q, M>>, config: QueueConfig)
where
    R: SubmissionRepository + 'static,
    Q: EmailQueue + 'static,
    M: CoachMailer + 'static,
{
    if config.interval_secs == 0 {
        info!("email queue worker disabled");
        return;
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(config.interval_secs));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let worker = service.clone();
            let run = tokio::task::spawn_blocking(move || worker.process_queue(config.batch_size));
            match run.await {
                Ok(Ok(_)) => {}
                Ok(Err(err)) => error!(error = %err, "email queue worker run failed"),
                Err(err) => error!(error = %err, "email queue worker task panicked"),
            }
        }
    });
}
