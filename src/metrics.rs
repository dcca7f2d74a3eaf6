use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use lectern_access::{Action, Decision, ResourceKind};
use lectern_models::{PaymentMethod, SubscriptionOutcome};

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

/// Check if observability is enabled via OBSERVABILITY_ENABLED env var
pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true)
    })
}

/// Installs the Prometheus recorder and its upkeep task.
/// Returns None if observability is disabled.
pub fn init_metrics() -> anyhow::Result<Option<PrometheusHandle>> {
    if !is_observability_enabled() {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5,
                10.0,
            ],
        )?
        .install_recorder()?;

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Ok(Some(handle))
}

/// Metrics middleware to track HTTP requests
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let uri_path = req.uri().path().to_owned();

    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or(uri_path);

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16();

    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status.to_string()).increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path).record(latency);

    let status_category = match status {
        200..=299 => "2xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    };
    counter!("http_requests_by_status", "status_category" => status_category).increment(1);

    gauge!("http_requests_active").decrement(1.0);

    response
}

/// Router serving the Prometheus scrape endpoint
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

// Business metrics helpers

pub fn track_access_decision(kind: ResourceKind, action: Action, decision: Decision) {
    if !is_observability_enabled() {
        return;
    }
    counter!(
        "access_decisions_total",
        "kind" => kind.as_str(),
        "action" => action.as_str(),
        "decision" => decision.as_str()
    )
    .increment(1);
}

pub fn track_subscription_toggle(outcome: SubscriptionOutcome) {
    if !is_observability_enabled() {
        return;
    }
    counter!("subscription_toggles_total", "outcome" => outcome.as_str()).increment(1);
}

/// Toggles that lost the insert race and went back through the delete path
pub fn track_subscription_retry() {
    if !is_observability_enabled() {
        return;
    }
    counter!("subscription_toggle_retries_total").increment(1);
}

pub fn track_resource_created(kind: ResourceKind) {
    if !is_observability_enabled() {
        return;
    }
    counter!("resources_created_total", "kind" => kind.as_str()).increment(1);
}

pub fn track_user_registered() {
    if !is_observability_enabled() {
        return;
    }
    counter!("users_registered_total").increment(1);
}

pub fn track_user_login_success() {
    if !is_observability_enabled() {
        return;
    }
    counter!("user_logins_total", "status" => "success").increment(1);
}

pub fn track_user_login_failure(reason: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("user_logins_total", "status" => "failure", "reason" => reason.to_string())
        .increment(1);
}

pub fn track_jwt_issued() {
    if !is_observability_enabled() {
        return;
    }
    counter!("jwt_tokens_issued_total").increment(1);
}

pub fn track_course_notification_dispatched() {
    if !is_observability_enabled() {
        return;
    }
    counter!("course_update_notifications_total").increment(1);
}

pub fn track_payment_recorded(method: PaymentMethod) {
    if !is_observability_enabled() {
        return;
    }
    counter!("payments_recorded_total", "method" => method.as_str()).increment(1);
}

pub fn track_user_deleted() {
    if !is_observability_enabled() {
        return;
    }
    counter!("users_deleted_total").increment(1);
}
