use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use kube_tenant_cost_lib::{CostEngine, ResourceKind, ResourceSource};
use log::{debug, error, info};
use serde::Serialize;
use serde_json::json;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};

use crate::metrics::ApiMetrics;


// Tenants the caller is entitled to, as a comma-separated query parameter.
// The auth layer in front of this service is responsible for filling it in.
pub fn tenants_from_query(query: &HashMap<String, String>) -> Option<Vec<String>> {
    let tenants: Vec<String> = query.get("tenants")?
        .split(',')
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect();
    if tenants.is_empty() {
        None
    } else {
        Some(tenants)
    }
}

fn message(text: &str, status: StatusCode) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(&json!({ "message": text })), status)
}

fn respond<T: Serialize>(what: &str,
                         result: kube_tenant_cost_lib::Result<T>,
                         metrics: &ApiMetrics) -> WithStatus<Json> {
    match result {
        Ok(body) => warp::reply::with_status(warp::reply::json(&body), StatusCode::OK),
        Err(e) => {
            error!("failed to compute {}: {}", what, e);
            metrics.failures.with_label_values(&[what]).inc();
            message(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}


// Cost of one resource kind for every requested tenant.
pub async fn cost<S: ResourceSource + 'static>(
    kind: ResourceKind,
    query: HashMap<String, String>,
    engine: Arc<CostEngine<S>>,
    metrics: ApiMetrics,
) -> Result<WithStatus<Json>, Infallible> {
    let tenants = match tenants_from_query(&query) {
        Some(t) => t,
        None => return Ok(message("missing tenants parameter", StatusCode::BAD_REQUEST)),
    };
    let what = kind.to_string();
    info!("computing {} cost for {} tenants", what, tenants.len());
    metrics.requests.with_label_values(&[what.as_str()]).inc();
    let in_ms = Instant::now();

    let reply = match kind {
        ResourceKind::Cpu => respond(&what, engine.compute_cpu_costs(&tenants).await, &metrics),
        ResourceKind::Memory => respond(&what, engine.compute_memory_costs(&tenants).await, &metrics),
        ResourceKind::Storage => respond(&what, engine.compute_storage_costs(&tenants).await, &metrics),
        ResourceKind::Ingress => respond(&what, engine.compute_ingress_costs(&tenants).await, &metrics),
    };

    metrics.processing_ms.observe(in_ms.elapsed().as_millis() as f64);
    debug!("{} cost computed in {}ms", what, in_ms.elapsed().as_millis());
    Ok(reply)
}


// Static quota labels of the requested tenants' namespaces.
pub async fn quota<S: ResourceSource + 'static>(
    query: HashMap<String, String>,
    engine: Arc<CostEngine<S>>,
    metrics: ApiMetrics,
) -> Result<WithStatus<Json>, Infallible> {
    let tenants = match tenants_from_query(&query) {
        Some(t) => t,
        None => return Ok(message("missing tenants parameter", StatusCode::BAD_REQUEST)),
    };
    let label = match query.get("label").filter(|l| !l.is_empty()) {
        Some(l) => l.clone(),
        None => return Ok(message("missing label parameter", StatusCode::BAD_REQUEST)),
    };
    metrics.requests.with_label_values(&["quota"]).inc();
    Ok(respond("quota", engine.resource_quotas(&tenants, &label).await, &metrics))
}


// Pod names of the requested tenants.
pub async fn pods<S: ResourceSource + 'static>(
    query: HashMap<String, String>,
    engine: Arc<CostEngine<S>>,
    metrics: ApiMetrics,
) -> Result<WithStatus<Json>, Infallible> {
    let tenants = match tenants_from_query(&query) {
        Some(t) => t,
        None => return Ok(message("missing tenants parameter", StatusCode::BAD_REQUEST)),
    };
    metrics.requests.with_label_values(&["pods"]).inc();
    Ok(respond("pods", engine.tenant_pods(&tenants).await, &metrics))
}
