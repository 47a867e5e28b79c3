#![deny(warnings)]

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::Ipv4Addr;
use std::process::exit;
use std::sync::Arc;
use std::time::Duration;

use argh::FromArgs;
use kube::Client;
use kube_tenant_cost_lib::{CostEngine, KubeSource, PriceTable, ResourceKind};
use log::{debug, error, info, warn};
use warp::http::StatusCode;
use warp::log as http_log;
use warp::Filter;

mod handlers;
mod metrics;

use metrics::ApiMetrics;


#[derive(FromArgs)]
/// Tenant cost API
struct TenantCostApiArgs {
    /// port for serving http (default 8000)
    #[argh(option, default = "default_port()")]
    port: u16,

    /// interface for serving http (default 127.0.0.1)
    #[argh(option, default = "String::from(\"127.0.0.1\")")]
    interface: String,

    /// timeout for a single kubernetes query in seconds (default 10)
    #[argh(option, default = "default_query_timeout()")]
    query_timeout_seconds: u64,
}

// port
fn default_port() -> u16 {
    8000
}

// k8s query timeout
fn default_query_timeout() -> u64 { 10 }


#[tokio::main]
async fn main() {
    let dotenv_loaded = dotenvy::dotenv().is_ok();
    env_logger::init();
    if !dotenv_loaded {
        warn!("Error loading .env file");
    }
    let http_log_wrapper = http_log("Tenant-Cost-API");

    let args: TenantCostApiArgs = argh::from_env();
    let interface = args.interface.clone();

    let prices = match PriceTable::from_env() {
        Ok(p) => Arc::new(p),
        Err(e) => {
            error!("Invalid configuration: {}", e);
            exit(1);
        }
    };

    let k8s_client = match Client::try_default().await {
        Ok(k_c) => {
            debug!("Initialized k8s client");
            k_c
        },
        Err(e) => {
            error!("Failed to instantiate k8s client: {}", e.to_string());
            exit(1);
        }
    };

    let engine = Arc::new(CostEngine::new(
        KubeSource::new(k8s_client),
        prices,
        Duration::from_secs(args.query_timeout_seconds)));

    // every storage class in the cluster must be priced before serving
    if let Err(e) = engine.verify_storage_classes().await {
        error!("Storage class check failed, will go down ...: {}", e);
        exit(1);
    }

    let api_metrics = match ApiMetrics::new() {
        Ok(m) => m,
        Err(e) => {
            error!("Failed to register metrics: {}", e);
            exit(1);
        }
    };

    fn with_engine(
        __engine: Arc<CostEngine<KubeSource>>,
    ) -> impl Filter<Extract = (Arc<CostEngine<KubeSource>>,), Error = Infallible> + Clone {
        warp::any().map(move || __engine.clone())
    }

    fn with_metrics(
        __metrics: ApiMetrics,
    ) -> impl Filter<Extract = (ApiMetrics,), Error = Infallible> + Clone {
        warp::any().map(move || __metrics.clone())
    }

    let cost = warp::path!("cost" / ResourceKind)
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_engine(engine.clone()))
        .and(with_metrics(api_metrics.clone()))
        .and_then(handlers::cost);

    let quota = warp::path!("quota")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_engine(engine.clone()))
        .and(with_metrics(api_metrics.clone()))
        .and_then(handlers::quota);

    let pods = warp::path!("pods")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_engine(engine.clone()))
        .and(with_metrics(api_metrics.clone()))
        .and_then(handlers::pods);

    let metrics = warp::path!("metrics")
        .and(warp::get())
        .and(with_metrics(api_metrics.clone()))
        .map(|_m: ApiMetrics| {
            match _m.gather() {
                Ok(text) => warp::reply::with_status(text, StatusCode::OK),
                Err(e) => {
                    error!("Failed to encode metrics: {}", e);
                    warp::reply::with_status(String::new(), StatusCode::INTERNAL_SERVER_ERROR)
                }
            }
        });

    // liveness
    let health = warp::path!("healthz").and(warp::get()).map(|| "Up\n");

    let routes = metrics
        .or(health)
        .or(cost)
        .or(quota)
        .or(pods)
        .with(http_log_wrapper);

    let listen_addr = interface.parse::<Ipv4Addr>();

    let exit_code = match listen_addr {
        Ok(ip) => {
            info!("Tenant cost API is listening on {}:{}", ip, args.port);
            warp::serve(routes)
                .run((ip, args.port)).await;
            0
        }
        Err(e) => {
            error!("Invalid IP address: {}, err={}", interface, e);
            2
        }
    };

    exit(exit_code);
}
