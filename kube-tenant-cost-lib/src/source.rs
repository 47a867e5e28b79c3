use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, PersistentVolumeClaim, Pod};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::api::storage::v1::StorageClass;
use kube::{Api, Client, api::ListParams};
use log::debug;

// Objects requested per list call
const PAGE_SIZE: u32 = 500;


// Read access to the cluster objects the cost engine consumes.
// Errors are reported as plain messages, the reader decides how to surface them.
#[async_trait]
pub trait ResourceSource: Send + Sync {
    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, String>;

    async fn list_persistent_volume_claims(&self, namespace: &str) -> Result<Vec<PersistentVolumeClaim>, String>;

    async fn list_ingresses(&self, namespace: &str) -> Result<Vec<Ingress>, String>;

    async fn list_storage_classes(&self) -> Result<Vec<StorageClass>, String>;

    async fn get_namespace(&self, name: &str) -> Result<Namespace, String>;
}


// Follow continue tokens until the whole list has been read.
macro_rules! list_paged {
    ($api:expr, $what:expr) => {{
        let api = $api;
        let mut items = Vec::new();
        let mut continue_token: Option<String> = None;
        loop {
            let lp = match &continue_token {
                Some(token) => ListParams::default().limit(PAGE_SIZE).continue_token(token),
                None => ListParams::default().limit(PAGE_SIZE),
            };
            let page = api.list(&lp).await.map_err(|e| e.to_string())?;
            items.extend(page.items);
            match page.metadata.continue_ {
                Some(token) if !token.is_empty() => {
                    debug!("continuing {} list with token {}", $what, token);
                    continue_token = Some(token);
                },
                _ => break,
            }
        }
        Ok(items)
    }};
}


// Kubernetes API backed source.
#[derive(Clone)]
pub struct KubeSource {
    client: Client,
}

impl KubeSource {
    pub fn new(client: Client) -> KubeSource {
        KubeSource { client }
    }
}

#[async_trait]
impl ResourceSource for KubeSource {
    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, String> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        list_paged!(api, "pods")
    }

    async fn list_persistent_volume_claims(&self, namespace: &str) -> Result<Vec<PersistentVolumeClaim>, String> {
        let api: Api<PersistentVolumeClaim> = Api::namespaced(self.client.clone(), namespace);
        list_paged!(api, "persistentvolumeclaims")
    }

    async fn list_ingresses(&self, namespace: &str) -> Result<Vec<Ingress>, String> {
        let api: Api<Ingress> = Api::namespaced(self.client.clone(), namespace);
        list_paged!(api, "ingresses")
    }

    async fn list_storage_classes(&self) -> Result<Vec<StorageClass>, String> {
        let api: Api<StorageClass> = Api::all(self.client.clone());
        list_paged!(api, "storageclasses")
    }

    async fn get_namespace(&self, name: &str) -> Result<Namespace, String> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        api.get(name).await.map_err(|e| e.to_string())
    }
}
