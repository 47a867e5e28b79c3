// In-memory cluster used by unit tests.
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{
    Container, Namespace, PersistentVolumeClaim, PersistentVolumeClaimSpec, Pod, PodSpec,
    ResourceRequirements,
};
use k8s_openapi::api::networking::v1::{Ingress, IngressRule, IngressSpec};
use k8s_openapi::api::storage::v1::StorageClass;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::source::ResourceSource;


#[derive(Default)]
pub struct FakeSource {
    pub pods: HashMap<String, Vec<Pod>>,
    pub claims: HashMap<String, Vec<PersistentVolumeClaim>>,
    pub ingresses: HashMap<String, Vec<Ingress>>,
    pub storage_classes: Vec<StorageClass>,
    pub namespaces: HashMap<String, Namespace>,
    // namespaces whose queries fail
    pub failing: HashSet<String>,
    // delay applied to every call
    pub delay: Option<Duration>,
}

impl FakeSource {

    pub fn with_pods(mut self, namespace: &str, pods: Vec<Pod>) -> FakeSource {
        self.pods.insert(namespace.to_string(), pods);
        self
    }

    pub fn with_claims(mut self, namespace: &str, claims: Vec<PersistentVolumeClaim>) -> FakeSource {
        self.claims.insert(namespace.to_string(), claims);
        self
    }

    pub fn with_ingresses(mut self, namespace: &str, ingresses: Vec<Ingress>) -> FakeSource {
        self.ingresses.insert(namespace.to_string(), ingresses);
        self
    }

    pub fn with_storage_classes(mut self, names: &[&str]) -> FakeSource {
        self.storage_classes = names.iter().map(|name| StorageClass {
            metadata: meta(name, &[]),
            provisioner: "kubernetes.io/no-provisioner".to_string(),
            ..Default::default()
        }).collect();
        self
    }

    pub fn with_namespace(mut self, name: &str, labels: &[(&str, &str)]) -> FakeSource {
        self.namespaces.insert(name.to_string(), Namespace {
            metadata: meta(name, labels),
            ..Default::default()
        });
        self
    }

    pub fn failing_for(mut self, namespace: &str) -> FakeSource {
        self.failing.insert(namespace.to_string());
        self
    }

    pub fn delayed(mut self, delay: Duration) -> FakeSource {
        self.delay = Some(delay);
        self
    }

    async fn call<T: Clone>(&self, namespace: &str, objects: Option<&T>) -> Result<T, String>
    where
        T: Default,
    {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(namespace) {
            return Err(format!("namespaces \"{}\" is forbidden", namespace));
        }
        Ok(objects.cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ResourceSource for FakeSource {
    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, String> {
        self.call(namespace, self.pods.get(namespace)).await
    }

    async fn list_persistent_volume_claims(&self, namespace: &str) -> Result<Vec<PersistentVolumeClaim>, String> {
        self.call(namespace, self.claims.get(namespace)).await
    }

    async fn list_ingresses(&self, namespace: &str) -> Result<Vec<Ingress>, String> {
        self.call(namespace, self.ingresses.get(namespace)).await
    }

    async fn list_storage_classes(&self) -> Result<Vec<StorageClass>, String> {
        self.call("", Some(&self.storage_classes)).await
    }

    async fn get_namespace(&self, name: &str) -> Result<Namespace, String> {
        match self.namespaces.get(name) {
            Some(namespace) => self.call(name, Some(namespace)).await,
            None => Err(format!("namespaces \"{}\" not found", name)),
        }
    }
}


pub fn meta(name: &str, labels: &[(&str, &str)]) -> ObjectMeta {
    let labels: BTreeMap<String, String> = labels.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ObjectMeta {
        name: Some(name.to_string()),
        labels: if labels.is_empty() { None } else { Some(labels) },
        ..Default::default()
    }
}

fn requests(pairs: &[(&str, &str)]) -> Option<ResourceRequirements> {
    Some(ResourceRequirements {
        requests: Some(pairs.iter().map(|(k, v)| (k.to_string(), Quantity(v.to_string()))).collect()),
        ..Default::default()
    })
}

fn container(name: &str, cpu: &str, memory: &str) -> Container {
    Container {
        name: name.to_string(),
        resources: requests(&[("cpu", cpu), ("memory", memory)]),
        ..Default::default()
    }
}

// Pod with a single container requesting the given cpu and memory.
pub fn pod(name: &str, cpu: &str, memory: &str, labels: &[(&str, &str)]) -> Pod {
    Pod {
        metadata: meta(name, labels),
        spec: Some(PodSpec {
            containers: vec![container("main", cpu, memory)],
            ..Default::default()
        }),
        ..Default::default()
    }
}

// Pod running an extra sidecar container next to the main one.
pub fn pod_with_sidecar(name: &str, cpu: &str, memory: &str, sidecar_cpu: &str, sidecar_memory: &str) -> Pod {
    let mut p = pod(name, cpu, memory, &[]);
    if let Some(spec) = p.spec.as_mut() {
        spec.containers.push(container("sidecar", sidecar_cpu, sidecar_memory));
    }
    p
}

pub fn claim(name: &str, storage_class: Option<&str>, size: &str, labels: &[(&str, &str)]) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        metadata: meta(name, labels),
        spec: Some(PersistentVolumeClaimSpec {
            storage_class_name: storage_class.map(String::from),
            resources: requests(&[("storage", size)]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn ingress(name: &str, hosts: &[&str], labels: &[(&str, &str)]) -> Ingress {
    Ingress {
        metadata: meta(name, labels),
        spec: Some(IngressSpec {
            rules: Some(hosts.iter().map(|host| IngressRule {
                host: Some(host.to_string()),
                ..Default::default()
            }).collect()),
            ..Default::default()
        }),
        ..Default::default()
    }
}
