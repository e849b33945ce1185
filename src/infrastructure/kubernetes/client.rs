// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::infrastructure::constants::DEFAULT_FIELD_MANAGER;
use crate::infrastructure::kubernetes::resources::spec_hash_of;
use crate::shared::error::KubeError;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::{Api, Client};
use std::collections::BTreeMap;
use tracing::info;

#[async_trait::async_trait]
pub trait PoolerKubeClient: Send + Sync {
    fn namespace(&self) -> &str;

    async fn get_deployment(&self, name: &str) -> Result<Deployment, KubeError>;

    async fn apply_deployment(&self, deployment: &Deployment) -> Result<(), KubeError>;

    async fn get_pods_with_labels(
        &self,
        labels: &BTreeMap<String, String>,
    ) -> Result<Vec<Pod>, KubeError>;
}

/// What `apply_if_changed` did with a rendered Deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Created,
    Updated,
    Unchanged,
}

/// Apply a rendered Deployment unless the live one already carries the same
/// rendered spec hash.
pub async fn apply_if_changed(
    client: &dyn PoolerKubeClient,
    deployment: &Deployment,
) -> Result<ApplyOutcome, KubeError> {
    let name = deployment
        .metadata
        .name
        .as_deref()
        .ok_or_else(|| KubeError::ConfigError("Deployment name is required".to_string()))?;

    let outcome = match client.get_deployment(name).await {
        Ok(live) => {
            let desired_hash = spec_hash_of(deployment);
            if desired_hash.is_some() && spec_hash_of(&live) == desired_hash {
                info!(
                    "Deployment {}/{} is up to date, skipping apply",
                    client.namespace(),
                    name
                );
                return Ok(ApplyOutcome::Unchanged);
            }
            ApplyOutcome::Updated
        }
        Err(KubeError::NotFound { .. }) => ApplyOutcome::Created,
        Err(e) => return Err(e),
    };

    client.apply_deployment(deployment).await?;
    info!(
        "Deployment {}/{} {}",
        client.namespace(),
        name,
        if outcome == ApplyOutcome::Created {
            "created"
        } else {
            "updated"
        }
    );
    Ok(outcome)
}

pub struct PoolerKubeClientImpl {
    client: Client,
    namespace: String,
    field_manager: String,
}

impl PoolerKubeClientImpl {
    pub async fn new(namespace: String) -> Result<Self, KubeError> {
        let client = Client::try_default().await.map_err(|e| {
            KubeError::KubeError(format!("Failed to create Kubernetes client: {}", e))
        })?;

        Ok(Self {
            client,
            namespace,
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
        })
    }

    pub async fn new_with_config(
        namespace: String,
        kubeconfig_path: Option<String>,
        context: Option<String>,
        field_manager: String,
    ) -> Result<Self, KubeError> {
        use kube::config::{KubeConfigOptions, Kubeconfig};

        let kubeconfig = if let Some(path) = kubeconfig_path {
            Kubeconfig::read_from(path)
                .map_err(|e| KubeError::KubeError(format!("Failed to load kubeconfig: {}", e)))?
        } else {
            Kubeconfig::read()
                .map_err(|e| KubeError::KubeError(format!("Failed to load kubeconfig: {}", e)))?
        };

        let config_options = KubeConfigOptions {
            context,
            cluster: None,
            user: None,
        };

        let config = kube::Config::from_custom_kubeconfig(kubeconfig, &config_options)
            .await
            .map_err(|e| {
                KubeError::KubeError(format!("Failed to create Kubernetes config: {}", e))
            })?;

        let client = Client::try_from(config).map_err(|e| {
            KubeError::KubeError(format!("Failed to create Kubernetes client: {}", e))
        })?;

        Ok(Self {
            client,
            namespace,
            field_manager,
        })
    }

    fn deployments(&self) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }
}

#[async_trait::async_trait]
impl PoolerKubeClient for PoolerKubeClientImpl {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get_deployment(&self, name: &str) -> Result<Deployment, KubeError> {
        self.deployments().get(name).await.map_err(|e| {
            if let kube::Error::Api(ae) = e {
                if ae.code == 404 {
                    KubeError::not_found("Deployment", name, &self.namespace)
                } else {
                    KubeError::KubeError(ae.message)
                }
            } else {
                KubeError::KubeError(e.to_string())
            }
        })
    }

    /// Server-side apply, which also creates the Deployment when it is missing
    async fn apply_deployment(&self, deployment: &Deployment) -> Result<(), KubeError> {
        let name = deployment
            .metadata
            .name
            .as_ref()
            .ok_or_else(|| KubeError::ConfigError("Deployment name is required".to_string()))?;

        let patch_params = kube::api::PatchParams::apply(&self.field_manager).force();
        let patch = serde_json::to_value(deployment).map_err(|e| {
            KubeError::KubeError(format!("Failed to serialize Deployment: {}", e))
        })?;
        self.deployments()
            .patch(name, &patch_params, &kube::api::Patch::Apply(patch))
            .await?;
        Ok(())
    }

    async fn get_pods_with_labels(
        &self,
        labels: &BTreeMap<String, String>,
    ) -> Result<Vec<Pod>, KubeError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), &self.namespace);
        let label_selector = labels
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(",");

        let lp = kube::api::ListParams::default().labels(&label_selector);

        let pods = api.list(&lp).await?;
        Ok(pods.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::api::{Cluster, ClusterReference, Pooler, PoolerSpec};
    use crate::domain::config::OperatorConfig;
    use crate::infrastructure::constants::POOLER_SPEC_HASH_ANNOTATION;
    use crate::infrastructure::kubernetes::resources::build_deployment_with_config;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeClient {
        live: Option<Deployment>,
        applied: Mutex<Vec<Deployment>>,
    }

    #[async_trait::async_trait]
    impl PoolerKubeClient for FakeClient {
        fn namespace(&self) -> &str {
            "ns1"
        }

        async fn get_deployment(&self, name: &str) -> Result<Deployment, KubeError> {
            self.live
                .clone()
                .ok_or_else(|| KubeError::not_found("Deployment", name, "ns1"))
        }

        async fn apply_deployment(&self, deployment: &Deployment) -> Result<(), KubeError> {
            self.applied.lock().unwrap().push(deployment.clone());
            Ok(())
        }

        async fn get_pods_with_labels(
            &self,
            _labels: &BTreeMap<String, String>,
        ) -> Result<Vec<Pod>, KubeError> {
            Ok(Vec::new())
        }
    }

    fn hashed(hash: &str) -> Deployment {
        Deployment {
            metadata: ObjectMeta {
                name: Some("pgb1".to_string()),
                annotations: Some(BTreeMap::from([(
                    POOLER_SPEC_HASH_ANNOTATION.to_string(),
                    hash.to_string(),
                )])),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_apply_creates_missing_deployment() {
        let client = FakeClient::default();
        let outcome = apply_if_changed(&client, &hashed("a")).await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Created);
        assert_eq!(client.applied.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_apply_skips_same_hash() {
        let client = FakeClient {
            live: Some(hashed("a")),
            ..Default::default()
        };
        let outcome = apply_if_changed(&client, &hashed("a")).await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Unchanged);
        assert!(client.applied.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_apply_updates_changed_hash() {
        let client = FakeClient {
            live: Some(hashed("a")),
            ..Default::default()
        };
        let outcome = apply_if_changed(&client, &hashed("b")).await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Updated);
        assert_eq!(client.applied.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_apply_requires_name() {
        let client = FakeClient::default();
        let err = apply_if_changed(&client, &Deployment::default())
            .await
            .unwrap_err();
        assert!(matches!(err, KubeError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_apply_rolls_out_cluster_and_image_changes() {
        let pooler = Pooler::new(
            "pgb1",
            "ns1",
            PoolerSpec {
                cluster: ClusterReference {
                    name: "cluster-example".to_string(),
                },
                ..Default::default()
            },
        );
        let cluster =
            Cluster::new("cluster-example", "ns1").with_certificates("ca-secret", "tls-secret");
        let live =
            build_deployment_with_config(&pooler, &cluster, &OperatorConfig::default()).unwrap();

        let rotated =
            Cluster::new("cluster-example", "ns1").with_certificates("ca-rotated", "tls-rotated");
        let upgraded = OperatorConfig {
            pgbouncer_image: "quay.io/enterprisedb/pgbouncer:1.17.0".to_string(),
            ..Default::default()
        };
        let desired = build_deployment_with_config(&pooler, &rotated, &upgraded).unwrap();

        let client = FakeClient {
            live: Some(live),
            ..Default::default()
        };
        let outcome = apply_if_changed(&client, &desired).await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Updated);
        assert_eq!(client.applied.lock().unwrap().as_slice(), &[desired]);
    }
}
