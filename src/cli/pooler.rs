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

use crate::cli::display::{PodInfo, PoolerStatus, TableRenderer};
use crate::domain::config::{apply_to_operator_config, OperatorConfig};
use crate::domain::pooler::PoolerManifests;
use crate::infrastructure::constants::{DEFAULT_NAMESPACE, POOLER_NAME_LABEL};
use crate::infrastructure::kubernetes::resources::pod::load_pod_template_from_file;
use crate::infrastructure::kubernetes::resources::{deployment, spec_hash_of};
use crate::infrastructure::kubernetes::{
    apply_if_changed, ApplyOutcome, PoolerKubeClient, PoolerKubeClientImpl,
};
use clap::Parser;
use colored::Colorize;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use std::collections::{BTreeMap, HashMap};
use tracing::info;

#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

/// Inputs shared by every command that renders a Deployment
#[derive(clap::Args, Debug, Clone)]
pub struct ManifestArgs {
    /// Path to the Pooler manifest (YAML)
    #[arg(long, value_name = "PATH")]
    pub pooler: String,

    /// Path to the Cluster manifest the pooler points at (YAML)
    #[arg(long, value_name = "PATH")]
    pub cluster: String,

    /// Pod template file (YAML) replacing spec.template of the pooler
    #[arg(long, value_name = "PATH")]
    pub pod_template: Option<String>,

    /// Operator configuration file (TOML)
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Dynamic configuration properties (-D key=value)
    ///
    /// Keys: operator.image, pgbouncer.image, field-manager
    ///
    /// Example: -Dpgbouncer.image=quay.io/enterprisedb/pgbouncer:1.17.0
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    pub properties: Vec<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct KubeArgs {
    /// Path to kubeconfig file
    /// If not specified, uses default kubeconfig resolution (KUBECONFIG env or ~/.kube/config)
    #[arg(long)]
    pub kubeconfig: Option<String>,

    /// Kubernetes context to use
    #[arg(long)]
    pub context: Option<String>,
}

#[derive(Parser, Debug)]
pub struct RenderCommand {
    #[command(flatten)]
    pub manifests: ManifestArgs,

    /// Output format
    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Yaml)]
    pub output: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct DescribeCommand {
    #[command(flatten)]
    pub manifests: ManifestArgs,
}

#[derive(Parser, Debug)]
pub struct ApplyCommand {
    #[command(flatten)]
    pub manifests: ManifestArgs,

    #[command(flatten)]
    pub kube: KubeArgs,
}

#[derive(Parser, Debug)]
pub struct StatusCommand {
    /// Pooler name
    pub name: String,

    /// Kubernetes namespace
    #[arg(long, short = 'n', default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,

    #[command(flatten)]
    pub kube: KubeArgs,
}

impl ManifestArgs {
    /// Load the operator configuration: file, then environment, then -D properties
    pub fn operator_config(&self) -> anyhow::Result<OperatorConfig> {
        let mut config = match &self.config {
            Some(path) => OperatorConfig::from(path)?,
            None => OperatorConfig::default(),
        }
        .with_env_overrides();

        if !self.properties.is_empty() {
            let dynamic_configs = parse_dynamic_configs(&self.properties)
                .map_err(|e| anyhow::anyhow!("Failed to parse dynamic configs: {}", e))?;
            apply_to_operator_config(&dynamic_configs, &mut config);
        }

        Ok(config)
    }

    pub fn load_manifests(&self) -> anyhow::Result<PoolerManifests> {
        let mut manifests = PoolerManifests::from_files(&self.pooler, &self.cluster)?;

        if let Some(path) = &self.pod_template {
            info!("Using pod template from {}", path);
            manifests.pooler.spec.template = Some(load_pod_template_from_file(path)?);
        }

        Ok(manifests)
    }

    /// Install the operator configuration and build the Deployment
    pub fn render_deployment(&self) -> anyhow::Result<(PoolerManifests, Deployment)> {
        let config = self.operator_config()?;
        config.install()?;

        let manifests = self.load_manifests()?;
        let deployment = deployment(&manifests.pooler, &manifests.cluster)?;
        Ok((manifests, deployment))
    }
}

impl RenderCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let (_, deployment) = self.manifests.render_deployment()?;
        print!("{}", format_deployment(&deployment, self.output)?);
        Ok(())
    }
}

impl DescribeCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let (_, deployment) = self.manifests.render_deployment()?;
        println!(
            "{}",
            TableRenderer::new().render_pod_template_summary(&deployment)
        );
        Ok(())
    }
}

impl ApplyCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let (manifests, deployment) = self.manifests.render_deployment()?;
        let config = OperatorConfig::current();

        let client = PoolerKubeClientImpl::new_with_config(
            manifests.pooler.namespace().to_string(),
            self.kube.kubeconfig.clone(),
            self.kube.context.clone(),
            config.field_manager.clone(),
        )
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Kubernetes client: {}", e))?;

        let outcome = apply_if_changed(&client, &deployment)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to apply pooler deployment: {}", e))?;

        let name = format!("{}/{}", manifests.pooler.namespace(), manifests.pooler.name());
        match outcome {
            ApplyOutcome::Created => println!("{} {} created", "✓".green(), name),
            ApplyOutcome::Updated => println!("{} {} updated", "✓".green(), name),
            ApplyOutcome::Unchanged => {
                println!("{} {} unchanged", "○".bright_black(), name)
            }
        }
        Ok(())
    }
}

impl StatusCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let client = PoolerKubeClientImpl::new_with_config(
            self.namespace.clone(),
            self.kube.kubeconfig.clone(),
            self.kube.context.clone(),
            OperatorConfig::current().field_manager.clone(),
        )
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Kubernetes client: {}", e))?;

        let status = fetch_pooler_status(&client, &self.name)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get pooler status: {}", e))?;

        println!("{}", TableRenderer::new().render_pooler_status(&status));
        Ok(())
    }
}

pub async fn fetch_pooler_status(
    client: &dyn PoolerKubeClient,
    name: &str,
) -> crate::Result<PoolerStatus> {
    let deployment = client.get_deployment(name).await?;
    let selector = BTreeMap::from([(POOLER_NAME_LABEL.to_string(), name.to_string())]);
    let pods = client.get_pods_with_labels(&selector).await?;

    Ok(PoolerStatus {
        name: name.to_string(),
        namespace: client.namespace().to_string(),
        ready_replicas: deployment
            .status
            .as_ref()
            .and_then(|s| s.ready_replicas)
            .unwrap_or(0),
        desired_replicas: deployment
            .spec
            .as_ref()
            .and_then(|s| s.replicas)
            .unwrap_or(0),
        spec_hash: spec_hash_of(&deployment).map(str::to_string),
        pods: pods.iter().map(pod_info).collect(),
    })
}

fn pod_info(pod: &Pod) -> PodInfo {
    let status = pod.status.as_ref();
    let ready = status
        .and_then(|s| s.conditions.as_ref())
        .map(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True")
        })
        .unwrap_or(false);

    PodInfo {
        name: pod.metadata.name.clone().unwrap_or_default(),
        phase: status
            .and_then(|s| s.phase.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
        ready,
    }
}

pub fn format_deployment(deployment: &Deployment, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Yaml => serde_yaml::to_string(deployment)?,
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(deployment)?;
            json.push('\n');
            json
        }
    })
}

pub fn parse_dynamic_configs(configs: &[String]) -> Result<HashMap<String, String>, String> {
    let mut map = HashMap::new();

    for config in configs {
        let parts: Vec<&str> = config.splitn(2, '=').collect();
        if parts.len() != 2 {
            return Err(format!(
                "Invalid config format: '{}'. Expected 'key=value'",
                config
            ));
        }

        let key = parts[0].trim();
        let value = parts[1].trim();

        if key.is_empty() {
            return Err(format!("Empty key in config: '{}'", config));
        }

        map.insert(key.to_string(), value.to_string());
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::error::KubeError;
    use k8s_openapi::api::apps::v1::{DeploymentSpec, DeploymentStatus};
    use k8s_openapi::api::core::v1::{PodCondition, PodStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    #[test]
    fn test_parse_dynamic_configs() {
        let configs = vec![
            "pgbouncer.image=pgb:2".to_string(),
            " field-manager = ops ".to_string(),
            "operator.image=registry/op:1=beta".to_string(),
        ];
        let map = parse_dynamic_configs(&configs).unwrap();
        assert_eq!(map["pgbouncer.image"], "pgb:2");
        assert_eq!(map["field-manager"], "ops");
        assert_eq!(map["operator.image"], "registry/op:1=beta");
    }

    #[test]
    fn test_parse_dynamic_configs_errors() {
        assert!(parse_dynamic_configs(&["novalue".to_string()]).is_err());
        assert!(parse_dynamic_configs(&["=value".to_string()]).is_err());
    }

    #[test]
    fn test_operator_config_from_properties() {
        let args = ManifestArgs {
            pooler: String::new(),
            cluster: String::new(),
            pod_template: None,
            config: None,
            properties: vec!["field-manager=ops".to_string()],
        };
        let config = args.operator_config().unwrap();
        assert_eq!(config.field_manager, "ops");
    }

    #[test]
    fn test_format_deployment() {
        let deployment = Deployment {
            metadata: ObjectMeta {
                name: Some("pgb1".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let yaml = format_deployment(&deployment, OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("name: pgb1"));
        let json = format_deployment(&deployment, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["metadata"]["name"], "pgb1");
    }

    struct StaticClient {
        deployment: Deployment,
        pods: Vec<Pod>,
    }

    #[async_trait::async_trait]
    impl PoolerKubeClient for StaticClient {
        fn namespace(&self) -> &str {
            "ns1"
        }

        async fn get_deployment(&self, _name: &str) -> Result<Deployment, KubeError> {
            Ok(self.deployment.clone())
        }

        async fn apply_deployment(&self, _deployment: &Deployment) -> Result<(), KubeError> {
            Ok(())
        }

        async fn get_pods_with_labels(
            &self,
            labels: &BTreeMap<String, String>,
        ) -> Result<Vec<Pod>, KubeError> {
            assert_eq!(labels[POOLER_NAME_LABEL], "pgb1");
            Ok(self.pods.clone())
        }
    }

    #[tokio::test]
    async fn test_fetch_pooler_status() {
        let client = StaticClient {
            deployment: Deployment {
                spec: Some(DeploymentSpec {
                    replicas: Some(2),
                    ..Default::default()
                }),
                status: Some(DeploymentStatus {
                    ready_replicas: Some(1),
                    ..Default::default()
                }),
                ..Default::default()
            },
            pods: vec![Pod {
                metadata: ObjectMeta {
                    name: Some("pgb1-abc".to_string()),
                    ..Default::default()
                },
                status: Some(PodStatus {
                    phase: Some("Running".to_string()),
                    conditions: Some(vec![PodCondition {
                        type_: "Ready".to_string(),
                        status: "True".to_string(),
                        ..Default::default()
                    }]),
                    ..Default::default()
                }),
                ..Default::default()
            }],
        };

        let status = fetch_pooler_status(&client, "pgb1").await.unwrap();
        assert_eq!(status.namespace, "ns1");
        assert_eq!(status.desired_replicas, 2);
        assert_eq!(status.ready_replicas, 1);
        assert!(status.spec_hash.is_none());
        assert_eq!(status.pods.len(), 1);
        assert!(status.pods[0].ready);
        assert_eq!(status.pods[0].phase, "Running");
    }
}
