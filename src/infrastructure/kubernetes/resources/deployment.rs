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

use crate::domain::api::{Cluster, Pooler};
use crate::domain::config::OperatorConfig;
use crate::domain::pooler::{DefaultDeploymentValidator, DeploymentValidator};
use crate::infrastructure::constants::*;
use crate::infrastructure::kubernetes::resources::pod::PodTemplateBuilder;
use crate::shared::error::Result;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    ContainerPort, EmptyDirVolumeSource, EnvVar, PodTemplateSpec, SecretVolumeSource, Volume,
    VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta, OwnerReference};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::debug;

/// Build the pgbouncer Deployment for a pooler using the process-wide
/// operator configuration.
pub fn deployment(pooler: &Pooler, cluster: &Cluster) -> Result<Deployment> {
    build_deployment_with_config(pooler, cluster, OperatorConfig::current())
}

pub fn build_deployment_with_config(
    pooler: &Pooler,
    cluster: &Cluster,
    config: &OperatorConfig,
) -> Result<Deployment> {
    PgBouncerDeploymentBuilder::new(pooler, cluster, config).build()
}

/// Hex SHA-256 of the JSON form of a rendered Deployment spec.
///
/// Every input that reaches the Deployment (pooler spec, cluster secret
/// names, operator images) ends up in the spec, so any of them changing
/// changes the hash. `serde_json` writes struct fields in declaration order
/// and maps in key order, so equal specs always hash to the same value.
pub fn rendered_spec_hash(spec: &DeploymentSpec) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_string(spec)?);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Spec hash recorded on a Deployment built by this module, if any
pub fn spec_hash_of(deployment: &Deployment) -> Option<&str> {
    deployment
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(POOLER_SPEC_HASH_ANNOTATION))
        .map(String::as_str)
}

pub struct PgBouncerDeploymentBuilder<'a> {
    pooler: &'a Pooler,
    cluster: &'a Cluster,
    config: &'a OperatorConfig,
    validator: Box<dyn DeploymentValidator + 'a>,
}

impl<'a> PgBouncerDeploymentBuilder<'a> {
    pub fn new(pooler: &'a Pooler, cluster: &'a Cluster, config: &'a OperatorConfig) -> Self {
        Self {
            pooler,
            cluster,
            config,
            validator: Box::new(DefaultDeploymentValidator),
        }
    }

    pub fn with_validator(mut self, validator: impl DeploymentValidator + 'a) -> Self {
        self.validator = Box::new(validator);
        self
    }

    pub fn build(&self) -> Result<Deployment> {
        self.validator.validate(self.pooler, self.cluster)?;

        let template = self.build_pod_template();
        let spec = DeploymentSpec {
            replicas: Some(self.pooler.spec.instances),
            selector: LabelSelector {
                match_labels: Some(self.selector_labels()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: template.metadata.map(|m| ObjectMeta {
                    labels: m.labels,
                    annotations: m.annotations,
                    ..Default::default()
                }),
                spec: template.spec,
            },
            ..Default::default()
        };
        let spec_hash = rendered_spec_hash(&spec)?;

        debug!(
            "Built pgbouncer deployment {}/{} with {} replicas",
            self.pooler.namespace(),
            self.pooler.name(),
            self.pooler.spec.instances
        );

        Ok(Deployment {
            metadata: ObjectMeta {
                name: Some(self.pooler.name().to_string()),
                namespace: Some(self.pooler.namespace().to_string()),
                annotations: Some(BTreeMap::from([(
                    POOLER_SPEC_HASH_ANNOTATION.to_string(),
                    spec_hash,
                )])),
                owner_references: self.owner_reference().map(|owner| vec![owner]),
                ..Default::default()
            },
            spec: Some(spec),
            ..Default::default()
        })
    }

    /// Merge the pooler's own template with the entries every pgbouncer pod needs
    pub fn build_pod_template(&self) -> PodTemplateSpec {
        let pooler_name = self.pooler.name();
        let scratch_mount = VolumeMount {
            name: VOLUME_NAME_SCRATCH_DATA.to_string(),
            mount_path: SCRATCH_DATA_DIRECTORY.to_string(),
            ..Default::default()
        };

        PodTemplateBuilder::from_template(self.pooler.spec.template.clone())
            .with_label(POOLER_NAME_LABEL, pooler_name)
            .with_volume(
                secret_volume(VOLUME_NAME_CA, self.cluster.server_ca_secret_name()),
                false,
            )
            .with_volume(
                secret_volume(VOLUME_NAME_SERVER_TLS, self.cluster.server_tls_secret_name()),
                false,
            )
            .with_container_image(
                CONTAINER_NAME_PGBOUNCER,
                self.config.pgbouncer_image.clone(),
                false,
            )
            .with_container_command(CONTAINER_NAME_PGBOUNCER, pgbouncer_run_command(), false)
            .with_container_port(
                CONTAINER_NAME_PGBOUNCER,
                named_port(PORT_NAME_PGBOUNCER, PGBOUNCER_PORT),
            )
            .with_container_port(
                CONTAINER_NAME_PGBOUNCER,
                named_port(PORT_NAME_METRICS, PGBOUNCER_METRICS_PORT),
            )
            .with_init_container_image(
                BOOTSTRAP_CONTROLLER_CONTAINER_NAME,
                self.config.operator_image_name.clone(),
                true,
            )
            .with_init_container_command(
                BOOTSTRAP_CONTROLLER_CONTAINER_NAME,
                bootstrap_command(),
                true,
            )
            .with_volume(
                Volume {
                    name: VOLUME_NAME_SCRATCH_DATA.to_string(),
                    empty_dir: Some(EmptyDirVolumeSource::default()),
                    ..Default::default()
                },
                false,
            )
            .with_init_container_volume_mount(
                BOOTSTRAP_CONTROLLER_CONTAINER_NAME,
                scratch_mount.clone(),
            )
            .with_container_volume_mount(CONTAINER_NAME_PGBOUNCER, scratch_mount)
            .with_container_env(
                CONTAINER_NAME_PGBOUNCER,
                plain_env(ENV_NAMESPACE, self.pooler.namespace()),
                true,
            )
            .with_container_env(
                CONTAINER_NAME_PGBOUNCER,
                plain_env(ENV_POOLER_NAME, pooler_name),
                true,
            )
            .with_service_account_name(pooler_name, true)
            .build()
    }

    pub fn selector_labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(
            POOLER_NAME_LABEL.to_string(),
            self.pooler.name().to_string(),
        )])
    }

    /// Controller reference back to the pooler, once it exists in the cluster
    pub fn owner_reference(&self) -> Option<OwnerReference> {
        self.pooler.uid().map(|uid| OwnerReference {
            api_version: POOLER_API_VERSION.to_string(),
            kind: POOLER_KIND.to_string(),
            name: self.pooler.name().to_string(),
            uid: uid.to_string(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        })
    }
}

fn secret_volume(name: &str, secret_name: String) -> Volume {
    Volume {
        name: name.to_string(),
        secret: Some(SecretVolumeSource {
            secret_name: Some(secret_name),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn named_port(name: &str, port: i32) -> ContainerPort {
    ContainerPort {
        name: Some(name.to_string()),
        container_port: port,
        ..Default::default()
    }
}

fn plain_env(name: &str, value: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.to_string()),
        ..Default::default()
    }
}
