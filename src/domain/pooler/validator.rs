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
use crate::infrastructure::constants::{CLUSTER_KIND, POOLER_KIND};
use crate::shared::error::{KubeError, Result};
use regex::Regex;
use std::sync::LazyLock;

const MAX_NAME_LENGTH: usize = 63;

/// Hook run by the deployment assembler before anything is built.
///
/// An error returned here is handed back to the caller unchanged.
pub trait DeploymentValidator: Send + Sync {
    fn validate(&self, pooler: &Pooler, cluster: &Cluster) -> Result<()>;
}

/// Accepts every pooler
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDeploymentValidator;

impl DeploymentValidator for DefaultDeploymentValidator {
    fn validate(&self, _pooler: &Pooler, _cluster: &Cluster) -> Result<()> {
        Ok(())
    }
}

/// Checks applied to manifests read from disk before they reach the assembler
pub struct ManifestValidator;

impl ManifestValidator {
    pub fn validate(pooler: &Pooler, cluster: &Cluster) -> Result<()> {
        Self::validate_pooler(pooler)?;
        Self::validate_cluster(cluster)?;

        if pooler.spec.cluster.name != cluster.name() {
            return Err(KubeError::validation_error(format!(
                "pooler '{}' references cluster '{}' but the cluster manifest is '{}'",
                pooler.name(),
                pooler.spec.cluster.name,
                cluster.name()
            )));
        }

        Ok(())
    }

    pub fn validate_pooler(pooler: &Pooler) -> Result<()> {
        if pooler.kind != POOLER_KIND {
            return Err(KubeError::invalid_resource(format!(
                "expected kind '{}', found '{}'",
                POOLER_KIND, pooler.kind
            )));
        }

        validate_name("pooler", pooler.name())?;

        if pooler.spec.cluster.name.is_empty() {
            return Err(KubeError::validation_error(format!(
                "pooler '{}' has no spec.cluster.name",
                pooler.name()
            )));
        }

        if pooler.spec.instances < 0 {
            return Err(KubeError::validation_error(format!(
                "pooler '{}' has negative instances: {}",
                pooler.name(),
                pooler.spec.instances
            )));
        }

        Ok(())
    }

    pub fn validate_cluster(cluster: &Cluster) -> Result<()> {
        if cluster.kind != CLUSTER_KIND {
            return Err(KubeError::invalid_resource(format!(
                "expected kind '{}', found '{}'",
                CLUSTER_KIND, cluster.kind
            )));
        }

        validate_name("cluster", cluster.name())
    }
}

fn validate_name(resource: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(KubeError::validation_error(format!(
            "{} metadata.name is required",
            resource
        )));
    }

    if name.len() > MAX_NAME_LENGTH || !is_dns_label(name) {
        return Err(KubeError::validation_error(format!(
            "{} name '{}' must be a DNS-1123 label: lowercase alphanumerics or '-', \
             starting and ending with an alphanumeric, at most {} characters",
            resource, name, MAX_NAME_LENGTH
        )));
    }

    Ok(())
}

fn is_dns_label(name: &str) -> bool {
    static DNS_LABEL_RE: LazyLock<Option<Regex>> =
        LazyLock::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").ok());
    DNS_LABEL_RE.as_ref().is_some_and(|re| re.is_match(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::api::{ClusterReference, PoolerSpec};

    fn pooler(name: &str, cluster: &str, instances: i32) -> Pooler {
        Pooler::new(
            name,
            "db",
            PoolerSpec {
                cluster: ClusterReference {
                    name: cluster.to_string(),
                },
                instances,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_default_validator_accepts() {
        let result =
            DefaultDeploymentValidator.validate(&pooler("p", "c", 1), &Cluster::new("c", "db"));
        assert!(result.is_ok());
    }

    #[test]
    fn test_valid_manifests() {
        let result = ManifestValidator::validate(
            &pooler("pooler-rw", "cluster-example", 2),
            &Cluster::new("cluster-example", "db"),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_rejects_bad_names() {
        for name in ["", "Pooler", "-pooler", "pooler-", "pg_bouncer"] {
            let err = ManifestValidator::validate_pooler(&pooler(name, "c", 1)).unwrap_err();
            assert!(matches!(err, KubeError::ValidationError(_)), "{}", name);
        }

        let long = "a".repeat(64);
        assert!(ManifestValidator::validate_pooler(&pooler(&long, "c", 1)).is_err());
    }

    #[test]
    fn test_rejects_negative_instances() {
        let err = ManifestValidator::validate_pooler(&pooler("p", "c", -1)).unwrap_err();
        assert!(err.to_string().contains("negative instances"));
    }

    #[test]
    fn test_accepts_zero_instances() {
        assert!(ManifestValidator::validate_pooler(&pooler("p", "c", 0)).is_ok());
    }

    #[test]
    fn test_rejects_wrong_kind() {
        let mut p = pooler("p", "c", 1);
        p.kind = "Deployment".to_string();
        let err = ManifestValidator::validate_pooler(&p).unwrap_err();
        assert!(matches!(err, KubeError::InvalidResource(_)));
    }

    #[test]
    fn test_rejects_cluster_mismatch() {
        let err = ManifestValidator::validate(&pooler("p", "c1", 1), &Cluster::new("c2", "db"))
            .unwrap_err();
        assert!(err.to_string().contains("references cluster 'c1'"));
    }
}
