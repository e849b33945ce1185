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

//! Reading Pooler and Cluster manifests from disk

use crate::domain::api::{Cluster, Pooler};
use crate::domain::pooler::validator::ManifestValidator;
use crate::infrastructure::constants::DEFAULT_NAMESPACE;
use crate::shared::error::{KubeError, Result};
use std::fs::read_to_string;
use tracing::debug;

/// A pooler together with the cluster it belongs to, both validated
#[derive(Debug, Clone)]
pub struct PoolerManifests {
    pub pooler: Pooler,
    pub cluster: Cluster,
}

impl PoolerManifests {
    pub fn from_files(pooler_path: &str, cluster_path: &str) -> Result<Self> {
        let pooler = parse_pooler(&read_manifest(pooler_path)?)?;
        let cluster = parse_cluster(&read_manifest(cluster_path)?)?;
        Self::new(pooler, cluster)
    }

    /// Fill in namespaces and validate the pair.
    ///
    /// A pooler without a namespace lives next to its cluster; a cluster
    /// without one lives in `default`.
    pub fn new(mut pooler: Pooler, mut cluster: Cluster) -> Result<Self> {
        let cluster_namespace = cluster
            .metadata
            .namespace
            .get_or_insert_with(|| DEFAULT_NAMESPACE.to_string())
            .clone();

        if pooler.metadata.namespace.is_none() {
            debug!(
                "Pooler '{}' inherits namespace '{}' from its cluster",
                pooler.name(),
                cluster_namespace
            );
            pooler.metadata.namespace = Some(cluster_namespace);
        }

        ManifestValidator::validate(&pooler, &cluster)?;

        Ok(Self { pooler, cluster })
    }
}

pub fn parse_pooler(content: &str) -> Result<Pooler> {
    Ok(serde_yaml::from_str(content)?)
}

pub fn parse_cluster(content: &str) -> Result<Cluster> {
    Ok(serde_yaml::from_str(content)?)
}

fn read_manifest(path: &str) -> Result<String> {
    read_to_string(path)
        .map_err(|e| KubeError::ConfigError(format!("Failed to read manifest {}: {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const POOLER: &str = r#"
apiVersion: postgresql.k8s.enterprisedb.io/v1
kind: Pooler
metadata:
  name: pooler-rw
spec:
  cluster:
    name: cluster-example
  instances: 2
"#;

    const CLUSTER: &str = r#"
apiVersion: postgresql.k8s.enterprisedb.io/v1
kind: Cluster
metadata:
  name: cluster-example
  namespace: db
"#;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_pooler_inherits_cluster_namespace() {
        let manifests =
            PoolerManifests::new(parse_pooler(POOLER).unwrap(), parse_cluster(CLUSTER).unwrap())
                .unwrap();
        assert_eq!(manifests.pooler.namespace(), "db");
    }

    #[test]
    fn test_namespace_falls_back_to_default() {
        let cluster = parse_cluster("kind: Cluster\nmetadata:\n  name: cluster-example\n").unwrap();
        let manifests = PoolerManifests::new(parse_pooler(POOLER).unwrap(), cluster).unwrap();
        assert_eq!(manifests.pooler.namespace(), DEFAULT_NAMESPACE);
        assert_eq!(
            manifests.cluster.metadata.namespace.as_deref(),
            Some(DEFAULT_NAMESPACE)
        );
    }

    #[test]
    fn test_explicit_pooler_namespace_kept() {
        let mut pooler = parse_pooler(POOLER).unwrap();
        pooler.metadata.namespace = Some("pgbouncer".to_string());
        let manifests = PoolerManifests::new(pooler, parse_cluster(CLUSTER).unwrap()).unwrap();
        assert_eq!(manifests.pooler.namespace(), "pgbouncer");
    }

    #[test]
    fn test_from_files() {
        let pooler = write_temp(POOLER);
        let cluster = write_temp(CLUSTER);
        let manifests = PoolerManifests::from_files(
            pooler.path().to_str().unwrap(),
            cluster.path().to_str().unwrap(),
        )
        .unwrap();
        assert_eq!(manifests.pooler.spec.instances, 2);
        assert_eq!(manifests.cluster.name(), "cluster-example");
    }

    #[test]
    fn test_missing_file() {
        let err = PoolerManifests::from_files("/nonexistent/pooler.yaml", "/nonexistent/c.yaml")
            .unwrap_err();
        assert!(matches!(err, KubeError::ConfigError(_)));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = parse_pooler("spec: [").unwrap_err();
        assert!(matches!(err, KubeError::YamlParse(_)));
    }

    #[test]
    fn test_pooler_without_spec_is_rejected() {
        assert!(parse_pooler("kind: Pooler\nmetadata:\n  name: p\n").is_err());
    }
}
