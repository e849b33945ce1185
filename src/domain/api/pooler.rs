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

use crate::infrastructure::constants::{DEFAULT_NAMESPACE, POOLER_API_VERSION, POOLER_KIND};
use k8s_openapi::api::core::v1::PodTemplateSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A pgbouncer pooler in front of a PostgreSQL cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pooler {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub spec: PoolerSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolerSpec {
    /// Cluster the pooler connects to
    pub cluster: ClusterReference,

    #[serde(rename = "type", default)]
    pub pooler_type: PoolerType,

    /// Desired number of pgbouncer pods
    #[serde(default = "default_instances")]
    pub instances: i32,

    /// Pod template override merged with the operator settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PodTemplateSpec>,

    #[serde(default)]
    pub pgbouncer: PgBouncerSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterReference {
    pub name: String,
}

/// Which cluster service the pooler forwards to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolerType {
    #[default]
    Rw,
    Ro,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PgBouncerPoolMode {
    #[default]
    Session,
    Transaction,
}

/// PgBouncer runtime settings.
///
/// These are read by the instance manager inside the running pod. None of
/// them is rendered into the Deployment, so changing them does not change
/// the Deployment's spec hash.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PgBouncerSpec {
    #[serde(default)]
    pub pool_mode: PgBouncerPoolMode,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub paused: bool,
}

fn default_api_version() -> String {
    POOLER_API_VERSION.to_string()
}

fn default_kind() -> String {
    POOLER_KIND.to_string()
}

fn default_instances() -> i32 {
    1
}

impl Default for PoolerSpec {
    fn default() -> Self {
        Self {
            cluster: ClusterReference::default(),
            pooler_type: PoolerType::default(),
            instances: default_instances(),
            template: None,
            pgbouncer: PgBouncerSpec::default(),
        }
    }
}

impl Pooler {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, spec: PoolerSpec) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: ObjectMeta {
                name: Some(name.into()),
                namespace: Some(namespace.into()),
                ..Default::default()
            },
            spec,
        }
    }

    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.metadata
            .namespace
            .as_deref()
            .unwrap_or(DEFAULT_NAMESPACE)
    }

    pub fn uid(&self) -> Option<&str> {
        self.metadata.uid.as_deref()
    }
}
