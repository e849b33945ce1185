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

use crate::infrastructure::constants::{
    CLUSTER_KIND, POOLER_API_VERSION, SERVER_CA_SECRET_SUFFIX, SERVER_TLS_SECRET_SUFFIX,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

/// The PostgreSQL cluster a pooler belongs to.
///
/// Only the fields the pooler needs are modelled; anything else in the
/// manifest is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ClusterSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificates: Option<CertificatesConfiguration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificatesConfiguration {
    #[serde(rename = "serverCASecret", default, skip_serializing_if = "Option::is_none")]
    pub server_ca_secret: Option<String>,

    #[serde(rename = "serverTLSSecret", default, skip_serializing_if = "Option::is_none")]
    pub server_tls_secret: Option<String>,
}

fn default_api_version() -> String {
    POOLER_API_VERSION.to_string()
}

fn default_kind() -> String {
    CLUSTER_KIND.to_string()
}

impl Cluster {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: ObjectMeta {
                name: Some(name.into()),
                namespace: Some(namespace.into()),
                ..Default::default()
            },
            spec: ClusterSpec::default(),
        }
    }

    pub fn with_certificates(
        mut self,
        server_ca_secret: impl Into<String>,
        server_tls_secret: impl Into<String>,
    ) -> Self {
        self.spec.certificates = Some(CertificatesConfiguration {
            server_ca_secret: Some(server_ca_secret.into()),
            server_tls_secret: Some(server_tls_secret.into()),
        });
        self
    }

    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    /// Secret holding the CA that signed the server certificate
    pub fn server_ca_secret_name(&self) -> String {
        self.configured_secret(|c| c.server_ca_secret.as_deref())
            .unwrap_or_else(|| format!("{}{}", self.name(), SERVER_CA_SECRET_SUFFIX))
    }

    /// Secret holding the server certificate and key
    pub fn server_tls_secret_name(&self) -> String {
        self.configured_secret(|c| c.server_tls_secret.as_deref())
            .unwrap_or_else(|| format!("{}{}", self.name(), SERVER_TLS_SECRET_SUFFIX))
    }

    fn configured_secret<F>(&self, select: F) -> Option<String>
    where
        F: Fn(&CertificatesConfiguration) -> Option<&str>,
    {
        self.spec
            .certificates
            .as_ref()
            .and_then(select)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    }
}
