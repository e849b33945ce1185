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

/// Metadata namespace shared by every operator-owned label and annotation
pub const METADATA_NAMESPACE: &str = "k8s.enterprisedb.io";

/// Label identifying the pods of a pooler, value is the pooler name
pub const POOLER_NAME_LABEL: &str = "k8s.enterprisedb.io/poolerName";

/// Annotation carrying the hash of the pooler specification
pub const POOLER_SPEC_HASH_ANNOTATION: &str = "k8s.enterprisedb.io/poolerSpecHash";

/// Pooler resource identity
pub const POOLER_API_VERSION: &str = "postgresql.k8s.enterprisedb.io/v1";
pub const POOLER_KIND: &str = "Pooler";
pub const CLUSTER_KIND: &str = "Cluster";

/// Images
pub const DEFAULT_PGBOUNCER_IMAGE: &str = "quay.io/enterprisedb/pgbouncer:1.16.0";
pub const DEFAULT_OPERATOR_IMAGE: &str = "quay.io/enterprisedb/cloud-native-postgresql:latest";

/// Server-side apply field manager
pub const DEFAULT_FIELD_MANAGER: &str = "pgbouncer-kube";

/// Container names
pub const CONTAINER_NAME_PGBOUNCER: &str = "pgbouncer";
pub const BOOTSTRAP_CONTROLLER_CONTAINER_NAME: &str = "bootstrap-controller";

/// Ports
pub const PGBOUNCER_PORT: i32 = 6432;
pub const PGBOUNCER_METRICS_PORT: i32 = 9127;
pub const PORT_NAME_PGBOUNCER: &str = "pgbouncer";
pub const PORT_NAME_METRICS: &str = "metrics";

/// Volume names
pub const VOLUME_NAME_CA: &str = "ca";
pub const VOLUME_NAME_SERVER_TLS: &str = "server-tls";
pub const VOLUME_NAME_SCRATCH_DATA: &str = "scratch-data";

/// Directory shared between the bootstrap init container and pgbouncer
pub const SCRATCH_DATA_DIRECTORY: &str = "/controller";

/// Controller binary copied into the scratch directory at bootstrap
pub const CONTROLLER_BINARY: &str = "/controller/manager";
pub const OPERATOR_MANAGER_BINARY: &str = "/manager";

/// Environment variables injected into the pgbouncer container
pub const ENV_NAMESPACE: &str = "NAMESPACE";
pub const ENV_POOLER_NAME: &str = "POOLER_NAME";

/// Secret name suffixes used when the cluster does not name its own secrets
pub const SERVER_CA_SECRET_SUFFIX: &str = "-ca";
pub const SERVER_TLS_SECRET_SUFFIX: &str = "-server";

pub const DEFAULT_NAMESPACE: &str = "default";

/// Command run by the bootstrap init container
pub fn bootstrap_command() -> Vec<String> {
    vec![
        OPERATOR_MANAGER_BINARY.to_string(),
        "bootstrap".to_string(),
        CONTROLLER_BINARY.to_string(),
    ]
}

/// Command run by the pgbouncer container
pub fn pgbouncer_run_command() -> Vec<String> {
    vec![
        CONTROLLER_BINARY.to_string(),
        "pgbouncer".to_string(),
        "run".to_string(),
    ]
}
