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

// Core modules
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod shared;

// Re-export commonly used types
pub use domain::api::{
    CertificatesConfiguration, Cluster, ClusterReference, ClusterSpec, PgBouncerPoolMode,
    PgBouncerSpec, Pooler, PoolerSpec, PoolerType,
};
pub use domain::config::{apply_to_operator_config, OperatorConfig};
pub use domain::pooler::{
    DefaultDeploymentValidator, DeploymentValidator, ManifestValidator, PoolerManifests,
};
pub use infrastructure::kubernetes::resources::{
    build_deployment_with_config, deployment, rendered_spec_hash, spec_hash_of,
    PgBouncerDeploymentBuilder, PodTemplateBuilder,
};
pub use infrastructure::kubernetes::{
    apply_if_changed, ApplyOutcome, PoolerKubeClient, PoolerKubeClientImpl,
};
pub use shared::{KubeError, Result};
