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

use pgbouncer_kube::cli::pooler::{format_deployment, ManifestArgs, OutputFormat};
use pgbouncer_kube::infrastructure::constants::POOLER_NAME_LABEL;
use pgbouncer_kube::*;
use std::io::Write;
use tempfile::NamedTempFile;

const POOLER_YAML: &str = r#"
apiVersion: postgresql.k8s.enterprisedb.io/v1
kind: Pooler
metadata:
  name: pooler-example-rw
spec:
  cluster:
    name: cluster-example
  instances: 3
  type: rw
  pgbouncer:
    poolMode: session
  template:
    metadata:
      labels:
        app: pooler
    spec:
      containers:
        - name: pgbouncer
          image: my-pgbouncer:latest
          resources:
            requests:
              cpu: "0.1"
"#;

const CLUSTER_YAML: &str = r#"
apiVersion: postgresql.k8s.enterprisedb.io/v1
kind: Cluster
metadata:
  name: cluster-example
  namespace: db
spec:
  instances: 3
"#;

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn manifest_args(pooler: &NamedTempFile, cluster: &NamedTempFile) -> ManifestArgs {
    ManifestArgs {
        pooler: pooler.path().to_str().unwrap().to_string(),
        cluster: cluster.path().to_str().unwrap().to_string(),
        pod_template: None,
        config: None,
        properties: Vec::new(),
    }
}

#[test]
fn test_manifests_to_deployment() {
    let pooler = write_temp(POOLER_YAML);
    let cluster = write_temp(CLUSTER_YAML);

    let manifests = manifest_args(&pooler, &cluster).load_manifests().unwrap();
    assert_eq!(manifests.pooler.namespace(), "db");

    let deployment = build_deployment_with_config(
        &manifests.pooler,
        &manifests.cluster,
        &OperatorConfig::default(),
    )
    .unwrap();

    let spec = deployment.spec.unwrap();
    assert_eq!(spec.replicas, Some(3));

    let labels = spec.template.metadata.unwrap().labels.unwrap();
    assert_eq!(labels["app"], "pooler");
    assert_eq!(labels[POOLER_NAME_LABEL], "pooler-example-rw");

    let pod = spec.template.spec.unwrap();
    let pgbouncer = &pod.containers[0];
    assert_eq!(pgbouncer.image.as_deref(), Some("my-pgbouncer:latest"));
    assert!(pgbouncer.resources.is_some());

    let ca = pod.volumes.unwrap()[0].secret.clone().unwrap();
    assert_eq!(ca.secret_name.as_deref(), Some("cluster-example-ca"));
}

#[test]
fn test_pod_template_file_overrides_pooler_template() {
    let pooler = write_temp(POOLER_YAML);
    let cluster = write_temp(CLUSTER_YAML);
    let template = write_temp(
        "apiVersion: v1\nkind: Pod\nmetadata:\n  name: ignored\nspec:\n  containers:\n    - name: pgbouncer\n      image: from-file:2\n",
    );

    let mut args = manifest_args(&pooler, &cluster);
    args.pod_template = Some(template.path().to_str().unwrap().to_string());

    let manifests = args.load_manifests().unwrap();
    let deployment = build_deployment_with_config(
        &manifests.pooler,
        &manifests.cluster,
        &OperatorConfig::default(),
    )
    .unwrap();
    let pod = deployment.spec.unwrap().template.spec.unwrap();
    assert_eq!(pod.containers[0].image.as_deref(), Some("from-file:2"));
}

#[test]
fn test_cluster_mismatch_is_rejected() {
    let pooler = write_temp(&POOLER_YAML.replace("name: cluster-example", "name: other"));
    let cluster = write_temp(CLUSTER_YAML);

    let err = manifest_args(&pooler, &cluster).load_manifests().unwrap_err();
    assert!(err.to_string().contains("references cluster 'other'"));
}

#[test]
fn test_rendered_yaml_round_trips() {
    let pooler = write_temp(POOLER_YAML);
    let cluster = write_temp(CLUSTER_YAML);
    let manifests = manifest_args(&pooler, &cluster).load_manifests().unwrap();
    let deployment = build_deployment_with_config(
        &manifests.pooler,
        &manifests.cluster,
        &OperatorConfig::default(),
    )
    .unwrap();

    let yaml = format_deployment(&deployment, OutputFormat::Yaml).unwrap();
    assert!(yaml.contains("k8s.enterprisedb.io/poolerSpecHash"));
    let parsed: k8s_openapi::api::apps::v1::Deployment = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed, deployment);
}
