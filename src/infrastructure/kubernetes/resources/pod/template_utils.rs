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

use crate::shared::error::KubeError;
use k8s_openapi::api::core::v1::{Pod, PodTemplateSpec};
use std::path::PathBuf;

/// Load a pod template override from a YAML file.
///
/// The file may hold a bare `PodTemplateSpec` (`metadata` + `spec`) or a
/// full `kind: Pod` manifest, in which case only its metadata labels,
/// annotations and spec are kept.
pub fn load_pod_template_from_file(file_path: &str) -> Result<PodTemplateSpec, KubeError> {
    let path = resolve_pod_template_path(file_path)?;

    if !path.exists() {
        return Err(KubeError::ConfigError(format!(
            "Pod template file does not exist: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(&path).map_err(|e| {
        KubeError::ConfigError(format!(
            "Failed to read pod template file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_pod_template(&content).map_err(|e| {
        KubeError::ConfigError(format!(
            "Failed to parse pod template file {}: {}",
            path.display(),
            e
        ))
    })
}

pub fn parse_pod_template(content: &str) -> Result<PodTemplateSpec, KubeError> {
    let value: serde_yaml::Value = serde_yaml::from_str(content)?;
    let kind = value
        .get("kind")
        .and_then(|k| k.as_str())
        .map(str::to_string);

    let template = match kind.as_deref() {
        Some("Pod") => {
            let pod: Pod = serde_yaml::from_value(value)?;
            PodTemplateSpec {
                metadata: Some(
                    k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
                        labels: pod.metadata.labels,
                        annotations: pod.metadata.annotations,
                        ..Default::default()
                    },
                ),
                spec: pod.spec,
            }
        }
        Some("PodTemplate") | None => {
            let template_value = value.get("template").cloned().unwrap_or(value);
            serde_yaml::from_value(template_value)?
        }
        Some(other) => {
            return Err(KubeError::InvalidResource(format!(
                "expected a Pod or a pod template, found kind '{}'",
                other
            )));
        }
    };

    if template.spec.is_none() {
        return Err(KubeError::InvalidResource(
            "pod template is missing spec section".to_string(),
        ));
    }

    Ok(template)
}

pub fn resolve_pod_template_path(path: &str) -> Result<PathBuf, KubeError> {
    let path = PathBuf::from(path);

    if path.is_absolute() {
        Ok(path)
    } else {
        std::env::current_dir()
            .map_err(|e| KubeError::ConfigError(format!("Cannot get current directory: {}", e)))?
            .join(path)
            .canonicalize()
            .map_err(|e| KubeError::ConfigError(format!("Cannot resolve template path: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_template_spec() {
        let yaml = r#"
metadata:
  labels:
    team: db
spec:
  containers:
    - name: pgbouncer
      image: custom/pgbouncer:1
"#;
        let template = parse_pod_template(yaml).unwrap();
        let labels = template.metadata.unwrap().labels.unwrap();
        assert_eq!(labels["team"], "db");
        let spec = template.spec.unwrap();
        assert_eq!(spec.containers[0].image.as_deref(), Some("custom/pgbouncer:1"));
    }

    #[test]
    fn test_parse_pod_manifest_drops_identity() {
        let yaml = r#"
apiVersion: v1
kind: Pod
metadata:
  name: ignored
  namespace: ignored
  annotations:
    a: b
spec:
  containers:
    - name: pgbouncer
"#;
        let template = parse_pod_template(yaml).unwrap();
        let metadata = template.metadata.unwrap();
        assert!(metadata.name.is_none());
        assert!(metadata.namespace.is_none());
        assert_eq!(metadata.annotations.unwrap()["a"], "b");
    }

    #[test]
    fn test_parse_pod_template_object() {
        let yaml = r#"
apiVersion: v1
kind: PodTemplate
template:
  spec:
    containers:
      - name: pgbouncer
"#;
        let template = parse_pod_template(yaml).unwrap();
        assert_eq!(template.spec.unwrap().containers.len(), 1);
    }

    #[test]
    fn test_parse_rejects_other_kinds() {
        let err = parse_pod_template("kind: Service\nspec: {}\n").unwrap_err();
        assert!(matches!(err, KubeError::InvalidResource(_)));
    }

    #[test]
    fn test_parse_requires_spec() {
        let err = parse_pod_template("metadata:\n  labels:\n    a: b\n").unwrap_err();
        assert!(err.to_string().contains("missing spec"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "spec:\n  containers:\n    - name: pgbouncer").unwrap();

        let template = load_pod_template_from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(template.spec.unwrap().containers[0].name, "pgbouncer");
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_pod_template_from_file("/nonexistent/pod-template.yaml").unwrap_err();
        assert!(matches!(err, KubeError::ConfigError(_)));
    }
}
