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

//! Table rendering for CLI output

use super::{ColorTheme, RolloutState, StatusIcon};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Color, ContentArrangement, Table};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Container, Volume};

/// A pooler Deployment as observed in the cluster
#[derive(Debug, Clone)]
pub struct PoolerStatus {
    pub name: String,
    pub namespace: String,
    pub ready_replicas: i32,
    pub desired_replicas: i32,
    pub spec_hash: Option<String>,
    pub pods: Vec<PodInfo>,
}

#[derive(Debug, Clone)]
pub struct PodInfo {
    pub name: String,
    pub phase: String,
    pub ready: bool,
}

/// Table renderer for formatted output
pub struct TableRenderer {
    theme: ColorTheme,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRenderer {
    pub fn new() -> Self {
        Self {
            theme: ColorTheme::default(),
        }
    }

    /// Summarize the containers and volumes of a rendered Deployment
    pub fn render_pod_template_summary(&self, deployment: &Deployment) -> String {
        let name = deployment.metadata.name.as_deref().unwrap_or_default();
        let namespace = deployment.metadata.namespace.as_deref().unwrap_or_default();
        let spec = deployment.spec.as_ref();
        let replicas = spec.and_then(|s| s.replicas).unwrap_or_default();
        let pod = spec.and_then(|s| s.template.spec.as_ref());

        let mut containers = Table::new();
        containers
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("KIND").set_alignment(CellAlignment::Left),
                Cell::new("NAME").set_alignment(CellAlignment::Left),
                Cell::new("IMAGE").set_alignment(CellAlignment::Left),
                Cell::new("COMMAND").set_alignment(CellAlignment::Left),
                Cell::new("PORTS").set_alignment(CellAlignment::Left),
                Cell::new("ENV").set_alignment(CellAlignment::Left),
                Cell::new("MOUNTS").set_alignment(CellAlignment::Left),
            ]);

        if let Some(pod) = pod {
            for container in pod.init_containers.iter().flatten() {
                containers.add_row(self.container_row("init", container));
            }
            for container in &pod.containers {
                containers.add_row(self.container_row("main", container));
            }
        }

        let mut volumes = Table::new();
        volumes
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![Cell::new("VOLUME"), Cell::new("SOURCE")]);
        for volume in pod.and_then(|p| p.volumes.as_ref()).into_iter().flatten() {
            volumes.add_row(vec![Cell::new(&volume.name), Cell::new(volume_source(volume))]);
        }

        let service_account = pod
            .and_then(|p| p.service_account_name.as_deref())
            .unwrap_or("-");

        let mut output = String::new();
        output.push_str(&format!(
            "╭─ Pooler {}/{} {} ─╮\n",
            namespace,
            name,
            format!("[{} replicas, service account {}]", replicas, service_account).bright_black()
        ));
        output.push_str(&containers.to_string());
        output.push('\n');
        output.push_str(&volumes.to_string());
        output.push('\n');
        output
    }

    /// Render the live rollout state of a pooler
    pub fn render_pooler_status(&self, status: &PoolerStatus) -> String {
        let state = RolloutState::of(status.ready_replicas, status.desired_replicas);
        let replica_color = self
            .theme
            .get_replica_color(status.ready_replicas, status.desired_replicas);

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.add_row(vec![
            Cell::new("Pooler").fg(self.theme.info),
            Cell::new(format!("{}/{}", status.namespace, status.name)),
        ]);
        table.add_row(vec![
            Cell::new("Replicas").fg(self.theme.info),
            Cell::new(format!(
                "{} {}/{} {}",
                StatusIcon::get_replica_icon(status.ready_replicas, status.desired_replicas),
                status.ready_replicas,
                status.desired_replicas,
                state.text()
            ))
            .fg(replica_color),
        ]);
        table.add_row(vec![
            Cell::new("Spec hash").fg(self.theme.info),
            Cell::new(status.spec_hash.as_deref().unwrap_or("-")).fg(self.theme.muted),
        ]);

        let mut output = table.to_string();
        output.push('\n');

        if status.pods.is_empty() {
            output.push_str(&format!("{}\n", "No pgbouncer pods found".bright_black()));
            return output;
        }

        let mut pods = Table::new();
        pods.load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("POD").set_alignment(CellAlignment::Left),
                Cell::new("PHASE").set_alignment(CellAlignment::Center),
                Cell::new("READY").set_alignment(CellAlignment::Center),
            ]);

        for pod in &status.pods {
            let (icon, color) = if pod.ready {
                (StatusIcon::SUCCESS, Color::Green)
            } else {
                (StatusIcon::ERROR, Color::Red)
            };
            pods.add_row(vec![
                Cell::new(&pod.name),
                Cell::new(&pod.phase).fg(self.theme.get_phase_color(&pod.phase)),
                Cell::new(icon).fg(color),
            ]);
        }

        output.push_str(&pods.to_string());
        output.push('\n');
        output
    }

    fn container_row(&self, kind: &str, container: &Container) -> Vec<Cell> {
        let ports = container
            .ports
            .iter()
            .flatten()
            .map(|p| match &p.name {
                Some(name) => format!("{}:{}", name, p.container_port),
                None => p.container_port.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let env = container
            .env
            .iter()
            .flatten()
            .map(|e| e.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let mounts = container
            .volume_mounts
            .iter()
            .flatten()
            .map(|m| format!("{} -> {}", m.name, m.mount_path))
            .collect::<Vec<_>>()
            .join("\n");

        vec![
            Cell::new(kind).fg(self.theme.muted),
            Cell::new(&container.name),
            Cell::new(container.image.as_deref().unwrap_or("-")),
            Cell::new(
                container
                    .command
                    .as_ref()
                    .map(|c| c.join(" "))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(ports),
            Cell::new(env),
            Cell::new(mounts),
        ]
    }
}

fn volume_source(volume: &Volume) -> String {
    if let Some(secret) = &volume.secret {
        format!("secret/{}", secret.secret_name.as_deref().unwrap_or_default())
    } else if volume.empty_dir.is_some() {
        "emptyDir".to_string()
    } else if volume.config_map.is_some() {
        "configMap".to_string()
    } else {
        "other".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::api::{Cluster, ClusterReference, Pooler, PoolerSpec};
    use crate::domain::config::OperatorConfig;
    use crate::infrastructure::kubernetes::resources::build_deployment_with_config;

    fn rendered() -> Deployment {
        let pooler = Pooler::new(
            "pgb1",
            "ns1",
            PoolerSpec {
                cluster: ClusterReference {
                    name: "c1".to_string(),
                },
                instances: 2,
                ..Default::default()
            },
        );
        build_deployment_with_config(&pooler, &Cluster::new("c1", "ns1"), &OperatorConfig::default())
            .unwrap()
    }

    #[test]
    fn test_render_pod_template_summary() {
        let output = TableRenderer::new().render_pod_template_summary(&rendered());
        assert!(output.contains("ns1/pgb1"));
        assert!(output.contains("bootstrap-controller"));
        assert!(output.contains("pgbouncer:6432"));
        assert!(output.contains("secret/c1-ca"));
        assert!(output.contains("emptyDir"));
    }

    #[test]
    fn test_render_status_without_pods() {
        let status = PoolerStatus {
            name: "pgb1".to_string(),
            namespace: "ns1".to_string(),
            ready_replicas: 1,
            desired_replicas: 3,
            spec_hash: None,
            pods: Vec::new(),
        };
        let output = TableRenderer::new().render_pooler_status(&status);
        assert!(output.contains("1/3"));
        assert!(output.contains("Progressing"));
        assert!(output.contains("No pgbouncer pods found"));
    }

    #[test]
    fn test_render_status_with_pods() {
        let status = PoolerStatus {
            name: "pgb1".to_string(),
            namespace: "ns1".to_string(),
            ready_replicas: 1,
            desired_replicas: 1,
            spec_hash: Some("abc".to_string()),
            pods: vec![PodInfo {
                name: "pgb1-7d9f-x2".to_string(),
                phase: "Running".to_string(),
                ready: true,
            }],
        };
        let output = TableRenderer::new().render_pooler_status(&status);
        assert!(output.contains("pgb1-7d9f-x2"));
        assert!(output.contains("Running"));
        assert!(output.contains("abc"));
    }
}
