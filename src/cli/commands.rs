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

// CLI command definitions

use super::pooler::{ApplyCommand, DescribeCommand, RenderCommand, StatusCommand};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "pgbouncer-kube",
    version,
    about = "Render and apply pgbouncer pooler Deployments",
    long_about = "Builds the Kubernetes Deployment running pgbouncer in front of a PostgreSQL \
                  cluster from Pooler and Cluster manifests, and applies it to a cluster"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Print the pooler Deployment as YAML or JSON
    Render(RenderCommand),

    /// Summarize the containers and volumes of the pooler Deployment
    Describe(DescribeCommand),

    /// Server-side apply the pooler Deployment (skipped when unchanged)
    Apply(ApplyCommand),

    /// Show the rollout state of a pooler Deployment
    Status(StatusCommand),
}
