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

//! Pod template builder
//!
//! Merges operator-required pod settings into a pod template that may have
//! been written by the user. Every entry is addressed by a key (container
//! name, volume name, port name, env name, mount path), so applying the same
//! entry twice updates it instead of duplicating it.
//!
//! Operations that take a `force` flag only fill a field that is unset,
//! unless `force` is true, in which case the new value always wins.

use super::keyed::Keyed;
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, PodSpec, PodTemplateSpec, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerKind {
    Main,
    Init,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKind::Main => f.write_str("container"),
            ContainerKind::Init => f.write_str("init container"),
        }
    }
}

fn port_key(port: &ContainerPort) -> String {
    match port.name.as_deref() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!(
            "{}/{}",
            port.container_port,
            port.protocol.as_deref().unwrap_or("TCP")
        ),
    }
}

fn is_unset(value: Option<&str>) -> bool {
    value.map_or(true, str::is_empty)
}

fn is_unset_list(value: Option<&Vec<String>>) -> bool {
    value.map_or(true, Vec::is_empty)
}

/// A container while it is being merged, with its keyed lists split out.
#[derive(Debug, Clone)]
struct ContainerSlot {
    container: Container,
    ports: Keyed<ContainerPort>,
    env: Keyed<EnvVar>,
    volume_mounts: Keyed<VolumeMount>,
}

impl ContainerSlot {
    fn empty(name: &str) -> Self {
        Self::from_container(Container {
            name: name.to_string(),
            ..Default::default()
        })
    }

    fn from_container(mut container: Container) -> Self {
        let ports = Keyed::from_items(container.ports.take().unwrap_or_default(), port_key);
        let env = Keyed::from_items(container.env.take().unwrap_or_default(), |e: &EnvVar| {
            e.name.clone()
        });
        let volume_mounts = Keyed::from_items(
            container.volume_mounts.take().unwrap_or_default(),
            |m: &VolumeMount| m.mount_path.clone(),
        );

        Self {
            container,
            ports,
            env,
            volume_mounts,
        }
    }

    fn into_container(self) -> Container {
        let mut container = self.container;
        container.ports = self.ports.into_option();
        container.env = self.env.into_option();
        container.volume_mounts = self.volume_mounts.into_option();
        container
    }
}

/// Fluent builder over an owned pod template.
///
/// `build()` consumes the builder, so the returned template never aliases
/// the builder state.
#[derive(Debug, Clone)]
pub struct PodTemplateBuilder {
    metadata: ObjectMeta,
    spec: PodSpec,
    containers: Keyed<ContainerSlot>,
    init_containers: Keyed<ContainerSlot>,
    volumes: Keyed<Volume>,
}

impl Default for PodTemplateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl From<PodTemplateSpec> for PodTemplateBuilder {
    fn from(template: PodTemplateSpec) -> Self {
        let metadata = template.metadata.unwrap_or_default();
        let mut spec = template.spec.unwrap_or_default();

        let containers = Keyed::from_items(
            std::mem::take(&mut spec.containers)
                .into_iter()
                .map(ContainerSlot::from_container),
            |slot: &ContainerSlot| slot.container.name.clone(),
        );
        let init_containers = Keyed::from_items(
            spec.init_containers
                .take()
                .unwrap_or_default()
                .into_iter()
                .map(ContainerSlot::from_container),
            |slot: &ContainerSlot| slot.container.name.clone(),
        );
        let volumes = Keyed::from_items(spec.volumes.take().unwrap_or_default(), |v: &Volume| {
            v.name.clone()
        });

        Self {
            metadata,
            spec,
            containers,
            init_containers,
            volumes,
        }
    }
}

impl PodTemplateBuilder {
    pub fn new() -> Self {
        Self {
            metadata: ObjectMeta::default(),
            spec: PodSpec::default(),
            containers: Keyed::new(),
            init_containers: Keyed::new(),
            volumes: Keyed::new(),
        }
    }

    /// Start from a user supplied template, or from an empty one.
    pub fn from_template(template: Option<PodTemplateSpec>) -> Self {
        template.map(Self::from).unwrap_or_default()
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .labels
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_volume(mut self, volume: Volume, force: bool) -> Self {
        assert!(!volume.name.is_empty(), "volume name must not be empty");

        let name = volume.name.clone();
        if force {
            self.volumes.upsert(name, volume);
        } else if !self.volumes.insert_if_absent(name.clone(), volume) {
            debug!(volume = %name, "keeping volume already present in pod template");
        }
        self
    }

    pub fn with_container_image(self, name: &str, image: impl Into<String>, force: bool) -> Self {
        self.set_image(ContainerKind::Main, name, image.into(), force)
    }

    pub fn with_container_command(self, name: &str, command: Vec<String>, force: bool) -> Self {
        self.set_command(ContainerKind::Main, name, command, force)
    }

    pub fn with_container_args(mut self, name: &str, args: Vec<String>, force: bool) -> Self {
        let slot = self.slot(ContainerKind::Main, name);
        if force || is_unset_list(slot.container.args.as_ref()) {
            slot.container.args = Some(args);
        } else {
            debug!(container = name, "keeping args from pod template");
        }
        self
    }

    pub fn with_container_port(self, name: &str, port: ContainerPort) -> Self {
        self.set_port(ContainerKind::Main, name, port)
    }

    pub fn with_container_env(self, name: &str, env: EnvVar, force: bool) -> Self {
        self.set_env(ContainerKind::Main, name, env, force)
    }

    pub fn with_container_volume_mount(self, name: &str, mount: VolumeMount) -> Self {
        self.set_volume_mount(ContainerKind::Main, name, mount)
    }

    pub fn with_init_container_image(
        self,
        name: &str,
        image: impl Into<String>,
        force: bool,
    ) -> Self {
        self.set_image(ContainerKind::Init, name, image.into(), force)
    }

    pub fn with_init_container_command(
        self,
        name: &str,
        command: Vec<String>,
        force: bool,
    ) -> Self {
        self.set_command(ContainerKind::Init, name, command, force)
    }

    pub fn with_init_container_env(self, name: &str, env: EnvVar, force: bool) -> Self {
        self.set_env(ContainerKind::Init, name, env, force)
    }

    pub fn with_init_container_volume_mount(self, name: &str, mount: VolumeMount) -> Self {
        self.set_volume_mount(ContainerKind::Init, name, mount)
    }

    pub fn with_service_account_name(mut self, name: impl Into<String>, force: bool) -> Self {
        if force || is_unset(self.spec.service_account_name.as_deref()) {
            self.spec.service_account_name = Some(name.into());
        } else {
            debug!("keeping service account from pod template");
        }
        self
    }

    pub fn build(self) -> PodTemplateSpec {
        debug!(
            containers = self.containers.len(),
            init_containers = self.init_containers.len(),
            volumes = self.volumes.len(),
            "pod template built"
        );

        let mut spec = self.spec;
        spec.containers = self
            .containers
            .into_vec()
            .into_iter()
            .map(ContainerSlot::into_container)
            .collect();
        spec.init_containers = if self.init_containers.is_empty() {
            None
        } else {
            Some(
                self.init_containers
                    .into_vec()
                    .into_iter()
                    .map(ContainerSlot::into_container)
                    .collect(),
            )
        };
        spec.volumes = self.volumes.into_option();

        PodTemplateSpec {
            metadata: Some(self.metadata),
            spec: Some(spec),
        }
    }

    fn slot(&mut self, kind: ContainerKind, name: &str) -> &mut ContainerSlot {
        assert!(!name.is_empty(), "{} name must not be empty", kind);

        let slots = match kind {
            ContainerKind::Main => &mut self.containers,
            ContainerKind::Init => &mut self.init_containers,
        };
        if !slots.contains_key(name) {
            debug!(%kind, container = name, "adding to pod template");
        }
        slots.get_or_insert_with(name, || ContainerSlot::empty(name))
    }

    fn set_image(mut self, kind: ContainerKind, name: &str, image: String, force: bool) -> Self {
        let slot = self.slot(kind, name);
        if force || is_unset(slot.container.image.as_deref()) {
            slot.container.image = Some(image);
        } else {
            debug!(%kind, container = name, "keeping image from pod template");
        }
        self
    }

    fn set_command(
        mut self,
        kind: ContainerKind,
        name: &str,
        command: Vec<String>,
        force: bool,
    ) -> Self {
        let slot = self.slot(kind, name);
        if force || is_unset_list(slot.container.command.as_ref()) {
            slot.container.command = Some(command);
        } else {
            debug!(%kind, container = name, "keeping command from pod template");
        }
        self
    }

    fn set_port(mut self, kind: ContainerKind, name: &str, port: ContainerPort) -> Self {
        let slot = self.slot(kind, name);
        slot.ports.upsert(port_key(&port), port);
        self
    }

    fn set_env(mut self, kind: ContainerKind, name: &str, env: EnvVar, force: bool) -> Self {
        assert!(!env.name.is_empty(), "env var name must not be empty");

        let slot = self.slot(kind, name);
        let key = env.name.clone();
        if force {
            slot.env.upsert(key, env);
        } else if !slot.env.insert_if_absent(key.clone(), env) {
            debug!(%kind, container = name, env = %key, "keeping env var from pod template");
        }
        self
    }

    fn set_volume_mount(mut self, kind: ContainerKind, name: &str, mount: VolumeMount) -> Self {
        assert!(
            !mount.mount_path.is_empty(),
            "volume mount path must not be empty"
        );

        let slot = self.slot(kind, name);
        slot.volume_mounts.upsert(mount.mount_path.clone(), mount);
        self
    }
}
