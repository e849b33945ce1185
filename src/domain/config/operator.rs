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
    DEFAULT_FIELD_MANAGER, DEFAULT_OPERATOR_IMAGE, DEFAULT_PGBOUNCER_IMAGE,
};
use crate::shared::error::{KubeError, Result};
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::sync::{LazyLock, OnceLock};
use tracing::debug;

pub const ENV_OPERATOR_IMAGE_NAME: &str = "OPERATOR_IMAGE_NAME";
pub const ENV_PGBOUNCER_IMAGE: &str = "PGBOUNCER_IMAGE";

static OPERATOR_CONFIG: OnceLock<OperatorConfig> = OnceLock::new();
static DEFAULT_CONFIG: LazyLock<OperatorConfig> = LazyLock::new(OperatorConfig::default);

/// Settings shared by every deployment the operator renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OperatorConfig {
    /// Image of the operator itself, used by the bootstrap init container
    pub operator_image_name: String,
    /// Image used for the pgbouncer container unless the pooler sets one
    pub pgbouncer_image: String,
    /// Field manager used for server-side apply
    pub field_manager: String,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            operator_image_name: DEFAULT_OPERATOR_IMAGE.to_string(),
            pgbouncer_image: DEFAULT_PGBOUNCER_IMAGE.to_string(),
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
        }
    }
}

impl OperatorConfig {
    /// Load configuration from TOML file
    pub fn from<T: AsRef<str>>(path: T) -> Result<Self> {
        let content = read_to_string(path.as_ref()).map_err(|e| {
            KubeError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.as_ref(),
                e
            ))
        })?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Override fields from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    pub(crate) fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(image) = lookup(ENV_OPERATOR_IMAGE_NAME).filter(|v| !v.is_empty()) {
            debug!("Operator image taken from {}", ENV_OPERATOR_IMAGE_NAME);
            self.operator_image_name = image;
        }
        if let Some(image) = lookup(ENV_PGBOUNCER_IMAGE).filter(|v| !v.is_empty()) {
            debug!("pgbouncer image taken from {}", ENV_PGBOUNCER_IMAGE);
            self.pgbouncer_image = image;
        }
        self
    }

    /// Install the process-wide configuration. Fails if one is already set.
    pub fn install(self) -> Result<&'static OperatorConfig> {
        OPERATOR_CONFIG
            .set(self)
            .map_err(|_| KubeError::config_error("operator configuration is already installed"))?;
        Ok(Self::current())
    }

    /// The process-wide configuration, defaults when none was installed.
    ///
    /// Reading it does not install anything, so `install` still succeeds
    /// afterwards.
    pub fn current() -> &'static OperatorConfig {
        OPERATOR_CONFIG.get().unwrap_or(&*DEFAULT_CONFIG)
    }
}
