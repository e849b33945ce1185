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

use crate::domain::config::OperatorConfig;
use std::collections::HashMap;
use tracing::warn;

pub const KEY_OPERATOR_IMAGE: &str = "operator.image";
pub const KEY_PGBOUNCER_IMAGE: &str = "pgbouncer.image";
pub const KEY_FIELD_MANAGER: &str = "field-manager";

const KNOWN_KEYS: [&str; 3] = [KEY_OPERATOR_IMAGE, KEY_PGBOUNCER_IMAGE, KEY_FIELD_MANAGER];

/// Apply `-D key=value` properties on top of a loaded configuration
pub fn apply_to_operator_config(configs: &HashMap<String, String>, config: &mut OperatorConfig) {
    if let Some(image) = configs.get(KEY_OPERATOR_IMAGE) {
        config.operator_image_name = image.clone();
    }

    if let Some(image) = configs.get(KEY_PGBOUNCER_IMAGE) {
        config.pgbouncer_image = image.clone();
    }

    if let Some(manager) = configs.get(KEY_FIELD_MANAGER) {
        config.field_manager = manager.clone();
    }

    for key in configs.keys() {
        if !KNOWN_KEYS.contains(&key.as_str()) {
            warn!("Ignoring unknown dynamic property '{}'", key);
        }
    }
}
