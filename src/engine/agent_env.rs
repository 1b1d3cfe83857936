//! Page agent settings derived from the model configuration
//!
//! Vision-grounded model families locate elements from screenshots and are
//! switched on with their own flag; for those the family key is omitted.

use crate::driver::AgentEnv;
use crate::model::ModelConfiguration;
use crate::resolver::{ENV_API_KEY, ENV_BASE_URL, ENV_MODEL_NAME};

/// Flag enabling the vision-grounded mode (`"1"` or `"0"`)
pub const ENV_USE_QWEN_VL: &str = "MIDSCENE_USE_QWEN_VL";
/// Model family, only set outside vision-grounded mode
pub const ENV_MODEL_FAMILY: &str = "MIDSCENE_MODEL_FAMILY";

const VISION_GROUNDED_MARKER: &str = "qwen";

/// Whether the configured model belongs to the vision-grounded family
pub fn is_vision_grounded(config: &ModelConfiguration) -> bool {
    let family_matches = config
        .model_family
        .as_deref()
        .is_some_and(|f| f.eq_ignore_ascii_case(VISION_GROUNDED_MARKER));
    let name_matches = config
        .model_name
        .to_ascii_lowercase()
        .contains(VISION_GROUNDED_MARKER);

    family_matches || name_matches
}

/// Build the settings handed to the page agent for one run
pub fn agent_env(config: &ModelConfiguration) -> AgentEnv {
    let mut env = AgentEnv::new();
    env.set(ENV_API_KEY, config.api_key.as_str());
    env.set(ENV_BASE_URL, config.base_url.as_str());
    env.set(ENV_MODEL_NAME, config.model_name.as_str());

    if is_vision_grounded(config) {
        env.set(ENV_USE_QWEN_VL, "1");
    } else {
        env.set(ENV_USE_QWEN_VL, "0");
        env.set(ENV_MODEL_FAMILY, config.family());
    }

    env
}
