use emi_engine_core::reconciliation::policy::PenaltyPolicy;

use crate::input::file;

/// Load a penalty policy file. `.yaml` / `.yml` files are read as YAML,
/// anything else as JSON. Omitted keys keep their defaults.
pub fn load_policy(path: &str) -> Result<PenaltyPolicy, Box<dyn std::error::Error>> {
    let (resolved, contents) = file::read_to_string(path)?;
    let is_yaml = matches!(
        resolved.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let policy: PenaltyPolicy = if is_yaml {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse policy '{}': {}", path, e))?
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse policy '{}': {}", path, e))?
    };
    policy.validate()?;
    tracing::debug!(rate = %policy.daily_penalty_rate, "loaded penalty policy");
    Ok(policy)
}
