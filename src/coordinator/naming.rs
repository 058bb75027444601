// Naming rules shared by the workflows. All of these run before any provider
// call, so a bad name fails fast with zero mutations.

use crate::provider::ProvisionError;

pub const SCOPE_MIN_LEN: usize = 3;
pub const SCOPE_MAX_LEN: usize = 29;

const TARGET_GROUP_MAX_LEN: usize = 32;

/// Scope names feed into every derived resource name, so their length is
/// bounded tightly enough that the longest derivation still fits the
/// provider's limits.
pub fn check_scope(scope: &str) -> Result<(), ProvisionError> {
    if scope.len() < SCOPE_MIN_LEN {
        return Err(ProvisionError::Validation(format!(
            "scope {scope:?} is shorter than {SCOPE_MIN_LEN} characters"
        )));
    }
    if scope.len() > SCOPE_MAX_LEN {
        return Err(ProvisionError::Validation(format!(
            "scope {scope:?} is longer than {SCOPE_MAX_LEN} characters"
        )));
    }
    Ok(())
}

/// Human-friendly short form of a service name: lowercased, trailing "api"
/// dropped, runs of hyphens and whitespace collapsed to single hyphens.
pub fn to_friendly_name(service: &str) -> String {
    let mut lowered = service.trim().to_lowercase();
    if let Some(stripped) = lowered.strip_suffix("api") {
        lowered = stripped.to_string();
    }
    let mut out = String::with_capacity(lowered.len());
    let mut pending_sep = false;
    for c in lowered.chars() {
        if c == '-' || c.is_whitespace() {
            pending_sep = !out.is_empty();
        } else {
            if pending_sep {
                out.push('-');
                pending_sep = false;
            }
            out.push(c);
        }
    }
    out
}

/// Deterministic target group name: `{first scope segment}-{friendly}-tg`.
/// Deterministic so a later invocation can resolve the group without carrying
/// its ARN. Anything over the provider's 32-character limit is rejected here,
/// before any provider call.
pub fn target_group_name(scope: &str, service: &str) -> Result<String, ProvisionError> {
    let prefix = scope.split('-').next().unwrap_or(scope);
    let friendly = to_friendly_name(service);
    let name = if friendly.is_empty() {
        format!("{prefix}-tg")
    } else {
        format!("{prefix}-{friendly}-tg")
    };
    if name.len() > TARGET_GROUP_MAX_LEN {
        return Err(ProvisionError::Validation(format!(
            "target group name {name:?} exceeds {TARGET_GROUP_MAX_LEN} characters"
        )));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_length_bounds() {
        assert!(check_scope("ab").is_err());
        assert!(check_scope("abc").is_ok());
        assert!(check_scope(&"a".repeat(29)).is_ok());
        assert!(check_scope(&"a".repeat(30)).is_err());
    }

    #[test]
    fn friendly_name_strips_api_and_collapses_separators() {
        assert_eq!(to_friendly_name("events-api"), "events");
        assert_eq!(to_friendly_name("Events API"), "events");
        assert_eq!(to_friendly_name("order--history  service"), "order-history-service");
        assert_eq!(to_friendly_name("billing"), "billing");
    }

    #[test]
    fn target_group_name_is_deterministic() {
        assert_eq!(
            target_group_name("demo-prod", "events-api").unwrap(),
            "demo-events-tg"
        );
        assert_eq!(
            target_group_name("demo", "Billing API").unwrap(),
            "demo-billing-tg"
        );
        assert_eq!(target_group_name("demo-prod", "api").unwrap(), "demo-tg");
    }

    #[test]
    fn overlong_target_group_name_is_rejected() {
        let err = target_group_name("verylongscopesegment", "quite-long-service-name").unwrap_err();
        assert!(matches!(err, ProvisionError::Validation(_)));
    }
}
