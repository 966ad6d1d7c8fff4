use aws_config::{BehaviorVersion, Region, SdkConfig};

use super::retry::RetryPolicy;
use crate::config::AwsSettings;

/// Load the shared SDK configuration for the configured region and profile
pub async fn load_sdk_config(settings: &AwsSettings, policy: &RetryPolicy) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(settings.region.clone()))
        .retry_config(policy.sdk_retry_config())
        .timeout_config(policy.sdk_timeout_config());

    if let Some(profile) = settings.profile.as_deref().filter(|p| !p.trim().is_empty()) {
        loader = loader.profile_name(profile);
    }

    loader.load().await
}

/// Whether a profile or a static key pair is visible in the environment.
///
/// Other credential sources (instance roles, SSO caches) are still tried by the
/// SDK when this returns false.
pub fn has_explicit_credentials(env: impl Fn(&str) -> Option<String>) -> bool {
    let present = |name: &str| env(name).is_some_and(|v| !v.trim().is_empty());

    present("AWS_PROFILE") || (present("AWS_ACCESS_KEY_ID") && present("AWS_SECRET_ACCESS_KEY"))
}
