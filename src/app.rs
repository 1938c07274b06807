use crate::api::ApiClient;
use crate::config::Config;
use crate::runtime::{FrontendAdapter, Runtime};
use anyhow::Result;
use std::sync::Arc;

/// Wires a validated configuration and a frontend into a ready dispatcher.
pub fn build_runtime<F: FrontendAdapter>(config: &Config, frontend: F) -> Result<Runtime<F>> {
    let client = ApiClient::new(config)?;
    tracing::info!(model = client.model(), url = %config.api_url, "chat client ready");
    Ok(Runtime::new(Arc::new(client), frontend))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::UserInputEvent;
    use crate::state::Session;

    struct IdleFrontend;

    impl FrontendAdapter for IdleFrontend {
        fn poll_user_input(&mut self, _session: &Session) -> Result<Option<UserInputEvent>> {
            Ok(None)
        }

        fn render(&mut self, _session: &Session) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_build_runtime_requires_credential() {
        assert!(build_runtime(&Config::default(), IdleFrontend).is_err());

        let config = Config {
            api_key: Some("test-key".to_string()),
            ..Config::default()
        };
        let runtime = build_runtime(&config, IdleFrontend).expect("runtime");
        assert!(runtime.session().transcript().is_empty());
        assert!(!runtime.has_active_bridge());
    }
}
