//! Scene requests.

use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::Result;
use crate::protocol::Response;

use super::core::ObsSession;

// ============================================================================
// Request Types
// ============================================================================

const GET_SCENE_LIST: &str = "GetSceneList";
const GET_CURRENT_PROGRAM_SCENE: &str = "GetCurrentProgramScene";
const SET_CURRENT_PROGRAM_SCENE: &str = "SetCurrentProgramScene";

// ============================================================================
// ObsSession - Scenes
// ============================================================================

impl ObsSession {
    /// Returns scene names in the order OBS reports them.
    ///
    /// Entries without a non-empty `sceneName` are skipped.
    ///
    /// # Errors
    ///
    /// Any error from [`ObsSession::request`].
    pub async fn get_scene_list(&mut self) -> Result<Vec<String>> {
        let response = self.request(GET_SCENE_LIST, None).await?;
        let names = scene_names(&response);
        debug!(count = names.len(), "Scene list received");
        Ok(names)
    }

    /// Returns the scene currently on program output, if OBS names one.
    ///
    /// # Errors
    ///
    /// Any error from [`ObsSession::request`].
    pub async fn get_current_program_scene(&mut self) -> Result<Option<String>> {
        let response = self.request(GET_CURRENT_PROGRAM_SCENE, None).await?;
        Ok(current_scene_name(&response))
    }

    /// Switches program output to `scene_name`.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Obs`] if OBS rejects the switch, e.g. an unknown
    /// scene; any other error from [`ObsSession::request`].
    pub async fn set_current_scene(&mut self, scene_name: &str) -> Result<()> {
        self.request(
            SET_CURRENT_PROGRAM_SCENE,
            Some(json!({ "sceneName": scene_name })),
        )
        .await?;
        info!(scene = scene_name, "Program scene switched");
        Ok(())
    }
}

// ============================================================================
// Response Extraction
// ============================================================================

/// Extracts `scenes[].sceneName`, skipping missing and empty names.
pub(crate) fn scene_names(response: &Response) -> Vec<String> {
    response
        .get_array("scenes")
        .iter()
        .filter_map(|scene| scene.get("sceneName").and_then(Value::as_str))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads `currentProgramSceneName`, falling back to the 5.3+ `sceneName`.
fn current_scene_name(response: &Response) -> Option<String> {
    ["currentProgramSceneName", "sceneName"]
        .into_iter()
        .filter_map(|key| response.get_str(key))
        .find(|name| !name.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::config::ConnectionParameters;
    use crate::transport::mock::MockServer;

    fn response(data: Value) -> Response {
        Response {
            request_type: GET_SCENE_LIST.to_string(),
            request_id: String::new(),
            response_data: data,
        }
    }

    fn params_for(server: &MockServer) -> ConnectionParameters {
        ConnectionParameters::new("127.0.0.1", server.port()).with_timeout(Duration::from_secs(2))
    }

    #[test]
    fn test_scene_names_skip_missing_and_empty() {
        let data = json!({
            "scenes": [
                {"sceneName": "Intro", "sceneIndex": 2},
                {"sceneName": ""},
                {"sceneIndex": 1},
                {"sceneName": "Outro", "sceneIndex": 0}
            ]
        });
        assert_eq!(scene_names(&response(data)), vec!["Intro", "Outro"]);
    }

    #[test]
    fn test_scene_names_without_scenes_array() {
        assert!(scene_names(&response(json!({}))).is_empty());
        assert!(scene_names(&response(json!({"scenes": "nope"}))).is_empty());
    }

    #[test]
    fn test_current_scene_name_fallback() {
        assert_eq!(
            current_scene_name(&response(json!({"currentProgramSceneName": "Live"}))),
            Some("Live".to_string())
        );
        assert_eq!(
            current_scene_name(&response(json!({"sceneName": "New"}))),
            Some("New".to_string())
        );
        assert_eq!(current_scene_name(&response(json!({"sceneName": ""}))), None);
    }

    #[tokio::test]
    async fn test_scene_round_trip_over_wire() {
        let server = MockServer::start(|mut peer| async move {
            peer.identify().await;

            let list = peer.expect_request(GET_SCENE_LIST).await;
            peer.respond(
                &list,
                json!({"scenes": [{"sceneName": "Scene A"}, {"sceneName": "Scene B"}]}),
            )
            .await;

            let current = peer.expect_request(GET_CURRENT_PROGRAM_SCENE).await;
            peer.respond(&current, json!({"sceneName": "Scene B"})).await;

            let switch = peer.expect_request(SET_CURRENT_PROGRAM_SCENE).await;
            assert_eq!(switch["requestData"], json!({"sceneName": "Scene A"}));
            peer.respond(&switch, json!(null)).await;
        })
        .await;

        let mut session = ObsSession::open(params_for(&server)).await.expect("connect");

        let scenes = session.get_scene_list().await.expect("scene list");
        assert_eq!(scenes, vec!["Scene A", "Scene B"]);

        let current = session.get_current_program_scene().await.expect("current");
        assert_eq!(current.as_deref(), Some("Scene B"));

        session.set_current_scene("Scene A").await.expect("switch");

        session.close().await;
        server.finish().await;
    }

    #[tokio::test]
    async fn test_switch_failure_without_comment_uses_fallback() {
        let server = MockServer::start(|mut peer| async move {
            peer.identify().await;
            let switch = peer.expect_request(SET_CURRENT_PROGRAM_SCENE).await;
            peer.respond_error(&switch, None).await;
        })
        .await;

        let mut session = ObsSession::open(params_for(&server)).await.expect("connect");
        let err = session.set_current_scene("Missing").await.expect_err("obs error");
        assert_eq!(err.to_string(), crate::error::GENERIC_OBS_FAILURE);

        session.close().await;
        server.finish().await;
    }
}
