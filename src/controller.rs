//! One-shot scene operations.
//!
//! Each call opens a fresh [`ObsSession`], performs its requests and closes
//! the session on every exit path. Nothing is cached between calls.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::ConnectionParameters;
use crate::error::{Error, Result};
use crate::session::ObsSession;

// ============================================================================
// Constants
// ============================================================================

/// Longest scene name accepted by [`switch_scene`], in characters.
pub const MAX_SCENE_NAME_LEN: usize = 200;

// ============================================================================
// SceneListing
// ============================================================================

/// Scene names plus the scene currently on program output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneListing {
    /// Scene names in server order.
    pub scenes: Vec<String>,
    /// Program scene, when OBS reports one.
    pub current_scene: Option<String>,
}

// ============================================================================
// Operations
// ============================================================================

/// Lists scenes and the current program scene over a single session.
///
/// # Errors
///
/// Any connect, identify or request error. The session is closed first.
#[instrument(level = "debug", skip_all, fields(address = %params.address()))]
pub async fn list_scenes(params: &ConnectionParameters) -> Result<SceneListing> {
    let mut session = ObsSession::new(params.clone());

    let result = async {
        session.connect().await?;
        let scenes = session.get_scene_list().await?;
        let current_scene = session.get_current_program_scene().await?;
        Ok(SceneListing {
            scenes,
            current_scene,
        })
    }
    .await;

    session.close().await;
    result
}

/// Switches program output to `scene_name`.
///
/// # Errors
///
/// - [`Error::Config`] if the name is blank or longer than
///   [`MAX_SCENE_NAME_LEN`]; nothing is dialed in that case
/// - [`Error::Obs`] if OBS rejects the scene
/// - any connect or identify error
#[instrument(level = "debug", skip_all, fields(address = %params.address(), scene = scene_name))]
pub async fn switch_scene(params: &ConnectionParameters, scene_name: &str) -> Result<()> {
    validate_scene_name(scene_name)?;

    let mut session = ObsSession::new(params.clone());

    let result = async {
        session.connect().await?;
        session.set_current_scene(scene_name).await
    }
    .await;

    session.close().await;
    result
}

fn validate_scene_name(scene_name: &str) -> Result<()> {
    if scene_name.trim().is_empty() {
        return Err(Error::config("scene name must not be empty"));
    }

    let len = scene_name.chars().count();
    if len > MAX_SCENE_NAME_LEN {
        debug!(len, "Scene name rejected");
        return Err(Error::config(format!(
            "scene name is {len} characters, limit is {MAX_SCENE_NAME_LEN}"
        )));
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
