//! Click and fill primitives with fallbacks and read-back verification

use crate::driver::{scripts, DriverError, DriverSession, ElementHandle};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// How a click finally got through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTier {
    Direct,
    Forced,
    Script,
}

impl fmt::Display for ClickTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClickTier::Direct => "direct",
            ClickTier::Forced => "forced",
            ClickTier::Script => "script",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum InteractionError {
    #[error("所有点击方式均失败: {}", format_tiers(.0))]
    AllTiersFailed(Vec<(ClickTier, DriverError)>),

    #[error("填写校验失败: 期望 {expected} 个字符, 实际读取 {actual} 个字符")]
    VerificationFailed { expected: usize, actual: usize },

    #[error(transparent)]
    Driver(#[from] DriverError),
}

fn format_tiers(errors: &[(ClickTier, DriverError)]) -> String {
    errors
        .iter()
        .map(|(tier, error)| format!("{}: {}", tier, error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Click through direct, forced and script tiers until one succeeds
pub async fn safe_click(
    session: &dyn DriverSession,
    element: &ElementHandle,
) -> Result<ClickTier, InteractionError> {
    let mut errors = Vec::with_capacity(3);

    match session.click(element, false).await {
        Ok(()) => return Ok(ClickTier::Direct),
        Err(error) => errors.push((ClickTier::Direct, error)),
    }

    match session.click(element, true).await {
        Ok(()) => return Ok(ClickTier::Forced),
        Err(error) => errors.push((ClickTier::Forced, error)),
    }

    match session.evaluate_on(element, scripts::CLICK, Vec::new()).await {
        Ok(_) => return Ok(ClickTier::Script),
        Err(error) => errors.push((ClickTier::Script, error)),
    }

    tracing::debug!(element = element.id(), "every click tier failed");
    Err(InteractionError::AllTiersFailed(errors))
}

/// Focus, clear, type and verify
pub async fn safe_fill(
    session: &dyn DriverSession,
    element: &ElementHandle,
    text: &str,
) -> Result<(), InteractionError> {
    safe_click(session, element).await?;
    session.clear(element).await?;
    session.fill(element, text).await?;
    verify(session, element, text).await
}

/// Synthetic clipboard paste for rich editors that swallow typed input
pub async fn paste_fill(
    session: &dyn DriverSession,
    element: &ElementHandle,
    text: &str,
) -> Result<(), InteractionError> {
    safe_click(session, element).await?;
    // Some editors refuse a programmatic clear; the paste still lands.
    if let Err(error) = session.clear(element).await {
        tracing::debug!(element = element.id(), error = %error, "clear before paste failed");
    }
    session
        .evaluate_on(element, scripts::PASTE_TEXT, vec![Value::String(text.to_string())])
        .await?;
    verify(session, element, text).await
}

async fn verify(
    session: &dyn DriverSession,
    element: &ElementHandle,
    expected: &str,
) -> Result<(), InteractionError> {
    let actual = read_back(session, element).await?;
    if fill_matches(expected, &actual) {
        Ok(())
    } else {
        Err(InteractionError::VerificationFailed {
            expected: expected.chars().count(),
            actual: actual.chars().count(),
        })
    }
}

/// `value` for form fields, rendered text for contenteditable editors
async fn read_back(
    session: &dyn DriverSession,
    element: &ElementHandle,
) -> Result<String, DriverError> {
    if let Some(value) = session.read_property(element, "value").await? {
        if !value.is_empty() {
            return Ok(value);
        }
    }

    let text = session
        .evaluate_on(element, scripts::READ_TEXT, Vec::new())
        .await?;
    Ok(text.as_str().unwrap_or_default().to_string())
}

/// Read-back contains the input, or kept at least 80% of its characters
pub fn fill_matches(expected: &str, actual: &str) -> bool {
    if actual.contains(expected) {
        return true;
    }
    let expected_len = expected.chars().count();
    let actual_len = actual.chars().count();
    actual_len * 5 >= expected_len * 4
}
