//! Ordered selector fallback
//!
//! Editors get redesigned all the time, so every page role (title field,
//! content editor, submit button) is described by a chain of selectors tried
//! strictly in order. The first candidate that is visible and enabled wins.

use crate::driver::{scripts, DriverSession, ElementHandle};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// One candidate: a match expression and what it is meant to find
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSelector {
    /// CSS by default; `xpath=` or `text=` prefixes switch strategy
    pub expression: String,
    pub description: String,
}

impl ElementSelector {
    pub fn new(expression: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            description: description.into(),
        }
    }
}

/// Ordered candidates for one page role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorChain {
    pub role: String,
    pub selectors: Vec<ElementSelector>,
}

impl SelectorChain {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            selectors: Vec::new(),
        }
    }

    pub fn with(mut self, expression: impl Into<String>, description: impl Into<String>) -> Self {
        self.selectors.push(ElementSelector::new(expression, description));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

/// A chain match
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedElement {
    pub handle: ElementHandle,
    pub selector: ElementSelector,
    /// Position of the winning selector in its chain
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocatorOptions {
    /// Upper bound on the visibility wait per candidate
    pub candidate_timeout: Duration,
    /// Pause after scrolling the match into view
    pub settle_delay: Duration,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            candidate_timeout: Duration::from_secs(3),
            settle_delay: Duration::from_millis(300),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ElementLocator {
    options: LocatorOptions,
}

impl ElementLocator {
    pub fn new(options: LocatorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LocatorOptions {
        &self.options
    }

    /// Find the first interactable element of `chain` within `timeout`.
    ///
    /// Every candidate gets a visibility wait capped by both the per-candidate
    /// timeout and whatever is left of `timeout`, but each candidate is always
    /// queried at least once. Driver errors on a candidate skip it.
    pub async fn locate(
        &self,
        session: &dyn DriverSession,
        chain: &SelectorChain,
        timeout: Duration,
    ) -> Option<LocatedElement> {
        let started = Instant::now();

        for (index, selector) in chain.selectors.iter().enumerate() {
            let remaining = timeout.saturating_sub(started.elapsed());
            let wait = remaining.min(self.options.candidate_timeout);

            match self.try_candidate(session, selector, wait).await {
                Ok(Some(handle)) => {
                    tracing::debug!(
                        role = %chain.role,
                        selector = %selector.expression,
                        index,
                        "element located"
                    );
                    return Some(LocatedElement {
                        handle,
                        selector: selector.clone(),
                        index,
                    });
                }
                Ok(None) => {
                    tracing::debug!(
                        role = %chain.role,
                        selector = %selector.expression,
                        "candidate not interactable"
                    );
                }
                Err(error) => {
                    tracing::debug!(
                        role = %chain.role,
                        selector = %selector.expression,
                        error = %error,
                        "candidate skipped"
                    );
                }
            }
        }

        tracing::debug!(
            role = %chain.role,
            candidates = chain.selectors.len(),
            "no candidate matched"
        );
        None
    }

    async fn try_candidate(
        &self,
        session: &dyn DriverSession,
        selector: &ElementSelector,
        wait: Duration,
    ) -> Result<Option<ElementHandle>, crate::driver::DriverError> {
        let Some(handle) = session.locate(&selector.expression).await? else {
            return Ok(None);
        };

        if !session.wait_visible(&handle, wait).await? || !session.is_enabled(&handle).await? {
            return Ok(None);
        }

        session
            .evaluate_on(&handle, scripts::SCROLL_INTO_VIEW, Vec::new())
            .await?;
        if !self.options.settle_delay.is_zero() {
            sleep(self.options.settle_delay).await;
        }

        Ok(Some(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{AutomationDriver, FakeElement, MemoryDriver};

    fn fast_locator() -> ElementLocator {
        ElementLocator::new(LocatorOptions {
            candidate_timeout: Duration::from_millis(10),
            settle_delay: Duration::ZERO,
        })
    }

    fn submit_chain() -> SelectorChain {
        SelectorChain::new("发布按钮")
            .with("#broken", "throws")
            .with("#hidden", "not visible")
            .with("#disabled", "disabled")
            .with("#first-good", "first interactable")
            .with("#second-good", "never reached")
    }

    #[tokio::test]
    async fn test_first_interactable_candidate_wins() {
        let driver = MemoryDriver::new()
            .with_element("#broken", FakeElement::button().broken())
            .with_element("#hidden", FakeElement::button().hidden())
            .with_element("#disabled", FakeElement::button().disabled())
            .with_element("#first-good", FakeElement::button())
            .with_element("#second-good", FakeElement::button());
        let session = driver.open_session(None).await.unwrap();

        let located = fast_locator()
            .locate(session.as_ref(), &submit_chain(), Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(located.index, 3);
        assert_eq!(located.selector.expression, "#first-good");
        assert_eq!(located.handle.id(), "#first-good");
    }

    #[tokio::test]
    async fn test_exhausted_chain_is_none() {
        let driver = MemoryDriver::new().with_element("#hidden", FakeElement::button().hidden());
        let session = driver.open_session(None).await.unwrap();

        let located = fast_locator()
            .locate(session.as_ref(), &submit_chain(), Duration::from_secs(1))
            .await;

        assert!(located.is_none());
    }

    #[tokio::test]
    async fn test_elapsed_budget_still_queries_every_candidate() {
        let driver = MemoryDriver::new().with_element("#second-good", FakeElement::button());
        let session = driver.open_session(None).await.unwrap();

        let located = fast_locator()
            .locate(session.as_ref(), &submit_chain(), Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(located.index, 4);
    }
}
