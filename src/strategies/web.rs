//! Profile-driven publish strategy
//!
//! [`WebStrategy`] runs the editor flow for any [`PlatformProfile`]: open the
//! editor, fill title and content, submit, confirm the optional settings
//! dialog and wait for the success signal. Each step goes through the retry
//! executor on its own; a failed step ends the run with a message naming it.

use super::profile::{ContentInput, PlatformProfile, PostSubmitDialog};
use crate::core::config::{PublisherConfig, TimeoutsConfig};
use crate::core::error::PublishError;
use crate::core::retry::{Backoff, RetryExecutor, RetryOptions};
use crate::core::state_machine::{StrategyState, StrategyStateMachine};
use crate::core::traits::{PublishOptions, PublishResult, PublishStrategy};
use crate::driver::{AutomationDriver, DriverSession};
use crate::interaction::{paste_fill, safe_click, safe_fill};
use crate::locator::{ElementLocator, LocatorOptions, SelectorChain};
use crate::session::SessionStore;
use anyhow::anyhow;
use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

const LOGIN_EXPIRED: &str = "登录状态已失效，请重新登录";
const NOT_INITIALIZED: &str = "平台未初始化";

/// Knobs shared by every strategy of one registry
#[derive(Debug, Clone, PartialEq)]
pub struct StrategySettings {
    pub retry: RetryOptions,
    pub locator: LocatorOptions,
    pub timeouts: TimeoutsConfig,
    /// Report simulated results when no driver session can be opened
    pub simulation: bool,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self::from_config(&PublisherConfig::default())
    }
}

impl StrategySettings {
    pub fn from_config(config: &PublisherConfig) -> Self {
        let timeouts = config.timeouts();
        Self {
            retry: config.retry().to_options(),
            locator: LocatorOptions {
                candidate_timeout: Duration::from_millis(timeouts.candidate_ms),
                settle_delay: Duration::from_millis(timeouts.scroll_settle_ms),
            },
            timeouts,
            simulation: config.simulation_enabled(),
        }
    }
}

/// Steps of the editor flow, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStep {
    OpenEditor,
    FillTitle,
    FillContent,
    Submit,
    ConfirmSettings,
    AwaitSuccess,
}

impl PublishStep {
    /// Failure message reported to the caller
    pub fn failure_message(self) -> &'static str {
        match self {
            PublishStep::OpenEditor => "编辑器页面打开失败",
            PublishStep::FillTitle => "标题填写失败",
            PublishStep::FillContent => "内容填写失败",
            PublishStep::Submit => "发布按钮点击失败",
            PublishStep::ConfirmSettings => "发布设置确认失败",
            PublishStep::AwaitSuccess => "未检测到发布成功信号",
        }
    }

    fn label(self) -> &'static str {
        match self {
            PublishStep::OpenEditor => "open_editor",
            PublishStep::FillTitle => "fill_title",
            PublishStep::FillContent => "fill_content",
            PublishStep::Submit => "submit",
            PublishStep::ConfirmSettings => "confirm_settings",
            PublishStep::AwaitSuccess => "await_success",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunFailure {
    Step(PublishStep),
    LoginExpired,
}

impl RunFailure {
    fn message(self) -> &'static str {
        match self {
            RunFailure::Step(step) => step.failure_message(),
            RunFailure::LoginExpired => LOGIN_EXPIRED,
        }
    }
}

/// Publish strategy driven by a platform profile
pub struct WebStrategy {
    profile: PlatformProfile,
    driver: Arc<dyn AutomationDriver>,
    store: Arc<SessionStore>,
    settings: StrategySettings,
    retry: RetryExecutor,
    locator: ElementLocator,
    machine: StrategyStateMachine,
    session: Option<Box<dyn DriverSession>>,
    simulated: bool,
}

impl WebStrategy {
    pub fn new(
        profile: PlatformProfile,
        driver: Arc<dyn AutomationDriver>,
        store: Arc<SessionStore>,
        settings: StrategySettings,
    ) -> Self {
        Self {
            machine: StrategyStateMachine::new(profile.id.clone()),
            retry: RetryExecutor::new(settings.retry.clone()),
            locator: ElementLocator::new(settings.locator.clone()),
            profile,
            driver,
            store,
            settings,
            session: None,
            simulated: false,
        }
    }

    pub fn profile(&self) -> &PlatformProfile {
        &self.profile
    }

    pub fn is_simulated(&self) -> bool {
        self.simulated
    }

    pub fn state_machine(&self) -> &StrategyStateMachine {
        &self.machine
    }

    fn live_session(&self) -> Result<&dyn DriverSession, PublishError> {
        self.session.as_deref().ok_or_else(|| PublishError::InvalidState {
            target: self.profile.id.clone(),
            state: if self.simulated {
                "模拟模式下没有浏览器会话".to_string()
            } else {
                format!("{:?}", self.machine.get_state())
            },
        })
    }

    /// Close out a publish invocation and go back to Ready
    fn finish_publish(&mut self, outcome: StrategyState, note: Option<String>) {
        for (to, note) in [(outcome, note), (StrategyState::Ready, None)] {
            if let Err(error) = self.machine.transition(to, note) {
                tracing::warn!(platform = %self.profile.id, error = %error, "unexpected state");
            }
        }
    }
}

#[async_trait]
impl PublishStrategy for WebStrategy {
    fn identify(&self) -> &str {
        &self.profile.id
    }

    fn display_name(&self) -> &str {
        &self.profile.display_name
    }

    fn login_url(&self) -> &str {
        &self.profile.login_url
    }

    fn editor_url(&self) -> &str {
        &self.profile.editor_url
    }

    fn state(&self) -> StrategyState {
        self.machine.get_state()
    }

    async fn initialize(&mut self) -> Result<(), PublishError> {
        if self.machine.is_ready() {
            return Ok(());
        }
        self.machine.transition(StrategyState::Initializing, None)?;

        let id = self.profile.id.clone();
        let seed = match self.store.load(&id).await {
            Ok(seed) => seed,
            Err(error) => {
                tracing::warn!(platform = %id, error = %error, "ignoring unreadable login state");
                None
            }
        };

        match self.driver.open_session(seed.as_ref()).await {
            Ok(session) => {
                self.session = Some(session);
                self.simulated = false;
                self.machine.transition(
                    StrategyState::Ready,
                    Some(format!("logged_in={}", seed.is_some())),
                )?;
                tracing::info!(
                    platform = %id,
                    driver = self.driver.name(),
                    logged_in = seed.is_some(),
                    "strategy initialized"
                );
                Ok(())
            }
            Err(error) if self.settings.simulation => {
                tracing::warn!(
                    platform = %id,
                    error = %error,
                    "no automation session, running in simulation mode"
                );
                self.simulated = true;
                self.machine
                    .transition(StrategyState::Ready, Some("simulated".to_string()))?;
                Ok(())
            }
            Err(error) => {
                let message = error.to_string();
                self.machine
                    .transition(StrategyState::Uninitialized, Some(message.clone()))?;
                tracing::error!(platform = %id, error = %message, "strategy initialization failed");
                Err(PublishError::Initialization { target: id, message })
            }
        }
    }

    async fn open_login(&mut self) -> Result<String, PublishError> {
        let session = self.live_session()?;
        let login_url = self.profile.login_url.clone();

        session
            .navigate(
                &login_url,
                Duration::from_millis(self.settings.timeouts.navigation_ms),
            )
            .await
            .map_err(|e| PublishError::Navigation {
                target: self.profile.id.clone(),
                message: e.to_string(),
            })?;

        tracing::info!(platform = %self.profile.id, url = %login_url, "login page opened");
        Ok(login_url)
    }

    async fn confirm_login(&mut self) -> Result<(), PublishError> {
        let session = self.live_session()?;
        let id = &self.profile.id;

        let state = session
            .storage_state()
            .await
            .map_err(|e| PublishError::Session {
                target: id.clone(),
                message: e.to_string(),
            })?;

        if !state.is_authenticated() {
            return Err(PublishError::Session {
                target: id.clone(),
                message: "未检测到登录 Cookie".to_string(),
            });
        }

        self.store.save(id, &state).await
    }

    async fn publish(
        &mut self,
        content: &str,
        title: &str,
        options: &PublishOptions,
    ) -> PublishResult {
        if !self.machine.is_ready() {
            return PublishResult::failure(NOT_INITIALIZED);
        }
        if let Err(error) = self.machine.transition(StrategyState::Publishing, None) {
            return PublishResult::from(&error);
        }

        if self.simulated {
            tracing::info!(platform = %self.profile.id, "simulated publish");
            self.finish_publish(StrategyState::Published, Some("simulated".to_string()));
            return PublishResult::simulated(format!(
                "模拟发布: 未连接浏览器, 内容未提交到{}",
                self.profile.display_name
            ));
        }

        let Some(session) = self.session.as_deref() else {
            self.finish_publish(StrategyState::Failed, Some(NOT_INITIALIZED.to_string()));
            return PublishResult::failure(NOT_INITIALIZED);
        };

        tracing::info!(
            platform = %self.profile.id,
            title_chars = title.chars().count(),
            content_chars = content.chars().count(),
            "publishing"
        );

        let run = PublishRun {
            profile: &self.profile,
            session,
            retry: &self.retry,
            locator: &self.locator,
            timeouts: &self.settings.timeouts,
        };
        let outcome = run.execute(content, title, options).await;

        match outcome {
            Ok(url) => {
                tracing::info!(platform = %self.profile.id, url = %url, "published");
                self.finish_publish(StrategyState::Published, Some(url.clone()));
                PublishResult::success("发布成功", Some(url))
            }
            Err(failure) => {
                tracing::error!(
                    platform = %self.profile.id,
                    reason = failure.message(),
                    "publish failed"
                );
                self.finish_publish(StrategyState::Failed, Some(failure.message().to_string()));
                PublishResult::failure(failure.message())
            }
        }
    }

    async fn cleanup(&mut self) {
        if self.machine.get_state() == StrategyState::CleanedUp {
            return;
        }

        if let Some(session) = self.session.take() {
            if let Err(error) = session.close().await {
                tracing::warn!(platform = %self.profile.id, error = %error, "failed to close session");
            }
        }
        self.simulated = false;

        if let Err(error) = self.machine.transition(StrategyState::CleanedUp, None) {
            tracing::warn!(platform = %self.profile.id, error = %error, "cleanup from unexpected state");
        }
    }
}

/// Borrowed view over one strategy for the duration of a publish call
struct PublishRun<'a> {
    profile: &'a PlatformProfile,
    session: &'a dyn DriverSession,
    retry: &'a RetryExecutor,
    locator: &'a ElementLocator,
    timeouts: &'a TimeoutsConfig,
}

impl PublishRun<'_> {
    async fn execute(
        &self,
        content: &str,
        title: &str,
        options: &PublishOptions,
    ) -> Result<String, RunFailure> {
        self.step(PublishStep::OpenEditor, move |_| self.open_editor()).await?;

        let landed = self.session.current_url().await.unwrap_or_default();
        if self.profile.is_login_page(&landed) {
            return Err(RunFailure::LoginExpired);
        }

        if let Some(chain) = &self.profile.title {
            if !title.trim().is_empty() {
                let fitted = self.profile.fit_title(title);
                let fitted = fitted.as_str();
                self.step(PublishStep::FillTitle, move |_| self.fill(chain, fitted, false))
                    .await?;
            }
        }

        let rich = self.profile.content_input == ContentInput::RichText;
        self.step(PublishStep::FillContent, move |_| {
            self.fill(&self.profile.content, content, rich)
        })
        .await?;

        self.step(PublishStep::Submit, move |_| self.click(&self.profile.submit))
            .await?;

        if let Some(dialog) = &self.profile.post_submit {
            self.confirm_dialog(dialog, options).await?;
        }

        self.await_success().await
    }

    async fn step<F, Fut>(&self, step: PublishStep, operation: F) -> Result<(), RunFailure>
    where
        F: FnMut(u32) -> Fut,
        Fut: std::future::Future<Output = anyhow::Result<bool>>,
    {
        tracing::debug!(platform = %self.profile.id, step = step.label(), "step started");
        if self.retry.with_retry(step.label(), operation).await {
            Ok(())
        } else {
            Err(RunFailure::Step(step))
        }
    }

    fn locate_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.locate_ms)
    }

    async fn open_editor(&self) -> anyhow::Result<bool> {
        self.session
            .navigate(
                &self.profile.editor_url,
                Duration::from_millis(self.timeouts.navigation_ms),
            )
            .await?;

        if let Err(error) = self
            .session
            .wait_for_stable(Duration::from_millis(self.timeouts.stability_ms))
            .await
        {
            tracing::warn!(platform = %self.profile.id, error = %error, "page not stable, continuing");
        }

        if self.timeouts.settle_ms > 0 {
            sleep(Duration::from_millis(self.timeouts.settle_ms)).await;
        }
        Ok(true)
    }

    async fn fill(&self, chain: &SelectorChain, text: &str, rich: bool) -> anyhow::Result<bool> {
        let element = self
            .locator
            .locate(self.session, chain, self.locate_timeout())
            .await
            .ok_or_else(|| anyhow!("未找到{}", chain.role))?;

        match safe_fill(self.session, &element.handle, text).await {
            Ok(()) => Ok(true),
            Err(error) if rich => {
                tracing::debug!(
                    platform = %self.profile.id,
                    error = %error,
                    "typing rejected, pasting instead"
                );
                paste_fill(self.session, &element.handle, text).await?;
                Ok(true)
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn click(&self, chain: &SelectorChain) -> anyhow::Result<bool> {
        let element = self
            .locator
            .locate(self.session, chain, self.locate_timeout())
            .await
            .ok_or_else(|| anyhow!("未找到{}", chain.role))?;

        let tier = safe_click(self.session, &element.handle).await?;
        tracing::debug!(platform = %self.profile.id, role = %chain.role, tier = %tier, "clicked");
        Ok(true)
    }

    /// Fill an optional dialog field; a missing field is not an error
    async fn fill_optional(&self, chain: Option<&SelectorChain>, text: &str) -> anyhow::Result<()> {
        let Some(chain) = chain else {
            return Ok(());
        };
        if text.trim().is_empty() {
            return Ok(());
        }

        let dialog_timeout = Duration::from_millis(self.timeouts.dialog_ms);
        match self.locator.locate(self.session, chain, dialog_timeout).await {
            Some(element) => safe_fill(self.session, &element.handle, text).await?,
            None => {
                tracing::debug!(platform = %self.profile.id, role = %chain.role, "optional field absent");
            }
        }
        Ok(())
    }

    async fn confirm_dialog(
        &self,
        dialog: &PostSubmitDialog,
        options: &PublishOptions,
    ) -> Result<(), RunFailure> {
        let dialog_timeout = Duration::from_millis(self.timeouts.dialog_ms);
        if self
            .locator
            .locate(self.session, &dialog.confirm, dialog_timeout)
            .await
            .is_none()
        {
            tracing::debug!(platform = %self.profile.id, "no post-submit dialog");
            return Ok(());
        }

        let tags = options
            .tags
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(&dialog.tag_separator);
        let summary = options.summary.as_deref().unwrap_or_default();
        let tags = tags.as_str();

        self.step(PublishStep::ConfirmSettings, move |_| async move {
            self.fill_optional(dialog.tags.as_ref(), tags).await?;
            self.fill_optional(dialog.summary.as_ref(), summary).await?;
            self.click(&dialog.confirm).await
        })
        .await
    }

    async fn await_success(&self) -> Result<String, RunFailure> {
        let pattern = self.profile.success.url_pattern.as_deref().and_then(|p| {
            Regex::new(p)
                .map_err(|e| tracing::warn!(platform = %self.profile.id, error = %e, "invalid success pattern"))
                .ok()
        });
        let pattern = pattern.as_ref();

        let poll = RetryExecutor::new(RetryOptions {
            max_attempts: self.timeouts.poll_attempts.max(1),
            backoff: Backoff::Constant(Duration::from_millis(self.timeouts.poll_interval_ms)),
        });

        let published = poll
            .with_retry(PublishStep::AwaitSuccess.label(), move |_| async move {
                let url = self.session.current_url().await?;
                if pattern.is_some_and(|re| re.is_match(&url)) {
                    return Ok(true);
                }
                match &self.profile.success.banner {
                    Some(banner) => Ok(self
                        .locator
                        .locate(self.session, banner, Duration::ZERO)
                        .await
                        .is_some()),
                    None => Ok(false),
                }
            })
            .await;

        if !published {
            return Err(RunFailure::Step(PublishStep::AwaitSuccess));
        }
        Ok(self.session.current_url().await.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{FakeElement, MemoryDriver};
    use crate::session::{Cookie, SessionState};
    use crate::strategies::platforms;
    use tempfile::TempDir;

    fn fast_settings() -> StrategySettings {
        StrategySettings {
            retry: RetryOptions {
                max_attempts: 2,
                backoff: Backoff::Constant(Duration::from_millis(1)),
            },
            locator: LocatorOptions {
                candidate_timeout: Duration::from_millis(5),
                settle_delay: Duration::ZERO,
            },
            timeouts: TimeoutsConfig {
                navigation_ms: 100,
                stability_ms: 10,
                settle_ms: 0,
                locate_ms: 50,
                candidate_ms: 5,
                scroll_settle_ms: 0,
                dialog_ms: 10,
                poll_interval_ms: 1,
                poll_attempts: 3,
            },
            simulation: false,
        }
    }

    fn zhihu_page(driver: &MemoryDriver) {
        driver.add_element("textarea.WriteIndex-titleInput", FakeElement::input());
        driver.add_element(".public-DraftEditor-content", FakeElement::input().rejecting_fill());
        driver.add_element(
            "button.PublishPanel-triggerButton",
            FakeElement::button().navigates_to("https://zhuanlan.zhihu.com/p/123456"),
        );
    }

    fn logged_in() -> SessionState {
        SessionState {
            cookies: vec![Cookie::new("z_c0", "token", ".zhihu.com")],
            origins: Vec::new(),
        }
    }

    fn strategy(driver: &MemoryDriver, dir: &TempDir, settings: StrategySettings) -> WebStrategy {
        WebStrategy::new(
            platforms::zhihu::profile(),
            Arc::new(driver.clone()),
            Arc::new(SessionStore::new(dir.path())),
            settings,
        )
    }

    #[tokio::test]
    async fn test_publish_before_initialize() {
        let dir = TempDir::new().unwrap();
        let driver = MemoryDriver::new();
        let mut strategy = strategy(&driver, &dir, fast_settings());

        let result = strategy.publish("正文", "标题", &PublishOptions::default()).await;

        assert!(!result.is_success());
        assert_eq!(result.message(), "平台未初始化");
        assert_eq!(driver.sessions_opened(), 0);
    }

    #[tokio::test]
    async fn test_full_flow_with_paste_fallback() {
        let dir = TempDir::new().unwrap();
        let driver = MemoryDriver::new();
        zhihu_page(&driver);
        let mut strategy = strategy(&driver, &dir, fast_settings());

        strategy.initialize().await.unwrap();
        strategy.initialize().await.unwrap();
        assert_eq!(driver.sessions_opened(), 1);

        let result = strategy
            .publish("Rust 所有权详解", "所有权", &PublishOptions::default())
            .await;

        assert!(result.is_success(), "{}", result.message());
        assert_eq!(result.url(), Some("https://zhuanlan.zhihu.com/p/123456"));
        assert_eq!(
            driver.element_value(".public-DraftEditor-content").as_deref(),
            Some("Rust 所有权详解")
        );
        assert_eq!(strategy.state(), StrategyState::Ready);
    }

    #[tokio::test]
    async fn test_missing_submit_names_step() {
        let dir = TempDir::new().unwrap();
        let driver = MemoryDriver::new();
        driver.add_element("textarea.WriteIndex-titleInput", FakeElement::input());
        driver.add_element(".public-DraftEditor-content", FakeElement::input());
        let mut strategy = strategy(&driver, &dir, fast_settings());
        strategy.initialize().await.unwrap();

        let result = strategy.publish("正文", "标题", &PublishOptions::default()).await;

        assert_eq!(result.message(), "发布按钮点击失败");
        assert_eq!(strategy.state(), StrategyState::Ready);
        assert_eq!(strategy.state_machine().get_last_error(), Some("发布按钮点击失败"));
    }

    #[tokio::test]
    async fn test_blank_title_skips_title_step() {
        let dir = TempDir::new().unwrap();
        let driver = MemoryDriver::new();
        zhihu_page(&driver);
        let mut strategy = strategy(&driver, &dir, fast_settings());
        strategy.initialize().await.unwrap();

        let result = strategy.publish("正文", "   ", &PublishOptions::default()).await;

        assert!(result.is_success());
        assert_eq!(
            driver.element_value("textarea.WriteIndex-titleInput").as_deref(),
            Some("")
        );
    }

    #[tokio::test]
    async fn test_expired_login_is_reported() {
        let dir = TempDir::new().unwrap();
        let driver = MemoryDriver::new();
        zhihu_page(&driver);
        driver.require_login("https://www.zhihu.com/signin");
        let mut strategy = strategy(&driver, &dir, fast_settings());
        strategy.initialize().await.unwrap();

        let result = strategy.publish("正文", "标题", &PublishOptions::default()).await;

        assert_eq!(result.message(), "登录状态已失效，请重新登录");
    }

    #[tokio::test]
    async fn test_login_confirmation_persists_and_reseeds() {
        let dir = TempDir::new().unwrap();
        let driver = MemoryDriver::new();
        zhihu_page(&driver);
        driver.require_login("https://www.zhihu.com/signin");

        let mut first = strategy(&driver, &dir, fast_settings());
        first.initialize().await.unwrap();
        assert_eq!(first.open_login().await.unwrap(), "https://www.zhihu.com/signin");

        assert_eq!(first.confirm_login().await.unwrap_err().kind(), "SessionError");

        driver.complete_login(logged_in());
        first.confirm_login().await.unwrap();
        first.cleanup().await;
        first.cleanup().await;
        assert_eq!(first.state(), StrategyState::CleanedUp);

        let mut second = strategy(&driver, &dir, fast_settings());
        second.initialize().await.unwrap();
        assert_eq!(driver.seeded_states().last().cloned().flatten(), Some(logged_in()));

        let result = second.publish("正文", "标题", &PublishOptions::default()).await;
        assert!(result.is_success(), "{}", result.message());
    }

    #[tokio::test]
    async fn test_initialization_failure() {
        let dir = TempDir::new().unwrap();
        let driver = MemoryDriver::new();
        driver.fail_sessions(true);
        let mut strategy = strategy(&driver, &dir, fast_settings());

        let err = strategy.initialize().await.unwrap_err();

        assert_eq!(err.kind(), "InitializationError");
        assert_eq!(strategy.state(), StrategyState::Uninitialized);
    }

    #[tokio::test]
    async fn test_simulation_mode_is_explicit() {
        let dir = TempDir::new().unwrap();
        let driver = MemoryDriver::new();
        driver.fail_sessions(true);
        let settings = StrategySettings {
            simulation: true,
            ..fast_settings()
        };
        let mut strategy = strategy(&driver, &dir, settings);

        strategy.initialize().await.unwrap();
        let result = strategy.publish("正文", "标题", &PublishOptions::default()).await;

        assert!(result.is_simulated());
        assert!(strategy.open_login().await.is_err());
    }

    #[tokio::test]
    async fn test_post_submit_dialog_fills_tags() {
        let dir = TempDir::new().unwrap();
        let driver = MemoryDriver::new()
            .with_element(".article-bar__title input", FakeElement::input())
            .with_element(".editor__inner[contenteditable='true']", FakeElement::input())
            .with_element(
                "button.btn-publish",
                FakeElement::button().reveals(".modal__button-bar button.btn-b-red"),
            )
            .with_element(
                ".modal__button-bar button.btn-b-red",
                FakeElement::button()
                    .hidden()
                    .navigates_to("https://mp.csdn.net/mp_blog/creation/success/1001"),
            )
            .with_element(".mark_selection_box input", FakeElement::input());
        let mut strategy = WebStrategy::new(
            platforms::csdn::profile(),
            Arc::new(driver.clone()),
            Arc::new(SessionStore::new(dir.path())),
            fast_settings(),
        );
        strategy.initialize().await.unwrap();

        let options = PublishOptions {
            tags: ["rust", "async"].into_iter().map(String::from).collect(),
            ..PublishOptions::default()
        };
        let result = strategy.publish("正文", "标题", &options).await;

        assert!(result.is_success(), "{}", result.message());
        assert_eq!(
            result.url(),
            Some("https://mp.csdn.net/mp_blog/creation/success/1001")
        );
        assert_eq!(
            driver.element_value(".mark_selection_box input").as_deref(),
            Some("async,rust")
        );
    }
}
