//! In-process page model implementing the driver interface
//!
//! Elements are registered by selector with scripted behaviour (hidden,
//! disabled, failing click tiers, text-stripping fields, click effects). Used
//! for offline runs of the engine and throughout the test suite.

use super::{scripts, AutomationDriver, DriverError, DriverSession, ElementHandle};
use crate::session::SessionState;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// What happens after a successful click
#[derive(Debug, Clone, PartialEq)]
pub enum ClickEffect {
    /// The session's page URL changes
    Navigate(String),
    /// Another registered element becomes visible
    Reveal(String),
}

/// Scripted element behaviour
#[derive(Debug, Clone, PartialEq)]
pub struct FakeElement {
    visible: bool,
    enabled: bool,
    broken: bool,
    value: String,
    keep_ratio: f64,
    rejects_fill: bool,
    fail_direct: bool,
    fail_forced: bool,
    fail_script: bool,
    effect: Option<ClickEffect>,
}

impl FakeElement {
    /// Visible, enabled, fillable field
    pub fn input() -> Self {
        Self {
            visible: true,
            enabled: true,
            broken: false,
            value: String::new(),
            keep_ratio: 1.0,
            rejects_fill: false,
            fail_direct: false,
            fail_forced: false,
            fail_script: false,
            effect: None,
        }
    }

    pub fn button() -> Self {
        Self::input()
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Querying the selector raises a driver error
    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    /// Keep only this fraction of filled text, like an editor that strips input
    pub fn keeping(mut self, ratio: f64) -> Self {
        self.keep_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Typing raises an error; only a synthetic paste sets the value
    pub fn rejecting_fill(mut self) -> Self {
        self.rejects_fill = true;
        self
    }

    pub fn failing_direct_click(mut self) -> Self {
        self.fail_direct = true;
        self
    }

    pub fn failing_forced_click(mut self) -> Self {
        self.fail_forced = true;
        self
    }

    /// Every click tier fails
    pub fn unclickable(mut self) -> Self {
        self.fail_direct = true;
        self.fail_forced = true;
        self.fail_script = true;
        self
    }

    pub fn navigates_to(mut self, url: impl Into<String>) -> Self {
        self.effect = Some(ClickEffect::Navigate(url.into()));
        self
    }

    pub fn reveals(mut self, selector: impl Into<String>) -> Self {
        self.effect = Some(ClickEffect::Reveal(selector.into()));
        self
    }
}

#[derive(Debug, Default)]
struct World {
    elements: HashMap<String, FakeElement>,
    unreachable: HashSet<String>,
    login_wall: Option<String>,
    fail_sessions: bool,
    unstable: bool,
    navigation_delay: Duration,
    next_session_id: usize,
    live: HashMap<usize, SessionState>,
    seeded: Vec<Option<SessionState>>,
    navigations: Vec<String>,
    click_attempts: Vec<(String, &'static str)>,
    clicks: Vec<(String, &'static str)>,
}

/// Driver whose sessions act on a shared in-memory page model
#[derive(Debug, Clone, Default)]
pub struct MemoryDriver {
    world: Arc<Mutex<World>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn world(&self) -> MutexGuard<'_, World> {
        lock(&self.world)
    }

    /// Register an element under `selector` (builder form)
    pub fn with_element(self, selector: impl Into<String>, element: FakeElement) -> Self {
        self.add_element(selector, element);
        self
    }

    pub fn add_element(&self, selector: impl Into<String>, element: FakeElement) {
        self.world().elements.insert(selector.into(), element);
    }

    /// Make `open_session` fail, as when no browser can be started
    pub fn fail_sessions(&self, fail: bool) {
        self.world().fail_sessions = fail;
    }

    pub fn make_unreachable(&self, url: impl Into<String>) {
        self.world().unreachable.insert(url.into());
    }

    /// Sessions without cookies land on `login_url` whatever they navigate to
    pub fn require_login(&self, login_url: impl Into<String>) {
        self.world().login_wall = Some(login_url.into());
    }

    /// Page stability never settles
    pub fn set_unstable(&self, unstable: bool) {
        self.world().unstable = unstable;
    }

    /// Every navigation takes this long
    pub fn set_navigation_delay(&self, delay: Duration) {
        self.world().navigation_delay = delay;
    }

    /// Simulate the user finishing an interactive login in every open session
    pub fn complete_login(&self, state: SessionState) {
        for live in self.world().live.values_mut() {
            *live = state.clone();
        }
    }

    pub fn sessions_opened(&self) -> usize {
        self.world().seeded.len()
    }

    pub fn open_sessions(&self) -> usize {
        self.world().live.len()
    }

    /// Seed state passed to each `open_session` call, in order
    pub fn seeded_states(&self) -> Vec<Option<SessionState>> {
        self.world().seeded.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.world().navigations.clone()
    }

    /// Successful clicks as (selector, tier)
    pub fn clicks(&self) -> Vec<(String, &'static str)> {
        self.world().clicks.clone()
    }

    /// Every click tried, failed ones included, as (selector, tier)
    pub fn click_attempts(&self) -> Vec<(String, &'static str)> {
        self.world().click_attempts.clone()
    }

    pub fn element_value(&self, selector: &str) -> Option<String> {
        self.world().elements.get(selector).map(|e| e.value.clone())
    }
}

#[async_trait]
impl AutomationDriver for MemoryDriver {
    fn name(&self) -> &str {
        "memory"
    }

    async fn open_session(
        &self,
        state: Option<&SessionState>,
    ) -> Result<Box<dyn DriverSession>, DriverError> {
        let mut world = self.world();
        world.seeded.push(state.cloned());

        if world.fail_sessions {
            return Err(DriverError::SessionUnavailable(
                "memory driver configured to refuse sessions".to_string(),
            ));
        }

        let id = world.next_session_id;
        world.next_session_id += 1;
        world.live.insert(id, state.cloned().unwrap_or_default());

        Ok(Box::new(MemorySession {
            id,
            world: Arc::clone(&self.world),
            url: Mutex::new("about:blank".to_string()),
            closed: AtomicBool::new(false),
        }))
    }
}

struct MemorySession {
    id: usize,
    world: Arc<Mutex<World>>,
    url: Mutex<String>,
    closed: AtomicBool,
}

impl MemorySession {
    fn world(&self) -> Result<MutexGuard<'_, World>, DriverError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DriverError::Closed);
        }
        Ok(lock(&self.world))
    }

    fn ensure_open(&self) -> Result<(), DriverError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DriverError::Closed);
        }
        Ok(())
    }

    fn with_element<T>(
        &self,
        element: &ElementHandle,
        f: impl FnOnce(&mut FakeElement) -> Result<T, DriverError>,
    ) -> Result<T, DriverError> {
        let mut world = self.world()?;
        let fake = world
            .elements
            .get_mut(element.id())
            .ok_or_else(|| DriverError::StaleElement(element.id().to_string()))?;
        f(fake)
    }

    /// Apply a click through `tier`, recording it and its effect
    fn click_tier(&self, element: &ElementHandle, tier: &'static str) -> Result<(), DriverError> {
        let mut world = self.world()?;
        world.click_attempts.push((element.id().to_string(), tier));
        let fake = world
            .elements
            .get(element.id())
            .ok_or_else(|| DriverError::StaleElement(element.id().to_string()))?;

        let failing = match tier {
            "direct" => fake.fail_direct,
            "forced" => fake.fail_forced,
            _ => fake.fail_script,
        };
        if failing {
            return Err(DriverError::Interaction(format!(
                "{} click intercepted on {}",
                tier,
                element.id()
            )));
        }
        if tier == "direct" && !(fake.visible && fake.enabled) {
            return Err(DriverError::Interaction(format!(
                "{} is not interactable",
                element.id()
            )));
        }

        let effect = fake.effect.clone();
        world.clicks.push((element.id().to_string(), tier));

        match effect {
            Some(ClickEffect::Navigate(url)) => *lock(&self.url) = url,
            Some(ClickEffect::Reveal(selector)) => {
                if let Some(revealed) = world.elements.get_mut(&selector) {
                    revealed.visible = true;
                }
            }
            None => {}
        }
        Ok(())
    }
}

#[async_trait]
impl DriverSession for MemorySession {
    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<(), DriverError> {
        let delay = self.world()?.navigation_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut world = self.world()?;
        world.navigations.push(url.to_string());

        if world.unreachable.contains(url) {
            return Err(DriverError::Navigation(format!("{} unreachable", url)));
        }

        let authenticated = world
            .live
            .get(&self.id)
            .map(|s| s.is_authenticated())
            .unwrap_or(false);
        let landed = match &world.login_wall {
            Some(login_url) if !authenticated => login_url.clone(),
            _ => url.to_string(),
        };
        *lock(&self.url) = landed;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        self.ensure_open()?;
        Ok(lock(&self.url).clone())
    }

    async fn locate(&self, selector: &str) -> Result<Option<ElementHandle>, DriverError> {
        let world = self.world()?;
        match world.elements.get(selector) {
            Some(fake) if fake.broken => Err(DriverError::InvalidSelector(selector.to_string())),
            Some(_) => Ok(Some(ElementHandle::new(selector))),
            None => Ok(None),
        }
    }

    async fn wait_visible(
        &self,
        element: &ElementHandle,
        _timeout: Duration,
    ) -> Result<bool, DriverError> {
        self.with_element(element, |fake| Ok(fake.visible))
    }

    async fn is_enabled(&self, element: &ElementHandle) -> Result<bool, DriverError> {
        self.with_element(element, |fake| Ok(fake.enabled))
    }

    async fn click(&self, element: &ElementHandle, forced: bool) -> Result<(), DriverError> {
        self.click_tier(element, if forced { "forced" } else { "direct" })
    }

    async fn clear(&self, element: &ElementHandle) -> Result<(), DriverError> {
        self.with_element(element, |fake| {
            fake.value.clear();
            Ok(())
        })
    }

    async fn fill(&self, element: &ElementHandle, text: &str) -> Result<(), DriverError> {
        self.with_element(element, |fake| {
            if fake.rejects_fill {
                return Err(DriverError::Interaction(format!(
                    "{} does not accept typed input",
                    element.id()
                )));
            }
            let total = text.chars().count();
            let kept = ((total as f64) * fake.keep_ratio).floor() as usize;
            fake.value = text.chars().take(kept).collect();
            Ok(())
        })
    }

    async fn read_property(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        self.with_element(element, |fake| {
            Ok(match name {
                "value" => Some(fake.value.clone()),
                _ => None,
            })
        })
    }

    async fn evaluate(&self, _script: &str, _args: Vec<Value>) -> Result<Value, DriverError> {
        self.ensure_open()?;
        Ok(Value::Null)
    }

    async fn evaluate_on(
        &self,
        element: &ElementHandle,
        script: &str,
        args: Vec<Value>,
    ) -> Result<Value, DriverError> {
        match script {
            scripts::SCROLL_INTO_VIEW => self.with_element(element, |_| Ok(Value::Null)),
            scripts::CLICK => self.click_tier(element, "script").map(|_| Value::Null),
            scripts::FORCE_CLICK => self.click_tier(element, "forced").map(|_| Value::Null),
            scripts::READ_TEXT => self.with_element(element, |fake| Ok(Value::String(fake.value.clone()))),
            scripts::PASTE_TEXT => {
                let text = args
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| DriverError::Script("paste text missing".to_string()))?
                    .to_string();
                self.with_element(element, |fake| {
                    fake.value.push_str(&text);
                    Ok(Value::Bool(true))
                })
            }
            other => Err(DriverError::Script(format!(
                "memory driver cannot evaluate: {}",
                other.lines().next().unwrap_or_default()
            ))),
        }
    }

    async fn wait_for_stable(&self, timeout: Duration) -> Result<(), DriverError> {
        if self.world()?.unstable {
            return Err(DriverError::Timeout(format!(
                "page not stable after {}ms",
                timeout.as_millis()
            )));
        }
        Ok(())
    }

    async fn storage_state(&self) -> Result<SessionState, DriverError> {
        let world = self.world()?;
        Ok(world.live.get(&self.id).cloned().unwrap_or_default())
    }

    async fn close(&self) -> Result<(), DriverError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        lock(&self.world).live.remove(&self.id);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
