#![allow(dead_code)]

use platform_publisher::driver::FakeElement;
use platform_publisher::session::Cookie;
use platform_publisher::*;
use tempfile::TempDir;

/// Configuration with millisecond timeouts and sessions under `dir`
pub fn config(dir: &TempDir) -> PublisherConfig {
    PublisherConfig {
        sessions: Some(SessionsConfig {
            directory: dir.path().display().to_string(),
        }),
        retry: Some(RetryConfig {
            max_attempts: 2,
            backoff_ms: 1,
            schedule_ms: Vec::new(),
        }),
        timeouts: Some(TimeoutsConfig {
            navigation_ms: 100,
            stability_ms: 10,
            settle_ms: 0,
            locate_ms: 50,
            candidate_ms: 5,
            scroll_settle_ms: 0,
            dialog_ms: 20,
            poll_interval_ms: 1,
            poll_attempts: 3,
        }),
        ..PublisherConfig::default()
    }
}

pub const CSDN_ARTICLE: &str = "https://mp.csdn.net/mp_blog/creation/success/140123456";

/// CSDN editor whose publish dialog lands on the success page
pub fn csdn_page(driver: &MemoryDriver) {
    driver.add_element(".article-bar__title input", FakeElement::input());
    driver.add_element(".editor__inner[contenteditable='true']", FakeElement::input());
    driver.add_element(
        "button.btn-publish",
        FakeElement::button().reveals(".modal__button-bar button.btn-b-red"),
    );
    driver.add_element(
        ".modal__button-bar button.btn-b-red",
        FakeElement::button().hidden().navigates_to(CSDN_ARTICLE),
    );
}

/// Jianshu writer whose content field keeps `ratio` of the typed text
pub fn jianshu_page(driver: &MemoryDriver, ratio: f64) {
    driver.add_element("input._24i7u", FakeElement::input());
    driver.add_element("#arthur-editor", FakeElement::input().keeping(ratio));
    driver.add_element(
        "text=发布文章",
        FakeElement::button().navigates_to("https://www.jianshu.com/p/5f2a9c81e3d4"),
    );
}

/// Weibo composer whose send button never takes a click
pub fn broken_weibo_page(driver: &MemoryDriver) {
    driver.add_element("textarea.Form_input_2gtXx", FakeElement::input());
    driver.add_element("button.Tool_btn_2Eane", FakeElement::button().unclickable());
}

pub fn logged_in(domain: &str) -> SessionState {
    SessionState {
        cookies: vec![Cookie::new("sessionid", "token", domain)],
        origins: Vec::new(),
    }
}
