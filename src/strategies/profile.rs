//! Declarative description of one publishing platform's editor

use crate::locator::SelectorChain;

/// How the content editor accepts text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentInput {
    /// Plain `<textarea>` or markdown source editor
    Fill,
    /// Rich editor; falls back to a synthetic paste when typing is rejected
    RichText,
}

/// Settings dialog some platforms show after the first submit click
#[derive(Debug, Clone, PartialEq)]
pub struct PostSubmitDialog {
    pub confirm: SelectorChain,
    pub tags: Option<SelectorChain>,
    pub tag_separator: String,
    pub summary: Option<SelectorChain>,
}

/// Evidence that the article went live
#[derive(Debug, Clone, PartialEq)]
pub struct SuccessSignal {
    /// Regex over the page URL; the matching URL is the published URL
    pub url_pattern: Option<String>,
    pub banner: Option<SelectorChain>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlatformProfile {
    pub id: String,
    pub display_name: String,
    pub login_url: String,
    pub editor_url: String,
    /// `None` for platforms without a separate title field
    pub title: Option<SelectorChain>,
    pub title_max_chars: Option<usize>,
    pub content: SelectorChain,
    pub content_input: ContentInput,
    pub submit: SelectorChain,
    pub post_submit: Option<PostSubmitDialog>,
    pub success: SuccessSignal,
}

impl PlatformProfile {
    pub fn with_editor_url(mut self, editor_url: impl Into<String>) -> Self {
        self.editor_url = editor_url.into();
        self
    }

    /// Cut an over-long title on a char boundary
    pub fn fit_title(&self, title: &str) -> String {
        match self.title_max_chars {
            Some(max) if title.chars().count() > max => title.chars().take(max).collect(),
            _ => title.to_string(),
        }
    }

    /// Whether `url` is this platform's login page
    pub fn is_login_page(&self, url: &str) -> bool {
        let login = self.login_url.split(['?', '#']).next().unwrap_or_default();
        !login.is_empty() && url.starts_with(login)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::platforms;

    #[test]
    fn test_fit_title_truncates_on_char_boundary() {
        let mut profile = platforms::csdn::profile();
        profile.title_max_chars = Some(4);

        assert_eq!(profile.fit_title("深入理解所有权"), "深入理解");
        assert_eq!(profile.fit_title("短标题"), "短标题");
    }

    #[test]
    fn test_is_login_page_ignores_query() {
        let mut profile = platforms::csdn::profile();
        profile.login_url = "https://passport.csdn.net/login?code=applets".to_string();

        assert!(profile.is_login_page("https://passport.csdn.net/login?next=/editor"));
        assert!(!profile.is_login_page("https://editor.csdn.net/md/"));
    }
}
