use crate::locator::SelectorChain;
use crate::strategies::profile::{ContentInput, PlatformProfile, SuccessSignal};

pub fn profile() -> PlatformProfile {
    PlatformProfile {
        id: "zhihu".to_string(),
        display_name: "知乎".to_string(),
        login_url: "https://www.zhihu.com/signin".to_string(),
        editor_url: "https://zhuanlan.zhihu.com/write".to_string(),
        title: Some(
            SelectorChain::new("标题输入框")
                .with("textarea.WriteIndex-titleInput", "标题文本域")
                .with("textarea[placeholder*='标题']", "标题占位符"),
        ),
        title_max_chars: Some(100),
        content: SelectorChain::new("正文编辑器")
            .with(".public-DraftEditor-content", "Draft.js 编辑区")
            .with("div[contenteditable='true']", "可编辑区域"),
        content_input: ContentInput::RichText,
        submit: SelectorChain::new("发布按钮")
            .with("button.PublishPanel-triggerButton", "发布面板按钮")
            .with("xpath=//button[contains(., '发布')]", "发布文字按钮"),
        post_submit: None,
        success: SuccessSignal {
            url_pattern: Some(r"^https://zhuanlan\.zhihu\.com/p/\d+".to_string()),
            banner: None,
        },
    }
}
