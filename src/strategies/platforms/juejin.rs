use crate::locator::SelectorChain;
use crate::strategies::profile::{
    ContentInput, PlatformProfile, PostSubmitDialog, SuccessSignal,
};

pub fn profile() -> PlatformProfile {
    PlatformProfile {
        id: "juejin".to_string(),
        display_name: "掘金".to_string(),
        login_url: "https://juejin.cn/login".to_string(),
        editor_url: "https://juejin.cn/editor/drafts/new".to_string(),
        title: Some(
            SelectorChain::new("标题输入框")
                .with("input.title-input", "标题输入框")
                .with("input[placeholder='输入文章标题...']", "标题占位符"),
        ),
        title_max_chars: Some(80),
        content: SelectorChain::new("正文编辑器")
            .with(".bytemd-editor .CodeMirror textarea", "ByteMD 输入")
            .with(".CodeMirror-code[contenteditable='true']", "CodeMirror 编辑区"),
        content_input: ContentInput::RichText,
        submit: SelectorChain::new("发布按钮")
            .with(".publish-popup button.xitu-btn", "顶栏发布按钮")
            .with("text=发布", "发布文字按钮"),
        post_submit: Some(PostSubmitDialog {
            confirm: SelectorChain::new("发布确认")
                .with(".panel .footer button.ui-btn.primary", "确定并发布")
                .with("text=确定并发布", "确定并发布文字按钮"),
            tags: Some(
                SelectorChain::new("标签输入框")
                    .with(".tag-input input", "添加标签"),
            ),
            tag_separator: " ".to_string(),
            summary: Some(
                SelectorChain::new("摘要输入框")
                    .with(".summary-textarea textarea", "编辑摘要"),
            ),
        }),
        success: SuccessSignal {
            url_pattern: Some(r"^https://juejin\.cn/(published|post/\d+)".to_string()),
            banner: Some(
                SelectorChain::new("发布成功提示")
                    .with(".thanks", "发布成功页")
                    .with("text=发布成功", "发布成功文字"),
            ),
        },
    }
}
