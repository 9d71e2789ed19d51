use crate::locator::SelectorChain;
use crate::strategies::profile::{
    ContentInput, PlatformProfile, PostSubmitDialog, SuccessSignal,
};

pub fn profile() -> PlatformProfile {
    PlatformProfile {
        id: "csdn".to_string(),
        display_name: "CSDN".to_string(),
        login_url: "https://passport.csdn.net/login".to_string(),
        editor_url: "https://editor.csdn.net/md/".to_string(),
        title: Some(
            SelectorChain::new("标题输入框")
                .with(".article-bar__title input", "标题栏输入框")
                .with("input[placeholder*='标题']", "标题占位符"),
        ),
        title_max_chars: Some(100),
        content: SelectorChain::new("正文编辑器")
            .with(".editor__inner[contenteditable='true']", "Markdown 编辑区")
            .with("pre.editor__inner", "旧版编辑区")
            .with(".CodeMirror textarea", "CodeMirror 输入"),
        content_input: ContentInput::RichText,
        submit: SelectorChain::new("发布按钮")
            .with("button.btn-publish", "顶栏发布按钮")
            .with("text=发布文章", "发布文章文字按钮"),
        post_submit: Some(PostSubmitDialog {
            confirm: SelectorChain::new("发布确认")
                .with(".modal__button-bar button.btn-b-red", "弹窗发布按钮")
                .with("xpath=//div[contains(@class,'modal')]//button[contains(., '发布文章')]", "弹窗文字按钮"),
            tags: Some(
                SelectorChain::new("标签输入框")
                    .with(".mark_selection_box input", "文章标签"),
            ),
            tag_separator: ",".to_string(),
            summary: Some(
                SelectorChain::new("摘要输入框")
                    .with(".desc-box textarea", "文章摘要"),
            ),
        }),
        success: SuccessSignal {
            url_pattern: Some(r"^https://(mp\.csdn\.net/mp_blog/creation/success|blog\.csdn\.net/[^/]+/article/details)/\d+".to_string()),
            banner: Some(
                SelectorChain::new("发布成功提示")
                    .with(".success-title", "发布成功标题"),
            ),
        },
    }
}
