use crate::locator::SelectorChain;
use crate::strategies::profile::{ContentInput, PlatformProfile, SuccessSignal};

pub fn profile() -> PlatformProfile {
    PlatformProfile {
        id: "jianshu".to_string(),
        display_name: "简书".to_string(),
        login_url: "https://www.jianshu.com/sign_in".to_string(),
        editor_url: "https://www.jianshu.com/writer".to_string(),
        title: Some(
            SelectorChain::new("标题输入框")
                .with("input._24i7u", "文章标题")
                .with("input[type='text'][class^='_']", "标题输入"),
        ),
        title_max_chars: Some(100),
        content: SelectorChain::new("正文编辑器")
            .with("#arthur-editor", "Markdown 文本域")
            .with("textarea._3swFR", "正文文本域"),
        content_input: ContentInput::Fill,
        submit: SelectorChain::new("发布按钮")
            .with("text=发布文章", "发布文章链接")
            .with("a[data-action='publicize']", "发布动作"),
        post_submit: None,
        success: SuccessSignal {
            url_pattern: Some(r"^https://www\.jianshu\.com/p/[0-9a-f]+".to_string()),
            banner: Some(
                SelectorChain::new("发布成功提示")
                    .with("text=发布成功", "发布成功文字"),
            ),
        },
    }
}
