use crate::locator::SelectorChain;
use crate::strategies::profile::{ContentInput, PlatformProfile, SuccessSignal};

pub fn profile() -> PlatformProfile {
    PlatformProfile {
        id: "weibo".to_string(),
        display_name: "微博".to_string(),
        login_url: "https://passport.weibo.com/sso/signin".to_string(),
        editor_url: "https://weibo.com/".to_string(),
        title: None,
        title_max_chars: None,
        content: SelectorChain::new("微博输入框")
            .with("textarea.Form_input_2gtXx", "首页发布框")
            .with("textarea[placeholder*='有什么新鲜事']", "发布框占位符"),
        content_input: ContentInput::Fill,
        submit: SelectorChain::new("发送按钮")
            .with("button.Tool_btn_2Eane", "发送按钮")
            .with("text=发送", "发送文字按钮"),
        post_submit: None,
        success: SuccessSignal {
            url_pattern: None,
            banner: Some(
                SelectorChain::new("发布成功提示")
                    .with("text=发布成功", "发布成功 toast")
                    .with(".woo-toast-body", "toast 容器"),
            ),
        },
    }
}
