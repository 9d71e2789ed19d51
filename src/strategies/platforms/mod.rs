//! Built-in platform profiles

pub mod csdn;
pub mod jianshu;
pub mod juejin;
pub mod weibo;
pub mod zhihu;

use super::profile::PlatformProfile;

/// Every platform shipped with the publisher
pub fn builtin_profiles() -> Vec<PlatformProfile> {
    vec![
        csdn::profile(),
        juejin::profile(),
        zhihu::profile(),
        jianshu::profile(),
        weibo::profile(),
    ]
}
