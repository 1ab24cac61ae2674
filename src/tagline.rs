//! Tagline suggestions for banners without a subtitle.

/// Source of generated subtitles. Real text generators live outside this crate.
pub trait TaglineSource {
    fn generate_tagline(&self, context: &str) -> String;
}

/// Offline stand-in: picks from fixed lists, keyed by the banner text.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineTaglines;

const BANNERFORGE: &[&str] = &[
    "Forge Your Visual Identity",
    "Create. Design. Deploy.",
    "Professional Banners Made Simple",
];

const GENERIC: &[&str] = &[
    "See What Others Miss",
    "Innovation Through Design",
    "Crafted with Precision",
];

impl TaglineSource for OfflineTaglines {
    fn generate_tagline(&self, context: &str) -> String {
        let key = context.trim().to_lowercase();
        let pool = if key == "bannerforge" { BANNERFORGE } else { GENERIC };
        // Stable pick so repeated runs agree.
        let index = key.bytes().map(usize::from).sum::<usize>() % pool.len();
        pool[index].to_string()
    }
}
