//! Emoji with ASCII fallbacks for `--no-emoji`.

use console::Emoji;

pub static BANNER: Emoji<'static, 'static> = Emoji("🔍", ">>");
pub static TAG: Emoji<'static, 'static> = Emoji("🔍", "*");

pub static CLUSTER: Emoji<'static, 'static> = Emoji("☸️ ", "[K8S]");
pub static IMAGE: Emoji<'static, 'static> = Emoji("🏷️", "*");
pub static UPDATED: Emoji<'static, 'static> = Emoji("🔄", ">");
pub static POD_AGE: Emoji<'static, 'static> = Emoji("⏱️", "T");
pub static POD: Emoji<'static, 'static> = Emoji("📦", "P");

pub static GITHUB: Emoji<'static, 'static> = Emoji("🐙", "[GH]");
pub static ERROR: Emoji<'static, 'static> = Emoji("⚠️", "!");
pub static PULL_REQUEST: Emoji<'static, 'static> = Emoji("📝", "#");
pub static PULL_REQUEST_SHORT: Emoji<'static, 'static> = Emoji("📝", "PR");
pub static URL: Emoji<'static, 'static> = Emoji("🔗", "~");
pub static AUTHOR: Emoji<'static, 'static> = Emoji("👤", "@");
pub static MESSAGE: Emoji<'static, 'static> = Emoji("💬", ">");

pub static STATUS: Emoji<'static, 'static> = Emoji("📊", "[ST]");
pub static UP_TO_DATE: Emoji<'static, 'static> = Emoji("✅", "[OK]");
pub static OUTDATED: Emoji<'static, 'static> = Emoji("⚠️", "[!]");
pub static ACTION: Emoji<'static, 'static> = Emoji("🔄", "->");
pub static BUILDING: Emoji<'static, 'static> = Emoji("🔄", "[~]");
pub static FAILED: Emoji<'static, 'static> = Emoji("❌", "[X]");
pub static WAITING: Emoji<'static, 'static> = Emoji("⏳", "[..]");
pub static UNKNOWN: Emoji<'static, 'static> = Emoji("❓", "[?]");
pub static REGISTRY: Emoji<'static, 'static> = Emoji("ℹ️", "i");

pub const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "];
pub const SPINNER_FRAMES_ASCII: &[&str] = &["|", "/", "-", "\\", " "];

/// Chooses between the emoji and its fallback. `console::Emoji`'s own
/// `Display` only looks at the terminal, so the flag is applied here.
#[derive(Debug, Clone, Copy)]
pub struct Icons {
    emoji: bool,
}

impl Icons {
    pub fn new(emoji: bool) -> Self {
        Self { emoji }
    }

    pub fn get(&self, icon: &Emoji<'static, 'static>) -> &'static str {
        if self.emoji {
            icon.0
        } else {
            icon.1
        }
    }

    pub fn spinner_frames(&self) -> &'static [&'static str] {
        if self.emoji {
            SPINNER_FRAMES
        } else {
            SPINNER_FRAMES_ASCII
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallbacks_are_ascii() {
        let icons = Icons::new(false);
        for icon in [&CLUSTER, &GITHUB, &STATUS, &UP_TO_DATE, &WAITING, &REGISTRY] {
            assert!(icons.get(icon).is_ascii());
        }
        assert!(icons.spinner_frames().iter().all(|f| f.is_ascii()));
    }

    #[test]
    fn test_emoji_enabled() {
        let icons = Icons::new(true);
        assert_eq!(icons.get(&UP_TO_DATE), "✅");
        assert_eq!(icons.spinner_frames().len(), 11);
    }
}
