//! Stealth profile applied to browser sessions
//!
//! `StealthProfile` decides which user agent a page presents, how long to wait
//! between requests and whether human-like interaction is simulated. The
//! Chromium-specific parts (evasion scripts, launch flags) live alongside it.

mod evasion;
mod fingerprint;

pub use evasion::inject;
pub use fingerprint::Fingerprint;

use rand::Rng;
use rand::seq::IndexedRandom;
use std::time::Duration;

use crate::config::CrawlConfig;
use crate::utils::{CHROME_USER_AGENT, USER_AGENTS};

/// Launch flags that suppress the most common automation fingerprints
pub const STEALTH_LAUNCH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-infobars",
    "--disable-notifications",
    "--disable-popup-blocking",
    "--disable-extensions",
    "--disable-background-networking",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-breakpad",
    "--disable-component-extensions-with-background-pages",
    "--disable-features=TranslateUI",
    "--disable-hang-monitor",
    "--disable-ipc-flooding-protection",
    "--disable-prompt-on-repost",
    "--metrics-recording-only",
    "--password-store=basic",
    "--use-mock-keychain",
    "--hide-scrollbars",
    "--mute-audio",
];

#[derive(Debug, Clone)]
pub struct StealthProfile {
    enabled: bool,
    rotate_user_agents: bool,
    random_delays: bool,
    human_behavior: bool,
    request_delay: Duration,
    same_domain_delay: Duration,
    delay_range: (Duration, Duration),
}

impl StealthProfile {
    #[must_use]
    pub fn from_config(config: &CrawlConfig) -> Self {
        let enabled = config.stealth_enabled();
        Self {
            enabled,
            rotate_user_agents: enabled && config.rotate_user_agents(),
            random_delays: config.random_delays(),
            human_behavior: enabled && config.human_behavior(),
            request_delay: config.request_delay(),
            same_domain_delay: config.same_domain_delay(),
            delay_range: config.delay_range(),
        }
    }

    /// Whether evasion scripts and launch flags are applied
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn human_behavior(&self) -> bool {
        self.human_behavior
    }

    /// User agent for the next page
    #[must_use]
    pub fn user_agent(&self) -> &'static str {
        if self.rotate_user_agents {
            USER_AGENTS
                .choose(&mut rand::rng())
                .copied()
                .unwrap_or(CHROME_USER_AGENT)
        } else {
            CHROME_USER_AGENT
        }
    }

    /// Delay before the next request
    ///
    /// `same_domain` is set for pagination hops, which reuse the previous host.
    #[must_use]
    pub fn delay(&self, same_domain: bool) -> Duration {
        if self.random_delays {
            let (min, max) = self.delay_range;
            if max <= min {
                return min;
            }
            let millis = rand::rng().random_range(min.as_millis()..=max.as_millis());
            return Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX));
        }
        if same_domain {
            self.same_domain_delay
        } else {
            self.request_delay
        }
    }

    /// Fingerprint consistent with `user_agent`
    #[must_use]
    pub fn fingerprint(&self, user_agent: &str) -> Fingerprint {
        Fingerprint::for_user_agent(user_agent)
    }
}

/// JavaScript performing small randomized mouse moves and scrolls
#[must_use]
pub fn human_behavior_script() -> String {
    let mut rng = rand::rng();
    let moves: Vec<String> = (0..rng.random_range(3..=6))
        .map(|_| {
            format!(
                "[{}, {}]",
                rng.random_range(40..1200),
                rng.random_range(40..800)
            )
        })
        .collect();
    let scroll = rng.random_range(120..480);
    format!(
        r"
        (() => {{
            for (const [x, y] of [{}]) {{
                document.dispatchEvent(new MouseEvent('mousemove', {{ clientX: x, clientY: y, bubbles: true }}));
            }}
            window.scrollBy(0, {scroll});
            window.scrollBy(0, -{half});
            return true;
        }})()
        ",
        moves.join(", "),
        half = scroll / 2,
    )
}
