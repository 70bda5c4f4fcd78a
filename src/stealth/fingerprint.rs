/// Browser fingerprint presented to pages when stealth is enabled
#[derive(Debug, Clone)]
pub struct Fingerprint {
    pub accept_language: String,
    pub platform: String,
    pub language: String,
    pub languages: Vec<String>,
    pub screen_width: u32,
    pub screen_height: u32,
    pub webgl_vendor: String,
    pub webgl_renderer: String,
    pub hardware_concurrency: u32,
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self {
            accept_language: "en-US,en;q=0.9".to_string(),
            platform: "Win32".to_string(),
            language: "en-US".to_string(),
            languages: vec!["en-US".to_string(), "en".to_string()],
            screen_width: 1920,
            screen_height: 1080,
            webgl_vendor: "Intel Inc.".to_string(),
            webgl_renderer: "Intel(R) UHD Graphics".to_string(),
            hardware_concurrency: 8,
        }
    }
}

impl Fingerprint {
    /// Platform string consistent with the given user agent
    #[must_use]
    pub fn for_user_agent(user_agent: &str) -> Self {
        let platform = if user_agent.contains("Macintosh") {
            "MacIntel"
        } else if user_agent.contains("Linux") {
            "Linux x86_64"
        } else {
            "Win32"
        };
        Self {
            platform: platform.to_string(),
            ..Self::default()
        }
    }

    /// `window.__intelscrapeFingerprint` bootstrap consumed by the evasion scripts
    pub(crate) fn bootstrap_script(&self, session_seed: &str) -> String {
        let languages =
            serde_json::to_string(&self.languages).unwrap_or_else(|_| "[]".to_string());
        format!(
            r#"
            window.__intelscrapeFingerprint = {{
                acceptLanguage: "{}",
                platform: "{}",
                language: "{}",
                languages: {},
                screenWidth: {},
                screenHeight: {},
                webglVendor: "{}",
                webglRenderer: "{}",
                hardwareConcurrency: {},
                sessionSeed: "{}"
            }};
            "#,
            self.accept_language,
            self.platform,
            self.language,
            languages,
            self.screen_width,
            self.screen_height,
            self.webgl_vendor,
            self.webgl_renderer,
            self.hardware_concurrency,
            session_seed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_follows_user_agent() {
        assert_eq!(
            Fingerprint::for_user_agent(crate::utils::USER_AGENTS[1]).platform,
            "MacIntel"
        );
        assert_eq!(
            Fingerprint::for_user_agent(crate::utils::USER_AGENTS[2]).platform,
            "Linux x86_64"
        );
        assert_eq!(Fingerprint::for_user_agent("curl/8").platform, "Win32");
    }

    #[test]
    fn bootstrap_embeds_languages_and_seed() {
        let script = Fingerprint::default().bootstrap_script("abcd");
        assert!(script.contains(r#"languages: ["en-US","en"]"#));
        assert!(script.contains(r#"sessionSeed: "abcd""#));
    }
}
