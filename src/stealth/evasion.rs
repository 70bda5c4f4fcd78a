//! Scripts registered on every new document of a stealth page

use anyhow::Result;
use chromiumoxide::{Page, cdp};
use futures::future::join_all;
use tracing::{debug, warn};

use super::fingerprint::Fingerprint;

const WEBDRIVER: &str = r"
    Object.defineProperty(Navigator.prototype, 'webdriver', { get: () => undefined });
    for (const key of Object.keys(window)) {
        if (/^cdc_|^\$cdc_/.test(key)) { delete window[key]; }
    }
";

const NAVIGATOR: &str = r"
    const fp = window.__intelscrapeFingerprint || {};
    Object.defineProperty(navigator, 'languages', { get: () => fp.languages || ['en-US', 'en'] });
    Object.defineProperty(navigator, 'language', { get: () => fp.language || 'en-US' });
    Object.defineProperty(navigator, 'platform', { get: () => fp.platform || 'Win32' });
    Object.defineProperty(navigator, 'vendor', { get: () => 'Google Inc.' });
    Object.defineProperty(navigator, 'hardwareConcurrency', { get: () => fp.hardwareConcurrency || 8 });
";

const PLUGINS: &str = r"
    const mockPlugins = [
        { name: 'Chrome PDF Plugin', description: 'Portable Document Format', filename: 'internal-pdf-viewer' },
        { name: 'Chrome PDF Viewer', description: '', filename: 'mhjfbmdgcfjbbpaeojofohoefgiehjai' },
        { name: 'Native Client', description: '', filename: 'internal-nacl-plugin' }
    ];
    const pluginsProto = Object.getPrototypeOf(navigator.plugins);
    Object.defineProperty(navigator, 'plugins', {
        get: () => {
            const plugins = {};
            mockPlugins.forEach((plugin, i) => { plugins[i] = plugin; plugins[plugin.name] = plugin; });
            Object.setPrototypeOf(plugins, pluginsProto);
            Object.defineProperty(plugins, 'length', { value: mockPlugins.length });
            return plugins;
        }
    });
";

const PERMISSIONS: &str = r"
    if (navigator.permissions && navigator.permissions.query) {
        const originalQuery = navigator.permissions.query.bind(navigator.permissions);
        navigator.permissions.query = (parameters) =>
            parameters && parameters.name === 'notifications'
                ? Promise.resolve({ state: Notification.permission })
                : originalQuery(parameters);
    }
";

const CHROME_RUNTIME: &str = r"
    if (!window.chrome) { window.chrome = {}; }
    if (!window.chrome.runtime) {
        window.chrome.runtime = {
            connect: () => ({
                onMessage: { addListener: () => {}, removeListener: () => {} },
                postMessage: () => {}
            }),
            sendMessage: () => {}
        };
    }
";

const WEBGL_VENDOR: &str = r"
    const fp = window.__intelscrapeFingerprint || {};
    const handler = {
        apply(target, ctx, args) {
            const param = (args && args[0]) || null;
            if (param === 37445) { return fp.webglVendor || 'Intel Inc.'; }
            if (param === 37446) { return fp.webglRenderer || 'Intel(R) UHD Graphics'; }
            return Reflect.apply(target, ctx, args);
        }
    };
    for (const ctx of [window.WebGLRenderingContext, window.WebGL2RenderingContext]) {
        if (ctx) {
            ctx.prototype.getParameter = new Proxy(ctx.prototype.getParameter, handler);
        }
    }
";

/// Registration order matters: the navigator overrides read the bootstrap
const EVASION_SCRIPTS: &[(&str, &str)] = &[
    ("webdriver", WEBDRIVER),
    ("navigator", NAVIGATOR),
    ("plugins", PLUGINS),
    ("permissions", PERMISSIONS),
    ("chrome_runtime", CHROME_RUNTIME),
    ("webgl_vendor", WEBGL_VENDOR),
];

fn on_new_document(source: String) -> cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams {
    cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams {
        source,
        include_command_line_api: None,
        world_name: None,
        run_immediately: None,
    }
}

/// Register the fingerprint bootstrap and evasion scripts, then override the UA
///
/// Individual script failures are tolerated; the call fails only when no
/// evasion script could be registered.
pub async fn inject(page: &Page, fingerprint: &Fingerprint, user_agent: &str) -> Result<()> {
    let session_seed = hex::encode(rand::random::<[u8; 16]>());

    debug!("Registering fingerprint bootstrap");
    page.execute(on_new_document(fingerprint.bootstrap_script(&session_seed)))
        .await?;

    let results = join_all(EVASION_SCRIPTS.iter().map(|(name, source)| {
        let page = page.clone();
        async move {
            let result = page.execute(on_new_document((*source).to_string())).await;
            (*name, result)
        }
    }))
    .await;

    let mut injected = 0usize;
    for (name, result) in results {
        match result {
            Ok(_) => injected += 1,
            Err(e) => warn!("Failed to register evasion script {}: {}", name, e),
        }
    }
    if injected == 0 {
        return Err(anyhow::anyhow!("No evasion scripts could be registered"));
    }

    page.execute(cdp::browser_protocol::network::SetUserAgentOverrideParams {
        user_agent: user_agent.replace("Headless", ""),
        accept_language: Some(fingerprint.accept_language.clone()),
        platform: Some(fingerprint.platform.clone()),
        user_agent_metadata: None,
    })
    .await?;

    debug!(
        "Stealth injection complete: {}/{} scripts active",
        injected,
        EVASION_SCRIPTS.len()
    );
    Ok(())
}
